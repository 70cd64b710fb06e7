//! Input Gate: whether the entry accepts a new submission.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::sink::{ViewEvent, ViewSender};

/// Enable/disable state of the text entry. All operations are idempotent.
pub trait InputGate {
    fn is_locked(&self) -> bool;

    /// Disable the entry and the submit affordance.
    fn lock(&self);

    /// Re-enable the entry and return focus to it.
    fn unlock(&self);

    /// Discard the draft text.
    fn clear_entry(&self);
}

/// Gate shared between the controller and the front-end.
///
/// The lock flag is an atomic the UI reads every frame. Clearing and focusing
/// go through the view channel so they land in order with rendered messages.
#[derive(Debug, Clone)]
pub struct SharedGate {
    locked: Arc<AtomicBool>,
    events: ViewSender,
}

impl SharedGate {
    #[must_use]
    pub fn new(events: ViewSender) -> Self {
        Self {
            locked: Arc::new(AtomicBool::new(false)),
            events,
        }
    }

    fn emit(&self, event: ViewEvent) {
        if self.events.send(event).is_err() {
            tracing::trace!("View receiver closed; dropping gate event");
        }
    }
}

impl InputGate for SharedGate {
    fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    fn lock(&self) {
        if !self.locked.swap(true, Ordering::AcqRel) {
            tracing::trace!("Input locked");
        }
    }

    fn unlock(&self) {
        if self.locked.swap(false, Ordering::AcqRel) {
            tracing::trace!("Input unlocked");
        }
        self.emit(ViewEvent::FocusEntry);
    }

    fn clear_entry(&self) {
        self.emit(ViewEvent::ClearEntry);
    }
}
