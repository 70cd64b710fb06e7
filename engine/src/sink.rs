//! Render Sink: how the controller puts things on screen.
//!
//! The controller never touches the view directly. It calls a [`RenderSink`],
//! and the terminal front-end uses [`ChannelSink`], which turns each call into a
//! [`ViewEvent`] for the UI loop to apply on its next frame.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parley_types::Role;
use tokio::sync::mpsc;

/// Marker text of the transient "typing" node.
pub const PLACEHOLDER_TEXT: &str = "typing…";

/// Opaque reference to one rendered placeholder node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaceholderHandle(u64);

impl PlaceholderHandle {
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

pub trait RenderSink {
    /// Append an immutable message node and scroll to it.
    fn append_message(&self, text: &str, role: Role);

    /// Append a transient assistant-tagged node showing [`PLACEHOLDER_TEXT`].
    fn append_placeholder(&self) -> PlaceholderHandle;

    /// Remove the node behind `handle`. Unknown or already removed: no-op.
    fn remove_placeholder(&self, handle: PlaceholderHandle);
}

/// Everything the UI loop needs to mirror controller and gate activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Message { role: Role, text: String },
    Placeholder(PlaceholderHandle),
    RemovePlaceholder(PlaceholderHandle),
    ClearEntry,
    FocusEntry,
}

pub type ViewSender = mpsc::UnboundedSender<ViewEvent>;
pub type ViewReceiver = mpsc::UnboundedReceiver<ViewEvent>;

#[must_use]
pub fn view_channel() -> (ViewSender, ViewReceiver) {
    mpsc::unbounded_channel()
}

/// [`RenderSink`] that forwards every call as a [`ViewEvent`].
///
/// Events sent after the receiver is gone are dropped; the view no longer exists.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    events: ViewSender,
    next_handle: Arc<AtomicU64>,
}

impl ChannelSink {
    #[must_use]
    pub fn new(events: ViewSender) -> Self {
        Self {
            events,
            next_handle: Arc::new(AtomicU64::new(1)),
        }
    }

    fn emit(&self, event: ViewEvent) {
        if self.events.send(event).is_err() {
            tracing::trace!("View receiver closed; dropping render event");
        }
    }
}

impl RenderSink for ChannelSink {
    fn append_message(&self, text: &str, role: Role) {
        self.emit(ViewEvent::Message {
            role,
            text: text.to_string(),
        });
    }

    fn append_placeholder(&self) -> PlaceholderHandle {
        let handle = PlaceholderHandle(self.next_handle.fetch_add(1, Ordering::Relaxed));
        self.emit(ViewEvent::Placeholder(handle));
        handle
    }

    fn remove_placeholder(&self, handle: PlaceholderHandle) {
        self.emit(ViewEvent::RemovePlaceholder(handle));
    }
}
