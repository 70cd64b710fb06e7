//! The message list the user sees, and where it is scrolled to.

use parley_types::Role;

use crate::sink::{PLACEHOLDER_TEXT, PlaceholderHandle, ViewEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Message { role: Role, text: String },
    /// Transient assistant node shown while a reply is pending.
    Placeholder(PlaceholderHandle),
}

impl Entry {
    #[must_use]
    pub fn role(&self) -> Role {
        match self {
            Self::Message { role, .. } => *role,
            Self::Placeholder(_) => Role::Assistant,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Message { text, .. } => text,
            Self::Placeholder(_) => PLACEHOLDER_TEXT,
        }
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }
}

/// Scroll position for the message view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollState {
    /// Always keep the newest content visible.
    #[default]
    AutoBottom,
    /// Held `lines_from_bottom` rows above the newest content.
    Manual { lines_from_bottom: u16 },
}

#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<Entry>,
    scroll: ScrollState,
}

impl Transcript {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[must_use]
    pub fn scroll(&self) -> ScrollState {
        self.scroll
    }

    #[must_use]
    pub fn has_placeholder(&self) -> bool {
        self.entries.iter().any(Entry::is_placeholder)
    }

    pub fn append_message(&mut self, role: Role, text: String) {
        self.entries.push(Entry::Message { role, text });
        self.follow_tail();
    }

    pub fn append_placeholder(&mut self, handle: PlaceholderHandle) {
        self.entries.push(Entry::Placeholder(handle));
        self.follow_tail();
    }

    /// Remove the placeholder behind `handle`. Returns whether one was attached.
    pub fn remove_placeholder(&mut self, handle: PlaceholderHandle) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|entry| *entry != Entry::Placeholder(handle));
        let removed = self.entries.len() != before;
        if removed {
            self.follow_tail();
        } else {
            tracing::trace!(handle = handle.raw(), "Placeholder already detached");
        }
        removed
    }

    /// Apply a render event. Entry events are not transcript concerns.
    pub fn apply(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::Message { role, text } => self.append_message(role, text),
            ViewEvent::Placeholder(handle) => self.append_placeholder(handle),
            ViewEvent::RemovePlaceholder(handle) => {
                self.remove_placeholder(handle);
            }
            ViewEvent::ClearEntry | ViewEvent::FocusEntry => {}
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        let current = match self.scroll {
            ScrollState::AutoBottom => 0,
            ScrollState::Manual { lines_from_bottom } => lines_from_bottom,
        };
        self.scroll = ScrollState::Manual {
            lines_from_bottom: current.saturating_add(lines),
        };
    }

    pub fn scroll_down(&mut self, lines: u16) {
        if let ScrollState::Manual { lines_from_bottom } = self.scroll {
            let remaining = lines_from_bottom.saturating_sub(lines);
            self.scroll = if remaining == 0 {
                ScrollState::AutoBottom
            } else {
                ScrollState::Manual {
                    lines_from_bottom: remaining,
                }
            };
        }
    }

    /// Clamp a manual offset that overshot the top of the rendered content.
    pub fn clamp_scroll(&mut self, max_lines_from_bottom: u16) {
        if let ScrollState::Manual { lines_from_bottom } = self.scroll
            && lines_from_bottom > max_lines_from_bottom
        {
            self.scroll = ScrollState::Manual {
                lines_from_bottom: max_lines_from_bottom,
            };
        }
    }

    pub fn follow_tail(&mut self) {
        self.scroll = ScrollState::AutoBottom;
    }
}
