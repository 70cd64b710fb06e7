//! Front-end state: transcript, entry, credential prompt and notices.
//!
//! [`App`] owns the receiving end of the view channel. The controller holds the
//! matching [`ChannelSink`] and [`SharedGate`] (see [`App::sink`] and
//! [`App::gate`]); the UI loop calls [`App::process_view_events`] once per frame
//! so everything the controller rendered shows up in emission order.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parley_config::{CredentialError, CredentialStore};

use crate::commands::{Command, help_line};
use crate::draft::DraftInput;
use crate::gate::{InputGate, SharedGate};
use crate::sink::{ChannelSink, ViewEvent, ViewReceiver, view_channel};
use crate::transcript::Transcript;

/// How long a notice stays in the status bar.
pub const NOTICE_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Typing a message or a command.
    #[default]
    Insert,
    /// Typing an API key into the masked prompt.
    CredentialEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    /// Credential storage failed.
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub level: NoticeLevel,
    expires_at: Instant,
}

#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    pub ascii_only: bool,
    pub model: String,
}

pub struct App {
    transcript: Transcript,
    events: ViewReceiver,
    sink: ChannelSink,
    gate: SharedGate,
    credentials: Arc<dyn CredentialStore>,
    draft: DraftInput,
    secret: DraftInput,
    mode: InputMode,
    notice: Option<Notice>,
    submissions: Vec<String>,
    options: AppOptions,
    frame: u64,
    quit: bool,
}

impl App {
    #[must_use]
    pub fn new(credentials: Arc<dyn CredentialStore>, options: AppOptions) -> Self {
        let (tx, events) = view_channel();
        let mut app = Self {
            transcript: Transcript::new(),
            events,
            sink: ChannelSink::new(tx.clone()),
            gate: SharedGate::new(tx),
            credentials,
            draft: DraftInput::default(),
            secret: DraftInput::default(),
            mode: InputMode::Insert,
            notice: None,
            submissions: Vec::new(),
            options,
            frame: 0,
            quit: false,
        };
        if !app.credentials.is_configured() {
            app.push_notice("No API key yet. Type /key to add one.", NoticeLevel::Info);
        }
        app
    }

    /// Render sink for the controller.
    #[must_use]
    pub fn sink(&self) -> ChannelSink {
        self.sink.clone()
    }

    /// Input gate for the controller.
    #[must_use]
    pub fn gate(&self) -> SharedGate {
        self.gate.clone()
    }

    #[must_use]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn transcript_mut(&mut self) -> &mut Transcript {
        &mut self.transcript
    }

    #[must_use]
    pub fn draft(&self) -> &DraftInput {
        &self.draft
    }

    #[must_use]
    pub fn secret(&self) -> &DraftInput {
        &self.secret
    }

    #[must_use]
    pub fn mode(&self) -> InputMode {
        self.mode
    }

    #[must_use]
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    #[must_use]
    pub fn options(&self) -> &AppOptions {
        &self.options
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.gate.is_locked()
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn request_quit(&mut self) {
        self.quit = true;
    }

    /// Animation frame counter, advanced by [`App::tick`].
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Masked form of the stored key, for the prompt hint.
    #[must_use]
    pub fn masked_credential(&self) -> Option<String> {
        self.credentials.get().map(|c| c.masked())
    }

    /// Drain pending render and gate events. Returns how many were applied.
    pub fn process_view_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events.try_recv() {
            match event {
                ViewEvent::ClearEntry => self.draft.clear(),
                ViewEvent::FocusEntry => {
                    self.mode = InputMode::Insert;
                    self.draft.move_cursor_end();
                }
                other => self.transcript.apply(other),
            }
            applied += 1;
        }
        applied
    }

    /// Advance animations and expire the notice.
    pub fn tick(&mut self, now: Instant) {
        self.frame = self.frame.wrapping_add(1);
        if self.notice.as_ref().is_some_and(|n| now >= n.expires_at) {
            self.notice = None;
        }
    }

    pub fn push_notice(&mut self, text: impl Into<String>, level: NoticeLevel) {
        self.notice = Some(Notice {
            text: text.into(),
            level,
            expires_at: Instant::now() + NOTICE_TTL,
        });
    }

    /// Submissions collected since the last call, in order.
    pub fn take_submissions(&mut self) -> Vec<String> {
        std::mem::take(&mut self.submissions)
    }

    /// The buffer keystrokes go to, or `None` while the entry is locked.
    fn editable(&mut self) -> Option<&mut DraftInput> {
        match self.mode {
            InputMode::CredentialEntry => Some(&mut self.secret),
            InputMode::Insert if self.gate.is_locked() => None,
            InputMode::Insert => Some(&mut self.draft),
        }
    }

    pub fn insert_char(&mut self, c: char) {
        if let Some(buffer) = self.editable() {
            buffer.enter_char(c);
        }
    }

    pub fn insert_text(&mut self, text: &str) {
        if let Some(buffer) = self.editable() {
            buffer.enter_text(text);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(buffer) = self.editable() {
            buffer.delete_char();
        }
    }

    pub fn delete_forward(&mut self) {
        if let Some(buffer) = self.editable() {
            buffer.delete_char_forward();
        }
    }

    pub fn delete_word(&mut self) {
        if let Some(buffer) = self.editable() {
            buffer.delete_word_backwards();
        }
    }

    pub fn cursor_left(&mut self) {
        if let Some(buffer) = self.editable() {
            buffer.move_cursor_left();
        }
    }

    pub fn cursor_right(&mut self) {
        if let Some(buffer) = self.editable() {
            buffer.move_cursor_right();
        }
    }

    pub fn cursor_home(&mut self) {
        if let Some(buffer) = self.editable() {
            buffer.move_cursor_home();
        }
    }

    pub fn cursor_end(&mut self) {
        if let Some(buffer) = self.editable() {
            buffer.move_cursor_end();
        }
    }

    /// Enter.
    ///
    /// Commands run immediately. Anything else is taken out of the entry and
    /// queued for the controller, so a second Enter before the turn starts has
    /// nothing left to send. Blank entries are not queued.
    pub fn submit(&mut self) {
        match self.mode {
            InputMode::CredentialEntry => self.save_credential(),
            InputMode::Insert if self.gate.is_locked() => {}
            InputMode::Insert => {
                if Command::parse(self.draft.text()).is_some() {
                    let line = self.draft.take_text();
                    tracing::debug!(command = line.trim(), "Running command");
                    self.run_command(command_from(&line));
                } else if !self.draft.text().trim().is_empty() {
                    self.submissions.push(self.draft.take_text());
                }
            }
        }
    }

    /// Esc: leave the credential prompt, otherwise quit.
    pub fn cancel(&mut self) {
        match self.mode {
            InputMode::CredentialEntry => {
                self.secret.clear();
                self.mode = InputMode::Insert;
            }
            InputMode::Insert => self.quit = true,
        }
    }

    fn run_command(&mut self, command: Command<'_>) {
        match command {
            Command::Key => {
                self.secret.clear();
                self.mode = InputMode::CredentialEntry;
            }
            Command::Forget => match self.credentials.clear() {
                Ok(()) => self.push_notice("API key removed", NoticeLevel::Info),
                Err(e) => self.push_notice(
                    format!("Could not remove the saved API key: {e}"),
                    NoticeLevel::Error,
                ),
            },
            Command::Help => self.push_notice(help_line(), NoticeLevel::Info),
            Command::Quit => self.quit = true,
            Command::Unknown(name) => {
                self.push_notice(format!("Unknown command: /{name}"), NoticeLevel::Warning);
            }
            Command::Empty => {}
        }
    }

    fn save_credential(&mut self) {
        let value = self.secret.take_text();
        let value = value.trim();
        self.mode = InputMode::Insert;

        let current = self.credentials.get();
        if value.is_empty() {
            if current.is_some() {
                self.push_notice("API key unchanged", NoticeLevel::Info);
            } else {
                self.push_notice("No API key entered", NoticeLevel::Warning);
            }
            return;
        }
        if current.is_some_and(|c| c.expose() == value) {
            self.push_notice("API key unchanged", NoticeLevel::Info);
            return;
        }

        match self.credentials.set(value) {
            Ok(()) => self.push_notice("API key saved", NoticeLevel::Info),
            Err(e @ CredentialError::Persist { .. }) => self.push_notice(
                format!("API key kept for this session only. {e}"),
                NoticeLevel::Error,
            ),
            Err(CredentialError::Blank) => {
                self.push_notice("No API key entered", NoticeLevel::Warning);
            }
        }
    }
}

/// Re-parse an owned line; `submit` has already checked it is a command.
fn command_from(line: &str) -> Command<'_> {
    Command::parse(line).unwrap_or(Command::Empty)
}
