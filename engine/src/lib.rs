//! Turn lifecycle engine for Parley.
//!
//! - [`TurnController`] runs one submission at a time against a [`Transport`]
//!   (see `parley-providers`), rendering through a [`RenderSink`] and holding an
//!   [`InputGate`] for the length of the turn.
//! - [`App`] is the front-end state the terminal UI draws: it owns the receiving
//!   end of the view channel the controller's sink and gate write to.
//!
//! Nothing here touches the terminal.
//!
//! [`Transport`]: parley_providers::Transport

mod app;
mod commands;
mod controller;
mod draft;
mod errors;
mod gate;
mod sink;
mod timer;
mod transcript;
mod turn;

pub use app::{App, AppOptions, InputMode, NOTICE_TTL, Notice, NoticeLevel};
pub use commands::{COMMAND_SPECS, Command, CommandSpec};
pub use controller::TurnController;
pub use draft::DraftInput;
pub use errors::{CREDENTIAL_HINT, EMPTY_REPLY_MESSAGE, MISSING_CREDENTIAL_MESSAGE, TurnError};
pub use gate::{InputGate, SharedGate};
pub use sink::{
    ChannelSink, PLACEHOLDER_TEXT, PlaceholderHandle, RenderSink, ViewEvent, ViewReceiver,
    ViewSender, view_channel,
};
pub use transcript::{Entry, ScrollState, Transcript};
pub use turn::{Turn, TurnOutcome, TurnPhase, TurnReport};
