//! Slash commands typed into the entry. They never reach the API.

#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub label: &'static str,
    pub description: &'static str,
}

pub const COMMAND_SPECS: &[CommandSpec] = &[
    CommandSpec {
        label: "/key",
        description: "Enter or replace the API key",
    },
    CommandSpec {
        label: "/forget",
        description: "Remove the stored API key",
    },
    CommandSpec {
        label: "/help",
        description: "List commands",
    },
    CommandSpec {
        label: "/quit",
        description: "Exit",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Key,
    Forget,
    Help,
    Quit,
    Unknown(&'a str),
    Empty,
}

impl<'a> Command<'a> {
    /// Parse a line that starts with `/`. Returns `None` for ordinary text.
    #[must_use]
    pub fn parse(line: &'a str) -> Option<Self> {
        let rest = line.trim().strip_prefix('/')?;
        let command = match rest.split_whitespace().next() {
            Some("key") => Command::Key,
            Some("forget") => Command::Forget,
            Some("help" | "?") => Command::Help,
            Some("q" | "quit") => Command::Quit,
            Some(other) => Command::Unknown(other),
            None => Command::Empty,
        };
        Some(command)
    }
}

/// One-line summary of every command, for the help notice.
#[must_use]
pub fn help_line() -> String {
    COMMAND_SPECS
        .iter()
        .map(|spec| format!("{} {}", spec.label, spec.description.to_lowercase()))
        .collect::<Vec<_>>()
        .join(" · ")
}
