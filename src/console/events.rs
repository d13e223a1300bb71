//! Events emitted toward the display surface.
//!
//! Everything the console core says to its UI goes through these types,
//! delivered over an unbounded channel. They serialize to JSON for the
//! binary's `--json` output mode.

use serde::Serialize;

/// Display classification for one piece of output text.
///
/// `Complete` is a terminal single response. `Part` is one message among an
/// open-ended subscription stream. `Error` is terminal for the command that
/// produced it but not for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Complete,
    Part,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputEvent {
    pub text: String,
    pub kind: OutputKind,
}

impl OutputEvent {
    pub fn complete(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: OutputKind::Complete,
        }
    }

    pub fn part(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: OutputKind::Part,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: OutputKind::Error,
        }
    }
}

/// Prompt text change. `show` is true for the initial display on connect;
/// false means an existing prompt should be rewritten in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptUpdate {
    pub text: String,
    pub show: bool,
}

/// Union delivered to the display surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ConsoleEvent {
    Output(OutputEvent),
    Prompt(PromptUpdate),
}

/* --------------------------------- Tests ---------------------------------- */
