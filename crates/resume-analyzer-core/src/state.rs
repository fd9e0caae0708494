//! UI-agnostic application state types
//!
//! This module contains data structures that are shared between the
//! controllers and whatever front-end renders them (TUI, one-shot CLI).

use serde::{Deserialize, Serialize};

/// The role of a transcript entry's author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// Resolution state of a single turn.
///
/// An assistant turn starts out `Pending` and is resolved in place exactly
/// once, either with the backend's answer or with the failure message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "text", rename_all = "lowercase")]
pub enum TurnState {
    Pending,
    Resolved(String),
    Failed(String),
}

/// One entry in the conversation transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: ChatRole,
    pub state: TurnState,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            state: TurnState::Resolved(text.into()),
        }
    }

    pub fn pending() -> Self {
        Self {
            role: ChatRole::Assistant,
            state: TurnState::Pending,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, TurnState::Pending)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, TurnState::Failed(_))
    }

    /// Text of a resolved or failed turn. `None` while pending.
    pub fn text(&self) -> Option<&str> {
        match &self.state {
            TurnState::Pending => None,
            TurnState::Resolved(text) | TurnState::Failed(text) => Some(text),
        }
    }
}

/// Result of one successful batch upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub files_saved: u64,
    pub chunks_indexed: u64,
}

impl UploadOutcome {
    pub fn summary(&self) -> String {
        format!(
            "Uploaded {} file(s), indexed {} chunks.",
            self.files_saved, self.chunks_indexed
        )
    }
}

/// Answer returned for one chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub answer: String,
}
