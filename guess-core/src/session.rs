//! Game session state.
//!
//! A [`Session`] is one game: its role, lifecycle status, outcome, counters
//! and transcript. Only the [`SessionController`](crate::SessionController)
//! mutates it.

use crate::transcript::Transcript;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Which side holds the secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// The backend plays detective; the player answers yes/no/unsure.
    BackendAsks,
    /// The backend hides a subject; the player asks free-text questions.
    HumanAsks,
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Role::BackendAsks => "backend-asks",
            Role::HumanAsks => "human-asks",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lifecycle of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    NotStarted,
    InProgress,
    Ended,
}

/// How an ended game finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    #[default]
    None,
    Win,
    Loss,
}

/// The player's reply to a backend question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Choice {
    Yes,
    No,
    Unsure,
}

/// Something the player (or the controller on their behalf) does.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    /// Opening request issued by `start`.
    Open,
    Answer(Choice),
    Ask(String),
    Hint,
    Surrender,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Open => "open",
            Action::Answer(_) => "answer",
            Action::Ask(_) => "ask",
            Action::Hint => "hint",
            Action::Surrender => "surrender",
        }
    }

    pub fn is_surrender(&self) -> bool {
        matches!(self, Action::Surrender)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unique session identifier, used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One game instance.
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) id: SessionId,
    pub(crate) role: Role,
    pub(crate) status: Status,
    pub(crate) outcome: Outcome,
    pub(crate) turn_count: u32,
    pub(crate) category_seed: Option<String>,
    pub(crate) hints_given: u32,
    pub(crate) transcript: Transcript,
}

impl Session {
    pub(crate) fn new(role: Role, category_seed: Option<String>) -> Self {
        Self {
            id: SessionId::new(),
            role,
            status: Status::NotStarted,
            outcome: Outcome::None,
            turn_count: 0,
            category_seed,
            hints_given: 0,
            transcript: Transcript::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Number of counted (visible, successful) player actions.
    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    /// Category the hidden subject is drawn from (human-asks games only).
    pub fn category_seed(&self) -> Option<&str> {
        self.category_seed.as_deref()
    }

    pub fn hints_given(&self) -> u32 {
        self.hints_given
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Record a terminal verdict. Ended sessions never leave `Ended`.
    pub(crate) fn end(&mut self, outcome: Outcome) {
        self.status = Status::Ended;
        self.outcome = outcome;
    }
}
