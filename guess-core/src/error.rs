//! Errors from session operations.

use crate::backend::BackendError;
use crate::session::Role;
use thiserror::Error;

/// Errors returned by the session controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("No game in progress - start one first")]
    NotStarted,

    #[error("A game is already running - reset before starting another")]
    AlreadyStarted,

    #[error("The game is over - reset to play again")]
    GameOver,

    #[error("Action '{action}' is not available when the role is {role}")]
    InvalidAction { role: Role, action: &'static str },

    #[error("The game has not opened yet - retry the opening call or give up")]
    NotOpened,

    #[error("Questions cannot be empty")]
    EmptyQuestion,

    #[error("Category seed pool is empty")]
    EmptySeedPool,

    #[error("Sentinel table v{version} needs at least one non-blank win and reveal phrase")]
    InvalidSentinels { version: u32 },

    #[error("No failed action to retry")]
    NothingToRetry,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl SessionError {
    /// The backend failure behind this error, if any.
    pub fn backend(&self) -> Option<&BackendError> {
        match self {
            SessionError::Backend(e) => Some(e),
            _ => None,
        }
    }

    /// Whether the same action can be resubmitted.
    pub fn is_retryable(&self) -> bool {
        self.backend().is_some_and(BackendError::is_retryable)
    }
}
