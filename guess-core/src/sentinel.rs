//! Sentinel phrases that mark game events in backend replies.
//!
//! Role instructions force the backend to emit a fixed phrase when it makes
//! its final guess, when the player guesses right, or when it reveals the
//! answer. The tables are versioned and can be swapped per game.

use crate::config::Language;
use crate::error::SessionError;
use crate::session::Role;
use serde::{Deserialize, Serialize};

/// Win and reveal markers for one role.
///
/// The first entry of each list is the phrase the instructions ask for; the
/// remaining entries are also accepted when matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentinelTable {
    pub version: u32,
    pub win: Vec<String>,
    pub reveal: Vec<String>,
}

impl SentinelTable {
    /// Version of the built-in tables.
    pub const BUILTIN_VERSION: u32 = 1;

    pub fn new<W, R>(version: u32, win: W, reveal: R) -> Self
    where
        W: IntoIterator,
        W::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            version,
            win: win.into_iter().map(Into::into).collect(),
            reveal: reveal.into_iter().map(Into::into).collect(),
        }
    }

    /// Built-in table for a role, with the given language's phrases first.
    pub fn builtin(role: Role, language: Language) -> Self {
        let (zh_win, en_win, zh_reveal, en_reveal) = match role {
            Role::BackendAsks => ("答案是", "My final answer is", "我猜不出来", "I cannot guess"),
            Role::HumanAsks => ("恭喜", "Congratulations", "正确答案是", "The correct answer was"),
        };

        match language {
            Language::Chinese => Self::new(
                Self::BUILTIN_VERSION,
                [zh_win, en_win],
                [zh_reveal, en_reveal],
            ),
            Language::English => Self::new(
                Self::BUILTIN_VERSION,
                [en_win, zh_win],
                [en_reveal, zh_reveal],
            ),
        }
    }

    /// Reject tables the instructions cannot be built from.
    pub fn validate(&self) -> Result<(), SessionError> {
        let blank = |list: &[String]| list.is_empty() || list.iter().any(|s| s.trim().is_empty());
        if blank(&self.win) || blank(&self.reveal) {
            return Err(SessionError::InvalidSentinels {
                version: self.version,
            });
        }
        Ok(())
    }

    /// Phrase the backend is told to use on a win.
    pub fn primary_win(&self) -> &str {
        self.win.first().map(String::as_str).unwrap_or_default()
    }

    /// Phrase the backend is told to use when revealing the answer.
    pub fn primary_reveal(&self) -> &str {
        self.reveal.first().map(String::as_str).unwrap_or_default()
    }

    pub fn matches_win(&self, reply: &str) -> bool {
        contains_any(reply, &self.win)
    }

    pub fn matches_reveal(&self, reply: &str) -> bool {
        contains_any(reply, &self.reveal)
    }
}

/// Substring match, ignoring ASCII case.
fn contains_any(reply: &str, phrases: &[String]) -> bool {
    let reply = reply.to_ascii_lowercase();
    phrases
        .iter()
        .filter(|p| !p.is_empty())
        .any(|p| reply.contains(&p.to_ascii_lowercase()))
}
