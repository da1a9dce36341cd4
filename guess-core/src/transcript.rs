//! Append-only conversation log.
//!
//! Every utterance of a game is a [`Turn`]. Hidden turns carry scaffolding
//! prompts to the backend and are never shown to the player; the backend
//! always receives the whole log.

use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Human,
    Backend,
}

/// One utterance in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Position in the transcript, assigned on append.
    pub index: usize,
    pub speaker: Speaker,
    pub content: String,
    /// Whether the turn is rendered to the player.
    pub visible: bool,
}

/// The ordered list of turns owned by a session.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn at the end of the log.
    pub fn append(&mut self, speaker: Speaker, content: impl Into<String>, visible: bool) -> &Turn {
        let index = self.turns.len();
        self.turns.push(Turn {
            index,
            speaker,
            content: content.into(),
            visible,
        });
        &self.turns[index]
    }

    /// Turns the player is allowed to see, in creation order.
    ///
    /// The iterator is `Clone`, so a renderer can walk it more than once.
    pub fn visible_turns(&self) -> impl Iterator<Item = &Turn> + Clone + '_ {
        self.turns.iter().filter(|t| t.visible)
    }

    /// Every turn, hidden ones included.
    pub fn all_turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Whether the backend has replied at least once.
    pub fn has_backend_turn(&self) -> bool {
        self.turns.iter().any(|t| t.speaker == Speaker::Backend)
    }
}
