//! Decides whether a reply ends the game.
//!
//! Only an explicit player surrender or a configured sentinel ends a game.
//! Missing question marks, short replies and the like are ignored.

use crate::sentinel::SentinelTable;
use crate::session::{Action, Outcome};
use serde::{Deserialize, Serialize};

/// Result of inspecting one reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub ended: bool,
    pub outcome: Outcome,
}

impl Verdict {
    pub const CONTINUE: Verdict = Verdict {
        ended: false,
        outcome: Outcome::None,
    };

    pub fn win() -> Self {
        Self {
            ended: true,
            outcome: Outcome::Win,
        }
    }

    pub fn loss() -> Self {
        Self {
            ended: true,
            outcome: Outcome::Loss,
        }
    }
}

/// Classify a reply, first match wins:
/// surrender, then win sentinel, then reveal sentinel.
pub fn detect(sentinels: &SentinelTable, action: &Action, reply: &str) -> Verdict {
    if action.is_surrender() {
        return Verdict::loss();
    }
    if sentinels.matches_win(reply) {
        return Verdict::win();
    }
    if sentinels.matches_reveal(reply) {
        return Verdict::loss();
    }
    Verdict::CONTINUE
}
