//! Role strategies.
//!
//! A strategy owns everything that differs between the two ways of playing:
//! the system instruction, the text each player action puts into the
//! transcript, and the sentinels used to interpret replies.

mod backend_asks;
mod human_asks;

pub use backend_asks::BackendAsks;
pub use human_asks::HumanAsks;

use crate::config::Language;
use crate::error::SessionError;
use crate::sentinel::SentinelTable;
use crate::session::{Action, Choice, Role, Session};
use crate::termination::{self, Verdict};
use crate::transcript::Speaker;
use serde::{Deserialize, Serialize};

/// Seat a speaker occupies in the current game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Seat {
    Asker,
    Responder,
}

/// The turn an action appends to the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionPrompt {
    pub content: String,
    /// Scaffolding prompts are hidden from the player.
    pub visible: bool,
}

impl ActionPrompt {
    pub fn visible(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            visible: true,
        }
    }

    pub fn hidden(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            visible: false,
        }
    }
}

/// Behaviour that differs between roles.
pub trait RoleStrategy: Send + Sync {
    fn role(&self) -> Role;

    fn sentinels(&self) -> &SentinelTable;

    /// System instruction for the next backend call.
    fn system_instruction(&self, session: &Session) -> String;

    /// Turn to append for `action`, or an error if the role does not allow it.
    fn action_prompt(&self, action: &Action) -> Result<ActionPrompt, SessionError>;

    /// Decide whether `reply`, produced in response to `action`, ends the game.
    fn interpret(&self, reply: &str, action: &Action) -> Verdict {
        termination::detect(self.sentinels(), action, reply)
    }

    fn reject(&self, action: &Action) -> SessionError {
        SessionError::InvalidAction {
            role: self.role(),
            action: action.name(),
        }
    }
}

impl Role {
    /// Map a transcript speaker onto asker/responder for this role.
    pub fn seat(self, speaker: Speaker) -> Seat {
        match (self, speaker) {
            (Role::BackendAsks, Speaker::Backend) | (Role::HumanAsks, Speaker::Human) => {
                Seat::Asker
            }
            _ => Seat::Responder,
        }
    }

    /// Build the strategy for this role.
    pub fn strategy(self, language: Language, sentinels: SentinelTable) -> Box<dyn RoleStrategy> {
        match self {
            Role::BackendAsks => Box::new(BackendAsks::new(language, sentinels)),
            Role::HumanAsks => Box::new(HumanAsks::new(language, sentinels)),
        }
    }
}

/// Fixed player-side phrases for one language.
struct Phrases {
    yes: &'static str,
    no: &'static str,
    unsure: &'static str,
    backend_asks_open: &'static str,
    backend_asks_surrender: &'static str,
    human_asks_open: &'static str,
    human_asks_hint: &'static str,
    human_asks_surrender: &'static str,
}

const ZH: Phrases = Phrases {
    yes: "是的",
    no: "不是",
    unsure: "不确定",
    backend_asks_open: "我已经想好了一位著名人物。请开始提问，先问第一个问题。",
    backend_asks_surrender: "我不想继续了。请直接说出你目前最好的猜测。",
    human_asks_open: "我准备好了。请先给我第一条提示，不要说出名字。",
    human_asks_hint: "请再给我一条新的提示，不要重复之前的提示。",
    human_asks_surrender: "我放弃了，请告诉我答案。",
};

const EN: Phrases = Phrases {
    yes: "Yes",
    no: "No",
    unsure: "Not sure",
    backend_asks_open: "I have a famous person in mind. Please start and ask your first question.",
    backend_asks_surrender: "I want to stop here. Tell me your best guess right now.",
    human_asks_open: "I'm ready. Give me the first hint, without saying the name.",
    human_asks_hint: "Give me another hint, different from the previous ones.",
    human_asks_surrender: "I give up. Please tell me the answer.",
};

impl Language {
    fn phrases(&self) -> &'static Phrases {
        match self {
            Language::Chinese => &ZH,
            Language::English => &EN,
        }
    }

    /// Transcript text for an answer button.
    pub fn choice_label(&self, choice: Choice) -> &'static str {
        let phrases = self.phrases();
        match choice {
            Choice::Yes => phrases.yes,
            Choice::No => phrases.no,
            Choice::Unsure => phrases.unsure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_labels() {
        assert_eq!(Language::Chinese.choice_label(Choice::Yes), "是的");
        assert_eq!(Language::Chinese.choice_label(Choice::Unsure), "不确定");
        assert_eq!(Language::English.choice_label(Choice::No), "No");
    }

    #[test]
    fn test_seats() {
        assert_eq!(Role::BackendAsks.seat(Speaker::Backend), Seat::Asker);
        assert_eq!(Role::BackendAsks.seat(Speaker::Human), Seat::Responder);
        assert_eq!(Role::HumanAsks.seat(Speaker::Human), Seat::Asker);
        assert_eq!(Role::HumanAsks.seat(Speaker::Backend), Seat::Responder);

        let human_asks = Role::HumanAsks.strategy(
            Language::Chinese,
            SentinelTable::builtin(Role::HumanAsks, Language::Chinese),
        );
        assert_eq!(human_asks.role(), Role::HumanAsks);
    }
}
