//! The backend plays detective; the player answers.

use super::{ActionPrompt, RoleStrategy};
use crate::config::Language;
use crate::error::SessionError;
use crate::sentinel::SentinelTable;
use crate::session::{Action, Role, Session};

pub struct BackendAsks {
    language: Language,
    sentinels: SentinelTable,
}

impl BackendAsks {
    pub fn new(language: Language, sentinels: SentinelTable) -> Self {
        Self {
            language,
            sentinels,
        }
    }
}

impl RoleStrategy for BackendAsks {
    fn role(&self) -> Role {
        Role::BackendAsks
    }

    fn sentinels(&self) -> &SentinelTable {
        &self.sentinels
    }

    fn system_instruction(&self, session: &Session) -> String {
        let template = match self.language {
            Language::Chinese => include_str!("prompts/zh/backend_asks.txt"),
            Language::English => include_str!("prompts/en/backend_asks.txt"),
        };

        let mut prompt = template
            .replace("{win}", self.sentinels.primary_win())
            .replace("{reveal}", self.sentinels.primary_reveal());

        prompt.push_str("\n\n");
        prompt.push_str(&match self.language {
            Language::Chinese => format!("你已经问了 {} 个问题。", session.turn_count()),
            Language::English => format!(
                "You have asked {} questions so far.",
                session.turn_count()
            ),
        });

        prompt
    }

    fn action_prompt(&self, action: &Action) -> Result<ActionPrompt, SessionError> {
        let phrases = self.language.phrases();
        match action {
            Action::Open => Ok(ActionPrompt::hidden(phrases.backend_asks_open)),
            Action::Answer(choice) => Ok(ActionPrompt::visible(self.language.choice_label(*choice))),
            Action::Surrender => Ok(ActionPrompt::hidden(phrases.backend_asks_surrender)),
            Action::Ask(_) | Action::Hint => Err(self.reject(action)),
        }
    }
}
