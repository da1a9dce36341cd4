//! The backend hides a subject; the player asks.

use super::{ActionPrompt, RoleStrategy};
use crate::config::Language;
use crate::error::SessionError;
use crate::sentinel::SentinelTable;
use crate::session::{Action, Role, Session};

pub struct HumanAsks {
    language: Language,
    sentinels: SentinelTable,
}

impl HumanAsks {
    pub fn new(language: Language, sentinels: SentinelTable) -> Self {
        Self {
            language,
            sentinels,
        }
    }

    fn fallback_category(&self) -> &'static str {
        match self.language {
            Language::Chinese => "著名人物",
            Language::English => "famous people",
        }
    }
}

impl RoleStrategy for HumanAsks {
    fn role(&self) -> Role {
        Role::HumanAsks
    }

    fn sentinels(&self) -> &SentinelTable {
        &self.sentinels
    }

    fn system_instruction(&self, session: &Session) -> String {
        let template = match self.language {
            Language::Chinese => include_str!("prompts/zh/human_asks.txt"),
            Language::English => include_str!("prompts/en/human_asks.txt"),
        };

        let category = session
            .category_seed()
            .unwrap_or_else(|| self.fallback_category());

        template
            .replace("{category}", category)
            .replace("{hints_given}", &session.hints_given().to_string())
            .replace("{win}", self.sentinels.primary_win())
            .replace("{reveal}", self.sentinels.primary_reveal())
    }

    fn action_prompt(&self, action: &Action) -> Result<ActionPrompt, SessionError> {
        let phrases = self.language.phrases();
        match action {
            Action::Open => Ok(ActionPrompt::hidden(phrases.human_asks_open)),
            Action::Ask(question) => {
                let question = question.trim();
                if question.is_empty() {
                    return Err(SessionError::EmptyQuestion);
                }
                Ok(ActionPrompt::visible(question))
            }
            Action::Hint => Ok(ActionPrompt::hidden(phrases.human_asks_hint)),
            Action::Surrender => Ok(ActionPrompt::hidden(phrases.human_asks_surrender)),
            Action::Answer(_) => Err(self.reject(action)),
        }
    }
}
