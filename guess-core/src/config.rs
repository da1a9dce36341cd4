//! Game configuration.

use crate::error::SessionError;
use crate::sentinel::SentinelTable;
use crate::session::Role;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Categories the hidden subject is drawn from when none are configured.
const DEFAULT_CATEGORIES_ZH: &[&str] = &[
    "中国古代历史人物",
    "世界著名科学家",
    "体育明星",
    "动漫角色",
    "电影角色",
    "文学作品中的人物",
    "音乐家",
    "艺术家",
    "政治领袖",
    "神话传说人物",
    "企业家",
    "探险家",
];

const DEFAULT_CATEGORIES_EN: &[&str] = &[
    "historical figures from ancient China",
    "world-famous scientists",
    "sports stars",
    "anime characters",
    "movie characters",
    "characters from literature",
    "musicians",
    "painters and sculptors",
    "political leaders",
    "figures from myths and legends",
    "entrepreneurs",
    "explorers",
];

/// Language of instructions, scaffolding prompts and answer labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    Chinese,
    English,
}

impl Language {
    /// Built-in category pool for this language.
    pub fn default_categories(&self) -> Vec<String> {
        let pool = match self {
            Language::Chinese => DEFAULT_CATEGORIES_ZH,
            Language::English => DEFAULT_CATEGORIES_EN,
        };
        pool.iter().map(|s| s.to_string()).collect()
    }
}

/// Backoff applied by the controller to retryable backend failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first call. Zero reports failures immediately.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Never retry.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Exponential backoff starting at `base_delay`, capped at 30 seconds.
    pub fn exponential(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Delay before retry number `attempt` (zero-based), or `None` to stop.
    ///
    /// A server hint replaces the computed delay and is never shortened.
    /// A hint longer than `max_delay` stops retrying so the caller can
    /// report the wait instead of blocking on it.
    pub fn delay_for(&self, attempt: u32, hint: Option<Duration>) -> Option<Duration> {
        match hint {
            Some(hint) if hint > self.max_delay => None,
            Some(hint) => Some(hint),
            None => {
                let computed = self.base_delay.saturating_mul(1u32 << attempt.min(16));
                Some(computed.min(self.max_delay))
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Options recognized when a game starts.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub role: Role,
    pub language: Language,

    /// Categories to draw the hidden subject from (human-asks only).
    /// `None` uses the language's built-in pool.
    pub category_seed_pool: Option<Vec<String>>,

    /// Fixed category, bypassing the random draw.
    pub category_seed: Option<String>,

    /// Opaque model selector passed through to the backend.
    pub model: Option<String>,

    pub max_tokens: usize,
    pub temperature: Option<f32>,

    /// Deadline for a single backend call.
    pub request_timeout: Duration,

    pub retry: RetryPolicy,

    /// Replacement sentinel table for the role.
    pub sentinels: Option<SentinelTable>,
}

impl GameConfig {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            language: Language::default(),
            category_seed_pool: None,
            category_seed: None,
            model: None,
            max_tokens: 1024,
            temperature: Some(0.8),
            request_timeout: Duration::from_secs(60),
            retry: RetryPolicy::none(),
            sentinels: None,
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn with_category_pool<I>(mut self, pool: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.category_seed_pool = Some(pool.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_category_seed(mut self, seed: impl Into<String>) -> Self {
        self.category_seed = Some(seed.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_max_tokens(mut self, tokens: usize) -> Self {
        self.max_tokens = tokens;
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_sentinels(mut self, sentinels: SentinelTable) -> Self {
        self.sentinels = Some(sentinels);
        self
    }

    /// Sentinel table in effect for this game.
    pub fn sentinel_table(&self) -> SentinelTable {
        self.sentinels
            .clone()
            .unwrap_or_else(|| SentinelTable::builtin(self.role, self.language))
    }

    /// Draw the category seed for a new human-asks game.
    pub fn pick_category_seed<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<String, SessionError> {
        if let Some(ref seed) = self.category_seed {
            return Ok(seed.clone());
        }

        let pool = self
            .category_seed_pool
            .clone()
            .unwrap_or_else(|| self.language.default_categories());

        pool.iter()
            .filter(|c| !c.trim().is_empty())
            .collect::<Vec<_>>()
            .choose(rng)
            .map(|c| c.trim().to_string())
            .ok_or(SessionError::EmptySeedPool)
    }
}
