//! Reasoning backend contract and the Claude-backed adapter.
//!
//! A backend turns a system instruction plus the full transcript into one
//! reply. It keeps no state between calls and never retries; the session
//! controller owns timeouts and backoff.

use crate::transcript::{Speaker, Turn};
use async_trait::async_trait;
use claude::{Claude, Message, Request, Role};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Typed backend failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Quota or request frequency exceeded; wait before retrying.
    #[error("Backend rate limited{}", retry_hint(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    /// Network, timeout or parse hiccup; safe to retry right away.
    #[error("Transient backend failure: {0}")]
    Transient(String),

    /// Configuration or authentication problem; retrying will not help.
    #[error("Backend failure: {0}")]
    Fatal(String),
}

fn retry_hint(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(" (retry after {}s)", d.as_secs()),
        None => String::new(),
    }
}

/// Coarse classification of a [`BackendError`], for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    RateLimited,
    Transient,
    Fatal,
}

impl BackendError {
    pub fn kind(&self) -> FailureKind {
        match self {
            BackendError::RateLimited { .. } => FailureKind::RateLimited,
            BackendError::Transient(_) => FailureKind::Transient,
            BackendError::Fatal(_) => FailureKind::Fatal,
        }
    }

    /// Whether resubmitting the same call can succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, BackendError::Fatal(_))
    }

    /// Server-suggested wait, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            BackendError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl From<claude::Error> for BackendError {
    fn from(err: claude::Error) -> Self {
        tracing::debug!(status = ?err.status(), error = %err, "claude call failed");
        match err {
            claude::Error::RateLimited { retry_after } => BackendError::RateLimited { retry_after },
            claude::Error::Network(msg) => BackendError::Transient(msg),
            claude::Error::Timeout => BackendError::Transient("request timed out".to_string()),
            claude::Error::Parse(msg) => BackendError::Transient(format!("unreadable reply: {msg}")),
            claude::Error::Api { status, message } => match status {
                408 | 409 | 500..=599 => {
                    BackendError::Transient(format!("server error {status}: {message}"))
                }
                401 | 403 => BackendError::Fatal(format!("authentication failed: {message}")),
                _ => BackendError::Fatal(format!("request rejected ({status}): {message}")),
            },
            claude::Error::NoApiKey => {
                BackendError::Fatal("ANTHROPIC_API_KEY is not configured".to_string())
            }
            claude::Error::Config(msg) => BackendError::Fatal(msg),
        }
    }
}

/// One transcript entry as the backend sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendMessage {
    pub speaker: Speaker,
    pub content: String,
}

impl From<&Turn> for BackendMessage {
    fn from(turn: &Turn) -> Self {
        Self {
            speaker: turn.speaker,
            content: turn.content.clone(),
        }
    }
}

/// A single call to the backend.
#[derive(Debug, Clone)]
pub struct BackendRequest {
    pub system: String,
    pub transcript: Vec<BackendMessage>,
    /// Opaque model selector; `None` lets the backend pick its default.
    pub model: Option<String>,
    pub max_tokens: usize,
    pub temperature: Option<f32>,
}

impl BackendRequest {
    pub fn new(system: impl Into<String>, transcript: Vec<BackendMessage>) -> Self {
        Self {
            system: system.into(),
            transcript,
            model: None,
            max_tokens: 1024,
            temperature: None,
        }
    }
}

/// A reasoning backend.
///
/// Implementations must tolerate concurrent calls from independent sessions.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Produce the next reply for the given transcript.
    async fn complete(&self, request: &BackendRequest) -> Result<String, BackendError>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

/// Backend that talks to the Anthropic Messages API.
#[derive(Clone)]
pub struct ClaudeBackend {
    client: Claude,
}

impl ClaudeBackend {
    pub fn new(client: Claude) -> Self {
        Self { client }
    }

    /// Build a backend from the ANTHROPIC_API_KEY environment variable.
    pub fn from_env() -> Result<Self, BackendError> {
        Ok(Self::new(Claude::from_env()?))
    }
}

#[async_trait]
impl Backend for ClaudeBackend {
    async fn complete(&self, request: &BackendRequest) -> Result<String, BackendError> {
        let mut api_request = Request::new(to_messages(&request.transcript))
            .with_system(&request.system)
            .with_max_tokens(request.max_tokens);

        if let Some(ref model) = request.model {
            api_request = api_request.with_model(model);
        }

        if let Some(temp) = request.temperature {
            api_request = api_request.with_temperature(temp);
        }

        let response = self.client.complete(api_request).await?;
        let text = response.text.trim();

        if text.is_empty() {
            return Err(BackendError::Transient(format!(
                "empty reply (stop reason {:?})",
                response.stop_reason
            )));
        }

        tracing::debug!(
            model = request.model.as_deref().unwrap_or(self.client.model()),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "backend replied"
        );

        Ok(text.to_string())
    }

    fn name(&self) -> &str {
        "claude"
    }
}

/// Convert a transcript into Messages API messages.
///
/// The API wants strictly alternating roles starting with the user, so runs
/// of turns from the same speaker are folded into one message.
fn to_messages(transcript: &[BackendMessage]) -> Vec<Message> {
    let mut messages: Vec<Message> = Vec::new();

    for entry in transcript {
        let role = match entry.speaker {
            Speaker::Human => Role::User,
            Speaker::Backend => Role::Assistant,
        };

        match messages.last_mut() {
            Some(last) if last.role == role => {
                last.content.push_str("\n\n");
                last.content.push_str(&entry.content);
            }
            _ => messages.push(Message {
                role,
                content: entry.content.clone(),
            }),
        }
    }

    messages
}
