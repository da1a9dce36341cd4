//! Testing utilities for the guessing game.
//!
//! This module provides tools for integration testing:
//! - `MockBackend` for deterministic testing without API calls
//! - `TestHarness` for scripted game scenarios
//! - Assertion helpers for verifying session state

use crate::backend::{Backend, BackendError, BackendRequest};
use crate::config::GameConfig;
use crate::controller::{SessionController, Snapshot, TurnResult};
use crate::error::SessionError;
use crate::session::{Outcome, Role, Status};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// A scripted backend reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Error(BackendError),
    /// Never answers; exercises the controller's timeout.
    Stall,
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        MockReply::Text(text.into())
    }

    pub fn rate_limited() -> Self {
        MockReply::Error(BackendError::RateLimited { retry_after: None })
    }
}

/// A backend that returns scripted replies and records every call.
#[derive(Debug, Default)]
pub struct MockBackend {
    replies: Mutex<VecDeque<MockReply>>,
    calls: Mutex<Vec<BackendRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock that answers with the given texts, in order.
    pub fn with_replies<I>(replies: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mock = Self::new();
        for reply in replies {
            mock.queue(MockReply::Text(reply.into()));
        }
        mock
    }

    /// Add a reply to the queue.
    pub fn queue(&self, reply: MockReply) {
        lock(&self.replies).push_back(reply);
    }

    /// Every request received so far.
    pub fn calls(&self) -> Vec<BackendRequest> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn last_call(&self) -> Option<BackendRequest> {
        lock(&self.calls).last().cloned()
    }

    /// Number of scripted replies not yet consumed.
    pub fn remaining(&self) -> usize {
        lock(&self.replies).len()
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn complete(&self, request: &BackendRequest) -> Result<String, BackendError> {
        lock(&self.calls).push(request.clone());

        let reply = lock(&self.replies)
            .pop_front()
            .unwrap_or_else(|| MockReply::text("The backend has no more scripted replies."));

        match reply {
            MockReply::Text(text) => Ok(text),
            MockReply::Error(err) => Err(err),
            MockReply::Stall => std::future::pending::<Result<String, BackendError>>().await,
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Test harness for running game scenarios.
pub struct TestHarness {
    /// The mock backend, shared with the controller.
    pub backend: Arc<MockBackend>,
    /// The controller under test.
    pub controller: SessionController,
}

impl TestHarness {
    pub fn new() -> Self {
        let backend = Arc::new(MockBackend::new());
        let controller = SessionController::new(backend.clone());
        Self {
            backend,
            controller,
        }
    }

    /// Queue a text reply.
    pub fn expect_reply(&mut self, text: impl Into<String>) -> &mut Self {
        self.backend.queue(MockReply::text(text));
        self
    }

    /// Queue a backend failure.
    pub fn expect_error(&mut self, err: BackendError) -> &mut Self {
        self.backend.queue(MockReply::Error(err));
        self
    }

    /// Deterministic config for `role` (fixed category seed).
    pub fn config(role: Role) -> GameConfig {
        GameConfig::new(role).with_category_seed("中国古代历史人物")
    }

    /// Start a game with [`TestHarness::config`].
    pub async fn start(&mut self, role: Role) -> Result<TurnResult, SessionError> {
        self.controller.start(Self::config(role)).await
    }

    pub fn snapshot(&self) -> Snapshot {
        self.controller.snapshot()
    }

    pub fn status(&self) -> Status {
        self.controller.status()
    }

    pub fn outcome(&self) -> Outcome {
        self.controller.snapshot().outcome
    }

    pub fn turn_count(&self) -> u32 {
        self.controller.snapshot().turn_count
    }

    /// Total turns in the transcript, hidden ones included.
    pub fn transcript_len(&self) -> usize {
        self.controller
            .session()
            .map(|s| s.transcript().len())
            .unwrap_or(0)
    }

    pub fn calls(&self) -> usize {
        self.backend.call_count()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendRequest;

    #[tokio::test]
    async fn test_mock_replies_in_order() {
        let mock = MockBackend::with_replies(["one", "two"]);
        let request = BackendRequest::new("system", Vec::new());

        assert_eq!(mock.complete(&request).await.unwrap(), "one");
        assert_eq!(mock.complete(&request).await.unwrap(), "two");
        assert!(mock.complete(&request).await.unwrap().contains("no more"));
        assert_eq!(mock.call_count(), 3);
        assert_eq!(mock.remaining(), 0);
    }

    #[tokio::test]
    async fn test_mock_errors() {
        let mock = MockBackend::new();
        mock.queue(MockReply::rate_limited());
        let request = BackendRequest::new("system", Vec::new());
        assert!(matches!(
            mock.complete(&request).await,
            Err(BackendError::RateLimited { .. })
        ));
    }
}
