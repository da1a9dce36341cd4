//! SessionController - the primary public API for playing a game.
//!
//! The controller owns at most one [`Session`] at a time and is the only
//! thing that mutates it. Every mutating method takes `&mut self`, so a
//! session never has more than one backend call in flight and a reset can
//! only happen once the current call has settled.

use crate::backend::{Backend, BackendError, BackendMessage, BackendRequest, FailureKind};
use crate::config::{GameConfig, RetryPolicy};
use crate::error::SessionError;
use crate::role::{ActionPrompt, RoleStrategy};
use crate::session::{Action, Choice, Outcome, Role, Session, SessionId, Status};
use crate::termination::Verdict;
use crate::transcript::{Speaker, Turn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// A failed action, as shown to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionFailure {
    pub kind: FailureKind,
    pub message: String,
    /// Whether offering "try again" makes sense.
    pub retryable: bool,
    /// How long to wait before resubmitting, when the backend said so.
    pub retry_after: Option<Duration>,
}

impl From<&BackendError> for ActionFailure {
    fn from(err: &BackendError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            retryable: err.is_retryable(),
            retry_after: err.retry_after(),
        }
    }
}

/// Read-only view handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub role: Option<Role>,
    pub status: Status,
    pub outcome: Outcome,
    pub turn_count: u32,
    pub visible_turns: Vec<Turn>,
    pub failure: Option<ActionFailure>,
}

impl Snapshot {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Result of a successful action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnResult {
    pub reply: String,
    pub verdict: Verdict,
    pub turn_count: u32,
}

struct ActiveGame {
    session: Session,
    strategy: Box<dyn RoleStrategy>,
    config: GameConfig,
    /// Action whose turn is in the transcript but has no reply yet.
    pending: Option<Pending>,
}

struct Pending {
    action: Action,
    /// The turn that was appended for `action`.
    prompt: ActionPrompt,
}

impl ActiveGame {
    fn build_request(&self) -> BackendRequest {
        let transcript: Vec<BackendMessage> = self
            .session
            .transcript
            .all_turns()
            .iter()
            .map(BackendMessage::from)
            .collect();

        BackendRequest {
            system: self.strategy.system_instruction(&self.session),
            transcript,
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }
}

/// Drives one game at a time against a shared backend.
pub struct SessionController {
    backend: Arc<dyn Backend>,
    game: Option<ActiveGame>,
    failure: Option<ActionFailure>,
}

impl SessionController {
    /// Create an idle controller. The backend may be shared between controllers.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            game: None,
            failure: None,
        }
    }

    /// Start a new game and issue the opening call.
    ///
    /// If the opening call fails the game is still in progress; use
    /// [`retry`](Self::retry) to resend it.
    pub async fn start(&mut self, config: GameConfig) -> Result<TurnResult, SessionError> {
        if self.game.is_some() {
            return Err(SessionError::AlreadyStarted);
        }

        let sentinels = config.sentinel_table();
        sentinels.validate()?;

        let category_seed = match config.role {
            Role::HumanAsks => Some(config.pick_category_seed(&mut rand::thread_rng())?),
            Role::BackendAsks => None,
        };

        let strategy = config.role.strategy(config.language, sentinels);
        let mut session = Session::new(config.role, category_seed);
        session.status = Status::InProgress;

        tracing::info!(
            session_id = %session.id,
            role = %session.role,
            backend = self.backend.name(),
            category = session.category_seed.as_deref().unwrap_or("-"),
            "game started"
        );

        self.failure = None;
        self.game = Some(ActiveGame {
            session,
            strategy,
            config,
            pending: None,
        });

        self.submit_action(Action::Open).await
    }

    /// Apply a player action and wait for the backend's reply.
    pub async fn submit_action(&mut self, action: Action) -> Result<TurnResult, SessionError> {
        let backend = Arc::clone(&self.backend);
        let game = self.game.as_mut().ok_or(SessionError::NotStarted)?;

        match game.session.status {
            Status::InProgress => {}
            Status::Ended => return Err(SessionError::GameOver),
            Status::NotStarted => return Err(SessionError::NotStarted),
        }

        let opened = game.session.transcript.has_backend_turn();
        match action {
            Action::Open if opened => return Err(game.strategy.reject(&action)),
            Action::Open | Action::Surrender => {}
            _ if !opened => return Err(SessionError::NotOpened),
            _ => {}
        }

        let prompt = game.strategy.action_prompt(&action)?;
        // same turn text as the failed action: resend instead of appending
        let is_retry = game
            .pending
            .as_ref()
            .is_some_and(|pending| pending.prompt == prompt);

        tracing::debug!(
            session_id = %game.session.id,
            role = %game.session.role,
            action = %action,
            retry = is_retry,
            "submitting action"
        );

        if !is_retry {
            game.session
                .transcript
                .append(Speaker::Human, prompt.content.clone(), prompt.visible);
        }
        let visible = prompt.visible;
        game.pending = Some(Pending {
            action: action.clone(),
            prompt,
        });

        let request = game.build_request();
        let result = call_backend(
            backend.as_ref(),
            &request,
            game.config.request_timeout,
            &game.config.retry,
        )
        .await;

        let reply = match result {
            Ok(reply) => reply,
            Err(err) => {
                tracing::warn!(
                    session_id = %game.session.id,
                    action = %action,
                    error = %err,
                    "action failed"
                );
                self.failure = Some(ActionFailure::from(&err));
                return Err(SessionError::Backend(err));
            }
        };

        let session = &mut game.session;
        session.transcript.append(Speaker::Backend, reply.clone(), true);
        game.pending = None;
        self.failure = None;

        if visible {
            session.turn_count += 1;
        }
        if action == Action::Hint {
            session.hints_given += 1;
        }

        let verdict = game.strategy.interpret(&reply, &action);
        if verdict.ended {
            session.end(verdict.outcome);
            tracing::info!(
                session_id = %session.id,
                outcome = ?verdict.outcome,
                turns = session.turn_count,
                "game ended"
            );
        }

        Ok(TurnResult {
            reply,
            verdict,
            turn_count: session.turn_count,
        })
    }

    /// Answer the backend's question (backend-asks games).
    pub async fn answer(&mut self, choice: Choice) -> Result<TurnResult, SessionError> {
        self.submit_action(Action::Answer(choice)).await
    }

    /// Ask a free-text question or make a guess (human-asks games).
    pub async fn ask(&mut self, question: impl Into<String>) -> Result<TurnResult, SessionError> {
        self.submit_action(Action::Ask(question.into())).await
    }

    /// Ask for another hint (human-asks games).
    pub async fn request_hint(&mut self) -> Result<TurnResult, SessionError> {
        self.submit_action(Action::Hint).await
    }

    /// Give up. The game always ends as a loss once the backend replies.
    pub async fn surrender(&mut self) -> Result<TurnResult, SessionError> {
        self.submit_action(Action::Surrender).await
    }

    /// Resend the last failed action without appending another turn.
    pub async fn retry(&mut self) -> Result<TurnResult, SessionError> {
        let action = self
            .game
            .as_ref()
            .and_then(|g| g.pending.as_ref())
            .map(|pending| pending.action.clone())
            .ok_or(SessionError::NothingToRetry)?;
        self.submit_action(action).await
    }

    /// Discard the current game, if any.
    pub fn reset(&mut self) {
        if let Some(game) = self.game.take() {
            tracing::debug!(session_id = %game.session.id, "session discarded");
        }
        self.failure = None;
    }

    pub fn snapshot(&self) -> Snapshot {
        match self.game {
            Some(ref game) => Snapshot {
                role: Some(game.session.role),
                status: game.session.status,
                outcome: game.session.outcome,
                turn_count: game.session.turn_count,
                visible_turns: game.session.transcript.visible_turns().cloned().collect(),
                failure: self.failure.clone(),
            },
            None => Snapshot {
                role: None,
                status: Status::NotStarted,
                outcome: Outcome::None,
                turn_count: 0,
                visible_turns: Vec::new(),
                failure: self.failure.clone(),
            },
        }
    }

    pub fn status(&self) -> Status {
        self.game
            .as_ref()
            .map(|g| g.session.status)
            .unwrap_or_default()
    }

    /// The running session, for read-only inspection.
    pub fn session(&self) -> Option<&Session> {
        self.game.as_ref().map(|g| &g.session)
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session().map(Session::id)
    }

    /// The action awaiting a successful reply, if the last call failed.
    pub fn pending_action(&self) -> Option<&Action> {
        self.game
            .as_ref()
            .and_then(|g| g.pending.as_ref())
            .map(|pending| &pending.action)
    }

    pub fn last_failure(&self) -> Option<&ActionFailure> {
        self.failure.as_ref()
    }
}

/// One logical backend call: timeout per attempt, backoff between attempts.
async fn call_backend(
    backend: &dyn Backend,
    request: &BackendRequest,
    timeout: Duration,
    retry: &RetryPolicy,
) -> Result<String, BackendError> {
    let mut attempt = 0;
    loop {
        let result = match tokio::time::timeout(timeout, backend.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Transient(format!(
                "no reply within {}s",
                timeout.as_secs_f32()
            ))),
        };

        match result {
            Err(err) if err.is_retryable() && attempt < retry.max_retries => {
                let Some(delay) = retry.delay_for(attempt, err.retry_after()) else {
                    tracing::warn!(
                        backend = backend.name(),
                        retry_after = ?err.retry_after(),
                        max_delay = ?retry.max_delay,
                        "backend asked for a longer wait than the retry policy allows"
                    );
                    return Err(err);
                };
                tracing::warn!(
                    backend = backend.name(),
                    attempt = attempt + 1,
                    delay = ?delay,
                    error = %err,
                    "retrying backend call"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockBackend, MockReply};

    fn controller(mock: &Arc<MockBackend>) -> SessionController {
        SessionController::new(mock.clone())
    }

    #[tokio::test]
    async fn test_idle_controller() {
        let mock = Arc::new(MockBackend::new());
        let mut controller = controller(&mock);

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.status, Status::NotStarted);
        assert!(snapshot.visible_turns.is_empty());

        assert_eq!(
            controller.answer(Choice::Yes).await,
            Err(SessionError::NotStarted)
        );
        assert_eq!(controller.retry().await, Err(SessionError::NothingToRetry));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_start_twice_rejected() {
        let mock = Arc::new(MockBackend::with_replies(["这个人是虚构的吗？"]));
        let mut controller = controller(&mock);

        controller
            .start(GameConfig::new(Role::BackendAsks))
            .await
            .unwrap();
        assert_eq!(
            controller.start(GameConfig::new(Role::BackendAsks)).await,
            Err(SessionError::AlreadyStarted)
        );
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_opening_turn_is_hidden() {
        let mock = Arc::new(MockBackend::with_replies(["这个人是虚构的吗？"]));
        let mut controller = controller(&mock);

        let result = controller
            .start(GameConfig::new(Role::BackendAsks))
            .await
            .unwrap();
        assert_eq!(result.turn_count, 0);
        assert!(!result.verdict.ended);

        let session = controller.session().unwrap();
        assert_eq!(session.transcript().len(), 2);
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.visible_turns.len(), 1);
        assert_eq!(snapshot.visible_turns[0].speaker, Speaker::Backend);

        // the hidden opening still reaches the backend
        let call = mock.last_call().unwrap();
        assert_eq!(call.transcript.len(), 1);
        assert_eq!(call.transcript[0].speaker, Speaker::Human);
    }

    #[tokio::test]
    async fn test_open_cannot_be_resubmitted() {
        let mock = Arc::new(MockBackend::with_replies(["这个人是虚构的吗？"]));
        let mut controller = controller(&mock);
        controller
            .start(GameConfig::new(Role::BackendAsks))
            .await
            .unwrap();

        assert!(matches!(
            controller.submit_action(Action::Open).await,
            Err(SessionError::InvalidAction { action: "open", .. })
        ));
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_action_leaves_transcript_alone() {
        let mock = Arc::new(MockBackend::with_replies(["第一条提示：他是一位诗人。"]));
        let mut controller = controller(&mock);
        controller
            .start(GameConfig::new(Role::HumanAsks).with_category_seed("诗人"))
            .await
            .unwrap();

        assert!(controller.answer(Choice::Yes).await.is_err());
        assert_eq!(controller.ask("  ").await, Err(SessionError::EmptyQuestion));
        assert_eq!(controller.session().unwrap().transcript().len(), 2);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_model_and_limits_forwarded() {
        let mock = Arc::new(MockBackend::with_replies(["Is the person fictional?"]));
        let mut controller = controller(&mock);
        controller
            .start(
                GameConfig::new(Role::BackendAsks)
                    .with_model("claude-3-5-haiku-20241022")
                    .with_max_tokens(200)
                    .with_temperature(0.3),
            )
            .await
            .unwrap();

        let call = mock.last_call().unwrap();
        assert_eq!(call.model.as_deref(), Some("claude-3-5-haiku-20241022"));
        assert_eq!(call.max_tokens, 200);
        assert_eq!(call.temperature, Some(0.3));
    }

    #[tokio::test]
    async fn test_timeout_is_transient() {
        let mock = Arc::new(MockBackend::new());
        mock.queue(MockReply::Stall);
        let mut controller = controller(&mock);

        let err = controller
            .start(
                GameConfig::new(Role::BackendAsks)
                    .with_request_timeout(Duration::from_millis(20)),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SessionError::Backend(BackendError::Transient(_))
        ));
        assert!(err.is_retryable());
        assert_eq!(controller.status(), Status::InProgress);
        assert_eq!(controller.pending_action(), Some(&Action::Open));
    }

    #[tokio::test]
    async fn test_retry_policy_recovers() {
        let mock = Arc::new(MockBackend::new());
        mock.queue(MockReply::Error(BackendError::RateLimited { retry_after: None }));
        mock.queue(MockReply::Error(BackendError::Transient("reset".into())));
        mock.queue(MockReply::text("Is the person fictional?"));
        let mut controller = controller(&mock);

        let result = controller
            .start(
                GameConfig::new(Role::BackendAsks)
                    .with_retry(RetryPolicy::exponential(2, Duration::ZERO)),
            )
            .await
            .unwrap();

        assert_eq!(result.reply, "Is the person fictional?");
        assert_eq!(mock.call_count(), 3);
        // retries resend the same transcript
        assert_eq!(controller.session().unwrap().transcript().len(), 2);
        assert!(controller.last_failure().is_none());
    }

    #[tokio::test]
    async fn test_retry_policy_skips_fatal() {
        let mock = Arc::new(MockBackend::new());
        mock.queue(MockReply::Error(BackendError::Fatal("bad key".into())));
        mock.queue(MockReply::text("unreachable"));
        let mut controller = controller(&mock);

        let err = controller
            .start(
                GameConfig::new(Role::BackendAsks)
                    .with_retry(RetryPolicy::exponential(5, Duration::ZERO)),
            )
            .await
            .unwrap_err();

        assert!(!err.is_retryable());
        assert_eq!(mock.call_count(), 1);
        let failure = controller.snapshot().failure.unwrap();
        assert_eq!(failure.kind, FailureKind::Fatal);
        assert!(!failure.retryable);
        assert_eq!(controller.status(), Status::InProgress);
    }

    #[tokio::test]
    async fn test_long_retry_after_is_reported_not_shortened() {
        let mock = Arc::new(MockBackend::new());
        mock.queue(MockReply::Error(BackendError::RateLimited {
            retry_after: Some(Duration::from_secs(60)),
        }));
        mock.queue(MockReply::text("unreachable"));
        let mut controller = controller(&mock);

        let err = controller
            .start(
                GameConfig::new(Role::BackendAsks)
                    .with_retry(RetryPolicy::exponential(2, Duration::ZERO)),
            )
            .await
            .unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(mock.call_count(), 1);
        let failure = controller.last_failure().unwrap();
        assert_eq!(failure.kind, FailureKind::RateLimited);
        assert_eq!(failure.retry_after, Some(Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn test_actions_wait_for_opening_reply() {
        let mock = Arc::new(MockBackend::new());
        mock.queue(MockReply::Error(BackendError::Transient("down".into())));
        mock.queue(MockReply::text("这个人是虚构的吗？"));
        mock.queue(MockReply::text("这个人是男性吗？"));
        let mut controller = controller(&mock);

        assert!(controller
            .start(GameConfig::new(Role::BackendAsks))
            .await
            .is_err());

        assert_eq!(
            controller.answer(Choice::Yes).await,
            Err(SessionError::NotOpened)
        );
        assert_eq!(controller.session().unwrap().transcript().len(), 1);
        assert_eq!(controller.snapshot().turn_count, 0);
        assert_eq!(mock.call_count(), 1);

        controller.retry().await.unwrap();
        let result = controller.answer(Choice::Yes).await.unwrap();
        assert_eq!(result.turn_count, 1);
    }

    #[tokio::test]
    async fn test_surrender_allowed_before_opening_reply() {
        let mock = Arc::new(MockBackend::new());
        mock.queue(MockReply::Error(BackendError::Transient("down".into())));
        mock.queue(MockReply::text("好吧，正确答案是：李白"));
        let mut controller = controller(&mock);

        assert!(controller
            .start(GameConfig::new(Role::HumanAsks).with_category_seed("诗人"))
            .await
            .is_err());

        let result = controller.surrender().await.unwrap();
        assert_eq!(result.verdict, Verdict::loss());
        assert_eq!(controller.status(), Status::Ended);
    }

    #[tokio::test]
    async fn test_reset_clears_failure() {
        let mock = Arc::new(MockBackend::new());
        mock.queue(MockReply::Error(BackendError::Transient("down".into())));
        let mut controller = controller(&mock);

        assert!(controller
            .start(GameConfig::new(Role::BackendAsks))
            .await
            .is_err());
        assert!(controller.snapshot().failure.is_some());

        controller.reset();
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.status, Status::NotStarted);
        assert!(snapshot.failure.is_none());
        assert!(controller.session_id().is_none());
    }

    #[tokio::test]
    async fn test_invalid_sentinels_rejected_before_start() {
        let mock = Arc::new(MockBackend::new());
        let mut controller = controller(&mock);
        let config = GameConfig::new(Role::BackendAsks).with_sentinels(
            crate::sentinel::SentinelTable::new(9, Vec::<String>::new(), ["x"]),
        );

        assert_eq!(
            controller.start(config).await,
            Err(SessionError::InvalidSentinels { version: 9 })
        );
        assert_eq!(controller.status(), Status::NotStarted);
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn test_snapshot_json() {
        let mock = Arc::new(MockBackend::new());
        let controller = controller(&mock);
        let json = controller.snapshot().to_json_pretty().unwrap();
        assert!(json.contains("\"status\": \"not_started\""));
        assert!(json.contains("\"outcome\": \"none\""));
    }
}
