//! Twenty-questions dialogue engine.
//!
//! This crate provides:
//! - A session controller that owns game state and turn order
//! - Two role strategies: the backend asks, or the player asks
//! - Sentinel-based end-of-game detection
//! - A reasoning backend adapter for Claude, with typed failures
//!
//! # Quick Start
//!
//! ```ignore
//! use guess_core::{Choice, ClaudeBackend, GameConfig, Role, SessionController};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = Arc::new(ClaudeBackend::from_env()?);
//!     let mut controller = SessionController::new(backend);
//!
//!     let opening = controller.start(GameConfig::new(Role::BackendAsks)).await?;
//!     println!("{}", opening.reply);
//!
//!     let next = controller.answer(Choice::Yes).await?;
//!     println!("{}", next.reply);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod role;
pub mod sentinel;
pub mod session;
pub mod termination;
pub mod testing;
pub mod transcript;

// Primary public API
pub use backend::{Backend, BackendError, BackendMessage, BackendRequest, ClaudeBackend, FailureKind};
pub use config::{GameConfig, Language, RetryPolicy};
pub use controller::{ActionFailure, SessionController, Snapshot, TurnResult};
pub use error::SessionError;
pub use role::{ActionPrompt, RoleStrategy, Seat};
pub use sentinel::SentinelTable;
pub use session::{Action, Choice, Outcome, Role, Session, SessionId, Status};
pub use termination::{detect, Verdict};
pub use testing::{MockBackend, MockReply, TestHarness};
pub use transcript::{Speaker, Transcript, Turn};
