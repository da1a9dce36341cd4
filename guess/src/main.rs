//! Twenty questions against Claude, in the terminal.
//!
//! A line-oriented interface over the dialogue engine:
//!
//! ```bash
//! cargo run -p guess -- --role human-asks --language en
//! ```

mod headless;

use clap::{Parser, ValueEnum};
use guess_core::{ClaudeBackend, GameConfig, Language, RetryPolicy, Role};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RoleArg {
    /// Claude asks, you answer yes/no/unsure.
    BackendAsks,
    /// Claude hides a person, you ask.
    HumanAsks,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::BackendAsks => Role::BackendAsks,
            RoleArg::HumanAsks => Role::HumanAsks,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LanguageArg {
    Zh,
    En,
}

impl From<LanguageArg> for Language {
    fn from(arg: LanguageArg) -> Self {
        match arg {
            LanguageArg::Zh => Language::Chinese,
            LanguageArg::En => Language::English,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "guess", version, about = "Twenty questions with an AI opponent")]
struct Args {
    /// Who asks the questions.
    #[arg(long, value_enum, default_value = "backend-asks")]
    role: RoleArg,

    /// Claude model id (defaults to the client's model).
    #[arg(long)]
    model: Option<String>,

    /// Language of the game.
    #[arg(long, value_enum, default_value = "zh")]
    language: LanguageArg,

    /// Category to draw the hidden person from (repeatable; replaces the built-in pool).
    #[arg(long = "category")]
    categories: Vec<String>,

    /// Automatic retries for rate limits and transient failures.
    #[arg(long, default_value_t = 2)]
    retries: u32,

    /// Seconds to wait for each reply.
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,
}

impl Args {
    fn game_config(&self) -> GameConfig {
        let mut config = GameConfig::new(self.role.into())
            .with_language(self.language.into())
            .with_request_timeout(Duration::from_secs(self.timeout_secs))
            .with_retry(RetryPolicy::exponential(self.retries, Duration::from_secs(1)));

        if let Some(ref model) = self.model {
            config = config.with_model(model);
        }
        if !self.categories.is_empty() {
            config = config.with_category_pool(self.categories.clone());
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let backend = match ClaudeBackend::from_env() {
        Ok(backend) => backend,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Please set it in .env file or with: export ANTHROPIC_API_KEY=your_key_here");
            std::process::exit(1);
        }
    };

    headless::run(Arc::new(backend), args.game_config()).await
}
