//! Multi-agent weather assistant.
//!
//! A root weather agent answers questions with live data from WeatherAPI.com,
//! hands greetings and farewells to two delegate agents, and screens every
//! message with a keyword guardrail before its model is called. Conversation
//! state lives in a session store shared across turns.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use weather_agent::prelude::*;
//!
//! # async fn example() -> weather_agent::error::Result<()> {
//! let config = AppConfig::load()?;
//! let provider = weather_agent::provider::create_provider(&config)?;
//! let sessions: Arc<dyn SessionService> = Arc::new(InMemorySessionService::new());
//! let runner = weather_agent::assistant::build_runner(&config, provider, sessions).await?;
//!
//! let answer = runner
//!     .call_agent(&config.user_id, &config.session_id, "What is the weather in London?")
//!     .await;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod assistant;
pub mod config;
pub mod error;
pub mod events;
pub mod guardrail;
pub mod models;
pub mod prelude;
pub mod provider;
pub mod runner;
pub mod session;
pub mod tools;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
