//! Session storage contract and the in-memory implementation.

pub mod memory;
pub mod state;

pub use memory::InMemorySessionService;
pub use state::{SharedState, State, APP_PREFIX, TEMP_PREFIX, USER_PREFIX};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::events::Event;

/// A conversation between one user and the agent tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub app_name: String,
    pub user_id: String,
    pub id: String,
    pub state: State,
    pub events: Vec<Event>,
    pub last_update_time: DateTime<Utc>,
}

/// Storage for sessions keyed by (app, user, session id).
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Create a session. A generated UUID is used when `session_id` is `None`.
    async fn create_session(
        &self,
        app_name: &str,
        user_id: &str,
        state: Option<State>,
        session_id: Option<&str>,
    ) -> Result<Session, AgentError>;

    async fn get_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Session>, AgentError>;

    /// Sessions of a user, without their events.
    async fn list_sessions(&self, app_name: &str, user_id: &str)
        -> Result<Vec<Session>, AgentError>;

    async fn delete_session(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<(), AgentError>;

    /// Record an event, applying its state delta to `session` and to storage.
    async fn append_event(&self, session: &mut Session, event: Event) -> Result<Event, AgentError>;
}
