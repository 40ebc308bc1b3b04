//! Hooks that run around model calls.

use async_trait::async_trait;

use crate::error::AgentError;
use crate::provider::{ProviderRequest, ProviderResponse};
use crate::session::SharedState;

/// What a callback sees of the running turn.
#[derive(Debug, Clone)]
pub struct CallbackContext {
    agent_name: String,
    invocation_id: String,
    user_content: Option<String>,
    state: SharedState,
}

impl CallbackContext {
    pub fn new(
        agent_name: impl Into<String>,
        invocation_id: impl Into<String>,
        state: SharedState,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            invocation_id: invocation_id.into(),
            user_content: None,
            state,
        }
    }

    /// Attach the user message that started the turn.
    pub fn with_user_content(mut self, text: impl Into<String>) -> Self {
        self.user_content = Some(text.into());
        self
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    pub fn invocation_id(&self) -> &str {
        &self.invocation_id
    }

    /// Text the user sent to start this turn.
    pub fn user_content(&self) -> Option<&str> {
        self.user_content.as_deref()
    }

    /// Session state; writes land in the delta of the next event.
    pub fn state(&self) -> &SharedState {
        &self.state
    }
}

/// Runs before every model call of the agent it is attached to.
///
/// Returning `Some` skips the model and uses the given response instead.
#[async_trait]
pub trait BeforeModelCallback: Send + Sync {
    async fn before_model(
        &self,
        ctx: &CallbackContext,
        request: &ProviderRequest,
    ) -> Result<Option<ProviderResponse>, AgentError>;
}
