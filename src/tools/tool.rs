//! Tool trait and closure-based tool wrapper.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use super::arguments::ToolArguments;
use super::types::AgentToolParameters;
use crate::error::AgentError;
use crate::session::SharedState;

/// Context available during tool execution.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    agent_name: String,
    invocation_id: String,
    function_call_id: String,
    state: SharedState,
    transfer: Arc<Mutex<Option<String>>>,
}

impl ToolContext {
    pub fn new(
        agent_name: impl Into<String>,
        invocation_id: impl Into<String>,
        function_call_id: impl Into<String>,
        state: SharedState,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            invocation_id: invocation_id.into(),
            function_call_id: function_call_id.into(),
            state,
            transfer: Arc::default(),
        }
    }

    /// Agent whose model requested the call.
    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    pub fn invocation_id(&self) -> &str {
        &self.invocation_id
    }

    pub fn function_call_id(&self) -> &str {
        &self.function_call_id
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Hand the rest of the turn to another agent.
    pub fn transfer_to(&self, agent_name: impl Into<String>) {
        *self.transfer.lock().unwrap_or_else(PoisonError::into_inner) = Some(agent_name.into());
    }

    /// Transfer requested during this call, if any.
    pub fn transfer_target(&self) -> Option<String> {
        self.transfer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Core tool trait. Implement to expose a function to an agent.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (must match what the model calls).
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// JSON Schema parameters.
    fn parameters(&self) -> &AgentToolParameters;

    /// Execute the tool with parsed arguments.
    async fn execute(&self, args: &ToolArguments, ctx: &ToolContext) -> Result<Value, AgentError>;
}

type ToolHandler = dyn Fn(ToolArguments, ToolContext) -> Pin<Box<dyn Future<Output = Result<Value, AgentError>> + Send>>
    + Send
    + Sync;

/// Closure-based tool for quick tool creation.
pub struct AgentTool {
    name: String,
    description: String,
    parameters: AgentToolParameters,
    handler: Arc<ToolHandler>,
}

impl AgentTool {
    /// Create a tool from a closure.
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: AgentToolParameters,
        handler: F,
    ) -> Self
    where
        F: Fn(ToolArguments, ToolContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, AgentError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            handler: Arc::new(move |args, ctx| Box::pin(handler(args, ctx))),
        }
    }
}

#[async_trait]
impl Tool for AgentTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    async fn execute(&self, args: &ToolArguments, ctx: &ToolContext) -> Result<Value, AgentError> {
        (self.handler)(args.clone(), ctx.clone()).await
    }
}

impl std::fmt::Debug for AgentTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::State;

    #[tokio::test]
    async fn closure_tool_writes_state_through_context() {
        let tool = AgentTool::new(
            "remember_city",
            "Stores a city",
            AgentToolParameters::object()
                .string("city", "City", true)
                .build(),
            |args, ctx| async move {
                let city = args.get_str("city")?.to_string();
                ctx.state().set("last_city_checked", city.clone());
                Ok(serde_json::json!({ "stored": city }))
            },
        );

        let state = SharedState::new(State::new());
        let ctx = ToolContext::new("weather_agent", "inv-1", "call-1", state.clone());
        let out = tool
            .execute(&ToolArguments::new(serde_json::json!({"city": "Rome"})), &ctx)
            .await
            .unwrap();

        assert_eq!(out["stored"], "Rome");
        assert_eq!(state.get_str("last_city_checked").as_deref(), Some("Rome"));
    }

    #[tokio::test]
    async fn missing_argument_is_invalid() {
        let tool = AgentTool::new(
            "echo",
            "Echo",
            AgentToolParameters::empty(),
            |args, _ctx| async move { Ok(Value::String(args.get_str("text")?.to_string())) },
        );
        let err = tool
            .execute(&ToolArguments::new(serde_json::json!({})), &ToolContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::InvalidArgument(_)));
    }

    #[test]
    fn transfer_is_visible_through_clones() {
        let ctx = ToolContext::default();
        ctx.clone().transfer_to("greeting_agent");
        assert_eq!(ctx.transfer_target().as_deref(), Some("greeting_agent"));
    }
}
