//! Synthetic `transfer_to_agent` tool offered to agents with delegation targets.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolContext};
use super::types::AgentToolParameters;
use crate::error::AgentError;

pub const TRANSFER_TOOL_NAME: &str = "transfer_to_agent";

/// Hands the turn to one of a fixed set of agents.
#[derive(Debug, Clone)]
pub struct TransferToAgentTool {
    targets: Vec<String>,
    parameters: AgentToolParameters,
}

impl TransferToAgentTool {
    pub fn new(targets: Vec<String>) -> Self {
        let names: Vec<&str> = targets.iter().map(String::as_str).collect();
        let parameters = AgentToolParameters::object()
            .string_enum("agent_name", "Name of the agent to hand the conversation to.", &names, true)
            .build();
        Self { targets, parameters }
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }
}

#[async_trait]
impl Tool for TransferToAgentTool {
    fn name(&self) -> &str {
        TRANSFER_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Transfer the question to another agent."
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    async fn execute(&self, args: &ToolArguments, ctx: &ToolContext) -> Result<Value, AgentError> {
        let agent_name = args.get_str("agent_name")?;
        if !self.targets.iter().any(|t| t == agent_name) {
            return Err(AgentError::ToolExecution {
                tool_name: TRANSFER_TOOL_NAME.to_string(),
                message: format!(
                    "Unknown agent '{agent_name}'. Valid agents: {}",
                    self.targets.join(", ")
                ),
            });
        }

        info!(from = ctx.agent_name(), to = agent_name, "transferring turn");
        ctx.transfer_to(agent_name);
        Ok(json!({ "status": "transferred", "agent_name": agent_name }))
    }
}
