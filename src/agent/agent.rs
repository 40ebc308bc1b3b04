//! Model-backed agent definition.

use std::sync::Arc;

use crate::provider::{ModelProvider, ToolDefinition};
use crate::tools::tool::Tool;
use crate::types::GenerationSettings;

use super::callbacks::BeforeModelCallback;

/// A named, instructable wrapper around a model with tools and delegates.
#[derive(Clone)]
pub struct LlmAgent {
    name: String,
    description: String,
    instruction: String,
    provider: Arc<dyn ModelProvider>,
    tools: Vec<Arc<dyn Tool>>,
    sub_agents: Vec<Arc<LlmAgent>>,
    output_key: Option<String>,
    before_model_callback: Option<Arc<dyn BeforeModelCallback>>,
    settings: GenerationSettings,
}

impl LlmAgent {
    /// Create a new agent.
    pub fn new(name: impl Into<String>, provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            instruction: String::new(),
            provider,
            tools: Vec::new(),
            sub_agents: Vec::new(),
            output_key: None,
            before_model_callback: None,
            settings: GenerationSettings::default(),
        }
    }

    /// Set the description other agents see when deciding to delegate.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the system instruction.
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    /// Add a tool.
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Add a delegate.
    pub fn with_sub_agent(mut self, agent: Arc<LlmAgent>) -> Self {
        self.sub_agents.push(agent);
        self
    }

    /// Store the final response text under this state key.
    pub fn with_output_key(mut self, key: impl Into<String>) -> Self {
        self.output_key = Some(key.into());
        self
    }

    pub fn with_before_model_callback(mut self, callback: Arc<dyn BeforeModelCallback>) -> Self {
        self.before_model_callback = Some(callback);
        self
    }

    /// Set generation settings.
    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn provider(&self) -> &Arc<dyn ModelProvider> {
        &self.provider
    }

    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    pub fn sub_agents(&self) -> &[Arc<LlmAgent>] {
        &self.sub_agents
    }

    pub fn output_key(&self) -> Option<&str> {
        self.output_key.as_deref()
    }

    pub fn before_model_callback(&self) -> Option<&Arc<dyn BeforeModelCallback>> {
        self.before_model_callback.as_ref()
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }
}

impl std::fmt::Debug for LlmAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmAgent")
            .field("name", &self.name)
            .field("model", &self.provider.model_id())
            .field("tools", &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>())
            .field(
                "sub_agents",
                &self.sub_agents.iter().map(|a| a.name()).collect::<Vec<_>>(),
            )
            .field("output_key", &self.output_key)
            .finish()
    }
}

pub(crate) fn tool_definitions(tools: &[Arc<dyn Tool>]) -> Option<Vec<ToolDefinition>> {
    if tools.is_empty() {
        return None;
    }
    Some(
        tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters().schema.clone(),
            })
            .collect(),
    )
}
