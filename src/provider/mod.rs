//! Model provider trait and the Gemini implementation.

pub mod google;
pub mod http;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::AppConfig;
use crate::error::AgentError;
use crate::models::GoogleModel;
use crate::types::{AgentToolCall, FinishReason, GenerationSettings, ModelMessage, Usage};

/// A request sent to a model provider.
#[derive(Debug, Clone, Default)]
pub struct ProviderRequest {
    pub messages: Vec<ModelMessage>,
    pub settings: GenerationSettings,
    pub tools: Option<Vec<ToolDefinition>>,
}

impl ProviderRequest {
    /// Text of the most recent user message that carries text.
    pub fn last_user_text(&self) -> Option<String> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == crate::types::Role::User && m.has_text())
            .map(ModelMessage::text)
    }
}

/// Tool definition sent to the provider API.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Response from a provider.
#[derive(Debug, Clone, Default)]
pub struct ProviderResponse {
    pub text: String,
    pub usage: Usage,
    pub tool_calls: Vec<AgentToolCall>,
    pub finish_reason: Option<FinishReason>,
}

impl ProviderResponse {
    /// A plain text response that did not come from a model.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            finish_reason: Some(FinishReason::Stop),
            ..Default::default()
        }
    }
}

/// Core trait implemented by model providers.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g., "google").
    fn provider_name(&self) -> &str;
    /// The model ID this provider instance serves.
    fn model_id(&self) -> &str;

    /// Generate a response (text and/or tool calls).
    async fn generate_text(&self, request: &ProviderRequest)
        -> Result<ProviderResponse, AgentError>;
}

/// Create the configured model provider.
pub fn create_provider(config: &AppConfig) -> Result<Arc<dyn ModelProvider>, AgentError> {
    let api_key = config
        .google_api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| AgentError::Authentication("Missing GOOGLE_API_KEY".into()))?;
    let model = GoogleModel::from_name(&config.model);
    let mut provider = google::GoogleProvider::new(model, api_key);
    if let Some(ref url) = config.google_base_url {
        provider = provider.with_base_url(url.clone());
    }
    Ok(Arc::new(provider))
}
