//! Keyword guardrail that vetoes model calls before they are made.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::agent::callbacks::{BeforeModelCallback, CallbackContext};
use crate::error::AgentError;
use crate::provider::{ProviderRequest, ProviderResponse};

pub const DEFAULT_BLOCKED_KEYWORD: &str = "BLOCK";
/// State flag set whenever the guardrail blocks a request.
pub const GUARDRAIL_TRIGGERED_KEY: &str = "guardrail_block_keyword_triggered";

/// Blocks any turn whose user message contains a keyword (case-insensitive).
///
/// Falls back to the request's latest user message when the context carries
/// no user content.
#[derive(Debug, Clone)]
pub struct KeywordGuardrail {
    keyword: String,
}

impl Default for KeywordGuardrail {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCKED_KEYWORD)
    }
}

impl KeywordGuardrail {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into().to_uppercase(),
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn is_blocked(&self, text: &str) -> bool {
        text.to_uppercase().contains(&self.keyword)
    }
}

#[async_trait]
impl BeforeModelCallback for KeywordGuardrail {
    async fn before_model(
        &self,
        ctx: &CallbackContext,
        request: &ProviderRequest,
    ) -> Result<Option<ProviderResponse>, AgentError> {
        let text = ctx
            .user_content()
            .map(str::to_string)
            .or_else(|| request.last_user_text());
        let Some(text) = text else {
            debug!(agent = ctx.agent_name(), "no user text to inspect");
            return Ok(None);
        };

        if !self.is_blocked(&text) {
            debug!(agent = ctx.agent_name(), "keyword not found, allowing model call");
            return Ok(None);
        }

        info!(
            agent = ctx.agent_name(),
            invocation_id = ctx.invocation_id(),
            keyword = %self.keyword,
            "blocked keyword found, skipping model call"
        );
        ctx.state().set(GUARDRAIL_TRIGGERED_KEY, true);
        Ok(Some(ProviderResponse::text(format!(
            "I cannot process this request because it contains the blocked keyword '{}'.",
            self.keyword
        ))))
    }
}
