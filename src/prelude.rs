//! Convenience re-exports for common use.

pub use crate::agent::{BeforeModelCallback, CallbackContext, LlmAgent};
pub use crate::config::AppConfig;
pub use crate::error::{AgentError, Result};
pub use crate::events::{Event, EventActions};
pub use crate::guardrail::KeywordGuardrail;
pub use crate::provider::{ModelProvider, ProviderRequest, ProviderResponse};
pub use crate::runner::Runner;
pub use crate::session::{InMemorySessionService, Session, SessionService, State};
pub use crate::tools::{AgentTool, AgentToolParameters, Tool, ToolArguments, ToolContext};
pub use crate::types::{ContentPart, GenerationSettings, ModelMessage, Role};
