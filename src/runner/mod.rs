//! Drives conversation turns through the agent tree.

use std::sync::Arc;

use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use tracing::{debug, error, info};

use crate::agent::flow::{limit_event, run_step, Invocation, NextStep};
use crate::agent::{AgentTree, LlmAgent};
use crate::config::DEFAULT_MAX_LLM_CALLS;
use crate::error::AgentError;
use crate::events::{Event, USER_AUTHOR};
use crate::session::{SessionService, SharedState};
use crate::types::{ModelMessage, Usage};

pub const NO_FINAL_RESPONSE: &str = "Agent did not produce a final response.";
pub const PROCESSING_ERROR: &str = "An error occurred during agent processing.";

/// Runs user messages against an agent tree and records the resulting events.
#[derive(Clone)]
pub struct Runner {
    app_name: String,
    tree: Arc<AgentTree>,
    session_service: Arc<dyn SessionService>,
    max_llm_calls: usize,
}

impl Runner {
    /// Fails when agent names in the tree are not unique.
    pub fn new(
        app_name: impl Into<String>,
        root_agent: Arc<LlmAgent>,
        session_service: Arc<dyn SessionService>,
    ) -> Result<Self, AgentError> {
        Ok(Self {
            app_name: app_name.into(),
            tree: Arc::new(AgentTree::new(root_agent)?),
            session_service,
            max_llm_calls: DEFAULT_MAX_LLM_CALLS,
        })
    }

    /// Bound the number of model calls a single turn may make.
    pub fn with_max_llm_calls(mut self, max_llm_calls: usize) -> Self {
        self.max_llm_calls = max_llm_calls.max(1);
        self
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn root_agent(&self) -> &Arc<LlmAgent> {
        self.tree.root()
    }

    pub fn session_service(&self) -> &Arc<dyn SessionService> {
        &self.session_service
    }

    /// Run one turn. Events are appended to the session before they are yielded.
    pub fn run(
        &self,
        user_id: &str,
        session_id: &str,
        message: impl Into<String>,
    ) -> BoxStream<'static, Result<Event, AgentError>> {
        let app_name = self.app_name.clone();
        let user_id = user_id.to_string();
        let session_id = session_id.to_string();
        let message = message.into();
        let tree = Arc::clone(&self.tree);
        let service = Arc::clone(&self.session_service);
        let max_llm_calls = self.max_llm_calls;

        let stream = async_stream::try_stream! {
            let mut session = service
                .get_session(&app_name, &user_id, &session_id)
                .await?
                .ok_or_else(|| AgentError::SessionNotFound {
                    app_name: app_name.clone(),
                    user_id: user_id.clone(),
                    session_id: session_id.clone(),
                })?;

            let invocation = Invocation {
                id: format!("e-{}", uuid::Uuid::new_v4()),
                user_content: Some(message.clone()),
                tree: Arc::clone(&tree),
                state: SharedState::new(session.state.clone()),
            };
            info!(invocation_id = %invocation.id, %session_id, "starting turn");

            let user_event = Event::new(&invocation.id, USER_AUTHOR)
                .with_content(ModelMessage::user(message));
            service.append_event(&mut session, user_event).await?;

            let mut active = Arc::clone(tree.root());
            let mut llm_calls = 0usize;
            let mut usage = Usage::default();
            loop {
                if llm_calls >= max_llm_calls {
                    let event = limit_event(&invocation.id, active.name(), max_llm_calls);
                    error!(agent = active.name(), max_llm_calls, "model call limit reached");
                    yield service.append_event(&mut session, event).await?;
                    break;
                }
                llm_calls += 1;

                let step = run_step(&invocation, &active, &session.events).await?;
                usage.merge(&step.usage);
                for event in step.events {
                    yield service.append_event(&mut session, event).await?;
                }

                match step.next {
                    NextStep::Continue => {}
                    NextStep::Transfer(target) => {
                        info!(from = active.name(), to = target.name(), "agent transfer");
                        active = target;
                    }
                    NextStep::Done => break,
                }
            }
            debug!(
                invocation_id = %invocation.id,
                llm_calls,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                total_tokens = usage.total_tokens,
                "turn finished"
            );
        };

        boxed(stream)
    }

    /// Run one turn and return the text of its final response.
    pub async fn call_agent(&self, user_id: &str, session_id: &str, query: &str) -> String {
        let mut events = self.run(user_id, session_id, query);
        let mut final_text = NO_FINAL_RESPONSE.to_string();

        while let Some(item) = events.next().await {
            match item {
                Ok(event) if event.is_final_response() => {
                    if let Some(text) = event.content.as_ref().filter(|c| c.has_text()) {
                        final_text = text.text();
                    } else if event.actions.escalate {
                        final_text = format!(
                            "Agent escalated: {}",
                            event.error_message.as_deref().unwrap_or("No specific message.")
                        );
                    }
                    break;
                }
                Ok(event) => debug!(author = %event.author, "intermediate event"),
                Err(e) => {
                    error!(error = %e, "agent turn failed");
                    final_text = PROCESSING_ERROR.to_string();
                    break;
                }
            }
        }

        final_text
    }
}

fn boxed<S>(stream: S) -> BoxStream<'static, Result<Event, AgentError>>
where
    S: Stream<Item = Result<Event, AgentError>> + Send + 'static,
{
    Box::pin(stream)
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("app_name", &self.app_name)
            .field("root_agent", &self.tree.root().name())
            .field("max_llm_calls", &self.max_llm_calls)
            .finish()
    }
}
