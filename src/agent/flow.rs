//! One model step of the active agent: callback, model call, tool execution.

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::AgentError;
use crate::events::{Event, EventActions};
use crate::provider::ProviderRequest;
use crate::session::SharedState;
use crate::tools::{Tool, ToolArguments, ToolContext, TransferToAgentTool};
use crate::types::{AgentToolCall, AgentToolResult, ModelMessage, Usage};

use super::agent::{tool_definitions, LlmAgent};
use super::callbacks::CallbackContext;
use super::contents::build_messages;
use super::tree::AgentTree;

/// Per-turn data shared by every step.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub id: String,
    /// The user message that started the turn.
    pub user_content: Option<String>,
    pub tree: Arc<AgentTree>,
    pub state: SharedState,
}

/// What the turn does after a step.
#[derive(Debug)]
pub enum NextStep {
    /// Call the same agent's model again with the tool results.
    Continue,
    /// Hand the turn to another agent.
    Transfer(Arc<LlmAgent>),
    /// The step produced the turn's final response.
    Done,
}

#[derive(Debug)]
pub struct StepOutput {
    pub events: Vec<Event>,
    pub next: NextStep,
    /// Tokens spent by the step's model call; zero when a callback answered.
    pub usage: Usage,
}

/// Event emitted when a turn runs out of model calls.
pub fn limit_event(invocation_id: &str, agent_name: &str, max_llm_calls: usize) -> Event {
    let mut event = Event::new(invocation_id, agent_name);
    event.actions.escalate = true;
    event.error_message = Some(format!(
        "Exceeded the limit of {max_llm_calls} model calls in one turn."
    ));
    event
}

/// Run one model call for `agent` against the session history.
pub async fn run_step(
    invocation: &Invocation,
    agent: &Arc<LlmAgent>,
    history: &[Event],
) -> Result<StepOutput, AgentError> {
    let targets = invocation.tree.transfer_targets(agent.name());
    let parent = invocation
        .tree
        .parent_of(agent.name())
        .map(|p| p.name().to_string());

    let mut tools: Vec<Arc<dyn Tool>> = agent.tools().to_vec();
    if !targets.is_empty() {
        let names = targets.iter().map(|t| t.name().to_string()).collect();
        tools.push(Arc::new(TransferToAgentTool::new(names)));
    }

    let request = ProviderRequest {
        messages: build_messages(agent, &targets, parent.as_deref(), history),
        settings: agent.settings().clone(),
        tools: tool_definitions(&tools),
    };

    let intercepted = match agent.before_model_callback() {
        Some(callback) => {
            let mut ctx = CallbackContext::new(agent.name(), &invocation.id, invocation.state.clone());
            if let Some(text) = &invocation.user_content {
                ctx = ctx.with_user_content(text.clone());
            }
            callback.before_model(&ctx, &request).await?
        }
        None => None,
    };

    let response = match intercepted {
        Some(response) => {
            info!(agent = agent.name(), "model call skipped by callback");
            response
        }
        None => {
            debug!(
                agent = agent.name(),
                model = agent.provider().model_id(),
                messages = request.messages.len(),
                "calling model"
            );
            agent.provider().generate_text(&request).await?
        }
    };

    let mut model_event = Event::new(&invocation.id, agent.name());
    if !response.text.is_empty() || !response.tool_calls.is_empty() {
        model_event = model_event.with_content(ModelMessage::assistant_with_tool_calls(
            &response.text,
            &response.tool_calls,
        ));
    }

    if response.tool_calls.is_empty() {
        if let Some(key) = agent.output_key().filter(|_| !response.text.is_empty()) {
            invocation.state.set(key, response.text.clone());
        }
        model_event.actions.state_delta = invocation.state.take_delta();
        return Ok(StepOutput {
            events: vec![model_event],
            next: NextStep::Done,
            usage: response.usage,
        });
    }
    model_event.actions.state_delta = invocation.state.take_delta();

    let mut results = Vec::with_capacity(response.tool_calls.len());
    let mut transfer = None;
    for call in &response.tool_calls {
        let ctx = ToolContext::new(agent.name(), &invocation.id, &call.id, invocation.state.clone());
        results.push(execute_tool(&tools, call, &ctx).await);
        if let Some(target) = ctx.transfer_target() {
            transfer = Some(target);
        }
    }

    let tool_event = Event::new(&invocation.id, agent.name())
        .with_content(ModelMessage::tool_response(results))
        .with_actions(EventActions {
            state_delta: invocation.state.take_delta(),
            transfer_to_agent: transfer.clone(),
            escalate: false,
        });

    let next = match transfer {
        Some(name) => {
            let target = invocation
                .tree
                .get(&name)
                .ok_or_else(|| AgentError::AgentNotFound(name.clone()))?;
            NextStep::Transfer(Arc::clone(target))
        }
        None => NextStep::Continue,
    };

    Ok(StepOutput {
        events: vec![model_event, tool_event],
        next,
        usage: response.usage,
    })
}

async fn execute_tool(
    tools: &[Arc<dyn Tool>],
    call: &AgentToolCall,
    ctx: &ToolContext,
) -> AgentToolResult {
    let failed = |message: String| AgentToolResult {
        tool_call_id: call.id.clone(),
        name: call.name.clone(),
        result: json!({ "error": message }),
        is_error: true,
    };

    let Some(tool) = tools.iter().find(|t| t.name() == call.name) else {
        warn!(tool = %call.name, agent = ctx.agent_name(), "Tool not found");
        return failed(format!("Tool '{}' not found", call.name));
    };

    debug!(
        tool = %call.name,
        agent = ctx.agent_name(),
        invocation_id = ctx.invocation_id(),
        "executing tool"
    );
    match tool.execute(&ToolArguments::new(call.arguments.clone()), ctx).await {
        Ok(result) => AgentToolResult {
            tool_call_id: call.id.clone(),
            name: call.name.clone(),
            result,
            is_error: false,
        },
        Err(e) => {
            warn!(tool = %call.name, error = %e, "Tool execution failed");
            failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::test_support::ScriptedProvider;
    use crate::provider::ProviderResponse;
    use crate::session::State;
    use crate::tools::say_hello_tool;

    fn invocation(root: LlmAgent) -> Invocation {
        Invocation {
            id: "inv-1".into(),
            user_content: None,
            tree: Arc::new(AgentTree::new(Arc::new(root)).unwrap()),
            state: SharedState::new(State::new()),
        }
    }

    fn call(name: &str, args: serde_json::Value) -> AgentToolCall {
        AgentToolCall {
            id: format!("call-{name}"),
            name: name.into(),
            arguments: args,
        }
    }

    #[tokio::test]
    async fn final_text_is_stored_under_output_key() {
        let provider = ScriptedProvider::new(vec![ProviderResponse::text("Sunny.")]);
        let inv = invocation(LlmAgent::new("weather_agent", provider).with_output_key("last_weather_report"));
        let root = Arc::clone(inv.tree.root());

        let out = run_step(&inv, &root, &[]).await.unwrap();
        assert!(matches!(out.next, NextStep::Done));
        assert_eq!(out.events.len(), 1);
        assert_eq!(
            out.events[0].actions.state_delta.get("last_weather_report"),
            Some(&json!("Sunny."))
        );
    }

    #[tokio::test]
    async fn unknown_tool_becomes_error_result() {
        let provider = ScriptedProvider::new(vec![ProviderResponse {
            tool_calls: vec![call("get_forecast", json!({}))],
            usage: Usage {
                input_tokens: 5,
                output_tokens: 2,
                total_tokens: 7,
            },
            ..Default::default()
        }]);
        let inv = invocation(LlmAgent::new("weather_agent", provider));
        let root = Arc::clone(inv.tree.root());

        let out = run_step(&inv, &root, &[]).await.unwrap();
        assert!(matches!(out.next, NextStep::Continue));
        assert_eq!(out.usage.total_tokens, 7);
        let results = out.events[1].tool_results();
        assert!(results[0].is_error);
        assert_eq!(results[0].result["error"], "Tool 'get_forecast' not found");
    }

    #[tokio::test]
    async fn transfer_call_switches_agent() {
        let greeter = Arc::new(
            LlmAgent::new("greeting_agent", ScriptedProvider::new(vec![]))
                .with_tool(Arc::new(say_hello_tool())),
        );
        let provider = ScriptedProvider::new(vec![ProviderResponse {
            tool_calls: vec![call("transfer_to_agent", json!({"agent_name": "greeting_agent"}))],
            ..Default::default()
        }]);
        let inv = invocation(LlmAgent::new("weather_agent", provider.clone()).with_sub_agent(greeter));
        let root = Arc::clone(inv.tree.root());

        let out = run_step(&inv, &root, &[]).await.unwrap();
        match out.next {
            NextStep::Transfer(agent) => assert_eq!(agent.name(), "greeting_agent"),
            other => panic!("expected transfer, got {other:?}"),
        }
        assert_eq!(
            out.events[1].actions.transfer_to_agent.as_deref(),
            Some("greeting_agent")
        );

        let sent = provider.requests();
        let tools = sent[0].tools.as_ref().unwrap();
        assert!(tools.iter().any(|t| t.name == "transfer_to_agent"));
    }

    #[test]
    fn limit_event_escalates() {
        let event = limit_event("inv", "weather_agent", 3);
        assert!(event.actions.escalate);
        assert!(event.is_final_response());
        assert_eq!(
            event.error_message.as_deref(),
            Some("Exceeded the limit of 3 model calls in one turn.")
        );
    }
}
