//! Builds the message list an agent sends to its model.

use std::sync::Arc;

use crate::events::{Event, USER_AUTHOR};
use crate::tools::transfer::TRANSFER_TOOL_NAME;
use crate::types::{ContentPart, ModelMessage};

use super::agent::LlmAgent;

/// Instruction plus delegation guidance when the agent has targets.
pub fn system_instruction(
    agent: &LlmAgent,
    targets: &[Arc<LlmAgent>],
    parent: Option<&str>,
) -> String {
    let mut instruction = agent.instruction().to_string();
    if targets.is_empty() {
        return instruction;
    }

    instruction.push_str("\n\nYou can hand the conversation to one of these agents:\n");
    for target in targets {
        instruction.push_str(&format!(
            "\nAgent name: {}\nAgent description: {}\n",
            target.name(),
            target.description()
        ));
    }
    instruction.push_str(&format!(
        "\nIf you are the best fit for the request according to your own description, answer it yourself. \
         If another agent is a better fit, call the `{TRANSFER_TOOL_NAME}` function with that agent's name \
         and do not produce any other text in that reply."
    ));
    if let Some(parent) = parent {
        instruction.push_str(&format!(
            "\nIf neither you nor the agents above suit the request, transfer to your parent agent {parent}."
        ));
    }
    instruction
}

/// Restate another agent's output as context for `agent`.
fn as_context(author: &str, content: &ModelMessage) -> Option<ModelMessage> {
    let mut lines = vec!["For context:".to_string()];
    for part in &content.content {
        match part {
            ContentPart::Text { text } if !text.trim().is_empty() => {
                lines.push(format!("[{author}] said: {text}"));
            }
            ContentPart::Text { .. } => {}
            ContentPart::ToolCall(call) => lines.push(format!(
                "[{author}] called tool `{}` with parameters: {}",
                call.name, call.arguments
            )),
            ContentPart::ToolResult(result) => lines.push(format!(
                "[{author}] `{}` tool returned result: {}",
                result.name, result.result
            )),
        }
    }
    (lines.len() > 1).then(|| ModelMessage::user(lines.join("\n")))
}

/// The model-bound conversation for `agent` given the session's events.
pub fn build_messages(
    agent: &LlmAgent,
    targets: &[Arc<LlmAgent>],
    parent: Option<&str>,
    events: &[Event],
) -> Vec<ModelMessage> {
    let mut messages = vec![ModelMessage::system(system_instruction(agent, targets, parent))];

    for event in events {
        let Some(content) = event.content.as_ref().filter(|c| !c.content.is_empty()) else {
            continue;
        };
        if event.author == USER_AUTHOR || event.author == agent.name() {
            messages.push(content.clone());
        } else if let Some(context) = as_context(&event.author, content) {
            messages.push(context);
        }
    }

    messages
}
