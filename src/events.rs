//! Conversation events produced while a turn runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{AgentToolCall, AgentToolResult, ModelMessage};

/// Author recorded on events that carry user input.
pub const USER_AUTHOR: &str = "user";

/// Side effects attached to an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventActions {
    /// State changes to apply when the event is appended to a session.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub state_delta: Map<String, Value>,
    /// Agent that takes over the rest of the turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_to_agent: Option<String>,
    /// The turn was abandoned and needs outside attention.
    #[serde(default)]
    pub escalate: bool,
}

/// One step of a conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub invocation_id: String,
    /// `"user"` or the name of the agent that produced the event.
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ModelMessage>,
    #[serde(default)]
    pub actions: EventActions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(invocation_id: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            invocation_id: invocation_id.into(),
            author: author.into(),
            content: None,
            actions: EventActions::default(),
            error_message: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_content(mut self, content: ModelMessage) -> Self {
        self.content = Some(content);
        self
    }

    pub fn with_actions(mut self, actions: EventActions) -> Self {
        self.actions = actions;
        self
    }

    pub fn tool_calls(&self) -> Vec<&AgentToolCall> {
        self.content
            .as_ref()
            .map(ModelMessage::tool_calls)
            .unwrap_or_default()
    }

    pub fn tool_results(&self) -> Vec<&AgentToolResult> {
        self.content
            .as_ref()
            .map(ModelMessage::tool_results)
            .unwrap_or_default()
    }

    /// Text of the event, if it carries any.
    pub fn text(&self) -> Option<String> {
        self.content
            .as_ref()
            .filter(|c| c.has_text())
            .map(ModelMessage::text)
    }

    /// Whether this event concludes the turn for its author.
    pub fn is_final_response(&self) -> bool {
        self.tool_calls().is_empty() && self.tool_results().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AgentToolCall;

    #[test]
    fn tool_call_events_are_not_final() {
        let call = AgentToolCall {
            id: "c1".into(),
            name: "get_weather".into(),
            arguments: serde_json::json!({"city": "Paris"}),
        };
        let event = Event::new("inv", "weather_agent")
            .with_content(ModelMessage::assistant_with_tool_calls("", &[call]));
        assert!(!event.is_final_response());
        assert_eq!(event.text(), None);
    }

    #[test]
    fn text_and_bare_events_are_final() {
        let text = Event::new("inv", "weather_agent").with_content(ModelMessage::assistant("Hi"));
        assert!(text.is_final_response());
        assert_eq!(text.text().as_deref(), Some("Hi"));

        let mut escalation = Event::new("inv", "weather_agent");
        escalation.actions.escalate = true;
        assert!(escalation.is_final_response());
    }
}
