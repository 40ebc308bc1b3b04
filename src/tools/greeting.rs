//! Greeting and farewell tools used by the delegate agents.

use serde_json::{json, Value};
use tracing::debug;

use super::tool::AgentTool;
use super::types::AgentToolParameters;

const DEFAULT_NAME: &str = "there";

pub fn say_hello(name: Option<&str>) -> String {
    let name = name.map(str::trim).filter(|n| !n.is_empty()).unwrap_or(DEFAULT_NAME);
    format!("Hello, {name}!")
}

pub fn say_goodbye() -> String {
    "Goodbye! Have a great day.".to_string()
}

fn wrap(text: String) -> Value {
    json!({ "result": text })
}

/// `say_hello(name?)`
pub fn say_hello_tool() -> AgentTool {
    AgentTool::new(
        "say_hello",
        "Provides a simple greeting, addressing the user by name if provided.",
        AgentToolParameters::object()
            .string("name", "The name of the person to greet. Defaults to \"there\".", false)
            .build(),
        |args, ctx| async move {
            let name = args.get_str_opt("name");
            debug!(agent = ctx.agent_name(), name = ?name, "say_hello called");
            Ok(wrap(say_hello(name)))
        },
    )
}

/// `say_goodbye()`
pub fn say_goodbye_tool() -> AgentTool {
    AgentTool::new(
        "say_goodbye",
        "Provides a simple farewell message to conclude the conversation.",
        AgentToolParameters::empty(),
        |_args, ctx| async move {
            debug!(agent = ctx.agent_name(), "say_goodbye called");
            Ok(wrap(say_goodbye()))
        },
    )
}
