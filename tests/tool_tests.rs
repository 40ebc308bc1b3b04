//! Tests for the tool system.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use weather_agent::session::{SharedState, State};
use weather_agent::tools::*;

#[test]
fn parameter_builder_string_enum() {
    let params = AgentToolParameters::object()
        .string_enum("unit", "Unit", &["Celsius", "Fahrenheit"], true)
        .build();

    let enums = params.schema["properties"]["unit"]["enum"]
        .as_array()
        .unwrap();
    assert_eq!(enums.len(), 2);
    assert_eq!(params.schema["required"], json!(["unit"]));
}

#[test]
fn arguments_deserialize_into_struct() {
    #[derive(Deserialize)]
    struct WeatherArgs {
        city: String,
    }

    let args = ToolArguments::new(json!({ "city": "Lisbon" }));
    let parsed: WeatherArgs = args.deserialize().unwrap();
    assert_eq!(parsed.city, "Lisbon");

    let encoded = ToolArguments::new(json!("{\"city\":\"Porto\"}"));
    let parsed: WeatherArgs = encoded.deserialize().unwrap();
    assert_eq!(parsed.city, "Porto");
}

#[test]
fn arguments_report_missing_keys() {
    let args = ToolArguments::new(json!({}));
    assert!(args.get_str("city").is_err());
    assert_eq!(args.get_str_opt("city"), None);
}

#[tokio::test]
async fn custom_tool_reads_state() {
    let tool: Arc<dyn Tool> = Arc::new(AgentTool::new(
        "preferred_unit",
        "Returns the preferred unit",
        AgentToolParameters::empty(),
        |_args, ctx| async move {
            let unit = ctx
                .state()
                .get_str("user_preference_temperature_unit")
                .unwrap_or_else(|| "Celsius".into());
            Ok(json!({ "unit": unit }))
        },
    ));

    let mut state = State::new();
    state.set("user_preference_temperature_unit", "Fahrenheit");
    let ctx = ToolContext::new("weather_agent", "inv", "call", SharedState::new(state));

    let out = tool.execute(&ToolArguments::new(json!({})), &ctx).await.unwrap();
    assert_eq!(out, json!({ "unit": "Fahrenheit" }));
    assert_eq!(ctx.function_call_id(), "call");
}

#[tokio::test]
async fn greeting_tools_are_exposed_by_name() {
    assert_eq!(say_hello_tool().name(), "say_hello");
    assert_eq!(say_goodbye_tool().name(), "say_goodbye");
    let binding = say_hello_tool();
    let schema = &binding.parameters().schema;
    assert!(schema.get("required").is_none());
}
