//! The weather assistant: a guarded weather agent delegating greetings and farewells.

use std::sync::Arc;

use tracing::info;

use crate::agent::LlmAgent;
use crate::config::AppConfig;
use crate::error::AgentError;
use crate::guardrail::KeywordGuardrail;
use crate::provider::ModelProvider;
use crate::runner::Runner;
use crate::session::SessionService;
use crate::tools::{say_goodbye_tool, say_hello_tool, WeatherTool};

pub const ROOT_AGENT_NAME: &str = "weather_agent";
pub const GREETING_AGENT_NAME: &str = "greeting_agent";
pub const FAREWELL_AGENT_NAME: &str = "farewell_agent";
/// State key holding the root agent's latest answer.
pub const WEATHER_REPORT_KEY: &str = "last_weather_report";

/// Scripted turns run by the `demo` command.
pub const DEMO_TURNS: [&str; 3] = [
    "What is the weather in London?",
    "BLOCK the request for weather in Tokyo",
    "Hello again",
];

const ROOT_INSTRUCTION: &str = "You are a weather assistant. Your primary goal is to answer the user's specific question concisely. \
**FIRST**, determine if the user is asking for a specific weather detail (like temperature, wind, humidity) or general weather ('how is the weather?'). \
**SECOND**, use the 'get_weather' tool ONLY to get the necessary data for the requested city. This tool returns a *very detailed report*. \
**THIRD**, look at the user's original question again. \
**FOURTH**, from the detailed tool report, extract ONLY the specific piece of information the user asked for. \
**FIFTH**, present ONLY that single piece of information in your answer (e.g., 'The temperature in London is X°C.', 'The wind in Paris is blowing from the X at Y kph.'). \
**EXCEPTION:** If the user asked a general question like 'What's the weather like?', then and ONLY then should you provide the full, detailed report from the tool. \
Also delegate simple greetings to 'greeting_agent' and farewells to 'farewell_agent'.";

pub fn greeting_agent(provider: Arc<dyn ModelProvider>) -> LlmAgent {
    LlmAgent::new(GREETING_AGENT_NAME, provider)
        .with_description("Handles simple greetings and hellos using the 'say_hello' tool.")
        .with_instruction(
            "You are the Greeting Agent. Your ONLY task is to provide a friendly greeting \
             using the 'say_hello' tool. Do nothing else.",
        )
        .with_tool(Arc::new(say_hello_tool()))
}

pub fn farewell_agent(provider: Arc<dyn ModelProvider>) -> LlmAgent {
    LlmAgent::new(FAREWELL_AGENT_NAME, provider)
        .with_description("Handles simple farewells and goodbyes using the 'say_goodbye' tool.")
        .with_instruction(
            "You are the Farewell Agent. Your ONLY task is to provide a polite goodbye message \
             using the 'say_goodbye' tool. Do not perform any other actions.",
        )
        .with_tool(Arc::new(say_goodbye_tool()))
}

/// Root agent with the weather tool, both delegates and the keyword guardrail.
pub fn weather_agent(provider: Arc<dyn ModelProvider>, weather: WeatherTool) -> LlmAgent {
    LlmAgent::new(ROOT_AGENT_NAME, Arc::clone(&provider))
        .with_description(
            "Main agent: Handles weather, delegates greetings/farewells, includes input keyword guardrail.",
        )
        .with_instruction(ROOT_INSTRUCTION)
        .with_tool(Arc::new(weather))
        .with_sub_agent(Arc::new(greeting_agent(Arc::clone(&provider))))
        .with_sub_agent(Arc::new(farewell_agent(provider)))
        .with_output_key(WEATHER_REPORT_KEY)
        .with_before_model_callback(Arc::new(KeywordGuardrail::default()))
}

/// Build the runner and make sure the configured session exists.
pub async fn build_runner(
    config: &AppConfig,
    provider: Arc<dyn ModelProvider>,
    session_service: Arc<dyn SessionService>,
) -> Result<Runner, AgentError> {
    let root = Arc::new(weather_agent(provider, WeatherTool::from_config(config)));
    let runner = Runner::new(&config.app_name, root, Arc::clone(&session_service))?
        .with_max_llm_calls(config.max_llm_calls);

    let existing = session_service
        .get_session(&config.app_name, &config.user_id, &config.session_id)
        .await?;
    if existing.is_none() {
        session_service
            .create_session(
                &config.app_name,
                &config.user_id,
                Some(config.initial_state()),
                Some(&config.session_id),
            )
            .await?;
        info!(
            app_name = %config.app_name,
            user_id = %config.user_id,
            session_id = %config.session_id,
            unit = %config.temperature_unit,
            "session created"
        );
    }

    Ok(runner)
}
