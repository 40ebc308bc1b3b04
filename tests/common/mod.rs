//! Shared test helpers and mock provider.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use weather_agent::config::AppConfig;
use weather_agent::error::AgentError;
use weather_agent::provider::{ModelProvider, ProviderRequest, ProviderResponse};
use weather_agent::session::{InMemorySessionService, SessionService};
use weather_agent::types::*;

/// A mock provider that replays queued responses and records every request.
pub struct MockProvider {
    model_id: String,
    responses: Mutex<VecDeque<Result<ProviderResponse, AgentError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl MockProvider {
    pub fn new(model_id: &str) -> Arc<Self> {
        Arc::new(Self {
            model_id: model_id.to_string(),
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Queue a text response.
    pub fn queue_response(&self, text: &str) {
        self.responses.lock().unwrap().push_back(Ok(ProviderResponse {
            text: text.to_string(),
            usage: Usage {
                input_tokens: 10,
                output_tokens: 20,
                total_tokens: 30,
            },
            tool_calls: vec![],
            finish_reason: Some(FinishReason::Stop),
        }));
    }

    /// Queue a tool call response.
    pub fn queue_tool_call(&self, id: &str, name: &str, args: serde_json::Value) {
        self.responses.lock().unwrap().push_back(Ok(ProviderResponse {
            text: String::new(),
            usage: Usage {
                input_tokens: 10,
                output_tokens: 5,
                total_tokens: 15,
            },
            tool_calls: vec![AgentToolCall {
                id: id.to_string(),
                name: name.to_string(),
                arguments: args,
            }],
            finish_reason: Some(FinishReason::ToolCalls),
        }));
    }

    /// Queue an arbitrary response.
    pub fn queue(&self, response: ProviderResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue a transfer to another agent.
    pub fn queue_transfer(&self, id: &str, agent_name: &str) {
        self.queue_tool_call(
            id,
            "transfer_to_agent",
            serde_json::json!({ "agent_name": agent_name }),
        );
    }

    pub fn queue_error(&self, error: AgentError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse, AgentError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ProviderResponse::text("Mock response")))
    }
}

/// Config pointing the weather tool at `weather_base_url` with a dummy key.
pub fn test_config(weather_base_url: Option<String>) -> AppConfig {
    AppConfig {
        google_api_key: Some("test-google-key".into()),
        weather_api_key: Some("test-weather-key".into()),
        weather_base_url,
        ..AppConfig::default()
    }
}

pub fn session_service() -> Arc<dyn SessionService> {
    Arc::new(InMemorySessionService::new())
}

/// A WeatherAPI.com `current.json` body for London.
pub fn london_weather() -> serde_json::Value {
    serde_json::json!({
        "location": { "name": "London", "country": "United Kingdom" },
        "current": {
            "last_updated": "2024-05-01 14:30",
            "temp_c": 15.0,
            "temp_f": 59.0,
            "condition": { "text": "Partly cloudy", "code": 1003 },
            "wind_mph": 6.9,
            "wind_kph": 11.2,
            "wind_dir": "WSW",
            "humidity": 72,
            "feelslike_c": 14.2,
            "feelslike_f": 57.6,
            "uv": 4.0
        }
    })
}

/// In-memory sink for `tracing` output.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Subscriber writing every level of this crate's events into the capture.
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync {
        let sink = self.clone();
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("weather_agent=trace"))
            .with_ansi(false)
            .with_writer(move || sink.clone())
            .finish()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
