//! Google Gemini API provider.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::error::AgentError;
use crate::models::GoogleModel;
use crate::types::*;
use crate::util::retry::RetryPolicy;

use super::http::{shared_client, status_to_error};
use super::{ModelProvider, ProviderRequest, ProviderResponse};

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GoogleProvider {
    model: GoogleModel,
    api_key: String,
    base_url: String,
    retry_policy: RetryPolicy,
}

impl GoogleProvider {
    pub fn new(model: GoogleModel, api_key: String) -> Self {
        Self {
            model,
            api_key,
            base_url: BASE_URL.to_string(),
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Point the provider at another endpoint (proxies, mock servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub(crate) fn build_request_body(&self, request: &ProviderRequest) -> Value {
        let mut system_parts = Vec::new();
        let mut contents = Vec::new();

        for msg in &request.messages {
            match msg.role {
                Role::System => {
                    if msg.has_text() {
                        system_parts.push(json!({"text": msg.text()}));
                    }
                }
                Role::User => {
                    let parts = text_parts(&msg.content);
                    if !parts.is_empty() {
                        contents.push(json!({"role": "user", "parts": parts}));
                    }
                }
                Role::Assistant => {
                    let parts: Vec<Value> = msg
                        .content
                        .iter()
                        .filter_map(|part| match part {
                            ContentPart::Text { text } if !text.is_empty() => {
                                Some(json!({"text": text}))
                            }
                            ContentPart::ToolCall(tc) => Some(json!({
                                "functionCall": {"name": tc.name, "args": tc.arguments}
                            })),
                            _ => None,
                        })
                        .collect();
                    if !parts.is_empty() {
                        contents.push(json!({"role": "model", "parts": parts}));
                    }
                }
                Role::Tool => {
                    let parts: Vec<Value> = msg
                        .tool_results()
                        .into_iter()
                        .map(|tr| {
                            json!({
                                "functionResponse": {
                                    "name": tr.name,
                                    "response": as_object(&tr.result),
                                }
                            })
                        })
                        .collect();
                    if !parts.is_empty() {
                        contents.push(json!({"role": "user", "parts": parts}));
                    }
                }
            }
        }

        let mut body = Map::new();
        body.insert("contents".into(), Value::Array(contents));

        if !system_parts.is_empty() {
            body.insert("systemInstruction".into(), json!({ "parts": system_parts }));
        }

        let mut gen_config = Map::new();
        if let Some(max) = request.settings.max_tokens {
            gen_config.insert("maxOutputTokens".into(), max.into());
        }
        if let Some(temp) = request.settings.temperature {
            gen_config.insert("temperature".into(), temp.into());
        }
        if let Some(top_p) = request.settings.top_p {
            gen_config.insert("topP".into(), top_p.into());
        }
        if let Some(top_k) = request.settings.top_k {
            gen_config.insert("topK".into(), top_k.into());
        }
        if let Some(ref stops) = request.settings.stop_sequences {
            gen_config.insert("stopSequences".into(), json!(stops));
        }
        if !gen_config.is_empty() {
            body.insert("generationConfig".into(), Value::Object(gen_config));
        }

        if let Some(ref tools) = request.tools {
            if !tools.is_empty() {
                let fn_decls: Vec<Value> = tools
                    .iter()
                    .map(|t| {
                        let mut decl = json!({
                            "name": t.name,
                            "description": t.description,
                        });
                        // Gemini rejects object schemas without properties.
                        if has_properties(&t.parameters) {
                            decl["parameters"] = t.parameters.clone();
                        }
                        decl
                    })
                    .collect();
                body.insert("tools".into(), json!([{ "functionDeclarations": fn_decls }]));
            }
        }

        Value::Object(body)
    }

    async fn send_once(&self, url: &str, body: &Value) -> Result<GeminiResponse, AgentError> {
        let resp = shared_client()
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl ModelProvider for GoogleProvider {
    fn provider_name(&self) -> &str {
        "google"
    }

    fn model_id(&self) -> &str {
        self.model.as_str()
    }

    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse, AgentError> {
        let body = self.build_request_body(request);
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url,
            self.model.as_str()
        );

        debug!(
            model = self.model.as_str(),
            messages = request.messages.len(),
            "Google generate_text"
        );

        let data = self
            .retry_policy
            .execute(|| self.send_once(&url, &body))
            .await?;

        let candidate = data
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::api(200, "No candidates in Gemini response"))?;

        let mut text = String::new();
        let mut tool_calls = Vec::new();

        for part in candidate.content.map(|c| c.parts).unwrap_or_default() {
            if let Some(t) = part.text {
                text.push_str(&t);
            }
            if let Some(fc) = part.function_call {
                tool_calls.push(AgentToolCall {
                    id: uuid::Uuid::new_v4().to_string(),
                    name: fc.name,
                    arguments: fc.args.unwrap_or_else(|| Value::Object(Map::new())),
                });
            }
        }

        let finish_reason = if !tool_calls.is_empty() {
            Some(FinishReason::ToolCalls)
        } else {
            match candidate.finish_reason.as_deref() {
                Some("STOP") => Some(FinishReason::Stop),
                Some("MAX_TOKENS") => Some(FinishReason::Length),
                Some("SAFETY") => Some(FinishReason::ContentFilter),
                Some(_) => Some(FinishReason::Error),
                None => None,
            }
        };

        let usage = data
            .usage_metadata
            .map(|u| Usage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            })
            .unwrap_or_default();

        Ok(ProviderResponse {
            text,
            usage,
            tool_calls,
            finish_reason,
        })
    }
}

fn text_parts(content: &[ContentPart]) -> Vec<Value> {
    content
        .iter()
        .filter_map(|part| match part {
            ContentPart::Text { text } if !text.is_empty() => Some(json!({"text": text})),
            _ => None,
        })
        .collect()
}

fn has_properties(schema: &Value) -> bool {
    schema
        .get("properties")
        .and_then(Value::as_object)
        .is_some_and(|p| !p.is_empty())
}

/// Gemini requires `functionResponse.response` to be an object.
fn as_object(value: &Value) -> Value {
    if value.is_object() {
        value.clone()
    } else {
        json!({ "result": value })
    }
}

// Internal Gemini response types

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    text: Option<String>,
    function_call: Option<GeminiFunctionCall>,
}

#[derive(Deserialize)]
struct GeminiFunctionCall {
    name: String,
    args: Option<Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}
