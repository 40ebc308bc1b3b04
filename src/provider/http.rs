//! Shared HTTP client and status mapping.

use std::sync::OnceLock;
use std::time::Duration;

use crate::error::AgentError;

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// Get (or create) the shared reqwest client.
pub fn shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .pool_max_idle_per_host(10)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    })
}

/// Map a non-success HTTP status to an error.
pub fn status_to_error(status: u16, body: &str) -> AgentError {
    match status {
        401 | 403 => AgentError::Authentication(error_message(body)),
        429 => AgentError::RateLimited {
            retry_after_ms: extract_retry_after(body),
        },
        _ => AgentError::api(status, error_message(body)),
    }
}

/// Prefer `error.message` from a Google-style JSON error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

/// Read `retryDelay` (e.g. `"13s"`) from a `google.rpc.RetryInfo` detail.
fn extract_retry_after(body: &str) -> Option<u64> {
    let value = serde_json::from_str::<serde_json::Value>(body).ok()?;
    let details = value.get("error")?.get("details")?.as_array()?;
    details.iter().find_map(|d| {
        let delay = d.get("retryDelay")?.as_str()?;
        let secs: f64 = delay.strip_suffix('s')?.parse().ok()?;
        Some((secs * 1000.0) as u64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_reads_retry_delay() {
        let body = r#"{"error":{"code":429,"message":"quota","details":[
            {"@type":"type.googleapis.com/google.rpc.RetryInfo","retryDelay":"13s"}]}}"#;
        match status_to_error(429, body) {
            AgentError::RateLimited { retry_after_ms } => assert_eq!(retry_after_ms, Some(13_000)),
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[test]
    fn api_error_uses_embedded_message() {
        let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
        match status_to_error(400, body) {
            AgentError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }

    #[test]
    fn non_json_body_is_kept_verbatim() {
        match status_to_error(403, "forbidden") {
            AgentError::Authentication(msg) => assert_eq!(msg, "forbidden"),
            other => panic!("expected Authentication, got {other:?}"),
        }
    }
}
