use crate::core::profile::{CompletionError, CompletionProvider, CompletionRequest};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::json;
use std::time::Duration;

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Bounded per-call timeout. Remote calls still run to completion or failure;
/// there is no retry.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the OpenAI chat completions endpoint. The API key travels with
/// each request rather than living in the client, because callers supply
/// their own keys.
pub struct OpenAiClient {
    client: Client,
}

impl OpenAiClient {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
        }
    }
}

impl Default for OpenAiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn chat_complete(
        &self,
        prompt: &str,
        request: &CompletionRequest,
    ) -> Result<String, CompletionError> {
        let payload = json!({
            "model": request.model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": request.max_tokens,
        });

        let response = self
            .client
            .post(CHAT_COMPLETIONS_URL)
            .header("Authorization", format!("Bearer {}", request.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| CompletionError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CompletionError::Upstream(e.to_string()))?;

        let content = response_json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                CompletionError::Upstream("failed to parse response content".to_string())
            })?
            .to_string();

        Ok(content)
    }
}

/// Maps an unsuccessful completion response onto the error taxonomy. The
/// `insufficient_quota` probe covers billing errors that arrive with other
/// status codes.
fn classify_failure(status: StatusCode, body: &str) -> CompletionError {
    if status == StatusCode::UNAUTHORIZED {
        CompletionError::Authentication(format!("{} - {}", status, body))
    } else if status == StatusCode::TOO_MANY_REQUESTS || body.contains("insufficient_quota") {
        CompletionError::QuotaExceeded(format!("{} - {}", status, body))
    } else {
        CompletionError::Upstream(format!("OpenAI API error: {} - {}", status, body))
    }
}
