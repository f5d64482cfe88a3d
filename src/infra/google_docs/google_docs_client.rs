// Document gateway over the Google Docs v1 API: create a document, insert
// body text. Authentication is delegated to the injected TokenProvider so
// both credential strategies share this path.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use super::TokenProvider;
use crate::core::publish::{DocsGateway, PublishError};

const DOCS_API_BASE: &str = "https://docs.googleapis.com/v1/documents";

/// Bounded per-call timeout; no retry.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedDocument {
    document_id: String,
}

pub struct GoogleDocsClient {
    client: Client,
    auth: Arc<dyn TokenProvider>,
}

impl GoogleDocsClient {
    pub fn new(auth: Arc<dyn TokenProvider>) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
            auth,
        }
    }

    async fn bearer(&self) -> Result<String, PublishError> {
        self.auth
            .access_token()
            .await
            .map_err(|e| PublishError::Service(e.to_string()))
    }
}

#[async_trait]
impl DocsGateway for GoogleDocsClient {
    async fn create_document(&self, title: &str) -> Result<String, PublishError> {
        let token = self.bearer().await?;

        let response = self
            .client
            .post(DOCS_API_BASE)
            .header("Authorization", format!("Bearer {}", token))
            .json(&json!({ "title": title }))
            .send()
            .await
            .map_err(|e| PublishError::Service(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Service(format!(
                "document create failed ({}): {}",
                status, body
            )));
        }

        let document: CreatedDocument = response
            .json()
            .await
            .map_err(|e| PublishError::Service(e.to_string()))?;

        tracing::debug!("Created Google Doc {}", document.document_id);
        Ok(document.document_id)
    }

    async fn insert_text(&self, document_id: &str, text: &str) -> Result<(), PublishError> {
        let token = self.bearer().await?;
        let url = format!("{}/{}:batchUpdate", DOCS_API_BASE, document_id);

        // One insertText request at the first insertion position (index 1).
        let payload = json!({
            "requests": [
                { "insertText": { "location": { "index": 1 }, "text": text } }
            ]
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", token))
            .json(&payload)
            .send()
            .await
            .map_err(|e| PublishError::Service(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PublishError::Service(format!(
                "document insert failed ({}): {}",
                status, body
            )));
        }

        Ok(())
    }
}
