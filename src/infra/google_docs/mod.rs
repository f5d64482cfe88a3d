// =============================================================================
// GOOGLE DOCS MODULE
// =============================================================================
//
// Infra-side integration with the Google Docs API: the two credential
// strategies (service account, interactive OAuth) and the document gateway
// the publish service writes through.
//
// This module lives in the infra layer because it is all external I/O. The
// core layer only sees the `DocsGateway` port; the HTTP layer additionally
// sees `TokenProvider` for the connectivity probe.

pub mod google_docs_client;
pub mod oauth_flow;
pub mod service_account;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use google_docs_client::GoogleDocsClient;
pub use oauth_flow::InteractiveAuth;
pub use service_account::ServiceAccountAuth;

/// OAuth scope required to create and edit documents.
pub const DOCS_SCOPE: &str = "https://www.googleapis.com/auth/documents";

/// Errors raised by the credential providers.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential configuration error: {0}")]
    Configuration(String),
    #[error("token exchange failed: {0}")]
    Exchange(String),
}

/// Result of a connectivity probe. Serialized as the response body of
/// `GET /check-google-connection`.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectionStatus {
    pub fn ok() -> Self {
        Self {
            connected: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            connected: false,
            error: Some(error.into()),
        }
    }
}

/// Supplies bearer tokens for the document service.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns a currently valid access token, refreshing or acquiring one
    /// as needed.
    async fn access_token(&self) -> Result<String, CredentialError>;

    /// Reports whether a usable credential is available right now. Must not
    /// start an interactive consent flow.
    async fn check_connection(&self) -> ConnectionStatus;
}
