// Service-account credential strategy: a pre-shared JSON key exchanged for
// short-lived bearer tokens via the JWT bearer grant. Stateless apart from
// the in-memory token cache; no local persistence and no interactive step.

use async_trait::async_trait;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;

use super::{ConnectionStatus, CredentialError, TokenProvider, DOCS_SCOPE};

/// Service account credentials from the JSON key blob.
#[derive(Debug, Clone, Deserialize)]
struct ServiceAccountCredentials {
    /// The service account email (used as issuer in the JWT).
    client_email: String,

    /// The private key in PEM format.
    private_key: String,

    /// Where to exchange the JWT for an access token.
    token_uri: String,
}

/// JWT claims for Google OAuth2.
#[derive(Debug, Serialize)]
struct JwtClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: u64,
    exp: u64,
}

/// Response from Google's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Cached access token with expiration.
struct CachedToken {
    token: String,
    expires_at: SystemTime,
}

pub struct ServiceAccountAuth {
    credentials: ServiceAccountCredentials,
    client: Client,
    cached_token: RwLock<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    /// Creates an authenticator from JSON key content.
    pub fn from_json(json: &str) -> Result<Self, CredentialError> {
        let credentials: ServiceAccountCredentials = serde_json::from_str(json).map_err(|e| {
            CredentialError::Configuration(format!("malformed service account key: {}", e))
        })?;
        Ok(Self {
            credentials,
            client: Client::new(),
            cached_token: RwLock::new(None),
        })
    }

    /// Creates an authenticator from a JSON key file path.
    pub async fn from_file(path: &str) -> Result<Self, CredentialError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            CredentialError::Configuration(format!(
                "cannot read service account key {}: {}",
                path, e
            ))
        })?;
        Self::from_json(&content)
    }

    /// Creates from `GOOGLE_CREDENTIALS` (inline JSON) or
    /// `GOOGLE_SERVICE_ACCOUNT_KEY` (path to the key file).
    pub async fn from_env() -> Result<Self, CredentialError> {
        if let Ok(json) = std::env::var("GOOGLE_CREDENTIALS") {
            return Self::from_json(&json);
        }

        if let Ok(path) = std::env::var("GOOGLE_SERVICE_ACCOUNT_KEY") {
            return Self::from_file(&path).await;
        }

        Err(CredentialError::Configuration(
            "Google credentials not found: set GOOGLE_CREDENTIALS or GOOGLE_SERVICE_ACCOUNT_KEY"
                .to_string(),
        ))
    }

    /// Fetches a new access token from Google.
    async fn fetch_new_token(&self) -> Result<String, CredentialError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| CredentialError::Exchange(e.to_string()))?
            .as_secs();

        let claims = JwtClaims {
            iss: self.credentials.client_email.clone(),
            scope: DOCS_SCOPE.to_string(),
            aud: self.credentials.token_uri.clone(),
            iat: now,
            exp: now + 3600,
        };

        let header = Header::new(Algorithm::RS256);
        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| CredentialError::Configuration(format!("invalid private key: {}", e)))?;
        let jwt =
            encode(&header, &claims, &key).map_err(|e| CredentialError::Exchange(e.to_string()))?;

        let response = self
            .client
            .post(&self.credentials.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", &jwt),
            ])
            .send()
            .await
            .map_err(|e| CredentialError::Exchange(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(CredentialError::Exchange(format!(
                "token exchange failed ({}): {}",
                status, text
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| CredentialError::Exchange(e.to_string()))?;
        Ok(token_response.access_token)
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountAuth {
    async fn access_token(&self) -> Result<String, CredentialError> {
        // Serve from cache while the token still has a safety margin left.
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if token.expires_at > SystemTime::now() + Duration::from_secs(60) {
                    return Ok(token.token.clone());
                }
            }
        }

        let new_token = self.fetch_new_token().await?;

        {
            let mut cached = self.cached_token.write().await;
            *cached = Some(CachedToken {
                token: new_token.clone(),
                expires_at: SystemTime::now() + Duration::from_secs(55 * 60),
            });
        }

        Ok(new_token)
    }

    async fn check_connection(&self) -> ConnectionStatus {
        // Local probe only: a key that cannot sign a JWT should show up here
        // rather than on the first publish. No network involved.
        match EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes()) {
            Ok(_) => ConnectionStatus::ok(),
            Err(e) => ConnectionStatus::failed(format!("invalid service account key: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_key_blob_is_a_configuration_error() {
        let result = ServiceAccountAuth::from_json("not json at all");
        assert!(matches!(result, Err(CredentialError::Configuration(_))));
    }

    #[test]
    fn test_missing_fields_are_a_configuration_error() {
        let result = ServiceAccountAuth::from_json("{\"client_email\": \"svc@example.com\"}");
        assert!(matches!(result, Err(CredentialError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_check_connection_flags_unusable_private_key() {
        let auth = ServiceAccountAuth::from_json(
            "{\"client_email\": \"svc@example.com\", \
              \"private_key\": \"not a pem\", \
              \"token_uri\": \"https://oauth2.googleapis.com/token\"}",
        )
        .unwrap();

        let status = auth.check_connection().await;
        assert!(!status.connected);
        assert!(status.error.is_some());
    }
}
