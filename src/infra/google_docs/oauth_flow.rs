// Interactive OAuth credential strategy, used when no service account key is
// configured. The classic installed-app flow: a token persisted between runs,
// refreshed silently when possible, re-acquired through a one-shot local
// consent redirect otherwise.
//
// The token file is a single-writer resource. Two processes refreshing at the
// same time will race and the last write wins; this is a documented
// limitation, not something coordinated here.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use super::{ConnectionStatus, CredentialError, TokenProvider, DOCS_SCOPE};

/// OAuth client configuration, the `installed` section of `credentials.json`.
#[derive(Debug, Clone, Deserialize)]
struct ClientSecrets {
    installed: InstalledClient,
}

#[derive(Debug, Clone, Deserialize)]
struct InstalledClient {
    client_id: String,
    client_secret: String,
    auth_uri: String,
    token_uri: String,
}

/// Token persisted to `token.json` between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expiry: DateTime<Utc>,
}

impl StoredToken {
    /// A token is usable if it has at least a minute of validity left.
    pub fn is_valid(&self) -> bool {
        self.expiry > Utc::now() + Duration::seconds(60)
    }
}

/// Response from the token endpoint for both refresh and code exchange.
#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl OAuthTokenResponse {
    /// A refresh response usually omits the refresh token; carry the old one
    /// forward so the next refresh still works.
    fn into_stored(self, previous_refresh: Option<String>) -> StoredToken {
        StoredToken {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh),
            expiry: Utc::now() + Duration::seconds(self.expires_in.unwrap_or(3600)),
        }
    }
}

pub struct InteractiveAuth {
    secrets: InstalledClient,
    token_path: PathBuf,
    client: Client,
}

impl InteractiveAuth {
    pub async fn from_files(client_file: &str, token_file: &str) -> Result<Self, CredentialError> {
        let content = tokio::fs::read_to_string(client_file).await.map_err(|e| {
            CredentialError::Configuration(format!(
                "cannot read OAuth client config {}: {}",
                client_file, e
            ))
        })?;
        let secrets: ClientSecrets = serde_json::from_str(&content).map_err(|e| {
            CredentialError::Configuration(format!(
                "malformed OAuth client config {}: {}",
                client_file, e
            ))
        })?;

        Ok(Self {
            secrets: secrets.installed,
            token_path: PathBuf::from(token_file),
            client: Client::new(),
        })
    }

    async fn load_token(&self) -> Option<StoredToken> {
        let content = tokio::fs::read_to_string(&self.token_path).await.ok()?;
        serde_json::from_str(&content).ok()
    }

    async fn persist_token(&self, token: &StoredToken) -> Result<(), CredentialError> {
        let json = serde_json::to_string_pretty(token)
            .map_err(|e| CredentialError::Exchange(e.to_string()))?;
        tokio::fs::write(&self.token_path, json).await.map_err(|e| {
            CredentialError::Exchange(format!(
                "cannot persist token to {}: {}",
                self.token_path.display(),
                e
            ))
        })
    }

    /// Acquire-or-refresh: load the persisted token, refresh it silently if
    /// expired, fall back to the interactive consent flow. Every success path
    /// leaves a valid token on disk.
    async fn authorize(&self) -> Result<StoredToken, CredentialError> {
        if let Some(token) = self.load_token().await {
            if token.is_valid() {
                return Ok(token);
            }

            if let Some(refresh_token) = token.refresh_token.clone() {
                match self.refresh(&refresh_token).await {
                    Ok(refreshed) => {
                        self.persist_token(&refreshed).await?;
                        return Ok(refreshed);
                    }
                    Err(e) => {
                        tracing::warn!(
                            "Silent token refresh failed, falling back to consent flow: {}",
                            e
                        );
                    }
                }
            }
        }

        let token = self.run_consent_flow().await?;
        self.persist_token(&token).await?;
        Ok(token)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<StoredToken, CredentialError> {
        let response = self
            .client
            .post(&self.secrets.token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", self.secrets.client_id.as_str()),
                ("client_secret", self.secrets.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| CredentialError::Exchange(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(CredentialError::Exchange(format!(
                "refresh failed ({}): {}",
                status, text
            )));
        }

        let token: OAuthTokenResponse = response
            .json()
            .await
            .map_err(|e| CredentialError::Exchange(e.to_string()))?;
        Ok(token.into_stored(Some(refresh_token.to_string())))
    }

    /// One-shot consent flow: listen on a loopback port, log the consent URL
    /// for the user to open, wait for the redirect, exchange the
    /// authorization code.
    async fn run_consent_flow(&self) -> Result<StoredToken, CredentialError> {
        let listener = TcpListener::bind("127.0.0.1:0").await.map_err(|e| {
            CredentialError::Exchange(format!("cannot bind redirect listener: {}", e))
        })?;
        let port = listener
            .local_addr()
            .map_err(|e| CredentialError::Exchange(e.to_string()))?
            .port();
        let redirect_uri = format!("http://127.0.0.1:{}", port);

        // Anti-forgery token echoed back on the redirect.
        let state: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();

        let auth_url = format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}&access_type=offline&prompt=consent",
            self.secrets.auth_uri,
            urlencoding::encode(&self.secrets.client_id),
            urlencoding::encode(&redirect_uri),
            urlencoding::encode(DOCS_SCOPE),
            state,
        );
        tracing::info!("Authorize this app by visiting:\n{}", auth_url);

        let (mut stream, _) = listener
            .accept()
            .await
            .map_err(|e| CredentialError::Exchange(format!("redirect listener failed: {}", e)))?;

        let mut buf = vec![0u8; 4096];
        let n = stream
            .read(&mut buf)
            .await
            .map_err(|e| CredentialError::Exchange(e.to_string()))?;
        let request = String::from_utf8_lossy(&buf[..n]).to_string();

        let code = redirect_param(&request, "code").ok_or_else(|| {
            CredentialError::Exchange(
                "consent redirect did not include an authorization code".to_string(),
            )
        })?;
        let state_matches = redirect_param(&request, "state").as_deref() == Some(state.as_str());

        let body = if state_matches {
            "<html><body>Authorization complete. You can close this tab.</body></html>"
        } else {
            "<html><body>Authorization failed: state mismatch.</body></html>"
        };
        let reply = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        let _ = stream.write_all(reply.as_bytes()).await;

        if !state_matches {
            return Err(CredentialError::Exchange(
                "OAuth state mismatch on consent redirect".to_string(),
            ));
        }

        let response = self
            .client
            .post(&self.secrets.token_uri)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code.as_str()),
                ("client_id", self.secrets.client_id.as_str()),
                ("client_secret", self.secrets.client_secret.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| CredentialError::Exchange(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(CredentialError::Exchange(format!(
                "code exchange failed ({}): {}",
                status, text
            )));
        }

        let token: OAuthTokenResponse = response
            .json()
            .await
            .map_err(|e| CredentialError::Exchange(e.to_string()))?;
        Ok(token.into_stored(None))
    }
}

/// Extracts one query parameter from the raw redirect request
/// (`GET /?code=...&state=... HTTP/1.1`).
fn redirect_param(request: &str, key: &str) -> Option<String> {
    let line = request.lines().next()?;
    let path = line.split_whitespace().nth(1)?;
    let query = path.split_once('?')?.1;

    for pair in query.split('&') {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        if k == key {
            return urlencoding::decode(v).ok().map(|s| s.into_owned());
        }
    }
    None
}

#[async_trait]
impl TokenProvider for InteractiveAuth {
    async fn access_token(&self) -> Result<String, CredentialError> {
        Ok(self.authorize().await?.access_token)
    }

    /// Reports on the persisted token only. Never refreshes, never starts
    /// the consent flow.
    async fn check_connection(&self) -> ConnectionStatus {
        match self.load_token().await {
            Some(token) if token.is_valid() => ConnectionStatus::ok(),
            Some(_) => ConnectionStatus::failed("stored token is expired"),
            None => ConnectionStatus::failed("no stored token; authorization required"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const CLIENT_CONFIG: &str = r#"{
        "installed": {
            "client_id": "client-id",
            "client_secret": "client-secret",
            "auth_uri": "https://accounts.google.com/o/oauth2/auth",
            "token_uri": "https://oauth2.googleapis.com/token"
        }
    }"#;

    async fn auth_with_token(token: Option<&StoredToken>) -> (tempfile::TempDir, InteractiveAuth) {
        let dir = tempdir().unwrap();
        let client_file = dir.path().join("credentials.json");
        let token_file = dir.path().join("token.json");
        std::fs::write(&client_file, CLIENT_CONFIG).unwrap();
        if let Some(token) = token {
            std::fs::write(&token_file, serde_json::to_string(token).unwrap()).unwrap();
        }

        let auth = InteractiveAuth::from_files(
            client_file.to_str().unwrap(),
            token_file.to_str().unwrap(),
        )
        .await
        .unwrap();
        (dir, auth)
    }

    #[test]
    fn test_redirect_param_extracts_and_decodes() {
        let request = "GET /?state=abc123&code=4%2F0AdQt8qexample HTTP/1.1\r\nHost: x\r\n\r\n";

        assert_eq!(
            redirect_param(request, "code").as_deref(),
            Some("4/0AdQt8qexample")
        );
        assert_eq!(redirect_param(request, "state").as_deref(), Some("abc123"));
        assert_eq!(redirect_param(request, "missing"), None);
    }

    #[test]
    fn test_token_validity_window() {
        let valid = StoredToken {
            access_token: "t".to_string(),
            refresh_token: None,
            expiry: Utc::now() + Duration::hours(1),
        };
        let nearly_expired = StoredToken {
            expiry: Utc::now() + Duration::seconds(30),
            ..valid.clone()
        };

        assert!(valid.is_valid());
        assert!(!nearly_expired.is_valid());
    }

    #[tokio::test]
    async fn test_check_connection_with_valid_token() {
        let token = StoredToken {
            access_token: "t".to_string(),
            refresh_token: Some("r".to_string()),
            expiry: Utc::now() + Duration::hours(1),
        };
        let (_dir, auth) = auth_with_token(Some(&token)).await;

        let status = auth.check_connection().await;
        assert!(status.connected);
        assert!(status.error.is_none());
    }

    #[tokio::test]
    async fn test_check_connection_with_expired_token() {
        let token = StoredToken {
            access_token: "t".to_string(),
            refresh_token: Some("r".to_string()),
            expiry: Utc::now() - Duration::hours(1),
        };
        let (_dir, auth) = auth_with_token(Some(&token)).await;

        let status = auth.check_connection().await;
        assert!(!status.connected);
    }

    #[tokio::test]
    async fn test_check_connection_without_token() {
        let (_dir, auth) = auth_with_token(None).await;

        let status = auth.check_connection().await;
        assert!(!status.connected);
        assert!(status.error.unwrap().contains("no stored token"));
    }

    #[tokio::test]
    async fn test_missing_client_config_is_a_configuration_error() {
        let result = InteractiveAuth::from_files("/nonexistent/credentials.json", "t.json").await;
        assert!(matches!(result, Err(CredentialError::Configuration(_))));
    }
}
