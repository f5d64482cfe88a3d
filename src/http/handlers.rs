use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::core::profile::{CompletionProvider, DetailSelection, ProfileService};
use crate::core::publish::{DocsGateway, PublishService};
use crate::infra::google_docs::{ConnectionStatus, TokenProvider};

/// Shared application state. Services are injected so tests can substitute
/// fakes for the remote collaborators.
pub struct AppState<P: CompletionProvider, D: DocsGateway> {
    pub profiles: Arc<ProfileService<P>>,
    pub publisher: Arc<PublishService<D>>,
    pub google_auth: Arc<dyn TokenProvider>,
}

impl<P: CompletionProvider, D: DocsGateway> Clone for AppState<P, D> {
    fn clone(&self) -> Self {
        Self {
            profiles: Arc::clone(&self.profiles),
            publisher: Arc::clone(&self.publisher),
            google_auth: Arc::clone(&self.google_auth),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub company_name: Option<String>,
    #[serde(default)]
    pub details: DetailSelection,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub message: String,
    pub doc_url: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Error response at the handler boundary: every pipeline failure is
/// converted here, nothing is retried.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.to_string(),
        }
    }

    fn internal(message: String) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// GET / — the input form.
async fn index() -> Html<&'static str> {
    Html(include_str!("index.html"))
}

/// GET /check-google-connection — connectivity probe. Never triggers the
/// interactive consent flow.
async fn check_google_connection<P, D>(
    State(state): State<AppState<P, D>>,
) -> Json<ConnectionStatus>
where
    P: CompletionProvider,
    D: DocsGateway,
{
    Json(state.google_auth.check_connection().await)
}

/// POST /generate — validate, generate the profile, publish it, return the
/// document URL.
async fn generate<P, D>(
    State(state): State<AppState<P, D>>,
    headers: HeaderMap,
    body: Option<Json<GenerateRequest>>,
) -> Result<Json<GenerateResponse>, ApiError>
where
    P: CompletionProvider,
    D: DocsGateway,
{
    // Validation failures are rejected before any remote call.
    let api_key =
        bearer_token(&headers).ok_or_else(|| ApiError::bad_request("API key required"))?;

    let request = body
        .map(|Json(request)| request)
        .ok_or_else(|| ApiError::bad_request("Company name required"))?;
    let company_name = request
        .company_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::bad_request("Company name required"))?
        .to_string();

    let profile = state
        .profiles
        .generate(&company_name, &request.details, &api_key)
        .await
        .map_err(|e| {
            tracing::error!("Profile generation failed for '{}': {}", company_name, e);
            ApiError::internal(format!("Error generating content: {}", e))
        })?;

    let document = state
        .publisher
        .publish(&company_name, &profile.text)
        .await
        .map_err(|e| {
            tracing::error!("Publish failed for '{}': {}", company_name, e);
            ApiError::internal(format!("Error creating document: {}", e))
        })?;

    Ok(Json(GenerateResponse {
        message: "Document created".to_string(),
        doc_url: document.url,
    }))
}

/// Pulls the API key out of `Authorization: Bearer <key>`. A bare key without
/// the scheme prefix is accepted too.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

pub fn build_router<P, D>(state: AppState<P, D>) -> Router
where
    P: CompletionProvider + 'static,
    D: DocsGateway + 'static,
{
    Router::new()
        .route("/", get(index))
        .route(
            "/check-google-connection",
            get(check_google_connection::<P, D>),
        )
        .route("/generate", post(generate::<P, D>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
