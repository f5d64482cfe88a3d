// This is the entry point of the company-profiler service.
//
// **Architecture Overview:**
// - `core/` = Business logic (prompt building, pipeline orchestration)
// - `infra/` = Implementations of core traits (OpenAI, Google Docs, auth)
// - `http/` = HTTP adapters (axum handlers, routing)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Build the router and serve

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with a handful of mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "http/http_layer.rs"]
mod http;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::profile::{ProfileConfig, ProfileService};
use crate::core::publish::PublishService;
use crate::http::{build_router, AppState};
use crate::infra::ai::OpenAiClient;
use crate::infra::google_docs::{
    GoogleDocsClient, InteractiveAuth, ServiceAccountAuth, TokenProvider,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // ========================================================================
    // CONFIGURATION
    // ========================================================================
    // Model and token budgets are env-overridable so the same binary can run
    // the lighter profile (e.g. gpt-3.5-turbo with a 500-token budget).

    let mut profile_config = ProfileConfig::default();
    if let Ok(model) = std::env::var("PROFILE_MODEL") {
        profile_config.model = model;
    }
    if let Some(max_tokens) = env_u32("PROFILE_MAX_TOKENS") {
        profile_config.max_tokens = max_tokens;
    }
    if let Some(advanced_max_tokens) = env_u32("PROFILE_ADVANCED_MAX_TOKENS") {
        profile_config.advanced_max_tokens = advanced_max_tokens;
    }

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    // Credential strategy: service account when a key is configured,
    // interactive OAuth with local token persistence otherwise.
    let google_auth: Arc<dyn TokenProvider> = if std::env::var("GOOGLE_CREDENTIALS").is_ok()
        || std::env::var("GOOGLE_SERVICE_ACCOUNT_KEY").is_ok()
    {
        tracing::info!("Using service account credentials for Google Docs");
        Arc::new(ServiceAccountAuth::from_env().await?)
    } else {
        let client_file = std::env::var("GOOGLE_OAUTH_CLIENT_FILE")
            .unwrap_or_else(|_| "credentials.json".to_string());
        let token_file =
            std::env::var("GOOGLE_TOKEN_FILE").unwrap_or_else(|_| "token.json".to_string());
        tracing::info!(
            "Using interactive OAuth for Google Docs (client config: {}, token: {})",
            client_file,
            token_file
        );
        Arc::new(InteractiveAuth::from_files(&client_file, &token_file).await?)
    };

    let profiles = Arc::new(ProfileService::new(OpenAiClient::new(), profile_config));
    let publisher = Arc::new(PublishService::new(GoogleDocsClient::new(Arc::clone(
        &google_auth,
    ))));

    let state = AppState {
        profiles,
        publisher,
        google_auth,
    };
    let app = build_router(state);

    // ========================================================================
    // SERVER
    // ========================================================================

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:5000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("company-profiler listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

fn env_u32(name: &str) -> Option<u32> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
