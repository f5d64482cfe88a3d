use super::profile_models::{DetailSelection, GeneratedProfile, ProfileConfig};
use super::prompt_builder;
use async_trait::async_trait;
use thiserror::Error;

/// Heading that separates the advanced appendix from the base profile text.
pub const ADVANCED_HEADING: &str = "## 🔍 Advanced Instagram Search Results";

/// Errors raised by the completion workflow.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion service rejected the API key: {0}")]
    Authentication(String),
    #[error("completion quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("completion service error: {0}")]
    Upstream(String),
}

/// Parameters for a single completion call. The API key is supplied by the
/// caller per request, never stored by the service.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Sends one prompt to the hosted chat model and returns the generated
    /// text.
    async fn chat_complete(
        &self,
        prompt: &str,
        request: &CompletionRequest,
    ) -> Result<String, CompletionError>;
}

/// Orchestrates profile generation: base pass always, advanced pass only when
/// requested, issued sequentially so output ordering is deterministic.
pub struct ProfileService<P: CompletionProvider> {
    provider: P,
    config: ProfileConfig,
}

impl<P: CompletionProvider> ProfileService<P> {
    pub fn new(provider: P, config: ProfileConfig) -> Self {
        Self { provider, config }
    }

    pub async fn generate(
        &self,
        company_name: &str,
        selection: &DetailSelection,
        api_key: &str,
    ) -> Result<GeneratedProfile, CompletionError> {
        let base_prompt =
            prompt_builder::build_base_prompt(company_name, selection, &self.config.fields);
        let request = CompletionRequest {
            api_key: api_key.to_string(),
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
        };

        let base = self.provider.chat_complete(&base_prompt, &request).await?;
        // The publish step must never see an empty profile.
        if base.trim().is_empty() {
            return Err(CompletionError::Upstream(
                "completion returned no content".to_string(),
            ));
        }

        if !selection.advanced_search {
            return Ok(GeneratedProfile { text: base });
        }

        let advanced_prompt = prompt_builder::build_advanced_prompt(company_name);
        let request = CompletionRequest {
            max_tokens: self.config.advanced_max_tokens,
            ..request
        };
        let advanced = self
            .provider
            .chat_complete(&advanced_prompt, &request)
            .await?;
        tracing::debug!(
            "Advanced search pass for '{}' returned {} chars",
            company_name,
            advanced.len()
        );

        Ok(GeneratedProfile {
            text: format!("{}\n\n{}\n{}", base, ADVANCED_HEADING, advanced),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Provider that records prompts and replays scripted responses.
    struct ScriptedProvider {
        prompts: Mutex<Vec<String>>,
        responses: Mutex<VecDeque<Result<String, CompletionError>>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Result<String, CompletionError>>) -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
                responses: Mutex::new(responses.into()),
            }
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        async fn chat_complete(
            &self,
            prompt: &str,
            _request: &CompletionRequest,
        ) -> Result<String, CompletionError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected extra completion call")
        }
    }

    #[tokio::test]
    async fn test_base_only_generation_makes_one_call() {
        let provider = ScriptedProvider::new(vec![Ok("Acme is a company.".to_string())]);
        let service = ProfileService::new(provider, ProfileConfig::default());

        let profile = service
            .generate("Acme Corp", &DetailSelection::default(), "key")
            .await
            .unwrap();

        assert_eq!(profile.text, "Acme is a company.");
        assert!(!profile.text.contains(ADVANCED_HEADING));
        assert_eq!(service.provider.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_advanced_search_appends_headed_appendix() {
        let provider = ScriptedProvider::new(vec![
            Ok("Base profile.".to_string()),
            Ok("| name | email |".to_string()),
        ]);
        let service = ProfileService::new(provider, ProfileConfig::default());

        let selection = DetailSelection {
            advanced_search: true,
            ..Default::default()
        };
        let profile = service
            .generate("Acme Corp", &selection, "key")
            .await
            .unwrap();

        assert!(profile.text.starts_with("Base profile."));
        assert!(profile.text.contains(ADVANCED_HEADING));
        assert!(profile.text.ends_with("| name | email |"));

        let prompts = service.provider.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("site:instagram.com"));
    }

    #[tokio::test]
    async fn test_empty_completion_is_an_error() {
        let provider = ScriptedProvider::new(vec![Ok("   \n".to_string())]);
        let service = ProfileService::new(provider, ProfileConfig::default());

        let result = service
            .generate("Acme Corp", &DetailSelection::default(), "key")
            .await;

        assert!(matches!(result, Err(CompletionError::Upstream(_))));
    }

    #[tokio::test]
    async fn test_provider_errors_propagate() {
        let provider = ScriptedProvider::new(vec![Err(CompletionError::QuotaExceeded(
            "billing".to_string(),
        ))]);
        let service = ProfileService::new(provider, ProfileConfig::default());

        let result = service
            .generate("Acme Corp", &DetailSelection::default(), "key")
            .await;

        assert!(matches!(result, Err(CompletionError::QuotaExceeded(_))));
    }
}
