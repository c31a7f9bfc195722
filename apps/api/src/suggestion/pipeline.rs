//! Suggestion pipeline: provider selection, the model call, extraction and
//! normalization behind a single call that never fails.
//!
//! Every error is logged and becomes an empty map. An empty result therefore
//! means either "nothing to suggest" or "the call failed"; the log stream is
//! the only place the two can be told apart.

use std::sync::Arc;

use uuid::Uuid;

use crate::activity::LogSink;
use crate::llm_client::{LlmClient, Provider, ProviderError};
use crate::models::field::{FieldDescriptor, SuggestionMap};
use crate::suggestion::extract::parse_suggestions;
use crate::suggestion::normalize::normalize_suggestions;
use crate::tokens::SecretStore;

/// Used when neither the caller nor configuration names a provider.
pub const FALLBACK_PROVIDER: &str = "OLLAMA";

#[derive(Clone)]
pub struct SuggestionEngine {
    llm: LlmClient,
    tokens: Arc<dyn SecretStore>,
    log: Arc<dyn LogSink>,
    default_provider: Option<String>,
}

impl SuggestionEngine {
    pub fn new(
        llm: LlmClient,
        tokens: Arc<dyn SecretStore>,
        log: Arc<dyn LogSink>,
        default_provider: Option<String>,
    ) -> Self {
        Self {
            llm,
            tokens,
            log,
            default_provider,
        }
    }

    pub fn log(&self) -> &dyn LogSink {
        self.log.as_ref()
    }

    /// Override, else configured default, else [`FALLBACK_PROVIDER`]; upper-cased.
    pub fn resolve_provider_name(&self, provider_override: Option<&str>) -> String {
        [provider_override, self.default_provider.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|name| !name.is_empty())
            .unwrap_or(FALLBACK_PROVIDER)
            .to_uppercase()
    }

    /// Asks the selected provider for values for `fields`.
    pub async fn get_suggested_values(
        &self,
        fields: &[FieldDescriptor],
        context: &str,
        provider_override: Option<&str>,
    ) -> SuggestionMap {
        if fields.is_empty() {
            self.log
                .warn("Suggestion request contained no fields.".to_string());
            return SuggestionMap::new();
        }

        let run_id = Uuid::new_v4();
        let provider_name = self.resolve_provider_name(provider_override);
        self.log.info(format!(
            "[{run_id}] Asking AI ({provider_name}) for {} fields...",
            fields.len()
        ));

        match self.run(&provider_name, fields, context).await {
            Ok(suggestions) => {
                self.log.info(format!(
                    "[{run_id}] {provider_name} suggested values for {} of {} fields",
                    suggestions.len(),
                    fields.len()
                ));
                suggestions
            }
            Err(e) => {
                self.log
                    .error(format!("[{run_id}] Error in AI pipeline: {e:?}: {e}"));
                SuggestionMap::new()
            }
        }
    }

    async fn run(
        &self,
        provider_name: &str,
        fields: &[FieldDescriptor],
        context: &str,
    ) -> Result<SuggestionMap, ProviderError> {
        let provider: Provider = provider_name.parse()?;
        let raw = self
            .llm
            .ask(provider, fields, context, self.tokens.as_ref(), self.log.as_ref())
            .await?;
        let entries = parse_suggestions(&raw, self.log.as_ref());
        Ok(normalize_suggestions(&entries, fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::activity::{CapturingSink, LogLevel};
    use crate::llm_client::test_settings;
    use crate::tokens::MemoryTokenStore;
    use serde_json::json;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    fn field(id: &str) -> FieldDescriptor {
        FieldDescriptor {
            id: id.to_string(),
            label: id.to_uppercase(),
            ..Default::default()
        }
    }

    fn engine(
        base_url: &str,
        tokens: Arc<MemoryTokenStore>,
        sink: Arc<CapturingSink>,
        default_provider: Option<&str>,
    ) -> SuggestionEngine {
        let llm = LlmClient::new(test_settings(base_url), Duration::from_secs(5)).unwrap();
        SuggestionEngine::new(llm, tokens, sink, default_provider.map(str::to_string))
    }

    async fn mount_never_called(server: &MockServer) {
        Mock::given(matchers::any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(server)
            .await;
    }

    #[test]
    fn test_resolve_provider_precedence() {
        let sink = Arc::new(CapturingSink::default());
        let tokens = Arc::new(MemoryTokenStore::new());
        let configured = engine("http://unused", tokens.clone(), sink.clone(), Some("gemini"));
        assert_eq!(configured.resolve_provider_name(Some("openai")), "OPENAI");
        assert_eq!(configured.resolve_provider_name(None), "GEMINI");
        assert_eq!(configured.resolve_provider_name(Some("  ")), "GEMINI");

        let bare = engine("http://unused", tokens, sink, None);
        assert_eq!(bare.resolve_provider_name(None), "OLLAMA");
    }

    #[tokio::test]
    async fn test_no_fields_returns_empty_without_request() {
        let server = MockServer::start().await;
        mount_never_called(&server).await;

        let sink = Arc::new(CapturingSink::default());
        let engine = engine(&server.uri(), Arc::new(MemoryTokenStore::new()), sink.clone(), None);

        let result = engine.get_suggested_values(&[], "ctx", None).await;
        assert!(result.is_empty());
        assert!(sink.contains(LogLevel::Warn, "no fields"));
    }

    #[tokio::test]
    async fn test_end_to_end_ollama() {
        let server = MockServer::start().await;
        let model_text = r#"Sure! {"fields": [{"id": "email", "value": "jane@example.com"}, {"value": "Jane"}]}"#;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": model_text })))
            .expect(1)
            .mount(&server)
            .await;

        let engine = engine(
            &server.uri(),
            Arc::new(MemoryTokenStore::new()),
            Arc::new(CapturingSink::default()),
            None,
        );
        let fields = vec![field("email"), field("first_name")];
        let result = engine.get_suggested_values(&fields, "Jane", Some("ollama")).await;

        assert_eq!(result.len(), 2);
        assert_eq!(result["email"], "jane@example.com");
        assert_eq!(result["first_name"], "Jane");
    }

    #[tokio::test]
    async fn test_server_error_resolves_to_empty_for_every_provider() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(3)
            .mount(&server)
            .await;

        let tokens = Arc::new(MemoryTokenStore::new());
        tokens.set_token("OPENAI", "sk").await.unwrap();
        tokens.set_token("GEMINI", "g").await.unwrap();
        let sink = Arc::new(CapturingSink::default());
        let engine = engine(&server.uri(), tokens, sink.clone(), None);

        for provider in Provider::ALL {
            let result = engine
                .get_suggested_values(&[field("a")], "ctx", Some(provider.as_str()))
                .await;
            assert!(result.is_empty(), "{provider} should degrade to empty");
        }
        assert!(sink.contains(LogLevel::Error, "Error in AI pipeline"));
    }

    #[tokio::test]
    async fn test_missing_credential_resolves_to_empty_without_request() {
        let server = MockServer::start().await;
        mount_never_called(&server).await;

        let sink = Arc::new(CapturingSink::default());
        let engine = engine(&server.uri(), Arc::new(MemoryTokenStore::new()), sink.clone(), None);

        let result = engine
            .get_suggested_values(&[field("a")], "ctx", Some("gemini"))
            .await;
        assert!(result.is_empty());
        assert!(sink.contains(LogLevel::Error, "API key missing"));
    }

    #[tokio::test]
    async fn test_unknown_provider_resolves_to_empty_without_request() {
        let server = MockServer::start().await;
        mount_never_called(&server).await;

        let sink = Arc::new(CapturingSink::default());
        let engine = engine(&server.uri(), Arc::new(MemoryTokenStore::new()), sink.clone(), None);

        let result = engine.get_suggested_values(&[field("a")], "ctx", Some("FOO")).await;
        assert!(result.is_empty());
        assert!(sink.contains(LogLevel::Error, "Unknown provider selected: FOO"));
    }

    #[tokio::test]
    async fn test_unparseable_model_output_resolves_to_empty() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "response": "I cannot help." })),
            )
            .mount(&server)
            .await;

        let engine = engine(
            &server.uri(),
            Arc::new(MemoryTokenStore::new()),
            Arc::new(CapturingSink::default()),
            Some("ollama"),
        );
        assert!(engine
            .get_suggested_values(&[field("a")], "", None)
            .await
            .is_empty());
    }
}
