/// LLM Client: the only place that talks to model providers.
///
/// Three fixed backends, one request per call, no retries. Each backend module
/// owns its request body and response envelope; this module owns credential
/// lookup, transport/HTTP error handling and dispatch.
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use thiserror::Error;

use crate::activity::LogSink;
use crate::models::field::FieldDescriptor;
use crate::suggestion::prompts::build_prompt;
use crate::tokens::{SecretStore, TokenStoreError};

pub mod gemini;
pub mod ollama;
pub mod openai;
pub mod prompts;

/// Substituted when an error response body cannot be read.
const UNREADABLE_BODY: &str = "<unable to read body>";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} API key missing. Set it in the extension popup.")]
    MissingCredential { provider: Provider },

    #[error("{hint}")]
    Transport {
        hint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} API Error: {status} {status_text}")]
    Api {
        provider: Provider,
        status: u16,
        status_text: String,
    },

    #[error("Unknown provider selected: {0}")]
    UnknownProvider(String),

    #[error("Could not read stored API key: {0}")]
    CredentialStore(#[from] TokenStoreError),

    #[error("{provider} returned an undecodable response: {source}")]
    Decode {
        provider: Provider,
        #[source]
        source: reqwest::Error,
    },
}

/// The closed set of supported backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    /// Local generate-style endpoint.
    Ollama,
    /// Chat-completions endpoint.
    OpenAi,
    /// Single-prompt generateContent endpoint.
    Gemini,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Ollama, Provider::OpenAi, Provider::Gemini];

    /// Upper-case identifier used in configuration and the token store.
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Ollama => "OLLAMA",
            Provider::OpenAi => "OPENAI",
            Provider::Gemini => "GEMINI",
        }
    }

    pub fn requires_credential(self) -> bool {
        match self {
            Provider::Ollama => false,
            Provider::OpenAi | Provider::Gemini => true,
        }
    }

    fn transport_hint(self) -> &'static str {
        match self {
            Provider::Ollama => "Failed to connect to Ollama. Is it running? (Run 'ollama serve')",
            Provider::OpenAi => "Failed to connect to OpenAI. Check your network connection.",
            Provider::Gemini => "Failed to connect to Gemini. Check your network connection.",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Provider::Ollama => "Ollama",
            Provider::OpenAi => "OpenAI",
            Provider::Gemini => "Gemini",
        })
    }
}

impl FromStr for Provider {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "OLLAMA" => Ok(Provider::Ollama),
            "OPENAI" => Ok(Provider::OpenAi),
            "GEMINI" => Ok(Provider::Gemini),
            other => Err(ProviderError::UnknownProvider(other.to_string())),
        }
    }
}

/// Endpoint URL and model for one backend.
#[derive(Debug, Clone)]
pub struct ProviderEndpoint {
    pub api_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub ollama: ProviderEndpoint,
    pub openai: ProviderEndpoint,
    pub gemini: ProviderEndpoint,
}

impl ProviderSettings {
    pub fn endpoint(&self, provider: Provider) -> &ProviderEndpoint {
        match provider {
            Provider::Ollama => &self.ollama,
            Provider::OpenAi => &self.openai,
            Provider::Gemini => &self.gemini,
        }
    }
}

/// Shared HTTP client for all providers.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    settings: ProviderSettings,
}

impl LlmClient {
    pub fn new(settings: ProviderSettings, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            settings,
        })
    }

    /// Sends the batch prompt for `fields` to `provider` and returns the text
    /// the model produced, unwrapped from the provider's envelope.
    pub async fn ask(
        &self,
        provider: Provider,
        fields: &[FieldDescriptor],
        context: &str,
        tokens: &dyn SecretStore,
        log: &dyn LogSink,
    ) -> Result<String, ProviderError> {
        let prompt = build_prompt(fields, context);

        let api_key = if provider.requires_credential() {
            Some(credential(provider, tokens).await?)
        } else {
            None
        };
        let api_key = api_key.as_deref().unwrap_or_default();

        let endpoint = self.settings.endpoint(provider);
        log.debug(format!(
            "Sending prompt to {provider} ({}):\n{prompt}",
            endpoint.model
        ));

        let request = match provider {
            Provider::Ollama => ollama::build_request(&self.client, endpoint, &prompt),
            Provider::OpenAi => openai::build_request(&self.client, endpoint, &prompt, api_key),
            Provider::Gemini => gemini::build_request(&self.client, endpoint, &prompt, api_key),
        };

        let envelope = send(provider, request, log).await?;

        let text = match provider {
            Provider::Ollama => ollama::extract_text(&envelope),
            Provider::OpenAi => openai::extract_text(&envelope),
            Provider::Gemini => gemini::extract_text(&envelope),
        };
        log.debug(format!("Raw AI Response: {text}"));

        Ok(text)
    }
}

/// Looks up the provider's key; absent keys fail before any request is built.
async fn credential(provider: Provider, tokens: &dyn SecretStore) -> Result<String, ProviderError> {
    match tokens.get_token(provider.as_str()).await? {
        Some(key) if !key.is_empty() => Ok(key),
        _ => Err(ProviderError::MissingCredential { provider }),
    }
}

/// Issues the request and decodes the JSON envelope of a 2xx response.
async fn send(
    provider: Provider,
    request: RequestBuilder,
    log: &dyn LogSink,
) -> Result<Value, ProviderError> {
    let response = match request.send().await {
        Ok(r) => r,
        Err(e) => {
            log.error(format!("Network Error ({provider}): {e}"));
            return Err(ProviderError::Transport {
                hint: provider.transport_hint(),
                source: e,
            });
        }
    };

    let status = response.status();
    if !status.is_success() {
        let status_text = status.canonical_reason().unwrap_or_default().to_string();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| UNREADABLE_BODY.to_string());
        log.error(format!(
            "{provider} API Error ({} {status_text}): {body}",
            status.as_u16()
        ));
        return Err(ProviderError::Api {
            provider,
            status: status.as_u16(),
            status_text,
        });
    }

    response
        .json::<Value>()
        .await
        .map_err(|source| ProviderError::Decode { provider, source })
}

#[cfg(test)]
pub(crate) fn test_settings(base_url: &str) -> ProviderSettings {
    ProviderSettings {
        ollama: ProviderEndpoint {
            api_url: format!("{base_url}/api/generate"),
            model: "gemma3:1b".to_string(),
        },
        openai: ProviderEndpoint {
            api_url: format!("{base_url}/v1/chat/completions"),
            model: "gpt-3.5-turbo".to_string(),
        },
        gemini: ProviderEndpoint {
            api_url: format!("{base_url}/v1beta/models/gemini-2.0-flash:generateContent"),
            model: "gemini-2.0-flash".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{CapturingSink, LogLevel};
    use crate::tokens::MemoryTokenStore;
    use serde_json::json;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    fn fields() -> Vec<FieldDescriptor> {
        vec![FieldDescriptor {
            id: "email".to_string(),
            label: "Email".to_string(),
            field_type: "email".to_string(),
            ..Default::default()
        }]
    }

    fn client(server: &MockServer) -> LlmClient {
        LlmClient::new(test_settings(&server.uri()), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_provider_from_str_is_case_insensitive() {
        assert_eq!("ollama".parse::<Provider>().unwrap(), Provider::Ollama);
        assert_eq!("OpenAI".parse::<Provider>().unwrap(), Provider::OpenAi);
        assert_eq!(" gemini ".parse::<Provider>().unwrap(), Provider::Gemini);
    }

    #[test]
    fn test_provider_from_str_unknown() {
        match "foo".parse::<Provider>() {
            Err(ProviderError::UnknownProvider(name)) => assert_eq!(name, "FOO"),
            other => panic!("expected UnknownProvider, got {other:?}"),
        }
    }

    #[test]
    fn test_only_cloud_providers_need_credentials() {
        assert!(!Provider::Ollama.requires_credential());
        assert!(Provider::OpenAi.requires_credential());
        assert!(Provider::Gemini.requires_credential());
    }

    #[tokio::test]
    async fn test_ollama_returns_response_field() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/api/generate"))
            .and(matchers::body_partial_json(json!({
                "model": "gemma3:1b",
                "stream": false,
                "format": "json"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "response": "{\"fields\": []}"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let sink = CapturingSink::default();
        let text = client(&server)
            .ask(Provider::Ollama, &fields(), "", &MemoryTokenStore::new(), &sink)
            .await
            .unwrap();
        assert_eq!(text, "{\"fields\": []}");
    }

    #[tokio::test]
    async fn test_openai_sends_bearer_and_reads_choice() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/v1/chat/completions"))
            .and(matchers::header("authorization", "Bearer sk-test"))
            .and(matchers::body_partial_json(json!({
                "model": "gpt-3.5-turbo",
                "temperature": 0.1
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "hello"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tokens = MemoryTokenStore::new();
        tokens.set_token("openai", "sk-test").await.unwrap();

        let text = client(&server)
            .ask(Provider::OpenAi, &fields(), "ctx", &tokens, &CapturingSink::default())
            .await
            .unwrap();
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn test_gemini_passes_key_as_query_param() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::query_param("key", "g-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "gemini says"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tokens = MemoryTokenStore::new();
        tokens.set_token("GEMINI", "g-key").await.unwrap();

        let text = client(&server)
            .ask(Provider::Gemini, &fields(), "ctx", &tokens, &CapturingSink::default())
            .await
            .unwrap();
        assert_eq!(text, "gemini says");
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_request() {
        let server = MockServer::start().await;
        Mock::given(matchers::any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let result = client(&server)
            .ask(
                Provider::OpenAi,
                &fields(),
                "ctx",
                &MemoryTokenStore::new(),
                &CapturingSink::default(),
            )
            .await;
        assert!(matches!(
            result,
            Err(ProviderError::MissingCredential {
                provider: Provider::OpenAi
            })
        ));
    }

    #[tokio::test]
    async fn test_non_success_status_is_api_error_and_body_is_logged() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model exploded"))
            .expect(1)
            .mount(&server)
            .await;

        let sink = CapturingSink::default();
        let err = client(&server)
            .ask(Provider::Ollama, &fields(), "", &MemoryTokenStore::new(), &sink)
            .await
            .unwrap_err();

        match &err {
            ProviderError::Api {
                provider,
                status,
                status_text,
            } => {
                assert_eq!(*provider, Provider::Ollama);
                assert_eq!(*status, 500);
                assert_eq!(status_text, "Internal Server Error");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        assert!(!err.to_string().contains("model exploded"));
        assert!(sink.contains(LogLevel::Error, "model exploded"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error_with_hint() {
        // Nothing listens on port 9 (discard) in the test environment.
        let llm = LlmClient::new(test_settings("http://127.0.0.1:9"), Duration::from_secs(5))
            .unwrap();
        let err = llm
            .ask(
                Provider::Ollama,
                &fields(),
                "",
                &MemoryTokenStore::new(),
                &CapturingSink::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Transport { .. }));
        assert!(err.to_string().contains("ollama serve"));
    }

    #[tokio::test]
    async fn test_missing_envelope_path_yields_empty_text() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let tokens = MemoryTokenStore::new();
        tokens.set_token("GEMINI", "g-key").await.unwrap();

        let text = client(&server)
            .ask(Provider::Gemini, &fields(), "", &tokens, &CapturingSink::default())
            .await
            .unwrap();
        assert_eq!(text, "");
    }
}
