//! Local Ollama `/api/generate` backend.

use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;

use super::ProviderEndpoint;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    #[serde(skip_serializing_if = "str::is_empty")]
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'a str,
}

pub fn build_request(client: &Client, endpoint: &ProviderEndpoint, prompt: &str) -> RequestBuilder {
    client.post(&endpoint.api_url).json(&GenerateRequest {
        model: &endpoint.model,
        prompt,
        stream: false,
        format: "json",
    })
}

/// Reads the top-level `response` string.
pub fn extract_text(envelope: &Value) -> String {
    envelope
        .get("response")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_omits_empty_model() {
        let body = serde_json::to_value(GenerateRequest {
            model: "",
            prompt: "p",
            stream: false,
            format: "json",
        })
        .unwrap();
        assert_eq!(body, json!({"prompt": "p", "stream": false, "format": "json"}));
    }

    #[test]
    fn test_extract_text_non_string_response() {
        assert_eq!(extract_text(&json!({"response": 42})), "");
        assert_eq!(extract_text(&json!({"response": "ok"})), "ok");
    }
}
