//! OpenAI chat-completions backend.

use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;

use super::prompts::JSON_ONLY_SYSTEM;
use super::ProviderEndpoint;

const TEMPERATURE: f32 = 0.1;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

pub fn build_request(
    client: &Client,
    endpoint: &ProviderEndpoint,
    prompt: &str,
    api_key: &str,
) -> RequestBuilder {
    client
        .post(&endpoint.api_url)
        .bearer_auth(api_key)
        .json(&ChatRequest {
            model: &endpoint.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: JSON_ONLY_SYSTEM,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: TEMPERATURE,
        })
}

/// Reads `choices[0].message.content`.
pub fn extract_text(envelope: &Value) -> String {
    envelope
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
