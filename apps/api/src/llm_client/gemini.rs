//! Google Gemini `generateContent` backend. The key travels as a query parameter.

use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;

use super::ProviderEndpoint;

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

pub fn build_request(
    client: &Client,
    endpoint: &ProviderEndpoint,
    prompt: &str,
    api_key: &str,
) -> RequestBuilder {
    client
        .post(&endpoint.api_url)
        .query(&[("key", api_key)])
        .json(&GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        })
}

/// Reads `candidates[0].content.parts[0].text`, empty when any step is missing.
pub fn extract_text(envelope: &Value) -> String {
    envelope
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
