use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::{ProviderEndpoint, ProviderSettings};

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed numbers fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Provider used when a request does not name one.
    pub default_provider: String,
    pub providers: ProviderSettings,
    pub llm_timeout: Duration,
    /// Where provider keys are persisted; `None` keeps them in memory only.
    pub token_store_path: Option<PathBuf>,
    /// Optional resume text used when a request carries no context.
    pub resume_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
            default_provider: env_or("AI_PROVIDER", "GEMINI"),
            providers: ProviderSettings {
                ollama: ProviderEndpoint {
                    api_url: env_or("OLLAMA_API_URL", "http://localhost:11434/api/generate"),
                    model: env_or("OLLAMA_MODEL", "gemma3:1b"),
                },
                openai: ProviderEndpoint {
                    api_url: env_or(
                        "OPENAI_API_URL",
                        "https://api.openai.com/v1/chat/completions",
                    ),
                    model: env_or("OPENAI_MODEL", "gpt-3.5-turbo"),
                },
                gemini: ProviderEndpoint {
                    api_url: env_or(
                        "GEMINI_API_URL",
                        "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent",
                    ),
                    model: env_or("GEMINI_MODEL", "gemini-2.0-flash"),
                },
            },
            llm_timeout: Duration::from_secs(
                env_or("LLM_TIMEOUT_SECS", "120")
                    .parse::<u64>()
                    .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            token_store_path: non_empty_path(env_or("TOKEN_STORE_PATH", "provider_tokens.json")),
            resume_path: std::env::var("RESUME_PATH").ok().and_then(non_empty_path),
        })
    }
}

fn non_empty_path(value: String) -> Option<PathBuf> {
    if value.trim().is_empty() {
        None
    } else {
        Some(PathBuf::from(value))
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
