//! User preferences kept between requests: the chosen provider and the
//! resume text used as suggestion context.

pub mod handlers;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::llm_client::{Provider, ProviderError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    /// Upper-cased provider name, e.g. `"OPENAI"`.
    pub provider: Option<String>,
    pub resume_context: Option<String>,
}

/// Partial update. Absent keys keep their value, blank strings clear it.
#[derive(Debug, Default, Deserialize)]
pub struct SettingsUpdate {
    pub provider: Option<String>,
    pub resume_context: Option<String>,
}

#[derive(Default)]
pub struct SettingsStore {
    settings: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> UserSettings {
        self.settings.read().await.clone()
    }

    /// Applies `update` and returns the resulting settings. An unknown provider
    /// name rejects the whole update.
    pub async fn update(&self, update: SettingsUpdate) -> Result<UserSettings, ProviderError> {
        let provider = match update.provider.as_deref().map(str::trim) {
            Some("") => Some(None),
            Some(name) => Some(Some(name.parse::<Provider>()?.as_str().to_string())),
            None => None,
        };

        let mut settings = self.settings.write().await;
        if let Some(provider) = provider {
            settings.provider = provider;
        }
        if let Some(resume) = update.resume_context {
            settings.resume_context = if resume.trim().is_empty() {
                None
            } else {
                Some(resume)
            };
        }
        Ok(settings.clone())
    }

    pub async fn provider(&self) -> Option<String> {
        self.settings.read().await.provider.clone()
    }

    pub async fn resume_context(&self) -> Option<String> {
        self.settings.read().await.resume_context.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_update_normalizes_provider_and_keeps_absent_keys() {
        let store = SettingsStore::new();
        store
            .update(SettingsUpdate {
                provider: Some(" openai ".to_string()),
                resume_context: Some("Jane Doe, Oslo".to_string()),
            })
            .await
            .unwrap();

        let settings = store
            .update(SettingsUpdate {
                provider: Some("gemini".to_string()),
                resume_context: None,
            })
            .await
            .unwrap();

        assert_eq!(settings.provider.as_deref(), Some("GEMINI"));
        assert_eq!(settings.resume_context.as_deref(), Some("Jane Doe, Oslo"));
    }

    #[tokio::test]
    async fn test_blank_values_clear() {
        let store = SettingsStore::new();
        store
            .update(SettingsUpdate {
                provider: Some("ollama".to_string()),
                resume_context: Some("resume".to_string()),
            })
            .await
            .unwrap();

        let settings = store
            .update(SettingsUpdate {
                provider: Some(String::new()),
                resume_context: Some("  ".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(settings, UserSettings::default());
    }

    #[tokio::test]
    async fn test_unknown_provider_leaves_settings_untouched() {
        let store = SettingsStore::new();
        let err = store
            .update(SettingsUpdate {
                provider: Some("FOO".to_string()),
                resume_context: Some("ignored".to_string()),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::UnknownProvider(_)));
        assert_eq!(store.get().await, UserSettings::default());
    }
}
