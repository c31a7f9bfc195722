use std::sync::Arc;

use crate::activity::ActivityLog;
use crate::config::Config;
use crate::pages::PageStore;
use crate::settings::SettingsStore;
use crate::suggestion::pipeline::SuggestionEngine;
use crate::tokens::SecretStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub engine: SuggestionEngine,
    pub tokens: Arc<dyn SecretStore>,
    pub pages: Arc<PageStore>,
    pub settings: Arc<SettingsStore>,
    /// Same sink the engine logs to; read back by `GET /api/v1/logs`.
    pub activity: Arc<ActivityLog>,
    pub config: Config,
}
