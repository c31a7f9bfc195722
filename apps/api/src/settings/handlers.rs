use axum::{extract::State, Json};

use crate::activity::LogSink;
use crate::errors::AppError;
use crate::settings::{SettingsUpdate, UserSettings};
use crate::state::AppState;

/// GET /api/v1/settings
pub async fn handle_get_settings(State(state): State<AppState>) -> Json<UserSettings> {
    Json(state.settings.get().await)
}

/// PUT /api/v1/settings
pub async fn handle_update_settings(
    State(state): State<AppState>,
    Json(req): Json<SettingsUpdate>,
) -> Result<Json<UserSettings>, AppError> {
    let provider_changed = req.provider.is_some();
    let settings = state
        .settings
        .update(req)
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?;

    if provider_changed {
        state.activity.info(format!(
            "Provider set to {}",
            settings.provider.as_deref().unwrap_or("default")
        ));
    }
    Ok(Json(settings))
}
