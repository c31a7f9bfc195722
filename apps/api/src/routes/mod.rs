pub mod health;

use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use tokio::sync::broadcast::error::RecvError;

use crate::activity::LogEvent;
use crate::pages::handlers as pages;
use crate::settings::handlers as settings;
use crate::state::AppState;
use crate::suggestion::handlers as suggestion;
use crate::tokens::handlers as tokens;

/// How long `GET /api/v1/logs/next` waits before answering 204.
const LOG_POLL_TIMEOUT: Duration = Duration::from_secs(25);

/// GET /api/v1/logs
/// Recent activity, oldest first.
async fn handle_recent_logs(State(state): State<AppState>) -> Json<Vec<LogEvent>> {
    Json(state.activity.recent())
}

/// GET /api/v1/logs/next
/// Long-poll for the next activity event; 204 when none arrives in time.
async fn handle_next_log(State(state): State<AppState>) -> Response {
    let mut rx = state.activity.subscribe();
    loop {
        match tokio::time::timeout(LOG_POLL_TIMEOUT, rx.recv()).await {
            Ok(Ok(event)) => return Json(event).into_response(),
            // Dropped events are fine; the buffer endpoint has history.
            Ok(Err(RecvError::Lagged(_))) => continue,
            Ok(Err(RecvError::Closed)) | Err(_) => return StatusCode::NO_CONTENT.into_response(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Suggestion pipeline
        .route("/api/v1/suggestions", post(suggestion::handle_suggest))
        .route("/api/v1/forms/autofill", post(suggestion::handle_autofill))
        // Provider keys
        .route("/api/v1/tokens", get(tokens::handle_list_tokens))
        .route(
            "/api/v1/tokens/:provider",
            put(tokens::handle_set_token)
                .get(tokens::handle_token_status)
                .delete(tokens::handle_delete_token),
        )
        // Stored preferences
        .route(
            "/api/v1/settings",
            get(settings::handle_get_settings).put(settings::handle_update_settings),
        )
        // Collected page data and templates
        .route(
            "/api/v1/pages",
            get(pages::handle_list_pages)
                .post(pages::handle_save_page)
                .delete(pages::handle_clear_pages),
        )
        .route("/api/v1/pages/export", get(pages::handle_export_pages))
        .route("/api/v1/pages/apply", post(pages::handle_apply_page))
        .route("/api/v1/pages/reset", post(pages::handle_reset_page))
        .route("/api/v1/templates/apply", post(pages::handle_apply_template))
        // Activity log
        .route("/api/v1/logs", get(handle_recent_logs))
        .route("/api/v1/logs/next", get(handle_next_log))
        .with_state(state)
}
