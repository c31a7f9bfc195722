//! Axum route handlers for the suggestion API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::activity::LogSink;
use crate::errors::AppError;
use crate::models::field::{FieldDescriptor, PageCommand, SuggestionMap};
use crate::state::AppState;
use crate::suggestion::autofill::{autofill, fill_commands, FillReport};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SuggestRequest {
    /// Kept loose so a missing or malformed list reaches the pipeline as
    /// "no fields" instead of a rejected request.
    #[serde(default)]
    pub fields: Value,
    #[serde(default)]
    pub context: String,
    pub provider: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SuggestResponse {
    pub suggestions: SuggestionMap,
}

#[derive(Debug, Deserialize)]
pub struct AutofillRequest {
    pub url: String,
    pub fields: Vec<FieldDescriptor>,
    pub context: Option<String>,
    pub provider: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AutofillResponse {
    pub fields: Vec<FieldDescriptor>,
    pub report: FillReport,
    pub commands: Vec<PageCommand>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/suggestions
///
/// Raw pipeline call. Always 200; failures show up as an empty map plus
/// entries in the activity log.
pub async fn handle_suggest(
    State(state): State<AppState>,
    Json(request): Json<SuggestRequest>,
) -> Json<SuggestResponse> {
    let fields = field_list(request.fields, state.engine.log());
    let provider = resolve_provider(&state, request.provider).await;
    let suggestions = state
        .engine
        .get_suggested_values(&fields, &request.context, provider.as_deref())
        .await;
    Json(SuggestResponse { suggestions })
}

/// Anything other than a list of field descriptors counts as no fields.
fn field_list(raw: Value, log: &dyn LogSink) -> Vec<FieldDescriptor> {
    match raw {
        Value::Null => Vec::new(),
        Value::Array(_) => serde_json::from_value(raw).unwrap_or_else(|e| {
            log.warn(format!("Ignoring malformed fields list: {e}"));
            Vec::new()
        }),
        other => {
            log.warn(format!("Expected a list of fields, got: {other}"));
            Vec::new()
        }
    }
}

/// POST /api/v1/forms/autofill
///
/// Full popup flow: pick empty fields with ids, ask the model, write answers
/// back into the stored page record and return fill commands for the page.
pub async fn handle_autofill(
    State(state): State<AppState>,
    Json(request): Json<AutofillRequest>,
) -> Result<Json<AutofillResponse>, AppError> {
    if request.url.trim().is_empty() {
        return Err(AppError::Validation("url cannot be empty".to_string()));
    }

    let context = resolve_context(&state, request.context).await?;

    // A page seen before keeps its stored fields as the working set.
    let mut fields = match state.pages.find(&request.url).await {
        Some(page) => page.fields,
        None => {
            state.pages.upsert(&request.url, request.fields.clone()).await;
            request.fields
        }
    };

    let provider = resolve_provider(&state, request.provider).await;
    let (report, filled) =
        autofill(&state.engine, &mut fields, &context, provider.as_deref()).await;

    let commands = fill_commands(&fields, &filled);
    state.pages.save_fields(&request.url, fields.clone()).await;

    Ok(Json(AutofillResponse {
        fields,
        report,
        commands,
    }))
}

/// Request provider if non-blank, else the stored choice. `None` leaves the
/// configured default to the engine.
async fn resolve_provider(state: &AppState, provider: Option<String>) -> Option<String> {
    match provider.filter(|p| !p.trim().is_empty()) {
        Some(provider) => Some(provider),
        None => state.settings.provider().await,
    }
}

/// Request context if non-blank, else the stored resume text, else the
/// configured resume file, else empty.
async fn resolve_context(state: &AppState, context: Option<String>) -> Result<String, AppError> {
    if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
        return Ok(context);
    }

    if let Some(stored) = state.settings.resume_context().await {
        return Ok(stored);
    }

    let Some(path) = &state.config.resume_path else {
        return Ok(String::new());
    };

    tokio::fs::read_to_string(path)
        .await
        .map(|text| text.trim().to_string())
        .map_err(|e| {
            tracing::error!("Failed to read resume file {}: {e}", path.display());
            AppError::Validation("Could not load resume context.".to_string())
        })
}
