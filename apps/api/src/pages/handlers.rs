use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::activity::LogSink;
use crate::errors::AppError;
use crate::models::field::{FieldDescriptor, PageCommand};
use crate::models::page::{PageRecord, PageStats};
use crate::pages::template::{fill_commands, normalize_template};
use crate::state::AppState;

const EXPORT_FILENAME: &str = "form_data.json";

#[derive(Deserialize)]
pub struct SavePageRequest {
    pub url: String,
    pub fields: Vec<FieldDescriptor>,
}

#[derive(Deserialize)]
pub struct PageUrlRequest {
    pub url: String,
}

#[derive(Deserialize)]
pub struct ApplyTemplateRequest {
    pub url: String,
    pub template: Value,
}

#[derive(Serialize)]
pub struct PageListResponse {
    pub pages: Vec<PageRecord>,
    pub stats: PageStats,
}

#[derive(Serialize)]
pub struct CommandResponse {
    pub commands: Vec<PageCommand>,
    pub message: String,
}

/// GET /api/v1/pages
pub async fn handle_list_pages(State(state): State<AppState>) -> Json<PageListResponse> {
    Json(PageListResponse {
        pages: state.pages.all().await,
        stats: state.pages.stats().await,
    })
}

/// POST /api/v1/pages: record a fresh scan.
pub async fn handle_save_page(
    State(state): State<AppState>,
    Json(req): Json<SavePageRequest>,
) -> Result<Json<PageRecord>, AppError> {
    if req.url.trim().is_empty() {
        return Err(AppError::Validation("url cannot be empty".to_string()));
    }
    let record = state.pages.upsert(&req.url, req.fields).await;
    state.activity.info(format!(
        "Fetched {} fields from {}",
        record.fields.len(),
        record.url
    ));
    Ok(Json(record))
}

/// DELETE /api/v1/pages
pub async fn handle_clear_pages(State(state): State<AppState>) -> StatusCode {
    state.pages.clear().await;
    state
        .activity
        .info("Cleared collected data from storage.".to_string());
    StatusCode::NO_CONTENT
}

/// GET /api/v1/pages/export: downloadable JSON of every stored page.
pub async fn handle_export_pages(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let pages = state.pages.all().await;
    if pages.is_empty() {
        return Err(AppError::NotFound("No data to download.".to_string()));
    }

    let body = serde_json::to_string_pretty(&pages).map_err(anyhow::Error::from)?;
    state
        .activity
        .info(format!("Triggered download for {EXPORT_FILENAME}"));

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILENAME}\""),
            ),
        ],
        body,
    ))
}

/// POST /api/v1/pages/apply: replay every stored value for a page.
pub async fn handle_apply_page(
    State(state): State<AppState>,
    Json(req): Json<PageUrlRequest>,
) -> Result<Json<CommandResponse>, AppError> {
    let page = state.pages.find(&req.url).await.ok_or_else(|| {
        AppError::NotFound("No data found for this page. Run AI Process first.".to_string())
    })?;

    let commands: Vec<PageCommand> = page
        .fields
        .into_iter()
        .filter(|f| f.has_id() && f.has_value())
        .filter_map(|f| {
            let id = f.id;
            f.value.map(|value| PageCommand::FillField { id, value })
        })
        .collect();

    let message = format!("Applied {} values to the form.", commands.len());
    state.activity.info(message.clone());
    Ok(Json(CommandResponse { commands, message }))
}

/// POST /api/v1/pages/reset
pub async fn handle_reset_page(State(state): State<AppState>) -> Json<CommandResponse> {
    state
        .activity
        .info("Requested form fields reset on active tab.".to_string());
    Json(CommandResponse {
        commands: vec![PageCommand::ResetForms],
        message: "Form fields cleared.".to_string(),
    })
}

/// POST /api/v1/templates/apply
pub async fn handle_apply_template(
    State(state): State<AppState>,
    Json(req): Json<ApplyTemplateRequest>,
) -> Result<Json<CommandResponse>, AppError> {
    let Some(payload) = normalize_template(&req.template) else {
        state
            .activity
            .error("Uploaded JSON did not contain a fields array.".to_string());
        return Err(AppError::Validation("JSON missing fields array.".to_string()));
    };

    let fills = payload.fills();
    if fills.is_empty() {
        state
            .activity
            .warn("Uploaded JSON contained no values with both id and value.".to_string());
        return Err(AppError::Validation(
            "No fillable entries detected in JSON.".to_string(),
        ));
    }

    state.pages.sync_template_values(&req.url, &fills).await;

    let message = format!("Filled {} values from JSON.", fills.len());
    state
        .activity
        .info(format!("{message} (Source: {})", payload.source_name()));

    Ok(Json(CommandResponse {
        commands: fill_commands(&fills),
        message,
    }))
}
