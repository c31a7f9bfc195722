use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::llm_client::Provider;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SetTokenRequest {
    #[serde(default)]
    pub token: String,
}

#[derive(Serialize)]
pub struct TokenStatusResponse {
    pub provider: &'static str,
    pub requires_token: bool,
    pub stored: bool,
}

fn parse_provider(name: &str) -> Result<Provider, AppError> {
    name.parse::<Provider>()
        .map_err(|e| AppError::Validation(e.to_string()))
}

/// GET /api/v1/tokens
pub async fn handle_list_tokens(
    State(state): State<AppState>,
) -> Result<Json<Vec<TokenStatusResponse>>, AppError> {
    let mut statuses = Vec::with_capacity(Provider::ALL.len());
    for provider in Provider::ALL {
        statuses.push(TokenStatusResponse {
            provider: provider.as_str(),
            requires_token: provider.requires_credential(),
            stored: state.tokens.get_token(provider.as_str()).await?.is_some(),
        });
    }
    Ok(Json(statuses))
}

/// GET /api/v1/tokens/:provider
pub async fn handle_token_status(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<Json<TokenStatusResponse>, AppError> {
    let provider = parse_provider(&provider)?;
    let stored = state.tokens.get_token(provider.as_str()).await?.is_some();
    Ok(Json(TokenStatusResponse {
        provider: provider.as_str(),
        requires_token: provider.requires_credential(),
        stored,
    }))
}

/// PUT /api/v1/tokens/:provider: an empty token removes the stored key.
pub async fn handle_set_token(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Json(req): Json<SetTokenRequest>,
) -> Result<StatusCode, AppError> {
    let provider = parse_provider(&provider)?;
    let token = req.token.trim();
    state.tokens.set_token(provider.as_str(), token).await?;
    tracing::info!(
        "{} API key {}",
        provider,
        if token.is_empty() { "removed" } else { "saved" }
    );
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/tokens/:provider
pub async fn handle_delete_token(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<StatusCode, AppError> {
    let provider = parse_provider(&provider)?;
    state.tokens.set_token(provider.as_str(), "").await?;
    tracing::info!("{provider} API key removed");
    Ok(StatusCode::NO_CONTENT)
}
