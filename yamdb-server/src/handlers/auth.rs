use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::info;

use yamdb_core::application::accounts::{SignupCommand, SignupReceipt, TokenRequest};
use yamdb_core::domain::tokens::TokenPair;

use crate::{
    AppState,
    auth::TokenType,
    infra::errors::{ApiJson, AppError, AppResult},
};

/// Register (or re-register) and mail a fresh confirmation code.
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(command): ApiJson<SignupCommand>,
) -> AppResult<Json<SignupReceipt>> {
    let receipt = state.accounts.signup(command).await?;
    Ok(Json(receipt))
}

pub async fn obtain_token(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<TokenRequest>,
) -> AppResult<Json<TokenPair>> {
    let pair = state.accounts.obtain_token(request).await?;
    Ok(Json(pair))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// Exchange a refresh token for a new access token.
pub async fn refresh_token(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RefreshRequest>,
) -> AppResult<Json<RefreshResponse>> {
    if request.refresh.is_empty() {
        return Err(AppError::bad_request("refresh is required"));
    }

    let claims = state.tokens.verify(&request.refresh, TokenType::Refresh)?;
    let user = state
        .unit_of_work
        .users
        .get_user_by_id(claims.user_id()?)
        .await?
        .ok_or_else(|| AppError::unauthorized("user no longer exists"))?;

    let access = state.tokens.access_token(user.id)?;
    info!(user = %user.username, "access token refreshed");
    Ok(Json(RefreshResponse { access }))
}
