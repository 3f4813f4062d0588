use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::Deserialize;

use yamdb_core::application::accounts::CreateUserCommand;
use yamdb_core::domain::users::{ProfileUpdate, UserPatch, UserProfile};

use crate::{
    AppState,
    auth::Actor,
    infra::errors::{ApiJson, ApiPath, ApiQuery, AppResult},
};

#[derive(Debug, Default, Deserialize)]
pub struct UserSearch {
    pub search: Option<String>,
}

pub async fn me(
    State(state): State<AppState>,
    actor: Actor,
) -> AppResult<Json<UserProfile>> {
    Ok(Json(state.accounts.own_profile(actor.user())?))
}

/// Only names and bio can change here; other fields are ignored.
pub async fn update_me(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> AppResult<Json<UserProfile>> {
    let profile = state
        .accounts
        .update_own_profile(actor.user(), update)
        .await?;
    Ok(Json(profile))
}

pub async fn list(
    State(state): State<AppState>,
    actor: Actor,
    ApiQuery(query): ApiQuery<UserSearch>,
) -> AppResult<Json<Vec<UserProfile>>> {
    let users = state
        .accounts
        .list_users(actor.user(), query.search.as_deref())
        .await?;
    Ok(Json(users))
}

pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(command): ApiJson<CreateUserCommand>,
) -> AppResult<(StatusCode, Json<UserProfile>)> {
    let profile = state.accounts.create_user(actor.user(), command).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn retrieve(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(username): ApiPath<String>,
) -> AppResult<Json<UserProfile>> {
    let profile = state.accounts.get_user(actor.user(), &username).await?;
    Ok(Json(profile))
}

pub async fn update(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(username): ApiPath<String>,
    ApiJson(patch): ApiJson<UserPatch>,
) -> AppResult<Json<UserProfile>> {
    let profile = state
        .accounts
        .update_user(actor.user(), &username, patch)
        .await?;
    Ok(Json(profile))
}

pub async fn replace(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(username): ApiPath<String>,
    ApiJson(command): ApiJson<CreateUserCommand>,
) -> AppResult<Json<UserProfile>> {
    let profile = state
        .accounts
        .replace_user(actor.user(), &username, command)
        .await?;
    Ok(Json(profile))
}

pub async fn destroy(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(username): ApiPath<String>,
) -> AppResult<StatusCode> {
    state.accounts.delete_user(actor.user(), &username).await?;
    Ok(StatusCode::NO_CONTENT)
}
