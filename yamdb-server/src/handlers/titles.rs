use axum::{Json, extract::State, http::StatusCode};

use yamdb_core::domain::catalog::{
    TitleDraft, TitleFilter, TitleId, TitlePatch, TitleView,
};

use crate::{
    AppState,
    auth::Actor,
    infra::errors::{ApiJson, ApiPath, ApiQuery, AppResult},
};

/// `?genre=<slug>&category=<slug>&name=<substring>&year=<year>`
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<TitleFilter>,
) -> AppResult<Json<Vec<TitleView>>> {
    Ok(Json(state.catalog.list_titles(&filter).await?))
}

pub async fn retrieve(
    State(state): State<AppState>,
    ApiPath(title_id): ApiPath<TitleId>,
) -> AppResult<Json<TitleView>> {
    Ok(Json(state.catalog.get_title(title_id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(draft): ApiJson<TitleDraft>,
) -> AppResult<(StatusCode, Json<TitleView>)> {
    let title = state.catalog.create_title(actor.user(), draft).await?;
    Ok((StatusCode::CREATED, Json(title)))
}

pub async fn update(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(title_id): ApiPath<TitleId>,
    ApiJson(patch): ApiJson<TitlePatch>,
) -> AppResult<Json<TitleView>> {
    let title = state
        .catalog
        .update_title(actor.user(), title_id, patch)
        .await?;
    Ok(Json(title))
}

pub async fn replace(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(title_id): ApiPath<TitleId>,
    ApiJson(draft): ApiJson<TitleDraft>,
) -> AppResult<Json<TitleView>> {
    let title = state
        .catalog
        .replace_title(actor.user(), title_id, draft)
        .await?;
    Ok(Json(title))
}

pub async fn destroy(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(title_id): ApiPath<TitleId>,
) -> AppResult<StatusCode> {
    state.catalog.delete_title(actor.user(), title_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
