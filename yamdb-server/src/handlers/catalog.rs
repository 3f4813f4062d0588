//! Category and genre endpoints. Both kinds share one implementation and
//! differ only in the table they address.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use yamdb_core::database::ports::catalog::TagKind;
use yamdb_core::domain::catalog::{NewTag, Tag};

use crate::{
    AppState,
    auth::Actor,
    infra::errors::{ApiJson, ApiPath, ApiQuery, AppResult},
};

#[derive(Debug, Default, Deserialize)]
pub struct TagSearch {
    /// Case-insensitive substring of the name
    pub search: Option<String>,
}

async fn list(
    state: &AppState,
    kind: TagKind,
    query: TagSearch,
) -> AppResult<Json<Vec<Tag>>> {
    let tags = state
        .catalog
        .list_tags(kind, query.search.as_deref())
        .await?;
    Ok(Json(tags))
}

async fn create(
    state: &AppState,
    actor: &Actor,
    kind: TagKind,
    tag: NewTag,
) -> AppResult<(StatusCode, Json<Tag>)> {
    let tag = state.catalog.create_tag(actor.user(), kind, tag).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

async fn destroy(
    state: &AppState,
    actor: &Actor,
    kind: TagKind,
    slug: &str,
) -> AppResult<StatusCode> {
    state.catalog.delete_tag(actor.user(), kind, slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_categories(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TagSearch>,
) -> AppResult<Json<Vec<Tag>>> {
    list(&state, TagKind::Category, query).await
}

pub async fn create_category(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(tag): ApiJson<NewTag>,
) -> AppResult<(StatusCode, Json<Tag>)> {
    create(&state, &actor, TagKind::Category, tag).await
}

pub async fn delete_category(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(slug): ApiPath<String>,
) -> AppResult<StatusCode> {
    destroy(&state, &actor, TagKind::Category, &slug).await
}

pub async fn list_genres(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TagSearch>,
) -> AppResult<Json<Vec<Tag>>> {
    list(&state, TagKind::Genre, query).await
}

pub async fn create_genre(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(tag): ApiJson<NewTag>,
) -> AppResult<(StatusCode, Json<Tag>)> {
    create(&state, &actor, TagKind::Genre, tag).await
}

pub async fn delete_genre(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(slug): ApiPath<String>,
) -> AppResult<StatusCode> {
    destroy(&state, &actor, TagKind::Genre, &slug).await
}
