use axum::{Json, extract::State, http::StatusCode};

use yamdb_core::domain::catalog::TitleId;
use yamdb_core::domain::reviews::{Comment, CommentDraft, CommentId, ReviewId};

use crate::{
    AppState,
    auth::Actor,
    infra::errors::{ApiJson, ApiPath, AppResult},
};

type CommentPath = (TitleId, ReviewId, CommentId);

pub async fn list(
    State(state): State<AppState>,
    ApiPath((title_id, review_id)): ApiPath<(TitleId, ReviewId)>,
) -> AppResult<Json<Vec<Comment>>> {
    Ok(Json(state.reviews.list_comments(title_id, review_id).await?))
}

pub async fn retrieve(
    State(state): State<AppState>,
    ApiPath((title_id, review_id, comment_id)): ApiPath<CommentPath>,
) -> AppResult<Json<Comment>> {
    let comment = state
        .reviews
        .get_comment(title_id, review_id, comment_id)
        .await?;
    Ok(Json(comment))
}

pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath((title_id, review_id)): ApiPath<(TitleId, ReviewId)>,
    ApiJson(draft): ApiJson<CommentDraft>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    let comment = state
        .reviews
        .create_comment(actor.user(), title_id, review_id, draft)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// PATCH and PUT are equivalent: the text is the only writable field.
pub async fn update(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath((title_id, review_id, comment_id)): ApiPath<CommentPath>,
    ApiJson(draft): ApiJson<CommentDraft>,
) -> AppResult<Json<Comment>> {
    let comment = state
        .reviews
        .update_comment(actor.user(), title_id, review_id, comment_id, draft)
        .await?;
    Ok(Json(comment))
}

pub async fn destroy(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath((title_id, review_id, comment_id)): ApiPath<CommentPath>,
) -> AppResult<StatusCode> {
    state
        .reviews
        .delete_comment(actor.user(), title_id, review_id, comment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
