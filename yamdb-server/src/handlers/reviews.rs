use axum::{Json, extract::State, http::StatusCode};

use yamdb_core::domain::catalog::TitleId;
use yamdb_core::domain::reviews::{Review, ReviewDraft, ReviewId, ReviewPatch};

use crate::{
    AppState,
    auth::Actor,
    infra::errors::{ApiJson, ApiPath, AppResult},
};

pub async fn list(
    State(state): State<AppState>,
    ApiPath(title_id): ApiPath<TitleId>,
) -> AppResult<Json<Vec<Review>>> {
    Ok(Json(state.reviews.list_reviews(title_id).await?))
}

pub async fn retrieve(
    State(state): State<AppState>,
    ApiPath((title_id, review_id)): ApiPath<(TitleId, ReviewId)>,
) -> AppResult<Json<Review>> {
    Ok(Json(state.reviews.get_review(title_id, review_id).await?))
}

/// A second review of the same title by the same author answers 409.
pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(title_id): ApiPath<TitleId>,
    ApiJson(draft): ApiJson<ReviewDraft>,
) -> AppResult<(StatusCode, Json<Review>)> {
    let review = state
        .reviews
        .create_review(actor.user(), title_id, draft)
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn update(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath((title_id, review_id)): ApiPath<(TitleId, ReviewId)>,
    ApiJson(patch): ApiJson<ReviewPatch>,
) -> AppResult<Json<Review>> {
    let review = state
        .reviews
        .update_review(actor.user(), title_id, review_id, patch)
        .await?;
    Ok(Json(review))
}

pub async fn replace(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath((title_id, review_id)): ApiPath<(TitleId, ReviewId)>,
    ApiJson(draft): ApiJson<ReviewDraft>,
) -> AppResult<Json<Review>> {
    let review = state
        .reviews
        .update_review(actor.user(), title_id, review_id, draft.into())
        .await?;
    Ok(Json(review))
}

pub async fn destroy(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath((title_id, review_id)): ApiPath<(TitleId, ReviewId)>,
) -> AppResult<StatusCode> {
    state
        .reviews
        .delete_review(actor.user(), title_id, review_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
