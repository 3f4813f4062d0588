use async_trait::async_trait;

use crate::domain::catalog::TitleId;
use crate::domain::reviews::{
    Comment, CommentId, Review, ReviewDraft, ReviewId, ReviewPatch,
};
use crate::domain::users::UserId;
use crate::error::Result;

// Review and comment store. Listings are newest first.
#[async_trait]
pub trait ReviewsRepository: Send + Sync {
    /// A second review by the same author on the same title surfaces as
    /// `DomainError::Conflict`, whatever the caller checked beforehand.
    async fn create_review(
        &self,
        title_id: TitleId,
        author_id: UserId,
        draft: &ReviewDraft,
    ) -> Result<Review>;
    async fn find_review_by_author(
        &self,
        title_id: TitleId,
        author_id: UserId,
    ) -> Result<Option<Review>>;
    async fn get_review(
        &self,
        title_id: TitleId,
        review_id: ReviewId,
    ) -> Result<Option<Review>>;
    async fn list_reviews(&self, title_id: TitleId) -> Result<Vec<Review>>;
    async fn update_review(
        &self,
        review_id: ReviewId,
        patch: &ReviewPatch,
    ) -> Result<Review>;
    /// Cascades to the review's comments
    async fn delete_review(&self, review_id: ReviewId) -> Result<bool>;

    async fn create_comment(
        &self,
        review_id: ReviewId,
        author_id: UserId,
        text: &str,
    ) -> Result<Comment>;
    async fn get_comment(
        &self,
        review_id: ReviewId,
        comment_id: CommentId,
    ) -> Result<Option<Comment>>;
    async fn list_comments(&self, review_id: ReviewId) -> Result<Vec<Comment>>;
    async fn update_comment(
        &self,
        comment_id: CommentId,
        text: &str,
    ) -> Result<Comment>;
    async fn delete_comment(&self, comment_id: CommentId) -> Result<bool>;
}
