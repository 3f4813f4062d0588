//! Reviews of titles and the comment threads under them.

use std::sync::Arc;

use tracing::info;

use crate::application::unit_of_work::AppUnitOfWork;
use crate::database::ports::catalog::CatalogRepository;
use crate::database::ports::reviews::ReviewsRepository;
use crate::domain::catalog::TitleId;
use crate::domain::policy::{Access, Policy, require_actor};
use crate::domain::reviews::{
    Comment, CommentDraft, CommentId, Review, ReviewDraft, ReviewId,
    ReviewPatch,
};
use crate::domain::users::User;
use crate::error::{DomainError, Result};

const POLICY: Policy = Policy::OwnerOrStaffOrReadOnly;

#[derive(Clone)]
pub struct ReviewService {
    catalog: Arc<dyn CatalogRepository>,
    reviews: Arc<dyn ReviewsRepository>,
}

impl std::fmt::Debug for ReviewService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewService")
            .field("catalog_repo", &Arc::strong_count(&self.catalog))
            .field("reviews_repo", &Arc::strong_count(&self.reviews))
            .finish()
    }
}

impl ReviewService {
    pub fn new(uow: &AppUnitOfWork) -> Self {
        Self {
            catalog: uow.catalog.clone(),
            reviews: uow.reviews.clone(),
        }
    }

    async fn ensure_title(&self, title_id: TitleId) -> Result<()> {
        if self.catalog.get_title(title_id).await?.is_none() {
            return Err(DomainError::not_found(format!("title {title_id}")));
        }
        Ok(())
    }

    async fn review_in_title(
        &self,
        title_id: TitleId,
        review_id: ReviewId,
    ) -> Result<Review> {
        self.reviews
            .get_review(title_id, review_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("review {review_id}")))
    }

    async fn comment_in_review(
        &self,
        title_id: TitleId,
        review_id: ReviewId,
        comment_id: CommentId,
    ) -> Result<Comment> {
        self.review_in_title(title_id, review_id).await?;
        self.reviews
            .get_comment(review_id, comment_id)
            .await?
            .ok_or_else(|| {
                DomainError::not_found(format!("comment {comment_id}"))
            })
    }

    pub async fn list_reviews(&self, title_id: TitleId) -> Result<Vec<Review>> {
        self.ensure_title(title_id).await?;
        self.reviews.list_reviews(title_id).await
    }

    pub async fn get_review(
        &self,
        title_id: TitleId,
        review_id: ReviewId,
    ) -> Result<Review> {
        self.review_in_title(title_id, review_id).await
    }

    /// One review per author and title; the store constraint backs the
    /// pre-check.
    pub async fn create_review(
        &self,
        actor: Option<&User>,
        title_id: TitleId,
        draft: ReviewDraft,
    ) -> Result<Review> {
        POLICY.authorize(actor, Access::Unsafe)?;
        let author = require_actor(actor)?;
        draft.validate()?;
        self.ensure_title(title_id).await?;

        if self
            .reviews
            .find_review_by_author(title_id, author.id)
            .await?
            .is_some()
        {
            return Err(DomainError::conflict(
                "you have already reviewed this title",
            ));
        }

        self.reviews.create_review(title_id, author.id, &draft).await
    }

    pub async fn update_review(
        &self,
        actor: Option<&User>,
        title_id: TitleId,
        review_id: ReviewId,
        patch: ReviewPatch,
    ) -> Result<Review> {
        POLICY.authorize(actor, Access::Unsafe)?;
        let review = self.review_in_title(title_id, review_id).await?;
        POLICY.authorize_object(actor, Access::Unsafe, review.author_id)?;
        patch.validate()?;

        self.reviews.update_review(review.id, &patch).await
    }

    pub async fn delete_review(
        &self,
        actor: Option<&User>,
        title_id: TitleId,
        review_id: ReviewId,
    ) -> Result<()> {
        POLICY.authorize(actor, Access::Unsafe)?;
        let review = self.review_in_title(title_id, review_id).await?;
        POLICY.authorize_object(actor, Access::Unsafe, review.author_id)?;

        if !self.reviews.delete_review(review.id).await? {
            return Err(DomainError::not_found(format!("review {review_id}")));
        }
        info!(title_id, review_id, "review deleted");
        Ok(())
    }

    pub async fn list_comments(
        &self,
        title_id: TitleId,
        review_id: ReviewId,
    ) -> Result<Vec<Comment>> {
        self.review_in_title(title_id, review_id).await?;
        self.reviews.list_comments(review_id).await
    }

    pub async fn get_comment(
        &self,
        title_id: TitleId,
        review_id: ReviewId,
        comment_id: CommentId,
    ) -> Result<Comment> {
        self.comment_in_review(title_id, review_id, comment_id).await
    }

    pub async fn create_comment(
        &self,
        actor: Option<&User>,
        title_id: TitleId,
        review_id: ReviewId,
        draft: CommentDraft,
    ) -> Result<Comment> {
        POLICY.authorize(actor, Access::Unsafe)?;
        let author = require_actor(actor)?;
        draft.validate()?;
        self.review_in_title(title_id, review_id).await?;

        self.reviews
            .create_comment(review_id, author.id, &draft.text)
            .await
    }

    pub async fn update_comment(
        &self,
        actor: Option<&User>,
        title_id: TitleId,
        review_id: ReviewId,
        comment_id: CommentId,
        draft: CommentDraft,
    ) -> Result<Comment> {
        POLICY.authorize(actor, Access::Unsafe)?;
        let comment =
            self.comment_in_review(title_id, review_id, comment_id).await?;
        POLICY.authorize_object(actor, Access::Unsafe, comment.author_id)?;
        draft.validate()?;

        self.reviews.update_comment(comment.id, &draft.text).await
    }

    pub async fn delete_comment(
        &self,
        actor: Option<&User>,
        title_id: TitleId,
        review_id: ReviewId,
        comment_id: CommentId,
    ) -> Result<()> {
        POLICY.authorize(actor, Access::Unsafe)?;
        let comment =
            self.comment_in_review(title_id, review_id, comment_id).await?;
        POLICY.authorize_object(actor, Access::Unsafe, comment.author_id)?;

        if !self.reviews.delete_comment(comment.id).await? {
            return Err(DomainError::not_found(format!("comment {comment_id}")));
        }
        Ok(())
    }
}
