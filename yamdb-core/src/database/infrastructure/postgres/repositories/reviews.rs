use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;

use crate::database::infrastructure::postgres::map_write_error;
use crate::database::ports::reviews::ReviewsRepository;
use crate::domain::catalog::TitleId;
use crate::domain::reviews::{
    Comment, CommentId, Review, ReviewDraft, ReviewId, ReviewPatch, Score,
};
use crate::domain::users::UserId;
use crate::error::{DomainError, Result};

const REVIEW_CONFLICTS: &[(&str, &str)] = &[(
    "unique_author_title",
    "you have already reviewed this title",
)];

#[derive(Debug, FromRow)]
struct ReviewRow {
    id: i64,
    title_id: i64,
    author_id: i64,
    author: String,
    text: Option<String>,
    score: i32,
    pub_date: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = DomainError;

    fn try_from(row: ReviewRow) -> Result<Self> {
        let score = Score::new(row.score).map_err(|_| {
            DomainError::Internal(format!(
                "review {} has out-of-range score {}",
                row.id, row.score
            ))
        })?;

        Ok(Review {
            id: row.id,
            author: row.author,
            title: row.title_id,
            text: row.text,
            score,
            pub_date: row.pub_date,
            author_id: row.author_id,
        })
    }
}

#[derive(Debug, FromRow)]
struct CommentRow {
    id: i64,
    review_id: i64,
    author_id: i64,
    author: String,
    text: String,
    pub_date: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            author: row.author,
            review: row.review_id,
            text: row.text,
            pub_date: row.pub_date,
            author_id: row.author_id,
        }
    }
}

macro_rules! review_select {
    ($source:literal) => {
        concat!(
            "SELECT r.id, r.title_id, r.author_id, u.username AS author, \
             r.text, r.score, r.pub_date FROM ",
            $source,
            " r JOIN users u ON u.id = r.author_id"
        )
    };
}

macro_rules! comment_select {
    ($source:literal) => {
        concat!(
            "SELECT c.id, c.review_id, c.author_id, u.username AS author, \
             c.text, c.pub_date FROM ",
            $source,
            " c JOIN users u ON u.id = c.author_id"
        )
    };
}

/// PostgreSQL-backed implementation of the `ReviewsRepository` port.
#[derive(Clone, Debug)]
pub struct PostgresReviewsRepository {
    pool: PgPool,
}

impl PostgresReviewsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ReviewsRepository for PostgresReviewsRepository {
    async fn create_review(
        &self,
        title_id: TitleId,
        author_id: UserId,
        draft: &ReviewDraft,
    ) -> Result<Review> {
        let row = sqlx::query_as::<_, ReviewRow>(concat!(
            "WITH inserted AS ( \
                INSERT INTO reviews (title_id, author_id, text, score) \
                VALUES ($1, $2, $3, $4) RETURNING * ) ",
            review_select!("inserted")
        ))
        .bind(title_id)
        .bind(author_id)
        .bind(draft.text.as_deref())
        .bind(draft.score.value())
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_write_error(e, REVIEW_CONFLICTS))?;

        info!(title_id, author_id, review_id = row.id, "review created");
        row.try_into()
    }

    async fn find_review_by_author(
        &self,
        title_id: TitleId,
        author_id: UserId,
    ) -> Result<Option<Review>> {
        sqlx::query_as::<_, ReviewRow>(concat!(
            review_select!("reviews"),
            " WHERE r.title_id = $1 AND r.author_id = $2"
        ))
        .bind(title_id)
        .bind(author_id)
        .fetch_optional(self.pool())
        .await?
        .map(Review::try_from)
        .transpose()
    }

    async fn get_review(
        &self,
        title_id: TitleId,
        review_id: ReviewId,
    ) -> Result<Option<Review>> {
        sqlx::query_as::<_, ReviewRow>(concat!(
            review_select!("reviews"),
            " WHERE r.title_id = $1 AND r.id = $2"
        ))
        .bind(title_id)
        .bind(review_id)
        .fetch_optional(self.pool())
        .await?
        .map(Review::try_from)
        .transpose()
    }

    async fn list_reviews(&self, title_id: TitleId) -> Result<Vec<Review>> {
        let rows = sqlx::query_as::<_, ReviewRow>(concat!(
            review_select!("reviews"),
            " WHERE r.title_id = $1 ORDER BY r.pub_date DESC, r.id DESC"
        ))
        .bind(title_id)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(Review::try_from).collect()
    }

    async fn update_review(
        &self,
        review_id: ReviewId,
        patch: &ReviewPatch,
    ) -> Result<Review> {
        sqlx::query_as::<_, ReviewRow>(concat!(
            "WITH updated AS ( \
                UPDATE reviews SET \
                    text  = COALESCE($2, text), \
                    score = COALESCE($3, score) \
                WHERE id = $1 RETURNING * ) ",
            review_select!("updated")
        ))
        .bind(review_id)
        .bind(patch.text.as_deref())
        .bind(patch.score.map(Score::value))
        .fetch_optional(self.pool())
        .await?
        .ok_or_else(|| DomainError::not_found(format!("review {review_id}")))?
        .try_into()
    }

    async fn delete_review(&self, review_id: ReviewId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(review_id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_comment(
        &self,
        review_id: ReviewId,
        author_id: UserId,
        text: &str,
    ) -> Result<Comment> {
        let row = sqlx::query_as::<_, CommentRow>(concat!(
            "WITH inserted AS ( \
                INSERT INTO comments (review_id, author_id, text) \
                VALUES ($1, $2, $3) RETURNING * ) ",
            comment_select!("inserted")
        ))
        .bind(review_id)
        .bind(author_id)
        .bind(text)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_write_error(e, &[]))?;

        Ok(row.into())
    }

    async fn get_comment(
        &self,
        review_id: ReviewId,
        comment_id: CommentId,
    ) -> Result<Option<Comment>> {
        let row = sqlx::query_as::<_, CommentRow>(concat!(
            comment_select!("comments"),
            " WHERE c.review_id = $1 AND c.id = $2"
        ))
        .bind(review_id)
        .bind(comment_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Comment::from))
    }

    async fn list_comments(&self, review_id: ReviewId) -> Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, CommentRow>(concat!(
            comment_select!("comments"),
            " WHERE c.review_id = $1 ORDER BY c.pub_date DESC, c.id DESC"
        ))
        .bind(review_id)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn update_comment(
        &self,
        comment_id: CommentId,
        text: &str,
    ) -> Result<Comment> {
        let row = sqlx::query_as::<_, CommentRow>(concat!(
            "WITH updated AS ( \
                UPDATE comments SET text = $2 WHERE id = $1 RETURNING * ) ",
            comment_select!("updated")
        ))
        .bind(comment_id)
        .bind(text)
        .fetch_optional(self.pool())
        .await?
        .ok_or_else(|| DomainError::not_found(format!("comment {comment_id}")))?;

        Ok(row.into())
    }

    async fn delete_comment(&self, comment_id: CommentId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
