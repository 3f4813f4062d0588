use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::info;

use crate::database::infrastructure::postgres::{
    map_write_error, substring_pattern,
};
use crate::database::ports::catalog::{CatalogRepository, TagKind};
use crate::domain::catalog::{
    Genre, GenreId, NewTag, Tag, Title, TitleFilter, TitleId, TitleRecord,
    TitleView,
};
use crate::error::{DomainError, Result};

fn table(kind: TagKind) -> &'static str {
    match kind {
        TagKind::Category => "categories",
        TagKind::Genre => "genres",
    }
}

fn slug_conflicts(kind: TagKind) -> [(&'static str, &'static str); 1] {
    match kind {
        TagKind::Category => {
            [("categories_slug_key", "category with this slug already exists")]
        }
        TagKind::Genre => {
            [("genres_slug_key", "genre with this slug already exists")]
        }
    }
}

#[derive(Debug, FromRow)]
struct TagRow {
    id: i64,
    name: String,
    slug: String,
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Tag {
            id: row.id,
            name: row.name,
            slug: row.slug,
        }
    }
}

#[derive(Debug, FromRow)]
struct TitleRow {
    id: i64,
    name: String,
    year: i32,
    description: String,
    category_id: Option<i64>,
}

#[derive(Debug, FromRow)]
struct TitleViewRow {
    id: i64,
    name: String,
    year: i32,
    description: String,
    rating: Option<f64>,
    category_id: Option<i64>,
    category_name: Option<String>,
    category_slug: Option<String>,
}

#[derive(Debug, FromRow)]
struct TitleGenreRow {
    title_id: i64,
    id: i64,
    name: String,
    slug: String,
}

/// PostgreSQL-backed implementation of the `CatalogRepository` port.
#[derive(Clone, Debug)]
pub struct PostgresCatalogRepository {
    pool: PgPool,
}

impl PostgresCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn replace_genres(
        tx: &mut Transaction<'_, Postgres>,
        title_id: TitleId,
        genre_ids: &[GenreId],
    ) -> Result<()> {
        sqlx::query("DELETE FROM title_genres WHERE title_id = $1")
            .bind(title_id)
            .execute(&mut **tx)
            .await?;

        if genre_ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            "INSERT INTO title_genres (title_id, genre_id) \
             SELECT $1, UNNEST($2::bigint[]) \
             ON CONFLICT DO NOTHING",
        )
        .bind(title_id)
        .bind(genre_ids)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_write_error(e, &[]))?;

        Ok(())
    }

    async fn query_views(
        &self,
        id: Option<TitleId>,
        filter: &TitleFilter,
    ) -> Result<Vec<TitleView>> {
        let rows = sqlx::query_as::<_, TitleViewRow>(
            "SELECT t.id, t.name, t.year, t.description, \
                    (SELECT AVG(r.score)::float8 FROM reviews r \
                      WHERE r.title_id = t.id) AS rating, \
                    c.id AS category_id, c.name AS category_name, \
                    c.slug AS category_slug \
             FROM titles t \
             LEFT JOIN categories c ON c.id = t.category_id \
             WHERE ($1::bigint IS NULL OR t.id = $1) \
               AND ($2::text IS NULL OR c.slug = $2) \
               AND ($3::text IS NULL OR EXISTS ( \
                    SELECT 1 FROM title_genres tg \
                    JOIN genres g ON g.id = tg.genre_id \
                    WHERE tg.title_id = t.id AND g.slug = $3)) \
               AND ($4::text IS NULL OR t.name ILIKE $4 ESCAPE '\\') \
               AND ($5::int IS NULL OR t.year = $5) \
             ORDER BY t.id",
        )
        .bind(id)
        .bind(filter.category.as_deref())
        .bind(filter.genre.as_deref())
        .bind(filter.name.as_deref().map(substring_pattern))
        .bind(filter.year)
        .fetch_all(self.pool())
        .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let genre_rows = sqlx::query_as::<_, TitleGenreRow>(
            "SELECT tg.title_id, g.id, g.name, g.slug \
             FROM title_genres tg JOIN genres g ON g.id = tg.genre_id \
             WHERE tg.title_id = ANY($1) \
             ORDER BY g.name, g.id",
        )
        .bind(&ids)
        .fetch_all(self.pool())
        .await?;

        let mut genres: HashMap<TitleId, Vec<Genre>> = HashMap::new();
        for row in genre_rows {
            genres.entry(row.title_id).or_default().push(Tag {
                id: row.id,
                name: row.name,
                slug: row.slug,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let category = match (
                    row.category_id,
                    row.category_name,
                    row.category_slug,
                ) {
                    (Some(id), Some(name), Some(slug)) => {
                        Some(Tag { id, name, slug })
                    }
                    _ => None,
                };
                TitleView {
                    id: row.id,
                    genre: genres.remove(&row.id).unwrap_or_default(),
                    name: row.name,
                    year: row.year,
                    rating: row.rating,
                    description: row.description,
                    category,
                }
            })
            .collect())
    }
}

#[async_trait]
impl CatalogRepository for PostgresCatalogRepository {
    async fn create_tag(&self, kind: TagKind, tag: &NewTag) -> Result<Tag> {
        let sql = format!(
            "INSERT INTO {} (name, slug) VALUES ($1, $2) \
             RETURNING id, name, slug",
            table(kind)
        );
        let row = sqlx::query_as::<_, TagRow>(&sql)
            .bind(&tag.name)
            .bind(tag.slug.as_str())
            .fetch_one(self.pool())
            .await
            .map_err(|e| map_write_error(e, &slug_conflicts(kind)))?;

        info!("Created {}: {}", kind.label(), row.slug);
        Ok(row.into())
    }

    async fn list_tags(
        &self,
        kind: TagKind,
        search: Option<&str>,
    ) -> Result<Vec<Tag>> {
        let sql = format!(
            "SELECT id, name, slug FROM {} \
             WHERE ($1::text IS NULL OR name ILIKE $1 ESCAPE '\\') \
             ORDER BY name, id",
            table(kind)
        );
        let rows = sqlx::query_as::<_, TagRow>(&sql)
            .bind(search.map(substring_pattern))
            .fetch_all(self.pool())
            .await?;

        Ok(rows.into_iter().map(Tag::from).collect())
    }

    async fn get_tag_by_slug(
        &self,
        kind: TagKind,
        slug: &str,
    ) -> Result<Option<Tag>> {
        let sql = format!(
            "SELECT id, name, slug FROM {} WHERE slug = $1",
            table(kind)
        );
        let row = sqlx::query_as::<_, TagRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool())
            .await?;

        Ok(row.map(Tag::from))
    }

    async fn delete_tag(&self, kind: TagKind, slug: &str) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE slug = $1", table(kind));
        let result = sqlx::query(&sql).bind(slug).execute(self.pool()).await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_title(&self, title: &TitleRecord) -> Result<TitleId> {
        let mut tx = self.pool().begin().await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO titles (name, year, description, category_id) \
             VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&title.name)
        .bind(title.year)
        .bind(&title.description)
        .bind(title.category_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, &[]))?;

        Self::replace_genres(&mut tx, id, &title.genre_ids).await?;
        tx.commit().await?;

        info!("Created title: {} ({})", title.name, id);
        Ok(id)
    }

    async fn get_title(&self, id: TitleId) -> Result<Option<Title>> {
        let Some(row) = sqlx::query_as::<_, TitleRow>(
            "SELECT id, name, year, description, category_id \
             FROM titles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?
        else {
            return Ok(None);
        };

        let genre_ids: Vec<i64> = sqlx::query_scalar(
            "SELECT genre_id FROM title_genres WHERE title_id = $1 \
             ORDER BY genre_id",
        )
        .bind(id)
        .fetch_all(self.pool())
        .await?;

        Ok(Some(Title {
            id: row.id,
            name: row.name,
            year: row.year,
            description: row.description,
            category_id: row.category_id,
            genre_ids,
        }))
    }

    async fn update_title(
        &self,
        id: TitleId,
        title: &TitleRecord,
    ) -> Result<bool> {
        let mut tx = self.pool().begin().await?;

        let result = sqlx::query(
            "UPDATE titles SET name = $2, year = $3, description = $4, \
             category_id = $5 WHERE id = $1",
        )
        .bind(id)
        .bind(&title.name)
        .bind(title.year)
        .bind(&title.description)
        .bind(title.category_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, &[]))?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        Self::replace_genres(&mut tx, id, &title.genre_ids).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn delete_title(&self, id: TitleId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM titles WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_title_view(&self, id: TitleId) -> Result<Option<TitleView>> {
        let mut views =
            self.query_views(Some(id), &TitleFilter::default()).await?;
        if views.len() > 1 {
            return Err(DomainError::Internal(format!(
                "title {id} resolved to {} rows",
                views.len()
            )));
        }
        Ok(views.pop())
    }

    async fn list_title_views(
        &self,
        filter: &TitleFilter,
    ) -> Result<Vec<TitleView>> {
        self.query_views(None, filter).await
    }
}
