//! Bulk import of users, the catalog, reviews and comments from CSV tables.
//!
//! A data directory holds one table per file, each with a header row:
//!
//! | File | Columns |
//! | --- | --- |
//! | `users.csv` | `id, username, email, role, bio, first_name, last_name` |
//! | `category.csv`, `genre.csv` | `id, name, slug` |
//! | `titles.csv` | `id, name, year, category, description` |
//! | `genre_title.csv` | `id, title_id, genre_id` |
//! | `review.csv` | `id, title_id, text, author, score, pub_date` |
//! | `comments.csv` | `id, review_id, text, author, pub_date` |
//!
//! Ids in the files only link rows across tables; stored records keep the
//! ids the store assigns. Rows are upserted by natural key (username, slug,
//! title name and year, review author and title, comment author and text),
//! so importing the same directory twice changes nothing. Missing files are
//! skipped, and `pub_date` is not carried over.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::{Datelike, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::application::accounts::generate_confirmation_code;
use crate::application::unit_of_work::AppUnitOfWork;
use crate::database::ports::catalog::{CatalogRepository, TagKind};
use crate::database::ports::reviews::ReviewsRepository;
use crate::database::ports::users::UsersRepository;
use crate::domain::catalog::{
    NewTag, Slug, TitleFilter, TitleId, TitleRecord, validate_name,
    validate_year,
};
use crate::domain::reviews::{CommentDraft, ReviewDraft, ReviewPatch, Score};
use crate::domain::users::{Email, NewUser, UserPatch, UserRole, Username};
use crate::error::{DomainError, Result};

pub const USERS_FILE: &str = "users.csv";
pub const CATEGORIES_FILE: &str = "category.csv";
pub const GENRES_FILE: &str = "genre.csv";
pub const TITLES_FILE: &str = "titles.csv";
pub const GENRE_LINKS_FILE: &str = "genre_title.csv";
pub const REVIEWS_FILE: &str = "review.csv";
pub const COMMENTS_FILE: &str = "comments.csv";

#[derive(Debug, Deserialize)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    #[serde(default)]
    role: Option<UserRole>,
    #[serde(default)]
    bio: Option<String>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagRow {
    id: i64,
    name: String,
    slug: String,
}

#[derive(Debug, Deserialize)]
struct TitleRow {
    id: i64,
    name: String,
    year: i32,
    #[serde(default)]
    category: Option<i64>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenreLinkRow {
    title_id: i64,
    genre_id: i64,
}

#[derive(Debug, Deserialize)]
struct ReviewRow {
    id: i64,
    title_id: i64,
    #[serde(default)]
    text: Option<String>,
    author: i64,
    score: i32,
}

#[derive(Debug, Deserialize)]
struct CommentRow {
    review_id: i64,
    text: String,
    author: i64,
}

/// Rows written for one table.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TableStats {
    pub created: usize,
    /// Rows that matched a stored record by natural key
    pub matched: usize,
}

impl TableStats {
    fn record(&mut self, created: bool) {
        if created {
            self.created += 1;
        } else {
            self.matched += 1;
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub users: TableStats,
    pub categories: TableStats,
    pub genres: TableStats,
    pub titles: TableStats,
    pub genre_links: TableStats,
    pub reviews: TableStats,
    pub comments: TableStats,
}

/// File ids mapped to store ids, per table.
#[derive(Debug, Default)]
struct IdMap {
    users: HashMap<i64, i64>,
    categories: HashMap<i64, i64>,
    genres: HashMap<i64, i64>,
    titles: HashMap<i64, TitleId>,
    reviews: HashMap<i64, i64>,
}

fn resolve(
    map: &HashMap<i64, i64>,
    file: &str,
    line: usize,
    what: &str,
    id: i64,
) -> Result<i64> {
    map.get(&id).copied().ok_or_else(|| {
        DomainError::Import(format!("{file}:{line}: unknown {what} id {id}"))
    })
}

fn at_line(file: &str, line: usize) -> impl Fn(DomainError) -> DomainError {
    let prefix = format!("{file}:{line}");
    move |err| DomainError::Import(format!("{prefix}: {err}"))
}

/// Read every row of `dir/file`, paired with its line number. `None` when
/// the file does not exist.
fn read_table<T: DeserializeOwned>(
    dir: &Path,
    file: &str,
) -> Result<Option<Vec<(usize, T)>>> {
    let path = dir.join(file);
    if !path.exists() {
        info!("Skipping {}: file not found", path.display());
        return Ok(None);
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(&path)
        .map_err(|e| DomainError::Import(format!("{file}: {e}")))?;

    let mut rows = Vec::new();
    for (idx, row) in reader.deserialize::<T>().enumerate() {
        // Line 1 is the header.
        let line = idx + 2;
        let row =
            row.map_err(|e| DomainError::Import(format!("{file}:{line}: {e}")))?;
        rows.push((line, row));
    }
    Ok(Some(rows))
}

#[derive(Clone)]
pub struct CsvImporter {
    users: Arc<dyn UsersRepository>,
    catalog: Arc<dyn CatalogRepository>,
    reviews: Arc<dyn ReviewsRepository>,
}

impl std::fmt::Debug for CsvImporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvImporter")
            .field("users_repo", &Arc::strong_count(&self.users))
            .field("catalog_repo", &Arc::strong_count(&self.catalog))
            .field("reviews_repo", &Arc::strong_count(&self.reviews))
            .finish()
    }
}

impl CsvImporter {
    pub fn new(uow: &AppUnitOfWork) -> Self {
        Self {
            users: uow.users.clone(),
            catalog: uow.catalog.clone(),
            reviews: uow.reviews.clone(),
        }
    }

    /// Import every known table found in `dir`, parents before children.
    ///
    /// Stops at the first bad row; rows before it stay written.
    pub async fn import_dir(&self, dir: &Path) -> Result<ImportReport> {
        if !dir.is_dir() {
            return Err(DomainError::Import(format!(
                "{} is not a directory",
                dir.display()
            )));
        }

        let mut ids = IdMap::default();
        let mut report = ImportReport::default();

        if let Some(rows) = read_table(dir, USERS_FILE)? {
            report.users = self.import_users(rows, &mut ids).await?;
        }
        if let Some(rows) = read_table(dir, CATEGORIES_FILE)? {
            report.categories = self
                .import_tags(
                    TagKind::Category,
                    CATEGORIES_FILE,
                    rows,
                    &mut ids.categories,
                )
                .await?;
        }
        if let Some(rows) = read_table(dir, GENRES_FILE)? {
            report.genres = self
                .import_tags(TagKind::Genre, GENRES_FILE, rows, &mut ids.genres)
                .await?;
        }
        if let Some(rows) = read_table(dir, TITLES_FILE)? {
            report.titles = self.import_titles(rows, &mut ids).await?;
        }
        if let Some(rows) = read_table(dir, GENRE_LINKS_FILE)? {
            report.genre_links = self.import_genre_links(rows, &ids).await?;
        }
        if let Some(rows) = read_table(dir, REVIEWS_FILE)? {
            report.reviews = self.import_reviews(rows, &mut ids).await?;
        }
        if let Some(rows) = read_table(dir, COMMENTS_FILE)? {
            report.comments = self.import_comments(rows, &ids).await?;
        }

        info!(?report, "Import from {} finished", dir.display());
        Ok(report)
    }

    async fn import_users(
        &self,
        rows: Vec<(usize, UserRow)>,
        ids: &mut IdMap,
    ) -> Result<TableStats> {
        let mut stats = TableStats::default();
        for (line, row) in rows {
            let context = at_line(USERS_FILE, line);
            let username =
                Username::new(&row.username).map_err(|e| context(e.into()))?;
            let email = Email::new(&row.email).map_err(|e| context(e.into()))?;

            let existing =
                self.users.get_user_by_username(username.as_str()).await?;
            let created = existing.is_none();
            let user = match existing {
                Some(user) => {
                    let patch = UserPatch {
                        username: None,
                        email: Some(email),
                        first_name: row.first_name,
                        last_name: row.last_name,
                        bio: row.bio,
                        role: row.role,
                    };
                    self.users
                        .update_user(user.id, &patch)
                        .await
                        .map_err(&context)?
                }
                None => {
                    let new_user = NewUser {
                        username,
                        email,
                        first_name: row.first_name.unwrap_or_default(),
                        last_name: row.last_name.unwrap_or_default(),
                        bio: row.bio,
                        role: row.role.unwrap_or_default(),
                        confirmation_code: generate_confirmation_code(),
                    };
                    self.users.create_user(&new_user).await.map_err(&context)?
                }
            };

            ids.users.insert(row.id, user.id);
            stats.record(created);
        }
        Ok(stats)
    }

    /// Tags are matched by slug; a matched tag keeps its stored name.
    async fn import_tags(
        &self,
        kind: TagKind,
        file: &str,
        rows: Vec<(usize, TagRow)>,
        ids: &mut HashMap<i64, i64>,
    ) -> Result<TableStats> {
        let mut stats = TableStats::default();
        for (line, row) in rows {
            let context = at_line(file, line);
            let tag = NewTag {
                name: row.name,
                slug: Slug::new(&row.slug).map_err(&context)?,
            }
            .validated()
            .map_err(&context)?;

            let existing =
                self.catalog.get_tag_by_slug(kind, tag.slug.as_str()).await?;
            let created = existing.is_none();
            let stored = match existing {
                Some(stored) => stored,
                None => {
                    self.catalog.create_tag(kind, &tag).await.map_err(&context)?
                }
            };

            ids.insert(row.id, stored.id);
            stats.record(created);
        }
        Ok(stats)
    }

    /// Titles are matched by exact name and year. Genre links come from
    /// their own table, so a matched title keeps its genres here.
    async fn import_titles(
        &self,
        rows: Vec<(usize, TitleRow)>,
        ids: &mut IdMap,
    ) -> Result<TableStats> {
        let current_year = Utc::now().year();
        let mut stats = TableStats::default();
        for (line, row) in rows {
            let context = at_line(TITLES_FILE, line);
            let category_id = row
                .category
                .map(|id| {
                    resolve(&ids.categories, TITLES_FILE, line, "category", id)
                })
                .transpose()?;
            let name = validate_name("name", &row.name).map_err(&context)?;
            let year =
                validate_year(row.year, current_year).map_err(&context)?;

            let filter = TitleFilter {
                name: Some(name.clone()),
                year: Some(year),
                ..TitleFilter::default()
            };
            let existing = self
                .catalog
                .list_title_views(&filter)
                .await?
                .into_iter()
                .find(|view| view.name == name);

            let mut record = TitleRecord {
                name,
                year,
                description: row.description.unwrap_or_default(),
                category_id,
                genre_ids: Vec::new(),
            };

            let id = match existing {
                Some(view) => {
                    record.genre_ids =
                        view.genre.iter().map(|genre| genre.id).collect();
                    self.catalog
                        .update_title(view.id, &record)
                        .await
                        .map_err(&context)?;
                    stats.record(false);
                    view.id
                }
                None => {
                    let id = self
                        .catalog
                        .create_title(&record)
                        .await
                        .map_err(&context)?;
                    stats.record(true);
                    id
                }
            };
            ids.titles.insert(row.id, id);
        }
        Ok(stats)
    }

    async fn import_genre_links(
        &self,
        rows: Vec<(usize, GenreLinkRow)>,
        ids: &IdMap,
    ) -> Result<TableStats> {
        let mut links: Vec<(TitleId, Vec<i64>)> = Vec::new();
        for (line, row) in rows {
            let title_id =
                resolve(&ids.titles, GENRE_LINKS_FILE, line, "title", row.title_id)?;
            let genre_id =
                resolve(&ids.genres, GENRE_LINKS_FILE, line, "genre", row.genre_id)?;
            match links.iter_mut().find(|(id, _)| *id == title_id) {
                Some((_, genres)) => genres.push(genre_id),
                None => links.push((title_id, vec![genre_id])),
            }
        }

        let mut stats = TableStats::default();
        for (title_id, genre_ids) in links {
            let title = self.catalog.get_title(title_id).await?.ok_or_else(|| {
                DomainError::Import(format!("title {title_id} vanished during import"))
            })?;

            let mut record = TitleRecord {
                name: title.name,
                year: title.year,
                description: title.description,
                category_id: title.category_id,
                genre_ids: title.genre_ids,
            };
            let mut added = false;
            for genre_id in genre_ids {
                if record.genre_ids.contains(&genre_id) {
                    stats.record(false);
                } else {
                    record.genre_ids.push(genre_id);
                    stats.record(true);
                    added = true;
                }
            }
            if added {
                self.catalog.update_title(title_id, &record).await?;
            }
        }
        Ok(stats)
    }

    /// Reviews are matched by author and title, the pair the store keeps
    /// unique.
    async fn import_reviews(
        &self,
        rows: Vec<(usize, ReviewRow)>,
        ids: &mut IdMap,
    ) -> Result<TableStats> {
        let mut stats = TableStats::default();
        for (line, row) in rows {
            let context = at_line(REVIEWS_FILE, line);
            let title_id =
                resolve(&ids.titles, REVIEWS_FILE, line, "title", row.title_id)?;
            let author_id =
                resolve(&ids.users, REVIEWS_FILE, line, "author", row.author)?;
            let draft = ReviewDraft {
                text: row.text.filter(|text| !text.is_empty()),
                score: Score::new(row.score).map_err(&context)?,
            };
            draft.validate().map_err(&context)?;

            let existing = self
                .reviews
                .find_review_by_author(title_id, author_id)
                .await?;
            let created = existing.is_none();
            let review = match existing {
                Some(review) => self
                    .reviews
                    .update_review(review.id, &ReviewPatch::from(draft))
                    .await
                    .map_err(&context)?,
                None => self
                    .reviews
                    .create_review(title_id, author_id, &draft)
                    .await
                    .map_err(&context)?,
            };

            ids.reviews.insert(row.id, review.id);
            stats.record(created);
        }
        Ok(stats)
    }

    /// Comments have no unique key; an identical comment by the same author
    /// on the same review counts as already imported.
    async fn import_comments(
        &self,
        rows: Vec<(usize, CommentRow)>,
        ids: &IdMap,
    ) -> Result<TableStats> {
        let mut stats = TableStats::default();
        for (line, row) in rows {
            let context = at_line(COMMENTS_FILE, line);
            let review_id =
                resolve(&ids.reviews, COMMENTS_FILE, line, "review", row.review_id)?;
            let author_id =
                resolve(&ids.users, COMMENTS_FILE, line, "author", row.author)?;
            let draft = CommentDraft { text: row.text };
            draft.validate().map_err(&context)?;

            let exists = self
                .reviews
                .list_comments(review_id)
                .await?
                .iter()
                .any(|c| c.author_id == author_id && c.text == draft.text);
            if !exists {
                self.reviews
                    .create_comment(review_id, author_id, &draft.text)
                    .await
                    .map_err(&context)?;
            }
            stats.record(!exists);
        }
        Ok(stats)
    }
}
