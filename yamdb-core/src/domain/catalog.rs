//! Catalog entities: categories, genres and titles.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::error::{DomainError, Result};

pub type CategoryId = i64;
pub type GenreId = i64;
pub type TitleId = i64;

const NAME_MAX_LEN: usize = 256;
const SLUG_MAX_LEN: usize = 50;

static SLUG_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-a-zA-Z0-9_]+$").expect("slug pattern compiles")
});

/// URL-safe unique identifier of a category or genre.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    pub fn new(slug: impl AsRef<str>) -> Result<Self> {
        let slug = slug.as_ref().trim();
        if slug.is_empty() {
            return Err(DomainError::validation("slug is required"));
        }
        if slug.len() > SLUG_MAX_LEN {
            return Err(DomainError::validation(
                "slug too long: maximum 50 characters allowed",
            ));
        }
        if !SLUG_CHARS.is_match(slug) {
            return Err(DomainError::validation(
                "slug may contain only latin letters, digits, hyphens and underscores",
            ));
        }
        Ok(Self(slug.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Slug {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Slug> for String {
    fn from(value: Slug) -> Self {
        value.0
    }
}

/// Trim and bound a display name.
pub fn validate_name(field: &str, name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    if name.chars().count() > NAME_MAX_LEN {
        return Err(DomainError::validation(format!(
            "{field} too long: maximum {NAME_MAX_LEN} characters allowed"
        )));
    }
    Ok(name.to_string())
}

/// Release year must be positive and not after `current_year`.
pub fn validate_year(year: i32, current_year: i32) -> Result<i32> {
    if year <= 0 || year > current_year {
        return Err(DomainError::validation(format!(
            "invalid year {year}: expected 1..={current_year}"
        )));
    }
    Ok(year)
}

/// Shared shape of categories and genres.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    #[serde(skip_serializing)]
    pub id: i64,
    pub name: String,
    pub slug: String,
}

pub type Category = Tag;
pub type Genre = Tag;

/// Validated input for a new category or genre.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTag {
    pub name: String,
    pub slug: Slug,
}

impl NewTag {
    pub fn validated(self) -> Result<Self> {
        Ok(Self {
            name: validate_name("name", &self.name)?,
            slug: self.slug,
        })
    }
}

/// Stored title with references by id.
#[derive(Debug, Clone, PartialEq)]
pub struct Title {
    pub id: TitleId,
    pub name: String,
    pub year: i32,
    pub description: String,
    pub category_id: Option<CategoryId>,
    pub genre_ids: Vec<GenreId>,
}

/// Writer representation: category and genres by slug.
#[derive(Debug, Clone, Deserialize)]
pub struct TitleDraft {
    pub name: String,
    pub year: i32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<Slug>,
    #[serde(default)]
    pub genre: Vec<Slug>,
}

/// Partial writer representation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TitlePatch {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    /// `Some(None)` clears the category
    #[serde(default, deserialize_with = "double_option")]
    pub category: Option<Option<Slug>>,
    pub genre: Option<Vec<Slug>>,
}

impl From<TitleDraft> for TitlePatch {
    fn from(draft: TitleDraft) -> Self {
        Self {
            name: Some(draft.name),
            year: Some(draft.year),
            description: Some(draft.description),
            category: Some(draft.category),
            genre: Some(draft.genre),
        }
    }
}

fn double_option<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Option<Slug>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<Slug>::deserialize(deserializer).map(Some)
}

/// Title with references resolved, ready to persist.
#[derive(Debug, Clone)]
pub struct TitleRecord {
    pub name: String,
    pub year: i32,
    pub description: String,
    pub category_id: Option<CategoryId>,
    pub genre_ids: Vec<GenreId>,
}

/// Reader representation with expanded references and computed rating.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleView {
    pub id: TitleId,
    pub name: String,
    pub year: i32,
    pub rating: Option<f64>,
    pub description: String,
    pub genre: Vec<Genre>,
    pub category: Option<Category>,
}

/// Title listing filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TitleFilter {
    /// Genre slug
    pub genre: Option<String>,
    /// Category slug
    pub category: Option<String>,
    /// Case-insensitive substring of the name
    pub name: Option<String>,
    pub year: Option<i32>,
}
