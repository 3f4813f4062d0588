use async_trait::async_trait;

use crate::domain::catalog::{
    NewTag, Tag, Title, TitleFilter, TitleId, TitleRecord, TitleView,
};
use crate::error::Result;

/// Categories and genres share one shape and differ only in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Category,
    Genre,
}

impl TagKind {
    pub fn label(self) -> &'static str {
        match self {
            TagKind::Category => "category",
            TagKind::Genre => "genre",
        }
    }
}

// Catalog store. Duplicate slugs surface as `DomainError::Conflict`.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn create_tag(&self, kind: TagKind, tag: &NewTag) -> Result<Tag>;
    /// Ordered by name; `search` is a case-insensitive substring of the name
    async fn list_tags(
        &self,
        kind: TagKind,
        search: Option<&str>,
    ) -> Result<Vec<Tag>>;
    async fn get_tag_by_slug(
        &self,
        kind: TagKind,
        slug: &str,
    ) -> Result<Option<Tag>>;
    /// Deleting a category nulls the reference on its titles; deleting a
    /// genre drops it from every title's genre set.
    async fn delete_tag(&self, kind: TagKind, slug: &str) -> Result<bool>;

    async fn create_title(&self, title: &TitleRecord) -> Result<TitleId>;
    async fn get_title(&self, id: TitleId) -> Result<Option<Title>>;
    async fn update_title(
        &self,
        id: TitleId,
        title: &TitleRecord,
    ) -> Result<bool>;
    /// Cascades to reviews and their comments
    async fn delete_title(&self, id: TitleId) -> Result<bool>;

    /// Reader representation with the rating computed at read time
    async fn get_title_view(&self, id: TitleId) -> Result<Option<TitleView>>;
    async fn list_title_views(
        &self,
        filter: &TitleFilter,
    ) -> Result<Vec<TitleView>>;
}
