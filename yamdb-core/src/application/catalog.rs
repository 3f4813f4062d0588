//! Category, genre and title management.

use std::sync::Arc;

use chrono::{Datelike, Utc};
use tracing::info;

use crate::application::unit_of_work::AppUnitOfWork;
use crate::database::ports::catalog::{CatalogRepository, TagKind};
use crate::domain::catalog::{
    NewTag, Slug, Tag, Title, TitleDraft, TitleFilter, TitleId, TitlePatch,
    TitleRecord, TitleView, validate_name, validate_year,
};
use crate::domain::policy::{Access, Policy};
use crate::domain::users::User;
use crate::error::{DomainError, Result};

fn current_year() -> i32 {
    Utc::now().year()
}

#[derive(Clone)]
pub struct CatalogService {
    catalog: Arc<dyn CatalogRepository>,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService")
            .field("catalog_repo", &Arc::strong_count(&self.catalog))
            .finish()
    }
}

impl CatalogService {
    pub fn new(uow: &AppUnitOfWork) -> Self {
        Self {
            catalog: uow.catalog.clone(),
        }
    }

    pub async fn list_tags(
        &self,
        kind: TagKind,
        search: Option<&str>,
    ) -> Result<Vec<Tag>> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        self.catalog.list_tags(kind, search).await
    }

    pub async fn create_tag(
        &self,
        actor: Option<&User>,
        kind: TagKind,
        tag: NewTag,
    ) -> Result<Tag> {
        Policy::AdminOrReadOnly.authorize(actor, Access::Unsafe)?;
        let tag = tag.validated()?;

        if self
            .catalog
            .get_tag_by_slug(kind, tag.slug.as_str())
            .await?
            .is_some()
        {
            return Err(DomainError::conflict(format!(
                "{} with this slug already exists",
                kind.label()
            )));
        }

        self.catalog.create_tag(kind, &tag).await
    }

    pub async fn delete_tag(
        &self,
        actor: Option<&User>,
        kind: TagKind,
        slug: &str,
    ) -> Result<()> {
        Policy::AdminOrReadOnly.authorize(actor, Access::Unsafe)?;

        if !self.catalog.delete_tag(kind, slug).await? {
            return Err(DomainError::not_found(format!(
                "{} {slug}",
                kind.label()
            )));
        }
        info!("Deleted {} {}", kind.label(), slug);
        Ok(())
    }

    pub async fn list_titles(
        &self,
        filter: &TitleFilter,
    ) -> Result<Vec<TitleView>> {
        self.catalog.list_title_views(filter).await
    }

    pub async fn get_title(&self, id: TitleId) -> Result<TitleView> {
        self.catalog
            .get_title_view(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("title {id}")))
    }

    pub async fn create_title(
        &self,
        actor: Option<&User>,
        draft: TitleDraft,
    ) -> Result<TitleView> {
        Policy::AdminOrReadOnly.authorize(actor, Access::Unsafe)?;

        let record = TitleRecord {
            name: validate_name("name", &draft.name)?,
            year: validate_year(draft.year, current_year())?,
            description: draft.description,
            category_id: self.resolve_category(draft.category.as_ref()).await?,
            genre_ids: self.resolve_genres(&draft.genre).await?,
        };

        let id = self.catalog.create_title(&record).await?;
        self.get_title(id).await
    }

    /// Partial update; fields absent from the patch keep their values.
    pub async fn update_title(
        &self,
        actor: Option<&User>,
        id: TitleId,
        patch: TitlePatch,
    ) -> Result<TitleView> {
        Policy::AdminOrReadOnly.authorize(actor, Access::Unsafe)?;

        let current: Title = self
            .catalog
            .get_title(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("title {id}")))?;

        let name = match patch.name {
            Some(name) => validate_name("name", &name)?,
            None => current.name,
        };
        let year = match patch.year {
            Some(year) => validate_year(year, current_year())?,
            None => current.year,
        };
        let category_id = match patch.category {
            Some(category) => self.resolve_category(category.as_ref()).await?,
            None => current.category_id,
        };
        let genre_ids = match patch.genre {
            Some(genre) => self.resolve_genres(&genre).await?,
            None => current.genre_ids,
        };

        let record = TitleRecord {
            name,
            year,
            description: patch.description.unwrap_or(current.description),
            category_id,
            genre_ids,
        };

        if !self.catalog.update_title(id, &record).await? {
            return Err(DomainError::not_found(format!("title {id}")));
        }
        self.get_title(id).await
    }

    pub async fn replace_title(
        &self,
        actor: Option<&User>,
        id: TitleId,
        draft: TitleDraft,
    ) -> Result<TitleView> {
        self.update_title(actor, id, draft.into()).await
    }

    pub async fn delete_title(
        &self,
        actor: Option<&User>,
        id: TitleId,
    ) -> Result<()> {
        Policy::AdminOrReadOnly.authorize(actor, Access::Unsafe)?;

        if !self.catalog.delete_title(id).await? {
            return Err(DomainError::not_found(format!("title {id}")));
        }
        info!("Deleted title {id}");
        Ok(())
    }

    async fn resolve_category(&self, slug: Option<&Slug>) -> Result<Option<i64>> {
        let Some(slug) = slug else {
            return Ok(None);
        };
        let tag = self
            .catalog
            .get_tag_by_slug(TagKind::Category, slug.as_str())
            .await?
            .ok_or_else(|| {
                DomainError::validation(format!("category '{slug}' does not exist"))
            })?;
        Ok(Some(tag.id))
    }

    async fn resolve_genres(&self, slugs: &[Slug]) -> Result<Vec<i64>> {
        let mut ids = Vec::with_capacity(slugs.len());
        for slug in slugs {
            let tag = self
                .catalog
                .get_tag_by_slug(TagKind::Genre, slug.as_str())
                .await?
                .ok_or_else(|| {
                    DomainError::validation(format!("genre '{slug}' does not exist"))
                })?;
            if !ids.contains(&tag.id) {
                ids.push(tag.id);
            }
        }
        Ok(ids)
    }
}
