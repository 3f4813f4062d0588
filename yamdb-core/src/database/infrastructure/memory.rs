//! Process-local store implementing every repository port.
//!
//! Used by tests and by servers started without a database URL. Mirrors the
//! uniqueness constraints and cascades of the PostgreSQL schema so that
//! services behave the same against either adapter.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::database::ports::catalog::{CatalogRepository, TagKind};
use crate::database::ports::reviews::ReviewsRepository;
use crate::database::ports::users::UsersRepository;
use crate::domain::catalog::{
    NewTag, Tag, Title, TitleFilter, TitleId, TitleRecord, TitleView,
};
use crate::domain::reviews::{
    Comment, CommentId, Review, ReviewDraft, ReviewId, ReviewPatch, Score,
    average_rating,
};
use crate::domain::users::{NewUser, User, UserId, UserPatch};
use crate::error::{DomainError, Result};

#[derive(Debug, Clone)]
struct StoredReview {
    id: ReviewId,
    title_id: TitleId,
    author_id: UserId,
    text: Option<String>,
    score: Score,
    pub_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct StoredComment {
    id: CommentId,
    review_id: ReviewId,
    author_id: UserId,
    text: String,
    pub_date: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i64,
    users: BTreeMap<UserId, User>,
    categories: BTreeMap<i64, Tag>,
    genres: BTreeMap<i64, Tag>,
    titles: BTreeMap<TitleId, Title>,
    reviews: BTreeMap<ReviewId, StoredReview>,
    comments: BTreeMap<CommentId, StoredComment>,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn newest_first(a: (DateTime<Utc>, i64), b: (DateTime<Utc>, i64)) -> std::cmp::Ordering {
    b.cmp(&a)
}

impl MemoryState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn tags(&self, kind: TagKind) -> &BTreeMap<i64, Tag> {
        match kind {
            TagKind::Category => &self.categories,
            TagKind::Genre => &self.genres,
        }
    }

    fn tags_mut(&mut self, kind: TagKind) -> &mut BTreeMap<i64, Tag> {
        match kind {
            TagKind::Category => &mut self.categories,
            TagKind::Genre => &mut self.genres,
        }
    }

    fn username_of(&self, id: UserId) -> String {
        self.users
            .get(&id)
            .map(|user| user.username.clone())
            .unwrap_or_default()
    }

    fn review(&self, stored: &StoredReview) -> Review {
        Review {
            id: stored.id,
            author: self.username_of(stored.author_id),
            title: stored.title_id,
            text: stored.text.clone(),
            score: stored.score,
            pub_date: stored.pub_date,
            author_id: stored.author_id,
        }
    }

    fn comment(&self, stored: &StoredComment) -> Comment {
        Comment {
            id: stored.id,
            author: self.username_of(stored.author_id),
            review: stored.review_id,
            text: stored.text.clone(),
            pub_date: stored.pub_date,
            author_id: stored.author_id,
        }
    }

    fn check_user_unique(
        &self,
        except: Option<UserId>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<()> {
        for user in self.users.values() {
            if Some(user.id) == except {
                continue;
            }
            if username.is_some_and(|name| name == user.username) {
                return Err(DomainError::conflict("username already exists"));
            }
            if email.is_some_and(|email| email == user.email) {
                return Err(DomainError::conflict("email already registered"));
            }
        }
        Ok(())
    }

    fn check_title_refs(&self, title: &TitleRecord) -> Result<()> {
        if let Some(category_id) = title.category_id
            && !self.categories.contains_key(&category_id)
        {
            return Err(DomainError::not_found(
                "referenced record no longer exists",
            ));
        }
        if title.genre_ids.iter().any(|id| !self.genres.contains_key(id)) {
            return Err(DomainError::not_found(
                "referenced record no longer exists",
            ));
        }
        Ok(())
    }

    fn remove_reviews_where(&mut self, doomed: impl Fn(&StoredReview) -> bool) {
        let review_ids: Vec<ReviewId> = self
            .reviews
            .values()
            .filter(|review| doomed(review))
            .map(|review| review.id)
            .collect();
        for id in &review_ids {
            self.reviews.remove(id);
        }
        self.comments
            .retain(|_, comment| !review_ids.contains(&comment.review_id));
    }

    fn title_view(&self, title: &Title) -> TitleView {
        let mut genre: Vec<Tag> = title
            .genre_ids
            .iter()
            .filter_map(|id| self.genres.get(id).cloned())
            .collect();
        genre.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        let rating = average_rating(
            self.reviews
                .values()
                .filter(|review| review.title_id == title.id)
                .map(|review| review.score),
        );

        TitleView {
            id: title.id,
            name: title.name.clone(),
            year: title.year,
            rating,
            description: title.description.clone(),
            genre,
            category: title
                .category_id
                .and_then(|id| self.categories.get(&id).cloned()),
        }
    }

    fn matches(&self, title: &Title, filter: &TitleFilter) -> bool {
        if let Some(slug) = &filter.category {
            let category_slug = title
                .category_id
                .and_then(|id| self.categories.get(&id))
                .map(|tag| tag.slug.as_str());
            if category_slug != Some(slug.as_str()) {
                return false;
            }
        }
        if let Some(slug) = &filter.genre {
            let has_genre = title
                .genre_ids
                .iter()
                .filter_map(|id| self.genres.get(id))
                .any(|tag| &tag.slug == slug);
            if !has_genre {
                return false;
            }
        }
        if let Some(name) = &filter.name
            && !contains_ci(&title.name, name)
        {
            return false;
        }
        if let Some(year) = filter.year
            && title.year != year
        {
            return false;
        }
        true
    }
}

fn dedup_sorted(mut ids: Vec<i64>) -> Vec<i64> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// In-memory implementation of the users, catalog and reviews ports.
///
/// Clones share the same underlying state.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsersRepository for InMemoryStore {
    async fn create_user(&self, user: &NewUser) -> Result<User> {
        let mut state = self.state.lock().await;
        state.check_user_unique(
            None,
            Some(user.username.as_str()),
            Some(user.email.as_str()),
        )?;

        let id = state.allocate_id();
        let record = User {
            id,
            username: user.username.as_str().to_string(),
            email: user.email.as_str().to_string(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            bio: user.bio.clone(),
            role: user.role,
            is_staff: false,
            is_superuser: false,
            confirmation_code: user.confirmation_code.clone(),
            date_joined: Utc::now(),
        };
        state.users.insert(id, record.clone());
        Ok(record)
    }

    async fn get_user_by_id(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn get_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.values().find(|user| user.email == email).cloned())
    }

    async fn list_users(&self, search: Option<&str>) -> Result<Vec<User>> {
        let state = self.state.lock().await;
        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|user| search.is_none_or(|s| contains_ci(&user.username, s)))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn update_user(&self, id: UserId, patch: &UserPatch) -> Result<User> {
        let mut state = self.state.lock().await;
        state.check_user_unique(
            Some(id),
            patch.username.as_ref().map(|u| u.as_str()),
            patch.email.as_ref().map(|e| e.as_str()),
        )?;

        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("user {id}")))?;

        if let Some(username) = &patch.username {
            user.username = username.as_str().to_string();
        }
        if let Some(email) = &patch.email {
            user.email = email.as_str().to_string();
        }
        if let Some(first_name) = &patch.first_name {
            user.first_name = first_name.clone();
        }
        if let Some(last_name) = &patch.last_name {
            user.last_name = last_name.clone();
        }
        if let Some(bio) = &patch.bio {
            user.bio = Some(bio.clone());
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        Ok(user.clone())
    }

    async fn set_confirmation_code(&self, id: UserId, code: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("user {id}")))?;
        user.confirmation_code = code.to_string();
        Ok(())
    }

    async fn delete_user(&self, id: UserId) -> Result<bool> {
        let mut state = self.state.lock().await;
        if state.users.remove(&id).is_none() {
            return Ok(false);
        }
        state.remove_reviews_where(|review| review.author_id == id);
        state.comments.retain(|_, comment| comment.author_id != id);
        Ok(true)
    }
}

#[async_trait]
impl CatalogRepository for InMemoryStore {
    async fn create_tag(&self, kind: TagKind, tag: &NewTag) -> Result<Tag> {
        let mut state = self.state.lock().await;
        if state
            .tags(kind)
            .values()
            .any(|existing| existing.slug == tag.slug.as_str())
        {
            return Err(DomainError::conflict(format!(
                "{} with this slug already exists",
                kind.label()
            )));
        }

        let id = state.allocate_id();
        let record = Tag {
            id,
            name: tag.name.clone(),
            slug: tag.slug.as_str().to_string(),
        };
        state.tags_mut(kind).insert(id, record.clone());
        Ok(record)
    }

    async fn list_tags(
        &self,
        kind: TagKind,
        search: Option<&str>,
    ) -> Result<Vec<Tag>> {
        let state = self.state.lock().await;
        let mut tags: Vec<Tag> = state
            .tags(kind)
            .values()
            .filter(|tag| search.is_none_or(|s| contains_ci(&tag.name, s)))
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(tags)
    }

    async fn get_tag_by_slug(
        &self,
        kind: TagKind,
        slug: &str,
    ) -> Result<Option<Tag>> {
        let state = self.state.lock().await;
        Ok(state.tags(kind).values().find(|tag| tag.slug == slug).cloned())
    }

    async fn delete_tag(&self, kind: TagKind, slug: &str) -> Result<bool> {
        let mut state = self.state.lock().await;
        let Some(id) = state
            .tags(kind)
            .values()
            .find(|tag| tag.slug == slug)
            .map(|tag| tag.id)
        else {
            return Ok(false);
        };

        state.tags_mut(kind).remove(&id);
        for title in state.titles.values_mut() {
            match kind {
                TagKind::Category => {
                    if title.category_id == Some(id) {
                        title.category_id = None;
                    }
                }
                TagKind::Genre => title.genre_ids.retain(|genre| *genre != id),
            }
        }
        Ok(true)
    }

    async fn create_title(&self, title: &TitleRecord) -> Result<TitleId> {
        let mut state = self.state.lock().await;
        state.check_title_refs(title)?;

        let id = state.allocate_id();
        state.titles.insert(
            id,
            Title {
                id,
                name: title.name.clone(),
                year: title.year,
                description: title.description.clone(),
                category_id: title.category_id,
                genre_ids: dedup_sorted(title.genre_ids.clone()),
            },
        );
        Ok(id)
    }

    async fn get_title(&self, id: TitleId) -> Result<Option<Title>> {
        Ok(self.state.lock().await.titles.get(&id).cloned())
    }

    async fn update_title(
        &self,
        id: TitleId,
        title: &TitleRecord,
    ) -> Result<bool> {
        let mut state = self.state.lock().await;
        if !state.titles.contains_key(&id) {
            return Ok(false);
        }
        state.check_title_refs(title)?;

        if let Some(stored) = state.titles.get_mut(&id) {
            stored.name = title.name.clone();
            stored.year = title.year;
            stored.description = title.description.clone();
            stored.category_id = title.category_id;
            stored.genre_ids = dedup_sorted(title.genre_ids.clone());
        }
        Ok(true)
    }

    async fn delete_title(&self, id: TitleId) -> Result<bool> {
        let mut state = self.state.lock().await;
        if state.titles.remove(&id).is_none() {
            return Ok(false);
        }
        state.remove_reviews_where(|review| review.title_id == id);
        Ok(true)
    }

    async fn get_title_view(&self, id: TitleId) -> Result<Option<TitleView>> {
        let state = self.state.lock().await;
        Ok(state.titles.get(&id).map(|title| state.title_view(title)))
    }

    async fn list_title_views(
        &self,
        filter: &TitleFilter,
    ) -> Result<Vec<TitleView>> {
        let state = self.state.lock().await;
        Ok(state
            .titles
            .values()
            .filter(|title| state.matches(title, filter))
            .map(|title| state.title_view(title))
            .collect())
    }
}

#[async_trait]
impl ReviewsRepository for InMemoryStore {
    async fn create_review(
        &self,
        title_id: TitleId,
        author_id: UserId,
        draft: &ReviewDraft,
    ) -> Result<Review> {
        let mut state = self.state.lock().await;
        if !state.titles.contains_key(&title_id)
            || !state.users.contains_key(&author_id)
        {
            return Err(DomainError::not_found(
                "referenced record no longer exists",
            ));
        }
        if state.reviews.values().any(|review| {
            review.title_id == title_id && review.author_id == author_id
        }) {
            return Err(DomainError::conflict(
                "you have already reviewed this title",
            ));
        }

        let id = state.allocate_id();
        let stored = StoredReview {
            id,
            title_id,
            author_id,
            text: draft.text.clone(),
            score: draft.score,
            pub_date: Utc::now(),
        };
        let review = state.review(&stored);
        state.reviews.insert(id, stored);
        Ok(review)
    }

    async fn find_review_by_author(
        &self,
        title_id: TitleId,
        author_id: UserId,
    ) -> Result<Option<Review>> {
        let state = self.state.lock().await;
        Ok(state
            .reviews
            .values()
            .find(|review| {
                review.title_id == title_id && review.author_id == author_id
            })
            .map(|review| state.review(review)))
    }

    async fn get_review(
        &self,
        title_id: TitleId,
        review_id: ReviewId,
    ) -> Result<Option<Review>> {
        let state = self.state.lock().await;
        Ok(state
            .reviews
            .get(&review_id)
            .filter(|review| review.title_id == title_id)
            .map(|review| state.review(review)))
    }

    async fn list_reviews(&self, title_id: TitleId) -> Result<Vec<Review>> {
        let state = self.state.lock().await;
        let mut reviews: Vec<&StoredReview> = state
            .reviews
            .values()
            .filter(|review| review.title_id == title_id)
            .collect();
        reviews.sort_by(|a, b| newest_first((a.pub_date, a.id), (b.pub_date, b.id)));
        Ok(reviews.into_iter().map(|review| state.review(review)).collect())
    }

    async fn update_review(
        &self,
        review_id: ReviewId,
        patch: &ReviewPatch,
    ) -> Result<Review> {
        let mut state = self.state.lock().await;
        let stored = state.reviews.get_mut(&review_id).ok_or_else(|| {
            DomainError::not_found(format!("review {review_id}"))
        })?;

        if let Some(text) = &patch.text {
            stored.text = Some(text.clone());
        }
        if let Some(score) = patch.score {
            stored.score = score;
        }
        let stored = stored.clone();
        Ok(state.review(&stored))
    }

    async fn delete_review(&self, review_id: ReviewId) -> Result<bool> {
        let mut state = self.state.lock().await;
        if !state.reviews.contains_key(&review_id) {
            return Ok(false);
        }
        state.remove_reviews_where(|review| review.id == review_id);
        Ok(true)
    }

    async fn create_comment(
        &self,
        review_id: ReviewId,
        author_id: UserId,
        text: &str,
    ) -> Result<Comment> {
        let mut state = self.state.lock().await;
        if !state.reviews.contains_key(&review_id)
            || !state.users.contains_key(&author_id)
        {
            return Err(DomainError::not_found(
                "referenced record no longer exists",
            ));
        }

        let id = state.allocate_id();
        let stored = StoredComment {
            id,
            review_id,
            author_id,
            text: text.to_string(),
            pub_date: Utc::now(),
        };
        let comment = state.comment(&stored);
        state.comments.insert(id, stored);
        Ok(comment)
    }

    async fn get_comment(
        &self,
        review_id: ReviewId,
        comment_id: CommentId,
    ) -> Result<Option<Comment>> {
        let state = self.state.lock().await;
        Ok(state
            .comments
            .get(&comment_id)
            .filter(|comment| comment.review_id == review_id)
            .map(|comment| state.comment(comment)))
    }

    async fn list_comments(&self, review_id: ReviewId) -> Result<Vec<Comment>> {
        let state = self.state.lock().await;
        let mut comments: Vec<&StoredComment> = state
            .comments
            .values()
            .filter(|comment| comment.review_id == review_id)
            .collect();
        comments.sort_by(|a, b| newest_first((a.pub_date, a.id), (b.pub_date, b.id)));
        Ok(comments
            .into_iter()
            .map(|comment| state.comment(comment))
            .collect())
    }

    async fn update_comment(
        &self,
        comment_id: CommentId,
        text: &str,
    ) -> Result<Comment> {
        let mut state = self.state.lock().await;
        let stored = state.comments.get_mut(&comment_id).ok_or_else(|| {
            DomainError::not_found(format!("comment {comment_id}"))
        })?;
        stored.text = text.to_string();
        let stored = stored.clone();
        Ok(state.comment(&stored))
    }

    async fn delete_comment(&self, comment_id: CommentId) -> Result<bool> {
        let mut state = self.state.lock().await;
        Ok(state.comments.remove(&comment_id).is_some())
    }
}
