//! Service-level behaviour of the review subsystem over the in-memory store.

mod support;

use anyhow::Result;
use serde_json::json;

use support::Harness;
use yamdb_core::DomainError;
use yamdb_core::application::accounts::TokenRequest;
use yamdb_core::database::ports::catalog::TagKind;
use yamdb_core::domain::catalog::{NewTag, Slug, TitleDraft, TitleView};
use yamdb_core::domain::reviews::{CommentDraft, ReviewDraft, ReviewPatch};
use yamdb_core::domain::users::{User, UserRole};

fn review(score: i32) -> Result<ReviewDraft> {
    Ok(serde_json::from_value(json!({ "text": "seen it", "score": score }))?)
}

fn comment(text: &str) -> CommentDraft {
    CommentDraft {
        text: text.to_string(),
    }
}

async fn seed_title(h: &Harness, admin: &User) -> Result<TitleView> {
    h.catalog
        .create_tag(
            Some(admin),
            TagKind::Category,
            NewTag {
                name: "Films".into(),
                slug: Slug::new("films")?,
            },
        )
        .await?;

    let draft = TitleDraft {
        name: "Mirror".into(),
        year: 1975,
        description: String::new(),
        category: Some(Slug::new("films")?),
        genre: Vec::new(),
    };
    Ok(h.catalog.create_title(Some(admin), draft).await?)
}

#[tokio::test]
async fn confirmation_code_round_trip() -> Result<()> {
    let h = Harness::new();
    h.user("bob", UserRole::User).await?;

    let code = h
        .last_code_for("bob@example.com")
        .await
        .expect("code was mailed");

    let wrong = h
        .accounts
        .obtain_token(TokenRequest {
            username: "bob".into(),
            confirmation_code: "not-the-code".into(),
        })
        .await;
    assert!(matches!(wrong, Err(DomainError::Validation(_))));

    let pair = h
        .accounts
        .obtain_token(TokenRequest {
            username: "bob".into(),
            confirmation_code: code,
        })
        .await?;
    assert_eq!(pair.access, "access:bob");
    Ok(())
}

#[tokio::test]
async fn rating_tracks_reviews() -> Result<()> {
    let h = Harness::new();
    let admin = h.user("admin", UserRole::Admin).await?;
    let bob = h.user("bob", UserRole::User).await?;
    let ann = h.user("ann", UserRole::User).await?;
    let title = seed_title(&h, &admin).await?;
    assert_eq!(title.rating, None);

    h.reviews.create_review(Some(&bob), title.id, review(8)?).await?;
    h.reviews.create_review(Some(&ann), title.id, review(10)?).await?;
    assert_eq!(h.catalog.get_title(title.id).await?.rating, Some(9.0));

    let listed = h.reviews.list_reviews(title.id).await?;
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].author, "ann", "newest first");
    Ok(())
}

#[tokio::test]
async fn second_review_by_same_author_conflicts() -> Result<()> {
    let h = Harness::new();
    let admin = h.user("admin", UserRole::Admin).await?;
    let bob = h.user("bob", UserRole::User).await?;
    let title = seed_title(&h, &admin).await?;

    h.reviews.create_review(Some(&bob), title.id, review(7)?).await?;
    let err = h
        .reviews
        .create_review(Some(&bob), title.id, review(2)?)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    let listed = h.reviews.list_reviews(title.id).await?;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].score.value(), 7);
    Ok(())
}

#[tokio::test]
async fn anonymous_actors_read_but_do_not_write() -> Result<()> {
    let h = Harness::new();
    let admin = h.user("admin", UserRole::Admin).await?;
    let title = seed_title(&h, &admin).await?;

    let err = h
        .reviews
        .create_review(None, title.id, review(5)?)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Unauthenticated(_)));
    assert!(h.reviews.list_reviews(title.id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn missing_parents_are_not_found() -> Result<()> {
    let h = Harness::new();
    let bob = h.user("bob", UserRole::User).await?;

    let err = h
        .reviews
        .create_review(Some(&bob), 404, review(5)?)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));

    let err = h
        .reviews
        .create_comment(Some(&bob), 404, 1, comment("hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn review_must_belong_to_title_in_path() -> Result<()> {
    let h = Harness::new();
    let admin = h.user("admin", UserRole::Admin).await?;
    let bob = h.user("bob", UserRole::User).await?;
    let title = seed_title(&h, &admin).await?;
    let other = h
        .catalog
        .create_title(
            Some(&admin),
            TitleDraft {
                name: "Nostalghia".into(),
                year: 1983,
                description: String::new(),
                category: None,
                genre: Vec::new(),
            },
        )
        .await?;

    let created = h
        .reviews
        .create_review(Some(&bob), title.id, review(9)?)
        .await?;

    let err = h
        .reviews
        .create_comment(Some(&bob), other.id, created.id, comment("hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn moderators_may_remove_other_peoples_comments() -> Result<()> {
    let h = Harness::new();
    let admin = h.user("admin", UserRole::Admin).await?;
    let bob = h.user("bob", UserRole::User).await?;
    let ann = h.user("ann", UserRole::User).await?;
    let moderator = h.user("mod", UserRole::Moderator).await?;
    let title = seed_title(&h, &admin).await?;

    let r = h
        .reviews
        .create_review(Some(&bob), title.id, review(6)?)
        .await?;
    let c = h
        .reviews
        .create_comment(Some(&bob), title.id, r.id, comment("first!"))
        .await?;

    // Anyone reads.
    let read = h.reviews.get_comment(title.id, r.id, c.id).await?;
    assert_eq!(read.author, "bob");

    let err = h
        .reviews
        .delete_comment(Some(&ann), title.id, r.id, c.id)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    h.reviews
        .delete_comment(Some(&moderator), title.id, r.id, c.id)
        .await?;
    assert!(h.reviews.list_comments(title.id, r.id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn authors_edit_their_own_reviews() -> Result<()> {
    let h = Harness::new();
    let admin = h.user("admin", UserRole::Admin).await?;
    let bob = h.user("bob", UserRole::User).await?;
    let ann = h.user("ann", UserRole::User).await?;
    let title = seed_title(&h, &admin).await?;
    let r = h
        .reviews
        .create_review(Some(&bob), title.id, review(4)?)
        .await?;

    let patch: ReviewPatch = serde_json::from_value(json!({ "score": 6 }))?;
    let err = h
        .reviews
        .update_review(Some(&ann), title.id, r.id, patch.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    let updated = h
        .reviews
        .update_review(Some(&bob), title.id, r.id, patch)
        .await?;
    assert_eq!(updated.score.value(), 6);
    assert_eq!(updated.text.as_deref(), Some("seen it"));
    assert_eq!(updated.author, "bob");
    Ok(())
}

#[tokio::test]
async fn deleting_a_title_removes_its_discussion() -> Result<()> {
    let h = Harness::new();
    let admin = h.user("admin", UserRole::Admin).await?;
    let bob = h.user("bob", UserRole::User).await?;
    let title = seed_title(&h, &admin).await?;
    let r = h
        .reviews
        .create_review(Some(&bob), title.id, review(3)?)
        .await?;
    h.reviews
        .create_comment(Some(&bob), title.id, r.id, comment("meh"))
        .await?;

    h.catalog.delete_title(Some(&admin), title.id).await?;

    assert!(matches!(
        h.reviews.list_reviews(title.id).await,
        Err(DomainError::NotFound(_))
    ));
    assert!(
        h.uow
            .reviews
            .list_comments(r.id)
            .await?
            .is_empty()
    );
    Ok(())
}

#[tokio::test]
async fn deleting_a_category_keeps_its_titles() -> Result<()> {
    let h = Harness::new();
    let admin = h.user("admin", UserRole::Admin).await?;
    let title = seed_title(&h, &admin).await?;

    h.catalog
        .delete_tag(Some(&admin), TagKind::Category, "films")
        .await?;

    let reloaded = h.catalog.get_title(title.id).await?;
    assert!(reloaded.category.is_none());
    Ok(())
}
