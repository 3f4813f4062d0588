//! PostgreSQL adapter behaviour: constraints, cascades and computed ratings.
//!
//! Needs `DATABASE_URL`; run with `cargo test -- --ignored`.

use anyhow::Result;
use sqlx::PgPool;

use yamdb_core::DomainError;
use yamdb_core::database::infrastructure::postgres::{
    PostgresCatalogRepository, PostgresReviewsRepository,
    PostgresUsersRepository,
};
use yamdb_core::database::ports::catalog::{CatalogRepository, TagKind};
use yamdb_core::database::ports::reviews::ReviewsRepository;
use yamdb_core::database::ports::users::UsersRepository;
use yamdb_core::domain::catalog::{NewTag, Slug, TitleFilter, TitleRecord};
use yamdb_core::domain::reviews::{ReviewDraft, Score};
use yamdb_core::domain::users::{Email, NewUser, User, UserPatch, Username};

async fn seed_user(repo: &PostgresUsersRepository, name: &str) -> Result<User> {
    let user = NewUser::signup(
        Username::new(name)?,
        Email::new(format!("{name}@example.com"))?,
        "0b7c1c4e-8f43-4e0a-9b52-7f2f3c1d9e10".into(),
    );
    Ok(repo.create_user(&user).await?)
}

fn title(category_id: Option<i64>, genre_ids: Vec<i64>) -> TitleRecord {
    TitleRecord {
        name: "Andrei Rublev".into(),
        year: 1966,
        description: String::new(),
        category_id,
        genre_ids,
    }
}

fn draft(score: i32) -> Result<ReviewDraft> {
    Ok(ReviewDraft {
        text: None,
        score: Score::new(score)?,
    })
}

#[sqlx::test(migrator = "yamdb_core::MIGRATOR")]
#[ignore = "requires DATABASE_URL"]
async fn unique_identity_constraints_surface_as_conflicts(
    pool: PgPool,
) -> Result<()> {
    let users = PostgresUsersRepository::new(pool);
    let bob = seed_user(&users, "bob").await?;
    seed_user(&users, "ann").await?;

    let err = seed_user(&users, "bob").await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DomainError>(),
        Some(DomainError::Conflict(_))
    ));

    let rename = UserPatch {
        email: Some(Email::new("ann@example.com")?),
        ..UserPatch::default()
    };
    let err = users.update_user(bob.id, &rename).await.unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    let found = users.list_users(Some("BO")).await?;
    assert_eq!(found.len(), 1);
    Ok(())
}

#[sqlx::test(migrator = "yamdb_core::MIGRATOR")]
#[ignore = "requires DATABASE_URL"]
async fn title_views_and_tag_cascades(pool: PgPool) -> Result<()> {
    let catalog = PostgresCatalogRepository::new(pool.clone());
    let reviews = PostgresReviewsRepository::new(pool.clone());
    let users = PostgresUsersRepository::new(pool);

    let films = catalog
        .create_tag(
            TagKind::Category,
            &NewTag {
                name: "Films".into(),
                slug: Slug::new("films")?,
            },
        )
        .await?;
    let drama = catalog
        .create_tag(
            TagKind::Genre,
            &NewTag {
                name: "Drama".into(),
                slug: Slug::new("drama")?,
            },
        )
        .await?;
    let dup = catalog
        .create_tag(
            TagKind::Genre,
            &NewTag {
                name: "Again".into(),
                slug: Slug::new("drama")?,
            },
        )
        .await;
    assert!(matches!(dup, Err(DomainError::Conflict(_))));

    let id = catalog
        .create_title(&title(Some(films.id), vec![drama.id, drama.id]))
        .await?;

    let bob = seed_user(&users, "bob").await?;
    let ann = seed_user(&users, "ann").await?;
    reviews.create_review(id, bob.id, &draft(8)?).await?;
    reviews.create_review(id, ann.id, &draft(10)?).await?;

    let view = catalog.get_title_view(id).await?.expect("title exists");
    assert_eq!(view.rating, Some(9.0));
    assert_eq!(view.genre.len(), 1);

    let filter = TitleFilter {
        genre: Some("drama".into()),
        ..TitleFilter::default()
    };
    assert_eq!(catalog.list_title_views(&filter).await?.len(), 1);

    catalog.delete_tag(TagKind::Category, "films").await?;
    catalog.delete_tag(TagKind::Genre, "drama").await?;
    let stored = catalog.get_title(id).await?.expect("title survives");
    assert_eq!(stored.category_id, None);
    assert!(stored.genre_ids.is_empty());
    Ok(())
}

#[sqlx::test(migrator = "yamdb_core::MIGRATOR")]
#[ignore = "requires DATABASE_URL"]
async fn reviews_are_unique_and_cascade(pool: PgPool) -> Result<()> {
    let catalog = PostgresCatalogRepository::new(pool.clone());
    let reviews = PostgresReviewsRepository::new(pool.clone());
    let users = PostgresUsersRepository::new(pool);

    let id = catalog.create_title(&title(None, Vec::new())).await?;
    let bob = seed_user(&users, "bob").await?;

    let review = reviews.create_review(id, bob.id, &draft(5)?).await?;
    assert_eq!(review.author, "bob");

    let again = reviews.create_review(id, bob.id, &draft(6)?).await;
    assert!(matches!(again, Err(DomainError::Conflict(_))));

    let comment = reviews.create_comment(review.id, bob.id, "agree").await?;
    assert_eq!(comment.review, review.id);

    assert!(catalog.delete_title(id).await?);
    assert!(reviews.get_review(id, review.id).await?.is_none());
    assert!(reviews.list_comments(review.id).await?.is_empty());
    Ok(())
}

#[sqlx::test(migrator = "yamdb_core::MIGRATOR")]
#[ignore = "requires DATABASE_URL"]
async fn searches_treat_wildcards_literally(pool: PgPool) -> Result<()> {
    let catalog = PostgresCatalogRepository::new(pool.clone());
    let users = PostgresUsersRepository::new(pool);

    for (name, slug) in [("Drama", "drama"), ("100% Docs", "docs"), ("Sci_Fi", "sci-fi")] {
        catalog
            .create_tag(
                TagKind::Genre,
                &NewTag {
                    name: name.into(),
                    slug: Slug::new(slug)?,
                },
            )
            .await?;
    }

    let names = |tags: Vec<yamdb_core::domain::catalog::Tag>| {
        tags.into_iter().map(|tag| tag.name).collect::<Vec<_>>()
    };
    assert!(catalog.list_tags(TagKind::Genre, Some("a_a")).await?.is_empty());
    assert!(catalog.list_tags(TagKind::Genre, Some("D_ama")).await?.is_empty());
    assert_eq!(
        names(catalog.list_tags(TagKind::Genre, Some("%")).await?),
        vec!["100% Docs"]
    );
    assert_eq!(
        names(catalog.list_tags(TagKind::Genre, Some("i_f")).await?),
        vec!["Sci_Fi"]
    );
    assert_eq!(catalog.list_tags(TagKind::Genre, Some("DR")).await?.len(), 1);

    catalog.create_title(&title(None, Vec::new())).await?;
    let filter = |name: &str| TitleFilter {
        name: Some(name.into()),
        ..TitleFilter::default()
    };
    assert!(catalog.list_title_views(&filter("Andrei_Rublev")).await?.is_empty());
    assert!(catalog.list_title_views(&filter("%")).await?.is_empty());
    assert_eq!(catalog.list_title_views(&filter("rublev")).await?.len(), 1);

    seed_user(&users, "bob").await?;
    seed_user(&users, "b_b").await?;
    let found = users.list_users(Some("b_b")).await?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].username, "b_b");
    assert!(users.list_users(Some("%")).await?.is_empty());
    Ok(())
}
