//! CSV bulk import into the in-memory store.

use std::fs;
use std::path::Path;

use anyhow::Result;
use tempfile::TempDir;

use yamdb_core::DomainError;
use yamdb_core::application::{AppUnitOfWork, CsvImporter, TableStats};
use yamdb_core::domain::catalog::{TitleFilter, TitleView};
use yamdb_core::domain::users::UserRole;

const USERS: &str = "\
id,username,email,role,bio,first_name,last_name
100,bingobongo,bingobongo@yamdb.fake,user,,,
101,capt_obvious,capt_obvious@yamdb.fake,admin,Knows things,Cap,Obvious
";

const CATEGORIES: &str = "\
id,name,slug
1,Film,movie
2,Book,book
";

const GENRES: &str = "\
id,name,slug
1,Drama,drama
2,Crime,crime
";

const TITLES: &str = "\
id,name,year,category,description
1,The Shawshank Redemption,1994,1,
2,The Godfather,1972,1,Family business
3,Roadside Picnic,1972,2,
";

const GENRE_LINKS: &str = "\
id,title_id,genre_id
1,1,1
2,2,1
3,2,2
";

const REVIEWS: &str = "\
id,title_id,text,author,score,pub_date
1,1,Hope is a good thing,100,8,2019-09-24T21:08:21.567Z
2,1,Best prison film,101,10,2019-09-24T21:08:21.567Z
3,2,An offer I could not refuse,100,7,2019-09-24T21:08:21.567Z
";

const COMMENTS: &str = "\
id,review_id,text,author,pub_date
1,1,Agreed,101,2019-09-24T21:08:21.567Z
2,1,Thanks,100,2019-09-24T21:08:21.567Z
";

fn write_fixture(dir: &Path) -> Result<()> {
    for (file, body) in [
        ("users.csv", USERS),
        ("category.csv", CATEGORIES),
        ("genre.csv", GENRES),
        ("titles.csv", TITLES),
        ("genre_title.csv", GENRE_LINKS),
        ("review.csv", REVIEWS),
        ("comments.csv", COMMENTS),
    ] {
        fs::write(dir.join(file), body)?;
    }
    Ok(())
}

async fn title(uow: &AppUnitOfWork, name: &str) -> Result<TitleView> {
    let titles = uow
        .catalog
        .list_title_views(&TitleFilter::default())
        .await?;
    titles
        .into_iter()
        .find(|view| view.name == name)
        .ok_or_else(|| anyhow::anyhow!("title {name} not imported"))
}

fn genre_slugs(view: &TitleView) -> Vec<String> {
    let mut slugs: Vec<String> =
        view.genre.iter().map(|genre| genre.slug.clone()).collect();
    slugs.sort();
    slugs
}

fn created(n: usize) -> TableStats {
    TableStats {
        created: n,
        matched: 0,
    }
}

fn matched(n: usize) -> TableStats {
    TableStats {
        created: 0,
        matched: n,
    }
}

#[tokio::test]
async fn imports_catalog_with_links_and_ratings() -> Result<()> {
    let dir = TempDir::new()?;
    write_fixture(dir.path())?;
    let uow = AppUnitOfWork::in_memory();

    let report = CsvImporter::new(&uow).import_dir(dir.path()).await?;
    assert_eq!(report.users, created(2));
    assert_eq!(report.categories, created(2));
    assert_eq!(report.genres, created(2));
    assert_eq!(report.titles, created(3));
    assert_eq!(report.genre_links, created(3));
    assert_eq!(report.reviews, created(3));
    assert_eq!(report.comments, created(2));

    let shawshank = title(&uow, "The Shawshank Redemption").await?;
    assert_eq!(shawshank.year, 1994);
    assert_eq!(genre_slugs(&shawshank), vec!["drama"]);
    assert_eq!(
        shawshank.category.as_ref().map(|c| c.slug.as_str()),
        Some("movie")
    );
    assert_eq!(shawshank.rating, Some(9.0));

    let godfather = title(&uow, "The Godfather").await?;
    assert_eq!(godfather.description, "Family business");
    assert_eq!(genre_slugs(&godfather), vec!["crime", "drama"]);
    assert_eq!(godfather.rating, Some(7.0));

    let picnic = title(&uow, "Roadside Picnic").await?;
    assert!(picnic.genre.is_empty());
    assert_eq!(
        picnic.category.as_ref().map(|c| c.slug.as_str()),
        Some("book")
    );
    assert_eq!(picnic.rating, None);

    let admin = uow
        .users
        .get_user_by_username("capt_obvious")
        .await?
        .ok_or_else(|| anyhow::anyhow!("admin not imported"))?;
    assert_eq!(admin.role, UserRole::Admin);
    assert_eq!(admin.bio.as_deref(), Some("Knows things"));

    let reviews = uow.reviews.list_reviews(shawshank.id).await?;
    let first = reviews
        .iter()
        .find(|review| review.author == "bingobongo")
        .ok_or_else(|| anyhow::anyhow!("review not imported"))?;
    let comments = uow.reviews.list_comments(first.id).await?;
    let mut authors: Vec<&str> =
        comments.iter().map(|c| c.author.as_str()).collect();
    authors.sort();
    assert_eq!(authors, vec!["bingobongo", "capt_obvious"]);

    Ok(())
}

#[tokio::test]
async fn second_import_matches_every_row() -> Result<()> {
    let dir = TempDir::new()?;
    write_fixture(dir.path())?;
    let uow = AppUnitOfWork::in_memory();
    let importer = CsvImporter::new(&uow);

    importer.import_dir(dir.path()).await?;
    let report = importer.import_dir(dir.path()).await?;

    assert_eq!(report.users, matched(2));
    assert_eq!(report.titles, matched(3));
    assert_eq!(report.genre_links, matched(3));
    assert_eq!(report.reviews, matched(3));
    assert_eq!(report.comments, matched(2));

    let titles = uow
        .catalog
        .list_title_views(&TitleFilter::default())
        .await?;
    assert_eq!(titles.len(), 3);
    let shawshank = title(&uow, "The Shawshank Redemption").await?;
    assert_eq!(genre_slugs(&shawshank), vec!["drama"]);
    assert_eq!(shawshank.rating, Some(9.0));
    assert_eq!(uow.reviews.list_reviews(shawshank.id).await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn reimport_updates_scores_in_place() -> Result<()> {
    let dir = TempDir::new()?;
    write_fixture(dir.path())?;
    let uow = AppUnitOfWork::in_memory();
    let importer = CsvImporter::new(&uow);
    importer.import_dir(dir.path()).await?;

    fs::write(
        dir.path().join("review.csv"),
        "id,title_id,text,author,score\n1,1,Changed my mind,100,4\n",
    )?;
    let report = importer.import_dir(dir.path()).await?;
    assert_eq!(report.reviews, matched(1));

    let shawshank = title(&uow, "The Shawshank Redemption").await?;
    assert_eq!(shawshank.rating, Some(7.0));
    Ok(())
}

#[tokio::test]
async fn missing_tables_are_skipped() -> Result<()> {
    let dir = TempDir::new()?;
    fs::write(dir.path().join("genre.csv"), GENRES)?;
    let uow = AppUnitOfWork::in_memory();

    let report = CsvImporter::new(&uow).import_dir(dir.path()).await?;
    assert_eq!(report.genres, created(2));
    assert_eq!(report.users, TableStats::default());
    assert_eq!(report.titles, TableStats::default());
    Ok(())
}

#[tokio::test]
async fn unknown_reference_is_reported_with_its_line() -> Result<()> {
    let dir = TempDir::new()?;
    fs::write(dir.path().join("category.csv"), CATEGORIES)?;
    fs::write(
        dir.path().join("titles.csv"),
        "id,name,year,category,description\n1,Solaris,1972,1,\n2,Stalker,1979,9,\n",
    )?;
    let uow = AppUnitOfWork::in_memory();

    let err = CsvImporter::new(&uow)
        .import_dir(dir.path())
        .await
        .expect_err("category 9 is not in category.csv");
    match err {
        DomainError::Import(message) => {
            assert!(message.starts_with("titles.csv:3"), "{message}");
            assert!(message.contains("unknown category id 9"), "{message}");
        }
        other => panic!("expected an import error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn invalid_score_is_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    write_fixture(dir.path())?;
    fs::write(
        dir.path().join("review.csv"),
        "id,title_id,text,author,score\n1,1,Off the scale,100,11\n",
    )?;
    let uow = AppUnitOfWork::in_memory();

    let err = CsvImporter::new(&uow)
        .import_dir(dir.path())
        .await
        .expect_err("score 11 is out of range");
    assert!(
        matches!(&err, DomainError::Import(message) if message.starts_with("review.csv:2")),
        "{err:?}"
    );
    Ok(())
}

#[tokio::test]
async fn missing_directory_fails() {
    let uow = AppUnitOfWork::in_memory();
    let err = CsvImporter::new(&uow)
        .import_dir(Path::new("/nonexistent/yamdb-import"))
        .await
        .expect_err("directory does not exist");
    assert!(matches!(err, DomainError::Import(_)));
}
