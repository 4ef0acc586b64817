#![cfg(feature = "postgres-store")]

use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use talentpitch::models::{Account, Challenge, ChallengeUpdate};
use talentpitch::repo::pg::PgRepo;
use talentpitch::repo::{AccountRepo, ChallengeRepo, Page, RepoError};

async fn repo() -> Option<PgRepo> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&url)
        .await
        .ok()?;
    sqlx::migrate!("./migrations").run(&pool).await.ok()?;
    Some(PgRepo::new(pool))
}

fn account() -> Account {
    let id = Uuid::new_v4().to_string();
    Account {
        email: format!("{id}@example.com"),
        fullname: "Pg Tester".into(),
        password_hash: "$2b$08$notarealhashnotarealhashnotarealhashnotarealhashnot".into(),
        id,
    }
}

#[actix_web::test]
#[serial_test::serial]
async fn test_pg_account_roundtrip_and_conflict() {
    let Some(repo) = repo().await else {
        eprintln!("skip: no DATABASE_URL");
        return;
    };

    let a = account();
    let stored = repo.insert_account(a.clone()).await.unwrap();
    assert_eq!(stored, a);
    assert_eq!(repo.get_account_by_email(&a.email).await.unwrap().id, a.id);

    let mut dup = account();
    dup.email = a.email.clone();
    assert!(matches!(repo.insert_account(dup).await.unwrap_err(), RepoError::Conflict));

    let mut blank = account();
    blank.email = String::new();
    assert!(matches!(
        repo.insert_account(blank).await.unwrap_err(),
        RepoError::Validation { field: "email" }
    ));

    repo.delete_account(&a.id).await.unwrap();
    assert!(matches!(repo.get_account(&a.id).await.unwrap_err(), RepoError::NotFound { .. }));
    assert!(matches!(repo.delete_account(&a.id).await.unwrap_err(), RepoError::NotFound { .. }));
}

#[actix_web::test]
#[serial_test::serial]
async fn test_pg_challenge_update_and_listing() {
    let Some(repo) = repo().await else {
        eprintln!("skip: no DATABASE_URL");
        return;
    };

    let id = Uuid::new_v4().to_string();
    let c = Challenge {
        id: id.clone(),
        title: "Pg challenge".into(),
        description: "Persist me".into(),
        difficulty: 3,
        account_id: Uuid::new_v4().to_string(),
    };
    repo.insert_challenge(c).await.unwrap();

    let upd = repo
        .update_challenge(&id, ChallengeUpdate { title: Some("Renamed".into()), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(upd.title, "Renamed");
    assert_eq!(upd.difficulty, 3);

    let page = repo.list_challenges(Page::new(1, 1).unwrap()).await.unwrap();
    assert!(page.total >= 1);
    assert_eq!(page.items.len(), 1);

    repo.delete_challenge(&id).await.unwrap();
    assert!(matches!(
        repo.update_challenge(&id, ChallengeUpdate::default()).await.unwrap_err(),
        RepoError::NotFound { entity: "challenge", .. }
    ));
}
