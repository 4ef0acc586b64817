use actix_web::{test, web, App};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use talentpitch::auth::{issue, TokenKeys};
use talentpitch::models::*;
use talentpitch::repo::{AccountRepo, ChallengeRepo, CompanyRepo, Page, Paginated, RepoError, RepoResult};
use talentpitch::{config, AppState, AuthGate};

const SECRET: &str = "test-secret-must-be-32-bytes-long!!";
const DRIVER_DETAIL: &str = "pg: connection refused (os error 111) at 10.0.0.7:5432";

// Gateway whose backend is down: every call fails with a driver error.
struct DownRepo;

fn down<T>() -> RepoResult<T> {
    Err(RepoError::Unavailable(DRIVER_DETAIL.to_string()))
}

#[async_trait]
impl AccountRepo for DownRepo {
    async fn insert_account(&self, _: Account) -> RepoResult<Account> { down() }
    async fn update_account(&self, _: &str, _: AccountUpdate) -> RepoResult<Account> { down() }
    async fn delete_account(&self, _: &str) -> RepoResult<()> { down() }
    async fn list_accounts(&self, _: Page) -> RepoResult<Paginated<Account>> { down() }
    async fn get_account(&self, _: &str) -> RepoResult<Account> { down() }
    async fn get_account_by_email(&self, _: &str) -> RepoResult<Account> { down() }
}

#[async_trait]
impl ChallengeRepo for DownRepo {
    async fn insert_challenge(&self, _: Challenge) -> RepoResult<Challenge> { down() }
    async fn update_challenge(&self, _: &str, _: ChallengeUpdate) -> RepoResult<Challenge> { down() }
    async fn delete_challenge(&self, _: &str) -> RepoResult<()> { down() }
    async fn list_challenges(&self, _: Page) -> RepoResult<Paginated<Challenge>> { down() }
    async fn get_challenge(&self, _: &str) -> RepoResult<Challenge> { down() }
}

#[async_trait]
impl CompanyRepo for DownRepo {
    async fn insert_company(&self, _: Company) -> RepoResult<Company> { down() }
    async fn update_company(&self, _: &str, _: CompanyUpdate) -> RepoResult<Company> { down() }
    async fn delete_company(&self, _: &str) -> RepoResult<()> { down() }
    async fn list_companies(&self, _: Page) -> RepoResult<Paginated<Company>> { down() }
    async fn get_company(&self, _: &str) -> RepoResult<Company> { down() }
}

#[actix_web::test]
async fn test_storage_failure_is_500_without_driver_detail() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(AppState::new(Arc::new(DownRepo), TokenKeys::new(SECRET))))
            .wrap(AuthGate::new(TokenKeys::new(SECRET)))
            .configure(config),
    )
    .await;

    let token = issue("acc-1", &TokenKeys::new(SECRET)).unwrap();
    let requests = vec![
        test::TestRequest::post()
            .uri("/signup")
            .set_json(json!({"email": "h@example.com", "fullname": "Hal", "password": "pw"})),
        // a storage failure on login must not read as "invalid credentials"
        test::TestRequest::post()
            .uri("/login")
            .set_json(json!({"email": "h@example.com", "password": "pw"})),
        test::TestRequest::get().uri("/me").insert_header(("Authorization", token.clone())),
        test::TestRequest::get().uri("/challenges").insert_header(("Authorization", token.clone())),
        test::TestRequest::delete()
            .uri("/companies/co-1")
            .insert_header(("Authorization", token.clone())),
    ];

    for req in requests {
        let resp = test::call_service(&app, req.to_request()).await;
        assert_eq!(resp.status(), 500);
        let body = test::read_body(resp).await;
        let text = std::str::from_utf8(&body).unwrap();
        assert!(!text.contains("connection refused"), "leaked: {text}");
        let v: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v, json!({"error": "internal error"}));
    }
}
