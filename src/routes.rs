use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::{CurrentAccount, TokenKeys};
use crate::error::ApiError;
use crate::models::*;
use crate::repo::{Page, Paginated, Repo};
use crate::service::{AccountService, ChallengeService, CompanyService};

pub const DEFAULT_PAGE_SIZE: i64 = 10;

pub fn config(cfg: &mut web::ServiceConfig) {
    // extractor failures answer with the same JSON error body as everything else
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _| ApiError::BadRequest(err.to_string()).into()))
        .app_data(web::QueryConfig::default().error_handler(|err, _| ApiError::BadRequest(err.to_string()).into()))
        .service(web::resource("/").route(web::get().to(home)))
        .service(web::resource("/signup").route(web::post().to(signup)))
        .service(web::resource("/login").route(web::post().to(login)))
        .service(web::resource("/me").route(web::get().to(me)))
        .service(
            web::resource("/users")
                .route(web::get().to(list_users))
                .route(web::post().to(create_user)),
        )
        .service(
            web::resource("/users/{id}")
                .route(web::get().to(get_user))
                .route(web::put().to(update_user))
                .route(web::delete().to(delete_user)),
        )
        .service(
            web::resource("/challenges")
                .route(web::get().to(list_challenges))
                .route(web::post().to(create_challenge)),
        )
        .service(
            web::resource("/challenges/{id}")
                .route(web::get().to(get_challenge))
                .route(web::put().to(update_challenge))
                .route(web::delete().to(delete_challenge)),
        )
        .service(
            web::resource("/companies")
                .route(web::get().to(list_companies))
                .route(web::post().to(create_company)),
        )
        .service(
            web::resource("/companies/{id}")
                .route(web::get().to(get_company))
                .route(web::put().to(update_company))
                .route(web::delete().to(delete_company)),
        );
}

/// Services shared by every worker. The gateway is injected once here.
#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub challenges: ChallengeService,
    pub companies: CompanyService,
}

impl AppState {
    pub fn new(repo: Arc<dyn Repo>, keys: TokenKeys) -> Self {
        Self {
            accounts: AccountService::new(repo.clone(), keys),
            challenges: ChallengeService::new(repo.clone()),
            companies: CompanyService::new(repo),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number (default 1)
    pub page: Option<i64>,
    /// items per page (default 10)
    pub page_size: Option<i64>,
}

impl PageQuery {
    fn page(&self) -> Result<Page, ApiError> {
        Ok(Page::new(self.page.unwrap_or(1), self.page_size.unwrap_or(DEFAULT_PAGE_SIZE))?)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

fn list_response<T: Serialize>(result: Paginated<T>, page: Page) -> HttpResponse {
    HttpResponse::Ok().json(ListResponse {
        items: result.items,
        total: result.total,
        page: page.number(),
        page_size: page.size(),
    })
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Home {
    pub message: String,
    pub status: bool,
}

#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service is up", body = Home))
)]
pub async fn home() -> HttpResponse {
    HttpResponse::Ok().json(Home { message: "Welcome to TalentPitch".into(), status: true })
}

#[utoipa::path(
    post,
    path = "/signup",
    tag = "accounts",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = SignupResponse),
        (status = 400, description = "Missing field"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn signup(data: web::Data<AppState>, payload: web::Json<SignupRequest>) -> Result<HttpResponse, ApiError> {
    let created = data.accounts.signup(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(created))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "accounts",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed token valid for 24h", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(data: web::Data<AppState>, payload: web::Json<LoginRequest>) -> Result<HttpResponse, ApiError> {
    let token = data.accounts.login(payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(token))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "accounts",
    responses(
        (status = 200, description = "Authenticated account", body = AccountView),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn me(current: CurrentAccount, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(data.accounts.me(&current).await?))
}

// ---------------- accounts -----------------------------------------

#[utoipa::path(
    get,
    path = "/users",
    tag = "accounts",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of accounts"),
        (status = 400, description = "Invalid pagination")
    )
)]
pub async fn list_users(data: web::Data<AppState>, query: web::Query<PageQuery>) -> Result<HttpResponse, ApiError> {
    let page = query.page()?;
    Ok(list_response(data.accounts.list(page).await?, page))
}

pub async fn create_user(data: web::Data<AppState>, payload: web::Json<SignupRequest>) -> Result<HttpResponse, ApiError> {
    let created = data.accounts.signup(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(created))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "accounts",
    params(("id" = String, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account", body = AccountView),
        (status = 404, description = "Account not found")
    )
)]
pub async fn get_user(data: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(data.accounts.get(&path.into_inner()).await?))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "accounts",
    request_body = AccountUpdate,
    params(("id" = String, Path, description = "Account id")),
    responses(
        (status = 200, description = "Account updated", body = AccountView),
        (status = 400, description = "Empty field or immutable field supplied"),
        (status = 404, description = "Account not found")
    )
)]
pub async fn update_user(
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<AccountUpdate>,
) -> Result<HttpResponse, ApiError> {
    let updated = data.accounts.update(&path.into_inner(), payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(updated))
}

pub async fn delete_user(data: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    data.accounts.delete(&path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ---------------- challenges ---------------------------------------

#[utoipa::path(
    get,
    path = "/challenges",
    tag = "challenges",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of challenges"),
        (status = 400, description = "Invalid pagination")
    )
)]
pub async fn list_challenges(data: web::Data<AppState>, query: web::Query<PageQuery>) -> Result<HttpResponse, ApiError> {
    let page = query.page()?;
    Ok(list_response(data.challenges.list(page).await?, page))
}

#[utoipa::path(
    post,
    path = "/challenges",
    tag = "challenges",
    request_body = NewChallenge,
    responses(
        (status = 201, description = "Challenge created", body = Challenge),
        (status = 400, description = "Missing field"),
        (status = 404, description = "Owner account not found")
    )
)]
pub async fn create_challenge(
    current: CurrentAccount,
    data: web::Data<AppState>,
    payload: web::Json<NewChallenge>,
) -> Result<HttpResponse, ApiError> {
    let created = data.challenges.create(&current, payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(created))
}

#[utoipa::path(
    get,
    path = "/challenges/{id}",
    tag = "challenges",
    params(("id" = String, Path, description = "Challenge id")),
    responses(
        (status = 200, description = "Challenge", body = Challenge),
        (status = 404, description = "Challenge not found")
    )
)]
pub async fn get_challenge(data: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(data.challenges.get(&path.into_inner()).await?))
}

pub async fn update_challenge(
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<ChallengeUpdate>,
) -> Result<HttpResponse, ApiError> {
    let updated = data.challenges.update(&path.into_inner(), payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(updated))
}

pub async fn delete_challenge(data: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    data.challenges.delete(&path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ---------------- companies ----------------------------------------

pub async fn list_companies(data: web::Data<AppState>, query: web::Query<PageQuery>) -> Result<HttpResponse, ApiError> {
    let page = query.page()?;
    Ok(list_response(data.companies.list(page).await?, page))
}

#[utoipa::path(
    post,
    path = "/companies",
    tag = "companies",
    request_body = NewCompany,
    responses(
        (status = 201, description = "Company created", body = Company),
        (status = 400, description = "Missing field"),
        (status = 404, description = "Owner account not found")
    )
)]
pub async fn create_company(
    current: CurrentAccount,
    data: web::Data<AppState>,
    payload: web::Json<NewCompany>,
) -> Result<HttpResponse, ApiError> {
    let created = data.companies.create(&current, payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(created))
}

pub async fn get_company(data: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse::Ok().json(data.companies.get(&path.into_inner()).await?))
}

#[utoipa::path(
    put,
    path = "/companies/{id}",
    tag = "companies",
    request_body = CompanyUpdate,
    params(("id" = String, Path, description = "Company id")),
    responses(
        (status = 200, description = "Company updated", body = Company),
        (status = 404, description = "Company not found")
    )
)]
pub async fn update_company(
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<CompanyUpdate>,
) -> Result<HttpResponse, ApiError> {
    let updated = data.companies.update(&path.into_inner(), payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(updated))
}

pub async fn delete_company(data: web::Data<AppState>, path: web::Path<String>) -> Result<HttpResponse, ApiError> {
    data.companies.delete(&path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
