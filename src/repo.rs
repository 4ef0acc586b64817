use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::{AppConfig, StorageBackend};
use crate::models::*;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("{field} is required")]
    Validation { field: &'static str },
    #[error("page and pageSize must both be at least 1")]
    InvalidPagination,
    #[error("no {entity} found for {key}")]
    NotFound { entity: &'static str, key: String },
    #[error("conflict")]
    Conflict,
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage backend not configured: {0}")]
    NotConfigured(String),
}

impl RepoError {
    fn not_found(entity: &'static str, key: &str) -> Self {
        RepoError::NotFound { entity, key: key.to_string() }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

/// A validated page window. The only constructor rejects `page < 1` and
/// `size < 1`, so backends never see an invalid window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    number: i64,
    size: i64,
}

impl Page {
    pub fn new(number: i64, size: i64) -> RepoResult<Self> {
        if number < 1 || size < 1 {
            return Err(RepoError::InvalidPagination);
        }
        // offset must stay representable
        (number - 1).checked_mul(size).ok_or(RepoError::InvalidPagination)?;
        Ok(Self { number, size })
    }

    pub fn number(&self) -> i64 { self.number }
    pub fn size(&self) -> i64 { self.size }
    pub fn offset(&self) -> i64 { (self.number - 1) * self.size }
}

/// One page of items plus the total row count, independent of the window.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
}

impl<T> Paginated<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated { items: self.items.into_iter().map(f).collect(), total: self.total }
    }
}

/// Required-field check run by every backend before a write touches storage.
pub trait Validate {
    fn validate(&self) -> RepoResult<()>;
}

pub fn require(field: &'static str, value: &str) -> RepoResult<()> {
    if value.trim().is_empty() {
        return Err(RepoError::Validation { field });
    }
    Ok(())
}

fn require_if_present(field: &'static str, value: Option<&str>) -> RepoResult<()> {
    value.map_or(Ok(()), |v| require(field, v))
}

fn require_difficulty(value: i32) -> RepoResult<()> {
    if value < 1 {
        return Err(RepoError::Validation { field: "difficulty" });
    }
    Ok(())
}

impl Validate for Account {
    fn validate(&self) -> RepoResult<()> {
        require("id", &self.id)?;
        require("email", &self.email)?;
        require("fullname", &self.fullname)?;
        require("password_hash", &self.password_hash)
    }
}

impl Validate for AccountUpdate {
    fn validate(&self) -> RepoResult<()> {
        require_if_present("fullname", self.fullname.as_deref())
    }
}

impl Validate for Challenge {
    fn validate(&self) -> RepoResult<()> {
        require("id", &self.id)?;
        require("title", &self.title)?;
        require("description", &self.description)?;
        require_difficulty(self.difficulty)?;
        require("account_id", &self.account_id)
    }
}

impl Validate for ChallengeUpdate {
    fn validate(&self) -> RepoResult<()> {
        require_if_present("title", self.title.as_deref())?;
        require_if_present("description", self.description.as_deref())?;
        self.difficulty.map_or(Ok(()), require_difficulty)
    }
}

impl Validate for Company {
    fn validate(&self) -> RepoResult<()> {
        require("id", &self.id)?;
        require("name", &self.name)?;
        require("location", &self.location)?;
        require("industry", &self.industry)?;
        require("account_id", &self.account_id)
    }
}

impl Validate for CompanyUpdate {
    fn validate(&self) -> RepoResult<()> {
        require_if_present("name", self.name.as_deref())?;
        require_if_present("location", self.location.as_deref())?;
        require_if_present("industry", self.industry.as_deref())
    }
}

#[async_trait]
pub trait AccountRepo: Send + Sync {
    async fn insert_account(&self, account: Account) -> RepoResult<Account>;
    async fn update_account(&self, id: &str, upd: AccountUpdate) -> RepoResult<Account>;
    async fn delete_account(&self, id: &str) -> RepoResult<()>;
    async fn list_accounts(&self, page: Page) -> RepoResult<Paginated<Account>>;
    async fn get_account(&self, id: &str) -> RepoResult<Account>;
    async fn get_account_by_email(&self, email: &str) -> RepoResult<Account>;
}

#[async_trait]
pub trait ChallengeRepo: Send + Sync {
    async fn insert_challenge(&self, challenge: Challenge) -> RepoResult<Challenge>;
    async fn update_challenge(&self, id: &str, upd: ChallengeUpdate) -> RepoResult<Challenge>;
    async fn delete_challenge(&self, id: &str) -> RepoResult<()>;
    async fn list_challenges(&self, page: Page) -> RepoResult<Paginated<Challenge>>;
    async fn get_challenge(&self, id: &str) -> RepoResult<Challenge>;
}

#[async_trait]
pub trait CompanyRepo: Send + Sync {
    async fn insert_company(&self, company: Company) -> RepoResult<Company>;
    async fn update_company(&self, id: &str, upd: CompanyUpdate) -> RepoResult<Company>;
    async fn delete_company(&self, id: &str) -> RepoResult<()>;
    async fn list_companies(&self, page: Page) -> RepoResult<Paginated<Company>>;
    async fn get_company(&self, id: &str) -> RepoResult<Company>;
}

pub trait Repo: AccountRepo + ChallengeRepo + CompanyRepo {}

impl<T> Repo for T where T: AccountRepo + ChallengeRepo + CompanyRepo {}

/// Bind the storage backend selected by configuration. Called once at startup;
/// the result is handed to the services by ownership.
pub async fn build_repo(cfg: &AppConfig) -> RepoResult<Arc<dyn Repo>> {
    match cfg.storage {
        #[cfg(feature = "postgres-store")]
        StorageBackend::Postgres => {
            use sqlx::postgres::PgPoolOptions;
            let url = cfg.database_url.as_deref().ok_or_else(|| {
                RepoError::NotConfigured("DATABASE_URL must be set for the postgres backend".into())
            })?;
            let pool = PgPoolOptions::new()
                .max_connections(cfg.db_max_connections)
                .connect(url)
                .await
                .map_err(|e| RepoError::Unavailable(e.to_string()))?;
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| RepoError::Unavailable(e.to_string()))?;
            Ok(Arc::new(pg::PgRepo::new(pool)))
        }
        #[cfg(feature = "inmem-store")]
        StorageBackend::Memory => Ok(Arc::new(inmem::InMemRepo::new())),
        #[allow(unreachable_patterns)]
        other => Err(RepoError::NotConfigured(format!("{other:?} backend not compiled in"))),
    }
}

#[cfg(feature = "inmem-store")]
pub mod inmem {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

    // BTreeMap keeps listing order by id, same as the ORDER BY id in Postgres
    #[derive(Default)]
    struct State {
        accounts: BTreeMap<Id, Account>,
        challenges: BTreeMap<Id, Challenge>,
        companies: BTreeMap<Id, Company>,
    }

    #[derive(Clone, Default)]
    pub struct InMemRepo {
        state: Arc<RwLock<State>>,
    }

    impl InMemRepo {
        pub fn new() -> Self {
            Self::default()
        }

        fn read(&self) -> RepoResult<RwLockReadGuard<'_, State>> {
            self.state.read().map_err(|_| RepoError::Unavailable("state lock poisoned".into()))
        }

        fn write(&self) -> RepoResult<RwLockWriteGuard<'_, State>> {
            self.state.write().map_err(|_| RepoError::Unavailable("state lock poisoned".into()))
        }
    }

    fn window<T: Clone>(map: &BTreeMap<Id, T>, page: Page) -> Paginated<T> {
        let skip = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(page.size()).unwrap_or(usize::MAX);
        Paginated {
            items: map.values().skip(skip).take(take).cloned().collect(),
            total: map.len() as i64,
        }
    }

    #[async_trait]
    impl AccountRepo for InMemRepo {
        async fn insert_account(&self, account: Account) -> RepoResult<Account> {
            account.validate()?;
            let mut s = self.write()?;
            if s.accounts.contains_key(&account.id) || s.accounts.values().any(|a| a.email == account.email) {
                return Err(RepoError::Conflict);
            }
            s.accounts.insert(account.id.clone(), account.clone());
            Ok(account)
        }
        async fn update_account(&self, id: &str, upd: AccountUpdate) -> RepoResult<Account> {
            upd.validate()?;
            let mut s = self.write()?;
            let account = s.accounts.get_mut(id).ok_or_else(|| RepoError::not_found("account", id))?;
            if let Some(fullname) = upd.fullname { account.fullname = fullname; }
            Ok(account.clone())
        }
        async fn delete_account(&self, id: &str) -> RepoResult<()> {
            let mut s = self.write()?;
            s.accounts.remove(id).map(|_| ()).ok_or_else(|| RepoError::not_found("account", id))
        }
        async fn list_accounts(&self, page: Page) -> RepoResult<Paginated<Account>> {
            Ok(window(&self.read()?.accounts, page))
        }
        async fn get_account(&self, id: &str) -> RepoResult<Account> {
            let s = self.read()?;
            s.accounts.get(id).cloned().ok_or_else(|| RepoError::not_found("account", id))
        }
        async fn get_account_by_email(&self, email: &str) -> RepoResult<Account> {
            let s = self.read()?;
            s.accounts
                .values()
                .find(|a| a.email == email)
                .cloned()
                .ok_or_else(|| RepoError::not_found("account", email))
        }
    }

    #[async_trait]
    impl ChallengeRepo for InMemRepo {
        async fn insert_challenge(&self, challenge: Challenge) -> RepoResult<Challenge> {
            challenge.validate()?;
            let mut s = self.write()?;
            if s.challenges.contains_key(&challenge.id) { return Err(RepoError::Conflict); }
            s.challenges.insert(challenge.id.clone(), challenge.clone());
            Ok(challenge)
        }
        async fn update_challenge(&self, id: &str, upd: ChallengeUpdate) -> RepoResult<Challenge> {
            upd.validate()?;
            let mut s = self.write()?;
            let c = s.challenges.get_mut(id).ok_or_else(|| RepoError::not_found("challenge", id))?;
            if let Some(title) = upd.title { c.title = title; }
            if let Some(description) = upd.description { c.description = description; }
            if let Some(difficulty) = upd.difficulty { c.difficulty = difficulty; }
            Ok(c.clone())
        }
        async fn delete_challenge(&self, id: &str) -> RepoResult<()> {
            let mut s = self.write()?;
            s.challenges.remove(id).map(|_| ()).ok_or_else(|| RepoError::not_found("challenge", id))
        }
        async fn list_challenges(&self, page: Page) -> RepoResult<Paginated<Challenge>> {
            Ok(window(&self.read()?.challenges, page))
        }
        async fn get_challenge(&self, id: &str) -> RepoResult<Challenge> {
            let s = self.read()?;
            s.challenges.get(id).cloned().ok_or_else(|| RepoError::not_found("challenge", id))
        }
    }

    #[async_trait]
    impl CompanyRepo for InMemRepo {
        async fn insert_company(&self, company: Company) -> RepoResult<Company> {
            company.validate()?;
            let mut s = self.write()?;
            if s.companies.contains_key(&company.id) { return Err(RepoError::Conflict); }
            s.companies.insert(company.id.clone(), company.clone());
            Ok(company)
        }
        async fn update_company(&self, id: &str, upd: CompanyUpdate) -> RepoResult<Company> {
            upd.validate()?;
            let mut s = self.write()?;
            let c = s.companies.get_mut(id).ok_or_else(|| RepoError::not_found("company", id))?;
            if let Some(name) = upd.name { c.name = name; }
            if let Some(image_path) = upd.image_path { c.image_path = Some(image_path); }
            if let Some(location) = upd.location { c.location = location; }
            if let Some(industry) = upd.industry { c.industry = industry; }
            Ok(c.clone())
        }
        async fn delete_company(&self, id: &str) -> RepoResult<()> {
            let mut s = self.write()?;
            s.companies.remove(id).map(|_| ()).ok_or_else(|| RepoError::not_found("company", id))
        }
        async fn list_companies(&self, page: Page) -> RepoResult<Paginated<Company>> {
            Ok(window(&self.read()?.companies, page))
        }
        async fn get_company(&self, id: &str) -> RepoResult<Company> {
            let s = self.read()?;
            s.companies.get(id).cloned().ok_or_else(|| RepoError::not_found("company", id))
        }
    }
}

// Postgres implementation (feature = "postgres-store")
#[cfg(feature = "postgres-store")]
pub mod pg {
    use super::*;
    use sqlx::{Pool, Postgres};

    #[derive(Clone)]
    pub struct PgRepo { pool: Pool<Postgres> }

    impl PgRepo {
        pub fn new(pool: Pool<Postgres>) -> Self { Self { pool } }
    }

    // Driver detail stays inside Unavailable; the HTTP layer never echoes it.
    fn storage_err(e: sqlx::Error) -> RepoError {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => RepoError::Conflict,
            _ => RepoError::Unavailable(e.to_string()),
        }
    }

    fn affected(rows: u64, entity: &'static str, id: &str) -> RepoResult<()> {
        if rows == 0 {
            return Err(RepoError::not_found(entity, id));
        }
        Ok(())
    }

    const ACCOUNT_COLS: &str = "id, fullname, email, password_hash";
    const CHALLENGE_COLS: &str = "id, title, description, difficulty, account_id";
    const COMPANY_COLS: &str = "id, name, image_path, location, industry, account_id";

    #[async_trait]
    impl AccountRepo for PgRepo {
        async fn insert_account(&self, account: Account) -> RepoResult<Account> {
            account.validate()?;
            sqlx::query_as::<_, Account>(&format!(
                "INSERT INTO accounts ({ACCOUNT_COLS}) VALUES ($1,$2,$3,$4) RETURNING {ACCOUNT_COLS}"
            ))
            .bind(&account.id)
            .bind(&account.fullname)
            .bind(&account.email)
            .bind(&account.password_hash)
            .fetch_one(&self.pool).await.map_err(storage_err)
        }
        async fn update_account(&self, id: &str, upd: AccountUpdate) -> RepoResult<Account> {
            upd.validate()?;
            sqlx::query_as::<_, Account>(&format!(
                "UPDATE accounts SET fullname = COALESCE($2, fullname) WHERE id = $1 RETURNING {ACCOUNT_COLS}"
            ))
            .bind(id)
            .bind(upd.fullname.as_ref())
            .fetch_optional(&self.pool).await.map_err(storage_err)?
            .ok_or_else(|| RepoError::not_found("account", id))
        }
        async fn delete_account(&self, id: &str) -> RepoResult<()> {
            let res = sqlx::query("DELETE FROM accounts WHERE id = $1")
                .bind(id)
                .execute(&self.pool).await.map_err(storage_err)?;
            affected(res.rows_affected(), "account", id)
        }
        async fn list_accounts(&self, page: Page) -> RepoResult<Paginated<Account>> {
            let items = sqlx::query_as::<_, Account>(&format!(
                "SELECT {ACCOUNT_COLS} FROM accounts ORDER BY id LIMIT $1 OFFSET $2"
            ))
            .bind(page.size())
            .bind(page.offset())
            .fetch_all(&self.pool).await.map_err(storage_err)?;
            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts")
                .fetch_one(&self.pool).await.map_err(storage_err)?;
            Ok(Paginated { items, total })
        }
        async fn get_account(&self, id: &str) -> RepoResult<Account> {
            sqlx::query_as::<_, Account>(&format!("SELECT {ACCOUNT_COLS} FROM accounts WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool).await.map_err(storage_err)?
                .ok_or_else(|| RepoError::not_found("account", id))
        }
        async fn get_account_by_email(&self, email: &str) -> RepoResult<Account> {
            sqlx::query_as::<_, Account>(&format!("SELECT {ACCOUNT_COLS} FROM accounts WHERE email = $1"))
                .bind(email)
                .fetch_optional(&self.pool).await.map_err(storage_err)?
                .ok_or_else(|| RepoError::not_found("account", email))
        }
    }

    #[async_trait]
    impl ChallengeRepo for PgRepo {
        async fn insert_challenge(&self, challenge: Challenge) -> RepoResult<Challenge> {
            challenge.validate()?;
            sqlx::query_as::<_, Challenge>(&format!(
                "INSERT INTO challenges ({CHALLENGE_COLS}) VALUES ($1,$2,$3,$4,$5) RETURNING {CHALLENGE_COLS}"
            ))
            .bind(&challenge.id)
            .bind(&challenge.title)
            .bind(&challenge.description)
            .bind(challenge.difficulty)
            .bind(&challenge.account_id)
            .fetch_one(&self.pool).await.map_err(storage_err)
        }
        async fn update_challenge(&self, id: &str, upd: ChallengeUpdate) -> RepoResult<Challenge> {
            upd.validate()?;
            sqlx::query_as::<_, Challenge>(&format!(
                "UPDATE challenges SET title = COALESCE($2, title), description = COALESCE($3, description), \
                 difficulty = COALESCE($4, difficulty) WHERE id = $1 RETURNING {CHALLENGE_COLS}"
            ))
            .bind(id)
            .bind(upd.title.as_ref())
            .bind(upd.description.as_ref())
            .bind(upd.difficulty)
            .fetch_optional(&self.pool).await.map_err(storage_err)?
            .ok_or_else(|| RepoError::not_found("challenge", id))
        }
        async fn delete_challenge(&self, id: &str) -> RepoResult<()> {
            let res = sqlx::query("DELETE FROM challenges WHERE id = $1")
                .bind(id)
                .execute(&self.pool).await.map_err(storage_err)?;
            affected(res.rows_affected(), "challenge", id)
        }
        async fn list_challenges(&self, page: Page) -> RepoResult<Paginated<Challenge>> {
            let items = sqlx::query_as::<_, Challenge>(&format!(
                "SELECT {CHALLENGE_COLS} FROM challenges ORDER BY id LIMIT $1 OFFSET $2"
            ))
            .bind(page.size())
            .bind(page.offset())
            .fetch_all(&self.pool).await.map_err(storage_err)?;
            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM challenges")
                .fetch_one(&self.pool).await.map_err(storage_err)?;
            Ok(Paginated { items, total })
        }
        async fn get_challenge(&self, id: &str) -> RepoResult<Challenge> {
            sqlx::query_as::<_, Challenge>(&format!("SELECT {CHALLENGE_COLS} FROM challenges WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool).await.map_err(storage_err)?
                .ok_or_else(|| RepoError::not_found("challenge", id))
        }
    }

    #[async_trait]
    impl CompanyRepo for PgRepo {
        async fn insert_company(&self, company: Company) -> RepoResult<Company> {
            company.validate()?;
            sqlx::query_as::<_, Company>(&format!(
                "INSERT INTO companies ({COMPANY_COLS}) VALUES ($1,$2,$3,$4,$5,$6) RETURNING {COMPANY_COLS}"
            ))
            .bind(&company.id)
            .bind(&company.name)
            .bind(company.image_path.as_ref())
            .bind(&company.location)
            .bind(&company.industry)
            .bind(&company.account_id)
            .fetch_one(&self.pool).await.map_err(storage_err)
        }
        async fn update_company(&self, id: &str, upd: CompanyUpdate) -> RepoResult<Company> {
            upd.validate()?;
            sqlx::query_as::<_, Company>(&format!(
                "UPDATE companies SET name = COALESCE($2, name), image_path = COALESCE($3, image_path), \
                 location = COALESCE($4, location), industry = COALESCE($5, industry) \
                 WHERE id = $1 RETURNING {COMPANY_COLS}"
            ))
            .bind(id)
            .bind(upd.name.as_ref())
            .bind(upd.image_path.as_ref())
            .bind(upd.location.as_ref())
            .bind(upd.industry.as_ref())
            .fetch_optional(&self.pool).await.map_err(storage_err)?
            .ok_or_else(|| RepoError::not_found("company", id))
        }
        async fn delete_company(&self, id: &str) -> RepoResult<()> {
            let res = sqlx::query("DELETE FROM companies WHERE id = $1")
                .bind(id)
                .execute(&self.pool).await.map_err(storage_err)?;
            affected(res.rows_affected(), "company", id)
        }
        async fn list_companies(&self, page: Page) -> RepoResult<Paginated<Company>> {
            let items = sqlx::query_as::<_, Company>(&format!(
                "SELECT {COMPANY_COLS} FROM companies ORDER BY id LIMIT $1 OFFSET $2"
            ))
            .bind(page.size())
            .bind(page.offset())
            .fetch_all(&self.pool).await.map_err(storage_err)?;
            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM companies")
                .fetch_one(&self.pool).await.map_err(storage_err)?;
            Ok(Paginated { items, total })
        }
        async fn get_company(&self, id: &str) -> RepoResult<Company> {
            sqlx::query_as::<_, Company>(&format!("SELECT {COMPANY_COLS} FROM companies WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool).await.map_err(storage_err)?
                .ok_or_else(|| RepoError::not_found("company", id))
        }
    }
}
