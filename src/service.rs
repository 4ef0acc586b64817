//! Entity services: validate the request, then delegate to the gateway.
//!
//! Each service owns its handle to the gateway (`Arc<dyn Repo>`), injected
//! at construction; nothing here knows which backend is behind it.

use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::auth::{issue, CurrentAccount, TokenKeys};
use crate::credential::{hash_password, verify_password};
use crate::error::ApiError;
use crate::models::*;
use crate::repo::{require, Page, Paginated, Repo, RepoError, Validate};

fn new_id() -> Id {
    Uuid::new_v4().to_string()
}

/// bcrypt is CPU bound; keep it off the request worker.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("blocking task failed: {e}");
        ApiError::Internal
    })
}

/// Owner of a new challenge/company: the explicit `account_id` if given,
/// otherwise the caller. Either way it must exist.
async fn resolve_owner(repo: &dyn Repo, caller: &CurrentAccount, requested: Option<Id>) -> Result<Id, ApiError> {
    let owner = requested
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| caller.0.clone());
    repo.get_account(&owner).await?;
    Ok(owner)
}

#[derive(Clone)]
pub struct AccountService {
    repo: Arc<dyn Repo>,
    keys: Arc<TokenKeys>,
}

impl AccountService {
    pub fn new(repo: Arc<dyn Repo>, keys: TokenKeys) -> Self {
        Self { repo, keys: Arc::new(keys) }
    }

    pub async fn signup(&self, req: SignupRequest) -> Result<SignupResponse, ApiError> {
        require("email", &req.email)?;
        require("fullname", &req.fullname)?;
        require("password", &req.password)?;

        let password = req.password;
        let password_hash = blocking(move || hash_password(&password)).await??;
        let account = Account {
            id: new_id(),
            fullname: req.fullname.trim().to_string(),
            email: req.email.trim().to_string(),
            password_hash,
        };
        let created = self.repo.insert_account(account).await?;
        info!(account_id = %created.id, "account created");
        Ok(SignupResponse { id: created.id, email: created.email })
    }

    /// Unknown email and wrong password give the same answer.
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, ApiError> {
        require("email", &req.email)?;
        require("password", &req.password)?;

        let account = match self.repo.get_account_by_email(req.email.trim()).await {
            Ok(a) => a,
            Err(RepoError::NotFound { .. }) => return Err(ApiError::InvalidCredentials),
            Err(e) => return Err(e.into()),
        };
        let password = req.password;
        let hash = account.password_hash.clone();
        if !blocking(move || verify_password(&password, &hash)).await?? {
            return Err(ApiError::InvalidCredentials);
        }
        let token = issue(&account.id, &self.keys)?;
        info!(account_id = %account.id, "login succeeded");
        Ok(LoginResponse { token })
    }

    pub async fn me(&self, current: &CurrentAccount) -> Result<AccountView, ApiError> {
        self.get(&current.0).await
    }

    pub async fn get(&self, id: &str) -> Result<AccountView, ApiError> {
        Ok(self.repo.get_account(id).await?.into())
    }

    pub async fn list(&self, page: Page) -> Result<Paginated<AccountView>, ApiError> {
        Ok(self.repo.list_accounts(page).await?.map(AccountView::from))
    }

    pub async fn update(&self, id: &str, upd: AccountUpdate) -> Result<AccountView, ApiError> {
        Ok(self.repo.update_account(id, upd).await?.into())
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.repo.delete_account(id).await?;
        info!(account_id = %id, "account deleted");
        Ok(())
    }
}

#[derive(Clone)]
pub struct ChallengeService {
    repo: Arc<dyn Repo>,
}

impl ChallengeService {
    pub fn new(repo: Arc<dyn Repo>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, caller: &CurrentAccount, req: NewChallenge) -> Result<Challenge, ApiError> {
        let mut challenge = Challenge {
            id: new_id(),
            title: req.title.trim().to_string(),
            description: req.description.trim().to_string(),
            difficulty: req.difficulty,
            account_id: caller.0.clone(),
        };
        challenge.validate()?;
        challenge.account_id = resolve_owner(self.repo.as_ref(), caller, req.account_id).await?;
        Ok(self.repo.insert_challenge(challenge).await?)
    }

    pub async fn get(&self, id: &str) -> Result<Challenge, ApiError> {
        Ok(self.repo.get_challenge(id).await?)
    }

    pub async fn list(&self, page: Page) -> Result<Paginated<Challenge>, ApiError> {
        Ok(self.repo.list_challenges(page).await?)
    }

    pub async fn update(&self, id: &str, upd: ChallengeUpdate) -> Result<Challenge, ApiError> {
        Ok(self.repo.update_challenge(id, upd).await?)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        Ok(self.repo.delete_challenge(id).await?)
    }
}

#[derive(Clone)]
pub struct CompanyService {
    repo: Arc<dyn Repo>,
}

impl CompanyService {
    pub fn new(repo: Arc<dyn Repo>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, caller: &CurrentAccount, req: NewCompany) -> Result<Company, ApiError> {
        let mut company = Company {
            id: new_id(),
            name: req.name.trim().to_string(),
            image_path: req.image_path.filter(|p| !p.trim().is_empty()),
            location: req.location.trim().to_string(),
            industry: req.industry.trim().to_string(),
            account_id: caller.0.clone(),
        };
        company.validate()?;
        company.account_id = resolve_owner(self.repo.as_ref(), caller, req.account_id).await?;
        Ok(self.repo.insert_company(company).await?)
    }

    pub async fn get(&self, id: &str) -> Result<Company, ApiError> {
        Ok(self.repo.get_company(id).await?)
    }

    pub async fn list(&self, page: Page) -> Result<Paginated<Company>, ApiError> {
        Ok(self.repo.list_companies(page).await?)
    }

    pub async fn update(&self, id: &str, upd: CompanyUpdate) -> Result<Company, ApiError> {
        Ok(self.repo.update_company(id, upd).await?)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        Ok(self.repo.delete_company(id).await?)
    }
}
