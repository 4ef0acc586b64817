use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Identifiers are application generated (UUID v4 strings), never db sequences
pub type Id = String;

/// Stored account row. Not `Serialize`: everything leaving the process goes
/// through [`AccountView`] so the hash can never end up in a response.
#[derive(Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Account {
    pub id: Id,
    pub fullname: String,
    pub email: String,
    pub password_hash: String,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("fullname", &self.fullname)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// Public projection of an account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct AccountView {
    pub id: Id,
    pub fullname: String,
    pub email: String,
}

impl From<Account> for AccountView {
    fn from(a: Account) -> Self {
        Self { id: a.id, fullname: a.fullname, email: a.email }
    }
}

/// Partial account update. Id and email are immutable, so anything else in
/// the body is rejected at deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AccountUpdate {
    pub fullname: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct SignupRequest {
    pub email: String,
    pub fullname: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SignupResponse {
    pub id: Id,
    pub email: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, sqlx::FromRow)]
pub struct Challenge {
    pub id: Id,
    pub title: String,
    pub description: String,
    pub difficulty: i32,
    pub account_id: Id,
}

/// Body of `POST /challenges`. Missing fields deserialize to empty values and
/// are reported by validation, naming the field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct NewChallenge {
    pub title: String,
    pub description: String,
    pub difficulty: i32,
    /// Owner; defaults to the authenticated account.
    pub account_id: Option<Id>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ChallengeUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub difficulty: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, sqlx::FromRow)]
pub struct Company {
    pub id: Id,
    pub name: String,
    pub image_path: Option<String>,
    pub location: String,
    pub industry: String,
    pub account_id: Id,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct NewCompany {
    pub name: String,
    pub image_path: Option<String>,
    pub location: String,
    pub industry: String,
    pub account_id: Option<Id>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CompanyUpdate {
    pub name: Option<String>,
    pub image_path: Option<String>,
    pub location: Option<String>,
    pub industry: Option<String>,
}
