use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::auth::TokenError;
use crate::credential::CredentialError;
use crate::repo::RepoError;

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiErrorBody {
    pub error: String,
}

/// Client-facing error. Messages are stable per variant; storage and crypto
/// detail is logged here and never put in a response.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0}")] BadRequest(String),
    #[error("unauthorized")] Unauthorized,
    #[error("invalid credentials")] InvalidCredentials,
    #[error("{0}")] NotFound(String),
    #[error("conflict")] Conflict,
    #[error("internal error")] Internal,
}

impl From<RepoError> for ApiError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Validation { .. } | RepoError::InvalidPagination => ApiError::BadRequest(e.to_string()),
            RepoError::NotFound { entity, .. } => ApiError::NotFound(format!("{entity} not found")),
            RepoError::Conflict => ApiError::Conflict,
            RepoError::Unavailable(_) | RepoError::NotConfigured(_) => {
                error!("storage failure: {e}");
                ApiError::Internal
            }
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Encoding(_) => {
                error!("token failure: {e}");
                ApiError::Internal
            }
            _ => ApiError::Unauthorized,
        }
    }
}

impl From<CredentialError> for ApiError {
    fn from(e: CredentialError) -> Self {
        match e {
            CredentialError::InvalidSecret(msg) => ApiError::BadRequest(msg),
            CredentialError::Encoding(_) => {
                error!("credential failure: {e}");
                ApiError::Internal
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ApiErrorBody { error: self.to_string() })
    }
}
