use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};

use crate::error::ApiError;
use crate::models::Id;

/// Lifetime of every issued token.
pub const TOKEN_TTL_HOURS: i64 = 24;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

/// Identity and validity window carried by a signed token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub account_id: Id,
    /// issued-at, unix seconds
    pub iat: i64,
    /// expires-at, unix seconds; always `iat + 24h`
    pub exp: i64,
}

impl Claims {
    pub fn new(account_id: &str, now: DateTime<Utc>) -> Self {
        let iat = now.timestamp();
        Self {
            account_id: account_id.to_string(),
            iat,
            exp: iat + Duration::hours(TOKEN_TTL_HOURS).num_seconds(),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() > self.exp
    }
}

/// HS256 key pair derived from the shared signing secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Sign a fresh 24h token for `account_id`.
pub fn issue(account_id: &str, keys: &TokenKeys) -> Result<String, TokenError> {
    issue_at(account_id, keys, Utc::now())
}

pub fn issue_at(account_id: &str, keys: &TokenKeys, now: DateTime<Utc>) -> Result<String, TokenError> {
    let claims = Claims::new(account_id, now);
    encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
        .map_err(|e| TokenError::Encoding(e.to_string()))
}

/// Check the signature, then the structure, then expiry.
pub fn verify(token: &str, keys: &TokenKeys) -> Result<Claims, TokenError> {
    verify_at(token, keys, Utc::now())
}

pub fn verify_at(token: &str, keys: &TokenKeys, now: DateTime<Utc>) -> Result<Claims, TokenError> {
    // expiry is checked below against `now` so a well-signed expired token is
    // always reported as Expired
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    let data = decode::<Claims>(token, &keys.decoding, &validation).map_err(|e| match e.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    })?;
    if data.claims.is_expired_at(now) {
        return Err(TokenError::Expired);
    }
    Ok(data.claims)
}

/// Account id attached to the request by the authorization gate.
///
/// Extracting it never re-verifies the token; a handler mounted outside the
/// gate gets 401.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentAccount(pub Id);

impl FromRequest for CurrentAccount {
    type Error = ApiError;
    type Future = Ready<Result<Self, ApiError>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<CurrentAccount>()
                .cloned()
                .ok_or(ApiError::Unauthorized),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-must-be-32-bytes-long!!";

    fn keys() -> TokenKeys {
        TokenKeys::new(SECRET)
    }

    #[test]
    fn issue_then_verify_returns_account() {
        let token = issue("acc-1", &keys()).unwrap();
        let claims = verify(&token, &keys()).unwrap();
        assert_eq!(claims.account_id, "acc-1");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn valid_until_the_last_second() {
        let issued = Utc::now() - Duration::hours(1);
        let token = issue_at("acc-1", &keys(), issued).unwrap();
        let edge = issued + Duration::hours(TOKEN_TTL_HOURS);
        assert!(verify_at(&token, &keys(), edge).is_ok());
        assert_eq!(
            verify_at(&token, &keys(), edge + Duration::seconds(1)).unwrap_err(),
            TokenError::Expired
        );
    }

    #[test]
    fn expired_token_is_not_a_signature_error() {
        let token = issue_at("acc-1", &keys(), Utc::now() - Duration::hours(25)).unwrap();
        assert_eq!(verify(&token, &keys()).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn any_payload_byte_change_breaks_the_signature() {
        let token = issue("acc-1", &keys()).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);
        let payload = parts[1].as_bytes();
        for i in 0..payload.len() {
            let mut tampered = payload.to_vec();
            tampered[i] = if tampered[i] == b'A' { b'B' } else { b'A' };
            let forged = format!("{}.{}.{}", parts[0], String::from_utf8(tampered).unwrap(), parts[2]);
            assert_eq!(verify(&forged, &keys()).unwrap_err(), TokenError::InvalidSignature, "byte {i}");
        }
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue("acc-1", &keys()).unwrap();
        let other = TokenKeys::new("another-secret-that-is-32-bytes-long");
        assert_eq!(verify(&token, &other).unwrap_err(), TokenError::InvalidSignature);
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(verify("notatoken", &keys()).unwrap_err(), TokenError::Malformed);
        assert_eq!(verify("a.b", &keys()).unwrap_err(), TokenError::Malformed);
    }
}
