use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{http::header, Error, HttpMessage, ResponseError};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;

use crate::auth::{verify, CurrentAccount, TokenError, TokenKeys};
use crate::error::ApiError;

/// Routes reachable without a token (exact match).
pub const PUBLIC_PATHS: &[&str] = &["/", "/signup", "/login"];

/// Route prefixes reachable without a token (API docs).
pub const PUBLIC_PREFIXES: &[&str] = &["/docs/"];

pub fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path) || PUBLIC_PREFIXES.iter().any(|p| path.starts_with(p))
}

/// Token from the `Authorization` header, either raw or as `Bearer <token>`.
fn header_token(req: &ServiceRequest) -> Option<String> {
    let raw = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Authorization gate. Runs once per request before any handler: public
/// routes pass untouched, every other request needs a valid token and gets
/// its account id attached as [`CurrentAccount`].
#[derive(Clone)]
pub struct AuthGate {
    keys: Arc<TokenKeys>,
}

impl AuthGate {
    pub fn new(keys: TokenKeys) -> Self {
        Self { keys: Arc::new(keys) }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthGateMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGateMiddleware {
            service: Rc::new(service),
            keys: self.keys.clone(),
        }))
    }
}

pub struct AuthGateMiddleware<S> {
    service: Rc<S>,
    keys: Arc<TokenKeys>,
}

impl<S, B> Service<ServiceRequest> for AuthGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if !is_public(req.path()) {
            let verdict = header_token(&req)
                .ok_or(TokenError::Malformed)
                .and_then(|token| verify(&token, &self.keys));
            match verdict {
                Ok(claims) => {
                    req.extensions_mut().insert(CurrentAccount(claims.account_id));
                }
                Err(e) => {
                    // the client only ever sees a generic 401
                    debug!(path = %req.path(), reason = %e, "request rejected by auth gate");
                    let res = req.into_response(ApiError::Unauthorized.error_response());
                    return Box::pin(async move { Ok(res.map_into_right_body()) });
                }
            }
        }

        let svc = self.service.clone();
        Box::pin(async move {
            let res = svc.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_is_exact() {
        assert!(is_public("/"));
        assert!(is_public("/signup"));
        assert!(is_public("/login"));
        assert!(is_public("/docs/index.html"));
        assert!(!is_public("/signup/extra"));
        assert!(!is_public("/users/login"));
        assert!(!is_public("/challenges"));
        assert!(!is_public("/me"));
    }
}
