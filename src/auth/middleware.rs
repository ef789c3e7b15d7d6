//! Request guard for protected routes.
//!
//! Every request passes through the same three steps, in this order:
//!
//! 1. [`bearer_token`]: no `Authorization` header is a 401.
//! 2. [`ensure_not_revoked`]: a blacklisted token is a 403, even if its signature
//!    and expiry would still pass.
//! 3. [`verify`]: a bad signature, malformed token or expired token is a 403.
//!
//! On success the decoded [`Claims`] are stored in the request extensions, where
//! handlers read them through [`AuthenticatedUser`](super::AuthenticatedUser).

use std::rc::Rc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{self, HeaderMap},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::token::{Claims, TokenIssuer};
use crate::cache::SessionCache;
use crate::error::AppError;
use crate::state::AppState;

/// Extracts the token from an `Authorization: Bearer <token>` header.
///
/// A missing header is [`AppError::MissingToken`]; a header that is present but
/// not a bearer credential is [`AppError::InvalidToken`].
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AppError::MissingToken)?;

    value
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::InvalidToken("malformed Authorization header".into()))
}

pub async fn ensure_not_revoked(sessions: &SessionCache, token: &str) -> Result<(), AppError> {
    if sessions.is_blacklisted(token).await? {
        return Err(AppError::RevokedToken);
    }
    Ok(())
}

pub fn verify(tokens: &TokenIssuer, token: &str) -> Result<Claims, AppError> {
    tokens.verify(token).map_err(|e| {
        log::debug!("Rejected token: {}", e);
        AppError::Forbidden("Invalid or expired token".into())
    })
}

/// Runs the full guard pipeline against a request's headers.
pub async fn authorize(state: &AppState, headers: &HeaderMap) -> Result<Claims, AppError> {
    let token = bearer_token(headers).map_err(|e| match e {
        AppError::InvalidToken(_) => AppError::Forbidden("Invalid or expired token".into()),
        other => other,
    })?;
    ensure_not_revoked(&state.sessions, token).await?;
    verify(&state.tokens, token)
}

/// Middleware factory. Wrap a scope or resource with it to require a live token.
pub struct AuthGuard;

impl<S, B> Transform<S, ServiceRequest> for AuthGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthGuardMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGuardMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthGuardMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthGuardMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let outcome = match req.app_data::<web::Data<AppState>>().cloned() {
                Some(state) => authorize(&state, req.headers()).await,
                None => Err(AppError::Internal(
                    "application state is not configured".into(),
                )),
            };

            match outcome {
                Ok(claims) => {
                    req.extensions_mut().insert(claims);
                    service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body)
                }
                // Rejections are responses, never service errors.
                Err(e) => {
                    log::info!("Rejected {} {}: {}", req.method(), req.path(), e);
                    Ok(req.error_response(e).map_into_right_body())
                }
            }
        })
    }
}
