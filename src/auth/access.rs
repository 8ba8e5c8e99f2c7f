//! Access control in front of protected routes.
//!
//! Two stages run in order. Authentication reads the bearer token, verifies it and
//! attaches the resulting `Principal` to the request extensions. Authorization
//! compares the attached principal's role against the route's requirement. Either
//! stage short-circuits with an `AppError`, which becomes the HTTP response.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};

use super::verifier::{CredentialVerifier, Principal, VerifierState};
use crate::error::AppError;

pub const ADMIN_ROLE: &str = "admin";

const BEARER_PREFIX: &str = "Bearer ";

/// What a route group requires of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPolicy {
    /// Any principal with a valid credential.
    Authenticated,
    /// A valid credential whose role equals the given label.
    Role(&'static str),
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
///
/// Returns `None` when the header is absent, not valid UTF-8, uses another scheme,
/// or carries an empty token.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
        .filter(|token| !token.is_empty())
}

/// Authentication stage. The verifier is only consulted once a bearer token exists.
pub fn authenticate(
    headers: &HeaderMap,
    verifier: &dyn CredentialVerifier,
) -> Result<Principal, AppError> {
    let token = bearer_token(headers).ok_or(AppError::MissingCredential)?;

    verifier.verify(token).map_err(|_| AppError::InvalidToken)
}

/// Authorization stage. A missing principal is a hard failure, never a pass.
pub fn authorize(principal: Option<&Principal>, role: &'static str) -> Result<(), AppError> {
    match principal {
        Some(principal) if principal.has_role(role) => Ok(()),
        Some(principal) => {
            tracing::debug!(
                subject = %principal.subject,
                role = %principal.role,
                required = role,
                "role check failed"
            );
            Err(AppError::forbidden(role))
        }
        None => {
            tracing::warn!(required = role, "role check reached without a principal");
            Err(AppError::forbidden(role))
        }
    }
}

/// Runs the full pipeline for a policy and returns the principal on success.
pub fn evaluate(
    headers: &HeaderMap,
    verifier: &dyn CredentialVerifier,
    policy: AccessPolicy,
) -> Result<Principal, AppError> {
    let principal = authenticate(headers, verifier)?;

    if let AccessPolicy::Role(role) = policy {
        authorize(Some(&principal), role)?;
    }

    Ok(principal)
}

/// require_auth
///
/// Middleware for `AccessPolicy::Authenticated` route groups. On success the
/// principal is inserted into the request extensions for downstream stages.
pub async fn require_auth(
    State(verifier): State<VerifierState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let principal = evaluate(
        request.headers(),
        verifier.as_ref(),
        AccessPolicy::Authenticated,
    )?;

    tracing::debug!(subject = %principal.subject, role = %principal.role, "request authenticated");
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

/// require_role
///
/// Authorization stage as middleware. Must be layered inside `require_auth`; wrap it
/// in a closure capturing the role, see `create_router`.
pub async fn require_role(
    role: &'static str,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    authorize(request.extensions().get::<Principal>(), role)?;

    Ok(next.run(request).await)
}

/// Handlers take `Principal` as an argument to read the identity attached by
/// `require_auth`. Without that middleware the extractor rejects with 401.
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or(AppError::MissingCredential)
    }
}
