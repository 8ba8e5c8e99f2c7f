use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::repository::RepoError;

/// ErrorResponse
///
/// Wire shape of every error returned by the API: `{ "error": "<message>" }`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// AppError
///
/// The single error type handlers and middleware return. Messages are deliberately
/// generic; the precise cause of an authentication failure is only logged server side.
#[derive(Debug, Error)]
pub enum AppError {
    /// No `Authorization` header, or one without a usable `Bearer` token.
    #[error("Missing or invalid authorization header")]
    MissingCredential,
    /// A bearer token was presented but failed verification.
    #[error("Invalid or expired token")]
    InvalidToken,
    /// Authenticated, but the principal lacks the role the route requires.
    #[error("{} access required", title_case(.role))]
    Forbidden { role: &'static str },
    #[error("{0}")]
    BadRequest(String),
    #[error("Internal server error")]
    Internal,
}

impl AppError {
    pub fn forbidden(role: &'static str) -> Self {
        Self::Forbidden { role }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingCredential | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn title_case(role: &str) -> String {
    let mut chars = role.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: self.to_string(),
        };

        let mut response = (status, Json(body)).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        tracing::error!(error = ?e, "repository failure");
        AppError::Internal
    }
}
