use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Routes for any caller with a valid bearer token, customers and admins alike.
/// `create_router` layers `require_auth` over this router, so every handler here can
/// take `Principal` as an argument.
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        // GET /me
        .route("/me", get(handlers::get_me))
        // POST /uploads/presigned
        // Validates the file type and returns a short-lived direct-to-bucket URL.
        .route("/uploads/presigned", post(handlers::get_presigned_url))
}
