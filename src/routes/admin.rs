use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Dashboard endpoints. `create_router` wraps this router in `require_auth` and then
/// `require_admin`, so a request only reaches these handlers with role "admin".
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/stats
        .route("/stats", get(handlers::get_admin_stats))
        // GET /admin/analytics?from=YYYY-MM-DD&to=YYYY-MM-DD
        .route("/analytics", get(handlers::get_analytics))
}
