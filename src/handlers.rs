use crate::{
    AppState,
    analytics::{self, DateRange},
    auth::Principal,
    error::AppError,
    models::{AnalyticsSummary, DashboardStats, PresignedUrlRequest, PresignedUrlResponse},
    upload,
};
use axum::{
    Json,
    extract::{Query, State},
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::time::Duration;

/// AnalyticsFilter
///
/// Query parameters for GET /admin/analytics. Dates are UTC calendar days, inclusive.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct AnalyticsFilter {
    /// First day to include (YYYY-MM-DD).
    pub from: Option<NaiveDate>,
    /// Last day to include (YYYY-MM-DD).
    pub to: Option<NaiveDate>,
}

/// get_me
///
/// [Authenticated Route] Echoes the principal attached by the auth middleware.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Current principal", body = Principal),
        (status = 401, description = "Missing or invalid credential")
    )
)]
pub async fn get_me(principal: Principal) -> Json<Principal> {
    Json(principal)
}

/// get_presigned_url
///
/// [Authenticated Route] Validates the file against the upload allow-list and returns
/// a presigned URL under a freshly generated key.
#[utoipa::path(
    post,
    path = "/uploads/presigned",
    request_body = PresignedUrlRequest,
    responses(
        (status = 200, description = "URL", body = PresignedUrlResponse),
        (status = 400, description = "Unsupported file type")
    )
)]
pub async fn get_presigned_url(
    principal: Principal,
    State(state): State<AppState>,
    Json(payload): Json<PresignedUrlRequest>,
) -> Result<Json<PresignedUrlResponse>, AppError> {
    let validated = upload::validate_upload(&payload.filename, &payload.file_type)?;
    let object_key = upload::generate_object_key(&validated);
    let expires_in = Duration::from_secs(state.config.upload_url_ttl_secs);

    let upload_url = state
        .storage
        .presign_upload(&object_key, validated.content_type, expires_in)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, key = %object_key, "presign failed");
            AppError::Internal
        })?;

    tracing::info!(subject = %principal.subject, key = %object_key, "upload url issued");

    Ok(Json(PresignedUrlResponse {
        upload_url,
        resource_key: object_key,
    }))
}

/// get_admin_stats
///
/// [Admin Route] Dashboard counters.
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses(
        (status = 200, description = "Stats", body = DashboardStats),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn get_admin_stats(
    State(state): State<AppState>,
) -> Result<Json<DashboardStats>, AppError> {
    Ok(Json(state.repo.get_stats().await?))
}

/// get_analytics
///
/// [Admin Route] Revenue summary over an optional date range.
#[utoipa::path(
    get,
    path = "/admin/analytics",
    params(AnalyticsFilter),
    responses(
        (status = 200, description = "Summary", body = AnalyticsSummary),
        (status = 400, description = "Invalid date range"),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn get_analytics(
    State(state): State<AppState>,
    Query(filter): Query<AnalyticsFilter>,
) -> Result<Json<AnalyticsSummary>, AppError> {
    let range = DateRange::new(filter.from, filter.to)?;
    let orders = state.repo.get_orders(&range).await?;

    Ok(Json(analytics::summarize(&orders, &range)))
}
