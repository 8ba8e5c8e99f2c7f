use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Rows read from the store ---

/// OrderRecord
///
/// One row of the `orders` table as needed by the analytics endpoints. The order's
/// line items and fulfilment details are owned by the storefront CRUD services.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct OrderRecord {
    pub id: Uuid,
    pub customer_id: Uuid,
    /// Order total in the smallest currency unit.
    pub total_cents: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

// --- Request payloads ---

/// PresignedUrlRequest
///
/// Input for POST /uploads/presigned.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlRequest {
    /// The original filename. Only its extension is used.
    #[schema(example = "red-sneaker.png")]
    pub filename: String,
    /// The declared MIME type. Must match the extension.
    #[schema(example = "image/png")]
    pub file_type: String,
}

// --- Responses ---

/// PresignedUrlResponse
///
/// A short-lived URL the client PUTs the file to, and the key to reference it by.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlResponse {
    pub upload_url: String,
    pub resource_key: String,
}

/// DashboardStats
///
/// Counters shown on the admin dashboard landing page (GET /admin/stats).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq, Eq)]
#[ts(export)]
pub struct DashboardStats {
    pub total_orders: i64,
    pub total_customers: i64,
    pub total_products: i64,
    /// Quotes still awaiting an admin response.
    pub pending_quotes: i64,
}

/// DailyRevenue
///
/// One calendar day (UTC) of the analytics breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq)]
#[ts(export)]
pub struct DailyRevenue {
    #[ts(type = "string")]
    pub date: NaiveDate,
    pub orders: i64,
    pub revenue_cents: i64,
}

/// AnalyticsSummary
///
/// Output of GET /admin/analytics.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq, Eq)]
#[ts(export)]
pub struct AnalyticsSummary {
    #[ts(type = "string | null")]
    pub from: Option<NaiveDate>,
    #[ts(type = "string | null")]
    pub to: Option<NaiveDate>,
    pub order_count: i64,
    pub revenue_cents: i64,
    pub average_order_cents: i64,
    pub daily: Vec<DailyRevenue>,
}
