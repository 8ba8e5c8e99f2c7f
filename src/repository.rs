use crate::{
    analytics::DateRange,
    models::{DashboardStats, OrderRecord},
};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("db error")]
    Db(#[from] sqlx::Error),
}

/// Repository
///
/// Read access the admin endpoints need from the relational store. The schema and the
/// storefront's CRUD operations belong to other services.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Orders created inside `range`, oldest first.
    async fn get_orders(&self, range: &DateRange) -> Result<Vec<OrderRecord>, RepoError>;

    /// Dashboard counters.
    async fn get_stats(&self) -> Result<DashboardStats, RepoError>;
}

/// RepositoryState
///
/// The shared persistence handle held in the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn count(&self, sql: &str) -> Result<i64, RepoError> {
        let count: i64 = sqlx::query_scalar(sql).fetch_one(&self.pool).await?;
        Ok(count)
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// get_orders
    ///
    /// Bounds are bound parameters via QueryBuilder; the upper bound is exclusive so a
    /// `to` day includes every order placed on it.
    async fn get_orders(&self, range: &DateRange) -> Result<Vec<OrderRecord>, RepoError> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            "SELECT id, customer_id, total_cents, status, created_at FROM orders WHERE status <> 'cancelled'",
        );

        if let Some(start) = range.start() {
            builder.push(" AND created_at >= ");
            builder.push_bind(start);
        }

        if let Some(end) = range.end_exclusive() {
            builder.push(" AND created_at < ");
            builder.push_bind(end);
        }

        builder.push(" ORDER BY created_at ASC");

        builder
            .build_query_as::<OrderRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("get_orders error: {:?}", e);
                RepoError::from(e)
            })
    }

    async fn get_stats(&self) -> Result<DashboardStats, RepoError> {
        Ok(DashboardStats {
            total_orders: self.count("SELECT COUNT(*) FROM orders").await?,
            total_customers: self.count("SELECT COUNT(*) FROM customers").await?,
            total_products: self.count("SELECT COUNT(*) FROM products").await?,
            pending_quotes: self
                .count("SELECT COUNT(*) FROM quotes WHERE status = 'pending'")
                .await?,
        })
    }
}
