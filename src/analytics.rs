use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;

use crate::{
    error::AppError,
    models::{AnalyticsSummary, DailyRevenue, OrderRecord},
};

/// DateRange
///
/// Inclusive range of UTC calendar days. Either bound may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

impl DateRange {
    /// Rejects ranges whose start falls after their end.
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self, AppError> {
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(AppError::bad_request("Invalid date range"));
            }
        }
        Ok(Self { from, to })
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn from(&self) -> Option<NaiveDate> {
        self.from
    }

    pub fn to(&self) -> Option<NaiveDate> {
        self.to
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let day = at.date_naive();
        self.from.is_none_or(|from| day >= from) && self.to.is_none_or(|to| day <= to)
    }

    /// First instant covered by the range, for SQL lower bounds.
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.from
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }

    /// First instant after the range, for exclusive SQL upper bounds.
    pub fn end_exclusive(&self) -> Option<DateTime<Utc>> {
        self.to
            .and_then(|d| d.succ_opt())
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }
}

/// Keeps the rows whose `created_at` falls inside `range`.
pub fn filter_by_range<'a>(
    orders: &'a [OrderRecord],
    range: &'a DateRange,
) -> impl Iterator<Item = &'a OrderRecord> {
    orders.iter().filter(move |order| range.contains(order.created_at))
}

/// summarize
///
/// Aggregates in-range orders into totals and a per-day breakdown sorted by date.
pub fn summarize(orders: &[OrderRecord], range: &DateRange) -> AnalyticsSummary {
    let mut daily: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
    let mut order_count = 0i64;
    let mut revenue_cents = 0i64;

    for order in filter_by_range(orders, range) {
        order_count += 1;
        revenue_cents += order.total_cents;

        let entry = daily.entry(order.created_at.date_naive()).or_default();
        entry.0 += 1;
        entry.1 += order.total_cents;
    }

    let average_order_cents = if order_count == 0 {
        0
    } else {
        revenue_cents / order_count
    };

    AnalyticsSummary {
        from: range.from(),
        to: range.to(),
        order_count,
        revenue_cents,
        average_order_cents,
        daily: daily
            .into_iter()
            .map(|(date, (orders, revenue_cents))| DailyRevenue {
                date,
                orders,
                revenue_cents,
            })
            .collect(),
    }
}
