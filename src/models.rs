//! Durable domain types: `Campaign` and `Coupon` (see spec §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A time-gated allocation of a fixed number of coupons. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Campaign {
    pub id: i64,
    pub name: String,
    pub start_time: DateTime<Utc>,
    pub total_coupons: i64,
}

/// A single successful issuance. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Coupon {
    pub id: i64,
    pub campaign_id: i64,
    pub coupon_code: String,
    pub issued_at: DateTime<Utc>,
}
