//! Record store adapter (spec §4.3): durable insertion of campaign and coupon rows, with
//! lookups by campaign id. Two implementations: [`SqlxRecordStore`] for production and
//! [`InMemoryRecordStore`] for tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::models::{Campaign, Coupon};

#[derive(Debug, thiserror::Error)]
pub enum RecordStoreError {
    #[error("duplicate coupon code")]
    DuplicateCode,
    #[error("campaign not found")]
    CampaignNotFound,
    #[error("sql error: {0}")]
    Sql(#[from] sqlx::Error),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert_campaign(
        &self,
        name: &str,
        start: DateTime<Utc>,
        total: i64,
    ) -> Result<i64, RecordStoreError>;

    async fn insert_coupon(
        &self,
        campaign_id: i64,
        code: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<(), RecordStoreError>;

    async fn select_campaign(&self, id: i64) -> Result<Option<Campaign>, RecordStoreError>;

    async fn select_codes(&self, campaign_id: i64) -> Result<Vec<String>, RecordStoreError>;
}

/// Production adapter backed by a pooled Postgres connection.
///
/// Schema (see spec §6):
/// ```sql
/// CREATE TABLE campaigns (
///     id BIGSERIAL PRIMARY KEY,
///     name TEXT NOT NULL,
///     start_time TIMESTAMPTZ NOT NULL,
///     total_coupons BIGINT NOT NULL
/// );
/// CREATE TABLE coupons (
///     id BIGSERIAL PRIMARY KEY,
///     campaign_id BIGINT NOT NULL REFERENCES campaigns(id),
///     coupon_code TEXT NOT NULL,
///     issued_at TIMESTAMPTZ NOT NULL,
///     UNIQUE (campaign_id, coupon_code)
/// );
/// ```
pub struct SqlxRecordStore {
    pool: sqlx::PgPool,
}

impl SqlxRecordStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for SqlxRecordStore {
    async fn insert_campaign(
        &self,
        name: &str,
        start: DateTime<Utc>,
        total: i64,
    ) -> Result<i64, RecordStoreError> {
        let row: (i64,) = sqlx::query_as(
            "INSERT INTO campaigns (name, start_time, total_coupons) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(name)
        .bind(start)
        .bind(total)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    async fn insert_coupon(
        &self,
        campaign_id: i64,
        code: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<(), RecordStoreError> {
        let result = sqlx::query(
            "INSERT INTO coupons (campaign_id, coupon_code, issued_at) VALUES ($1, $2, $3)",
        )
        .bind(campaign_id)
        .bind(code)
        .bind(issued_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(RecordStoreError::DuplicateCode)
            }
            Err(e) => Err(RecordStoreError::Sql(e)),
        }
    }

    async fn select_campaign(&self, id: i64) -> Result<Option<Campaign>, RecordStoreError> {
        let campaign = sqlx::query_as::<_, Campaign>(
            "SELECT id, name, start_time, total_coupons FROM campaigns WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(campaign)
    }

    async fn select_codes(&self, campaign_id: i64) -> Result<Vec<String>, RecordStoreError> {
        let rows = sqlx::query_as::<_, Coupon>(
            "SELECT id, campaign_id, coupon_code, issued_at FROM coupons WHERE campaign_id = $1",
        )
        .bind(campaign_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|c| c.coupon_code).collect())
    }
}

#[derive(Default)]
struct InMemoryState {
    campaigns: HashMap<i64, Campaign>,
    next_id: i64,
    codes_by_campaign: HashMap<i64, Vec<String>>,
    seen_codes: HashSet<(i64, String)>,
}

/// Test-support adapter enforcing the same `(campaign_id, code)` uniqueness constraint the
/// production schema does, entirely in-process.
#[derive(Default)]
pub struct InMemoryRecordStore {
    state: Mutex<InMemoryState>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert_campaign(
        &self,
        name: &str,
        start: DateTime<Utc>,
        total: i64,
    ) -> Result<i64, RecordStoreError> {
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.campaigns.insert(
            id,
            Campaign {
                id,
                name: name.to_string(),
                start_time: start,
                total_coupons: total,
            },
        );
        state.codes_by_campaign.insert(id, Vec::new());
        Ok(id)
    }

    async fn insert_coupon(
        &self,
        campaign_id: i64,
        code: &str,
        _issued_at: DateTime<Utc>,
    ) -> Result<(), RecordStoreError> {
        let mut state = self.state.lock();
        if !state.campaigns.contains_key(&campaign_id) {
            return Err(RecordStoreError::CampaignNotFound);
        }
        let key = (campaign_id, code.to_string());
        if !state.seen_codes.insert(key) {
            return Err(RecordStoreError::DuplicateCode);
        }
        state
            .codes_by_campaign
            .entry(campaign_id)
            .or_default()
            .push(code.to_string());
        Ok(())
    }

    async fn select_campaign(&self, id: i64) -> Result<Option<Campaign>, RecordStoreError> {
        Ok(self.state.lock().campaigns.get(&id).cloned())
    }

    async fn select_codes(&self, campaign_id: i64) -> Result<Vec<String>, RecordStoreError> {
        Ok(self
            .state
            .lock()
            .codes_by_campaign
            .get(&campaign_id)
            .cloned()
            .unwrap_or_default())
    }
}
