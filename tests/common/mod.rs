//! Shared test fixtures: a record store wrapper that injects failures on a fixed cadence, used
//! to exercise the compensation path (spec §8 scenario 3) without a live database.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use couponrace::models::Campaign;
use couponrace::store::record::{InMemoryRecordStore, RecordStore, RecordStoreError};

pub struct FlakyRecordStore {
    inner: InMemoryRecordStore,
    calls: AtomicUsize,
    fail_every: usize,
}

impl FlakyRecordStore {
    pub fn new(fail_every: usize) -> Self {
        Self {
            inner: InMemoryRecordStore::new(),
            calls: AtomicUsize::new(0),
            fail_every,
        }
    }
}

#[async_trait]
impl RecordStore for FlakyRecordStore {
    async fn insert_campaign(
        &self,
        name: &str,
        start: DateTime<Utc>,
        total: i64,
    ) -> Result<i64, RecordStoreError> {
        self.inner.insert_campaign(name, start, total).await
    }

    async fn insert_coupon(
        &self,
        campaign_id: i64,
        code: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<(), RecordStoreError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n % self.fail_every == 0 {
            return Err(RecordStoreError::Sql(sqlx::Error::RowNotFound));
        }
        self.inner.insert_coupon(campaign_id, code, issued_at).await
    }

    async fn select_campaign(&self, id: i64) -> Result<Option<Campaign>, RecordStoreError> {
        self.inner.select_campaign(id).await
    }

    async fn select_codes(&self, campaign_id: i64) -> Result<Vec<String>, RecordStoreError> {
        self.inner.select_codes(campaign_id).await
    }
}
