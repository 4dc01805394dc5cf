//! Campaign lifecycle (spec §4.4): create, hydrate the counter store, and inspect.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{instrument, warn};

use crate::error::EngineError;
use crate::models::Campaign;
use crate::store::counter::CounterStoreError;
use crate::store::record::RecordStoreError;
use crate::store::{CounterStore, RecordStore};

/// Maps a record-store failure to the client-facing taxonomy without leaking adapter-internal
/// detail (raw SQL error text) into the response body — only the log line gets it.
fn record_store_unavailable(e: RecordStoreError) -> EngineError {
    warn!(error = %e, "record store adapter failure mapped to taxonomy");
    EngineError::Internal("campaign store unavailable".into())
}

/// As above, for the counter store (raw Redis error text stays out of the response body).
fn counter_store_unavailable(e: CounterStoreError) -> EngineError {
    warn!(error = %e, "counter store adapter failure mapped to taxonomy");
    EngineError::Internal("campaign store unavailable".into())
}

pub struct CampaignLifecycle {
    counter_store: Arc<dyn CounterStore>,
    record_store: Arc<dyn RecordStore>,
}

impl CampaignLifecycle {
    pub fn new(counter_store: Arc<dyn CounterStore>, record_store: Arc<dyn RecordStore>) -> Self {
        Self {
            counter_store,
            record_store,
        }
    }

    /// Creates a campaign: inserts the durable row first, then hydrates the counter store's
    /// `startTime` and `coupons` entries. If the counter writes fail, the call fails — an
    /// orphan campaign row is acceptable, since `IssueCoupon` is gated on the counter entry's
    /// existence and an orphan campaign can never issue.
    #[instrument(skip(self))]
    pub async fn create_campaign(
        &self,
        name: &str,
        start: DateTime<Utc>,
        total: i64,
    ) -> Result<i64, EngineError> {
        if name.is_empty() {
            return Err(EngineError::InvalidArgument("name must not be empty".into()));
        }
        if total <= 0 {
            return Err(EngineError::InvalidArgument(
                "total_coupons must be positive".into(),
            ));
        }

        let id = self
            .record_store
            .insert_campaign(name, start, total)
            .await
            .map_err(record_store_unavailable)?;

        let hydrate = async {
            self.counter_store
                .set(&format!("campaign:{id}:startTime"), &start.to_rfc3339())
                .await?;
            self.counter_store
                .set(&format!("campaign:{id}:coupons"), &total.to_string())
                .await
        }
        .await;

        hydrate.map_err(counter_store_unavailable)?;

        Ok(id)
    }

    /// Read-only, unlinearized against concurrent `IssueCoupon` calls: a caller may observe any
    /// prefix of the currently-committed coupons.
    #[instrument(skip(self))]
    pub async fn get_campaign(
        &self,
        id: i64,
    ) -> Result<(Campaign, Vec<String>), EngineError> {
        let campaign = self
            .record_store
            .select_campaign(id)
            .await
            .map_err(record_store_unavailable)?
            .ok_or(EngineError::CampaignNotFound)?;

        let codes = self
            .record_store
            .select_codes(id)
            .await
            .map_err(record_store_unavailable)?;

        Ok((campaign, codes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::counter::InMemoryCounterStore;
    use crate::store::record::InMemoryRecordStore;

    fn lifecycle() -> CampaignLifecycle {
        CampaignLifecycle::new(
            Arc::new(InMemoryCounterStore::new()),
            Arc::new(InMemoryRecordStore::new()),
        )
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let lc = lifecycle();
        let start = Utc::now();
        let id = lc.create_campaign("Burst", start, 10).await.unwrap();

        let (campaign, codes) = lc.get_campaign(id).await.unwrap();
        assert_eq!(campaign.name, "Burst");
        assert_eq!(campaign.total_coupons, 10);
        assert!(codes.is_empty());

        let stored_start = lc
            .counter_store
            .get(&format!("campaign:{id}:startTime"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored_start, start.to_rfc3339());
    }

    #[tokio::test]
    async fn empty_name_is_rejected() {
        let lc = lifecycle();
        let err = lc
            .create_campaign("", Utc::now(), 10)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid-argument");
    }

    #[tokio::test]
    async fn nonpositive_total_is_rejected() {
        let lc = lifecycle();
        let err = lc.create_campaign("X", Utc::now(), 0).await.unwrap_err();
        assert_eq!(err.kind(), "invalid-argument");
    }

    #[tokio::test]
    async fn unknown_campaign_get_fails_not_found() {
        let lc = lifecycle();
        let err = lc.get_campaign(42).await.unwrap_err();
        assert_eq!(err.kind(), "campaign-not-found");
    }
}
