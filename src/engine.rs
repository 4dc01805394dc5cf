//! The issuance engine (spec §4.5) — the serialization point where every invariant in §3 is
//! maintained.
//!
//! Responsibilities:
//! - Gate check against the campaign's start instant.
//! - Atomic reservation via the counter store's decrement.
//! - Coupon minting and durable persistence.
//! - Compensation (counter increment) on any failure after reservation.
//!
//! Non-responsibilities:
//! - Campaign creation/hydration (`crate::campaign`).
//! - Picking a store technology (`crate::store`).
//!
//! Holds no per-campaign locks: serialization is delegated entirely to the counter store's
//! atomic decrement and the record store's uniqueness constraint.
//!
//! Deadline handling: the reservation-through-persist sequence runs directly under
//! `tokio::time::timeout`. If the deadline fires, the in-flight future is dropped and the engine
//! runs `compensate` before returning `deadline-exceeded` — a client that received an error must
//! never have a coupon land in the record store afterward without the counter reflecting the
//! lost reservation. This is what lets `issue_coupon` satisfy spec §5's "a cancelled request must
//! not leave the counter decremented without a corresponding increment" without process-local
//! locking.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{error, instrument, warn};

use crate::codegen::CodeGenerator;
use crate::error::{EngineError, IssuanceFailure};
use crate::store::{counter::CounterStoreError, record::RecordStoreError, CounterStore, RecordStore};

/// Default per-call deadline when none is supplied (used by tests and direct callers).
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(5);

fn start_time_key(campaign_id: i64) -> String {
    format!("campaign:{campaign_id}:startTime")
}

fn coupons_key(campaign_id: i64) -> String {
    format!("campaign:{campaign_id}:coupons")
}

pub struct IssuanceEngine {
    counter_store: Arc<dyn CounterStore>,
    record_store: Arc<dyn RecordStore>,
    codegen: CodeGenerator,
}

impl IssuanceEngine {
    pub fn new(counter_store: Arc<dyn CounterStore>, record_store: Arc<dyn RecordStore>) -> Self {
        Self {
            counter_store,
            record_store,
            codegen: CodeGenerator::new(),
        }
    }

    /// Runs the full issuance protocol for one claim against `campaign_id`, under the default
    /// deadline. See [`Self::issue_coupon_with_deadline`] for deadline-aware callers (the RPC
    /// surface).
    pub async fn issue_coupon(&self, campaign_id: i64) -> Result<String, EngineError> {
        self.issue_coupon_with_deadline(campaign_id, DEFAULT_DEADLINE)
            .await
    }

    #[instrument(skip(self), fields(campaign_id))]
    pub async fn issue_coupon_with_deadline(
        &self,
        campaign_id: i64,
        deadline: Duration,
    ) -> Result<String, EngineError> {
        self.gate_check(campaign_id).await?;

        let counter_store = self.counter_store.clone();
        let record_store = self.record_store.clone();
        let codegen = self.codegen;

        match tokio::time::timeout(
            deadline,
            reserve_mint_and_persist(counter_store.clone(), record_store, codegen, campaign_id),
        )
        .await
        {
            Ok(result) => result,
            Err(_elapsed) => {
                compensate(&counter_store, campaign_id).await;
                Err(EngineError::IssuanceFailed(IssuanceFailure::DeadlineExceeded))
            }
        }
    }

    /// Fetches and parses `campaign:<id>:startTime`, failing `campaign-not-found` if absent and
    /// `not-started` if the gate has not opened yet.
    async fn gate_check(&self, campaign_id: i64) -> Result<DateTime<Utc>, EngineError> {
        let raw = self
            .counter_store
            .get(&start_time_key(campaign_id))
            .await
            .map_err(|e| store_unavailable(e))?
            .ok_or(EngineError::CampaignNotFound)?;

        let start = DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| EngineError::Internal(format!("corrupt startTime value: {e}")))?;

        if Utc::now() < start {
            return Err(EngineError::NotStarted);
        }
        Ok(start)
    }
}

/// Reservation, mint, and durable write. Runs under the caller's deadline (see module docs on
/// deadline handling) — if cancelled partway through, the caller compensates on the timeout's
/// `Elapsed` branch rather than this function completing its own compensation.
async fn reserve_mint_and_persist(
    counter_store: Arc<dyn CounterStore>,
    record_store: Arc<dyn RecordStore>,
    codegen: CodeGenerator,
    campaign_id: i64,
) -> Result<String, EngineError> {
    let v = counter_store
        .decrement(&coupons_key(campaign_id))
        .await
        .map_err(|e| store_unavailable(e))?;

    if v < 0 {
        compensate(&counter_store, campaign_id).await;
        return Err(EngineError::SoldOut);
    }

    let now = Utc::now();
    let code = match codegen.generate(campaign_id, now.timestamp_nanos_opt().unwrap_or(0) as i128) {
        Ok(code) => code,
        Err(e) => {
            compensate(&counter_store, campaign_id).await;
            return Err(EngineError::from(e));
        }
    };

    match record_store.insert_coupon(campaign_id, &code, now).await {
        Ok(()) => Ok(code),
        Err(RecordStoreError::DuplicateCode) => {
            compensate(&counter_store, campaign_id).await;
            Err(EngineError::IssuanceFailed(IssuanceFailure::DuplicateCode))
        }
        Err(RecordStoreError::CampaignNotFound) => {
            compensate(&counter_store, campaign_id).await;
            Err(EngineError::CampaignNotFound)
        }
        Err(RecordStoreError::Sql(e)) => {
            compensate(&counter_store, campaign_id).await;
            warn!(campaign_id, error = %e, "durable write failed");
            Err(EngineError::IssuanceFailed(IssuanceFailure::StoreUnavailable))
        }
    }
}

/// Best-effort counter increment undoing a reservation after a post-reservation failure. If
/// compensation itself fails, the lost capacity is logged but the original failure is still
/// what the caller sees (spec §7 propagation policy).
async fn compensate(counter_store: &Arc<dyn CounterStore>, campaign_id: i64) {
    if let Err(e) = counter_store.increment(&coupons_key(campaign_id)).await {
        error!(campaign_id, error = %e, "compensation failed, capacity permanently lost");
    }
}

fn store_unavailable(e: CounterStoreError) -> EngineError {
    warn!(error = %e, "counter store adapter failure mapped to taxonomy");
    EngineError::IssuanceFailed(IssuanceFailure::StoreUnavailable)
}
