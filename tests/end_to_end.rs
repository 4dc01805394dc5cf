//! End-to-end scenarios from spec §8, driven against the in-memory adapters plus the
//! [`common::FlakyRecordStore`] fault-injection wrapper. No live Postgres or Redis required.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use couponrace::campaign::CampaignLifecycle;
use couponrace::engine::IssuanceEngine;
use couponrace::store::counter::{CounterStore, InMemoryCounterStore};
use couponrace::store::record::InMemoryRecordStore;
use regex::Regex;

fn code_regex() -> Regex {
    // SSNNNNSSNN: two non-ASCII syllables, four digits, two syllables, two digits.
    Regex::new(r"^[^\x00-\x7F]{2}\d{4}[^\x00-\x7F]{2}\d{2}$").unwrap()
}

/// Scenario 1: premature claim, then a successful claim after the gate opens.
#[tokio::test]
async fn premature_then_successful_claim() {
    let counter = Arc::new(InMemoryCounterStore::new());
    let record = Arc::new(InMemoryRecordStore::new());
    let lifecycle = CampaignLifecycle::new(counter.clone(), record.clone());
    let engine = IssuanceEngine::new(counter, record.clone());

    let start = Utc::now() + Duration::milliseconds(200);
    let id = lifecycle.create_campaign("X", start, 10).await.unwrap();

    let err = engine.issue_coupon(id).await.unwrap_err();
    assert_eq!(err.kind(), "not-started");

    tokio::time::sleep(std::time::Duration::from_millis(250)).await;

    let code = engine.issue_coupon(id).await.unwrap();
    assert!(code_regex().is_match(&code), "code {code} does not match format");

    let (_, codes) = lifecycle.get_campaign(id).await.unwrap();
    assert_eq!(codes, vec![code]);
}

/// Scenario 2: exhaustion under burst, at a scale small enough to run quickly in CI.
#[tokio::test]
async fn exhaustion_under_burst() {
    let counter = Arc::new(InMemoryCounterStore::new());
    let record = Arc::new(InMemoryRecordStore::new());
    let lifecycle = CampaignLifecycle::new(counter.clone(), record.clone());
    let engine = Arc::new(IssuanceEngine::new(counter, record.clone()));

    const TOTAL: i64 = 300;
    const ATTEMPTS: i64 = 600;

    let id = lifecycle.create_campaign("Burst", Utc::now(), TOTAL).await.unwrap();

    let mut set = tokio::task::JoinSet::new();
    for _ in 0..ATTEMPTS {
        let engine = engine.clone();
        set.spawn(async move { engine.issue_coupon(id).await });
    }

    let mut successes = 0;
    let mut sold_out = 0;
    let mut other = 0;
    while let Some(r) = set.join_next().await {
        match r.unwrap() {
            Ok(_) => successes += 1,
            Err(e) if e.kind() == "sold-out" => sold_out += 1,
            Err(_) => other += 1,
        }
    }

    assert_eq!(successes, TOTAL);
    assert_eq!(sold_out, ATTEMPTS - TOTAL);
    assert_eq!(other, 0);

    let (_, codes) = lifecycle.get_campaign(id).await.unwrap();
    assert_eq!(codes.len(), TOTAL as usize);
    let unique: HashSet<_> = codes.iter().collect();
    assert_eq!(unique.len(), TOTAL as usize);
}

/// Scenario 3: every Nth durable write fails; successes plus failures must account for every
/// attempt, and the counter must settle back to zero.
#[tokio::test]
async fn compensation_on_write_failure() {
    const FAIL_EVERY: usize = 100;
    const TOTAL: i64 = 1_000;
    const ATTEMPTS: i64 = 1_000;

    let counter = Arc::new(InMemoryCounterStore::new());
    let record = Arc::new(common::FlakyRecordStore::new(FAIL_EVERY));
    let lifecycle = CampaignLifecycle::new(counter.clone(), record.clone());
    let engine = Arc::new(IssuanceEngine::new(counter.clone(), record.clone()));

    let id = lifecycle.create_campaign("Flaky", Utc::now(), TOTAL).await.unwrap();

    let mut set = tokio::task::JoinSet::new();
    for _ in 0..ATTEMPTS {
        let engine = engine.clone();
        set.spawn(async move { engine.issue_coupon(id).await });
    }

    let mut successes = 0;
    let mut issuance_failed = 0;
    while let Some(r) = set.join_next().await {
        match r.unwrap() {
            Ok(_) => successes += 1,
            Err(e) if e.kind() == "issuance-failed" => issuance_failed += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(successes + issuance_failed, ATTEMPTS);
    assert!(issuance_failed > 0);

    let remaining = counter
        .get(&format!("campaign:{id}:coupons"))
        .await
        .unwrap()
        .unwrap()
        .parse::<i64>()
        .unwrap();
    assert_eq!(remaining, TOTAL - successes);

    let (_, codes) = lifecycle.get_campaign(id).await.unwrap();
    assert_eq!(codes.len(), successes as usize);
}

/// Scenario 5: an unknown campaign id fails `campaign-not-found`.
#[tokio::test]
async fn unknown_campaign() {
    let counter = Arc::new(InMemoryCounterStore::new());
    let record = Arc::new(InMemoryRecordStore::new());
    let engine = IssuanceEngine::new(counter, record);

    let err = engine.issue_coupon(99_999).await.unwrap_err();
    assert_eq!(err.kind(), "campaign-not-found");
}

/// Scenario 6: a campaign whose start instant is exactly now accepts an immediate claim.
#[tokio::test]
async fn clock_at_boundary() {
    let counter = Arc::new(InMemoryCounterStore::new());
    let record = Arc::new(InMemoryRecordStore::new());
    let lifecycle = CampaignLifecycle::new(counter.clone(), record.clone());
    let engine = IssuanceEngine::new(counter, record);

    let id = lifecycle.create_campaign("Now", Utc::now(), 1).await.unwrap();
    engine.issue_coupon(id).await.unwrap();
}
