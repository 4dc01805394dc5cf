//! Counter store adapter (spec §4.2): atomic integer decrement/increment plus opaque
//! key/value reads. Two implementations: [`RedisCounterStore`] for production and
//! [`InMemoryCounterStore`] for tests.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum CounterStoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),
}

/// Atomic integer operations on keyed values, accessed by the issuance engine.
///
/// `decrement`/`increment` must be atomic across all concurrent callers — this is the engine's
/// sole serialization point (see spec §4.5).
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn set(&self, key: &str, value: &str) -> Result<(), CounterStoreError>;
    async fn get(&self, key: &str) -> Result<Option<String>, CounterStoreError>;
    async fn decrement(&self, key: &str) -> Result<i64, CounterStoreError>;
    async fn increment(&self, key: &str) -> Result<i64, CounterStoreError>;
}

/// Production adapter backed by a pooled Redis connection manager.
pub struct RedisCounterStore {
    pool: deadpool_redis::Pool,
}

impl RedisCounterStore {
    pub fn new(pool: deadpool_redis::Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn set(&self, key: &str, value: &str) -> Result<(), CounterStoreError> {
        let mut conn = self.pool.get().await?;
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CounterStoreError> {
        let mut conn = self.pool.get().await?;
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn decrement(&self, key: &str) -> Result<i64, CounterStoreError> {
        let mut conn = self.pool.get().await?;
        let value: i64 = redis::cmd("DECR").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn increment(&self, key: &str) -> Result<i64, CounterStoreError> {
        let mut conn = self.pool.get().await?;
        let value: i64 = redis::cmd("INCR").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }
}

/// Test-support adapter: an in-process, mutex-guarded map offering the same atomicity
/// guarantees the production Redis adapter relies on.
#[derive(Default)]
pub struct InMemoryCounterStore {
    values: Mutex<HashMap<String, i64>>,
    raw: Mutex<HashMap<String, String>>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn set(&self, key: &str, value: &str) -> Result<(), CounterStoreError> {
        self.raw.lock().insert(key.to_string(), value.to_string());
        if let Ok(n) = value.parse::<i64>() {
            self.values.lock().insert(key.to_string(), n);
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CounterStoreError> {
        Ok(self.raw.lock().get(key).cloned())
    }

    async fn decrement(&self, key: &str) -> Result<i64, CounterStoreError> {
        let mut values = self.values.lock();
        let entry = values.entry(key.to_string()).or_insert(0);
        *entry -= 1;
        let v = *entry;
        drop(values);
        self.raw.lock().insert(key.to_string(), v.to_string());
        Ok(v)
    }

    async fn increment(&self, key: &str) -> Result<i64, CounterStoreError> {
        let mut values = self.values.lock();
        let entry = values.entry(key.to_string()).or_insert(0);
        *entry += 1;
        let v = *entry;
        drop(values);
        self.raw.lock().insert(key.to_string(), v.to_string());
        Ok(v)
    }
}
