use std::sync::Arc;

use couponrace::api;
use couponrace::campaign::CampaignLifecycle;
use couponrace::config::Config;
use couponrace::engine::IssuanceEngine;
use couponrace::state::AppState;
use couponrace::store::counter::RedisCounterStore;
use couponrace::store::record::SqlxRecordStore;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "fatal startup failure");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();

    let db_pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.db_pool_max)
        .min_connections(config.db_pool_min_idle)
        .connect(&config.database_url)
        .await?;

    let mut redis_cfg = deadpool_redis::Config::from_url(&config.redis_url);
    redis_cfg.pool = Some(deadpool_redis::PoolConfig::new(config.redis_pool_max));
    let redis_pool = redis_cfg.create_pool(Some(deadpool_redis::Runtime::Tokio1))?;

    let counter_store = Arc::new(RedisCounterStore::new(redis_pool));
    let record_store = Arc::new(SqlxRecordStore::new(db_pool));

    let state = AppState {
        lifecycle: Arc::new(CampaignLifecycle::new(counter_store.clone(), record_store.clone())),
        engine: Arc::new(IssuanceEngine::new(counter_store, record_store)),
    };

    let app = api::router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "server running");
    axum::serve(listener, app).await?;

    Ok(())
}
