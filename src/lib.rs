pub mod cache;
pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod redis_client;
pub mod services;

use std::sync::Arc;
use tokio::task;

use services::sessions::Scheduler;

// Shared state for every handler
#[derive(Clone)]
pub struct AppState {
    pub db: database::Database,
    pub redis: redis_client::RedisClient,
    pub cache: cache::CacheService,
    pub config: config::Config,
    pub scheduler: Scheduler,
}

impl AppState {
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let db = database::Database::connect(&config.database).await?;

        db.run_migrations().await?;

        let redis = redis_client::RedisClient::new(&config.redis.url).await?;
        let cache = cache::CacheService::new(redis.clone(), db.clone(), config.cache.ttl_seconds);
        let scheduler = Scheduler::new(config.booking.overlap_policy);
        tracing::info!("Speaker overlap policy: {:?}", scheduler.policy());

        let state = Arc::new(Self {
            db,
            redis,
            cache,
            config,
            scheduler,
        });

        let state_for_bg = state.clone();
        task::spawn(async move {
            state_for_bg.cache.warmup_cache().await;
        });

        Ok(state)
    }
}
