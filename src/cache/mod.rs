use crate::{database::Database, redis_client::RedisClient};
use tracing::info;

pub mod shows;

/// Redis-backed cache of the show catalog. Seat availability is never cached.
#[derive(Clone)]
pub struct CacheService {
    redis: RedisClient,
    db: Database,
    ttl_seconds: u64,
}

impl CacheService {
    pub fn new(redis: RedisClient, db: Database, ttl_seconds: u64) -> Self {
        Self {
            redis,
            db,
            ttl_seconds,
        }
    }

    // Warm the catalog on startup
    pub async fn warmup_cache(&self) {
        info!("Starting cache warmup...");

        let shows = self.get_shows(None).await;
        info!("Loaded {} astronomy shows", shows.map(|shows| shows.len()).unwrap_or(0));

        info!("Cache warmup done");
    }
}
