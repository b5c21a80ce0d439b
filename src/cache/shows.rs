use redis::AsyncCommands;
use tracing::{info, warn};

use crate::cache::CacheService;
use crate::models::{show::ShowWithThemes, AstronomyShow};

const VERSION_KEY: &str = "shows:version";
const CATALOG_PREFIX: &str = "shows:catalog:";
const SEARCH_PREFIX: &str = "search:shows:";

/// Cache key of a catalog read under one catalog version. Invalidation bumps
/// the version, so a result computed before it can only land on a dead key.
fn shows_key(version: i64, title: Option<&str>) -> String {
    match title {
        Some(title) => format!("{SEARCH_PREFIX}v{version}:title={}", title.to_lowercase()),
        None => format!("{CATALOG_PREFIX}v{version}"),
    }
}

impl CacheService {
    /// Show catalog, optionally filtered by title. Redis first, then the database.
    pub async fn get_shows(&self, title: Option<&str>) -> Result<Vec<ShowWithThemes>, sqlx::Error> {
        // Read the version before the database so a concurrent invalidation is never missed.
        let key = match self.shows_version().await {
            Ok(version) => Some(shows_key(version, title)),
            Err(e) => {
                warn!("Show cache version read failed: {:?}", e);
                None
            }
        };

        if let Some(key) = &key {
            match self.get_cached_shows(key).await {
                Ok(Some(shows)) => return Ok(shows),
                Ok(None) => {}
                Err(e) => warn!("Show cache read failed for {}: {:?}", key, e),
            }
        }

        let shows = AstronomyShow::catalog(&self.db.pool, title).await?;
        if let Some(key) = &key {
            if let Err(e) = self.save_shows_to_cache(key, &shows).await {
                warn!("Show cache write failed for {}: {:?}", key, e);
            }
        }
        Ok(shows)
    }

    /// Retires the catalog and every cached title search; old keys expire with their TTL.
    pub async fn invalidate_shows(&self) {
        let mut conn = self.redis.conn.clone();
        match conn.incr::<_, _, i64>(VERSION_KEY, 1).await {
            Ok(version) => info!("Show catalog cache moved to version {}", version),
            Err(e) => warn!("Failed to invalidate show cache: {:?}", e),
        }
    }

    async fn shows_version(&self) -> Result<i64, redis::RedisError> {
        let mut conn = self.redis.conn.clone();
        let version: Option<i64> = conn.get(VERSION_KEY).await?;
        Ok(version.unwrap_or(0))
    }

    async fn get_cached_shows(
        &self,
        key: &str,
    ) -> Result<Option<Vec<ShowWithThemes>>, redis::RedisError> {
        let mut conn = self.redis.conn.clone();
        let data: Option<String> = conn.get(key).await?;
        data.map(|data| {
            serde_json::from_str(&data).map_err(|_| {
                redis::RedisError::from((redis::ErrorKind::TypeError, "Parse error"))
            })
        })
        .transpose()
    }

    async fn save_shows_to_cache(
        &self,
        key: &str,
        shows: &[ShowWithThemes],
    ) -> Result<(), redis::RedisError> {
        let data = serde_json::to_string(shows).map_err(|_| {
            redis::RedisError::from((redis::ErrorKind::TypeError, "Serialize error"))
        })?;
        let mut conn = self.redis.conn.clone();
        conn.set_ex(key, data, self.ttl_seconds).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalidation_moves_every_key() {
        assert_eq!(shows_key(0, None), "shows:catalog:v0");
        assert_eq!(shows_key(3, Some("Black Holes")), "search:shows:v3:title=black holes");

        // A result cached under an old version is never read after a bump.
        assert_ne!(shows_key(3, None), shows_key(4, None));
        assert_ne!(shows_key(3, Some("moon")), shows_key(4, Some("moon")));
    }
}
