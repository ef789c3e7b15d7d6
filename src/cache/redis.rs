use std::time::Duration;

use ::redis::{aio::ConnectionManager, AsyncCommands, Client};
use async_trait::async_trait;

use super::KeyValueStore;
use crate::error::AppError;

/// Redis-backed store. Expiry is handled by Redis itself through `SET ... EX`.
#[derive(Clone)]
pub struct RedisStore {
    manager: ConnectionManager,
}

impl RedisStore {
    /// Opens a managed connection that reconnects on its own after failures.
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        let client = Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;
        log::info!("Connected to Redis session cache");
        Ok(Self { manager })
    }
}

/// Redis TTLs are whole seconds; round up so an entry never expires early.
fn ttl_secs(ttl: Duration) -> u64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    secs.max(1)
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), AppError> {
        let mut conn = self.manager.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_secs(ttl)).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.manager.clone();
        Ok(conn.get::<_, Option<String>>(key).await?)
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        let mut conn = self.manager.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, AppError> {
        let mut conn = self.manager.clone();
        Ok(conn.exists::<_, bool>(key).await?)
    }
}
