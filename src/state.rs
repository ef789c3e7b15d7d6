use std::sync::Arc;
use std::time::Duration;

use crate::auth::{PasswordHasher, TokenIssuer};
use crate::cache::{KeyValueStore, MemoryStore, RedisStore, SessionCache};
use crate::config::Config;
use crate::error::AppError;
use crate::store::{
    postgres, CredentialStore, MemoryCredentialStore, MemoryTaskStore, PgCredentialStore,
    PgTaskStore, TaskStore,
};

/// Service handles shared by every handler, registered once as `web::Data<AppState>`.
pub struct AppState {
    pub users: Arc<dyn CredentialStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub sessions: SessionCache,
    pub tokens: TokenIssuer,
    pub hasher: PasswordHasher,
}

impl AppState {
    /// Connects the configured backends, falling back to in-memory ones for any
    /// connection target that is not set.
    pub async fn from_config(config: &Config) -> Result<Self, AppError> {
        let (users, tasks): (Arc<dyn CredentialStore>, Arc<dyn TaskStore>) =
            match &config.database_url {
                Some(url) => {
                    let pool = postgres::connect(url).await?;
                    (
                        Arc::new(PgCredentialStore::new(pool.clone())),
                        Arc::new(PgTaskStore::new(pool)),
                    )
                }
                None => {
                    log::warn!("DATABASE_URL not set; users and tasks are kept in memory");
                    (
                        Arc::new(MemoryCredentialStore::new()),
                        Arc::new(MemoryTaskStore::new()),
                    )
                }
            };

        let kv: Arc<dyn KeyValueStore> = match &config.redis_url {
            Some(url) => Arc::new(RedisStore::connect(url).await?),
            None => {
                log::warn!("REDIS_URL not set; sessions and the blacklist are kept in memory");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self {
            users,
            tasks,
            sessions: SessionCache::new(kv),
            tokens: TokenIssuer::new(
                &config.jwt_secret,
                Duration::from_secs(config.token_ttl_secs),
            ),
            hasher: PasswordHasher::new(config.bcrypt_cost),
        })
    }

    /// A fully in-memory state.
    pub fn in_memory(secret: &str, token_ttl: Duration, bcrypt_cost: u32) -> Self {
        Self {
            users: Arc::new(MemoryCredentialStore::new()),
            tasks: Arc::new(MemoryTaskStore::new()),
            sessions: SessionCache::new(Arc::new(MemoryStore::new())),
            tokens: TokenIssuer::new(secret, token_ttl),
            hasher: PasswordHasher::new(bcrypt_cost),
        }
    }
}
