//! Session cache: the active token per user and the blacklist of revoked tokens.
//!
//! Both live in a key-value store with per-key time-to-live. The two namespaces are
//! independent: `token:<user_id>` holds the user's current token, and
//! `blacklist:<token>` marks a token that was logged out before it expired. Entries
//! disappear on their own when their TTL runs out.

pub mod memory;
pub mod redis;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;

pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

const ACTIVE_PREFIX: &str = "token:";
const BLACKLIST_PREFIX: &str = "blacklist:";
const BLACKLIST_MARKER: &str = "1";

/// A key-value store with per-key expiry.
///
/// Setting an existing key replaces both its value and its TTL.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), AppError>;
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    async fn delete(&self, key: &str) -> Result<(), AppError>;
    async fn exists(&self, key: &str) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct SessionCache {
    store: Arc<dyn KeyValueStore>,
}

impl SessionCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Records `token` as the user's current session, replacing any earlier one.
    pub async fn set_active(
        &self,
        user_id: Uuid,
        token: &str,
        ttl: Duration,
    ) -> Result<(), AppError> {
        self.store.set_ex(&active_key(user_id), token, ttl).await
    }

    pub async fn get_active(&self, user_id: Uuid) -> Result<Option<String>, AppError> {
        self.store.get(&active_key(user_id)).await
    }

    pub async fn delete_active(&self, user_id: Uuid) -> Result<(), AppError> {
        self.store.delete(&active_key(user_id)).await
    }

    pub async fn set_blacklisted(&self, token: &str, ttl: Duration) -> Result<(), AppError> {
        self.store
            .set_ex(&blacklist_key(token), BLACKLIST_MARKER, ttl)
            .await
    }

    pub async fn is_blacklisted(&self, token: &str) -> Result<bool, AppError> {
        self.store.exists(&blacklist_key(token)).await
    }
}

fn active_key(user_id: Uuid) -> String {
    format!("{}{}", ACTIVE_PREFIX, user_id)
}

fn blacklist_key(token: &str) -> String {
    format!("{}{}", BLACKLIST_PREFIX, token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> (SessionCache, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (SessionCache::new(store.clone()), store)
    }

    #[actix_rt::test]
    async fn test_active_session_roundtrip() {
        let (cache, store) = cache();
        let user_id = Uuid::new_v4();

        assert_eq!(cache.get_active(user_id).await.unwrap(), None);

        cache
            .set_active(user_id, "first", Duration::from_secs(300))
            .await
            .unwrap();
        assert_eq!(
            store.get(&format!("token:{}", user_id)).await.unwrap().as_deref(),
            Some("first")
        );

        cache
            .set_active(user_id, "second", Duration::from_secs(300))
            .await
            .unwrap();
        assert_eq!(cache.get_active(user_id).await.unwrap().as_deref(), Some("second"));

        cache.delete_active(user_id).await.unwrap();
        assert_eq!(cache.get_active(user_id).await.unwrap(), None);

        // Deleting twice is harmless.
        cache.delete_active(user_id).await.unwrap();
    }

    #[actix_rt::test]
    async fn test_overwriting_active_session_does_not_blacklist() {
        let (cache, _) = cache();
        let user_id = Uuid::new_v4();

        cache.set_active(user_id, "old", Duration::from_secs(300)).await.unwrap();
        cache.set_active(user_id, "new", Duration::from_secs(300)).await.unwrap();

        assert!(!cache.is_blacklisted("old").await.unwrap());
    }

    #[actix_rt::test]
    async fn test_blacklist_is_independent_of_active_sessions() {
        let (cache, store) = cache();
        let user_id = Uuid::new_v4();

        cache.set_active(user_id, "tok", Duration::from_secs(300)).await.unwrap();
        cache.set_blacklisted("tok", Duration::from_secs(300)).await.unwrap();
        cache.delete_active(user_id).await.unwrap();

        assert!(cache.is_blacklisted("tok").await.unwrap());
        assert!(!cache.is_blacklisted("other").await.unwrap());
        assert!(store.exists("blacklist:tok").await.unwrap());
    }

    #[actix_rt::test]
    async fn test_blacklist_entry_expires() {
        let (cache, _) = cache();

        cache
            .set_blacklisted("tok", Duration::from_millis(50))
            .await
            .unwrap();
        assert!(cache.is_blacklisted("tok").await.unwrap());

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(!cache.is_blacklisted("tok").await.unwrap());
    }
}
