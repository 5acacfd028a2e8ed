//! Key-value backends for the job ledger.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use redis::AsyncCommands;

use crate::error::LedgerError;

/// Minimal string key-value contract the ledger is built on.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, LedgerError>> + Send;

    /// Stores `value`, expiring it after `ttl` when one is given.
    fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;

    fn delete(&self, key: &str) -> impl Future<Output = Result<(), LedgerError>> + Send;

    fn exists(&self, key: &str) -> impl Future<Output = Result<bool, LedgerError>> + Send;
}

/// Redis-backed store used in production.
#[derive(Debug, Clone)]
pub struct RedisStore {
    client: redis::Client,
}

impl RedisStore {
    /// # Errors
    ///
    /// Returns [`LedgerError::Redis`] if `redis_url` cannot be parsed.
    pub fn new(redis_url: &str) -> Result<Self, LedgerError> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    /// Check Redis connectivity (for health checks).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Redis`] if the server cannot be reached.
    pub async fn ping(&self) -> Result<(), LedgerError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }
}

impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, LedgerError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), LedgerError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        match ttl {
            // SET EX rejects zero; clamp sub-second TTLs up to one second.
            Some(ttl) => {
                conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
                    .await?;
            }
            None => conn.set::<_, _, ()>(key, value).await?,
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), LedgerError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, LedgerError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let found: bool = conn.exists(key).await?;
        Ok(found)
    }
}

/// In-process store for tests and local runs without Redis.
///
/// Expired entries are dropped lazily on access.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, MemoryEntry>>,
}

#[derive(Debug)]
struct MemoryEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|e| e.is_live(now))
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let live = entries.get(key).map(|entry| entry.is_live(now))?;
        if live {
            entries.get(key).map(|entry| entry.value.clone())
        } else {
            entries.remove(key);
            None
        }
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, LedgerError> {
        Ok(self.read(key))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), LedgerError> {
        let entry = MemoryEntry {
            value: value.to_string(),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), LedgerError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, LedgerError> {
        Ok(self.read(key).is_some())
    }
}
