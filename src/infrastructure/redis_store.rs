//! Redis-backed expiring store.
//!
//! Lets every process of a deployment share one set of cooldown windows.
//!
//! ## Architecture
//!
//! - Keys: the engine's key with a configurable prefix
//! - Values: [`Record`] serialized with bincode
//! - TTL: `SET EX`, whole seconds rounded up (minimum one second)
//!
//! The [`ExpiringStore`] port is synchronous while the Redis client is async.
//! Inside a multi-threaded tokio runtime calls go through `block_in_place`;
//! outside any runtime a private current-thread runtime is used. A
//! current-thread runtime cannot be blocked from within, so calls made there
//! fail with [`StoreError::Backend`] instead of running.
//!
//! ## Error Handling
//!
//! Connection and command failures, and calls from a current-thread runtime,
//! are returned as [`StoreError::Backend`] and propagate to the caller of
//! `report`. A value that fails to decode is logged,
//! deleted and treated as absent.
//!
//! ## Example
//!
//! ```rust,ignore
//! use report_throttle::{RateLimitedReporter, RedisStore, LogNotifier};
//! use std::sync::Arc;
//!
//! #[tokio::main(flavor = "multi_thread")]
//! async fn main() {
//!     let store = RedisStore::connect("redis://127.0.0.1/")
//!         .await
//!         .expect("Failed to connect to Redis");
//!
//!     let reporter = RateLimitedReporter::builder()
//!         .with_store(Arc::new(store))
//!         .build(LogNotifier::new())
//!         .expect("valid config");
//! }
//! ```

use crate::application::error::StoreError;
use crate::application::ports::ExpiringStore;
use crate::domain::records::Record;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::RwLock;

/// Configuration for Redis storage.
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    /// Key prefix for Redis keys (default: "serene:")
    pub key_prefix: String,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            key_prefix: "serene:".to_string(),
        }
    }
}

/// Redis-backed store for throttling state shared across processes.
pub struct RedisStore {
    connection: Arc<RwLock<ConnectionManager>>,
    config: RedisStoreConfig,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Clone for RedisStore {
    fn clone(&self) -> Self {
        Self {
            connection: Arc::clone(&self.connection),
            config: self.config.clone(),
        }
    }
}

impl RedisStore {
    /// Connect to Redis with default configuration.
    ///
    /// # Arguments
    /// * `url` - Redis connection URL (e.g., "redis://127.0.0.1/")
    ///
    /// # Errors
    /// Returns error if connection fails.
    pub async fn connect(url: &str) -> Result<Self, RedisError> {
        Self::connect_with_config(url, RedisStoreConfig::default()).await
    }

    /// Connect to Redis with custom configuration.
    ///
    /// # Errors
    /// Returns error if connection fails.
    pub async fn connect_with_config(
        url: &str,
        config: RedisStoreConfig,
    ) -> Result<Self, RedisError> {
        let client = Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;

        Ok(Self {
            connection: Arc::new(RwLock::new(connection)),
            config,
        })
    }

    /// Get the prefixed Redis key.
    fn key(&self, key: &str) -> String {
        format!("{}{}", self.config.key_prefix, key)
    }

    /// Run an async Redis operation from synchronous code.
    fn run<T, F>(&self, operation: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match Bridge::current() {
            Bridge::Blocking(handle) => tokio::task::block_in_place(|| handle.block_on(operation)),
            Bridge::PrivateRuntime => {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .map_err(|e| StoreError::Backend(format!("failed to start runtime: {}", e)))?;
                rt.block_on(operation)
            }
            Bridge::Unsupported => Err(StoreError::Backend(
                "RedisStore requires a multi-threaded runtime".to_string(),
            )),
        }
    }

    async fn get_async(&self, key: &str) -> Result<Option<Record>, StoreError> {
        let key = self.key(key);
        let mut conn = self.connection.write().await;

        let bytes: Option<Vec<u8>> = conn.get(&key).await.map_err(backend)?;
        let Some(bytes) = bytes else {
            return Ok(None);
        };

        match bincode::deserialize::<Record>(&bytes) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    key = %key,
                    "Discarding undecodable throttling record from Redis"
                );
                conn.del::<_, ()>(&key).await.map_err(backend)?;
                Ok(None)
            }
        }
    }

    async fn set_async(&self, key: &str, record: &Record, ttl: Duration) -> Result<(), StoreError> {
        let key = self.key(key);
        let bytes = bincode::serialize(record).map_err(|e| StoreError::Codec(e.to_string()))?;
        let mut conn = self.connection.write().await;

        conn.set_ex::<_, _, ()>(&key, bytes, ttl_secs(ttl))
            .await
            .map_err(backend)
    }

    async fn has_async(&self, key: &str) -> Result<bool, StoreError> {
        let key = self.key(key);
        let mut conn = self.connection.write().await;
        conn.exists(&key).await.map_err(backend)
    }

    async fn delete_async(&self, key: &str) -> Result<(), StoreError> {
        let key = self.key(key);
        let mut conn = self.connection.write().await;
        conn.del::<_, ()>(&key).await.map_err(backend)
    }
}

impl ExpiringStore for RedisStore {
    fn get(&self, key: &str) -> Result<Option<Record>, StoreError> {
        self.run(self.get_async(key))
    }

    fn set(&self, key: &str, record: Record, ttl: Duration) -> Result<(), StoreError> {
        self.run(self.set_async(key, &record, ttl))
    }

    fn has(&self, key: &str) -> Result<bool, StoreError> {
        self.run(self.has_async(key))
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.run(self.delete_async(key))
    }
}

/// How a synchronous call reaches the async client.
enum Bridge {
    /// Block the current worker of a multi-threaded runtime
    Blocking(Handle),
    /// No runtime on this thread; spin up a private one
    PrivateRuntime,
    /// Current-thread runtime; blocking it would panic
    Unsupported,
}

impl Bridge {
    fn current() -> Self {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                Bridge::Blocking(handle)
            }
            Ok(_) => Bridge::Unsupported,
            Err(_) => Bridge::PrivateRuntime,
        }
    }
}

fn backend(e: RedisError) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// TTL in whole seconds, rounded up, at least one.
fn ttl_secs(ttl: Duration) -> u64 {
    let secs = ttl.as_secs();
    let secs = if ttl.subsec_nanos() > 0 {
        secs.saturating_add(1)
    } else {
        secs
    };
    secs.max(1)
}
