//! Last-known-good snapshot cache
//!
//! Upstream payloads are stored as JSON text inside a postcard envelope
//! carrying the expiry time, so a failed fetch can fall back to the most
//! recent successful one.

use anyhow::{Result, anyhow};
use fjall::Keyspace;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task;

use crate::error::MonitorError;

pub const TYPHOON_KEY: &str = "cwa:typhoon";
pub const ALERTS_KEY: &str = "cwa:alerts";
pub const FORECAST_KEY: &str = "cwa:forecast";

#[derive(Serialize, Deserialize)]
struct StoredEntry<T> {
    value: T,
    expires_at: u64, // Unix timestamp (seconds)
}

#[derive(Clone)]
pub struct SnapshotCache {
    store: Keyspace,
    ttl: Duration,
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> Result<Option<Vec<u8>>> {
    Ok(store.get(key)?.map(|v| v.to_vec()))
}

fn unix_now() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

impl SnapshotCache {
    /// Open (or create) the cache under `path`. Entries live for `ttl`.
    pub fn open(path: impl AsRef<Path>, ttl: Duration) -> crate::Result<Self> {
        let path = path.as_ref();
        let db = fjall::Database::builder(path).open().map_err(|e| {
            MonitorError::cache(format!("cannot open {}: {e}", path.display()))
        })?;
        let store = db
            .keyspace("snapshots", fjall::KeyspaceCreateOptions::default)
            .map_err(|e| MonitorError::cache(format!("cannot open snapshot keyspace: {e}")))?;
        Ok(Self { store, ttl })
    }

    /// Stores a value with the given time-to-live.
    #[tracing::instrument(name = "put_snapshot", level = "debug", skip(self, value))]
    pub async fn put<T: Serialize + Send + Debug + 'static>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
    ) -> Result<()> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();
        let expires_at = SystemTime::now()
            .checked_add(ttl)
            .ok_or(anyhow!("TTL overflow"))?
            .duration_since(UNIX_EPOCH)?
            .as_secs();
        let bytes = postcard::to_stdvec(&StoredEntry { value, expires_at })?;

        let _ = task::spawn_blocking(move || store.insert(key, bytes)).await?;
        Ok(())
    }

    /// Retrieves a value if it exists and has not expired.
    /// Expired entries are removed on the way out.
    #[tracing::instrument(name = "query_snapshot", level = "debug", skip(self))]
    pub async fn get<T: DeserializeOwned + Send + 'static>(&self, key: &str) -> Result<Option<T>> {
        let store = self.store.clone();
        let key_bytes = key.as_bytes().to_vec();

        let Some(bytes) = task::spawn_blocking(move || get_from_store(store, key_bytes)).await??
        else {
            tracing::debug!("Key not found");
            return Ok(None);
        };

        let entry: StoredEntry<T> = postcard::from_bytes(&bytes)?;
        if unix_now()? < entry.expires_at {
            tracing::debug!("Key found and still fresh");
            Ok(Some(entry.value))
        } else {
            tracing::debug!("Key found but expired");
            self.remove(key).await?;
            Ok(None)
        }
    }

    /// Store a JSON-serializable payload under the cache's default TTL
    pub async fn put_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let text = serde_json::to_string(value)?;
        self.put(key, text, self.ttl).await
    }

    /// Load a payload stored with [`SnapshotCache::put_json`]
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get::<String>(key).await? {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        let key = key.as_bytes().to_vec();
        let store = self.store.clone();
        let _ = task::spawn_blocking(move || store.remove(key)).await?;
        Ok(())
    }
}
