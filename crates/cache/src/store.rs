//! Sled-backed cache store

use crate::CacheError;
use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sled::Db;
use std::future::Future;
use std::path::Path;
use tracing::{debug, warn};

/// Stored envelope: when the value was written plus its encoding
#[derive(Serialize, Deserialize)]
struct Envelope {
    stored_at_ms: i64,
    payload: Vec<u8>,
}

/// Listing entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: String,
    pub stored_at: DateTime<Utc>,
    pub size: usize,
}

/// Persistent local cache
pub struct LocalCache {
    db: Db,
}

impl LocalCache {
    /// Open or create the cache under `dir`
    pub fn open(dir: &Path) -> Result<Self, CacheError> {
        let db = sled::open(dir.join("cache.db"))?;
        Ok(Self { db })
    }

    /// Cache that lives only as long as this value
    pub fn temporary() -> Result<Self, CacheError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    /// Read `key`; a value that no longer decodes is dropped and reported as a miss
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let Some(raw) = self.db.get(key)? else {
            return Ok(None);
        };

        let decoded = bincode::deserialize::<Envelope>(&raw)
            .and_then(|envelope| bincode::deserialize::<T>(&envelope.payload));
        match decoded {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key, error = %e, "Dropping undecodable cache entry");
                self.db.remove(key)?;
                Ok(None)
            }
        }
    }

    /// Store `value` under `key`
    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let envelope = Envelope {
            stored_at_ms: Utc::now().timestamp_millis(),
            payload: bincode::serialize(value)?,
        };
        self.db.insert(key, bincode::serialize(&envelope)?)?;

        // Flush to ensure durability
        self.db.flush()?;
        Ok(())
    }

    /// Return the cached value, or fetch, store and return a fresh one
    ///
    /// `refresh` skips the cached value. A failed fetch leaves the cache
    /// untouched.
    pub async fn get_or_fetch<T, E, F, Fut>(
        &self,
        key: &str,
        refresh: bool,
        fetch: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !refresh {
            if let Some(value) = self.get(key)? {
                debug!(key, "Cache hit");
                return Ok(value);
            }
        }

        debug!(key, refresh, "Cache miss, fetching");
        let value = fetch().await?;
        self.put(key, &value)?;
        Ok(value)
    }

    /// Remove `key`, returning whether it was present
    pub fn invalidate(&self, key: &str) -> Result<bool, CacheError> {
        let existed = self.db.remove(key)?.is_some();
        if existed {
            debug!(key, "Cache entry invalidated");
            self.db.flush()?;
        }
        Ok(existed)
    }

    /// Remove every entry, returning how many there were
    pub fn clear(&self) -> Result<usize, CacheError> {
        let count = self.db.len();
        self.db.clear()?;
        self.db.flush()?;
        debug!(count, "Cache cleared");
        Ok(count)
    }

    /// All entries in key order
    pub fn entries(&self) -> Result<Vec<CacheEntry>, CacheError> {
        let mut entries = Vec::new();
        for item in self.db.iter() {
            let (key, raw) = item?;
            let stored_at = bincode::deserialize::<Envelope>(&raw)
                .ok()
                .and_then(|e| Utc.timestamp_millis_opt(e.stored_at_ms).single())
                .unwrap_or_default();
            entries.push(CacheEntry {
                key: String::from_utf8_lossy(&key).into_owned(),
                stored_at,
                size: raw.len(),
            });
        }
        Ok(entries)
    }

    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;
    use anyhow::Result;
    use std::cell::Cell;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Settings {
        ping: bool,
        name: Option<String>,
    }

    #[test]
    fn test_put_get_survives_reopen() -> Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let settings = Settings {
            ping: true,
            name: Some("Ada".into()),
        };

        {
            let cache = LocalCache::open(temp_dir.path())?;
            cache.put(keys::USER_SETTINGS, &settings)?;
        }

        let cache = LocalCache::open(temp_dir.path())?;
        assert_eq!(cache.get::<Settings>(keys::USER_SETTINGS)?, Some(settings));
        assert_eq!(cache.get::<Settings>(keys::USER_PROFILE)?, None);
        Ok(())
    }

    #[test]
    fn test_invalidate_and_clear() -> Result<()> {
        let cache = LocalCache::temporary()?;
        cache.put(keys::LAST_PAGE, &"/projects".to_string())?;
        cache.put(keys::USER_SETTINGS, &1u32)?;

        assert!(cache.invalidate(keys::LAST_PAGE)?);
        assert!(!cache.invalidate(keys::LAST_PAGE)?);
        assert_eq!(cache.len(), 1);

        assert_eq!(cache.clear()?, 1);
        assert!(cache.is_empty());
        Ok(())
    }

    #[test]
    fn test_undecodable_entry_is_a_miss() -> Result<()> {
        let cache = LocalCache::temporary()?;
        cache.put(keys::USER_PROFILE, &"not settings".to_string())?;

        assert_eq!(cache.get::<Settings>(keys::USER_PROFILE)?, None);
        assert!(cache.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_get_or_fetch_honours_refresh() -> Result<()> {
        let cache = LocalCache::temporary()?;
        let fetches = Cell::new(0);
        let fetch = |value: u32| {
            fetches.set(fetches.get() + 1);
            async move { Ok::<_, CacheError>(value) }
        };

        assert_eq!(cache.get_or_fetch(keys::USER_SETTINGS, false, || fetch(1)).await?, 1);
        assert_eq!(cache.get_or_fetch(keys::USER_SETTINGS, false, || fetch(2)).await?, 1);
        assert_eq!(fetches.get(), 1);

        assert_eq!(cache.get_or_fetch(keys::USER_SETTINGS, true, || fetch(3)).await?, 3);
        assert_eq!(cache.get::<u32>(keys::USER_SETTINGS)?, Some(3));
        assert_eq!(fetches.get(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_cached_value() -> Result<()> {
        let cache = LocalCache::temporary()?;
        cache.put(keys::USER_SETTINGS, &7u32)?;

        let result = cache
            .get_or_fetch(keys::USER_SETTINGS, true, || async {
                Err::<u32, _>(CacheError::Storage(sled::Error::Unsupported("offline".into())))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(cache.get::<u32>(keys::USER_SETTINGS)?, Some(7));
        Ok(())
    }

    #[test]
    fn test_entries_listing() -> Result<()> {
        let cache = LocalCache::temporary()?;
        cache.put(keys::SESSION, &"token".to_string())?;
        cache.put(keys::LAST_PAGE, &"/settings".to_string())?;

        let keys: Vec<_> = cache.entries()?.into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["last_page", "session"]);
        Ok(())
    }
}
