use crate::core::cache::CacheStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::debug;

const PARTITION_NAME: &str = "conversions";

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    value: String,
    expires_at: SystemTime,
}

/// Cache store persisted in a fjall partition, so cached rates outlive a
/// single process.
///
/// Store failures never surface to callers: a failed read is a miss and a
/// failed write is dropped.
pub struct DiskStore {
    // Held so the partition's keyspace stays open
    _keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskStore {
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create cache directory: {}", path.display()))?;

        let keyspace = fjall::Config::new(path)
            .open()
            .with_context(|| format!("Failed to open cache at {}", path.display()))?;
        let partition = keyspace
            .open_partition(PARTITION_NAME, PartitionCreateOptions::default())
            .context("Failed to open cache partition")?;
        Ok(Self {
            _keyspace: keyspace,
            partition,
        })
    }

    fn read(&self, key: &str) -> Result<Option<String>> {
        let Some(raw) = self.partition.get(key.as_bytes())? else {
            debug!("Cache MISS for key: {}", key);
            return Ok(None);
        };
        let entry: CacheEntry = serde_json::from_slice(&raw)?;
        if SystemTime::now() >= entry.expires_at {
            debug!("Cache entry expired for key: {}", key);
            self.partition.remove(key.as_bytes())?;
            return Ok(None);
        }
        debug!("Cache HIT for key: {}", key);
        Ok(Some(entry.value))
    }

    fn write(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let entry = CacheEntry {
            value: value.to_string(),
            expires_at: SystemTime::now() + ttl,
        };
        self.partition
            .insert(key.as_bytes(), serde_json::to_vec(&entry)?)?;
        debug!("Cache PUT for key: {}", key);
        Ok(())
    }
}

#[async_trait]
impl CacheStore for DiskStore {
    async fn get(&self, key: &str) -> Option<String> {
        match self.read(key) {
            Ok(value) => value,
            Err(e) => {
                debug!("DiskStore get error: {}", e);
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) {
        if let Err(e) = self.write(key, value, ttl) {
            debug!("DiskStore set error: {}", e);
        }
    }
}
