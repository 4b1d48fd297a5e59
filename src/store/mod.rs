pub mod disk;
pub mod memory;

use crate::core::cache::CacheStore;
use crate::core::config::{AppConfig, CacheBackend};
use anyhow::Result;
use disk::DiskStore;
use memory::MemoryStore;
use std::sync::Arc;
use tracing::debug;

/// Opens the cache store selected by the configuration.
pub fn open_store(config: &AppConfig) -> Result<Arc<dyn CacheStore>> {
    match config.cache.backend {
        CacheBackend::Memory => {
            debug!("Using in-memory cache store");
            Ok(Arc::new(MemoryStore::new()))
        }
        CacheBackend::Disk => {
            let path = config.default_data_path()?.join("cache");
            debug!("Using disk cache store at {}", path.display());
            Ok(Arc::new(DiskStore::open(&path)?))
        }
    }
}
