//! The in-memory representation of a cached resource's bytes.

use crate::lru_storage::CacheSized;
use std::sync::Arc;

/// Owned, reference-counted bytes. Cheap to clone: retrieving a cache hit
/// never copies the underlying buffer.
#[derive(Debug, Clone)]
pub struct CacheContent {
    bytes: Arc<[u8]>,
}

impl CacheContent {
    pub fn new(bytes: Vec<u8>) -> Self {
        CacheContent { bytes: bytes.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl CacheSized for CacheContent {
    fn cache_size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl From<Vec<u8>> for CacheContent {
    fn from(bytes: Vec<u8>) -> Self {
        CacheContent::new(bytes)
    }
}

/// The residency state of one entry in [`crate::cache::disk::CacheState`]'s
/// in-memory index: bytes are read from disk at most once per process, then
/// kept resident until the entry is evicted or removed.
#[derive(Debug, Clone)]
pub(crate) enum CacheContentState {
    /// Known to the index; bytes live only on disk.
    NotLoaded { size: u64 },
    /// Bytes are resident in memory (and still on disk).
    Loaded(CacheContent),
}

impl CacheContentState {
    pub(crate) fn size(&self) -> u64 {
        match self {
            CacheContentState::NotLoaded { size } => *size,
            CacheContentState::Loaded(content) => content.cache_size(),
        }
    }
}

impl CacheSized for CacheContentState {
    fn cache_size(&self) -> u64 {
        self.size()
    }
}
