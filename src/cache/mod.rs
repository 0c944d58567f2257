//! The persistent disk cache: content storage, the on-disk index codec, and
//! the cache engine that ties them together behind a serial I/O actor.

pub mod content;
pub mod disk;
pub mod index;

pub use content::CacheContent;
pub use disk::{Cache, DiskCache, DiskCacheConfig, Error};
pub use index::CacheRecord;
