#![doc = include_str!("../README.md")]
//!
//! ## Modules
//!
//! - [`ordered_map`] / [`lru_storage`]: the shared order-tracking engine.
//! - [`key`]: content-addressed cache key derivation.
//! - [`cache`]: the on-disk, size-bounded LRU cache.
//! - [`net`]: retrying, cancellable network fetches.
//! - [`concurrency`]: cancellation tokens and one-shot/multi-shot observers.
//! - [`coordinator`]: read-through orchestration of cache + network.
//! - [`memo`]: bounded memoization atop the same LRU engine.
//! - [`error`]: the recoverable-error reporting surface.

#![deny(missing_debug_implementations)]

/// Intrusive doubly linked list backing [`ordered_map::OrderedMap`].
///
/// Internal infrastructure: exposes raw-pointer operations that require
/// careful invariant maintenance. Not part of the public API.
pub(crate) mod list;

/// An order-tracking map (hash index over a doubly linked list), the shared
/// engine behind every eviction policy built on top of it.
pub mod ordered_map;

/// Byte-bounded LRU storage built on [`ordered_map`].
pub mod lru_storage;

/// Content-addressed cache key derivation and on-disk filename encoding.
pub mod key;

/// The recoverable-error reporting surface.
pub mod error;

pub(crate) mod future;

/// The persistent, size-bounded LRU disk cache.
pub mod cache;

/// Retrying, cancellable network fetches.
pub mod net;

/// Cancellation tokens and one-shot/multi-shot observers.
pub mod concurrency;

/// Read-through orchestration of the cache and the network.
pub mod coordinator;

/// Size-bounded memoization of pure functions.
pub mod memo;

pub use cache::{Cache, CacheContent, DiskCache, DiskCacheConfig};
pub use coordinator::{CoordinatorConfig, RequestCoordinator, Source, UrlRequestResult};
pub use key::CacheKey;
pub use lru_storage::LruStorage;
pub use ordered_map::OrderedMap;
