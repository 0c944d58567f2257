//! A persistent, size-bounded LRU disk cache.
//!
//! All mutable state (the in-memory LRU index) lives on a single tokio task
//! reached through an mpsc command channel — the teacher crate serializes
//! LRU mutation with a `&mut self` borrow; a background task's exclusive
//! ownership of `CacheState` is the async equivalent, giving the same
//! single-writer guarantee without a blocking mutex held across file I/O.
//!
//! An index entry starts `NotLoaded` (known size, bytes only on disk) and is
//! upgraded to `Loaded` the first time it's read, so a second `retrieve` for
//! the same key never touches the filesystem again.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::cache::content::{CacheContent, CacheContentState};
use crate::cache::index::{self, CacheRecord};
use crate::error::{ErrorReporter, TracingErrorReporter};
use crate::future::BoxFuture;
use crate::key::CacheKey;
use crate::lru_storage::LruStorage;

const INDEX_FILE_NAME: &str = "index.jsonl";

#[derive(Debug, Error)]
pub enum Error {
    #[error("cache I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("disk cache actor is no longer running")]
    Closed,
}

/// Configuration for a [`DiskCache`].
#[derive(Debug, Clone)]
pub struct DiskCacheConfig {
    /// Directory the cache owns exclusively. Created if missing.
    pub root: PathBuf,
    /// Total content-byte budget across all cached entries.
    pub max_size_bytes: u64,
}

/// The external contract a disk cache (or a test stub) provides to
/// higher layers such as [`crate::coordinator::RequestCoordinator`].
pub trait Cache: Send + Sync {
    fn retrieve<'a>(&'a self, key: &'a CacheKey) -> BoxFuture<'a, Result<Option<CacheContent>, Error>>;
    fn store<'a>(&'a self, key: CacheKey, content: CacheContent) -> BoxFuture<'a, Result<(), Error>>;
    fn remove<'a>(&'a self, key: &'a CacheKey) -> BoxFuture<'a, Result<(), Error>>;
    /// Returns the on-disk path for `key` if (and only if) its content file
    /// currently exists. Unlike `retrieve`, this never touches LRU order —
    /// it's a pure filesystem fact, not a cache access.
    fn resource_path(&self, key: &CacheKey) -> Option<PathBuf>;
}

enum Command {
    Retrieve {
        key: CacheKey,
        reply: oneshot::Sender<Result<Option<CacheContent>, Error>>,
    },
    Store {
        key: CacheKey,
        content: CacheContent,
        reply: oneshot::Sender<Result<(), Error>>,
    },
    Remove {
        key: CacheKey,
        reply: oneshot::Sender<Result<(), Error>>,
    },
    Clear {
        reply: oneshot::Sender<Result<(), Error>>,
    },
}

/// The state owned exclusively by the cache's I/O task.
struct CacheState {
    root: PathBuf,
    index: LruStorage<CacheKey, CacheContentState>,
    reporter: std::sync::Arc<dyn ErrorReporter>,
}

impl CacheState {
    fn content_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.encoded_filename())
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE_NAME)
    }

    async fn ensure_root(&self) -> Result<(), Error> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Loads the on-disk index, if any. Does NOT create `root` — a `retrieve`
    /// before any `store` must not leave a cache directory behind; only
    /// `store` (via [`CacheState::ensure_root`]) creates it.
    async fn load(root: PathBuf, max_size_bytes: u64, reporter: std::sync::Arc<dyn ErrorReporter>) -> Result<Self, Error> {
        let index_path = root.join(INDEX_FILE_NAME);
        let mut index = LruStorage::new(max_size_bytes);

        match tokio::fs::read_to_string(&index_path).await {
            Ok(text) => {
                let decoded = index::decode(&text);
                if decoded.corrupted {
                    reporter.report(
                        "cache index decode",
                        &io::Error::new(io::ErrorKind::InvalidData, "index file contained unreadable records"),
                    );
                }
                // Records are stored most-recently-used first; insert in
                // reverse so the final in-memory order matches the file.
                // Nothing is resident in memory immediately after a restart.
                for record in decoded.records.into_iter().rev() {
                    index.insert(record.key, CacheContentState::NotLoaded { size: record.size });
                }
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }

        Ok(CacheState { root, index, reporter })
    }

    /// Persists the current index by writing to a temp file and renaming it
    /// into place, so a crash mid-write never leaves a partially written
    /// index behind. A failure here is reported but does not roll back the
    /// in-memory state: the in-memory index stays authoritative for this
    /// process's lifetime, and the next successful write brings the on-disk
    /// copy back in sync. See DESIGN.md for the rationale.
    async fn save_index(&self) {
        let records: Vec<CacheRecord> = self
            .index
            .iter()
            .map(|(key, state)| CacheRecord { key: key.clone(), size: state.size() })
            .collect();
        let text = index::encode(&records);

        let tmp_path = self.root.join(format!("{INDEX_FILE_NAME}.tmp"));
        if let Err(err) = tokio::fs::write(&tmp_path, &text).await {
            self.reporter.report("cache index write", &err);
            return;
        }
        if let Err(err) = tokio::fs::rename(&tmp_path, self.index_path()).await {
            self.reporter.report("cache index write", &err);
        }
    }

    async fn evict_files(&self, evicted: &[(CacheKey, CacheContentState)]) {
        for (key, _) in evicted {
            let path = self.content_path(key);
            // Deletion failures for an evicted file are logged, not fatal:
            // the index no longer references the key either way.
            if let Err(err) = tokio::fs::remove_file(&path).await {
                if err.kind() != io::ErrorKind::NotFound {
                    self.reporter.report("evicted file removal", &err);
                }
            }
        }
    }
}

async fn run(mut state: CacheState, mut rx: mpsc::Receiver<Command>) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Retrieve { key, reply } => {
                let result = handle_retrieve(&mut state, &key).await;
                let _ = reply.send(result);
            }
            Command::Store { key, content, reply } => {
                let result = handle_store(&mut state, key, content).await;
                let _ = reply.send(result);
            }
            Command::Remove { key, reply } => {
                let result = handle_remove(&mut state, &key).await;
                let _ = reply.send(result);
            }
            Command::Clear { reply } => {
                let result = handle_clear(&mut state).await;
                let _ = reply.send(result);
            }
        }
    }
}

async fn handle_retrieve(state: &mut CacheState, key: &CacheKey) -> Result<Option<CacheContent>, Error> {
    match state.index.get(key).cloned() {
        None => Ok(None),
        Some(CacheContentState::Loaded(content)) => {
            // Already resident: no file I/O, just a touch.
            state.index.touch(key);
            state.save_index().await;
            Ok(Some(content))
        }
        Some(CacheContentState::NotLoaded { .. }) => {
            // Index lists this key but the file went missing out from under
            // us (or was never written): a failure here is surfaced, not
            // papered over, and the index entry is left exactly as it was.
            let path = state.content_path(key);
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    state.reporter.report("cache content read", &err);
                    return Err(err.into());
                }
            };
            let content = CacheContent::new(bytes);
            let evicted = state.index.insert(key.clone(), CacheContentState::Loaded(content.clone()));
            state.evict_files(&evicted).await;
            state.save_index().await;
            Ok(Some(content))
        }
    }
}

async fn handle_store(state: &mut CacheState, key: CacheKey, content: CacheContent) -> Result<(), Error> {
    state.ensure_root().await?;
    let path = state.content_path(&key);
    tokio::fs::write(&path, content.as_bytes()).await?;

    let evicted = state.index.insert(key, CacheContentState::Loaded(content));
    state.evict_files(&evicted).await;

    // `save_index` failures are reported, never propagated: a write that
    // successfully lands the content file but fails to persist the index
    // still counts as a successful `store` from the caller's point of view.
    state.save_index().await;
    Ok(())
}

async fn handle_remove(state: &mut CacheState, key: &CacheKey) -> Result<(), Error> {
    state.index.remove(key);
    let path = state.content_path(key);
    let _ = tokio::fs::remove_file(&path).await;
    state.save_index().await;
    Ok(())
}

async fn handle_clear(state: &mut CacheState) -> Result<(), Error> {
    let keys: Vec<CacheKey> = state.index.iter().map(|(k, _)| k.clone()).collect();
    for key in &keys {
        let path = state.content_path(key);
        let _ = tokio::fs::remove_file(&path).await;
    }
    state.index.clear();
    state.save_index().await;
    Ok(())
}

/// A persistent, size-bounded LRU disk cache reached through a serial I/O
/// actor. Cloning a [`DiskCache`] is cheap and shares the same backing
/// directory and actor task.
#[derive(Clone)]
pub struct DiskCache {
    tx: mpsc::Sender<Command>,
    root: PathBuf,
}

impl std::fmt::Debug for DiskCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskCache").field("root", &self.root).finish()
    }
}

impl DiskCache {
    pub async fn open(config: DiskCacheConfig) -> Result<Self, Error> {
        Self::open_with_reporter(config, std::sync::Arc::new(TracingErrorReporter)).await
    }

    pub async fn open_with_reporter(
        config: DiskCacheConfig,
        reporter: std::sync::Arc<dyn ErrorReporter>,
    ) -> Result<Self, Error> {
        let root = config.root.clone();
        let state = CacheState::load(config.root, config.max_size_bytes, reporter).await?;
        let (tx, rx) = mpsc::channel(32);
        tokio::spawn(run(state, rx));
        Ok(DiskCache { tx, root })
    }

    fn resource_path_for(root: &Path, key: &CacheKey) -> PathBuf {
        root.join(key.encoded_filename())
    }
}

impl Cache for DiskCache {
    fn retrieve<'a>(&'a self, key: &'a CacheKey) -> BoxFuture<'a, Result<Option<CacheContent>, Error>> {
        Box::pin(async move {
            let (reply, rx) = oneshot::channel();
            self.tx
                .send(Command::Retrieve { key: key.clone(), reply })
                .await
                .map_err(|_| Error::Closed)?;
            rx.await.map_err(|_| Error::Closed)?
        })
    }

    fn store<'a>(&'a self, key: CacheKey, content: CacheContent) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move {
            let (reply, rx) = oneshot::channel();
            self.tx
                .send(Command::Store { key, content, reply })
                .await
                .map_err(|_| Error::Closed)?;
            rx.await.map_err(|_| Error::Closed)?
        })
    }

    fn remove<'a>(&'a self, key: &'a CacheKey) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move {
            let (reply, rx) = oneshot::channel();
            self.tx
                .send(Command::Remove { key: key.clone(), reply })
                .await
                .map_err(|_| Error::Closed)?;
            rx.await.map_err(|_| Error::Closed)?
        })
    }

    fn resource_path(&self, key: &CacheKey) -> Option<PathBuf> {
        let path = Self::resource_path_for(&self.root, key);
        path.exists().then_some(path)
    }
}

impl DiskCache {
    pub async fn clear(&self) -> Result<(), Error> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(Command::Clear { reply }).await.map_err(|_| Error::Closed)?;
        rx.await.map_err(|_| Error::Closed)?
    }
}
