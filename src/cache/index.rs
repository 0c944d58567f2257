//! The on-disk index: an ordered, crash-tolerant record of which keys are in
//! the cache and how large each one's content file is.
//!
//! Stored as newline-delimited JSON (one [`CacheRecord`] per line) in
//! most-recently-used-first order, so a per-line parse failure only loses
//! that one record instead of the whole index, and a totally unparseable
//! file degrades to "empty cache" rather than a fatal error.

use crate::key::CacheKey;
use serde::{Deserialize, Serialize};

/// One line of the on-disk index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub key: CacheKey,
    pub size: u64,
}

/// The result of decoding an index file.
#[derive(Debug)]
pub struct DecodedIndex {
    pub records: Vec<CacheRecord>,
    /// Set when at least one line failed to parse and was skipped, or the
    /// whole file was unparseable.
    pub corrupted: bool,
}

/// Encodes records, most-recently-used first, as newline-delimited JSON.
pub fn encode(records: &[CacheRecord]) -> String {
    let mut out = String::new();
    for record in records {
        // A `CacheRecord` is a flat struct of a string and an integer; it
        // cannot fail to serialize.
        let line = serde_json::to_string(record).expect("CacheRecord always serializes");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Decodes an index file, skipping any line that fails to parse.
///
/// An empty or all-whitespace file decodes to an empty, non-corrupted index
/// (the expected shape of a freshly created cache directory) rather than
/// being flagged as corruption.
pub fn decode(text: &str) -> DecodedIndex {
    let mut records = Vec::new();
    let mut corrupted = false;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<CacheRecord>(line) {
            Ok(record) => records.push(record),
            Err(_) => corrupted = true,
        }
    }

    DecodedIndex { records, corrupted }
}
