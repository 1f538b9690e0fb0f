// src/watch/hash.rs

//! Content hashing for `use_hash` watching.
//!
//! A task is only re-triggered when the aggregate hash over every file its
//! glob selects differs from the last hash recorded for it. Hashes live in
//! memory for the lifetime of the process.

use std::collections::HashMap;
use std::fmt::Debug;
use std::path::Path;

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::{debug, info};

use crate::engine::TaskName;
use crate::fs::FileSystem;

/// Compute the hash of a single file.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let bytes = fs
        .read(path)
        .with_context(|| format!("reading file for hashing: {path:?}"))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

/// Compute aggregate hash from a list of file hashes.
///
/// `hashes` must be ordered by the corresponding file path to ensure
/// stability. Each entry is paired with its path so that renames change the
/// aggregate even when contents do not.
pub fn compute_aggregate_hash<P: AsRef<str>>(hashes: &[(P, String)]) -> String {
    let mut hasher = Hasher::new();
    for (path, hash) in hashes {
        hasher.update(path.as_ref().as_bytes());
        hasher.update(&[0]);
        hasher.update(hash.as_bytes());
    }
    let hash = hasher.finalize().to_hex().to_string();
    debug!(hash = %hash, files = hashes.len(), "computed aggregate hash");
    hash
}

/// Abstract storage for task hashes.
pub trait HashStore: Send + Sync + Debug {
    fn load(&self, task: &str) -> Option<String>;
    fn save(&mut self, task: &str, hash: &str);
    /// Remove hashes for tasks that are not in the `active_tasks` list.
    fn prune(&mut self, active_tasks: &[&str]);
}

/// Stores hashes in memory only.
#[derive(Debug, Default)]
pub struct MemoryHashStore {
    map: HashMap<TaskName, String>,
}

impl MemoryHashStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HashStore for MemoryHashStore {
    fn load(&self, task: &str) -> Option<String> {
        self.map.get(task).cloned()
    }

    fn save(&mut self, task: &str, hash: &str) {
        self.map.insert(task.to_string(), hash.to_string());
        debug!(task = %task, hash = %hash, "stored task hash");
    }

    fn prune(&mut self, active_tasks: &[&str]) {
        let initial_len = self.map.len();
        self.map.retain(|k, _| active_tasks.contains(&k.as_str()));
        if self.map.len() < initial_len {
            info!(removed = initial_len - self.map.len(), "pruned stale task hashes");
        }
    }
}
