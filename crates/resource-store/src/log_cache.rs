use crate::merger::merge_sorted_unique;
use alloy_primitives::Address;
use dashmap::DashMap;
use resource_core::types::RawLog;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// Minimal persistence seam for the per-account log cache. Implementations
/// must tolerate concurrent readers.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// In-memory store, used by tests and cache-less runs.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: DashMap<String, String>,
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.clone())
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }
}

/// One file per key under a cache directory.
#[derive(Debug)]
pub struct FileKv {
    dir: PathBuf,
}

impl FileKv {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileKv {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(e) = fs::create_dir_all(&self.dir) {
            warn!(dir = %self.dir.display(), error = %e, "Failed to create cache dir");
            return;
        }
        if let Err(e) = fs::write(self.path(key), value) {
            warn!(key, error = %e, "Failed to persist cache entry");
        }
    }
}

/// Per-(chain, account) log cache with a high-water block cursor. A corrupt
/// or missing payload degrades to a cold start, never an error.
pub struct LogStore {
    chain_id: u64,
    kv: Option<Arc<dyn KeyValueStore>>,
}

impl LogStore {
    pub fn new(chain_id: u64, kv: Option<Arc<dyn KeyValueStore>>) -> Self {
        Self { chain_id, kv }
    }

    fn logs_key(&self, account: Address) -> String {
        format!("{}-account-logs-{}", self.chain_id, account)
    }

    fn block_key(&self, account: Address) -> String {
        format!("{}-account-block-{}", self.chain_id, account)
    }

    /// Previously cached logs for the account, chain-ordered.
    pub fn cached_logs(&self, account: Address) -> Vec<RawLog> {
        let Some(kv) = &self.kv else {
            return Vec::new();
        };
        let Some(payload) = kv.get(&self.logs_key(account)) else {
            return Vec::new();
        };
        match serde_json::from_str(&payload) {
            Ok(logs) => logs,
            Err(e) => {
                warn!(account = %account, error = %e, "Corrupt log cache, starting cold");
                Vec::new()
            }
        }
    }

    /// Last block the cache is complete through. Zero means cold.
    pub fn last_block_cached(&self, account: Address) -> u64 {
        let Some(kv) = &self.kv else { return 0 };
        kv.get(&self.block_key(account))
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    /// Merge freshly fetched logs into the cache and advance the cursor.
    /// The cursor never moves backwards.
    pub fn cache_logs(&self, account: Address, new_logs: &[RawLog], head_block: u64) {
        let Some(kv) = &self.kv else { return };
        let merged = merge_sorted_unique(&self.cached_logs(account), new_logs);
        match serde_json::to_string(&merged) {
            Ok(payload) => kv.set(&self.logs_key(account), &payload),
            Err(e) => {
                warn!(account = %account, error = %e, "Failed to encode log cache");
                return;
            }
        }
        let cursor = head_block.max(self.last_block_cached(account));
        kv.set(&self.block_key(account), &cursor.to_string());
    }
}
