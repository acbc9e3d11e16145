use crate::merger::merge_sorted_unique;
use alloy_primitives::Address;
use dashmap::DashMap;
use resource_core::types::{ClassifiedLog, Pool, PoolGroup, RawLog, Token, TokenKey};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Immutable view of everything one refresh produced. Snapshots merge by
/// layering a newer one over an older one; neither input is mutated.
#[derive(Debug, Clone, Default)]
pub struct ResourceSnapshot {
    pub pools: BTreeMap<Address, Pool>,
    pub pool_groups: BTreeMap<String, PoolGroup>,
    pub tokens: Vec<Token>,
    /// Raw account logs backing this snapshot, chain-ordered.
    pub logs: Vec<RawLog>,
    pub swap_logs: Vec<ClassifiedLog>,
    pub transfer_logs: Vec<ClassifiedLog>,
    pub bna_logs: Vec<ClassifiedLog>,
}

impl ResourceSnapshot {
    /// Layer `newer` over `self`: newer pools and groups overwrite by key,
    /// tokens keep the first occurrence per key, log streams merge in chain
    /// order without duplicates.
    pub fn merge(mut self, newer: ResourceSnapshot) -> ResourceSnapshot {
        for (addr, pool) in newer.pools {
            self.pools.insert(addr, pool);
        }
        for (id, group) in newer.pool_groups {
            self.pool_groups.insert(id, group);
        }
        for token in newer.tokens {
            if !self.tokens.iter().any(|t| t.key == token.key) {
                self.tokens.push(token);
            }
        }
        self.logs = merge_sorted_unique(&self.logs, &newer.logs);
        self.swap_logs = merge_sorted_unique(&self.swap_logs, &newer.swap_logs);
        self.transfer_logs = merge_sorted_unique(&self.transfer_logs, &newer.transfer_logs);
        self.bna_logs = merge_sorted_unique(&self.bna_logs, &newer.bna_logs);
        self
    }

    pub fn pool(&self, address: &Address) -> Option<&Pool> {
        self.pools.get(address)
    }

    /// Group containing the given pool, if any.
    pub fn group_of(&self, pool: &Address) -> Option<&PoolGroup> {
        self.pool_groups.values().find(|g| g.pools.contains_key(pool))
    }
}

/// Cross-call cache of the latest merged snapshot plus a token registry.
/// Readers get point-in-time clones; concurrent refreshes serialize on the
/// write lock.
#[derive(Debug, Default)]
pub struct ResourceStore {
    snapshot: RwLock<ResourceSnapshot>,
    tokens: DashMap<TokenKey, Token>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a freshly produced snapshot into the cached one and return the
    /// merged result.
    pub async fn apply(&self, fresh: ResourceSnapshot) -> ResourceSnapshot {
        for token in &fresh.tokens {
            self.tokens.insert(token.key, token.clone());
        }
        let mut guard = self.snapshot.write().await;
        let merged = std::mem::take(&mut *guard).merge(fresh);
        *guard = merged.clone();
        merged
    }

    pub async fn snapshot(&self) -> ResourceSnapshot {
        self.snapshot.read().await.clone()
    }

    pub fn token(&self, key: &TokenKey) -> Option<Token> {
        self.tokens.get(key).map(|t| t.clone())
    }
}
