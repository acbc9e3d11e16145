use alloy_primitives::{Address, Bytes, LogData, B256};
use serde::{Deserialize, Serialize};

/// A raw chain log, normalized for ordering, dedup and cache persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: u64,
    pub log_index: u64,
    pub transaction_hash: B256,
    /// Block timestamp, backfilled after fetch. Zero when unknown.
    #[serde(default)]
    pub timestamp: u64,
}

impl RawLog {
    /// Chain order of this log.
    pub fn ordering_key(&self) -> (u64, u64) {
        (self.block_number, self.log_index)
    }

    /// Identity used for dedup across overlapping fetches.
    pub fn identity(&self) -> (B256, u64) {
        (self.transaction_hash, self.log_index)
    }

    pub fn topic0(&self) -> Option<B256> {
        self.topics.first().copied()
    }

    /// View usable by `SolEvent::decode_log_data`.
    pub fn log_data(&self) -> LogData {
        LogData::new_unchecked(self.topics.clone(), self.data.clone())
    }
}
