use crate::resource::Resource;
use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::SolEvent;
use resource_core::events::PoolCreated;
use resource_core::types::{ClassifiedLog, DomainEvent, OracleSpec, PoolGroup};
use resource_core::Result;
use resource_engine::classify_logs;
use resource_loader::LogFilter;
use std::collections::BTreeMap;

/// A pool as announced by its creation log, before any state load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPool {
    pub address: Address,
    pub oracle: B256,
    pub reserve_token: Address,
    pub k: U256,
    pub mark: U256,
    pub block_number: u64,
    pub timestamp: u64,
}

/// Creation logs bucketed by the group their oracle points at.
pub type SearchResults = BTreeMap<String, Vec<CreatedPool>>;

/// A keyword as it appears in a creation log's indexed search keys:
/// UTF-8, zero-padded to a word.
pub fn search_topic(keyword: &str) -> B256 {
    let mut word = [0u8; 32];
    let bytes = keyword.as_bytes();
    let len = bytes.len().min(32);
    word[..len].copy_from_slice(&bytes[..len]);
    B256::from(word)
}

/// Filters matching the keyword in any of the three indexed key positions
/// of the deployer's creation events.
pub fn search_filters(deployer: Address, keyword: &str) -> Vec<LogFilter> {
    let topic = search_topic(keyword);
    (1..4)
        .map(|position| {
            let mut filter = LogFilter {
                address: Some(deployer),
                ..Default::default()
            };
            filter.topics[0] = Some(PoolCreated::SIGNATURE_HASH);
            filter.topics[position] = Some(topic);
            filter
        })
        .collect()
}

/// Bucket classified creation logs by pool group id.
pub fn group_created_pools(logs: &[ClassifiedLog]) -> SearchResults {
    let mut results = SearchResults::new();
    for log in logs {
        let DomainEvent::PoolCreated {
            pool,
            oracle,
            reserve_token,
            k,
            mark,
            ..
        } = &log.event
        else {
            continue;
        };
        let spec = OracleSpec::parse(*oracle);
        let id = PoolGroup::group_id(spec.pair, spec.quote_token_index, *reserve_token);
        results.entry(id).or_default().push(CreatedPool {
            address: *pool,
            oracle: *oracle,
            reserve_token: *reserve_token,
            k: *k,
            mark: *mark,
            block_number: log.raw.block_number,
            timestamp: log.raw.timestamp,
        });
    }
    results
}

impl Resource {
    /// Search the deployer's creation history for pools whose indexed keys
    /// match the keyword, grouped by pool group.
    pub async fn search_index(&self, keyword: &str) -> Result<SearchResults> {
        let config = self.config();
        let filters = search_filters(config.pool_deployer, keyword);
        let logs = self
            .log_source()
            .get_logs(config.start_block, resource_loader::MAX_BLOCK, &filters)
            .await?;
        Ok(group_created_pools(&classify_logs(&logs)))
    }
}
