use alloy::network::Ethereum;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::Filter;
use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use futures::future::join_all;
use resource_core::types::RawLog;
use resource_core::{ResourceError, Result};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

/// Highest block number requestable as a `toBlock`; some dev chains reject
/// "latest" on wide ranges.
pub const MAX_BLOCK: u64 = u32::MAX as u64;

/// One topic filter quad, OR-combined with its siblings in a batch.
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub address: Option<Address>,
    pub topics: [Option<B256>; 4],
}

/// Seam over `eth_getLogs`. Implementations return logs for the union of
/// the filters, chain-ordered and deduplicated, with timestamps filled in.
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn get_logs(
        &self,
        from_block: u64,
        to_block: u64,
        filters: &[LogFilter],
    ) -> Result<Vec<RawLog>>;
}

/// The filter set that captures everything an account can appear in:
/// the account padded into each indexed topic position.
pub fn account_topic_filters(account: Address) -> Vec<LogFilter> {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(account.as_slice());
    let topic = B256::from(word);

    (1..4)
        .map(|position| {
            let mut filter = LogFilter::default();
            filter.topics[position] = Some(topic);
            filter
        })
        .collect()
}

pub type BoxedProvider = Arc<dyn Provider<Ethereum> + Send + Sync>;

/// `LogSource` over a plain JSON-RPC endpoint: one `eth_getLogs` per quad,
/// issued concurrently, merged, then block timestamps backfilled.
pub struct RpcLogSource {
    provider: BoxedProvider,
}

impl RpcLogSource {
    pub fn new(rpc_url: &str) -> Result<Self> {
        let url: reqwest::Url = rpc_url
            .parse()
            .map_err(|e| ResourceError::Rpc(format!("Invalid HTTP URL: {}", e)))?;
        let provider = ProviderBuilder::new().connect_http(url);
        Ok(Self {
            provider: Arc::new(provider),
        })
    }

    pub fn from_provider(provider: BoxedProvider) -> Self {
        Self { provider }
    }

    async fn fetch_one(&self, from: u64, to: u64, quad: &LogFilter) -> Result<Vec<RawLog>> {
        let mut filter = Filter::new().from_block(from).to_block(to);
        if let Some(address) = quad.address {
            filter = filter.address(address);
        }
        if let Some(t) = quad.topics[0] {
            filter = filter.event_signature(t);
        }
        if let Some(t) = quad.topics[1] {
            filter = filter.topic1(t);
        }
        if let Some(t) = quad.topics[2] {
            filter = filter.topic2(t);
        }
        if let Some(t) = quad.topics[3] {
            filter = filter.topic3(t);
        }

        let logs = self
            .provider
            .get_logs(&filter)
            .await
            .map_err(|e| ResourceError::Rpc(format!("{:?}", e)))?;

        Ok(logs
            .into_iter()
            .map(|log| RawLog {
                address: log.address(),
                topics: log.topics().to_vec(),
                data: log.data().data.clone(),
                block_number: log.block_number.unwrap_or_default(),
                log_index: log.log_index.unwrap_or_default(),
                transaction_hash: log.transaction_hash.unwrap_or_default(),
                timestamp: 0,
            })
            .collect())
    }

    async fn backfill_timestamps(&self, logs: &mut [RawLog]) -> Result<()> {
        let blocks: BTreeSet<u64> = logs.iter().map(|l| l.block_number).collect();
        let fetches = blocks.iter().map(|&number| {
            let provider = self.provider.clone();
            async move {
                let block = provider
                    .get_block_by_number(number.into())
                    .await
                    .map_err(|e| ResourceError::Rpc(format!("{:?}", e)))?;
                Ok::<_, ResourceError>((number, block.map(|b| b.header.timestamp).unwrap_or(0)))
            }
        });

        let mut timestamps: HashMap<u64, u64> = HashMap::new();
        for result in join_all(fetches).await {
            let (number, timestamp) = result?;
            timestamps.insert(number, timestamp);
        }
        for log in logs.iter_mut() {
            log.timestamp = timestamps.get(&log.block_number).copied().unwrap_or(0);
        }
        Ok(())
    }
}

#[async_trait]
impl LogSource for RpcLogSource {
    async fn get_logs(
        &self,
        from_block: u64,
        to_block: u64,
        filters: &[LogFilter],
    ) -> Result<Vec<RawLog>> {
        let fetches = filters.iter().map(|quad| self.fetch_one(from_block, to_block, quad));
        let mut merged: Vec<RawLog> = Vec::new();
        for result in join_all(fetches).await {
            merged.extend(result?);
        }
        merged.sort_by_key(|l| l.ordering_key());
        merged.dedup_by(|a, b| a.identity() == b.identity());

        self.backfill_timestamps(&mut merged).await?;
        debug!(
            from = from_block,
            to = to_block,
            quads = filters.len(),
            count = merged.len(),
            "Fetched account logs"
        );
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_filters_cover_each_indexed_position() {
        let account = Address::repeat_byte(0xaa);
        let filters = account_topic_filters(account);
        assert_eq!(filters.len(), 3);
        for (i, filter) in filters.iter().enumerate() {
            assert!(filter.address.is_none());
            assert!(filter.topics[0].is_none());
            let set: Vec<usize> = (0..4).filter(|&p| filter.topics[p].is_some()).collect();
            assert_eq!(set, vec![i + 1]);
            let topic = filter.topics[i + 1].unwrap();
            assert_eq!(&topic.0[12..], account.as_slice());
            assert!(topic.0[..12].iter().all(|&b| b == 0));
        }
    }
}
