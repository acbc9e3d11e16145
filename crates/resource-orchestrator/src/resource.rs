use alloy_primitives::{Address, U256};
use resource_core::types::{
    AccountResource, FungiblePosition, PositionState, RawLog, Token, TokenKey,
};
use resource_core::{ResourceConfig, ResourceError, Result};
use resource_engine::{classify_logs, pools_with_open_position, position_state, reduce_account, split_streams};
use resource_loader::{
    account_topic_filters, BatchCallExecutor, LoadedPools, LogSource, PairInfoSource,
    PoolStateLoader, MAX_BLOCK,
};
use resource_store::{KeyValueStore, LogStore, ResourceSnapshot, ResourceStore};
use std::sync::Arc;
use tracing::{debug, info};

/// Composition root: wires the log cache, log source, state loader and the
/// cross-call snapshot store into the three-branch refresh.
pub struct Resource {
    config: Arc<ResourceConfig>,
    log_source: Arc<dyn LogSource>,
    loader: PoolStateLoader,
    cache: LogStore,
    store: ResourceStore,
}

impl Resource {
    pub fn new(
        config: Arc<ResourceConfig>,
        log_source: Arc<dyn LogSource>,
        executor: Arc<dyn BatchCallExecutor>,
        pairs: Arc<dyn PairInfoSource>,
        kv: Option<Arc<dyn KeyValueStore>>,
    ) -> Self {
        let loader = PoolStateLoader::new(config.clone(), executor, pairs);
        let cache = LogStore::new(config.chain_id, kv);
        Self {
            config,
            log_source,
            loader,
            cache,
            store: ResourceStore::new(),
        }
    }

    pub fn config(&self) -> &ResourceConfig {
        &self.config
    }

    pub(crate) fn log_source(&self) -> &Arc<dyn LogSource> {
        &self.log_source
    }

    /// Full refresh: replay the cache, fetch past the cursor, and load the
    /// curated whitelist, all concurrently; layer the three snapshots in
    /// that order over the store. Any branch failure fails the refresh.
    pub async fn fetch_resource_data(
        &self,
        pool_addresses: &[Address],
        account: Address,
        play_mode: bool,
    ) -> Result<ResourceSnapshot> {
        let (cached, fresh, whitelist) = tokio::join!(
            self.get_resource_cached(account, play_mode),
            self.get_new_resource(account, play_mode),
            self.get_whitelist_resource(pool_addresses, play_mode),
        );
        let merged = cached?.merge(fresh?).merge(whitelist?);
        let applied = self.store.apply(merged).await;
        info!(
            account = %account,
            pools = applied.pools.len(),
            groups = applied.pool_groups.len(),
            tokens = applied.tokens.len(),
            logs = applied.logs.len(),
            "Resource refresh complete"
        );
        Ok(applied)
    }

    /// Rebuild a snapshot from the cached log window alone. Empty cache
    /// yields an empty snapshot without touching the chain.
    pub async fn get_resource_cached(
        &self,
        account: Address,
        play_mode: bool,
    ) -> Result<ResourceSnapshot> {
        let raw = self.cache.cached_logs(account);
        if raw.is_empty() {
            return Ok(ResourceSnapshot::default());
        }
        debug!(account = %account, count = raw.len(), "Replaying cached logs");
        self.generate_snapshot(raw, account, play_mode).await
    }

    /// Fetch the account's logs past the cache cursor and extend the cache.
    pub async fn get_new_resource(
        &self,
        account: Address,
        play_mode: bool,
    ) -> Result<ResourceSnapshot> {
        let from_block = self
            .cache
            .last_block_cached(account)
            .max(self.config.start_block);
        let filters = account_topic_filters(account);
        let logs = self.log_source.get_logs(from_block, MAX_BLOCK, &filters).await?;
        if let Some(head) = logs.last().map(|l| l.block_number) {
            self.cache.cache_logs(account, &logs, head);
        }
        self.generate_snapshot(logs, account, play_mode).await
    }

    /// Load the configured whitelist pools (plus any caller-supplied ones)
    /// and the curated token metadata, independent of the account.
    pub async fn get_whitelist_resource(
        &self,
        pool_addresses: &[Address],
        play_mode: bool,
    ) -> Result<ResourceSnapshot> {
        let mut pools = self.config.whitelist_pools.clone();
        pools.extend_from_slice(pool_addresses);
        if pools.is_empty() {
            return Ok(ResourceSnapshot::default());
        }
        let loaded = self.loader.load(&self.base_tokens(), &pools, play_mode).await?;
        let mut snapshot = snapshot_from_loaded(loaded, Vec::new());
        for meta in &self.config.whitelist_tokens {
            let key = TokenKey::Erc20(meta.address);
            if !snapshot.tokens.iter().any(|t| t.key == key) {
                snapshot.tokens.push(Token {
                    key,
                    symbol: meta.symbol.clone(),
                    name: meta.name.clone(),
                    decimals: meta.decimals,
                    total_supply: U256::ZERO,
                });
            }
        }
        Ok(snapshot)
    }

    /// Batch load an arbitrary set of pools and token metadata through the
    /// state loader, bypassing the account log pipeline entirely.
    pub async fn load_init_pools_data(
        &self,
        token_addresses: &[Address],
        pool_addresses: &[Address],
        play_mode: bool,
    ) -> Result<LoadedPools> {
        self.loader.load(token_addresses, pool_addresses, play_mode).await
    }

    /// Classify a raw log window, find the pools worth loading, and batch
    /// load their state together with every token the window touched.
    async fn generate_snapshot(
        &self,
        raw: Vec<RawLog>,
        account: Address,
        play_mode: bool,
    ) -> Result<ResourceSnapshot> {
        let classified = classify_logs(&raw);
        let streams = split_streams(&self.config, &classified);
        let open_pools = pools_with_open_position(account, &streams.bna_logs);

        let mut token_addresses = self.base_tokens();
        token_addresses.extend(streams.transfer_logs.iter().map(|l| l.raw.address));

        let loaded = if open_pools.is_empty() && token_addresses.is_empty() {
            LoadedPools::default()
        } else {
            self.loader.load(&token_addresses, &open_pools, play_mode).await?
        };

        let mut snapshot = snapshot_from_loaded(loaded, raw);
        snapshot.swap_logs = streams.swap_logs;
        snapshot.transfer_logs = streams.transfer_logs;
        snapshot.bna_logs = streams.bna_logs;
        Ok(snapshot)
    }

    /// Tokens always worth metadata: routing tokens and stablecoins.
    fn base_tokens(&self) -> Vec<Address> {
        let mut tokens = self.config.route_tokens.clone();
        tokens.extend(self.config.stablecoins.iter().copied());
        tokens
    }

    /// Replay the stored balance-and-allowance stream for `account`.
    pub async fn get_balance_and_allowance(&self, account: Address) -> Result<AccountResource> {
        if account == Address::ZERO {
            return Err(ResourceError::MissingAccount);
        }
        let snapshot = self.store.snapshot().await;
        Ok(reduce_account(
            &self.config,
            &snapshot.bna_logs,
            account,
            &snapshot.pools,
        ))
    }

    /// Value a position against the stored snapshot.
    pub async fn get_position_state(
        &self,
        position: &FungiblePosition,
        balance: U256,
    ) -> Option<PositionState> {
        let snapshot = self.store.snapshot().await;
        position_state(position, balance, &snapshot.pools, &snapshot.pool_groups)
    }

    /// Point-in-time view of everything loaded so far.
    pub async fn snapshot(&self) -> ResourceSnapshot {
        self.store.snapshot().await
    }
}

fn snapshot_from_loaded(loaded: LoadedPools, raw: Vec<RawLog>) -> ResourceSnapshot {
    ResourceSnapshot {
        pools: loaded.pools,
        pool_groups: loaded.pool_groups,
        tokens: loaded.tokens,
        logs: raw,
        ..Default::default()
    }
}
