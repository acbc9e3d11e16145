use alloy_primitives::Address;
use resource_core::ResourceConfig;
use resource_loader::{AmmPairSource, RpcCallExecutor, RpcLogSource};
use resource_orchestrator::Resource;
use resource_store::{FileKv, KeyValueStore};
use std::sync::Arc;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (ignore if not found)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(Level::INFO.into())
                .add_directive("resource_loader=info".parse()?)
                .add_directive("resource_orchestrator=info".parse()?),
        )
        .init();

    info!("Resource indexer starting...");

    let config = match ResourceConfig::load() {
        Ok(config) => {
            info!(
                chain_id = config.chain_id,
                position_token = ?config.position_token,
                pool_deployer = ?config.pool_deployer,
                start_block = config.start_block,
                whitelist_pools = config.whitelist_pools.len(),
                "Configuration loaded from profile"
            );
            Arc::new(config)
        }
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    let account: Address = match std::env::var("ACCOUNT") {
        Ok(value) => value.parse()?,
        Err(_) => {
            error!("ACCOUNT environment variable is required");
            std::process::exit(1);
        }
    };
    let play_mode = std::env::var("PLAY_MODE")
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(false);

    // Log cache is optional - without CACHE_DIR every run is a cold start
    let kv: Option<Arc<dyn KeyValueStore>> = match std::env::var("CACHE_DIR") {
        Ok(dir) => {
            info!(dir = %dir, "Log cache enabled");
            Some(Arc::new(FileKv::new(dir)))
        }
        Err(_) => {
            warn!("CACHE_DIR not set - running without a log cache");
            None
        }
    };

    let log_source = Arc::new(RpcLogSource::new(&config.rpc_url)?);
    let executor = Arc::new(RpcCallExecutor::new(&config.rpc_url)?);
    let pairs = Arc::new(AmmPairSource::new(executor.clone()));

    let resource = Resource::new(config.clone(), log_source, executor, pairs, kv);

    let snapshot = resource.fetch_resource_data(&[], account, play_mode).await?;
    info!(
        pools = snapshot.pools.len(),
        groups = snapshot.pool_groups.len(),
        tokens = snapshot.tokens.len(),
        logs = snapshot.logs.len(),
        swaps = snapshot.swap_logs.len(),
        "Snapshot ready"
    );

    let holdings = resource.get_balance_and_allowance(account).await?;
    info!(
        account = ?account,
        balances = holdings.balances.len(),
        allowances = holdings.allowances.len(),
        maturities = holdings.maturities.len(),
        "Account holdings reduced"
    );

    for (key, balance) in &holdings.balances {
        info!(token = %key, balance = %balance, "Holding");
    }

    Ok(())
}
