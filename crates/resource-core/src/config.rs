use crate::error::{ResourceError, Result};
use alloy_primitives::{Address, Bytes};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Static metadata for a curated token shipped with the profile.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenMeta {
    pub address: Address,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
}

/// Chain profile loaded from JSON file
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileConfig {
    pub position_token: Address,
    pub start_block: u64,
    pub pool_deployer: Address,
    pub router: Address,
    /// Token whose pools belong to play mode; pools backed by any other
    /// reserve token are regular pools.
    pub play_token: Address,
    /// Address the stateless pool-view logic is attached to via state override.
    pub logic: Address,
    pub logic_bytecode: Bytes,
    /// Address the token metadata lens is attached to via state override.
    pub token_info_lens: Address,
    pub token_info_bytecode: Bytes,
    /// Price fetcher address -> price exponent (1 for plain spot, 2 for
    /// pools quoting an x^2 price source). Pools with an unlisted non-zero
    /// fetcher are excluded.
    #[serde(default)]
    pub fetchers: HashMap<Address, u32>,
    #[serde(default)]
    pub whitelist_pools: Vec<Address>,
    #[serde(default)]
    pub whitelist_tokens: Vec<TokenMeta>,
    #[serde(default)]
    pub stablecoins: Vec<Address>,
    #[serde(default)]
    pub route_tokens: Vec<Address>,
}

/// Runtime configuration from environment variables
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub chain_id: u64,
    pub rpc_url: String,
}

/// Complete engine configuration
#[derive(Debug, Clone)]
pub struct ResourceConfig {
    pub chain_id: u64,
    pub rpc_url: String,
    pub position_token: Address,
    pub start_block: u64,
    pub pool_deployer: Address,
    pub router: Address,
    pub play_token: Address,
    pub logic: Address,
    pub logic_bytecode: Bytes,
    pub token_info_lens: Address,
    pub token_info_bytecode: Bytes,
    pub fetchers: HashMap<Address, u32>,
    pub whitelist_pools: Vec<Address>,
    pub whitelist_tokens: Vec<TokenMeta>,
    pub stablecoins: Vec<Address>,
    pub route_tokens: Vec<Address>,
}

impl EnvConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let chain_id = env::var("CHAIN_ID")
            .map_err(|_| ResourceError::MissingEnvVar("CHAIN_ID".to_string()))?
            .parse::<u64>()
            .map_err(|_| ResourceError::MissingEnvVar("CHAIN_ID (invalid format)".to_string()))?;

        let rpc_url = Self::sanitize_url(
            env::var("RPC_URL").map_err(|_| ResourceError::MissingEnvVar("RPC_URL".to_string()))?,
        );

        Ok(Self { chain_id, rpc_url })
    }

    /// Sanitize URL by removing surrounding quotes and whitespace
    fn sanitize_url(url: String) -> String {
        let trimmed = url.trim();
        let without_quotes = if trimmed.starts_with('"') && trimmed.ends_with('"') {
            &trimmed[1..trimmed.len() - 1]
        } else if trimmed.starts_with('\'') && trimmed.ends_with('\'') {
            &trimmed[1..trimmed.len() - 1]
        } else {
            trimmed
        };
        without_quotes.to_string()
    }
}

impl ProfileConfig {
    /// Load the chain profile from its JSON file
    pub fn load(chain_id: u64) -> Result<Self> {
        let path = Self::profile_path(chain_id);
        let content = fs::read_to_string(&path)
            .map_err(|_| ResourceError::ProfileFileNotFound(path.display().to_string()))?;

        serde_json::from_str(&content).map_err(|e| ResourceError::ProfileParseError(e.to_string()))
    }

    fn profile_path(chain_id: u64) -> PathBuf {
        PathBuf::from(format!("profiles/{}.json", chain_id))
    }
}

impl ResourceConfig {
    /// Load complete configuration from environment and profile file
    pub fn load() -> Result<Self> {
        let env_config = EnvConfig::load()?;
        let profile = ProfileConfig::load(env_config.chain_id)?;
        Ok(Self::from_parts(env_config, profile))
    }

    pub fn from_parts(env_config: EnvConfig, profile: ProfileConfig) -> Self {
        Self {
            chain_id: env_config.chain_id,
            rpc_url: env_config.rpc_url,
            position_token: profile.position_token,
            start_block: profile.start_block,
            pool_deployer: profile.pool_deployer,
            router: profile.router,
            play_token: profile.play_token,
            logic: profile.logic,
            logic_bytecode: profile.logic_bytecode,
            token_info_lens: profile.token_info_lens,
            token_info_bytecode: profile.token_info_bytecode,
            fetchers: profile.fetchers,
            whitelist_pools: profile.whitelist_pools,
            whitelist_tokens: profile.whitelist_tokens,
            stablecoins: profile.stablecoins,
            route_tokens: profile.route_tokens,
        }
    }

    /// Price exponent for a pool's fetcher. Zero fetcher means the oracle
    /// quotes a plain spot price; unknown non-zero fetchers are unsupported.
    pub fn fetcher_exp(&self, fetcher: Address) -> Option<u32> {
        if fetcher == Address::ZERO {
            return Some(1);
        }
        self.fetchers.get(&fetcher).copied()
    }
}
