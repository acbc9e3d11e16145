use crate::calls::{PoolView, TokenLens};
use crate::executor::{BatchCallExecutor, Call, CallGroup, StateOverrides};
use crate::pairs::PairInfoSource;
use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use resource_core::types::{
    OracleSpec, PairInfo, Pool, PoolGroup, PoolStates, Side, Token, TokenKey,
};
use resource_core::{ResourceConfig, ResourceError, Result};
use resource_engine::{calc_pool_info, get_rdc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// Everything one batched load produced.
#[derive(Debug, Clone, Default)]
pub struct LoadedPools {
    pub tokens: Vec<Token>,
    pub pools: BTreeMap<Address, Pool>,
    pub pool_groups: BTreeMap<String, PoolGroup>,
}

/// Loads pool configs, reserve states and token metadata in one override
/// batch, then folds pools into groups. Broken pools are excluded, never
/// fatal; transport errors propagate.
pub struct PoolStateLoader {
    config: Arc<ResourceConfig>,
    executor: Arc<dyn BatchCallExecutor>,
    pairs: Arc<dyn PairInfoSource>,
}

const TOKENS_GROUP: &str = "tokens";
const CONFIG_CALL: &str = "config";
const STATE_CALL: &str = "state";
const TOKEN_INFO_CALL: &str = "info";

impl PoolStateLoader {
    pub fn new(
        config: Arc<ResourceConfig>,
        executor: Arc<dyn BatchCallExecutor>,
        pairs: Arc<dyn PairInfoSource>,
    ) -> Self {
        Self {
            config,
            executor,
            pairs,
        }
    }

    /// Load `pool_addresses` plus metadata for `token_addresses`. In play
    /// mode only play-token pools survive; outside it they are excluded.
    pub async fn load(
        &self,
        token_addresses: &[Address],
        pool_addresses: &[Address],
        play_mode: bool,
    ) -> Result<LoadedPools> {
        let mut tokens: Vec<Address> = token_addresses
            .iter()
            .copied()
            .filter(|a| *a != Address::ZERO)
            .collect();
        tokens.sort();
        tokens.dedup();

        let mut pools: Vec<Address> = pool_addresses.to_vec();
        pools.sort();
        pools.dedup();

        let overrides = StateOverrides::default()
            .with_code(self.config.logic, self.config.logic_bytecode.clone())
            .with_code(
                self.config.token_info_lens,
                self.config.token_info_bytecode.clone(),
            );

        let mut groups = vec![CallGroup {
            reference: TOKENS_GROUP.to_string(),
            contract: self.config.token_info_lens,
            calls: vec![Call {
                reference: TOKEN_INFO_CALL.to_string(),
                calldata: TokenLens::getTokenInfoCall {
                    tokens: tokens.clone(),
                }
                .abi_encode()
                .into(),
            }],
        }];
        for &pool in &pools {
            groups.push(CallGroup {
                reference: format!("{pool}"),
                contract: self.config.logic,
                calls: vec![
                    Call {
                        reference: CONFIG_CALL.to_string(),
                        calldata: PoolView::loadConfigCall { pool }.abi_encode().into(),
                    },
                    Call {
                        reference: STATE_CALL.to_string(),
                        calldata: PoolView::computeCall {
                            pool,
                            positionToken: self.config.position_token,
                        }
                        .abi_encode()
                        .into(),
                    },
                ],
            });
        }

        let response = self.executor.execute(&overrides, &groups).await?;

        let mut loaded = LoadedPools::default();
        self.parse_tokens(&tokens, &response, &mut loaded)?;

        // decode every pool that answered; per-pool failures only exclude
        // that pool
        let mut decoded: Vec<Pool> = Vec::new();
        for &address in &pools {
            match self.parse_pool(address, &response, play_mode) {
                Ok(Some(pool)) => decoded.push(pool),
                Ok(None) => {}
                Err(e) => warn!(pool = %address, error = %e, "Excluding unreadable pool"),
            }
        }

        let pair_addresses: Vec<Address> = decoded.iter().map(|p| p.pair).collect();
        let pair_infos = self.pairs.get_pairs_info(&pair_addresses).await?;

        let token_decimals: HashMap<Address, u8> = loaded
            .tokens
            .iter()
            .filter_map(|t| match t.key {
                TokenKey::Erc20(address) => Some((address, t.decimals)),
                _ => None,
            })
            .collect();

        for mut pool in decoded {
            let Some(pair) = pair_infos.get(&pool.pair) else {
                warn!(pool = %pool.address, pair = %pool.pair, "Excluding pool with unknown pair");
                continue;
            };
            if pool.quote_token_index == 0 {
                pool.quote_token = pair.token0.address;
                pool.base_token = pair.token1.address;
            } else {
                pool.quote_token = pair.token1.address;
                pool.base_token = pair.token0.address;
            }
            pool.info = calc_pool_info(&pool);

            let base_symbol = base_symbol(pair, pool.quote_token_index);
            let side_decimals = token_decimals
                .get(&pool.reserve_token)
                .copied()
                .unwrap_or(18);
            loaded
                .tokens
                .extend(side_tokens(&pool, &base_symbol, side_decimals));

            self.fold_into_group(&mut loaded, pool, pair.clone());
        }

        for group in loaded.pool_groups.values_mut() {
            group.reserves = get_rdc(group.pools.values());
        }

        debug!(
            tokens = loaded.tokens.len(),
            pools = loaded.pools.len(),
            groups = loaded.pool_groups.len(),
            "Loaded pool state"
        );
        Ok(loaded)
    }

    fn parse_tokens(
        &self,
        addresses: &[Address],
        response: &crate::executor::BatchResponse,
        loaded: &mut LoadedPools,
    ) -> Result<()> {
        if addresses.is_empty() {
            return Ok(());
        }
        let bytes = response.get(TOKENS_GROUP, TOKEN_INFO_CALL)?;
        let infos = TokenLens::getTokenInfoCall::abi_decode_returns(bytes)
            .map_err(|e| ResourceError::CallDecode(e.to_string()))?;
        for (address, info) in addresses.iter().zip(infos) {
            // a zero-decimals answer means the address is not an ERC-20
            if info.decimals.is_zero() {
                continue;
            }
            loaded.tokens.push(Token {
                key: TokenKey::Erc20(*address),
                symbol: info.symbol,
                name: info.name,
                decimals: info.decimals.saturating_to::<u8>(),
                total_supply: info.totalSupply,
            });
        }
        Ok(())
    }

    fn parse_pool(
        &self,
        address: Address,
        response: &crate::executor::BatchResponse,
        play_mode: bool,
    ) -> Result<Option<Pool>> {
        let reference = format!("{address}");
        let config = PoolView::loadConfigCall::abi_decode_returns(
            response.get(&reference, CONFIG_CALL)?,
        )
        .map_err(|e| ResourceError::CallDecode(e.to_string()))?;
        let state = PoolView::computeCall::abi_decode_returns(
            response.get(&reference, STATE_CALL)?,
        )
        .map_err(|e| ResourceError::CallDecode(e.to_string()))?;

        let is_play_pool = config.reserveToken == self.config.play_token;
        if play_mode != is_play_pool {
            return Ok(None);
        }
        let Some(exp) = self.config.fetcher_exp(config.fetcher) else {
            warn!(pool = %address, fetcher = %config.fetcher, "Unknown fetcher, excluding pool");
            return Ok(None);
        };

        let oracle = OracleSpec::parse(config.oracle);
        Ok(Some(Pool {
            address,
            reserve_token: config.reserveToken,
            oracle: config.oracle,
            pair: oracle.pair,
            quote_token_index: oracle.quote_token_index,
            window: oracle.window,
            base_token: Address::ZERO,
            quote_token: Address::ZERO,
            k: config.k.saturating_to::<u32>(),
            exp,
            mark: config.mark,
            interest_half_life: config.interestHalfLife as u64,
            premium_half_life: config.premiumHalfLife as u64,
            maturity: config.maturity as u64,
            states: PoolStates {
                r: state.R,
                a: state.a,
                b: state.b,
                r_a: state.rA,
                r_b: state.rB,
                r_c: state.rC,
                s_a: state.sA,
                s_b: state.sB,
                s_c: state.sC,
                twap: state.twap,
                spot: state.spot,
            },
            info: Default::default(),
        }))
    }

    fn fold_into_group(&self, loaded: &mut LoadedPools, pool: Pool, pair: PairInfo) {
        let id = PoolGroup::group_id(pool.pair, pool.quote_token_index, pool.reserve_token);
        let group = loaded.pool_groups.entry(id.clone()).or_insert_with(|| PoolGroup {
            id,
            pair,
            oracle: pool.oracle,
            quote_token_index: pool.quote_token_index,
            reserve_token: pool.reserve_token,
            base_token: pool.base_token,
            quote_token: pool.quote_token,
            ..Default::default()
        });

        // first pool wins, matching the group's creation order
        if group.base_price_x128.is_zero() {
            group.base_price_x128 = pool.states.spot;
        }

        let power = pool.k as i64;
        for signed in [power, -power] {
            if !group.powers.contains(&signed) {
                group.powers.push(signed);
            }
        }
        for side in [Side::Long, Side::Short] {
            group.d_tokens.push(pool.side_key(side));
        }
        for side in Side::ALL {
            group.all_tokens.push(pool.side_key(side));
        }

        group.pools.insert(pool.address, pool.clone());
        loaded.pools.insert(pool.address, pool);
    }
}

fn base_symbol(pair: &PairInfo, quote_token_index: u8) -> String {
    if quote_token_index == 0 {
        pair.token1.symbol.clone()
    } else {
        pair.token0.symbol.clone()
    }
}

/// Synthetic display tokens for a pool's three sides.
fn side_tokens(pool: &Pool, base_symbol: &str, decimals: u8) -> Vec<Token> {
    let leverage = pool.leverage();
    Side::ALL
        .iter()
        .map(|&side| {
            let symbol = match side {
                Side::Long => format!("{base_symbol}^{leverage}"),
                Side::Short => format!("{base_symbol}^-{leverage}"),
                Side::Lp => format!("DLP-{base_symbol}-{leverage}"),
            };
            Token {
                key: pool.side_key(side),
                symbol: symbol.clone(),
                name: symbol,
                decimals,
                total_supply: U256::ZERO,
            }
        })
        .collect()
}
