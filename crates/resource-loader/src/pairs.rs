use crate::calls::{AmmPair, Erc20Meta};
use crate::executor::{BatchCallExecutor, Call, CallGroup, StateOverrides};
use alloy_primitives::Address;
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use resource_core::types::{PairInfo, PairToken};
use resource_core::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Resolves AMM pair composition and reserves for oracle descriptors.
#[async_trait]
pub trait PairInfoSource: Send + Sync {
    async fn get_pairs_info(&self, pairs: &[Address]) -> Result<HashMap<Address, PairInfo>>;
}

/// `PairInfoSource` over the call executor: one batch for pair composition,
/// one for leg metadata. A pair that reverts is skipped, not fatal.
pub struct AmmPairSource {
    executor: Arc<dyn BatchCallExecutor>,
}

impl AmmPairSource {
    pub fn new(executor: Arc<dyn BatchCallExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl PairInfoSource for AmmPairSource {
    async fn get_pairs_info(&self, pairs: &[Address]) -> Result<HashMap<Address, PairInfo>> {
        let mut unique: Vec<Address> = pairs.to_vec();
        unique.sort();
        unique.dedup();
        if unique.is_empty() {
            return Ok(HashMap::new());
        }

        let groups: Vec<CallGroup> = unique
            .iter()
            .map(|&pair| CallGroup {
                reference: format!("{pair}"),
                contract: pair,
                calls: vec![
                    Call {
                        reference: "token0".to_string(),
                        calldata: AmmPair::token0Call {}.abi_encode().into(),
                    },
                    Call {
                        reference: "token1".to_string(),
                        calldata: AmmPair::token1Call {}.abi_encode().into(),
                    },
                    Call {
                        reference: "getReserves".to_string(),
                        calldata: AmmPair::getReservesCall {}.abi_encode().into(),
                    },
                ],
            })
            .collect();

        let response = self.executor.execute(&StateOverrides::default(), &groups).await?;

        // pair -> (token0, token1, reserves), skipping any that reverted
        let mut composition: HashMap<Address, (Address, Address, AmmPair::getReservesReturn)> =
            HashMap::new();
        for &pair in &unique {
            let reference = format!("{pair}");
            let decoded = (|| {
                let token0 =
                    AmmPair::token0Call::abi_decode_returns(response.get(&reference, "token0")?)
                        .map_err(|e| resource_core::ResourceError::CallDecode(e.to_string()))?;
                let token1 =
                    AmmPair::token1Call::abi_decode_returns(response.get(&reference, "token1")?)
                        .map_err(|e| resource_core::ResourceError::CallDecode(e.to_string()))?;
                let reserves = AmmPair::getReservesCall::abi_decode_returns(
                    response.get(&reference, "getReserves")?,
                )
                .map_err(|e| resource_core::ResourceError::CallDecode(e.to_string()))?;
                Ok::<_, resource_core::ResourceError>((token0, token1, reserves))
            })();
            match decoded {
                Ok(parts) => {
                    composition.insert(pair, parts);
                }
                Err(e) => warn!(pair = %pair, error = %e, "Skipping unreadable pair"),
            }
        }

        // second round trip: metadata for every distinct leg token
        let mut legs: Vec<Address> = composition
            .values()
            .flat_map(|(t0, t1, _)| [*t0, *t1])
            .collect();
        legs.sort();
        legs.dedup();

        let meta_groups: Vec<CallGroup> = legs
            .iter()
            .map(|&token| CallGroup {
                reference: format!("{token}"),
                contract: token,
                calls: vec![
                    Call {
                        reference: "symbol".to_string(),
                        calldata: Erc20Meta::symbolCall {}.abi_encode().into(),
                    },
                    Call {
                        reference: "name".to_string(),
                        calldata: Erc20Meta::nameCall {}.abi_encode().into(),
                    },
                    Call {
                        reference: "decimals".to_string(),
                        calldata: Erc20Meta::decimalsCall {}.abi_encode().into(),
                    },
                ],
            })
            .collect();

        let meta_response = self
            .executor
            .execute(&StateOverrides::default(), &meta_groups)
            .await?;

        let mut metadata: HashMap<Address, (String, String, u8)> = HashMap::new();
        for &token in &legs {
            let reference = format!("{token}");
            let symbol = meta_response
                .get(&reference, "symbol")
                .ok()
                .and_then(|b| Erc20Meta::symbolCall::abi_decode_returns(b).ok())
                .unwrap_or_default();
            let name = meta_response
                .get(&reference, "name")
                .ok()
                .and_then(|b| Erc20Meta::nameCall::abi_decode_returns(b).ok())
                .unwrap_or_default();
            let decimals = meta_response
                .get(&reference, "decimals")
                .ok()
                .and_then(|b| Erc20Meta::decimalsCall::abi_decode_returns(b).ok())
                .unwrap_or(18);
            metadata.insert(token, (symbol, name, decimals));
        }

        let mut out = HashMap::new();
        for (pair, (token0, token1, reserves)) in composition {
            let leg = |address: Address, reserve: u128| {
                let (symbol, name, decimals) = metadata
                    .get(&address)
                    .cloned()
                    .unwrap_or((String::new(), String::new(), 18));
                PairToken {
                    address,
                    symbol,
                    name,
                    decimals,
                    reserve: alloy_primitives::U256::from(reserve),
                }
            };
            out.insert(
                pair,
                PairInfo {
                    address: pair,
                    token0: leg(token0, reserves.reserve0.to::<u128>()),
                    token1: leg(token1, reserves.reserve1.to::<u128>()),
                },
            );
        }
        Ok(out)
    }
}
