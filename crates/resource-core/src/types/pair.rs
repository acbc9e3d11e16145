use alloy_primitives::{Address, U256};

/// One leg of an AMM pair backing a pool's oracle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairToken {
    pub address: Address,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    pub reserve: U256,
}

/// AMM pair referenced by the last 20 bytes of an oracle descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairInfo {
    pub address: Address,
    pub token0: PairToken,
    pub token1: PairToken,
}
