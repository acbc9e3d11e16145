use super::token::Side;
use alloy_primitives::{Address, U256};

/// Pack a (side, pool) pair into an ERC-1155 token id: side id in the bits
/// above the address, pool address in the low 160 bits.
pub fn pack_position_id(side: Side, pool: Address) -> U256 {
    (U256::from(side.id()) << 160) | U256::from_be_slice(pool.as_slice())
}

/// Split a position token id into its raw side id and pool address.
pub fn unpack_position_id(id: U256) -> (u32, Address) {
    let side_id = (id >> 160usize).saturating_to::<u32>();
    let pool_word: [u8; 32] = id.to_be_bytes();
    let pool = Address::from_slice(&pool_word[12..32]);
    (side_id, pool)
}

/// A held fungible position as tracked off-chain: the id plus the entry
/// snapshot needed to value it later.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FungiblePosition {
    pub id: U256,
    pub balance: U256,
    /// Index price at entry, Q128.
    pub entry_price: U256,
    /// Reserve-token price in the quote token at entry, Q128.
    pub price_r: U256,
    /// Reserve value per unit of position balance at entry, Q128.
    pub r_per_balance: U256,
    pub maturity: u64,
}

/// Valuation of a position against the latest pool state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionState {
    pub pool: Address,
    pub side: Side,
    pub balance: U256,
    pub entry_price: U256,
    pub current_price: U256,
    /// Entry value, reserve token / quote token.
    pub entry_value_r: U256,
    pub entry_value_u: U256,
    /// Current value from pool reserves, reserve token / quote token.
    pub value_r: U256,
    pub value_u: U256,
    /// Model values from the price move alone. `None` for sides that carry
    /// no price model (LP) or when either price is unknown.
    pub value_r_linear: Option<U256>,
    pub value_r_compound: Option<U256>,
    pub leverage: f64,
    pub effective_leverage: f64,
    pub funding_rate: f64,
    /// Deleverage trigger prices, Q128. Zero when the bound is unreachable.
    pub dg_price_a: U256,
    pub dg_price_b: U256,
    pub maturity: u64,
}
