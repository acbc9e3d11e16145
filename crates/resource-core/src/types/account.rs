use super::token::TokenKey;
use alloy_primitives::{I256, U256};
use std::collections::HashMap;

/// Balances, allowances and maturities of one account, replayed from its
/// transfer and approval logs. Absence of a key means zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountResource {
    /// Signed so that replaying a partial log window cannot panic; a
    /// complete window never goes negative.
    pub balances: HashMap<TokenKey, I256>,
    /// Router allowance per token. Position tokens approved for all map to
    /// `U256::MAX`.
    pub allowances: HashMap<TokenKey, U256>,
    /// Absolute unlock time per position token, seconds.
    pub maturities: HashMap<TokenKey, u64>,
}

impl AccountResource {
    pub fn balance(&self, key: &TokenKey) -> I256 {
        self.balances.get(key).copied().unwrap_or(I256::ZERO)
    }

    pub fn allowance(&self, key: &TokenKey) -> U256 {
        self.allowances.get(key).copied().unwrap_or(U256::ZERO)
    }

    pub fn maturity(&self, key: &TokenKey) -> u64 {
        self.maturities.get(key).copied().unwrap_or(0)
    }
}
