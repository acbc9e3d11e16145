use super::pair::PairInfo;
use super::token::{Side, TokenKey};
use alloy_primitives::{Address, B256, U256};
use std::collections::{BTreeMap, HashMap};

/// Oracle descriptor packed into a single word: the top nybble selects the
/// quote token index, bytes 4..8 carry the observation window in seconds and
/// the low 20 bytes are the AMM pair address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OracleSpec {
    pub raw: B256,
    pub quote_token_index: u8,
    pub window: u32,
    pub pair: Address,
}

impl OracleSpec {
    pub fn parse(raw: B256) -> Self {
        let bytes = raw.0;
        let quote_token_index = if bytes[0] >> 4 > 0 { 1 } else { 0 };
        let window = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let pair = Address::from_slice(&bytes[12..32]);
        Self {
            raw,
            quote_token_index,
            window,
            pair,
        }
    }
}

/// On-chain reserve state of a pool as reported by the view logic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStates {
    /// Total reserve held by the pool, in the reserve token.
    pub r: U256,
    /// Long / short curve coefficients.
    pub a: U256,
    pub b: U256,
    /// Reserve attributed to each side.
    pub r_a: U256,
    pub r_b: U256,
    pub r_c: U256,
    /// Outstanding position supply per side.
    pub s_a: U256,
    pub s_b: U256,
    pub s_c: U256,
    /// Time-weighted and instantaneous index price, Q128 quote per base.
    pub twap: U256,
    pub spot: U256,
}

impl PoolStates {
    /// Reserve and supply for one side.
    pub fn side(&self, side: Side) -> (U256, U256) {
        match side {
            Side::Long => (self.r_a, self.s_a),
            Side::Short => (self.r_b, self.s_b),
            Side::Lp => (self.r_c, self.s_c),
        }
    }
}

/// Per-side derived rates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SideRates {
    /// Effective exponent after the deleverage cap.
    pub k_eff: f64,
    /// Decompounded daily interest paid by this side.
    pub interest: f64,
    /// Daily premium; negative means the side receives premium.
    pub premium: f64,
}

/// Derived analytics for one pool, recomputed whenever state is reloaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoolInfo {
    pub long: SideRates,
    pub short: SideRates,
    pub lp: SideRates,
    /// Signed imbalance of the two directional reserves over the LP reserve.
    pub risk_factor: f64,
    pub deleverage_risk_a: f64,
    pub deleverage_risk_b: f64,
    /// Base daily interest rate before side decompounding.
    pub interest_rate: f64,
    pub max_premium_rate: f64,
}

impl PoolInfo {
    pub fn side(&self, side: Side) -> &SideRates {
        match side {
            Side::Long => &self.long,
            Side::Short => &self.short,
            Side::Lp => &self.lp,
        }
    }
}

/// Fully loaded pool: immutable config plus the latest state and analytics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pool {
    pub address: Address,
    pub reserve_token: Address,
    pub oracle: B256,
    pub pair: Address,
    pub quote_token_index: u8,
    pub window: u32,
    pub base_token: Address,
    pub quote_token: Address,
    /// Curve power as configured on-chain.
    pub k: u32,
    /// Price exponent of the fetcher; leverage is `k / exp`.
    pub exp: u32,
    /// Mark price, Q128.
    pub mark: U256,
    pub interest_half_life: u64,
    pub premium_half_life: u64,
    pub maturity: u64,
    pub states: PoolStates,
    pub info: PoolInfo,
}

impl Pool {
    pub fn leverage(&self) -> f64 {
        if self.exp == 0 {
            return self.k as f64;
        }
        self.k as f64 / self.exp as f64
    }

    pub fn side_key(&self, side: Side) -> TokenKey {
        TokenKey::side(self.address, side)
    }
}

/// Aggregated reserves of a pool group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupReserves {
    pub supply: U256,
    pub r_c: U256,
    pub r_dc_long: U256,
    pub r_dc_short: U256,
    /// Reserve per signed power (+k long, -k short). Equal powers from
    /// multiple pools overwrite; the totals above are summed.
    pub r_details: HashMap<i64, U256>,
    pub supply_details: HashMap<i64, U256>,
}

impl GroupReserves {
    /// Total reserve across all three sides.
    pub fn total(&self) -> U256 {
        self.r_c + self.r_dc_long + self.r_dc_short
    }
}

/// Rent flow between the two directional sides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RentRates {
    pub long: U256,
    pub short: U256,
}

/// Pools sharing one (pair, quote index, reserve token) triple.
#[derive(Debug, Clone, Default)]
pub struct PoolGroup {
    /// `{pair}-{quoteTokenIndex}-{reserveToken}`
    pub id: String,
    pub pair: PairInfo,
    pub oracle: B256,
    pub quote_token_index: u8,
    pub reserve_token: Address,
    pub base_token: Address,
    pub quote_token: Address,
    /// First member's spot price, Q128. First pool wins; refreshed only on
    /// state reload.
    pub base_price_x128: U256,
    pub pools: BTreeMap<Address, Pool>,
    pub powers: Vec<i64>,
    /// Directional position tokens of every member.
    pub d_tokens: Vec<TokenKey>,
    /// Directional plus LP tokens of every member.
    pub all_tokens: Vec<TokenKey>,
    pub reserves: GroupReserves,
}

impl PoolGroup {
    pub fn group_id(pair: Address, quote_token_index: u8, reserve_token: Address) -> String {
        format!("{pair}-{quote_token_index}-{reserve_token}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;

    #[test]
    fn oracle_spec_unpacks_fields() {
        // qti nybble set, window = 300, pair in the low 20 bytes
        let raw = b256!("100000000000012c00000000c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
        let spec = OracleSpec::parse(raw);
        assert_eq!(spec.quote_token_index, 1);
        assert_eq!(spec.window, 300);
        assert_eq!(
            spec.pair,
            "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"
                .parse::<Address>()
                .unwrap()
        );
    }

    #[test]
    fn oracle_spec_zero_nybble_selects_token0() {
        let raw = b256!("0000000000000e1000000000c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");
        let spec = OracleSpec::parse(raw);
        assert_eq!(spec.quote_token_index, 0);
        assert_eq!(spec.window, 3600);
    }
}
