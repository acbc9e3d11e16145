use crate::analytics::calc_pool_info;
use alloy_primitives::{Address, I256, U256};
use resource_core::math::{mul_div, mul_f64, mul_shr128, pow_x128, shl128_div, xr};
use resource_core::types::{
    unpack_position_id, ClassifiedLog, DomainEvent, FungiblePosition, Pool, PoolGroup,
    PositionState, Side,
};
use std::collections::{BTreeMap, HashMap};

/// Pools the account has ever ended a log window holding a position in.
/// Replays only the 1155 transfer stream into a signed per-id map, so it can
/// disagree with the full balance reducer on edge cases; it exists to decide
/// which pools are worth a state load, not to report balances.
pub fn pools_with_open_position(account: Address, logs: &[ClassifiedLog]) -> Vec<Address> {
    let mut balances: HashMap<U256, I256> = HashMap::new();
    let mut apply = |from: Address, to: Address, id: U256, value: U256| {
        let delta = I256::try_from(value).unwrap_or(I256::MAX);
        if to == account {
            *balances.entry(id).or_insert(I256::ZERO) += delta;
        }
        if from == account {
            let entry = balances.entry(id).or_insert(I256::ZERO);
            *entry -= delta;
            if entry.is_zero() {
                balances.remove(&id);
            }
        }
    };

    for log in logs {
        match &log.event {
            DomainEvent::TransferSingle {
                from, to, id, value, ..
            } => apply(*from, *to, *id, *value),
            DomainEvent::TransferBatch {
                from, to, ids, values, ..
            } => {
                for (id, value) in ids.iter().zip(values.iter()) {
                    apply(*from, *to, *id, *value);
                }
            }
            _ => {}
        }
    }

    let mut pools: Vec<Address> = balances
        .keys()
        .map(|id| unpack_position_id(*id).1)
        .collect();
    pools.sort();
    pools.dedup();
    pools
}

/// Rates and bounds for holding one side of a pool.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PoolSideInfo {
    pub leverage: f64,
    pub effective_leverage: f64,
    /// Deleverage trigger prices, Q128.
    pub dg_price_a: U256,
    pub dg_price_b: U256,
    pub interest: f64,
    pub premium: f64,
    pub funding: f64,
}

/// Summarize what holding `side` of `pool` costs and risks right now.
pub fn calc_pool_side(pool: &Pool, side: Side) -> PoolSideInfo {
    let info = calc_pool_info(pool);
    let rates = info.side(side);
    let k = pool.k as f64;
    let exp = if pool.exp == 0 { 1.0 } else { pool.exp as f64 };

    let half_r = pool.states.r >> 1;
    let x_a = xr(k, half_r, pool.states.a);
    let x_b = xr(-k, half_r, pool.states.b);

    PoolSideInfo {
        leverage: k / exp,
        effective_leverage: rates.k_eff.min(k) / exp,
        dg_price_a: mul_f64(pool.mark, x_a),
        dg_price_b: mul_f64(pool.mark, x_b),
        interest: rates.interest,
        premium: rates.premium,
        funding: rates.interest + rates.premium,
    }
}

/// Value a held position against the latest pool state. `None` when the
/// pool is unknown or the id's side is not one of the three issued sides.
pub fn position_state(
    position: &FungiblePosition,
    balance: U256,
    pools: &BTreeMap<Address, Pool>,
    pool_groups: &BTreeMap<String, PoolGroup>,
) -> Option<PositionState> {
    let (side_id, pool_address) = unpack_position_id(position.id);
    let pool = pools.get(&pool_address)?;
    let side = Side::from_id(side_id)?;

    let entry_value_r = mul_shr128(balance, position.r_per_balance);
    let entry_value_u = mul_shr128(entry_value_r, position.price_r);

    let (r_x, s_x) = pool.states.side(side);
    let value_r = mul_div(r_x, balance, s_x);
    let value_u = mul_shr128(value_r, position.price_r);

    let current_price = pool_groups
        .values()
        .find(|g| g.pools.contains_key(&pool_address))
        .map(|g| g.base_price_x128)
        .unwrap_or_default();

    let side_info = calc_pool_side(pool, side);
    let leverage = match side {
        Side::Long => side_info.leverage,
        Side::Short => -side_info.leverage,
        Side::Lp => 0.0,
    };

    let mut value_r_linear = None;
    let mut value_r_compound = None;
    if leverage != 0.0 && !position.entry_price.is_zero() && !current_price.is_zero() {
        value_r_linear = Some(linear_value(
            entry_value_r,
            position.entry_price,
            current_price,
            leverage,
        ));
        let price_rate = shl128_div(current_price, position.entry_price);
        value_r_compound = Some(mul_shr128(entry_value_r, pow_x128(price_rate, leverage)));
    }

    Some(PositionState {
        pool: pool_address,
        side,
        balance,
        entry_price: position.entry_price,
        current_price,
        entry_value_r,
        entry_value_u,
        value_r,
        value_u,
        value_r_linear,
        value_r_compound,
        leverage: side_info.leverage,
        effective_leverage: side_info.effective_leverage,
        funding_rate: side_info.funding,
        dg_price_a: side_info.dg_price_a,
        dg_price_b: side_info.dg_price_b,
        maturity: position.maturity,
    })
}

/// Linear model: the entry value scaled by the leveraged price move,
/// floored at zero once the move wipes the position out. Exact in integer
/// arithmetic; the leverage is carried with six decimals.
fn linear_value(entry_value_r: U256, entry_price: U256, current_price: U256, leverage: f64) -> U256 {
    const SCALE: i64 = 1_000_000;
    let l_scaled = (leverage * SCALE as f64).round() as i64;
    let entry = I256::try_from(entry_price).unwrap_or(I256::MAX);
    let current = I256::try_from(current_price).unwrap_or(I256::MAX);
    let l = I256::try_from(l_scaled).unwrap_or(I256::ZERO);
    let scale = I256::try_from(SCALE).unwrap_or(I256::ONE);

    let leveraged = (current - entry) * l / scale + entry;
    if leveraged.is_negative() || leveraged.is_zero() {
        return U256::ZERO;
    }
    let rate = shl128_div(leveraged.unsigned_abs(), entry_price);
    mul_shr128(entry_value_r, rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use alloy_primitives::{Bytes, B256};
    use alloy_sol_types::{SolEvent, SolValue};
    use resource_core::events::TransferSingle;
    use resource_core::math::Q128;
    use resource_core::types::{pack_position_id, PoolStates, RawLog};

    fn topic_address(a: Address) -> B256 {
        let mut word = [0u8; 32];
        word[12..].copy_from_slice(a.as_slice());
        B256::from(word)
    }

    fn transfer_single(from: Address, to: Address, id: U256, value: u64, block: u64) -> ClassifiedLog {
        classify(&RawLog {
            address: Address::repeat_byte(0x11),
            topics: vec![
                TransferSingle::SIGNATURE_HASH,
                topic_address(Address::ZERO),
                topic_address(from),
                topic_address(to),
            ],
            data: (id, U256::from(value)).abi_encode().into(),
            block_number: block,
            log_index: 0,
            transaction_hash: B256::with_last_byte(block as u8),
            timestamp: 0,
        })
    }

    fn test_pool(address: Address, k: u32) -> Pool {
        Pool {
            address,
            k,
            exp: 1,
            mark: Q128,
            states: PoolStates {
                r: U256::from(1_000u64),
                a: U256::from(300u64),
                b: U256::from(100u64),
                r_a: U256::from(300u64),
                r_b: U256::from(100u64),
                r_c: U256::from(600u64),
                s_a: U256::from(300u64),
                s_b: U256::from(100u64),
                s_c: U256::from(600u64),
                twap: Q128,
                spot: Q128,
            },
            ..Default::default()
        }
    }

    fn group_with(pool: &Pool, base_price_x128: U256) -> BTreeMap<String, PoolGroup> {
        let mut pools = BTreeMap::new();
        pools.insert(pool.address, pool.clone());
        let mut groups = BTreeMap::new();
        groups.insert(
            "g".to_string(),
            PoolGroup {
                id: "g".to_string(),
                base_price_x128,
                pools,
                ..Default::default()
            },
        );
        groups
    }

    #[test]
    fn open_positions_net_out_to_empty() {
        let account = Address::repeat_byte(0xaa);
        let pool = Address::repeat_byte(0x44);
        let id = pack_position_id(Side::Long, pool);
        let logs = vec![
            transfer_single(Address::ZERO, account, id, 10, 1),
            transfer_single(account, Address::ZERO, id, 10, 2),
        ];
        assert!(pools_with_open_position(account, &logs).is_empty());
    }

    #[test]
    fn partial_exit_keeps_the_pool_open() {
        let account = Address::repeat_byte(0xaa);
        let pool_a = Address::repeat_byte(0x44);
        let pool_b = Address::repeat_byte(0x55);
        let logs = vec![
            transfer_single(Address::ZERO, account, pack_position_id(Side::Long, pool_a), 10, 1),
            transfer_single(account, Address::ZERO, pack_position_id(Side::Long, pool_a), 4, 2),
            transfer_single(Address::ZERO, account, pack_position_id(Side::Lp, pool_b), 7, 3),
        ];
        let open = pools_with_open_position(account, &logs);
        assert_eq!(open, vec![pool_a, pool_b]);
    }

    #[test]
    fn position_state_for_unknown_pool_is_none() {
        let position = FungiblePosition {
            id: pack_position_id(Side::Long, Address::repeat_byte(9)),
            ..Default::default()
        };
        assert!(position_state(&position, U256::ZERO, &BTreeMap::new(), &BTreeMap::new()).is_none());
    }

    #[test]
    fn lp_side_values_from_reserves_without_price_models() {
        let pool = test_pool(Address::repeat_byte(1), 2);
        let mut pools = BTreeMap::new();
        pools.insert(pool.address, pool.clone());
        let groups = group_with(&pool, Q128);

        let position = FungiblePosition {
            id: pack_position_id(Side::Lp, pool.address),
            balance: U256::from(60u64),
            entry_price: Q128,
            price_r: Q128,
            r_per_balance: Q128,
            maturity: 0,
        };
        let state = position_state(&position, position.balance, &pools, &groups).unwrap();
        // rC * balance / sC = 600 * 60 / 600
        assert_eq!(state.value_r, U256::from(60u64));
        assert_eq!(state.leverage, 2.0);
        assert_eq!(state.value_r_linear, None);
        assert_eq!(state.value_r_compound, None);
    }

    #[test]
    fn long_side_models_track_a_price_rise() {
        let pool = test_pool(Address::repeat_byte(1), 2);
        let mut pools = BTreeMap::new();
        pools.insert(pool.address, pool.clone());
        // price moved 1.0 -> 1.5
        let current = Q128 + (Q128 >> 1);
        let groups = group_with(&pool, current);

        let position = FungiblePosition {
            id: pack_position_id(Side::Long, pool.address),
            balance: U256::from(100u64),
            entry_price: Q128,
            price_r: Q128,
            r_per_balance: Q128,
            maturity: 0,
        };
        let state = position_state(&position, position.balance, &pools, &groups).unwrap();
        assert_eq!(state.entry_value_r, U256::from(100u64));
        // linear: 1 + 2 * 0.5 = 2x
        assert_eq!(state.value_r_linear, Some(U256::from(200u64)));
        // compound: 1.5^2 = 2.25x
        assert_eq!(state.value_r_compound, Some(U256::from(225u64)));
    }

    #[test]
    fn short_side_wipes_out_linearly_but_not_compounded() {
        let pool = test_pool(Address::repeat_byte(1), 2);
        let mut pools = BTreeMap::new();
        pools.insert(pool.address, pool.clone());
        // price doubled against a -2x short
        let groups = group_with(&pool, Q128 * U256::from(2));

        let position = FungiblePosition {
            id: pack_position_id(Side::Short, pool.address),
            balance: U256::from(100u64),
            entry_price: Q128,
            price_r: Q128,
            r_per_balance: Q128,
            maturity: 0,
        };
        let state = position_state(&position, position.balance, &pools, &groups).unwrap();
        // linear: 1 + (-2) * 1 = -1, floored but still computed
        assert_eq!(state.value_r_linear, Some(U256::ZERO));
        // compound: 2^-2 = 0.25x
        assert_eq!(state.value_r_compound, Some(U256::from(25u64)));
    }

    #[test]
    fn pool_side_reports_symmetric_deleverage_prices() {
        let pool = test_pool(Address::repeat_byte(1), 2);
        let side = calc_pool_side(&pool, Side::Long);
        // long dg: a * p^2 == R/2 => p = sqrt(500/300)
        let expected_a = (500.0f64 / 300.0).sqrt();
        let got_a = resource_core::math::q128_to_f64(side.dg_price_a);
        assert!((got_a - expected_a).abs() < 1e-9);
        // short dg: b * p^-2 == R/2 => p = sqrt(100/500)
        let expected_b = (100.0f64 / 500.0).sqrt();
        let got_b = resource_core::math::q128_to_f64(side.dg_price_b);
        assert!((got_b - expected_b).abs() < 1e-9);
        assert_eq!(side.leverage, 2.0);
    }
}
