use alloy_primitives::U256;
use resource_core::math::{kx, mul_div, rate_from_hl, u256_to_f64};
use resource_core::types::{GroupReserves, Pool, PoolInfo, RentRates, SideRates};

/// Derive the per-side rates and risk figures for a pool from its latest
/// state. Pure; call after every state reload.
pub fn calc_pool_info(pool: &Pool) -> PoolInfo {
    let s = &pool.states;
    let (r, r_a, r_b, r_c) = (
        u256_to_f64(s.r),
        u256_to_f64(s.r_a),
        u256_to_f64(s.r_b),
        u256_to_f64(s.r_c),
    );

    let risk_factor = if r_c > 0.0 { (r_a - r_b) / r_c } else { 0.0 };
    let deleverage_risk_a = if r == 0.0 { 0.0 } else { 2.0 * r_a / r };
    let deleverage_risk_b = if r == 0.0 { 0.0 } else { 2.0 * r_b / r };

    let k = pool.k as f64;
    let k_long = k.min(kx(k, s.r, s.a, s.spot, pool.mark));
    let k_short = k.min(kx(-k, s.r, s.b, s.spot, pool.mark));
    // LP elasticity is the reserve-weighted blend of the two sides
    let k_lp = if r_a + r_b > 0.0 {
        (r_a * k_long + r_b * k_short) / (r_a + r_b)
    } else {
        k
    };

    let interest_rate = rate_from_hl(pool.interest_half_life, k);
    let max_premium_rate = rate_from_hl(pool.premium_half_life, k);

    let mut long = SideRates {
        k_eff: k_long,
        ..Default::default()
    };
    let mut short = SideRates {
        k_eff: k_short,
        ..Default::default()
    };
    let mut lp = SideRates {
        k_eff: k_lp,
        ..Default::default()
    };

    // premium is a zero-sum flow from the crowded side to the other
    if max_premium_rate > 0.0 && r > 0.0 && r_a != r_b {
        let diff = (r_a - r_b).abs();
        let giving_rate = diff * max_premium_rate * (r_a + r_b) / r;
        if r_a > r_b {
            long.premium = giving_rate / r_a;
            short.premium = -giving_rate / r_b;
        } else {
            short.premium = giving_rate / r_b;
            long.premium = -giving_rate / r_a;
        }
    }

    // decompound the interest through each side's effective exponent
    long.interest = if k_long > 0.0 { interest_rate * k / k_long } else { 0.0 };
    short.interest = if k_short > 0.0 { interest_rate * k / k_short } else { 0.0 };
    lp.interest = if r_c > 0.0 {
        (r_a + r_b) * interest_rate / r_c
    } else {
        0.0
    };

    PoolInfo {
        long,
        short,
        lp,
        risk_factor,
        deleverage_risk_a,
        deleverage_risk_b,
        interest_rate,
        max_premium_rate,
    }
}

/// Aggregate the reserves of a pool group. Totals sum over every member;
/// the per-power detail maps keep one entry per signed power, later members
/// overwriting equal powers.
pub fn get_rdc<'a>(pools: impl IntoIterator<Item = &'a Pool>) -> GroupReserves {
    let mut out = GroupReserves::default();
    for pool in pools {
        let s = &pool.states;
        out.r_c += s.r_c;
        out.r_dc_long += s.r_a;
        out.r_dc_short += s.r_b;
        out.supply += s.s_a + s.s_b + s.s_c;

        let power = pool.k as i64;
        out.r_details.insert(power, s.r_a);
        out.r_details.insert(-power, s.r_b);
        out.supply_details.insert(power, s.s_a);
        out.supply_details.insert(-power, s.s_b);
    }
    out
}

/// Rent flow between the directional sides: the imbalance pays `base_rate`
/// pro-rata, and the total splits between long and short by their reserves.
pub fn get_rent_rate(reserves: &GroupReserves, base_rate: U256) -> RentRates {
    let long = reserves.r_dc_long;
    let short = reserves.r_dc_short;
    let total_r = reserves.total();
    if total_r.is_zero() {
        return RentRates::default();
    }
    let diff = if long >= short { long - short } else { short - long };
    let rate = mul_div(diff, base_rate, total_r);
    let directional = long + short;
    if directional.is_zero() {
        return RentRates::default();
    }
    RentRates {
        long: mul_div(rate, long, directional),
        short: mul_div(rate, short, directional),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};
    use resource_core::math::Q128;
    use resource_core::types::PoolStates;

    fn pool_300_100_600() -> Pool {
        // long 300, short 100, LP 600, total 1000, balanced price
        Pool {
            address: Address::repeat_byte(1),
            k: 4,
            exp: 1,
            mark: Q128,
            interest_half_life: 86_400,
            premium_half_life: 0,
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

    #[test]
    fn risk_figures_match_reserve_split() {
        let info = calc_pool_info(&pool_300_100_600());
        assert!((info.risk_factor - (300.0 - 100.0) / 600.0).abs() < 1e-12);
        assert!((info.deleverage_risk_a - 0.6).abs() < 1e-12);
        assert!((info.deleverage_risk_b - 0.2).abs() < 1e-12);
    }

    #[test]
    fn risk_factor_is_zero_without_lp_reserve() {
        let mut pool = pool_300_100_600();
        pool.states.r_c = U256::ZERO;
        let info = calc_pool_info(&pool);
        assert_eq!(info.risk_factor, 0.0);
    }

    #[test]
    fn uncapped_sides_keep_the_configured_power() {
        // both sides below R/2 at the current price
        let info = calc_pool_info(&pool_300_100_600());
        assert_eq!(info.long.k_eff, 4.0);
        assert_eq!(info.short.k_eff, 4.0);
        assert_eq!(info.lp.k_eff, 4.0);
        // uncapped interest is the base rate
        assert!((info.long.interest - info.interest_rate).abs() < 1e-12);
    }

    #[test]
    fn premium_is_zero_sum_between_the_sides() {
        let mut pool = pool_300_100_600();
        pool.premium_half_life = 86_400;
        let info = calc_pool_info(&pool);
        assert!(info.long.premium > 0.0);
        assert!(info.short.premium < 0.0);
        assert_eq!(info.lp.premium, 0.0);
        // flows match: what long pays on rA equals what short earns on rB
        let paid = info.long.premium * 300.0;
        let earned = -info.short.premium * 100.0;
        assert!((paid - earned).abs() < 1e-9);
    }

    #[test]
    fn balanced_pool_has_no_premium() {
        let mut pool = pool_300_100_600();
        pool.premium_half_life = 86_400;
        pool.states.r_b = pool.states.r_a;
        let info = calc_pool_info(&pool);
        assert_eq!(info.long.premium, 0.0);
        assert_eq!(info.short.premium, 0.0);
    }

    #[test]
    fn lp_interest_scales_with_directional_reserve() {
        let info = calc_pool_info(&pool_300_100_600());
        let expected = (300.0 + 100.0) * info.interest_rate / 600.0;
        assert!((info.lp.interest - expected).abs() < 1e-12);
    }

    #[test]
    fn rdc_sums_members_and_keys_details_by_signed_power() {
        let mut p1 = pool_300_100_600();
        p1.k = 4;
        let mut p2 = pool_300_100_600();
        p2.address = Address::repeat_byte(2);
        p2.k = 8;
        p2.states.r_a = U256::from(50u64);
        p2.states.r_b = U256::from(70u64);
        p2.states.r_c = U256::from(80u64);

        let rdc = get_rdc([&p1, &p2]);
        assert_eq!(rdc.r_dc_long, U256::from(350u64));
        assert_eq!(rdc.r_dc_short, U256::from(170u64));
        assert_eq!(rdc.r_c, U256::from(680u64));
        assert_eq!(rdc.total(), U256::from(1_200u64));
        assert_eq!(rdc.r_details[&4], U256::from(300u64));
        assert_eq!(rdc.r_details[&-8], U256::from(70u64));
    }

    #[test]
    fn rent_rate_splits_pro_rata() {
        let reserves = GroupReserves {
            r_dc_long: U256::from(300u64),
            r_dc_short: U256::from(100u64),
            r_c: U256::from(600u64),
            ..Default::default()
        };
        let rates = get_rent_rate(&reserves, U256::from(1_000_000u64));
        // rate = 200 * 1e6 / 1000 = 200_000; split 3:1
        assert_eq!(rates.long, U256::from(150_000u64));
        assert_eq!(rates.short, U256::from(50_000u64));
    }

    #[test]
    fn balanced_reserves_split_rent_equally() {
        let reserves = GroupReserves {
            r_dc_long: U256::from(200u64),
            r_dc_short: U256::from(200u64),
            r_c: U256::from(600u64),
            ..Default::default()
        };
        let rates = get_rent_rate(&reserves, U256::from(1_000_000u64));
        assert_eq!(rates.long, rates.short);
    }

    #[test]
    fn empty_group_yields_zero_rent() {
        let rates = get_rent_rate(&GroupReserves::default(), U256::from(1_000_000u64));
        assert_eq!(rates, RentRates::default());
    }
}
