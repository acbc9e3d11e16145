//! Q128 fixed-point arithmetic and the curve primitives shared by the
//! analytics and valuation code. Prices and rates cross between exact U256
//! math (wire values) and f64 (derived rates); conversions are centralized
//! here so rounding behavior stays consistent.

use alloy_primitives::{U256, U512};

/// 1.0 in Q128.
pub const Q128: U256 = U256::from_limbs([0, 0, 1, 0]);

/// Rate horizon for half-life derived rates.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

fn widen(x: U256) -> U512 {
    let l = x.as_limbs();
    U512::from_limbs([l[0], l[1], l[2], l[3], 0, 0, 0, 0])
}

fn truncate(x: U512) -> U256 {
    let l = x.as_limbs();
    U256::from_limbs([l[0], l[1], l[2], l[3]])
}

/// `(a * b) >> 128` without intermediate overflow.
pub fn mul_shr128(a: U256, b: U256) -> U256 {
    truncate((widen(a) * widen(b)) >> 128)
}

/// `(a << 128) / b`, zero when `b` is zero.
pub fn shl128_div(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::ZERO;
    }
    truncate((widen(a) << 128) / widen(b))
}

/// `a * b / c`, zero when `c` is zero.
pub fn mul_div(a: U256, b: U256, c: U256) -> U256 {
    if c.is_zero() {
        return U256::ZERO;
    }
    truncate(widen(a) * widen(b) / widen(c))
}

/// Lossy widening to f64. Fine for rates and display values; never used to
/// produce wire amounts.
pub fn u256_to_f64(x: U256) -> f64 {
    x.as_limbs()
        .iter()
        .rev()
        .fold(0f64, |acc, &limb| acc * 18_446_744_073_709_551_616.0 + limb as f64)
}

/// Q128 value as a plain f64.
pub fn q128_to_f64(x: U256) -> f64 {
    u256_to_f64(x) / 2f64.powi(128)
}

/// Exact Q128 encoding of a positive finite f64 (bit decomposition, no
/// rounding beyond the f64 itself). Non-positive and non-finite inputs
/// encode to zero; values that overflow Q128 saturate.
pub fn f64_to_q128(v: f64) -> U256 {
    if !v.is_finite() || v <= 0.0 {
        return U256::ZERO;
    }
    let bits = v.to_bits();
    let raw_exp = ((bits >> 52) & 0x7ff) as i64;
    if raw_exp == 0 {
        // subnormal, far below Q128 resolution
        return U256::ZERO;
    }
    let mantissa = (bits & ((1u64 << 52) - 1)) | (1u64 << 52);
    // v = mantissa * 2^(raw_exp - 1075); Q128 adds 128 to the exponent
    let shift = raw_exp - 1075 + 128;
    if shift <= -64 {
        U256::ZERO
    } else if shift < 0 {
        U256::from(mantissa >> (-shift) as u32)
    } else if shift > 203 {
        U256::MAX
    } else {
        U256::from(mantissa) << shift as usize
    }
}

/// Scale an integer amount by a non-negative f64 factor.
pub fn mul_f64(x: U256, f: f64) -> U256 {
    mul_shr128(x, f64_to_q128(f))
}

fn reciprocal_q128(x: U256) -> U256 {
    if x.is_zero() {
        return U256::ZERO;
    }
    let one_shl_256 = U512::from_limbs([0, 0, 0, 0, 1, 0, 0, 0]);
    truncate(one_shl_256 / widen(x))
}

fn pow_q128_uint(mut base: U256, mut n: u64) -> U256 {
    let mut acc = Q128;
    while n > 0 {
        if n & 1 == 1 {
            acc = mul_shr128(acc, base);
        }
        base = mul_shr128(base, base);
        n >>= 1;
    }
    acc
}

/// `base^exp` in Q128. Integer exponents run exact square-and-multiply
/// (negative ones through the Q128 reciprocal); fractional exponents fall
/// back to f64, which only happens for pools whose fetcher halves the power.
pub fn pow_x128(base: U256, exp: f64) -> U256 {
    if base.is_zero() {
        return U256::ZERO;
    }
    if exp == 0.0 {
        return Q128;
    }
    if exp.fract() == 0.0 && exp.abs() < 1_000_000.0 {
        let b = if exp < 0.0 { reciprocal_q128(base) } else { base };
        return pow_q128_uint(b, exp.abs() as u64);
    }
    f64_to_q128(q128_to_f64(base).powf(exp))
}

/// Daily decay rate implied by a half-life, decompounded by the curve power.
/// A zero half-life disables the charge.
pub fn rate_from_hl(half_life_secs: u64, k: f64) -> f64 {
    let hl = half_life_secs as f64 * k;
    if hl <= 0.0 || !hl.is_finite() {
        return 0.0;
    }
    1.0 - 2f64.powf(-SECONDS_PER_DAY / hl)
}

/// Price multiple (against mark) at which a side's uncapped reserve
/// `v * p^k` reaches `r`. Zero when undefined.
pub fn xr(k: f64, r: U256, v: U256) -> f64 {
    if v.is_zero() || k == 0.0 {
        return 0.0;
    }
    let ratio = u256_to_f64(r) / u256_to_f64(v);
    if !(ratio > 0.0) || !ratio.is_finite() {
        return 0.0;
    }
    ratio.powf(1.0 / k)
}

/// Price elasticity of the deleverage-capped side reserve. With
/// `x = v * (spot/mark)^k` the uncapped reserve, the cap keeps the side at
/// `r = R - R^2/(4x)` once `x > R/2`; the elasticity of that curve is
/// `|k| * (R - r) / r`. Below the cap the side is unconstrained and the
/// result is +inf so callers keep `k` via `min`.
pub fn kx(k: f64, r: U256, v: U256, spot: U256, mark: U256) -> f64 {
    if mark.is_zero() || v.is_zero() {
        return f64::INFINITY;
    }
    let price_rate = q128_to_f64(shl128_div(spot, mark));
    let x = u256_to_f64(v) * price_rate.powf(k);
    let total = u256_to_f64(r);
    if !x.is_finite() || x <= total / 2.0 {
        return f64::INFINITY;
    }
    let capped = total - total * total / (4.0 * x);
    if capped <= 0.0 {
        return f64::INFINITY;
    }
    k.abs() * (total - capped) / capped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(v: u64) -> U256 {
        U256::from(v) << 128
    }

    #[test]
    fn mul_shr128_is_q128_multiplication() {
        assert_eq!(mul_shr128(q(6), q(7)), q(42));
        assert_eq!(mul_shr128(q(1) >> 1, q(10)), q(5));
    }

    #[test]
    fn shl128_div_is_q128_ratio() {
        assert_eq!(shl128_div(U256::from(3), U256::from(4)), (q(3)) / U256::from(4));
        assert_eq!(shl128_div(U256::from(1), U256::ZERO), U256::ZERO);
    }

    #[test]
    fn f64_round_trips_through_q128() {
        for v in [1.0, 1.5, 0.25, 1234.0078125] {
            assert_eq!(q128_to_f64(f64_to_q128(v)), v);
        }
        assert_eq!(f64_to_q128(0.0), U256::ZERO);
        assert_eq!(f64_to_q128(-3.0), U256::ZERO);
        assert_eq!(f64_to_q128(f64::NAN), U256::ZERO);
    }

    #[test]
    fn pow_x128_integer_exponents_are_exact() {
        let base = q(3);
        assert_eq!(pow_x128(base, 4.0), q(81));
        assert_eq!(pow_x128(base, 0.0), Q128);
        // 3^-1 in Q128, truncated
        let inv = pow_x128(base, -1.0);
        let back = mul_shr128(inv, q(3));
        assert!(back <= Q128 && Q128 - back <= U256::from(4));
    }

    #[test]
    fn pow_x128_fractional_exponent_approximates() {
        let got = q128_to_f64(pow_x128(q(4), 0.5));
        assert!((got - 2.0).abs() < 1e-12);
    }

    #[test]
    fn rate_from_hl_matches_half_life() {
        // hl * k spanning exactly one day halves the remaining value
        assert!((rate_from_hl(86_400, 1.0) - 0.5).abs() < 1e-12);
        assert!((rate_from_hl(43_200, 2.0) - 0.5).abs() < 1e-12);
        assert_eq!(rate_from_hl(0, 5.0), 0.0);
        assert_eq!(rate_from_hl(3600, 0.0), 0.0);
    }

    #[test]
    fn kx_is_continuous_at_the_cap_boundary() {
        let r = U256::from(1_000_000u64);
        let spot = Q128;
        let mark = Q128;
        // x == R/2 exactly: unconstrained
        assert!(kx(4.0, r, U256::from(500_000u64), spot, mark).is_infinite());
        // just past the cap the elasticity starts at |k|
        let just_past = kx(4.0, r, U256::from(500_001u64), spot, mark);
        assert!((just_past - 4.0).abs() < 1e-3);
        // deep past the cap it decays toward zero
        let deep = kx(4.0, r, U256::from(500_000_000u64), spot, mark);
        assert!(deep < 0.01);
    }

    #[test]
    fn xr_inverts_the_power_curve() {
        // v * p^2 == r at p = 3 when r/v == 9
        let got = xr(2.0, U256::from(9_000u64), U256::from(1_000u64));
        assert!((got - 3.0).abs() < 1e-12);
        assert_eq!(xr(2.0, U256::from(1), U256::ZERO), 0.0);
    }
}
