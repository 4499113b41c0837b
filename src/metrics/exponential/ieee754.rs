//! Bit-level decomposition of `f64` values.

pub const MANTISSA_WIDTH: u32 = 52;
pub const EXPONENT_WIDTH: u32 = 11;
pub const MANTISSA_MASK: u64 = (1 << MANTISSA_WIDTH) - 1;
pub const EXPONENT_BIAS: i32 = (1 << (EXPONENT_WIDTH - 1)) - 1;
pub const EXPONENT_MASK: u64 = ((1 << EXPONENT_WIDTH) - 1) << MANTISSA_WIDTH;
pub const SIGN_MASK: u64 = 1 << (EXPONENT_WIDTH + MANTISSA_WIDTH);

pub const MIN_NORMAL_EXPONENT: i32 = -EXPONENT_BIAS + 1;
pub const MAX_NORMAL_EXPONENT: i32 = EXPONENT_BIAS;

/// Smallest positive normal value, 2^-1022
pub const MIN_NORMAL_VALUE: f64 = f64::MIN_POSITIVE;
pub const MAX_NORMAL_VALUE: f64 = f64::MAX;

/// Unbiased base-2 exponent of `value`.
///
/// Subnormals report the raw biased-exponent field minus the bias
/// (`-1023`), one below [`MIN_NORMAL_EXPONENT`].
#[inline]
pub fn get_normal_base2(value: f64) -> i32 {
    let raw = (value.to_bits() & EXPONENT_MASK) >> MANTISSA_WIDTH;
    raw as i32 - EXPONENT_BIAS
}

/// The 52 explicit significand bits of `value`
#[inline]
pub fn get_significand(value: f64) -> u64 {
    value.to_bits() & MANTISSA_MASK
}

/// `2^exp` for any exponent, including the subnormal range.
///
/// `f64::powi` loses exactness below 2^-1022 on some targets, so the
/// scaling is done in two exact steps.
pub fn pow2(exp: i32) -> f64 {
    if exp > MAX_NORMAL_EXPONENT {
        f64::INFINITY
    } else if exp >= MIN_NORMAL_EXPONENT {
        f64::from_bits(((exp + EXPONENT_BIAS) as u64) << MANTISSA_WIDTH)
    } else if exp >= MIN_NORMAL_EXPONENT - MANTISSA_WIDTH as i32 {
        // subnormal: a single bit in the significand
        f64::from_bits(1u64 << (exp - (MIN_NORMAL_EXPONENT - MANTISSA_WIDTH as i32)))
    } else {
        0.0
    }
}
