//! Q64.64 binary fixed-point arithmetic on `u128`.
//!
//! A scaled value `x` represents `x / 2^64`. Every multiply and divide is
//! checked: overflow yields [`MathError::ArithmeticOverflow`] instead of
//! wrapping, so repeated accumulation never drifts or silently truncates.

use crate::constants::BPS_PRECISION;
use crate::error::MathError;

/// Number of fractional bits.
pub const FRAC_BITS: u32 = 64;

/// `1.0` in Q64.64.
pub const ONE: u128 = 1u128 << FRAC_BITS;

const LOW_MASK: u128 = ONE - 1;

/// Checked addition.
pub fn checked_add(a: u128, b: u128) -> Result<u128, MathError> {
    a.checked_add(b).ok_or(MathError::ArithmeticOverflow)
}

/// Checked subtraction. Underflow maps to [`MathError::ArithmeticOverflow`].
pub fn checked_sub(a: u128, b: u128) -> Result<u128, MathError> {
    a.checked_sub(b).ok_or(MathError::ArithmeticOverflow)
}

/// Full 256-bit product of two `u128` values as `(high, low)`.
fn mul_wide(a: u128, b: u128) -> (u128, u128) {
    let (a1, a0) = (a >> FRAC_BITS, a & LOW_MASK);
    let (b1, b0) = (b >> FRAC_BITS, b & LOW_MASK);

    let p00 = a0 * b0;
    let p01 = a0 * b1;
    let p10 = a1 * b0;
    let p11 = a1 * b1;

    // Sum of three values below 2^64 each; cannot overflow.
    let mid = (p00 >> FRAC_BITS) + (p01 & LOW_MASK) + (p10 & LOW_MASK);
    let low = (p00 & LOW_MASK) | ((mid & LOW_MASK) << FRAC_BITS);
    let high = p11 + (p01 >> FRAC_BITS) + (p10 >> FRAC_BITS) + (mid >> FRAC_BITS);
    (high, low)
}

/// Multiply two Q64.64 values: `a * b / 2^64`, rounded down.
pub fn mul_scaled(a: u128, b: u128) -> Result<u128, MathError> {
    let (high, low) = mul_wide(a, b);
    if high >> FRAC_BITS != 0 {
        return Err(MathError::ArithmeticOverflow);
    }
    Ok((high << FRAC_BITS) | (low >> FRAC_BITS))
}

/// Floor of `a * b / denom`, exact over the full 256-bit product.
///
/// Fails with [`MathError::ArithmeticOverflow`] only when the quotient
/// itself does not fit in `u128`.
pub fn mul_div(a: u128, b: u128, denom: u128) -> Result<u128, MathError> {
    if denom == 0 {
        return Err(MathError::DivisionByZero);
    }
    let (high, low) = mul_wide(a, b);
    if high == 0 {
        return Ok(low / denom);
    }
    if high >= denom {
        return Err(MathError::ArithmeticOverflow);
    }

    // Restoring long division of (high:low) by denom, one bit at a time.
    let mut rem = high;
    let mut quotient: u128 = 0;
    for bit in (0..128).rev() {
        let carry = rem >> 127;
        rem = (rem << 1) | ((low >> bit) & 1);
        if carry == 1 || rem >= denom {
            rem = rem.wrapping_sub(denom);
            quotient |= 1u128 << bit;
        }
    }
    Ok(quotient)
}

/// Divide two Q64.64 values: `a * 2^64 / b`, rounded down.
pub fn div_scaled(a: u128, b: u128) -> Result<u128, MathError> {
    mul_div(a, ONE, b)
}

/// Q64.64 representation of `num / den`.
pub fn from_ratio(num: u128, den: u128) -> Result<u128, MathError> {
    mul_div(num, ONE, den)
}

/// Q64.64 representation of a basis-point fraction.
pub fn from_bps(bps: u64) -> Result<u128, MathError> {
    from_ratio(bps as u128, BPS_PRECISION as u128)
}

/// Rescale a Q64.64 value for display: `scaled * display_denominator / 2^64`.
///
/// `to_human(x, 10_000)` gives the value in basis points.
pub fn to_human(scaled: u128, display_denominator: u128) -> Result<u128, MathError> {
    mul_div(scaled, display_denominator, ONE)
}

/// Apply a Q64.64 factor to a plain integer amount, rounding down.
pub fn apply(amount: u128, factor: u128) -> Result<u128, MathError> {
    mul_div(amount, factor, ONE)
}

/// Basis-point share of `amount`, rounding down.
pub fn bps_of(amount: u128, bps: u64) -> Result<u128, MathError> {
    mul_div(amount, bps as u128, BPS_PRECISION as u128)
}
