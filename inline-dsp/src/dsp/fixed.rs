//! Q24 fixed-point arithmetic and dB helpers shared by the stages.

use crate::constants::{NATIVE_MAX, NATIVE_MIN};

/// Number of fractional bits in a Q24 value.
pub const Q24_SHIFT: u32 = 24;

/// 1.0 in Q24.
pub const Q24_ONE: i32 = 1 << Q24_SHIFT;

/// Saturate a 64-bit intermediate to the `i32` range.
#[inline(always)]
pub fn saturate_i32(val: i64) -> i32 {
    if val > i32::MAX as i64 {
        i32::MAX
    } else if val < i32::MIN as i64 {
        i32::MIN
    } else {
        val as i32
    }
}

/// Saturate a sample to the native 24-bit range.
#[inline(always)]
pub fn saturate24(val: i32) -> i32 {
    val.clamp(NATIVE_MIN, NATIVE_MAX)
}

/// Quantize a real value to Q24 (multiply by 2^24, truncate toward zero).
#[inline]
pub fn to_q24(val: f32) -> i32 {
    (val * Q24_ONE as f32) as i32
}

/// Multiply a sample by a Q24 gain with a 64-bit intermediate, saturating to `i32`.
#[inline(always)]
pub fn mul_q24(sample: i32, gain: i32) -> i32 {
    saturate_i32((sample as i64 * gain as i64) >> Q24_SHIFT)
}

/// Convert decibels to a linear amplitude ratio.
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    libm::powf(10.0, db / 20.0)
}

/// Convert a linear amplitude ratio to decibels.
///
/// Non-positive ratios have no dB value; they map to `f32::NEG_INFINITY`.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        return f32::NEG_INFINITY;
    }
    20.0 * libm::log10f(linear)
}

/// Clamp `val` to `[min, max]`, reporting whether it had to move.
///
/// NaN is treated as out of range and mapped to `min`.
#[inline]
pub fn clamp_reported(val: f32, min: f32, max: f32) -> (f32, bool) {
    if val.is_nan() {
        (min, true)
    } else if val < min {
        (min, true)
    } else if val > max {
        (max, true)
    } else {
        (val, false)
    }
}
