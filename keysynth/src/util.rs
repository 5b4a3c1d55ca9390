//! Various utility functions

use num_traits::Float;

/// The distance, in cents, from `base` to `freq`
#[cfg(test)]
pub fn calculate_cents(base: f64, freq: f64) -> f64 {
    1200.0 * Float::log2(freq / base)
}

/// `x` rounded to the nearest integer, halfway cases away from zero
pub(crate) fn round_i32(x: f64) -> i32 {
    Float::round(x) as i32
}

/// `x` rounded to the nearest positive integer, saturating at `u32::MAX`
pub(crate) fn round_u32_nonzero(x: f64) -> u32 {
    let rounded = Float::round(x);
    if !(rounded >= 1.0) {
        1
    } else if rounded >= u32::MAX as f64 {
        u32::MAX
    } else {
        rounded as u32
    }
}
