//! Valid bucket counts.
//!
//! Every bucket store is sized from [`PRIME_SIZES`], an ascending list of
//! primes where each entry roughly doubles the previous one. Growth asks for
//! the smallest member at or above a lower bound.

/// Ascending bucket-count candidates.
pub const PRIME_SIZES: &[usize] = &[
    5,
    11,
    23,
    47,
    97,
    199,
    409,
    823,
    1_741,
    3_469,
    6_949,
    14_033,
    28_411,
    57_557,
    116_731,
    236_897,
    480_881,
    976_369,
    1_982_627,
    4_026_031,
    8_175_383,
    16_601_593,
    33_712_729,
    68_460_391,
    139_022_417,
    282_312_799,
    573_292_817,
    1_164_186_217,
    2_364_114_217,
    4_294_967_291,
];

/// The smallest valid bucket count, used for default-constructed tables.
#[inline]
pub fn smallest() -> usize {
    PRIME_SIZES[0]
}

/// The largest valid bucket count.
#[inline]
pub fn largest() -> usize {
    PRIME_SIZES[PRIME_SIZES.len() - 1]
}

/// Smallest member of [`PRIME_SIZES`] that is `>= bound`, or `None` when the
/// bound is above every member.
pub fn smallest_at_least(bound: usize) -> Option<usize> {
    let idx = PRIME_SIZES.partition_point(|&p| p < bound);
    PRIME_SIZES.get(idx).copied()
}

/// Whether `n` is one of the valid bucket counts.
pub fn is_valid(n: usize) -> bool {
    PRIME_SIZES.binary_search(&n).is_ok()
}
