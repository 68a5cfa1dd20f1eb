//! Distance weighting.
//!
//! Converts an operator's home-location index into a strictly increasing,
//! super-linear cost: the geometric series `1 + b + b^2 + ... + b^(i-1)`,
//! which equals `(1 - b^i) / (1 - b)` for `b >= 2`. Location 0 costs 0.
//!
//! Aggregating raw location indices by maximum loses the ordering between
//! farther operators; objectives are therefore always computed on weights.
//!
//! The base is, by default, the number of roles in the instance. That
//! coupling is kept as an explicit parameter (`weighting_base` in
//! [`EmergencyConfig`](crate::config::EmergencyConfig)).

use serde::{Deserialize, Serialize};

/// Geometric distance weighting with a fixed base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistanceWeighting {
    base: u64,
}

impl DistanceWeighting {
    /// Creates a weighting with the given base.
    ///
    /// Returns `None` for base 0, which would not be strictly increasing.
    /// Base 1 is accepted and degenerates to `weight(i) = i`.
    pub fn new(base: u64) -> Option<Self> {
        (base >= 1).then_some(Self { base })
    }

    /// The exponential base.
    #[inline]
    pub fn base(&self) -> u64 {
        self.base
    }

    /// Weight of a location index, or `None` on `u64` overflow.
    pub fn weight(&self, location: usize) -> Option<u64> {
        distance_weight(location, self.base)
    }
}

/// Computes `1 + b + ... + b^(i-1)` exactly (0 for `i == 0`).
///
/// Horner form keeps every intermediate value an integer; `None` signals
/// overflow instead of wrapping.
///
/// # Example
/// ```
/// use u_response::models::distance_weight;
///
/// assert_eq!(distance_weight(0, 3), Some(0));
/// assert_eq!(distance_weight(1, 3), Some(1));
/// assert_eq!(distance_weight(3, 3), Some(13)); // 1 + 3 + 9
/// ```
pub fn distance_weight(location: usize, base: u64) -> Option<u64> {
    if base == 1 {
        return u64::try_from(location).ok();
    }
    let mut acc: u64 = 0;
    for _ in 0..location {
        acc = acc.checked_mul(base)?.checked_add(1)?;
    }
    Some(acc)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Closed form `(b^i - 1) / (b - 1)` for cross-checking.
    fn closed_form(i: u32, b: u64) -> u64 {
        (b.pow(i) - 1) / (b - 1)
    }

    #[test]
    fn test_zero_location_is_free() {
        for b in 1..10 {
            assert_eq!(distance_weight(0, b), Some(0));
        }
    }

    #[test]
    fn test_matches_closed_form() {
        for b in 2..7u64 {
            for i in 0..10u32 {
                assert_eq!(distance_weight(i as usize, b), Some(closed_form(i, b)));
            }
        }
    }

    #[test]
    fn test_strictly_increasing() {
        for b in 1..6 {
            let weights: Vec<u64> = (0..15).map(|i| distance_weight(i, b).unwrap()).collect();
            assert!(weights.windows(2).all(|w| w[0] < w[1]), "base {b}: {weights:?}");
        }
    }

    #[test]
    fn test_base_two_scenario() {
        assert_eq!(distance_weight(1, 2), Some(1));
        assert_eq!(distance_weight(2, 2), Some(3));
        assert_eq!(distance_weight(4, 2), Some(15));
    }

    #[test]
    fn test_unit_base_is_linear() {
        assert_eq!(distance_weight(5, 1), Some(5));
    }

    #[test]
    fn test_overflow_detected() {
        assert_eq!(distance_weight(64, 2), Some(u64::MAX));
        assert_eq!(distance_weight(65, 2), None);
        assert_eq!(distance_weight(200, 10), None);
    }

    #[test]
    fn test_zero_base_rejected() {
        assert!(DistanceWeighting::new(0).is_none());
        let w = DistanceWeighting::new(3).unwrap();
        assert_eq!(w.base(), 3);
        assert_eq!(w.weight(2), Some(4));
    }
}
