//! Shared value types used across configuration, the interactive session and
//! the pair operations.

use serde::{Deserialize, Serialize};

/// The tunable adjustments applied to every pair, in application order.
///
/// Identity values (`1.0` for the multiplicative factors, `0.0` otherwise)
/// leave the pair untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Adjustments {
    /// Brightness multiplier.
    pub brightness: f64,
    /// Contrast multiplier around the mean luma.
    pub contrast: f64,
    /// Percentage trimmed from the inner edges (negative: outer edges).
    pub slice: f64,
    /// Percentage trimmed vertically in opposite directions per side.
    pub align: f64,
    /// Degrees of opposing rotation (left counter-clockwise).
    pub rotate: f64,
}

impl Default for Adjustments {
    fn default() -> Self {
        Self {
            brightness: 1.0,
            contrast: 1.0,
            slice: 0.0,
            align: 0.0,
            rotate: 0.0,
        }
    }
}

impl Adjustments {
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_identity() {
        assert!(Adjustments::default().is_identity());
    }

    #[test]
    fn any_change_is_not_identity() {
        let adj = Adjustments {
            rotate: 0.5,
            ..Adjustments::default()
        };
        assert!(!adj.is_identity());
    }

    #[test]
    fn parse_partial_adjustments() {
        let adj: Adjustments = toml::from_str("slice = 2.5").unwrap();
        assert_eq!(adj.slice, 2.5);
        assert_eq!(adj.brightness, 1.0);
    }

    #[test]
    fn unknown_adjustment_rejected() {
        let result: Result<Adjustments, _> = toml::from_str("sharpen = 1.0");
        assert!(result.is_err());
    }
}
