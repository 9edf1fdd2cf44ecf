//! Common thresholds and comparison functions shared across all detector modules.

use crate::{Ohlc, OhlcExt};

// ============================================================
// THRESHOLDS
// ============================================================

/// Long wick of a hammer-shaped candle: wick >= body * LONG_WICK_FACTOR
pub const LONG_WICK_FACTOR: f64 = 2.0;
/// Opposite wick of a hammer-shaped candle: wick < body * SHORT_WICK_FACTOR
pub const SHORT_WICK_FACTOR: f64 = 0.3;
/// Hammer-shaped candles need body / range below this
pub const MAX_BODY_PERCENT: f64 = 0.4;

/// Doji body: body < range * DOJI_BODY_RATIO
pub const DOJI_BODY_RATIO: f64 = 0.1;
/// Dragonfly/Gravestone long wick: wick > range * DOJI_LONG_WICK_RATIO
pub const DOJI_LONG_WICK_RATIO: f64 = 0.6;
/// Dragonfly/Gravestone short wick: wick < range * DOJI_SHORT_WICK_RATIO
pub const DOJI_SHORT_WICK_RATIO: f64 = 0.1;
/// Plain doji: both wicks > range * DOJI_MIN_WICK_RATIO
pub const DOJI_MIN_WICK_RATIO: f64 = 0.2;

/// Midpoint penetration for piercing / dark cloud / star closes
pub const PENETRATION_RATIO: f64 = 0.5;
/// Star body: middle body < first body * STAR_BODY_RATIO
pub const STAR_BODY_RATIO: f64 = 0.3;
/// Soldier/crow body: body > range * LONG_BODY_RATIO
pub const LONG_BODY_RATIO: f64 = 0.6;

/// Spinning top body: body < range * SPINNING_TOP_BODY_RATIO
pub const SPINNING_TOP_BODY_RATIO: f64 = 0.3;
/// Spinning top wicks: both > body * SPINNING_TOP_WICK_FACTOR
pub const SPINNING_TOP_WICK_FACTOR: f64 = 0.5;

// ============================================================
// HELPER FUNCTIONS
// ============================================================

/// Body is doji-like. A zero-range candle is never a doji.
#[inline]
pub fn is_doji(body: f64, range: f64, ratio: f64) -> bool {
    body < range * ratio
}

/// Wick is long relative to the body
#[inline]
pub fn is_long_wick(wick: f64, body: f64, factor: f64) -> bool {
    wick >= body * factor
}

/// Wick is short relative to the body. Always false for a zero body.
#[inline]
pub fn is_short_wick(wick: f64, body: f64, factor: f64) -> bool {
    wick < body * factor
}

/// Body covers more than `ratio` of the candle's own range
#[inline]
pub fn has_long_body<T: Ohlc>(bar: &T, ratio: f64) -> bool {
    bar.body() > bar.range() * ratio
}

/// Price `ratio` of the way from `from` to `to`
#[inline]
pub fn body_level(from: f64, to: f64, ratio: f64) -> f64 {
    from + (to - from) * ratio
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Candle;

    #[test]
    fn zero_range_is_not_doji() {
        assert!(!is_doji(0.0, 0.0, DOJI_BODY_RATIO));
        assert!(is_doji(0.0, 1.0, DOJI_BODY_RATIO));
    }

    #[test]
    fn short_wick_never_holds_for_zero_body() {
        assert!(!is_short_wick(0.0, 0.0, SHORT_WICK_FACTOR));
    }

    #[test]
    fn long_body_is_strict() {
        // body 6 of range 10 is exactly 0.6, not above it
        let c = Candle::new(100.0, 108.0, 98.0, 106.0);
        assert!(!has_long_body(&c, LONG_BODY_RATIO));
        assert!(has_long_body(&c, 0.5));
    }

    #[test]
    fn body_level_midpoint() {
        assert_eq!(body_level(90.0, 100.0, PENETRATION_RATIO), 95.0);
        assert_eq!(body_level(100.0, 90.0, PENETRATION_RATIO), 95.0);
    }
}
