//! Two-bar candlestick pattern detectors
//!
//! Bullish/Bearish Engulfing, Piercing Line, Dark Cloud Cover.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::helpers::{self, body_level};
use crate::{
    params::{get_ratio, ParamMeta, ParamType, ParameterizedDetector},
    CandleSequence, Direction, Ohlc, OhlcExt, PatternDetector, PatternId, PatternMatch, Ratio,
    Result,
};

impl_with_defaults!(
    BullishEngulfingDetector,
    BearishEngulfingDetector,
    PiercingLineDetector,
    DarkCloudCoverDetector,
);

// ============================================================
// ENGULFING PATTERNS
// ============================================================

/// Bullish Engulfing - bullish body wraps a bearish one
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BullishEngulfingDetector;

impl PatternDetector for BullishEngulfingDetector {
    fn id(&self) -> PatternId {
        PatternId::BULLISH_ENGULFING
    }

    fn direction(&self) -> Direction {
        Direction::Bullish
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect<T: Ohlc>(&self, seq: &CandleSequence<'_, T>) -> Option<PatternMatch> {
        let prev = seq.prev()?;
        let curr = seq.current;

        if prev.is_bearish()
            && curr.is_bullish()
            && curr.close() > prev.open()
            && curr.open() < prev.close()
        {
            return self.matched();
        }
        None
    }
}

/// Bearish Engulfing - bearish body wraps a bullish one
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BearishEngulfingDetector;

impl PatternDetector for BearishEngulfingDetector {
    fn id(&self) -> PatternId {
        PatternId::BEARISH_ENGULFING
    }

    fn direction(&self) -> Direction {
        Direction::Bearish
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect<T: Ohlc>(&self, seq: &CandleSequence<'_, T>) -> Option<PatternMatch> {
        let prev = seq.prev()?;
        let curr = seq.current;

        if prev.is_bullish()
            && curr.is_bearish()
            && curr.open() > prev.close()
            && curr.close() < prev.open()
        {
            return self.matched();
        }
        None
    }
}

// ============================================================
// PENETRATION PATTERNS
// ============================================================

/// Piercing Line - opens below a bearish close, closes back inside its
/// upper half without reaching its open
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PiercingLineDetector {
    /// How far into the previous body the close must reach (0.5 = midpoint)
    pub penetration: Ratio,
}

impl Default for PiercingLineDetector {
    fn default() -> Self {
        Self {
            penetration: Ratio::new_const(helpers::PENETRATION_RATIO),
        }
    }
}

impl PatternDetector for PiercingLineDetector {
    fn id(&self) -> PatternId {
        PatternId::PIERCING_LINE
    }

    fn direction(&self) -> Direction {
        Direction::Bullish
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect<T: Ohlc>(&self, seq: &CandleSequence<'_, T>) -> Option<PatternMatch> {
        let prev = seq.prev()?;
        let curr = seq.current;

        if !(prev.is_bearish() && curr.is_bullish()) {
            return None;
        }

        let level = body_level(prev.close(), prev.open(), self.penetration.get());
        if curr.open() < prev.close() && curr.close() > level && curr.close() < prev.open() {
            return self.matched();
        }
        None
    }
}

/// Dark Cloud Cover - opens above a bullish close, closes back inside its
/// lower half without reaching its open
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DarkCloudCoverDetector {
    pub penetration: Ratio,
}

impl Default for DarkCloudCoverDetector {
    fn default() -> Self {
        Self {
            penetration: Ratio::new_const(helpers::PENETRATION_RATIO),
        }
    }
}

impl PatternDetector for DarkCloudCoverDetector {
    fn id(&self) -> PatternId {
        PatternId::DARK_CLOUD_COVER
    }

    fn direction(&self) -> Direction {
        Direction::Bearish
    }

    fn min_bars(&self) -> usize {
        2
    }

    fn detect<T: Ohlc>(&self, seq: &CandleSequence<'_, T>) -> Option<PatternMatch> {
        let prev = seq.prev()?;
        let curr = seq.current;

        if !(prev.is_bullish() && curr.is_bearish()) {
            return None;
        }

        let level = body_level(prev.close(), prev.open(), self.penetration.get());
        if curr.open() > prev.close() && curr.close() < level && curr.close() > prev.open() {
            return self.matched();
        }
        None
    }
}

// ============================================================
// PARAMETER METADATA
// ============================================================

static PENETRATION_PARAMS: &[ParamMeta] = &[ParamMeta {
    name: "penetration",
    param_type: ParamType::Ratio,
    default: helpers::PENETRATION_RATIO,
    range: (0.3, 0.7, 0.1),
    description: "Fraction of the previous body the close must retrace",
}];

impl ParameterizedDetector for PiercingLineDetector {
    fn param_meta() -> &'static [ParamMeta] {
        PENETRATION_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            penetration: get_ratio(params, "penetration", helpers::PENETRATION_RATIO)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        PatternId::PIERCING_LINE.0
    }
}

impl ParameterizedDetector for DarkCloudCoverDetector {
    fn param_meta() -> &'static [ParamMeta] {
        PENETRATION_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            penetration: get_ratio(params, "penetration", helpers::PENETRATION_RATIO)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        PatternId::DARK_CLOUD_COVER.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Candle;

    fn fires<D: PatternDetector>(detector: &D, prev: &Candle, curr: &Candle) -> bool {
        detector
            .detect(&CandleSequence::new(curr).with_prev(prev))
            .is_some()
    }

    #[test]
    fn engulfing_requires_prev() {
        let curr = Candle::new(59.0, 62.0, 58.0, 61.5);
        assert!(BullishEngulfingDetector
            .detect(&CandleSequence::new(&curr))
            .is_none());
    }

    #[test]
    fn bullish_engulfing() {
        let prev = Candle::new(60.0, 61.0, 59.0, 59.5);
        let curr = Candle::new(59.0, 62.0, 58.0, 61.5);
        assert!(fires(&BullishEngulfingDetector, &prev, &curr));
        assert!(!fires(&BearishEngulfingDetector, &prev, &curr));
    }

    #[test]
    fn engulfing_needs_strict_containment() {
        // close equals prev open
        let prev = Candle::new(60.0, 61.0, 59.0, 59.5);
        let curr = Candle::new(59.0, 61.0, 58.0, 60.0);
        assert!(!fires(&BullishEngulfingDetector, &prev, &curr));
    }

    #[test]
    fn bearish_engulfing() {
        let prev = Candle::new(59.5, 61.0, 59.0, 60.0);
        let curr = Candle::new(60.5, 61.0, 58.0, 59.0);
        assert!(fires(&BearishEngulfingDetector, &prev, &curr));
    }

    #[test]
    fn piercing_line_closes_past_midpoint() {
        let prev = Candle::new(110.0, 111.0, 99.0, 100.0);
        let curr = Candle::new(98.0, 108.0, 97.0, 107.0);
        assert!(fires(&PiercingLineDetector::default(), &prev, &curr));

        // stops below the midpoint
        let shallow = Candle::new(98.0, 104.0, 97.0, 104.0);
        assert!(!fires(&PiercingLineDetector::default(), &prev, &shallow));

        // beyond prev open is engulfing, not piercing
        let full = Candle::new(98.0, 112.0, 97.0, 111.0);
        assert!(!fires(&PiercingLineDetector::default(), &prev, &full));
        assert!(fires(&BullishEngulfingDetector, &prev, &full));
    }

    #[test]
    fn dark_cloud_cover() {
        let prev = Candle::new(100.0, 111.0, 99.0, 110.0);
        let curr = Candle::new(112.0, 113.0, 102.0, 103.0);
        assert!(fires(&DarkCloudCoverDetector::default(), &prev, &curr));
        assert!(!fires(&PiercingLineDetector::default(), &prev, &curr));
    }

    #[test]
    fn penetration_is_tunable() {
        let mut params = HashMap::new();
        params.insert("penetration", 0.3);
        let loose = PiercingLineDetector::with_params(&params).unwrap();

        let prev = Candle::new(110.0, 111.0, 99.0, 100.0);
        let curr = Candle::new(98.0, 104.0, 97.0, 104.0);
        assert!(fires(&loose, &prev, &curr));
    }
}
