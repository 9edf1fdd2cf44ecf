//! Three-bar candlestick pattern detectors
//!
//! Morning Star, Evening Star, Three White Soldiers, Three Black Crows.
//! All of them need both `prev` and `prev2`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::helpers::{self, body_level, has_long_body};
use crate::{
    params::{get_ratio, ParamMeta, ParamType, ParameterizedDetector},
    CandleSequence, Direction, Ohlc, OhlcExt, PatternDetector, PatternId, PatternMatch, Ratio,
    Result,
};

impl_with_defaults!(
    MorningStarDetector,
    EveningStarDetector,
    ThreeWhiteSoldiersDetector,
    ThreeBlackCrowsDetector,
);

/// (first, middle, last) in time order
#[inline]
fn triple<'a, T: Ohlc>(seq: &CandleSequence<'a, T>) -> Option<(&'a T, &'a T, &'a T)> {
    Some((seq.prev2()?, seq.prev()?, seq.current))
}

// ============================================================
// STAR PATTERNS
// ============================================================

/// Morning Star - bearish candle, small-bodied star, bullish recovery past
/// the first body's midpoint
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MorningStarDetector {
    /// Star body must be below this fraction of the first body
    pub star_body_ratio: Ratio,
    pub penetration: Ratio,
}

impl Default for MorningStarDetector {
    fn default() -> Self {
        Self {
            star_body_ratio: Ratio::new_const(helpers::STAR_BODY_RATIO),
            penetration: Ratio::new_const(helpers::PENETRATION_RATIO),
        }
    }
}

impl PatternDetector for MorningStarDetector {
    fn id(&self) -> PatternId {
        PatternId::MORNING_STAR
    }

    fn direction(&self) -> Direction {
        Direction::Bullish
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect<T: Ohlc>(&self, seq: &CandleSequence<'_, T>) -> Option<PatternMatch> {
        let (first, star, last) = triple(seq)?;

        if !first.is_bearish() || !last.is_bullish() {
            return None;
        }
        if star.body() >= first.body() * self.star_body_ratio.get() {
            return None;
        }

        let level = body_level(first.close(), first.open(), self.penetration.get());
        if last.close() > level {
            return self.matched();
        }
        None
    }
}

/// Evening Star - bullish candle, small-bodied star, bearish drop past the
/// first body's midpoint
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct EveningStarDetector {
    pub star_body_ratio: Ratio,
    pub penetration: Ratio,
}

impl Default for EveningStarDetector {
    fn default() -> Self {
        Self {
            star_body_ratio: Ratio::new_const(helpers::STAR_BODY_RATIO),
            penetration: Ratio::new_const(helpers::PENETRATION_RATIO),
        }
    }
}

impl PatternDetector for EveningStarDetector {
    fn id(&self) -> PatternId {
        PatternId::EVENING_STAR
    }

    fn direction(&self) -> Direction {
        Direction::Bearish
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect<T: Ohlc>(&self, seq: &CandleSequence<'_, T>) -> Option<PatternMatch> {
        let (first, star, last) = triple(seq)?;

        if !first.is_bullish() || !last.is_bearish() {
            return None;
        }
        if star.body() >= first.body() * self.star_body_ratio.get() {
            return None;
        }

        let level = body_level(first.close(), first.open(), self.penetration.get());
        if last.close() < level {
            return self.matched();
        }
        None
    }
}

// ============================================================
// THREE SOLDIERS / CROWS
// ============================================================

/// Three White Soldiers - three long bullish bodies with rising closes
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreeWhiteSoldiersDetector {
    /// Each body must cover more than this fraction of its own range
    pub long_body_ratio: Ratio,
}

impl Default for ThreeWhiteSoldiersDetector {
    fn default() -> Self {
        Self {
            long_body_ratio: Ratio::new_const(helpers::LONG_BODY_RATIO),
        }
    }
}

impl PatternDetector for ThreeWhiteSoldiersDetector {
    fn id(&self) -> PatternId {
        PatternId::THREE_WHITE_SOLDIERS
    }

    fn direction(&self) -> Direction {
        Direction::Bullish
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect<T: Ohlc>(&self, seq: &CandleSequence<'_, T>) -> Option<PatternMatch> {
        let (c1, c2, c3) = triple(seq)?;
        let ratio = self.long_body_ratio.get();

        let all_long_white = [c1, c2, c3]
            .iter()
            .all(|c| c.is_bullish() && has_long_body(*c, ratio));
        if all_long_white && c2.close() > c1.close() && c3.close() > c2.close() {
            return self.matched();
        }
        None
    }
}

/// Three Black Crows - three long bearish bodies with falling closes
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreeBlackCrowsDetector {
    pub long_body_ratio: Ratio,
}

impl Default for ThreeBlackCrowsDetector {
    fn default() -> Self {
        Self {
            long_body_ratio: Ratio::new_const(helpers::LONG_BODY_RATIO),
        }
    }
}

impl PatternDetector for ThreeBlackCrowsDetector {
    fn id(&self) -> PatternId {
        PatternId::THREE_BLACK_CROWS
    }

    fn direction(&self) -> Direction {
        Direction::Bearish
    }

    fn min_bars(&self) -> usize {
        3
    }

    fn detect<T: Ohlc>(&self, seq: &CandleSequence<'_, T>) -> Option<PatternMatch> {
        let (c1, c2, c3) = triple(seq)?;
        let ratio = self.long_body_ratio.get();

        let all_long_black = [c1, c2, c3]
            .iter()
            .all(|c| c.is_bearish() && has_long_body(*c, ratio));
        if all_long_black && c2.close() < c1.close() && c3.close() < c2.close() {
            return self.matched();
        }
        None
    }
}

// ============================================================
// PARAMETER METADATA
// ============================================================

static STAR_PARAMS: &[ParamMeta] = &[
    ParamMeta {
        name: "star_body_ratio",
        param_type: ParamType::Ratio,
        default: helpers::STAR_BODY_RATIO,
        range: (0.1, 0.5, 0.1),
        description: "Maximum star body as a fraction of the first body",
    },
    ParamMeta {
        name: "penetration",
        param_type: ParamType::Ratio,
        default: helpers::PENETRATION_RATIO,
        range: (0.3, 0.7, 0.1),
        description: "Fraction of the first body the last close must retrace",
    },
];

static LONG_BODY_PARAMS: &[ParamMeta] = &[ParamMeta {
    name: "long_body_ratio",
    param_type: ParamType::Ratio,
    default: helpers::LONG_BODY_RATIO,
    range: (0.5, 0.8, 0.05),
    description: "Minimum body as a fraction of each candle's range",
}];

impl ParameterizedDetector for MorningStarDetector {
    fn param_meta() -> &'static [ParamMeta] {
        STAR_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            star_body_ratio: get_ratio(params, "star_body_ratio", helpers::STAR_BODY_RATIO)?,
            penetration: get_ratio(params, "penetration", helpers::PENETRATION_RATIO)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        PatternId::MORNING_STAR.0
    }
}

impl ParameterizedDetector for EveningStarDetector {
    fn param_meta() -> &'static [ParamMeta] {
        STAR_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            star_body_ratio: get_ratio(params, "star_body_ratio", helpers::STAR_BODY_RATIO)?,
            penetration: get_ratio(params, "penetration", helpers::PENETRATION_RATIO)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        PatternId::EVENING_STAR.0
    }
}

impl ParameterizedDetector for ThreeWhiteSoldiersDetector {
    fn param_meta() -> &'static [ParamMeta] {
        LONG_BODY_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            long_body_ratio: get_ratio(params, "long_body_ratio", helpers::LONG_BODY_RATIO)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        PatternId::THREE_WHITE_SOLDIERS.0
    }
}

impl ParameterizedDetector for ThreeBlackCrowsDetector {
    fn param_meta() -> &'static [ParamMeta] {
        LONG_BODY_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            long_body_ratio: get_ratio(params, "long_body_ratio", helpers::LONG_BODY_RATIO)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        PatternId::THREE_BLACK_CROWS.0
    }
}
