//! Single-bar candlestick pattern detectors
//!
//! Hammer, Inverse Hammer, Hanging Man, Shooting Star, Dragonfly Doji,
//! Gravestone Doji, Doji, Spinning Top.
//!
//! Every threshold is relative to the candle's own body or range, so these
//! detectors need no lookback.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::helpers::{self, is_doji, is_long_wick, is_short_wick};
use crate::params::{get_factor, get_ratio, ParamMeta, ParamType, ParameterizedDetector};
use crate::{
    check_factor, CandleSequence, Direction, Ohlc, OhlcExt, PatternDetector, PatternId,
    PatternMatch, Ratio, Result,
};

impl_with_defaults!(
    HammerDetector,
    InverseHammerDetector,
    HangingManDetector,
    ShootingStarDetector,
    DragonflyDojiDetector,
    GravestoneDojiDetector,
    DojiDetector,
    SpinningTopDetector,
);

// ============================================================
// HAMMER FAMILY
// ============================================================

/// Thresholds shared by the four hammer-shaped patterns
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WickShape {
    /// Long wick must be at least this multiple of the body
    pub long_wick_factor: f64,
    /// Opposite wick must stay below this multiple of the body
    pub short_wick_factor: f64,
    /// Body / range must stay below this
    pub max_body_percent: Ratio,
}

impl Default for WickShape {
    fn default() -> Self {
        Self {
            long_wick_factor: helpers::LONG_WICK_FACTOR,
            short_wick_factor: helpers::SHORT_WICK_FACTOR,
            max_body_percent: Ratio::new_const(helpers::MAX_BODY_PERCENT),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum LongWick {
    Lower,
    Upper,
}

impl WickShape {
    fn matches<T: Ohlc>(&self, bar: &T, long: LongWick) -> bool {
        let body = bar.body();
        let (long_wick, short_wick) = match long {
            LongWick::Lower => (bar.lower_shadow(), bar.upper_shadow()),
            LongWick::Upper => (bar.upper_shadow(), bar.lower_shadow()),
        };
        is_long_wick(long_wick, body, self.long_wick_factor)
            && is_short_wick(short_wick, body, self.short_wick_factor)
            && bar.body_percent() < self.max_body_percent.get()
    }

    fn validate(&self) -> Result<()> {
        check_factor("long_wick_factor", self.long_wick_factor)?;
        check_factor("short_wick_factor", self.short_wick_factor)
    }

    fn from_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            long_wick_factor: get_factor(params, "long_wick_factor", helpers::LONG_WICK_FACTOR)?,
            short_wick_factor: get_factor(
                params,
                "short_wick_factor",
                helpers::SHORT_WICK_FACTOR,
            )?,
            max_body_percent: get_ratio(params, "max_body_percent", helpers::MAX_BODY_PERCENT)?,
        })
    }
}

/// Hammer - long lower wick, bullish close
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HammerDetector {
    pub shape: WickShape,
}

impl PatternDetector for HammerDetector {
    fn id(&self) -> PatternId {
        PatternId::HAMMER
    }

    fn direction(&self) -> Direction {
        Direction::Bullish
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect<T: Ohlc>(&self, seq: &CandleSequence<'_, T>) -> Option<PatternMatch> {
        let bar = seq.current;
        if bar.is_bullish() && self.shape.matches(bar, LongWick::Lower) {
            return self.matched();
        }
        None
    }

    fn validate_config(&self) -> Result<()> {
        self.shape.validate()
    }
}

/// Inverse Hammer - long upper wick, bullish close
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InverseHammerDetector {
    pub shape: WickShape,
}

impl PatternDetector for InverseHammerDetector {
    fn id(&self) -> PatternId {
        PatternId::INVERSE_HAMMER
    }

    fn direction(&self) -> Direction {
        Direction::Bullish
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect<T: Ohlc>(&self, seq: &CandleSequence<'_, T>) -> Option<PatternMatch> {
        let bar = seq.current;
        if bar.is_bullish() && self.shape.matches(bar, LongWick::Upper) {
            return self.matched();
        }
        None
    }

    fn validate_config(&self) -> Result<()> {
        self.shape.validate()
    }
}

/// Hanging Man - long lower wick, bearish close
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HangingManDetector {
    pub shape: WickShape,
}

impl PatternDetector for HangingManDetector {
    fn id(&self) -> PatternId {
        PatternId::HANGING_MAN
    }

    fn direction(&self) -> Direction {
        Direction::Bearish
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect<T: Ohlc>(&self, seq: &CandleSequence<'_, T>) -> Option<PatternMatch> {
        let bar = seq.current;
        if bar.is_bearish() && self.shape.matches(bar, LongWick::Lower) {
            return self.matched();
        }
        None
    }

    fn validate_config(&self) -> Result<()> {
        self.shape.validate()
    }
}

/// Shooting Star - long upper wick, bearish close
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShootingStarDetector {
    pub shape: WickShape,
}

impl PatternDetector for ShootingStarDetector {
    fn id(&self) -> PatternId {
        PatternId::SHOOTING_STAR
    }

    fn direction(&self) -> Direction {
        Direction::Bearish
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect<T: Ohlc>(&self, seq: &CandleSequence<'_, T>) -> Option<PatternMatch> {
        let bar = seq.current;
        if bar.is_bearish() && self.shape.matches(bar, LongWick::Upper) {
            return self.matched();
        }
        None
    }

    fn validate_config(&self) -> Result<()> {
        self.shape.validate()
    }
}

// ============================================================
// DOJI FAMILY
// ============================================================

/// Dragonfly Doji - doji body at the top of a long lower wick
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DragonflyDojiDetector {
    pub doji_ratio: Ratio,
    pub long_wick_ratio: Ratio,
    pub short_wick_ratio: Ratio,
}

impl Default for DragonflyDojiDetector {
    fn default() -> Self {
        Self {
            doji_ratio: Ratio::new_const(helpers::DOJI_BODY_RATIO),
            long_wick_ratio: Ratio::new_const(helpers::DOJI_LONG_WICK_RATIO),
            short_wick_ratio: Ratio::new_const(helpers::DOJI_SHORT_WICK_RATIO),
        }
    }
}

impl PatternDetector for DragonflyDojiDetector {
    fn id(&self) -> PatternId {
        PatternId::DRAGONFLY_DOJI
    }

    fn direction(&self) -> Direction {
        Direction::Bullish
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect<T: Ohlc>(&self, seq: &CandleSequence<'_, T>) -> Option<PatternMatch> {
        let bar = seq.current;
        let range = bar.range();

        if !is_doji(bar.body(), range, self.doji_ratio.get()) {
            return None;
        }
        if bar.lower_shadow() > range * self.long_wick_ratio.get()
            && bar.upper_shadow() < range * self.short_wick_ratio.get()
        {
            return self.matched();
        }
        None
    }
}

/// Gravestone Doji - doji body at the bottom of a long upper wick
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct GravestoneDojiDetector {
    pub doji_ratio: Ratio,
    pub long_wick_ratio: Ratio,
    pub short_wick_ratio: Ratio,
}

impl Default for GravestoneDojiDetector {
    fn default() -> Self {
        Self {
            doji_ratio: Ratio::new_const(helpers::DOJI_BODY_RATIO),
            long_wick_ratio: Ratio::new_const(helpers::DOJI_LONG_WICK_RATIO),
            short_wick_ratio: Ratio::new_const(helpers::DOJI_SHORT_WICK_RATIO),
        }
    }
}

impl PatternDetector for GravestoneDojiDetector {
    fn id(&self) -> PatternId {
        PatternId::GRAVESTONE_DOJI
    }

    fn direction(&self) -> Direction {
        Direction::Bearish
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect<T: Ohlc>(&self, seq: &CandleSequence<'_, T>) -> Option<PatternMatch> {
        let bar = seq.current;
        let range = bar.range();

        if !is_doji(bar.body(), range, self.doji_ratio.get()) {
            return None;
        }
        if bar.upper_shadow() > range * self.long_wick_ratio.get()
            && bar.lower_shadow() < range * self.short_wick_ratio.get()
        {
            return self.matched();
        }
        None
    }
}

/// Doji - tiny body with meaningful wicks on both sides.
///
/// Independent of the directional doji checks, so a candle can be both a
/// Doji and a Dragonfly/Gravestone Doji when the thresholds allow it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DojiDetector {
    pub doji_ratio: Ratio,
    pub min_wick_ratio: Ratio,
}

impl Default for DojiDetector {
    fn default() -> Self {
        Self {
            doji_ratio: Ratio::new_const(helpers::DOJI_BODY_RATIO),
            min_wick_ratio: Ratio::new_const(helpers::DOJI_MIN_WICK_RATIO),
        }
    }
}

impl PatternDetector for DojiDetector {
    fn id(&self) -> PatternId {
        PatternId::DOJI
    }

    fn direction(&self) -> Direction {
        Direction::Neutral
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect<T: Ohlc>(&self, seq: &CandleSequence<'_, T>) -> Option<PatternMatch> {
        let bar = seq.current;
        let range = bar.range();
        let min_wick = range * self.min_wick_ratio.get();

        if is_doji(bar.body(), range, self.doji_ratio.get())
            && bar.upper_shadow() > min_wick
            && bar.lower_shadow() > min_wick
        {
            return self.matched();
        }
        None
    }
}

// ============================================================
// SPINNING TOP
// ============================================================

/// Spinning Top - small (non-doji) body with wicks on both sides
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SpinningTopDetector {
    pub max_body_ratio: Ratio,
    pub min_wick_factor: f64,
    /// Bodies below this fraction of the range count as doji and are skipped
    pub doji_ratio: Ratio,
}

impl Default for SpinningTopDetector {
    fn default() -> Self {
        Self {
            max_body_ratio: Ratio::new_const(helpers::SPINNING_TOP_BODY_RATIO),
            min_wick_factor: helpers::SPINNING_TOP_WICK_FACTOR,
            doji_ratio: Ratio::new_const(helpers::DOJI_BODY_RATIO),
        }
    }
}

impl PatternDetector for SpinningTopDetector {
    fn id(&self) -> PatternId {
        PatternId::SPINNING_TOP
    }

    fn direction(&self) -> Direction {
        Direction::Neutral
    }

    fn min_bars(&self) -> usize {
        1
    }

    fn detect<T: Ohlc>(&self, seq: &CandleSequence<'_, T>) -> Option<PatternMatch> {
        let bar = seq.current;
        let body = bar.body();
        let range = bar.range();
        let min_wick = body * self.min_wick_factor;

        let small_body = body < range * self.max_body_ratio.get();
        let has_wicks = bar.upper_shadow() > min_wick && bar.lower_shadow() > min_wick;

        if small_body && has_wicks && !is_doji(body, range, self.doji_ratio.get()) {
            return self.matched();
        }
        None
    }

    fn validate_config(&self) -> Result<()> {
        check_factor("min_wick_factor", self.min_wick_factor)
    }
}

// ============================================================
// PARAMETER METADATA
// ============================================================

static WICK_SHAPE_PARAMS: &[ParamMeta] = &[
    ParamMeta {
        name: "long_wick_factor",
        param_type: ParamType::Factor,
        default: helpers::LONG_WICK_FACTOR,
        range: (1.5, 3.0, 0.5),
        description: "Minimum long wick as a multiple of the body",
    },
    ParamMeta {
        name: "short_wick_factor",
        param_type: ParamType::Factor,
        default: helpers::SHORT_WICK_FACTOR,
        range: (0.1, 0.5, 0.1),
        description: "Maximum opposite wick as a multiple of the body",
    },
    ParamMeta {
        name: "max_body_percent",
        param_type: ParamType::Ratio,
        default: helpers::MAX_BODY_PERCENT,
        range: (0.2, 0.5, 0.1),
        description: "Maximum body as a fraction of the range",
    },
];

static DIRECTIONAL_DOJI_PARAMS: &[ParamMeta] = &[
    ParamMeta {
        name: "doji_ratio",
        param_type: ParamType::Ratio,
        default: helpers::DOJI_BODY_RATIO,
        range: (0.05, 0.2, 0.05),
        description: "Maximum doji body as a fraction of the range",
    },
    ParamMeta {
        name: "long_wick_ratio",
        param_type: ParamType::Ratio,
        default: helpers::DOJI_LONG_WICK_RATIO,
        range: (0.5, 0.8, 0.1),
        description: "Minimum long wick as a fraction of the range",
    },
    ParamMeta {
        name: "short_wick_ratio",
        param_type: ParamType::Ratio,
        default: helpers::DOJI_SHORT_WICK_RATIO,
        range: (0.05, 0.2, 0.05),
        description: "Maximum short wick as a fraction of the range",
    },
];

static DOJI_PARAMS: &[ParamMeta] = &[
    ParamMeta {
        name: "doji_ratio",
        param_type: ParamType::Ratio,
        default: helpers::DOJI_BODY_RATIO,
        range: (0.05, 0.2, 0.05),
        description: "Maximum doji body as a fraction of the range",
    },
    ParamMeta {
        name: "min_wick_ratio",
        param_type: ParamType::Ratio,
        default: helpers::DOJI_MIN_WICK_RATIO,
        range: (0.1, 0.3, 0.05),
        description: "Minimum wick on each side as a fraction of the range",
    },
];

static SPINNING_TOP_PARAMS: &[ParamMeta] = &[
    ParamMeta {
        name: "max_body_ratio",
        param_type: ParamType::Ratio,
        default: helpers::SPINNING_TOP_BODY_RATIO,
        range: (0.2, 0.4, 0.05),
        description: "Maximum body as a fraction of the range",
    },
    ParamMeta {
        name: "min_wick_factor",
        param_type: ParamType::Factor,
        default: helpers::SPINNING_TOP_WICK_FACTOR,
        range: (0.25, 1.0, 0.25),
        description: "Minimum wick on each side as a multiple of the body",
    },
    ParamMeta {
        name: "doji_ratio",
        param_type: ParamType::Ratio,
        default: helpers::DOJI_BODY_RATIO,
        range: (0.05, 0.2, 0.05),
        description: "Bodies below this fraction of the range are doji",
    },
];

macro_rules! impl_wick_shape_params {
    ($($detector:ident => $id:expr),* $(,)?) => {
        $(impl ParameterizedDetector for $detector {
            fn param_meta() -> &'static [ParamMeta] {
                WICK_SHAPE_PARAMS
            }

            fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
                Ok(Self {
                    shape: WickShape::from_params(params)?,
                })
            }

            fn pattern_id_str() -> &'static str {
                $id.0
            }
        })*
    };
}

impl_wick_shape_params!(
    HammerDetector => PatternId::HAMMER,
    InverseHammerDetector => PatternId::INVERSE_HAMMER,
    HangingManDetector => PatternId::HANGING_MAN,
    ShootingStarDetector => PatternId::SHOOTING_STAR,
);

impl ParameterizedDetector for DragonflyDojiDetector {
    fn param_meta() -> &'static [ParamMeta] {
        DIRECTIONAL_DOJI_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            doji_ratio: get_ratio(params, "doji_ratio", helpers::DOJI_BODY_RATIO)?,
            long_wick_ratio: get_ratio(params, "long_wick_ratio", helpers::DOJI_LONG_WICK_RATIO)?,
            short_wick_ratio: get_ratio(
                params,
                "short_wick_ratio",
                helpers::DOJI_SHORT_WICK_RATIO,
            )?,
        })
    }

    fn pattern_id_str() -> &'static str {
        PatternId::DRAGONFLY_DOJI.0
    }
}

impl ParameterizedDetector for GravestoneDojiDetector {
    fn param_meta() -> &'static [ParamMeta] {
        DIRECTIONAL_DOJI_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            doji_ratio: get_ratio(params, "doji_ratio", helpers::DOJI_BODY_RATIO)?,
            long_wick_ratio: get_ratio(params, "long_wick_ratio", helpers::DOJI_LONG_WICK_RATIO)?,
            short_wick_ratio: get_ratio(
                params,
                "short_wick_ratio",
                helpers::DOJI_SHORT_WICK_RATIO,
            )?,
        })
    }

    fn pattern_id_str() -> &'static str {
        PatternId::GRAVESTONE_DOJI.0
    }
}

impl ParameterizedDetector for DojiDetector {
    fn param_meta() -> &'static [ParamMeta] {
        DOJI_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            doji_ratio: get_ratio(params, "doji_ratio", helpers::DOJI_BODY_RATIO)?,
            min_wick_ratio: get_ratio(params, "min_wick_ratio", helpers::DOJI_MIN_WICK_RATIO)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        PatternId::DOJI.0
    }
}

impl ParameterizedDetector for SpinningTopDetector {
    fn param_meta() -> &'static [ParamMeta] {
        SPINNING_TOP_PARAMS
    }

    fn with_params(params: &HashMap<&str, f64>) -> Result<Self> {
        Ok(Self {
            max_body_ratio: get_ratio(params, "max_body_ratio", helpers::SPINNING_TOP_BODY_RATIO)?,
            min_wick_factor: get_factor(
                params,
                "min_wick_factor",
                helpers::SPINNING_TOP_WICK_FACTOR,
            )?,
            doji_ratio: get_ratio(params, "doji_ratio", helpers::DOJI_BODY_RATIO)?,
        })
    }

    fn pattern_id_str() -> &'static str {
        PatternId::SPINNING_TOP.0
    }
}
