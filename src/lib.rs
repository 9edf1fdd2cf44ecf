//! # fno-analytics
//!
//! Candlestick pattern classification and option-chain analytics for F&O
//! market dashboards.
//!
//! ## Quick Start
//!
//! ```rust
//! use fno_analytics::prelude::*;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! // Classify the latest candle against the two before it
//! let prev2 = Candle::new(110.0, 111.0, 99.0, 100.0);
//! let prev = Candle::new(99.0, 99.5, 97.5, 98.5);
//! let candle = Candle::new(99.0, 108.0, 98.5, 107.0);
//!
//! let patterns = classify_candlestick_patterns(&candle, Some(&prev), Some(&prev2)).unwrap();
//! assert!(patterns.iter().any(|p| p.pattern_type == PatternId::MORNING_STAR));
//!
//! // Build a seeded option chain around the spot price
//! let mut rng = StdRng::seed_from_u64(7);
//! let chain = build_option_chain(25_450.0, 14.0, &mut rng).unwrap();
//! assert_eq!(chain.rows.len(), 21);
//! ```

pub mod chain;
pub mod detectors;
pub mod params;
pub mod scanner;

pub mod prelude {
    pub use crate::{
        // Option chain
        chain::{
            build_chains_parallel, build_option_chain, build_option_chain_from_seed,
            classify_scenario, AtmLeg, AtmSeed, ChainConfig, ChainError, ChainResult,
            ChainSummary, ChainTrend, LegAction, OptionChain, OptionChainGenerator, OptionLeg,
            PriceDetails, RowAnalysis, Scenario, ScenarioTags, SeedTrend, StepRule, StrikeRow,
        },
        // Top-level helpers
        classify_candlestick_patterns,
        // Detectors
        detectors::*,
        // Parameters
        params::{get_factor, get_ratio, ParamMeta, ParamType, ParameterizedDetector},
        primary_pattern,
        // Parallel
        scan_parallel,
        // Open extreme scanner
        scanner::{
            open_extreme_signal, scan_open_extremes, ExtremeHit, OpenExtreme, DEFAULT_PROXIMITY_PCT,
        },
        // Errors
        AnalyticsError,
        // Iterator
        BarPatterns,
        Bias,
        // Engine
        BuiltinDetector,
        // Types
        Candle,
        CandleSequence,
        Direction,
        // Core traits
        DynPatternDetector,
        EngineBuilder,
        Ohlc,
        OhlcExt,
        PatternDetector,
        PatternEngine,
        PatternId,
        PatternIterator,
        PatternMatch,
        Ratio,
        Result,
        ScanError,
        ScanResult,
    };
}

// ============================================================
// ERRORS
// ============================================================

pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Errors raised by the classifier and the chain generator
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalyticsError {
    #[error("Invalid value: {0}")]
    InvalidValue(&'static str),

    #[error("{field} = {value} out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid OHLC at index {index}: {reason}")]
    InvalidOhlc { index: usize, reason: &'static str },
}

impl AnalyticsError {
    /// True for errors caused by malformed caller input (bad candle
    /// geometry, non-positive spot or step). Callers skip and log these.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            AnalyticsError::InvalidValue(_)
                | AnalyticsError::NonPositive { .. }
                | AnalyticsError::InvalidOhlc { .. }
        )
    }
}

// ============================================================
// VALIDATED TYPES
// ============================================================

/// Normalized value in range 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Ratio(f64);

impl Ratio {
    /// Create a new Ratio, validating the value is in [0.0, 1.0]
    pub fn new(value: f64) -> Result<Self> {
        if value.is_nan() || value.is_infinite() {
            return Err(AnalyticsError::InvalidValue(
                "Ratio cannot be NaN or infinite",
            ));
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(AnalyticsError::OutOfRange {
                field: "Ratio",
                value,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(Self(value))
    }

    /// Create a Ratio from a compile-time constant (library internal use)
    #[doc(hidden)]
    pub const fn new_const(value: f64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }
}

impl serde::Serialize for Ratio {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(s)
    }
}

impl<'de> serde::Deserialize<'de> for Ratio {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let value = f64::deserialize(d)?;
        Ratio::new(value).map_err(serde::de::Error::custom)
    }
}

/// Check that a multiplier (a factor applied to a body or wick) is finite
/// and non-negative.
pub(crate) fn check_factor(field: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(AnalyticsError::InvalidConfig(format!(
            "{field} must be a finite non-negative number, got {value}"
        )));
    }
    Ok(())
}

// ============================================================
// OHLC TRAITS
// ============================================================

/// Core OHLC data trait
pub trait Ohlc {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
}

/// Blanket impl for references to dyn Ohlc
impl Ohlc for &dyn Ohlc {
    fn open(&self) -> f64 {
        (*self).open()
    }

    fn high(&self) -> f64 {
        (*self).high()
    }

    fn low(&self) -> f64 {
        (*self).low()
    }

    fn close(&self) -> f64 {
        (*self).close()
    }
}

/// Extension trait with computed properties for OHLC data
pub trait OhlcExt: Ohlc {
    #[inline]
    fn body(&self) -> f64 {
        (self.close() - self.open()).abs()
    }

    #[inline]
    fn range(&self) -> f64 {
        self.high() - self.low()
    }

    #[inline]
    fn upper_shadow(&self) -> f64 {
        self.high() - self.open().max(self.close())
    }

    #[inline]
    fn lower_shadow(&self) -> f64 {
        self.open().min(self.close()) - self.low()
    }

    #[inline]
    fn is_bullish(&self) -> bool {
        self.close() > self.open()
    }

    #[inline]
    fn is_bearish(&self) -> bool {
        self.close() < self.open()
    }

    /// Body as a fraction of the range, 0 for a zero-range candle
    #[inline]
    fn body_percent(&self) -> f64 {
        let range = self.range();
        if range > 0.0 {
            self.body() / range
        } else {
            0.0
        }
    }

    /// Price halfway between open and close
    #[inline]
    fn body_midpoint(&self) -> f64 {
        (self.open() + self.close()) / 2.0
    }

    /// Validate OHLC geometry: finite, non-negative and
    /// `low <= min(open, close) <= max(open, close) <= high`
    fn validate(&self) -> Result<()> {
        let (o, h, l, c) = (self.open(), self.high(), self.low(), self.close());
        if o.is_nan() || h.is_nan() || l.is_nan() || c.is_nan() {
            return Err(AnalyticsError::InvalidOhlc {
                index: 0,
                reason: "NaN in OHLC",
            });
        }
        if o.is_infinite() || h.is_infinite() || l.is_infinite() || c.is_infinite() {
            return Err(AnalyticsError::InvalidOhlc {
                index: 0,
                reason: "Infinite value in OHLC",
            });
        }
        if h < l {
            return Err(AnalyticsError::InvalidOhlc {
                index: 0,
                reason: "high < low",
            });
        }
        if l < 0.0 {
            return Err(AnalyticsError::InvalidOhlc {
                index: 0,
                reason: "negative low",
            });
        }
        if o < l || o > h || c < l || c > h {
            return Err(AnalyticsError::InvalidOhlc {
                index: 0,
                reason: "open/close outside [low, high]",
            });
        }
        Ok(())
    }
}

impl<T: Ohlc> OhlcExt for T {}

fn reindex(error: AnalyticsError, index: usize) -> AnalyticsError {
    match error {
        AnalyticsError::InvalidOhlc { reason, .. } => AnalyticsError::InvalidOhlc { index, reason },
        other => other,
    }
}

/// One trading interval's price action
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Candle {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    pub const fn new(open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            open,
            high,
            low,
            close,
        }
    }

    /// Create a candle, rejecting invalid OHLC geometry
    pub fn try_new(open: f64, high: f64, low: f64, close: f64) -> Result<Self> {
        let candle = Self::new(open, high, low, close);
        candle.validate()?;
        Ok(candle)
    }
}

impl Ohlc for Candle {
    fn open(&self) -> f64 {
        self.open
    }

    fn high(&self) -> f64 {
        self.high
    }

    fn low(&self) -> f64 {
        self.low
    }

    fn close(&self) -> f64 {
        self.close
    }
}

/// The candle being classified plus up to two candles immediately before it.
///
/// `prev2` only counts when `prev` is present.
#[derive(Debug)]
pub struct CandleSequence<'a, T> {
    pub current: &'a T,
    pub prev: Option<&'a T>,
    pub prev2: Option<&'a T>,
}

impl<T> Clone for CandleSequence<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for CandleSequence<'_, T> {}

impl<'a, T: Ohlc> CandleSequence<'a, T> {
    pub fn new(current: &'a T) -> Self {
        Self {
            current,
            prev: None,
            prev2: None,
        }
    }

    pub fn with_prev(mut self, prev: &'a T) -> Self {
        self.prev = Some(prev);
        self
    }

    pub fn with_prev2(mut self, prev2: &'a T) -> Self {
        self.prev2 = Some(prev2);
        self
    }

    /// Window ending at `bars[index]`, taking up to two earlier bars
    pub fn from_bars(bars: &'a [T], index: usize) -> Option<Self> {
        let current = bars.get(index)?;
        let prev = index.checked_sub(1).and_then(|i| bars.get(i));
        let prev2 = index.checked_sub(2).and_then(|i| bars.get(i));
        Some(Self {
            current,
            prev,
            prev2,
        })
    }

    #[inline]
    pub fn prev(&self) -> Option<&'a T> {
        self.prev
    }

    #[inline]
    pub fn prev2(&self) -> Option<&'a T> {
        self.prev.and(self.prev2)
    }

    /// Number of usable candles (1..=3)
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        1 + usize::from(self.prev().is_some()) + usize::from(self.prev2().is_some())
    }

    /// Validate every supplied candle. Errors carry 0 for the current
    /// candle, 1 for `prev` and 2 for `prev2`.
    pub fn validate(&self) -> Result<()> {
        self.current.validate()?;
        if let Some(prev) = self.prev {
            prev.validate().map_err(|e| reindex(e, 1))?;
        }
        if let Some(prev2) = self.prev2 {
            prev2.validate().map_err(|e| reindex(e, 2))?;
        }
        Ok(())
    }
}

// ============================================================
// PATTERN MATCH - result of classification (Copy, no allocations)
// ============================================================

/// Display name of a pattern type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PatternId(pub &'static str);

impl PatternId {
    pub const HAMMER: PatternId = PatternId("Hammer");
    pub const INVERSE_HAMMER: PatternId = PatternId("Inverse Hammer");
    pub const HANGING_MAN: PatternId = PatternId("Hanging Man");
    pub const SHOOTING_STAR: PatternId = PatternId("Shooting Star");
    pub const DRAGONFLY_DOJI: PatternId = PatternId("Dragonfly Doji");
    pub const GRAVESTONE_DOJI: PatternId = PatternId("Gravestone Doji");
    pub const DOJI: PatternId = PatternId("Doji");
    pub const BULLISH_ENGULFING: PatternId = PatternId("Bullish Engulfing");
    pub const BEARISH_ENGULFING: PatternId = PatternId("Bearish Engulfing");
    pub const PIERCING_LINE: PatternId = PatternId("Piercing Line");
    pub const DARK_CLOUD_COVER: PatternId = PatternId("Dark Cloud Cover");
    pub const MORNING_STAR: PatternId = PatternId("Morning Star");
    pub const EVENING_STAR: PatternId = PatternId("Evening Star");
    pub const THREE_WHITE_SOLDIERS: PatternId = PatternId("Three White Soldiers");
    pub const THREE_BLACK_CROWS: PatternId = PatternId("Three Black Crows");
    pub const SPINNING_TOP: PatternId = PatternId("Spinning Top");
    /// Sentinel returned when no rule fires
    pub const NO_PATTERN: PatternId = PatternId("No Pattern");

    /// Returns the string identifier
    #[inline]
    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Returns the direction a builtin pattern is tagged with.
    ///
    /// `None` for names this crate does not define (custom detectors).
    pub fn typical_direction(&self) -> Option<Direction> {
        match self.0 {
            "Hammer"
            | "Inverse Hammer"
            | "Dragonfly Doji"
            | "Bullish Engulfing"
            | "Piercing Line"
            | "Morning Star"
            | "Three White Soldiers" => Some(Direction::Bullish),
            "Hanging Man"
            | "Shooting Star"
            | "Gravestone Doji"
            | "Bearish Engulfing"
            | "Dark Cloud Cover"
            | "Evening Star"
            | "Three Black Crows" => Some(Direction::Bearish),
            "Doji" | "Spinning Top" | "No Pattern" => Some(Direction::Neutral),
            _ => None,
        }
    }

    /// Returns true if this pattern typically signals bullish moves
    pub fn is_typically_bullish(&self) -> bool {
        matches!(self.typical_direction(), Some(Direction::Bullish))
    }

    /// Returns true if this pattern typically signals bearish moves
    pub fn is_typically_bearish(&self) -> bool {
        matches!(self.typical_direction(), Some(Direction::Bearish))
    }
}

impl std::fmt::Display for PatternId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl serde::Serialize for PatternId {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(self.0)
    }
}

/// Direction/bias of a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Bullish,
    Neutral,
    Bearish,
}

impl Direction {
    #[inline]
    pub fn is_bullish(self) -> bool {
        matches!(self, Direction::Bullish)
    }

    #[inline]
    pub fn is_bearish(self) -> bool {
        matches!(self, Direction::Bearish)
    }

    #[inline]
    pub fn is_neutral(self) -> bool {
        matches!(self, Direction::Neutral)
    }
}

/// Result of classification - Copy, no allocations
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternMatch {
    pub pattern_type: PatternId,
    pub category: Direction,
}

impl PatternMatch {
    pub const fn new(pattern_type: PatternId, category: Direction) -> Self {
        Self {
            pattern_type,
            category,
        }
    }

    /// The `No Pattern` / neutral sentinel
    pub const fn no_pattern() -> Self {
        Self::new(PatternId::NO_PATTERN, Direction::Neutral)
    }

    #[inline]
    pub fn is_no_pattern(&self) -> bool {
        self.pattern_type == PatternId::NO_PATTERN
    }
}

/// Symbol-level buckets derived from one classification.
///
/// A symbol lands in the bullish bucket when any match is bullish and in
/// the bearish bucket when any match is bearish (both can hold at once).
/// It is neutral only when every match is a named neutral pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct Bias {
    pub bullish: bool,
    pub bearish: bool,
    pub neutral: bool,
}

impl Bias {
    pub fn from_matches(matches: &[PatternMatch]) -> Self {
        let bullish = matches.iter().any(|m| m.category.is_bullish());
        let bearish = matches.iter().any(|m| m.category.is_bearish());
        let neutral = !matches.is_empty()
            && matches.iter().all(|m| m.category.is_neutral())
            && !matches.iter().any(PatternMatch::is_no_pattern);
        Self {
            bullish,
            bearish,
            neutral,
        }
    }

    /// True when the classification produced only the sentinel
    pub fn is_empty(&self) -> bool {
        !(self.bullish || self.bearish || self.neutral)
    }
}

// ============================================================
// PATTERN DETECTOR TRAITS
// ============================================================

/// Generic pattern detector trait - for concrete types
pub trait PatternDetector: Send + Sync {
    fn id(&self) -> PatternId;
    fn direction(&self) -> Direction;
    fn min_bars(&self) -> usize;
    fn detect<T: Ohlc>(&self, seq: &CandleSequence<'_, T>) -> Option<PatternMatch>;

    fn validate_config(&self) -> Result<()> {
        Ok(())
    }

    /// The match this detector emits when its rule fires
    #[inline]
    fn matched(&self) -> Option<PatternMatch> {
        Some(PatternMatch::new(
            PatternDetector::id(self),
            PatternDetector::direction(self),
        ))
    }
}

/// Object-safe pattern detector trait - for custom detectors
pub trait DynPatternDetector: Send + Sync {
    fn id(&self) -> PatternId;
    fn min_bars(&self) -> usize;
    fn detect(&self, seq: &CandleSequence<'_, &dyn Ohlc>) -> Option<PatternMatch>;
    fn validate_config(&self) -> Result<()>;
}

impl<D: PatternDetector> DynPatternDetector for D {
    fn id(&self) -> PatternId {
        PatternDetector::id(self)
    }

    fn min_bars(&self) -> usize {
        PatternDetector::min_bars(self)
    }

    fn detect(&self, seq: &CandleSequence<'_, &dyn Ohlc>) -> Option<PatternMatch> {
        PatternDetector::detect(self, seq)
    }

    fn validate_config(&self) -> Result<()> {
        PatternDetector::validate_config(self)
    }
}

// ============================================================
// BUILTIN DETECTORS - generated via macro
// ============================================================

use detectors::*;

/// Macro to generate BuiltinDetector enum without boilerplate
macro_rules! define_builtin_detectors {
    (
        $(
            $variant:ident($detector:ty)
        ),* $(,)?
    ) => {
        /// All builtin detectors - fast path via enum dispatch
        #[derive(Debug, Clone)]
        pub enum BuiltinDetector {
            $($variant($detector)),*
        }

        impl BuiltinDetector {
            #[inline]
            pub fn detect<T: Ohlc>(&self, seq: &CandleSequence<'_, T>) -> Option<PatternMatch> {
                match self {
                    $(Self::$variant(d) => PatternDetector::detect(d, seq)),*
                }
            }

            #[inline]
            pub fn id(&self) -> PatternId {
                match self {
                    $(Self::$variant(d) => PatternDetector::id(d)),*
                }
            }

            #[inline]
            pub fn direction(&self) -> Direction {
                match self {
                    $(Self::$variant(d) => PatternDetector::direction(d)),*
                }
            }

            #[inline]
            pub fn min_bars(&self) -> usize {
                match self {
                    $(Self::$variant(d) => PatternDetector::min_bars(d)),*
                }
            }

            pub fn validate_config(&self) -> Result<()> {
                match self {
                    $(Self::$variant(d) => PatternDetector::validate_config(d)),*
                }
            }
        }
    };
}

define_builtin_detectors! {
    // Single bar
    Hammer(HammerDetector),
    InverseHammer(InverseHammerDetector),
    HangingMan(HangingManDetector),
    ShootingStar(ShootingStarDetector),
    DragonflyDoji(DragonflyDojiDetector),
    GravestoneDoji(GravestoneDojiDetector),
    Doji(DojiDetector),
    SpinningTop(SpinningTopDetector),

    // Two bar
    BullishEngulfing(BullishEngulfingDetector),
    BearishEngulfing(BearishEngulfingDetector),
    PiercingLine(PiercingLineDetector),
    DarkCloudCover(DarkCloudCoverDetector),

    // Three bar
    MorningStar(MorningStarDetector),
    EveningStar(EveningStarDetector),
    ThreeWhiteSoldiers(ThreeWhiteSoldiersDetector),
    ThreeBlackCrows(ThreeBlackCrowsDetector),
}

// ============================================================
// PATTERN ENGINE
// ============================================================

/// Engine configuration
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub pattern_filter: Option<Vec<PatternId>>,
    pub category_filter: Option<Direction>,
}

/// Main classification engine.
///
/// Detectors run in insertion order and every match is kept; the engine
/// never lets one rule suppress another.
pub struct PatternEngine {
    builtin: Vec<BuiltinDetector>,
    custom: Vec<Box<dyn DynPatternDetector>>,
    config: EngineConfig,
}

impl std::fmt::Debug for PatternEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternEngine")
            .field("builtin", &self.builtin)
            .field("custom", &self.custom.len())
            .field("config", &self.config)
            .finish()
    }
}

impl PatternEngine {
    /// Engine with every builtin rule in the standard evaluation order
    pub fn standard() -> Self {
        let builder = EngineBuilder::new().with_all_defaults();
        Self {
            builtin: builder.builtin,
            custom: Vec::new(),
            config: EngineConfig::default(),
        }
    }

    /// Pattern ids in evaluation order
    pub fn pattern_ids(&self) -> Vec<PatternId> {
        self.builtin
            .iter()
            .map(BuiltinDetector::id)
            .chain(self.custom.iter().map(|d| d.id()))
            .collect()
    }

    // ===========================================
    // LOW-LEVEL: single classification
    // ===========================================

    /// Classify the current candle of a sequence.
    ///
    /// Always returns at least one match; the `No Pattern` sentinel stands
    /// in when nothing fires.
    pub fn classify<T: Ohlc>(&self, seq: &CandleSequence<'_, T>) -> Result<Vec<PatternMatch>> {
        seq.validate()?;
        Ok(self.classify_unchecked(seq))
    }

    /// Classify `bars[index]` using the two bars before it as context.
    /// Errors report the offending bar's index in `bars`.
    pub fn classify_at<T: Ohlc>(&self, bars: &[T], index: usize) -> Result<Vec<PatternMatch>> {
        let seq = CandleSequence::from_bars(bars, index)
            .ok_or(AnalyticsError::InvalidValue("index out of bounds"))?;
        self.validate_bars(bars, index.saturating_sub(2)..index + 1)?;
        Ok(self.classify_unchecked(&seq))
    }

    // ===========================================
    // HIGH-LEVEL: Batch processing
    // ===========================================

    /// Classify every bar of a series, grouped by bar index.
    pub fn scan<T: Ohlc>(&self, bars: &[T]) -> Result<Vec<BarPatterns>> {
        self.validate_bars(bars, 0..bars.len())?;

        let grouped: Vec<BarPatterns> = (0..bars.len())
            .filter_map(|index| {
                let seq = CandleSequence::from_bars(bars, index)?;
                Some(BarPatterns {
                    index,
                    patterns: self.classify_unchecked(&seq),
                })
            })
            .collect();

        tracing::debug!(bars = bars.len(), "scanned candle series");
        Ok(grouped)
    }

    /// Create an iterator over bars with their patterns.
    pub fn iter<'a, T: Ohlc>(&'a self, bars: &'a [T]) -> PatternIterator<'a, T> {
        PatternIterator::new(self, bars)
    }

    // ===========================================
    // Internal helpers
    // ===========================================

    fn classify_unchecked<T: Ohlc>(&self, seq: &CandleSequence<'_, T>) -> Vec<PatternMatch> {
        let mut results = Vec::new();
        let available = seq.len();

        // Fast path: builtin detectors (enum dispatch, no vtable)
        for detector in &self.builtin {
            if available >= detector.min_bars() {
                if let Some(m) = detector.detect(seq) {
                    if self.should_include(&m) {
                        results.push(m);
                    }
                }
            }
        }

        // Slow path: custom detectors (vtable)
        if !self.custom.is_empty() {
            let current: &dyn Ohlc = seq.current;
            let prev: Option<&dyn Ohlc> = seq.prev().map(|b| b as &dyn Ohlc);
            let prev2: Option<&dyn Ohlc> = seq.prev2().map(|b| b as &dyn Ohlc);
            let dyn_seq = CandleSequence {
                current: &current,
                prev: prev.as_ref(),
                prev2: prev2.as_ref(),
            };
            for detector in &self.custom {
                if available >= detector.min_bars() {
                    if let Some(m) = detector.detect(&dyn_seq) {
                        if self.should_include(&m) {
                            results.push(m);
                        }
                    }
                }
            }
        }

        if results.is_empty() {
            results.push(PatternMatch::no_pattern());
        }

        tracing::trace!(matches = results.len(), "classified candle");
        results
    }

    fn should_include(&self, m: &PatternMatch) -> bool {
        if let Some(ref filter) = self.config.pattern_filter {
            if !filter.contains(&m.pattern_type) {
                return false;
            }
        }
        if let Some(category) = self.config.category_filter {
            if m.category != category {
                return false;
            }
        }
        true
    }

    fn validate_bars<T: Ohlc>(&self, bars: &[T], range: std::ops::Range<usize>) -> Result<()> {
        for i in range {
            if let Some(bar) = bars.get(i) {
                bar.validate().map_err(|e| reindex(e, i))?;
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        for d in &self.builtin {
            d.validate_config()?;
        }
        for d in &self.custom {
            d.validate_config()?;
        }
        Ok(())
    }
}

impl Default for PatternEngine {
    fn default() -> Self {
        Self::standard()
    }
}

fn default_engine() -> &'static PatternEngine {
    static ENGINE: std::sync::OnceLock<PatternEngine> = std::sync::OnceLock::new();
    ENGINE.get_or_init(PatternEngine::standard)
}

/// Classify a candle with the standard rule set.
///
/// `prev2` is ignored unless `prev` is supplied.
pub fn classify_candlestick_patterns<T: Ohlc>(
    candle: &T,
    prev: Option<&T>,
    prev2: Option<&T>,
) -> Result<Vec<PatternMatch>> {
    let seq = CandleSequence {
        current: candle,
        prev,
        prev2,
    };
    default_engine().classify(&seq)
}

/// First pattern of a single-candle classification (`No Pattern` when
/// nothing fires)
pub fn primary_pattern<T: Ohlc>(candle: &T) -> Result<PatternId> {
    let patterns = classify_candlestick_patterns(candle, None, None)?;
    Ok(patterns
        .first()
        .map(|m| m.pattern_type)
        .unwrap_or(PatternId::NO_PATTERN))
}

// ============================================================
// PATTERN ITERATOR
// ============================================================

/// Patterns found at a specific bar
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct BarPatterns {
    pub index: usize,
    pub patterns: Vec<PatternMatch>,
}

impl BarPatterns {
    pub fn bias(&self) -> Bias {
        Bias::from_matches(&self.patterns)
    }
}

/// Iterator over bars with their patterns
pub struct PatternIterator<'a, T: Ohlc> {
    engine: &'a PatternEngine,
    bars: &'a [T],
    current: usize,
}

impl<'a, T: Ohlc> PatternIterator<'a, T> {
    fn new(engine: &'a PatternEngine, bars: &'a [T]) -> Self {
        Self {
            engine,
            bars,
            current: 0,
        }
    }
}

impl<'a, T: Ohlc> Iterator for PatternIterator<'a, T> {
    type Item = Result<BarPatterns>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.bars.len() {
            return None;
        }

        let index = self.current;
        self.current += 1;

        Some(
            self.engine
                .classify_at(self.bars, index)
                .map(|patterns| BarPatterns { index, patterns }),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.bars.len().saturating_sub(self.current);
        (remaining, Some(remaining))
    }
}

impl<'a, T: Ohlc> ExactSizeIterator for PatternIterator<'a, T> {}

// ============================================================
// BUILDER
// ============================================================

/// Builder for creating PatternEngine instances
pub struct EngineBuilder {
    builtin: Vec<BuiltinDetector>,
    custom: Vec<Box<dyn DynPatternDetector>>,
    config: EngineConfig,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate an array of `BuiltinDetector` variants using `Default::default()` for each inner type.
macro_rules! builtin_defaults {
  ($($variant:ident),* $(,)?) => {
    [$(BuiltinDetector::$variant(Default::default())),*]
  };
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            builtin: Vec::new(),
            custom: Vec::new(),
            config: EngineConfig::default(),
        }
    }

    /// Add every builtin rule in the standard evaluation order:
    /// wick shapes, doji family, two-bar, three-bar, spinning top.
    pub fn with_all_defaults(mut self) -> Self {
        self.builtin.extend(builtin_defaults![
            Hammer,
            InverseHammer,
            HangingMan,
            ShootingStar,
            DragonflyDoji,
            GravestoneDoji,
            Doji,
            BullishEngulfing,
            BearishEngulfing,
            PiercingLine,
            DarkCloudCover,
            MorningStar,
            EveningStar,
            ThreeWhiteSoldiers,
            ThreeBlackCrows,
            SpinningTop,
        ]);
        self
    }

    /// Add only single-bar patterns with defaults (8)
    pub fn with_single_bar_defaults(mut self) -> Self {
        self.builtin.extend(builtin_defaults![
            Hammer,
            InverseHammer,
            HangingMan,
            ShootingStar,
            DragonflyDoji,
            GravestoneDoji,
            Doji,
            SpinningTop,
        ]);
        self
    }

    /// Add two-bar patterns with defaults (4)
    pub fn with_two_bar_defaults(mut self) -> Self {
        self.builtin.extend(builtin_defaults![
            BullishEngulfing,
            BearishEngulfing,
            PiercingLine,
            DarkCloudCover,
        ]);
        self
    }

    /// Add three-bar patterns with defaults (4)
    pub fn with_three_bar_defaults(mut self) -> Self {
        self.builtin.extend(builtin_defaults![
            MorningStar,
            EveningStar,
            ThreeWhiteSoldiers,
            ThreeBlackCrows,
        ]);
        self
    }

    /// Add a builtin detector
    #[allow(clippy::should_implement_trait)]
    pub fn add(mut self, detector: BuiltinDetector) -> Self {
        self.builtin.push(detector);
        self
    }

    /// Add with config validation
    pub fn add_checked(mut self, detector: BuiltinDetector) -> Result<Self> {
        detector.validate_config()?;
        self.builtin.push(detector);
        Ok(self)
    }

    /// Add a custom detector (slow path, runs after all builtins)
    pub fn add_custom<D: DynPatternDetector + 'static>(mut self, detector: D) -> Self {
        self.custom.push(Box::new(detector));
        self
    }

    /// Filter to specific patterns only
    pub fn only_patterns(mut self, ids: impl IntoIterator<Item = PatternId>) -> Self {
        self.config.pattern_filter = Some(ids.into_iter().collect());
        self
    }

    /// Keep only matches of one category
    pub fn only_category(mut self, category: Direction) -> Self {
        self.config.category_filter = Some(category);
        self
    }

    /// Build the engine
    pub fn build(self) -> Result<PatternEngine> {
        let engine = PatternEngine {
            builtin: self.builtin,
            custom: self.custom,
            config: self.config,
        };
        engine.validate()?;
        Ok(engine)
    }
}

// ============================================================
// PARALLEL SCANNING
// ============================================================

use rayon::prelude::*;

/// Result of scanning a single instrument
#[derive(Debug)]
pub struct ScanResult {
    pub symbol: String,
    pub bars: Vec<BarPatterns>,
}

impl ScanResult {
    /// Patterns on the most recent bar
    pub fn latest(&self) -> Option<&BarPatterns> {
        self.bars.last()
    }
}

/// Error from scanning a single instrument
#[derive(Debug)]
pub struct ScanError {
    pub symbol: String,
    pub error: AnalyticsError,
}

/// Parallel scanning of multiple instruments
pub fn scan_parallel<'a, T, I>(
    engine: &PatternEngine,
    instruments: I,
) -> (Vec<ScanResult>, Vec<ScanError>)
where
    T: Ohlc + Sync + 'a,
    I: IntoParallelIterator<Item = (&'a str, &'a [T])>,
{
    let results: Vec<_> = instruments
        .into_par_iter()
        .map(|(symbol, bars)| {
            engine
                .scan(bars)
                .map(|bars| ScanResult {
                    symbol: symbol.to_string(),
                    bars,
                })
                .map_err(|error| ScanError {
                    symbol: symbol.to_string(),
                    error,
                })
        })
        .collect();

    let mut successes = Vec::new();
    let mut errors = Vec::new();

    for result in results {
        match result {
            Ok(r) => successes.push(r),
            Err(e) => {
                tracing::warn!(symbol = %e.symbol, error = %e.error, "skipping instrument");
                errors.push(e);
            }
        }
    }

    (successes, errors)
}

// ============================================================
// TESTS
// ============================================================
