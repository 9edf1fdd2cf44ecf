//! Option chain analytics
//!
//! Builds a ladder of strikes around the at-the-money strike with synthetic
//! call/put open interest, premiums and positioning scenarios, optionally
//! anchored on one real ATM data point ([`AtmSeed`]).
//!
//! Randomness is injected: every builder takes `&mut R where R: Rng`, so a
//! seeded [`rand::rngs::StdRng`] reproduces a chain exactly.

mod generator;
mod scenario;
mod seed;

pub use generator::{ChainConfig, OptionChainGenerator, StepRule};
pub use scenario::{classify_scenario, Scenario};
pub use seed::{AtmLeg, AtmSeed, PriceDetails, ScenarioTags, SeedTrend};

use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;

use crate::{AnalyticsError, Result};

// ============================================================
// CHAIN TYPES
// ============================================================

/// Trade tag derived from the OI change on a leg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LegAction {
    Buy,
    Sell,
    Hold,
}

impl LegAction {
    /// BUY above `threshold`, SELL below `-threshold`, otherwise HOLD
    pub fn from_delta_oi(delta_oi: i64, threshold: i64) -> Self {
        if delta_oi > threshold {
            LegAction::Buy
        } else if delta_oi < -threshold {
            LegAction::Sell
        } else {
            LegAction::Hold
        }
    }
}

/// Call or put side of one strike
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionLeg {
    pub ltp: f64,
    pub open_interest: i64,
    pub delta_oi: i64,
    pub implied_vol: f64,
    pub vwap: f64,
    pub volume: u64,
    pub scenario: Scenario,
    pub action: LegAction,
}

/// Put-vs-call reading of a strike or a whole chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChainTrend {
    Bullish,
    Bearish,
}

impl ChainTrend {
    /// Bullish when put writers add more OI than call writers
    pub fn from_delta_oi(ce_delta_oi: i64, pe_delta_oi: i64) -> Self {
        if pe_delta_oi > ce_delta_oi {
            ChainTrend::Bullish
        } else {
            ChainTrend::Bearish
        }
    }
}

/// Per-strike put/call comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowAnalysis {
    /// `pe.oi / ce.oi`, 0 when the call OI is 0
    pub pcr_oi: f64,
    /// `pe.doi / ce.doi`, 0 when the call ΔOI is 0
    pub pcr_doi: f64,
    pub trend: ChainTrend,
    pub oi_diff: i64,
    pub doi_diff: i64,
}

impl RowAnalysis {
    pub fn new(ce: &OptionLeg, pe: &OptionLeg) -> Self {
        Self {
            pcr_oi: ratio_or_zero(pe.open_interest, ce.open_interest),
            pcr_doi: ratio_or_zero(pe.delta_oi, ce.delta_oi),
            trend: ChainTrend::from_delta_oi(ce.delta_oi, pe.delta_oi),
            oi_diff: pe.open_interest.saturating_sub(ce.open_interest),
            doi_diff: pe.delta_oi.saturating_sub(ce.delta_oi),
        }
    }
}

fn ratio_or_zero(num: i64, den: i64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// One strike of the ladder
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrikeRow {
    pub strike: i64,
    pub ce: OptionLeg,
    pub pe: OptionLeg,
    pub is_atm: bool,
    pub analysis: RowAnalysis,
}

impl StrikeRow {
    pub fn new(strike: i64, ce: OptionLeg, pe: OptionLeg, is_atm: bool) -> Self {
        let analysis = RowAnalysis::new(&ce, &pe);
        Self {
            strike,
            ce,
            pe,
            is_atm,
            analysis,
        }
    }
}

/// Strike ladder, ascending, with exactly one ATM row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionChain {
    pub atm_strike: i64,
    pub step: i64,
    pub spot: f64,
    pub rows: Vec<StrikeRow>,
}

/// Chain-wide aggregates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainSummary {
    /// Strike with the largest call ΔOI (first row wins ties)
    pub best_ce_strike: i64,
    /// Strike with the largest put ΔOI (first row wins ties)
    pub best_pe_strike: i64,
    /// `Σ pe.oi / Σ ce.oi`, 0 when total call OI is 0
    pub pcr_oi: f64,
    /// Trend read at the ATM strike
    pub trend: ChainTrend,
}

impl OptionChain {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn atm_row(&self) -> Option<&StrikeRow> {
        self.rows.iter().find(|r| r.is_atm)
    }

    /// Aggregates over the full ladder. `None` for an empty chain.
    pub fn summary(&self) -> Option<ChainSummary> {
        let first = self.rows.first()?;
        let mut best_ce = first;
        let mut best_pe = first;
        let (mut total_ce, mut total_pe) = (0i64, 0i64);

        for row in &self.rows {
            if row.ce.delta_oi > best_ce.ce.delta_oi {
                best_ce = row;
            }
            if row.pe.delta_oi > best_pe.pe.delta_oi {
                best_pe = row;
            }
            total_ce = total_ce.saturating_add(row.ce.open_interest);
            total_pe = total_pe.saturating_add(row.pe.open_interest);
        }

        let reference = self.atm_row().unwrap_or(first);
        Some(ChainSummary {
            best_ce_strike: best_ce.strike,
            best_pe_strike: best_pe.strike,
            pcr_oi: ratio_or_zero(total_pe, total_ce),
            trend: reference.analysis.trend,
        })
    }
}

// ============================================================
// ENTRY POINTS
// ============================================================

/// Build a live-style chain (default preset) around `spot`
pub fn build_option_chain<R: Rng + ?Sized>(
    spot: f64,
    base_volatility: f64,
    rng: &mut R,
) -> Result<OptionChain> {
    OptionChainGenerator::default().build(spot, base_volatility, rng)
}

/// Build a chain anchored on a backend ATM seed (seeded preset)
pub fn build_option_chain_from_seed<R: Rng + ?Sized>(
    seed: &AtmSeed,
    spot: f64,
    rng: &mut R,
) -> Result<OptionChain> {
    OptionChainGenerator::new(ChainConfig::seeded()).build_from_seed(seed, spot, rng)
}

// ============================================================
// PARALLEL BUILDING
// ============================================================

/// Chain built for one symbol
#[derive(Debug)]
pub struct ChainResult {
    pub symbol: String,
    pub chain: OptionChain,
}

/// Error from building one symbol's chain
#[derive(Debug)]
pub struct ChainError {
    pub symbol: String,
    pub error: AnalyticsError,
}

/// Build one chain per `(symbol, spot)` in parallel.
///
/// Request `i` draws from `StdRng::seed_from_u64(seed + i)`, so the output
/// does not depend on thread scheduling.
pub fn build_chains_parallel(
    generator: &OptionChainGenerator,
    requests: &[(&str, f64)],
    base_volatility: f64,
    seed: u64,
) -> (Vec<ChainResult>, Vec<ChainError>) {
    let results: Vec<_> = requests
        .par_iter()
        .enumerate()
        .map(|(i, &(symbol, spot))| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
            generator
                .build(spot, base_volatility, &mut rng)
                .map(|chain| ChainResult {
                    symbol: symbol.to_string(),
                    chain,
                })
                .map_err(|error| ChainError {
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
                tracing::warn!(symbol = %e.symbol, error = %e.error, "skipping chain");
                errors.push(e);
            }
        }
    }

    (successes, errors)
}
