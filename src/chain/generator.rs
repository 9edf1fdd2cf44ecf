//! Strike ladder synthesis

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{
    classify_scenario, AtmLeg, AtmSeed, LegAction, OptionChain, OptionLeg, Scenario, SeedTrend,
    StrikeRow,
};
use crate::{AnalyticsError, Result};

// ============================================================
// CONFIGURATION
// ============================================================

/// Distance between adjacent strikes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepRule {
    Fixed(i64),
    /// 100 above spot 10 000, 50 above 1 000, otherwise 10
    BySpot,
}

impl StepRule {
    pub fn resolve(self, spot: f64) -> Result<i64> {
        let step = match self {
            StepRule::Fixed(step) => step,
            StepRule::BySpot if spot > 10_000.0 => 100,
            StepRule::BySpot if spot > 1_000.0 => 50,
            StepRule::BySpot => 10,
        };
        if step <= 0 {
            return Err(AnalyticsError::NonPositive {
                field: "step",
                value: step as f64,
            });
        }
        Ok(step)
    }
}

/// Shape of a synthetic chain. One parameterized generator covers both the
/// live preset and the seeded preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Strikes on each side of ATM
    pub strike_count: u32,
    pub step: StepRule,
    /// Open interest at zero distance, before noise
    pub base_oi: f64,
    /// Exponential decay of OI per unit of relative distance
    pub oi_decay: f64,
    pub oi_noise: f64,
    /// ΔOI is drawn uniformly from `[-doi_span/2, doi_span/2)`
    pub doi_span: f64,
    pub premium_noise: f64,
    /// Premium floor
    pub min_premium: f64,
    pub iv_noise: f64,
    pub volume_max: f64,
    /// |ΔOI| above this tags a leg BUY / SELL
    pub action_threshold: i64,
    /// IV base used for every row when building from a seed
    pub seed_base_iv: f64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            strike_count: 10,
            step: StepRule::Fixed(50),
            base_oi: 500_000.0,
            oi_decay: 20.0,
            oi_noise: 50_000.0,
            doi_span: 20_000.0,
            premium_noise: 50.0,
            min_premium: 0.05,
            iv_noise: 2.0,
            volume_max: 100_000.0,
            action_threshold: 5_000,
            seed_base_iv: 15.0,
        }
    }
}

impl ChainConfig {
    /// Preset for chains anchored on backend ATM data
    pub fn seeded() -> Self {
        Self {
            step: StepRule::BySpot,
            base_oi: 300_000.0,
            oi_noise: 30_000.0,
            doi_span: 15_000.0,
            premium_noise: 30.0,
            volume_max: 80_000.0,
            ..Self::default()
        }
    }

    pub fn with_strike_count(mut self, strike_count: u32) -> Self {
        self.strike_count = strike_count;
        self
    }

    pub fn with_step(mut self, step: StepRule) -> Self {
        self.step = step;
        self
    }

    /// Noiseless OI term at a relative distance from spot. Non-increasing
    /// in `distance` for any non-negative decay.
    #[inline]
    pub fn expected_open_interest(&self, distance: f64) -> f64 {
        self.base_oi * (-self.oi_decay * distance).exp()
    }

    pub fn validate(&self) -> Result<()> {
        if self.strike_count == 0 {
            return Err(AnalyticsError::InvalidConfig(
                "strike_count must be at least 1".into(),
            ));
        }
        if let StepRule::Fixed(step) = self.step {
            if step <= 0 {
                return Err(AnalyticsError::NonPositive {
                    field: "step",
                    value: step as f64,
                });
            }
        }
        for (field, value) in [("base_oi", self.base_oi), ("min_premium", self.min_premium)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(AnalyticsError::InvalidConfig(format!(
                    "{field} must be positive, got {value}"
                )));
            }
        }
        for (field, value) in [
            ("oi_decay", self.oi_decay),
            ("oi_noise", self.oi_noise),
            ("doi_span", self.doi_span),
            ("premium_noise", self.premium_noise),
            ("iv_noise", self.iv_noise),
            ("volume_max", self.volume_max),
            ("seed_base_iv", self.seed_base_iv),
        ] {
            crate::check_factor(field, value)?;
        }
        if self.action_threshold < 0 {
            return Err(AnalyticsError::InvalidConfig(format!(
                "action_threshold must be non-negative, got {}",
                self.action_threshold
            )));
        }
        Ok(())
    }
}

// ============================================================
// GENERATOR
// ============================================================

#[derive(Debug, Clone, Copy)]
enum Side {
    Call,
    Put,
}

impl Side {
    fn intrinsic(self, strike: f64, spot: f64) -> f64 {
        match self {
            Side::Call => (spot - strike).max(0.0),
            Side::Put => (strike - spot).max(0.0),
        }
    }
}

/// ATM volume in seed mode is `floor(SEED_VOLUME_FLOOR + U * SEED_VOLUME_SPAN)`
const SEED_VOLUME_FLOOR: f64 = 50_000.0;
const SEED_VOLUME_SPAN: f64 = 100_000.0;
const SEED_VWAP_FACTOR: f64 = 1.001;

/// Builds option chains from a [`ChainConfig`]
#[derive(Debug, Clone, Default)]
pub struct OptionChainGenerator {
    config: ChainConfig,
}

impl OptionChainGenerator {
    pub fn new(config: ChainConfig) -> Self {
        Self { config }
    }

    /// Generator with a validated config
    pub fn try_new(config: ChainConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Synthesize a full ladder around `spot`
    pub fn build<R: Rng + ?Sized>(
        &self,
        spot: f64,
        base_volatility: f64,
        rng: &mut R,
    ) -> Result<OptionChain> {
        check_spot(spot)?;
        self.config.validate()?;
        let step = self.config.step.resolve(spot)?;
        let atm_strike = ((spot / step as f64).round() as i64)
            .checked_mul(step)
            .ok_or(AnalyticsError::InvalidValue("spot is too large for the strike ladder"))?;

        let rows = self
            .strikes(atm_strike, step)?
            .into_iter()
            .map(|strike| {
                let ce = self.synth_leg(Side::Call, strike, spot, base_volatility, rng);
                let pe = self.synth_leg(Side::Put, strike, spot, base_volatility, rng);
                StrikeRow::new(strike, ce, pe, strike == atm_strike)
            })
            .collect();

        tracing::debug!(spot, atm_strike, step, "built option chain");
        Ok(OptionChain {
            atm_strike,
            step,
            spot,
            rows,
        })
    }

    /// Ladder centred on the seed's ATM. The ATM row carries the seed's
    /// price, rounded OI and ΔOI verbatim; every other row is synthesized.
    pub fn build_from_seed<R: Rng + ?Sized>(
        &self,
        seed: &AtmSeed,
        spot: f64,
        rng: &mut R,
    ) -> Result<OptionChain> {
        check_spot(spot)?;
        self.config.validate()?;
        seed.validate()?;
        let step = self.config.step.resolve(spot)?;
        let atm_strike = seed.atm_strike()?;
        let base_iv = self.config.seed_base_iv;

        let rows = self
            .strikes(atm_strike, step)?
            .into_iter()
            .map(|strike| {
                if strike == atm_strike {
                    let distance = relative_distance(strike, spot);
                    let ce = self.seeded_leg(&seed.ce, Side::Call, distance, rng);
                    let pe = self.seeded_leg(&seed.pe, Side::Put, distance, rng);
                    StrikeRow::new(strike, ce, pe, true)
                } else {
                    let ce = self.synth_leg(Side::Call, strike, spot, base_iv, rng);
                    let pe = self.synth_leg(Side::Put, strike, spot, base_iv, rng);
                    StrikeRow::new(strike, ce, pe, false)
                }
            })
            .collect();

        tracing::debug!(spot, atm_strike, step, symbol = %seed.symbol, "built seeded option chain");
        Ok(OptionChain {
            atm_strike,
            step,
            spot,
            rows,
        })
    }

    /// Every strike of the ladder, lowest first. Fails when a strike
    /// leaves the `i64` range.
    fn strikes(&self, atm_strike: i64, step: i64) -> Result<Vec<i64>> {
        let n = i64::from(self.config.strike_count);
        (-n..=n)
            .map(|i| {
                i.checked_mul(step)
                    .and_then(|offset| atm_strike.checked_add(offset))
                    .ok_or(AnalyticsError::InvalidValue(
                        "strike ladder overflows around the ATM strike",
                    ))
            })
            .collect()
    }

    fn synth_leg<R: Rng + ?Sized>(
        &self,
        side: Side,
        strike: i64,
        spot: f64,
        base_iv: f64,
        rng: &mut R,
    ) -> OptionLeg {
        let c = &self.config;
        let distance = relative_distance(strike, spot);

        let open_interest =
            (c.expected_open_interest(distance) + rng.gen::<f64>() * c.oi_noise).floor() as i64;
        let delta_oi = ((rng.gen::<f64>() - 0.5) * c.doi_span).floor() as i64;
        let implied_vol = base_iv + distance * 100.0 + rng.gen::<f64>() * c.iv_noise;
        let ltp = (side.intrinsic(strike as f64, spot) + rng.gen::<f64>() * c.premium_noise)
            .max(c.min_premium);
        let vwap = ltp * (1.0 + (rng.gen::<f64>() - 0.5) * 0.02);
        let volume = (rng.gen::<f64>() * c.volume_max).floor() as u64;
        let reference = ltp * (1.0 + (rng.gen::<f64>() - 0.5) * 0.01);

        OptionLeg {
            ltp,
            open_interest,
            delta_oi,
            implied_vol,
            vwap,
            volume,
            scenario: classify_scenario(delta_oi, ltp, reference),
            action: LegAction::from_delta_oi(delta_oi, c.action_threshold),
        }
    }

    fn seeded_leg<R: Rng + ?Sized>(
        &self,
        leg: &AtmLeg,
        side: Side,
        distance: f64,
        rng: &mut R,
    ) -> OptionLeg {
        let delta_oi = leg.doi.round() as i64;
        let scenario = match (side, &leg.trend) {
            (Side::Call, SeedTrend::Bull) => Scenario::LongBuildUp,
            (Side::Call, _) => Scenario::ShortBuildUp,
            (Side::Put, SeedTrend::Bear) => Scenario::ShortBuildUp,
            (Side::Put, _) => Scenario::LongBuildUp,
        };

        OptionLeg {
            ltp: leg.price,
            open_interest: leg.oi.round() as i64,
            delta_oi,
            implied_vol: self.config.seed_base_iv + distance * 100.0,
            vwap: leg.price * SEED_VWAP_FACTOR,
            volume: (SEED_VOLUME_FLOOR + rng.gen::<f64>() * SEED_VOLUME_SPAN).floor() as u64,
            scenario,
            action: LegAction::from_delta_oi(delta_oi, self.config.action_threshold),
        }
    }
}

fn check_spot(spot: f64) -> Result<()> {
    if spot.is_nan() {
        return Err(AnalyticsError::InvalidValue("spot cannot be NaN"));
    }
    if !spot.is_finite() || spot <= 0.0 {
        return Err(AnalyticsError::NonPositive {
            field: "spot",
            value: spot,
        });
    }
    Ok(())
}

#[inline]
fn relative_distance(strike: i64, spot: f64) -> f64 {
    (strike as f64 - spot).abs() / spot
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn step_rule_by_spot() {
        assert_eq!(StepRule::BySpot.resolve(25_450.0).unwrap(), 100);
        assert_eq!(StepRule::BySpot.resolve(10_000.0).unwrap(), 50);
        assert_eq!(StepRule::BySpot.resolve(2_500.0).unwrap(), 50);
        assert_eq!(StepRule::BySpot.resolve(1_000.0).unwrap(), 10);
        assert!(StepRule::Fixed(0).resolve(100.0).is_err());
        assert!(StepRule::Fixed(-50).resolve(100.0).is_err());
    }

    #[test]
    fn atm_rounds_to_nearest_step() {
        let mut rng = StdRng::seed_from_u64(1);
        let chain = OptionChainGenerator::default()
            .build(25_474.0, 14.0, &mut rng)
            .unwrap();
        assert_eq!(chain.atm_strike, 25_450);
        assert_eq!(chain.rows.first().map(|r| r.strike), Some(24_950));
        assert_eq!(chain.rows.last().map(|r| r.strike), Some(25_950));

        let chain = OptionChainGenerator::default()
            .build(25_475.0, 14.0, &mut rng)
            .unwrap();
        assert_eq!(chain.atm_strike, 25_500);
    }

    #[test]
    fn rejects_bad_spot_and_step() {
        let mut rng = StdRng::seed_from_u64(1);
        let generator = OptionChainGenerator::default();
        assert!(matches!(
            generator.build(0.0, 14.0, &mut rng),
            Err(AnalyticsError::NonPositive { field: "spot", .. })
        ));
        assert!(generator.build(f64::NAN, 14.0, &mut rng).is_err());
        assert!(generator.build(f64::INFINITY, 14.0, &mut rng).is_err());

        let fixed_zero = ChainConfig::default().with_step(StepRule::Fixed(0));
        assert!(OptionChainGenerator::try_new(fixed_zero).is_err());
    }

    #[test]
    fn non_positive_fixed_step_is_invalid_input() {
        let mut rng = StdRng::seed_from_u64(1);
        for step in [0, -50] {
            let generator =
                OptionChainGenerator::new(ChainConfig::default().with_step(StepRule::Fixed(step)));
            let err = generator.build(25_450.0, 14.0, &mut rng).unwrap_err();
            assert!(matches!(err, AnalyticsError::NonPositive { field: "step", .. }));
            assert!(err.is_invalid_input());
        }
    }

    #[test]
    fn oversized_spot_is_an_error() {
        let mut rng = StdRng::seed_from_u64(1);
        let generator = OptionChainGenerator::default();
        for spot in [1.0e19, f64::MAX] {
            let err = generator.build(spot, 14.0, &mut rng).unwrap_err();
            assert!(err.is_invalid_input());
        }

        // ATM fits in i64 but the upper strikes do not
        let wide = OptionChainGenerator::new(
            ChainConfig::default()
                .with_strike_count(1_000)
                .with_step(StepRule::Fixed(100)),
        );
        assert!(matches!(
            wide.build(9.223_372_036_854_7e18, 14.0, &mut rng),
            Err(AnalyticsError::InvalidValue(_))
        ));

        let seed = AtmSeed::new(
            1.0e19,
            AtmLeg::new(120.0, 50_000.0, 8_000.0, SeedTrend::Bull),
            AtmLeg::new(88.0, 64_000.0, 3_000.0, SeedTrend::Bear),
        );
        let seeded = OptionChainGenerator::new(ChainConfig::seeded());
        assert!(seeded
            .build_from_seed(&seed, 25_470.0, &mut rng)
            .unwrap_err()
            .is_invalid_input());
    }

    #[test]
    fn config_validation() {
        assert!(ChainConfig::default().validate().is_ok());
        assert!(ChainConfig::seeded().validate().is_ok());
        assert!(ChainConfig::default().with_strike_count(0).validate().is_err());

        let negative_noise = ChainConfig {
            oi_noise: -1.0,
            ..ChainConfig::default()
        };
        assert!(negative_noise.validate().is_err());

        let zero_floor = ChainConfig {
            min_premium: 0.0,
            ..ChainConfig::default()
        };
        assert!(zero_floor.validate().is_err());
    }

    #[test]
    fn expected_oi_peaks_at_zero_distance() {
        let config = ChainConfig::default();
        assert_eq!(config.expected_open_interest(0.0), 500_000.0);
        assert!(config.expected_open_interest(0.01) < config.expected_open_interest(0.0));
    }

    #[test]
    fn premium_floor_and_intrinsic() {
        let mut rng = StdRng::seed_from_u64(9);
        let chain = OptionChainGenerator::default()
            .build(25_450.0, 14.0, &mut rng)
            .unwrap();
        for row in &chain.rows {
            let strike = row.strike as f64;
            assert!(row.ce.ltp >= (25_450.0 - strike).max(0.05));
            assert!(row.pe.ltp >= (strike - 25_450.0).max(0.05));
            assert!(row.ce.open_interest >= 0 && row.pe.open_interest >= 0);
            assert!(row.ce.delta_oi >= -10_000 && row.ce.delta_oi < 10_000);
        }
    }

    #[test]
    fn seeded_atm_row_is_verbatim() {
        let seed = AtmSeed::new(
            25_500.0,
            AtmLeg::new(120.0, 50_000.4, 8_000.0, SeedTrend::Bull),
            AtmLeg::new(95.0, 61_000.0, -1_200.6, SeedTrend::Other),
        );
        let mut rng = StdRng::seed_from_u64(3);
        let chain = OptionChainGenerator::new(ChainConfig::seeded())
            .build_from_seed(&seed, 25_450.0, &mut rng)
            .unwrap();

        assert_eq!(chain.step, 100);
        assert_eq!(chain.atm_strike, 25_500);
        let atm = chain.atm_row().unwrap();
        assert_eq!(atm.strike, 25_500);
        assert_eq!(atm.ce.ltp, 120.0);
        assert_eq!(atm.ce.open_interest, 50_000);
        assert_eq!(atm.ce.delta_oi, 8_000);
        assert_eq!(atm.ce.scenario, Scenario::LongBuildUp);
        assert_eq!(atm.ce.action, LegAction::Buy);
        assert_eq!(atm.pe.delta_oi, -1_201);
        assert_eq!(atm.pe.scenario, Scenario::LongBuildUp);
        assert!((atm.ce.vwap - 120.12).abs() < 1e-9);
        assert!(atm.ce.volume >= 50_000 && atm.ce.volume < 150_000);
        assert_eq!(chain.rows.iter().filter(|r| r.is_atm).count(), 1);
    }

    #[test]
    fn seeded_scenarios_follow_trend_tags() {
        let seed = AtmSeed::new(
            100.0,
            AtmLeg::new(5.0, 10.0, 1.0, SeedTrend::Bear),
            AtmLeg::new(5.0, 10.0, 1.0, SeedTrend::Bear),
        );
        let mut rng = StdRng::seed_from_u64(3);
        let chain = build_seeded(&seed, &mut rng);
        let atm = chain.atm_row().unwrap();
        assert_eq!(atm.ce.scenario, Scenario::ShortBuildUp);
        assert_eq!(atm.pe.scenario, Scenario::ShortBuildUp);
        assert_eq!(chain.step, 10);
    }

    fn build_seeded(seed: &AtmSeed, rng: &mut StdRng) -> OptionChain {
        OptionChainGenerator::new(ChainConfig::seeded())
            .build_from_seed(seed, 100.0, rng)
            .unwrap()
    }
}
