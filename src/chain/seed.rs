//! Backend-supplied ATM data point used to anchor a chain

use serde::{Deserialize, Serialize};

use crate::{AnalyticsError, Result};

/// Trend tag attached to a seeded leg. Anything other than `bull` / `bear`
/// is kept as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SeedTrend {
    Bull,
    Bear,
    #[default]
    Other,
}

impl SeedTrend {
    pub fn parse(tag: &str) -> Self {
        match tag {
            "bull" => SeedTrend::Bull,
            "bear" => SeedTrend::Bear,
            _ => SeedTrend::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeedTrend::Bull => "bull",
            SeedTrend::Bear => "bear",
            SeedTrend::Other => "",
        }
    }
}

impl Serialize for SeedTrend {
    fn serialize<S: serde::Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SeedTrend {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let tag = String::deserialize(d)?;
        Ok(SeedTrend::parse(&tag))
    }
}

/// One side (call or put) of the seeded ATM strike
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtmLeg {
    pub price: f64,
    pub oi: f64,
    pub doi: f64,
    #[serde(default)]
    pub trend: SeedTrend,
    #[serde(default)]
    pub strike: String,
    #[serde(default)]
    pub symbol: String,
}

impl AtmLeg {
    pub fn new(price: f64, oi: f64, doi: f64, trend: SeedTrend) -> Self {
        Self {
            price,
            oi,
            doi,
            trend,
            strike: String::new(),
            symbol: String::new(),
        }
    }

    fn validate(&self) -> Result<()> {
        if !(self.price.is_finite() && self.oi.is_finite() && self.doi.is_finite()) {
            return Err(AnalyticsError::InvalidValue("seed leg values must be finite"));
        }
        Ok(())
    }
}

/// Underlying OHLC + VWAP reported with the seed
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceDetails {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub vwap: f64,
}

/// Boolean screening flags the backend attaches to a seed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioTags {
    pub trending: bool,
    pub pcr_tested: bool,
    pub high_oi: bool,
    pub reversal: bool,
}

/// Real data for the ATM strike only; the rest of the chain is synthesized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtmSeed {
    pub atm: f64,
    #[serde(rename = "ce_atm_data")]
    pub ce: AtmLeg,
    #[serde(rename = "pe_atm_data")]
    pub pe: AtmLeg,
    #[serde(default)]
    pub price: PriceDetails,
    #[serde(default)]
    pub scenarios: ScenarioTags,
    #[serde(default)]
    pub symbol: String,
}

impl AtmSeed {
    pub fn new(atm: f64, ce: AtmLeg, pe: AtmLeg) -> Self {
        Self {
            atm,
            ce,
            pe,
            price: PriceDetails::default(),
            scenarios: ScenarioTags::default(),
            symbol: String::new(),
        }
    }

    /// Seed ATM rounded to a whole strike
    pub fn atm_strike(&self) -> Result<i64> {
        if !self.atm.is_finite() {
            return Err(AnalyticsError::InvalidValue("seed ATM must be finite"));
        }
        if self.atm <= 0.0 {
            return Err(AnalyticsError::NonPositive {
                field: "atm",
                value: self.atm,
            });
        }
        Ok(self.atm.round() as i64)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        self.atm_strike()?;
        self.ce.validate()?;
        self.pe.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_backend_shape() {
        let json = r#"{
            "atm": 25450,
            "ce_atm_data": {"price": 120.0, "oi": 50000.4, "doi": 8000, "trend": "bull", "strike": "25450", "symbol": "NIFTY"},
            "pe_atm_data": {"price": 95.5, "oi": 61000, "doi": -1200.6, "trend": "sideways", "strike": "25450", "symbol": "NIFTY"},
            "price": {"open": 25400, "high": 25500, "low": 25380, "close": 25460, "vwap": 25440},
            "scenarios": {"trending": true, "pcr_tested": false, "high_oi": true, "reversal": false},
            "symbol": "NIFTY"
        }"#;
        let seed: AtmSeed = serde_json::from_str(json).unwrap();
        assert_eq!(seed.atm_strike().unwrap(), 25_450);
        assert_eq!(seed.ce.trend, SeedTrend::Bull);
        assert_eq!(seed.pe.trend, SeedTrend::Other);
        assert!(seed.scenarios.high_oi);
        assert_eq!(seed.price.close, 25_460.0);
    }

    #[test]
    fn optional_sections_default() {
        let json = r#"{
            "atm": 100,
            "ce_atm_data": {"price": 1.0, "oi": 1, "doi": 1},
            "pe_atm_data": {"price": 1.0, "oi": 1, "doi": 1}
        }"#;
        let seed: AtmSeed = serde_json::from_str(json).unwrap();
        assert_eq!(seed.scenarios, ScenarioTags::default());
        assert_eq!(seed.ce.trend, SeedTrend::Other);
    }

    #[test]
    fn rejects_bad_atm() {
        let leg = AtmLeg::new(1.0, 1.0, 1.0, SeedTrend::Bull);
        assert!(AtmSeed::new(0.0, leg.clone(), leg.clone()).validate().is_err());
        assert!(AtmSeed::new(f64::NAN, leg.clone(), leg.clone()).validate().is_err());

        let bad_leg = AtmLeg::new(f64::INFINITY, 1.0, 1.0, SeedTrend::Bull);
        assert!(AtmSeed::new(100.0, bad_leg, leg).validate().is_err());
    }
}
