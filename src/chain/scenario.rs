//! Price / open-interest scenario classification

use serde::{Deserialize, Serialize};

use crate::Direction;

/// What the combination of price direction and open-interest change says
/// about positioning on one option leg
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scenario {
    #[serde(rename = "Long Build Up")]
    LongBuildUp,
    #[serde(rename = "Short Build Up")]
    ShortBuildUp,
    #[serde(rename = "Short Covering")]
    ShortCovering,
    /// Also rendered as "Long Liquidation"
    #[serde(rename = "Long Unwinding", alias = "Long Liquidation")]
    LongUnwinding,
    Neutral,
}

impl Scenario {
    pub fn label(self) -> &'static str {
        match self {
            Scenario::LongBuildUp => "Long Build Up",
            Scenario::ShortBuildUp => "Short Build Up",
            Scenario::ShortCovering => "Short Covering",
            Scenario::LongUnwinding => "Long Unwinding",
            Scenario::Neutral => "Neutral",
        }
    }

    /// Market sentiment the scenario implies
    pub fn sentiment(self) -> Direction {
        match self {
            Scenario::LongBuildUp | Scenario::ShortCovering => Direction::Bullish,
            Scenario::ShortBuildUp | Scenario::LongUnwinding => Direction::Bearish,
            Scenario::Neutral => Direction::Neutral,
        }
    }

    /// Classify from signed price and OI changes. Both signs must be strict;
    /// a flat price or flat OI is `Neutral`.
    pub fn from_deltas(price_change: f64, oi_change: f64) -> Self {
        match (price_change > 0.0, price_change < 0.0, oi_change > 0.0, oi_change < 0.0) {
            (true, _, true, _) => Scenario::LongBuildUp,
            (_, true, true, _) => Scenario::ShortBuildUp,
            (true, _, _, true) => Scenario::ShortCovering,
            (_, true, _, true) => Scenario::LongUnwinding,
            _ => Scenario::Neutral,
        }
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify one leg from its OI change and the current vs reference price.
///
/// The price counts as up when `current_price >= reference_price`, so an
/// unchanged price with rising OI is a build-up, not neutral.
pub fn classify_scenario(delta_oi: i64, current_price: f64, reference_price: f64) -> Scenario {
    let price_up = current_price >= reference_price;
    match (delta_oi.signum(), price_up) {
        (1, true) => Scenario::LongBuildUp,
        (1, false) => Scenario::ShortBuildUp,
        (-1, true) => Scenario::ShortCovering,
        (-1, false) => Scenario::LongUnwinding,
        _ => Scenario::Neutral,
    }
}
