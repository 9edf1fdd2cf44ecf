//! Open = Low / Open = High intraday scanner
//!
//! A session that opens at (or within a small percentage of) its low has
//! had buyers in control from the first print; opening at the high is the
//! bearish mirror.

use serde::Serialize;

use crate::{check_factor, reindex, AnalyticsError, Direction, Ohlc, OhlcExt, Result};

/// Default proximity threshold, in percent of the open
pub const DEFAULT_PROXIMITY_PCT: f64 = 0.5;

/// Which extreme the open sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OpenExtreme {
    #[serde(rename = "Open = Low")]
    OpenLow,
    #[serde(rename = "Open = High")]
    OpenHigh,
}

impl OpenExtreme {
    pub fn direction(self) -> Direction {
        match self {
            OpenExtreme::OpenLow => Direction::Bullish,
            OpenExtreme::OpenHigh => Direction::Bearish,
        }
    }

    /// `|open - extreme| / open * 100`
    pub fn proximity_pct<T: Ohlc>(self, candle: &T) -> f64 {
        let extreme = match self {
            OpenExtreme::OpenLow => candle.low(),
            OpenExtreme::OpenHigh => candle.high(),
        };
        (candle.open() - extreme).abs() / candle.open() * 100.0
    }
}

/// A symbol whose open sits within the threshold of one extreme
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtremeHit {
    pub symbol: String,
    pub extreme: OpenExtreme,
    pub proximity_pct: f64,
}

fn check_candle<T: Ohlc>(candle: &T) -> Result<()> {
    candle.validate()?;
    if candle.open() <= 0.0 {
        return Err(AnalyticsError::NonPositive {
            field: "open",
            value: candle.open(),
        });
    }
    Ok(())
}

/// Closest extreme within `threshold_pct` of the open, with its proximity.
/// When both qualify the nearer one wins, `OpenLow` on a tie.
pub fn open_extreme_signal<T: Ohlc>(
    candle: &T,
    threshold_pct: f64,
) -> Result<Option<(OpenExtreme, f64)>> {
    check_factor("threshold_pct", threshold_pct)?;
    check_candle(candle)?;

    let low = OpenExtreme::OpenLow.proximity_pct(candle);
    let high = OpenExtreme::OpenHigh.proximity_pct(candle);

    let signal = [(OpenExtreme::OpenLow, low), (OpenExtreme::OpenHigh, high)]
        .into_iter()
        .filter(|&(_, p)| p <= threshold_pct)
        .min_by(|a, b| a.1.total_cmp(&b.1));
    Ok(signal)
}

/// Symbols whose open is within `threshold_pct` of `extreme`, nearest
/// first. Errors report the offending candle's position in `quotes`.
pub fn scan_open_extremes<S, T>(
    quotes: &[(S, T)],
    extreme: OpenExtreme,
    threshold_pct: f64,
) -> Result<Vec<ExtremeHit>>
where
    S: AsRef<str>,
    T: Ohlc,
{
    check_factor("threshold_pct", threshold_pct)?;

    let mut hits = Vec::new();
    for (i, (symbol, candle)) in quotes.iter().enumerate() {
        check_candle(candle).map_err(|e| reindex(e, i))?;
        let proximity_pct = extreme.proximity_pct(candle);
        if proximity_pct <= threshold_pct {
            hits.push(ExtremeHit {
                symbol: symbol.as_ref().to_string(),
                extreme,
                proximity_pct,
            });
        }
    }

    hits.sort_by(|a, b| a.proximity_pct.total_cmp(&b.proximity_pct));
    tracing::debug!(?extreme, scanned = quotes.len(), hits = hits.len(), "open extreme scan");
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Candle;

    #[test]
    fn open_at_low_is_bullish() {
        let c = Candle::new(100.0, 104.0, 100.0, 103.0);
        let (extreme, proximity) = open_extreme_signal(&c, DEFAULT_PROXIMITY_PCT)
            .unwrap()
            .unwrap();
        assert_eq!(extreme, OpenExtreme::OpenLow);
        assert_eq!(proximity, 0.0);
        assert!(extreme.direction().is_bullish());
    }

    #[test]
    fn open_near_high_is_bearish() {
        let c = Candle::new(100.0, 100.4, 95.0, 96.0);
        let (extreme, proximity) = open_extreme_signal(&c, DEFAULT_PROXIMITY_PCT)
            .unwrap()
            .unwrap();
        assert_eq!(extreme, OpenExtreme::OpenHigh);
        assert!((proximity - 0.4).abs() < 1e-9);
    }

    #[test]
    fn mid_range_open_has_no_signal() {
        let c = Candle::new(100.0, 105.0, 95.0, 101.0);
        assert_eq!(open_extreme_signal(&c, DEFAULT_PROXIMITY_PCT).unwrap(), None);
    }

    #[test]
    fn scan_sorts_by_proximity() {
        let quotes = [
            ("TCS", Candle::new(100.0, 103.0, 99.7, 102.0)),
            ("INFY", Candle::new(100.0, 103.0, 100.0, 102.0)),
            ("WIPRO", Candle::new(100.0, 103.0, 97.0, 102.0)),
            ("HDFC", Candle::new(100.0, 103.0, 99.9, 102.0)),
        ];
        let hits = scan_open_extremes(&quotes, OpenExtreme::OpenLow, DEFAULT_PROXIMITY_PCT).unwrap();
        let symbols: Vec<_> = hits.iter().map(|h| h.symbol.as_str()).collect();
        assert_eq!(symbols, ["INFY", "HDFC", "TCS"]);
    }

    #[test]
    fn scan_reports_bad_candle_position() {
        let quotes = [
            ("OK", Candle::new(100.0, 103.0, 99.0, 102.0)),
            ("BAD", Candle::new(100.0, 90.0, 99.0, 95.0)),
        ];
        let err = scan_open_extremes(&quotes, OpenExtreme::OpenHigh, 0.5).unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidOhlc { index: 1, .. }));
    }

    #[test]
    fn zero_open_is_rejected() {
        let c = Candle::new(0.0, 0.0, 0.0, 0.0);
        assert!(open_extreme_signal(&c, 0.5).unwrap_err().is_invalid_input());
    }
}
