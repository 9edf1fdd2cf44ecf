//! Candlestick pattern detectors
//!
//! # Pattern Groups
//!
//! - **Single-bar (8)**: Hammer family, Doji family, Spinning Top
//! - **Two-bar (4)**: Bullish/Bearish Engulfing, Piercing Line, Dark Cloud Cover
//! - **Three-bar (4)**: Morning/Evening Star, Three White Soldiers, Three Black Crows

pub mod helpers;

/// Generate `with_defaults()` -> `Self::default()` for multiple detector types.
macro_rules! impl_with_defaults {
  ($($detector:ty),* $(,)?) => {
    $(impl $detector {
      pub fn with_defaults() -> Self { Self::default() }
    })*
  };
}

pub mod single_bar;
pub mod three_bar;
pub mod two_bar;

// Re-export all detectors for convenience
pub use helpers::*;
pub use single_bar::*;
pub use three_bar::*;
pub use two_bar::*;
