//! Relative Candle Classification
//!
//! Reclassifies every bar against its immediate predecessor. A bar that
//! breaks the previous high without breaking the previous low is a bullish
//! break, the mirror case is a bearish break, a bar breaking both sides is
//! an outside bar colored by its own body, and anything else is an inside
//! bar with no directional color.
//!
//! The display range (`display_open`, `display_close`) remaps the bar body
//! onto its extremes so a relative chart can be drawn from it.

use super::bars::Bar;
use serde::{Deserialize, Serialize};

/// Relative state of a bar versus its predecessor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativeState {
    /// First bar of the sequence, no predecessor
    Initial,
    /// Higher high without a lower low
    BullishBreak,
    /// Lower low without a higher high
    BearishBreak,
    /// Higher high and lower low, closed green
    BullishOutside,
    /// Higher high and lower low, closed red or flat
    BearishOutside,
    /// Neither a higher high nor a lower low
    Inside,
}

impl RelativeState {
    /// Short chart mnemonic (X, U, D, RU, RD, I)
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::Initial => "X",
            Self::BullishBreak => "U",
            Self::BearishBreak => "D",
            Self::BullishOutside => "RU",
            Self::BearishOutside => "RD",
            Self::Inside => "I",
        }
    }
}

impl std::fmt::Display for RelativeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// Color tag of a relative candle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandleColor {
    Bullish,
    Bearish,
    Neutral,
}

impl CandleColor {
    /// +1 for bullish, -1 for bearish, 0 for neutral
    pub fn direction(&self) -> i8 {
        match self {
            Self::Bullish => 1,
            Self::Bearish => -1,
            Self::Neutral => 0,
        }
    }

    fn from_body(bar: &Bar) -> Self {
        if bar.is_bullish() {
            Self::Bullish
        } else {
            Self::Bearish
        }
    }
}

/// Per-bar output of the classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub state: RelativeState,
    pub display_open: f64,
    pub display_close: f64,
    pub display_color: CandleColor,
}

impl Classification {
    /// Classification of the first bar: its own body and color
    pub fn initial(bar: &Bar) -> Self {
        Self {
            state: RelativeState::Initial,
            display_open: bar.open,
            display_close: bar.close,
            display_color: CandleColor::from_body(bar),
        }
    }
}

/// Classify `curr` against `prev`
pub fn classify_bar(prev: &Bar, curr: &Bar) -> Classification {
    let higher_high = curr.high > prev.high;
    let lower_low = curr.low < prev.low;

    let (state, display_open, display_close, display_color) = match (higher_high, lower_low) {
        (true, false) => (
            RelativeState::BullishBreak,
            curr.low,
            curr.high,
            CandleColor::Bullish,
        ),
        (false, true) => (
            RelativeState::BearishBreak,
            curr.high,
            curr.low,
            CandleColor::Bearish,
        ),
        (true, true) if curr.is_bullish() => (
            RelativeState::BullishOutside,
            curr.low,
            curr.high,
            CandleColor::Bullish,
        ),
        (true, true) => (
            RelativeState::BearishOutside,
            curr.high,
            curr.low,
            CandleColor::Bearish,
        ),
        (false, false) => (
            RelativeState::Inside,
            curr.high,
            curr.low,
            CandleColor::Neutral,
        ),
    };

    Classification {
        state,
        display_open,
        display_close,
        display_color,
    }
}

/// Classify a whole sequence; bar 0 is always `Initial`
pub fn classify_bars(bars: &[Bar]) -> Vec<Classification> {
    let Some(first) = bars.first() else {
        return Vec::new();
    };

    let mut result = Vec::with_capacity(bars.len());
    result.push(Classification::initial(first));
    result.extend(bars.windows(2).map(|pair| classify_bar(&pair[0], &pair[1])));
    result
}
