//! Full relative-candle pipeline: classify, track phase, segment, classify trend
//!
//! Every call recomputes from the whole bar history. Each stage consumes
//! the previous stage's output without modifying it.

use super::bars::Bar;
use super::cycles::{completed_cycles, segment_cycles, Cycle};
use super::phase::{Phase, PhaseTracker};
use super::relative::{classify_bars, CandleColor, Classification, RelativeState};
use super::trend::{trend_detail, two_cycle_pattern, CyclePattern, Trend, TrendDetail};
use serde::{Deserialize, Serialize};

/// Bars rendered by the relative chart
pub const DEFAULT_DISPLAY_WINDOW: usize = 100;

/// A bar with its relative classification and phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedBar {
    #[serde(flatten)]
    pub bar: Bar,
    pub state: RelativeState,
    pub phase: Phase,
    pub display_open: f64,
    pub display_close: f64,
    pub display_color: CandleColor,
}

impl ClassifiedBar {
    pub fn new(bar: Bar, classification: Classification, phase: Phase) -> Self {
        Self {
            bar,
            state: classification.state,
            phase,
            display_open: classification.display_open,
            display_close: classification.display_close,
            display_color: classification.display_color,
        }
    }
}

/// Output of one pass over a bar sequence
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EternalAnalysis {
    pub classified_bars: Vec<ClassifiedBar>,
    pub cycles: Vec<Cycle>,
    pub trend: Trend,
}

impl EternalAnalysis {
    /// Build cycles and trend on top of already classified bars
    pub fn from_classified(classified_bars: Vec<ClassifiedBar>) -> Self {
        let cycles = segment_cycles(&classified_bars);
        let trend = trend_detail(&cycles).trend;
        Self {
            classified_bars,
            cycles,
            trend,
        }
    }

    /// Phase of the most recent bar
    pub fn current_phase(&self) -> Option<Phase> {
        self.classified_bars.last().map(|b| b.phase)
    }

    /// True when the last bar's phase differs from the bar before it
    pub fn phase_flip(&self) -> bool {
        match self.classified_bars.as_slice() {
            [.., prev, last] => prev.phase != last.phase,
            _ => false,
        }
    }

    pub fn completed_cycles(&self) -> &[Cycle] {
        completed_cycles(&self.cycles)
    }

    /// The cycle still accumulating bars
    pub fn open_cycle(&self) -> Option<&Cycle> {
        self.cycles.last()
    }

    pub fn trend_detail(&self) -> TrendDetail {
        trend_detail(&self.cycles)
    }

    pub fn two_cycle_pattern(&self) -> CyclePattern {
        two_cycle_pattern(&self.cycles)
    }

    /// The last `n` classified bars
    pub fn display_window(&self, n: usize) -> &[ClassifiedBar] {
        let start = self.classified_bars.len().saturating_sub(n);
        &self.classified_bars[start..]
    }
}

/// Classify every bar and assign its phase
pub fn classify_sequence(bars: &[Bar]) -> Vec<ClassifiedBar> {
    let mut tracker = PhaseTracker::new();
    bars.iter()
        .zip(classify_bars(bars))
        .map(|(bar, classification)| {
            let phase = tracker.push(classification.display_color);
            ClassifiedBar::new(*bar, classification, phase)
        })
        .collect()
}

/// Run the whole pipeline over a chronologically ordered bar sequence.
///
/// Never fails: empty input yields an empty result with a NEUTRAL trend.
pub fn analyze(bars: &[Bar]) -> EternalAnalysis {
    let analysis = EternalAnalysis::from_classified(classify_sequence(bars));

    tracing::trace!(
        bars = bars.len(),
        cycles = analysis.cycles.len(),
        trend = %analysis.trend,
        "relative candle analysis"
    );

    analysis
}
