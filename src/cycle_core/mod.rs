//! Cycle Core - relative candle classification and market cycle detection
//!
//! This module contains the classification pipeline, leaf first:
//! - Bars and timeframe resampling
//! - Relative candle classification (bar vs. its predecessor)
//! - Phase tracking through inside bars
//! - Cycle segmentation
//! - Trend classification from completed cycles
//! - Full-pass analysis and the incremental engine

pub mod bars;
pub mod relative;
pub mod phase;
pub mod cycles;
pub mod trend;
pub mod analysis;
pub mod engine;

// Re-export commonly used types
pub use bars::{aggregate_bars, Bar};
pub use relative::{classify_bar, classify_bars, CandleColor, Classification, RelativeState};
pub use phase::{track_phases, Phase, PhaseTracker};
pub use cycles::{completed_cycles, segment_cycles, Cycle};
pub use trend::{classify_trend, trend_detail, two_cycle_pattern, CyclePattern, Trend, TrendDetail};
pub use analysis::{analyze, classify_sequence, ClassifiedBar, EternalAnalysis, DEFAULT_DISPLAY_WINDOW};
pub use engine::{CycleEngine, PushOutcome};
