use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cycle_core::{Cycle, CyclePattern, EternalAnalysis, Phase, Trend, TrendDetail};
use crate::timeframe::Timeframe;

/// Summary of one symbol on one timeframe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeReport {
    pub timeframe: Timeframe,
    pub bars: usize,
    pub trend: Trend,
    #[serde(rename = "trendDetail")]
    pub trend_detail: TrendDetail,
    /// Phase of the latest bar, None without bars
    pub phase: Option<Phase>,
    #[serde(rename = "phaseFlip")]
    pub phase_flip: bool,
    #[serde(rename = "twoCycles")]
    pub two_cycles: CyclePattern,
    #[serde(rename = "completedCycles")]
    pub completed_cycles: usize,
    #[serde(rename = "openCycle")]
    pub open_cycle: Option<Cycle>,
    #[serde(rename = "lastTimestamp")]
    pub last_timestamp: Option<i64>,
}

impl TimeframeReport {
    pub fn from_analysis(timeframe: Timeframe, analysis: &EternalAnalysis) -> Self {
        Self {
            timeframe,
            bars: analysis.classified_bars.len(),
            trend: analysis.trend,
            trend_detail: analysis.trend_detail(),
            phase: analysis.current_phase(),
            phase_flip: analysis.phase_flip(),
            two_cycles: analysis.two_cycle_pattern(),
            completed_cycles: analysis.completed_cycles().len(),
            open_cycle: analysis.open_cycle().copied(),
            last_timestamp: analysis.classified_bars.last().map(|b| b.bar.timestamp),
        }
    }
}

/// All timeframe reports for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolScan {
    pub symbol: String,
    #[serde(rename = "scannedAt")]
    pub scanned_at: DateTime<Utc>,
    pub frames: Vec<TimeframeReport>,
}

impl SymbolScan {
    pub fn frame(&self, timeframe: Timeframe) -> Option<&TimeframeReport> {
        self.frames.iter().find(|f| f.timeframe == timeframe)
    }
}

/// Changes reported by the watch service between two snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WatchEvent {
    TrendChanged {
        symbol: String,
        from: Trend,
        to: Trend,
        timestamp: i64,
    },
    PhaseFlip {
        symbol: String,
        phase: Phase,
        timestamp: i64,
    },
    CycleClosed {
        symbol: String,
        cycle: Cycle,
    },
}

/// Timestamp of the last bar in `cycle`
fn cycle_end_timestamp(analysis: &EternalAnalysis, cycle: &Cycle) -> Option<i64> {
    let last = cycle.end_index.checked_sub(1)?;
    analysis.classified_bars.get(last).map(|b| b.bar.timestamp)
}

/// Events implied by going from `before` to `after` on the same stream
pub fn diff_snapshots(
    symbol: &str,
    before: &EternalAnalysis,
    after: &EternalAnalysis,
) -> Vec<WatchEvent> {
    let mut events = Vec::new();
    let Some(last) = after.classified_bars.last() else {
        return events;
    };
    let timestamp = last.bar.timestamp;

    // Cycles that closed since the previous snapshot. Window eviction shifts
    // indices, so closures are matched by the timestamp of their last bar.
    if !before.classified_bars.is_empty() {
        let closed_through = before
            .completed_cycles()
            .last()
            .and_then(|c| cycle_end_timestamp(before, c));

        for cycle in after.completed_cycles() {
            let newly_closed = match (cycle_end_timestamp(after, cycle), closed_through) {
                (Some(end), Some(through)) => end > through,
                (Some(_), None) => true,
                (None, _) => false,
            };
            if newly_closed {
                events.push(WatchEvent::CycleClosed {
                    symbol: symbol.to_string(),
                    cycle: *cycle,
                });
            }
        }
    }

    if before.current_phase().is_some() && before.current_phase() != after.current_phase() {
        events.push(WatchEvent::PhaseFlip {
            symbol: symbol.to_string(),
            phase: last.phase,
            timestamp,
        });
    }

    if before.trend != after.trend {
        events.push(WatchEvent::TrendChanged {
            symbol: symbol.to_string(),
            from: before.trend,
            to: after.trend,
            timestamp,
        });
    }

    events
}
