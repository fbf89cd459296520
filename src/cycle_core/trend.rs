//! Trend Classification
//!
//! Derives the trend label from the shape of the most recent completed
//! cycles. Highs are always compared across the last two UP cycles and lows
//! across the last two DOWN cycles, whatever their chronological adjacency.

use super::cycles::{completed_cycles, Cycle};
use super::phase::Phase;
use serde::{Deserialize, Serialize};

/// Trend label of a bar sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Trend {
    Up,
    Down,
    #[default]
    Neutral,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Up => write!(f, "UP"),
            Self::Down => write!(f, "DOWN"),
            Self::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Trend plus the swing comparisons it was derived from.
///
/// The comparison flags are all false when there is not enough history
/// (fewer than two completed cycles in either direction).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrendDetail {
    pub trend: Trend,
    pub sufficient_history: bool,
    pub higher_high: bool,
    pub higher_low: bool,
    pub lower_high: bool,
    pub lower_low: bool,
}

/// Evaluate the trend over a full cycle list (the open cycle is ignored)
pub fn trend_detail(cycles: &[Cycle]) -> TrendDetail {
    let completed = completed_cycles(cycles);

    let mut up_cycles = completed.iter().filter(|c| c.phase == Phase::Up).rev();
    let mut down_cycles = completed.iter().filter(|c| c.phase == Phase::Down).rev();

    let (Some(last_up), Some(prev_up), Some(last_down), Some(prev_down)) = (
        up_cycles.next(),
        up_cycles.next(),
        down_cycles.next(),
        down_cycles.next(),
    ) else {
        return TrendDetail::default();
    };

    let higher_high = last_up.high > prev_up.high;
    let higher_low = last_down.low > prev_down.low;
    let lower_high = last_up.high < prev_up.high;
    let lower_low = last_down.low < prev_down.low;

    let trend = if higher_high && higher_low {
        Trend::Up
    } else if lower_high && lower_low {
        Trend::Down
    } else {
        Trend::Neutral
    };

    TrendDetail {
        trend,
        sufficient_history: true,
        higher_high,
        higher_low,
        lower_high,
        lower_low,
    }
}

/// Trend label over a full cycle list (the open cycle is ignored)
pub fn classify_trend(cycles: &[Cycle]) -> Trend {
    trend_detail(cycles).trend
}

/// "Two cycles in one direction" pattern over the latest three cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CyclePattern {
    #[serde(rename = "2_UP_CYCLES")]
    TwoUpCycles,
    #[serde(rename = "2_DOWN_CYCLES")]
    TwoDownCycles,
    #[default]
    Neutral,
}

impl std::fmt::Display for CyclePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TwoUpCycles => write!(f, "2_UP_CYCLES"),
            Self::TwoDownCycles => write!(f, "2_DOWN_CYCLES"),
            Self::Neutral => write!(f, "NEUTRAL"),
        }
    }
}

/// Direction, correction, direction: the last three cycles (the open one
/// included) start and end in the same phase.
pub fn two_cycle_pattern(cycles: &[Cycle]) -> CyclePattern {
    match cycles {
        [.., first, _, third] if first.phase == third.phase => match third.phase {
            Phase::Up => CyclePattern::TwoUpCycles,
            Phase::Down => CyclePattern::TwoDownCycles,
        },
        _ => CyclePattern::Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle(phase: Phase, high: f64, low: f64) -> Cycle {
        Cycle {
            phase,
            high,
            low,
            start_index: 0,
            end_index: 1,
            is_open: false,
        }
    }

    fn open(mut c: Cycle) -> Cycle {
        c.is_open = true;
        c
    }

    #[test]
    fn test_insufficient_history() {
        assert_eq!(classify_trend(&[]), Trend::Neutral);

        // Two UP and one DOWN completed
        let cycles = vec![
            cycle(Phase::Up, 10.0, 5.0),
            cycle(Phase::Down, 9.0, 4.0),
            cycle(Phase::Up, 12.0, 6.0),
            open(cycle(Phase::Down, 11.0, 3.0)),
        ];
        let detail = trend_detail(&cycles);
        assert_eq!(detail.trend, Trend::Neutral);
        assert!(!detail.sufficient_history);
    }

    #[test]
    fn test_open_cycle_excluded() {
        // The open DOWN cycle would make a second DOWN cycle if it counted
        let cycles = vec![
            cycle(Phase::Down, 9.0, 4.0),
            cycle(Phase::Up, 10.0, 5.0),
            cycle(Phase::Down, 9.5, 4.5),
            cycle(Phase::Up, 12.0, 6.0),
            open(cycle(Phase::Down, 11.0, 5.5)),
        ];
        assert_eq!(classify_trend(&cycles), Trend::Up);

        let truncated = &cycles[..4];
        // Now the last UP cycle is the open one
        assert_eq!(classify_trend(truncated), Trend::Neutral);
    }

    #[test]
    fn test_uptrend() {
        let cycles = vec![
            cycle(Phase::Up, 10.0, 5.0),
            cycle(Phase::Down, 9.0, 4.0),
            cycle(Phase::Up, 12.0, 6.0),
            cycle(Phase::Down, 11.0, 5.0),
            open(cycle(Phase::Up, 13.0, 7.0)),
        ];
        let detail = trend_detail(&cycles);
        assert_eq!(detail.trend, Trend::Up);
        assert!(detail.higher_high && detail.higher_low);
        assert!(!detail.lower_high && !detail.lower_low);
    }

    #[test]
    fn test_downtrend() {
        let cycles = vec![
            cycle(Phase::Down, 20.0, 15.0),
            cycle(Phase::Up, 19.0, 16.0),
            cycle(Phase::Down, 18.0, 13.0),
            cycle(Phase::Up, 17.0, 14.0),
            open(cycle(Phase::Down, 16.0, 12.0)),
        ];
        assert_eq!(classify_trend(&cycles), Trend::Down);
    }

    #[test]
    fn test_mixed_is_neutral() {
        // Higher high but lower low: expanding range
        let cycles = vec![
            cycle(Phase::Up, 10.0, 5.0),
            cycle(Phase::Down, 9.0, 4.0),
            cycle(Phase::Up, 12.0, 6.0),
            cycle(Phase::Down, 11.0, 3.0),
            open(cycle(Phase::Up, 13.0, 7.0)),
        ];
        let detail = trend_detail(&cycles);
        assert_eq!(detail.trend, Trend::Neutral);
        assert!(detail.sufficient_history);
        assert!(detail.higher_high && detail.lower_low);

        // Equal highs are neither higher nor lower
        let flat = vec![
            cycle(Phase::Up, 10.0, 5.0),
            cycle(Phase::Down, 9.0, 4.0),
            cycle(Phase::Up, 10.0, 6.0),
            cycle(Phase::Down, 11.0, 5.0),
            open(cycle(Phase::Up, 13.0, 7.0)),
        ];
        assert_eq!(classify_trend(&flat), Trend::Neutral);
    }

    #[test]
    fn test_cross_comparison_uses_latest_per_direction() {
        // Older cycles are ignored; only the last two per direction count
        let cycles = vec![
            cycle(Phase::Up, 100.0, 1.0),
            cycle(Phase::Down, 50.0, 0.5),
            cycle(Phase::Up, 10.0, 5.0),
            cycle(Phase::Down, 9.0, 4.0),
            cycle(Phase::Up, 12.0, 6.0),
            cycle(Phase::Down, 11.0, 5.0),
            open(cycle(Phase::Up, 13.0, 7.0)),
        ];
        assert_eq!(classify_trend(&cycles), Trend::Up);
    }

    #[test]
    fn test_two_cycle_pattern() {
        assert_eq!(two_cycle_pattern(&[]), CyclePattern::Neutral);

        let two = vec![cycle(Phase::Up, 1.0, 0.0), open(cycle(Phase::Down, 1.0, 0.0))];
        assert_eq!(two_cycle_pattern(&two), CyclePattern::Neutral);

        let up = vec![
            cycle(Phase::Down, 1.0, 0.0),
            cycle(Phase::Up, 1.0, 0.0),
            cycle(Phase::Down, 1.0, 0.0),
            open(cycle(Phase::Up, 1.0, 0.0)),
        ];
        assert_eq!(two_cycle_pattern(&up), CyclePattern::TwoUpCycles);
        assert_eq!(two_cycle_pattern(&up[..3]), CyclePattern::TwoDownCycles);
        assert_eq!(CyclePattern::TwoUpCycles.to_string(), "2_UP_CYCLES");
    }

    #[test]
    fn test_trend_serde() {
        assert_eq!(serde_json::to_string(&Trend::Neutral).unwrap(), "\"NEUTRAL\"");
        assert_eq!(
            serde_json::to_string(&CyclePattern::TwoDownCycles).unwrap(),
            "\"2_DOWN_CYCLES\""
        );
        // Serialized label matches the printed one
        for pattern in [CyclePattern::TwoUpCycles, CyclePattern::TwoDownCycles, CyclePattern::Neutral] {
            let json = serde_json::to_string(&pattern).unwrap();
            assert_eq!(json, format!("\"{}\"", pattern));
            assert_eq!(serde_json::from_str::<CyclePattern>(&json).unwrap(), pattern);
        }
    }
}
