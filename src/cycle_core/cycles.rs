//! Cycle segmentation: maximal runs of bars sharing one phase

use super::analysis::ClassifiedBar;
use super::phase::Phase;
use serde::{Deserialize, Serialize};

/// A maximal contiguous run of bars with the same phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cycle {
    pub phase: Phase,
    /// Highest true high over the run
    pub high: f64,
    /// Lowest true low over the run
    pub low: f64,
    pub start_index: usize,
    /// Exclusive
    pub end_index: usize,
    /// The last cycle of a sequence is still forming
    pub is_open: bool,
}

impl Cycle {
    pub fn len(&self) -> usize {
        self.end_index - self.start_index
    }

    pub fn is_empty(&self) -> bool {
        self.end_index == self.start_index
    }
}

/// Split classified bars into cycles; the last one is flagged open
pub fn segment_cycles(bars: &[ClassifiedBar]) -> Vec<Cycle> {
    let mut cycles = Vec::new();
    let Some(first) = bars.first() else {
        return cycles;
    };

    let mut current = Cycle {
        phase: first.phase,
        high: first.bar.high,
        low: first.bar.low,
        start_index: 0,
        end_index: 1,
        is_open: false,
    };

    for (i, classified) in bars.iter().enumerate().skip(1) {
        if classified.phase != current.phase {
            cycles.push(current);
            current = Cycle {
                phase: classified.phase,
                high: classified.bar.high,
                low: classified.bar.low,
                start_index: i,
                end_index: i + 1,
                is_open: false,
            };
        } else {
            current.high = current.high.max(classified.bar.high);
            current.low = current.low.min(classified.bar.low);
            current.end_index = i + 1;
        }
    }

    current.is_open = true;
    cycles.push(current);
    cycles
}

/// Cycles closed by a later phase change
pub fn completed_cycles(cycles: &[Cycle]) -> &[Cycle] {
    match cycles.split_last() {
        Some((_, completed)) => completed,
        None => cycles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle_core::bars::Bar;
    use crate::cycle_core::relative::{CandleColor, RelativeState};

    fn classified(phase: Phase, high: f64, low: f64) -> ClassifiedBar {
        ClassifiedBar {
            bar: Bar::new(0, low, high, low, high),
            state: RelativeState::Inside,
            phase,
            display_open: high,
            display_close: low,
            display_color: CandleColor::Neutral,
        }
    }

    #[test]
    fn test_empty() {
        assert!(segment_cycles(&[]).is_empty());
        assert!(completed_cycles(&[]).is_empty());
    }

    #[test]
    fn test_single_bar_is_open_cycle() {
        let cycles = segment_cycles(&[classified(Phase::Down, 5.0, 3.0)]);
        assert_eq!(cycles.len(), 1);
        assert!(cycles[0].is_open);
        assert_eq!((cycles[0].start_index, cycles[0].end_index), (0, 1));
        assert!(completed_cycles(&cycles).is_empty());
    }

    #[test]
    fn test_segments_and_extremes() {
        let bars = vec![
            classified(Phase::Up, 10.0, 8.0),
            classified(Phase::Up, 12.0, 9.0),
            classified(Phase::Down, 11.0, 6.0),
            classified(Phase::Down, 9.0, 5.0),
            classified(Phase::Down, 8.0, 7.0),
            classified(Phase::Up, 13.0, 7.5),
        ];
        let cycles = segment_cycles(&bars);
        assert_eq!(cycles.len(), 3);

        assert_eq!(cycles[0].phase, Phase::Up);
        assert_eq!((cycles[0].high, cycles[0].low), (12.0, 8.0));
        assert_eq!((cycles[0].start_index, cycles[0].end_index), (0, 2));
        assert!(!cycles[0].is_open);

        assert_eq!(cycles[1].phase, Phase::Down);
        assert_eq!((cycles[1].high, cycles[1].low), (11.0, 5.0));
        assert_eq!(cycles[1].len(), 3);

        assert!(cycles[2].is_open);
        assert_eq!((cycles[2].start_index, cycles[2].end_index), (5, 6));

        assert_eq!(completed_cycles(&cycles).len(), 2);
    }

    #[test]
    fn test_cycles_partition_sequence() {
        let phases = [
            Phase::Up,
            Phase::Down,
            Phase::Down,
            Phase::Up,
            Phase::Down,
            Phase::Down,
        ];
        let bars: Vec<_> = phases.iter().map(|p| classified(*p, 2.0, 1.0)).collect();
        let cycles = segment_cycles(&bars);

        let mut expected_start = 0;
        for cycle in &cycles {
            assert_eq!(cycle.start_index, expected_start);
            assert!(!cycle.is_empty());
            expected_start = cycle.end_index;
        }
        assert_eq!(expected_start, bars.len());
    }
}
