//! Incremental Cycle Engine
//!
//! Caches per-bar classification for an append-only bar stream so a new
//! bar costs O(1) classification work instead of a full pass. A bar with the
//! same timestamp as the last one replaces it (the live bar is still
//! forming) and is re-classified from the tracker checkpoint taken before
//! that bar.
//!
//! With a window limit, evicting the oldest bar changes the phase seed, so
//! the whole window is recomputed from scratch. Once the window is full every
//! appended bar evicts one, making each push O(window) rather than O(1).

use super::analysis::{ClassifiedBar, EternalAnalysis};
use super::bars::Bar;
use super::phase::PhaseTracker;
use super::relative::{classify_bar, Classification};
use tracing::debug;

/// What happened to a bar fed to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Appended,
    /// Same timestamp as the previous last bar, which it replaced
    Repainted,
}

#[derive(Debug, Clone, Default)]
pub struct CycleEngine {
    bars: Vec<Bar>,
    classified: Vec<ClassifiedBar>,
    tracker: PhaseTracker,
    /// Tracker state before the last bar was pushed
    checkpoint: PhaseTracker,
    max_bars: Option<usize>,
    rebuilds: u64,
}

impl CycleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only the most recent `max_bars` bars (at least one)
    pub fn with_window(max_bars: usize) -> Self {
        Self {
            max_bars: Some(max_bars.max(1)),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn classified_bars(&self) -> &[ClassifiedBar] {
        &self.classified
    }

    pub fn last_timestamp(&self) -> Option<i64> {
        self.bars.last().map(|b| b.timestamp)
    }

    /// Number of full window recomputations so far
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Feed one bar
    pub fn push(&mut self, bar: Bar) -> PushOutcome {
        let outcome = if self.last_timestamp() == Some(bar.timestamp) {
            self.bars.pop();
            self.classified.pop();
            self.tracker = self.checkpoint.clone();
            PushOutcome::Repainted
        } else {
            PushOutcome::Appended
        };

        let classification = match self.bars.last() {
            Some(prev) => classify_bar(prev, &bar),
            None => Classification::initial(&bar),
        };

        self.checkpoint = self.tracker.clone();
        let phase = self.tracker.push(classification.display_color);
        self.bars.push(bar);
        self.classified.push(ClassifiedBar::new(bar, classification, phase));

        if let Some(max) = self.max_bars {
            if self.bars.len() > max {
                let excess = self.bars.len() - max;
                self.bars.drain(..excess);
                self.rebuild();
            }
        }

        outcome
    }

    /// Feed a batch of bars in order; returns how many were repaints
    pub fn extend<I>(&mut self, bars: I) -> usize
    where
        I: IntoIterator<Item = Bar>,
    {
        bars.into_iter()
            .filter(|bar| self.push(*bar) == PushOutcome::Repainted)
            .count()
    }

    /// Cycles and trend over the current window
    pub fn snapshot(&self) -> EternalAnalysis {
        EternalAnalysis::from_classified(self.classified.clone())
    }

    pub fn clear(&mut self) {
        let max_bars = self.max_bars;
        *self = Self {
            max_bars,
            ..Self::default()
        };
    }

    /// Recompute classification and tracker state from `self.bars`
    fn rebuild(&mut self) {
        let bars = std::mem::take(&mut self.bars);
        self.classified.clear();
        self.tracker = PhaseTracker::new();
        self.checkpoint = PhaseTracker::new();

        let mut prev: Option<&Bar> = None;
        for bar in &bars {
            let classification = match prev {
                Some(p) => classify_bar(p, bar),
                None => Classification::initial(bar),
            };
            self.checkpoint = self.tracker.clone();
            let phase = self.tracker.push(classification.display_color);
            self.classified.push(ClassifiedBar::new(*bar, classification, phase));
            prev = Some(bar);
        }

        self.bars = bars;
        self.rebuilds += 1;
        debug!(bars = self.bars.len(), "cycle engine window rebuilt");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle_core::analysis::analyze;
    use proptest::prelude::*;

    fn sample_bars() -> Vec<Bar> {
        let ohlc = [
            (10.0, 12.0, 9.0, 11.0),
            (11.0, 14.0, 10.0, 13.0),
            (13.0, 13.0, 11.0, 12.0),
            (12.0, 11.0, 8.0, 9.0),
            (9.0, 10.0, 7.0, 7.5),
            (7.5, 9.0, 7.5, 8.8),
            (8.8, 11.0, 8.0, 10.5),
            (10.5, 12.0, 10.0, 11.5),
            (11.5, 11.8, 9.0, 9.2),
            (9.2, 10.0, 8.5, 8.7),
        ];
        ohlc.iter()
            .enumerate()
            .map(|(i, &(o, h, l, c))| Bar::new(i as i64 * 60_000, o, h, l, c))
            .collect()
    }

    #[test]
    fn test_incremental_matches_full_pass() {
        let bars = sample_bars();
        let mut engine = CycleEngine::new();
        for (i, bar) in bars.iter().enumerate() {
            assert_eq!(engine.push(*bar), PushOutcome::Appended);
            assert_eq!(engine.snapshot(), analyze(&bars[..=i]));
        }
        assert_eq!(engine.len(), bars.len());
        assert_eq!(engine.rebuilds(), 0);
    }

    #[test]
    fn test_repaint_replaces_last_bar() {
        let bars = sample_bars();
        let mut engine = CycleEngine::new();
        engine.extend(bars[..4].iter().copied());

        // Live bar still forming: first an inside bar, then it breaks down
        let forming = Bar::new(bars[4].timestamp, 9.0, 10.5, 8.5, 9.5);
        assert_eq!(engine.push(forming), PushOutcome::Appended);
        assert_eq!(engine.push(bars[4]), PushOutcome::Repainted);
        assert_eq!(engine.len(), 5);

        assert_eq!(engine.snapshot(), analyze(&bars[..5]));
    }

    #[test]
    fn test_repaint_first_bar() {
        let mut engine = CycleEngine::new();
        engine.push(Bar::new(0, 10.0, 11.0, 9.0, 9.5));
        engine.push(Bar::new(0, 10.0, 11.0, 9.0, 10.5));
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.classified_bars.len(), 1);
        assert_eq!(snapshot, analyze(&[Bar::new(0, 10.0, 11.0, 9.0, 10.5)]));
    }

    #[test]
    fn test_window_eviction_recomputes() {
        let bars = sample_bars();
        let mut engine = CycleEngine::with_window(4);
        engine.extend(bars.iter().copied());

        assert_eq!(engine.len(), 4);
        assert_eq!(engine.bars(), &bars[bars.len() - 4..]);
        assert_eq!(engine.snapshot(), analyze(&bars[bars.len() - 4..]));
        assert_eq!(engine.rebuilds(), (bars.len() - 4) as u64);

        // Repaint after an eviction still uses a valid checkpoint
        let last = *bars.last().unwrap();
        engine.push(Bar { close: 9.9, ..last });
        let mut expected = bars[bars.len() - 4..].to_vec();
        expected[3].close = 9.9;
        assert_eq!(engine.snapshot(), analyze(&expected));
    }

    #[test]
    fn test_clear_keeps_window() {
        let mut engine = CycleEngine::with_window(3);
        engine.extend(sample_bars());
        engine.clear();
        assert!(engine.is_empty());
        assert_eq!(engine.last_timestamp(), None);
        engine.extend(sample_bars());
        assert_eq!(engine.len(), 3);
    }

    proptest! {
        #[test]
        fn prop_engine_equals_recompute(
            raw in prop::collection::vec((1.0f64..50.0, 0.0f64..3.0, 0.0f64..3.0, any::<bool>(), any::<bool>()), 1..80),
            window in 1usize..40,
        ) {
            let mut engine = CycleEngine::with_window(window);
            let mut reference: Vec<Bar> = Vec::new();
            let mut ts = 0i64;

            for (mid, up, down, green, repaint) in raw {
                if !repaint || reference.is_empty() {
                    ts += 60_000;
                }
                let (open, close) = if green { (mid - down, mid + up) } else { (mid + up, mid - down) };
                let bar = Bar::new(ts, open, mid + up, mid - down, close);

                match reference.last_mut() {
                    Some(last) if last.timestamp == ts => *last = bar,
                    _ => reference.push(bar),
                }
                if reference.len() > window {
                    reference.remove(0);
                }

                engine.push(bar);
                prop_assert_eq!(engine.snapshot(), analyze(&reference));
            }
        }
    }
}
