//! Configuration for scans and the watch service

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::timeframe::Timeframe;

/// Configuration shared by the batch scanner and the watch service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Timeframes evaluated per symbol, lowest first
    pub timeframes: Vec<Timeframe>,

    /// Most recent bars analyzed per timeframe
    pub bar_limit: usize,

    /// Bars kept for the relative chart
    pub display_window: usize,

    /// Watch mode poll interval in seconds
    pub poll_interval_secs: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            timeframes: vec![Timeframe::M15, Timeframe::H1, Timeframe::H4, Timeframe::D1],
            bar_limit: 150,
            display_window: 100,
            poll_interval_secs: 5,
        }
    }
}

impl ScanConfig {
    /// Short-term charts for day trading
    pub fn intraday() -> Self {
        Self {
            timeframes: vec![Timeframe::M5, Timeframe::M15, Timeframe::H1, Timeframe::H4],
            poll_interval_secs: 2,
            ..Default::default()
        }
    }

    /// Higher timeframes for position holds
    pub fn swing() -> Self {
        Self {
            timeframes: vec![Timeframe::H4, Timeframe::D1, Timeframe::W1],
            poll_interval_secs: 60,
            ..Default::default()
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    /// Comma-separated timeframe labels, e.g. "15m,1h,4h,1d"
    pub fn timeframe_labels(&self) -> String {
        self.timeframes
            .iter()
            .map(Timeframe::label)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Sort timeframes lowest first and drop duplicates
    pub fn normalized(mut self) -> Self {
        self.timeframes.sort();
        self.timeframes.dedup();
        self.bar_limit = self.bar_limit.max(1);
        self
    }
}

impl std::fmt::Display for ScanConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "timeframes={} bar_limit={} display_window={} poll={}s",
            self.timeframe_labels(),
            self.bar_limit,
            self.display_window,
            self.poll_interval_secs
        )
    }
}
