//! OHLC bars and timeframe resampling

use serde::{Deserialize, Serialize};

use crate::timeframe::Timeframe;

/// One OHLC price observation. `timestamp` is the bar open time in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Bar {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume: 0.0,
        }
    }

    /// Green candle: close strictly above open
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }
}

/// Resample chronologically ordered bars into `timeframe` buckets.
///
/// Consecutive bars falling into the same bucket are merged; a bucket that
/// reappears later in an unordered input starts a new bar.
pub fn aggregate_bars(bars: &[Bar], timeframe: Timeframe) -> Vec<Bar> {
    let mut result: Vec<Bar> = Vec::new();

    for bar in bars {
        let bucket = timeframe.bucket_start(bar.timestamp);

        match result.last_mut() {
            Some(current) if current.timestamp == bucket => {
                current.high = current.high.max(bar.high);
                current.low = current.low.min(bar.low);
                current.close = bar.close;
                current.volume += bar.volume;
            }
            _ => result.push(Bar {
                timestamp: bucket,
                ..*bar
            }),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: i64 = 60_000;

    #[test]
    fn test_is_bullish() {
        assert!(Bar::new(0, 10.0, 12.0, 9.0, 11.0).is_bullish());
        assert!(!Bar::new(0, 10.0, 12.0, 9.0, 9.5).is_bullish());
        // Doji counts as bearish
        assert!(!Bar::new(0, 10.0, 12.0, 9.0, 10.0).is_bullish());
    }

    #[test]
    fn test_aggregate_to_15m() {
        let bars: Vec<Bar> = (0..30)
            .map(|i| {
                let base = 100.0 + i as f64;
                Bar {
                    volume: 1.0,
                    ..Bar::new(i * MINUTE, base, base + 2.0, base - 1.0, base + 0.5)
                }
            })
            .collect();

        let agg = aggregate_bars(&bars, Timeframe::M15);
        assert_eq!(agg.len(), 2);

        let first = &agg[0];
        assert_eq!(first.timestamp, 0);
        assert_eq!(first.open, 100.0);
        assert_eq!(first.high, 116.0);
        assert_eq!(first.low, 99.0);
        assert_eq!(first.close, 114.5);
        assert_eq!(first.volume, 15.0);

        assert_eq!(agg[1].timestamp, 15 * MINUTE);
        assert_eq!(agg[1].open, 115.0);
    }

    #[test]
    fn test_aggregate_empty() {
        assert!(aggregate_bars(&[], Timeframe::H1).is_empty());
    }

    #[test]
    fn test_aggregate_aligns_unaligned_start() {
        let bars = vec![
            Bar::new(7 * MINUTE, 1.0, 2.0, 0.5, 1.5),
            Bar::new(8 * MINUTE, 1.5, 3.0, 1.0, 2.5),
        ];
        let agg = aggregate_bars(&bars, Timeframe::M5);
        assert_eq!(agg.len(), 1);
        assert_eq!(agg[0].timestamp, 5 * MINUTE);
        assert_eq!(agg[0].high, 3.0);
    }
}
