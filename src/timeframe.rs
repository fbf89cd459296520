//! Chart timeframes supported by the scanner

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;
const WEEK_MS: i64 = 7 * DAY_MS;

/// 1970-01-01 was a Thursday; weekly buckets start on Monday 00:00 UTC.
const WEEK_OFFSET_MS: i64 = 4 * DAY_MS;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeframeError {
    #[error("Unknown timeframe: {input} (expected one of 1m, 3m, 5m, 15m, 30m, 1h, 2h, 4h, 6h, 12h, 1d, 1w)")]
    Unknown { input: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "3m")]
    M3,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "2h")]
    H2,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "6h")]
    H6,
    #[serde(rename = "12h")]
    H12,
    #[serde(rename = "1d")]
    D1,
    #[serde(rename = "1w")]
    W1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 12] = [
        Timeframe::M1,
        Timeframe::M3,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::M30,
        Timeframe::H1,
        Timeframe::H2,
        Timeframe::H4,
        Timeframe::H6,
        Timeframe::H12,
        Timeframe::D1,
        Timeframe::W1,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::M1 => "1m",
            Self::M3 => "3m",
            Self::M5 => "5m",
            Self::M15 => "15m",
            Self::M30 => "30m",
            Self::H1 => "1h",
            Self::H2 => "2h",
            Self::H4 => "4h",
            Self::H6 => "6h",
            Self::H12 => "12h",
            Self::D1 => "1d",
            Self::W1 => "1w",
        }
    }

    /// Bucket length in milliseconds
    pub fn duration_ms(&self) -> i64 {
        match self {
            Self::M1 => MINUTE_MS,
            Self::M3 => 3 * MINUTE_MS,
            Self::M5 => 5 * MINUTE_MS,
            Self::M15 => 15 * MINUTE_MS,
            Self::M30 => 30 * MINUTE_MS,
            Self::H1 => HOUR_MS,
            Self::H2 => 2 * HOUR_MS,
            Self::H4 => 4 * HOUR_MS,
            Self::H6 => 6 * HOUR_MS,
            Self::H12 => 12 * HOUR_MS,
            Self::D1 => DAY_MS,
            Self::W1 => WEEK_MS,
        }
    }

    /// Start of the bucket containing `timestamp_ms` (UTC aligned)
    pub fn bucket_start(&self, timestamp_ms: i64) -> i64 {
        let duration = self.duration_ms();
        match self {
            Self::W1 => {
                (timestamp_ms - WEEK_OFFSET_MS).div_euclid(duration) * duration + WEEK_OFFSET_MS
            }
            _ => timestamp_ms.div_euclid(duration) * duration,
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Timeframe {
    type Err = TimeframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|tf| tf.label().eq_ignore_ascii_case(needle))
            .ok_or_else(|| TimeframeError::Unknown {
                input: s.to_string(),
            })
    }
}

/// Parse a comma-separated list such as "15m,1h,4h,1d"
pub fn parse_timeframe_list(s: &str) -> Result<Vec<Timeframe>, TimeframeError> {
    s.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(Timeframe::from_str)
        .collect()
}
