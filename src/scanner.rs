//! Multi-timeframe scanner
//!
//! Runs the relative candle pipeline once per (symbol, timeframe). Each pass
//! owns its resampled bar vector; symbols are processed in parallel.

use anyhow::Result;
use chrono::Utc;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::ScanConfig;
use crate::cycle_core::{aggregate_bars, analyze, Bar, EternalAnalysis};
use crate::loader::{load_bars, symbol_from_path};
use crate::timeframe::Timeframe;
use crate::types::{SymbolScan, TimeframeReport};

/// Resample and keep the most recent `bar_limit` bars
pub fn prepare_bars(bars: &[Bar], timeframe: Timeframe, bar_limit: usize) -> Vec<Bar> {
    let mut resampled = aggregate_bars(bars, timeframe);
    if resampled.len() > bar_limit {
        resampled.drain(..resampled.len() - bar_limit);
    }
    resampled
}

/// Analysis of one symbol on one timeframe
pub fn analyze_timeframe(bars: &[Bar], timeframe: Timeframe, bar_limit: usize) -> EternalAnalysis {
    analyze(&prepare_bars(bars, timeframe, bar_limit))
}

/// Scan one symbol across all configured timeframes
pub fn scan_symbol(symbol: &str, bars: &[Bar], config: &ScanConfig) -> SymbolScan {
    let frames = config
        .timeframes
        .iter()
        .map(|&tf| {
            let analysis = analyze_timeframe(bars, tf, config.bar_limit);
            TimeframeReport::from_analysis(tf, &analysis)
        })
        .collect();

    SymbolScan {
        symbol: symbol.to_string(),
        scanned_at: Utc::now(),
        frames,
    }
}

/// Scan many symbols in parallel
pub fn scan_series(series: &[(String, Vec<Bar>)], config: &ScanConfig) -> Vec<SymbolScan> {
    series
        .par_iter()
        .map(|(symbol, bars)| scan_symbol(symbol, bars, config))
        .collect()
}

/// Load and scan bar files in parallel
pub fn scan_files(files: &[PathBuf], config: &ScanConfig) -> Vec<Result<SymbolScan>> {
    files
        .par_iter()
        .map(|path| {
            let result = scan_file(path, config);
            if let Ok(ref scan) = result {
                info!(
                    "Scanned {}: {}",
                    scan.symbol,
                    scan.frames
                        .iter()
                        .map(|f| format!("{}={}", f.timeframe, f.trend))
                        .collect::<Vec<_>>()
                        .join(" ")
                );
            }
            result
        })
        .collect()
}

fn scan_file(path: &Path, config: &ScanConfig) -> Result<SymbolScan> {
    let symbol = symbol_from_path(path)
        .ok_or_else(|| anyhow::anyhow!("Cannot derive symbol from {:?}", path))?;
    let bars = load_bars(path)?;
    if bars.is_empty() {
        warn!("{}: no bars in {:?}", symbol, path);
    }
    Ok(scan_symbol(&symbol, &bars, config))
}
