//! Scan report cache
//!
//! Stores one zstd-compressed JSON report per symbol so the latest scan can
//! be inspected without reloading and re-analyzing the bar files.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::types::SymbolScan;

const CACHE_SUFFIX: &str = ".json.zst";

fn cache_path(symbol: &str, cache_dir: &Path) -> PathBuf {
    cache_dir.join(format!("{}{}", symbol, CACHE_SUFFIX))
}

/// Save a symbol scan to the cache directory
pub fn save_scan(scan: &SymbolScan, cache_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(cache_dir)
        .with_context(|| format!("Failed to create cache directory: {:?}", cache_dir))?;
    let path = cache_path(&scan.symbol, cache_dir);

    let json = serde_json::to_vec(scan)?;
    let compressed = zstd::encode_all(&json[..], 3)?;
    std::fs::write(&path, compressed).with_context(|| format!("Failed to write {:?}", path))?;

    Ok(path)
}

/// Load one symbol's scan from cache
pub fn load_scan(symbol: &str, cache_dir: &Path) -> Result<Option<SymbolScan>> {
    let path = cache_path(symbol, cache_dir);

    if !path.exists() {
        return Ok(None);
    }

    let compressed = std::fs::read(&path)?;
    let json = zstd::decode_all(&compressed[..])
        .with_context(|| format!("Failed to decompress {:?}", path))?;
    let scan: SymbolScan = serde_json::from_slice(&json)
        .with_context(|| format!("Failed to parse cached scan {:?}", path))?;

    Ok(Some(scan))
}

/// Check which symbols have cached scans
pub fn get_cached_symbols(cache_dir: &Path) -> Result<Vec<String>> {
    if !cache_dir.exists() {
        return Ok(vec![]);
    }

    let mut symbols = Vec::new();
    for entry in std::fs::read_dir(cache_dir)? {
        let entry = entry?;
        let filename = entry.file_name().to_string_lossy().to_string();
        if let Some(symbol) = filename.strip_suffix(CACHE_SUFFIX) {
            symbols.push(symbol.to_string());
        }
    }

    symbols.sort();
    Ok(symbols)
}

/// Load all cached scans, optionally only symbols containing `filter`
pub fn load_all_cached(cache_dir: &Path, filter: Option<&str>) -> Result<Vec<SymbolScan>> {
    let symbols: Vec<_> = get_cached_symbols(cache_dir)?
        .into_iter()
        .filter(|s| filter.map_or(true, |f| s.contains(f)))
        .collect();

    info!("Loading {} cached scans...", symbols.len());

    let results: Vec<_> = symbols
        .iter()
        .filter_map(|symbol| match load_scan(symbol, cache_dir) {
            Ok(Some(scan)) => Some(scan),
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to load cache for {}: {:#}", symbol, e);
                None
            }
        })
        .collect();

    info!("Loaded {} scans from cache", results.len());
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle_core::{analyze, Bar};
    use crate::timeframe::Timeframe;
    use crate::types::TimeframeReport;
    use chrono::Utc;

    fn scan(symbol: &str) -> SymbolScan {
        let bars = vec![
            Bar::new(0, 10.0, 12.0, 9.0, 11.0),
            Bar::new(60_000, 11.0, 14.0, 10.0, 13.0),
        ];
        SymbolScan {
            symbol: symbol.to_string(),
            scanned_at: Utc::now(),
            frames: vec![TimeframeReport::from_analysis(Timeframe::M1, &analyze(&bars))],
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let original = scan("ETHUSDT");
        let path = save_scan(&original, dir.path()).unwrap();
        assert!(path.ends_with("ETHUSDT.json.zst"));

        let loaded = load_scan("ETHUSDT", dir.path()).unwrap().unwrap();
        assert_eq!(loaded, original);
        assert!(load_scan("MISSING", dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_load_all_with_filter() {
        let dir = tempfile::tempdir().unwrap();
        for symbol in ["BTCUSDT", "ETHUSDT", "ES"] {
            save_scan(&scan(symbol), dir.path()).unwrap();
        }
        std::fs::write(dir.path().join("junk.json.zst"), b"not zstd").unwrap();

        assert_eq!(
            get_cached_symbols(dir.path()).unwrap(),
            vec!["BTCUSDT", "ES", "ETHUSDT", "junk"]
        );

        // Corrupt entries are skipped
        assert_eq!(load_all_cached(dir.path(), None).unwrap().len(), 3);
        let usdt = load_all_cached(dir.path(), Some("USDT")).unwrap();
        assert_eq!(usdt.len(), 2);
    }

    #[test]
    fn test_missing_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(get_cached_symbols(&missing).unwrap().is_empty());
        assert!(load_all_cached(&missing, None).unwrap().is_empty());
    }
}
