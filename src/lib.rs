// Library crate - relative candle classification, cycle segmentation and trend detection

pub mod cycle_core;
pub mod timeframe;
pub mod types;
pub mod config;
pub mod loader;
pub mod cache;
pub mod scanner;

// Re-export commonly used types
pub use cycle_core::{analyze, Bar, ClassifiedBar, Cycle, CycleEngine, EternalAnalysis, Phase, Trend};
pub use config::ScanConfig;
pub use timeframe::Timeframe;
pub use types::*;
