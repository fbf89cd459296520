use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use eternal_cycles::cycle_core::aggregate_bars;
use eternal_cycles::loader::{load_bars, symbol_from_path};
use eternal_cycles::{diff_snapshots, Bar, CycleEngine, EternalAnalysis, ScanConfig, Timeframe, WatchEvent};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Bar file to watch (.csv, .csv.zst or .json)
    #[arg(short, long, env = "ETERNAL_BAR_FILE")]
    file: PathBuf,

    /// Symbol name for events (defaults to the file name)
    #[arg(short, long, env = "ETERNAL_SYMBOL")]
    symbol: Option<String>,

    /// Resample bars to this timeframe before analysis
    #[arg(short, long, env = "ETERNAL_TIMEFRAME")]
    timeframe: Option<Timeframe>,

    /// Seconds between polls of the bar file
    #[arg(short, long, env = "ETERNAL_POLL_SECS", default_value = "5")]
    interval: u64,

    /// Most recent bars kept in the analysis window
    #[arg(short, long, env = "ETERNAL_BAR_LIMIT", default_value = "150")]
    window: usize,
}

/// Bars from the file that the engine has not seen yet.
///
/// The bar sharing the engine's last timestamp is included so a still
/// forming bar is repainted. A cold engine only gets the last `window` bars.
fn pending_bars(engine: &CycleEngine, bars: &[Bar], window: usize) -> Vec<Bar> {
    match engine.last_timestamp() {
        Some(last) => bars.iter().filter(|b| b.timestamp >= last).copied().collect(),
        None => bars[bars.len().saturating_sub(window)..].to_vec(),
    }
}

async fn poll_bars(path: PathBuf, timeframe: Option<Timeframe>) -> Result<Vec<Bar>> {
    let bars = tokio::task::spawn_blocking(move || load_bars(&path)).await??;
    Ok(match timeframe {
        Some(tf) => aggregate_bars(&bars, tf),
        None => bars,
    })
}

fn report(events: &[WatchEvent]) -> Result<()> {
    for event in events {
        match event {
            WatchEvent::TrendChanged { symbol, from, to, .. } => {
                info!("{}: trend {} -> {}", symbol, from, to);
            }
            WatchEvent::PhaseFlip { symbol, phase, .. } => {
                info!("{}: phase flipped to {}", symbol, phase);
            }
            WatchEvent::CycleClosed { symbol, cycle } => {
                info!(
                    "{}: {} cycle closed high={:.2} low={:.2} bars={}",
                    symbol,
                    cycle.phase,
                    cycle.high,
                    cycle.low,
                    cycle.len()
                );
            }
        }
        println!("{}", serde_json::to_string(event)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("eternal_cycles=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let symbol = match args.symbol.clone() {
        Some(symbol) => symbol,
        None => symbol_from_path(&args.file)
            .with_context(|| format!("Cannot derive symbol from {:?}", args.file))?,
    };
    let config = ScanConfig {
        timeframes: args.timeframe.into_iter().collect(),
        bar_limit: args.window,
        poll_interval_secs: args.interval,
        ..Default::default()
    };

    info!("Starting Eternal cycle watcher");
    info!("File: {:?}", args.file);
    info!("Symbol: {}", symbol);
    info!("Config: {}", config);

    let mut engine = CycleEngine::with_window(config.bar_limit);
    let mut previous = EternalAnalysis::default();

    let mut ticker = tokio::time::interval(config.poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }

        let bars = match poll_bars(args.file.clone(), args.timeframe).await {
            Ok(bars) => bars,
            Err(e) => {
                error!("Failed to load {:?}: {:#}", args.file, e);
                continue;
            }
        };

        // The file was truncated or rewritten with older data
        if let (Some(last), Some(newest)) = (engine.last_timestamp(), bars.last()) {
            if newest.timestamp < last {
                warn!("{}: bar file went backwards, resetting", symbol);
                engine.clear();
                previous = EternalAnalysis::default();
            }
        }

        let pending = pending_bars(&engine, &bars, config.bar_limit);
        if pending.is_empty() {
            continue;
        }

        let repaints = engine.extend(pending.iter().copied());
        let snapshot = engine.snapshot();
        debug!(
            "{}: fed {} bars ({} repainted), window={} rebuilds={}",
            symbol,
            pending.len(),
            repaints,
            engine.len(),
            engine.rebuilds()
        );

        if previous.classified_bars.is_empty() {
            info!(
                "{}: {} bars, trend={} phase={}",
                symbol,
                snapshot.classified_bars.len(),
                snapshot.trend,
                snapshot
                    .current_phase()
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "-".to_string())
            );
        }

        report(&diff_snapshots(&symbol, &previous, &snapshot))?;
        previous = snapshot;
    }

    Ok(())
}
