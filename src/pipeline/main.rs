use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use eternal_cycles::cache;
use eternal_cycles::cycle_core::{aggregate_bars, analyze, EternalAnalysis};
use eternal_cycles::loader;
use eternal_cycles::scanner;
use eternal_cycles::timeframe::parse_timeframe_list;
use eternal_cycles::{ScanConfig, SymbolScan, Timeframe};

#[derive(Parser, Debug)]
#[command(name = "pipeline")]
#[command(about = "Relative candle cycle & trend analysis over bar files")]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Print verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a single bar file
    Analyze {
        /// Bar file (.csv, .csv.zst or .json)
        #[arg(short, long)]
        file: PathBuf,

        /// Resample to this timeframe before analysis (e.g. 1h)
        #[arg(short, long)]
        timeframe: Option<Timeframe>,

        /// Keep only the most recent N bars
        #[arg(short, long)]
        bar_limit: Option<usize>,

        /// Number of classified bars to print
        #[arg(long, default_value = "20")]
        show_bars: usize,

        /// Write the full analysis as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Scan every bar file in a directory across timeframes
    Scan {
        /// Directory containing bar files
        #[arg(short, long, env = "ETERNAL_DATA_DIR", default_value = "data")]
        data_dir: PathBuf,

        /// Only files whose name contains this string
        #[arg(short = 'F', long)]
        filter: Option<String>,

        /// Comma-separated timeframes
        #[arg(short, long, env = "ETERNAL_TIMEFRAMES", default_value = "15m,1h,4h,1d")]
        timeframes: String,

        /// Most recent bars analyzed per timeframe
        #[arg(short, long, default_value = "150")]
        bar_limit: usize,

        /// Cache directory for scan reports
        #[arg(short, long, env = "ETERNAL_CACHE_DIR")]
        cache_dir: Option<PathBuf>,
    },

    /// Print cached scan reports
    Show {
        /// Cache directory for scan reports
        #[arg(short, long, env = "ETERNAL_CACHE_DIR", default_value = "cache")]
        cache_dir: PathBuf,

        /// Only symbols containing this string
        #[arg(short, long)]
        symbol: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Commands::Analyze { file, timeframe, bar_limit, show_bars, output } => {
            run_analyze(file, timeframe, bar_limit, show_bars, output)?;
        }
        Commands::Scan { data_dir, filter, timeframes, bar_limit, cache_dir } => {
            let config = ScanConfig {
                timeframes: parse_timeframe_list(&timeframes)?,
                bar_limit,
                ..Default::default()
            }
            .normalized();
            // File I/O and the rayon pool stay off the async runtime
            tokio::task::spawn_blocking(move || run_scan(data_dir, filter, config, cache_dir))
                .await??;
        }
        Commands::Show { cache_dir, symbol } => {
            run_show(cache_dir, symbol)?;
        }
    }

    Ok(())
}

fn run_analyze(
    file: PathBuf,
    timeframe: Option<Timeframe>,
    bar_limit: Option<usize>,
    show_bars: usize,
    output: Option<PathBuf>,
) -> Result<()> {
    info!("=== ANALYZE MODE ===");
    info!("File: {:?}", file);

    let mut bars = loader::load_bars(&file)?;
    info!("Loaded {} bars", bars.len());

    if let Some(tf) = timeframe {
        bars = aggregate_bars(&bars, tf);
        info!("Resampled to {} {} bars", bars.len(), tf);
    }
    if let Some(limit) = bar_limit {
        if bars.len() > limit {
            bars.drain(..bars.len() - limit);
        }
    }

    let analysis = analyze(&bars);
    print_analysis(&analysis, show_bars);

    if let Some(path) = output {
        let json = serde_json::to_vec_pretty(&analysis)?;
        std::fs::write(&path, json).with_context(|| format!("Failed to write {:?}", path))?;
        info!("Wrote analysis to {:?}", path);
    }

    Ok(())
}

fn print_analysis(analysis: &EternalAnalysis, show_bars: usize) {
    let detail = analysis.trend_detail();

    println!("\n═══════════════════════════════════════════════════════════");
    println!("              RELATIVE CANDLE ANALYSIS                      ");
    println!("═══════════════════════════════════════════════════════════\n");

    println!("Bars:              {}", analysis.classified_bars.len());
    println!("Cycles:            {} ({} completed)", analysis.cycles.len(), analysis.completed_cycles().len());
    println!("Trend:             {}", analysis.trend);
    if detail.sufficient_history {
        println!(
            "  HH={} HL={} LH={} LL={}",
            detail.higher_high, detail.higher_low, detail.lower_high, detail.lower_low
        );
    }
    if let Some(phase) = analysis.current_phase() {
        println!("Current phase:     {}{}", phase, if analysis.phase_flip() { " (flipped)" } else { "" });
    }
    println!("Two cycles:        {}", analysis.two_cycle_pattern());

    println!("\n{:<6} {:<6} {:>10} {:>10} {:>10}", "CYCLE", "PHASE", "HIGH", "LOW", "BARS");
    for (i, cycle) in analysis.cycles.iter().enumerate() {
        println!(
            "{:<6} {:<6} {:>10.2} {:>10.2} {:>10}{}",
            i,
            cycle.phase.to_string(),
            cycle.high,
            cycle.low,
            cycle.len(),
            if cycle.is_open { "  (open)" } else { "" }
        );
    }

    if show_bars > 0 {
        println!("\n{:<25} {:<4} {:<6} {:>10} {:>10}", "TIME", "ST", "PHASE", "D.OPEN", "D.CLOSE");
        for cb in analysis.display_window(show_bars) {
            let time = chrono::DateTime::from_timestamp_millis(cb.bar.timestamp)
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| cb.bar.timestamp.to_string());
            println!(
                "{:<25} {:<4} {:<6} {:>10.2} {:>10.2}",
                time,
                cb.state.mnemonic(),
                cb.phase.to_string(),
                cb.display_open,
                cb.display_close
            );
        }
    }
    println!();
}

fn run_scan(
    data_dir: PathBuf,
    filter: Option<String>,
    config: ScanConfig,
    cache_dir: Option<PathBuf>,
) -> Result<()> {
    info!("=== SCAN MODE ===");
    info!("Data directory: {:?}", data_dir);
    info!("Config: {}", config);

    let files = loader::find_bar_files(&data_dir, filter.as_deref())?;
    info!("Found {} bar files to scan", files.len());

    if files.is_empty() {
        info!("No files to scan");
        return Ok(());
    }

    let mut scans = Vec::new();
    for (path, result) in files.iter().zip(scanner::scan_files(&files, &config)) {
        match result {
            Ok(scan) => scans.push(scan),
            Err(e) => warn!("Skipping {:?}: {:#}", path, e),
        }
    }

    if let Some(dir) = cache_dir {
        for scan in &scans {
            cache::save_scan(scan, &dir)?;
        }
        info!("Cached {} scans in {:?}", scans.len(), dir);
    }

    print_scans(&scans, &config.timeframes);
    Ok(())
}

fn run_show(cache_dir: PathBuf, symbol: Option<String>) -> Result<()> {
    let scans = cache::load_all_cached(&cache_dir, symbol.as_deref())?;
    if scans.is_empty() {
        anyhow::bail!("No cached scans found in {:?}. Run 'scan --cache-dir' first.", cache_dir);
    }

    let mut timeframes: Vec<Timeframe> = scans
        .iter()
        .flat_map(|s| s.frames.iter().map(|f| f.timeframe))
        .collect();
    timeframes.sort();
    timeframes.dedup();

    print_scans(&scans, &timeframes);
    Ok(())
}

fn print_scans(scans: &[SymbolScan], timeframes: &[Timeframe]) {
    print!("\n{:<12}", "SYMBOL");
    for tf in timeframes {
        print!(" {:>14}", tf.label());
    }
    println!();

    for scan in scans {
        print!("{:<12}", scan.symbol);
        for tf in timeframes {
            let cell = match scan.frame(*tf) {
                Some(frame) => {
                    let phase = frame.phase.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string());
                    format!("{}/{}{}", frame.trend, phase, if frame.phase_flip { "*" } else { "" })
                }
                None => "-".to_string(),
            };
            print!(" {:>14}", cell);
        }
        println!();
    }
    println!("\n(trend/phase, * = phase flipped on the last bar)\n");
}
