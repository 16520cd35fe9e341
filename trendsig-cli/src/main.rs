//! TrendSig CLI: run, signals and download commands.
//!
//! Commands:
//! - `run`: execute a signal run from a TOML config file and save artifacts
//! - `signals`: quick run over a CSV file or synthetic bars, printed to the terminal
//! - `download`: fetch bars from the market-data API and write them as CSV

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use trendsig_core::data::{write_bars_csv, CircuitBreaker, DataProvider, HttpProvider};
use trendsig_core::domain::CompositeSignal;
use trendsig_core::signals::SignalConfig;
use trendsig_runner::config::{DEFAULT_BASE_URL, DEFAULT_TOKEN_ENV};
use trendsig_runner::{
    init_logging, run_signals, save_artifacts, DataConfig, DataSourceConfig, LogFormat,
    OutputConfig, RunConfig, RunError, SignalRun,
};

/// Exit code for failures worth retrying later (EX_TEMPFAIL).
const EXIT_RETRY_LATER: i32 = 75;

#[derive(Parser)]
#[command(
    name = "trendsig",
    about = "TrendSig CLI: Supertrend signals with dual confirmation"
)]
struct Cli {
    /// Log format: pretty or json.
    #[arg(long, global = true, default_value = "pretty")]
    log_format: LogFormat,

    /// Also append logs to this file (e.g. trading_signals.log).
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a signal run from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Output directory for artifacts. Overrides `[output] dir`.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Compute signals over a CSV file or synthetic bars and print them.
    Signals {
        /// CSV file with timestamp,open,high,low,close,volume columns.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Generate this many synthetic bars instead of reading a file.
        #[arg(long)]
        synthetic: Option<usize>,

        /// Seed for synthetic bars.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Symbol label for the run.
        #[arg(long, default_value = "SYNTH")]
        symbol: String,

        /// Bar interval (e.g. 5m, 1h, 1d).
        #[arg(long, default_value = "1d")]
        interval: String,

        #[arg(long, default_value_t = 10)]
        atr_period: usize,

        /// Fast band multiplier.
        #[arg(long, default_value_t = 3.0)]
        fast: f64,

        /// Slow band multiplier (dual confirmation).
        #[arg(long, default_value_t = 4.0)]
        slow: f64,

        /// Single Supertrend instead of dual confirmation.
        #[arg(long, default_value_t = false)]
        single: bool,

        /// Number of trailing bars to print.
        #[arg(long, default_value_t = 20)]
        tail: usize,
    },
    /// Download bars for one symbol and write them as CSV.
    Download {
        /// Symbol (e.g. NSE:SBIN-EQ, AAPL).
        symbol: String,

        /// Bar interval (e.g. 5m, 1h, 1d).
        #[arg(long, default_value = "1d")]
        interval: String,

        /// API base URL.
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        base_url: String,

        /// Environment variable holding the bearer token.
        #[arg(long, default_value = DEFAULT_TOKEN_ENV)]
        token_env: String,

        /// Output CSV path.
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Run { config, output_dir } => run_cmd(config, output_dir),
        Commands::Signals {
            csv,
            synthetic,
            seed,
            symbol,
            interval,
            atr_period,
            fast,
            slow,
            single,
            tail,
        } => {
            let source = match (csv, synthetic) {
                (Some(path), None) => DataSourceConfig::Csv { path },
                (None, Some(bars)) => DataSourceConfig::Synthetic { bars, seed },
                (Some(_), Some(_)) => bail!("--csv and --synthetic are mutually exclusive"),
                (None, None) => bail!("one of --csv or --synthetic is required"),
            };
            let signal = if single {
                SignalConfig::single(atr_period, fast)
            } else {
                SignalConfig::dual(atr_period, fast, slow)
            };
            let config = RunConfig {
                data: DataConfig {
                    symbol,
                    interval,
                    source,
                },
                signal,
                output: OutputConfig::default(),
            };
            signals_cmd(&config, tail)
        }
        Commands::Download {
            symbol,
            interval,
            base_url,
            token_env,
            out,
        } => download_cmd(&symbol, &interval, &base_url, &token_env, &out),
    }
}

fn run_cmd(config_path: PathBuf, output_dir: Option<PathBuf>) -> Result<()> {
    let config = RunConfig::from_file(&config_path)?;
    let run = execute(&config)?;

    print_summary(&run);

    let output_dir = output_dir.unwrap_or_else(|| config.output.dir.clone());
    let run_dir = save_artifacts(&run, &output_dir)?;
    println!("Artifacts saved to: {}", run_dir.display());

    Ok(())
}

fn signals_cmd(config: &RunConfig, tail: usize) -> Result<()> {
    let run = execute(config)?;
    print_table(&run, tail);
    println!();
    print_events(&run);
    println!();
    print_summary(&run);
    Ok(())
}

fn download_cmd(
    symbol: &str,
    interval: &str,
    base_url: &str,
    token_env: &str,
    out: &std::path::Path,
) -> Result<()> {
    let circuit_breaker = Arc::new(CircuitBreaker::default_provider());
    let mut provider = HttpProvider::new(base_url, circuit_breaker)?;
    match std::env::var(token_env) {
        Ok(token) if !token.is_empty() => provider = provider.with_token(token),
        _ => tracing::warn!(var = token_env, "API token variable not set"),
    }

    let result = provider
        .fetch(symbol, interval)
        .with_context(|| format!("failed to download {symbol} ({interval})"))?;
    write_bars_csv(out, &result.bars)
        .with_context(|| format!("failed to write {}", out.display()))?;
    println!(
        "Downloaded {} bars for {symbol} ({interval}) to {}",
        result.bars.len(),
        out.display()
    );
    Ok(())
}

/// Run, turning retryable upstream failures into a distinct exit code.
fn execute(config: &RunConfig) -> Result<SignalRun> {
    match run_signals(config) {
        Ok(run) => Ok(run),
        Err(e) if e.is_retryable() => {
            eprintln!("Upstream data unavailable, try again later: {e}");
            std::process::exit(EXIT_RETRY_LATER);
        }
        Err(e @ RunError::Config(_)) => Err(e).context("invalid run configuration"),
        Err(e) => Err(e.into()),
    }
}

fn signal_label(signal: Option<CompositeSignal>) -> &'static str {
    match signal {
        Some(CompositeSignal::Long) => "LONG",
        Some(CompositeSignal::Short) => "SHORT",
        Some(CompositeSignal::Flat) => "FLAT",
        None => "-",
    }
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".into())
}

fn print_table(run: &SignalRun, tail: usize) {
    let report = &run.report;
    let changes = report.position_changes();
    let start = run.bar_count.saturating_sub(tail);

    println!(
        "{:<25} {:>10} {:>10} {:<8} {:>10} {:<8} {:<6} {:>4}",
        "Timestamp", "Close", "Fast", "Dir", "Slow", "Dir", "Signal", "Chg"
    );
    println!("{}", "-".repeat(90));
    for i in start..run.bar_count {
        let fast = report.fast.states[i];
        let slow = report.slow.as_ref().and_then(|s| s.states[i]);
        let dir = |s: Option<trendsig_core::indicators::SupertrendState>| {
            s.map(|s| format!("{:?}", s.direction))
                .unwrap_or_else(|| "-".into())
        };
        println!(
            "{:<25} {:>10} {:>10} {:<8} {:>10} {:<8} {:<6} {:>4}",
            run.bars[i].timestamp.format("%Y-%m-%d %H:%M"),
            fmt_opt(run.bars[i].close_value()),
            fmt_opt(fast.map(|s| s.trend_value)),
            dir(fast),
            fmt_opt(slow.map(|s| s.trend_value)),
            dir(slow),
            signal_label(report.composite[i]),
            changes[i].map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
        );
    }
}

fn print_events(run: &SignalRun) {
    if run.report.events.is_empty() {
        println!("No crossover events.");
        return;
    }
    println!("Crossover events ({}):", run.report.events.len());
    for e in &run.report.events {
        println!(
            "  [{:>5}] {}  {:<5} -> {:<5} {:?}",
            e.index,
            e.timestamp.format("%Y-%m-%d %H:%M"),
            signal_label(Some(e.from)),
            signal_label(Some(e.to)),
            e.kind
        );
    }
}

fn print_summary(run: &SignalRun) {
    let report = &run.report;
    let cfg = &report.config;
    println!("=== Signal Summary ===");
    println!("Symbol:        {} ({})", run.symbol, run.interval);
    println!("Source:        {:?}", run.source);
    println!("Bars:          {}", run.bar_count);
    match (cfg.slow_multiplier, cfg.use_dual_confirmation) {
        (Some(slow), true) => println!(
            "Supertrend:    ATR {} x {} / x {} (dual confirmation)",
            cfg.atr_period, cfg.fast_multiplier, slow
        ),
        _ => println!(
            "Supertrend:    ATR {} x {}",
            cfg.atr_period, cfg.fast_multiplier
        ),
    }
    println!("Events:        {}", report.events.len());
    match report.latest_signal() {
        Some((i, s)) => println!(
            "Latest signal: {} at {}",
            signal_label(Some(s)),
            run.bars[i].timestamp.format("%Y-%m-%d %H:%M")
        ),
        None => println!("Latest signal: none (need {} bars)", cfg.required_bars()),
    }
    for notice in &report.notices {
        println!("Notice:        {notice}");
    }
    println!("Config hash:   {}", run.config_hash);
    println!("Dataset hash:  {}", run.dataset_hash);
}
