//! Sentiwatch CLI: fetch, score, align, and summarize one ticker.
//!
//! Commands:
//! - `run`: fetch live prices and news, then run the pipeline
//! - `replay`: run the pipeline over saved `price.json` / `news.json` payloads

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use sentiwatch_core::domain::{IntradayInterval, SeriesKind};
use sentiwatch_core::sentiment::ScorerRegistry;
use sentiwatch_runner::config::ConfigError;
use sentiwatch_runner::{
    export_json, save_artifacts, Credentials, Pipeline, PipelineOutput, RunConfig, Settings,
};

#[derive(Parser)]
#[command(
    name = "sentiwatch",
    about = "Sentiwatch CLI: news sentiment against price for one ticker"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch live prices and news, then score, align, and summarize.
    Run {
        #[command(flatten)]
        run: RunArgs,
    },
    /// Run over raw payloads saved in a directory (price.json, news.json).
    Replay {
        /// Directory holding price.json and news.json.
        #[arg(long)]
        dir: PathBuf,

        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Ticker symbol (e.g., IBM). Required unless --config provides one.
    #[arg(long)]
    symbol: Option<String>,

    /// Path to a TOML run config. Flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Series kind: intraday, daily, weekly, monthly.
    #[arg(long)]
    series: Option<String>,

    /// Intraday interval: 1min, 5min, 15min, 30min, 60min. Implies --series intraday.
    #[arg(long)]
    interval: Option<IntradayInterval>,

    /// Moving average window, 1 to 100 bars.
    #[arg(long)]
    ma_window: Option<usize>,

    /// Also compute Bollinger bands.
    #[arg(long, default_value_t = false)]
    bollinger: bool,

    /// Number of news articles to request, 1 to 100.
    #[arg(long)]
    articles: Option<usize>,

    /// Settings file with [api_keys], [http] and [model] tables.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Write run.json, aligned CSVs, and report.md under this directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Print the full run output as JSON instead of the text summary.
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { run } => run_cmd(None, run),
        Commands::Replay { dir, run } => run_cmd(Some(dir), run),
    }
}

/// Install an INFO-default `tracing` subscriber writing to stderr.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init()
}

fn run_cmd(replay_dir: Option<PathBuf>, args: RunArgs) -> Result<()> {
    let config = build_run_config(&args)?;
    let settings = load_settings(args.settings.as_deref())?;

    // Scorer backends are initialized once per process.
    let scorers = ScorerRegistry::initialize(settings.model_config(|name| std::env::var(name).ok())?);

    let pipeline = match &replay_dir {
        Some(dir) => {
            if !dir.is_dir() {
                bail!("replay directory does not exist: {}", dir.display());
            }
            Pipeline::replay(dir, scorers)
        }
        None => {
            let credentials = Credentials::from_env(&settings)?;
            Pipeline::live(&settings, &credentials, scorers)?
        }
    };

    let output = pipeline.run(&config)?;

    if args.json {
        println!("{}", export_json(&output)?);
    } else {
        print_summary(&output);
    }

    if let Some(output_dir) = &args.output_dir {
        let run_dir = save_artifacts(&output, output_dir)?;
        info!(dir = %run_dir.display(), "artifacts saved");
        if !args.json {
            println!("Artifacts saved to: {}", run_dir.display());
        }
    }

    Ok(())
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::from_file(path).context("failed to load settings"),
        None => Ok(Settings::default()),
    }
}

fn build_run_config(args: &RunArgs) -> Result<RunConfig> {
    let mut config = match (&args.config, &args.symbol) {
        (Some(path), _) => RunConfig::from_file(path)?,
        (None, Some(symbol)) => RunConfig::new(symbol.clone(), SeriesKind::Daily),
        (None, None) => bail!("one of --symbol or --config is required"),
    };

    if let Some(symbol) = &args.symbol {
        config.symbol = symbol.clone();
    }
    match (&args.series, args.interval) {
        (Some(name), interval) => {
            config.series =
                SeriesKind::parse(name, interval).map_err(ConfigError::InvalidSeries)?;
        }
        (None, Some(interval)) => config.series = SeriesKind::Intraday(interval),
        (None, None) => {}
    }
    if let Some(window) = args.ma_window {
        config.ma_window = window;
    }
    if args.bollinger {
        config.show_bollinger = true;
    }
    if let Some(count) = args.articles {
        config.article_count = count;
    }

    config.validate()?;
    Ok(config)
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{v:.precision$}"))
        .unwrap_or_else(|| "-".into())
}

fn print_summary(output: &PipelineOutput) {
    let s = &output.summary;
    println!();
    println!("=== Sentiment Run ===");
    println!("Symbol:         {}", s.symbol);
    println!("Series:         {}", output.config.series);
    if let (Some(first), Some(last)) = (s.first_timestamp, s.last_timestamp) {
        println!("Period:         {first} to {last}");
    }
    println!("Bars:           {}", s.bar_count);
    println!("Last Close:     {}", fmt_opt(s.last_close, 2));
    println!(
        "MA({:>3}):        {}",
        output.config.ma_window,
        fmt_opt(s.last_moving_average, 2)
    );
    println!(
        "Articles:       {} ({} skipped)",
        s.article_count, s.skipped_articles
    );
    println!();
    println!("--- Techniques ---");
    if s.techniques.is_empty() {
        println!("(none available)");
    }
    for (technique, t) in &s.techniques {
        println!(
            "{:<8} attached {:>4}  mean {:>7}  corr {:>7}",
            technique.as_str(),
            t.attached_records,
            fmt_opt(t.mean_score, 3),
            fmt_opt(t.correlation, 3)
        );
    }
    println!();
    println!("Digest:         {}", s.digest);
    for issue in &output.issues {
        println!("WARNING: {issue}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> RunArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Run { run } | Commands::Replay { run, .. } => run,
        }
    }

    #[test]
    fn flags_build_intraday_config() {
        let args = parse(&[
            "sentiwatch", "run", "--symbol", "ibm", "--interval", "15min", "--ma-window", "5",
            "--bollinger", "--articles", "25",
        ]);
        let config = build_run_config(&args).unwrap();
        assert_eq!(
            config.series,
            SeriesKind::Intraday(IntradayInterval::FifteenMinutes)
        );
        assert_eq!(config.ma_window, 5);
        assert!(config.show_bollinger);
        assert_eq!(config.article_count, 25);
    }

    #[test]
    fn symbol_or_config_is_required() {
        let args = parse(&["sentiwatch", "replay", "--dir", "payloads"]);
        assert!(build_run_config(&args).is_err());
    }

    #[test]
    fn interval_on_daily_series_is_rejected() {
        let args = parse(&[
            "sentiwatch", "run", "--symbol", "IBM", "--series", "daily", "--interval", "5min",
        ]);
        assert!(build_run_config(&args).is_err());
    }

    #[test]
    fn out_of_range_window_is_rejected() {
        let args = parse(&["sentiwatch", "run", "--symbol", "IBM", "--ma-window", "101"]);
        assert!(build_run_config(&args).is_err());
    }
}
