//! CLI definition and dispatch.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvDataAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::momentum_factors::MomentumFactors;
use crate::domain::backtest::{BacktestConfig, BacktestEngine};
use crate::domain::cancel::CancelToken;
use crate::domain::config::StrategyConfig;
use crate::domain::error::SieveError;
use crate::domain::pipeline::{RetryPolicy, SelectionPipeline};
use crate::domain::rate_limit::RateLimiter;
use crate::domain::report::{BacktestRunReport, NavPoint, SelectionReport};
use crate::domain::strategy::{PipelineStrategy, Strategy, preset};
use crate::ports::config_port::ConfigPort;

#[derive(Parser, Debug)]
#[command(name = "marketsieve", about = "Multi-factor equity screener and backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a selection for one date and write the report
    Select {
        /// Directory holding universe.csv, calendar.csv and per-symbol bars
        #[arg(short, long)]
        data: PathBuf,
        /// Built-in preset name
        #[arg(short, long, default_value = "comprehensive")]
        strategy: String,
        /// INI file with [strategy]/[weights] overrides
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Selection date, YYYY-MM-DD (today when omitted)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Report path; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Simulate a strategy over a date range
    Backtest {
        #[arg(short, long)]
        data: PathBuf,
        #[arg(short, long, default_value = "comprehensive")]
        strategy: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check a strategy preset plus overrides without running anything
    Validate {
        #[arg(short, long, default_value = "comprehensive")]
        strategy: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Command::Select {
            data,
            strategy,
            config,
            date,
            output,
        } => run_select(&data, &strategy, config.as_ref(), date, output.as_ref()),
        Command::Backtest {
            data,
            strategy,
            config,
            start,
            end,
            output,
        } => run_backtest(&data, &strategy, config.as_ref(), start, end, output.as_ref()),
        Command::Validate { strategy, config } => run_validate(&strategy, config.as_ref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(&err)
        }
    }
}

fn load_strategy_config(
    preset_name: &str,
    config_path: Option<&PathBuf>,
) -> Result<StrategyConfig, SieveError> {
    let cfg = preset(preset_name)?;
    match config_path {
        Some(path) => {
            let overrides = FileConfigAdapter::from_file(path)?;
            cfg.apply_overrides(&overrides)
        }
        None => Ok(cfg),
    }
}

fn build_pipeline(
    data_dir: &PathBuf,
    cfg: StrategyConfig,
    config_path: Option<&PathBuf>,
) -> Result<SelectionPipeline, SieveError> {
    // A file-backed source needs no throttling; the knob exists for sources
    // that do.
    let min_interval_ms = match config_path {
        Some(path) => FileConfigAdapter::from_file(path)?.get_int("data", "min_interval_ms", 0),
        None => 0,
    };
    SelectionPipeline::new(
        Arc::new(CsvDataAdapter::new(data_dir.clone())),
        Arc::new(MomentumFactors),
        Arc::new(RateLimiter::new(Duration::from_millis(
            min_interval_ms.max(0) as u64,
        ))),
        RetryPolicy::default(),
        cfg,
    )
}

fn write_report(output: Option<&PathBuf>, json: &str) -> Result<(), SieveError> {
    match output {
        Some(path) => {
            fs::write(path, json)?;
            info!(path = %path.display(), "report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, SieveError> {
    serde_json::to_string_pretty(value).map_err(|e| SieveError::DataSource {
        context: "report".to_string(),
        reason: format!("JSON encode failed: {e}"),
    })
}

fn run_select(
    data_dir: &PathBuf,
    preset_name: &str,
    config_path: Option<&PathBuf>,
    date: Option<NaiveDate>,
    output: Option<&PathBuf>,
) -> Result<(), SieveError> {
    let cfg = load_strategy_config(preset_name, config_path)?;
    let strategy_name = cfg.name.clone();
    let pipeline = build_pipeline(data_dir, cfg, config_path)?;

    let cancel = CancelToken::new();
    let stocks = pipeline.select(date, &cancel)?;
    info!(strategy = %strategy_name, picked = stocks.len(), "selection finished");

    let report_date = date.unwrap_or_else(|| Local::now().date_naive());
    let report = SelectionReport::new(report_date, &strategy_name, stocks);
    write_report(output, &to_json(&report)?)
}

fn run_backtest(
    data_dir: &PathBuf,
    preset_name: &str,
    config_path: Option<&PathBuf>,
    start: NaiveDate,
    end: NaiveDate,
    output: Option<&PathBuf>,
) -> Result<(), SieveError> {
    let cfg = load_strategy_config(preset_name, config_path)?;
    let (initial_capital, commission_rate) = match config_path {
        Some(path) => {
            let ini = FileConfigAdapter::from_file(path)?;
            (
                ini.get_double("backtest", "initial_capital", 1_000_000.0),
                ini.get_double("backtest", "commission_rate", 0.0003),
            )
        }
        None => (1_000_000.0, 0.0003),
    };

    let data = Arc::new(CsvDataAdapter::new(data_dir.clone()));
    let strategy = PipelineStrategy::new(build_pipeline(data_dir, cfg, config_path)?);
    let mut engine = BacktestEngine::new(
        Arc::clone(&data) as Arc<dyn crate::ports::data_port::MarketDataSource>,
        BacktestConfig {
            start,
            end,
            initial_capital,
            commission_rate,
        },
    )?;

    let cancel = CancelToken::new();
    let result = engine.run(&strategy, &cancel)?;

    let report = BacktestRunReport {
        strategy: strategy.name().to_string(),
        start,
        end,
        initial_capital,
        performance: result.performance,
        nav_history: result.nav_history.iter().map(NavPoint::from).collect(),
        skipped_days: result.skipped_days,
    };
    write_report(output, &to_json(&report)?)
}

fn run_validate(preset_name: &str, config_path: Option<&PathBuf>) -> Result<(), SieveError> {
    let cfg = load_strategy_config(preset_name, config_path)?;
    println!(
        "ok: strategy {:?} ({} factors, min_score {}, max_results {})",
        cfg.name,
        cfg.weights.len(),
        cfg.min_score,
        cfg.max_results
    );
    Ok(())
}
