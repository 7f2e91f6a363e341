//! Historical simulation of a strategy over a trade-day range.
//!
//! The engine drives one portfolio through the trading calendar: each trade
//! day it asks the strategy for targets, prices the union of targets and held
//! positions from history as of that day, and rebalances. Days are strictly
//! sequential; only the selection inside the strategy is concurrent.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::domain::candidate::Candidate;
use crate::domain::cancel::CancelToken;
use crate::domain::error::SieveError;
use crate::domain::ohlcv::last_close;
use crate::domain::performance::{self, PerformanceReport};
use crate::domain::portfolio::{NavSnapshot, Portfolio};
use crate::domain::strategy::Strategy;
use crate::ports::data_port::MarketDataSource;

/// History window used only to price symbols on a rebalance day. Wide enough
/// to bridge a suspension of a few sessions.
const PRICING_WINDOW_DAYS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestConfig {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub initial_capital: f64,
    /// Applied to every buy and every sell, e.g. 0.0003 for 3 bps.
    pub commission_rate: f64,
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), SieveError> {
        if self.start > self.end {
            return Err(invalid("start", "start date must not be after end date"));
        }
        if self.initial_capital <= 0.0 {
            return Err(invalid("initial_capital", "initial_capital must be positive"));
        }
        if !(0.0..1.0).contains(&self.commission_rate) {
            return Err(invalid(
                "commission_rate",
                "commission_rate must be in [0, 1)",
            ));
        }
        Ok(())
    }
}

fn invalid(key: &str, reason: &str) -> SieveError {
    SieveError::ConfigInvalid {
        section: "backtest".to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacktestState {
    Idle,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone)]
pub struct BacktestReport {
    pub performance: PerformanceReport,
    pub nav_history: Vec<NavSnapshot>,
    pub trade_days: usize,
    pub skipped_days: usize,
}

pub struct BacktestEngine {
    data: Arc<dyn MarketDataSource>,
    cfg: BacktestConfig,
    state: BacktestState,
}

impl BacktestEngine {
    pub fn new(data: Arc<dyn MarketDataSource>, cfg: BacktestConfig) -> Result<Self, SieveError> {
        cfg.validate()?;
        Ok(BacktestEngine {
            data,
            cfg,
            state: BacktestState::Idle,
        })
    }

    pub fn state(&self) -> BacktestState {
        self.state
    }

    /// Run the simulation to completion. A failed trade day is logged and
    /// skipped without a NAV snapshot; a config error anywhere aborts the
    /// run, since every remaining day would fail the same way.
    pub fn run(
        &mut self,
        strategy: &dyn Strategy,
        cancel: &CancelToken,
    ) -> Result<BacktestReport, SieveError> {
        self.state = BacktestState::Running;
        match self.run_inner(strategy, cancel) {
            Ok(report) => {
                self.state = BacktestState::Completed;
                Ok(report)
            }
            Err(err) => {
                self.state = BacktestState::Failed;
                Err(err)
            }
        }
    }

    fn run_inner(
        &self,
        strategy: &dyn Strategy,
        cancel: &CancelToken,
    ) -> Result<BacktestReport, SieveError> {
        let trade_days = self.data.get_trade_days(self.cfg.start, self.cfg.end)?;
        if trade_days.is_empty() {
            return Err(SieveError::NoTradeDays {
                start: self.cfg.start.to_string(),
                end: self.cfg.end.to_string(),
            });
        }
        info!(
            strategy = strategy.name(),
            start = %self.cfg.start,
            end = %self.cfg.end,
            days = trade_days.len(),
            "backtest started"
        );

        let mut portfolio = Portfolio::new(self.cfg.initial_capital);
        let mut skipped_days = 0usize;

        for date in &trade_days {
            if cancel.is_canceled() {
                return Err(SieveError::Canceled);
            }
            match self.run_day(strategy, &mut portfolio, *date, cancel) {
                Ok(()) => {}
                Err(err) if err.is_config() => return Err(err),
                Err(SieveError::Canceled) => return Err(SieveError::Canceled),
                Err(err) => {
                    warn!(date = %date, error = %err, "trade day failed, skipping");
                    skipped_days += 1;
                }
            }
        }

        let performance = performance::analyze(&portfolio.history, self.cfg.initial_capital);
        info!(
            cumulative_return = performance.cumulative_return,
            max_drawdown = performance.max_drawdown,
            sharpe_ratio = performance.sharpe_ratio,
            skipped = skipped_days,
            "backtest completed"
        );

        Ok(BacktestReport {
            performance,
            nav_history: portfolio.history.clone(),
            trade_days: trade_days.len(),
            skipped_days,
        })
    }

    fn run_day(
        &self,
        strategy: &dyn Strategy,
        portfolio: &mut Portfolio,
        date: NaiveDate,
        cancel: &CancelToken,
    ) -> Result<(), SieveError> {
        let scored = strategy.select(Some(date), cancel)?;
        let targets: Vec<Candidate> = scored
            .iter()
            .map(|s| Candidate {
                symbol: s.symbol.clone(),
                display_name: s.display_name.clone(),
                market_cap: s.market_cap,
            })
            .collect();

        let prices = self.day_prices(&targets, portfolio, date);
        portfolio.rebalance(date, &targets, &prices, self.cfg.commission_rate);
        Ok(())
    }

    /// Price everything the rebalance can touch: today's targets plus every
    /// currently-held symbol. A symbol whose price cannot be fetched is left
    /// out of the map; the portfolio then falls back to its cost price.
    fn day_prices(
        &self,
        targets: &[Candidate],
        portfolio: &Portfolio,
        date: NaiveDate,
    ) -> HashMap<String, f64> {
        let symbols: HashSet<&str> = targets
            .iter()
            .map(|t| t.symbol.as_str())
            .chain(portfolio.positions.keys().map(String::as_str))
            .collect();

        let mut prices = HashMap::new();
        for symbol in symbols {
            match self
                .data
                .get_history(symbol, PRICING_WINDOW_DAYS, 1, Some(date))
            {
                Ok(bars) => {
                    if let Some(close) = last_close(&bars) {
                        prices.insert(symbol.to_string(), close);
                    }
                }
                Err(err) => {
                    warn!(symbol, date = %date, error = %err, "no price for rebalance day");
                }
            }
        }
        prices
    }
}
