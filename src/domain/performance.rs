//! Performance metrics derived from the NAV history.

use serde::Serialize;

use crate::domain::portfolio::NavSnapshot;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Return/risk summary of one backtest run. Derived from the NAV history,
/// never stored. Every metric degrades to 0 (not NaN) when undefined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
    pub cumulative_return: f64,
    pub annualized_return: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
}

pub fn analyze(history: &[NavSnapshot], initial_capital: f64) -> PerformanceReport {
    let empty = PerformanceReport {
        cumulative_return: 0.0,
        annualized_return: 0.0,
        max_drawdown: 0.0,
        sharpe_ratio: 0.0,
    };
    let (Some(first), Some(last)) = (history.first(), history.last()) else {
        return empty;
    };
    if initial_capital <= 0.0 {
        return empty;
    }

    let cumulative_return = last.total_value / initial_capital - 1.0;

    // Annualization uses calendar days between first and last snapshot.
    let span_days = (last.date - first.date).num_days();
    let annualized_return = if span_days > 0 && cumulative_return > -1.0 {
        (1.0 + cumulative_return).powf(365.0 / span_days as f64) - 1.0
    } else {
        0.0
    };

    PerformanceReport {
        cumulative_return,
        annualized_return,
        max_drawdown: max_drawdown(history),
        sharpe_ratio: sharpe_ratio(history),
    }
}

fn max_drawdown(history: &[NavSnapshot]) -> f64 {
    let mut peak = f64::MIN;
    let mut max_dd = 0.0_f64;
    for snapshot in history {
        peak = peak.max(snapshot.total_value);
        if peak > 0.0 {
            max_dd = max_dd.max(1.0 - snapshot.total_value / peak);
        }
    }
    max_dd
}

fn sharpe_ratio(history: &[NavSnapshot]) -> f64 {
    if history.len() < 2 {
        return 0.0;
    }
    let returns: Vec<f64> = history
        .windows(2)
        .filter_map(|w| {
            let prev = w[0].total_value;
            (prev > 0.0).then(|| w[1].total_value / prev - 1.0)
        })
        .collect();
    if returns.is_empty() {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();
    if stddev > 0.0 {
        (mean / stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}
