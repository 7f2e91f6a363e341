//! Portfolio state, rebalancing, and NAV history.
//!
//! The portfolio is owned exclusively by the backtest engine's single thread;
//! no locking. Every mutating operation maintains `cash >= 0`.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::domain::candidate::Candidate;

/// Absorbs float rounding when the even split spends the cash balance down
/// to exactly zero.
const CASH_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    /// Fractional shares; a position exists only while `shares > 0`.
    pub shares: f64,
    /// Last execution price, also the stale-price valuation fallback.
    pub cost_price: f64,
}

/// One end-of-day valuation point. Append-only, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct NavSnapshot {
    pub date: NaiveDate,
    pub total_value: f64,
}

#[derive(Debug, Clone)]
pub struct Portfolio {
    pub cash: f64,
    pub positions: HashMap<String, Position>,
    pub history: Vec<NavSnapshot>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            positions: HashMap::new(),
            history: Vec::new(),
        }
    }

    /// Mark-to-market total value. A symbol missing from `prices` is valued
    /// at its cost price (suspended trading); that is a data-quality
    /// condition, not an error.
    pub fn total_value(&self, prices: &HashMap<String, f64>) -> f64 {
        let stock_value: f64 = self
            .positions
            .values()
            .map(|pos| {
                let price = prices.get(&pos.symbol).copied().unwrap_or_else(|| {
                    warn!(symbol = %pos.symbol, cost_price = pos.cost_price,
                          "no market price, valuing at cost");
                    pos.cost_price
                });
                pos.shares * price
            })
            .sum();
        self.cash + stock_value
    }

    /// Full liquidate-and-rebuy rebalance.
    ///
    /// Sells every position (market price, else cost-price fallback), then
    /// splits the cash evenly across `targets`, sizing each buy net of
    /// commission so the full slice including fees fits in the budget. A
    /// target without a positive price is skipped alone; the rebalance never
    /// aborts and a NAV snapshot is always appended.
    pub fn rebalance(
        &mut self,
        date: NaiveDate,
        targets: &[Candidate],
        prices: &HashMap<String, f64>,
        commission_rate: f64,
    ) {
        for position in std::mem::take(&mut self.positions).into_values() {
            let price = prices.get(&position.symbol).copied().unwrap_or_else(|| {
                warn!(symbol = %position.symbol, cost_price = position.cost_price,
                      "liquidating at stale cost price");
                position.cost_price
            });
            let proceeds = position.shares * price;
            self.cash += proceeds - proceeds * commission_rate;
        }

        if !targets.is_empty() {
            let slice = self.cash / targets.len() as f64;
            for target in targets {
                let Some(&price) = prices.get(&target.symbol) else {
                    debug!(symbol = %target.symbol, "no price for target, skipping buy");
                    continue;
                };
                if price <= 0.0 {
                    debug!(symbol = %target.symbol, price, "non-positive price, skipping buy");
                    continue;
                }

                let notional = slice / (1.0 + commission_rate);
                if notional <= 0.0 {
                    continue;
                }
                let commission = notional * commission_rate;
                let debit = notional + commission;
                if debit > self.cash + CASH_EPSILON {
                    debug!(symbol = %target.symbol, debit, cash = self.cash,
                           "buy would overdraw cash, skipping");
                    continue;
                }

                self.cash = (self.cash - debit).max(0.0);
                self.positions.insert(
                    target.symbol.clone(),
                    Position {
                        symbol: target.symbol.clone(),
                        shares: notional / price,
                        cost_price: price,
                    },
                );
            }
        }

        let total_value = self.total_value(prices);
        self.history.push(NavSnapshot { date, total_value });
    }
}
