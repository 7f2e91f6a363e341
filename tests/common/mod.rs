#![allow(dead_code)]

use chrono::NaiveDate;
use marketsieve::domain::candidate::{Candidate, Quote};
use marketsieve::domain::error::SieveError;
pub use marketsieve::domain::ohlcv::OhlcvBar;
use marketsieve::ports::data_port::MarketDataSource;
use std::collections::HashMap;

/// In-memory data source: scripted universe, per-symbol bar series and an
/// explicit trading calendar.
pub struct MockDataSource {
    pub candidates: Vec<Candidate>,
    pub bars: HashMap<String, Vec<OhlcvBar>>,
    pub calendar: Vec<NaiveDate>,
    pub errors: HashMap<String, String>,
}

impl MockDataSource {
    pub fn new() -> Self {
        Self {
            candidates: Vec::new(),
            bars: HashMap::new(),
            calendar: Vec::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_candidate(mut self, symbol: &str, name: &str, market_cap: f64) -> Self {
        self.candidates.push(Candidate {
            symbol: symbol.to_string(),
            display_name: name.to_string(),
            market_cap,
        });
        self
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.bars.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_calendar(mut self, days: Vec<NaiveDate>) -> Self {
        self.calendar = days;
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl MarketDataSource for MockDataSource {
    fn list_candidates(&self, _as_of: Option<NaiveDate>) -> Result<Vec<Candidate>, SieveError> {
        Ok(self.candidates.clone())
    }

    fn get_history(
        &self,
        symbol: &str,
        _window_days: u32,
        min_bars: usize,
        as_of: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, SieveError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SieveError::DataSource {
                context: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        let mut bars = self.bars.get(symbol).cloned().unwrap_or_default();
        if let Some(end) = as_of {
            bars.retain(|b| b.date <= end);
        }
        if bars.len() < min_bars {
            return Err(SieveError::InsufficientHistory {
                symbol: symbol.to_string(),
                bars: bars.len(),
                minimum: min_bars,
            });
        }
        Ok(bars)
    }

    fn get_realtime_quotes(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, Quote>, SieveError> {
        Ok(symbols
            .iter()
            .filter_map(|s| {
                let last = self.bars.get(s)?.last()?;
                Some((
                    s.clone(),
                    Quote {
                        price: last.close,
                        change_pct: 0.0,
                    },
                ))
            })
            .collect())
    }

    fn get_trade_days(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>, SieveError> {
        Ok(self
            .calendar
            .iter()
            .copied()
            .filter(|d| (start..=end).contains(d))
            .collect())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(day: NaiveDate, close: f64, volume: i64) -> OhlcvBar {
    OhlcvBar {
        date: day,
        open: close,
        high: close + 0.5,
        low: close - 0.5,
        close,
        volume,
    }
}

/// `count` daily bars ending at `end`, flat at `close`.
pub fn flat_bars(end: NaiveDate, count: usize, close: f64) -> Vec<OhlcvBar> {
    (0..count)
        .map(|i| {
            make_bar(
                end - chrono::Duration::days((count - 1 - i) as i64),
                close,
                100_000,
            )
        })
        .collect()
}

/// `count` daily bars ending at `end`, rising linearly up to `end_close`.
pub fn rising_bars(end: NaiveDate, count: usize, end_close: f64) -> Vec<OhlcvBar> {
    (0..count)
        .map(|i| {
            let close = end_close * (0.7 + 0.3 * (i as f64 + 1.0) / count as f64);
            make_bar(
                end - chrono::Duration::days((count - 1 - i) as i64),
                close,
                100_000,
            )
        })
        .collect()
}
