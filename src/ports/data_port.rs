//! Market data source port trait.
//!
//! The single boundary absorbing all HTTP/scraping/vendor detail; the domain
//! never performs I/O directly. Calls are synchronous; callers are expected
//! to go through the rate limiter first and to wrap transient failures in
//! the retry policy. Implementations must be shareable across the selection
//! pipeline's worker threads.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::domain::candidate::{Candidate, Quote};
use crate::domain::error::SieveError;
use crate::domain::ohlcv::OhlcvBar;

pub trait MarketDataSource: Send + Sync {
    /// The candidate universe, optionally as of a historical date. An empty
    /// list is a valid result, not an error.
    fn list_candidates(&self, as_of: Option<NaiveDate>) -> Result<Vec<Candidate>, SieveError>;

    /// Up to `window_days` calendar days of daily bars ending at `as_of`
    /// (today when `None`), ascending by date. Fails with
    /// `SieveError::InsufficientHistory` when fewer than `min_bars` bars
    /// are available.
    fn get_history(
        &self,
        symbol: &str,
        window_days: u32,
        min_bars: usize,
        as_of: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, SieveError>;

    /// One batched realtime snapshot for the given symbols. Symbols without
    /// a quote are simply absent from the map.
    fn get_realtime_quotes(&self, symbols: &[String])
        -> Result<HashMap<String, Quote>, SieveError>;

    /// Trading calendar between two dates, inclusive, ascending.
    fn get_trade_days(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>, SieveError>;
}
