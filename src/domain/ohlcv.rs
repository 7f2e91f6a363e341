//! OHLCV bar representation.

use chrono::NaiveDate;

/// One daily price bar. A history series is a `Vec<OhlcvBar>` sorted
/// ascending by date with no duplicate dates.
#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Close of the most recent bar, or `None` for an empty series.
pub fn last_close(history: &[OhlcvBar]) -> Option<f64> {
    history.last().map(|bar| bar.close)
}

/// Percentage gain from the first to the last close.
pub fn window_gain_pct(history: &[OhlcvBar]) -> Option<f64> {
    let first = history.first()?.close;
    let last = history.last()?.close;
    if first > 0.0 {
        Some((last / first - 1.0) * 100.0)
    } else {
        None
    }
}
