//! Persisted result schemas.
//!
//! The JSON field names are the stable on-disk contract consumed by
//! downstream tooling; keep them camelCase exactly as serialized here.

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::candidate::ScoredCandidate;
use crate::domain::performance::PerformanceReport;
use crate::domain::portfolio::NavSnapshot;

/// One selection run, ready to be written as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionReport {
    pub date: NaiveDate,
    pub strategy: String,
    pub stocks: Vec<ScoredCandidate>,
    pub summary: SelectionSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectionSummary {
    #[serde(rename = "totalRecommended")]
    pub total_recommended: usize,
    #[serde(rename = "avgScore")]
    pub avg_score: f64,
}

impl SelectionReport {
    pub fn new(date: NaiveDate, strategy: &str, stocks: Vec<ScoredCandidate>) -> Self {
        let total = stocks.len();
        let avg_score = if total > 0 {
            stocks.iter().map(|s| s.score).sum::<f64>() / total as f64
        } else {
            0.0
        };
        SelectionReport {
            date,
            strategy: strategy.to_string(),
            stocks,
            summary: SelectionSummary {
                total_recommended: total,
                avg_score,
            },
        }
    }
}

/// One backtest run, ready to be written as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestRunReport {
    pub strategy: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(rename = "initialCapital")]
    pub initial_capital: f64,
    pub performance: PerformanceReport,
    #[serde(rename = "navHistory")]
    pub nav_history: Vec<NavPoint>,
    #[serde(rename = "skippedDays")]
    pub skipped_days: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct NavPoint {
    pub date: NaiveDate,
    #[serde(rename = "totalValue")]
    pub total_value: f64,
}

impl From<&NavSnapshot> for NavPoint {
    fn from(snapshot: &NavSnapshot) -> Self {
        NavPoint {
            date: snapshot.date,
            total_value: snapshot.total_value,
        }
    }
}
