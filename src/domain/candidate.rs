//! Candidate and scored-candidate snapshots.

use serde::Serialize;

/// A symbol under consideration before scoring. Read-only snapshot from the
/// data source, immutable for the duration of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub symbol: String,
    pub display_name: String,
    pub market_cap: f64,
}

/// A realtime quote used by the enrichment pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub price: f64,
    pub change_pct: f64,
}

/// A candidate that passed filtering and scored above zero.
///
/// Invariants: `score` is finite and within [0, 100]; `reasons` is non-empty
/// whenever `score > 0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    #[serde(rename = "code")]
    pub symbol: String,
    #[serde(rename = "name")]
    pub display_name: String,
    pub score: f64,
    pub reasons: Vec<String>,
    pub price: f64,
    #[serde(rename = "changePct")]
    pub change_pct: f64,
    #[serde(rename = "marketCap")]
    pub market_cap: f64,
}

impl ScoredCandidate {
    pub fn new(candidate: &Candidate, score: f64, reasons: Vec<String>, price: f64) -> Self {
        ScoredCandidate {
            symbol: candidate.symbol.clone(),
            display_name: candidate.display_name.clone(),
            score,
            reasons,
            price,
            change_pct: 0.0,
            market_cap: candidate.market_cap,
        }
    }
}
