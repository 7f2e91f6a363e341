//! Factor evaluation port trait.
//!
//! Indicator math (moving averages, MACD, RSI, fundamentals lookups, ...)
//! lives behind this boundary. Each factor yields an independent sub-score;
//! the scoring engine owns weighting, clamping, and degradation policy.

use crate::domain::config::FactorKind;
use crate::domain::ohlcv::OhlcvBar;

/// One factor's verdict on one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorReading {
    /// Sub-score on the [0, 100] scale. Values outside the range are clamped
    /// by the scoring engine.
    pub score: f64,
    /// Human-readable signals backing the sub-score, e.g. "MACD golden cross".
    pub reasons: Vec<String>,
}

pub trait FactorSet: Send + Sync {
    /// Evaluate one factor over a candidate's history. `None` means this
    /// factor cannot be computed for this series (e.g. not enough bars for
    /// the indicator); the scoring engine treats that as a zero contribution
    /// rather than a failure.
    fn evaluate(&self, kind: FactorKind, history: &[OhlcvBar]) -> Option<FactorReading>;
}
