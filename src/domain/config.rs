//! Strategy configuration and validation.
//!
//! A `StrategyConfig` is constructed once (preset plus explicit user-override
//! merge), validated, and then passed by reference through the call graph.
//! Invalid configs are rejected at load time; weights are never silently
//! renormalized.

use std::collections::BTreeMap;

use crate::domain::error::SieveError;
use crate::ports::config_port::ConfigPort;

pub const WEIGHT_SUM_EPSILON: f64 = 1e-6;

/// One independently-computed input dimension of the composite score.
///
/// `ALL` fixes the evaluation order so reasons and scores are reproducible
/// regardless of weight values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FactorKind {
    Technical,
    Fundamental,
    Sentiment,
    Industry,
}

impl FactorKind {
    pub const ALL: [FactorKind; 4] = [
        FactorKind::Technical,
        FactorKind::Fundamental,
        FactorKind::Sentiment,
        FactorKind::Industry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FactorKind::Technical => "technical",
            FactorKind::Fundamental => "fundamental",
            FactorKind::Sentiment => "sentiment",
            FactorKind::Industry => "industry",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub name: String,
    /// Per-factor weights; must sum to 1.0 within `WEIGHT_SUM_EPSILON`.
    pub weights: BTreeMap<FactorKind, f64>,
    /// Minimum composite score for a candidate to be emitted, in [0, 100].
    pub min_score: f64,
    /// Final result count after ranking.
    pub max_results: usize,
    /// Optional market-cap band; `None` disables that bound.
    pub min_market_cap: Option<f64>,
    pub max_market_cap: Option<f64>,
    /// Calendar days of history requested per candidate.
    pub history_window: u32,
    /// Minimum bars required before a candidate is scored.
    pub min_history_bars: usize,
    /// Worker pool size for the selection pipeline.
    pub max_workers: usize,
    /// Display-name markers that exclude a candidate outright
    /// (special treatment / delisting flags).
    pub name_blacklist: Vec<String>,
}

impl StrategyConfig {
    /// Check every construction-time invariant. Called by the preset factory
    /// and again after an override merge.
    pub fn validate(&self) -> Result<(), SieveError> {
        let sum: f64 = self.weights.values().sum();
        if !sum.is_finite() || (sum - 1.0).abs() > WEIGHT_SUM_EPSILON {
            return Err(invalid(
                "weights",
                format!("factor weights must sum to 1.0, got {sum}"),
            ));
        }
        if self.weights.values().any(|w| *w < 0.0) {
            return Err(invalid("weights", "factor weights must be non-negative"));
        }
        if !(0.0..=100.0).contains(&self.min_score) {
            return Err(invalid("min_score", "min_score must be within [0, 100]"));
        }
        if self.max_results < 1 {
            return Err(invalid("max_results", "max_results must be at least 1"));
        }
        if self.max_workers < 1 {
            return Err(invalid("max_workers", "max_workers must be at least 1"));
        }
        if let (Some(lo), Some(hi)) = (self.min_market_cap, self.max_market_cap) {
            if lo > hi {
                return Err(invalid(
                    "min_market_cap",
                    "min_market_cap must not exceed max_market_cap",
                ));
            }
        }
        if self.history_window == 0 {
            return Err(invalid("history_window", "history_window must be positive"));
        }
        if self.min_history_bars == 0 {
            return Err(invalid(
                "min_history_bars",
                "min_history_bars must be positive",
            ));
        }
        Ok(())
    }

    /// Merge user overrides from a config source onto this preset, then
    /// re-validate. Missing keys keep the preset values; an override that
    /// breaks an invariant fails the load rather than being patched up.
    pub fn apply_overrides(mut self, config: &dyn ConfigPort) -> Result<Self, SieveError> {
        if let Some(v) = config.get_string("strategy", "name") {
            self.name = v;
        }
        if let Some(v) = config.get_string("strategy", "min_score") {
            self.min_score = parse_double("min_score", &v)?;
        }
        // Malformed or negative counts fail the load; they never fall back
        // to the preset value.
        if let Some(v) = config.get_string("strategy", "max_results") {
            self.max_results = parse_count("max_results", &v)?;
        }
        if let Some(v) = config.get_string("strategy", "history_window") {
            self.history_window = parse_count("history_window", &v)?;
        }
        if let Some(v) = config.get_string("strategy", "min_history_bars") {
            self.min_history_bars = parse_count("min_history_bars", &v)?;
        }
        if let Some(v) = config.get_string("strategy", "max_workers") {
            self.max_workers = parse_count("max_workers", &v)?;
        }

        if let Some(v) = config.get_string("strategy", "min_market_cap") {
            self.min_market_cap = Some(parse_double("min_market_cap", &v)?);
        }
        if let Some(v) = config.get_string("strategy", "max_market_cap") {
            self.max_market_cap = Some(parse_double("max_market_cap", &v)?);
        }
        if let Some(v) = config.get_string("strategy", "name_blacklist") {
            self.name_blacklist = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        for kind in FactorKind::ALL {
            if let Some(v) = config.get_string("weights", kind.as_str()) {
                self.weights
                    .insert(kind, parse_double(kind.as_str(), &v)?);
            }
        }

        self.validate()?;
        Ok(self)
    }
}

fn invalid(key: &str, reason: impl Into<String>) -> SieveError {
    SieveError::ConfigInvalid {
        section: "strategy".to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn parse_double(key: &str, value: &str) -> Result<f64, SieveError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(key, format!("expected a number, got {value:?}")))
}

/// Unsigned counts parse through their target type, so `-1` is rejected the
/// same way `abc` is.
fn parse_count<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, SieveError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(key, format!("expected a non-negative integer, got {value:?}")))
}
