//! Strategy presets and the strategy port.
//!
//! A strategy is anything that turns a date into a ranked recommendation
//! list. The built-in presets are plain `StrategyConfig` values wired to the
//! selection pipeline; the backtest engine only sees the trait.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::candidate::ScoredCandidate;
use crate::domain::cancel::CancelToken;
use crate::domain::config::{FactorKind, StrategyConfig};
use crate::domain::error::SieveError;
use crate::domain::pipeline::SelectionPipeline;

pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;

    /// Produce the ranked recommendation list for one date (`None` = now).
    fn select(
        &self,
        as_of: Option<NaiveDate>,
        cancel: &CancelToken,
    ) -> Result<Vec<ScoredCandidate>, SieveError>;
}

/// The default strategy: one selection pipeline run per date.
pub struct PipelineStrategy {
    pipeline: SelectionPipeline,
}

impl PipelineStrategy {
    pub fn new(pipeline: SelectionPipeline) -> Self {
        PipelineStrategy { pipeline }
    }
}

impl Strategy for PipelineStrategy {
    fn name(&self) -> &str {
        &self.pipeline.config().name
    }

    fn select(
        &self,
        as_of: Option<NaiveDate>,
        cancel: &CancelToken,
    ) -> Result<Vec<ScoredCandidate>, SieveError> {
        self.pipeline.select(as_of, cancel)
    }
}

/// Names every built-in preset, in the order `preset` accepts them.
pub const PRESET_NAMES: [&str; 3] = ["technical", "comprehensive", "short_term"];

const DEFAULT_BLACKLIST: [&str; 3] = ["ST", "*ST", "退"];

/// Look up a built-in preset by name. Every preset satisfies
/// `StrategyConfig::validate`; an unknown name is a config error, not a
/// panic.
pub fn preset(name: &str) -> Result<StrategyConfig, SieveError> {
    let cfg = match name {
        // Pure momentum screen over mid caps.
        "technical" => StrategyConfig {
            name: "technical".to_string(),
            weights: weights(&[(FactorKind::Technical, 1.0)]),
            min_score: 60.0,
            max_results: 10,
            min_market_cap: Some(5.0e9),
            max_market_cap: Some(2.0e10),
            history_window: 60,
            min_history_bars: 30,
            max_workers: 4,
            name_blacklist: blacklist(),
        },
        // All four factors, larger caps, a stricter bar.
        "comprehensive" => StrategyConfig {
            name: "comprehensive".to_string(),
            weights: weights(&[
                (FactorKind::Technical, 0.60),
                (FactorKind::Fundamental, 0.25),
                (FactorKind::Sentiment, 0.10),
                (FactorKind::Industry, 0.05),
            ]),
            min_score: 75.0,
            max_results: 8,
            min_market_cap: Some(8.0e9),
            max_market_cap: None,
            history_window: 90,
            min_history_bars: 45,
            max_workers: 4,
            name_blacklist: blacklist(),
        },
        // Short momentum plus crowd interest, wider net, smaller caps in.
        "short_term" => StrategyConfig {
            name: "short_term".to_string(),
            weights: weights(&[
                (FactorKind::Technical, 0.70),
                (FactorKind::Sentiment, 0.30),
            ]),
            min_score: 65.0,
            max_results: 15,
            min_market_cap: Some(3.0e9),
            max_market_cap: None,
            history_window: 30,
            min_history_bars: 20,
            max_workers: 4,
            name_blacklist: blacklist(),
        },
        other => {
            return Err(SieveError::ConfigInvalid {
                section: "strategy".to_string(),
                key: "name".to_string(),
                reason: format!(
                    "unknown preset {other:?}, expected one of {PRESET_NAMES:?}"
                ),
            });
        }
    };
    Ok(cfg)
}

fn weights(entries: &[(FactorKind, f64)]) -> BTreeMap<FactorKind, f64> {
    entries.iter().copied().collect()
}

fn blacklist() -> Vec<String> {
    DEFAULT_BLACKLIST.iter().map(|s| s.to_string()).collect()
}
