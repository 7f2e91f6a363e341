//! Candidate pre-filter.
//!
//! Pure and deterministic: same input and config always produce the same
//! output in the same (input) order, so filtering is idempotent.

use crate::domain::candidate::Candidate;
use crate::domain::config::StrategyConfig;

/// Drop candidates whose display name carries a blacklist marker or whose
/// market cap falls outside the configured band.
pub fn filter_candidates(candidates: &[Candidate], cfg: &StrategyConfig) -> Vec<Candidate> {
    candidates
        .iter()
        .filter(|c| !is_blacklisted(&c.display_name, &cfg.name_blacklist))
        .filter(|c| cfg.min_market_cap.is_none_or(|lo| c.market_cap >= lo))
        .filter(|c| cfg.max_market_cap.is_none_or(|hi| c.market_cap <= hi))
        .cloned()
        .collect()
}

fn is_blacklisted(display_name: &str, blacklist: &[String]) -> bool {
    blacklist.iter().any(|marker| display_name.contains(marker))
}
