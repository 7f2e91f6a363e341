//! Composite scoring engine.
//!
//! Combines per-factor sub-scores into one weighted score plus the reasons
//! behind it. Degradation is an explicit rule: a factor that cannot be
//! computed contributes 0 to the weighted sum instead of aborting the
//! candidate. Factors are always evaluated in `FactorKind::ALL` order, not
//! weight order, so reasons are reproducible.

use crate::domain::config::{FactorKind, StrategyConfig};
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::factor_port::FactorSet;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    /// Weighted composite, clamped to [0, 100].
    pub score: f64,
    /// Signals in factor evaluation order.
    pub reasons: Vec<String>,
}

pub struct ScoringEngine<'a> {
    factor_set: &'a dyn FactorSet,
}

impl<'a> ScoringEngine<'a> {
    pub fn new(factor_set: &'a dyn FactorSet) -> Self {
        ScoringEngine { factor_set }
    }

    pub fn score(&self, history: &[OhlcvBar], cfg: &StrategyConfig) -> ScoreBreakdown {
        let mut total = 0.0;
        let mut reasons = Vec::new();

        for kind in FactorKind::ALL {
            let weight = cfg.weights.get(&kind).copied().unwrap_or(0.0);
            if weight == 0.0 {
                continue;
            }
            match self.factor_set.evaluate(kind, history) {
                Some(reading) => {
                    let sub = reading.score.clamp(0.0, 100.0);
                    total += sub * weight;
                    reasons.extend(reading.reasons);
                }
                // Unavailable factor: zero contribution, candidate survives.
                None => {}
            }
        }

        ScoreBreakdown {
            score: total.clamp(0.0, 100.0),
            reasons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::preset;
    use crate::ports::factor_port::FactorReading;
    use std::collections::HashMap;

    /// Scripted factor set: a fixed reading per kind, `None` where unset.
    struct ScriptedFactors {
        readings: HashMap<FactorKind, FactorReading>,
    }

    impl ScriptedFactors {
        fn new(entries: &[(FactorKind, f64, &str)]) -> Self {
            let readings = entries
                .iter()
                .map(|(kind, score, reason)| {
                    (
                        *kind,
                        FactorReading {
                            score: *score,
                            reasons: vec![reason.to_string()],
                        },
                    )
                })
                .collect();
            ScriptedFactors { readings }
        }
    }

    impl FactorSet for ScriptedFactors {
        fn evaluate(&self, kind: FactorKind, _history: &[OhlcvBar]) -> Option<FactorReading> {
            self.readings.get(&kind).cloned()
        }
    }

    fn comprehensive() -> StrategyConfig {
        preset("comprehensive").unwrap()
    }

    #[test]
    fn weighted_sum_of_all_factors() {
        let factors = ScriptedFactors::new(&[
            (FactorKind::Technical, 80.0, "trend up"),
            (FactorKind::Fundamental, 60.0, "low PE"),
            (FactorKind::Sentiment, 40.0, "volume pickup"),
            (FactorKind::Industry, 100.0, "hot sector"),
        ]);
        let breakdown = ScoringEngine::new(&factors).score(&[], &comprehensive());

        // 80*0.60 + 60*0.25 + 40*0.10 + 100*0.05 = 72
        assert!((breakdown.score - 72.0).abs() < 1e-9);
    }

    #[test]
    fn missing_factor_contributes_zero() {
        let factors = ScriptedFactors::new(&[(FactorKind::Technical, 80.0, "trend up")]);
        let breakdown = ScoringEngine::new(&factors).score(&[], &comprehensive());

        assert!((breakdown.score - 48.0).abs() < 1e-9);
        assert_eq!(breakdown.reasons, vec!["trend up"]);
    }

    #[test]
    fn sub_scores_clamped_before_weighting() {
        let factors = ScriptedFactors::new(&[
            (FactorKind::Technical, 250.0, "overflow"),
            (FactorKind::Fundamental, -30.0, "underflow"),
            (FactorKind::Sentiment, 50.0, "neutral"),
            (FactorKind::Industry, 50.0, "neutral sector"),
        ]);
        let breakdown = ScoringEngine::new(&factors).score(&[], &comprehensive());

        // 100*0.60 + 0*0.25 + 50*0.10 + 50*0.05 = 67.5
        assert!((breakdown.score - 67.5).abs() < 1e-9);
    }

    #[test]
    fn total_stays_within_range() {
        let factors = ScriptedFactors::new(&[
            (FactorKind::Technical, 100.0, "max"),
            (FactorKind::Fundamental, 100.0, "max"),
            (FactorKind::Sentiment, 100.0, "max"),
            (FactorKind::Industry, 100.0, "max"),
        ]);
        let breakdown = ScoringEngine::new(&factors).score(&[], &comprehensive());
        assert!(breakdown.score <= 100.0);
        assert!(breakdown.score >= 0.0);
    }

    #[test]
    fn reasons_follow_evaluation_order_not_weight_order() {
        // Sentiment carries a larger scripted weight than fundamental in
        // this config, but reasons still come out in FactorKind::ALL order.
        let mut cfg = comprehensive();
        cfg.weights.insert(FactorKind::Technical, 0.1);
        cfg.weights.insert(FactorKind::Fundamental, 0.1);
        cfg.weights.insert(FactorKind::Sentiment, 0.7);
        cfg.weights.insert(FactorKind::Industry, 0.1);

        let factors = ScriptedFactors::new(&[
            (FactorKind::Sentiment, 50.0, "sentiment signal"),
            (FactorKind::Technical, 50.0, "technical signal"),
            (FactorKind::Fundamental, 50.0, "fundamental signal"),
        ]);
        let breakdown = ScoringEngine::new(&factors).score(&[], &cfg);
        assert_eq!(
            breakdown.reasons,
            vec!["technical signal", "fundamental signal", "sentiment signal"]
        );
    }

    #[test]
    fn zero_weight_factor_never_evaluated_into_reasons() {
        let mut cfg = comprehensive();
        cfg.weights.insert(FactorKind::Technical, 0.95);
        cfg.weights.insert(FactorKind::Fundamental, 0.05);
        cfg.weights.insert(FactorKind::Sentiment, 0.0);
        cfg.weights.insert(FactorKind::Industry, 0.0);

        let factors = ScriptedFactors::new(&[
            (FactorKind::Technical, 60.0, "kept"),
            (FactorKind::Sentiment, 90.0, "ignored"),
        ]);
        let breakdown = ScoringEngine::new(&factors).score(&[], &cfg);
        assert_eq!(breakdown.reasons, vec!["kept"]);
    }
}
