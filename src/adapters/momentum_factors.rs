//! Price/volume factor set computed from daily bars alone.
//!
//! Covers the technical and sentiment factors. Fundamental and industry
//! readings need data a bar series does not carry, so this adapter returns
//! `None` for them and the scoring engine degrades those weights to zero.

use crate::domain::config::FactorKind;
use crate::domain::ohlcv::{OhlcvBar, window_gain_pct};
use crate::ports::factor_port::{FactorReading, FactorSet};

const SHORT_MA: usize = 5;
const LONG_MA: usize = 20;
const VOLUME_BASELINE: usize = 20;

pub struct MomentumFactors;

impl FactorSet for MomentumFactors {
    fn evaluate(&self, kind: FactorKind, history: &[OhlcvBar]) -> Option<FactorReading> {
        match kind {
            FactorKind::Technical => technical(history),
            FactorKind::Sentiment => sentiment(history),
            FactorKind::Fundamental | FactorKind::Industry => None,
        }
    }
}

fn mean_close(bars: &[OhlcvBar]) -> f64 {
    bars.iter().map(|b| b.close).sum::<f64>() / bars.len() as f64
}

/// Trend score: neutral 50, moving-average alignment worth 20, recent window
/// gain worth up to 30 in either direction.
fn technical(history: &[OhlcvBar]) -> Option<FactorReading> {
    if history.len() < LONG_MA {
        return None;
    }
    let short = mean_close(&history[history.len() - SHORT_MA..]);
    let long = mean_close(&history[history.len() - LONG_MA..]);

    let mut score = 50.0;
    let mut reasons = Vec::new();

    // Every computed reading carries at least one reason; a positive score
    // must never surface without an explanation.
    if short > long {
        score += 20.0;
        reasons.push(format!("{SHORT_MA}-day MA above {LONG_MA}-day MA"));
    } else {
        score -= 20.0;
        reasons.push(format!("{SHORT_MA}-day MA at or below {LONG_MA}-day MA"));
    }

    if let Some(gain) = window_gain_pct(&history[history.len() - LONG_MA..]) {
        // 1 point per percent, capped at +/-30.
        score += gain.clamp(-30.0, 30.0);
        if gain > 5.0 {
            reasons.push(format!("up {gain:.1}% over {LONG_MA} sessions"));
        } else if gain < -5.0 {
            reasons.push(format!("down {:.1}% over {LONG_MA} sessions", -gain));
        }
    }

    Some(FactorReading { score, reasons })
}

/// Crowd-interest score from the short-term volume pickup over the baseline
/// average.
fn sentiment(history: &[OhlcvBar]) -> Option<FactorReading> {
    if history.len() < VOLUME_BASELINE + SHORT_MA {
        return None;
    }
    let recent = &history[history.len() - SHORT_MA..];
    let baseline = &history[history.len() - SHORT_MA - VOLUME_BASELINE..history.len() - SHORT_MA];

    let recent_avg = recent.iter().map(|b| b.volume as f64).sum::<f64>() / recent.len() as f64;
    let baseline_avg =
        baseline.iter().map(|b| b.volume as f64).sum::<f64>() / baseline.len() as f64;
    if baseline_avg <= 0.0 {
        return None;
    }

    let ratio = recent_avg / baseline_avg;
    // ratio 1.0 -> 50, each 10% pickup worth 5 points.
    let score = 50.0 + (ratio - 1.0) * 50.0;
    let reason = if ratio >= 1.5 {
        format!(
            "volume {:.0}% above {VOLUME_BASELINE}-day average",
            (ratio - 1.0) * 100.0
        )
    } else if ratio <= 0.5 {
        format!(
            "volume {:.0}% below {VOLUME_BASELINE}-day average",
            (1.0 - ratio) * 100.0
        )
    } else {
        format!("volume near {VOLUME_BASELINE}-day average")
    };
    Some(FactorReading {
        score,
        reasons: vec![reason],
    })
}
