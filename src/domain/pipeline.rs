//! Selection pipeline: filter, fan out, score, rank, enrich.
//!
//! Candidates are fanned out to a bounded pool of scoring workers sharing one
//! work cursor, so each candidate is scored at most once per run. Workers
//! never talk to the data source without first acquiring the process-wide
//! rate limit, and every fetch goes through the retry policy. Results are
//! drained through a channel and ranked deterministically afterwards.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::domain::candidate::{Candidate, ScoredCandidate};
use crate::domain::cancel::CancelToken;
use crate::domain::config::StrategyConfig;
use crate::domain::error::SieveError;
use crate::domain::filter::filter_candidates;
use crate::domain::ohlcv::{OhlcvBar, last_close};
use crate::domain::rate_limit::RateLimiter;
use crate::domain::retry::with_retry;
use crate::domain::scoring::ScoringEngine;
use crate::ports::data_port::MarketDataSource;
use crate::ports::factor_port::FactorSet;

/// Retry settings applied to every data source call the pipeline makes.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
        }
    }
}

/// Read-through history cache scoped to one `select` call. Entries are keyed
/// by `(symbol, as_of, window_days)` and never invalidated mid-run.
struct HistoryCache {
    entries: Mutex<HashMap<(String, Option<NaiveDate>, u32), Arc<Vec<OhlcvBar>>>>,
}

impl HistoryCache {
    fn new() -> Self {
        HistoryCache {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn get(&self, key: &(String, Option<NaiveDate>, u32)) -> Option<Arc<Vec<OhlcvBar>>> {
        self.entries
            .lock()
            .expect("history cache lock poisoned")
            .get(key)
            .cloned()
    }

    fn insert(&self, key: (String, Option<NaiveDate>, u32), bars: Arc<Vec<OhlcvBar>>) {
        self.entries
            .lock()
            .expect("history cache lock poisoned")
            .insert(key, bars);
    }
}

pub struct SelectionPipeline {
    data: Arc<dyn MarketDataSource>,
    factors: Arc<dyn FactorSet>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    cfg: StrategyConfig,
}

impl SelectionPipeline {
    /// Validates the config once at construction; an invalid config never
    /// produces a pipeline.
    pub fn new(
        data: Arc<dyn MarketDataSource>,
        factors: Arc<dyn FactorSet>,
        limiter: Arc<RateLimiter>,
        retry: RetryPolicy,
        cfg: StrategyConfig,
    ) -> Result<Self, SieveError> {
        cfg.validate()?;
        Ok(SelectionPipeline {
            data,
            factors,
            limiter,
            retry,
            cfg,
        })
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.cfg
    }

    /// Run the full pipeline for one date (`None` = now). Per-candidate
    /// failures degrade to skips; cancellation discards computed results.
    pub fn select(
        &self,
        as_of: Option<NaiveDate>,
        cancel: &CancelToken,
    ) -> Result<Vec<ScoredCandidate>, SieveError> {
        let candidates = self.fetch_candidates(as_of, cancel)?;
        let filtered = filter_candidates(&candidates, &self.cfg);
        debug!(
            total = candidates.len(),
            kept = filtered.len(),
            "candidate filter applied"
        );

        let mut results = self.score_pool(&filtered, as_of, cancel)?;

        results.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        results.truncate(self.cfg.max_results);

        self.enrich(&mut results, cancel)?;
        Ok(results)
    }

    fn fetch_candidates(
        &self,
        as_of: Option<NaiveDate>,
        cancel: &CancelToken,
    ) -> Result<Vec<Candidate>, SieveError> {
        with_retry(self.retry.max_attempts, self.retry.base_delay, cancel, || {
            self.limiter.acquire(cancel)?;
            self.data.list_candidates(as_of)
        })
    }

    /// Bounded worker pool over a shared cursor. Each worker pulls the next
    /// unclaimed candidate, fetches its history (read-through cache), scores
    /// it, and emits onto the results channel when the score clears the bar.
    fn score_pool(
        &self,
        candidates: &[Candidate],
        as_of: Option<NaiveDate>,
        cancel: &CancelToken,
    ) -> Result<Vec<ScoredCandidate>, SieveError> {
        let cursor = AtomicUsize::new(0);
        let cache = HistoryCache::new();
        let (sender, receiver) = mpsc::channel::<ScoredCandidate>();
        let workers = self.cfg.max_workers.min(candidates.len().max(1));

        std::thread::scope(|scope| {
            for _ in 0..workers {
                let sender = sender.clone();
                let cursor = &cursor;
                let cache = &cache;
                scope.spawn(move || {
                    loop {
                        if cancel.is_canceled() {
                            return;
                        }
                        let index = cursor.fetch_add(1, Ordering::Relaxed);
                        let Some(candidate) = candidates.get(index) else {
                            return;
                        };
                        if let Some(scored) = self.score_one(candidate, as_of, cache, cancel) {
                            // Receiver outlives the scope; send only fails
                            // once the run is being torn down.
                            let _ = sender.send(scored);
                        }
                    }
                });
            }
        });
        drop(sender);

        if cancel.is_canceled() {
            return Err(SieveError::Canceled);
        }
        Ok(receiver.try_iter().collect())
    }

    fn score_one(
        &self,
        candidate: &Candidate,
        as_of: Option<NaiveDate>,
        cache: &HistoryCache,
        cancel: &CancelToken,
    ) -> Option<ScoredCandidate> {
        let history = match self.fetch_history(&candidate.symbol, as_of, cache, cancel) {
            Ok(history) => history,
            Err(SieveError::InsufficientHistory { bars, minimum, .. }) => {
                debug!(symbol = %candidate.symbol, bars, minimum, "skipped: insufficient history");
                return None;
            }
            Err(SieveError::Canceled) => return None,
            Err(err) => {
                warn!(symbol = %candidate.symbol, error = %err, "skipped: history fetch failed");
                return None;
            }
        };

        let breakdown = ScoringEngine::new(self.factors.as_ref()).score(&history, &self.cfg);
        if breakdown.score <= 0.0 || breakdown.score < self.cfg.min_score {
            return None;
        }

        let price = last_close(&history).unwrap_or(0.0);
        Some(ScoredCandidate::new(
            candidate,
            breakdown.score,
            breakdown.reasons,
            price,
        ))
    }

    fn fetch_history(
        &self,
        symbol: &str,
        as_of: Option<NaiveDate>,
        cache: &HistoryCache,
        cancel: &CancelToken,
    ) -> Result<Arc<Vec<OhlcvBar>>, SieveError> {
        let key = (symbol.to_string(), as_of, self.cfg.history_window);
        if let Some(bars) = cache.get(&key) {
            return Ok(bars);
        }

        let bars = with_retry(self.retry.max_attempts, self.retry.base_delay, cancel, || {
            self.limiter.acquire(cancel)?;
            self.data.get_history(
                symbol,
                self.cfg.history_window,
                self.cfg.min_history_bars,
                as_of,
            )
        })?;

        let bars = Arc::new(bars);
        cache.insert(key, Arc::clone(&bars));
        Ok(bars)
    }

    /// One batched realtime call over the truncated result set only.
    /// Best-effort against data faults: those keep the history-derived
    /// prices. Cancellation is not a fault and still discards the run.
    fn enrich(
        &self,
        results: &mut [ScoredCandidate],
        cancel: &CancelToken,
    ) -> Result<(), SieveError> {
        if results.is_empty() {
            return Ok(());
        }
        let symbols: Vec<String> = results.iter().map(|r| r.symbol.clone()).collect();
        let quotes = with_retry(self.retry.max_attempts, self.retry.base_delay, cancel, || {
            self.limiter.acquire(cancel)?;
            self.data.get_realtime_quotes(&symbols)
        });

        match quotes {
            Ok(quotes) => {
                for result in results.iter_mut() {
                    if let Some(quote) = quotes.get(&result.symbol) {
                        result.price = quote.price;
                        result.change_pct = quote.change_pct;
                    }
                }
                Ok(())
            }
            Err(SieveError::Canceled) => Err(SieveError::Canceled),
            Err(err) => {
                warn!(error = %err, "realtime enrichment failed, keeping history prices");
                Ok(())
            }
        }
    }
}
