//! Domain error types.
//!
//! The taxonomy separates transient data-source failures (retryable), typed
//! skip conditions (insufficient history), fatal configuration errors, and
//! cancellation. Callers decide policy by matching, never by string parsing.

use thiserror::Error;

/// Top-level error type for marketsieve.
#[derive(Debug, Error)]
pub enum SieveError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    /// Transport-level data source failure (network, timeout, parse).
    #[error("data source error for {context}: {reason}")]
    DataSource { context: String, reason: String },

    /// The source has fewer bars than the caller's minimum. A skip
    /// condition, never retried.
    #[error("insufficient history for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientHistory {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    /// A retried operation failed on every attempt.
    #[error("retries exhausted after {attempts} attempts: {last_error}")]
    RetryExhausted { attempts: u32, last_error: String },

    #[error("no trade days between {start} and {end}")]
    NoTradeDays { start: String, end: String },

    /// Cooperative cancellation observed while waiting or working.
    #[error("operation canceled")]
    Canceled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SieveError {
    /// Transient errors are eligible for retry with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(self, SieveError::DataSource { .. })
    }

    /// Configuration errors abort a run instead of being skipped.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            SieveError::ConfigParse { .. }
                | SieveError::ConfigMissing { .. }
                | SieveError::ConfigInvalid { .. }
        )
    }
}

impl From<&SieveError> for std::process::ExitCode {
    fn from(err: &SieveError) -> Self {
        let code: u8 = match err {
            SieveError::Io(_) => 1,
            SieveError::ConfigParse { .. }
            | SieveError::ConfigMissing { .. }
            | SieveError::ConfigInvalid { .. } => 2,
            SieveError::DataSource { .. } | SieveError::RetryExhausted { .. } => 3,
            SieveError::InsufficientHistory { .. } | SieveError::NoTradeDays { .. } => 4,
            SieveError::Canceled => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        let err = SieveError::DataSource {
            context: "list_candidates".into(),
            reason: "connection reset".into(),
        };
        assert!(err.is_transient());

        let err = SieveError::InsufficientHistory {
            symbol: "600519".into(),
            bars: 12,
            minimum: 30,
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn config_classification() {
        let err = SieveError::ConfigInvalid {
            section: "strategy".into(),
            key: "weights".into(),
            reason: "weights must sum to 1.0".into(),
        };
        assert!(err.is_config());
        assert!(!err.is_transient());

        assert!(!SieveError::Canceled.is_config());
    }

    #[test]
    fn retry_exhausted_is_not_transient() {
        let err = SieveError::RetryExhausted {
            attempts: 3,
            last_error: "timeout".into(),
        };
        assert!(!err.is_transient());
    }
}
