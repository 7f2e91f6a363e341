//! Core domain types and logic.

pub mod backtest;
pub mod cancel;
pub mod candidate;
pub mod config;
pub mod error;
pub mod filter;
pub mod ohlcv;
pub mod performance;
pub mod pipeline;
pub mod portfolio;
pub mod rate_limit;
pub mod report;
pub mod retry;
pub mod scoring;
pub mod strategy;
