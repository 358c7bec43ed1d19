//! Bar-fetch trait and structured error types.
//!
//! The BarFetcher trait abstracts over data sources (Yahoo Finance, CSV
//! import, synthetic sessions) so the pipeline can swap implementations and
//! mock them in tests. The indicator engine never sees a provider; it only
//! receives the bars a provider returned.

use crate::domain::{Bar, Timeframe};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("unsupported period '{0}' (expected e.g. 1d, 7d, 60d)")]
    UnsupportedPeriod(String),

    #[error("csv error in {path}: {message}")]
    Csv { path: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("data error: {0}")]
    Other(String),
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    YahooFinance,
    CsvImport,
    Synthetic,
}

/// Result of a successful fetch for a single ticker and timeframe.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub ticker: String,
    pub timeframe: Timeframe,
    pub bars: Vec<Bar>,
    pub source: DataSource,
}

/// Trait for bar sources.
///
/// Implementations return bars sorted ascending with timestamps already in
/// the exchange timezone. An empty result is not an error; it is passed on
/// and surfaces as the engine's "no data" state.
pub trait BarFetcher: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch bars for `ticker` covering `period` (e.g. "7d") at `interval`.
    fn fetch(&self, ticker: &str, period: &str, interval: Timeframe)
        -> Result<FetchResult, DataError>;

    /// Check if the provider is currently available (not rate-limited, not blocked).
    fn is_available(&self) -> bool {
        true
    }
}

/// Parse a period string such as `7d` or `60d` into a day count.
pub fn parse_period_days(period: &str) -> Result<u32, DataError> {
    let trimmed = period.trim();
    trimmed
        .strip_suffix('d')
        .and_then(|n| n.parse::<u32>().ok())
        .filter(|&n| n > 0)
        .ok_or_else(|| DataError::UnsupportedPeriod(trimmed.to_string()))
}
