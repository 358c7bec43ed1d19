//! mtfscope core: multi-timeframe VWAP/MACD/RSI alignment engine.
//!
//! This crate contains:
//! - Domain types (bars, enriched bars, timeframes)
//! - The indicator engine (VWAP, EMA, MACD, RSI) with warm-up row dropping
//! - Per-timeframe classifiers and the 15m/5m/1m alignment verdict
//! - The historical entry-signal scanner with as-of forward fill
//! - Data collaborators: Yahoo/CSV/synthetic providers, NYSE calendar,
//!   series cache
//! - Configuration and the fetch-enrich-slice pipeline
//!
//! The indicator, classifier, alignment and scanner layers are pure and
//! stateless; all I/O lives in `data` and `pipeline`.

pub mod config;
pub mod data;
pub mod domain;
pub mod indicators;
pub mod pipeline;
pub mod snapshot;
pub mod strategy;

pub use config::{ConfigError, EngineConfig, SourceConfig};
pub use domain::{Bar, EnrichedBar, Timeframe};
pub use indicators::compute_indicators;
pub use pipeline::{process_all_timeframes, process_all_timeframes_cached, TimeframeSet};
pub use snapshot::MarketSnapshot;
pub use strategy::{analyze, find_entry_signals, AnalysisResult, Direction, EntrySignals};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything handed across threads by a parallel
    /// scan is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::EnrichedBar>();
        require_sync::<domain::EnrichedBar>();
        require_send::<domain::Timeframe>();
        require_sync::<domain::Timeframe>();

        // Strategy outputs
        require_send::<strategy::AnalysisResult>();
        require_sync::<strategy::AnalysisResult>();
        require_send::<strategy::EntrySignals>();
        require_sync::<strategy::EntrySignals>();
        require_send::<strategy::StatusTuple>();
        require_sync::<strategy::StatusTuple>();

        // Pipeline and config
        require_send::<pipeline::TimeframeSet>();
        require_sync::<pipeline::TimeframeSet>();
        require_send::<config::EngineConfig>();
        require_sync::<config::EngineConfig>();
        require_send::<snapshot::MarketSnapshot>();
        require_sync::<snapshot::MarketSnapshot>();

        // Providers
        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
        require_send::<data::CsvProvider>();
        require_sync::<data::CsvProvider>();
        require_send::<data::SyntheticProvider>();
        require_sync::<data::SyntheticProvider>();
        require_send::<data::CircuitBreaker>();
        require_sync::<data::CircuitBreaker>();
        require_send::<data::NyseCalendar>();
        require_sync::<data::NyseCalendar>();
    }

    #[test]
    fn defaults_analyze_to_error_without_data() {
        let set = TimeframeSet::default();
        assert_eq!(set.analyze().overall.direction, Direction::Error);
    }
}
