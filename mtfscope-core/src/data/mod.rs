//! Data collaborators: bar providers, the trading calendar, timestamp
//! alignment across timeframes, and the enriched-series cache.

pub mod align;
pub mod cache;
pub mod calendar;
pub mod circuit_breaker;
pub mod csv_import;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use align::{align_as_of, forward_fill};
pub use cache::SeriesCache;
pub use calendar::{NyseCalendar, TradingCalendar};
pub use circuit_breaker::CircuitBreaker;
pub use csv_import::CsvProvider;
pub use provider::{BarFetcher, DataError, DataSource, FetchResult};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;
