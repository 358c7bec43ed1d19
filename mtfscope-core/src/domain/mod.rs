//! Domain types for mtfscope

pub mod bar;
pub mod timeframe;

pub use bar::{Bar, EnrichedBar};
pub use timeframe::Timeframe;

/// Ticker symbol type alias
pub type Symbol = String;
