//! Multi-timeframe strategy: per-timeframe classifiers, the alignment
//! verdict, and the historical entry-signal scanner.

pub mod alignment;
pub mod classifier;
pub mod scanner;
pub mod status;

pub use alignment::{analyze, AnalysisResult, Direction, Verdict};
pub use classifier::{macd_status, rsi_status, vwap_slope, vwap_status};
pub use scanner::{find_entry_signals, EntrySignals, SignalPoint};
pub use status::{StatusSymbol, StatusTuple, VwapSlope};
