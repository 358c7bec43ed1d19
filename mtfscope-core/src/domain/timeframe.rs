//! Bar aggregation granularities used by the alignment strategy.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three timeframes the strategy reads: 15m defines bias, 5m confirms,
/// 1m triggers entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
}

impl Timeframe {
    pub const ALL: [Timeframe; 3] = [Timeframe::M1, Timeframe::M5, Timeframe::M15];

    /// Provider interval string (`1m`, `5m`, `15m`).
    pub fn interval(self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
        }
    }

    pub fn minutes(self) -> i64 {
        match self {
            Timeframe::M1 => 1,
            Timeframe::M5 => 5,
            Timeframe::M15 => 15,
        }
    }

    pub fn bar_duration(self) -> Duration {
        Duration::minutes(self.minutes())
    }

    /// Default history period requested from the provider.
    ///
    /// 1-minute history is limited upstream to about a week; the coarser
    /// timeframes fetch 60 days so slow indicators like EMA(50) settle.
    pub fn default_period(self) -> &'static str {
        match self {
            Timeframe::M1 => "7d",
            Timeframe::M5 | Timeframe::M15 => "60d",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.interval())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1m" => Ok(Timeframe::M1),
            "5m" => Ok(Timeframe::M5),
            "15m" => Ok(Timeframe::M15),
            other => Err(format!("unsupported timeframe '{other}' (expected 1m, 5m or 15m)")),
        }
    }
}
