//! Engine configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) yields
//! a working configuration for US equities on Yahoo data:
//!
//! ```toml
//! exchange_timezone = "America/New_York"
//! market_open = "09:30"
//! market_close = "16:00"
//! cache_ttl_secs = 55
//! default_ticker = "SPY"
//!
//! [periods]
//! m1 = "7d"
//! m5 = "60d"
//! m15 = "60d"
//!
//! [source]
//! kind = "csv"
//! dir = "data/"
//! ```

use crate::data::calendar::NyseCalendar;
use crate::data::provider::parse_period_days;
use crate::domain::Timeframe;
use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// History requested per timeframe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchPeriods {
    pub m1: String,
    pub m5: String,
    pub m15: String,
}

impl Default for FetchPeriods {
    fn default() -> Self {
        Self {
            m1: Timeframe::M1.default_period().into(),
            m5: Timeframe::M5.default_period().into(),
            m15: Timeframe::M15.default_period().into(),
        }
    }
}

impl FetchPeriods {
    pub fn for_timeframe(&self, timeframe: Timeframe) -> &str {
        match timeframe {
            Timeframe::M1 => &self.m1,
            Timeframe::M5 => &self.m5,
            Timeframe::M15 => &self.m15,
        }
    }
}

/// Which bar provider to use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    #[default]
    Yahoo,
    Csv {
        dir: PathBuf,
    },
    Synthetic {
        #[serde(default)]
        seed: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// IANA timezone name of the exchange.
    pub exchange_timezone: String,
    #[serde(with = "hhmm")]
    pub market_open: NaiveTime,
    #[serde(with = "hhmm")]
    pub market_close: NaiveTime,
    pub cache_ttl_secs: u64,
    pub default_ticker: String,
    pub periods: FetchPeriods,
    pub source: SourceConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            exchange_timezone: "America/New_York".into(),
            market_open: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or(NaiveTime::MIN),
            market_close: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or(NaiveTime::MIN),
            cache_ttl_secs: 55,
            default_ticker: "SPY".into(),
            periods: FetchPeriods::default(),
            source: SourceConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given and present, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) if p.exists() => Self::from_file(p),
            Some(p) => {
                debug!(path = %p.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timezone()?;
        if self.market_open >= self.market_close {
            return Err(ConfigError::Invalid(format!(
                "market_open {} must be before market_close {}",
                self.market_open, self.market_close
            )));
        }
        for tf in Timeframe::ALL {
            parse_period_days(self.periods.for_timeframe(tf))
                .map_err(|e| ConfigError::Invalid(format!("periods.{tf}: {e}")))?;
        }
        if self.cache_ttl_secs == 0 {
            return Err(ConfigError::Invalid("cache_ttl_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.exchange_timezone.parse::<Tz>().map_err(|_| {
            ConfigError::Invalid(format!("unknown timezone '{}'", self.exchange_timezone))
        })
    }

    pub fn period(&self, timeframe: Timeframe) -> &str {
        self.periods.for_timeframe(timeframe)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn calendar(&self) -> NyseCalendar {
        NyseCalendar::new(self.market_open, self.market_close)
    }
}

/// `HH:MM` wall-clock times.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveTime::parse_from_str(&raw, FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}
