//! CSV bar provider.
//!
//! Reads `{dir}/{TICKER}_{interval}.csv` with a header row of
//! `timestamp,open,high,low,close,volume`. Timestamps are either RFC 3339
//! with an offset or naive `YYYY-MM-DD HH:MM:SS` wall-clock times, which are
//! interpreted in the exchange timezone.

use super::provider::{parse_period_days, BarFetcher, DataError, DataSource, FetchResult};
use crate::domain::{Bar, Timeframe};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

pub struct CsvProvider {
    dir: PathBuf,
    exchange_tz: Tz,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>, exchange_tz: Tz) -> Self {
        Self {
            dir: dir.into(),
            exchange_tz,
        }
    }

    pub fn path_for(&self, ticker: &str, interval: Timeframe) -> PathBuf {
        self.dir
            .join(format!("{}_{}.csv", ticker.to_uppercase(), interval.interval()))
    }

    fn parse_timestamp(&self, raw: &str) -> Option<DateTime<FixedOffset>> {
        let raw = raw.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&self.exchange_tz).fixed_offset());
        }
        let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M"))
            .ok()?;
        self.exchange_tz
            .from_local_datetime(&naive)
            .earliest()
            .map(|ts| ts.fixed_offset())
    }

    fn read_bars(&self, path: &Path) -> Result<Vec<Bar>, DataError> {
        let csv_err = |message: String| DataError::Csv {
            path: path.display().to_string(),
            message,
        };

        let content = std::fs::read(path)?;
        let mut reader = csv::Reader::from_reader(content.as_slice());
        let mut bars = Vec::new();

        for (line, record) in reader.deserialize::<CsvRow>().enumerate() {
            let row = record.map_err(|e| csv_err(e.to_string()))?;
            let timestamp = self.parse_timestamp(&row.timestamp).ok_or_else(|| {
                csv_err(format!(
                    "row {}: unparseable timestamp '{}'",
                    line + 1,
                    row.timestamp
                ))
            })?;

            let bar = Bar {
                timestamp,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume.max(0.0).round() as u64,
            };

            if bar.is_void() {
                continue;
            }
            if !bar.is_sane() {
                warn!(path = %path.display(), row = line + 1, "skipping insane bar");
                continue;
            }
            bars.push(bar);
        }

        bars.sort_by_key(|b| b.timestamp);
        bars.dedup_by_key(|b| b.timestamp);
        Ok(bars)
    }
}

/// Keep only bars from the last `days` distinct session dates.
fn trim_to_sessions(bars: Vec<Bar>, days: u32) -> Vec<Bar> {
    let dates: BTreeSet<NaiveDate> = bars.iter().map(Bar::session_date).collect();
    let Some(&cutoff) = dates.iter().rev().nth(days as usize - 1) else {
        return bars;
    };
    bars.into_iter()
        .filter(|b| b.session_date() >= cutoff)
        .collect()
}

impl BarFetcher for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(
        &self,
        ticker: &str,
        period: &str,
        interval: Timeframe,
    ) -> Result<FetchResult, DataError> {
        let days = parse_period_days(period)?;
        let path = self.path_for(ticker, interval);

        let bars = match self.read_bars(&path) {
            Err(DataError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DataError::SymbolNotFound {
                    symbol: format!("{ticker} ({})", path.display()),
                });
            }
            result => trim_to_sessions(result?, days),
        };
        debug!(ticker, %interval, bars = bars.len(), path = %path.display(), "loaded csv");

        Ok(FetchResult {
            ticker: ticker.to_string(),
            timeframe: interval,
            bars,
            source: DataSource::CsvImport,
        })
    }

    fn is_available(&self) -> bool {
        self.dir.is_dir()
    }
}
