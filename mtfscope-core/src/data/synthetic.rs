//! Deterministic synthetic intraday sessions for offline use and tests.
//!
//! Each session is a 1-minute random walk over regular trading hours,
//! seeded from a BLAKE3 hash of (seed, ticker, date), so a given session is
//! identical no matter which period requested it. 5m and 15m bars are
//! aggregated from the same 1m walk, keeping the timeframes consistent.

use super::calendar::{NyseCalendar, TradingCalendar};
use super::provider::{parse_period_days, BarFetcher, DataError, DataSource, FetchResult};
use crate::domain::{Bar, Timeframe};
use chrono::{NaiveDate, TimeZone};
use chrono_tz::Tz;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

pub struct SyntheticProvider {
    calendar: NyseCalendar,
    exchange_tz: Tz,
    end_date: NaiveDate,
    seed: u64,
}

impl SyntheticProvider {
    pub fn new(calendar: NyseCalendar, exchange_tz: Tz, end_date: NaiveDate) -> Self {
        Self {
            calendar,
            exchange_tz,
            end_date,
            seed: 0,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn session_rng(&self, ticker: &str, date: NaiveDate) -> StdRng {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(ticker.as_bytes());
        hasher.update(date.to_string().as_bytes());
        StdRng::from_seed(*hasher.finalize().as_bytes())
    }

    /// One regular session of 1m bars.
    pub fn session_minutes(&self, ticker: &str, date: NaiveDate) -> Vec<Bar> {
        let mut rng = self.session_rng(ticker, date);
        let (open_time, close_time) = self.calendar.market_hours(date);
        let step = Timeframe::M1.bar_duration();
        let minutes = ((close_time - open_time).num_minutes() / step.num_minutes()).max(0);

        let mut price = 100.0 * (1.0 + rng.gen_range(-0.2..0.2));
        let drift: f64 = rng.gen_range(-0.0003..0.0003);
        let mut bars = Vec::with_capacity(minutes as usize);

        for i in 0..minutes {
            let local = date.and_time(open_time) + step * i as i32;
            let Some(timestamp) = self.exchange_tz.from_local_datetime(&local).earliest() else {
                continue;
            };

            let ret = drift + rng.gen_range(-0.0015..0.0015);
            let open = price;
            let close = price * (1.0 + ret);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.0008));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.0008));

            bars.push(Bar {
                timestamp: timestamp.fixed_offset(),
                open,
                high,
                low,
                close,
                volume: rng.gen_range(1_000..20_000u64),
            });
            price = close;
        }

        bars
    }
}

/// Aggregate consecutive 1m bars of one session into `timeframe` buckets
/// anchored at the session open.
pub fn aggregate(minutes: &[Bar], timeframe: Timeframe) -> Vec<Bar> {
    let width = timeframe.minutes() as usize;
    if width <= 1 {
        return minutes.to_vec();
    }

    minutes
        .chunks(width)
        .filter_map(|chunk| {
            let first = chunk.first()?;
            let last = chunk.last()?;
            Some(Bar {
                timestamp: first.timestamp,
                open: first.open,
                high: chunk.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max),
                low: chunk.iter().map(|b| b.low).fold(f64::INFINITY, f64::min),
                close: last.close,
                volume: chunk.iter().map(|b| b.volume).sum(),
            })
        })
        .collect()
}

impl BarFetcher for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        ticker: &str,
        period: &str,
        interval: Timeframe,
    ) -> Result<FetchResult, DataError> {
        let days = parse_period_days(period)?;
        let sessions = self.calendar.previous_sessions(self.end_date, days as usize);

        let bars: Vec<Bar> = sessions
            .iter()
            .flat_map(|&date| aggregate(&self.session_minutes(ticker, date), interval))
            .collect();

        debug!(
            ticker,
            %interval,
            sessions = sessions.len(),
            bars = bars.len(),
            "generated synthetic bars"
        );

        Ok(FetchResult {
            ticker: ticker.to_string(),
            timeframe: interval,
            bars,
            source: DataSource::Synthetic,
        })
    }
}
