//! In-memory cache of enriched series keyed by (ticker, timeframe).
//!
//! Entries expire after a TTL so a live view refreshes roughly once per
//! 1m bar. The caller passes the current instant into every call; the cache
//! never reads the clock itself.

use crate::domain::{EnrichedBar, Timeframe};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_TTL: Duration = Duration::from_secs(55);

#[derive(Debug, Clone)]
struct CacheEntry {
    bars: Vec<EnrichedBar>,
    fetched_at: Instant,
}

#[derive(Debug, Clone)]
pub struct SeriesCache {
    entries: HashMap<(String, Timeframe), CacheEntry>,
    ttl: Duration,
}

impl SeriesCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh series for `(ticker, timeframe)`, or `None` if absent or expired.
    pub fn get(&self, ticker: &str, timeframe: Timeframe, now: Instant) -> Option<&[EnrichedBar]> {
        let entry = self.entries.get(&(ticker.to_string(), timeframe))?;
        let age = now.saturating_duration_since(entry.fetched_at);
        if age >= self.ttl {
            debug!(ticker, %timeframe, age_ms = age.as_millis() as u64, "cache entry expired");
            return None;
        }
        Some(&entry.bars)
    }

    pub fn insert(
        &mut self,
        ticker: &str,
        timeframe: Timeframe,
        bars: Vec<EnrichedBar>,
        now: Instant,
    ) {
        self.entries.insert(
            (ticker.to_string(), timeframe),
            CacheEntry {
                bars,
                fetched_at: now,
            },
        );
    }

    /// Drop every timeframe cached for `ticker`.
    pub fn invalidate(&mut self, ticker: &str) {
        self.entries.retain(|(t, _), _| t != ticker);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SeriesCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::compute_indicators;
    use crate::indicators::make_bars;

    fn series() -> Vec<EnrichedBar> {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.7).sin()).collect();
        compute_indicators(&make_bars(&closes))
    }

    #[test]
    fn fresh_entry_is_returned() {
        let mut cache = SeriesCache::default();
        let t0 = Instant::now();
        let bars = series();
        cache.insert("SPY", Timeframe::M1, bars.clone(), t0);

        assert_eq!(cache.get("SPY", Timeframe::M1, t0 + Duration::from_secs(54)), Some(&bars[..]));
        assert!(cache.get("SPY", Timeframe::M5, t0).is_none());
        assert!(cache.get("QQQ", Timeframe::M1, t0).is_none());
    }

    #[test]
    fn entry_expires_at_ttl() {
        let mut cache = SeriesCache::new(Duration::from_secs(55));
        let t0 = Instant::now();
        cache.insert("SPY", Timeframe::M1, series(), t0);
        assert!(cache.get("SPY", Timeframe::M1, t0 + Duration::from_secs(55)).is_none());
        // Expired entries stay until replaced.
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalidate_drops_all_timeframes_for_ticker() {
        let mut cache = SeriesCache::default();
        let t0 = Instant::now();
        for tf in Timeframe::ALL {
            cache.insert("SPY", tf, series(), t0);
        }
        cache.insert("QQQ", Timeframe::M1, series(), t0);

        cache.invalidate("SPY");
        assert_eq!(cache.len(), 1);
        assert!(cache.get("QQQ", Timeframe::M1, t0).is_some());

        cache.clear();
        assert!(cache.is_empty());
    }
}
