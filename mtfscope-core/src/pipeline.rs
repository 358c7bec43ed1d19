//! Fetch, enrich and slice the three timeframes for one ticker.
//!
//! This is the orchestration layer around the pure core: it owns the I/O
//! (through a [`BarFetcher`]) and the optional [`SeriesCache`], and hands
//! enriched series to the strategy layer.

use crate::config::EngineConfig;
use crate::data::cache::SeriesCache;
use crate::data::provider::BarFetcher;
use crate::domain::{EnrichedBar, Timeframe};
use crate::indicators::compute_indicators;
use crate::snapshot::MarketSnapshot;
use crate::strategy::{self, AnalysisResult, EntrySignals};
use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Enriched 1m/5m/15m series for one ticker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeframeSet {
    pub ticker: String,
    pub m1: Vec<EnrichedBar>,
    pub m5: Vec<EnrichedBar>,
    pub m15: Vec<EnrichedBar>,
}

/// Default offset of the first replay cutoff from the market open.
pub const REPLAY_START_OFFSET_MINUTES: i64 = 60;

/// Verdict and entry signals at one cutoff time during a day replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayFrame {
    pub until: NaiveTime,
    pub analysis: AnalysisResult,
    /// Signals visible at the cutoff; none is later than `until`.
    pub signals: EntrySignals,
}

impl TimeframeSet {
    pub fn get(&self, timeframe: Timeframe) -> &[EnrichedBar] {
        match timeframe {
            Timeframe::M1 => &self.m1,
            Timeframe::M5 => &self.m5,
            Timeframe::M15 => &self.m15,
        }
    }

    fn get_mut(&mut self, timeframe: Timeframe) -> &mut Vec<EnrichedBar> {
        match timeframe {
            Timeframe::M1 => &mut self.m1,
            Timeframe::M5 => &mut self.m5,
            Timeframe::M15 => &mut self.m15,
        }
    }

    /// True when every timeframe has at least one row.
    pub fn is_complete(&self) -> bool {
        Timeframe::ALL.iter().all(|&tf| !self.get(tf).is_empty())
    }

    /// Trading date of the most recent 1m row.
    pub fn latest_session(&self) -> Option<NaiveDate> {
        self.m1.last().map(|b| b.bar.session_date())
    }

    /// Restrict every timeframe to `date`, and to rows at or before `until`
    /// (exchange-local wall-clock time) when given.
    ///
    /// Indicators are not recomputed: VWAP and the averages keep the values
    /// they had over the full fetched history.
    pub fn session(&self, date: NaiveDate, until: Option<NaiveTime>) -> TimeframeSet {
        let keep = |b: &&EnrichedBar| {
            b.bar.session_date() == date && until.map_or(true, |t| b.timestamp().time() <= t)
        };
        let slice = |series: &[EnrichedBar]| -> Vec<EnrichedBar> {
            series.iter().filter(keep).cloned().collect()
        };

        TimeframeSet {
            ticker: self.ticker.clone(),
            m1: slice(&self.m1),
            m5: slice(&self.m5),
            m15: slice(&self.m15),
        }
    }

    pub fn analyze(&self) -> AnalysisResult {
        strategy::analyze(&self.m1, &self.m5, &self.m15)
    }

    pub fn find_entry_signals(&self) -> EntrySignals {
        strategy::find_entry_signals(&self.m1, &self.m5, &self.m15)
    }

    /// Latest 1m snapshot paired with `analysis`.
    pub fn snapshot(&self, analysis: &AnalysisResult) -> Option<MarketSnapshot> {
        self.m1
            .last()
            .map(|bar| MarketSnapshot::from_latest(bar, analysis))
    }

    /// Step through `date` from `from` to `to` in `step` increments,
    /// analyzing and scanning each cutoff as if it were the live edge.
    pub fn replay(
        &self,
        date: NaiveDate,
        from: NaiveTime,
        to: NaiveTime,
        step: Duration,
    ) -> Vec<ReplayFrame> {
        if step <= Duration::zero() {
            return Vec::new();
        }

        let day = self.session(date, None);
        let mut frames = Vec::new();
        let mut until = from;

        while until <= to {
            let visible = day.session(date, Some(until));
            frames.push(ReplayFrame {
                until,
                analysis: visible.analyze(),
                signals: visible.find_entry_signals(),
            });
            let (next, wrapped) = until.overflowing_add_signed(step);
            if wrapped != 0 {
                break;
            }
            until = next;
        }

        frames
    }
}

/// Fetch one timeframe and enrich it. A failed fetch logs and yields an
/// empty series.
fn fetch_enriched(
    fetcher: &dyn BarFetcher,
    ticker: &str,
    timeframe: Timeframe,
    period: &str,
) -> Vec<EnrichedBar> {
    match fetcher.fetch(ticker, period, timeframe) {
        Ok(result) if result.bars.is_empty() => {
            warn!(ticker, %timeframe, period, provider = fetcher.name(), "no data returned");
            Vec::new()
        }
        Ok(result) => compute_indicators(&result.bars),
        Err(e) => {
            warn!(
                ticker,
                %timeframe,
                period,
                provider = fetcher.name(),
                error = %e,
                "fetch failed"
            );
            Vec::new()
        }
    }
}

/// Fetch and enrich 1m, 5m and 15m for `ticker` using the configured periods.
pub fn process_all_timeframes(
    fetcher: &dyn BarFetcher,
    ticker: &str,
    config: &EngineConfig,
) -> TimeframeSet {
    let mut set = TimeframeSet {
        ticker: ticker.to_string(),
        ..TimeframeSet::default()
    };

    for tf in Timeframe::ALL {
        *set.get_mut(tf) = fetch_enriched(fetcher, ticker, tf, config.period(tf));
    }

    info!(
        ticker,
        m1 = set.m1.len(),
        m5 = set.m5.len(),
        m15 = set.m15.len(),
        "timeframes processed"
    );
    set
}

/// As [`process_all_timeframes`], serving fresh entries from `cache` and
/// storing newly fetched non-empty series in it.
pub fn process_all_timeframes_cached(
    fetcher: &dyn BarFetcher,
    ticker: &str,
    config: &EngineConfig,
    cache: &mut SeriesCache,
    now: Instant,
) -> TimeframeSet {
    let mut set = TimeframeSet {
        ticker: ticker.to_string(),
        ..TimeframeSet::default()
    };

    for tf in Timeframe::ALL {
        if let Some(cached) = cache.get(ticker, tf, now) {
            debug!(ticker, %tf, rows = cached.len(), "cache hit");
            *set.get_mut(tf) = cached.to_vec();
            continue;
        }

        let series = fetch_enriched(fetcher, ticker, tf, config.period(tf));
        if !series.is_empty() {
            cache.insert(ticker, tf, series.clone(), now);
        }
        *set.get_mut(tf) = series;
    }

    set
}
