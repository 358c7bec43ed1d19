//! Historical entry-signal scanner.
//!
//! Evaluates the alignment rule independently on every 1m row, with the
//! 5m and 15m series forward-filled onto the 1m timestamps. The only state
//! carried between rows is the previous 1m MACD/signal pair used for the
//! crossover test.

use super::classifier::{RSI_MIDLINE, RSI_OVERBOUGHT, RSI_OVERSOLD};
use crate::data::align::forward_fill;
use crate::domain::EnrichedBar;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Buy markers sit this fraction below the bar low.
pub const BUY_MARKER_FACTOR: f64 = 0.998;
/// Sell markers sit this fraction above the bar high.
pub const SELL_MARKER_FACTOR: f64 = 1.002;

/// One historical occurrence of a fully aligned entry condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalPoint {
    pub timestamp: DateTime<FixedOffset>,
    /// Row position in the 1m series the signal fired on.
    pub bar_index: usize,
    pub marker_price: f64,
}

/// Buy and sell points, each ascending by timestamp.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntrySignals {
    pub buy: Vec<SignalPoint>,
    pub sell: Vec<SignalPoint>,
}

impl EntrySignals {
    pub fn is_empty(&self) -> bool {
        self.buy.is_empty() && self.sell.is_empty()
    }

    pub fn into_parts(self) -> (Vec<SignalPoint>, Vec<SignalPoint>) {
        (self.buy, self.sell)
    }
}

/// Bullish/bearish trend predicates for one higher-timeframe row.
fn trend_flags(row: Option<&EnrichedBar>) -> (bool, bool) {
    match row {
        Some(r) => (
            r.close() > r.vwap && r.macd > r.macd_signal,
            r.close() < r.vwap && r.macd < r.macd_signal,
        ),
        None => (false, false),
    }
}

/// Per-row predicate values, exposed for inspection and testing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowPredicates {
    pub bull15: bool,
    pub bear15: bool,
    pub bull5: bool,
    pub bear5: bool,
    pub cross_up: bool,
    pub cross_down: bool,
    pub rsi_ok_buy: bool,
    pub rsi_ok_sell: bool,
}

impl RowPredicates {
    pub fn is_buy(&self) -> bool {
        self.bull15 && self.bull5 && self.cross_up && self.rsi_ok_buy
    }

    pub fn is_sell(&self) -> bool {
        self.bear15 && self.bear5 && self.cross_down && self.rsi_ok_sell
    }
}

/// Evaluate every predicate for each 1m row.
pub fn row_predicates(
    m1: &[EnrichedBar],
    m5: &[EnrichedBar],
    m15: &[EnrichedBar],
) -> Vec<RowPredicates> {
    let timestamps: Vec<DateTime<FixedOffset>> = m1.iter().map(EnrichedBar::timestamp).collect();
    let aligned_5m = forward_fill(&timestamps, m5, EnrichedBar::timestamp);
    let aligned_15m = forward_fill(&timestamps, m15, EnrichedBar::timestamp);

    m1.iter()
        .enumerate()
        .map(|(i, row)| {
            let (bull15, bear15) = trend_flags(aligned_15m[i]);
            let (bull5, bear5) = trend_flags(aligned_5m[i]);

            let (cross_up, cross_down) = match i.checked_sub(1).map(|p| &m1[p]) {
                Some(prev) => (
                    row.macd > row.macd_signal && prev.macd < prev.macd_signal,
                    row.macd < row.macd_signal && prev.macd > prev.macd_signal,
                ),
                None => (false, false),
            };

            RowPredicates {
                bull15,
                bear15,
                bull5,
                bear5,
                cross_up,
                cross_down,
                rsi_ok_buy: row.rsi > RSI_MIDLINE && row.rsi < RSI_OVERBOUGHT,
                rsi_ok_sell: row.rsi > RSI_OVERSOLD && row.rsi < RSI_MIDLINE,
            }
        })
        .collect()
}

/// Every 1m row where the full buy or sell alignment fired.
///
/// Any empty series yields no signals.
pub fn find_entry_signals(
    m1: &[EnrichedBar],
    m5: &[EnrichedBar],
    m15: &[EnrichedBar],
) -> EntrySignals {
    if m1.is_empty() || m5.is_empty() || m15.is_empty() {
        return EntrySignals::default();
    }

    let mut signals = EntrySignals::default();

    for (i, flags) in row_predicates(m1, m5, m15).iter().enumerate() {
        let bar = &m1[i].bar;
        if flags.is_buy() {
            signals.buy.push(SignalPoint {
                timestamp: bar.timestamp,
                bar_index: i,
                marker_price: bar.low * BUY_MARKER_FACTOR,
            });
        }
        if flags.is_sell() {
            signals.sell.push(SignalPoint {
                timestamp: bar.timestamp,
                bar_index: i,
                marker_price: bar.high * SELL_MARKER_FACTOR,
            });
        }
    }

    debug!(
        rows = m1.len(),
        buys = signals.buy.len(),
        sells = signals.sell.len(),
        "entry signals scanned"
    );

    signals
}
