//! Latest-bar summary for a presentation layer.

use crate::domain::EnrichedBar;
use crate::strategy::{AnalysisResult, VwapSlope};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub timestamp: DateTime<FixedOffset>,
    pub price: f64,
    pub vwap: f64,
    /// 1m VWAP slope; `None` when the analysis had no slope reading.
    pub vwap_slope: Option<VwapSlope>,
    pub rsi: f64,
    pub macd_hist: f64,
    pub price_vwap_delta: f64,
}

impl MarketSnapshot {
    pub fn from_latest(bar: &EnrichedBar, analysis: &AnalysisResult) -> Self {
        Self {
            timestamp: bar.timestamp(),
            price: bar.close(),
            vwap: bar.vwap,
            vwap_slope: analysis.vwap.raw.as_deref().and_then(VwapSlope::from_raw),
            rsi: bar.rsi,
            macd_hist: bar.macd_hist,
            price_vwap_delta: bar.close() - bar.vwap,
        }
    }

    pub fn is_above_vwap(&self) -> bool {
        self.price_vwap_delta >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{compute_indicators, make_bars};
    use crate::strategy::analyze;

    #[test]
    fn snapshot_reads_latest_row_and_slope() {
        // Rising with a pullback every fourth bar so RSI stays defined.
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + i as f64 * 0.2 - if i % 4 == 0 { 0.5 } else { 0.0 })
            .collect();
        let series = compute_indicators(&make_bars(&closes));
        let analysis = analyze(&series, &series, &series);
        let latest = series.last().unwrap();

        let snap = MarketSnapshot::from_latest(latest, &analysis);
        assert_eq!(snap.price, latest.close());
        assert_eq!(snap.price_vwap_delta, latest.close() - latest.vwap);
        assert_eq!(snap.vwap_slope, Some(VwapSlope::Rising));
        assert!(snap.is_above_vwap());
    }

    #[test]
    fn error_analysis_has_no_slope() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + (i % 3) as f64).collect();
        let series = compute_indicators(&make_bars(&closes));
        let analysis = analyze(&series, &[], &series);
        let snap = MarketSnapshot::from_latest(series.last().unwrap(), &analysis);
        assert_eq!(snap.vwap_slope, None);
    }
}
