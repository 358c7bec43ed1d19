//! Volume-Weighted Average Price (VWAP), cumulative over the input series.
//!
//! VWAP[t] = sum(typical[0..=t] * volume[0..=t]) / sum(volume[0..=t])
//! typical = (high + low + close) / 3
//!
//! The accumulator is never reset at a calendar-day boundary. Callers that
//! want a per-session VWAP must pass a single session.
//! Lookback: 0. Rows before the first traded volume are NaN.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Default)]
pub struct Vwap;

impl Vwap {
    pub fn new() -> Self {
        Self
    }
}

impl Indicator for Vwap {
    fn name(&self) -> &str {
        "vwap"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let mut result = Vec::with_capacity(bars.len());
        let mut cum_pv = 0.0;
        let mut cum_volume = 0.0;

        for bar in bars {
            let volume = bar.volume as f64;
            cum_pv += bar.typical_price() * volume;
            cum_volume += volume;

            if cum_volume > 0.0 {
                result.push(cum_pv / cum_volume);
            } else {
                result.push(f64::NAN);
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn vwap_known_values() {
        let mut bars = make_bars(&[10.0, 20.0]);
        bars[0].high = 11.0;
        bars[0].low = 9.0;
        bars[0].volume = 100;
        bars[1].high = 22.0;
        bars[1].low = 18.0;
        bars[1].volume = 300;

        let result = Vwap::new().compute(&bars);
        // typical: 10, 20
        assert_approx(result[0], 10.0, DEFAULT_EPSILON);
        assert_approx(result[1], (10.0 * 100.0 + 20.0 * 300.0) / 400.0, DEFAULT_EPSILON);
    }

    #[test]
    fn vwap_undefined_until_volume_trades() {
        let mut bars = make_bars(&[10.0, 11.0, 12.0]);
        bars[0].volume = 0;
        bars[1].volume = 0;

        let result = Vwap::new().compute(&bars);
        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert_approx(result[2], bars[2].typical_price(), DEFAULT_EPSILON);
    }

    #[test]
    fn vwap_within_cumulative_range() {
        let bars = make_bars(&[100.0, 105.0, 98.0, 110.0, 95.0]);
        let result = Vwap::new().compute(&bars);

        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for (bar, vwap) in bars.iter().zip(&result) {
            lo = lo.min(bar.low);
            hi = hi.max(bar.high);
            assert!(*vwap >= lo && *vwap <= hi);
        }
    }
}
