//! Per-timeframe classifiers: VWAP bias, MACD trend, RSI momentum.
//!
//! Each classifier is total. Scalars may be passed as `f64` or
//! `Option<f64>`; a `None` or NaN input yields
//! [`StatusTuple::not_available`].

use super::status::{StatusSymbol, StatusTuple, VwapSlope};

/// Number of trailing VWAP values fitted for the slope.
pub const SLOPE_WINDOW: usize = 5;
/// Slope magnitude (price units per bar) separating Rising/Falling from Flat.
pub const SLOPE_THRESHOLD: f64 = 0.001;
/// Relative price-to-VWAP distance treated as "near VWAP".
pub const NEAR_VWAP_RATIO: f64 = 0.001;

pub const RSI_OVERBOUGHT: f64 = 70.0;
pub const RSI_OVERSOLD: f64 = 30.0;
pub const RSI_MIDLINE: f64 = 50.0;

fn defined(value: impl Into<Option<f64>>) -> Option<f64> {
    value.into().filter(|v| !v.is_nan())
}

/// Least-squares slope of `values` against x = 0, 1, ..., len-1.
pub fn least_squares_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = values.iter().sum::<f64>() / n as f64;

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        den += dx * dx;
    }
    num / den
}

/// Slope direction of the last [`SLOPE_WINDOW`] VWAP values.
///
/// Fewer values than the window forces `Flat`. A NaN inside the window
/// fails both comparisons and also reads as `Flat`.
pub fn vwap_slope(history: &[f64]) -> VwapSlope {
    if history.len() < SLOPE_WINDOW {
        return VwapSlope::Flat;
    }
    let slope = least_squares_slope(&history[history.len() - SLOPE_WINDOW..]);
    if slope > SLOPE_THRESHOLD {
        VwapSlope::Rising
    } else if slope < -SLOPE_THRESHOLD {
        VwapSlope::Falling
    } else {
        VwapSlope::Flat
    }
}

/// Price position against VWAP combined with the VWAP slope.
///
/// `raw` carries the slope name.
pub fn vwap_status(
    price: impl Into<Option<f64>>,
    vwap: impl Into<Option<f64>>,
    vwap_history: &[f64],
) -> StatusTuple {
    let (Some(price), Some(vwap)) = (defined(price), defined(vwap)) else {
        return StatusTuple::not_available();
    };

    let slope = vwap_slope(vwap_history);

    let status = if price > vwap && slope == VwapSlope::Rising {
        StatusTuple::new("Bullish Bias", StatusSymbol::Bullish)
    } else if price < vwap && slope == VwapSlope::Falling {
        StatusTuple::new("Bearish Bias", StatusSymbol::Bearish)
    } else if (price - vwap).abs() / price < NEAR_VWAP_RATIO {
        StatusTuple::new(format!("Near VWAP ({slope})"), StatusSymbol::Neutral)
    } else if price > vwap {
        StatusTuple::new(format!("Price > VWAP ({slope})"), StatusSymbol::Unknown)
    } else {
        StatusTuple::new(format!("Price < VWAP ({slope})"), StatusSymbol::Unknown)
    };

    status.with_raw(slope.as_str())
}

/// MACD line against its signal line, confirmed by the histogram sign.
pub fn macd_status(
    macd: impl Into<Option<f64>>,
    signal: impl Into<Option<f64>>,
    hist: impl Into<Option<f64>>,
) -> StatusTuple {
    let (Some(macd), Some(signal), Some(hist)) = (defined(macd), defined(signal), defined(hist))
    else {
        return StatusTuple::not_available();
    };

    if macd > signal && hist > 0.0 {
        StatusTuple::new("Bullish Trend", StatusSymbol::Bullish)
    } else if macd < signal && hist < 0.0 {
        StatusTuple::new("Bearish Trend", StatusSymbol::Bearish)
    } else {
        StatusTuple::new("No Clear Trend", StatusSymbol::Neutral)
    }
}

/// RSI momentum reading.
///
/// Overbought/oversold take priority and read as reversal calls: above 70
/// is Bearish, below 30 is Bullish. Between them the 50 midline decides.
pub fn rsi_status(rsi: impl Into<Option<f64>>) -> StatusTuple {
    let Some(rsi) = defined(rsi) else {
        return StatusTuple::not_available();
    };

    if rsi > RSI_OVERBOUGHT {
        StatusTuple::new(format!("Overbought ({rsi:.1})"), StatusSymbol::Bearish)
    } else if rsi < RSI_OVERSOLD {
        StatusTuple::new(format!("Oversold ({rsi:.1})"), StatusSymbol::Bullish)
    } else if rsi > RSI_MIDLINE {
        StatusTuple::new(format!("Bullish Momentum ({rsi:.1})"), StatusSymbol::Bullish)
    } else {
        StatusTuple::new(format!("Bearish Momentum ({rsi:.1})"), StatusSymbol::Bearish)
    }
}
