//! Yahoo Finance intraday data provider.
//!
//! Fetches 1m/5m/15m OHLCV bars from Yahoo's v8 chart API using a `range`
//! (e.g. `7d`) rather than explicit dates. Handles rate limiting, retries
//! with exponential backoff, response parsing and the circuit breaker, and
//! converts epoch timestamps into the exchange timezone.
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes. The CSV provider is the fallback when Yahoo is unavailable.

use super::circuit_breaker::CircuitBreaker;
use super::provider::{parse_period_days, BarFetcher, DataError, DataSource, FetchResult};
use crate::domain::{Bar, Timeframe};
use chrono::DateTime;
use chrono_tz::Tz;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    exchange_tz: Tz,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>, exchange_tz: Tz) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            exchange_tz,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    fn chart_url(symbol: &str, period: &str, interval: Timeframe) -> String {
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{symbol}\
             ?range={period}&interval={}&includePrePost=false",
            interval.interval()
        )
    }

    /// Parse the chart API response into exchange-local bars.
    fn parse_response(symbol: &str, resp: ChartResponse, tz: Tz) -> Result<Vec<Bar>, DataError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            Some(err) => {
                DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
            }
            None => DataError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        // Yahoo omits `timestamp` entirely when the range holds no bars.
        let Some(timestamps) = data.timestamp else {
            return Ok(Vec::new());
        };

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let mut bars = Vec::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            let timestamp = DateTime::from_timestamp(ts, 0)
                .map(|utc| utc.with_timezone(&tz).fixed_offset())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();

            // Intraday gaps come back as all-null rows.
            let (Some(open), Some(high), Some(low), Some(close)) = (open, high, low, close) else {
                continue;
            };

            bars.push(Bar {
                timestamp,
                open,
                high,
                low,
                close,
                volume: volume.unwrap_or(0),
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        bars.dedup_by_key(|b| b.timestamp);
        Ok(bars)
    }

    /// Execute a single request with retry and circuit breaker logic.
    fn fetch_with_retry(
        &self,
        symbol: &str,
        period: &str,
        interval: Timeframe,
    ) -> Result<Vec<Bar>, DataError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let url = Self::chart_url(symbol, period, interval);
        let mut last_error = None;
        let mut retry_after = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = retry_delay(self.base_delay, attempt, retry_after.take());
                debug!(
                    symbol,
                    %interval,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "retrying fetch"
                );
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            let resp = match self.client.get(&url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    self.circuit_breaker.record_failure();
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();

            if status == reqwest::StatusCode::FORBIDDEN {
                self.circuit_breaker.trip();
                return Err(DataError::CircuitBreakerTripped);
            }

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                self.circuit_breaker.record_failure();
                let secs = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                warn!(symbol, retry_after = secs, "rate limited by Yahoo");
                retry_after = Some(Duration::from_secs(secs));
                last_error = Some(DataError::RateLimited {
                    retry_after_secs: secs,
                });
                continue;
            }

            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(DataError::AuthenticationRequired(
                    "Yahoo Finance requires authentication".into(),
                ));
            }

            if !status.is_success() {
                self.circuit_breaker.record_failure();
                last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                continue;
            }

            let chart: ChartResponse = resp.json().map_err(|e| {
                DataError::ResponseFormatChanged(format!(
                    "failed to parse response for {symbol}: {e}"
                ))
            })?;

            let bars = Self::parse_response(symbol, chart, self.exchange_tz)?;
            self.circuit_breaker.record_success();
            return Ok(bars);
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

/// Exponential backoff for `attempt` (1-based), stretched to any
/// server-requested retry-after.
fn retry_delay(base: Duration, attempt: u32, retry_after: Option<Duration>) -> Duration {
    let backoff = base * 2u32.pow(attempt.saturating_sub(1));
    retry_after.map_or(backoff, |wait| backoff.max(wait))
}

impl BarFetcher for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        ticker: &str,
        period: &str,
        interval: Timeframe,
    ) -> Result<FetchResult, DataError> {
        parse_period_days(period)?;
        let bars = self.fetch_with_retry(ticker, period, interval)?;
        debug!(ticker, %interval, bars = bars.len(), "fetched from Yahoo");
        Ok(FetchResult {
            ticker: ticker.to_string(),
            timeframe: interval,
            bars,
            source: DataSource::YahooFinance,
        })
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "chart": {
            "result": [{
                "timestamp": [1709562660, 1709562600, 1709562720],
                "indicators": {
                    "quote": [{
                        "open":   [101.0, 100.0, null],
                        "high":   [101.5, 100.5, null],
                        "low":    [100.5,  99.5, null],
                        "close":  [101.2, 100.9, null],
                        "volume": [1200,   1000, null]
                    }]
                }
            }],
            "error": null
        }
    }"#;

    #[test]
    fn parses_sorts_and_localizes() {
        let resp: ChartResponse = serde_json::from_str(SAMPLE).unwrap();
        let bars =
            YahooProvider::parse_response("SPY", resp, chrono_tz::America::New_York).unwrap();

        // Null row dropped; remaining rows sorted ascending.
        assert_eq!(bars.len(), 2);
        assert!(bars[0].timestamp < bars[1].timestamp);
        assert_eq!(bars[0].close, 100.9);
        // 1709562600 = 2024-03-04 14:30:00 UTC = 09:30 EST.
        assert_eq!(bars[0].timestamp.to_rfc3339(), "2024-03-04T09:30:00-05:00");
    }

    #[test]
    fn not_found_maps_to_symbol_error() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#;
        let resp: ChartResponse = serde_json::from_str(body).unwrap();
        let err = YahooProvider::parse_response("ZZZZ", resp, chrono_tz::America::New_York)
            .unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { .. }));
    }

    #[test]
    fn missing_timestamps_is_empty() {
        let body = r#"{"chart":{"result":[{"indicators":{"quote":[{"open":[],"high":[],"low":[],"close":[],"volume":[]}]}}],"error":null}}"#;
        let resp: ChartResponse = serde_json::from_str(body).unwrap();
        let bars =
            YahooProvider::parse_response("SPY", resp, chrono_tz::America::New_York).unwrap();
        assert!(bars.is_empty());
    }

    #[test]
    fn retry_delay_waits_for_the_longer_of_backoff_and_retry_after() {
        let base = Duration::from_millis(500);
        assert_eq!(retry_delay(base, 1, None), Duration::from_millis(500));
        assert_eq!(retry_delay(base, 3, None), Duration::from_secs(2));
        assert_eq!(
            retry_delay(base, 1, Some(Duration::from_secs(60))),
            Duration::from_secs(60)
        );
        assert_eq!(
            retry_delay(base, 4, Some(Duration::from_secs(1))),
            Duration::from_secs(4)
        );
    }

    #[test]
    fn url_uses_range_and_interval() {
        let url = YahooProvider::chart_url("SPY", "60d", Timeframe::M15);
        assert!(url.contains("range=60d"));
        assert!(url.contains("interval=15m"));
    }
}
