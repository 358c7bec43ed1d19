//! Integration tests for the data pipeline: providers, config and the
//! fetch-enrich-slice flow, run offline against synthetic and CSV data.

use chrono::{NaiveDate, NaiveTime};
use mtfscope_core::data::{
    BarFetcher, CsvProvider, DataSource, NyseCalendar, SyntheticProvider, TradingCalendar,
};
use mtfscope_core::domain::{Bar, Timeframe};
use mtfscope_core::{process_all_timeframes, Direction, EngineConfig, MarketSnapshot};
use std::fmt::Write as _;
use std::path::Path;

fn end_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 8).unwrap()
}

fn synthetic() -> SyntheticProvider {
    SyntheticProvider::new(NyseCalendar::default(), chrono_tz::America::New_York, end_date())
        .with_seed(7)
}

fn config() -> EngineConfig {
    EngineConfig::from_toml(
        r#"
        [periods]
        m1 = "2d"
        m5 = "5d"
        m15 = "5d"
        "#,
    )
    .unwrap()
}

fn write_csv(dir: &Path, ticker: &str, tf: Timeframe, bars: &[Bar]) {
    let mut body = String::from("timestamp,open,high,low,close,volume\n");
    for b in bars {
        writeln!(
            body,
            "{},{},{},{},{},{}",
            b.timestamp.to_rfc3339(),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        )
        .unwrap();
    }
    std::fs::write(dir.join(format!("{ticker}_{}.csv", tf.interval())), body).unwrap();
}

#[test]
fn synthetic_pipeline_produces_a_verdict() {
    let set = process_all_timeframes(&synthetic(), "SPY", &config());
    assert!(set.is_complete());

    let day = set.session(end_date(), None);
    let analysis = day.analyze();
    assert_ne!(analysis.overall.direction, Direction::Error);

    let snapshot: MarketSnapshot = day.snapshot(&analysis).unwrap();
    assert_eq!(snapshot.timestamp.date_naive(), end_date());
    assert_eq!(snapshot.timestamp.time(), NaiveTime::from_hms_opt(15, 59, 0).unwrap());
}

#[test]
fn csv_round_trip_matches_synthetic_source() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config();
    let source = synthetic();

    for tf in Timeframe::ALL {
        let fetched = source.fetch("SPY", config.period(tf), tf).unwrap();
        assert_eq!(fetched.source, DataSource::Synthetic);
        write_csv(tmp.path(), "SPY", tf, &fetched.bars);
    }

    let csv = CsvProvider::new(tmp.path(), chrono_tz::America::New_York);
    let from_csv = process_all_timeframes(&csv, "SPY", &config);
    let from_source = process_all_timeframes(&source, "SPY", &config);

    assert_eq!(from_csv, from_source);
    assert_eq!(from_csv.find_entry_signals(), from_source.find_entry_signals());
}

#[test]
fn missing_csv_timeframe_fails_closed() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config();
    let source = synthetic();

    // Only 1m and 15m files exist.
    for tf in [Timeframe::M1, Timeframe::M15] {
        let fetched = source.fetch("QQQ", config.period(tf), tf).unwrap();
        write_csv(tmp.path(), "QQQ", tf, &fetched.bars);
    }

    let csv = CsvProvider::new(tmp.path(), chrono_tz::America::New_York);
    let set = process_all_timeframes(&csv, "QQQ", &config);
    assert!(set.m5.is_empty());
    assert!(!set.m1.is_empty());

    let analysis = set.analyze();
    assert_eq!(analysis.overall.direction, Direction::Error);
    assert_eq!(analysis.overall.narrative, "Not enough data for all timeframes.");
    assert!(set.find_entry_signals().is_empty());
}

#[test]
fn synthetic_sessions_follow_the_calendar() {
    let calendar = NyseCalendar::default();
    // Good Friday 2024-03-29 sits inside this window.
    let provider = SyntheticProvider::new(
        calendar,
        chrono_tz::America::New_York,
        NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
    );
    let bars = provider.fetch("SPY", "4d", Timeframe::M15).unwrap().bars;
    let dates: Vec<NaiveDate> = {
        let mut d: Vec<_> = bars.iter().map(Bar::session_date).collect();
        d.dedup();
        d
    };
    let expected: Vec<NaiveDate> = calendar
        .valid_sessions(
            NaiveDate::from_ymd_opt(2024, 3, 27).unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
        )
        .into_iter()
        .collect();
    assert_eq!(dates, expected);
}

#[test]
fn eastern_timestamps_cross_dst() {
    // 2024-03-10 is the spring-forward Sunday.
    let provider = SyntheticProvider::new(
        NyseCalendar::default(),
        chrono_tz::America::New_York,
        NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(),
    );
    let bars = provider.fetch("SPY", "2d", Timeframe::M15).unwrap().bars;
    let first = bars.first().unwrap();
    let last = bars.last().unwrap();
    assert_eq!(first.timestamp.offset().local_minus_utc(), -5 * 3600);
    assert_eq!(last.timestamp.offset().local_minus_utc(), -4 * 3600);
    assert_eq!(first.timestamp.time(), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
}
