//! Criterion benchmarks for mtfscope hot paths.
//!
//! Benchmarks:
//! 1. Indicator engine (single indicators and the full enriched series)
//! 2. Live analysis over three enriched timeframes
//! 3. Entry-signal scan with as-of forward fill

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use chrono::NaiveDate;
use mtfscope_core::data::{BarFetcher, NyseCalendar, SyntheticProvider};
use mtfscope_core::domain::{Bar, EnrichedBar, Timeframe};
use mtfscope_core::indicators::{compute_indicators, Indicator, Macd, Rsi, Vwap};
use mtfscope_core::strategy::{analyze, find_entry_signals};

// ── Helpers ──────────────────────────────────────────────────────────

fn provider() -> SyntheticProvider {
    SyntheticProvider::new(
        NyseCalendar::default(),
        chrono_tz::America::New_York,
        NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(),
    )
}

fn bars(tf: Timeframe, days: u32) -> Vec<Bar> {
    provider()
        .fetch("BENCH", &format!("{days}d"), tf)
        .unwrap()
        .bars
}

fn enriched(days: u32) -> (Vec<EnrichedBar>, Vec<EnrichedBar>, Vec<EnrichedBar>) {
    (
        compute_indicators(&bars(Timeframe::M1, days)),
        compute_indicators(&bars(Timeframe::M5, days)),
        compute_indicators(&bars(Timeframe::M15, days)),
    )
}

// ── 1. Indicator Engine ──────────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicator_engine");

    for &days in &[1u32, 7, 30] {
        let bars = bars(Timeframe::M1, days);
        let bar_count = bars.len();

        let singles: Vec<(&str, Box<dyn Indicator>)> = vec![
            ("vwap", Box::new(Vwap::new())),
            ("rsi_14", Box::new(Rsi::default())),
        ];
        for (name, indicator) in &singles {
            group.bench_with_input(BenchmarkId::new(*name, bar_count), &bar_count, |b, _| {
                b.iter(|| indicator.compute(black_box(&bars)));
            });
        }

        group.bench_with_input(BenchmarkId::new("macd_12_26_9", bar_count), &bar_count, |b, _| {
            b.iter(|| Macd::default().compute_all(black_box(&bars)));
        });

        group.bench_with_input(
            BenchmarkId::new("compute_indicators", bar_count),
            &bar_count,
            |b, _| {
                b.iter(|| compute_indicators(black_box(&bars)));
            },
        );
    }

    group.finish();
}

// ── 2. Live Analysis ─────────────────────────────────────────────────

fn bench_analyze(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze");
    let (m1, m5, m15) = enriched(7);

    group.bench_function("latest_bar_7d", |b| {
        b.iter(|| analyze(black_box(&m1), black_box(&m5), black_box(&m15)));
    });

    group.finish();
}

// ── 3. Entry-Signal Scan ─────────────────────────────────────────────

fn bench_signal_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("signal_scan");

    for &days in &[1u32, 7, 30] {
        let (m1, m5, m15) = enriched(days);
        group.bench_with_input(
            BenchmarkId::new("find_entry_signals", m1.len()),
            &m1.len(),
            |b, _| {
                b.iter(|| find_entry_signals(black_box(&m1), black_box(&m5), black_box(&m15)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_indicators, bench_analyze, bench_signal_scan);
criterion_main!(benches);
