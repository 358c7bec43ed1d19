//! mtfscope CLI for multi-timeframe VWAP/MACD/RSI alignment from the terminal.
//!
//! Commands:
//! - `analyze`: fetch 1m/5m/15m for a ticker and print the alignment verdict
//! - `signals`: list historical buy/sell entry signals for one session
//! - `scan`: analyze several tickers in parallel and print a summary table
//! - `replay`: step through a session and print the verdict at each cutoff
//! - `watch`: re-analyze on an interval, serving repeats from the series cache
//! - `sessions`: list trading sessions in a date range

use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDate, NaiveTime};
use clap::{Parser, Subcommand, ValueEnum};
use mtfscope_core::data::{
    BarFetcher, CircuitBreaker, CsvProvider, SeriesCache, SyntheticProvider, TradingCalendar,
    YahooProvider,
};
use mtfscope_core::pipeline::{ReplayFrame, REPLAY_START_OFFSET_MINUTES};
use mtfscope_core::strategy::{EntrySignals, StatusTuple};
use mtfscope_core::{
    process_all_timeframes, process_all_timeframes_cached, AnalysisResult, EngineConfig,
    MarketSnapshot, SourceConfig, TimeframeSet,
};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "mtfscope",
    about = "mtfscope: multi-timeframe VWAP/MACD/RSI alignment signals"
)]
struct Cli {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured bar source.
    #[arg(long, value_enum, global = true)]
    source: Option<SourceArg>,

    /// Directory of `{TICKER}_{interval}.csv` files (with `--source csv`).
    #[arg(long, global = true)]
    csv_dir: Option<PathBuf>,

    /// Seed for the synthetic source.
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    Yahoo,
    Csv,
    Synthetic,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the alignment verdict for the latest bar of a session.
    Analyze {
        /// Ticker symbol. Defaults to the configured default ticker.
        #[arg(long)]
        ticker: Option<String>,

        /// Session date (YYYY-MM-DD). Defaults to the latest session fetched.
        #[arg(long)]
        date: Option<String>,

        /// Only use bars at or before this exchange-local time (HH:MM).
        #[arg(long)]
        until: Option<String>,

        /// Print JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List buy/sell entry signals for a session.
    Signals {
        /// Ticker symbol. Defaults to the configured default ticker.
        #[arg(long)]
        ticker: Option<String>,

        /// Session date (YYYY-MM-DD). Defaults to the latest session fetched.
        #[arg(long)]
        date: Option<String>,

        /// Only use bars at or before this exchange-local time (HH:MM).
        #[arg(long)]
        until: Option<String>,

        /// Print JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Analyze several tickers in parallel.
    Scan {
        /// Tickers to scan (e.g., SPY QQQ IWM).
        #[arg(required = true)]
        tickers: Vec<String>,

        /// Print JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Step through a session and print the verdict at each cutoff.
    Replay {
        /// Ticker symbol. Defaults to the configured default ticker.
        #[arg(long)]
        ticker: Option<String>,

        /// Session date (YYYY-MM-DD). Defaults to the latest session fetched.
        #[arg(long)]
        date: Option<String>,

        /// First cutoff (HH:MM). Defaults to one hour after the market open.
        #[arg(long)]
        from: Option<String>,

        /// Last cutoff (HH:MM). Defaults to the market close.
        #[arg(long)]
        to: Option<String>,

        /// Minutes between cutoffs.
        #[arg(long, default_value_t = 15)]
        step: i64,

        /// Print JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Re-analyze a ticker on an interval.
    Watch {
        /// Ticker symbol. Defaults to the configured default ticker.
        #[arg(long)]
        ticker: Option<String>,

        /// Seconds between refreshes.
        #[arg(long, default_value_t = 60)]
        interval: u64,

        /// Stop after this many refreshes. Runs until interrupted when omitted.
        #[arg(long)]
        iterations: Option<u64>,
    },
    /// List trading sessions between two dates.
    Sessions {
        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD). Defaults to the start date.
        #[arg(long)]
        end: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::load_or_default(cli.config.as_deref())?;
    let source = resolve_source(&config, cli.source, cli.csv_dir, cli.seed)?;

    match cli.command {
        Commands::Analyze {
            ticker,
            date,
            until,
            json,
        } => {
            let date = parse_date_opt(date.as_deref())?;
            let fetcher = build_fetcher(&config, &source, date)?;
            run_analyze(&config, fetcher.as_ref(), ticker, date, until, json)
        }
        Commands::Signals {
            ticker,
            date,
            until,
            json,
        } => {
            let date = parse_date_opt(date.as_deref())?;
            let fetcher = build_fetcher(&config, &source, date)?;
            run_signals(&config, fetcher.as_ref(), ticker, date, until, json)
        }
        Commands::Scan { tickers, json } => {
            let fetcher = build_fetcher(&config, &source, None)?;
            run_scan(&config, fetcher.as_ref(), &tickers, json)
        }
        Commands::Replay {
            ticker,
            date,
            from,
            to,
            step,
            json,
        } => {
            let date = parse_date_opt(date.as_deref())?;
            let fetcher = build_fetcher(&config, &source, date)?;
            let window = ReplayWindow {
                from: parse_time_opt(from.as_deref())?
                    .unwrap_or_else(|| default_replay_from(config.market_open)),
                to: parse_time_opt(to.as_deref())?.unwrap_or(config.market_close),
                step,
            };
            run_replay(&config, fetcher.as_ref(), ticker, date, window, json)
        }
        Commands::Watch {
            ticker,
            interval,
            iterations,
        } => {
            let fetcher = build_fetcher(&config, &source, None)?;
            run_watch(&config, fetcher.as_ref(), ticker, interval, iterations)
        }
        Commands::Sessions { start, end } => run_sessions(&config, &start, end.as_deref()),
    }
}

// ── Source selection ─────────────────────────────────────────────────

fn resolve_source(
    config: &EngineConfig,
    flag: Option<SourceArg>,
    csv_dir: Option<PathBuf>,
    seed: Option<u64>,
) -> Result<SourceConfig> {
    let source = match flag {
        None => config.source.clone(),
        Some(SourceArg::Yahoo) => SourceConfig::Yahoo,
        Some(SourceArg::Csv) => match (csv_dir, &config.source) {
            (Some(dir), _) => SourceConfig::Csv { dir },
            (None, SourceConfig::Csv { dir }) => SourceConfig::Csv { dir: dir.clone() },
            (None, _) => {
                bail!("--source csv requires --csv-dir or a [source] csv entry in the config")
            }
        },
        Some(SourceArg::Synthetic) => SourceConfig::Synthetic {
            seed: match &config.source {
                SourceConfig::Synthetic { seed } => *seed,
                _ => 0,
            },
        },
    };

    Ok(match (source, seed) {
        (SourceConfig::Synthetic { .. }, Some(seed)) => SourceConfig::Synthetic { seed },
        (source, _) => source,
    })
}

/// Build the bar source. The synthetic source generates sessions up to
/// `end_date`, or up to today in the exchange timezone.
fn build_fetcher(
    config: &EngineConfig,
    source: &SourceConfig,
    end_date: Option<NaiveDate>,
) -> Result<Box<dyn BarFetcher>> {
    let tz = config.timezone()?;
    let fetcher: Box<dyn BarFetcher> = match source {
        SourceConfig::Yahoo => Box::new(YahooProvider::new(
            Arc::new(CircuitBreaker::default_provider()),
            tz,
        )?),
        SourceConfig::Csv { dir } => {
            let provider = CsvProvider::new(dir.clone(), tz);
            if !provider.is_available() {
                bail!("CSV directory does not exist: {}", dir.display());
            }
            Box::new(provider)
        }
        SourceConfig::Synthetic { seed } => {
            let end = end_date
                .unwrap_or_else(|| chrono::Utc::now().with_timezone(&tz).date_naive());
            Box::new(SyntheticProvider::new(config.calendar(), tz, end).with_seed(*seed))
        }
    };
    info!(provider = fetcher.name(), "bar source ready");
    Ok(fetcher)
}

// ── Commands ─────────────────────────────────────────────────────────

fn run_analyze(
    config: &EngineConfig,
    fetcher: &dyn BarFetcher,
    ticker: Option<String>,
    date: Option<NaiveDate>,
    until: Option<String>,
    json: bool,
) -> Result<()> {
    let ticker = ticker.unwrap_or_else(|| config.default_ticker.clone());
    let until = parse_time_opt(until.as_deref())?;
    let set = process_all_timeframes(fetcher, &ticker, config);
    let date = session_date(config, &set, date)?;

    let day = set.session(date, until);
    let analysis = day.analyze();
    let snapshot = day.snapshot(&analysis);

    if json {
        let out = serde_json::json!({
            "ticker": ticker,
            "date": date,
            "analysis": analysis,
            "snapshot": snapshot,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_analysis(&ticker, date, &analysis, snapshot.as_ref());
    }
    Ok(())
}

fn run_signals(
    config: &EngineConfig,
    fetcher: &dyn BarFetcher,
    ticker: Option<String>,
    date: Option<NaiveDate>,
    until: Option<String>,
    json: bool,
) -> Result<()> {
    let ticker = ticker.unwrap_or_else(|| config.default_ticker.clone());
    let until = parse_time_opt(until.as_deref())?;
    let set = process_all_timeframes(fetcher, &ticker, config);
    let date = session_date(config, &set, date)?;

    let signals = set.session(date, until).find_entry_signals();

    if json {
        println!("{}", serde_json::to_string_pretty(&signals)?);
    } else {
        print_signals(&ticker, date, &signals);
    }
    Ok(())
}

fn run_scan(
    config: &EngineConfig,
    fetcher: &dyn BarFetcher,
    tickers: &[String],
    json: bool,
) -> Result<()> {
    let rows: Vec<(String, Option<NaiveDate>, AnalysisResult)> = tickers
        .par_iter()
        .map(|ticker| {
            let set = process_all_timeframes(fetcher, ticker, config);
            match set.latest_session() {
                Some(date) => (ticker.clone(), Some(date), set.session(date, None).analyze()),
                None => (ticker.clone(), None, set.analyze()),
            }
        })
        .collect();

    if json {
        let out: Vec<_> = rows
            .iter()
            .map(|(ticker, date, analysis)| {
                serde_json::json!({ "ticker": ticker, "date": date, "analysis": analysis })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!(
        "{:<8} {:<12} {:<9} {:<10} {:<10} {:<10}",
        "Ticker", "Session", "Verdict", "15m Bias", "5m Conf", "1m Entry"
    );
    println!("{}", "-".repeat(64));
    for (ticker, date, analysis) in &rows {
        let date = date.map_or_else(|| "-".to_string(), |d| d.to_string());
        println!(
            "{:<8} {:<12} {:<9} {:<10} {:<10} {:<10}",
            ticker,
            date,
            analysis.overall.direction.to_string(),
            analysis.bias.symbol.to_string(),
            analysis.confirm.symbol.to_string(),
            analysis.entry.symbol.to_string(),
        );
    }
    println!();
    Ok(())
}

struct ReplayWindow {
    from: NaiveTime,
    to: NaiveTime,
    step: i64,
}

fn run_replay(
    config: &EngineConfig,
    fetcher: &dyn BarFetcher,
    ticker: Option<String>,
    date: Option<NaiveDate>,
    window: ReplayWindow,
    json: bool,
) -> Result<()> {
    let step = replay_step(window.step)?;
    if window.from > window.to {
        bail!("--from {} is after --to {}", window.from, window.to);
    }

    let ticker = ticker.unwrap_or_else(|| config.default_ticker.clone());
    let set = process_all_timeframes(fetcher, &ticker, config);
    let date = session_date(config, &set, date)?;
    let frames = set.replay(date, window.from, window.to, step);

    if json {
        println!("{}", serde_json::to_string_pretty(&frames)?);
    } else {
        print_replay(&ticker, date, &frames);
    }
    Ok(())
}

fn run_watch(
    config: &EngineConfig,
    fetcher: &dyn BarFetcher,
    ticker: Option<String>,
    interval: u64,
    iterations: Option<u64>,
) -> Result<()> {
    let ticker = ticker.unwrap_or_else(|| config.default_ticker.clone());
    let mut cache = SeriesCache::new(config.cache_ttl());
    let mut refreshes = 0u64;
    info!(
        ticker = %ticker,
        interval_secs = interval,
        cache_ttl_secs = cache.ttl().as_secs(),
        "watching"
    );

    loop {
        let set =
            process_all_timeframes_cached(fetcher, &ticker, config, &mut cache, Instant::now());
        match set.latest_session() {
            Some(date) => {
                let day = set.session(date, None);
                let analysis = day.analyze();
                let snapshot = day.snapshot(&analysis);
                print_watch_line(&ticker, &analysis, snapshot.as_ref());
            }
            None => warn!(ticker = %ticker, "no data available"),
        }

        refreshes += 1;
        if iterations.is_some_and(|n| refreshes >= n) {
            return Ok(());
        }
        std::thread::sleep(std::time::Duration::from_secs(interval));
    }
}

fn run_sessions(config: &EngineConfig, start: &str, end: Option<&str>) -> Result<()> {
    let start = parse_date(start)?;
    let end = end.map(parse_date).transpose()?.unwrap_or(start);
    if start > end {
        bail!("start date {start} is after end date {end}");
    }

    let calendar = config.calendar();
    let sessions = calendar.valid_sessions(start, end);
    let (open, close) = (config.market_open, config.market_close);

    println!("{} trading session(s) from {start} to {end}:", sessions.len());
    for date in &sessions {
        println!(
            "  {date} {}  {}-{}",
            date.format("%a"),
            open.format("%H:%M"),
            close.format("%H:%M")
        );
    }
    Ok(())
}

// ── Helpers ──────────────────────────────────────────────────────────

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{s}' (expected YYYY-MM-DD)"))
}

fn parse_date_opt(s: Option<&str>) -> Result<Option<NaiveDate>> {
    s.map(parse_date).transpose()
}

fn parse_time_opt(s: Option<&str>) -> Result<Option<NaiveTime>> {
    s.map(|s| {
        NaiveTime::parse_from_str(s, "%H:%M")
            .with_context(|| format!("invalid time '{s}' (expected HH:MM)"))
    })
    .transpose()
}

/// Requested session date, validated against the calendar, or the latest
/// session present in the fetched data.
fn session_date(
    config: &EngineConfig,
    set: &TimeframeSet,
    date: Option<NaiveDate>,
) -> Result<NaiveDate> {
    match date {
        Some(date) if !config.calendar().is_session(date) => {
            bail!("{date} is not a trading session")
        }
        Some(date) => Ok(date),
        None => match set.latest_session() {
            Some(date) => Ok(date),
            None => bail!("no data returned for {}", set.ticker),
        },
    }
}

/// Replay step in minutes as a duration; must be positive and in range.
fn replay_step(minutes: i64) -> Result<Duration> {
    if minutes <= 0 {
        bail!("--step must be a positive number of minutes");
    }
    match Duration::try_minutes(minutes) {
        Some(step) => Ok(step),
        None => bail!("--step {minutes} minutes is out of range"),
    }
}

/// First replay cutoff when `--from` is not given, clamped to the end of
/// the day.
fn default_replay_from(open: NaiveTime) -> NaiveTime {
    open.overflowing_add_signed(Duration::minutes(REPLAY_START_OFFSET_MINUTES))
        .0
        .max(open)
}

fn print_row(label: &str, status: &StatusTuple) {
    println!("{label:<16}{:<10}{}", status.symbol.to_string(), status.label);
}

fn print_analysis(
    ticker: &str,
    date: NaiveDate,
    analysis: &AnalysisResult,
    snapshot: Option<&MarketSnapshot>,
) {
    println!();
    println!("=== {ticker} {date} ===");
    print_row("15m Bias:", &analysis.bias);
    print_row("5m Confirm:", &analysis.confirm);
    print_row("1m Entry:", &analysis.entry);
    print_row("1m VWAP:", &analysis.vwap);
    println!();
    println!("Verdict:        {}", analysis.overall.direction);
    println!("                {}", analysis.overall.narrative);

    if let Some(snap) = snapshot {
        println!();
        println!("--- Latest 1m Bar ---");
        println!("Time:           {}", snap.timestamp.format("%Y-%m-%d %H:%M %:z"));
        println!("Price:          {:.2}", snap.price);
        println!(
            "VWAP:           {:.2} ({:+.2}, slope {})",
            snap.vwap,
            snap.price_vwap_delta,
            snap.vwap_slope.map_or_else(|| "N/A".to_string(), |s| s.to_string())
        );
        println!("RSI:            {:.1}", snap.rsi);
        println!("MACD Hist:      {:+.4}", snap.macd_hist);
    }
    println!();
}

fn print_signals(ticker: &str, date: NaiveDate, signals: &EntrySignals) {
    println!();
    println!(
        "=== {ticker} {date}: {} buy, {} sell ===",
        signals.buy.len(),
        signals.sell.len()
    );
    if signals.is_empty() {
        println!("No entry signals.");
        println!();
        return;
    }

    let mut rows: Vec<(&str, _)> = signals
        .buy
        .iter()
        .map(|s| ("BUY", s))
        .chain(signals.sell.iter().map(|s| ("SELL", s)))
        .collect();
    rows.sort_by_key(|(_, s)| s.timestamp);

    println!("{:<8} {:<6} {:>8} {:>12}", "Time", "Side", "Bar", "Marker");
    println!("{}", "-".repeat(37));
    for (side, point) in rows {
        println!(
            "{:<8} {:<6} {:>8} {:>12.2}",
            point.timestamp.format("%H:%M"),
            side,
            point.bar_index,
            point.marker_price
        );
    }
    println!();
}

fn print_replay(ticker: &str, date: NaiveDate, frames: &[ReplayFrame]) {
    println!();
    println!("=== {ticker} {date} replay ===");
    println!(
        "{:<6} {:<9} {:<10} {:<10} {:<10} {:>4} {:>5}",
        "Until", "Verdict", "15m Bias", "5m Conf", "1m Entry", "Buys", "Sells"
    );
    println!("{}", "-".repeat(60));
    for frame in frames {
        let a = &frame.analysis;
        println!(
            "{:<6} {:<9} {:<10} {:<10} {:<10} {:>4} {:>5}",
            frame.until.format("%H:%M"),
            a.overall.direction.to_string(),
            a.bias.symbol.to_string(),
            a.confirm.symbol.to_string(),
            a.entry.symbol.to_string(),
            frame.signals.buy.len(),
            frame.signals.sell.len(),
        );
    }
    println!();
}

fn print_watch_line(ticker: &str, analysis: &AnalysisResult, snapshot: Option<&MarketSnapshot>) {
    match snapshot {
        Some(snap) => println!(
            "{} {ticker} {:.2} vwap {:.2} rsi {:.1} -> {}",
            snap.timestamp.format("%H:%M"),
            snap.price,
            snap.vwap,
            snap.rsi,
            analysis.overall.direction
        ),
        None => println!("{ticker} -> {}", analysis.overall.direction),
    }
}
