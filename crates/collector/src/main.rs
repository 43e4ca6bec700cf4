//! RTM sentiment collector CLI
//!
//! Runs collection cycles against the persisted dataset and serves
//! latest/history reads from it as JSON.
//!
//! Usage:
//!   rtm-collector --db data/rtm.sqlite3 collect --prices prices.json --load load.json
//!   rtm-collector --db data/rtm.sqlite3 latest --zone "North Hub"
//!   rtm-collector --db data/rtm.sqlite3 history --zone HB_WEST --hours 48

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use rtm_core::{CanonicalRecord, Config};
use rtm_ingestion::{
    assemble, fetch_with_fallback, normalize_loads, normalize_prices, BatchSource, FetchWindow,
    JsonFileSource,
};
use rtm_sentiment::SentimentEngine;
use rtm_store::{collect_and_update, DatasetQuery, DatasetStore};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "rtm-collector")]
#[command(about = "Collect RTM prices and load, score sentiment, and query the dataset")]
struct Args {
    /// JSON configuration file
    #[arg(long, env = "RTM_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite dataset (overrides collection.dataset_path)
    #[arg(long, env = "RTM_DB")]
    db: Option<PathBuf>,

    /// Debug logging
    #[arg(long, short)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch, merge, rescore and persist
    Collect {
        /// Price batch files, tried in order until one succeeds
        #[arg(long, required = true, num_args = 1..)]
        prices: Vec<PathBuf>,

        /// Load batch files, tried in order until one succeeds
        #[arg(long = "load", num_args = 1..)]
        loads: Vec<PathBuf>,

        /// Hours in the past to refresh
        #[arg(long)]
        lookback: Option<u32>,
    },
    /// Most recent row for a zone
    Latest {
        #[arg(long)]
        zone: String,
    },
    /// Trailing rows for a zone
    History {
        #[arg(long)]
        zone: String,

        #[arg(long)]
        hours: Option<u32>,
    },
    /// Zones present in the dataset
    Zones,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "rtm=debug" } else { "rtm=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn json_sources(paths: &[PathBuf]) -> Vec<Box<dyn BatchSource>> {
    paths
        .iter()
        .map(|path| Box::new(JsonFileSource::new(path.clone())) as Box<dyn BatchSource>)
        .collect()
}

/// Fetch and normalize one cycle's worth of rows.
///
/// Points whose hour falls outside `window` are discarded. Price failures
/// abort the cycle. Load is optional: a failed or malformed load batch is
/// logged and the cycle continues with prices only.
fn fetch_fresh(
    price_sources: &[Box<dyn BatchSource>],
    load_sources: &[Box<dyn BatchSource>],
    window: &FetchWindow,
) -> Result<Vec<CanonicalRecord>> {
    let price_batch = fetch_with_fallback(price_sources, window).context("fetching prices")?;
    let mut prices = normalize_prices(&price_batch).context("normalizing prices")?;

    let mut loads = if load_sources.is_empty() {
        Vec::new()
    } else {
        match fetch_with_fallback(load_sources, window).and_then(|batch| normalize_loads(&batch)) {
            Ok(loads) => loads,
            Err(e) => {
                tracing::warn!(error = %e, "load unavailable, continuing with prices only");
                Vec::new()
            }
        }
    };

    let (price_total, load_total) = (prices.len(), loads.len());
    prices.retain(|p| window.overlaps_hour(p.timestamp));
    loads.retain(|l| window.overlaps_hour(l.timestamp));
    tracing::debug!(
        prices_outside = price_total - prices.len(),
        loads_outside = load_total - loads.len(),
        "trimmed to fetch window"
    );

    tracing::info!(prices = prices.len(), loads = loads.len(), "normalized batches");
    Ok(assemble(&prices, &loads))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(db) = args.db {
        config.collection.dataset_path = db;
    }
    let dataset_path = config.collection.dataset_path.clone();

    match args.command {
        Command::Collect {
            prices,
            loads,
            lookback,
        } => {
            let lookback = lookback.unwrap_or(config.collection.lookback_hours);
            let window = FetchWindow::trailing(lookback, Utc::now());
            tracing::info!(
                start = %window.start,
                end = %window.end,
                db = %dataset_path.display(),
                "starting collection cycle"
            );

            let fresh = fetch_fresh(&json_sources(&prices), &json_sources(&loads), &window)?;
            let engine = SentimentEngine::new(&config.sentiment);
            let mut store = DatasetStore::open(
                &dataset_path,
                Duration::from_secs(config.collection.busy_timeout_secs),
            )
            .with_context(|| format!("opening dataset {}", dataset_path.display()))?;

            let report = collect_and_update(&mut store, &fresh, &engine)?;
            print_json(&serde_json::json!({
                "fetched": report.fetched,
                "existing": report.existing,
                "combined": report.combined,
            }))
        }
        Command::Latest { zone } => {
            let records = load_snapshot(&dataset_path)?;
            let query = DatasetQuery::new(&records, config.query.max_history_hours);
            print_json(query.latest(&zone)?)
        }
        Command::History { zone, hours } => {
            let records = load_snapshot(&dataset_path)?;
            let query = DatasetQuery::new(&records, config.query.max_history_hours);
            let hours = hours.unwrap_or(config.query.default_history_hours);
            print_json(&query.history(&zone, hours)?)
        }
        Command::Zones => {
            let records = load_snapshot(&dataset_path)?;
            let query = DatasetQuery::new(&records, config.query.max_history_hours);
            print_json(&query.zones())
        }
    }
}

fn load_snapshot(path: &std::path::Path) -> Result<rtm_core::EnrichedTable> {
    let store = DatasetStore::open_read_only(path)
        .with_context(|| format!("opening dataset {}", path.display()))?;
    Ok(store.load()?)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    run(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use clap::CommandFactory;
    use rtm_core::Zone;
    use std::io::Write;

    fn json_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    fn window() -> FetchWindow {
        FetchWindow::trailing(48, Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap())
    }

    const PRICES: &str = r#"[
        {"time": "2024-01-01T00:05:00Z", "Settlement Point": "HB_NORTH", "price": 20.0},
        {"time": "2024-01-01T00:35:00Z", "Settlement Point": "HB_NORTH", "price": 30.0},
        {"time": "2024-01-01T01:05:00Z", "Settlement Point": "LZ_WEST", "price": 18.0}
    ]"#;

    const LOADS: &str = r#"[
        {"time": "2024-01-01T00:00:00Z", "Load": 41000.0}
    ]"#;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_collect() {
        let args = Args::try_parse_from([
            "rtm-collector",
            "--db",
            "x.sqlite3",
            "collect",
            "--prices",
            "a.json",
            "b.json",
            "--load",
            "l.json",
        ])
        .unwrap();
        match args.command {
            Command::Collect { prices, loads, lookback } => {
                assert_eq!(prices, vec![PathBuf::from("a.json"), PathBuf::from("b.json")]);
                assert_eq!(loads, vec![PathBuf::from("l.json")]);
                assert_eq!(lookback, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_fetch_fresh_falls_back_to_second_file() {
        let prices = json_file(PRICES);
        let loads = json_file(LOADS);
        let sources = json_sources(&[PathBuf::from("/nonexistent/prices.json"), prices.path().to_path_buf()]);

        let fresh = fetch_fresh(&sources, &json_sources(&[loads.path().to_path_buf()]), &window()).unwrap();
        assert_eq!(fresh.len(), 2);
        assert_eq!(fresh[0].zone, Zone::HbNorth);
        assert_eq!(fresh[0].price, Some(25.0));
        assert_eq!(fresh[0].system_load, Some(41000.0));
        assert_eq!(fresh[1].zone, Zone::West);
    }

    #[test]
    fn test_fetch_fresh_tolerates_bad_load() {
        let prices = json_file(PRICES);
        let bad_load = json_file(r#"[{"when": "2024-01-01T00:00:00Z", "Load": 1.0}]"#);
        let fresh = fetch_fresh(
            &json_sources(&[prices.path().to_path_buf()]),
            &json_sources(&[bad_load.path().to_path_buf()]),
            &window(),
        )
        .unwrap();
        assert_eq!(fresh.len(), 2);
        assert!(fresh.iter().all(|r| r.system_load.is_none()));
    }

    #[test]
    fn test_fetch_fresh_drops_rows_outside_window() {
        let prices = json_file(
            r#"[
            {"time": "2020-01-01T00:00:00Z", "Settlement Point": "HB_NORTH", "price": 99.0},
            {"time": "2024-01-03T00:10:00Z", "Settlement Point": "HB_NORTH", "price": 21.0},
            {"time": "2024-01-03T05:00:00Z", "Settlement Point": "HB_NORTH", "price": 22.0}
        ]"#,
        );
        let loads = json_file(
            r#"[
            {"time": "2020-01-01T00:00:00Z", "Load": 1.0},
            {"time": "2024-01-03T00:00:00Z", "Load": 42000.0}
        ]"#,
        );
        let window = FetchWindow::trailing(1, Utc.with_ymd_and_hms(2024, 1, 3, 1, 0, 0).unwrap());

        let fresh = fetch_fresh(
            &json_sources(&[prices.path().to_path_buf()]),
            &json_sources(&[loads.path().to_path_buf()]),
            &window,
        )
        .unwrap();
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].timestamp, Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap());
        assert_eq!(fresh[0].price, Some(21.0));
        assert_eq!(fresh[0].system_load, Some(42000.0));
    }

    #[test]
    fn test_fetch_fresh_requires_prices() {
        let result = fetch_fresh(
            &json_sources(&[PathBuf::from("/nonexistent/prices.json")]),
            &[],
            &window(),
        );
        assert!(result.is_err());
    }
}
