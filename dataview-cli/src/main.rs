//! Dataview CLI
//!
//! Inspect list windows and simulate coalesced fetches and debounced searches
//! against synthetic loaders.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dataview_core::{
    loader_fn, search_fn, CancellationToken, DataviewError, Loader, MonthKey, QueryKey,
    SearchLoader, DEFAULT_OVERSCAN,
};
use dataview_fetch::{FetchCoordinator, ResourceView};
use dataview_search::{DebouncedSearchController, SearchCacheConfig, SearchConfig};
use dataview_virtual::{Align, WindowGeometry};

/// Dataview - client-side data access toolkit
#[derive(Parser)]
#[command(name = "dataview")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the render window for a scroll offset
    Window {
        #[command(flatten)]
        geometry: GeometryArgs,
        /// Scroll offset of the viewport
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        scroll_top: f64,
        /// Print the window as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compute the scroll offset that brings a row into view
    ScrollTo {
        #[command(flatten)]
        geometry: GeometryArgs,
        /// Row to scroll to
        #[arg(long)]
        index: usize,
        /// start, center, end or auto
        #[arg(long, default_value_t = Align::Start)]
        align: Align,
        /// Current scroll offset (used by auto)
        #[arg(long, default_value_t = 0.0)]
        current: f64,
    },

    /// Fire concurrent requests for one month and count loader calls
    SimulateFetch {
        /// Number of concurrent callers
        #[arg(short, long, default_value = "5")]
        callers: usize,
        /// Synthetic loader latency
        #[arg(long, default_value = "200")]
        latency_ms: u64,
        /// Make the loader fail
        #[arg(long)]
        fail: bool,
        /// Month to load (YYYY-MM), defaults to the current month
        #[arg(long)]
        month: Option<MonthKey>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Type a sequence of queries into a debounced search
    SimulateSearch {
        /// Comma-separated keystroke snapshots, e.g. a,ab,abc
        #[arg(short, long, value_delimiter = ',', required = true)]
        queries: Vec<String>,
        /// Debounce delay
        #[arg(long, default_value = "300", env = "DATAVIEW_SEARCH_DELAY_MS")]
        delay_ms: u64,
        /// Minimum query length
        #[arg(long, default_value = "2")]
        min_length: usize,
        /// Pause between keystrokes
        #[arg(long, default_value = "100")]
        gap_ms: u64,
        /// Search on the first keystroke of a burst
        #[arg(long)]
        immediate: bool,
        /// Cache results by normalized query
        #[arg(long)]
        cache: bool,
    },
}

#[derive(Args)]
struct GeometryArgs {
    /// Number of rows
    #[arg(long, env = "DATAVIEW_ITEMS")]
    items: usize,
    /// Height of every row
    #[arg(long, env = "DATAVIEW_ITEM_HEIGHT")]
    item_height: f64,
    /// Height of the viewport
    #[arg(long, env = "DATAVIEW_CONTAINER_HEIGHT")]
    container_height: f64,
    /// Extra rows rendered on each side
    #[arg(long, default_value_t = DEFAULT_OVERSCAN)]
    overscan: usize,
}

impl GeometryArgs {
    fn geometry(&self) -> WindowGeometry {
        WindowGeometry::new(self.items, self.item_height, self.container_height)
            .overscan(self.overscan)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "dataview=debug,info"
    } else {
        "dataview=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Window {
            geometry,
            scroll_top,
            json,
        } => cmd_window(&geometry, scroll_top, json),
        Commands::ScrollTo {
            geometry,
            index,
            align,
            current,
        } => cmd_scroll_to(&geometry, index, align, current),
        Commands::SimulateFetch {
            callers,
            latency_ms,
            fail,
            month,
            json,
        } => cmd_simulate_fetch(callers, latency_ms, fail, month, json).await,
        Commands::SimulateSearch {
            queries,
            delay_ms,
            min_length,
            gap_ms,
            immediate,
            cache,
        } => cmd_simulate_search(queries, delay_ms, min_length, gap_ms, immediate, cache).await,
    }
}

/// Print the window for a scroll offset
fn cmd_window(args: &GeometryArgs, scroll_top: f64, json: bool) -> Result<()> {
    let window = args
        .geometry()
        .window(scroll_top)
        .context("Invalid list geometry")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&window)?);
        return Ok(());
    }

    println!("{}", "📐 Window".cyan().bold());
    match window.visible {
        Some(span) => println!("   {} {}..={}", "Visible:".dimmed(), span.start, span.end),
        None => println!("   {} none", "Visible:".dimmed()),
    }
    let render = window.render_range();
    println!(
        "   {} {:?} ({} rows)",
        "Render:".dimmed(),
        render,
        render.len()
    );
    println!("   {} {}", "Total height:".dimmed(), window.total_height);
    println!("   {} {}", "Offset Y:".dimmed(), window.offset_y);

    if window.is_virtualized {
        println!("   {} virtualized", "Mode:".dimmed());
    } else {
        println!("   {} {}", "Mode:".dimmed(), "rendering every row".yellow());
    }

    Ok(())
}

/// Print the scroll target for a row
fn cmd_scroll_to(args: &GeometryArgs, index: usize, align: Align, current: f64) -> Result<()> {
    let geometry = args.geometry();
    let offset = geometry
        .scroll_offset(index, align, current)
        .context("Invalid list geometry")?;

    println!(
        "{} row {} ({})",
        "🎯 Scroll to".cyan().bold(),
        index,
        align
    );
    println!("   {} {}", "Scroll top:".green(), offset);
    println!(
        "   {} [0, {}]",
        "Valid range:".dimmed(),
        geometry.max_scroll()
    );

    Ok(())
}

#[derive(Debug, Serialize)]
struct FetchReport {
    month: String,
    callers: usize,
    loader_calls: usize,
    succeeded: usize,
    failed: usize,
    elapsed_ms: u128,
    error: Option<String>,
    cached_neighbours: Vec<String>,
}

/// Synthetic day list for a month.
fn month_days(key: &MonthKey) -> Vec<u32> {
    let days = match key.month() {
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    };
    (1..=days).collect()
}

/// Fire concurrent fetches for one key
async fn cmd_simulate_fetch(
    callers: usize,
    latency_ms: u64,
    fail: bool,
    month: Option<MonthKey>,
    json: bool,
) -> Result<()> {
    let month = month.unwrap_or_else(MonthKey::current);
    let latency = Duration::from_millis(latency_ms);
    let calls = Arc::new(AtomicUsize::new(0));

    let loader: Arc<dyn Loader<MonthKey, Vec<u32>>> = Arc::new(loader_fn({
        let calls = Arc::clone(&calls);
        move |key: MonthKey| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(latency).await;
                if fail {
                    return Err(DataviewError::loader(key.cache_key(), "synthetic failure"));
                }
                Ok(month_days(&key))
            }
        }
    }));

    if !json {
        println!(
            "{} {} callers → {}",
            "🚦 Fetching".cyan().bold(),
            callers,
            month
        );
    }

    let coordinator: FetchCoordinator<Vec<u32>> = FetchCoordinator::new();
    let start = Instant::now();

    let handles: Vec<_> = (0..callers)
        .map(|_| {
            let coordinator = coordinator.clone();
            let loader = Arc::clone(&loader);
            tokio::spawn(async move { coordinator.fetch_with(month, loader).await })
        })
        .collect();

    let mut succeeded = 0;
    let mut last_error = None;
    for handle in handles {
        match handle.await.context("Caller task failed")? {
            Ok(_) => succeeded += 1,
            Err(err) => last_error = Some(err),
        }
    }
    let elapsed = start.elapsed();
    let coalesced_calls = calls.load(Ordering::SeqCst);
    debug!(loader_calls = coalesced_calls, "Concurrent callers settled");

    // A view selecting the month now hits the cache and warms its neighbours
    let mut cached_neighbours = Vec::new();
    if last_error.is_none() {
        let view = ResourceView::new(coordinator.clone(), Arc::clone(&loader));
        view.select(month).await.context("Cached selection failed")?;
        tokio::time::sleep(latency + Duration::from_millis(50)).await;

        cached_neighbours = month
            .adjacent()
            .into_iter()
            .filter(|neighbour| coordinator.cached(neighbour).is_some())
            .map(|neighbour| neighbour.cache_key())
            .collect();
    }

    let report = FetchReport {
        month: month.cache_key(),
        callers,
        loader_calls: coalesced_calls,
        succeeded,
        failed: callers - succeeded,
        elapsed_ms: elapsed.as_millis(),
        error: last_error.as_ref().map(ToString::to_string),
        cached_neighbours,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("\n{}", "📈 Results:".green().bold());
    println!("   Loader calls: {}", report.loader_calls);
    println!("   Succeeded: {}", report.succeeded);
    println!("   Failed: {}", report.failed);
    println!("   Elapsed: {:?}", elapsed);

    if let Some(err) = &report.error {
        println!("   {} {}", "Error:".red(), err);
        println!(
            "   {} cached after failure: {}",
            "ℹ️".cyan(),
            coordinator.cached(&month).is_some()
        );
    } else {
        println!(
            "   Prefetched neighbours: {}",
            report.cached_neighbours.join(", ")
        );
    }

    if report.loader_calls <= 1 {
        println!("   {} All callers shared one load", "✅".green());
    } else {
        println!(
            "   {} Expected 1 loader call, saw {}",
            "❌".red(),
            report.loader_calls
        );
    }

    Ok(())
}

const CATALOG: &[&str] = &[
    "Abalone Shell Pendant",
    "Amber Tea Set",
    "Ash Wood Bowl",
    "Black Tea Sampler",
    "Brass Table Lamp",
    "Ceramic Teapot",
    "Copper Kettle",
    "Green Tea Tin",
    "Linen Tablecloth",
    "Teak Serving Tray",
];

/// Longer queries answer faster, so early keystrokes are the slow ones.
fn synthetic_latency(query: &str) -> Duration {
    let len = query.chars().count().max(1) as u64;
    Duration::from_millis(600 / len)
}

fn catalog_matches(query: &str) -> Vec<String> {
    let needle = query.trim().to_lowercase();
    CATALOG
        .iter()
        .filter(|item| item.to_lowercase().contains(&needle))
        .map(|item| item.to_string())
        .collect()
}

/// Type queries into a debounced search
async fn cmd_simulate_search(
    queries: Vec<String>,
    delay_ms: u64,
    min_length: usize,
    gap_ms: u64,
    immediate: bool,
    cache: bool,
) -> Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let loader: Arc<dyn SearchLoader<String>> = Arc::new(search_fn({
        let calls = Arc::clone(&calls);
        move |query: String, token: CancellationToken| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::select! {
                    _ = tokio::time::sleep(synthetic_latency(&query)) => {}
                    _ = token.cancelled() => return Err(DataviewError::Cancelled),
                }
                Ok(catalog_matches(&query))
            }
        }
    }));

    let mut config = SearchConfig::default()
        .delay(Duration::from_millis(delay_ms))
        .min_length(min_length)
        .immediate(immediate);
    if cache {
        config = config.cached(SearchCacheConfig::default());
    }

    let controller =
        DebouncedSearchController::new(loader, config).context("Invalid search configuration")?;

    println!("{}", "⌨️  Typing...".cyan().bold());
    for query in &queries {
        controller.search(query);
        let snapshot = controller.snapshot();
        println!(
            "   {} {:<16} ticket {} {:?}",
            "›".dimmed(),
            format!("{:?}", query),
            snapshot.ticket,
            snapshot.phase
        );
        tokio::time::sleep(Duration::from_millis(gap_ms)).await;
    }

    let longest = queries
        .iter()
        .map(|query| synthetic_latency(query))
        .max()
        .unwrap_or_default();
    tokio::time::sleep(Duration::from_millis(delay_ms) + longest + Duration::from_millis(50)).await;

    let snapshot = controller.snapshot();
    println!("\n{}", "📈 Results:".green().bold());
    println!("   {} {:?}", "Query:".dimmed(), snapshot.query);
    println!("   {} {:?}", "Phase:".dimmed(), snapshot.phase);
    println!("   {} {}", "Ticket:".dimmed(), snapshot.ticket);
    println!("   {} {}", "Loader calls:".dimmed(), calls.load(Ordering::SeqCst));

    if let Some(err) = &snapshot.error {
        println!("   {} {}", "Error:".red(), err);
    } else if snapshot.is_empty {
        println!("   {}", "No matches.".yellow());
    } else {
        for item in &snapshot.results {
            println!("   {} {}", "•".green(), item);
        }
    }

    controller.dispose();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_latency_shrinks_with_query_length() {
        assert!(synthetic_latency("a") > synthetic_latency("ab"));
        assert!(synthetic_latency("ab") > synthetic_latency("abcd"));
        assert_eq!(synthetic_latency(""), synthetic_latency("a"));
    }

    #[test]
    fn test_catalog_matches_ignore_case() {
        let matches = catalog_matches("TEA");
        assert!(matches.contains(&"Ceramic Teapot".to_string()));
        assert!(matches.contains(&"Teak Serving Tray".to_string()));
        assert!(!matches.contains(&"Copper Kettle".to_string()));
    }

    #[test]
    fn test_month_days() {
        assert_eq!(month_days(&MonthKey::new(2024, 2).unwrap()).len(), 28);
        assert_eq!(month_days(&MonthKey::new(2024, 4).unwrap()).len(), 30);
        assert_eq!(month_days(&MonthKey::new(2024, 12).unwrap()).len(), 31);
    }

    #[test]
    fn test_window_args() {
        let cli = Cli::try_parse_from([
            "dataview",
            "window",
            "--items",
            "1000",
            "--item-height",
            "50",
            "--container-height",
            "500",
            "--scroll-top",
            "1000",
        ])
        .unwrap();

        match cli.command {
            Commands::Window {
                geometry,
                scroll_top,
                ..
            } => {
                let window = geometry.geometry().window(scroll_top).unwrap();
                assert_eq!(window.render_range(), 15..35);
            }
            _ => panic!("expected window command"),
        }
    }
}
