use crate::controller::TrackerOptions;
use anyhow::{anyhow, Result};
use clap::Parser;
use std::time::Duration;

/// neotrack - block explorer core for a JSON-RPC chain node
///
/// Polls the node for new blocks and streams view-state snapshots as JSON
/// lines on stdout; panel requests are read as JSON lines on stdin.
/// Configuration priority: CLI args > Environment variables > Defaults
#[derive(Parser, Debug)]
#[command(name = "neotrack")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Block explorer tracking core", long_about = None)]
pub struct CliArgs {
    /// Node JSON-RPC endpoint URL
    #[arg(long, env = "NEO_RPC_URL")]
    pub rpc_url: Option<String>,

    /// Height polling interval in milliseconds (100-60000)
    #[arg(long, env = "POLL_INTERVAL_MS")]
    pub poll_interval_ms: Option<u64>,

    /// Blocks shown per page (1-500)
    #[arg(long, env = "PAGE_SIZE")]
    pub page_size: Option<usize>,

    /// Blocks skipped by the panel's paging buttons (1-500)
    #[arg(long, env = "PAGINATION_DISTANCE")]
    pub pagination_distance: Option<u64>,

    /// Number of historical blocks kept in memory (0-1048576)
    #[arg(long, env = "CACHE_CAPACITY")]
    pub cache_capacity: Option<usize>,

    /// RPC request timeout in milliseconds (1000-60000)
    #[arg(long, env = "RPC_TIMEOUT_MS")]
    pub rpc_timeout_ms: Option<u64>,

    /// Number of retry attempts for failed RPC requests (0-10)
    #[arg(long, env = "RPC_RETRIES")]
    pub rpc_retries: Option<u32>,

    /// Upper bound on a single block or height fetch, retries included (1000-120000)
    #[arg(long, env = "FETCH_TIMEOUT_MS")]
    pub fetch_timeout_ms: Option<u64>,

    /// Concurrent block fetches per batch (1-64)
    #[arg(long, env = "FETCH_CONCURRENCY")]
    pub fetch_concurrency: Option<usize>,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub rpc_url: String,
    pub poll_interval_ms: u64,
    pub page_size: usize,
    pub pagination_distance: u64,
    pub cache_capacity: usize,
    pub rpc_timeout_ms: u64,
    pub rpc_retries: u32,
    pub fetch_timeout_ms: u64,
    pub fetch_concurrency: usize,
}

pub const DEFAULT_RPC_URL: &str = "http://localhost:50012";

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            poll_interval_ms: 3000,
            page_size: 50,
            pagination_distance: 15,
            cache_capacity: 10240,
            rpc_timeout_ms: 8000,
            rpc_retries: 2,
            fetch_timeout_ms: 10000,
            fetch_concurrency: 8,
        }
    }
}

/// Validate that a value is within a given range (inclusive)
fn validate_in_range<T>(val: T, min: T, max: T, name: &str) -> Result<T>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if val < min || val > max {
        Err(anyhow!("{name} must be in range [{min}, {max}], got {val}"))
    } else {
        Ok(val)
    }
}

/// Load configuration from CLI args and environment variables
pub fn load() -> Result<Config> {
    from_args(CliArgs::parse())
}

pub fn from_args(args: CliArgs) -> Result<Config> {
    let d = Config::default();

    let rpc_url = args.rpc_url.unwrap_or(d.rpc_url);
    validate_url(&rpc_url, "NEO_RPC_URL")?;

    let poll_interval_ms = validate_in_range(
        args.poll_interval_ms.unwrap_or(d.poll_interval_ms),
        100,
        60000,
        "POLL_INTERVAL_MS",
    )?;
    let page_size = validate_in_range(
        args.page_size.unwrap_or(d.page_size),
        1,
        500,
        "PAGE_SIZE",
    )?;
    let pagination_distance = validate_in_range(
        args.pagination_distance.unwrap_or(d.pagination_distance),
        1,
        500,
        "PAGINATION_DISTANCE",
    )?;
    let cache_capacity = validate_in_range(
        args.cache_capacity.unwrap_or(d.cache_capacity),
        0,
        1 << 20,
        "CACHE_CAPACITY",
    )?;
    let rpc_timeout_ms = validate_in_range(
        args.rpc_timeout_ms.unwrap_or(d.rpc_timeout_ms),
        1000,
        60000,
        "RPC_TIMEOUT_MS",
    )?;
    let rpc_retries = validate_in_range(
        args.rpc_retries.unwrap_or(d.rpc_retries),
        0,
        10,
        "RPC_RETRIES",
    )?;
    let fetch_timeout_ms = validate_in_range(
        args.fetch_timeout_ms.unwrap_or(d.fetch_timeout_ms),
        1000,
        120000,
        "FETCH_TIMEOUT_MS",
    )?;
    let fetch_concurrency = validate_in_range(
        args.fetch_concurrency.unwrap_or(d.fetch_concurrency),
        1,
        64,
        "FETCH_CONCURRENCY",
    )?;

    Ok(Config {
        rpc_url,
        poll_interval_ms,
        page_size,
        pagination_distance,
        cache_capacity,
        rpc_timeout_ms,
        rpc_retries,
        fetch_timeout_ms,
        fetch_concurrency,
    })
}

/// Validate URL format (basic check)
fn validate_url(url: &str, name: &str) -> Result<()> {
    if url.is_empty() {
        return Err(anyhow!("{name} cannot be empty"));
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(anyhow!("{name} must start with http:// or https://"))
    }
}

impl Config {
    pub fn tracker_options(&self) -> TrackerOptions {
        TrackerOptions {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            page_size: self.page_size,
            pagination_distance: self.pagination_distance,
            cache_capacity: self.cache_capacity,
            fetch_timeout: Duration::from_millis(self.fetch_timeout_ms),
            fetch_concurrency: self.fetch_concurrency,
            panel_title: format!("Block Explorer: {}", self.rpc_url),
        }
    }

    pub fn print_summary(&self) {
        log::info!("neotrack configuration:");
        log::info!("  RPC URL: {}", self.rpc_url);
        log::info!("  Poll Interval: {}ms", self.poll_interval_ms);
        log::info!("  Page Size: {} blocks", self.page_size);
        log::info!("  Pagination Distance: {}", self.pagination_distance);
        log::info!("  Cache Capacity: {} blocks", self.cache_capacity);
        log::info!("  RPC Timeout: {}ms", self.rpc_timeout_ms);
        log::info!("  RPC Retries: {}", self.rpc_retries);
        log::info!("  Fetch Timeout: {}ms", self.fetch_timeout_ms);
        log::info!("  Fetch Concurrency: {}", self.fetch_concurrency);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["neotrack"];
        argv.extend_from_slice(extra);
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_flags_override_defaults() {
        let cfg = from_args(args(&[
            "--rpc-url",
            "https://testnet1.neo.coz.io:443",
            "--page-size",
            "20",
            "--cache-capacity",
            "0",
        ]))
        .unwrap();
        assert_eq!(cfg.rpc_url, "https://testnet1.neo.coz.io:443");
        assert_eq!(cfg.page_size, 20);
        assert_eq!(cfg.cache_capacity, 0);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let err = from_args(args(&["--page-size", "0"])).unwrap_err();
        assert!(err.to_string().contains("PAGE_SIZE"));

        assert!(from_args(args(&["--poll-interval-ms", "50"])).is_err());
        assert!(from_args(args(&["--fetch-concurrency", "65"])).is_err());
    }

    #[test]
    fn test_bad_url_rejected() {
        assert!(from_args(args(&["--rpc-url", "ws://localhost:1"])).is_err());
        assert!(from_args(args(&["--rpc-url", ""])).is_err());
    }

    #[test]
    fn test_tracker_options_carry_values() {
        let opts = Config::default().tracker_options();
        assert_eq!(opts.poll_interval, Duration::from_millis(3000));
        assert_eq!(opts.page_size, 50);
        assert_eq!(opts.pagination_distance, 15);
        assert_eq!(opts.cache_capacity, 10240);
        assert_eq!(opts.panel_title, "Block Explorer: http://localhost:50012");
    }
}
