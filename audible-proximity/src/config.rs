//! Command line and configuration layering
//!
//! Later layers win: built-in defaults, then the JSON config file, then
//! `AUDIBLE_*` environment variables, then command line flags.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use proximity_scheduler::SchedulerConfig;
use tracing::info;

/// Audible Proximity
///
/// Reads radio observations as JSON lines and plays the audio advertised by
/// the nearest beacons on a fixed number of players.
#[derive(Parser, Debug, Default)]
#[command(name = "audible-proximity")]
#[command(about = "Proximity-driven audio playback for nearby beacons")]
#[command(version)]
pub struct Args {
    /// JSON file with scheduler settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of concurrent players
    #[arg(short = 'p', long)]
    pub pool_size: Option<usize>,

    /// RSSI (dBm) at or above which a beacon plays at full volume
    #[arg(long, allow_hyphen_values = true)]
    pub max_rssi: Option<i32>,

    /// RSSI (dBm) at or below which a beacon is inaudible
    #[arg(long, allow_hyphen_values = true)]
    pub min_rssi: Option<i32>,

    /// Milliseconds between scheduler ticks
    #[arg(long)]
    pub tick_interval_ms: Option<u64>,

    /// Milliseconds of silence after which a beacon is cut off
    #[arg(long)]
    pub stale_threshold_ms: Option<u64>,

    /// Directory bare file names are resolved against
    #[arg(short = 'a', long)]
    pub audio_root: Option<PathBuf>,

    /// Weight of the newest value when smoothing loudness, in (0, 1]
    #[arg(long)]
    pub smoothing: Option<f64>,

    /// Log a ranking and slot snapshot every tick
    #[arg(long)]
    pub debug: bool,

    /// Read observations from this file instead of stdin
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Ignore record timestamps and use arrival time (for replaying captures)
    #[arg(long)]
    pub restamp: bool,
}

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "AUDIBLE_";

/// Build the scheduler configuration from every layer and validate it
///
/// `env` looks up a variable by full name; pass `|k| std::env::var(k).ok()`
/// outside of tests.
pub fn load_config(args: &Args, env: impl Fn(&str) -> Option<String>) -> Result<SchedulerConfig> {
    let mut config = match &args.config {
        Some(path) => read_config_file(path)?,
        None => SchedulerConfig::default(),
    };

    apply_env(&mut config, &env)?;
    apply_args(&mut config, args);

    config
        .validate()
        .context("Invalid scheduler configuration")?;

    Ok(config)
}

fn read_config_file(path: &Path) -> Result<SchedulerConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

fn apply_env(config: &mut SchedulerConfig, env: &impl Fn(&str) -> Option<String>) -> Result<()> {
    if let Some(v) = env_value(env, "POOL_SIZE")? {
        config.pool_size = v;
    }
    if let Some(v) = env_value(env, "MAX_RSSI")? {
        config.max_rssi = v;
    }
    if let Some(v) = env_value(env, "MIN_RSSI")? {
        config.min_rssi = v;
    }
    if let Some(v) = env_value(env, "TICK_INTERVAL_MS")? {
        config.tick_interval_ms = v;
    }
    if let Some(v) = env_value(env, "STALE_THRESHOLD_MS")? {
        config.stale_threshold_ms = v;
    }
    if let Some(v) = env(&format!("{}AUDIO_ROOT", ENV_PREFIX)) {
        config.audio_root = PathBuf::from(v);
    }
    if let Some(v) = env_value(env, "SMOOTHING")? {
        config.smoothing = v;
    }
    if env(&format!("{}DEBUG", ENV_PREFIX)).is_some() {
        config.debug_logging = true;
    }

    Ok(())
}

fn env_value<T>(env: &impl Fn(&str) -> Option<String>, suffix: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let name = format!("{}{}", ENV_PREFIX, suffix);
    env(&name)
        .map(|raw| {
            raw.trim()
                .parse()
                .with_context(|| format!("Invalid {} environment variable", name))
        })
        .transpose()
}

fn apply_args(config: &mut SchedulerConfig, args: &Args) {
    if let Some(v) = args.pool_size {
        config.pool_size = v;
    }
    if let Some(v) = args.max_rssi {
        config.max_rssi = v;
    }
    if let Some(v) = args.min_rssi {
        config.min_rssi = v;
    }
    if let Some(v) = args.tick_interval_ms {
        config.tick_interval_ms = v;
    }
    if let Some(v) = args.stale_threshold_ms {
        config.stale_threshold_ms = v;
    }
    if let Some(v) = &args.audio_root {
        config.audio_root = v.clone();
    }
    if let Some(v) = args.smoothing {
        config.smoothing = v;
    }
    if args.debug {
        config.debug_logging = true;
    }
}

/// Log the effective configuration
pub fn print_summary(config: &SchedulerConfig) {
    info!("Configuration:");
    info!("  Players: {}", config.pool_size);
    info!("  RSSI range: {} dBm (full) to {} dBm (silent)", config.max_rssi, config.min_rssi);
    info!("  Tick interval: {:?}", config.tick_interval());
    info!("  Stale threshold: {:?}", Duration::from_millis(config.stale_threshold_ms));
    info!("  Audio root: {}", config.audio_root.display());
    info!("  Smoothing: {}", config.smoothing);
    info!("  Debug snapshots: {}", config.debug_logging);
}
