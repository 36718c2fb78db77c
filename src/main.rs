//! Purity Tracker CLI
//!
//! Replays recorded input events through the keystroke tracker and inspects
//! trust classification.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use purity_tracker::{
    config::{parse_time_zone, Config},
    port::spawn_reader,
    transparency::{create_shared_log_with_persistence, PersistedStats},
    trust::{classify, ConfidenceLevel, ReviewerProfile},
    KeystrokeSignatureTracker, VirtualInput, PRIVACY_DECLARATION, VERSION,
};
use serde::Serialize;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "purity-tracker")]
#[command(version = VERSION)]
#[command(about = "Keystroke-dynamics signatures for review verification", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay an NDJSON event log and print the tracker outputs
    Replay {
        /// Event log path, or `-` for stdin
        input: PathBuf,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,

        /// IANA time zone for hour_of_day (overrides config)
        #[arg(long)]
        tz: Option<String>,
    },

    /// Show the trust badge for a reviewer profile
    Trust {
        /// Confidence level (low, medium, high)
        #[arg(long)]
        confidence: ConfidenceLevel,

        /// Consistency score between 0 and 1
        #[arg(long)]
        score: f64,

        /// Number of reviews backing the profile
        #[arg(long, default_value = "0")]
        reviews: u32,

        /// Profile is flagged for review
        #[arg(long)]
        flagged: bool,
    },

    /// Replay an event log and post the resulting vote (requires gateway feature)
    Submit {
        /// Event log path, or `-` for stdin
        input: PathBuf,

        /// Dish identifier
        #[arg(long)]
        dish: String,

        /// Rating on the 10-point scale
        #[arg(long)]
        rating: f64,

        /// Would order again
        #[arg(long)]
        again: bool,

        /// Review text that was typed
        #[arg(long)]
        review: Option<String>,
    },

    /// Show cumulative collection statistics
    Status,

    /// Display privacy declaration
    Privacy,

    /// Show configuration
    Config,
}

/// Output of a replay run.
#[derive(Serialize)]
struct ReplayReport {
    purity: purity_tracker::PuritySnapshot,
    jitter_profile: Option<purity_tracker::JitterProfile>,
    stats: purity_tracker::TrackerStats,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay { input, pretty, tz } => cmd_replay(&input, pretty, tz),
        Commands::Trust {
            confidence,
            score,
            reviews,
            flagged,
        } => {
            cmd_trust(confidence, score, reviews, flagged);
            Ok(())
        }
        Commands::Submit {
            input,
            dish,
            rating,
            again,
            review,
        } => cmd_submit(&input, dish, rating, again, review),
        Commands::Status => cmd_status(),
        Commands::Privacy => {
            println!("{PRIVACY_DECLARATION}");
            Ok(())
        }
        Commands::Config => cmd_config(),
    }
}

fn open_log(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(std::io::BufReader::new(std::io::stdin())));
    }
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(Box::new(std::io::BufReader::new(file)))
}

/// Stream `path` through a tracker attached to a virtual input.
///
/// Ctrl+C stops reading early; the tracker keeps whatever it has seen.
fn run_replay(path: &Path, config: &Config, tz: Option<String>) -> Result<KeystrokeSignatureTracker> {
    config.tracker.validate()?;
    let tz = match tz {
        Some(name) => Some(parse_time_zone(&name)?),
        None => config.time_zone()?,
    };

    if let Err(e) = config.ensure_directories() {
        tracing::warn!("Could not create data directory: {e}");
    }
    let log = create_shared_log_with_persistence(config.transparency_path());

    let input = Rc::new(VirtualInput::new());
    let mut tracker =
        KeystrokeSignatureTracker::with_config(config.tracker.clone()).with_transparency_log(log.clone());
    if let Some(tz) = tz {
        tracker = tracker.with_time_zone(tz);
    }
    tracker.attach(Some(input.clone()));

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || r.store(false, Ordering::SeqCst)) {
        tracing::warn!("Could not install Ctrl+C handler: {e}");
    }

    let (receiver, reader) = spawn_reader(open_log(path)?);
    let mut delivered = 0usize;
    while running.load(Ordering::SeqCst) {
        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                input.dispatch(event);
                delivered += 1;
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }

    if running.load(Ordering::SeqCst) {
        match reader.join() {
            Ok(result) => {
                result.context("reading event log")?;
            }
            Err(_) => bail!("event reader thread panicked"),
        }
    } else {
        tracing::info!("Interrupted; reporting partial replay");
    }

    tracing::info!(events = delivered, "Replay complete");
    tracker.detach();

    if let Err(e) = log.save() {
        tracing::warn!("Could not save transparency log: {e}");
    }

    Ok(tracker)
}

fn cmd_replay(path: &Path, pretty: bool, tz: Option<String>) -> Result<()> {
    let config = Config::load_or_default();
    let tracker = run_replay(path, &config, tz)?;

    let report = ReplayReport {
        purity: tracker.purity(),
        jitter_profile: tracker.jitter_profile(),
        stats: tracker.stats(),
    };

    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(())
}

fn cmd_trust(confidence: ConfidenceLevel, score: f64, reviews: u32, flagged: bool) {
    let profile = ReviewerProfile {
        confidence_level: confidence,
        consistency_score: score,
        review_count: reviews,
        flagged,
    };
    match classify(Some(&profile)) {
        Some(badge) => println!("{badge}"),
        None => println!("none"),
    }
}

#[cfg(feature = "gateway")]
fn cmd_submit(
    path: &Path,
    dish: String,
    rating: f64,
    again: bool,
    review: Option<String>,
) -> Result<()> {
    use purity_tracker::{BlockingGatewayClient, GatewayConfig, SubmissionBuilder};

    let config = Config::load_or_default();
    let settings = config
        .gateway
        .clone()
        .context("no gateway endpoint configured")?;

    let tracker = run_replay(path, &config, None)?;

    let mut builder = SubmissionBuilder::new(dish)
        .would_order_again(again)
        .rating(rating);
    if let Some(text) = review {
        builder = builder.review(text);
    }
    let submission = builder.build(&tracker)?;
    tracker.reset();

    let client = BlockingGatewayClient::new(GatewayConfig::from_settings(&settings)?)?;
    let response = client.submit(&submission)?;
    if response.success {
        println!("Submitted vote {}", submission.id);
    } else {
        bail!(
            "vote rejected: {}",
            response.error.unwrap_or_else(|| "unknown error".to_string())
        );
    }
    Ok(())
}

#[cfg(not(feature = "gateway"))]
fn cmd_submit(
    _path: &Path,
    _dish: String,
    _rating: f64,
    _again: bool,
    _review: Option<String>,
) -> Result<()> {
    bail!("submit requires the gateway feature to be enabled at compile time")
}

fn cmd_status() -> Result<()> {
    let config = Config::load_or_default();

    println!("Purity Tracker Status");
    println!("=====================");
    println!();
    println!("Configuration:");
    println!("  Minimum characters: {}", config.tracker.min_chars_for_score);
    println!(
        "  Flight bounds: {}-{} ms",
        config.tracker.flight_bounds_ms.0, config.tracker.flight_bounds_ms.1
    );
    println!(
        "  Time zone: {}",
        config.timezone.as_deref().unwrap_or("local")
    );
    println!();

    let stats_path = config.transparency_path();
    if !stats_path.exists() {
        println!("No previous session data found.");
        return Ok(());
    }

    let content = std::fs::read_to_string(&stats_path)
        .with_context(|| format!("reading {}", stats_path.display()))?;
    let stats: PersistedStats = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", stats_path.display()))?;

    println!("Cumulative Statistics:");
    println!("  Key presses: {}", stats.presses);
    println!("  Key releases: {}", stats.releases);
    println!("  Pastes: {}", stats.pastes);
    println!("  Mutations: {}", stats.mutations);
    println!("  Purity snapshots: {}", stats.purity_snapshots);
    println!("  Jitter profiles: {}", stats.jitter_profiles);
    println!("  Last updated: {}", stats.last_updated.to_rfc3339());
    Ok(())
}

fn cmd_config() -> Result<()> {
    let config = Config::load()?;

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
