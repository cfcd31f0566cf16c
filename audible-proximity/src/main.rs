use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::sync::mpsc;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use proximity_decoder::Mp3FileResolver;
use proximity_runtime::{
    init_logging, init_logging_from_env, LoggingMode, ProximityService, SystemClock,
};

pub mod config;
pub mod driver;
pub mod ingress;

use config::{load_config, print_summary, Args};
use driver::TracingDriver;
use ingress::Timestamps;

/// Why the service is being stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    Interrupted,
    EndOfInput,
    IngressFailed,
}

fn open_input(args: &Args) -> Result<Box<dyn BufRead + Send>> {
    match &args.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open input {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args, |key| std::env::var(key).ok())
        .context("Failed to load configuration")?;

    let logging = if config.debug_logging {
        init_logging(LoggingMode::Debug)
    } else {
        init_logging_from_env()
    };
    logging.context("Failed to initialize logging")?;

    print_summary(&config);
    let input = open_input(&args)?;

    let resolver = Mp3FileResolver::new(&config.audio_root);
    let service = ProximityService::start(&config, resolver, TracingDriver::new())
        .context("Failed to start scheduler")?;

    let (stop_tx, stop_rx) = mpsc::channel();

    {
        let stop_tx = stop_tx.clone();
        ctrlc::set_handler(move || {
            let _ = stop_tx.send(StopReason::Interrupted);
        })
        .context("Failed to install Ctrl-C handler")?;
    }

    // Blocking reads stay off the main thread so Ctrl-C is never stuck behind stdin
    let sender = service.sender();
    let timestamps = if args.restamp {
        Timestamps::Arrival
    } else {
        Timestamps::FromRecord
    };
    thread::Builder::new()
        .name("proximity-ingress".to_string())
        .spawn(move || {
            let reason = match ingress::pump(input, &SystemClock, timestamps, |o| sender.send(o)) {
                Ok(stats) => {
                    info!(
                        "End of input after {} observation(s), {} skipped",
                        stats.accepted, stats.skipped
                    );
                    StopReason::EndOfInput
                }
                Err(e) => {
                    error!("Observation input failed: {:#}", e);
                    StopReason::IngressFailed
                }
            };
            let _ = stop_tx.send(reason);
        })
        .context("Failed to start input thread")?;

    info!("Audible proximity running");

    let reason = stop_rx.recv().unwrap_or(StopReason::Interrupted);
    info!("Shutting down ({:?})", reason);

    service.shutdown().context("Scheduler did not shut down cleanly")?;

    if reason == StopReason::IngressFailed {
        anyhow::bail!("Stopped after an input error");
    }
    Ok(())
}

fn main() {
    if let Err(e) = run(Args::parse()) {
        eprintln!("audible-proximity: {:#}", e);
        std::process::exit(1);
    }
}
