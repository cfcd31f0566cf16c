//! Sync handle to the proximity control loop
//!
//! All async work is hidden in the worker thread. The handle is how the rest
//! of the program feeds observations in and stops the loop.

use std::sync::mpsc;
use std::thread::JoinHandle;

use proximity_decoder::PayloadResolver;
use proximity_scheduler::{Observation, PlaybackDriver, ProximityScheduler, SchedulerConfig};
use tokio::sync::oneshot;

use crate::clock::{Clock, SystemClock};
use crate::error::{Result, RuntimeError};
use crate::worker::{build_runtime, spawn_scheduler_worker, ControlLoop};

/// Cloneable, non-blocking way to hand observations to the control loop
///
/// Safe to use from blocking scanner threads.
#[derive(Debug, Clone)]
pub struct ObservationSender {
    tx: mpsc::Sender<Observation>,
}

impl ObservationSender {
    /// Queue one observation for the next tick
    pub fn send(&self, observation: Observation) -> Result<()> {
        self.tx
            .send(observation)
            .map_err(|_| RuntimeError::ChannelClosed)
    }
}

/// A running proximity scheduler
///
/// # Example
///
/// ```rust,ignore
/// use proximity_decoder::Mp3FileResolver;
/// use proximity_runtime::ProximityService;
/// use proximity_scheduler::{ChannelDriver, Observation, SchedulerConfig};
///
/// let config = SchedulerConfig::default();
/// let (driver, commands) = ChannelDriver::new();
/// let service = ProximityService::start(&config, Mp3FileResolver::new(&config.audio_root), driver)?;
///
/// service.sender().send(Observation::new("beacon-1", -62, now_ms, b"intro.mp3".to_vec()))?;
/// for command in commands.iter() {
///     println!("{}", command);
/// }
///
/// service.shutdown()?;
/// ```
pub struct ProximityService {
    observation_tx: mpsc::Sender<Observation>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl ProximityService {
    /// Validate `config` and start the control loop on wall-clock time
    pub fn start<R, D>(config: &SchedulerConfig, resolver: R, driver: D) -> Result<Self>
    where
        R: PayloadResolver + Send + 'static,
        D: PlaybackDriver + Send + 'static,
    {
        Self::start_with_clock(config, resolver, driver, SystemClock)
    }

    /// Start the control loop with a custom time source
    pub fn start_with_clock<R, D, C>(
        config: &SchedulerConfig,
        resolver: R,
        driver: D,
        clock: C,
    ) -> Result<Self>
    where
        R: PayloadResolver + Send + 'static,
        D: PlaybackDriver + Send + 'static,
        C: Clock,
    {
        let scheduler = ProximityScheduler::new(config, resolver, driver)?;
        let runtime = build_runtime()?;

        let (observation_tx, observation_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let worker = spawn_scheduler_worker(
            runtime,
            ControlLoop {
                scheduler,
                clock,
                tick_interval: config.tick_interval(),
                observation_rx,
                shutdown_rx,
            },
        )?;

        Ok(Self {
            observation_tx,
            shutdown_tx: Some(shutdown_tx),
            worker: Some(worker),
        })
    }

    /// A new handle for feeding observations
    pub fn sender(&self) -> ObservationSender {
        ObservationSender {
            tx: self.observation_tx.clone(),
        }
    }

    /// Whether the worker thread is still running
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| !worker.is_finished())
    }

    /// Stop every player and wait for the worker to exit
    pub fn shutdown(mut self) -> Result<()> {
        self.stop()
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(tx) = self.shutdown_tx.take() {
            // Loop may already be gone; joining below still reports a panic
            let _ = tx.send(());
        }

        match self.worker.take() {
            Some(worker) => worker.join().map_err(|_| RuntimeError::WorkerPanicked),
            None => Ok(()),
        }
    }
}

impl Drop for ProximityService {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::error!("Scheduler worker did not stop cleanly: {}", e);
        }
    }
}
