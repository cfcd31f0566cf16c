//! Background worker thread for the scheduler
//!
//! Owns the scheduler and a current-thread tokio runtime. Observations queued
//! by any number of producers are applied at the start of each tick, so
//! `observe` and `tick` never run concurrently. On shutdown whatever is still
//! queued is applied in one last tick before every player is stopped.

use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use proximity_decoder::PayloadResolver;
use proximity_scheduler::{Observation, PlaybackDriver, ProximityScheduler};
use tokio::runtime::Runtime;
use tokio::sync::oneshot;
use tokio::time::MissedTickBehavior;

use crate::clock::Clock;
use crate::error::{Result, RuntimeError};

/// Name of the scheduler worker thread
pub const WORKER_THREAD_NAME: &str = "proximity-scheduler";

/// Everything the control loop needs, moved onto the worker thread
pub(crate) struct ControlLoop<R, D, C> {
    pub scheduler: ProximityScheduler<R, D>,
    pub clock: C,
    pub tick_interval: Duration,
    pub observation_rx: mpsc::Receiver<Observation>,
    pub shutdown_rx: oneshot::Receiver<()>,
}

/// Spawn the worker thread, handing it an already built runtime
pub(crate) fn spawn_scheduler_worker<R, D, C>(
    runtime: Runtime,
    control: ControlLoop<R, D, C>,
) -> Result<JoinHandle<()>>
where
    R: PayloadResolver + Send + 'static,
    D: PlaybackDriver + Send + 'static,
    C: Clock,
{
    thread::Builder::new()
        .name(WORKER_THREAD_NAME.to_string())
        .spawn(move || runtime.block_on(control.run()))
        .map_err(|e| RuntimeError::RuntimeInit(e.to_string()))
}

/// Build the single-threaded runtime the worker drives
pub(crate) fn build_runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|e| RuntimeError::RuntimeInit(e.to_string()))
}

impl<R, D, C> ControlLoop<R, D, C>
where
    R: PayloadResolver,
    D: PlaybackDriver,
    C: Clock,
{
    async fn run(mut self) {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            "Scheduler started: {} player slot(s), tick every {:?}",
            self.scheduler.slots().len(),
            self.tick_interval
        );

        loop {
            tokio::select! {
                biased;

                // Fires on an explicit signal or when the handle is gone
                _ = &mut self.shutdown_rx => {
                    tracing::info!("Scheduler received shutdown signal");
                    // Observations queued before the signal still get a tick
                    self.run_tick();
                    break;
                }

                _ = interval.tick() => {
                    self.run_tick();
                }
            }
        }

        let stopped = self.scheduler.shutdown();
        tracing::info!("Scheduler shut down, {} player(s) stopped", stopped.len());
    }

    fn run_tick(&mut self) {
        let drained = self.drain_observations();
        let now = self.clock.now_ms();
        let commands = self.scheduler.tick(now);

        if drained > 0 || !commands.is_empty() {
            tracing::debug!(
                "Tick at {}: {} observation(s), {} command(s), {} device(s) tracked",
                now,
                drained,
                commands.len(),
                self.scheduler.registry().len()
            );
        }
    }

    /// Apply every queued observation in arrival order
    fn drain_observations(&mut self) -> usize {
        let mut drained = 0;
        while let Ok(observation) = self.observation_rx.try_recv() {
            self.scheduler.observe(&observation);
            drained += 1;
        }
        drained
    }
}
