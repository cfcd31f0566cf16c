//! The proximity scheduler
//!
//! Single owner of the registry, the player pool, the resolver and the
//! driver. Callers serialize `observe` and `tick` onto one execution
//! context (see `proximity-runtime`), so none of this state is locked.

use proximity_decoder::PayloadResolver;

use crate::allocator::PlayerAllocator;
use crate::command::PlaybackCommand;
use crate::config::SchedulerConfig;
use crate::decay::StalenessPolicy;
use crate::driver::PlaybackDriver;
use crate::error::ConfigError;
use crate::model::{Observation, PlayerSlot};
use crate::registry::{DeviceRegistry, ObserveOutcome};
use crate::snapshot::TickSnapshot;

/// Target used for the per-tick debug snapshot
pub const SNAPSHOT_TARGET: &str = "proximity::snapshot";

/// Proximity-driven allocator of a fixed pool of players
///
/// # Example
///
/// ```rust
/// use proximity_decoder::Mp3FileResolver;
/// use proximity_scheduler::{Observation, PlaybackCommand, ProximityScheduler, RecordingDriver, SchedulerConfig};
///
/// let config = SchedulerConfig::default();
/// let mut scheduler =
///     ProximityScheduler::new(&config, Mp3FileResolver::new("/srv/audio"), RecordingDriver::new()).unwrap();
///
/// scheduler.observe(&Observation::new("x", -60, 1_000, b"x.mp3".to_vec()));
/// let commands = scheduler.tick(1_000);
///
/// assert_eq!(commands.len(), 1);
/// assert!(matches!(commands[0], PlaybackCommand::Play { slot: 0, volume: 100, .. }));
/// ```
pub struct ProximityScheduler<R, D> {
    registry: DeviceRegistry,
    allocator: PlayerAllocator,
    staleness: StalenessPolicy,
    resolver: R,
    driver: D,
    debug_snapshots: bool,
    last_tick: Option<u64>,
    observed_since_tick: bool,
}

impl<R, D> ProximityScheduler<R, D>
where
    R: PayloadResolver,
    D: PlaybackDriver,
{
    /// Create a scheduler, refusing invalid configuration
    pub fn new(config: &SchedulerConfig, resolver: R, driver: D) -> Result<Self, ConfigError> {
        config.validate()?;

        let smoothing = config.smoothing_filter();

        Ok(Self {
            registry: DeviceRegistry::new(config.loudness_model(), smoothing),
            allocator: PlayerAllocator::new(config.pool_size, smoothing),
            staleness: config.staleness_policy(),
            resolver,
            driver,
            debug_snapshots: config.debug_logging,
            last_tick: None,
            observed_since_tick: false,
        })
    }

    /// Handle one observation; never fails
    pub fn observe(&mut self, observation: &Observation) -> ObserveOutcome {
        let outcome = self.registry.observe(observation, &self.resolver);
        if outcome != ObserveOutcome::Discarded {
            self.observed_since_tick = true;
        }
        outcome
    }

    /// Run decay and allocation for `now` and dispatch the resulting commands
    ///
    /// Returns the commands emitted this tick. A tick on an empty registry,
    /// or a repeat of the previous tick's instant with nothing observed in
    /// between, emits nothing.
    pub fn tick(&mut self, now: u64) -> Vec<PlaybackCommand> {
        if self.registry.is_empty() {
            tracing::trace!("Tick at {} skipped: no audible devices", now);
            self.mark_ticked(now);
            return Vec::new();
        }

        // Continuity smoothing keeps moving volumes on every allocation, so a
        // repeated instant has to be short-circuited here to stay idempotent
        if self.last_tick == Some(now) && !self.observed_since_tick {
            return Vec::new();
        }

        self.registry.tick_decay(now, &self.staleness);

        let occupied_before: Vec<bool> = self
            .allocator
            .slots()
            .iter()
            .map(|slot| !slot.is_idle())
            .collect();

        let mut commands = {
            let ranked = self.registry.ranked();
            self.allocator.allocate(&ranked)
        };
        let recovery = self.dispatch_all(&commands, &occupied_before);
        commands.extend(recovery);

        if self.debug_snapshots {
            tracing::debug!(target: SNAPSHOT_TARGET, "{}", self.snapshot(now));
        }

        let removed = self.registry.remove_expired(now, &self.staleness);
        if !removed.is_empty() {
            tracing::debug!("Dropped {} stale device(s) at {}", removed.len(), now);
        }

        self.mark_ticked(now);
        commands
    }

    /// Stop every occupied slot; the last thing a scheduler does
    pub fn shutdown(&mut self) -> Vec<PlaybackCommand> {
        let commands = self.allocator.release_all();
        tracing::info!("Stopping {} active player(s)", commands.len());
        for command in &commands {
            self.dispatch_one(command);
        }
        commands
    }

    /// Current ranking and slot table
    pub fn snapshot(&self, now: u64) -> TickSnapshot {
        TickSnapshot::capture(now, &self.registry.ranked(), self.allocator.slots())
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    pub fn slots(&self) -> &[PlayerSlot] {
        self.allocator.slots()
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    fn mark_ticked(&mut self, now: u64) {
        self.last_tick = Some(now);
        self.observed_since_tick = false;
    }

    /// Dispatch a tick's commands, returning any `Stop` sent to recover
    ///
    /// A rejected `Play` frees its slot so the next tick offers it again. If
    /// the slot was playing another device before, that track is stopped.
    fn dispatch_all(
        &mut self,
        commands: &[PlaybackCommand],
        occupied_before: &[bool],
    ) -> Vec<PlaybackCommand> {
        let mut recovery = Vec::new();

        for command in commands {
            if self.dispatch_one(command) || !command.is_play() {
                continue;
            }

            let slot = command.slot();
            self.allocator.forget(slot);

            if occupied_before.get(slot).copied().unwrap_or(false) {
                let stop = PlaybackCommand::Stop { slot };
                self.dispatch_one(&stop);
                recovery.push(stop);
            }
        }

        recovery
    }

    /// Hand one command to the driver; failures are logged, never retried
    fn dispatch_one(&mut self, command: &PlaybackCommand) -> bool {
        match self.driver.dispatch(command) {
            Ok(()) => {
                tracing::debug!("Dispatched {}", command);
                true
            }
            Err(e) => {
                tracing::warn!("Playback driver failed on {}: {}", command, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::RecordingDriver;
    use crate::model::DeviceId;
    use proximity_decoder::FileUri;

    fn named(payload: &[u8]) -> Option<FileUri> {
        let name = std::str::from_utf8(payload).ok()?;
        FileUri::parse(&format!("file:///audio/{}", name)).ok()
    }

    type TestScheduler = ProximityScheduler<fn(&[u8]) -> Option<FileUri>, RecordingDriver>;

    fn scheduler(config: SchedulerConfig) -> TestScheduler {
        ProximityScheduler::new(&config, named as fn(&[u8]) -> Option<FileUri>, RecordingDriver::new()).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = SchedulerConfig::new().with_pool_size(0);
        let result = ProximityScheduler::new(&config, named, RecordingDriver::new());
        assert!(matches!(result, Err(ConfigError::InvalidPoolSize(0))));
    }

    #[test]
    fn test_empty_registry_skips_tick() {
        let mut s = scheduler(SchedulerConfig::default());
        assert!(s.tick(0).is_empty());
        assert!(s.driver().commands().is_empty());
    }

    #[test]
    fn test_discarded_observation_changes_nothing() {
        let mut s = scheduler(SchedulerConfig::default());
        let outcome = s.observe(&Observation::new("x", -60, 0, b"x.wav".to_vec()));

        assert_eq!(outcome, ObserveOutcome::Discarded);
        assert!(s.tick(0).is_empty());
    }

    #[test]
    fn test_repeat_tick_is_noop() {
        let mut s = scheduler(SchedulerConfig::default());
        s.observe(&Observation::new("x", -70, 0, b"x.mp3".to_vec()));

        assert_eq!(s.tick(1_000).len(), 1);
        let slots = s.slots().to_vec();

        assert!(s.tick(1_000).is_empty());
        assert_eq!(s.slots(), slots.as_slice());
    }

    #[test]
    fn test_rejected_play_is_retried_next_tick() {
        let config = SchedulerConfig::default();
        let mut s = ProximityScheduler::new(
            &config,
            named,
            RecordingDriver::new().with_missing_file("x.mp3"),
        )
        .unwrap();
        s.observe(&Observation::new("x", -60, 0, b"x.mp3".to_vec()));

        let first = s.tick(0);
        assert_eq!(first.len(), 1);
        assert!(s.slots()[0].is_idle());

        let second = s.tick(500);
        assert_eq!(second.len(), 1);
        assert!(second[0].is_play());
        assert!(s.driver().commands().is_empty());
    }

    #[test]
    fn test_repeat_tick_after_observation_runs_again() {
        let mut s = scheduler(SchedulerConfig::default());
        s.observe(&Observation::new("x", -60, 0, b"x.mp3".to_vec()));
        s.tick(0);

        s.observe(&Observation::new("x", -80, 0, b"x.mp3".to_vec()));
        assert_eq!(s.tick(0), vec![PlaybackCommand::SetVolume { slot: 0, volume: 75 }]);

        // Without fresh input the same instant is short-circuited, even though
        // another allocation would smooth the volume further
        assert!(s.tick(0).is_empty());
        assert_eq!(s.slots()[0].volume(), 75);
    }

    #[test]
    fn test_rejected_replacement_stops_previous_track() {
        let config = SchedulerConfig::default().with_pool_size(1);
        let mut s = ProximityScheduler::new(
            &config,
            named as fn(&[u8]) -> Option<FileUri>,
            RecordingDriver::new().with_missing_file("y.mp3"),
        )
        .unwrap();

        s.observe(&Observation::new("x", -70, 0, b"x.mp3".to_vec()));
        s.tick(0);

        // y pushes x out, but y's file is missing
        s.observe(&Observation::new("y", -60, 100, b"y.mp3".to_vec()));
        let commands = s.tick(100);

        assert_eq!(commands.last(), Some(&PlaybackCommand::Stop { slot: 0 }));
        assert_eq!(
            s.driver().commands().last(),
            Some(&PlaybackCommand::Stop { slot: 0 })
        );
        assert!(s.slots()[0].is_idle());

        // Retried on an idle slot: nothing left to stop
        let retried = s.tick(200);
        assert_eq!(retried.len(), 1);
        assert!(retried[0].is_play());
        assert_eq!(s.driver().commands().len(), 2);
    }

    #[test]
    fn test_shutdown_stops_occupied_slots() {
        let mut s = scheduler(SchedulerConfig::default());
        s.observe(&Observation::new("x", -60, 0, b"x.mp3".to_vec()));
        s.tick(0);

        assert_eq!(s.shutdown(), vec![PlaybackCommand::Stop { slot: 0 }]);
        assert!(s.slots().iter().all(PlayerSlot::is_idle));
        assert_eq!(s.driver().commands().last(), Some(&PlaybackCommand::Stop { slot: 0 }));
    }

    #[test]
    fn test_snapshot_reflects_assignment() {
        let mut s = scheduler(SchedulerConfig::default());
        s.observe(&Observation::new("x", -60, 0, b"x.mp3".to_vec()));
        s.tick(0);

        let snapshot = s.snapshot(0);
        assert_eq!(snapshot.ranking.len(), 1);
        assert_eq!(snapshot.slots[0].device, Some(DeviceId::new("x")));
        assert_eq!(snapshot.slots[0].volume, 100);
    }
}
