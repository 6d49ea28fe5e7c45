//! Tick-driven training loop

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    Error, Result,
    config::ScheduleConfig,
    ports::{Environment, Observer, QTableRepository},
    q_learning::{AgentPhase, CatchResult, PolicyAgent, Resolution, StepOutcome},
    types::ObjectId,
};

/// Training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of episodes (resolved objects) to train for
    pub episodes: usize,

    /// Timer periods and report cadence
    pub schedule: ScheduleConfig,

    /// Abort with [`Error::TrainingStalled`] after this many ticks; derived
    /// from the schedule when `None`
    pub max_ticks: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            episodes: 500,
            schedule: ScheduleConfig::default(),
            max_ticks: None,
        }
    }
}

/// Running catch/miss counters. Reporting only; learning never reads them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingStats {
    pub caught: usize,
    pub missed: usize,
    /// Tracked objects that vanished before reaching the terminal line
    pub lost: usize,
}

impl TrainingStats {
    /// Resolved episodes
    pub fn episodes(&self) -> usize {
        self.caught + self.missed
    }

    /// `caught / (caught + missed)`, or 0 before the first episode
    pub fn success_rate(&self) -> f64 {
        let episodes = self.episodes();
        if episodes == 0 {
            0.0
        } else {
            self.caught as f64 / episodes as f64
        }
    }

    pub fn record(&mut self, result: CatchResult) {
        match result {
            CatchResult::Caught => self.caught += 1,
            CatchResult::Missed => self.missed += 1,
        }
    }
}

/// Periodic progress report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSnapshot {
    pub tick: u64,
    pub caught: usize,
    pub missed: usize,
    pub success_rate: f64,
    pub exploration_rate: f64,
    pub table_size: usize,
}

/// Result of a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingResult {
    /// Resolved episodes
    pub episodes: usize,
    pub caught: usize,
    pub missed: usize,
    pub lost: usize,
    pub success_rate: f64,
    pub final_exploration_rate: f64,
    pub table_size: usize,
    pub ticks: u64,
    pub decisions: u64,
}

impl TrainingResult {
    /// Save result to JSON file
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load result from JSON file
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let result = serde_json::from_reader(file)?;
        Ok(result)
    }
}

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickEvents {
    /// The spawn timer fired
    pub spawned: bool,
    /// The agent started tracking this object
    pub acquired: Option<ObjectId>,
    /// The decision timer fired and the agent stepped
    pub outcome: Option<StepOutcome>,
    /// A periodic report was emitted
    pub report: Option<TrainingSnapshot>,
}

/// Training loop driving one agent in one environment.
///
/// The loop owns the two timers (spawn and decision), the statistics and the
/// optional repository the table is saved to after each resolved episode.
/// The agent and environment are lent to it per call.
pub struct TrainingLoop {
    config: TrainingConfig,
    observers: Vec<Box<dyn Observer>>,
    repository: Option<Box<dyn QTableRepository>>,
    spawn_timer: f64,
    decision_timer: f64,
    ticks: u64,
    decisions: u64,
    stats: TrainingStats,
}

impl TrainingLoop {
    /// Create a new training loop
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            // Start full so the first tick spawns an object
            spawn_timer: config.schedule.spawn_interval,
            decision_timer: 0.0,
            config,
            observers: Vec::new(),
            repository: None,
            ticks: 0,
            decisions: 0,
            stats: TrainingStats::default(),
        }
    }

    /// Add an observer to the loop
    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Save the table to `repository` after every resolved episode
    pub fn with_repository(mut self, repository: Box<dyn QTableRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Advance the loop by `dt` seconds of wall time (scaled by the
    /// schedule's `time_scale`).
    pub fn tick(
        &mut self,
        agent: &mut PolicyAgent,
        env: &mut dyn Environment,
        dt: f64,
    ) -> Result<TickEvents> {
        let schedule = self.config.schedule;
        let dt = dt * schedule.time_scale;
        let mut events = TickEvents::default();

        env.advance(dt);

        self.spawn_timer += dt;
        if self.spawn_timer >= schedule.spawn_interval {
            env.spawn_object();
            self.spawn_timer = 0.0;
            events.spawned = true;
        }

        if agent.phase() == AgentPhase::Idle {
            if let Some(object) = env.nearest_object() {
                agent.track(&object);
                events.acquired = Some(object.id);
            }
        }

        self.decision_timer += dt;
        if self.decision_timer >= schedule.decision_interval
            && matches!(agent.phase(), AgentPhase::Tracking { .. })
        {
            self.decision_timer = 0.0;
            let outcome = agent.step(env);
            self.handle_outcome(agent, &outcome)?;
            events.outcome = Some(outcome);
        }

        self.ticks += 1;
        if schedule.report_every_ticks > 0 && self.ticks % schedule.report_every_ticks == 0 {
            let snapshot = self.snapshot(agent);
            info!(
                tick = snapshot.tick,
                caught = snapshot.caught,
                missed = snapshot.missed,
                success_rate = snapshot.success_rate,
                exploration_rate = snapshot.exploration_rate,
                table_size = snapshot.table_size,
                "training progress"
            );
            for observer in &mut self.observers {
                observer.on_report(&snapshot)?;
            }
            events.report = Some(snapshot);
        }

        Ok(events)
    }

    /// Tick at the schedule's frame rate until `config.episodes` more
    /// episodes have been resolved.
    pub fn run(
        &mut self,
        agent: &mut PolicyAgent,
        env: &mut dyn Environment,
    ) -> Result<TrainingResult> {
        let episodes = self.config.episodes;
        let target = self.stats.episodes() + episodes;
        let limit = self.config.max_ticks.unwrap_or_else(|| self.tick_limit(episodes));
        let frame_dt = self.config.schedule.frame_dt;

        for observer in &mut self.observers {
            observer.on_training_start(episodes)?;
        }

        let mut ticks_this_run = 0u64;
        while self.stats.episodes() < target {
            if ticks_this_run >= limit {
                return Err(Error::TrainingStalled {
                    ticks: ticks_this_run,
                    episodes: self.stats.episodes(),
                });
            }
            self.tick(agent, env, frame_dt)?;
            ticks_this_run += 1;
        }

        let result = self.result(agent);
        for observer in &mut self.observers {
            observer.on_training_end(&result)?;
        }
        Ok(result)
    }

    /// Summary of everything this loop has done so far
    pub fn result(&self, agent: &PolicyAgent) -> TrainingResult {
        TrainingResult {
            episodes: self.stats.episodes(),
            caught: self.stats.caught,
            missed: self.stats.missed,
            lost: self.stats.lost,
            success_rate: self.stats.success_rate(),
            final_exploration_rate: agent.exploration_rate(),
            table_size: agent.q_table_size(),
            ticks: self.ticks,
            decisions: self.decisions,
        }
    }

    fn snapshot(&self, agent: &PolicyAgent) -> TrainingSnapshot {
        TrainingSnapshot {
            tick: self.ticks,
            caught: self.stats.caught,
            missed: self.stats.missed,
            success_rate: self.stats.success_rate(),
            exploration_rate: agent.exploration_rate(),
            table_size: agent.q_table_size(),
        }
    }

    /// Generous ceiling: four spawn periods per requested episode.
    fn tick_limit(&self, episodes: usize) -> u64 {
        let schedule = &self.config.schedule;
        let per_spawn =
            (schedule.spawn_interval / (schedule.frame_dt * schedule.time_scale)).ceil() as u64;
        (episodes as u64)
            .saturating_mul(per_spawn.max(1))
            .saturating_mul(4)
            .saturating_add(1_000)
    }

    fn handle_outcome(&mut self, agent: &PolicyAgent, outcome: &StepOutcome) -> Result<()> {
        match outcome {
            StepOutcome::Idle => {}
            StepOutcome::Lost { target } => {
                self.stats.lost += 1;
                warn!(
                    target_id = %target,
                    "tracked object vanished before reaching the terminal line"
                );
                for observer in &mut self.observers {
                    observer.on_target_lost(self.ticks, *target)?;
                }
            }
            StepOutcome::Decided(decision) => {
                self.decisions += 1;
                for observer in &mut self.observers {
                    observer.on_decision(self.ticks, decision)?;
                }
            }
            StepOutcome::Resolved(resolution) => {
                self.decisions += 1;
                for observer in &mut self.observers {
                    observer.on_decision(self.ticks, &resolution.decision)?;
                }
                self.finish_episode(agent, resolution)?;
            }
        }
        Ok(())
    }

    fn finish_episode(&mut self, agent: &PolicyAgent, resolution: &Resolution) -> Result<()> {
        let episode = self.stats.episodes();
        self.stats.record(resolution.result);

        if agent.is_learning() {
            if let Some(repository) = &self.repository {
                repository.save(agent.q_table())?;
            }
        }

        for observer in &mut self.observers {
            observer.on_episode_end(episode, resolution)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{adapters::InMemoryRepository, config::CatcherConfig, simulation::Orchard};

    #[test]
    fn test_training_loop_resolves_requested_episodes() {
        let config = CatcherConfig::default();
        let mut agent = PolicyAgent::new(&config).unwrap().with_seed(42);
        let mut orchard = Orchard::new(config.world).with_seed(43);
        let repo = InMemoryRepository::new();

        let mut training = TrainingLoop::new(TrainingConfig {
            episodes: 10,
            schedule: config.schedule,
            max_ticks: None,
        })
        .with_repository(Box::new(repo.clone()));

        let result = training.run(&mut agent, &mut orchard).unwrap();

        assert_eq!(result.episodes, 10);
        assert_eq!(result.caught + result.missed, 10);
        assert_eq!(repo.save_count(), 10);
        assert!(result.final_exploration_rate < config.hyperparameters.exploration_rate);
        assert_eq!(repo.load().unwrap(), *agent.q_table());
    }

    #[test]
    fn test_first_tick_spawns_and_acquires() {
        let config = CatcherConfig::default();
        let mut agent = PolicyAgent::new(&config).unwrap();
        let mut orchard = Orchard::new(config.world).with_seed(1);
        let mut training = TrainingLoop::new(TrainingConfig::default());

        let events = training
            .tick(&mut agent, &mut orchard, config.schedule.frame_dt)
            .unwrap();
        assert!(events.spawned);
        assert!(events.acquired.is_some());
        assert!(matches!(agent.phase(), AgentPhase::Tracking { .. }));
    }

    #[test]
    fn test_report_cadence() {
        let mut config = CatcherConfig::default();
        config.schedule.report_every_ticks = 5;
        let mut agent = PolicyAgent::new(&config).unwrap();
        let mut orchard = Orchard::new(config.world).with_seed(2);
        let mut training = TrainingLoop::new(TrainingConfig {
            schedule: config.schedule,
            ..TrainingConfig::default()
        });

        let mut reports = Vec::new();
        for _ in 0..12 {
            let events = training.tick(&mut agent, &mut orchard, 0.01).unwrap();
            if let Some(report) = events.report {
                reports.push(report.tick);
            }
        }
        assert_eq!(reports, vec![5, 10]);
    }

    #[test]
    fn test_stalled_environment_is_reported() {
        let mut config = CatcherConfig::default();
        config.schedule.spawn_interval = 1.0e9;
        let mut agent = PolicyAgent::new(&config).unwrap();
        // Nothing ever spawns after the first tick fires the (full) timer,
        // and a huge fall speed makes that first object vanish immediately.
        config.world.fall_speed = 1.0e9;
        let mut orchard = Orchard::new(config.world);
        let mut training = TrainingLoop::new(TrainingConfig {
            episodes: 1,
            schedule: config.schedule,
            max_ticks: Some(50),
        });

        let err = training.run(&mut agent, &mut orchard).unwrap_err();
        assert!(matches!(err, Error::TrainingStalled { ticks: 50, episodes: 0 }));
    }

    #[test]
    fn test_success_rate() {
        let mut stats = TrainingStats::default();
        assert_eq!(stats.success_rate(), 0.0);
        stats.record(CatchResult::Caught);
        stats.record(CatchResult::Caught);
        stats.record(CatchResult::Caught);
        stats.record(CatchResult::Missed);
        assert_eq!(stats.success_rate(), 0.75);
    }
}
