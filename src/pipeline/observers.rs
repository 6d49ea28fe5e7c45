//! Observer pattern for training loops
//!
//! Observers allow composable data collection during training without coupling
//! training logic to specific output formats.

use std::{
    collections::VecDeque,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    pipeline::{TrainingResult, TrainingSnapshot},
    ports::Observer,
    q_learning::{CatchResult, Decision, Resolution},
    types::{Action, ObjectId},
};

/// Observation of a single decision during an episode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepObservation {
    /// Tick the decision was issued on
    pub tick: u64,
    /// Encoded state
    pub state: String,
    pub action: Action,
    pub explored: bool,
    pub receptacle_x: f64,
    pub target_y: f64,
}

/// Complete observation of one episode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub episode: usize,
    pub result: CatchResult,
    pub reward: f64,
    pub next_state: String,
    pub updated_value: Option<f64>,
    pub exploration_rate: f64,
    pub steps: Vec<StepObservation>,
    pub total_decisions: usize,
}

/// Progress bar observer - Shows training progress
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    caught: usize,
    missed: usize,
}

impl ProgressObserver {
    /// Create a new progress observer
    pub fn new() -> Self {
        Self {
            progress_bar: None,
            caught: 0,
            missed: 0,
        }
    }

    fn message(&self, exploration_rate: f64) -> String {
        format!(
            "{} missed:{} ε:{exploration_rate:.3}",
            self.caught, self.missed
        )
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for ProgressObserver {
    fn on_training_start(&mut self, target_episodes: usize) -> Result<()> {
        let pb = ProgressBar::new(target_episodes as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} episodes (caught:{msg})",
                )
                .map_err(|e| crate::Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_episode_end(&mut self, _episode: usize, resolution: &Resolution) -> Result<()> {
        match resolution.result {
            CatchResult::Caught => self.caught += 1,
            CatchResult::Missed => self.missed += 1,
        }

        if let Some(pb) = &self.progress_bar {
            pb.inc(1);
            pb.set_message(self.message(resolution.exploration_rate));
        }
        Ok(())
    }

    fn on_training_end(&mut self, result: &TrainingResult) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(self.message(result.final_exploration_rate));
        }
        Ok(())
    }
}

/// Metrics observer - Tracks training metrics
///
/// Keeps whole-run totals plus a rolling window of recent outcomes so the
/// learning curve can be read off without a full observation log.
pub struct MetricsObserver {
    window: usize,
    recent: VecDeque<CatchResult>,
    caught: usize,
    missed: usize,
    total_reward: f64,
    decisions: usize,
    decisions_per_episode: Vec<usize>,
    current_decisions: usize,
}

impl MetricsObserver {
    /// Rolling window used by [`MetricsObserver::new`]
    pub const DEFAULT_WINDOW: usize = 100;

    /// Create a new metrics observer
    pub fn new() -> Self {
        Self::with_window(Self::DEFAULT_WINDOW)
    }

    /// Create a metrics observer with a custom rolling window (at least 1)
    pub fn with_window(window: usize) -> Self {
        Self {
            window: window.max(1),
            recent: VecDeque::new(),
            caught: 0,
            missed: 0,
            total_reward: 0.0,
            decisions: 0,
            decisions_per_episode: Vec::new(),
            current_decisions: 0,
        }
    }

    pub fn episodes(&self) -> usize {
        self.caught + self.missed
    }

    /// Whole-run success rate
    pub fn success_rate(&self) -> f64 {
        let episodes = self.episodes();
        if episodes == 0 {
            0.0
        } else {
            self.caught as f64 / episodes as f64
        }
    }

    /// Success rate over the last `window` episodes
    pub fn rolling_success_rate(&self) -> f64 {
        if self.recent.is_empty() {
            0.0
        } else {
            let caught = self
                .recent
                .iter()
                .filter(|r| **r == CatchResult::Caught)
                .count();
            caught as f64 / self.recent.len() as f64
        }
    }

    pub fn mean_reward(&self) -> f64 {
        let episodes = self.episodes();
        if episodes == 0 {
            0.0
        } else {
            self.total_reward / episodes as f64
        }
    }

    /// Get average number of decisions per resolved episode
    pub fn avg_decisions_per_episode(&self) -> f64 {
        if self.decisions_per_episode.is_empty() {
            0.0
        } else {
            self.decisions_per_episode.iter().sum::<usize>() as f64
                / self.decisions_per_episode.len() as f64
        }
    }

    /// Get metrics summary
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            episodes: self.episodes(),
            caught: self.caught,
            missed: self.missed,
            success_rate: self.success_rate(),
            rolling_success_rate: self.rolling_success_rate(),
            rolling_window: self.window,
            mean_reward: self.mean_reward(),
            total_decisions: self.decisions,
            avg_decisions_per_episode: self.avg_decisions_per_episode(),
        }
    }
}

/// Summary of training metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub episodes: usize,
    pub caught: usize,
    pub missed: usize,
    pub success_rate: f64,
    pub rolling_success_rate: f64,
    pub rolling_window: usize,
    pub mean_reward: f64,
    pub total_decisions: usize,
    pub avg_decisions_per_episode: f64,
}

impl Default for MetricsObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for MetricsObserver {
    fn on_decision(&mut self, _tick: u64, _decision: &Decision) -> Result<()> {
        self.decisions += 1;
        self.current_decisions += 1;
        Ok(())
    }

    fn on_episode_end(&mut self, _episode: usize, resolution: &Resolution) -> Result<()> {
        match resolution.result {
            CatchResult::Caught => self.caught += 1,
            CatchResult::Missed => self.missed += 1,
        }
        self.total_reward += resolution.reward;

        self.recent.push_back(resolution.result);
        if self.recent.len() > self.window {
            self.recent.pop_front();
        }

        self.decisions_per_episode.push(self.current_decisions);
        self.current_decisions = 0;
        Ok(())
    }

    fn on_target_lost(&mut self, _tick: u64, _target: ObjectId) -> Result<()> {
        self.current_decisions = 0;
        Ok(())
    }
}

/// JSONL observer - Exports observations to JSON Lines format
pub struct JsonlObserver {
    writer: BufWriter<File>,
    current_steps: Vec<StepObservation>,
}

impl JsonlObserver {
    /// Create a new JSONL observer
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        Ok(Self {
            writer,
            current_steps: Vec::new(),
        })
    }
}

impl Observer for JsonlObserver {
    fn on_decision(&mut self, tick: u64, decision: &Decision) -> Result<()> {
        self.current_steps.push(StepObservation {
            tick,
            state: decision.state.to_string(),
            action: decision.action,
            explored: decision.explored,
            receptacle_x: decision.receptacle_x,
            target_y: decision.target.y,
        });
        Ok(())
    }

    fn on_episode_end(&mut self, episode: usize, resolution: &Resolution) -> Result<()> {
        let steps = std::mem::take(&mut self.current_steps);
        let observation = Observation {
            episode,
            result: resolution.result,
            reward: resolution.reward,
            next_state: resolution.next_state.to_string(),
            updated_value: resolution.updated_value,
            exploration_rate: resolution.exploration_rate,
            total_decisions: steps.len(),
            steps,
        };

        // Write as JSONL (one JSON object per line)
        serde_json::to_writer(&mut self.writer, &observation)?;
        writeln!(&mut self.writer)?;
        self.writer.flush()?;

        Ok(())
    }

    fn on_target_lost(&mut self, _tick: u64, _target: ObjectId) -> Result<()> {
        self.current_steps.clear();
        Ok(())
    }

    fn on_report(&mut self, _snapshot: &TrainingSnapshot) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Observer shared between the training loop and its caller, so results can
/// be read back after the loop has consumed the boxed observer.
pub struct SharedObserver<O> {
    inner: Arc<Mutex<O>>,
}

impl<O: Observer> SharedObserver<O> {
    pub fn new(observer: O) -> Self {
        Self {
            inner: Arc::new(Mutex::new(observer)),
        }
    }

    /// Lock the wrapped observer
    pub fn lock(&self) -> MutexGuard<'_, O> {
        // A poisoned lock only means an observer call panicked; the counters
        // are still readable.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<O> Clone for SharedObserver<O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<O: Observer> Observer for SharedObserver<O> {
    fn on_training_start(&mut self, target_episodes: usize) -> Result<()> {
        self.lock().on_training_start(target_episodes)
    }

    fn on_decision(&mut self, tick: u64, decision: &Decision) -> Result<()> {
        self.lock().on_decision(tick, decision)
    }

    fn on_episode_end(&mut self, episode: usize, resolution: &Resolution) -> Result<()> {
        self.lock().on_episode_end(episode, resolution)
    }

    fn on_target_lost(&mut self, tick: u64, target: ObjectId) -> Result<()> {
        self.lock().on_target_lost(tick, target)
    }

    fn on_report(&mut self, snapshot: &TrainingSnapshot) -> Result<()> {
        self.lock().on_report(snapshot)
    }

    fn on_training_end(&mut self, result: &TrainingResult) -> Result<()> {
        self.lock().on_training_end(result)
    }
}
