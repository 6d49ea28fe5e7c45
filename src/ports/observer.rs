//! Observer port - abstraction for training observation and data collection
//!
//! This port defines the interface for observing training events,
//! allowing composable data collection without coupling the training
//! loop to specific output formats or metrics.

use crate::{
    Result,
    pipeline::{TrainingResult, TrainingSnapshot},
    q_learning::{Decision, Resolution},
    types::ObjectId,
};

/// Observer trait for monitoring training
///
/// # Event Sequence
///
/// 1. `on_training_start(target_episodes)` - once, from `TrainingLoop::run`
/// 2. Per tick:
///    - `on_decision(...)` - for each decision the agent issues
///    - `on_episode_end(...)` - when a tracked object is resolved
///    - `on_target_lost(...)` - when a tracked object vanishes unresolved
///    - `on_report(...)` - at the periodic report cadence
/// 3. `on_training_end(result)` - once, from `TrainingLoop::run`
///
/// # Examples
///
/// ```no_run
/// use catcher::{ports::Observer, q_learning::Resolution};
///
/// struct CatchCounter {
///     caught: usize,
/// }
///
/// impl Observer for CatchCounter {
///     fn on_episode_end(
///         &mut self,
///         _episode: usize,
///         resolution: &Resolution,
///     ) -> catcher::Result<()> {
///         if resolution.reward > 0.0 {
///             self.caught += 1;
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Observer: Send {
    /// Called when a training run starts.
    fn on_training_start(&mut self, _target_episodes: usize) -> Result<()> {
        Ok(())
    }

    /// Called after every decision tick, including the one that resolves an
    /// episode.
    fn on_decision(&mut self, _tick: u64, _decision: &Decision) -> Result<()> {
        Ok(())
    }

    /// Called when an episode ends.
    ///
    /// * `episode` - Index of the episode (0-based)
    fn on_episode_end(&mut self, _episode: usize, _resolution: &Resolution) -> Result<()> {
        Ok(())
    }

    /// Called when the tracked object disappears without resolving. Decisions
    /// made for it belong to no episode.
    fn on_target_lost(&mut self, _tick: u64, _target: ObjectId) -> Result<()> {
        Ok(())
    }

    /// Called at the periodic report cadence.
    fn on_report(&mut self, _snapshot: &TrainingSnapshot) -> Result<()> {
        Ok(())
    }

    /// Called when a training run completes.
    fn on_training_end(&mut self, _result: &TrainingResult) -> Result<()> {
        Ok(())
    }
}
