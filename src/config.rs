//! Configuration for the agent, the simulated world and the training schedule.
//!
//! Every section has defaults matching the reference catcher game. A
//! [`CatcherConfig`] can be read from a JSON file in which each section (and
//! each field) is optional.

use std::{fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Learning hyperparameters. All values must lie in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hyperparameters {
    /// α: step size of the TD update
    pub learning_rate: f64,
    /// γ: weight of the bootstrapped next-state value
    pub discount_factor: f64,
    /// ε at the start of training
    pub exploration_rate: f64,
    /// Multiplicative ε decay applied after each episode
    pub exploration_decay: f64,
    /// Floor for ε
    pub exploration_min: f64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            discount_factor: 0.95,
            exploration_rate: 0.3,
            exploration_decay: 0.99,
            exploration_min: 0.01,
        }
    }
}

impl Hyperparameters {
    pub fn with_learning_rate(mut self, value: f64) -> Self {
        self.learning_rate = value;
        self
    }

    pub fn with_discount_factor(mut self, value: f64) -> Self {
        self.discount_factor = value;
        self
    }

    pub fn with_exploration_rate(mut self, value: f64) -> Self {
        self.exploration_rate = value;
        self
    }

    pub fn with_exploration_decay(mut self, value: f64) -> Self {
        self.exploration_decay = value;
        self
    }

    pub fn with_exploration_min(mut self, value: f64) -> Self {
        self.exploration_min = value;
        self
    }

    /// Check every value is finite and within `[0, 1]`, and that the
    /// exploration floor does not exceed the starting rate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHyperparameter`] naming the first offending value.
    pub fn validate(&self) -> Result<()> {
        let named = [
            ("learning_rate", self.learning_rate),
            ("discount_factor", self.discount_factor),
            ("exploration_rate", self.exploration_rate),
            ("exploration_decay", self.exploration_decay),
            ("exploration_min", self.exploration_min),
        ];
        for (name, value) in named {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidHyperparameter {
                    name: name.to_string(),
                    value,
                    reason: "must be within [0, 1]".to_string(),
                });
            }
        }
        if self.exploration_min > self.exploration_rate {
            return Err(Error::InvalidHyperparameter {
                name: "exploration_min".to_string(),
                value: self.exploration_min,
                reason: format!(
                    "must not exceed exploration_rate ({})",
                    self.exploration_rate
                ),
            });
        }
        Ok(())
    }
}

/// Reward signal issued when a tracked object crosses the terminal line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardPolicy {
    /// Reward for a catch
    pub catch_reward: f64,
    /// Magnitude of the (negative) reward for a miss
    pub miss_penalty: f64,
    /// Maximum horizontal distance (exclusive) that still counts as a catch
    pub catch_radius: f64,
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self {
            catch_reward: 20.0,
            miss_penalty: 10.0,
            catch_radius: 1.5,
        }
    }
}

impl RewardPolicy {
    pub fn validate(&self) -> Result<()> {
        require_finite("reward.catch_reward", self.catch_reward)?;
        require_finite("reward.miss_penalty", self.miss_penalty)?;
        require_positive("reward.catch_radius", self.catch_radius)
    }
}

/// Geometry and motion of the simulated world.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Left limit of the receptacle
    pub x_min: f64,
    /// Right limit of the receptacle
    pub x_max: f64,
    /// Displacement magnitude of a move action
    pub action_step: f64,
    /// An object below this height ends its episode
    pub terminal_y: f64,
    pub spawn_x_min: f64,
    pub spawn_x_max: f64,
    pub spawn_y: f64,
    /// Objects below this height are removed by the simulator
    pub despawn_y: f64,
    /// Fall speed in world units per second
    pub fall_speed: f64,
    pub receptacle_start_x: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            x_min: -7.5,
            x_max: 7.5,
            action_step: 0.5,
            terminal_y: -5.0,
            spawn_x_min: -7.0,
            spawn_x_max: 7.0,
            spawn_y: 6.0,
            despawn_y: -6.0,
            fall_speed: 5.0,
            receptacle_start_x: 0.0,
        }
    }
}

impl WorldConfig {
    /// Clamp a receptacle position to `[x_min, x_max]`.
    pub fn clamp_x(&self, x: f64) -> f64 {
        x.clamp(self.x_min, self.x_max)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("world.x_min", self.x_min),
            ("world.x_max", self.x_max),
            ("world.terminal_y", self.terminal_y),
            ("world.spawn_x_min", self.spawn_x_min),
            ("world.spawn_x_max", self.spawn_x_max),
            ("world.spawn_y", self.spawn_y),
            ("world.despawn_y", self.despawn_y),
            ("world.receptacle_start_x", self.receptacle_start_x),
        ] {
            require_finite(name, value)?;
        }
        require_positive("world.action_step", self.action_step)?;
        require_positive("world.fall_speed", self.fall_speed)?;
        if self.x_min >= self.x_max {
            return invalid(format!(
                "world.x_min ({}) must be below world.x_max ({})",
                self.x_min, self.x_max
            ));
        }
        if self.spawn_x_min > self.spawn_x_max {
            return invalid(format!(
                "world.spawn_x_min ({}) must not exceed world.spawn_x_max ({})",
                self.spawn_x_min, self.spawn_x_max
            ));
        }
        if self.terminal_y >= self.spawn_y {
            return invalid(format!(
                "world.terminal_y ({}) must be below world.spawn_y ({})",
                self.terminal_y, self.spawn_y
            ));
        }
        // Objects must be able to cross the terminal line before despawning
        if self.despawn_y >= self.terminal_y {
            return invalid(format!(
                "world.despawn_y ({}) must be below world.terminal_y ({})",
                self.despawn_y, self.terminal_y
            ));
        }
        Ok(())
    }
}

/// Timing of the training loop, in simulated seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Period between two agent decisions
    pub decision_interval: f64,
    /// Period between two object spawns
    pub spawn_interval: f64,
    /// Multiplier applied to every `dt` handed to the loop
    pub time_scale: f64,
    /// Frame duration used by [`crate::pipeline::TrainingLoop::run`]
    pub frame_dt: f64,
    /// Emit a progress report every this many ticks (0 disables reports)
    pub report_every_ticks: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            decision_interval: 0.1,
            spawn_interval: 2.5,
            time_scale: 2.0,
            frame_dt: 1.0 / 60.0,
            report_every_ticks: 300,
        }
    }
}

impl ScheduleConfig {
    pub fn validate(&self) -> Result<()> {
        require_positive("schedule.decision_interval", self.decision_interval)?;
        require_positive("schedule.spawn_interval", self.spawn_interval)?;
        require_positive("schedule.time_scale", self.time_scale)?;
        require_positive("schedule.frame_dt", self.frame_dt)
    }
}

/// Complete configuration of a training or evaluation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatcherConfig {
    pub hyperparameters: Hyperparameters,
    pub reward: RewardPolicy,
    pub world: WorldConfig,
    pub schedule: ScheduleConfig,
}

impl CatcherConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.hyperparameters.validate()?;
        self.reward.validate()?;
        self.world.validate()?;
        self.schedule.validate()
    }

    /// Load a configuration from a JSON file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open config file {path:?}"),
            source,
        })?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Save the configuration as pretty JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

fn require_finite(name: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        invalid(format!("{name} must be finite (got {value})"))
    }
}

fn require_positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        invalid(format!("{name} must be positive (got {value})"))
    }
}

fn invalid(message: String) -> Result<()> {
    Err(Error::InvalidConfiguration { message })
}
