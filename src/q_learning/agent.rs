//! Q-learning policy agent
//!
//! The agent owns the Q-table, the exploration schedule and the learning
//! hyperparameters. It follows one falling object at a time:
//!
//! ```text
//! Idle --track()--> Tracking --step() x N--> (terminal) --> Idle
//! ```
//!
//! Every [`PolicyAgent::step`] encodes the situation, picks an ε-greedy
//! action, moves the receptacle and clamps it to the world bounds. When the
//! tracked object has crossed the terminal line the same step resolves the
//! episode: reward, one TD update for the action just taken, exploration
//! decay.

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    Result,
    config::{CatcherConfig, Hyperparameters, RewardPolicy, WorldConfig},
    ports::Environment,
    q_learning::{encoder::StateEncoder, q_table::QTable},
    types::{ACTION_COUNT, Action, FallingObject, ObjectId, StateKey},
};

fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// Multiplicatively decaying exploration rate with a floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExplorationSchedule {
    rate: f64,
    decay: f64,
    min: f64,
}

impl ExplorationSchedule {
    pub fn new(rate: f64, decay: f64, min: f64) -> Self {
        Self {
            rate: rate.max(min),
            decay,
            min,
        }
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn floor(&self) -> f64 {
        self.min
    }

    /// Apply one episode of decay and return the new rate.
    pub fn decay(&mut self) -> f64 {
        self.rate = (self.rate * self.decay).max(self.min);
        self.rate
    }
}

impl From<&Hyperparameters> for ExplorationSchedule {
    fn from(h: &Hyperparameters) -> Self {
        Self::new(h.exploration_rate, h.exploration_decay, h.exploration_min)
    }
}

/// Where the agent is in its tracking cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentPhase {
    /// No object tracked
    Idle,
    /// Following one object until it reaches the terminal line
    Tracking { target: ObjectId },
}

/// Whether the receptacle was under the object when it crossed the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatchResult {
    Caught,
    Missed,
}

impl RewardPolicy {
    /// Judge an object crossing the terminal line.
    pub fn judge(&self, receptacle_x: f64, object_x: f64) -> (CatchResult, f64) {
        if (receptacle_x - object_x).abs() < self.catch_radius {
            (CatchResult::Caught, self.catch_reward)
        } else {
            (CatchResult::Missed, -self.miss_penalty)
        }
    }
}

/// One decision tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub target: FallingObject,
    pub state: StateKey,
    pub action: Action,
    /// Whether the action came from the exploration branch
    pub explored: bool,
    /// Receptacle position after the move and clamp
    pub receptacle_x: f64,
}

/// The end of an episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// The decision taken on the resolving tick
    pub decision: Decision,
    pub result: CatchResult,
    pub reward: f64,
    pub next_state: StateKey,
    /// Q-value of `(decision.state, decision.action)` after the update
    /// (`None` for a frozen agent)
    pub updated_value: Option<f64>,
    /// Exploration rate after decay
    pub exploration_rate: f64,
}

/// What a call to [`PolicyAgent::step`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Nothing is tracked
    Idle,
    /// The tracked object vanished before reaching the terminal line
    Lost { target: ObjectId },
    /// A move was issued and the episode continues
    Decided(Decision),
    /// A move was issued and the episode ended
    Resolved(Resolution),
}

/// Tabular Q-learning agent (off-policy TD control)
#[derive(Debug, Clone)]
pub struct PolicyAgent {
    q_table: QTable,
    encoder: StateEncoder,
    hyperparameters: Hyperparameters,
    exploration: ExplorationSchedule,
    reward: RewardPolicy,
    world: WorldConfig,
    phase: AgentPhase,
    learning: bool,
    rng: StdRng,
    rng_seed: Option<u64>,
}

impl PolicyAgent {
    /// Create an agent with an empty Q-table.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidHyperparameter`] or
    /// [`crate::Error::InvalidConfiguration`] if any value is out of range.
    pub fn new(config: &CatcherConfig) -> Result<Self> {
        config.hyperparameters.validate()?;
        config.reward.validate()?;
        config.world.validate()?;

        Ok(Self {
            q_table: QTable::new(),
            encoder: StateEncoder::new(),
            hyperparameters: config.hyperparameters,
            exploration: ExplorationSchedule::from(&config.hyperparameters),
            reward: config.reward,
            world: config.world,
            phase: AgentPhase::Idle,
            learning: true,
            rng: build_rng(None),
            rng_seed: None,
        })
    }

    /// Start from a previously learned table.
    pub fn with_q_table(mut self, q_table: QTable) -> Self {
        self.q_table = q_table;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.set_rng_seed(seed);
        self
    }

    /// Disable learning: no updates and no exploration decay.
    pub fn frozen(mut self) -> Self {
        self.learning = false;
        self
    }

    pub fn set_rng_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
        self.rng_seed = Some(seed);
    }

    pub fn rng_seed(&self) -> Option<u64> {
        self.rng_seed
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    pub fn q_table_mut(&mut self) -> &mut QTable {
        &mut self.q_table
    }

    pub fn into_q_table(self) -> QTable {
        self.q_table
    }

    pub fn q_table_size(&self) -> usize {
        self.q_table.len()
    }

    pub fn exploration_rate(&self) -> f64 {
        self.exploration.rate()
    }

    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.hyperparameters
    }

    pub fn phase(&self) -> AgentPhase {
        self.phase
    }

    pub fn is_learning(&self) -> bool {
        self.learning
    }

    /// Encode a situation with the agent's encoder.
    pub fn encode(&self, receptacle_x: f64, target_x: Option<f64>) -> StateKey {
        self.encoder.encode(receptacle_x, target_x)
    }

    /// ε-greedy action selection. Unseen states get a zero row.
    pub fn choose_action(&mut self, state: &StateKey) -> Action {
        self.select_action_epsilon_greedy(state).0
    }

    fn select_action_epsilon_greedy(&mut self, state: &StateKey) -> (Action, bool) {
        self.q_table.get_or_create(state);
        if self.rng.random::<f64>() < self.exploration.rate() {
            (Action::ALL[self.rng.random_range(0..ACTION_COUNT)], true)
        } else {
            (self.q_table.best_action(state).0, false)
        }
    }

    /// Begin tracking `object` if the agent is idle.
    ///
    /// Returns `true` if the agent switched to tracking.
    pub fn track(&mut self, object: &FallingObject) -> bool {
        match self.phase {
            AgentPhase::Idle => {
                trace!(target_id = %object.id, x = object.x, "tracking new object");
                self.phase = AgentPhase::Tracking { target: object.id };
                true
            }
            AgentPhase::Tracking { .. } => false,
        }
    }

    /// Stop tracking without learning anything.
    pub fn release(&mut self) {
        self.phase = AgentPhase::Idle;
    }

    /// Run one decision tick against `env`.
    pub fn step(&mut self, env: &mut dyn Environment) -> StepOutcome {
        let AgentPhase::Tracking { target } = self.phase else {
            return StepOutcome::Idle;
        };
        let Some(object) = env.object(target) else {
            self.release();
            return StepOutcome::Lost { target };
        };

        let state = self.encoder.encode(env.receptacle_x(), Some(object.x));
        let (action, explored) = self.select_action_epsilon_greedy(&state);

        env.apply_displacement(action.displacement(self.world.action_step));
        let receptacle_x = self.world.clamp_x(env.receptacle_x());
        env.place_receptacle(receptacle_x);

        trace!(%state, %action, explored, receptacle_x, "decision");

        let decision = Decision {
            target: object,
            state,
            action,
            explored,
            receptacle_x,
        };

        if object.is_terminal(self.world.terminal_y) {
            let resolution = self.resolve(decision, env);
            StepOutcome::Resolved(resolution)
        } else {
            StepOutcome::Decided(decision)
        }
    }

    fn resolve(&mut self, decision: Decision, env: &mut dyn Environment) -> Resolution {
        let object = decision.target;
        let (result, reward) = self.reward.judge(decision.receptacle_x, object.x);
        let next_state = self.encoder.encode(decision.receptacle_x, Some(object.x));

        let updated_value = if self.learning {
            let value = self.learn(&decision.state, decision.action, reward, &next_state);
            self.exploration.decay();
            Some(value)
        } else {
            None
        };

        env.remove_object(object.id);
        self.phase = AgentPhase::Idle;

        debug!(
            target_id = %object.id,
            ?result,
            reward,
            state = %decision.state,
            action = %decision.action,
            exploration_rate = self.exploration.rate(),
            "episode resolved"
        );

        Resolution {
            decision,
            result,
            reward,
            next_state,
            updated_value,
            exploration_rate: self.exploration.rate(),
        }
    }

    /// Q-learning update
    ///
    /// Q(s,a) ← (1 - α)·Q(s,a) + α·[r + γ·max_a' Q(s',a')]
    ///
    /// Returns the new Q(s,a).
    pub fn learn(
        &mut self,
        state: &StateKey,
        action: Action,
        reward: f64,
        next_state: &StateKey,
    ) -> f64 {
        let target =
            reward + self.hyperparameters.discount_factor * self.q_table.max_value(next_state);
        self.q_table
            .update(state, action, target, self.hyperparameters.learning_rate)
    }

    /// Apply one episode of exploration decay.
    pub fn decay_exploration(&mut self) -> f64 {
        self.exploration.decay()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Lane {
        receptacle_x: f64,
        object: Option<FallingObject>,
    }

    impl Environment for Lane {
        fn receptacle_x(&self) -> f64 {
            self.receptacle_x
        }
        fn nearest_object(&self) -> Option<FallingObject> {
            self.object
        }
        fn object(&self, id: ObjectId) -> Option<FallingObject> {
            self.object.filter(|o| o.id == id)
        }
        fn apply_displacement(&mut self, dx: f64) {
            self.receptacle_x += dx;
        }
        fn place_receptacle(&mut self, x: f64) {
            self.receptacle_x = x;
        }
        fn remove_object(&mut self, id: ObjectId) {
            self.object = self.object.filter(|o| o.id != id);
        }
        fn spawn_object(&mut self) {}
        fn advance(&mut self, _dt: f64) {}
    }

    fn greedy_config() -> CatcherConfig {
        let mut config = CatcherConfig::default();
        config.hyperparameters = config
            .hyperparameters
            .with_exploration_rate(0.0)
            .with_exploration_min(0.0);
        config
    }

    fn object(x: f64, y: f64) -> FallingObject {
        FallingObject {
            id: ObjectId(1),
            x,
            y,
        }
    }

    #[test]
    fn test_invalid_hyperparameters_rejected() {
        let mut config = CatcherConfig::default();
        config.hyperparameters.discount_factor = 1.2;
        assert!(matches!(
            PolicyAgent::new(&config),
            Err(crate::Error::InvalidHyperparameter { .. })
        ));
    }

    #[test]
    fn test_choose_action_initializes_state() {
        let mut agent = PolicyAgent::new(&CatcherConfig::default())
            .unwrap()
            .with_seed(1);
        let state = StateKey::from_buckets(9, -9);
        let _ = agent.choose_action(&state);
        assert!(agent.q_table().get(&state).is_some());
    }

    #[test]
    fn test_greedy_choice_follows_best_action() {
        let mut agent = PolicyAgent::new(&greedy_config()).unwrap().with_seed(3);
        let state = StateKey::from_buckets(0, 2);
        agent.q_table_mut().set(&state, Action::MoveRight, 0.4);
        for _ in 0..50 {
            assert_eq!(agent.choose_action(&state), Action::MoveRight);
        }
    }

    #[test]
    fn test_full_exploration_covers_all_actions() {
        let mut config = CatcherConfig::default();
        config.hyperparameters.exploration_rate = 1.0;
        let mut agent = PolicyAgent::new(&config).unwrap().with_seed(5);
        let state = StateKey::none();
        let mut seen = [false; ACTION_COUNT];
        for _ in 0..200 {
            seen[agent.choose_action(&state).index()] = true;
        }
        assert_eq!(seen, [true; ACTION_COUNT]);
    }

    #[test]
    fn test_exploration_decays_to_floor() {
        let mut schedule = ExplorationSchedule::new(0.3, 0.5, 0.05);
        let mut previous = schedule.rate();
        for _ in 0..20 {
            let rate = schedule.decay();
            assert!(rate <= previous);
            assert!(rate >= 0.05);
            previous = rate;
        }
        assert_eq!(schedule.rate(), 0.05);
    }

    #[test]
    fn test_learn_bootstraps_from_next_state() {
        let mut agent = PolicyAgent::new(&CatcherConfig::default()).unwrap();
        let state = StateKey::from_buckets(0, 0);
        let next = StateKey::from_buckets(1, 0);
        agent.q_table_mut().set(&next, Action::Stay, 2.0);

        // 0.9 * 0 + 0.1 * (20 + 0.95 * 2.0) = 2.19
        let value = agent.learn(&state, Action::MoveRight, 20.0, &next);
        assert!((value - 2.19).abs() < 1e-12);
    }

    #[test]
    fn test_step_idle_does_nothing() {
        let mut agent = PolicyAgent::new(&greedy_config()).unwrap();
        let mut lane = Lane {
            receptacle_x: 0.0,
            object: None,
        };
        assert_eq!(agent.step(&mut lane), StepOutcome::Idle);
        assert!(agent.q_table().is_empty());
    }

    #[test]
    fn test_step_clamps_receptacle() {
        let mut agent = PolicyAgent::new(&greedy_config()).unwrap();
        let mut lane = Lane {
            receptacle_x: 7.4,
            object: Some(object(7.0, 4.0)),
        };
        let state = agent.encode(7.4, Some(7.0));
        agent.q_table_mut().set(&state, Action::MoveRight, 1.0);
        agent.track(&object(7.0, 4.0));

        match agent.step(&mut lane) {
            StepOutcome::Decided(decision) => assert_eq!(decision.receptacle_x, 7.5),
            other => panic!("expected a decision, got {other:?}"),
        }
        assert_eq!(lane.receptacle_x, 7.5);
    }

    #[test]
    fn test_terminal_step_resolves_miss() {
        let mut agent = PolicyAgent::new(&greedy_config()).unwrap();
        let mut lane = Lane {
            receptacle_x: -4.0,
            object: Some(object(4.0, -5.5)),
        };
        agent.track(&object(4.0, -5.5));

        let StepOutcome::Resolved(resolution) = agent.step(&mut lane) else {
            panic!("expected resolution");
        };
        assert_eq!(resolution.result, CatchResult::Missed);
        assert_eq!(resolution.reward, -10.0);
        // Ties on an unseen row pick move_left: 0.9 * 0 + 0.1 * (-10 + 0.95 * 0) = -1
        assert_eq!(resolution.decision.action, Action::MoveLeft);
        assert!((resolution.updated_value.unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(agent.phase(), AgentPhase::Idle);
        assert!(lane.object.is_none());
    }

    #[test]
    fn test_lost_target_returns_to_idle() {
        let mut agent = PolicyAgent::new(&greedy_config()).unwrap();
        let mut lane = Lane {
            receptacle_x: 0.0,
            object: None,
        };
        agent.track(&object(1.0, 2.0));
        assert_eq!(
            agent.step(&mut lane),
            StepOutcome::Lost {
                target: ObjectId(1)
            }
        );
        assert_eq!(agent.phase(), AgentPhase::Idle);
    }

    #[test]
    fn test_frozen_agent_does_not_learn() {
        let mut config = CatcherConfig::default();
        config.hyperparameters.exploration_rate = 0.5;
        let mut agent = PolicyAgent::new(&config).unwrap().with_seed(9).frozen();
        let mut lane = Lane {
            receptacle_x: 0.0,
            object: Some(object(0.0, -6.0)),
        };
        agent.track(&object(0.0, -6.0));

        let StepOutcome::Resolved(resolution) = agent.step(&mut lane) else {
            panic!("expected resolution");
        };
        assert_eq!(resolution.updated_value, None);
        assert_eq!(agent.exploration_rate(), 0.5);
        assert!(agent.q_table().iter().all(|(_, values)| *values == [0.0; 3]));
    }
}
