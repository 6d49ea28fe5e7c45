//! Tabular Q-learning for the catch task
//!
//! This module holds the learning core: positions are discretized into state
//! keys, an ε-greedy agent picks one of three lateral moves, and each
//! resolved episode applies one temporal-difference update to a lazily grown
//! Q-table.
//!
//! ## Update rule
//!
//! ```text
//! Q(s,a) ← (1 - α)·Q(s,a) + α·[r + γ·max_a' Q(s',a')]
//! ```
//!
//! ## Usage Example
//!
//! ```
//! use catcher::{
//!     config::CatcherConfig,
//!     q_learning::{PolicyAgent, StateEncoder},
//!     types::Action,
//! };
//!
//! let mut agent = PolicyAgent::new(&CatcherConfig::default())?.with_seed(7);
//! let state = StateEncoder::new().encode(0.2, Some(3.4));
//! assert_eq!(state.as_str(), "0,3");
//!
//! let action = agent.choose_action(&state);
//! assert!(Action::ALL.contains(&action));
//! # Ok::<(), catcher::Error>(())
//! ```

pub mod agent;
pub mod encoder;
pub mod q_table;
pub mod serialization;

// Public re-exports
pub use agent::{
    AgentPhase, CatchResult, Decision, ExplorationSchedule, PolicyAgent, Resolution, StepOutcome,
};
pub use encoder::StateEncoder;
pub use q_table::QTable;
pub use serialization::TableFormat;
