//! Self-teaching catcher: a tabular Q-learning agent that moves a receptacle
//! left or right to catch falling objects.
//!
//! This crate provides:
//! - A Q-learning core (state encoder, lazily grown Q-table, ε-greedy agent)
//! - Ports for the environment, table persistence and training observation
//! - A built-in falling-object simulation and JSON/MessagePack repositories
//! - A tick-driven training loop with progress reporting
//! - CLI commands for training, evaluation, inspection and export

pub mod adapters;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod ports;
pub mod q_learning;
pub mod simulation;
pub mod telemetry;
pub mod types;

pub use error::{Error, Result};
