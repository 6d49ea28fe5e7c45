//! CLI infrastructure for the catcher toolkit
//!
//! This module provides the command-line interface for training, evaluating,
//! inspecting and exporting Q-tables.

pub mod commands;
pub mod output;
