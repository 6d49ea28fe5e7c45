//! Common test utilities for the catcher test suite.
//!
//! This module provides a scripted environment double whose objects fall a
//! fixed distance per tick, plus configuration helpers.

#![allow(dead_code)]

use std::collections::VecDeque;

use catcher::{
    config::CatcherConfig,
    ports::Environment,
    q_learning::QTable,
    types::{Action, FallingObject, ObjectId, StateKey},
};

/// Environment double with deterministic motion.
///
/// Objects fall `fall_per_tick` on every `advance` call regardless of `dt`,
/// and never despawn on their own. `spawn_object` pops the next queued
/// position, or does nothing when the queue is empty.
#[derive(Debug, Clone, Default)]
pub struct ScriptedField {
    pub receptacle_x: f64,
    pub objects: Vec<FallingObject>,
    pub fall_per_tick: f64,
    pub spawn_queue: VecDeque<(f64, f64)>,
    pub removed: Vec<ObjectId>,
    next_id: u64,
}

impl ScriptedField {
    pub fn new(fall_per_tick: f64) -> Self {
        Self {
            fall_per_tick,
            ..Self::default()
        }
    }

    /// Place an object immediately.
    pub fn with_object(mut self, x: f64, y: f64) -> Self {
        self.place(x, y);
        self
    }

    /// Queue an object for the next `spawn_object` call.
    pub fn with_queued(mut self, x: f64, y: f64) -> Self {
        self.spawn_queue.push_back((x, y));
        self
    }

    pub fn place(&mut self, x: f64, y: f64) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.objects.push(FallingObject { id, x, y });
        id
    }
}

impl Environment for ScriptedField {
    fn receptacle_x(&self) -> f64 {
        self.receptacle_x
    }

    fn nearest_object(&self) -> Option<FallingObject> {
        self.objects.iter().copied().min_by(|a, b| {
            (a.x - self.receptacle_x)
                .abs()
                .total_cmp(&(b.x - self.receptacle_x).abs())
        })
    }

    fn object(&self, id: ObjectId) -> Option<FallingObject> {
        self.objects.iter().find(|o| o.id == id).copied()
    }

    fn apply_displacement(&mut self, dx: f64) {
        self.receptacle_x += dx;
    }

    fn place_receptacle(&mut self, x: f64) {
        self.receptacle_x = x;
    }

    fn remove_object(&mut self, id: ObjectId) {
        self.objects.retain(|o| o.id != id);
        self.removed.push(id);
    }

    fn spawn_object(&mut self) {
        if let Some((x, y)) = self.spawn_queue.pop_front() {
            self.place(x, y);
        }
    }

    fn advance(&mut self, _dt: f64) {
        for object in &mut self.objects {
            object.y -= self.fall_per_tick;
        }
    }
}

/// Greedy, one-decision-per-tick configuration: exploration 0, time scale 1,
/// decision interval and frame both 0.1 s, spawning effectively disabled
/// after the first tick, reports off.
pub fn greedy_config() -> CatcherConfig {
    let mut config = CatcherConfig::default();
    config.hyperparameters = config
        .hyperparameters
        .with_exploration_rate(0.0)
        .with_exploration_min(0.0);
    config.schedule.time_scale = 1.0;
    config.schedule.decision_interval = 0.1;
    config.schedule.frame_dt = 0.1;
    config.schedule.spawn_interval = 1.0e9;
    config.schedule.report_every_ticks = 0;
    config
}

/// Table that walks a receptacle from 0 to 3 when the target sits at x = 3.
pub fn seeded_walk_right_table() -> QTable {
    let mut table = QTable::new();
    for receptacle in 0..3 {
        table.set(
            &StateKey::from_buckets(receptacle, 3),
            Action::MoveRight,
            1.0,
        );
    }
    table.set(&StateKey::from_buckets(3, 3), Action::Stay, 0.5);
    table
}
