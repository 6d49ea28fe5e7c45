//! Discretization of continuous positions into Q-table state keys

use crate::types::StateKey;

/// Maps receptacle and target positions to a [`StateKey`].
///
/// Coordinates are bucketed to the nearest integer with ties going to the
/// even neighbour (`0.5 → 0`, `1.5 → 2`, `-2.5 → -2`). The rule is part of
/// the persisted-table contract: changing it would silently re-key every
/// saved state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateEncoder;

impl StateEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Encode the current situation.
    ///
    /// Returns the `none` sentinel when there is no target.
    pub fn encode(&self, receptacle_x: f64, target_x: Option<f64>) -> StateKey {
        match target_x {
            None => StateKey::none(),
            Some(target_x) => {
                StateKey::from_buckets(Self::discretize(receptacle_x), Self::discretize(target_x))
            }
        }
    }

    /// Bucket a coordinate (bucket width 1.0).
    pub fn discretize(x: f64) -> i64 {
        x.round_ties_even() as i64
    }
}
