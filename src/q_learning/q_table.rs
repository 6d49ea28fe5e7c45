//! Q-table implementation for tabular Q-learning

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    types::{ACTION_COUNT, Action, ActionValues, StateKey},
};

/// Q-table mapping each discrete state to one value per action.
///
/// Rows are created on first access and never removed, so the table grows
/// with the number of distinct states visited. Keys are kept ordered so the
/// persisted form is stable between saves.
///
/// The serialized form is the persisted record: a single `q_table` field
/// holding the state → values mapping (`qTable` is accepted on load).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QTable {
    #[serde(alias = "qTable")]
    q_table: BTreeMap<StateKey, ActionValues>,
}

impl QTable {
    /// Create an empty Q-table
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the row for `state`, inserting a zero row if it is unseen.
    pub fn get_or_create(&mut self, state: &StateKey) -> &ActionValues {
        self.q_table
            .entry(state.clone())
            .or_insert([0.0; ACTION_COUNT])
    }

    /// Get the row for `state` without creating it.
    pub fn get(&self, state: &StateKey) -> Option<&ActionValues> {
        self.q_table.get(state)
    }

    /// Q-value for a state and a raw action index.
    ///
    /// Unseen states read as zero.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidActionIndex`] if the index is outside
    /// the action set.
    pub fn value(&self, state: &StateKey, action_index: usize) -> Result<f64> {
        let action = Action::from_index(action_index)?;
        Ok(self
            .q_table
            .get(state)
            .map_or(0.0, |values| values[action.index()]))
    }

    /// Set a single Q-value, creating the row if needed.
    pub fn set(&mut self, state: &StateKey, action: Action, value: f64) {
        self.q_table
            .entry(state.clone())
            .or_insert([0.0; ACTION_COUNT])[action.index()] = value;
    }

    /// Highest-valued action for `state`; ties go to the lowest index.
    pub fn best_action(&mut self, state: &StateKey) -> (Action, f64) {
        greedy(self.get_or_create(state))
    }

    /// Value of the best action, used as the bootstrap target.
    pub fn max_value(&mut self, state: &StateKey) -> f64 {
        self.best_action(state).1
    }

    /// Blend `target` into `Q(state, action)`:
    ///
    /// Q(s,a) ← (1 - α)·Q(s,a) + α·target
    ///
    /// Returns the new value.
    pub fn update(
        &mut self,
        state: &StateKey,
        action: Action,
        target: f64,
        learning_rate: f64,
    ) -> f64 {
        let current = self.get_or_create(state)[action.index()];
        let updated = (1.0 - learning_rate) * current + learning_rate * target;
        self.set(state, action, updated);
        updated
    }

    /// Number of states stored
    pub fn len(&self) -> usize {
        self.q_table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q_table.is_empty()
    }

    /// Iterate rows in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &ActionValues)> {
        self.q_table.iter()
    }
}

impl FromIterator<(StateKey, ActionValues)> for QTable {
    fn from_iter<I: IntoIterator<Item = (StateKey, ActionValues)>>(iter: I) -> Self {
        Self {
            q_table: iter.into_iter().collect(),
        }
    }
}

/// First maximum of a row, scanning in action order.
pub fn greedy(values: &ActionValues) -> (Action, f64) {
    let mut best = (Action::ALL[0], values[0]);
    for action in &Action::ALL[1..] {
        let value = values[action.index()];
        if value > best.1 {
            best = (*action, value);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> StateKey {
        StateKey::parse(s).unwrap()
    }

    #[test]
    fn test_qtable_initialization() {
        let mut qtable = QTable::new();
        assert!(qtable.is_empty());
        assert_eq!(qtable.get_or_create(&key("0,3")), &[0.0, 0.0, 0.0]);
        assert_eq!(qtable.len(), 1);
    }

    #[test]
    fn test_qtable_set_get() {
        let mut qtable = QTable::new();
        let state = key("1,-2");
        qtable.set(&state, Action::MoveRight, 1.5);
        assert_eq!(qtable.value(&state, 2).unwrap(), 1.5);
        assert_eq!(qtable.value(&state, 0).unwrap(), 0.0);
    }

    #[test]
    fn test_value_rejects_bad_index() {
        let qtable = QTable::new();
        assert!(matches!(
            qtable.value(&key("none"), 3),
            Err(crate::Error::InvalidActionIndex { index: 3, .. })
        ));
    }

    #[test]
    fn test_best_action_and_max() {
        let mut qtable = QTable::new();
        let state = key("0,0");
        qtable.set(&state, Action::MoveLeft, 0.5);
        qtable.set(&state, Action::Stay, 1.5);
        qtable.set(&state, Action::MoveRight, 0.8);

        assert_eq!(qtable.best_action(&state), (Action::Stay, 1.5));
        assert_eq!(qtable.max_value(&state), 1.5);
    }

    #[test]
    fn test_ties_go_to_lowest_index() {
        let mut qtable = QTable::new();
        assert_eq!(qtable.best_action(&key("4,4")).0, Action::MoveLeft);

        let state = key("2,2");
        qtable.set(&state, Action::Stay, 3.0);
        qtable.set(&state, Action::MoveRight, 3.0);
        assert_eq!(qtable.best_action(&state).0, Action::Stay);
    }

    #[test]
    fn test_best_action_all_negative() {
        let mut qtable = QTable::new();
        let state = key("-1,5");
        qtable.set(&state, Action::MoveLeft, -4.0);
        qtable.set(&state, Action::Stay, -2.0);
        qtable.set(&state, Action::MoveRight, -3.0);
        assert_eq!(qtable.best_action(&state), (Action::Stay, -2.0));
    }

    #[test]
    fn test_update_blends_target() {
        let mut qtable = QTable::new();
        let state = key("0,1");
        qtable.set(&state, Action::MoveRight, 2.0);

        // 0.9 * 2.0 + 0.1 * 12.0 = 3.0
        let updated = qtable.update(&state, Action::MoveRight, 12.0, 0.1);
        assert!((updated - 3.0).abs() < 1e-12);
        assert_eq!(qtable.value(&state, 2).unwrap(), updated);
    }

    #[test]
    fn test_update_converges_to_constant_reward() {
        let mut qtable = QTable::new();
        let state = key("3,3");
        for _ in 0..500 {
            qtable.update(&state, Action::Stay, 20.0, 0.1);
        }
        assert!((qtable.value(&state, 1).unwrap() - 20.0).abs() < 1e-6);
    }

    #[test]
    fn test_json_shape() {
        let mut qtable = QTable::new();
        qtable.set(&key("0,3"), Action::MoveRight, 1.0);
        qtable.get_or_create(&key("none"));

        let json = serde_json::to_value(&qtable).unwrap();
        assert_eq!(json["q_table"]["0,3"], serde_json::json!([0.0, 0.0, 1.0]));
        assert_eq!(json["q_table"]["none"], serde_json::json!([0.0, 0.0, 0.0]));
    }
}
