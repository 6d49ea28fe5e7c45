//! Newtype wrappers and small value types shared across the crate.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Number of discrete actions; also the width of every Q-table row.
pub const ACTION_COUNT: usize = 3;

/// Action-values for one state, indexed by [`Action::index`].
pub type ActionValues = [f64; ACTION_COUNT];

/// Literal used for the state in which no object is tracked.
pub const NONE_STATE: &str = "none";

/// A discrete lateral move of the receptacle.
///
/// The declaration order is the Q-table column order and must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    MoveLeft,
    Stay,
    MoveRight,
}

impl Action {
    /// All actions in column order.
    pub const ALL: [Action; ACTION_COUNT] = [Action::MoveLeft, Action::Stay, Action::MoveRight];

    /// Column index of this action in a Q-table row.
    pub const fn index(self) -> usize {
        match self {
            Action::MoveLeft => 0,
            Action::Stay => 1,
            Action::MoveRight => 2,
        }
    }

    /// Look up an action by column index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidActionIndex`] if `index >= ACTION_COUNT`.
    pub fn from_index(index: usize) -> Result<Self, Error> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(Error::InvalidActionIndex {
                index,
                action_count: ACTION_COUNT,
            })
    }

    /// Horizontal displacement for a move of magnitude `step`.
    pub fn displacement(self, step: f64) -> f64 {
        match self {
            Action::MoveLeft => -step,
            Action::Stay => 0.0,
            Action::MoveRight => step,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::MoveLeft => "move_left",
            Action::Stay => "stay",
            Action::MoveRight => "move_right",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A validated discrete state key.
///
/// Keys are either `"<receptacle_bucket>,<target_bucket>"` or the literal
/// `"none"`. They are used verbatim as keys of the persisted table, so
/// deserialization re-validates the format.
///
/// # Examples
///
/// ```
/// use catcher::types::StateKey;
///
/// let key = StateKey::from_buckets(-2, 5);
/// assert_eq!(key.as_str(), "-2,5");
/// assert_eq!(StateKey::parse("-2,5").unwrap(), key);
/// assert!(StateKey::parse("left").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StateKey(String);

impl StateKey {
    /// The sentinel state used when no object is tracked.
    pub fn none() -> Self {
        StateKey(NONE_STATE.to_string())
    }

    /// Build a key from already-discretized coordinates.
    pub fn from_buckets(receptacle: i64, target: i64) -> Self {
        StateKey(format!("{receptacle},{target}"))
    }

    /// Parse and validate a state key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidStateKey`] if `s` is neither `none` nor a pair
    /// of comma-separated integers.
    pub fn parse(s: &str) -> Result<Self, Error> {
        if s == NONE_STATE {
            return Ok(Self::none());
        }
        // Canonical encoder output only: no "+1,2", "01,2" or "-0,3"
        match parse_buckets(s) {
            Some((receptacle, target))
                if StateKey::from_buckets(receptacle, target).as_str() == s =>
            {
                Ok(StateKey(s.to_string()))
            }
            _ => Err(Error::InvalidStateKey { key: s.to_string() }),
        }
    }

    /// Whether this is the `none` sentinel.
    pub fn is_none(&self) -> bool {
        self.0 == NONE_STATE
    }

    /// The `(receptacle, target)` buckets, or `None` for the sentinel.
    pub fn buckets(&self) -> Option<(i64, i64)> {
        parse_buckets(&self.0)
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert into the underlying String.
    pub fn into_string(self) -> String {
        self.0
    }
}

fn parse_buckets(s: &str) -> Option<(i64, i64)> {
    let (left, right) = s.split_once(',')?;
    Some((left.parse().ok()?, right.parse().ok()?))
}

impl TryFrom<String> for StateKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StateKey> for String {
    fn from(key: StateKey) -> Self {
        key.0
    }
}

impl AsRef<str> for StateKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier the environment assigns to each falling object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Position of a falling object as reported by the environment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallingObject {
    pub id: ObjectId,
    pub x: f64,
    pub y: f64,
}

impl FallingObject {
    /// Whether the object has dropped below the terminal line.
    pub fn is_terminal(&self, terminal_y: f64) -> bool {
        self.y < terminal_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_index_roundtrip() {
        for action in Action::ALL {
            assert_eq!(Action::from_index(action.index()).unwrap(), action);
        }
    }

    #[test]
    fn test_action_index_out_of_range() {
        let err = Action::from_index(3).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidActionIndex {
                index: 3,
                action_count: 3
            }
        ));
    }

    #[test]
    fn test_action_displacement() {
        assert_eq!(Action::MoveLeft.displacement(0.5), -0.5);
        assert_eq!(Action::Stay.displacement(0.5), 0.0);
        assert_eq!(Action::MoveRight.displacement(0.5), 0.5);
    }

    #[test]
    fn test_state_key_parse() {
        assert!(StateKey::parse("none").unwrap().is_none());
        assert_eq!(StateKey::parse("3,-4").unwrap().buckets(), Some((3, -4)));
        assert!(StateKey::parse("3").is_err());
        assert!(StateKey::parse("3,x").is_err());
        assert!(StateKey::parse("1.5,2").is_err());
        assert!(StateKey::parse("").is_err());
    }

    #[test]
    fn test_state_key_parse_rejects_non_canonical_forms() {
        for key in ["+1,2", "01,2", "-0,3", "1, 2", " 1,2", "1,+2"] {
            assert!(StateKey::parse(key).is_err(), "{key} should be rejected");
        }
        assert_eq!(StateKey::parse("-1,0").unwrap(), StateKey::from_buckets(-1, 0));
    }

    #[test]
    fn test_state_key_json_validates() {
        let key: StateKey = serde_json::from_str("\"0,7\"").unwrap();
        assert_eq!(key, StateKey::from_buckets(0, 7));
        assert!(serde_json::from_str::<StateKey>("\"bogus\"").is_err());
    }

    #[test]
    fn test_terminal_threshold() {
        let object = FallingObject {
            id: ObjectId(1),
            x: 0.0,
            y: -5.0,
        };
        assert!(!object.is_terminal(-5.0));
        assert!(FallingObject { y: -5.01, ..object }.is_terminal(-5.0));
    }
}
