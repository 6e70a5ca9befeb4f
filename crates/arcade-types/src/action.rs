//! The closed set of button actions a player can vote for.

use crate::error::{Result, TypesError};
use serde::{Deserialize, Serialize};

/// One of the eight console buttons, wire-encoded as `0..7`.
///
/// Canonical enum order (used as the tie-break fallback in
/// [`crate::window::break_tie`] when no prior block hash is available).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// D-pad up.
    Up,
    /// D-pad down.
    Down,
    /// D-pad left.
    Left,
    /// D-pad right.
    Right,
    /// The A button.
    A,
    /// The B button.
    B,
    /// Start.
    Start,
    /// Select.
    Select,
}

/// All actions in canonical enum order.
pub const ALL_ACTIONS: [Action; 8] = [
    Action::Up,
    Action::Down,
    Action::Left,
    Action::Right,
    Action::A,
    Action::B,
    Action::Start,
    Action::Select,
];

impl Action {
    /// Decode a wire action code (`0..7`).
    pub fn from_code(code: u8) -> Result<Self> {
        ALL_ACTIONS
            .get(code as usize)
            .copied()
            .ok_or(TypesError::InvalidAction(code))
    }

    /// Encode to the wire action code.
    pub fn to_code(self) -> u8 {
        ALL_ACTIONS
            .iter()
            .position(|a| *a == self)
            .expect("Action is always one of ALL_ACTIONS") as u8
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Action::Up => "UP",
            Action::Down => "DOWN",
            Action::Left => "LEFT",
            Action::Right => "RIGHT",
            Action::A => "A",
            Action::B => "B",
            Action::Start => "START",
            Action::Select => "SELECT",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_code() {
        for code in 0..8u8 {
            let action = Action::from_code(code).unwrap();
            assert_eq!(action.to_code(), code);
        }
    }

    #[test]
    fn rejects_out_of_range_codes() {
        assert!(matches!(
            Action::from_code(8),
            Err(TypesError::InvalidAction(8))
        ));
        assert!(Action::from_code(255).is_err());
    }

    #[test]
    fn canonical_order_matches_spec() {
        assert_eq!(Action::Up.to_code(), 0);
        assert_eq!(Action::Select.to_code(), 7);
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&Action::A).unwrap();
        assert_eq!(json, "\"a\"");
    }
}
