//! Identity types shared by every layer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sub-protocol a host client must negotiate on `/host`.
pub const HOST_SUBPROTOCOL: &str = "kahoot";

/// Sub-protocol a player client must negotiate on `/player`.
pub const PLAYER_SUBPROTOCOL: &str = "kahoot-player";

/// A player's identifier: an opaque string chosen by the client.
///
/// Only uniqueness within one room is enforced. `Ord` gives leaderboards
/// a deterministic tie-break.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Wraps a client-supplied identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The short, human-typeable code players enter to join a room.
///
/// Codes are normalized on construction (whitespace stripped, ASCII
/// upper-cased) so `" ab 12cd "` and `"AB12CD"` name the same room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Normalizes and wraps a room code.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(
            raw.as_ref()
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(|c| c.to_ascii_uppercase())
                .collect(),
        )
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if nothing was left after normalization.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub id: PlayerId,
    pub points: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&PlayerId::new("alice")).unwrap();
        assert_eq!(json, "\"alice\"");
    }

    #[test]
    fn test_player_id_orders_lexically() {
        assert!(PlayerId::new("amy") < PlayerId::new("bob"));
    }

    #[test]
    fn test_room_code_normalizes() {
        assert_eq!(RoomCode::new(" ab 12cd "), RoomCode::new("AB12CD"));
        assert_eq!(RoomCode::new("ab12cd").as_str(), "AB12CD");
    }

    #[test]
    fn test_room_code_blank_is_empty() {
        assert!(RoomCode::new("  \t").is_empty());
    }

    #[test]
    fn test_player_score_json_shape() {
        let score = PlayerScore {
            id: PlayerId::new("p1"),
            points: 950,
        };
        let json: serde_json::Value = serde_json::to_value(&score).unwrap();
        assert_eq!(json["id"], "p1");
        assert_eq!(json["points"], 950);
    }
}
