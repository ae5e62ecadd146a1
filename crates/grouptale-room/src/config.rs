//! Room configuration and tie-break policy.

use std::str::FromStr;
use std::time::Duration;

use grouptale_protocol::{NodeId, PackId};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Configuration shared by every room a coordinator manages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Length of a voting round.
    pub round_duration: Duration,

    /// Content pack used when a room is created without one.
    pub default_pack_id: PackId,

    /// Story node every new room starts at.
    pub root_node: NodeId,

    /// How ties in a round's tally are resolved.
    pub tie_break: TieBreak,

    /// Number of characters in a generated room id.
    pub id_length: usize,

    /// How long after `expires_at` an idle room is kept before the reaper
    /// evicts it. `None` keeps rooms for the life of the process.
    pub reap_grace: Option<Duration>,

    /// How often the reaper scans for idle rooms.
    pub reap_interval: Duration,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            round_duration: Duration::from_secs(60),
            default_pack_id: PackId::from("default"),
            root_node: NodeId::from("root"),
            tie_break: TieBreak::default(),
            id_length: 6,
            reap_grace: Some(Duration::from_secs(600)),
            reap_interval: Duration::from_secs(30),
        }
    }
}

// ---------------------------------------------------------------------------
// TieBreak
// ---------------------------------------------------------------------------

/// Which choice wins when several share the highest vote count.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// The tied choice that received its first vote earliest in the round.
    #[default]
    FirstVoted,
    /// The lexicographically smallest tied choice id.
    Lexicographic,
}

impl std::fmt::Display for TieBreak {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FirstVoted => write!(f, "first_voted"),
            Self::Lexicographic => write!(f, "lexicographic"),
        }
    }
}

impl FromStr for TieBreak {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first_voted" => Ok(Self::FirstVoted),
            "lexicographic" => Ok(Self::Lexicographic),
            other => Err(format!("unknown tie-break policy: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.round_duration, Duration::from_secs(60));
        assert_eq!(config.default_pack_id.as_str(), "default");
        assert_eq!(config.root_node.as_str(), "root");
        assert_eq!(config.tie_break, TieBreak::FirstVoted);
        assert_eq!(config.id_length, 6);
        assert!(config.reap_grace.is_some());
    }

    #[test]
    fn test_tie_break_parse_round_trips_display() {
        for tb in [TieBreak::FirstVoted, TieBreak::Lexicographic] {
            assert_eq!(tb.to_string().parse::<TieBreak>(), Ok(tb));
        }
        assert!("random".parse::<TieBreak>().is_err());
    }
}
