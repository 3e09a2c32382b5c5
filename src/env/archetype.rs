use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LaneChaseError;

/// Behavioural bias governing how NPCs drift between lanes on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    /// Occasionally steers toward the player's lane.
    Aggressive,
    /// Occasionally sidesteps when sharing the player's lane.
    Defensive,
    /// No drift of its own.
    #[default]
    Neutral,
}

impl Archetype {
    /// Value of the archetype component in the observation vector.
    pub fn code(&self) -> f32 {
        match self {
            Archetype::Aggressive => 1.0,
            Archetype::Defensive => -1.0,
            Archetype::Neutral => 0.0,
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Archetype::Aggressive => "aggressive",
            Archetype::Defensive => "defensive",
            Archetype::Neutral => "neutral",
        };
        f.write_str(name)
    }
}

impl FromStr for Archetype {
    type Err = LaneChaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aggressive" => Ok(Archetype::Aggressive),
            "defensive" => Ok(Archetype::Defensive),
            "neutral" => Ok(Archetype::Neutral),
            other => Err(LaneChaseError::invalid_parameter(
                "archetype".to_string(),
                format!("unknown archetype '{}'", other),
            )),
        }
    }
}
