use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Countdown budget for a round of this difficulty.
    pub fn time_limit_seconds(&self) -> u32 {
        match self {
            Difficulty::Easy => 60,
            Difficulty::Medium => 45,
            Difficulty::Hard => 30,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy Peasy",
            Difficulty::Medium => "Monkey Challenge",
            Difficulty::Hard => "Banana Expert",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(ClientError::validation(format!(
                "Unknown difficulty '{}', expected easy, medium or hard",
                other
            ))),
        }
    }
}

/// A puzzle served by `GET /api/game/question/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub puzzle_id: String,
    pub image_url: String,
    pub difficulty: Difficulty,
    pub points_value: u32,
    pub time_limit: u32,
    pub created_at: DateTime<Utc>,
}
