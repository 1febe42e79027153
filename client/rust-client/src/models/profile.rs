use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Score the profile progress bar counts towards.
pub const PROFILE_SCORE_GOAL: i64 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameHistory {
    pub puzzle_id: String,
    pub player_answer: String,
    pub is_correct: bool,
    pub points_earned: i64,
    pub time_taken: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileData {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub coins: u32,
    #[serde(default)]
    pub games_played: u32,
    #[serde(default)]
    pub accuracy: f64,
    #[serde(default)]
    pub recent_games: Vec<GameHistory>,
}

impl ProfileData {
    /// Progress towards [`PROFILE_SCORE_GOAL`], capped at 100.
    pub fn goal_progress_percent(&self) -> f64 {
        if self.score <= 0 {
            return 0.0;
        }
        (self.score as f64 / PROFILE_SCORE_GOAL as f64 * 100.0).min(100.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardEntry {
    pub username: String,
    pub score: i64,
    pub rank: u32,
    #[serde(default)]
    pub games: Option<u32>,
    #[serde(default)]
    pub accuracy: Option<f64>,
}
