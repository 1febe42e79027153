use serde::{Deserialize, Serialize};
use validator::Validate;

use super::question::Difficulty;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Player {
    pub id: u64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub score: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyStat {
    pub date: String,
    pub games: u32,
    pub correct: u32,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminStats {
    #[serde(default)]
    pub total_players: u32,
    #[serde(default)]
    pub total_games: u32,
    #[serde(default)]
    pub total_correct_answers: u32,
    #[serde(default)]
    pub overall_accuracy: f64,
    #[serde(default)]
    pub daily_stats: Vec<DailyStat>,
}

/// Players and stats loaded together for the admin view.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminDashboard {
    pub players: Vec<Player>,
    pub stats: AdminStats,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct PuzzleData {
    #[validate(url(message = "Image URL must be a valid URL"))]
    pub image_url: String,

    #[validate(length(min = 1, message = "Solution is required"))]
    pub solution: String,

    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Puzzle {
    pub id: u64,
    pub image_url: String,
    pub difficulty: Difficulty,
    pub solution: String,
}
