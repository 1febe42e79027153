use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmitAnswerRequest {
    pub puzzle_id: String,
    pub answer: String,
    /// Seconds elapsed on the round's countdown.
    pub time_taken: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmitAnswerResponse {
    pub correct: bool,
    pub points_earned: i64,
    pub coins_earned: i64,
    pub total_score: i64,
    pub total_coins: u32,
    #[serde(default)]
    pub time_taken: Option<u32>,
    #[serde(default)]
    pub multiplier: Option<f64>,
    #[serde(default)]
    pub speed_bonus: Option<i64>,
}

impl SubmitAnswerResponse {
    /// "+20 points & +5 coins", or `None` when nothing was earned.
    pub fn reward_summary(&self) -> Option<String> {
        let mut parts = Vec::new();
        if self.points_earned > 0 {
            parts.push(format!("+{} points", self.points_earned));
        }
        if self.coins_earned > 0 {
            parts.push(format!("+{} coins", self.coins_earned));
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" & "))
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnswerStats {
    pub correct: u32,
    pub wrong: u32,
    pub streak: u32,
}

impl AnswerStats {
    pub fn record_correct(&mut self) {
        self.correct += 1;
        self.streak += 1;
    }

    /// Wrong answers and timeouts both land here.
    pub fn record_wrong(&mut self) {
        self.wrong += 1;
        self.streak = 0;
    }
}
