// Auth endpoints
pub const REGISTER: &str = "/api/register/";
pub const LOGIN: &str = "/api/login/";
pub const VERIFY_OTP: &str = "/api/verify-otp/";
pub const LOGOUT: &str = "/api/logout/";
pub const TOKEN_REFRESH: &str = "/api/token/refresh/";

// Game endpoints
pub const GET_QUESTION: &str = "/api/game/question/";
pub const SUBMIT_ANSWER: &str = "/api/game/answer/";
pub const FREEZE_TIMER: &str = "/api/game/freeze-timer/";
pub const DOUBLE_POINTS: &str = "/api/game/double-points/";

// Profile endpoints
pub const PROFILE: &str = "/api/profile/";
pub const HISTORY: &str = "/api/history/";

pub const LEADERBOARD: &str = "/api/leaderboard/";

// Admin endpoints
pub const ADMIN_PLAYERS: &str = "/api/admin/players/";
pub const ADMIN_STATS: &str = "/api/admin/stats/";
pub const ADMIN_PUZZLES: &str = "/api/admin/puzzles/";

pub fn admin_delete_player(id: u64) -> String {
    format!("/api/admin/players/{}/delete/", id)
}

pub fn admin_delete_puzzle(id: u64) -> String {
    format!("/api/admin/puzzles/{}/delete/", id)
}
