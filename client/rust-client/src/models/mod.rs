pub mod admin;
pub mod answer;
pub mod power_up;
pub mod profile;
pub mod question;
pub mod timer;
pub mod user;

pub use answer::{AnswerStats, SubmitAnswerRequest, SubmitAnswerResponse};
pub use power_up::{
    DoublePointsRequest, DoublePointsResponse, FreezeTier, FreezeTimerRequest,
    FreezeTimerResponse, PowerUpWindow,
};
pub use question::{Difficulty, Question};
pub use timer::{TimerSnapshot, TimerUrgency};
pub use user::{AuthTokens, UserRecord, UserRole};
