use crate::error::ClientError;
use crate::models::{
    DoublePointsResponse, FreezeTier, FreezeTimerResponse, Question, SubmitAnswerResponse,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// No round; difficulty selection.
    Idle,
    /// Question requested, awaiting the response.
    Loading,
    /// Round in progress, countdown running or frozen.
    Active,
    /// Answer in flight; the countdown keeps running.
    Submitting,
}

impl RoundPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundPhase::Idle => "idle",
            RoundPhase::Loading => "loading",
            RoundPhase::Active => "active",
            RoundPhase::Submitting => "submitting",
        }
    }
}

/// Everything that reaches the controller from timers and network calls.
///
/// Round-bound events carry the `puzzle_id` they were created for; question
/// loads carry the load sequence they answer. Events that no longer match the
/// controller's current round or load are dropped.
#[derive(Debug)]
pub enum RoundEvent {
    Tick {
        puzzle_id: String,
    },
    FreezePoll {
        puzzle_id: String,
    },
    ClearShake {
        puzzle_id: String,
    },
    QuestionLoaded {
        load_seq: u64,
        result: Result<Question, ClientError>,
    },
    AnswerResolved {
        puzzle_id: String,
        result: Result<SubmitAnswerResponse, ClientError>,
    },
    FreezeResolved {
        puzzle_id: String,
        tier: FreezeTier,
        result: Result<FreezeTimerResponse, ClientError>,
    },
    DoublePointsResolved {
        puzzle_id: String,
        result: Result<DoublePointsResponse, ClientError>,
    },
}

/// Result of a player command that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Sent,
    /// Guarded no-op: the same action is already pending or in effect.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// A user-facing message produced by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub retryable: bool,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
            retryable: false,
        }
    }

    /// `context` plus the error, retryable when the error is transient.
    pub fn failure(context: &str, err: &ClientError) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: format!("{}: {}", context, err),
            retryable: err.is_retryable(),
        }
    }
}
