use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Shown to the player and used for the local balance pre-check only.
/// What is actually deducted comes back as `coins_left`.
pub const DOUBLE_POINTS_DISPLAY_COST: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreezeTier {
    Short,
    Long,
}

impl FreezeTier {
    pub fn from_seconds(seconds: u32) -> Result<Self, ClientError> {
        match seconds {
            5 => Ok(FreezeTier::Short),
            10 => Ok(FreezeTier::Long),
            other => Err(ClientError::validation(format!(
                "Freeze lasts 5 or 10 seconds, not {}",
                other
            ))),
        }
    }

    pub fn seconds(&self) -> u32 {
        match self {
            FreezeTier::Short => 5,
            FreezeTier::Long => 10,
        }
    }

    pub fn display_cost(&self) -> u32 {
        match self {
            FreezeTier::Short => 20,
            FreezeTier::Long => 35,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FreezeTimerRequest {
    pub puzzle_id: String,
    pub freeze_seconds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FreezeTimerResponse {
    pub success: bool,
    pub coins_left: u32,
    /// Absolute end of the freeze window, as decided by the server.
    pub active_until: DateTime<Utc>,
    #[serde(default)]
    pub freeze_seconds: Option<u32>,
    #[serde(default)]
    pub coins_spent: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DoublePointsRequest {
    pub puzzle_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoublePointsResponse {
    pub success: bool,
    pub coins_left: u32,
    #[serde(default)]
    pub multiplier: Option<f64>,
    #[serde(default)]
    pub coins_spent: Option<u32>,
    #[serde(default)]
    pub active_for_next: Option<bool>,
}

/// An installed timer freeze. Present only while the freeze is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerUpWindow {
    pub expires_at: DateTime<Utc>,
}

impl PowerUpWindow {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn freeze_tiers() {
        let short = FreezeTier::from_seconds(5).unwrap();
        assert_eq!((short.seconds(), short.display_cost()), (5, 20));

        let long = FreezeTier::from_seconds(10).unwrap();
        assert_eq!((long.seconds(), long.display_cost()), (10, 35));

        assert!(FreezeTier::from_seconds(7).is_err());
    }

    #[test]
    fn window_expires_on_the_boundary() {
        let now = Utc::now();
        let window = PowerUpWindow {
            expires_at: now + Duration::seconds(5),
        };

        assert!(!window.is_expired_at(now));
        assert!(!window.is_expired_at(now + Duration::milliseconds(4999)));
        assert!(window.is_expired_at(now + Duration::seconds(5)));
    }

    #[test]
    fn freeze_response_parses_active_until() {
        let json = r#"{"success": true, "freeze_seconds": 5, "coins_spent": 20,
                       "coins_left": 80, "active_until": "2025-01-10T12:00:05Z"}"#;
        let parsed: FreezeTimerResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.coins_left, 80);
        assert_eq!(parsed.active_until.timestamp(), 1736510405);
    }
}
