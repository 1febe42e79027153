use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

lazy_static! {
    static ref OTP_PATTERN: Regex = Regex::new(r"^[0-9]{6}$").unwrap();
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    #[serde(other)]
    Player,
}

impl UserRole {
    pub fn as_str(&self) -> &str {
        match self {
            UserRole::Player => "player",
            UserRole::Admin => "admin",
        }
    }
}

/// User record as returned by `verify-otp`. Score and coins are mirrors of
/// server state; missing values stay at zero rather than being guessed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub role: UserRole,
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub coins: u32,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    let value: Option<T> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthTokens {
    pub access: String,
    pub refresh: String,
}

/// Request to register a new player
#[derive(Debug, Clone, Serialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 150, message = "Username is required"))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    #[serde(skip)]
    #[validate(must_match(other = "password", message = "Passwords don't match"))]
    pub password_confirmation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterResponse {
    pub id: u64,
    pub username: String,
    pub email: String,
}

/// First login step: credentials in, OTP mailed out.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Please fill in all fields"))]
    pub username: String,

    #[validate(length(min = 1, message = "Please fill in all fields"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginStep1Response {
    pub otp_sent: bool,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Validate)]
pub struct OtpVerifyRequest {
    pub email: String,

    #[validate(custom(function = "validate_otp"))]
    pub otp: String,
}

fn validate_otp(otp: &str) -> Result<(), ValidationError> {
    if OTP_PATTERN.is_match(otp) {
        Ok(())
    } else {
        Err(ValidationError::new("otp").with_message("Please enter a valid 6-digit OTP".into()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    pub access: String,
    pub refresh: String,
    #[serde(default)]
    pub user: Option<UserRecord>,
}

#[derive(Debug, Serialize)]
pub struct TokenRefreshRequest<'a> {
    pub refresh: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct TokenRefreshResponse {
    pub access: String,
}
