use std::sync::Arc;
use validator::Validate;

use super::endpoints;
use super::http::ApiClient;
use crate::error::ClientError;
use crate::metrics::track_api_call;
use crate::models::user::{
    AuthResponse, LoginRequest, LoginStep1Response, OtpVerifyRequest, RegisterRequest,
    RegisterResponse,
};
use crate::models::{AuthTokens, UserRecord};

/// Issued by the first login step; the OTP mailed to `email` completes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpChallenge {
    pub email: String,
}

pub struct AuthService {
    api: Arc<ApiClient>,
}

impl AuthService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn register(&self, req: RegisterRequest) -> Result<RegisterResponse, ClientError> {
        req.validate()?;

        tracing::info!("Registering new player: {}", req.username);

        let response: RegisterResponse = track_api_call(
            "auth.register",
            self.api.post_anonymous(endpoints::REGISTER, &req),
        )
        .await?;

        tracing::info!("Player registered: id={}", response.id);
        Ok(response)
    }

    /// Step 1: username + password. On success the server mails an OTP.
    pub async fn login(&self, req: LoginRequest) -> Result<OtpChallenge, ClientError> {
        let req = LoginRequest {
            username: req.username.trim().to_string(),
            password: req.password,
        };
        if req.password.trim().is_empty() {
            return Err(ClientError::validation("Please fill in all fields"));
        }
        req.validate()?;

        tracing::info!("Login attempt for user: {}", req.username);

        let response: LoginStep1Response =
            track_api_call("auth.login", self.api.post_anonymous(endpoints::LOGIN, &req)).await?;

        if !response.otp_sent {
            return Err(ClientError::rejected(
                200,
                "Failed to send OTP. Please try again.",
            ));
        }

        tracing::info!("OTP sent for user: {}", req.username);
        Ok(OtpChallenge {
            email: response.email,
        })
    }

    /// Step 2: the mailed code. Stores tokens and the user record in the
    /// session on success.
    pub async fn verify_otp(
        &self,
        challenge: &OtpChallenge,
        otp: &str,
    ) -> Result<UserRecord, ClientError> {
        let req = OtpVerifyRequest {
            email: challenge.email.clone(),
            otp: otp.trim().to_string(),
        };
        req.validate()?;

        let response: AuthResponse = track_api_call(
            "auth.verify_otp",
            self.api.post_anonymous(endpoints::VERIFY_OTP, &req),
        )
        .await?;

        let user = response.user.unwrap_or_else(|| UserRecord {
            id: 0,
            username: String::new(),
            email: challenge.email.clone(),
            role: Default::default(),
            score: 0,
            coins: 0,
        });

        self.api.session().establish(
            AuthTokens {
                access: response.access,
                refresh: response.refresh,
            },
            user.clone(),
        );

        tracing::info!(
            "Logged in: user={}, role={}",
            user.username,
            user.role.as_str()
        );
        Ok(user)
    }

    /// Tells the server, then always forgets the local session.
    pub async fn logout(&self) {
        if self.api.session().is_authenticated() {
            if let Err(e) =
                track_api_call("auth.logout", self.api.post_empty(endpoints::LOGOUT)).await
            {
                tracing::warn!("Logout request failed: {}", e);
            }
        }

        self.api.session().clear();
        tracing::info!("Logged out");
    }
}
