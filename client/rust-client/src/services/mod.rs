use std::sync::Arc;

use crate::config::Config;
use crate::session::SharedSession;

use self::admin_service::AdminService;
use self::auth_service::AuthService;
use self::game_service::GameService;
use self::http::ApiClient;
use self::leaderboard_service::LeaderboardService;
use self::profile_service::ProfileService;

pub struct AppState {
    pub config: Config,
    pub session: SharedSession,
    pub api: Arc<ApiClient>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let session = match &config.session_file {
            Some(path) => SharedSession::restore(path),
            None => SharedSession::new(),
        };

        let api = Arc::new(ApiClient::new(&config, session.clone())?);

        tracing::info!("API client ready for {}", config.api_base_url);

        Ok(Self {
            config,
            session,
            api,
        })
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.api.clone())
    }

    pub fn game(&self) -> GameService {
        GameService::new(self.api.clone())
    }

    pub fn profile(&self) -> ProfileService {
        ProfileService::new(self.api.clone())
    }

    pub fn leaderboard(&self) -> LeaderboardService {
        LeaderboardService::new(self.api.clone())
    }

    pub fn admin(&self) -> AdminService {
        AdminService::new(self.api.clone())
    }
}

pub mod admin_service;
pub mod auth_service;
pub mod endpoints;
pub mod game_service;
pub mod http;
pub mod leaderboard_service;
pub mod profile_service;
