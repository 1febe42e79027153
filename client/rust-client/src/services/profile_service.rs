use std::sync::Arc;

use super::endpoints;
use super::http::ApiClient;
use crate::error::ClientError;
use crate::metrics::track_api_call;
use crate::models::profile::{GameHistory, ProfileData};

pub struct ProfileService {
    api: Arc<ApiClient>,
}

impl ProfileService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn get_profile(&self) -> Result<ProfileData, ClientError> {
        track_api_call("profile.get", self.api.get(endpoints::PROFILE, &[])).await
    }

    pub async fn get_history(&self) -> Result<Vec<GameHistory>, ClientError> {
        track_api_call("profile.history", self.api.get(endpoints::HISTORY, &[])).await
    }
}
