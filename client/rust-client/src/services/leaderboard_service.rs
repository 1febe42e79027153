use std::sync::Arc;

use super::endpoints;
use super::http::ApiClient;
use crate::error::ClientError;
use crate::metrics::track_api_call;
use crate::models::profile::LeaderboardEntry;

pub struct LeaderboardService {
    api: Arc<ApiClient>,
}

impl LeaderboardService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Entries ordered by rank, as ranked by the server.
    pub async fn get_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ClientError> {
        let mut entries: Vec<LeaderboardEntry> =
            track_api_call("leaderboard.get", self.api.get(endpoints::LEADERBOARD, &[])).await?;
        entries.sort_by_key(|e| e.rank);
        Ok(entries)
    }
}
