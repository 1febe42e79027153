use futures::future::try_join;
use std::sync::Arc;
use validator::Validate;

use super::endpoints;
use super::http::ApiClient;
use crate::error::ClientError;
use crate::metrics::track_api_call;
use crate::models::admin::{AdminDashboard, AdminStats, Player, Puzzle, PuzzleData};

/// Admin-only operations. Refused locally unless the session's role is admin;
/// the server still has the final word.
pub struct AdminService {
    api: Arc<ApiClient>,
}

impl AdminService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    fn ensure_admin(&self) -> Result<(), ClientError> {
        let session = self.api.session();
        if !session.is_authenticated() {
            return Err(ClientError::NotAuthenticated);
        }
        if !session.is_admin() {
            return Err(ClientError::Forbidden);
        }
        Ok(())
    }

    pub async fn list_players(&self) -> Result<Vec<Player>, ClientError> {
        self.ensure_admin()?;
        track_api_call("admin.players", self.api.get(endpoints::ADMIN_PLAYERS, &[])).await
    }

    pub async fn delete_player(&self, id: u64) -> Result<(), ClientError> {
        self.ensure_admin()?;
        tracing::info!("Deleting player {}", id);
        track_api_call(
            "admin.delete_player",
            self.api.delete(&endpoints::admin_delete_player(id)),
        )
        .await
    }

    pub async fn get_stats(&self) -> Result<AdminStats, ClientError> {
        self.ensure_admin()?;
        track_api_call("admin.stats", self.api.get(endpoints::ADMIN_STATS, &[])).await
    }

    /// Players and stats together; either failing fails the whole load.
    pub async fn dashboard(&self) -> Result<AdminDashboard, ClientError> {
        let (players, stats) = try_join(self.list_players(), self.get_stats()).await?;
        Ok(AdminDashboard { players, stats })
    }

    pub async fn create_puzzle(&self, data: PuzzleData) -> Result<Puzzle, ClientError> {
        data.validate()?;
        self.ensure_admin()?;
        tracing::info!("Creating {} puzzle", data.difficulty);
        track_api_call(
            "admin.create_puzzle",
            self.api.post(endpoints::ADMIN_PUZZLES, &data),
        )
        .await
    }

    pub async fn delete_puzzle(&self, id: u64) -> Result<(), ClientError> {
        self.ensure_admin()?;
        tracing::info!("Deleting puzzle {}", id);
        track_api_call(
            "admin.delete_puzzle",
            self.api.delete(&endpoints::admin_delete_puzzle(id)),
        )
        .await
    }
}
