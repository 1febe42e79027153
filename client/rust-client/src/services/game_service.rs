use async_trait::async_trait;
use std::sync::Arc;

use super::endpoints;
use super::http::ApiClient;
use crate::error::ClientError;
use crate::metrics::track_api_call;
use crate::models::{
    Difficulty, DoublePointsRequest, DoublePointsResponse, FreezeTimerRequest,
    FreezeTimerResponse, Question, SubmitAnswerRequest, SubmitAnswerResponse,
};

/// The four game calls the round controller depends on.
#[async_trait]
pub trait GameApi: Send + Sync {
    async fn fetch_question(&self, difficulty: Difficulty) -> Result<Question, ClientError>;

    async fn submit_answer(
        &self,
        req: SubmitAnswerRequest,
    ) -> Result<SubmitAnswerResponse, ClientError>;

    async fn freeze_timer(
        &self,
        req: FreezeTimerRequest,
    ) -> Result<FreezeTimerResponse, ClientError>;

    async fn double_points(
        &self,
        req: DoublePointsRequest,
    ) -> Result<DoublePointsResponse, ClientError>;
}

pub struct GameService {
    api: Arc<ApiClient>,
}

impl GameService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl GameApi for GameService {
    async fn fetch_question(&self, difficulty: Difficulty) -> Result<Question, ClientError> {
        tracing::debug!("Fetching {} question", difficulty);

        track_api_call(
            "game.question",
            self.api.get(
                endpoints::GET_QUESTION,
                &[("difficulty", difficulty.as_str())],
            ),
        )
        .await
    }

    async fn submit_answer(
        &self,
        req: SubmitAnswerRequest,
    ) -> Result<SubmitAnswerResponse, ClientError> {
        tracing::info!(
            "Submitting answer: puzzle={}, time_taken={}s",
            req.puzzle_id,
            req.time_taken
        );

        track_api_call(
            "game.answer",
            self.api.post(endpoints::SUBMIT_ANSWER, &req),
        )
        .await
    }

    async fn freeze_timer(
        &self,
        req: FreezeTimerRequest,
    ) -> Result<FreezeTimerResponse, ClientError> {
        tracing::info!(
            "Requesting {}s freeze for puzzle={}",
            req.freeze_seconds,
            req.puzzle_id
        );

        track_api_call(
            "game.freeze_timer",
            self.api.post(endpoints::FREEZE_TIMER, &req),
        )
        .await
    }

    async fn double_points(
        &self,
        req: DoublePointsRequest,
    ) -> Result<DoublePointsResponse, ClientError> {
        tracing::info!("Requesting double points for puzzle={}", req.puzzle_id);

        track_api_call(
            "game.double_points",
            self.api.post(endpoints::DOUBLE_POINTS, &req),
        )
        .await
    }
}
