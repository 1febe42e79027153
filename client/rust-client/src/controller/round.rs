use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::events::{Dispatch, Notification, RoundEvent, RoundPhase};
use super::timers::RoundTimers;
use crate::config::GameSettings;
use crate::error::ClientError;
use crate::metrics::{
    record_power_up, record_stale, ANSWERS_SUBMITTED_TOTAL, ROUNDS_STARTED_TOTAL,
    ROUND_TIMEOUTS_TOTAL,
};
use crate::models::power_up::DOUBLE_POINTS_DISPLAY_COST;
use crate::models::{
    AnswerStats, Difficulty, DoublePointsRequest, DoublePointsResponse, FreezeTier,
    FreezeTimerRequest, FreezeTimerResponse, PowerUpWindow, Question, SubmitAnswerRequest,
    SubmitAnswerResponse, TimerSnapshot,
};
use crate::services::game_service::GameApi;
use crate::session::SharedSession;
use crate::utils::time::{Clock, SystemClock};

/// One puzzle attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    pub puzzle_id: String,
    pub image_url: String,
    pub difficulty: Difficulty,
    pub points_value: u32,
    pub time_limit_seconds: u32,
    pub remaining_seconds: u32,
    /// Last answer sent for this round, empty until the first submission.
    pub submitted_answer: String,
}

impl Round {
    fn from_question(question: Question) -> Self {
        if question.time_limit != question.difficulty.time_limit_seconds() {
            tracing::debug!(
                "Server time_limit {} differs from {} limit, using the latter",
                question.time_limit,
                question.difficulty
            );
        }

        let time_limit_seconds = question.difficulty.time_limit_seconds();
        Self {
            puzzle_id: question.puzzle_id,
            image_url: question.image_url,
            difficulty: question.difficulty,
            points_value: question.points_value,
            time_limit_seconds,
            remaining_seconds: time_limit_seconds,
            submitted_answer: String::new(),
        }
    }

    /// Seconds used so far, within `[0, time_limit_seconds]`.
    pub fn elapsed_seconds(&self) -> u32 {
        self.time_limit_seconds
            .saturating_sub(self.remaining_seconds.min(self.time_limit_seconds))
    }
}

/// Owns the current round, its countdown and power-ups, and the answer
/// submission lifecycle.
///
/// Driven from a single task: commands are plain `&mut self` calls, while
/// timers and network completions come back through [`next_event`] and are
/// applied with [`handle`]. Every round-bound event is checked against the
/// current `puzzle_id` before it may change anything.
///
/// [`next_event`]: RoundController::next_event
/// [`handle`]: RoundController::handle
pub struct RoundController {
    api: Arc<dyn GameApi>,
    session: SharedSession,
    clock: Arc<dyn Clock>,
    settings: GameSettings,
    events_tx: UnboundedSender<RoundEvent>,
    events_rx: UnboundedReceiver<RoundEvent>,
    phase: RoundPhase,
    difficulty: Option<Difficulty>,
    round: Option<Round>,
    freeze: Option<PowerUpWindow>,
    freeze_pending: bool,
    double_points: bool,
    double_points_pending: bool,
    shake: bool,
    stats: AnswerStats,
    load_seq: u64,
    timers: RoundTimers,
    notifications: Vec<Notification>,
}

impl RoundController {
    pub fn new(api: Arc<dyn GameApi>, session: SharedSession, settings: GameSettings) -> Self {
        Self::with_clock(api, session, settings, Arc::new(SystemClock))
    }

    pub fn with_clock(
        api: Arc<dyn GameApi>,
        session: SharedSession,
        settings: GameSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            api,
            session,
            clock,
            settings,
            events_tx,
            events_rx,
            phase: RoundPhase::Idle,
            difficulty: None,
            round: None,
            freeze: None,
            freeze_pending: false,
            double_points: false,
            double_points_pending: false,
            shake: false,
            stats: AnswerStats::default(),
            load_seq: 0,
            timers: RoundTimers::default(),
            notifications: Vec::new(),
        }
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    /// Difficulty of the current game, kept for replacement rounds.
    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty
    }

    pub fn freeze_window(&self) -> Option<PowerUpWindow> {
        self.freeze
    }

    pub fn is_frozen(&self) -> bool {
        self.freeze.is_some()
    }

    pub fn double_points_active(&self) -> bool {
        self.double_points
    }

    pub fn shake(&self) -> bool {
        self.shake
    }

    pub fn stats(&self) -> AnswerStats {
        self.stats
    }

    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn timer(&self) -> Option<TimerSnapshot> {
        self.round.as_ref().map(|round| {
            TimerSnapshot::new(
                round.time_limit_seconds,
                round.remaining_seconds,
                self.freeze.is_some(),
            )
        })
    }

    /// Whether a freeze of this tier could be requested right now.
    pub fn can_freeze(&self, tier: FreezeTier) -> bool {
        self.phase == RoundPhase::Active
            && self.freeze.is_none()
            && !self.freeze_pending
            && self.session.coins() >= tier.display_cost()
    }

    pub fn can_double_points(&self) -> bool {
        self.phase == RoundPhase::Active
            && !self.double_points
            && !self.double_points_pending
            && self.session.coins() >= DOUBLE_POINTS_DISPLAY_COST
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn select_difficulty(&mut self, difficulty: Difficulty) -> Result<Dispatch, ClientError> {
        if self.phase != RoundPhase::Idle {
            return Err(ClientError::InvalidState(self.phase.as_str()));
        }

        tracing::info!("Starting {} game", difficulty);
        self.notifications
            .push(Notification::info(format!("Starting {} mode!", difficulty)));
        self.begin_load(difficulty);
        Ok(Dispatch::Sent)
    }

    pub fn submit_answer(&mut self, text: &str) -> Result<Dispatch, ClientError> {
        match self.phase {
            RoundPhase::Submitting => return Ok(Dispatch::Ignored),
            RoundPhase::Active => {}
            other => return Err(ClientError::InvalidState(other.as_str())),
        }

        let answer = text.trim();
        if answer.is_empty() {
            return Err(ClientError::validation("Answer cannot be empty"));
        }

        let round = self
            .round
            .as_mut()
            .ok_or(ClientError::InvalidState("no round"))?;
        round.submitted_answer = answer.to_string();

        let request = SubmitAnswerRequest {
            puzzle_id: round.puzzle_id.clone(),
            answer: answer.to_string(),
            time_taken: round.elapsed_seconds(),
        };
        let puzzle_id = round.puzzle_id.clone();

        tracing::debug!(
            "Submitting answer for {} after {}s",
            puzzle_id,
            request.time_taken
        );
        self.phase = RoundPhase::Submitting;

        let api = self.api.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.submit_answer(request).await;
            let _ = tx.send(RoundEvent::AnswerResolved { puzzle_id, result });
        });

        Ok(Dispatch::Sent)
    }

    pub fn activate_freeze(&mut self, seconds: u32) -> Result<Dispatch, ClientError> {
        let tier = FreezeTier::from_seconds(seconds)?;
        let puzzle_id = self.active_puzzle_id()?;

        if self.freeze.is_some() || self.freeze_pending {
            return Ok(Dispatch::Ignored);
        }

        let available = self.session.coins();
        if available < tier.display_cost() {
            return Err(ClientError::InsufficientCoins {
                needed: tier.display_cost(),
                available,
            });
        }

        self.freeze_pending = true;

        let request = FreezeTimerRequest {
            puzzle_id: puzzle_id.clone(),
            freeze_seconds: tier.seconds(),
        };
        let api = self.api.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.freeze_timer(request).await;
            let _ = tx.send(RoundEvent::FreezeResolved {
                puzzle_id,
                tier,
                result,
            });
        });

        Ok(Dispatch::Sent)
    }

    pub fn activate_double_points(&mut self) -> Result<Dispatch, ClientError> {
        let puzzle_id = self.active_puzzle_id()?;

        if self.double_points || self.double_points_pending {
            return Ok(Dispatch::Ignored);
        }

        let available = self.session.coins();
        if available < DOUBLE_POINTS_DISPLAY_COST {
            return Err(ClientError::InsufficientCoins {
                needed: DOUBLE_POINTS_DISPLAY_COST,
                available,
            });
        }

        self.double_points_pending = true;

        let request = DoublePointsRequest {
            puzzle_id: puzzle_id.clone(),
        };
        let api = self.api.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.double_points(request).await;
            let _ = tx.send(RoundEvent::DoublePointsResolved { puzzle_id, result });
        });

        Ok(Dispatch::Sent)
    }

    /// Back to difficulty selection from any phase. In-flight responses are
    /// dropped when they arrive.
    pub fn leave(&mut self) {
        if self.phase != RoundPhase::Idle {
            tracing::info!("Leaving game from {}", self.phase.as_str());
        }
        self.discard_round();
        self.load_seq += 1;
        self.difficulty = None;
        self.phase = RoundPhase::Idle;
    }

    pub async fn next_event(&mut self) -> Option<RoundEvent> {
        self.events_rx.recv().await
    }

    /// Applies every event already queued, without waiting. Returns how
    /// many were handled.
    pub fn drain_events(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    pub fn handle(&mut self, event: RoundEvent) {
        match event {
            RoundEvent::Tick { puzzle_id } => self.tick(&puzzle_id),
            RoundEvent::FreezePoll { puzzle_id } => self.check_freeze_expiry(&puzzle_id),
            RoundEvent::ClearShake { puzzle_id } => {
                if self.is_current(&puzzle_id) {
                    self.shake = false;
                }
            }
            RoundEvent::QuestionLoaded { load_seq, result } => {
                self.on_question_loaded(load_seq, result)
            }
            RoundEvent::AnswerResolved { puzzle_id, result } => {
                self.on_answer_resolved(&puzzle_id, result)
            }
            RoundEvent::FreezeResolved {
                puzzle_id,
                tier,
                result,
            } => self.on_freeze_resolved(&puzzle_id, tier, result),
            RoundEvent::DoublePointsResolved { puzzle_id, result } => {
                self.on_double_points_resolved(&puzzle_id, result)
            }
        }
    }

    /// One second of countdown for `puzzle_id`. No-op for any other round
    /// and while frozen.
    pub fn tick(&mut self, puzzle_id: &str) {
        if !self.is_current(puzzle_id) {
            record_stale("tick");
            return;
        }
        if self.freeze.is_some() {
            return;
        }

        let Some(round) = self.round.as_mut() else {
            return;
        };
        round.remaining_seconds = round.remaining_seconds.saturating_sub(1);
        let expired = round.remaining_seconds == 0;

        if expired {
            self.time_out();
        }
    }

    /// Clears the freeze window once the clock reaches its expiry and
    /// resumes the countdown. Never touches `remaining_seconds`.
    pub fn check_freeze_expiry(&mut self, puzzle_id: &str) {
        if !self.is_current(puzzle_id) {
            record_stale("freeze_poll");
            return;
        }
        let Some(window) = self.freeze else {
            return;
        };
        if !window.is_expired_at(self.clock.now()) {
            return;
        }

        self.freeze = None;
        self.timers.stop_freeze_poll();
        self.timers
            .start_ticking(&self.events_tx, puzzle_id, self.settings.tick_interval());

        tracing::debug!("Freeze window over for {}", puzzle_id);
        self.notifications
            .push(Notification::info("Timer freeze ended"));
    }

    fn begin_load(&mut self, difficulty: Difficulty) {
        self.load_seq += 1;
        let load_seq = self.load_seq;
        self.phase = RoundPhase::Loading;
        self.difficulty = Some(difficulty);

        let api = self.api.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.fetch_question(difficulty).await;
            let _ = tx.send(RoundEvent::QuestionLoaded { load_seq, result });
        });
    }

    fn on_question_loaded(&mut self, load_seq: u64, result: Result<Question, ClientError>) {
        if load_seq != self.load_seq || self.phase != RoundPhase::Loading {
            record_stale("question");
            return;
        }

        match result {
            Ok(question) => self.install_round(question),
            Err(err) => self.fail_to_idle("Failed to load question", &err),
        }
    }

    fn install_round(&mut self, question: Question) {
        self.discard_round();

        let round = Round::from_question(question);
        ROUNDS_STARTED_TOTAL
            .with_label_values(&[round.difficulty.as_str()])
            .inc();
        tracing::info!(
            "Round {} started: {}s on the clock",
            round.puzzle_id,
            round.time_limit_seconds
        );

        self.timers.start_ticking(
            &self.events_tx,
            &round.puzzle_id,
            self.settings.tick_interval(),
        );
        self.round = Some(round);
        self.phase = RoundPhase::Active;
    }

    fn time_out(&mut self) {
        ROUND_TIMEOUTS_TOTAL.inc();
        self.stats.record_wrong();

        let difficulty = self
            .difficulty
            .or_else(|| self.round.as_ref().map(|r| r.difficulty))
            .unwrap_or_default();

        if let Some(round) = &self.round {
            tracing::info!("Round {} timed out", round.puzzle_id);
        }
        self.notifications.push(Notification::error("Time's up!"));

        self.discard_round();
        self.begin_load(difficulty);
    }

    fn on_answer_resolved(
        &mut self,
        puzzle_id: &str,
        result: Result<SubmitAnswerResponse, ClientError>,
    ) {
        if self.phase != RoundPhase::Submitting || !self.is_current(puzzle_id) {
            record_stale("answer");
            return;
        }

        match result {
            Ok(response) => {
                ANSWERS_SUBMITTED_TOTAL
                    .with_label_values(&[if response.correct { "true" } else { "false" }])
                    .inc();
                self.session
                    .mirror_totals(response.total_score, response.total_coins);

                if response.correct {
                    self.stats.record_correct();
                    self.double_points = false;

                    let message = match response.reward_summary() {
                        Some(reward) => format!("Correct! {}", reward),
                        None => "Correct!".to_string(),
                    };
                    self.notifications.push(Notification::success(message));

                    let difficulty = self
                        .difficulty
                        .or_else(|| self.round.as_ref().map(|r| r.difficulty))
                        .unwrap_or_default();
                    self.discard_round();
                    self.begin_load(difficulty);
                } else {
                    self.stats.record_wrong();
                    self.shake = true;
                    self.timers.schedule_shake_clear(
                        &self.events_tx,
                        puzzle_id,
                        self.settings.shake_duration(),
                    );
                    self.phase = RoundPhase::Active;
                    self.notifications
                        .push(Notification::error("Wrong answer! Try again"));
                }
            }
            Err(ClientError::SessionExpired) => {
                self.fail_to_idle("Failed to submit answer", &ClientError::SessionExpired)
            }
            Err(err) => {
                tracing::warn!("Answer for {} failed: {}", puzzle_id, err);
                self.phase = RoundPhase::Active;
                self.notifications
                    .push(Notification::failure("Failed to submit answer", &err));
            }
        }
    }

    fn on_freeze_resolved(
        &mut self,
        puzzle_id: &str,
        tier: FreezeTier,
        result: Result<FreezeTimerResponse, ClientError>,
    ) {
        if !self.is_current(puzzle_id) {
            record_stale("freeze");
            return;
        }
        self.freeze_pending = false;

        match result {
            Ok(response) if response.success => {
                self.session.mirror_coins(response.coins_left);
                self.freeze = Some(PowerUpWindow {
                    expires_at: response.active_until,
                });
                self.timers.stop_ticking();
                self.timers.start_freeze_poll(
                    &self.events_tx,
                    puzzle_id,
                    self.settings.freeze_poll_interval(),
                );

                record_power_up("freeze", "success");
                tracing::info!(
                    "Timer frozen for {} until {}",
                    puzzle_id,
                    response.active_until
                );
                self.notifications.push(Notification::success(format!(
                    "Timer frozen for {} seconds!",
                    tier.seconds()
                )));
            }
            Ok(_) => {
                record_power_up("freeze", "rejected");
                self.notifications
                    .push(Notification::error("Failed to freeze timer"));
            }
            Err(ClientError::SessionExpired) => {
                record_power_up("freeze", "session_expired");
                self.fail_to_idle("Failed to freeze timer", &ClientError::SessionExpired)
            }
            Err(err) => {
                record_power_up("freeze", "error");
                self.notifications
                    .push(Notification::failure("Failed to freeze timer", &err));
            }
        }
    }

    fn on_double_points_resolved(
        &mut self,
        puzzle_id: &str,
        result: Result<DoublePointsResponse, ClientError>,
    ) {
        if !self.is_current(puzzle_id) {
            record_stale("double_points");
            return;
        }
        self.double_points_pending = false;

        match result {
            Ok(response) if response.success => {
                self.session.mirror_coins(response.coins_left);
                self.double_points = true;

                record_power_up("double_points", "success");
                self.notifications.push(Notification::success(
                    "Double points activated for next correct answer!",
                ));
            }
            Ok(_) => {
                record_power_up("double_points", "rejected");
                self.notifications
                    .push(Notification::error("Failed to activate double points"));
            }
            Err(ClientError::SessionExpired) => {
                record_power_up("double_points", "session_expired");
                self.fail_to_idle(
                    "Failed to activate double points",
                    &ClientError::SessionExpired,
                )
            }
            Err(err) => {
                record_power_up("double_points", "error");
                self.notifications.push(Notification::failure(
                    "Failed to activate double points",
                    &err,
                ));
            }
        }
    }

    fn fail_to_idle(&mut self, context: &str, err: &ClientError) {
        tracing::warn!("{}: {}", context, err);
        self.discard_round();
        self.load_seq += 1;
        self.phase = RoundPhase::Idle;

        let notification = match err {
            ClientError::SessionExpired => {
                Notification::error("Session expired, please log in again")
            }
            other => Notification::failure(context, other),
        };
        self.notifications.push(notification);
    }

    /// Drops the round and everything bound to it. Double points survive:
    /// they apply to the next correct answer whatever round it lands on.
    fn discard_round(&mut self) {
        self.timers.cancel_all();
        self.round = None;
        self.freeze = None;
        self.freeze_pending = false;
        self.double_points_pending = false;
        self.shake = false;
    }

    fn active_puzzle_id(&self) -> Result<String, ClientError> {
        if self.phase != RoundPhase::Active {
            return Err(ClientError::InvalidState(self.phase.as_str()));
        }
        self.round
            .as_ref()
            .map(|round| round.puzzle_id.clone())
            .ok_or(ClientError::InvalidState("no round"))
    }

    fn is_current(&self, puzzle_id: &str) -> bool {
        self.round
            .as_ref()
            .is_some_and(|round| round.puzzle_id == puzzle_id)
    }

    #[cfg(test)]
    pub(crate) fn timers(&self) -> &RoundTimers {
        &self.timers
    }
}
