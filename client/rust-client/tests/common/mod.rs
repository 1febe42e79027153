#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use banana_monkey_client::config::{Config, GameSettings};
use banana_monkey_client::error::ClientError;
use banana_monkey_client::models::{
    AuthTokens, Difficulty, DoublePointsRequest, DoublePointsResponse, FreezeTimerRequest,
    FreezeTimerResponse, Question, SubmitAnswerRequest, SubmitAnswerResponse, UserRecord,
    UserRole,
};
use banana_monkey_client::services::game_service::GameApi;
use banana_monkey_client::services::http::ApiClient;
use banana_monkey_client::services::AppState;
use banana_monkey_client::session::{PlayerSession, SharedSession};
use banana_monkey_client::utils::time::Clock;

pub const PASSWORD: &str = "banana123";
pub const OTP: &str = "123456";
pub const EMAIL: &str = "kong@example.com";
pub const CORRECT_ANSWER: &str = "42";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

// ---------------------------------------------------------------------------
// Fake game API
// ---------------------------------------------------------------------------

/// Server-side state of the fake API. Tests flip the knobs and read the
/// counters through [`FakeApi::state`].
#[derive(Debug)]
pub struct FakeState {
    /// The only access token the server accepts.
    pub access_token: String,
    pub refresh_token: String,
    pub refresh_succeeds: bool,
    /// Answer 401 to every authenticated request, even with a fresh token.
    pub reject_all_access: bool,
    pub role: &'static str,
    pub coins: Option<u32>,
    pub score: i64,
    pub refresh_calls: usize,
    pub logout_calls: usize,
    pub deleted_players: Vec<u64>,
    pub requests: Vec<String>,
    next_puzzle: u32,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            access_token: "access-1".to_string(),
            refresh_token: "refresh-1".to_string(),
            refresh_succeeds: true,
            reject_all_access: false,
            role: "player",
            coins: Some(100),
            score: 0,
            refresh_calls: 0,
            logout_calls: 0,
            deleted_players: Vec::new(),
            requests: Vec::new(),
            next_puzzle: 0,
        }
    }
}

type Shared = Arc<Mutex<FakeState>>;
type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

pub struct FakeApi {
    pub base_url: String,
    pub state: Shared,
}

impl FakeApi {
    pub fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn config(&self) -> Config {
        Config::with_base_url(&self.base_url).unwrap()
    }

    /// Client state with no session.
    pub fn app(&self) -> AppState {
        self.app_with(SharedSession::new())
    }

    /// Client state whose session already holds `access` and the fake's
    /// refresh token.
    pub fn logged_in_app(&self, access: &str, role: UserRole) -> AppState {
        let refresh = self.state().refresh_token.clone();
        self.app_with(session_with(access, &refresh, role, 100, 0))
    }

    pub fn app_with(&self, session: SharedSession) -> AppState {
        let config = self.config();
        let api = Arc::new(ApiClient::new(&config, session.clone()).unwrap());
        AppState {
            config,
            session,
            api,
        }
    }

    pub fn requests_to(&self, path: &str) -> usize {
        self.state()
            .requests
            .iter()
            .filter(|r| r.ends_with(path))
            .count()
    }
}

pub async fn spawn_fake_api() -> FakeApi {
    init_tracing();

    let state: Shared = Arc::new(Mutex::new(FakeState::default()));

    let app = Router::new()
        .route("/api/register/", post(register))
        .route("/api/login/", post(login))
        .route("/api/verify-otp/", post(verify_otp))
        .route("/api/logout/", post(logout))
        .route("/api/token/refresh/", post(refresh))
        .route("/api/game/question/", get(question_handler))
        .route("/api/game/answer/", post(answer))
        .route("/api/game/freeze-timer/", post(freeze_timer))
        .route("/api/game/double-points/", post(double_points))
        .route("/api/profile/", get(profile))
        .route("/api/history/", get(history))
        .route("/api/leaderboard/", get(leaderboard))
        .route("/api/admin/players/", get(admin_players))
        .route("/api/admin/players/{id}/delete/", delete(admin_delete_player))
        .route("/api/admin/stats/", get(admin_stats))
        .route("/api/admin/puzzles/", post(admin_create_puzzle))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeApi {
        base_url: format!("http://{}", addr),
        state,
    }
}

fn log(state: &Shared, line: impl Into<String>) {
    state.lock().unwrap().requests.push(line.into());
}

fn fail(status: StatusCode, body: Value) -> (StatusCode, Json<Value>) {
    (status, Json(body))
}

fn authorize(state: &Shared, headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
    let state = state.lock().unwrap();
    let expected = format!("Bearer {}", state.access_token);
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match presented {
        Some(value) if value == expected && !state.reject_all_access => Ok(()),
        _ => Err(fail(
            StatusCode::UNAUTHORIZED,
            json!({ "detail": "Given token not valid for any token type" }),
        )),
    }
}

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> ApiResult {
    log(&state, "POST /api/register/");
    Ok(Json(json!({
        "id": 7,
        "username": body["username"],
        "email": body["email"],
    })))
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> ApiResult {
    log(&state, "POST /api/login/");
    if body["password"] != PASSWORD {
        return Err(fail(
            StatusCode::BAD_REQUEST,
            json!({ "error": "Invalid credentials" }),
        ));
    }
    Ok(Json(json!({ "otp_sent": true, "email": EMAIL })))
}

async fn verify_otp(State(state): State<Shared>, Json(body): Json<Value>) -> ApiResult {
    log(&state, "POST /api/verify-otp/");
    if body["otp"] != OTP {
        return Err(fail(StatusCode::BAD_REQUEST, json!({ "error": "Invalid OTP" })));
    }

    let state = state.lock().unwrap();
    Ok(Json(json!({
        "access": state.access_token,
        "refresh": state.refresh_token,
        "user": {
            "id": 1,
            "username": "kong",
            "email": body["email"],
            "role": state.role,
            "score": state.score,
            "coins": state.coins,
        }
    })))
}

async fn logout(State(state): State<Shared>, headers: HeaderMap) -> ApiResult {
    log(&state, "POST /api/logout/");
    authorize(&state, &headers)?;
    state.lock().unwrap().logout_calls += 1;
    Ok(Json(json!({ "message": "Logged out" })))
}

async fn refresh(State(state): State<Shared>, Json(body): Json<Value>) -> ApiResult {
    log(&state, "POST /api/token/refresh/");
    let mut state = state.lock().unwrap();
    state.refresh_calls += 1;

    if !state.refresh_succeeds || body["refresh"] != state.refresh_token.as_str() {
        return Err(fail(
            StatusCode::UNAUTHORIZED,
            json!({ "detail": "Token is invalid or expired" }),
        ));
    }

    state.access_token = format!("access-{}", state.refresh_calls + 1);
    Ok(Json(json!({ "access": state.access_token })))
}

async fn question_handler(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult {
    log(&state, "GET /api/game/question/");
    authorize(&state, &headers)?;

    let difficulty = params
        .get("difficulty")
        .cloned()
        .unwrap_or_else(|| "medium".to_string());
    let mut state = state.lock().unwrap();
    state.next_puzzle += 1;

    Ok(Json(json!({
        "puzzle_id": format!("puzzle-{}", state.next_puzzle),
        "image_url": format!("https://marcconrad.com/uob/banana/{}.png", state.next_puzzle),
        "difficulty": difficulty,
        "points_value": 10,
        "time_limit": 45,
        "created_at": "2026-10-16T09:00:00Z",
    })))
}

async fn answer(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> ApiResult {
    log(&state, "POST /api/game/answer/");
    authorize(&state, &headers)?;

    let correct = body["answer"] == CORRECT_ANSWER;
    let mut state = state.lock().unwrap();
    let (points, coins) = if correct { (20, 5) } else { (0, 0) };
    state.score += points;
    let total_coins = state.coins.unwrap_or(0) + coins as u32;
    state.coins = Some(total_coins);

    Ok(Json(json!({
        "correct": correct,
        "points_earned": points,
        "coins_earned": coins,
        "total_score": state.score,
        "total_coins": total_coins,
        "time_taken": body["time_taken"],
    })))
}

async fn freeze_timer(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult {
    log(&state, "POST /api/game/freeze-timer/");
    authorize(&state, &headers)?;

    let seconds = body["freeze_seconds"].as_i64().unwrap_or(5);
    let cost = if seconds == 10 { 35 } else { 20 };
    let mut state = state.lock().unwrap();
    let coins = state.coins.unwrap_or(0);
    if coins < cost {
        return Err(fail(
            StatusCode::BAD_REQUEST,
            json!({ "error": "Insufficient coins" }),
        ));
    }
    state.coins = Some(coins - cost);

    Ok(Json(json!({
        "success": true,
        "coins_left": coins - cost,
        "active_until": (Utc::now() + Duration::seconds(seconds)).to_rfc3339(),
        "freeze_seconds": seconds,
        "coins_spent": cost,
    })))
}

async fn double_points(State(state): State<Shared>, headers: HeaderMap) -> ApiResult {
    log(&state, "POST /api/game/double-points/");
    authorize(&state, &headers)?;

    let mut state = state.lock().unwrap();
    let coins = state.coins.unwrap_or(0).saturating_sub(50);
    state.coins = Some(coins);
    Ok(Json(json!({ "success": true, "coins_left": coins, "multiplier": 2.0 })))
}

async fn profile(State(state): State<Shared>, headers: HeaderMap) -> ApiResult {
    log(&state, "GET /api/profile/");
    authorize(&state, &headers)?;

    let state = state.lock().unwrap();
    Ok(Json(json!({
        "id": 1,
        "username": "kong",
        "email": EMAIL,
        "role": state.role,
        "score": state.score,
        "coins": state.coins,
        "games_played": 3,
        "accuracy": 66.7,
        "recent_games": [],
    })))
}

async fn history(State(state): State<Shared>, headers: HeaderMap) -> ApiResult {
    log(&state, "GET /api/history/");
    authorize(&state, &headers)?;

    Ok(Json(json!([{
        "puzzle_id": "puzzle-1",
        "player_answer": "42",
        "is_correct": true,
        "points_earned": 20,
        "time_taken": 12,
        "created_at": "2026-10-16T09:00:12Z",
    }])))
}

async fn leaderboard(State(state): State<Shared>, headers: HeaderMap) -> ApiResult {
    log(&state, "GET /api/leaderboard/");
    authorize(&state, &headers)?;

    Ok(Json(json!([
        { "username": "dk", "score": 300, "rank": 2 },
        { "username": "kong", "score": 450, "rank": 1, "games": 30, "accuracy": 90.0 },
        { "username": "diddy", "score": 120, "rank": 3 },
    ])))
}

async fn admin_players(State(state): State<Shared>, headers: HeaderMap) -> ApiResult {
    log(&state, "GET /api/admin/players/");
    authorize(&state, &headers)?;

    Ok(Json(json!([
        { "id": 2, "username": "dk", "email": "dk@example.com", "score": 300 },
        { "id": 3, "username": "diddy", "email": "diddy@example.com", "score": 120 },
    ])))
}

async fn admin_delete_player(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> ApiResult {
    log(&state, format!("DELETE /api/admin/players/{}/delete/", id));
    authorize(&state, &headers)?;

    state.lock().unwrap().deleted_players.push(id);
    Ok(Json(json!({ "message": "Player deleted" })))
}

async fn admin_stats(State(state): State<Shared>, headers: HeaderMap) -> ApiResult {
    log(&state, "GET /api/admin/stats/");
    authorize(&state, &headers)?;

    Ok(Json(json!({
        "total_players": 2,
        "total_games": 40,
        "total_correct_answers": 25,
        "overall_accuracy": 62.5,
        "daily_stats": [
            { "date": "2026-10-15", "games": 12, "correct": 8, "accuracy": 66.7 },
        ],
    })))
}

async fn admin_create_puzzle(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> ApiResult {
    log(&state, "POST /api/admin/puzzles/");
    authorize(&state, &headers)?;

    Ok(Json(json!({
        "id": 99,
        "image_url": body["image_url"],
        "solution": body["solution"],
        "difficulty": body["difficulty"],
    })))
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

pub fn session_with(
    access: &str,
    refresh: &str,
    role: UserRole,
    coins: u32,
    score: i64,
) -> SharedSession {
    SharedSession::from(PlayerSession {
        tokens: Some(AuthTokens {
            access: access.to_string(),
            refresh: refresh.to_string(),
        }),
        user: Some(UserRecord {
            id: 1,
            username: "kong".to_string(),
            email: EMAIL.to_string(),
            role,
            score,
            coins,
        }),
    })
}

pub fn player_session(coins: u32, score: i64) -> SharedSession {
    session_with("access-1", "refresh-1", UserRole::Player, coins, score)
}

// ---------------------------------------------------------------------------
// Round controller doubles
// ---------------------------------------------------------------------------

/// Wall clock the test moves by hand.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(Utc::now()),
        })
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Timer cadences long enough that no timer fires during a real-time test;
/// such tests drive the countdown with `RoundController::tick`.
pub fn manual_settings() -> GameSettings {
    GameSettings {
        tick_interval_ms: 3_600_000,
        freeze_poll_interval_ms: 3_600_000,
        shake_duration_ms: 3_600_000,
    }
}

pub fn question(puzzle_id: &str, difficulty: Difficulty) -> Question {
    Question {
        puzzle_id: puzzle_id.to_string(),
        image_url: format!("https://marcconrad.com/uob/banana/{}.png", puzzle_id),
        difficulty,
        points_value: 10,
        time_limit: difficulty.time_limit_seconds(),
        created_at: Utc::now(),
    }
}

pub fn answer_response(correct: bool, total_score: i64, total_coins: u32) -> SubmitAnswerResponse {
    SubmitAnswerResponse {
        correct,
        points_earned: if correct { 20 } else { 0 },
        coins_earned: if correct { 5 } else { 0 },
        total_score,
        total_coins,
        time_taken: None,
        multiplier: None,
        speed_bonus: None,
    }
}

pub fn freeze_response(coins_left: u32, active_until: DateTime<Utc>) -> FreezeTimerResponse {
    FreezeTimerResponse {
        success: true,
        coins_left,
        active_until,
        freeze_seconds: Some(5),
        coins_spent: Some(20),
    }
}

pub fn double_points_response(coins_left: u32) -> DoublePointsResponse {
    DoublePointsResponse {
        success: true,
        coins_left,
        multiplier: Some(2.0),
        coins_spent: Some(50),
        active_for_next: Some(true),
    }
}

/// `GameApi` answering from per-call queues.
///
/// With an empty question queue it serves `puzzle-N` at the requested
/// difficulty. Answers can be held back with [`hold_answers`] until
/// [`release_answer`] is called.
///
/// [`hold_answers`]: ScriptedGameApi::hold_answers
/// [`release_answer`]: ScriptedGameApi::release_answer
#[derive(Default)]
pub struct ScriptedGameApi {
    questions: Mutex<VecDeque<Result<Question, ClientError>>>,
    answers: Mutex<VecDeque<Result<SubmitAnswerResponse, ClientError>>>,
    freezes: Mutex<VecDeque<Result<FreezeTimerResponse, ClientError>>>,
    doubles: Mutex<VecDeque<Result<DoublePointsResponse, ClientError>>>,
    answer_gate: Mutex<Option<Arc<Notify>>>,
    pub question_calls: AtomicUsize,
    pub freeze_calls: AtomicUsize,
    pub double_calls: AtomicUsize,
    pub answer_requests: Mutex<Vec<SubmitAnswerRequest>>,
    pub freeze_requests: Mutex<Vec<FreezeTimerRequest>>,
}

impl ScriptedGameApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_question(&self, result: Result<Question, ClientError>) {
        self.questions.lock().unwrap().push_back(result);
    }

    pub fn push_answer(&self, result: Result<SubmitAnswerResponse, ClientError>) {
        self.answers.lock().unwrap().push_back(result);
    }

    pub fn push_freeze(&self, result: Result<FreezeTimerResponse, ClientError>) {
        self.freezes.lock().unwrap().push_back(result);
    }

    pub fn push_double(&self, result: Result<DoublePointsResponse, ClientError>) {
        self.doubles.lock().unwrap().push_back(result);
    }

    pub fn hold_answers(&self) {
        *self.answer_gate.lock().unwrap() = Some(Arc::new(Notify::new()));
    }

    pub fn release_answer(&self) {
        if let Some(gate) = self.answer_gate.lock().unwrap().as_ref() {
            gate.notify_one();
        }
    }

    pub fn questions_served(&self) -> usize {
        self.question_calls.load(Ordering::SeqCst)
    }

    pub fn answers_sent(&self) -> usize {
        self.answer_requests.lock().unwrap().len()
    }
}

#[async_trait]
impl GameApi for ScriptedGameApi {
    async fn fetch_question(&self, difficulty: Difficulty) -> Result<Question, ClientError> {
        let n = self.question_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let scripted = self.questions.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(question(&format!("puzzle-{}", n), difficulty)))
    }

    async fn submit_answer(
        &self,
        req: SubmitAnswerRequest,
    ) -> Result<SubmitAnswerResponse, ClientError> {
        self.answer_requests.lock().unwrap().push(req);

        let gate = self.answer_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Network("no scripted answer".into())))
    }

    async fn freeze_timer(
        &self,
        req: FreezeTimerRequest,
    ) -> Result<FreezeTimerResponse, ClientError> {
        self.freeze_calls.fetch_add(1, Ordering::SeqCst);
        self.freeze_requests.lock().unwrap().push(req);
        self.freezes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Network("no scripted freeze".into())))
    }

    async fn double_points(
        &self,
        _req: DoublePointsRequest,
    ) -> Result<DoublePointsResponse, ClientError> {
        self.double_calls.fetch_add(1, Ordering::SeqCst);
        self.doubles
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::Network("no scripted double points".into())))
    }
}
