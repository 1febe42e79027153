use anyhow::Context;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use banana_monkey_client::commands::{AdminCommand, Command, HELP};
use banana_monkey_client::controller::{
    Dispatch, Notification, NotificationLevel, RoundController, RoundEvent, RoundPhase,
};
use banana_monkey_client::error::ClientError;
use banana_monkey_client::metrics::render_metrics;
use banana_monkey_client::models::{Difficulty, UserRole};
use banana_monkey_client::services::auth_service::OtpChallenge;
use banana_monkey_client::{AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Game output goes to stdout, logs to stderr
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "banana_monkey_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load().context("Failed to load configuration")?;
    let state = AppState::new(config).context("Failed to initialize client")?;

    Terminal::new(state).run().await
}

struct Terminal {
    state: AppState,
    controller: RoundController,
    challenge: Option<OtpChallenge>,
}

impl Terminal {
    fn new(state: AppState) -> Self {
        let controller = RoundController::new(
            Arc::new(state.game()),
            state.session.clone(),
            state.config.game.clone(),
        );
        Self {
            state,
            controller,
            challenge: None,
        }
    }

    async fn run(mut self) -> anyhow::Result<()> {
        println!("Banana Monkey");
        match self.state.session.user() {
            Some(user) if self.state.session.is_authenticated() => {
                println!("Welcome back, {}!", user.username);
                self.route_after_login(user.role).await;
            }
            _ => println!("Log in with /login <username> <password>, or /help"),
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line.context("Failed to read stdin")? else {
                        break;
                    };
                    if !self.on_line(&line).await {
                        break;
                    }
                }
                Some(event) = self.controller.next_event() => {
                    self.on_event(event);
                }
            }
        }

        self.controller.leave();
        println!("Bye!");
        Ok(())
    }

    fn on_event(&mut self, event: RoundEvent) {
        let was_authenticated = self.state.session.is_authenticated();
        let previous = self.controller.round().map(|r| r.puzzle_id.clone());
        let is_tick = matches!(event, RoundEvent::Tick { .. });

        self.controller.handle(event);
        self.print_notifications();

        let current = self.controller.round().map(|r| r.puzzle_id.clone());
        if current.is_some() && current != previous {
            self.print_round();
        } else if is_tick {
            if let Some(timer) = self.controller.timer() {
                if timer.remaining_seconds == 15 || timer.remaining_seconds <= 5 {
                    println!("  {}", timer.render());
                }
            }
        }

        if was_authenticated && !self.state.session.is_authenticated() {
            self.force_logout();
        }
    }

    /// Returns false when the player quits.
    async fn on_line(&mut self, line: &str) -> bool {
        if line.trim().is_empty() {
            return true;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                return true;
            }
        };

        if let Command::Quit = command {
            return false;
        }

        if let Err(e) = command.check_access(&self.state.session) {
            self.report(e);
            return true;
        }

        if let Err(e) = self.execute(command).await {
            self.report(e);
        }
        self.print_notifications();
        true
    }

    async fn execute(&mut self, command: Command) -> Result<(), ClientError> {
        match command {
            Command::Register(req) => {
                let registered = self.state.auth().register(req).await?;
                println!(
                    "Registered {}. Log in with /login {} <password>",
                    registered.username, registered.username
                );
            }
            Command::Login(req) => {
                let challenge = self.state.auth().login(req).await?;
                println!(
                    "OTP sent to {}. Enter it with /otp <code>",
                    challenge.email
                );
                self.challenge = Some(challenge);
            }
            Command::Otp(code) => {
                let challenge = self
                    .challenge
                    .as_ref()
                    .ok_or_else(|| ClientError::validation("Log in with /login first"))?;
                let user = self.state.auth().verify_otp(challenge, &code).await?;
                self.challenge = None;
                println!("Welcome, {}!", user.username);
                self.route_after_login(user.role).await;
            }
            Command::Logout => {
                self.controller.leave();
                self.state.auth().logout().await;
                println!("Logged out");
            }
            Command::Play(difficulty) => {
                self.controller.select_difficulty(difficulty)?;
            }
            Command::Freeze(seconds) => match self.controller.activate_freeze(seconds)? {
                Dispatch::Sent => println!("Freezing the timer..."),
                Dispatch::Ignored => println!("Timer freeze already active"),
            },
            Command::Double => match self.controller.activate_double_points()? {
                Dispatch::Sent => println!("Activating double points..."),
                Dispatch::Ignored => println!("Double points already active"),
            },
            Command::Status => self.print_status(),
            Command::Leave => {
                self.controller.leave();
                print_difficulties();
            }
            Command::Profile => {
                let profile = self.state.profile().get_profile().await?;
                println!(
                    "{} <{}> score {} coins {} | {} games, {:.1}% accuracy",
                    profile.username,
                    profile.email,
                    profile.score,
                    profile.coins,
                    profile.games_played,
                    profile.accuracy
                );
                println!("  Goal progress: {:.0}%", profile.goal_progress_percent());
                for game in &profile.recent_games {
                    println!(
                        "  {} '{}' {} ({}s)",
                        if game.is_correct { "+" } else { "-" },
                        game.player_answer,
                        game.points_earned,
                        game.time_taken
                    );
                }
            }
            Command::History => {
                let history = self.state.profile().get_history().await?;
                if history.is_empty() {
                    println!("No games played yet");
                }
                for game in history {
                    println!(
                        "  {} {} '{}' {} pts in {}s",
                        game.created_at.format("%Y-%m-%d %H:%M"),
                        if game.is_correct { "correct" } else { "wrong" },
                        game.player_answer,
                        game.points_earned,
                        game.time_taken
                    );
                }
            }
            Command::Leaderboard => {
                for entry in self.state.leaderboard().get_leaderboard().await? {
                    println!("  #{:<3} {:<20} {}", entry.rank, entry.username, entry.score);
                }
            }
            Command::Admin(admin) => self.execute_admin(admin).await?,
            Command::Metrics => match render_metrics() {
                Ok(text) => print!("{}", text),
                Err(e) => tracing::warn!("Failed to render metrics: {}", e),
            },
            Command::Help => println!("{}", HELP),
            Command::Quit => {}
            Command::Answer(text) => {
                if self.controller.phase() == RoundPhase::Idle {
                    println!("Pick a difficulty first");
                    print_difficulties();
                    return Ok(());
                }
                if self.controller.submit_answer(&text)? == Dispatch::Ignored {
                    println!("Still checking your last answer...");
                }
            }
        }
        Ok(())
    }

    async fn execute_admin(&mut self, command: AdminCommand) -> Result<(), ClientError> {
        let admin = self.state.admin();
        match command {
            AdminCommand::Dashboard => {
                let dashboard = admin.dashboard().await?;
                println!(
                    "{} players, {} games, {} correct, {:.1}% accuracy",
                    dashboard.stats.total_players,
                    dashboard.stats.total_games,
                    dashboard.stats.total_correct_answers,
                    dashboard.stats.overall_accuracy
                );
                for player in dashboard.players {
                    println!(
                        "  [{}] {:<20} {:<30} {}",
                        player.id, player.username, player.email, player.score
                    );
                }
            }
            AdminCommand::Players => {
                for player in admin.list_players().await? {
                    println!(
                        "  [{}] {:<20} {:<30} {}",
                        player.id, player.username, player.email, player.score
                    );
                }
            }
            AdminCommand::Stats => {
                let stats = admin.get_stats().await?;
                for day in stats.daily_stats {
                    println!(
                        "  {} {} games, {} correct ({:.1}%)",
                        day.date, day.games, day.correct, day.accuracy
                    );
                }
            }
            AdminCommand::DeletePlayer(id) => {
                admin.delete_player(id).await?;
                println!("Player {} deleted", id);
            }
            AdminCommand::CreatePuzzle(data) => {
                let puzzle = admin.create_puzzle(data).await?;
                println!("Puzzle {} created ({})", puzzle.id, puzzle.difficulty);
            }
            AdminCommand::DeletePuzzle(id) => {
                admin.delete_puzzle(id).await?;
                println!("Puzzle {} deleted", id);
            }
        }
        Ok(())
    }

    async fn route_after_login(&mut self, role: UserRole) {
        match role {
            UserRole::Admin => {
                if let Err(e) = self.execute_admin(AdminCommand::Dashboard).await {
                    self.report(e);
                }
            }
            UserRole::Player => print_difficulties(),
        }
    }

    fn report(&mut self, err: ClientError) {
        match err {
            ClientError::SessionExpired => self.force_logout(),
            other => println!("{}", other),
        }
    }

    fn force_logout(&mut self) {
        self.controller.leave();
        self.challenge = None;
        println!("Session expired. Log in again with /login <username> <password>");
    }

    fn print_notifications(&mut self) {
        for Notification {
            level,
            message,
            retryable,
        } in self.controller.take_notifications()
        {
            let marker = match level {
                NotificationLevel::Info => "*",
                NotificationLevel::Success => "+",
                NotificationLevel::Error => "!",
            };
            if retryable {
                println!("{} {} (try again)", marker, message);
            } else {
                println!("{} {}", marker, message);
            }
        }
    }

    fn print_round(&self) {
        let Some(round) = self.controller.round() else {
            return;
        };
        println!();
        println!(
            "[{}] {} points | {}",
            round.difficulty.label(),
            round.points_value,
            round.image_url
        );
        if let Some(timer) = self.controller.timer() {
            println!("  {}", timer.render());
        }
        println!("Type the number you see:");
    }

    fn print_status(&self) {
        let session = &self.state.session;
        let stats = self.controller.stats();
        println!(
            "Score {} | Coins {} | Correct {} Wrong {} Streak {}",
            session.score(),
            session.coins(),
            stats.correct,
            stats.wrong,
            stats.streak
        );

        match self.controller.round() {
            Some(round) => {
                println!("Round {} ({})", round.puzzle_id, self.controller.phase().as_str());
                if let Some(timer) = self.controller.timer() {
                    println!("  {}", timer.render());
                }
            }
            None => println!("No active round ({})", self.controller.phase().as_str()),
        }

        if self.controller.double_points_active() {
            println!("  Double points ready for the next correct answer");
        }
    }
}

fn print_difficulties() {
    println!("Choose a difficulty:");
    for difficulty in Difficulty::ALL {
        println!(
            "  /play {:<7} {} ({}s)",
            difficulty.as_str(),
            difficulty.label(),
            difficulty.time_limit_seconds()
        );
    }
}
