use std::str::FromStr;

use crate::error::ClientError;
use crate::models::admin::PuzzleData;
use crate::models::user::{LoginRequest, RegisterRequest};
use crate::models::Difficulty;
use crate::session::SharedSession;

pub const HELP: &str = "\
Commands:
  /register <username> <email> <password> <confirm>
  /login <username> <password>
  /otp <6-digit code>
  /logout
  /play easy|medium|hard      start a game
  /freeze 5|10                freeze the timer (20 / 35 coins)
  /double                     double points on the next correct answer (50 coins)
  /status                     current round, timer and coins
  /leave                      back to difficulty selection
  /profile, /history, /leaderboard
  /admin [players|stats|delete <id>|puzzle <url> <solution> <difficulty>|delete-puzzle <id>]
  /metrics, /help, /quit
Any other line during a round is your answer.";

#[derive(Debug, Clone)]
pub enum AdminCommand {
    Dashboard,
    Players,
    Stats,
    DeletePlayer(u64),
    CreatePuzzle(PuzzleData),
    DeletePuzzle(u64),
}

#[derive(Debug, Clone)]
pub enum Command {
    Register(RegisterRequest),
    Login(LoginRequest),
    Otp(String),
    Logout,
    Play(Difficulty),
    Freeze(u32),
    Double,
    Status,
    Leave,
    Profile,
    History,
    Leaderboard,
    Admin(AdminCommand),
    Metrics,
    Help,
    Quit,
    Answer(String),
}

/// Who may run a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Anyone,
    Authenticated,
    /// Authenticated, non-admin.
    PlayerOnly,
    Admin,
}

impl Command {
    pub fn access(&self) -> Access {
        match self {
            Command::Register(_)
            | Command::Login(_)
            | Command::Otp(_)
            | Command::Metrics
            | Command::Help
            | Command::Quit => Access::Anyone,
            Command::Profile => Access::PlayerOnly,
            Command::Admin(_) => Access::Admin,
            _ => Access::Authenticated,
        }
    }

    pub fn check_access(&self, session: &SharedSession) -> Result<(), ClientError> {
        let access = self.access();
        if access == Access::Anyone {
            return Ok(());
        }
        if !session.is_authenticated() {
            return Err(ClientError::NotAuthenticated);
        }

        match access {
            Access::PlayerOnly if session.is_admin() => Err(ClientError::Forbidden),
            Access::Admin if !session.is_admin() => Err(ClientError::Forbidden),
            _ => Ok(()),
        }
    }
}

impl FromStr for Command {
    type Err = ClientError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ClientError::validation("Empty input"));
        }

        let Some(rest) = line.strip_prefix('/') else {
            return Ok(Command::Answer(line.to_string()));
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default().to_ascii_lowercase();
        let args: Vec<&str> = parts.collect();

        let command = match (name.as_str(), args.as_slice()) {
            ("register", [username, email, password, confirmation]) => {
                Command::Register(RegisterRequest {
                    username: username.to_string(),
                    email: email.to_string(),
                    password: password.to_string(),
                    password_confirmation: confirmation.to_string(),
                })
            }
            ("register", _) => {
                return Err(usage("/register <username> <email> <password> <confirm>"))
            }
            ("login", [username, password]) => Command::Login(LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            }),
            ("login", _) => return Err(usage("/login <username> <password>")),
            ("otp", [code]) => Command::Otp(code.to_string()),
            ("otp", _) => return Err(usage("/otp <6-digit code>")),
            ("logout", []) => Command::Logout,
            ("play", [difficulty]) => Command::Play(difficulty.parse()?),
            ("play", []) => Command::Play(Difficulty::default()),
            ("freeze", [seconds]) => Command::Freeze(
                seconds
                    .parse()
                    .map_err(|_| usage("/freeze 5|10"))?,
            ),
            ("freeze", _) => return Err(usage("/freeze 5|10")),
            ("double", []) => Command::Double,
            ("status", []) => Command::Status,
            ("leave", []) => Command::Leave,
            ("profile", []) => Command::Profile,
            ("history", []) => Command::History,
            ("leaderboard", []) => Command::Leaderboard,
            ("admin", args) => Command::Admin(parse_admin(args)?),
            ("metrics", []) => Command::Metrics,
            ("help", _) => Command::Help,
            ("quit", []) | ("exit", []) => Command::Quit,
            (other, _) => {
                return Err(ClientError::validation(format!(
                    "Unknown command '/{}', try /help",
                    other
                )))
            }
        };

        Ok(command)
    }
}

fn parse_admin(args: &[&str]) -> Result<AdminCommand, ClientError> {
    let command = match args {
        [] => AdminCommand::Dashboard,
        ["players"] => AdminCommand::Players,
        ["stats"] => AdminCommand::Stats,
        ["delete", id] => AdminCommand::DeletePlayer(parse_id(id)?),
        ["puzzle", image_url, solution, difficulty] => AdminCommand::CreatePuzzle(PuzzleData {
            image_url: image_url.to_string(),
            solution: solution.to_string(),
            difficulty: difficulty.parse()?,
        }),
        ["delete-puzzle", id] => AdminCommand::DeletePuzzle(parse_id(id)?),
        _ => {
            return Err(usage(
                "/admin [players|stats|delete <id>|puzzle <url> <solution> <difficulty>|delete-puzzle <id>]",
            ))
        }
    };
    Ok(command)
}

fn parse_id(raw: &str) -> Result<u64, ClientError> {
    raw.parse()
        .map_err(|_| ClientError::validation(format!("'{}' is not a valid id", raw)))
}

fn usage(text: &str) -> ClientError {
    ClientError::validation(format!("Usage: {}", text))
}
