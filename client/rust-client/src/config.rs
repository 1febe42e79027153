use std::env;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: Url,
    pub request_timeout_ms: u64,
    pub game: GameSettings,
    pub session_file: Option<PathBuf>,
}

/// Timer cadences used by the round controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSettings {
    pub tick_interval_ms: u64,
    pub freeze_poll_interval_ms: u64,
    pub shake_duration_ms: u64,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            freeze_poll_interval_ms: 250,
            shake_duration_ms: 500,
        }
    }
}

impl GameSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn freeze_poll_interval(&self) -> Duration {
        Duration::from_millis(self.freeze_poll_interval_ms)
    }

    pub fn shake_duration(&self) -> Duration {
        Duration::from_millis(self.shake_duration_ms)
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // config/*.toml first, APP_ prefixed environment overrides on top
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", app_env)).required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let base_url = settings
            .get_string("api.base_url")
            .or_else(|_| env::var("API_BASE_URL"))
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());
        let api_base_url = parse_base_url(&base_url)?;

        let defaults = GameSettings::default();
        let request_timeout_ms = read_millis(&settings, "api.request_timeout_ms", 10_000)?;
        let game = GameSettings {
            tick_interval_ms: read_millis(
                &settings,
                "game.tick_interval_ms",
                defaults.tick_interval_ms,
            )?,
            freeze_poll_interval_ms: read_millis(
                &settings,
                "game.freeze_poll_interval_ms",
                defaults.freeze_poll_interval_ms,
            )?,
            shake_duration_ms: read_millis(
                &settings,
                "game.shake_duration_ms",
                defaults.shake_duration_ms,
            )?,
        };

        let session_file = settings
            .get_string("session.file")
            .or_else(|_| env::var("SESSION_FILE"))
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        tracing::debug!(
            "Configuration loaded: env={}, api={}, session_file={:?}",
            app_env,
            api_base_url,
            session_file
        );

        Ok(Config {
            api_base_url,
            request_timeout_ms,
            game,
            session_file,
        })
    }

    /// Defaults pointed at `base_url`, without reading the environment.
    pub fn with_base_url(base_url: &str) -> Result<Self, config::ConfigError> {
        Ok(Config {
            api_base_url: parse_base_url(base_url)?,
            request_timeout_ms: 10_000,
            game: GameSettings::default(),
            session_file: None,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, config::ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| config::ConfigError::Message(format!("Invalid api.base_url {}: {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(config::ConfigError::Message(format!(
            "Invalid api.base_url scheme: {}. Must be http or https.",
            url.scheme()
        )));
    }

    Ok(url)
}

fn read_millis(
    settings: &config::Config,
    key: &str,
    default: u64,
) -> Result<u64, config::ConfigError> {
    match settings.get_int(key) {
        Ok(value) if value > 0 => Ok(value as u64),
        Ok(value) => Err(config::ConfigError::Message(format!(
            "{} must be positive, got {}",
            key, value
        ))),
        Err(config::ConfigError::NotFound(_)) => Ok(default),
        Err(e) => Err(e),
    }
}
