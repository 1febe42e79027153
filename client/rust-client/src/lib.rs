pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod metrics;
pub mod models;
pub mod services;
pub mod session;
pub mod utils;

pub use config::Config;
pub use controller::RoundController;
pub use error::ClientError;
pub use services::AppState;
pub use session::SharedSession;
