pub mod events;
pub mod round;
mod timers;

pub use events::{Dispatch, Notification, NotificationLevel, RoundEvent, RoundPhase};
pub use round::{Round, RoundController};
