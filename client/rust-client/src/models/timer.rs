use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TimerUrgency {
    Frozen,
    Rush,
    Warning,
    Normal,
}

/// Countdown state of the active round, for rendering.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct TimerSnapshot {
    pub remaining_seconds: u32,
    pub elapsed_seconds: u32,
    pub total_seconds: u32,
    pub frozen: bool,
}

impl TimerSnapshot {
    pub fn new(total_seconds: u32, remaining_seconds: u32, frozen: bool) -> Self {
        let remaining_seconds = remaining_seconds.min(total_seconds);
        Self {
            remaining_seconds,
            elapsed_seconds: total_seconds - remaining_seconds,
            total_seconds,
            frozen,
        }
    }

    pub fn progress_percent(&self) -> u32 {
        if self.total_seconds == 0 {
            return 0;
        }
        (self.remaining_seconds as f64 / self.total_seconds as f64 * 100.0).round() as u32
    }

    pub fn urgency(&self) -> TimerUrgency {
        if self.frozen {
            TimerUrgency::Frozen
        } else if self.remaining_seconds <= 5 {
            TimerUrgency::Rush
        } else if self.remaining_seconds <= 15 {
            TimerUrgency::Warning
        } else {
            TimerUrgency::Normal
        }
    }

    pub fn render(&self) -> String {
        match self.urgency() {
            TimerUrgency::Frozen => format!("FROZEN at {}s", self.remaining_seconds),
            TimerUrgency::Rush => format!("RUSH! {}s left", self.remaining_seconds),
            _ => format!(
                "{}s left ({}%)",
                self.remaining_seconds,
                self.progress_percent()
            ),
        }
    }
}
