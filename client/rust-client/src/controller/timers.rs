use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::events::RoundEvent;

/// Timer tasks of the current round. At most one of `tick` and `freeze_poll`
/// runs at a time; every task is aborted when the round goes away.
#[derive(Default)]
pub(crate) struct RoundTimers {
    tick: Option<JoinHandle<()>>,
    freeze_poll: Option<JoinHandle<()>>,
    shake: Option<JoinHandle<()>>,
}

impl RoundTimers {
    pub(crate) fn start_ticking(
        &mut self,
        tx: &UnboundedSender<RoundEvent>,
        puzzle_id: &str,
        period: Duration,
    ) {
        self.stop_ticking();
        let puzzle_id = puzzle_id.to_string();
        self.tick = Some(spawn_repeating(tx.clone(), period, move || {
            RoundEvent::Tick {
                puzzle_id: puzzle_id.clone(),
            }
        }));
    }

    pub(crate) fn stop_ticking(&mut self) {
        if let Some(handle) = self.tick.take() {
            handle.abort();
        }
    }

    pub(crate) fn start_freeze_poll(
        &mut self,
        tx: &UnboundedSender<RoundEvent>,
        puzzle_id: &str,
        period: Duration,
    ) {
        self.stop_freeze_poll();
        let puzzle_id = puzzle_id.to_string();
        self.freeze_poll = Some(spawn_repeating(tx.clone(), period, move || {
            RoundEvent::FreezePoll {
                puzzle_id: puzzle_id.clone(),
            }
        }));
    }

    pub(crate) fn stop_freeze_poll(&mut self) {
        if let Some(handle) = self.freeze_poll.take() {
            handle.abort();
        }
    }

    pub(crate) fn schedule_shake_clear(
        &mut self,
        tx: &UnboundedSender<RoundEvent>,
        puzzle_id: &str,
        delay: Duration,
    ) {
        if let Some(handle) = self.shake.take() {
            handle.abort();
        }
        let tx = tx.clone();
        let puzzle_id = puzzle_id.to_string();
        self.shake = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(RoundEvent::ClearShake { puzzle_id });
        }));
    }

    #[cfg(test)]
    pub(crate) fn is_ticking(&self) -> bool {
        self.tick.is_some()
    }

    #[cfg(test)]
    pub(crate) fn is_polling_freeze(&self) -> bool {
        self.freeze_poll.is_some()
    }

    pub(crate) fn cancel_all(&mut self) {
        self.stop_ticking();
        self.stop_freeze_poll();
        if let Some(handle) = self.shake.take() {
            handle.abort();
        }
    }
}

impl Drop for RoundTimers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

fn spawn_repeating<F>(tx: UnboundedSender<RoundEvent>, period: Duration, make: F) -> JoinHandle<()>
where
    F: Fn() -> RoundEvent + Send + 'static,
{
    tokio::spawn(async move {
        // First event one full period after start, not immediately
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            if tx.send(make()).is_err() {
                break;
            }
        }
    })
}
