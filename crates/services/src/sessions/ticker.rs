use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use exam_core::model::SessionMode;
use exam_core::timer::TICK_SECONDS;

use super::service::SessionController;
use super::workflow::SessionPersistence;

/// Owns the once-per-second tick task of a live session. Dropping the guard
/// aborts the task.
#[derive(Debug)]
pub struct TickerGuard {
    handle: JoinHandle<()>,
    generation: u64,
}

impl TickerGuard {
    /// Timer generation this ticker was started for.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for TickerGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Tick `controller` every second for as long as its timer generation stays
/// `generation` and the attempt is in progress.
pub(crate) fn spawn_ticker(
    controller: Arc<Mutex<SessionController>>,
    persistence: SessionPersistence,
    generation: u64,
) -> TickerGuard {
    let period = Duration::from_secs(u64::from(TICK_SECONDS));
    let handle = tokio::spawn(async move {
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;

            let mut guard = controller.lock().await;
            if guard.timer_generation() != generation || guard.mode() != SessionMode::InProgress {
                tracing::debug!(generation, "ticker is stale, stopping");
                break;
            }
            let effects = guard.tick();
            let finished = guard.mode() != SessionMode::InProgress;
            persistence.apply(&mut guard, effects).await;
            if finished {
                break;
            }
        }
    });
    TickerGuard { handle, generation }
}
