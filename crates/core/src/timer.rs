//! Second-granularity countdown driven by an external tick source.
//!
//! The timer owns no thread or task: whoever schedules ticks calls
//! [`CountdownTimer::tick`] once per second and reacts to the returned event.

use serde::{Deserialize, Serialize};

/// One second of countdown.
pub const TICK_SECONDS: u32 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    #[default]
    Idle,
    Running,
    Paused,
    Expired,
    Cancelled,
}

/// What a tick produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Countdown advanced; `remaining` seconds are left.
    Tick { remaining: u32 },
    /// Countdown reached zero. Emitted at most once per `start`.
    Expired,
    /// Timer not running; nothing happened.
    Idle,
}

/// Pausable countdown with an expiry that fires exactly once per start.
///
/// Every `start`, `reset` and `cancel` bumps the generation so that tick
/// sources scheduled for an earlier run can detect they are stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownTimer {
    duration: u32,
    remaining: u32,
    status: TimerStatus,
    generation: u64,
}

impl CountdownTimer {
    /// An idle timer showing the full `duration`.
    #[must_use]
    pub fn new(duration: u32) -> Self {
        Self {
            duration,
            remaining: duration,
            status: TimerStatus::Idle,
            generation: 0,
        }
    }

    /// Start counting down from the full duration.
    pub fn start(&mut self, duration: u32) -> u64 {
        self.start_from(duration, duration)
    }

    /// Start counting down from `remaining` (clamped to `duration`).
    pub fn start_from(&mut self, duration: u32, remaining: u32) -> u64 {
        self.duration = duration;
        self.remaining = remaining.min(duration);
        self.status = TimerStatus::Running;
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }

    /// Freeze the remaining time. Returns true if the timer was running.
    pub fn pause(&mut self) -> bool {
        if self.status == TimerStatus::Running {
            self.status = TimerStatus::Paused;
            true
        } else {
            false
        }
    }

    /// Continue from the frozen value. Returns true if the timer was paused.
    pub fn resume(&mut self) -> bool {
        if self.status == TimerStatus::Paused {
            self.status = TimerStatus::Running;
            true
        } else {
            false
        }
    }

    /// Stop for good: no further `Tick` or `Expired` until the next start.
    pub fn cancel(&mut self) {
        if matches!(self.status, TimerStatus::Running | TimerStatus::Paused) {
            self.status = TimerStatus::Cancelled;
        }
        self.generation = self.generation.wrapping_add(1);
    }

    /// Back to idle at the full duration.
    pub fn reset(&mut self, duration: u32) {
        self.duration = duration;
        self.remaining = duration;
        self.status = TimerStatus::Idle;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Advance one second.
    pub fn tick(&mut self) -> TimerEvent {
        if self.status != TimerStatus::Running {
            return TimerEvent::Idle;
        }

        self.remaining = self.remaining.saturating_sub(TICK_SECONDS);
        if self.remaining == 0 {
            self.status = TimerStatus::Expired;
            return TimerEvent::Expired;
        }
        TimerEvent::Tick {
            remaining: self.remaining,
        }
    }

    #[must_use]
    pub fn duration(&self) -> u32 {
        self.duration
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Seconds consumed so far.
    #[must_use]
    pub fn elapsed(&self) -> u32 {
        self.duration.saturating_sub(self.remaining)
    }

    #[must_use]
    pub fn status(&self) -> TimerStatus {
        self.status
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_once_after_duration_ticks() {
        let mut timer = CountdownTimer::new(5);
        timer.start(5);

        let mut events = Vec::new();
        for _ in 0..7 {
            events.push(timer.tick());
        }

        assert_eq!(
            events,
            vec![
                TimerEvent::Tick { remaining: 4 },
                TimerEvent::Tick { remaining: 3 },
                TimerEvent::Tick { remaining: 2 },
                TimerEvent::Tick { remaining: 1 },
                TimerEvent::Expired,
                TimerEvent::Idle,
                TimerEvent::Idle,
            ]
        );
        assert_eq!(timer.remaining(), 0);
        assert_eq!(timer.status(), TimerStatus::Expired);
    }

    #[test]
    fn pause_freezes_and_resume_continues() {
        let mut timer = CountdownTimer::new(10);
        timer.start(10);
        timer.tick();
        assert!(timer.pause());
        assert_eq!(timer.tick(), TimerEvent::Idle);
        assert_eq!(timer.remaining(), 9);

        assert!(timer.resume());
        assert_eq!(timer.tick(), TimerEvent::Tick { remaining: 8 });
    }

    #[test]
    fn cancel_silences_timer_and_bumps_generation() {
        let mut timer = CountdownTimer::new(2);
        let generation = timer.start(2);
        timer.cancel();
        assert_ne!(timer.generation(), generation);
        assert_eq!(timer.tick(), TimerEvent::Idle);
        assert_eq!(timer.tick(), TimerEvent::Idle);
        assert!(!timer.resume());
    }

    #[test]
    fn start_from_resumes_partial_countdown() {
        let mut timer = CountdownTimer::new(180);
        timer.start_from(180, 120);
        assert_eq!(timer.remaining(), 120);
        assert_eq!(timer.elapsed(), 60);

        timer.start_from(60, 500);
        assert_eq!(timer.remaining(), 60);
    }

    #[test]
    fn zero_duration_expires_on_first_tick() {
        let mut timer = CountdownTimer::new(0);
        timer.start(0);
        assert_eq!(timer.tick(), TimerEvent::Expired);
        assert_eq!(timer.tick(), TimerEvent::Idle);
    }

    #[test]
    fn reset_returns_to_idle_full_duration() {
        let mut timer = CountdownTimer::new(30);
        timer.start(30);
        timer.tick();
        timer.reset(30);
        assert_eq!(timer.status(), TimerStatus::Idle);
        assert_eq!(timer.remaining(), 30);
        assert_eq!(timer.tick(), TimerEvent::Idle);
    }
}
