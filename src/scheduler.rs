//! Cancellable one-second ticker driving [`FocusTimer::tick`].
//!
//! The ticker is armed against a key made of the running task, the run it
//! belongs to and the countdown value. Any change to that key cancels the
//! pending deadline and arms a fresh one, so a deadline computed for
//! superseded state never ticks.
//! Callers pass `now` explicitly and decide how to wait.

use crate::model::TaskId;
use crate::timer::FocusTimer;
use std::time::{Duration, Instant};
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ArmKey {
    running: TaskId,
    run: u64,
    remaining: u64,
}

#[derive(Debug)]
struct Armed {
    key: ArmKey,
    deadline: Instant,
}

#[derive(Debug)]
pub struct Ticker {
    interval: Duration,
    armed: Option<Armed>,
}

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Ticker {
            interval,
            armed: None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Brings the ticker in line with the timer. Keeps the pending deadline if
    /// nothing relevant changed, re-arms if it did, disarms when there is
    /// nothing to count down.
    pub fn sync(&mut self, timer: &FocusTimer, now: Instant) {
        let key = match arm_key(timer) {
            Some(key) => key,
            None => {
                if self.armed.take().is_some() {
                    trace!("ticker disarmed");
                }
                return;
            }
        };
        if self.armed.as_ref().map(|a| &a.key) == Some(&key) {
            return;
        }
        trace!(remaining = key.remaining, "ticker armed");
        self.armed = Some(Armed {
            key,
            deadline: now + self.interval,
        });
    }

    /// Time left before the pending deadline, zero if already due.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.armed
            .as_ref()
            .map(|a| a.deadline.saturating_duration_since(now))
    }

    /// Ticks the timer once if the deadline has passed and still matches the
    /// timer's state, then re-arms. Returns whether a tick happened.
    pub fn fire(&mut self, timer: &mut FocusTimer, now: Instant) -> bool {
        let due = match &self.armed {
            Some(armed) => now >= armed.deadline,
            None => false,
        };
        if !due {
            self.sync(timer, now);
            return false;
        }
        let current = arm_key(timer);
        let stale = self.armed.as_ref().map(|a| &a.key) != current.as_ref();
        self.armed = None;
        if stale {
            trace!("discarding stale deadline");
            self.sync(timer, now);
            return false;
        }
        let ticked = timer.tick();
        self.sync(timer, now);
        ticked
    }

    pub fn cancel(&mut self) {
        self.armed = None;
    }
}

fn arm_key(timer: &FocusTimer) -> Option<ArmKey> {
    let running = timer.running_id()?;
    if timer.remaining_secs() == 0 {
        return None;
    }
    Some(ArmKey {
        running: running.clone(),
        run: timer.run_epoch(),
        remaining: timer.remaining_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TimeUnit;
    use crate::timer::TimerSettings;
    use pretty_assertions::assert_eq;

    const SECOND: Duration = Duration::from_secs(1);

    fn started_timer(default_secs: u64) -> FocusTimer {
        let mut timer = FocusTimer::new(TimerSettings {
            default_secs,
            ..TimerSettings::default()
        });
        timer.set_draft_text("focus");
        timer.set_draft_unit(TimeUnit::Minute);
        timer.add_task().unwrap();
        timer.start_task().unwrap();
        timer
    }

    #[test]
    fn test_idle_timer_is_not_armed() {
        let mut ticker = Ticker::new(SECOND);
        let mut timer = FocusTimer::default();
        let now = Instant::now();
        ticker.sync(&timer, now);
        assert!(!ticker.is_armed());
        assert!(!ticker.fire(&mut timer, now + SECOND * 5));
        assert_eq!(ticker.time_until_due(now), None);
    }

    #[test]
    fn test_fires_once_per_interval() {
        let mut ticker = Ticker::new(SECOND);
        let mut timer = started_timer(60);
        let start = Instant::now();
        ticker.sync(&timer, start);
        assert_eq!(ticker.time_until_due(start), Some(SECOND));

        assert!(!ticker.fire(&mut timer, start + Duration::from_millis(999)));
        assert_eq!(timer.remaining_secs(), 60);

        let mut now = start;
        for _ in 0..5 {
            now += SECOND;
            assert!(ticker.fire(&mut timer, now));
        }
        assert_eq!(timer.remaining_secs(), 55);
        assert_eq!(ticker.time_until_due(now), Some(SECOND));
    }

    #[test]
    fn test_late_fire_ticks_only_once() {
        let mut ticker = Ticker::new(SECOND);
        let mut timer = started_timer(60);
        let start = Instant::now();
        ticker.sync(&timer, start);
        assert!(ticker.fire(&mut timer, start + SECOND * 10));
        assert_eq!(timer.remaining_secs(), 59);
    }

    #[test]
    fn test_disarms_at_zero() {
        let mut ticker = Ticker::new(SECOND);
        let mut timer = started_timer(2);
        let mut now = Instant::now();
        ticker.sync(&timer, now);
        for _ in 0..2 {
            now += SECOND;
            assert!(ticker.fire(&mut timer, now));
        }
        assert_eq!(timer.remaining_secs(), 0);
        assert!(!ticker.is_armed());
        assert!(!ticker.fire(&mut timer, now + SECOND));
        assert_eq!(timer.remaining_secs(), 0);
    }

    #[test]
    fn test_stale_deadline_is_discarded() {
        let mut ticker = Ticker::new(SECOND);
        let mut timer = started_timer(60);
        let start = Instant::now();
        ticker.sync(&timer, start);

        // Editing resets the countdown and stops the task; restarting arms a
        // fresh deadline instead of inheriting the old one.
        timer.begin_edit(0).unwrap();
        timer.start_task().unwrap();
        assert!(!ticker.fire(&mut timer, start + SECOND));
        assert_eq!(timer.remaining_secs(), 60);
        assert_eq!(ticker.time_until_due(start + SECOND), Some(SECOND));
    }

    #[test]
    fn test_disarms_when_running_task_deleted() {
        let mut ticker = Ticker::new(SECOND);
        let mut timer = started_timer(60);
        let now = Instant::now();
        ticker.sync(&timer, now);
        timer.delete_task(0).unwrap();
        ticker.sync(&timer, now);
        assert!(!ticker.is_armed());
    }

    #[test]
    fn test_cancel() {
        let mut ticker = Ticker::new(SECOND);
        let mut timer = started_timer(60);
        let now = Instant::now();
        ticker.sync(&timer, now);
        ticker.cancel();
        assert!(!ticker.is_armed());
        assert!(!ticker.fire(&mut timer, now + SECOND));
        assert_eq!(timer.remaining_secs(), 60);
    }
}
