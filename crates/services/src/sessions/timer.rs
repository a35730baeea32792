use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use quiz_core::Clock;
use quiz_core::time::elapsed_whole_secs;

//
// ─── COUNTDOWN ─────────────────────────────────────────────────────────────────
//

/// How close a countdown is to running out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Calm,
    Warning,
    Critical,
}

impl Urgency {
    pub const WARNING_SECS: u32 = 60;
    pub const CRITICAL_SECS: u32 = 30;

    #[must_use]
    pub fn for_remaining(remaining_secs: u32) -> Self {
        if remaining_secs <= Self::CRITICAL_SECS {
            Urgency::Critical
        } else if remaining_secs <= Self::WARNING_SECS {
            Urgency::Warning
        } else {
            Urgency::Calm
        }
    }
}

/// Remaining-time arithmetic for a time-limited session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    started_at: DateTime<Utc>,
    limit_secs: u32,
}

impl Countdown {
    #[must_use]
    pub fn new(started_at: DateTime<Utc>, limit_secs: u32) -> Self {
        Self {
            started_at,
            limit_secs,
        }
    }

    #[must_use]
    pub fn limit_secs(&self) -> u32 {
        self.limit_secs
    }

    /// Whole seconds left at `now`, never below zero.
    #[must_use]
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u32 {
        let elapsed = elapsed_whole_secs(self.started_at, now);
        let remaining = u64::from(self.limit_secs).saturating_sub(elapsed);
        u32::try_from(remaining).unwrap_or(self.limit_secs)
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.remaining_secs(now) == 0
    }

    #[must_use]
    pub fn urgency(&self, now: DateTime<Utc>) -> Urgency {
        Urgency::for_remaining(self.remaining_secs(now))
    }
}

/// Formats seconds as `m:ss`.
#[must_use]
pub fn format_clock(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

//
// ─── TIMER TASK ────────────────────────────────────────────────────────────────
//

/// Notifications from a running [`SessionTimer`].
///
/// `attempt` identifies the session attempt the timer was started for, so a
/// receiver can drop events that belong to a superseded attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Tick { attempt: u32, remaining_secs: u32 },
    Expired { attempt: u32 },
}

impl TimerEvent {
    #[must_use]
    pub fn attempt(&self) -> u32 {
        match self {
            TimerEvent::Tick { attempt, .. } | TimerEvent::Expired { attempt } => *attempt,
        }
    }
}

/// Periodic notifier for one session attempt.
///
/// Emits a `Tick` per period and a single `Expired` once the countdown runs out,
/// then stops. Dropping the timer aborts the task.
#[derive(Debug)]
pub struct SessionTimer {
    attempt: u32,
    handle: JoinHandle<()>,
}

impl SessionTimer {
    /// Start ticking. Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(
        countdown: Countdown,
        clock: Clock,
        attempt: u32,
        period: Duration,
        events: mpsc::UnboundedSender<TimerEvent>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let remaining_secs = countdown.remaining_secs(clock.now());
                if remaining_secs == 0 {
                    tracing::debug!(attempt, "session timer expired");
                    let _ = events.send(TimerEvent::Expired { attempt });
                    break;
                }
                if events
                    .send(TimerEvent::Tick {
                        attempt,
                        remaining_secs,
                    })
                    .is_err()
                {
                    break;
                }
            }
        });
        Self { attempt, handle }
    }

    #[must_use]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop the timer. No further events are sent.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use quiz_core::time::fixed_now;

    #[test]
    fn countdown_counts_whole_seconds_and_floors_at_zero() {
        let countdown = Countdown::new(fixed_now(), 60);
        assert_eq!(countdown.remaining_secs(fixed_now()), 60);
        assert_eq!(
            countdown.remaining_secs(fixed_now() + ChronoDuration::milliseconds(1_999)),
            59
        );
        assert!(!countdown.is_expired(fixed_now() + ChronoDuration::seconds(59)));
        assert!(countdown.is_expired(fixed_now() + ChronoDuration::seconds(60)));
        assert_eq!(countdown.remaining_secs(fixed_now() + ChronoDuration::hours(2)), 0);
    }

    #[test]
    fn urgency_thresholds() {
        assert_eq!(Urgency::for_remaining(61), Urgency::Calm);
        assert_eq!(Urgency::for_remaining(60), Urgency::Warning);
        assert_eq!(Urgency::for_remaining(31), Urgency::Warning);
        assert_eq!(Urgency::for_remaining(30), Urgency::Critical);
        assert_eq!(Urgency::for_remaining(0), Urgency::Critical);
    }

    #[test]
    fn formats_minutes_and_padded_seconds() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(65), "1:05");
        assert_eq!(format_clock(600), "10:00");
    }

    #[tokio::test]
    async fn timer_ticks_with_remaining_time() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let clock = Clock::fixed(fixed_now() + ChronoDuration::seconds(10));
        let timer = SessionTimer::spawn(
            Countdown::new(fixed_now(), 60),
            clock,
            1,
            Duration::from_millis(5),
            tx,
        );

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            TimerEvent::Tick {
                attempt: 1,
                remaining_secs: 50
            }
        );
        timer.cancel();
    }

    #[tokio::test]
    async fn timer_emits_single_expiry_then_stops() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let clock = Clock::fixed(fixed_now() + ChronoDuration::seconds(61));
        let _timer = SessionTimer::spawn(
            Countdown::new(fixed_now(), 60),
            clock,
            4,
            Duration::from_millis(5),
            tx,
        );

        assert_eq!(rx.recv().await, Some(TimerEvent::Expired { attempt: 4 }));
        assert_eq!(rx.recv().await, None);
    }
}
