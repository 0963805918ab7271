//! Client view of the active timer.
//!
//! The server only stores a start instant. Elapsed time is always recomputed
//! from it, so reloads, closed tabs and other devices agree without any
//! periodic writes. Pausing is purely local: the stored timer keeps running
//! and resuming rewrites the local start so the shown elapsed time continues
//! where it stopped.
//!
//! The server measures a stopped timer with the same transitions: a
//! client-reported elapsed time is applied as a pause before `finish`.
//! `resume` is only driven by the dashboard and is kept here so both sides
//! share one definition of the adjusted start.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::ActiveTimer;

/// Whole seconds between `start` and `now`, never negative.
pub fn elapsed_seconds(start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - start).num_seconds().max(0)
}

/// Start instant that makes `elapsed_at_pause` seconds appear elapsed at `now`.
pub fn resume_start(now: DateTime<Utc>, elapsed_at_pause: i64) -> DateTime<Utc> {
    now - Duration::seconds(elapsed_at_pause.max(0))
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
}

/// Local stopwatch state layered over the persisted timer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerView {
    pub status: TimerStatus,
    pub start_time: Option<DateTime<Utc>>,
    /// Frozen elapsed seconds while paused.
    pub paused_elapsed: i64,
}

/// What a finished local timer should be recorded as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration: i64,
}

impl Default for TimerView {
    fn default() -> Self {
        Self {
            status: TimerStatus::Idle,
            start_time: None,
            paused_elapsed: 0,
        }
    }
}

impl TimerView {
    /// Rebuild local state from the stored timer, if any.
    pub fn restore(active: Option<&ActiveTimer>) -> Self {
        match active {
            Some(timer) => Self {
                status: TimerStatus::Running,
                start_time: Some(timer.start_time),
                paused_elapsed: 0,
            },
            None => Self::default(),
        }
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> i64 {
        match (self.status, self.start_time) {
            (TimerStatus::Running, Some(start)) => elapsed_seconds(start, now),
            (TimerStatus::Paused, _) => self.paused_elapsed,
            _ => 0,
        }
    }

    pub fn pause(&mut self, now: DateTime<Utc>) {
        if self.status == TimerStatus::Running {
            self.paused_elapsed = self.elapsed(now);
            self.status = TimerStatus::Paused;
        }
    }

    /// Resume counting. The adjusted start is what a client persists if it
    /// restarts the stored timer from here.
    #[allow(dead_code)]
    pub fn resume(&mut self, now: DateTime<Utc>) {
        if self.status == TimerStatus::Paused {
            self.start_time = Some(resume_start(now, self.paused_elapsed));
            self.paused_elapsed = 0;
            self.status = TimerStatus::Running;
        }
    }

    /// Stop and reset. Yields a draft only when something was measured.
    pub fn finish(&mut self, now: DateTime<Utc>) -> Option<EntryDraft> {
        let duration = self.elapsed(now);
        let draft = match self.start_time {
            Some(start_time) if duration > 0 => Some(EntryDraft {
                start_time,
                end_time: now,
                duration,
            }),
            _ => None,
        };
        *self = Self::default();
        draft
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        "2026-05-04T09:00:00Z".parse().unwrap()
    }

    fn stored(start: DateTime<Utc>) -> ActiveTimer {
        ActiveTimer {
            id: "t1".into(),
            user_id: "u1".into(),
            category_id: "c1".into(),
            tag_id: None,
            description: String::new(),
            start_time: start,
        }
    }

    #[test]
    fn test_restore_after_delay_recomputes_elapsed() {
        let timer = stored(t0());
        let view = TimerView::restore(Some(&timer));
        let later = t0() + Duration::seconds(4321);
        assert_eq!(view.status, TimerStatus::Running);
        assert_eq!(view.elapsed(later), 4321);
    }

    #[test]
    fn test_restore_without_timer_is_idle() {
        let view = TimerView::restore(None);
        assert_eq!(view.status, TimerStatus::Idle);
        assert_eq!(view.elapsed(t0()), 0);
    }

    #[test]
    fn test_pause_freezes_and_resume_preserves_elapsed() {
        let mut view = TimerView::restore(Some(&stored(t0())));
        view.pause(t0() + Duration::seconds(100));
        assert_eq!(view.elapsed(t0() + Duration::seconds(500)), 100);

        let resumed_at = t0() + Duration::seconds(600);
        view.resume(resumed_at);
        assert_eq!(
            view.start_time,
            Some(resumed_at - Duration::seconds(100))
        );
        assert_eq!(view.elapsed(resumed_at + Duration::seconds(20)), 120);
    }

    #[test]
    fn test_finish_produces_draft_only_when_elapsed() {
        let mut view = TimerView::restore(Some(&stored(t0())));
        let end = t0() + Duration::seconds(125);
        let draft = view.finish(end).unwrap();
        assert_eq!(
            draft,
            EntryDraft {
                start_time: t0(),
                end_time: end,
                duration: 125
            }
        );
        assert_eq!(view.status, TimerStatus::Idle);

        let mut instant = TimerView::restore(Some(&stored(t0())));
        assert!(instant.finish(t0()).is_none());
    }

    #[test]
    fn test_finish_while_paused_records_paused_elapsed() {
        let mut view = TimerView::restore(Some(&stored(t0())));
        view.pause(t0() + Duration::seconds(90));

        let end = t0() + Duration::seconds(3600);
        let draft = view.finish(end).unwrap();
        assert_eq!(draft.duration, 90);
        assert_eq!(draft.start_time, t0());
        assert_eq!(draft.end_time, end);
    }

    #[test]
    fn test_elapsed_never_negative() {
        assert_eq!(elapsed_seconds(t0(), t0() - Duration::seconds(5)), 0);
        assert_eq!(resume_start(t0(), -10), t0());
    }
}
