use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timer progress for one habit-day, stored as accumulated time plus an
/// optional start instant for the window currently running.
///
/// Keeping the start instant instead of a ticking counter lets a reader in
/// another process reconstruct the exact elapsed time at its own read time.
/// Both sides interpret the marker against the shared wall clock; skew
/// between writer and reader is not compensated.
///
/// Invariant: `session_start` is `Some` exactly while the timer is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMarkers {
    pub base_elapsed_secs: u64,
    pub session_start: Option<DateTime<Utc>>,
}

impl SessionMarkers {
    pub fn paused(base_elapsed_secs: u64) -> Self {
        Self {
            base_elapsed_secs,
            session_start: None,
        }
    }

    pub fn running(base_elapsed_secs: u64, session_start: DateTime<Utc>) -> Self {
        Self {
            base_elapsed_secs,
            session_start: Some(session_start),
        }
    }

    pub fn is_running(&self) -> bool {
        self.session_start.is_some()
    }

    /// Total elapsed seconds as observed at `now`. A start instant ahead of
    /// `now` contributes nothing rather than going negative.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> u64 {
        match self.session_start {
            None => self.base_elapsed_secs,
            Some(start) => {
                let live = (now - start).num_seconds().max(0) as u64;
                self.base_elapsed_secs.saturating_add(live)
            }
        }
    }

    /// Fold the live window into the accumulated base and clear the start
    /// instant. No-op when already paused, so a duplicate pause trigger
    /// cannot double-count.
    pub fn pause(&mut self, now: DateTime<Utc>) {
        if self.session_start.is_some() {
            self.base_elapsed_secs = self.elapsed_secs(now);
            self.session_start = None;
        }
    }

    /// Begin a new running window at `now`. No-op when already running; the
    /// existing start instant is never overwritten.
    pub fn resume(&mut self, now: DateTime<Utc>) {
        if self.session_start.is_none() {
            self.session_start = Some(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn paused_markers_ignore_now() {
        let markers = SessionMarkers::paused(420);
        assert!(!markers.is_running());
        assert_eq!(markers.elapsed_secs(at(0)), 420);
        assert_eq!(markers.elapsed_secs(at(99_999)), 420);
    }

    #[test]
    fn running_markers_grow_linearly_with_now() {
        let markers = SessionMarkers::running(60, at(0));
        assert!(markers.is_running());
        assert_eq!(markers.elapsed_secs(at(0)), 60);
        assert_eq!(markers.elapsed_secs(at(30)), 90);

        let delta = 17;
        let a = markers.elapsed_secs(at(100));
        let b = markers.elapsed_secs(at(100 - delta));
        assert_eq!(a - b, delta as u64);
    }

    #[test]
    fn start_instant_ahead_of_now_contributes_nothing() {
        let markers = SessionMarkers::running(10, at(50));
        assert_eq!(markers.elapsed_secs(at(20)), 10);
    }

    #[test]
    fn pause_folds_live_window_once() {
        let mut markers = SessionMarkers::running(100, at(0));
        markers.pause(at(25));
        assert_eq!(markers, SessionMarkers::paused(125));

        // A second pause trigger must not change anything.
        markers.pause(at(500));
        assert_eq!(markers, SessionMarkers::paused(125));
    }

    #[test]
    fn resume_never_overwrites_a_running_window() {
        let mut markers = SessionMarkers::paused(40);
        markers.resume(at(10));
        assert_eq!(markers.session_start, Some(at(10)));

        // Duplicate resume keeps the original start; no double-count.
        markers.resume(at(60));
        assert_eq!(markers.session_start, Some(at(10)));
        assert_eq!(markers.elapsed_secs(at(70)), 100);
    }

    #[test]
    fn pause_resume_round_trip_accumulates() {
        let mut markers = SessionMarkers::paused(0);
        markers.resume(at(0));
        markers.pause(at(90));
        markers.resume(at(200));
        markers.pause(at(230));
        assert_eq!(markers.elapsed_secs(at(999)), 120);
        assert!(!markers.is_running());
    }

    #[test]
    fn markers_survive_serialization() {
        let markers = SessionMarkers::running(75, at(12));
        let encoded = serde_json::to_string(&markers).unwrap();
        let decoded: SessionMarkers = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, markers);
        assert_eq!(decoded.elapsed_secs(at(12) + Duration::seconds(8)), 83);
    }
}
