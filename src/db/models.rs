//! Habit store records. Rows round-trip through RFC 3339 timestamps and
//! the string forms in `HabitMode::as_str`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::SessionMarkers;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum HabitMode {
    Count,
    Timer,
}

impl HabitMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            HabitMode::Count => "count",
            HabitMode::Timer => "timer",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub color_hex: String,
    pub mode: HabitMode,
    /// Completions per day for count habits, minutes per day for timer
    /// habits. May arrive non-positive from upstream edits; the snapshot
    /// builder clamps it, the store keeps what it was given.
    pub goal: f64,
    pub unit_label: Option<String>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub id: String,
    pub habit_id: String,
    pub amount: f64,
    pub logged_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimerSession {
    pub id: String,
    pub habit_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_secs: Option<u64>,
}

impl TimerSession {
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

/// One active habit joined with its records for the current accounting
/// day; the unit of input to the snapshot builder.
#[derive(Debug, Clone)]
pub struct ActiveHabit {
    pub habit: Habit,
    /// Sum of completion amounts logged today (count habits).
    pub completed_amount: f64,
    /// Today's timer sessions, closed and open (timer habits).
    pub sessions: Vec<TimerSession>,
}

impl ActiveHabit {
    /// Collapse today's sessions into the marker pair the elapsed-time
    /// model consumes: closed durations accumulate into the base, the
    /// latest open session (if any) supplies the start instant.
    pub fn session_markers(&self) -> SessionMarkers {
        let base: u64 = self
            .sessions
            .iter()
            .filter_map(|session| session.duration_secs)
            .sum();

        let open_start = self
            .sessions
            .iter()
            .filter(|session| session.is_open())
            .map(|session| session.started_at)
            .max();

        match open_start {
            Some(started_at) => SessionMarkers::running(base, started_at),
            None => SessionMarkers::paused(base),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn session(id: &str, started: i64, duration: Option<u64>) -> TimerSession {
        let started_at = Utc.timestamp_opt(1_700_000_000 + started, 0).unwrap();
        TimerSession {
            id: id.into(),
            habit_id: "h1".into(),
            started_at,
            ended_at: duration.map(|secs| started_at + chrono::Duration::seconds(secs as i64)),
            duration_secs: duration,
        }
    }

    fn active(sessions: Vec<TimerSession>) -> ActiveHabit {
        ActiveHabit {
            habit: Habit {
                id: "h1".into(),
                name: "Practice".into(),
                icon: "metronome".into(),
                color_hex: "#22AA55".into(),
                mode: HabitMode::Timer,
                goal: 30.0,
                unit_label: None,
                archived: false,
                created_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
                updated_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            },
            completed_amount: 0.0,
            sessions,
        }
    }

    #[test]
    fn closed_sessions_accumulate_into_base() {
        let markers = active(vec![session("a", 0, Some(600)), session("b", 700, Some(300))])
            .session_markers();
        assert_eq!(markers, SessionMarkers::paused(900));
    }

    #[test]
    fn open_session_supplies_the_start_instant() {
        let habit = active(vec![session("a", 0, Some(600)), session("b", 700, None)]);
        let markers = habit.session_markers();
        assert!(markers.is_running());
        assert_eq!(markers.base_elapsed_secs, 600);
        assert_eq!(markers.session_start, Some(habit.sessions[1].started_at));
    }

    #[test]
    fn no_sessions_means_paused_at_zero() {
        assert_eq!(active(Vec::new()).session_markers(), SessionMarkers::paused(0));
    }
}
