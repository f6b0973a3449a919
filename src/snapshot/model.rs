//! Snapshot data model shared between the owning process and display
//! surfaces. Everything here is plain data plus derivation; snapshots are
//! rebuilt wholesale each sync and never mutated in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Smallest goal a count habit may carry after clamping.
pub const MIN_COUNT_GOAL: f64 = 1.0;
/// Smallest goal (in minutes) a timer habit may carry after clamping.
pub const MIN_TIMER_GOAL: f64 = 0.01;

/// Progress accounting for one snapshot.
///
/// The running flag only means anything for timer habits, so the two modes
/// are separate variants instead of one struct with a conditionally-valid
/// field. Timer `value` and `goal` are minutes; count values are in the
/// habit's own unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum Progress {
    #[serde(rename_all = "camelCase")]
    Count { value: f64, goal: f64 },
    #[serde(rename_all = "camelCase")]
    Timer {
        value: f64,
        goal: f64,
        is_timer_running: bool,
    },
}

impl Progress {
    pub fn value(&self) -> f64 {
        match self {
            Progress::Count { value, .. } | Progress::Timer { value, .. } => *value,
        }
    }

    pub fn goal(&self) -> f64 {
        match self {
            Progress::Count { goal, .. } | Progress::Timer { goal, .. } => *goal,
        }
    }

    pub fn is_timer_running(&self) -> Option<bool> {
        match self {
            Progress::Count { .. } => None,
            Progress::Timer {
                is_timer_running, ..
            } => Some(*is_timer_running),
        }
    }
}

/// One habit's displayable progress, published as part of the snapshot
/// list. `id` is the join key across the process boundary; the display
/// fields are opaque to the sync core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub color_hex: String,
    #[serde(flatten)]
    pub progress: Progress,
    pub unit_label: Option<String>,
    pub last_updated: DateTime<Utc>,
}

impl ProgressSnapshot {
    /// Completion fraction in `[0, 1]`. Builders guarantee `goal > 0`, so
    /// this never divides by zero.
    pub fn fraction(&self) -> f64 {
        (self.progress.value() / self.progress.goal()).clamp(0.0, 1.0)
    }

    /// Mode-specific display string: `"2/3 times"` for count habits, a
    /// clock-style duration for timer habits.
    pub fn formatted(&self) -> String {
        match &self.progress {
            Progress::Count { value, goal } => {
                let amounts = format!("{}/{}", format_amount(*value), format_amount(*goal));
                match self.unit_label.as_deref() {
                    Some(unit) if !unit.is_empty() => format!("{amounts} {unit}"),
                    _ => amounts,
                }
            }
            Progress::Timer { value, .. } => format_timer_minutes(*value),
        }
    }

    /// Fixed sample shown when no published payload is readable. Surfaces
    /// always get something renderable, never an empty list or an error.
    pub fn placeholder() -> Self {
        Self {
            id: "sample-habit".into(),
            name: "Sample Habit".into(),
            icon: "sparkles".into(),
            color_hex: "#4F86F7".into(),
            progress: Progress::Count {
                value: 2.0,
                goal: 3.0,
            },
            unit_label: Some("times".into()),
            last_updated: DateTime::UNIX_EPOCH,
        }
    }
}

/// Render a count amount with at most one fractional digit, dropping the
/// fraction entirely when it rounds away.
fn format_amount(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded:.1}")
    }
}

/// Render accumulated timer minutes as `H:MM:SS`, `M:SS`, or `Ns`
/// depending on magnitude. Sub-minute values keep the unit letter so a
/// bare number is never shown.
fn format_timer_minutes(minutes: f64) -> String {
    let total_secs = ((minutes * 60.0) as i64).max(0);
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    if total_secs >= 3600 {
        format!("{hours}:{mins:02}:{secs:02}")
    } else if total_secs >= 60 {
        format!("{mins}:{secs:02}")
    } else {
        format!("{total_secs}s")
    }
}
