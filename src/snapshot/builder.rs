use chrono::{DateTime, Utc};
use log::debug;

use crate::db::models::{ActiveHabit, HabitMode};
use crate::snapshot::model::{Progress, ProgressSnapshot, MIN_COUNT_GOAL, MIN_TIMER_GOAL};

/// Build the publishable snapshot list from the store's active habits.
///
/// Pure aside from its inputs: `now` is the single instant used for live
/// timer accounting and for stamping. Input order is preserved; ordering
/// stability across syncs belongs to the store's iteration order, not
/// this function.
pub fn build_snapshots(items: &[ActiveHabit], now: DateTime<Utc>) -> Vec<ProgressSnapshot> {
    items
        .iter()
        .filter_map(|item| build_one(item, now))
        .collect()
}

fn build_one(item: &ActiveHabit, now: DateTime<Utc>) -> Option<ProgressSnapshot> {
    let habit = &item.habit;
    if habit.id.is_empty() {
        // Transient upstream row without an identity yet; skip, don't fail.
        debug!("skipping habit without id: {:?}", habit.name);
        return None;
    }

    let progress = match habit.mode {
        HabitMode::Count => Progress::Count {
            value: item.completed_amount,
            goal: habit.goal.max(MIN_COUNT_GOAL),
        },
        HabitMode::Timer => {
            let markers = item.session_markers();
            Progress::Timer {
                value: markers.elapsed_secs(now) as f64 / 60.0,
                goal: habit.goal.max(MIN_TIMER_GOAL),
                is_timer_running: markers.is_running(),
            }
        }
    };

    Some(ProgressSnapshot {
        id: habit.id.clone(),
        name: habit.name.clone(),
        icon: habit.icon.clone(),
        color_hex: habit.color_hex.clone(),
        progress,
        unit_label: habit.unit_label.clone(),
        last_updated: now,
    })
}
