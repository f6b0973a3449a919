use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, parse_mode, utc_day_bounds},
    models::{ActiveHabit, Habit},
    repositories::timer_sessions::sessions_for_day,
};

fn row_to_habit(row: &Row) -> Result<Habit> {
    let mode: String = row.get("mode")?;
    let created_at: String = row.get("created_at")?;
    let updated_at: String = row.get("updated_at")?;
    let archived: i64 = row.get("archived")?;

    Ok(Habit {
        id: row.get("id")?,
        name: row.get("name")?,
        icon: row.get("icon")?,
        color_hex: row.get("color_hex")?,
        mode: parse_mode(&mode)?,
        goal: row.get("goal")?,
        unit_label: row.get("unit_label")?,
        archived: archived != 0,
        created_at: parse_datetime(&created_at, "created_at")?,
        updated_at: parse_datetime(&updated_at, "updated_at")?,
    })
}

const HABIT_COLUMNS: &str =
    "id, name, icon, color_hex, mode, goal, unit_label, archived, created_at, updated_at";

fn active_habits(conn: &Connection) -> Result<Vec<Habit>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {HABIT_COLUMNS} FROM habits WHERE archived = 0 ORDER BY created_at"
    ))?;

    let mut rows = stmt.query([])?;
    let mut habits = Vec::new();
    while let Some(row) = rows.next()? {
        habits.push(row_to_habit(row)?);
    }

    Ok(habits)
}

impl Database {
    pub async fn insert_habit(&self, habit: &Habit) -> Result<()> {
        let record = habit.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO habits (id, name, icon, color_hex, mode, goal, unit_label, archived, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    record.id,
                    record.name,
                    record.icon,
                    record.color_hex,
                    record.mode.as_str(),
                    record.goal,
                    record.unit_label,
                    record.archived as i64,
                    record.created_at.to_rfc3339(),
                    record.updated_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn get_habit(&self, habit_id: &str) -> Result<Option<Habit>> {
        let habit_id = habit_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {HABIT_COLUMNS} FROM habits WHERE id = ?1"
            ))?;

            stmt.query_row(params![habit_id], |row| {
                Ok(row_to_habit(row))
            })
            .optional()?
            .transpose()
        })
        .await
    }

    pub async fn set_habit_archived(
        &self,
        habit_id: &str,
        archived: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let habit_id = habit_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "UPDATE habits SET archived = ?1, updated_at = ?2 WHERE id = ?3",
                params![archived as i64, updated_at.to_rfc3339(), habit_id],
            )?;
            Ok(())
        })
        .await
    }

    pub async fn list_active_habits(&self) -> Result<Vec<Habit>> {
        self.execute(|conn| active_habits(conn)).await
    }

    /// Active habits joined with their records for the UTC day containing
    /// `now` — the snapshot builder's entire view of the store, read in
    /// one trip to the worker thread.
    pub async fn load_active_habits(&self, now: DateTime<Utc>) -> Result<Vec<ActiveHabit>> {
        let (day_start, day_end) = utc_day_bounds(now);
        self.execute(move |conn| {
            let habits = active_habits(conn)?;

            let mut items = Vec::with_capacity(habits.len());
            for habit in habits {
                let completed_amount: f64 = conn.query_row(
                    "SELECT COALESCE(SUM(amount), 0) FROM completions
                     WHERE habit_id = ?1 AND logged_at >= ?2 AND logged_at < ?3",
                    params![
                        habit.id,
                        day_start.to_rfc3339(),
                        day_end.to_rfc3339()
                    ],
                    |row| row.get(0),
                )?;

                let sessions = sessions_for_day(conn, &habit.id, day_start, day_end)?;

                items.push(ActiveHabit {
                    habit,
                    completed_amount,
                    sessions,
                });
            }

            Ok(items)
        })
        .await
    }
}
