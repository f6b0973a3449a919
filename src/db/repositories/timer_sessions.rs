use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::{parse_datetime, parse_optional_datetime, to_i64, to_u64},
    models::TimerSession,
};

fn row_to_session(row: &Row) -> Result<TimerSession> {
    let started_at: String = row.get("started_at")?;
    let ended_at: Option<String> = row.get("ended_at")?;
    let duration_secs: Option<i64> = row.get("duration_secs")?;

    Ok(TimerSession {
        id: row.get("id")?,
        habit_id: row.get("habit_id")?,
        started_at: parse_datetime(&started_at, "started_at")?,
        ended_at: parse_optional_datetime(ended_at, "ended_at")?,
        duration_secs: duration_secs
            .map(|secs| to_u64(secs, "duration_secs"))
            .transpose()?,
    })
}

const SESSION_COLUMNS: &str = "id, habit_id, started_at, ended_at, duration_secs";

/// Sessions that count toward the given day: closed sessions started
/// within it, plus any still-open session regardless of when it started
/// (its full elapsed time is shown until a later rebuild supersedes it).
pub(crate) fn sessions_for_day(
    conn: &Connection,
    habit_id: &str,
    day_start: DateTime<Utc>,
    day_end: DateTime<Utc>,
) -> Result<Vec<TimerSession>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SESSION_COLUMNS} FROM timer_sessions
         WHERE habit_id = ?1
           AND (ended_at IS NULL OR (started_at >= ?2 AND started_at < ?3))
         ORDER BY started_at"
    ))?;

    let mut rows = stmt.query(params![
        habit_id,
        day_start.to_rfc3339(),
        day_end.to_rfc3339()
    ])?;

    let mut sessions = Vec::new();
    while let Some(row) = rows.next()? {
        sessions.push(row_to_session(row)?);
    }

    Ok(sessions)
}

impl Database {
    pub async fn insert_timer_session(&self, session: &TimerSession) -> Result<()> {
        let record = session.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO timer_sessions (id, habit_id, started_at, ended_at, duration_secs)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id,
                    record.habit_id,
                    record.started_at.to_rfc3339(),
                    record.ended_at.as_ref().map(|dt| dt.to_rfc3339()),
                    record.duration_secs.map(to_i64).transpose()?,
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Latest open session for a habit, if one exists. The toggle handler
    /// keeps at most one open per habit.
    pub async fn get_open_session(&self, habit_id: &str) -> Result<Option<TimerSession>> {
        let habit_id = habit_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM timer_sessions
                 WHERE habit_id = ?1 AND ended_at IS NULL
                 ORDER BY started_at DESC
                 LIMIT 1"
            ))?;

            stmt.query_row(params![habit_id], |row| Ok(row_to_session(row)))
                .optional()?
                .transpose()
        })
        .await
    }

    pub async fn close_timer_session(
        &self,
        session_id: &str,
        ended_at: DateTime<Utc>,
        duration_secs: u64,
    ) -> Result<()> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            conn.execute(
                "UPDATE timer_sessions
                 SET ended_at = ?1,
                     duration_secs = ?2
                 WHERE id = ?3",
                params![
                    ended_at.to_rfc3339(),
                    to_i64(duration_secs)?,
                    session_id,
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Every open session in the store, for startup recovery.
    pub async fn list_open_sessions(&self) -> Result<Vec<TimerSession>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLUMNS} FROM timer_sessions
                 WHERE ended_at IS NULL
                 ORDER BY started_at"
            ))?;

            let mut rows = stmt.query([])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_session(row)?);
            }

            Ok(sessions)
        })
        .await
    }
}
