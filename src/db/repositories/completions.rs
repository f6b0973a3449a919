use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::db::{
    connection::Database,
    helpers::utc_day_bounds,
    models::Completion,
};

impl Database {
    pub async fn insert_completion(&self, completion: &Completion) -> Result<()> {
        let record = completion.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO completions (id, habit_id, amount, logged_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    record.id,
                    record.habit_id,
                    record.amount,
                    record.logged_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Sum of completion amounts logged within the UTC day containing
    /// `now`.
    pub async fn completed_amount_for_day(
        &self,
        habit_id: &str,
        now: DateTime<Utc>,
    ) -> Result<f64> {
        let habit_id = habit_id.to_string();
        let (day_start, day_end) = utc_day_bounds(now);
        self.execute(move |conn| {
            let total: f64 = conn.query_row(
                "SELECT COALESCE(SUM(amount), 0) FROM completions
                 WHERE habit_id = ?1 AND logged_at >= ?2 AND logged_at < ?3",
                params![habit_id, day_start.to_rfc3339(), day_end.to_rfc3339()],
                |row| row.get(0),
            )?;
            Ok(total)
        })
        .await
    }
}
