use anyhow::{bail, Context, Result};
use rusqlite::{Connection, Transaction};

const CURRENT_SCHEMA_VERSION: i32 = 3;

const SCHEMA_V1: &str = "
CREATE TABLE habits (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    icon TEXT NOT NULL DEFAULT '',
    color_hex TEXT NOT NULL DEFAULT '#808080',
    mode TEXT NOT NULL,
    goal REAL NOT NULL,
    unit_label TEXT,
    archived INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
";

const SCHEMA_V2: &str = "
CREATE TABLE completions (
    id TEXT PRIMARY KEY,
    habit_id TEXT NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
    amount REAL NOT NULL DEFAULT 1,
    logged_at TEXT NOT NULL
);
CREATE INDEX idx_completions_habit_logged ON completions(habit_id, logged_at);
";

const SCHEMA_V3: &str = "
CREATE TABLE timer_sessions (
    id TEXT PRIMARY KEY,
    habit_id TEXT NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
    started_at TEXT NOT NULL,
    ended_at TEXT,
    duration_secs INTEGER
);
CREATE INDEX idx_timer_sessions_habit_started ON timer_sessions(habit_id, started_at);
CREATE INDEX idx_timer_sessions_open ON timer_sessions(habit_id) WHERE ended_at IS NULL;
";

pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let mut version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version pragma")?;

    if version > CURRENT_SCHEMA_VERSION {
        bail!(
            "database version ({}) is newer than supported schema ({})",
            version,
            CURRENT_SCHEMA_VERSION
        );
    }

    if version == CURRENT_SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .context("failed to open migration transaction")?;

    while version < CURRENT_SCHEMA_VERSION {
        let next_version = version + 1;
        apply_migration(&tx, next_version)
            .with_context(|| format!("migration to version {next_version} failed"))?;
        version = next_version;
    }

    tx.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)
        .context("failed to update user_version pragma")?;
    tx.commit().context("failed to commit migrations")?;

    Ok(())
}

fn apply_migration(tx: &Transaction<'_>, version: i32) -> Result<()> {
    let schema = match version {
        1 => SCHEMA_V1,
        2 => SCHEMA_V2,
        3 => SCHEMA_V3,
        other => bail!("no migration defined for version {other}"),
    };

    tx.execute_batch(schema)
        .with_context(|| format!("failed to execute schema v{version}"))
}
