//! Cross-module scenarios: store accounting through publish and read,
//! surface-triggered toggles, and startup recovery.

use std::time::Duration;

use chrono::{DateTime, Utc};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use uuid::Uuid;

use habitsync::db::models::{Completion, Habit, HabitMode, TimerSession};
use habitsync::{
    build_snapshots, Database, Progress, ProgressSnapshot, SnapshotStore, SurfaceCommand,
    SyncEngine, SyncPaths, TimerRun,
};

fn paths_in(dir: &TempDir) -> SyncPaths {
    SyncPaths::from_base(dir.path())
}

fn habit(id: &str, mode: HabitMode, goal: f64, at: DateTime<Utc>) -> Habit {
    Habit {
        id: id.into(),
        name: format!("habit {id}"),
        icon: "circle".into(),
        color_hex: "#5588EE".into(),
        mode,
        goal,
        unit_label: match mode {
            HabitMode::Count => Some("times".into()),
            HabitMode::Timer => None,
        },
        archived: false,
        created_at: at,
        updated_at: at,
    }
}

async fn wait_for<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    for _ in 0..250 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not met within timeout");
}

#[tokio::test]
async fn timer_day_accounting_publishes_and_reads_back() {
    let dir = TempDir::new().unwrap();
    let paths = paths_in(&dir);
    let now: DateTime<Utc> = "2026-03-10T12:00:00Z".parse().unwrap();

    let db = Database::new(paths.db_path.clone()).unwrap();
    let stretch = habit("stretch", HabitMode::Timer, 30.0, now);
    db.insert_habit(&stretch).await.unwrap();

    // One completed 22.5-minute session earlier today.
    let started = now - chrono::Duration::minutes(120);
    db.insert_timer_session(&TimerSession {
        id: Uuid::new_v4().to_string(),
        habit_id: "stretch".into(),
        started_at: started,
        ended_at: Some(started + chrono::Duration::seconds(1350)),
        duration_secs: Some(1350),
    })
    .await
    .unwrap();

    // Yesterday's closed session must not count toward today.
    let yesterday = now - chrono::Duration::days(1);
    db.insert_timer_session(&TimerSession {
        id: Uuid::new_v4().to_string(),
        habit_id: "stretch".into(),
        started_at: yesterday,
        ended_at: Some(yesterday + chrono::Duration::seconds(600)),
        duration_secs: Some(600),
    })
    .await
    .unwrap();

    let items = db.load_active_habits(now).await.unwrap();
    let snapshots = build_snapshots(&items, now);

    assert_eq!(snapshots.len(), 1);
    assert_eq!(
        snapshots[0].progress,
        Progress::Timer {
            value: 22.5,
            goal: 30.0,
            is_timer_running: false
        }
    );
    assert_eq!(snapshots[0].fraction(), 0.75);
    assert_eq!(snapshots[0].formatted(), "22:30");

    // Publish, then read through a second store instance standing in for
    // the surface process.
    let writer = SnapshotStore::open(
        paths.shared_region_dir.as_deref(),
        &paths.local_region_dir,
    )
    .unwrap();
    writer.publish(&snapshots).unwrap();

    let reader = SnapshotStore::open(
        paths.shared_region_dir.as_deref(),
        &paths.local_region_dir,
    )
    .unwrap();
    assert_eq!(reader.read(), snapshots);
    assert_eq!(
        reader.snapshot_for("stretch").unwrap().formatted(),
        "22:30"
    );
}

#[tokio::test]
async fn open_session_from_yesterday_counts_in_full() {
    let dir = TempDir::new().unwrap();
    let paths = paths_in(&dir);
    let now: DateTime<Utc> = "2026-03-10T00:30:00Z".parse().unwrap();

    let db = Database::new(paths.db_path.clone()).unwrap();
    db.insert_habit(&habit("deepwork", HabitMode::Timer, 60.0, now))
        .await
        .unwrap();

    // Started 40 minutes before midnight and never paused. The open
    // session keeps its full elapsed time until a later rebuild.
    db.insert_timer_session(&TimerSession {
        id: "overnight".into(),
        habit_id: "deepwork".into(),
        started_at: now - chrono::Duration::minutes(70),
        ended_at: None,
        duration_secs: None,
    })
    .await
    .unwrap();

    let snapshots = build_snapshots(&db.load_active_habits(now).await.unwrap(), now);
    assert_eq!(
        snapshots[0].progress,
        Progress::Timer {
            value: 70.0,
            goal: 60.0,
            is_timer_running: true
        }
    );
    assert_eq!(snapshots[0].fraction(), 1.0);
    assert_eq!(snapshots[0].formatted(), "1:10:00");
}

#[tokio::test]
async fn count_completions_only_count_for_today() {
    let dir = TempDir::new().unwrap();
    let paths = paths_in(&dir);
    let now: DateTime<Utc> = "2026-03-10T12:00:00Z".parse().unwrap();

    let db = Database::new(paths.db_path.clone()).unwrap();
    db.insert_habit(&habit("water", HabitMode::Count, 8.0, now))
        .await
        .unwrap();

    for (offset_hours, amount) in [(-2i64, 1.0), (-1, 1.5), (-30, 4.0)] {
        db.insert_completion(&Completion {
            id: Uuid::new_v4().to_string(),
            habit_id: "water".into(),
            amount,
            logged_at: now + chrono::Duration::hours(offset_hours),
        })
        .await
        .unwrap();
    }

    assert_eq!(db.completed_amount_for_day("water", now).await.unwrap(), 2.5);

    let snapshots = build_snapshots(&db.load_active_habits(now).await.unwrap(), now);
    assert_eq!(
        snapshots[0].progress,
        Progress::Count {
            value: 2.5,
            goal: 8.0
        }
    );
    assert_eq!(snapshots[0].formatted(), "2.5/8 times");
}

#[tokio::test]
async fn engine_publishes_on_start_and_notifies_surfaces() {
    let dir = TempDir::new().unwrap();
    let paths = paths_in(&dir);
    let now = Utc::now();

    let db = Database::new(paths.db_path.clone()).unwrap();
    db.insert_habit(&habit("journal", HabitMode::Count, 1.0, now))
        .await
        .unwrap();
    drop(db);

    let engine = SyncEngine::start(paths.clone()).await.unwrap();

    let (notify_tx, notify_rx) = std::sync::mpsc::channel();
    engine.notifier().register(move || {
        let _ = notify_tx.send(());
    });

    let reader = SnapshotStore::open(
        paths.shared_region_dir.as_deref(),
        &paths.local_region_dir,
    )
    .unwrap();
    wait_for(|| reader.snapshot_for("journal").is_some()).await;

    // At least one reload notification accompanies a publish.
    engine.request_sync();
    wait_for(|| notify_rx.try_recv().is_ok()).await;

    engine.shutdown().await;
}

#[tokio::test]
async fn surface_toggle_is_idempotent_and_republishes() {
    let dir = TempDir::new().unwrap();
    let paths = paths_in(&dir);
    let now = Utc::now();

    let db = Database::new(paths.db_path.clone()).unwrap();
    db.insert_habit(&habit("practice", HabitMode::Timer, 30.0, now))
        .await
        .unwrap();
    drop(db);

    let engine = SyncEngine::start(paths.clone()).await.unwrap();
    let run = SurfaceCommand::SetTimerRunning {
        habit_id: "practice".into(),
        desired: TimerRun::Run,
    };
    let pause = SurfaceCommand::SetTimerRunning {
        habit_id: "practice".into(),
        desired: TimerRun::Pause,
    };

    engine.handler().handle(run.clone()).await.unwrap();
    let open = engine.db().get_open_session("practice").await.unwrap();
    let session_id = open.expect("session should be open after run").id;

    // Duplicate run keeps the same open session.
    engine.handler().handle(run).await.unwrap();
    let open = engine.db().get_open_session("practice").await.unwrap();
    assert_eq!(open.unwrap().id, session_id);

    wait_for(|| {
        engine
            .store()
            .snapshot_for("practice")
            .and_then(|s| s.progress.is_timer_running())
            == Some(true)
    })
    .await;

    engine.handler().handle(pause.clone()).await.unwrap();
    assert!(engine
        .db()
        .get_open_session("practice")
        .await
        .unwrap()
        .is_none());

    // Duplicate pause creates nothing and closes nothing further.
    engine.handler().handle(pause).await.unwrap();
    let items = engine.db().load_active_habits(Utc::now()).await.unwrap();
    assert_eq!(items[0].sessions.len(), 1);
    assert!(!items[0].sessions[0].is_open());

    wait_for(|| {
        engine
            .store()
            .snapshot_for("practice")
            .and_then(|s| s.progress.is_timer_running())
            == Some(false)
    })
    .await;

    engine.shutdown().await;
}

#[tokio::test]
async fn startup_recovery_closes_only_orphaned_sessions() {
    let dir = TempDir::new().unwrap();
    let paths = paths_in(&dir);
    let now = Utc::now();

    let db = Database::new(paths.db_path.clone()).unwrap();
    let mut retired = habit("retired", HabitMode::Timer, 30.0, now);
    retired.archived = true;
    db.insert_habit(&retired).await.unwrap();
    db.insert_habit(&habit("alive", HabitMode::Timer, 30.0, now))
        .await
        .unwrap();

    for habit_id in ["retired", "alive"] {
        db.insert_timer_session(&TimerSession {
            id: format!("open-{habit_id}"),
            habit_id: habit_id.into(),
            started_at: now - chrono::Duration::minutes(5),
            ended_at: None,
            duration_secs: None,
        })
        .await
        .unwrap();
    }
    drop(db);

    let engine = SyncEngine::start(paths).await.unwrap();

    // The archived habit's session is closed with its elapsed time; the
    // live habit's timer keeps running across the restart.
    assert!(engine
        .db()
        .get_open_session("retired")
        .await
        .unwrap()
        .is_none());
    let alive_open = engine.db().get_open_session("alive").await.unwrap();
    assert_eq!(alive_open.unwrap().id, "open-alive");

    engine.shutdown().await;
}

#[tokio::test]
async fn degraded_store_keeps_the_engine_running() {
    let dir = TempDir::new().unwrap();
    let mut paths = paths_in(&dir);
    paths.shared_region_dir = None;

    let db = Database::new(paths.db_path.clone()).unwrap();
    let now = Utc::now();
    db.insert_habit(&habit("solo", HabitMode::Count, 2.0, now))
        .await
        .unwrap();
    drop(db);

    let engine = SyncEngine::start(paths).await.unwrap();
    assert!(engine.store().is_degraded());
    wait_for(|| engine.store().snapshot_for("solo").is_some()).await;

    engine.shutdown().await;
}

#[test]
fn placeholder_is_the_fallback_for_a_fresh_install() {
    let dir = TempDir::new().unwrap();
    let paths = paths_in(&dir);
    let store = SnapshotStore::open(
        paths.shared_region_dir.as_deref(),
        &paths.local_region_dir,
    )
    .unwrap();
    assert_eq!(store.read(), vec![ProgressSnapshot::placeholder()]);
}
