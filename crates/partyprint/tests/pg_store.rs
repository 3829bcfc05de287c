// tests/pg_store.rs
mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::{create_queued, new_job, setup_db};
use partyprint::jobs::{EngineConfig, JobId, JobStatus, PgJobStore, QueueEngine};
use partyprint::QueueError;
use serial_test::serial;

#[tokio::test]
#[serial]
async fn pg_round_trip_through_the_state_machine() {
    let Some(pool) = setup_db().await else { return };
    let engine = QueueEngine::new(Arc::new(PgJobStore::new(pool.clone())));

    let job = engine.create_job(new_job("a")).await.unwrap();
    let stored = engine.get_job(job.id).await.unwrap();
    assert_eq!(stored.status, JobStatus::Uploaded);
    assert_eq!(stored.filename, "a.jpg");

    engine.enqueue(job.id).await.unwrap();
    engine.enqueue(job.id).await.unwrap();

    let dispatched = engine.dispatch_next().await.unwrap().expect("queued job");
    assert_eq!(dispatched.id, job.id);
    assert_eq!(dispatched.status, JobStatus::Printing);
    assert!(engine.dispatch_next().await.unwrap().is_none());

    engine.complete_print(job.id).await.unwrap();
    let done = engine.complete_print(job.id).await.unwrap();
    assert_eq!(done.status, JobStatus::Printed);

    engine.delete_job(job.id).await.unwrap();
    assert!(matches!(
        engine.complete_print(job.id).await,
        Err(QueueError::NotFound(_))
    ));
}

#[tokio::test]
#[serial]
async fn pg_dispatch_is_fifo_with_insertion_tiebreak() {
    let Some(pool) = setup_db().await else { return };
    let engine = QueueEngine::new(Arc::new(PgJobStore::new(pool.clone())));

    let a = create_queued(&engine, "a").await;
    let b = create_queued(&engine, "b").await;
    let c = create_queued(&engine, "c").await;

    // force a timestamp tie between b and c; insertion order must decide
    sqlx::query("UPDATE jobs SET created_at = (SELECT created_at FROM jobs WHERE id = $1) WHERE id = $2")
        .bind(b.id)
        .bind(c.id)
        .execute(&pool)
        .await
        .unwrap();

    for expected in [a.id, b.id, c.id] {
        let got = engine.dispatch_next().await.unwrap().expect("job");
        assert_eq!(got.id, expected);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[serial]
async fn pg_concurrent_pollers_never_share_a_job() {
    let Some(pool) = setup_db().await else { return };
    let engine = QueueEngine::new(Arc::new(PgJobStore::new(pool.clone())));

    let mut queued = HashSet::new();
    for i in 0..20 {
        queued.insert(create_queued(&engine, &format!("j{i}")).await.id);
    }

    let mut handles = Vec::new();
    for _ in 0..30 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move { engine.dispatch_next().await }));
    }

    let mut got: Vec<JobId> = Vec::new();
    for h in handles {
        if let Some(job) = h.await.unwrap().unwrap() {
            got.push(job.id);
        }
    }

    let unique: HashSet<JobId> = got.iter().copied().collect();
    assert_eq!(got.len(), unique.len(), "a job was dispatched twice");
    assert_eq!(unique, queued);

    let printing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE status = 'printing'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(printing, 20);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[serial]
async fn pg_pollers_beyond_one_scan_all_get_a_job() {
    let Some(pool) = setup_db().await else { return };
    let engine = QueueEngine::with_config(
        Arc::new(PgJobStore::new(pool.clone())),
        EngineConfig {
            dispatch_scan_batch: 2,
        },
    );

    for i in 0..60 {
        create_queued(&engine, &format!("j{i}")).await;
    }

    let mut handles = Vec::new();
    for _ in 0..60 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move { engine.dispatch_next().await }));
    }

    let mut got = HashSet::new();
    for h in handles {
        let job = h.await.unwrap().unwrap().expect("queue still had jobs");
        assert!(got.insert(job.id), "job {} handed out twice", job.id);
    }
    assert_eq!(got.len(), 60);
}

#[tokio::test]
#[serial]
async fn pg_rejects_unknown_status_text() {
    let Some(pool) = setup_db().await else { return };
    let engine = QueueEngine::new(Arc::new(PgJobStore::new(pool.clone())));
    let job = engine.create_job(new_job("a")).await.unwrap();

    let res = sqlx::query("UPDATE jobs SET status = 'running' WHERE id = $1")
        .bind(job.id)
        .execute(&pool)
        .await;
    assert!(res.is_err(), "check constraint should reject free-text status");

    assert_eq!(
        engine.get_job(job.id).await.unwrap().status,
        JobStatus::Uploaded
    );
}
