#![allow(dead_code)]

use std::sync::Arc;

use partyprint::jobs::{Job, JobStore, MemoryJobStore, NewJob, QueueEngine};
use sqlx::{postgres::PgPoolOptions, PgPool};

pub fn memory_engine() -> QueueEngine {
    let store: Arc<dyn JobStore> = Arc::new(MemoryJobStore::new());
    QueueEngine::new(store)
}

pub fn new_job(name: &str) -> NewJob {
    NewJob {
        filename: format!("{name}.jpg"),
        owner: "guest".to_string(),
        url: format!("http://localhost:5050/blobs/{name}.jpg"),
    }
}

pub async fn create_queued(engine: &QueueEngine, name: &str) -> Job {
    let job = engine.create_job(new_job(name)).await.unwrap();
    engine.enqueue(job.id).await.unwrap()
}

/// `None` when TEST_DATABASE_URL is unset, so Postgres tests can bail out early.
pub async fn setup_db() -> Option<PgPool> {
    let _ = dotenvy::dotenv();

    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping postgres test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .expect("failed to connect to TEST_DATABASE_URL");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations failed");

    sqlx::query("TRUNCATE TABLE jobs RESTART IDENTITY")
        .execute(&pool)
        .await
        .expect("truncate failed");

    Some(pool)
}
