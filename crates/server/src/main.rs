use std::sync::Arc;
use std::time::Duration;

use partyprint::admin::AdminActions;
use partyprint::api;
use partyprint::blob::{BlobStore, LocalBlobStore};
use partyprint::config;
use partyprint::db;
use partyprint::jobs::{EngineConfig, JobStore, MemoryJobStore, PgJobStore, QueueEngine};

const LOG_POLL: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::Config::from_env()?;

    partyprint::telemetry::init_tracing("info,tower_http=info", Some(&cfg.log_path))?;

    tracing::info!(
        api_addr = %cfg.api_addr,
        blob_dir = %cfg.blob_dir.display(),
        log_path = %cfg.log_path.display(),
        auto_queue = cfg.auto_queue,
        migrate_on_startup = cfg.migrate_on_startup,
        dispatch_scan_batch = cfg.dispatch_scan_batch,
        "=== partyprint server starting ==="
    );

    let store: Arc<dyn JobStore> = match &cfg.database_url {
        Some(url) => {
            let pool = db::make_pool(url).await?;
            if cfg.migrate_on_startup {
                db::run_migrations(&pool).await?;
                tracing::info!("database migrations applied");
            }
            Arc::new(PgJobStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, jobs are kept in memory and lost on restart");
            Arc::new(MemoryJobStore::new())
        }
    };

    let engine = QueueEngine::with_config(
        store,
        EngineConfig {
            dispatch_scan_batch: cfg.dispatch_scan_batch,
        },
    );
    let blobs: Arc<dyn BlobStore> =
        Arc::new(LocalBlobStore::new(&cfg.blob_dir, &cfg.public_base_url));
    let admin = AdminActions::new(engine.clone(), blobs.clone());

    let app = api::router(api::ApiState {
        engine,
        admin,
        blobs,
        auto_queue: cfg.auto_queue,
        max_upload_bytes: cfg.max_upload_bytes,
        log_path: cfg.log_path.clone(),
        log_poll: LOG_POLL,
    });

    let listener = tokio::net::TcpListener::bind(&cfg.api_addr).await?;
    tracing::info!("api listening on http://{}", cfg.api_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
