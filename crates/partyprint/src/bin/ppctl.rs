use std::env;
use std::sync::Arc;

use partyprint::admin::AdminActions;
use partyprint::blob::LocalBlobStore;
use partyprint::config::Config;
use partyprint::db;
use partyprint::jobs::{Job, JobStatus, NewJob, PgJobStore, QueueEngine};
use uuid::Uuid;

const USAGE: &str = "ppctl <command>\n\
     Commands:\n\
     - list [status]\n\
     - counts\n\
     - queue <job_id>\n\
     - mark-printed <job_id>\n\
     - delete <job_id>\n\
     - seed <n>\n\
     \n\
     Uses DATABASE_URL (or PARTYPRINT_DATABASE_URL) and PARTYPRINT_BLOB_DIR.\n";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("{USAGE}");
        std::process::exit(2);
    }

    partyprint::telemetry::init_tracing("warn", None)?;

    let cfg = Config::from_env()?;
    let database_url = cfg
        .database_url
        .clone()
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is missing"))?;

    let pool = db::make_pool(&database_url).await?;
    if cfg.migrate_on_startup {
        db::run_migrations(&pool).await?;
    }

    let engine = QueueEngine::new(Arc::new(PgJobStore::new(pool)));
    let blobs = Arc::new(LocalBlobStore::new(&cfg.blob_dir, &cfg.public_base_url));
    let admin = AdminActions::new(engine.clone(), blobs);

    match args[1].as_str() {
        "list" => {
            let status = args.get(2).map(|s| s.parse::<JobStatus>()).transpose()?;
            for job in engine.list_jobs(status, Some(500)).await? {
                print_job(&job);
            }
        }
        "counts" => {
            let c = engine.status_counts().await?;
            println!(
                "jobs: uploaded={} queued={} printing={} printed={}",
                c.uploaded, c.queued, c.printing, c.printed
            );
        }
        "queue" => print_job(&admin.queue(job_id_arg(&args)?).await?),
        "mark-printed" => print_job(&admin.mark_printed(job_id_arg(&args)?).await?),
        "delete" => {
            let job = admin.delete(job_id_arg(&args)?).await?;
            println!("deleted {}", job.id);
        }
        "seed" => {
            let n: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(5);
            for i in 0..n {
                let filename = format!("{}_seed-{i}.jpg", Uuid::new_v4());
                let job = engine
                    .create_job(NewJob {
                        url: format!("{}/blobs/{filename}", cfg.public_base_url.trim_end_matches('/')),
                        filename,
                        owner: "seed".to_string(),
                    })
                    .await?;
                println!("+ inserted job id={}", job.id);
            }
        }
        other => {
            eprintln!("Unknown command: {other}\n\n{USAGE}");
            std::process::exit(2);
        }
    }

    Ok(())
}

fn job_id_arg(args: &[String]) -> anyhow::Result<Uuid> {
    let raw = args
        .get(2)
        .ok_or_else(|| anyhow::anyhow!("usage: ppctl {} <job_id>", args[1]))?;
    Ok(raw.parse()?)
}

fn print_job(job: &Job) {
    println!(
        "{}  {:<8}  {}  {}  {}",
        job.id,
        job.status,
        job.created_at.to_rfc3339(),
        job.owner,
        job.filename
    );
}
