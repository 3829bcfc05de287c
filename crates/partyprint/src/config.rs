use std::path::PathBuf;

// Everything the server reads from the environment, typed once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: Option<String>,
    pub api_addr: String,
    pub migrate_on_startup: bool,
    pub blob_dir: PathBuf,
    pub public_base_url: String,
    pub log_path: PathBuf,
    pub auto_queue: bool,
    pub max_upload_bytes: usize,
    pub dispatch_scan_batch: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        // No database means the in-memory store; the server decides and warns.
        let database_url = env_or_fallback("PARTYPRINT_DATABASE_URL", "DATABASE_URL");

        let api_addr = env_or_fallback("PARTYPRINT_API_ADDR", "API_ADDR")
            .unwrap_or_else(|| "0.0.0.0:5050".to_string());

        let migrate_on_startup = env_bool("PARTYPRINT_MIGRATE_ON_STARTUP").unwrap_or(false);

        let blob_dir = env_or_fallback("PARTYPRINT_BLOB_DIR", "UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./uploads"));

        let public_base_url = env_or_fallback("PARTYPRINT_PUBLIC_BASE_URL", "PUBLIC_BASE_URL")
            .unwrap_or_else(|| "http://localhost:5050".to_string());

        let log_path = env_or_fallback("PARTYPRINT_LOG_PATH", "LOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./partyprint.log"));

        let auto_queue = env_bool("PARTYPRINT_AUTO_QUEUE").unwrap_or(false);

        let max_upload_bytes: usize = env_or_fallback("PARTYPRINT_MAX_UPLOAD_BYTES", "MAX_UPLOAD_BYTES")
            .map(|s| {
                s.parse()
                    .map_err(|_| anyhow::anyhow!("PARTYPRINT_MAX_UPLOAD_BYTES must be a number"))
            })
            .transpose()?
            .unwrap_or(20 * 1024 * 1024);

        let dispatch_scan_batch = env_or_fallback("PARTYPRINT_DISPATCH_SCAN_BATCH", "DISPATCH_SCAN_BATCH")
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(16)
            .clamp(1, 256);

        Ok(Self {
            database_url,
            api_addr,
            migrate_on_startup,
            blob_dir,
            public_base_url,
            log_path,
            auto_queue,
            max_upload_bytes,
            dispatch_scan_batch,
        })
    }
}

pub fn env_or_fallback(primary: &str, fallback: &str) -> Option<String> {
    std::env::var(primary)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| std::env::var(fallback).ok().filter(|s| !s.trim().is_empty()))
}

pub fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}
