use std::path::PathBuf;
use std::time::Duration;

use partyprint::config::env_or_fallback;

#[derive(Clone, Debug)]
pub struct AgentConfig {
    pub server_url: String,
    pub agent_id: String,
    pub download_dir: PathBuf,
    pub print_command: String,
    pub idle_backoff: Duration,
    pub error_backoff: Duration,
    pub request_timeout: Duration,
    pub report_attempts: u32,
}

impl AgentConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let server_url = env_or_fallback("PARTYPRINT_SERVER", "SERVER")
            .unwrap_or_else(|| "http://localhost:5050".to_string())
            .trim_end_matches('/')
            .to_string();

        let agent_id = env_or_fallback("PARTYPRINT_AGENT_ID", "AGENT_ID")
            .or_else(|| std::env::var("HOSTNAME").ok())
            .unwrap_or_else(|| "agent-1".to_string());

        let download_dir = env_or_fallback("PARTYPRINT_DOWNLOAD_DIR", "DOWNLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/tmp/partyprints"));

        let print_command = env_or_fallback("PARTYPRINT_PRINT_COMMAND", "PRINT_COMMAND")
            .unwrap_or_else(|| "lp".to_string());

        let idle_backoff = Duration::from_millis(env_u64("PARTYPRINT_IDLE_BACKOFF_MS", 3_000));
        let error_backoff = Duration::from_millis(env_u64("PARTYPRINT_ERROR_BACKOFF_MS", 5_000));
        let request_timeout =
            Duration::from_secs(env_u64("PARTYPRINT_REQUEST_TIMEOUT_SECS", 10).max(1));
        let report_attempts = env_u64("PARTYPRINT_REPORT_ATTEMPTS", 5).clamp(1, 100) as u32;

        Ok(Self {
            server_url,
            agent_id,
            download_dir,
            print_command,
            idle_backoff,
            error_backoff,
            request_timeout,
            report_attempts,
        })
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
