mod agent;
mod client;
mod config;
mod printer;
mod retry;

use agent::{AgentSettings, PrinterAgent};
use client::HttpPrintServer;
use printer::CommandPrinter;
use retry::RetryConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::AgentConfig::from_env()?;

    partyprint::telemetry::init_tracing("info", None)?;

    tracing::info!(
        agent_id = %cfg.agent_id,
        server = %cfg.server_url,
        download_dir = %cfg.download_dir.display(),
        print_command = %cfg.print_command,
        idle_backoff_ms = cfg.idle_backoff.as_millis() as u64,
        error_backoff_ms = cfg.error_backoff.as_millis() as u64,
        "partyprint agent starting"
    );

    let server = HttpPrintServer::new(&cfg.server_url, cfg.request_timeout)?;
    let printer = CommandPrinter::new(cfg.print_command.clone());

    let agent = PrinterAgent::new(
        server,
        printer,
        AgentSettings {
            agent_id: cfg.agent_id,
            download_dir: cfg.download_dir,
            idle_backoff: cfg.idle_backoff,
            error_backoff: cfg.error_backoff,
            report_attempts: cfg.report_attempts,
            report_retry: RetryConfig::default(),
        },
    );

    agent.run().await
}
