use std::path::PathBuf;
use std::time::Duration;

use partyprint::api::models::DispatchedJob;
use rand::{rngs::StdRng, SeedableRng};
use uuid::Uuid;

use crate::client::PrintServer;
use crate::printer::Printer;
use crate::retry::{next_delay_ms, RetryConfig};

/// What one pass of the poll loop did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Nothing queued, or the poll request itself failed.
    Idle { poll_failed: bool },
    Printed(Uuid),
    /// The job stays `printing` on the server; nobody re-dispatches it.
    DownloadFailed(Uuid),
    PrintFailed(Uuid),
    ReportFailed(Uuid),
}

#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub agent_id: String,
    pub download_dir: PathBuf,
    pub idle_backoff: Duration,
    pub error_backoff: Duration,
    pub report_attempts: u32,
    pub report_retry: RetryConfig,
}

pub struct PrinterAgent<S, P> {
    server: S,
    printer: P,
    settings: AgentSettings,
}

impl<S: PrintServer, P: Printer> PrinterAgent<S, P> {
    pub fn new(server: S, printer: P, settings: AgentSettings) -> Self {
        Self {
            server,
            printer,
            settings,
        }
    }

    /// Poll forever. The process exiting is the only way out.
    pub async fn run(&self) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.settings.download_dir).await?;
        tracing::info!(agent_id = %self.settings.agent_id, "[AGENT] polling for print jobs");

        loop {
            let pause = match self.poll_once().await {
                PollOutcome::Printed(_) => Duration::ZERO,
                PollOutcome::Idle { poll_failed: false } => self.settings.idle_backoff,
                _ => self.settings.error_backoff,
            };
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }
    }

    pub async fn poll_once(&self) -> PollOutcome {
        let job = match self.server.next_job().await {
            Ok(Some(job)) => job,
            Ok(None) => return PollOutcome::Idle { poll_failed: false },
            Err(e) => {
                tracing::warn!(error = %e, "[AGENT] error polling for next job");
                return PollOutcome::Idle { poll_failed: true };
            }
        };

        tracing::info!(job_id = %job.id, owner = %job.owner, "[AGENT] printing job");

        let local_path = match self.download(&job).await {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(job_id = %job.id, url = %job.url, error = %e, "[AGENT] download failed, job left in printing");
                return PollOutcome::DownloadFailed(job.id);
            }
        };

        if let Err(e) = self.printer.print(&local_path).await {
            tracing::error!(job_id = %job.id, error = %e, "[AGENT] print failed, job left in printing");
            return PollOutcome::PrintFailed(job.id);
        }
        tracing::info!(job_id = %job.id, path = %local_path.display(), "[AGENT] sent to printer");

        if self.report_printed(job.id).await {
            PollOutcome::Printed(job.id)
        } else {
            PollOutcome::ReportFailed(job.id)
        }
    }

    async fn download(&self, job: &DispatchedJob) -> anyhow::Result<PathBuf> {
        let bytes = self.server.download(&job.url).await?;
        let path = self.settings.download_dir.join(local_file_name(job));
        tokio::fs::write(&path, bytes).await?;
        tracing::info!(job_id = %job.id, path = %path.display(), "[AGENT] downloaded");
        Ok(path)
    }

    // Completion is idempotent on the server, so repeating it is always safe.
    async fn report_printed(&self, job_id: Uuid) -> bool {
        let mut rng = StdRng::from_entropy();
        let attempts = self.settings.report_attempts.max(1);

        for attempt in 1..=attempts {
            match self.server.mark_printed(job_id).await {
                Ok(()) => return true,
                Err(e) => {
                    tracing::warn!(job_id = %job_id, attempt, error = %e, "[AGENT] completion report failed");
                    if attempt < attempts {
                        let delay = next_delay_ms(attempt, &self.settings.report_retry, &mut rng);
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                    }
                }
            }
        }

        tracing::error!(job_id = %job_id, "[AGENT] giving up on completion report");
        false
    }
}

/// `<job id>.<ext>` with the extension of the stored file, `jpg` if it has none.
fn local_file_name(job: &DispatchedJob) -> String {
    let ext = std::path::Path::new(&job.filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("jpg");
    format!("{}.{}", job.id, ext)
}
