use std::path::Path;
use std::sync::Mutex;

use file_rotate::{compression::Compression, suffix::AppendCount, ContentLimit, FileRotate};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_FILE_MAX_BYTES: usize = 2 * 1024 * 1024;
pub const LOG_FILE_BACKUPS: usize = 5;

/// Install the global subscriber: stdout always, plus a plain-text copy in
/// `log_file` when given (that copy is what `/logs` tails). The file is rotated
/// to `<name>.1` .. `<name>.5` once it passes 2 MiB.
pub fn init_tracing(default_filter: &str, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let writer = rotating_log_file(path, LOG_FILE_MAX_BYTES, LOG_FILE_BACKUPS);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(writer)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .try_init()?;

    Ok(())
}

/// Appends to `path`; after a write takes it past `max_bytes` the file moves to
/// `<path>.1` (older copies shift up, at most `backups` kept) and a fresh file
/// starts. Whole writes are never split across files.
pub fn rotating_log_file(path: &Path, max_bytes: usize, backups: usize) -> FileRotate<AppendCount> {
    FileRotate::new(
        path,
        AppendCount::new(backups),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::None,
        #[cfg(unix)]
        None,
    )
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn log_file_rotates_and_keeps_bounded_backups() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partyprint.log");

        let mut writer = rotating_log_file(&path, 64, 2);
        for i in 0..40 {
            writer
                .write_all(format!("[DISPATCH] job {i:02} sent to printer\n").as_bytes())
                .unwrap();
        }
        writer.flush().unwrap();

        let live = std::fs::metadata(&path).unwrap().len();
        assert!(live < 128, "live file should have been rotated, got {live} bytes");
        assert!(dir.path().join("partyprint.log.1").exists());
        assert!(dir.path().join("partyprint.log.2").exists());
        assert!(!dir.path().join("partyprint.log.3").exists());

        // newest line is in the live file or the most recent backup
        let recent = std::fs::read_to_string(&path).unwrap()
            + &std::fs::read_to_string(dir.path().join("partyprint.log.1")).unwrap();
        assert!(recent.contains("job 39 sent to printer"));
    }
}
