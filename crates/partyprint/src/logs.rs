//! Tail a log file as an endless stream of lines.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::stream::{self, Stream};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};

pub const MISSING_LOG_LINE: &str = "(no log file yet)";

enum Tail {
    Start { path: PathBuf, poll: Duration },
    Follow {
        path: PathBuf,
        reader: BufReader<File>,
        pending: String,
        pos: u64,
        poll: Duration,
    },
    Done,
}

/// Lines appended to `path` after the stream is first polled.
///
/// Never ends on its own while the file exists: at end of file it sleeps `poll`
/// and reads again. Partial lines are held until their newline arrives. When
/// the file at `path` is shorter than what was already read, it was rotated or
/// truncated, and reading restarts from its beginning. A missing file yields
/// [`MISSING_LOG_LINE`] once and ends. Each call opens the file anew, so a
/// dropped consumer can simply call it again.
pub fn tail_lines(path: impl Into<PathBuf>, poll: Duration) -> impl Stream<Item = String> {
    let start = Tail::Start {
        path: path.into(),
        poll,
    };

    stream::unfold(start, |state| async move {
        let (path, mut reader, mut pending, mut pos, poll) = match state {
            Tail::Done => return None,
            Tail::Follow {
                path,
                reader,
                pending,
                pos,
                poll,
            } => (path, reader, pending, pos, poll),
            Tail::Start { path, poll } => {
                let Ok(mut file) = File::open(&path).await else {
                    return Some((MISSING_LOG_LINE.to_string(), Tail::Done));
                };
                let pos = match file.seek(SeekFrom::End(0)).await {
                    Ok(pos) => pos,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "log tail seek failed");
                        0
                    }
                };
                (path, BufReader::new(file), String::new(), pos, poll)
            }
        };

        loop {
            match reader.read_line(&mut pending).await {
                Ok(0) => {
                    if let Some(file) = reopen_if_rotated(&path, pos).await {
                        reader = BufReader::new(file);
                        pending.clear();
                        pos = 0;
                        continue;
                    }
                    tokio::time::sleep(poll).await;
                }
                Ok(n) => {
                    pos += n as u64;
                    if pending.ends_with('\n') {
                        let line = pending.trim_end().to_string();
                        pending.clear();
                        return Some((
                            line,
                            Tail::Follow {
                                path,
                                reader,
                                pending,
                                pos,
                                poll,
                            },
                        ));
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "log tail read failed");
                    tokio::time::sleep(poll).await;
                }
            }
        }
    })
}

async fn reopen_if_rotated(path: &Path, pos: u64) -> Option<File> {
    let len = tokio::fs::metadata(path).await.ok()?.len();
    if len >= pos {
        return None;
    }
    tracing::debug!(path = %path.display(), "log file rotated, following the new file");
    File::open(path).await.ok()
}
