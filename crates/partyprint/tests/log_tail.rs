// tests/log_tail.rs
use std::io::Write;
use std::time::Duration;

use futures::StreamExt;
use partyprint::logs::{tail_lines, MISSING_LOG_LINE};

const POLL: Duration = Duration::from_millis(20);

fn append(path: &std::path::Path, text: &str) {
    let mut f = std::fs::OpenOptions::new().append(true).open(path).unwrap();
    f.write_all(text.as_bytes()).unwrap();
    f.flush().unwrap();
}

#[tokio::test]
async fn missing_file_yields_one_notice() {
    let dir = tempfile::tempdir().unwrap();
    let lines: Vec<String> = tail_lines(dir.path().join("nope.log"), POLL).collect().await;
    assert_eq!(lines, vec![MISSING_LOG_LINE.to_string()]);
}

#[tokio::test]
async fn only_new_lines_are_streamed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    std::fs::write(&path, "old line\n").unwrap();

    let mut lines = Box::pin(tail_lines(path.clone(), POLL));

    let writer_path = path.clone();
    let writer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        append(&writer_path, "[DISPATCH] first\n");
        // half a line, then the rest
        append(&writer_path, "[PRINTED] sec");
        tokio::time::sleep(Duration::from_millis(100)).await;
        append(&writer_path, "ond\n");
    });

    let first = tokio::time::timeout(Duration::from_secs(5), lines.next())
        .await
        .expect("timed out")
        .expect("stream ended");
    assert_eq!(first, "[DISPATCH] first");

    let second = tokio::time::timeout(Duration::from_secs(5), lines.next())
        .await
        .expect("timed out")
        .expect("stream ended");
    assert_eq!(second, "[PRINTED] second");

    writer.await.unwrap();
}

#[tokio::test]
async fn idle_file_keeps_the_stream_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    std::fs::write(&path, "").unwrap();

    let mut lines = Box::pin(tail_lines(path, POLL));
    let res = tokio::time::timeout(Duration::from_millis(150), lines.next()).await;
    assert!(res.is_err(), "no line should arrive and the stream should not end");
}

#[tokio::test]
async fn rotated_file_is_followed_from_its_start() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.log");
    std::fs::write(&path, "").unwrap();

    let mut lines = Box::pin(tail_lines(path.clone(), POLL));

    let writer_path = path.clone();
    let writer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        append(&writer_path, "[UPLOAD] before rotation\n");
        tokio::time::sleep(Duration::from_millis(200)).await;
        std::fs::rename(&writer_path, writer_path.with_extension("log.1")).unwrap();
        std::fs::write(&writer_path, "fresh\n").unwrap();
    });

    let first = tokio::time::timeout(Duration::from_secs(5), lines.next())
        .await
        .expect("timed out")
        .expect("stream ended");
    assert_eq!(first, "[UPLOAD] before rotation");

    let second = tokio::time::timeout(Duration::from_secs(5), lines.next())
        .await
        .expect("timed out")
        .expect("stream ended");
    assert_eq!(second, "fresh");

    writer.await.unwrap();
}
