//! Line-delimited JSON transport for hosts that talk to the bridge over a
//! pipe instead of a webview.
//!
//! The first line written is `{"ready": SystemInfo}`. After that every input
//! line is one call, handled on its own task; replies are written as they
//! finish and carry the caller's `id`.

use std::sync::Arc;

use serde_json::json;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use crate::commands::Bridge;
use crate::models::{BridgeReply, BridgeResult};

/// Longest accepted input line, newline excluded.
pub const MAX_LINE_BYTES: usize = 1 << 20;
/// Calls allowed to run at once; reading pauses while all are busy.
const MAX_IN_FLIGHT: usize = 64;
/// Encoded replies waiting for the writer.
const REPLY_QUEUE: usize = 256;

pub async fn serve_stdio(bridge: Bridge) -> anyhow::Result<()> {
    serve(bridge, tokio::io::stdin(), tokio::io::stdout()).await
}

pub async fn serve<R, W>(bridge: Bridge, reader: R, writer: W) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<String>(REPLY_QUEUE);
    let writer_task = tokio::spawn(async move {
        let mut writer = writer;
        while let Some(line) = rx.recv().await {
            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
        writer.shutdown().await?;
        Ok::<_, std::io::Error>(())
    });

    tx.send(json!({ "ready": bridge.system_info() }).to_string())
        .await?;

    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let permits = Arc::new(Semaphore::new(MAX_IN_FLIGHT));
    let mut calls = JoinSet::new();

    let read_result = loop {
        while let Some(joined) = calls.try_join_next() {
            log_join(joined);
        }

        let line = match read_line(&mut reader, &mut buf).await {
            Ok(Some(line)) => line,
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        };
        let line = match line {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => line,
            Err(reason) => {
                tracing::warn!(%reason, "unreadable bridge input");
                let reply = BridgeReply {
                    id: None,
                    result: BridgeResult::invalid_request(reason),
                };
                send_reply(&tx, &reply).await;
                continue;
            }
        };

        let permit = permits.clone().acquire_owned().await?;
        let bridge = bridge.clone();
        let tx = tx.clone();
        calls.spawn(async move {
            let reply = bridge.handle_message(&line).await;
            send_reply(&tx, &reply).await;
            drop(permit);
        });
    };

    while let Some(joined) = calls.join_next().await {
        log_join(joined);
    }
    drop(tx);
    writer_task.await??;
    read_result?;
    tracing::info!("input closed, bridge stopped");
    Ok(())
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        tracing::error!(error = %e, "bridge call task failed");
    }
}

async fn send_reply(tx: &mpsc::Sender<String>, reply: &BridgeReply) {
    match serde_json::to_string(reply) {
        Ok(encoded) => {
            if tx.send(encoded).await.is_err() {
                tracing::warn!(id = reply.id, "reply dropped, output closed");
            }
        }
        Err(e) => tracing::error!(id = reply.id, error = %e, "failed to encode reply"),
    }
}

/// Reads one newline-terminated line of at most [`MAX_LINE_BYTES`].
///
/// `Ok(None)` is end of input. A line that is too long or not UTF-8 is
/// consumed in full and returned as `Some(Err(reason))` so the caller can
/// answer it and keep reading.
async fn read_line<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
) -> std::io::Result<Option<Result<String, String>>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let mut seen_any = false;
    let mut oversized = false;

    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            if !seen_any {
                return Ok(None);
            }
            break;
        }
        seen_any = true;

        let (chunk_len, consumed, done) = match available.iter().position(|b| *b == b'\n') {
            Some(at) => (at, at + 1, true),
            None => (available.len(), available.len(), false),
        };
        if !oversized {
            if buf.len() + chunk_len > MAX_LINE_BYTES {
                oversized = true;
                buf.clear();
            } else {
                buf.extend_from_slice(&available[..chunk_len]);
            }
        }
        reader.consume(consumed);
        if done {
            break;
        }
    }

    if oversized {
        return Ok(Some(Err(format!(
            "line exceeds {MAX_LINE_BYTES} bytes"
        ))));
    }
    Ok(Some(
        String::from_utf8(std::mem::take(buf))
            .map_err(|e| format!("line is not valid UTF-8: {e}")),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShellConfig;
    use crate::services::FileSystemService;
    use serde_json::Value;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn answers_every_line_after_the_handshake() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "abc").unwrap();
        let bridge = Bridge::new(FileSystemService::new(&ShellConfig::default()));
        let input = format!(
            "{}\n\n{}\nnot json\n",
            json!({"id": 1, "request": {"op": "list-directory", "args": {"path": dir.path()}}}),
            json!({"id": 2, "request": {"op": "delete", "args": {"path": dir.path().join("missing")}}}),
        );
        let (writer, mut output) = tokio::io::duplex(1 << 20);

        serve(bridge, input.as_bytes(), writer).await.unwrap();

        let mut raw = String::new();
        output.read_to_string(&mut raw).await.unwrap();
        let lines: Vec<Value> = raw
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0]["ready"]["operations"].as_array().unwrap().len(), 5);

        let by_id = |id: u64| {
            lines
                .iter()
                .find(|l| l["id"].as_u64() == Some(id))
                .unwrap()
                .clone()
        };
        assert_eq!(by_id(1)["result"]["ok"][0]["name"], "a.txt");
        assert_eq!(by_id(1)["result"]["ok"][0]["size"], 3);
        assert_eq!(by_id(2)["result"]["error"], "io");

        let malformed = lines.iter().find(|l| l["id"].is_null() && l.get("result").is_some());
        assert_eq!(malformed.unwrap()["result"]["error"], "invalid-request");
    }

    async fn run(input: Vec<u8>) -> Vec<Value> {
        let bridge = Bridge::new(FileSystemService::new(&ShellConfig::default()));
        let (writer, mut output) = tokio::io::duplex(1 << 20);

        serve(bridge, input.as_slice(), writer).await.unwrap();

        let mut raw = String::new();
        output.read_to_string(&mut raw).await.unwrap();
        raw.lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn keeps_serving_after_bytes_that_are_not_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let mut input = b"\xff\xfe garbage\n".to_vec();
        input.extend_from_slice(
            json!({"id": 9, "request": {"op": "list-directory", "args": {"path": dir.path()}}})
                .to_string()
                .as_bytes(),
        );
        input.push(b'\n');

        let lines = run(input).await;

        assert_eq!(lines.len(), 3);
        let rejected = lines
            .iter()
            .find(|l| l["id"].is_null() && l.get("result").is_some())
            .unwrap();
        assert_eq!(rejected["result"]["error"], "invalid-request");
        let answered = lines.iter().find(|l| l["id"] == 9).unwrap();
        assert_eq!(answered["result"]["ok"], json!([]));
    }

    #[tokio::test]
    async fn oversized_lines_are_refused_and_skipped() {
        let mut input = vec![b'a'; MAX_LINE_BYTES + 10];
        input.push(b'\n');
        input.extend_from_slice(br#"{"id": 3, "request": {"op": "get-drives"}}"#);
        // no trailing newline on the last call

        let lines = run(input).await;

        assert_eq!(lines.len(), 3);
        let rejected = lines
            .iter()
            .find(|l| l["id"].is_null() && l.get("result").is_some())
            .unwrap();
        assert!(rejected["result"]["message"]
            .as_str()
            .unwrap()
            .contains("exceeds"));
        assert!(lines.iter().any(|l| l["id"] == 3));
    }

    #[tokio::test]
    async fn read_line_splits_on_newlines() {
        let mut reader = BufReader::new(&b"one\n\ntwo"[..]);
        let mut buf = Vec::new();

        assert_eq!(
            read_line(&mut reader, &mut buf).await.unwrap(),
            Some(Ok("one".to_string()))
        );
        assert_eq!(
            read_line(&mut reader, &mut buf).await.unwrap(),
            Some(Ok(String::new()))
        );
        assert_eq!(
            read_line(&mut reader, &mut buf).await.unwrap(),
            Some(Ok("two".to_string()))
        );
        assert_eq!(read_line(&mut reader, &mut buf).await.unwrap(), None);
    }
}
