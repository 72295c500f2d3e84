//! Serialized appends to the attack log
//!
//! All request handlers share one writer task. Each append waits for the
//! task to acknowledge the write, so a line is either fully on disk or
//! the caller sees the error.

use super::CaptureError;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

struct AppendRequest {
    line: String,
    ack: oneshot::Sender<io::Result<()>>,
}

/// Handle for queueing lines onto the attack log
#[derive(Clone)]
pub struct LogWriter {
    tx: mpsc::Sender<AppendRequest>,
}

impl LogWriter {
    /// Start the writer task for `path`
    ///
    /// Must be called from within a tokio runtime. The task exits once
    /// every `LogWriter` clone has been dropped.
    pub fn spawn(path: PathBuf, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(Self::run(path, rx));
        (LogWriter { tx }, handle)
    }

    /// Append one newline-terminated line
    pub async fn append(&self, line: String) -> Result<(), CaptureError> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(AppendRequest { line, ack })
            .await
            .map_err(|_| CaptureError::WriterClosed)?;
        done.await.map_err(|_| CaptureError::WriterClosed)??;
        Ok(())
    }

    async fn run(path: PathBuf, mut rx: mpsc::Receiver<AppendRequest>) {
        log::info!("Attack log writer started for {:?}", path);

        while let Some(request) = rx.recv().await {
            let result = Self::append_line(&path, &request.line).await;
            if let Err(ref e) = result {
                log::error!("Failed to append to {:?}: {}", path, e);
            }
            // The requester may have gone away; the line is written either way.
            let _ = request.ack.send(result);
        }

        log::info!("Attack log writer stopped");
    }

    async fn append_line(path: &Path, line: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}
