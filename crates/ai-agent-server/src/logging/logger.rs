use anyhow::Result;
use chrono::{NaiveDate, Utc};
use flume::{bounded, Receiver, Sender};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::types::MessageLog;
use crate::config::LoggingConfig;

/// `messages_YYYYMMDD.log` inside `directory`.
pub fn message_log_path(directory: &Path, date: NaiveDate) -> PathBuf {
    directory.join(format!("messages_{}.log", date.format("%Y%m%d")))
}

/// Daily file written by the tracing appender (`{prefix}.YYYY-MM-DD.log`).
pub fn app_log_path(directory: &Path, prefix: &str, date: NaiveDate) -> PathBuf {
    directory.join(format!("{}.{}.log", prefix, date.format("%Y-%m-%d")))
}

/// Logger configuration
#[derive(Debug, Clone)]
pub struct MessageLoggerConfig {
    /// Queue capacity (entries beyond this are dropped)
    pub queue_capacity: usize,

    /// Max entries written per flush
    pub batch_size: usize,

    /// Max wait time before flushing a partial batch (milliseconds)
    pub batch_timeout_ms: u64,
}

impl Default for MessageLoggerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            batch_size: 50,
            batch_timeout_ms: 200,
        }
    }
}

impl From<&LoggingConfig> for MessageLoggerConfig {
    fn from(config: &LoggingConfig) -> Self {
        Self {
            queue_capacity: config.queue_capacity.max(1),
            ..Self::default()
        }
    }
}

/// Appends entries to the day's message file, rotating once it grows past
/// `max_bytes`.
#[derive(Debug, Clone)]
pub struct MessageFileSink {
    directory: PathBuf,
    max_bytes: u64,
}

impl MessageFileSink {
    pub fn new(directory: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            directory: directory.into(),
            max_bytes,
        }
    }

    pub fn from_config(config: &LoggingConfig) -> Self {
        Self::new(config.directory.clone(), config.max_message_log_bytes)
    }

    pub fn current_path(&self) -> PathBuf {
        message_log_path(&self.directory, Utc::now().date_naive())
    }

    pub async fn append(&self, batch: &[MessageLog]) -> Result<usize> {
        if batch.is_empty() {
            return Ok(0);
        }

        fs::create_dir_all(&self.directory).await?;
        let path = self.current_path();
        self.rotate_if_full(&path).await?;

        let mut buf = String::new();
        for entry in batch {
            buf.push_str(&entry.to_json_line());
            buf.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(buf.as_bytes()).await?;
        file.flush().await?;

        Ok(batch.len())
    }

    async fn rotate_if_full(&self, path: &Path) -> Result<()> {
        let len = match fs::metadata(path).await {
            Ok(meta) => meta.len(),
            Err(_) => return Ok(()),
        };

        if len >= self.max_bytes {
            let rotated = Self::next_generation(path).await;
            fs::rename(path, &rotated).await?;
            info!("Rotated message log {:?} ({} bytes) to {:?}", path, len, rotated);
        }

        Ok(())
    }

    /// First unused `messages_YYYYMMDD.N.log`, so earlier rotations survive.
    async fn next_generation(path: &Path) -> PathBuf {
        let mut generation = 1u32;
        loop {
            let candidate = path.with_extension(format!("{}.log", generation));
            if !fs::try_exists(&candidate).await.unwrap_or(false) {
                return candidate;
            }
            generation += 1;
        }
    }
}

/// Message logger backed by a bounded queue and a background file writer
#[derive(Clone)]
pub struct MessageLogger {
    sender: Sender<MessageLog>,
}

impl MessageLogger {
    /// Start the background writer. Must be called inside a Tokio runtime.
    pub fn new(sink: MessageFileSink, config: MessageLoggerConfig) -> Self {
        Self::spawn(sink, config).0
    }

    /// Like [`MessageLogger::new`], also returning the writer task. The task
    /// drains the queue and exits once every logger clone is dropped.
    pub fn spawn(sink: MessageFileSink, config: MessageLoggerConfig) -> (Self, JoinHandle<()>) {
        let (logger, receiver) = Self::channel(config.queue_capacity);

        info!(
            "Initializing MessageLogger: queue={}, batch={}, timeout={}ms",
            config.queue_capacity, config.batch_size, config.batch_timeout_ms
        );

        let handle = tokio::spawn(async move {
            Self::worker_loop(sink, receiver, config).await;
        });

        (logger, handle)
    }

    /// Logger without a writer; entries are left on the returned receiver.
    pub fn channel(capacity: usize) -> (Self, Receiver<MessageLog>) {
        let (sender, receiver) = bounded(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Log entry (non-blocking, fire-and-forget)
    pub fn log(&self, entry: MessageLog) {
        info!(
            direction = entry.direction.as_str(),
            phone_number = %entry.phone_number,
            "MESSAGE_LOG: {}",
            entry.to_json_line()
        );

        if let Err(e) = self.sender.try_send(entry) {
            warn!("Failed to enqueue message log (queue full?): {}", e);
        }
    }

    async fn worker_loop(
        sink: MessageFileSink,
        receiver: Receiver<MessageLog>,
        config: MessageLoggerConfig,
    ) {
        info!("Message log writer started");

        let batch_timeout = Duration::from_millis(config.batch_timeout_ms);
        let mut batch: Vec<MessageLog> = Vec::with_capacity(config.batch_size);

        // Block for the first entry, then gather more until the batch fills or times out.
        while let Ok(first) = receiver.recv_async().await {
            batch.push(first);
            let deadline = tokio::time::Instant::now() + batch_timeout;

            while batch.len() < config.batch_size {
                match tokio::time::timeout_at(deadline, receiver.recv_async()).await {
                    Ok(Ok(entry)) => batch.push(entry),
                    Ok(Err(_)) | Err(_) => break,
                }
            }

            Self::flush_batch(&sink, &batch).await;
            batch.clear();
        }

        info!("Message log writer shutting down (channel closed)");
    }

    async fn flush_batch(sink: &MessageFileSink, batch: &[MessageLog]) {
        match sink.append(batch).await {
            Ok(written) => debug!("Wrote {} message log entries", written),
            Err(e) => error!("Failed to write {} message log entries: {}", batch.len(), e),
        }
    }

    /// Get queue length (for monitoring)
    pub fn queue_len(&self) -> usize {
        self.sender.len()
    }
}
