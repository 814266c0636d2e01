//! Read-only tails of today's log files. Diagnostic only.

use crate::logging::{app_log_path, message_log_path};
use crate::state::AppState;
use crate::utils::error::ApiError;
use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const LOG_TAIL_LINES: usize = 50;
const MESSAGE_TAIL_ENTRIES: usize = 20;

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub logs: Vec<String>,
    pub total_lines: usize,
}

#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<Value>,
    pub total_messages: usize,
}

/// `GET /logs`: last lines of today's application log
pub async fn logs_handler(State(state): State<Arc<AppState>>) -> Result<Json<LogsResponse>, ApiError> {
    let logging = &state.settings.logging;
    let path = app_log_path(&logging.directory, &logging.app_log_prefix, Utc::now().date_naive());

    let lines = read_lines(&path).await?;
    let total_lines = lines.len();

    Ok(Json(LogsResponse {
        logs: tail(lines, LOG_TAIL_LINES),
        total_lines,
    }))
}

/// `GET /messages`: last entries of today's message log
pub async fn messages_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let path = message_log_path(&state.settings.logging.directory, Utc::now().date_naive());

    let lines = read_lines(&path).await?;
    let total_messages = lines.len();
    let messages = tail(lines, MESSAGE_TAIL_ENTRIES)
        .iter()
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .collect();

    Ok(Json(MessagesResponse {
        messages,
        total_messages,
    }))
}

/// Lines of `path`; a missing file reads as empty.
async fn read_lines(path: &Path) -> Result<Vec<String>, ApiError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(content.lines().map(str::to_string).collect()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Log file {:?} not found", path);
            Ok(Vec::new())
        }
        Err(e) => Err(ApiError::InternalError(format!("Failed to read {:?}: {}", path, e))),
    }
}

fn tail(mut lines: Vec<String>, n: usize) -> Vec<String> {
    let start = lines.len().saturating_sub(n);
    lines.split_off(start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail() {
        let lines: Vec<String> = (0..5).map(|i| i.to_string()).collect();
        assert_eq!(tail(lines.clone(), 2), vec!["3", "4"]);
        assert_eq!(tail(lines, 10).len(), 5);
        assert!(tail(Vec::new(), 3).is_empty());
    }
}
