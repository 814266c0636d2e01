//! Message logging (queued NDJSON files) and tracing setup

mod logger;
mod subscriber;
pub mod types;

pub use logger::{app_log_path, message_log_path, MessageFileSink, MessageLogger, MessageLoggerConfig};
pub use subscriber::init_logger;
pub use types::{Direction, MessageLog};
