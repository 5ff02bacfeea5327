use thiserror::Error;

/// Failures while installing the global log subscriber.
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("unknown log format {0:?} (expected text, json or journald)")]
    InvalidFormat(String),
    #[error("journald output needs Linux and the `journald` feature")]
    JournaldNotSupported,
    #[error("a global log subscriber is already installed")]
    AlreadyInitialized,
    #[error("log subscriber setup failed: {0}")]
    InitializationFailed(String),
    #[error("invalid log filter {0:?}")]
    InvalidLogLevel(String),
    #[error("{0} is set but is not valid unicode")]
    NonUnicodeEnv(&'static str),
}
