use std::io::IsTerminal;

use serde::{Deserialize, Serialize};

use crate::logger::{error::LoggerError, format::LoggerFormat, level::LoggerLevel};

/// Environment variable holding the filter directives.
pub const ENV_LEVEL: &str = "FLO_LOG";
/// Environment variable holding the output format.
pub const ENV_FORMAT: &str = "FLO_LOG_FORMAT";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    pub level: LoggerLevel,
    pub with_targets: bool,
    pub use_color: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::Text,
            level: LoggerLevel::default(),
            with_targets: true,
            use_color: std::io::stdout().is_terminal(),
        }
    }
}

impl LoggerConfig {
    /// Defaults overridden by `FLO_LOG` and `FLO_LOG_FORMAT` when set.
    pub fn from_env() -> Result<Self, LoggerError> {
        let mut cfg = Self::default();
        if let Some(level) = read_env(ENV_LEVEL)? {
            cfg.level = LoggerLevel::new(level)?;
        }
        if let Some(format) = read_env(ENV_FORMAT)? {
            cfg.format = format.parse()?;
        }
        Ok(cfg)
    }
}

fn read_env(var: &'static str) -> Result<Option<String>, LoggerError> {
    match std::env::var(var) {
        Ok(v) if v.trim().is_empty() => Ok(None),
        Ok(v) => Ok(Some(v)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => Err(LoggerError::NonUnicodeEnv(var)),
    }
}
