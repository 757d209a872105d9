use acct_config::ConfigError;
use acct_core::SwapError;

use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Swap(#[from] SwapError),

    #[error("Failed to initialize logger: {message} {location}")]
    Logger {
        message: String,
        location: ErrorLocation,
    },

    #[error("Failed to render output: {source} {location}")]
    Output {
        #[source]
        source: serde_json::Error,
        location: ErrorLocation,
    },

    #[error("Failed to wait for interrupt: {source} {location}")]
    Signal {
        #[source]
        source: std::io::Error,
        location: ErrorLocation,
    },
}

impl CliError {
    #[track_caller]
    pub fn logger(message: impl Into<String>) -> Self {
        Self::Logger {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn output(source: serde_json::Error) -> Self {
        Self::Output {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn signal(source: std::io::Error) -> Self {
        Self::Signal {
            source,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    pub fn recovery_hint(&self) -> &'static str {
        match self {
            Self::Swap(e) => e.recovery_hint(),
            Self::Config(_) => "Check config.toml and the ACCT_* environment variables.",
            Self::Logger { .. } => "Check logging.dir and logging.file in config.toml.",
            Self::Output { .. } => "Internal error rendering output. Please report it.",
            Self::Signal { .. } => "The terminal did not deliver Ctrl-C; stop the process instead.",
        }
    }
}

pub type CliResult<T> = std::result::Result<T, CliError>;
