use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EtsErr>;

/// Failure to compile a timestamp format string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("unknown time format specification: %{directive}")]
    UnknownDirective { directive: char },

    #[error("stray % at end of format string")]
    TrailingPercent,
}

/// Invalid user configuration. Always detected before any output is written.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid format string: {0}")]
    Format(#[from] FormatError),

    #[error("unknown time zone {name}")]
    UnknownTimeZone { name: String },

    #[error("error parsing delimiter string: {reason}")]
    InvalidDelimiter { reason: String },

    #[error("conflicting flags --elapsed and --incremental")]
    ConflictingModes,

    #[error("conflicting flags --utc and --timezone")]
    ConflictingTimeZones,
}

#[derive(Debug, Error)]
pub enum EtsErr {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The child could not be started, or the pty could not be allocated.
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl EtsErr {
    pub(crate) fn spawn(program: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Spawn {
            program: program.into(),
            source: source.into(),
        }
    }
}
