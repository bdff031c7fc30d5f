//! Error types for the qnav crate

use thiserror::Error;

use crate::types::{Axis, Position};

/// Main error type for the qnav crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(
        "position {position} maps to {axis} index {index}, outside the grid [0, {grid_size})"
    )]
    OutOfRangeState {
        axis: Axis,
        index: i64,
        grid_size: usize,
        position: Position,
    },

    #[error("position {position} has a non-finite coordinate")]
    NonFinitePosition { position: Position },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfiguration {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}
