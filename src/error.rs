use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoreboardError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown {kind} {id}")]
    UnknownEntity { kind: &'static str, id: u64 },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl ScoreboardError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScoreboardError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        ScoreboardError::Json {
            path: path.into(),
            source,
        }
    }

    /// True for the "file was already gone" case, which removals ignore.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ScoreboardError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

pub type Result<T, E = ScoreboardError> = std::result::Result<T, E>;
