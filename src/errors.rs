use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("configuration error in {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: ConfigSource,
    },
    #[error("failed to {action} {}: {source}", .path.display())]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to launch {}: {source}", .script.display())]
    Launch {
        script: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("environment error: {0}")]
    Environment(String),
}

#[derive(Debug, Error)]
pub enum ConfigSource {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
}

impl SetupError {
    pub fn filesystem(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        SetupError::Filesystem {
            action,
            path: path.into(),
            source,
        }
    }
}

pub type SetupResult<T> = Result<T, SetupError>;
