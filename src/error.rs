use std::{io, path::PathBuf};

use thiserror::Error;

use crate::database::player_store::StoreError;

#[derive(Debug, Error)]
pub enum WrsError {
    #[error("failed to access {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to serialize run summary: {0}")]
    Json(#[from] serde_json::Error)
}

impl WrsError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> WrsError {
        WrsError::Io {
            path: path.into(),
            source
        }
    }
}
