use std::path::PathBuf;

use crate::hash::Hash;

/// error type for cellar operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("repository not found at {0}")]
    NoRepo(PathBuf),

    #[error("repository already exists at {0}")]
    RepoExists(PathBuf),

    #[error("invalid hash (expected 40 lowercase hex characters): {0}")]
    InvalidHash(String),

    #[error("invalid cell: {0}")]
    InvalidCell(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid rollback kind: {0}")]
    InvalidRollbackKind(String),

    #[error("invalid object type: {0}")]
    InvalidObjectType(String),

    #[error("workbook not found: {0}")]
    WorkbookNotFound(String),

    #[error("object not found: {0}")]
    ObjectNotFound(Hash),

    #[error("corrupt object: {0}")]
    CorruptObject(Hash),

    #[error("corrupt object: {0}")]
    CorruptObjectMessage(String),

    #[error("corrupt commit {0}: missing tree hash")]
    CorruptCommit(Hash),

    #[error("nothing to {0}")]
    Empty(&'static str),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("index serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("config serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// helper to wrap io errors with path context
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.into(),
            source,
        })
    }
}
