use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Migration '{name}' failed: {source}")]
    Migration {
        name: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Invalid roulette number: {0}")]
    InvalidNumber(i64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    pub(crate) fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}
