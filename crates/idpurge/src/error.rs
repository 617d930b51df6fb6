use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PurgeError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Property list error: {0}")]
    Plist(#[from] plist::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid identity '{value}': {reason}")]
    InvalidIdentity { value: String, reason: String },

    #[error("Unreadable document {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("{app} is running")]
    PreconditionBlocked { app: String },

    #[error("{path} changed since it was scanned")]
    ChangedSinceScan { path: PathBuf },

    #[error("No match recorded for {0}")]
    NoMatch(PathBuf),

    #[error("Audit log error: {0}")]
    AuditLog(String),

    #[error("Run cancelled")]
    Cancelled,

    #[error("User input error: {0}")]
    UserInput(String),
}

impl From<dialoguer::Error> for PurgeError {
    fn from(err: dialoguer::Error) -> Self {
        PurgeError::UserInput(err.to_string())
    }
}

impl PurgeError {
    pub fn parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        PurgeError::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PurgeError>;
