//! Error types for unitsync

use thiserror::Error;

/// Main error type for unitsync
#[derive(Error, Debug)]
pub enum UnitError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Watcher error: {0}")]
    WatchError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("No user")]
    NoUser,

    #[error("Error while getting units. {0}")]
    GetUnits(String),

    #[error("Error while saving units. {0}")]
    SaveUnits(String),

    #[error("Cannot create unit. {0}")]
    CreateUnit(String),

    #[error("Error while updating unit. {0}")]
    UpdateUnit(String),

    /// Clean message extracted from the server's error envelope
    #[error("{0}")]
    Remote(String),

    #[error("No name to create unit")]
    NoUnitName,

    #[error("No deploy for unit \"{unit}\": {reason}")]
    NoDeploy { unit: String, reason: String },

    #[error("No such unit \"{0}\"")]
    NoSuchUnit(String),

    #[error("No units found")]
    NoUnitsFound,

    #[error("Malformed config in {unit}: {reason}")]
    MalformedConfig { unit: String, reason: String },

    #[error("Cannot create directory {path}, check permissions: {reason}")]
    DirectoryCreate { path: String, reason: String },

    #[error("Error while deleting unit \"{unit}\" locally. {reason}")]
    DeleteLocal { unit: String, reason: String },
}

impl From<notify::Error> for UnitError {
    fn from(err: notify::Error) -> Self {
        UnitError::WatchError(err.to_string())
    }
}

impl UnitError {
    /// Whether the error is a domain error rather than a transport failure
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            UnitError::NoUnitName
                | UnitError::NoDeploy { .. }
                | UnitError::NoSuchUnit(_)
                | UnitError::NoUnitsFound
                | UnitError::MalformedConfig { .. }
        )
    }
}
