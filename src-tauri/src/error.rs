use serde::{Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("date and amount are both required")]
    MissingField,
    #[error("amount is not a finite number")]
    InvalidAmount,
    #[error("date is not a valid YYYY-MM-DD calendar date")]
    InvalidDate,
    #[error("failed to persist transfer: {0}")]
    PersistenceFailed(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("stored date {0:?} is malformed")]
    MalformedDate(String),
    #[error("store lock poisoned")]
    Poisoned,
    #[error("failed to prepare database location: {0}")]
    Location(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {name}")]
    Invalid { name: &'static str, value: String },
}

/// Error returned across the Tauri command boundary.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("application state lock poisoned")]
    Poisoned,
}

impl Serialize for CommandError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<StoreError> for ValidationError {
    fn from(err: StoreError) -> Self {
        ValidationError::PersistenceFailed(err.to_string())
    }
}
