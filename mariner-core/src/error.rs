//! Error taxonomy.
//!
//! Each layer has its own enum. Messages crossing the action channel are
//! rendered with `to_string()` so actions stay `Clone + PartialEq`.

use std::time::Duration;

use thiserror::Error;

/// Failures of the local SQLite store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database lock poisoned")]
    Poisoned,

    #[error("database worker failed: {0}")]
    Worker(String),

    #[error("port not found: {0}")]
    PortNotFound(String),
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        StoreError::Worker(err.to_string())
    }
}

/// Geocoding and geographic index failures. These end the current search.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("invalid format: expected 'City, State' or a 5-digit zip code")]
    InvalidQuery,

    #[error("zipcode {0} not found")]
    ZipNotFound(String),

    #[error("location '{0}' not found")]
    PlaceNotFound(String),

    #[error("marine zone {0} not found")]
    ZoneNotFound(String),

    #[error("tide station {0} not found")]
    StationNotFound(String),

    #[error("lookup timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("geocoding service failed: {0}")]
    Service(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<rusqlite::Error> for LookupError {
    fn from(err: rusqlite::Error) -> Self {
        LookupError::Store(err.into())
    }
}

/// Remote data fetch failures. These degrade a single panel, never the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("server returned status {0}")]
    Status(u16),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("{what} timed out after {}s", .after.as_secs())]
    Timeout { what: &'static str, after: Duration },
}

/// First-launch cache build failures.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("failed to fetch {catalog}: {reason}")]
    Catalog {
        catalog: &'static str,
        reason: String,
    },

    #[error("provisioning stopped before completion")]
    Interrupted,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<rusqlite::Error> for ProvisionError {
    fn from(err: rusqlite::Error) -> Self {
        ProvisionError::Store(err.into())
    }
}

impl From<tokio::task::JoinError> for ProvisionError {
    fn from(err: tokio::task::JoinError) -> Self {
        ProvisionError::Store(err.into())
    }
}
