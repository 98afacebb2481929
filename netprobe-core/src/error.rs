//! Error taxonomy for snapshot and identity operations
//!
//! Only `IdentityError::InvalidIdentitySource` ever reaches a caller.
//! `TelemetryError` and `StoreError` values are recovered where they happen
//! and turned into the field's sentinel.

use thiserror::Error;

/// Failures met while querying platform state.
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("capability unavailable: {0}")]
    CapabilityUnavailable(&'static str),

    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("platform query failed: {0}")]
    TransientQueryFailure(String),
}

impl TelemetryError {
    pub fn query<E: std::fmt::Display>(context: &str, err: E) -> Self {
        TelemetryError::TransientQueryFailure(format!("{context}: {err}"))
    }
}

/// Failures of the key/value store backing the device identifier.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store document is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("failed to replace store file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Failures of identity resolution. `Store` is absorbed by the resolver.
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("identity source too short: need {needed} characters, got {actual}")]
    InvalidIdentitySource { needed: usize, actual: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IdentityError {
    /// Stable code handed to remote callers.
    pub fn code(&self) -> &'static str {
        match self {
            IdentityError::InvalidIdentitySource { .. } => "MALFORMED_INPUT",
            IdentityError::Store(_) => "IDENTITY_STORE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_error_codes() {
        let short = IdentityError::InvalidIdentitySource { needed: 12, actual: 3 };
        assert_eq!(short.code(), "MALFORMED_INPUT");
        assert!(short.to_string().contains("got 3"));

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let store: IdentityError = StoreError::from(io).into();
        assert_eq!(store.code(), "IDENTITY_STORE");
    }
}
