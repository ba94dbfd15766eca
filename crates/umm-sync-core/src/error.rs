use thiserror::Error;

/// Error types for catalog synchronization.
///
/// Transient-indeterminate states (a record not yet visible after a write,
/// a malformed body during a creation race) are expressed as `Ok(None)` by
/// the operations that can hit them, never as an error variant. Per-item
/// association failures are logged and do not surface here either.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("CMR environment not recognized: {0}; select uat or ops")]
    UnrecognizedEnvironment(String),

    #[error("provider {provider} and native id {native_id} are not unique: {hits} records returned")]
    AmbiguousRecord {
        provider: String,
        native_id: String,
        hits: u64,
    },

    #[error("catalog write failed (HTTP {status}): {body}")]
    WriteFailed { status: u16, body: String },

    #[error("token request failed (HTTP {status}): {body}")]
    TokenRequestFailed { status: u16, body: String },

    #[error("profile has no string Name field")]
    MissingName,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Create a new AmbiguousRecord error
    pub fn ambiguous_record(
        provider: impl Into<String>,
        native_id: impl Into<String>,
        hits: u64,
    ) -> Self {
        Self::AmbiguousRecord {
            provider: provider.into(),
            native_id: native_id.into(),
            hits,
        }
    }

    /// Create a new WriteFailed error
    pub fn write_failed(status: u16, body: impl Into<String>) -> Self {
        Self::WriteFailed {
            status,
            body: body.into(),
        }
    }

    /// True for errors that must never be retried: bad configuration,
    /// ambiguous remote state, or a rejected write.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnrecognizedEnvironment(_)
                | Self::AmbiguousRecord { .. }
                | Self::WriteFailed { .. }
                | Self::TokenRequestFailed { .. }
                | Self::MissingName
        )
    }
}

/// Convenience result type for synchronization operations
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_record_message() {
        let err = SyncError::ambiguous_record("POCLOUD", "pocloud_my_tool", 2);
        assert_eq!(
            err.to_string(),
            "provider POCLOUD and native id pocloud_my_tool are not unique: 2 records returned"
        );
        assert!(err.is_fatal());
    }

    #[test]
    fn test_write_failed_message() {
        let err = SyncError::write_failed(422, "schema validation failed");
        assert_eq!(
            err.to_string(),
            "catalog write failed (HTTP 422): schema validation failed"
        );
        assert!(err.is_fatal());
    }

    #[test]
    fn test_json_error_is_not_fatal() {
        let json_err: serde_json::Error =
            serde_json::from_str::<serde_json::Value>("{ bad json }").unwrap_err();
        let err: SyncError = json_err.into();
        assert!(matches!(err, SyncError::Json(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_unrecognized_environment_message() {
        let err = SyncError::UnrecognizedEnvironment("sit".to_string());
        assert_eq!(
            err.to_string(),
            "CMR environment not recognized: sit; select uat or ops"
        );
        assert!(err.is_fatal());
    }
}
