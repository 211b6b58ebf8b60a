//! Error types for storage operations.

/// Boxed error carried as the source of a backend failure.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for storage operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backing store rejected or failed a request (network, throttling,
    /// permissions). The message is the backend's own description.
    #[error("{operation} failed: {message}")]
    Backend {
        operation: &'static str,
        message: String,
        #[source]
        source: Option<BoxedError>,
    },

    /// The requested object does not exist.
    #[error("object '{key}' not found in bucket '{bucket}'")]
    NotFound { bucket: String, key: String },

    /// The backing store broke the listing protocol.
    #[error("listing protocol violation: {reason}")]
    ProtocolViolation { reason: String },

    /// A presigned URL could not be produced.
    #[error("presigning failed: {reason}")]
    Presign { reason: String },

    /// Invalid configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl Error {
    /// Creates a backend error without a source.
    pub fn backend(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Backend {
            operation,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a backend error wrapping the underlying failure.
    pub fn backend_with_source(
        operation: &'static str,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Backend {
            operation,
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a not found error.
    pub fn not_found(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self::NotFound {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Creates a listing protocol violation error.
    pub fn protocol_violation(reason: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            reason: reason.into(),
        }
    }

    /// Creates a presigning error.
    pub fn presign(reason: impl Into<String>) -> Self {
        Self::Presign {
            reason: reason.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Returns `true` if this error reports a missing object.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_message_is_preserved() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "AccessDenied");
        let err = Error::backend_with_source("copy", io);
        assert_eq!(err.to_string(), "copy failed: AccessDenied");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn not_found_is_detected() {
        assert!(Error::not_found("bucket", "key").is_not_found());
        assert!(!Error::protocol_violation("no token").is_not_found());
    }
}
