//! Error types for hub operations.
//!
//! Every failure is terminal for the request that raised it. Credential
//! problems are client errors; driver and proof-checker failures are carried
//! through untouched so the transport can decide what to do with them.

/// Boxed error produced by external collaborators (drivers, proof checkers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error codes for transports that need a stable numeric mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum HubErrorCode {
    /// `Authorization` header absent or not `bearer <token>`
    MalformedAuthHeader = 1000,
    /// Token matched neither the V1 nor the legacy encoding
    MalformedAuthToken = 1001,
    /// Credential parsed but failed a trust check
    Validation = 2000,
    /// Credential is valid but predates the revocation floor
    AuthTokenTimestamp = 2001,
    /// Token carries no issue time while a revocation floor is active
    MissingIssueTime = 2002,
    /// `content-length` header is not an integer
    InvalidContentLength = 3000,
    /// Declared body exceeds the configured upload limit
    PayloadTooLarge = 3001,
    /// Upload limit is configured but the request declares no length
    MissingContentLength = 3002,
    /// Server configuration is inconsistent
    Config = 4000,
    /// Storage driver failure
    Driver = 5000,
    /// Proof checker failure
    ProofCheck = 5001,
}

/// Comprehensive error type for hub operations.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// The `Authorization` header is missing or not a bearer credential.
    #[error("malformed authorization header: {0}")]
    MalformedAuthHeader(String),

    /// The bearer token could not be decoded as any supported version.
    #[error("malformed authentication token: {0}")]
    MalformedAuthToken(String),

    /// Address, signature, hub URL, scope or association check failed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The token was issued before the address's revocation floor.
    #[error("auth token for {address} was issued at {issued_at}, before the oldest valid timestamp {oldest_valid}")]
    AuthTokenTimestampValidation {
        /// Address whose floor rejected the token
        address: String,
        /// Issue time claimed by the token (seconds)
        issued_at: i64,
        /// Current revocation floor (seconds)
        oldest_valid: i64,
    },

    /// A revocation floor exists but the token does not state when it was issued.
    #[error("auth token for {address} has no issue time but a revocation floor of {oldest_valid} is active")]
    MissingIssueTime {
        /// Address whose floor is active
        address: String,
        /// Current revocation floor (seconds)
        oldest_valid: i64,
    },

    /// The `content-length` header could not be parsed.
    #[error("invalid content-length header: {0:?}")]
    InvalidContentLength(String),

    /// The body is larger than the configured maximum or its declared length.
    #[error("payload of at least {length} bytes exceeds the maximum upload size of {limit} bytes")]
    PayloadTooLarge {
        /// Declared content length
        length: u64,
        /// Configured maximum
        limit: u64,
    },

    /// An upload limit is configured and the request has no `content-length`.
    #[error("content-length is required when uploads are capped at {limit} bytes")]
    MissingContentLength {
        /// Configured maximum
        limit: u64,
    },

    /// Configuration rejected at construction time.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The storage driver failed.
    #[error("driver error: {0}")]
    Driver(#[source] BoxError),

    /// The proof checker rejected the address or failed to run.
    #[error("proof check failed: {0}")]
    ProofCheck(#[source] BoxError),
}

impl HubError {
    /// Get the numeric error code.
    pub fn code(&self) -> HubErrorCode {
        match self {
            Self::MalformedAuthHeader(_) => HubErrorCode::MalformedAuthHeader,
            Self::MalformedAuthToken(_) => HubErrorCode::MalformedAuthToken,
            Self::Validation(_) => HubErrorCode::Validation,
            Self::AuthTokenTimestampValidation { .. } => HubErrorCode::AuthTokenTimestamp,
            Self::MissingIssueTime { .. } => HubErrorCode::MissingIssueTime,
            Self::InvalidContentLength(_) => HubErrorCode::InvalidContentLength,
            Self::PayloadTooLarge { .. } => HubErrorCode::PayloadTooLarge,
            Self::MissingContentLength { .. } => HubErrorCode::MissingContentLength,
            Self::Config(_) => HubErrorCode::Config,
            Self::Driver(_) => HubErrorCode::Driver,
            Self::ProofCheck(_) => HubErrorCode::ProofCheck,
        }
    }

    /// Returns true if the caller sent something the hub refuses to act on.
    ///
    /// Upstream failures (driver, proof checker) and configuration errors are
    /// not client errors.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Config(_) | Self::Driver(_) | Self::ProofCheck(_))
    }

    /// Returns true if the token was rejected only because of revocation.
    pub fn is_revoked(&self) -> bool {
        matches!(
            self,
            Self::AuthTokenTimestampValidation { .. } | Self::MissingIssueTime { .. }
        )
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = HubError::AuthTokenTimestampValidation {
            address: "abc".into(),
            issued_at: 10,
            oldest_valid: 20,
        };
        assert_eq!(err.code(), HubErrorCode::AuthTokenTimestamp);
        assert!(err.is_client_error());
        assert!(err.is_revoked());

        let err = HubError::validation("bad signature");
        assert_eq!(err.code(), HubErrorCode::Validation);
        assert!(!err.is_revoked());
    }

    #[test]
    fn test_upstream_errors_are_not_client_errors() {
        let err = HubError::Driver("disk full".into());
        assert_eq!(err.code(), HubErrorCode::Driver);
        assert!(!err.is_client_error());
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn test_error_display() {
        let err = HubError::PayloadTooLarge {
            length: 2048,
            limit: 1024,
        };
        assert!(err.to_string().contains("2048"));
        assert!(err.to_string().contains("1024"));
    }
}
