//! Error taxonomy for remote calls.

use thiserror::Error;

/// Failure of a single remote call.
///
/// Both variants are fatal only to the jobs carried by the failing call;
/// submission continues for everything else.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The call never completed (connection refused, timeout, broken
    /// stream).
    #[error("transport error: {0}")]
    Transport(String),

    /// The call completed but the service reported a non-success status.
    #[error("service error: {message} (status {status})")]
    Protocol { status: u16, message: String },
}

impl ServiceError {
    /// Create a transport-level error.
    pub fn transport(message: impl Into<String>) -> Self {
        ServiceError::Transport(message.into())
    }

    /// Create a protocol-level error with the reported status.
    pub fn protocol(status: u16, message: impl Into<String>) -> Self {
        ServiceError::Protocol {
            status,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_transport() {
        let err = ServiceError::transport("connection refused");
        assert_eq!(err.to_string(), "transport error: connection refused");
    }

    #[test]
    fn test_display_protocol() {
        let err = ServiceError::protocol(403, "token expired");
        assert_eq!(err.to_string(), "service error: token expired (status 403)");
    }
}
