//! Error types for bridge services

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BridgeError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Selector parse error: {0}")]
    Parse(String),

    #[error("Unsupported selector: {0}")]
    UnsupportedSelector(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Errors that can only occur before scheduling starts
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Parse(_) | Self::UnsupportedSelector(_)
        )
    }

    /// Whether a later attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_) | Self::Protocol(_))
    }

    /// Timeouts are reported on their own but belong to the transport class
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Parse(_) => "PARSE_ERROR",
            Self::UnsupportedSelector(_) => "UNSUPPORTED_SELECTOR",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::Protocol(_) => "PROTOCOL_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        BridgeError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startup_errors_are_fatal_and_not_retryable() {
        for err in [
            BridgeError::Config("x".into()),
            BridgeError::Parse("x".into()),
            BridgeError::UnsupportedSelector("x".into()),
        ] {
            assert!(err.is_fatal(), "{err}");
            assert!(!err.is_retryable(), "{err}");
        }
    }

    #[test]
    fn test_cycle_errors_are_retryable() {
        let timeout = BridgeError::Timeout("read".into());
        assert!(timeout.is_retryable());
        assert!(timeout.is_transport());
        assert!(!timeout.is_fatal());

        let protocol = BridgeError::Protocol("status 500".into());
        assert!(protocol.is_retryable());
        assert!(!protocol.is_transport());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(BridgeError::Parse("x".into()).error_code(), "PARSE_ERROR");
        assert_eq!(
            BridgeError::UnsupportedSelector("x".into()).error_code(),
            "UNSUPPORTED_SELECTOR"
        );
        assert_eq!(BridgeError::Transport("x".into()).error_code(), "TRANSPORT_ERROR");
    }

    #[test]
    fn test_io_error_maps_to_transport() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: BridgeError = io.into();
        assert!(matches!(err, BridgeError::Transport(_)));
    }
}
