use crate::domain::ports::EngineError;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, NodeError>;

/// Message the engine attaches to an `Unknown` connect fault when a session
/// is already active. The engine has no dedicated code for this case, so the
/// message is matched verbatim.
pub const ALREADY_EXISTS_MESSAGE: &str = "connection already exists";

/// Closed set of connect/reconnect failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectErrorKind {
    InvalidProposal,
    InsufficientBalance,
    AlreadyConnected,
    Unknown,
}

impl fmt::Display for ConnectErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidProposal => "invalid proposal",
            Self::InsufficientBalance => "insufficient balance",
            Self::AlreadyConnected => "already connected",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Maps an engine connect fault onto a `ConnectErrorKind`.
///
/// This is the single classification routine used by both `connect` and
/// `reconnect`, so the two paths cannot diverge. Unrecognized codes collapse
/// to `Unknown` instead of failing.
pub fn classify(code: &str, message: &str) -> ConnectErrorKind {
    match code {
        "InvalidProposal" => ConnectErrorKind::InvalidProposal,
        "InsufficientBalance" => ConnectErrorKind::InsufficientBalance,
        "Unknown" if message == ALREADY_EXISTS_MESSAGE => ConnectErrorKind::AlreadyConnected,
        _ => ConnectErrorKind::Unknown,
    }
}

#[derive(Error, Debug)]
pub enum NodeError {
    /// Node initialization never completed; carries the bootstrap cause.
    #[error("node failed to start: {0}")]
    StartFailed(String),
    /// A connect or reconnect attempt was rejected by the engine.
    #[error("connect failed ({kind}): {message}")]
    Connect {
        kind: ConnectErrorKind,
        message: String,
    },
    /// An order payload could not be decoded. Unlike proposals, an order must
    /// exist for the payment workflow to continue, so this is a hard error.
    #[error("malformed engine response: {0}")]
    MalformedResponse(#[from] serde_json::Error),
    /// Any other engine failure, forwarded unchanged.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl NodeError {
    /// The classified kind, for connect/reconnect failures.
    pub fn connect_kind(&self) -> Option<ConnectErrorKind> {
        match self {
            Self::Connect { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_codes() {
        assert_eq!(
            classify("InvalidProposal", "whatever"),
            ConnectErrorKind::InvalidProposal
        );
        assert_eq!(
            classify("InsufficientBalance", "whatever"),
            ConnectErrorKind::InsufficientBalance
        );
    }

    #[test]
    fn test_classify_already_exists_sentinel() {
        assert_eq!(
            classify("Unknown", "connection already exists"),
            ConnectErrorKind::AlreadyConnected
        );
        // The sentinel only applies to the Unknown code.
        assert_eq!(
            classify("InvalidProposal", "connection already exists"),
            ConnectErrorKind::InvalidProposal
        );
        assert_eq!(
            classify("SomethingElse", "connection already exists"),
            ConnectErrorKind::Unknown
        );
    }

    #[test]
    fn test_classify_unknown_fallback() {
        assert_eq!(classify("Unknown", "boom"), ConnectErrorKind::Unknown);
        assert_eq!(classify("Anything else", ""), ConnectErrorKind::Unknown);
        assert_eq!(classify("", ""), ConnectErrorKind::Unknown);
    }

    #[test]
    fn test_connect_error_display() {
        let err = NodeError::Connect {
            kind: ConnectErrorKind::InsufficientBalance,
            message: "balance is 0".into(),
        };
        assert_eq!(
            err.to_string(),
            "connect failed (insufficient balance): balance is 0"
        );
        assert_eq!(
            err.connect_kind(),
            Some(ConnectErrorKind::InsufficientBalance)
        );
    }
}
