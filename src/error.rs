//! Error types for triage-assist.

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// The remote operations the Gateway can perform.
///
/// Carried on every gateway failure so the Engine can react per-operation
/// (a failed session create is blocking, a failed answer submission is not).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    /// `create_session` — blocking precondition for everything else.
    Session,
    /// `fetch_categories` — the symptom category list.
    Catalog,
    /// `fetch_questions` — the per-category question set.
    Questions,
    /// `submit_answer` — best-effort answer telemetry.
    Submission,
    /// `interpret_description` — free-text to category mapping.
    Interpretation,
    /// `complete_assessment` — the final recommendation fetch.
    Completion,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Session => "session",
            Self::Catalog => "catalog",
            Self::Questions => "questions",
            Self::Submission => "submission",
            Self::Interpretation => "interpretation",
            Self::Completion => "completion",
        };
        write!(f, "{s}")
    }
}

/// Gateway-boundary errors.
///
/// Transport and parsing failures never cross into the Engine as faults;
/// the conversation controller converts them to `RemoteCallFailed` events
/// keyed by `OperationKind`.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{operation} request failed: {reason}")]
    Transport {
        operation: OperationKind,
        reason: String,
    },

    #[error("{operation} request returned status {status}")]
    UnexpectedStatus {
        operation: OperationKind,
        status: u16,
    },

    #[error("Failed to decode {operation} response: {reason}")]
    Decode {
        operation: OperationKind,
        reason: String,
    },

    #[error("No session established for {operation} request")]
    SessionMissing { operation: OperationKind },
}

impl GatewayError {
    /// The remote operation this failure belongs to.
    pub fn operation(&self) -> OperationKind {
        match self {
            Self::Transport { operation, .. }
            | Self::UnexpectedStatus { operation, .. }
            | Self::Decode { operation, .. }
            | Self::SessionMissing { operation } => *operation,
        }
    }
}

/// Presentation-channel errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_kind_display() {
        assert_eq!(OperationKind::Session.to_string(), "session");
        assert_eq!(OperationKind::Completion.to_string(), "completion");
    }

    #[test]
    fn gateway_error_exposes_operation() {
        let err = GatewayError::UnexpectedStatus {
            operation: OperationKind::Questions,
            status: 404,
        };
        assert_eq!(err.operation(), OperationKind::Questions);

        let err = GatewayError::SessionMissing {
            operation: OperationKind::Completion,
        };
        assert_eq!(err.operation(), OperationKind::Completion);
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = GatewayError::Transport {
            operation: OperationKind::Catalog,
            reason: "connection refused".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("catalog"));
        assert!(msg.contains("connection refused"));
    }
}
