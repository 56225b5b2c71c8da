//! Error types for the parameter editor
//!
//! Covers:
//! - Selection requests the state machine refuses
//! - Edits that cannot be encoded for the selected parameter
//! - Failures reaching the remote node
//! - Reading and writing persisted state and configuration

use pedit_core::{CodecError, SnapshotError};

/// Main editor error type
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// Selection request refused
    #[error("selection error: {0}")]
    Selection(#[from] SelectionError),

    /// Edit could not be turned into an update
    #[error("edit rejected: {0}")]
    Edit(#[from] EditError),

    /// Remote call failed
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Persisted state unreadable or unwritable
    #[error("persistence error: {0}")]
    Persist(#[from] PersistError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Inbound snapshot unreadable
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// Event queue closed
    #[error("editor session closed")]
    SessionClosed,
}

impl EditorError {
    /// Check if the error comes from user input rather than the environment
    #[inline]
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::Selection(_) | Self::Edit(_))
    }
}

/// Selection requests the state machine refuses
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// Parameter selected before any node
    #[error("no node selected")]
    NoNodeSelected,

    /// Name not among the selected node's parameters
    #[error("node {node:?} has no parameter {name:?}")]
    UnknownParameter {
        /// Selected node
        node: String,
        /// Requested parameter
        name: String,
    },
}

/// Edits that cannot become an update
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditError {
    /// Nothing to edit
    #[error("no parameter selected")]
    NoParameterSelected,

    /// Text does not parse as the parameter's kind
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Failures sending to or reading from the remote side
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Remote side not reachable
    #[error("transport unavailable: {0}")]
    Unavailable(String),

    /// Remote side answered but refused the update
    #[error("update rejected: {reason}")]
    Rejected {
        /// Reason given by the remote side
        reason: String,
    },

    /// Reply did not have the expected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Request could not be serialized
    #[error("encoding failed: {0}")]
    Encoding(String),
}

/// Persisted state errors
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// File system error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored document is not a valid state record
    #[error("invalid state document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file unreadable
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML
    #[error("invalid toml: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value is out of range
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Config key
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_errors_are_flagged() {
        assert!(EditorError::from(SelectionError::NoNodeSelected).is_user_error());
        assert!(EditorError::from(EditError::NoParameterSelected).is_user_error());
        assert!(!EditorError::from(TransportError::Unavailable("down".into())).is_user_error());
        assert!(!EditorError::SessionClosed.is_user_error());
    }

    #[test]
    fn messages_name_the_parameter() {
        let err = SelectionError::UnknownParameter {
            node: "camera".into(),
            name: "iso".into(),
        };
        assert_eq!(err.to_string(), r#"node "camera" has no parameter "iso""#);
    }
}
