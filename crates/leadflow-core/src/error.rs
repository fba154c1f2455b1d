//! # Error Types
//!
//! Errors raised while constructing core values. Workflow errors live in
//! `leadflow-state` and `leadflow-engine`; this module only covers input
//! that fails to parse into a core type.

use thiserror::Error;

/// Malformed input for a core value type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// An amount string could not be parsed.
    #[error("invalid amount {input:?}: {reason}")]
    InvalidAmount {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A timestamp string could not be parsed.
    #[error("invalid timestamp {input:?}: {reason}")]
    InvalidTimestamp {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An identifier string was not a UUID.
    #[error("invalid {kind} identifier {input:?}")]
    InvalidIdentifier {
        /// Identifier namespace, e.g. `lead`.
        kind: &'static str,
        /// The rejected input.
        input: String,
    },

    /// A role name is not one of admin, manager, employee.
    #[error("unknown role {0:?}")]
    UnknownRole(String),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    /// Amounts are integers of minor units.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_amount_display() {
        let err = CoreError::InvalidAmount {
            input: "12.345".into(),
            reason: "more than two decimal places".into(),
        };
        assert_eq!(
            format!("{err}"),
            "invalid amount \"12.345\": more than two decimal places"
        );
    }

    #[test]
    fn invalid_identifier_display() {
        let err = CoreError::InvalidIdentifier {
            kind: "lead",
            input: "nope".into(),
        };
        assert_eq!(format!("{err}"), "invalid lead identifier \"nope\"");
    }

    #[test]
    fn float_rejected_display() {
        let err = CanonicalizationError::FloatRejected(1.5);
        assert!(format!("{err}").contains("1.5"));
    }
}
