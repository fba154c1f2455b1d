//! # Identity Newtypes
//!
//! Every record in the lead workflow is keyed by a UUID wrapped in its own
//! type, so a comment id cannot be handed to an operation expecting an
//! assignment id. Display renders `kind:uuid`; serde uses the bare UUID.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID (e.g. loaded from storage).
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Parse either a bare UUID or the `kind:uuid` display form.
            pub fn parse(s: &str) -> Result<Self, CoreError> {
                let raw = s.strip_prefix(concat!($prefix, ":")).unwrap_or(s);
                Uuid::parse_str(raw.trim())
                    .map(Self)
                    .map_err(|_| CoreError::InvalidIdentifier {
                        kind: $prefix,
                        input: s.to_string(),
                    })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }
    };
}

uuid_id!(
    /// Unique, immutable identifier of a lead.
    LeadId,
    "lead"
);
uuid_id!(
    /// Identifier of the single work record binding a lead to its owner.
    AssignmentId,
    "assignment"
);
uuid_id!(
    /// Identifier of a sales employee (also used for admins and managers).
    EmployeeId,
    "employee"
);
uuid_id!(
    /// Identifier of an employee team, used by the reassign scope policy.
    TeamId,
    "team"
);
uuid_id!(
    /// Identifier of one activity log entry.
    ActivityId,
    "activity"
);
uuid_id!(
    /// Identifier of a comment on an assignment.
    CommentId,
    "comment"
);
uuid_id!(
    /// Identifier of one disbursement tranche.
    DisbursementId,
    "disbursement"
);
uuid_id!(
    /// Identifier of a closed-case snapshot.
    CloseId,
    "close"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_prefixed() {
        let id = LeadId::from_uuid(Uuid::nil());
        assert_eq!(id.to_string(), "lead:00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn parse_accepts_display_and_bare_forms() {
        let id = AssignmentId::new();
        assert_eq!(AssignmentId::parse(&id.to_string()).unwrap(), id);
        assert_eq!(AssignmentId::parse(&id.as_uuid().to_string()).unwrap(), id);
    }

    #[test]
    fn parse_rejects_wrong_prefix() {
        let id = CommentId::new();
        let err = LeadId::parse(&id.to_string()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidIdentifier { kind: "lead", .. }));
    }

    #[test]
    fn serde_is_bare_uuid() {
        let id = EmployeeId::from_uuid(Uuid::nil());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
        let back: EmployeeId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn new_ids_are_distinct() {
        assert_ne!(LeadId::new(), LeadId::new());
    }
}
