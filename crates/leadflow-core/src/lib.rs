//! # leadflow-core: Foundational Types
//!
//! Shared vocabulary for every leadflow crate. Nothing in here performs
//! I/O or knows about the workflow; the types only guarantee that the
//! values passed between components are well formed.
//!
//! ## Contents
//!
//! - [`identity`]: UUID newtypes for leads, assignments, employees and
//!   the records hanging off them. A `LeadId` can never be passed where an
//!   `AssignmentId` is expected.
//! - [`temporal`]: `Timestamp`, UTC-only and truncated to seconds.
//! - [`money`]: `Amount`, an integer count of minor currency units.
//! - [`actor`]: `Role` and `Actor`, the "who is making this change" input
//!   every mutating operation takes.
//! - [`canonical`] / [`digest`]: deterministic JSON bytes and SHA-256
//!   digests used by the activity hash chain.
//! - [`error`]: parse and canonicalization errors.

pub mod actor;
pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod money;
pub mod temporal;

pub use actor::{Actor, Role};
pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, ContentDigest};
pub use error::{CanonicalizationError, CoreError};
pub use identity::{
    ActivityId, AssignmentId, CloseId, CommentId, DisbursementId, EmployeeId, LeadId, TeamId,
};
pub use money::Amount;
pub use temporal::Timestamp;
