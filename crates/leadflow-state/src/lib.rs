//! # leadflow-state: Workflow Rules
//!
//! The static rules of the lead workflow, with no I/O and no records:
//!
//! - [`status`]: `LeadStatus`, its forward transition table, the inverse
//!   relation used for undo, and the two named escape transitions
//!   (`CompleteOnFullPayment`, `ForceClose`).
//! - [`close`]: close-type taxonomy and closure outcomes.
//! - [`progress`]: the stage list shown for a case at a given point.
//!
//! Every transition the engine applies is checked through
//! [`validate_transition`], so the full graph stays in one place and is
//! exercised by the matrix test in `tests/`.

pub mod close;
pub mod progress;
pub mod status;

pub use close::{CloseType, ClosureOutcome};
pub use progress::{workflow_progress, ProgressStage, StageState};
pub use status::{validate_transition, LeadState, LeadStatus, TransitionError, TransitionKind};
