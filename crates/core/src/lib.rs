//! FormFlow data model -- templates extracted from PDF forms, workflows
//! that track per-role fill-out sessions, and the audit trail.
//!
//! Everything here is plain serde-serializable data plus the pure
//! progress computation. I/O lives in the storage and extract crates.

mod audit;
mod field;
mod progress;
mod role;
mod template;
mod workflow;

pub use audit::AuditEntry;
pub use field::{Field, FieldType, FieldValue, Position};
pub use progress::{compute_progress, ProgressReport, RoleProgress};
pub use role::{Role, RoleMap, UnknownRole};
pub use template::Template;
pub use workflow::{Participant, Workflow, WorkflowStatus};

/// Generate a fresh opaque record id (UUID v4).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
