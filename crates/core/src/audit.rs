use serde::{Deserialize, Serialize};

use crate::role::Role;

/// Timestamped record of a participant action against a workflow.
///
/// Append-only, never mutated. References the workflow by id with no
/// enforced integrity (entries may outlive or predate the workflow
/// record). The timestamp is an RFC 3339 string assigned by the store at
/// append time, not by the caller, so wire-side clock skew never leaks
/// into the trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub workflow_id: String,
    pub role: Role,
    /// Free-text event description supplied by the caller.
    pub event: String,
    pub timestamp: String,
}
