//! Per-role progress computation.
//!
//! Pure over (template, workflow): no I/O, no clock, deterministic.

use serde::Serialize;

use crate::field::FieldValue;
use crate::role::Role;
use crate::template::Template;
use crate::workflow::Workflow;

/// Derived fill progress for one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoleProgress {
    pub role: Role,
    /// Template fields assigned to this role.
    pub assigned: usize,
    /// Submitted response entries with a defined, non-empty-string value.
    pub filled: usize,
    pub percent: u32,
}

/// Progress for all three roles plus the overall completion verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressReport {
    pub roles: Vec<RoleProgress>,
    pub is_complete: bool,
}

/// Compute per-role progress and the completion verdict.
///
/// `filled` counts the role's stored response entries whose value is
/// defined and not the empty string; a checkbox submitted as `false`
/// counts. `percent` is round(filled/assigned x 100) when any fields are
/// assigned, else 0 -- a role with nothing assigned reports 0%, never
/// 100%, and therefore keeps the workflow pending forever. That asymmetry
/// is inherited behavior, preserved deliberately and pinned by tests.
pub fn compute_progress(template: &Template, workflow: &Workflow) -> ProgressReport {
    let roles: Vec<RoleProgress> = Role::ALL
        .into_iter()
        .map(|role| {
            let assigned = template.assigned_to(role).count();
            let filled = workflow
                .responses
                .get(role)
                .iter()
                .filter(|f| f.value.as_ref().is_some_and(FieldValue::is_filled))
                .count();
            let percent = if assigned > 0 {
                ((filled as f64 / assigned as f64) * 100.0).round() as u32
            } else {
                0
            };
            RoleProgress { role, assigned, filled, percent }
        })
        .collect();

    let is_complete = roles.iter().all(|p| p.percent == 100);
    ProgressReport { roles, is_complete }
}
