use async_trait::async_trait;

use formflow_core::{AuditEntry, Field, Role, Template, Workflow};

use crate::error::StorageError;

/// The storage trait for FormFlow backends.
///
/// Every operation is atomic with respect to the record it touches: two
/// concurrent `submit_response` calls for different roles on the same
/// workflow must both persist, and `complete_workflow` is a
/// compare-and-set that flips at most once. Implementations decide how
/// to provide that atomicity (an in-process lock for the JSON file
/// backend, transactions for a real database).
///
/// Lookups return `Ok(None)` for absent records -- absence is a normal
/// outcome, not an error. Mutations against absent records return the
/// corresponding `*NotFound` error.
///
/// Implementations must be `Send + Sync + 'static` to be shared across
/// axum handlers and spawned tasks.
#[async_trait]
pub trait WorkflowStore: Send + Sync + 'static {
    // ── Templates ────────────────────────────────────────────────────────────

    /// Append a new template to the store.
    async fn insert_template(&self, template: Template) -> Result<(), StorageError>;

    /// Look up a template by exact id.
    async fn find_template(&self, id: &str) -> Result<Option<Template>, StorageError>;

    /// Replace a template wholesale, guarded by its version token.
    ///
    /// The caller supplies the complete desired state together with the
    /// version it read. Returns the stored record with the version
    /// bumped, `TemplateNotFound` if the id does not resolve, or
    /// `ConcurrentConflict` if another editor got there first.
    async fn replace_template(
        &self,
        id: &str,
        expected_version: i64,
        template: Template,
    ) -> Result<Template, StorageError>;

    // ── Workflows ────────────────────────────────────────────────────────────

    /// Append a new workflow to the store.
    async fn insert_workflow(&self, workflow: Workflow) -> Result<(), StorageError>;

    /// Look up a workflow by exact id.
    async fn find_workflow(&self, id: &str) -> Result<Option<Workflow>, StorageError>;

    /// List workflows, optionally filtered to one template.
    async fn list_workflows(&self, template_id: Option<&str>)
        -> Result<Vec<Workflow>, StorageError>;

    /// Atomically replace one role's stored response sequence. Full
    /// replace, no per-field merge; other roles' responses are untouched.
    async fn submit_response(
        &self,
        workflow_id: &str,
        role: Role,
        fields: Vec<Field>,
    ) -> Result<(), StorageError>;

    /// Compare-and-set pending -> completed.
    ///
    /// Returns whether this call performed the flip. A workflow that is
    /// already completed returns `Ok(false)` with no write, so the
    /// transition persists at most once.
    async fn complete_workflow(&self, workflow_id: &str) -> Result<bool, StorageError>;

    // ── Audit trail ──────────────────────────────────────────────────────────

    /// Append an audit entry, stamping it with the store's clock.
    ///
    /// The workflow id is a weak reference; no existence check is made.
    async fn append_audit(
        &self,
        workflow_id: &str,
        role: Role,
        event: String,
    ) -> Result<AuditEntry, StorageError>;

    /// All audit entries for a workflow, in insertion order. Consumers
    /// impose their own presentation ordering.
    async fn audit_for_workflow(&self, workflow_id: &str)
        -> Result<Vec<AuditEntry>, StorageError>;
}
