//! Workflow lifecycle engine.
//!
//! Sits between the HTTP surface and the store: creates workflows from
//! templates, validates and records per-role submissions, derives
//! progress, and runs the pending -> completed transition.
//!
//! The completion check is an explicit step after each authoritative
//! write (a submission, or a template replace that reassigns roles) --
//! reads never mutate, so fetching a workflow twice after completion is
//! trivially idempotent.

mod error;

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use formflow_core::{
    compute_progress, new_id, AuditEntry, Field, Role, RoleProgress, Template, Workflow,
    WorkflowStatus,
};
use formflow_storage::WorkflowStore;

pub use error::EngineError;

/// A workflow together with its derived per-role progress, as served to
/// clients.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowView {
    #[serde(flatten)]
    pub workflow: Workflow,
    pub progress: Vec<RoleProgress>,
}

/// The engine. Cheap to clone; all state lives in the store.
pub struct WorkflowEngine<S> {
    store: Arc<S>,
}

impl<S> Clone for WorkflowEngine<S> {
    fn clone(&self) -> Self {
        WorkflowEngine {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: WorkflowStore> WorkflowEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        WorkflowEngine { store }
    }

    // ── Templates ────────────────────────────────────────────────────────────

    /// Register a freshly extracted template.
    pub async fn create_template(&self, template: Template) -> Result<(), EngineError> {
        Ok(self.store.insert_template(template).await?)
    }

    /// Fetch a template; absence is `TemplateNotFound`.
    pub async fn template(&self, id: &str) -> Result<Template, EngineError> {
        self.store
            .find_template(id)
            .await?
            .ok_or_else(|| EngineError::TemplateNotFound { id: id.to_string() })
    }

    /// Replace a template wholesale under its version token, then re-run
    /// the completion check on every workflow that references it -- a
    /// role reassignment can complete an in-flight workflow.
    pub async fn replace_template(
        &self,
        id: &str,
        expected_version: i64,
        template: Template,
    ) -> Result<Template, EngineError> {
        let updated = self
            .store
            .replace_template(id, expected_version, template)
            .await?;
        for workflow in self.store.list_workflows(Some(id)).await? {
            self.check_completion(&workflow.id).await?;
        }
        Ok(updated)
    }

    // ── Workflows ────────────────────────────────────────────────────────────

    /// Create a pending workflow for an existing template, with per-role
    /// fill links and empty response sequences.
    pub async fn create_workflow(&self, template_id: &str) -> Result<Workflow, EngineError> {
        // Foreign key: the template must resolve.
        self.template(template_id).await?;
        let workflow = Workflow::new(new_id(), template_id.to_string());
        self.store.insert_workflow(workflow.clone()).await?;
        Ok(workflow)
    }

    /// Fetch a workflow with derived progress. Pure read.
    pub async fn get_workflow(&self, id: &str) -> Result<WorkflowView, EngineError> {
        let workflow = self.require_workflow(id).await?;
        let template = self.template(&workflow.template_id).await?;
        let report = compute_progress(&template, &workflow);
        Ok(WorkflowView {
            workflow,
            progress: report.roles,
        })
    }

    /// Store one role's submission, record it in the audit trail, and
    /// run the completion check.
    ///
    /// Every submitted field id must belong to that role's template
    /// assignment; the sequence is otherwise stored verbatim (full
    /// replace, no per-field merge).
    pub async fn submit_role(
        &self,
        workflow_id: &str,
        role: Role,
        fields: Vec<Field>,
    ) -> Result<(), EngineError> {
        let workflow = self.require_workflow(workflow_id).await?;
        let template = self.template(&workflow.template_id).await?;

        let assigned: HashSet<&str> = template.assigned_to(role).map(|f| f.id.as_str()).collect();
        if let Some(stray) = fields.iter().find(|f| !assigned.contains(f.id.as_str())) {
            return Err(EngineError::UnknownField {
                id: stray.id.clone(),
                role,
            });
        }

        let count = fields.len();
        self.store.submit_response(workflow_id, role, fields).await?;
        self.store
            .append_audit(workflow_id, role, format!("Submitted {count} field(s)"))
            .await?;
        self.check_completion(workflow_id).await?;
        Ok(())
    }

    /// Re-derive progress and flip pending -> completed when every role
    /// sits at 100%. Returns whether this call performed the flip.
    async fn check_completion(&self, workflow_id: &str) -> Result<bool, EngineError> {
        let workflow = self.require_workflow(workflow_id).await?;
        if workflow.status == WorkflowStatus::Completed {
            return Ok(false);
        }
        let template = self.template(&workflow.template_id).await?;
        if compute_progress(&template, &workflow).is_complete {
            Ok(self.store.complete_workflow(workflow_id).await?)
        } else {
            Ok(false)
        }
    }

    // ── Audit trail ──────────────────────────────────────────────────────────

    /// Append a caller-described event. The workflow reference is weak;
    /// no existence check is made (entries may arrive before or after
    /// the workflow record itself).
    pub async fn record_audit(
        &self,
        workflow_id: &str,
        role: Role,
        event: String,
    ) -> Result<AuditEntry, EngineError> {
        Ok(self.store.append_audit(workflow_id, role, event).await?)
    }

    /// The workflow's audit trail, newest first.
    pub async fn audit_trail(&self, workflow_id: &str) -> Result<Vec<AuditEntry>, EngineError> {
        let mut entries = self.store.audit_for_workflow(workflow_id).await?;
        entries.reverse();
        Ok(entries)
    }

    async fn require_workflow(&self, id: &str) -> Result<Workflow, EngineError> {
        self.store
            .find_workflow(id)
            .await?
            .ok_or_else(|| EngineError::WorkflowNotFound { id: id.to_string() })
    }
}
