use std::fmt::Display;
use std::io;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use formflow_core::{AuditEntry, Field, Role, Template, Workflow, WorkflowStatus};

use crate::error::StorageError;
use crate::traits::WorkflowStore;

/// On-disk shape: one JSON document holding every collection.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Collections {
    templates: Vec<Template>,
    workflows: Vec<Workflow>,
    audit: Vec<AuditEntry>,
}

/// Single-file JSON store.
///
/// The whole collection lives under one `RwLock`; every mutation runs
/// inside the write lock and flushes the full document to disk before
/// the lock is released. That makes each trait operation atomic within
/// the process, which is the consistency this design promises (a single
/// process, simple file overwrite, no cross-process coordination).
pub struct JsonStore {
    /// `None` runs the store purely in memory (tests).
    path: Option<PathBuf>,
    data: RwLock<Collections>,
}

impl JsonStore {
    /// An in-memory store with no backing file.
    pub fn in_memory() -> Self {
        JsonStore {
            path: None,
            data: RwLock::new(Collections::default()),
        }
    }

    /// Open a store backed by `path`, creating parent directories and
    /// starting empty when the file does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(unavailable)?;
            }
        }
        let data = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(unavailable)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Collections::default(),
            Err(e) => return Err(unavailable(e)),
        };
        Ok(JsonStore {
            path: Some(path),
            data: RwLock::new(data),
        })
    }

    /// Write the full document to disk. Callers hold the write lock, so
    /// flushes are serialized with the mutation they persist.
    async fn flush(&self, data: &Collections) -> Result<(), StorageError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(data).map_err(unavailable)?;
        tokio::fs::write(path, bytes).await.map_err(unavailable)
    }
}

fn unavailable(err: impl Display) -> StorageError {
    StorageError::Unavailable(err.to_string())
}

fn now_rfc3339() -> Result<String, StorageError> {
    OffsetDateTime::now_utc().format(&Rfc3339).map_err(unavailable)
}

#[async_trait]
impl WorkflowStore for JsonStore {
    async fn insert_template(&self, template: Template) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        data.templates.push(template);
        self.flush(&data).await
    }

    async fn find_template(&self, id: &str) -> Result<Option<Template>, StorageError> {
        let data = self.data.read().await;
        Ok(data.templates.iter().find(|t| t.id == id).cloned())
    }

    async fn replace_template(
        &self,
        id: &str,
        expected_version: i64,
        template: Template,
    ) -> Result<Template, StorageError> {
        let mut data = self.data.write().await;
        let idx = data
            .templates
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| StorageError::TemplateNotFound { id: id.to_string() })?;
        if data.templates[idx].version != expected_version {
            return Err(StorageError::ConcurrentConflict {
                id: id.to_string(),
                expected_version,
            });
        }
        let mut updated = template;
        // Identity comes from the path, not the payload.
        updated.id = id.to_string();
        updated.version = expected_version + 1;
        data.templates[idx] = updated.clone();
        self.flush(&data).await?;
        Ok(updated)
    }

    async fn insert_workflow(&self, workflow: Workflow) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        data.workflows.push(workflow);
        self.flush(&data).await
    }

    async fn find_workflow(&self, id: &str) -> Result<Option<Workflow>, StorageError> {
        let data = self.data.read().await;
        Ok(data.workflows.iter().find(|w| w.id == id).cloned())
    }

    async fn list_workflows(
        &self,
        template_id: Option<&str>,
    ) -> Result<Vec<Workflow>, StorageError> {
        let data = self.data.read().await;
        Ok(data
            .workflows
            .iter()
            .filter(|w| template_id.map_or(true, |tid| w.template_id == tid))
            .cloned()
            .collect())
    }

    async fn submit_response(
        &self,
        workflow_id: &str,
        role: Role,
        fields: Vec<Field>,
    ) -> Result<(), StorageError> {
        let mut data = self.data.write().await;
        let idx = data
            .workflows
            .iter()
            .position(|w| w.id == workflow_id)
            .ok_or_else(|| StorageError::WorkflowNotFound {
                id: workflow_id.to_string(),
            })?;
        *data.workflows[idx].responses.get_mut(role) = fields;
        self.flush(&data).await
    }

    async fn complete_workflow(&self, workflow_id: &str) -> Result<bool, StorageError> {
        let mut data = self.data.write().await;
        let idx = data
            .workflows
            .iter()
            .position(|w| w.id == workflow_id)
            .ok_or_else(|| StorageError::WorkflowNotFound {
                id: workflow_id.to_string(),
            })?;
        if data.workflows[idx].status == WorkflowStatus::Completed {
            return Ok(false);
        }
        data.workflows[idx].status = WorkflowStatus::Completed;
        self.flush(&data).await?;
        Ok(true)
    }

    async fn append_audit(
        &self,
        workflow_id: &str,
        role: Role,
        event: String,
    ) -> Result<AuditEntry, StorageError> {
        let entry = AuditEntry {
            workflow_id: workflow_id.to_string(),
            role,
            event,
            timestamp: now_rfc3339()?,
        };
        let mut data = self.data.write().await;
        data.audit.push(entry.clone());
        self.flush(&data).await?;
        Ok(entry)
    }

    async fn audit_for_workflow(
        &self,
        workflow_id: &str,
    ) -> Result<Vec<AuditEntry>, StorageError> {
        let data = self.data.read().await;
        Ok(data
            .audit
            .iter()
            .filter(|e| e.workflow_id == workflow_id)
            .cloned()
            .collect())
    }
}
