use formflow_core::Role;
use formflow_storage::StorageError;

/// Errors surfaced by engine operations. All are returned synchronously
/// to the caller; nothing is swallowed or retried.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("template not found: {id}")]
    TemplateNotFound { id: String },

    #[error("workflow not found: {id}")]
    WorkflowNotFound { id: String },

    /// A submitted field id does not belong to this role's template
    /// assignment.
    #[error("field {id} is not assigned to role {role}")]
    UnknownField { id: String, role: Role },

    /// Template replace lost the optimistic-concurrency race.
    #[error("template {id} was modified concurrently (expected version {expected_version})")]
    Conflict { id: String, expected_version: i64 },

    #[error(transparent)]
    Storage(StorageError),
}

impl From<StorageError> for EngineError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::TemplateNotFound { id } => EngineError::TemplateNotFound { id },
            StorageError::WorkflowNotFound { id } => EngineError::WorkflowNotFound { id },
            StorageError::ConcurrentConflict { id, expected_version } => {
                EngineError::Conflict { id, expected_version }
            }
            other => EngineError::Storage(other),
        }
    }
}
