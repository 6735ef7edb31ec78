/// All errors that can be returned by a `WorkflowStore` implementation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No template with the given id.
    #[error("template not found: {id}")]
    TemplateNotFound { id: String },

    /// No workflow with the given id.
    #[error("workflow not found: {id}")]
    WorkflowNotFound { id: String },

    /// Optimistic concurrency conflict -- another editor replaced the
    /// template since the caller read it.
    #[error("concurrent conflict on template {id}: expected version {expected_version}")]
    ConcurrentConflict { id: String, expected_version: i64 },

    /// The backing store could not be read or written. Fatal for the
    /// operation; no partial state is committed.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}
