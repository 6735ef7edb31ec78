//! Application state shared across request handlers.

use std::path::PathBuf;

use formflow_core::Role;
use formflow_engine::WorkflowEngine;
use formflow_storage::JsonStore;

pub(crate) struct AppState {
    /// Workflow engine over the JSON-file store.
    pub(crate) engine: WorkflowEngine<JsonStore>,
    /// Directory holding uploaded document artifacts.
    pub(crate) upload_dir: PathBuf,
    /// Role assigned to freshly extracted fields.
    pub(crate) default_role: Role,
}
