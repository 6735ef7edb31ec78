//! Durable storage for FormFlow templates, workflows, and the audit
//! trail.
//!
//! The [`WorkflowStore`] trait exposes fine-grained, per-record atomic
//! operations instead of whole-collection read-modify-write: concurrent
//! per-role submissions against one workflow can never lose an update,
//! and template replacement is guarded by an optimistic version token.
//!
//! [`JsonStore`] is the single shipped backend: the whole collection
//! under one lock, flushed wholesale to a single JSON file on every
//! mutation. The [`conformance`] module carries a backend-agnostic test
//! battery for alternative implementations.

pub mod conformance;
mod error;
mod json;
mod traits;

pub use error::StorageError;
pub use json::JsonStore;
pub use traits::WorkflowStore;
