use serde::{Deserialize, Serialize};

use crate::field::Field;
use crate::role::Role;

/// Extracted representation of a document's fillable fields and layout.
///
/// Created once per upload and only ever replaced wholesale. Field
/// positions are fixed at extraction time; template editing changes role
/// and type assignments only. `version` is the optimistic-concurrency
/// token checked on replace, so two editors cannot silently overwrite
/// each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    /// Name of the stored PDF artifact, retrievable from the static
    /// file route. Not the uploader's original filename.
    pub filename: String,
    pub pages: u32,
    pub fields: Vec<Field>,
    #[serde(default)]
    pub version: i64,
}

impl Template {
    /// Fields assigned to the given role, in template order.
    pub fn assigned_to(&self, role: Role) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(move |f| f.role == role)
    }
}
