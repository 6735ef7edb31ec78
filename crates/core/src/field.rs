use serde::{Deserialize, Serialize};

use crate::role::Role;

/// The kind of widget a field was extracted as (or edited into).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Checkbox,
    Date,
    Signature,
}

/// A submitted field value: free text for text-like fields, a bool for
/// checkboxes. Untagged on the wire (`"Jane"` or `true`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Checked(bool),
}

impl FieldValue {
    /// A value counts as filled when it is defined and not the empty
    /// string. `Checked(false)` is filled: a deliberately unticked box is
    /// still an answer.
    pub fn is_filled(&self) -> bool {
        match self {
            FieldValue::Text(s) => !s.is_empty(),
            FieldValue::Checked(_) => true,
        }
    }
}

/// Widget position in PDF user space, lower-left origin. Pages are
/// 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub page: u32,
}

/// One fillable form field.
///
/// On a template's field list `value` is always absent; it is only set
/// inside a workflow's per-role response sequences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub role: Role,
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<FieldValue>,
}
