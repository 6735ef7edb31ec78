use serde::{Deserialize, Serialize};

use crate::field::Field;
use crate::role::{Role, RoleMap};

/// Workflow status. Pending -> completed is the only transition and it is
/// one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Pending,
    Completed,
}

/// A per-role participant: just the fill link handed to that role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub link: String,
}

/// One instantiated fill-out process for a specific template.
///
/// `responses` holds each role's last submitted field sequence; all three
/// roles are always present and start empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: String,
    pub template_id: String,
    pub participants: RoleMap<Participant>,
    pub status: WorkflowStatus,
    pub responses: RoleMap<Vec<Field>>,
}

impl Workflow {
    /// A fresh pending workflow with per-role fill links derived from the
    /// workflow id and empty response sequences.
    pub fn new(id: String, template_id: String) -> Self {
        let participants = RoleMap::from_fn(|role| Participant {
            link: format!("/fill/{id}/{role}"),
        });
        Workflow {
            id,
            template_id,
            participants,
            status: WorkflowStatus::Pending,
            responses: RoleMap::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_workflow_is_pending_with_empty_responses_and_links() {
        let wf = Workflow::new("wf-1".to_string(), "tpl-1".to_string());
        assert_eq!(wf.status, WorkflowStatus::Pending);
        for role in Role::ALL {
            assert!(wf.responses.get(role).is_empty());
            assert_eq!(wf.participants.get(role).link, format!("/fill/wf-1/{role}"));
        }
    }

    #[test]
    fn workflow_wire_shape_uses_camel_case() {
        let wf = Workflow::new("wf-1".to_string(), "tpl-1".to_string());
        let value = serde_json::to_value(&wf).unwrap();
        assert_eq!(value["templateId"], "tpl-1");
        assert_eq!(value["status"], "pending");
        assert!(value["responses"]["seller"].as_array().unwrap().is_empty());
    }
}
