//! Engine lifecycle tests over the in-memory JSON store.

use std::sync::Arc;

use formflow_core::{
    new_id, Field, FieldType, FieldValue, Position, Role, Template, WorkflowStatus,
};
use formflow_engine::{EngineError, WorkflowEngine};
use formflow_storage::JsonStore;

fn make_field(label: &str, role: Role, field_type: FieldType) -> Field {
    Field {
        id: new_id(),
        label: label.to_string(),
        field_type,
        role,
        position: Position { x: 0.0, y: 0.0, page: 1 },
        value: None,
    }
}

fn make_template(fields: Vec<Field>) -> Template {
    Template {
        id: new_id(),
        filename: "doc.pdf".to_string(),
        pages: 1,
        fields,
        version: 0,
    }
}

fn answered(field: &Field, value: FieldValue) -> Field {
    Field {
        value: Some(value),
        ..field.clone()
    }
}

fn engine() -> WorkflowEngine<JsonStore> {
    WorkflowEngine::new(Arc::new(JsonStore::in_memory()))
}

async fn engine_with(template: &Template) -> WorkflowEngine<JsonStore> {
    let engine = engine();
    engine.create_template(template.clone()).await.expect("create template");
    engine
}

#[tokio::test]
async fn create_workflow_requires_existing_template() {
    let err = engine().create_workflow("no-such-template").await.unwrap_err();
    assert!(matches!(err, EngineError::TemplateNotFound { .. }));
}

#[tokio::test]
async fn created_workflow_starts_pending_with_links_and_empty_responses() {
    let template = make_template(vec![make_field("name", Role::Buyer, FieldType::Text)]);
    let engine = engine_with(&template).await;

    let workflow = engine.create_workflow(&template.id).await.expect("create");
    assert_eq!(workflow.template_id, template.id);
    assert_eq!(workflow.status, WorkflowStatus::Pending);
    for role in Role::ALL {
        assert!(workflow.responses.get(role).is_empty());
        assert_eq!(
            workflow.participants.get(role).link,
            format!("/fill/{}/{role}", workflow.id)
        );
    }
}

#[tokio::test]
async fn submit_then_get_round_trips_the_exact_sequence() {
    let field = make_field("name", Role::Buyer, FieldType::Text);
    let template = make_template(vec![field.clone()]);
    let engine = engine_with(&template).await;
    let workflow = engine.create_workflow(&template.id).await.expect("create");

    let submitted = vec![answered(&field, FieldValue::Text("Jane".to_string()))];
    engine
        .submit_role(&workflow.id, Role::Buyer, submitted.clone())
        .await
        .expect("submit");

    let view = engine.get_workflow(&workflow.id).await.expect("get");
    assert_eq!(*view.workflow.responses.get(Role::Buyer), submitted);
}

#[tokio::test]
async fn submission_with_foreign_field_id_is_rejected() {
    let buyer_field = make_field("name", Role::Buyer, FieldType::Text);
    let agent_field = make_field("license", Role::Agent, FieldType::Text);
    let template = make_template(vec![buyer_field, agent_field.clone()]);
    let engine = engine_with(&template).await;
    let workflow = engine.create_workflow(&template.id).await.expect("create");

    // The agent's field submitted under the buyer role.
    let err = engine
        .submit_role(
            &workflow.id,
            Role::Buyer,
            vec![answered(&agent_field, FieldValue::Text("x".to_string()))],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::UnknownField { .. }));

    // Nothing was stored.
    let view = engine.get_workflow(&workflow.id).await.expect("get");
    assert!(view.workflow.responses.get(Role::Buyer).is_empty());
}

#[tokio::test]
async fn submit_to_absent_workflow_is_not_found() {
    let template = make_template(vec![]);
    let engine = engine_with(&template).await;
    let err = engine.submit_role("ghost", Role::Agent, vec![]).await.unwrap_err();
    assert!(matches!(err, EngineError::WorkflowNotFound { .. }));
}

#[tokio::test]
async fn workflow_completes_when_every_role_reaches_full_progress() {
    let buyer_field = make_field("name", Role::Buyer, FieldType::Text);
    let agent_field = make_field("license", Role::Agent, FieldType::Text);
    let seller_field = make_field("accepts", Role::Seller, FieldType::Checkbox);
    let template = make_template(vec![
        buyer_field.clone(),
        agent_field.clone(),
        seller_field.clone(),
    ]);
    let engine = engine_with(&template).await;
    let workflow = engine.create_workflow(&template.id).await.expect("create");

    engine
        .submit_role(
            &workflow.id,
            Role::Buyer,
            vec![answered(&buyer_field, FieldValue::Text("Jane".to_string()))],
        )
        .await
        .expect("buyer submit");
    engine
        .submit_role(
            &workflow.id,
            Role::Agent,
            vec![answered(&agent_field, FieldValue::Text("A-1".to_string()))],
        )
        .await
        .expect("agent submit");

    let view = engine.get_workflow(&workflow.id).await.expect("get");
    assert_eq!(view.workflow.status, WorkflowStatus::Pending);

    // Scenario C: a deliberately unticked checkbox still fills the field.
    engine
        .submit_role(
            &workflow.id,
            Role::Seller,
            vec![answered(&seller_field, FieldValue::Checked(false))],
        )
        .await
        .expect("seller submit");

    let view = engine.get_workflow(&workflow.id).await.expect("get");
    assert_eq!(view.workflow.status, WorkflowStatus::Completed);

    // Reads stay pure: fetching again neither reverts nor re-flips.
    let again = engine.get_workflow(&workflow.id).await.expect("get again");
    assert_eq!(again.workflow.status, WorkflowStatus::Completed);
}

#[tokio::test]
async fn completed_status_is_never_reverted() {
    let buyer_field = make_field("name", Role::Buyer, FieldType::Text);
    let agent_field = make_field("license", Role::Agent, FieldType::Text);
    let seller_field = make_field("deed", Role::Seller, FieldType::Text);
    let template = make_template(vec![
        buyer_field.clone(),
        agent_field.clone(),
        seller_field.clone(),
    ]);
    let engine = engine_with(&template).await;
    let workflow = engine.create_workflow(&template.id).await.expect("create");

    for (role, field) in [
        (Role::Buyer, &buyer_field),
        (Role::Agent, &agent_field),
        (Role::Seller, &seller_field),
    ] {
        engine
            .submit_role(
                &workflow.id,
                role,
                vec![answered(field, FieldValue::Text("done".to_string()))],
            )
            .await
            .expect("submit");
    }
    let view = engine.get_workflow(&workflow.id).await.expect("get");
    assert_eq!(view.workflow.status, WorkflowStatus::Completed);

    // A later empty resubmission drops buyer progress to 0%, but the
    // transition is one-way.
    engine
        .submit_role(&workflow.id, Role::Buyer, vec![])
        .await
        .expect("resubmit");
    let view = engine.get_workflow(&workflow.id).await.expect("get");
    assert_eq!(view.workflow.status, WorkflowStatus::Completed);
    let buyer = view.progress.iter().find(|p| p.role == Role::Buyer).unwrap();
    assert_eq!(buyer.percent, 0);
}

#[tokio::test]
async fn zero_assigned_role_keeps_workflow_pending_forever() {
    // Scenario A: no seller fields at all.
    let buyer_fields: Vec<Field> = (0..3)
        .map(|i| make_field(&format!("b{i}"), Role::Buyer, FieldType::Text))
        .collect();
    let agent_fields: Vec<Field> = (0..2)
        .map(|i| make_field(&format!("a{i}"), Role::Agent, FieldType::Text))
        .collect();
    let mut all_fields = buyer_fields.clone();
    all_fields.extend(agent_fields.clone());
    let template = make_template(all_fields);
    let engine = engine_with(&template).await;
    let workflow = engine.create_workflow(&template.id).await.expect("create");

    engine
        .submit_role(
            &workflow.id,
            Role::Buyer,
            buyer_fields
                .iter()
                .map(|f| answered(f, FieldValue::Text("v".to_string())))
                .collect(),
        )
        .await
        .expect("buyer submit");
    engine
        .submit_role(
            &workflow.id,
            Role::Agent,
            agent_fields
                .iter()
                .map(|f| answered(f, FieldValue::Text("v".to_string())))
                .collect(),
        )
        .await
        .expect("agent submit");

    let view = engine.get_workflow(&workflow.id).await.expect("get");
    assert_eq!(view.workflow.status, WorkflowStatus::Pending);
    let seller = view.progress.iter().find(|p| p.role == Role::Seller).unwrap();
    assert_eq!((seller.assigned, seller.percent), (0, 0));
}

#[tokio::test]
async fn template_replace_can_complete_an_in_flight_workflow() {
    let buyer_a = make_field("b-main", Role::Buyer, FieldType::Text);
    let buyer_b = make_field("b-extra", Role::Buyer, FieldType::Text);
    let agent_field = make_field("license", Role::Agent, FieldType::Text);
    let seller_field = make_field("deed", Role::Seller, FieldType::Text);
    let template = make_template(vec![
        buyer_a.clone(),
        buyer_b.clone(),
        agent_field.clone(),
        seller_field.clone(),
    ]);
    let engine = engine_with(&template).await;
    let workflow = engine.create_workflow(&template.id).await.expect("create");

    engine
        .submit_role(
            &workflow.id,
            Role::Buyer,
            vec![
                answered(&buyer_a, FieldValue::Text("Jane".to_string())),
                answered(&buyer_b, FieldValue::Text(String::new())),
            ],
        )
        .await
        .expect("buyer submit");
    engine
        .submit_role(
            &workflow.id,
            Role::Agent,
            vec![answered(&agent_field, FieldValue::Text("A-1".to_string()))],
        )
        .await
        .expect("agent submit");
    engine
        .submit_role(
            &workflow.id,
            Role::Seller,
            vec![answered(&seller_field, FieldValue::Text("ok".to_string()))],
        )
        .await
        .expect("seller submit");

    // Buyer left one field empty: 1 of 2 filled.
    let view = engine.get_workflow(&workflow.id).await.expect("get");
    assert_eq!(view.workflow.status, WorkflowStatus::Pending);

    // An editor drops the extra buyer field; the replace sweep must
    // notice that every remaining role now sits at 100%.
    let mut edited = template.clone();
    edited.fields.retain(|f| f.id != buyer_b.id);
    engine
        .replace_template(&template.id, 0, edited)
        .await
        .expect("replace");

    let view = engine.get_workflow(&workflow.id).await.expect("get");
    assert_eq!(view.workflow.status, WorkflowStatus::Completed);
}

#[tokio::test]
async fn template_replace_with_stale_version_conflicts() {
    let template = make_template(vec![]);
    let engine = engine_with(&template).await;

    engine
        .replace_template(&template.id, 0, template.clone())
        .await
        .expect("first replace");
    let err = engine
        .replace_template(&template.id, 0, template.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict { .. }));
}

#[tokio::test]
async fn audit_trail_is_served_newest_first() {
    let template = make_template(vec![]);
    let engine = engine_with(&template).await;
    let workflow = engine.create_workflow(&template.id).await.expect("create");

    engine
        .record_audit(&workflow.id, Role::Buyer, "Viewed form page".to_string())
        .await
        .expect("first event");
    engine
        .record_audit(&workflow.id, Role::Buyer, "Updated field \"name\"".to_string())
        .await
        .expect("second event");

    let trail = engine.audit_trail(&workflow.id).await.expect("trail");
    assert_eq!(trail.len(), 2);
    assert_eq!(trail[0].event, "Updated field \"name\"");
    assert_eq!(trail[1].event, "Viewed form page");
}

#[tokio::test]
async fn submissions_are_recorded_in_the_audit_trail() {
    let field = make_field("name", Role::Buyer, FieldType::Text);
    let template = make_template(vec![field.clone()]);
    let engine = engine_with(&template).await;
    let workflow = engine.create_workflow(&template.id).await.expect("create");

    engine
        .submit_role(
            &workflow.id,
            Role::Buyer,
            vec![answered(&field, FieldValue::Text("Jane".to_string()))],
        )
        .await
        .expect("submit");

    let trail = engine.audit_trail(&workflow.id).await.expect("trail");
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].role, Role::Buyer);
    assert_eq!(trail[0].event, "Submitted 1 field(s)");
}

#[tokio::test]
async fn workflow_view_serializes_flattened_with_progress() {
    let field = make_field("name", Role::Buyer, FieldType::Text);
    let template = make_template(vec![field]);
    let engine = engine_with(&template).await;
    let workflow = engine.create_workflow(&template.id).await.expect("create");

    let view = engine.get_workflow(&workflow.id).await.expect("get");
    let value = serde_json::to_value(&view).expect("serialize");

    assert_eq!(value["id"], workflow.id.as_str());
    assert_eq!(value["templateId"], template.id.as_str());
    assert_eq!(value["status"], "pending");
    let progress = value["progress"].as_array().expect("progress array");
    assert_eq!(progress.len(), 3);
    assert_eq!(progress[0]["role"], "agent");
    assert_eq!(progress[1]["assigned"], 1);
    assert_eq!(progress[1]["percent"], 0);
}
