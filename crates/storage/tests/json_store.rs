//! JsonStore tests: the generic conformance battery plus file-backed
//! persistence behavior.

use formflow_core::{new_id, Field, FieldType, FieldValue, Position, Role, Template, Workflow};
use formflow_storage::conformance::run_conformance_suite;
use formflow_storage::{JsonStore, WorkflowStore};

#[tokio::test]
async fn in_memory_store_passes_conformance() {
    let report = run_conformance_suite(|| async { JsonStore::in_memory() }).await;
    assert_eq!(report.failed, 0, "{report}");
}

#[tokio::test]
async fn file_backed_store_passes_conformance() {
    // One temp dir for the whole run; each test gets its own file.
    let dir = tempfile::tempdir().expect("tempdir");
    let dir_path = dir.path().to_path_buf();
    let report = run_conformance_suite(|| {
        let path = dir_path.join(format!("{}.json", new_id()));
        async move { JsonStore::open(path).await.expect("open store") }
    })
    .await;
    assert_eq!(report.failed, 0, "{report}");
}

#[tokio::test]
async fn reopening_a_store_preserves_all_collections() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("db.json");

    let template = Template {
        id: "tpl-1".to_string(),
        filename: "tpl-1.pdf".to_string(),
        pages: 2,
        fields: vec![Field {
            id: new_id(),
            label: "buyer_name".to_string(),
            field_type: FieldType::Text,
            role: Role::Buyer,
            position: Position { x: 12.0, y: 34.0, page: 2 },
            value: None,
        }],
        version: 0,
    };
    let workflow = Workflow::new("wf-1".to_string(), "tpl-1".to_string());

    {
        let store = JsonStore::open(&path).await.expect("open");
        store.insert_template(template.clone()).await.expect("insert template");
        store.insert_workflow(workflow.clone()).await.expect("insert workflow");
        store
            .submit_response(
                "wf-1",
                Role::Buyer,
                vec![Field {
                    value: Some(FieldValue::Text("Jane".to_string())),
                    ..template.fields[0].clone()
                }],
            )
            .await
            .expect("submit");
        store
            .append_audit("wf-1", Role::Buyer, "Submitted form".to_string())
            .await
            .expect("audit");
    }

    let reopened = JsonStore::open(&path).await.expect("reopen");
    let tpl = reopened
        .find_template("tpl-1")
        .await
        .expect("find template")
        .expect("template survived restart");
    assert_eq!(tpl, template);

    let wf = reopened
        .find_workflow("wf-1")
        .await
        .expect("find workflow")
        .expect("workflow survived restart");
    assert_eq!(wf.responses.get(Role::Buyer).len(), 1);
    assert_eq!(
        wf.responses.get(Role::Buyer)[0].value,
        Some(FieldValue::Text("Jane".to_string()))
    );

    let audit = reopened.audit_for_workflow("wf-1").await.expect("audit list");
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].event, "Submitted form");
}

#[tokio::test]
async fn open_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("deeper").join("db.json");

    let store = JsonStore::open(&path).await.expect("open with missing parents");
    store
        .insert_workflow(Workflow::new("wf-1".to_string(), "tpl-1".to_string()))
        .await
        .expect("insert");
    assert!(path.exists(), "data file written under created parents");
}

#[tokio::test]
async fn corrupt_data_file_is_reported_as_unavailable() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("db.json");
    tokio::fs::write(&path, b"{ not json").await.expect("write");

    let err = JsonStore::open(&path).await.err().expect("open must fail");
    assert!(
        matches!(err, formflow_storage::StorageError::Unavailable(_)),
        "got: {err}"
    );
}
