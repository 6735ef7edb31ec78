//! Conformance test suite for `WorkflowStore` implementations.
//!
//! Backend-agnostic battery that any `WorkflowStore` can run to verify
//! correctness. Covers:
//!
//! - **templates**: insert/find round trips, whole-record replace,
//!   version-token conflicts
//! - **workflows**: creation, per-role response replacement, the
//!   completion compare-and-set
//! - **audit**: store-assigned timestamps, per-workflow filtering,
//!   insertion order
//! - **concurrent**: racing per-role submissions must all persist, and
//!   the completion flip happens exactly once under contention
//!
//! Backends call [`run_conformance_suite`] with a factory that builds a
//! fresh, empty store per test:
//!
//! ```ignore
//! let report = run_conformance_suite(|| async { MyStore::new().await }).await;
//! assert_eq!(report.failed, 0, "{report}");
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use formflow_core::{
    new_id, Field, FieldType, FieldValue, Position, Role, Template, Workflow, WorkflowStatus,
};

use crate::{StorageError, WorkflowStore};

/// Concurrent tasks spawned per racing test.
const RACERS: usize = 8;

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    pub category: String,
    pub name: String,
    pub passed: bool,
    pub message: Option<String>,
}

impl TestResult {
    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        let (passed, message) = match result {
            Ok(()) => (true, None),
            Err(msg) => (false, Some(msg)),
        };
        TestResult {
            category: category.to_string(),
            name: name.to_string(),
            passed,
            message,
        }
    }
}

/// Aggregated report from a full suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in &self.results {
            if !r.passed {
                writeln!(
                    f,
                    "  FAIL [{}/{}]: {}",
                    r.category,
                    r.name,
                    r.message.as_deref().unwrap_or("(no message)")
                )?;
            }
        }
        Ok(())
    }
}

/// Run the full suite. The factory is invoked once per test so every
/// test sees a fresh, empty store.
pub async fn run_conformance_suite<S, F, Fut>(factory: F) -> ConformanceReport
where
    S: WorkflowStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "templates",
        "insert_then_find_round_trips",
        template_round_trip(factory().await).await,
    ));
    results.push(TestResult::from_result(
        "templates",
        "find_absent_is_none",
        find_absent_template(factory().await).await,
    ));
    results.push(TestResult::from_result(
        "templates",
        "replace_bumps_version_and_keeps_identity",
        replace_template_bumps_version(factory().await).await,
    ));
    results.push(TestResult::from_result(
        "templates",
        "replace_absent_is_not_found",
        replace_absent_template(factory().await).await,
    ));
    results.push(TestResult::from_result(
        "templates",
        "replace_with_stale_version_conflicts",
        replace_stale_version(factory().await).await,
    ));
    results.push(TestResult::from_result(
        "workflows",
        "insert_then_find_round_trips",
        workflow_round_trip(factory().await).await,
    ));
    results.push(TestResult::from_result(
        "workflows",
        "list_filters_by_template",
        list_workflows_filters(factory().await).await,
    ));
    results.push(TestResult::from_result(
        "workflows",
        "submit_replaces_only_that_roles_sequence",
        submit_replaces_one_role(factory().await).await,
    ));
    results.push(TestResult::from_result(
        "workflows",
        "submit_to_absent_workflow_is_not_found",
        submit_absent_workflow(factory().await).await,
    ));
    results.push(TestResult::from_result(
        "workflows",
        "completion_cas_flips_exactly_once",
        completion_flips_once(factory().await).await,
    ));
    results.push(TestResult::from_result(
        "audit",
        "append_stamps_and_filters_by_workflow",
        audit_append_and_filter(factory().await).await,
    ));
    results.push(TestResult::from_result(
        "concurrent",
        "racing_role_submissions_all_persist",
        racing_submissions_all_persist(factory().await).await,
    ));
    results.push(TestResult::from_result(
        "concurrent",
        "racing_completions_flip_exactly_once",
        racing_completions_flip_once(factory().await).await,
    ));

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();
    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn make_field(role: Role) -> Field {
    Field {
        id: new_id(),
        label: "field".to_string(),
        field_type: FieldType::Text,
        role,
        position: Position { x: 0.0, y: 0.0, page: 1 },
        value: None,
    }
}

fn make_template(id: &str, fields: Vec<Field>) -> Template {
    Template {
        id: id.to_string(),
        filename: format!("{id}.pdf"),
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

// ── Templates ────────────────────────────────────────────────────────────────

async fn template_round_trip<S: WorkflowStore>(store: S) -> Result<(), String> {
    let template = make_template("tpl-1", vec![make_field(Role::Buyer)]);
    store
        .insert_template(template.clone())
        .await
        .map_err(|e| format!("insert: {e}"))?;
    let found = store
        .find_template("tpl-1")
        .await
        .map_err(|e| format!("find: {e}"))?
        .ok_or("template missing after insert")?;
    if found != template {
        return Err("stored template differs from inserted".to_string());
    }
    Ok(())
}

async fn find_absent_template<S: WorkflowStore>(store: S) -> Result<(), String> {
    match store.find_template("no-such-id").await {
        Ok(None) => Ok(()),
        Ok(Some(_)) => Err("found a template in an empty store".to_string()),
        Err(e) => Err(format!("absence must be Ok(None), got error: {e}")),
    }
}

async fn replace_template_bumps_version<S: WorkflowStore>(store: S) -> Result<(), String> {
    let template = make_template("tpl-1", vec![make_field(Role::Buyer)]);
    store
        .insert_template(template.clone())
        .await
        .map_err(|e| format!("insert: {e}"))?;

    let mut edited = template.clone();
    for f in &mut edited.fields {
        f.role = Role::Agent;
    }
    // Payload id is ignored; the path id is authoritative.
    edited.id = "spoofed".to_string();

    let updated = store
        .replace_template("tpl-1", 0, edited)
        .await
        .map_err(|e| format!("replace: {e}"))?;
    if updated.id != "tpl-1" {
        return Err(format!("identity not preserved: {}", updated.id));
    }
    if updated.version != 1 {
        return Err(format!("expected version 1, got {}", updated.version));
    }
    if updated.fields[0].role != Role::Agent {
        return Err("replacement payload not stored".to_string());
    }

    let found = store
        .find_template("tpl-1")
        .await
        .map_err(|e| format!("find: {e}"))?
        .ok_or("template missing after replace")?;
    if found != updated {
        return Err("find after replace returned stale record".to_string());
    }
    Ok(())
}

async fn replace_absent_template<S: WorkflowStore>(store: S) -> Result<(), String> {
    let template = make_template("ghost", vec![]);
    match store.replace_template("ghost", 0, template).await {
        Err(StorageError::TemplateNotFound { .. }) => Ok(()),
        Err(e) => Err(format!("expected TemplateNotFound, got: {e}")),
        Ok(_) => Err("replace of absent template succeeded".to_string()),
    }
}

async fn replace_stale_version<S: WorkflowStore>(store: S) -> Result<(), String> {
    let template = make_template("tpl-1", vec![]);
    store
        .insert_template(template.clone())
        .await
        .map_err(|e| format!("insert: {e}"))?;
    store
        .replace_template("tpl-1", 0, template.clone())
        .await
        .map_err(|e| format!("first replace: {e}"))?;

    // Second editor still holds version 0.
    match store.replace_template("tpl-1", 0, template).await {
        Err(StorageError::ConcurrentConflict { .. }) => Ok(()),
        Err(e) => Err(format!("expected ConcurrentConflict, got: {e}")),
        Ok(_) => Err("stale replace succeeded, lost-update hazard".to_string()),
    }
}

// ── Workflows ────────────────────────────────────────────────────────────────

async fn workflow_round_trip<S: WorkflowStore>(store: S) -> Result<(), String> {
    let workflow = Workflow::new("wf-1".to_string(), "tpl-1".to_string());
    store
        .insert_workflow(workflow.clone())
        .await
        .map_err(|e| format!("insert: {e}"))?;
    let found = store
        .find_workflow("wf-1")
        .await
        .map_err(|e| format!("find: {e}"))?
        .ok_or("workflow missing after insert")?;
    if found != workflow {
        return Err("stored workflow differs from inserted".to_string());
    }
    Ok(())
}

async fn list_workflows_filters<S: WorkflowStore>(store: S) -> Result<(), String> {
    for (wf, tpl) in [("wf-1", "tpl-a"), ("wf-2", "tpl-a"), ("wf-3", "tpl-b")] {
        store
            .insert_workflow(Workflow::new(wf.to_string(), tpl.to_string()))
            .await
            .map_err(|e| format!("insert {wf}: {e}"))?;
    }
    let all = store
        .list_workflows(None)
        .await
        .map_err(|e| format!("list all: {e}"))?;
    if all.len() != 3 {
        return Err(format!("expected 3 workflows, got {}", all.len()));
    }
    let for_a = store
        .list_workflows(Some("tpl-a"))
        .await
        .map_err(|e| format!("list tpl-a: {e}"))?;
    if for_a.len() != 2 || for_a.iter().any(|w| w.template_id != "tpl-a") {
        return Err("template filter returned wrong workflows".to_string());
    }
    Ok(())
}

async fn submit_replaces_one_role<S: WorkflowStore>(store: S) -> Result<(), String> {
    let agent_field = make_field(Role::Agent);
    let buyer_field = make_field(Role::Buyer);
    store
        .insert_workflow(Workflow::new("wf-1".to_string(), "tpl-1".to_string()))
        .await
        .map_err(|e| format!("insert: {e}"))?;

    let agent_answer = vec![answered(&agent_field, FieldValue::Text("a".to_string()))];
    let buyer_answer = vec![answered(&buyer_field, FieldValue::Checked(false))];
    store
        .submit_response("wf-1", Role::Agent, agent_answer.clone())
        .await
        .map_err(|e| format!("agent submit: {e}"))?;
    store
        .submit_response("wf-1", Role::Buyer, buyer_answer.clone())
        .await
        .map_err(|e| format!("buyer submit: {e}"))?;

    let found = store
        .find_workflow("wf-1")
        .await
        .map_err(|e| format!("find: {e}"))?
        .ok_or("workflow missing")?;
    if *found.responses.get(Role::Agent) != agent_answer {
        return Err("agent response lost or altered".to_string());
    }
    if *found.responses.get(Role::Buyer) != buyer_answer {
        return Err("buyer response lost or altered".to_string());
    }
    if !found.responses.get(Role::Seller).is_empty() {
        return Err("seller response should remain empty".to_string());
    }

    // A later submission fully replaces, never merges.
    store
        .submit_response("wf-1", Role::Agent, vec![])
        .await
        .map_err(|e| format!("agent resubmit: {e}"))?;
    let found = store
        .find_workflow("wf-1")
        .await
        .map_err(|e| format!("refind: {e}"))?
        .ok_or("workflow missing")?;
    if !found.responses.get(Role::Agent).is_empty() {
        return Err("resubmission did not replace the sequence".to_string());
    }
    Ok(())
}

async fn submit_absent_workflow<S: WorkflowStore>(store: S) -> Result<(), String> {
    match store.submit_response("ghost", Role::Buyer, vec![]).await {
        Err(StorageError::WorkflowNotFound { .. }) => Ok(()),
        Err(e) => Err(format!("expected WorkflowNotFound, got: {e}")),
        Ok(()) => Err("submit to absent workflow succeeded".to_string()),
    }
}

async fn completion_flips_once<S: WorkflowStore>(store: S) -> Result<(), String> {
    store
        .insert_workflow(Workflow::new("wf-1".to_string(), "tpl-1".to_string()))
        .await
        .map_err(|e| format!("insert: {e}"))?;

    let first = store
        .complete_workflow("wf-1")
        .await
        .map_err(|e| format!("first complete: {e}"))?;
    if !first {
        return Err("first completion must report the flip".to_string());
    }
    let second = store
        .complete_workflow("wf-1")
        .await
        .map_err(|e| format!("second complete: {e}"))?;
    if second {
        return Err("second completion must be a no-op".to_string());
    }

    let found = store
        .find_workflow("wf-1")
        .await
        .map_err(|e| format!("find: {e}"))?
        .ok_or("workflow missing")?;
    if found.status != WorkflowStatus::Completed {
        return Err("status not completed after flip".to_string());
    }
    Ok(())
}

// ── Audit ────────────────────────────────────────────────────────────────────

async fn audit_append_and_filter<S: WorkflowStore>(store: S) -> Result<(), String> {
    let first = store
        .append_audit("wf-1", Role::Buyer, "Viewed form page".to_string())
        .await
        .map_err(|e| format!("append: {e}"))?;
    if first.timestamp.is_empty() {
        return Err("store did not assign a timestamp".to_string());
    }
    // RFC 3339 shape, cheaply checked.
    if !first.timestamp.contains('T') {
        return Err(format!("timestamp not RFC 3339: {}", first.timestamp));
    }

    store
        .append_audit("wf-1", Role::Buyer, "Submitted form".to_string())
        .await
        .map_err(|e| format!("append: {e}"))?;
    store
        .append_audit("wf-2", Role::Agent, "Viewed form page".to_string())
        .await
        .map_err(|e| format!("append: {e}"))?;

    let entries = store
        .audit_for_workflow("wf-1")
        .await
        .map_err(|e| format!("list: {e}"))?;
    if entries.len() != 2 {
        return Err(format!("expected 2 entries for wf-1, got {}", entries.len()));
    }
    if entries[0].event != "Viewed form page" || entries[1].event != "Submitted form" {
        return Err("entries not in insertion order".to_string());
    }
    if entries.iter().any(|e| e.workflow_id != "wf-1") {
        return Err("filter leaked another workflow's entries".to_string());
    }
    Ok(())
}

// ── Concurrent ───────────────────────────────────────────────────────────────

/// The lost-update race: many tasks submit for different roles against
/// one workflow at once. Every role's final sequence must be one of the
/// submitted sequences for that role -- no submission may erase another
/// role's update.
async fn racing_submissions_all_persist<S: WorkflowStore>(store: S) -> Result<(), String> {
    let store = Arc::new(store);
    store
        .insert_workflow(Workflow::new("wf-1".to_string(), "tpl-1".to_string()))
        .await
        .map_err(|e| format!("insert: {e}"))?;

    let mut handles = Vec::new();
    for i in 0..RACERS {
        for role in Role::ALL {
            let s = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let field = answered(
                    &make_field(role),
                    FieldValue::Text(format!("{role}-{i}")),
                );
                s.submit_response("wf-1", role, vec![field]).await
            }));
        }
    }
    for handle in handles {
        handle
            .await
            .map_err(|e| format!("task panic: {e}"))?
            .map_err(|e| format!("submit failed: {e}"))?;
    }

    let found = store
        .find_workflow("wf-1")
        .await
        .map_err(|e| format!("find: {e}"))?
        .ok_or("workflow missing")?;
    for role in Role::ALL {
        let stored = found.responses.get(role);
        if stored.len() != 1 {
            return Err(format!(
                "{role}: expected one stored entry, got {} -- an update was lost",
                stored.len()
            ));
        }
        let value = stored[0].value.as_ref().ok_or("stored entry lost its value")?;
        match value {
            FieldValue::Text(s) if s.starts_with(role.as_str()) => {}
            other => {
                return Err(format!(
                    "{role}: stored value {other:?} came from another role's submission"
                ))
            }
        }
    }
    Ok(())
}

/// Many tasks race the pending -> completed flip; exactly one may win.
async fn racing_completions_flip_once<S: WorkflowStore>(store: S) -> Result<(), String> {
    let store = Arc::new(store);
    store
        .insert_workflow(Workflow::new("wf-1".to_string(), "tpl-1".to_string()))
        .await
        .map_err(|e| format!("insert: {e}"))?;

    let mut handles = Vec::new();
    for _ in 0..RACERS {
        let s = Arc::clone(&store);
        handles.push(tokio::spawn(async move { s.complete_workflow("wf-1").await }));
    }

    let mut winners = 0usize;
    for handle in handles {
        let flipped = handle
            .await
            .map_err(|e| format!("task panic: {e}"))?
            .map_err(|e| format!("complete failed: {e}"))?;
        if flipped {
            winners += 1;
        }
    }
    if winners != 1 {
        return Err(format!("expected exactly 1 winning flip, got {winners}"));
    }
    Ok(())
}
