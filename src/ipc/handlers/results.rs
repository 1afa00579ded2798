use crate::calc;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{required_sequence, required_view, snapshot_ref};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_results_sequence(state: &mut AppState, req: &Request) -> serde_json::Value {
    let sequence = match required_sequence(req, "sequence") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let snapshot = match snapshot_ref(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let results = calc::compute_sequence_results(
        sequence,
        &snapshot.students,
        &snapshot.subjects,
        &snapshot.marks,
        &state.config,
    );
    tracing::info!(
        sequence = %sequence,
        rows = results.rows.len(),
        class_average = results.statistics.class_average,
        pass_percentage = results.statistics.pass_percentage,
        "sequence results computed"
    );
    let body = json!(results);
    state.results.sequences.insert(sequence, results);
    ok(&req.id, body)
}

fn handle_results_terms(state: &mut AppState, req: &Request) -> serde_json::Value {
    let snapshot = match snapshot_ref(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let terms = calc::compute_term_results(
        &snapshot.students,
        &snapshot.subjects,
        &snapshot.marks,
        &state.config,
    );
    for t in &terms {
        tracing::info!(
            term = %t.term,
            rows = t.rows.len(),
            counted = t.statistics.counted_students,
            class_average = t.statistics.class_average,
            pass_percentage = t.statistics.pass_percentage,
            "term results computed"
        );
    }
    let body = json!({ "terms": terms });
    state.results.terms = Some(terms);
    ok(&req.id, body)
}

fn handle_results_annual(state: &mut AppState, req: &Request) -> serde_json::Value {
    let snapshot = match snapshot_ref(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(terms) = state.results.terms.as_ref() else {
        return err(
            &req.id,
            "no_results",
            "compute term results first",
            Some(json!({ "view": "annual" })),
        );
    };

    let annual = calc::compute_annual_results(&snapshot.students, terms, &state.config);
    tracing::info!(
        rows = annual.rows.len(),
        counted = annual.statistics.counted_students,
        class_average = annual.statistics.class_average,
        pass_percentage = annual.statistics.pass_percentage,
        "annual results computed"
    );
    let body = json!(annual);
    state.results.annual = Some(annual);
    ok(&req.id, body)
}

fn handle_results_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let view = match required_view(req, "view") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match state.results.view(view) {
        Some(results) => ok(&req.id, json!(results)),
        None => err(
            &req.id,
            "no_results",
            format!("no computed results for {}", view),
            Some(json!({ "view": view.as_str() })),
        ),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "results.sequence" => Some(handle_results_sequence(state, req)),
        "results.terms" => Some(handle_results_terms(state, req)),
        "results.annual" => Some(handle_results_annual(state, req)),
        "results.get" => Some(handle_results_get(state, req)),
        _ => None,
    }
}
