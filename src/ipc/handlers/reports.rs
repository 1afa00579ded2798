use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{required_sequence, required_str, required_view, snapshot_ref};
use crate::ipc::types::{AppState, Request};
use crate::report;
use serde_json::json;
use std::collections::HashMap;

fn parse_labels(req: &Request) -> Result<HashMap<String, String>, serde_json::Value> {
    match req.params.get("labels") {
        None => Ok(HashMap::new()),
        Some(v) if v.is_null() => Ok(HashMap::new()),
        Some(v) => serde_json::from_value(v.clone()).map_err(|_| {
            err(
                &req.id,
                "bad_params",
                "labels must be an object of strings",
                None,
            )
        }),
    }
}

fn handle_reports_student(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let sequence = match required_sequence(req, "sequence") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let view = match required_view(req, "view") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let snapshot = match snapshot_ref(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(student) = snapshot.student(&student_id) else {
        return err(
            &req.id,
            "not_found",
            "student not found",
            Some(json!({ "studentId": student_id })),
        );
    };

    // Uses whatever was last computed; nothing is recomputed here.
    let model = report::compile_student_report(
        student,
        &snapshot.subjects,
        &snapshot.marks,
        snapshot.comments.get(&student_id),
        report::ReportSelection {
            sequence,
            view,
            join: state.config.student_join,
        },
        state.results.terms.as_deref().unwrap_or(&[]),
        state.results.annual.as_ref(),
    );
    ok(&req.id, json!(model))
}

fn handle_reports_results_document(state: &mut AppState, req: &Request) -> serde_json::Value {
    let view = match required_view(req, "view") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let title = match required_str(req, "title") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let labels = match parse_labels(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(results) = state.results.view(view) else {
        return err(
            &req.id,
            "no_results",
            format!("no computed results for {}", view),
            Some(json!({ "view": view.as_str() })),
        );
    };

    let model = report::compile_results_document(&title, results, &labels);
    ok(&req.id, json!(model))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.student" => Some(handle_reports_student(state, req)),
        "reports.resultsDocument" => Some(handle_reports_results_document(state, req)),
        _ => None,
    }
}
