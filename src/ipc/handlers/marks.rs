use crate::ipc::error::{err, ok, validation_err};
use crate::ipc::helpers::{optional_str, parse_sequence, required_sequence, required_str, snapshot_mut, snapshot_ref};
use crate::ipc::types::{AppState, Request};
use crate::model::UpsertOutcome;
use serde_json::json;

fn handle_marks_upsert(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let subject_id = match required_str(req, "subjectId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let sequence = match required_sequence(req, "sequence") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(value) = req.params.get("value").and_then(|v| v.as_f64()) else {
        return err(&req.id, "bad_params", "value must be a number", None);
    };
    let snapshot = match snapshot_mut(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    match snapshot.upsert_mark(&student_id, &subject_id, sequence, value) {
        Ok((mark, outcome)) => {
            tracing::debug!(
                student_id = %student_id,
                subject_id = %subject_id,
                sequence = %sequence,
                value,
                "mark stored"
            );
            ok(
                &req.id,
                json!({
                    "mark": mark,
                    "created": outcome == UpsertOutcome::Created,
                }),
            )
        }
        Err(e) => validation_err(&req.id, &e),
    }
}

fn handle_marks_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let sequence = match optional_str(req, "sequence") {
        Ok(Some(raw)) => match parse_sequence(req, &raw) {
            Ok(v) => Some(v),
            Err(e) => return e,
        },
        Ok(None) => None,
        Err(e) => return e,
    };
    let student_id = match optional_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let snapshot = match snapshot_ref(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let marks: Vec<_> = snapshot
        .marks
        .iter()
        .filter(|m| sequence.map(|s| m.sequence == s).unwrap_or(true))
        .filter(|m| {
            student_id
                .as_deref()
                .map(|sid| m.student_id == sid)
                .unwrap_or(true)
        })
        .collect();
    ok(&req.id, json!({ "marks": marks }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "marks.upsert" => Some(handle_marks_upsert(state, req)),
        "marks.list" => Some(handle_marks_list(state, req)),
        _ => None,
    }
}
