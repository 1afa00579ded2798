use crate::ipc::error::{err, ok, validation_err};
use crate::ipc::helpers::{required_str, snapshot_mut, snapshot_ref};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_comments_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let snapshot = match snapshot_ref(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    if snapshot.student(&student_id).is_none() {
        return err(&req.id, "not_found", "student not found", None);
    }
    let comments = snapshot.comments.get(&student_id).cloned().unwrap_or_default();
    ok(&req.id, json!({ "studentId": student_id, "comments": comments }))
}

fn handle_comments_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student_id = match required_str(req, "studentId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let label = match required_str(req, "label") {
        Ok(v) => v,
        Err(e) => return e,
    };
    // Blank text clears the label; a missing or non-string value is rejected.
    let text = match required_str(req, "text") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let snapshot = match snapshot_mut(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    match snapshot.set_comment(&student_id, &label, &text) {
        Ok(comments) => ok(&req.id, json!({ "studentId": student_id, "comments": comments })),
        Err(e) => validation_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "comments.get" => Some(handle_comments_get(state, req)),
        "comments.set" => Some(handle_comments_set(state, req)),
        _ => None,
    }
}
