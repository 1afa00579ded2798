use crate::ipc::error::{err, ok, validation_err};
use crate::ipc::types::{AppState, Request, ResultCache};
use crate::model::{CommentMap, Mark, Snapshot, Student, Subject};
use serde::de::DeserializeOwned;
use serde_json::json;

fn parse_list<T: DeserializeOwned>(req: &Request, key: &str) -> Result<Vec<T>, serde_json::Value> {
    match req.params.get(key) {
        None => Err(err(&req.id, "bad_params", format!("missing {}", key), None)),
        Some(v) => serde_json::from_value(v.clone()).map_err(|e| {
            err(
                &req.id,
                "bad_params",
                format!("{} is malformed: {}", key, e),
                None,
            )
        }),
    }
}

fn handle_snapshot_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let students: Vec<Student> = match parse_list(req, "students") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let subjects: Vec<Subject> = match parse_list(req, "subjects") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let marks: Vec<Mark> = match parse_list(req, "marks") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let comments: CommentMap = match req.params.get("comments") {
        None => CommentMap::new(),
        Some(v) if v.is_null() => CommentMap::new(),
        Some(v) => match serde_json::from_value(v.clone()) {
            Ok(c) => c,
            Err(e) => {
                return err(
                    &req.id,
                    "bad_params",
                    format!("comments is malformed: {}", e),
                    None,
                )
            }
        },
    };

    let (snapshot, collapsed) = match Snapshot::from_parts(students, subjects, marks, comments) {
        Ok(v) => v,
        Err(e) => return validation_err(&req.id, &e),
    };
    if collapsed > 0 {
        tracing::warn!(collapsed, "duplicate marks collapsed onto one record each");
    }
    tracing::info!(
        students = snapshot.students.len(),
        subjects = snapshot.subjects.len(),
        marks = snapshot.marks.len(),
        "snapshot loaded"
    );

    let result = json!({
        "studentCount": snapshot.students.len(),
        "subjectCount": snapshot.subjects.len(),
        "markCount": snapshot.marks.len(),
        "collapsedMarks": collapsed,
    });
    state.snapshot = Some(snapshot);
    state.results = ResultCache::default();
    ok(&req.id, result)
}

fn handle_snapshot_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.snapshot = None;
    state.results = ResultCache::default();
    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "snapshot.load" => Some(handle_snapshot_load(state, req)),
        "snapshot.clear" => Some(handle_snapshot_clear(state, req)),
        _ => None,
    }
}
