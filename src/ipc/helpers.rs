use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::model::{ResultView, Sequence, Snapshot};
use serde_json::json;

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn optional_str(req: &Request, key: &str) -> Result<Option<String>, serde_json::Value> {
    match req.params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => v
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| err(&req.id, "bad_params", format!("{} must be a string", key), None)),
    }
}

pub fn snapshot_ref<'a>(state: &'a AppState, req: &Request) -> Result<&'a Snapshot, serde_json::Value> {
    state
        .snapshot
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_snapshot", "load a snapshot first", None))
}

pub fn snapshot_mut<'a>(
    state: &'a mut AppState,
    req: &Request,
) -> Result<&'a mut Snapshot, serde_json::Value> {
    state
        .snapshot
        .as_mut()
        .ok_or_else(|| err(&req.id, "no_snapshot", "load a snapshot first", None))
}

pub fn parse_sequence(req: &Request, raw: &str) -> Result<Sequence, serde_json::Value> {
    Sequence::parse(raw).ok_or_else(|| {
        err(
            &req.id,
            "bad_params",
            "sequence must be one of: first, second, third, fourth, fifth, sixth",
            Some(json!({ "sequence": raw })),
        )
    })
}

pub fn required_sequence(req: &Request, key: &str) -> Result<Sequence, serde_json::Value> {
    let raw = required_str(req, key)?;
    parse_sequence(req, &raw)
}

pub fn required_view(req: &Request, key: &str) -> Result<ResultView, serde_json::Value> {
    let raw = required_str(req, key)?;
    ResultView::parse(&raw).ok_or_else(|| {
        err(
            &req.id,
            "bad_params",
            "view must be a sequence, a term (firstTerm, secondTerm, thirdTerm) or annual",
            Some(json!({ "view": raw })),
        )
    })
}
