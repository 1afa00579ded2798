use crate::config::EngineConfig;
use crate::ipc::error::{config_err, err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_config_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "config": state.config }))
}

fn handle_config_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(patch) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };
    if let Err(e) = state.config.apply_patch(patch) {
        return config_err(&req.id, &e);
    }
    // Cached results stay as computed; new settings apply on the next recompute.
    tracing::info!(
        passing_mark = state.config.passing_mark,
        grade_scale = state.config.grade_scale,
        student_join = ?state.config.student_join,
        "engine config updated"
    );
    ok(&req.id, json!({ "config": state.config }))
}

fn handle_config_reset(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.config = EngineConfig::default();
    ok(&req.id, json!({ "config": state.config }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "config.get" => Some(handle_config_get(state, req)),
        "config.update" => Some(handle_config_update(state, req)),
        "config.reset" => Some(handle_config_reset(state, req)),
        _ => None,
    }
}
