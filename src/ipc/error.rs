use crate::config::ConfigError;
use crate::model::ValidationError;
use serde_json::json;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub fn validation_err(id: &str, e: &ValidationError) -> serde_json::Value {
    let details = match e {
        ValidationError::MarkOutOfRange { value, total } => {
            Some(json!({ "value": value, "total": total }))
        }
        ValidationError::UnknownStudent(sid) => Some(json!({ "studentId": sid })),
        ValidationError::UnknownSubject(sid) => Some(json!({ "subjectId": sid })),
        _ => None,
    };
    err(id, e.code(), e.to_string(), details)
}

pub fn config_err(id: &str, e: &ConfigError) -> serde_json::Value {
    err(id, "bad_params", e.to_string(), None)
}
