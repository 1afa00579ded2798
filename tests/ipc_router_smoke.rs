mod common;

use common::{spawn_daemon, two_student_snapshot};
use serde_json::json;

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let mut d = spawn_daemon();

    let health = d.request_ok("1", "health", json!({}));
    assert_eq!(health["snapshotLoaded"], false);
    assert_eq!(health["version"], env!("CARGO_PKG_VERSION"));

    // Every family answers with something other than not_implemented,
    // even before a snapshot exists.
    let calls = [
        ("marks.list", json!({})),
        ("marks.upsert", json!({})),
        ("comments.get", json!({})),
        ("comments.set", json!({})),
        ("results.sequence", json!({ "sequence": "first" })),
        ("results.terms", json!({})),
        ("results.annual", json!({})),
        ("results.get", json!({ "view": "annual" })),
        ("reports.student", json!({})),
        ("reports.resultsDocument", json!({})),
        ("config.get", json!({})),
        ("snapshot.clear", json!({})),
    ];
    for (i, (method, params)) in calls.into_iter().enumerate() {
        let resp = d.request(&format!("c{}", i), method, params);
        let code = resp
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .unwrap_or("");
        assert_ne!(code, "not_implemented", "unexpected unknown method for {}", method);
    }

    assert_eq!(
        d.request_err("2", "results.terms", json!({})),
        "no_snapshot"
    );
    assert_eq!(
        d.request_err("3", "grades.recalculateEverything", json!({})),
        "not_implemented"
    );

    let loaded = d.request_ok("4", "snapshot.load", two_student_snapshot());
    assert_eq!(loaded["studentCount"], 2);
    assert_eq!(loaded["subjectCount"], 2);
    assert_eq!(loaded["markCount"], 4);
    let health = d.request_ok("5", "health", json!({}));
    assert_eq!(health["snapshotLoaded"], true);

    d.finish();
}

#[test]
fn malformed_line_gets_bad_json_and_daemon_keeps_serving() {
    let mut d = spawn_daemon();
    let resp = d.send_line("{not json");
    assert_eq!(resp["ok"], false);
    assert_eq!(resp["error"]["code"], "bad_json");

    let health = d.request_ok("after", "health", json!({}));
    assert_eq!(health["snapshotLoaded"], false);
    d.finish();
}

#[test]
fn snapshot_load_rejects_non_positive_subject_total() {
    let mut d = spawn_daemon();
    let mut snap = two_student_snapshot();
    snap["subjects"][1]["total"] = json!(0);
    assert_eq!(d.request_err("1", "snapshot.load", snap), "bad_params");

    let mut missing = two_student_snapshot();
    missing.as_object_mut().expect("object").remove("marks");
    assert_eq!(d.request_err("2", "snapshot.load", missing), "bad_params");
    d.finish();
}
