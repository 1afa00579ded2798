#![allow(dead_code)]

use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

pub struct Daemon {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
}

pub fn spawn_daemon() -> Daemon {
    spawn_daemon_with_env(&[])
}

pub fn spawn_daemon_with_env(envs: &[(&str, &str)]) -> Daemon {
    let exe = env!("CARGO_BIN_EXE_gradebookd");
    let mut cmd = Command::new(exe);
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .env_remove("GRADEBOOKD_CONFIG");
    for (k, v) in envs {
        cmd.env(k, v);
    }
    let mut child = cmd.spawn().expect("spawn gradebookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    Daemon {
        child,
        stdin,
        reader: BufReader::new(stdout),
    }
}

impl Daemon {
    pub fn send_line(&mut self, line: &str) -> serde_json::Value {
        writeln!(self.stdin, "{}", line).expect("write request");
        self.stdin.flush().expect("flush request");

        let mut out = String::new();
        self.reader.read_line(&mut out).expect("read response line");
        assert!(!out.trim().is_empty(), "empty response for {}", line);
        serde_json::from_str(out.trim()).expect("parse response json")
    }

    pub fn request(&mut self, id: &str, method: &str, params: serde_json::Value) -> serde_json::Value {
        let payload = json!({
            "id": id,
            "method": method,
            "params": params,
        });
        let value = self.send_line(&payload.to_string());
        assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
        value
    }

    pub fn request_ok(&mut self, id: &str, method: &str, params: serde_json::Value) -> serde_json::Value {
        let value = self.request(id, method, params);
        assert!(
            value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
            "{} failed: {}",
            method,
            value
        );
        value.get("result").cloned().unwrap_or_else(|| json!({}))
    }

    /// Returns the error code of a request expected to fail.
    pub fn request_err(&mut self, id: &str, method: &str, params: serde_json::Value) -> String {
        let value = self.request(id, method, params);
        assert_eq!(
            value.get("ok").and_then(|v| v.as_bool()),
            Some(false),
            "{} unexpectedly succeeded: {}",
            method,
            value
        );
        value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string()
    }

    pub fn finish(self) {
        let Daemon { mut child, stdin, .. } = self;
        drop(stdin);
        let _ = child.wait();
    }
}

pub fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

pub fn num(v: &serde_json::Value) -> f64 {
    v.as_f64().unwrap_or_else(|| panic!("expected number, got {}", v))
}

pub fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
}

/// Two 20-point subjects, students A and B, first-sequence marks
/// A: 18 + 16, B: 10 + 8.
pub fn two_student_snapshot() -> serde_json::Value {
    json!({
        "students": [
            { "id": "stu-a", "name": "Alice Mbah" },
            { "id": "stu-b", "name": "Bruno Eto" }
        ],
        "subjects": [
            { "id": "math", "name": "Mathematics", "total": 20 },
            { "id": "eng", "name": "English", "total": 20 }
        ],
        "marks": [
            { "id": "m1", "studentId": "stu-a", "subjectId": "math", "sequence": "first", "value": 18 },
            { "id": "m2", "studentId": "stu-a", "subjectId": "eng", "sequence": "first", "value": 16 },
            { "id": "m3", "studentId": "stu-b", "subjectId": "math", "sequence": "first", "value": 10 },
            { "id": "m4", "studentId": "stu-b", "subjectId": "eng", "sequence": "first", "value": 8 }
        ]
    })
}
