use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const ORDER_ID: &str = "550e8400-e29b-41d4-a716-446655440000";

fn har_entry(method: &str, url: &str, status: u16, second: u32) -> Value {
    json!({
        "startedDateTime": format!("2021-02-03T07:48:{second:02}Z"),
        "time": 12,
        "request": {
            "method": method,
            "url": url,
            "httpVersion": "HTTP/1.1",
            "headers": [],
            "queryString": []
        },
        "response": {
            "status": status,
            "statusText": "",
            "httpVersion": "HTTP/1.1",
            "headers": [],
            "content": {"size": 11, "mimeType": "application/json", "text": "{\"ok\":true}"}
        }
    })
}

fn write_har(path: &Path, entries: &[Value]) {
    let doc = json!({"log": {"version": "1.2", "entries": entries}});
    fs::write(path, serde_json::to_vec(&doc).unwrap()).unwrap();
}

#[allow(deprecated)]
fn oasgen() -> Command {
    let mut cmd = Command::cargo_bin("oasgen").expect("binary");
    cmd.env_remove("RUST_LOG").arg("--quiet");
    cmd
}

fn run_json(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("command run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid json")
}

fn path_keys(spec: &Value) -> Vec<String> {
    spec["paths"]
        .as_object()
        .map(|paths| paths.keys().cloned().collect())
        .unwrap_or_default()
}

#[test]
fn replays_har_into_spec_map() {
    let temp = tempdir().unwrap();
    write_har(
        &temp.path().join("capture.har"),
        &[
            har_entry("GET", "http://api.local/users", 200, 1),
            har_entry("GET", &format!("http://api.local/orders/{ORDER_ID}"), 200, 2),
            har_entry("GET", "http://api.local/users", 200, 3),
        ],
    );

    let specs = run_json(oasgen().arg(temp.path()));

    let spec = &specs["api.local"];
    assert_eq!(spec["openapi"], "3.1.0");
    assert_eq!(spec["servers"][0]["url"], "http://api.local");
    assert_eq!(path_keys(spec), vec!["/orders/{p1}", "/users"]);
    assert_eq!(spec["paths"]["/users"]["get"]["x-counters-total"]["entries"], 2);
}

#[test]
fn ldjson_source_and_port_are_kept() {
    let temp = tempdir().unwrap();
    let lines = [
        json!({"_source": "frontend"}).to_string(),
        har_entry("POST", "http://api.local:8080/login", 200, 1).to_string(),
    ];
    fs::write(temp.path().join("capture.ldjson"), lines.join("\n")).unwrap();

    let specs = run_json(oasgen().arg(temp.path()));

    let spec = &specs["api.local:8080"];
    assert_eq!(spec["servers"][0]["url"], "http://api.local:8080");
    let op = &spec["paths"]["/login"]["post"];
    assert_eq!(op["x-counters-per-source"]["frontend"]["entries"], 1);
}

#[test]
fn source_flag_applies_to_undeclared_captures() {
    let temp = tempdir().unwrap();
    write_har(
        &temp.path().join("capture.har"),
        &[har_entry("GET", "http://api.local/users", 200, 1)],
    );

    let specs = run_json(oasgen().arg("--source").arg("batch").arg(temp.path()));

    let op = &specs["api.local"]["paths"]["/users"]["get"];
    assert_eq!(op["x-counters-per-source"]["batch"]["entries"], 1);
}

#[test]
fn bad_captures_are_skipped() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("broken.har"), "not json").unwrap();
    write_har(
        &temp.path().join("good.har"),
        &[har_entry("GET", "http://api.local/users", 200, 1)],
    );

    let specs = run_json(oasgen().arg(temp.path()));

    assert_eq!(path_keys(&specs["api.local"]), vec!["/users"]);
}

#[test]
fn out_dir_specs_feed_the_next_run() {
    let temp = tempdir().unwrap();
    let first = temp.path().join("first.har");
    let second = temp.path().join("second.har");
    let specs_dir = temp.path().join("specs");
    write_har(&first, &[har_entry("GET", "http://api.local/users", 200, 1)]);
    write_har(
        &second,
        &[
            har_entry("GET", "http://api.local/users", 200, 5),
            har_entry("DELETE", "http://api.local/sessions", 204, 6),
        ],
    );

    oasgen()
        .arg("--out-dir")
        .arg(&specs_dir)
        .arg(&first)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    assert!(specs_dir.join("api.local.json").is_file());

    let specs = run_json(oasgen().arg("--load-dir").arg(&specs_dir).arg(&second));

    let spec = &specs["api.local"];
    assert_eq!(path_keys(spec), vec!["/sessions", "/users"]);
    assert_eq!(spec["paths"]["/users"]["get"]["x-counters-total"]["entries"], 2);
}

#[test]
fn no_captures_prints_empty_map() {
    let specs = run_json(&mut oasgen());
    assert_eq!(specs, json!({}));
}

#[test]
fn missing_input_fails() {
    let temp = tempdir().unwrap();
    oasgen()
        .arg(temp.path().join("absent.har"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn invalid_overrides_are_rejected() {
    oasgen()
        .arg("--max-examples")
        .arg("0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_examples"));
}
