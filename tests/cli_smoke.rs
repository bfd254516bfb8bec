use assert_cmd::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn write_dataset(data_dir: &Path, user: &str) {
    let dir = data_dir.join(user);
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("user.json"),
        r#"{"name":"Alice","company":null,"avatar":"https://avatars.example/alice","created":"2015-06-01T00:00:00Z","url":"https://github.com/alice"}"#,
    )
    .unwrap();
    fs::write(
        dir.join("repos.json"),
        r#"[{"name":"alice/app","description":"an app"},{"name":"bob/lib","description":null}]"#,
    )
    .unwrap();
    fs::write(
        dir.join("issues.json"),
        r#"{"alice/app":[{"title":"crash","created":"2024-01-05T00:00:00Z","number":4,"participants":["alice","bob"]}],"bob/lib":[]}"#,
    )
    .unwrap();
    fs::write(
        dir.join("commits.json"),
        r#"{
  "alice/app": [
    {"sha":"c1","date":"2024-01-10T12:00:00Z","message":"init","files":["src/main.rs","README.md"]},
    {"sha":"c2","date":"2024-02-02T12:00:00Z","message":"more","files":["src/lib.rs","notes.xyz"]}
  ],
  "bob/lib": [
    {"sha":"c3","date":"2024-01-20T12:00:00Z","message":"lib","files":["lib.py","lib.test.py"]}
  ]
}"#,
    )
    .unwrap();
}

fn contribstat(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("contribstat").unwrap();
    cmd.env_remove("GITHUB_TOKEN")
        .env_remove("RUST_LOG")
        .env_remove("CACHE_TIME")
        .arg("--data-dir")
        .arg(data_dir);
    cmd
}

#[test]
fn stats_json_outputs_aggregates() {
    let dir = tempdir().unwrap();
    write_dataset(dir.path(), "alice");

    let out = contribstat(dir.path())
        .args(["stats", "Alice", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();

    assert_eq!(v["version"], 1);
    assert_eq!(v["commits"], 3);
    assert_eq!(v["langs"]["months"], serde_json::json!(["2024-01", "2024-02"]));
    assert_eq!(v["langs"]["languages"]["rust"], serde_json::json!([1, 1]));
    assert_eq!(v["types"][0]["type_name"], "code");
    assert_eq!(v["types"][0]["count"], 3);
    assert_eq!(v["types"][4]["type_name"], "unknown");
    assert_eq!(v["graph"]["nodes"][0]["id"], "alice");
    assert_eq!(v["uncovered"], serde_json::json!(["notes.xyz"]));
}

#[test]
fn stats_can_focus_on_one_repository() {
    let dir = tempdir().unwrap();
    write_dataset(dir.path(), "alice");

    let out = contribstat(dir.path())
        .args(["stats", "alice", "--repo", "bob/lib", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(v["commits"], 1);
    assert_eq!(v["langs"]["months"], serde_json::json!(["2024-01"]));
    assert_eq!(v["langs"]["languages"]["python"], serde_json::json!([2]));
}

#[test]
fn stats_ndjson_emits_one_object_per_line() {
    let dir = tempdir().unwrap();
    write_dataset(dir.path(), "alice");

    let out = contribstat(dir.path())
        .args(["stats", "alice", "--ndjson"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(out).unwrap();
    let kinds: Vec<String> = text
        .lines()
        .map(|line| {
            let v: serde_json::Value = serde_json::from_str(line).unwrap();
            v["kind"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(kinds.iter().filter(|k| *k == "month").count(), 2);
    assert_eq!(kinds.iter().filter(|k| *k == "type").count(), 5);
    assert!(kinds.contains(&"edge".to_string()));
}

#[test]
fn stats_summary_prints_sections() {
    let dir = tempdir().unwrap();
    write_dataset(dir.path(), "alice");

    let out = contribstat(dir.path())
        .args(["stats", "alice"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8_lossy(&out);
    assert!(text.contains("Languages"));
    assert!(text.contains("Change types"));
    assert!(text.contains("Issue collaboration"));
}

#[test]
fn stats_without_dataset_fails() {
    let dir = tempdir().unwrap();
    contribstat(dir.path())
        .args(["stats", "nobody", "--json"])
        .assert()
        .failure();
}

#[test]
fn fetch_requires_a_token() {
    let dir = tempdir().unwrap();
    let out = contribstat(dir.path())
        .args(["fetch", "alice"])
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    assert!(String::from_utf8_lossy(&out).contains("GITHUB_TOKEN"));
}

#[test]
fn invalid_cache_ttl_is_rejected() {
    let dir = tempdir().unwrap();
    contribstat(dir.path())
        .args(["--cache-ttl", "soon", "stats", "alice"])
        .assert()
        .failure();
}

#[test]
fn rust_log_overrides_the_default_level() {
    let dir = tempdir().unwrap();
    write_dataset(dir.path(), "alice");

    let quiet = contribstat(dir.path())
        .args(["stats", "alice", "--json"])
        .assert()
        .success()
        .get_output()
        .stderr
        .clone();
    assert!(!String::from_utf8_lossy(&quiet).contains("loaded dataset"));

    let loud = contribstat(dir.path())
        .env("RUST_LOG", "debug")
        .args(["stats", "alice", "--json"])
        .assert()
        .success()
        .get_output()
        .stderr
        .clone();
    assert!(String::from_utf8_lossy(&loud).contains("loaded dataset"));
}

#[test]
fn verbose_enables_debug_without_rust_log() {
    let dir = tempdir().unwrap();
    write_dataset(dir.path(), "alice");

    let out = contribstat(dir.path())
        .args(["-v", "stats", "alice", "--json"])
        .assert()
        .success()
        .get_output()
        .stderr
        .clone();
    assert!(String::from_utf8_lossy(&out).contains("loaded dataset"));
}
