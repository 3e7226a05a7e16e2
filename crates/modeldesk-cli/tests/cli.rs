use std::fs;
use std::path::{Path, PathBuf};

use httpmock::prelude::*;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;

fn bin() -> assert_cmd::Command {
    assert_cmd::Command::cargo_bin("mdk").expect("binary")
}

/// Config pointing all three services at one mock server, plus a token file.
struct Env {
    _tmp: TempDir,
    config: PathBuf,
    token: PathBuf,
}

impl Env {
    fn new(server: &MockServer, token: Option<&str>) -> Self {
        let tmp = TempDir::new().expect("tmpdir");
        let config = tmp.path().join("modeldesk.yaml");
        let base = server.base_url();
        fs::write(
            &config,
            format!(
                "access_control_url: {base}\nmodel_management_url: {base}\nmodel_runner_url: {base}\n"
            ),
        )
        .expect("write config");
        let token_path = tmp.path().join("token");
        if let Some(token) = token {
            fs::write(&token_path, format!("token: {token}\n")).expect("write token");
        }
        Self {
            _tmp: tmp,
            config,
            token: token_path,
        }
    }

    fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = bin();
        cmd.arg("--config")
            .arg(&self.config)
            .arg("--token-file")
            .arg(&self.token)
            .env_remove("MODELDESK_PASSWORD");
        cmd
    }

    fn token_path(&self) -> &Path {
        &self.token
    }
}

fn run_json(id: &str, state: &str) -> serde_json::Value {
    json!({
        "_id": id,
        "model_id": "m1",
        "model_name": "churn",
        "model_type": "predictive",
        "model_engine": "docker",
        "state": state,
        "input_features": [{"name": "age", "value": 0}],
        "createdAt": "2024-05-01T10:00:00Z",
        "updatedAt": "2024-05-01T10:02:03Z"
    })
}

#[test]
fn signin_stores_token_and_logout_removes_it() {
    let server = MockServer::start();
    let signin = server.mock(|when, then| {
        when.method(POST)
            .path("/signin")
            .json_body(json!({"email": "ada@example.com", "password": "hunter2"}));
        then.status(200).json_body(json!({"message": "tok-123"}));
    });
    let env = Env::new(&server, None);

    env.cmd()
        .args(["signin", "--email", "ada@example.com", "--password", "hunter2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed in"));
    signin.assert();
    let stored = fs::read_to_string(env.token_path()).expect("token file");
    assert!(stored.contains("tok-123"));

    env.cmd().arg("logout").assert().success();
    assert!(!env.token_path().exists());
}

#[test]
fn failed_signin_reports_generic_message() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/signin");
        then.status(401).json_body(json!({"error": "bad password"}));
    });
    let env = Env::new(&server, None);

    env.cmd()
        .args(["signin", "--email", "ada@example.com", "--password", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Sign in failed"));
    assert!(!env.token_path().exists());
}

#[test]
fn commands_require_a_session() {
    let server = MockServer::start();
    let env = Env::new(&server, None);

    env.cmd()
        .args(["runs", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not signed in"));
}

#[test]
fn lists_runs_for_a_model() {
    let server = MockServer::start();
    let runs = server.mock(|when, then| {
        when.method(GET)
            .path("/model-runs")
            .query_param("model_id", "m1")
            .header("authorization", "Bearer tok");
        then.status(200)
            .json_body(json!([run_json("r1", "finished"), run_json("r2", "queued")]));
    });
    let env = Env::new(&server, Some("tok"));

    env.cmd()
        .args(["runs", "list", "--model", "m1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Last Updated On ↓"))
        .stdout(predicate::str::contains("2m 3s"))
        .stdout(predicate::str::contains("✔ finished"))
        .stdout(predicate::str::contains("⟳ queued"));
    runs.assert();
}

#[test]
fn submits_zero_as_a_number() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/models/m1");
        then.status(200).json_body(json!({
            "_id": "m1",
            "name": "churn",
            "type": "predictive",
            "engine": "docker",
            "features": [{"name": "age", "type": "int"}]
        }));
    });
    let submit = server.mock(|when, then| {
        when.method(POST)
            .path("/model-runs/m1")
            .json_body(json!({"model_id": "m1", "input_features": [{"name": "age", "value": 0}]}));
        then.status(201).json_body(run_json("r9", "queued"));
    });
    let env = Env::new(&server, Some("tok"));

    env.cmd()
        .args(["runs", "submit", "m1", "--input", "age=0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Run r9 is queued"));
    submit.assert();
}

#[test]
fn backend_validation_errors_are_shown() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/model-runs/r1");
        then.status(422)
            .json_body(json!({"error": [{"msg": "run not found"}, {"msg": "check the id"}]}));
    });
    let env = Env::new(&server, Some("tok"));

    env.cmd()
        .args(["runs", "show", "r1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("run not found, check the id"));
}

#[test]
fn rejects_wrong_model_artifact_before_upload() {
    let server = MockServer::start();
    let create = server.mock(|when, then| {
        when.method(POST);
        then.status(201);
    });
    let env = Env::new(&server, Some("tok"));
    let artifact = env.config.with_file_name("model.exe");
    fs::write(&artifact, b"MZ").expect("write artifact");

    env.cmd()
        .args(["models", "create", "--name", "churn", "--feature", "age:int"])
        .arg(&artifact)
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Only .pkl, .sav, .rds, and .zip files are allowed.",
        ));
    create.assert_hits(0);
}
