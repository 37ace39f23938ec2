mod support;

use predicates::str::contains;
use support::TestDir;

#[test]
fn login_whoami_logout_flow() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::fast();

    dir.cmd()
        .arg("login")
        .assert()
        .success()
        .stdout(contains("signed in as Demo User"));

    let stored: serde_json::Value = serde_json::from_str(&dir.read_file("user.json").expect("user"))?;
    assert_eq!(stored["name"], "Demo User");
    assert_eq!(stored["email"], "demo@example.com");

    let whoami = dir.json(&["whoami"]);
    assert_eq!(whoami["data"]["authenticated"], true);
    assert_eq!(whoami["data"]["identity"]["id"], stored["id"]);

    dir.cmd()
        .arg("logout")
        .assert()
        .success()
        .stdout(contains("signed out"));
    assert!(dir.read_file("user.json").is_none());

    let whoami = dir.json(&["whoami"]);
    assert_eq!(whoami["data"]["authenticated"], false);
    Ok(())
}

#[test]
fn second_login_keeps_identity() {
    let dir = TestDir::fast();
    let first = dir.json(&["login"]);
    let second = dir.json(&["login"]);
    assert_eq!(first["data"]["identity"]["id"], second["data"]["identity"]["id"]);
}

#[test]
fn failed_login_reports_authentication_error() {
    let dir = TestDir::new();
    dir.write_config("[session]\nlogin_delay_ms = 0\nfailure_rate = 1.0\n");

    dir.cmd()
        .arg("login")
        .assert()
        .code(3)
        .stderr(contains("Authentication failed. Please try again."));
    assert!(dir.read_file("user.json").is_none());
}

#[test]
fn stored_profile_is_normalized_on_startup() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TestDir::fast();
    dir.write_file(
        "user.json",
        r#"{"id":"u-legacy","email":"someone@else.org","name":"Someone Else"}"#,
    );

    let whoami = dir.json(&["whoami"]);
    assert_eq!(whoami["data"]["identity"]["id"], "u-legacy");
    assert_eq!(whoami["data"]["identity"]["name"], "Demo User");

    let stored: serde_json::Value = serde_json::from_str(&dir.read_file("user.json").expect("user"))?;
    assert_eq!(stored["email"], "demo@example.com");
    Ok(())
}

#[test]
fn normalization_can_be_turned_off() {
    let dir = TestDir::new();
    dir.write_config("[session]\nnormalize_profile_on_load = false\n");
    dir.write_file(
        "user.json",
        r#"{"id":"u-legacy","email":"someone@else.org","name":"Someone Else"}"#,
    );

    let whoami = dir.json(&["whoami"]);
    assert_eq!(whoami["data"]["identity"]["name"], "Someone Else");
}

#[test]
fn logout_removes_stored_tasks() {
    let dir = TestDir::fast();
    dir.login();
    dir.add_task("Buy milk", "2025-06-01");
    assert!(dir.read_file("todos.json").is_some());

    dir.cmd().arg("logout").assert().success();
    assert!(dir.read_file("todos.json").is_none());

    dir.login();
    let list = dir.json(&["task", "ls"]);
    assert_eq!(list["data"]["total"], 0);
}
