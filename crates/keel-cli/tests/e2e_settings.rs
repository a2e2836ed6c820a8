//! E2E tests for process settings layering.

mod common;

use common::{keel_cmd, statement, SITE};

fn config_of(output: std::process::Output) -> serde_json::Value {
    assert!(output.status.success(), "keel failed: {output:?}");
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    statement(&stdout, "config").expect("config statement")
}

#[test]
fn project_config_is_read() {
    let tmp = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir_all(tmp.path().join(".keel")).expect("mkdir");
    std::fs::write(
        tmp.path().join(".keel/config.toml"),
        "[urls]\nmanager_url = \"/admin/\"\n\n[security]\nextra_sensitive_keys = [\"site_name\"]\n",
    )
    .expect("write config");

    let config = config_of(
        keel_cmd(tmp.path(), SITE)
            .args(["--user", "ed"])
            .output()
            .expect("run keel"),
    );
    assert_eq!(config["manager_url"], "/admin/");
    assert!(config.get("site_name").is_none());
}

#[test]
fn env_overrides_project() {
    let tmp = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir_all(tmp.path().join(".keel")).expect("mkdir");
    std::fs::write(
        tmp.path().join(".keel/config.toml"),
        "[urls]\nhttp_host = \"project.example\"\n",
    )
    .expect("write config");

    let config = config_of(
        keel_cmd(tmp.path(), SITE)
            .env("KEEL_HTTP_HOST", "env.example")
            .args(["--user", "ed"])
            .output()
            .expect("run keel"),
    );
    assert_eq!(config["http_host_remote"], "http://env.example");
}

#[test]
fn default_context_flag() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config = config_of(
        keel_cmd(tmp.path(), SITE)
            .args(["--user", "ed", "--default-context", "mgr"])
            .output()
            .expect("run keel"),
    );
    // mgr has no site_start
    assert!(config.get("default_site_url").is_none());
}

#[test]
fn invalid_payload_global_is_config_error() {
    let tmp = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir_all(tmp.path().join(".keel")).expect("mkdir");
    std::fs::write(
        tmp.path().join(".keel/config.toml"),
        "[payload]\nglobal = \"bad name\"\n",
    )
    .expect("write config");

    keel_cmd(tmp.path(), SITE)
        .args(["--user", "ed"])
        .assert()
        .code(1);
}
