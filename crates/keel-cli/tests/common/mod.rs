//! Shared E2E test helpers for `keel` binary tests.

#![allow(dead_code)]

use assert_cmd::cargo::cargo_bin_cmd;
use std::path::Path;
use std::time::Duration;

/// Default timeout for CLI tests.
pub const TIMEOUT_BASIC: Duration = Duration::from_secs(10);

/// Settings variables that would leak the developer's environment into tests.
const KEEL_ENV_VARS: &[&str] = &[
    "KEEL_REALM",
    "KEEL_DEFAULT_CONTEXT",
    "KEEL_DEFAULT_NAMESPACE",
    "KEEL_SITE_URL",
    "KEEL_MANAGER_URL",
    "KEEL_HTTP_HOST",
    "RUST_LOG",
];

/// Site manifest used by most tests.
pub const SITE: &str = r#"
permissions = ["edit_resource", "view_resource"]

[system]
site_name = "Demo"
password = "hunter2"
dsn = "mysql:host=db"
core_path = "/srv/keel/core/"

[contexts.mgr]
options = { manager_theme = "dark" }

[contexts.web]
site_start = "1"
aliases = { "1" = "index.html" }

[contexts.closed]
available = false

[users.ed]
id = 5
realms = ["mgr"]
permissions = ["edit_resource"]

[users.web_only]
id = 6
realms = ["web"]

[[resource_types]]
class = "BlogPost"
menu_visible = true
menu_label = "Blog Post"
drop_policy = 2

[[resource_types]]
class = "Folder"

[namespaces.core]
path = "/srv/core/"
assets_url = "/assets/core/"

[legacy_actions.12]
namespace = "gallery"
help_url = "/docs/gallery"

[actions]
"12" = "gallery/index"

[lexicon]
permission_denied = "Access refused."
"#;

/// Build a Command isolated in `dir`, without `--manifest`.
///
/// `HOME` points at `dir` so no global config is read.
pub fn keel_cmd_raw(dir: &Path) -> assert_cmd::Command {
    let mut cmd: assert_cmd::Command = cargo_bin_cmd!("keel");
    cmd.timeout(TIMEOUT_BASIC);
    for var in KEEL_ENV_VARS {
        cmd.env_remove(var);
    }
    cmd.env("HOME", dir);
    cmd.arg("-C").arg(dir);
    cmd
}

/// Writes `manifest` to `dir/site.toml` and returns a command reading it.
pub fn keel_cmd(dir: &Path, manifest: &str) -> assert_cmd::Command {
    let path = dir.join("site.toml");
    std::fs::write(&path, manifest).expect("write manifest");

    let mut cmd = keel_cmd_raw(dir);
    cmd.arg("--manifest").arg(&path);
    cmd
}

/// Extracts the JSON assigned by the last `Keel.<name> = ...;` statement.
pub fn statement(stdout: &str, name: &str) -> Option<serde_json::Value> {
    let prefix = format!("Keel.{name} = ");
    stdout
        .lines()
        .filter_map(|line| line.strip_prefix(prefix.as_str()))
        .last()
        .and_then(|rest| serde_json::from_str(rest.trim_end_matches(';')).ok())
}
