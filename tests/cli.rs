//! End-to-end tests for the `savor` binary.
//!
//! Every run gets its own HOME, data and runtime directories so a daemon or
//! config on the host never leaks into the results.

use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

const CATALOG: &str = r#"{"_id": "1", "name": "Cafe Coffee Day", "cuisines": "Cafe, Coffee", "location": "Indiranagar", "rate": "3.6/5", "online_order": "Yes"}
{"_id": "2", "name": "Pizza Hut", "cuisines": "Pizza, Fast Food", "location": "BTM", "book_table": "No"}
{"_id": "3", "name": "Domino's Pizza", "cuisines": "Pizza", "location": "BTM", "rest_type": "Quick Bites"}

{"_id": "4", "name": "", "cuisines": "Ghost"}
"#;

struct Sandbox {
    dir: TempDir,
    catalog: PathBuf,
}

impl Sandbox {
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        for sub in ["home", "data", "run"] {
            fs::create_dir_all(dir.path().join(sub)).unwrap();
        }
        let catalog = dir.path().join("restaurants.jsonl");
        fs::write(&catalog, CATALOG).unwrap();
        Self { dir, catalog }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_savor"));
        cmd.env("HOME", self.dir.path().join("home"))
            .env("XDG_DATA_HOME", self.dir.path().join("data"))
            .env("XDG_RUNTIME_DIR", self.dir.path().join("run"))
            .env_remove("SAVOR_CATALOG")
            .env_remove("SAVOR_LOG");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command().args(args).output().expect("Failed to run savor")
    }

    fn catalog(&self) -> &str {
        self.catalog.to_str().unwrap()
    }
}

fn json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "savor failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

#[test]
fn test_complete_json() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["complete", "--catalog", sandbox.catalog(), "--json", "piz"]);
    let response = json(&output);

    assert_eq!(response["total"], 3);
    assert_eq!(response["data"][0]["type"], "cuisine");
    assert_eq!(response["data"][0]["name"], "Pizza");
    assert_eq!(response["data"][1]["type"], "restaurant");
    assert_eq!(response["data"][1]["name"], "Pizza Hut");
    assert_eq!(response["data"][2]["name"], "Domino's Pizza");
}

#[test]
fn test_complete_limit() {
    let sandbox = Sandbox::new();

    let output = sandbox.run(&["complete", "-c", sandbox.catalog(), "--json", "-n", "1", "piz"]);
    assert_eq!(json(&output)["total"], 1);

    let output = sandbox.run(&["complete", "-c", sandbox.catalog(), "--json", "-n", "-3", "piz"]);
    let response = json(&output);
    assert_eq!(response["total"], 0);
    assert_eq!(response["data"], Value::Array(Vec::new()));
}

#[test]
fn test_complete_plain_output() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["complete", "-c", sandbox.catalog(), "cof"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("cuisine") && lines[0].ends_with("Coffee"));
    assert!(lines[1].contains("Cafe Coffee Day") && lines[1].contains("Indiranagar"));
}

#[test]
fn test_catalog_from_env() {
    let sandbox = Sandbox::new();
    let output = sandbox
        .command()
        .env("SAVOR_CATALOG", &sandbox.catalog)
        .args(["complete", "--json", "hut"])
        .output()
        .unwrap();

    let response = json(&output);
    assert_eq!(response["total"], 1);
    assert_eq!(response["data"][0]["id"], "2");
}

#[test]
fn test_saved_config_catalog() {
    let sandbox = Sandbox::new();

    let output = sandbox.run(&["config", "--catalog", sandbox.catalog(), "--limit", "2", "--save"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let response = json(&sandbox.run(&["complete", "--json", "piz"]));
    assert_eq!(response["total"], 2);
}

#[test]
fn test_missing_catalog_configuration() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["complete", "piz"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No catalog configured"));
}

#[test]
fn test_unreadable_catalog() {
    let sandbox = Sandbox::new();
    let missing = sandbox.dir.path().join("missing.json");
    let output = sandbox.run(&["complete", "-c", missing.to_str().unwrap(), "piz"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to load catalog"));
}

#[test]
fn test_cuisine_pages() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&[
        "cuisine", "-c", sandbox.catalog(), "pizza", "--limit", "1", "--page", "2", "--json",
    ]);
    let page = json(&output);

    assert_eq!(page["total_records"], 2);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["current_page"], 2);
    // Sorted by name: Domino's Pizza, then Pizza Hut
    assert_eq!(page["data"][0]["name"], "Pizza Hut");
    assert_eq!(page["data"][0]["rate"], "N/A");

    let output = sandbox.run(&["cuisine", "-c", sandbox.catalog(), "pizza", "--limit", "51"]);
    assert!(!output.status.success());
}

#[test]
fn test_list_filter_and_sort() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&[
        "list", "-c", sandbox.catalog(), "--filter", "cuisines=pizza", "--sort", "name_asc", "--json",
    ]);
    let page = json(&output);

    assert_eq!(page["total"], 2);
    assert_eq!(page["page"], 1);
    assert_eq!(page["data"][0]["name"], "Domino's Pizza");
    assert_eq!(page["data"][0]["id"], "3");
    assert_eq!(page["data"][1]["name"], "Pizza Hut");

    let output = sandbox.run(&["list", "-c", sandbox.catalog(), "-f", "online_order=yes", "--json"]);
    let page = json(&output);
    assert_eq!(page["total"], 1);
    assert_eq!(page["data"][0]["name"], "Cafe Coffee Day");

    let output = sandbox.run(&["list", "-c", sandbox.catalog(), "--sort", "stars_desc"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown sort field"));

    let output = sandbox.run(&["list", "-c", sandbox.catalog(), "--filter", "cuisines"]);
    assert!(!output.status.success());
}

#[test]
fn test_filters_json() {
    let sandbox = Sandbox::new();
    let options = json(&sandbox.run(&["filters", "-c", sandbox.catalog(), "--json"]));

    assert_eq!(options["location"], serde_json::json!(["BTM", "Indiranagar"]));
    assert_eq!(options["online_order"], serde_json::json!([false, true]));
    assert_eq!(options["rest_type"], serde_json::json!(["Quick Bites"]));
    assert_eq!(
        options["cuisines"],
        serde_json::json!(["Cafe", "Coffee", "Fast Food", "Ghost", "Pizza"])
    );
}

#[test]
fn test_index_reports_skipped() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["index", "-c", sandbox.catalog()]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Indexed 3 of 4 restaurants (1 skipped)"), "{}", stdout);
}

#[test]
fn test_daemon_status_when_stopped() {
    let sandbox = Sandbox::new();
    let output = sandbox.run(&["daemon", "status"]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Daemon is not running"));
    assert!(!sandbox.dir.path().join("run").join("savor.sock").exists());
}
