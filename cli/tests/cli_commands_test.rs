//! Runs the `origin` binary against ledger fixtures.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn fixture() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/ledger.json")
}

fn origin(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_origin"))
        .args(args)
        .env_remove("ORIGIN_BASE_URL")
        .env_remove("ORIGIN_PAGE_SIZE")
        .env_remove("ORIGIN_LEDGER")
        .env_remove("ORIGIN_USER")
        .env_remove("RUST_LOG")
        .output()
        .expect("origin binary runs")
}

/// `origin <command> --ledger <ledger> --user <user> <args..>`
fn run_as(command: &str, ledger: &Path, user: &str, args: &[&str]) -> Output {
    let ledger = ledger.to_str().expect("utf-8 path");
    let mut full = vec![command, "--ledger", ledger, "--user", user];
    full.extend_from_slice(args);
    origin(&full)
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn list_prints_first_page_with_total() {
    let output = run_as("list", &fixture(), "0xa11ce", &["--page-size", "2"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let printed = stdout(&output);
    assert!(printed.contains("Solar One"), "first asset listed:\n{printed}");
    assert!(printed.contains("Wind Two"), "second asset listed:\n{printed}");
    assert!(!printed.contains("Hydro Three"), "third asset is on page 2:\n{printed}");
    assert!(printed.contains("Total"), "footer printed:\n{printed}");
    assert!(printed.contains("6.000"), "footer sums 4 and 2 kWh:\n{printed}");
    assert!(
        printed.contains("page 1 of 2, 3 asset(s)"),
        "page summary:\n{printed}"
    );
}

#[test]
fn list_mine_hides_foreign_assets() {
    let output = run_as("list", &fixture(), "0xA11CE", &["--mine"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let printed = stdout(&output);
    assert!(printed.contains("Solar One"), "own asset listed:\n{printed}");
    assert!(printed.contains("Hydro Three"), "own asset listed:\n{printed}");
    assert!(!printed.contains("Wind Two"), "Bob's asset hidden:\n{printed}");
}

#[test]
fn list_filters_by_column() {
    let output = run_as("list", &fixture(), "0xb0b", &["-f", "country=uk"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let printed = stdout(&output);
    assert!(printed.contains("Wind Two"), "UK asset listed:\n{printed}");
    assert!(!printed.contains("Solar One"), "German asset filtered out:\n{printed}");
    assert!(printed.contains("1 asset(s)"), "total counts the filtered list:\n{printed}");
}

#[test]
fn list_rejects_unknown_filter_property() {
    let output = run_as("list", &fixture(), "0xb0b", &["-f", "colour=red"]);

    assert!(!output.status.success(), "unknown property must fail");
    assert!(
        stderr(&output).contains("unknown filter property"),
        "stderr: {}",
        stderr(&output)
    );
}

#[test]
fn details_prints_detail_view_path() {
    let output = run_as("details", &fixture(), "0xb0b", &["1"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output).trim(),
        "/origin/assets/producing_detail_view/1",
        "detail view path"
    );
}

#[test]
fn request_with_yes_confirms() {
    let output = run_as("request", &fixture(), "0xa11ce", &["2", "--yes"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let printed = stdout(&output);
    assert!(
        printed.contains("Request I-RECs for asset 2"),
        "request summary:\n{printed}"
    );
    assert!(
        printed.contains("Requested I-RECs for 2 smart meter reads of asset 2."),
        "success notification:\n{printed}"
    );
}

#[test]
fn request_for_fully_requested_asset_fails() {
    let output = run_as("request", &fixture(), "0xa11ce", &["0", "--yes"]);

    assert!(!output.status.success(), "rejected request must fail");
    assert!(
        stdout(&output).contains(
            "You have already requested certificates for all smart meter reads for this asset."
        ),
        "rejection printed:\n{}",
        stdout(&output)
    );
}

#[test]
fn request_by_non_owner_fails() {
    let output = run_as("request", &fixture(), "0xb0b", &["0", "--yes"]);

    assert!(!output.status.success(), "rejected request must fail");
    assert!(
        stdout(&output).contains("You need to own the asset to request I-RECs."),
        "rejection printed:\n{}",
        stdout(&output)
    );
}

#[test]
fn unregistered_owner_makes_the_page_fail() {
    let mut ledger = tempfile::NamedTempFile::new().expect("temp ledger");
    ledger
        .write_all(
            br#"{
                "producingAssets": [{
                    "id": 5,
                    "owner": "0xghost",
                    "offChainProperties": {
                        "facilityName": "Ghost",
                        "region": "Nowhere",
                        "country": "XX",
                        "capacityWh": 1
                    }
                }]
            }"#,
        )
        .expect("write ledger");

    let output = run_as("list", ledger.path(), "0xghost", &[]);

    assert!(!output.status.success(), "failed page must fail the command");
    assert!(
        stderr(&output).contains("Could not load producing assets"),
        "stderr: {}",
        stderr(&output)
    );
}

#[test]
fn missing_ledger_is_reported() {
    let dir = tempfile::tempdir().expect("temp dir");

    let output = run_as("list", &dir.path().join("absent.json"), "0xa11ce", &[]);

    assert!(!output.status.success(), "missing ledger must fail");
    assert!(
        stderr(&output).contains("Failed to read ledger"),
        "stderr: {}",
        stderr(&output)
    );
}
