mod common;

use std::fs;

use assert_cmd::Command;
use common::{PEOPLE_CSV, REPORT_WITH_PREAMBLE, TestWorkspace};
use predicates::{prelude::*, str::contains};
use serde_json::Value as JsonValue;

fn rowstream() -> Command {
    Command::cargo_bin("rowstream").expect("binary exists")
}

#[test]
fn preview_shows_headers_types_and_rows() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("people.csv", PEOPLE_CSV);

    rowstream()
        .args(["preview", "-i", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("id"))
        .stdout(contains("<integer>"))
        .stdout(contains("<decimal>"))
        .stdout(contains("<date>"))
        .stdout(contains("<boolean>"))
        .stdout(contains("Carol"))
        .stdout(contains("7.25"));
}

#[test]
fn preview_limits_displayed_rows() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("people.csv", PEOPLE_CSV);

    rowstream()
        .args(["preview", "-i", input.to_str().unwrap(), "--rows", "1"])
        .assert()
        .success()
        .stdout(contains("Alice"))
        .stdout(contains("Bob").not());
}

#[test]
fn preview_reads_stdin() {
    rowstream()
        .args(["preview", "-i", "-"])
        .write_stdin(PEOPLE_CSV)
        .assert()
        .success()
        .stdout(contains("Alice"));
}

#[test]
fn strict_preview_fails_on_bad_value() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("qty.csv", "qty\n1\n2\nx\n");

    rowstream()
        .args(["preview", "-i", input.to_str().unwrap(), "--types", "int"])
        .assert()
        .failure()
        .stderr(contains("Failed to cast 'x' as integer in column 'qty'"));
}

#[test]
fn lenient_preview_blanks_bad_values() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("qty.csv", "qty\n1\n2\nx\n");

    rowstream()
        .args([
            "preview",
            "-i",
            input.to_str().unwrap(),
            "--types",
            "int",
            "--lenient",
        ])
        .assert()
        .success()
        .stdout(contains("<integer>"))
        .stdout(contains("x").not());
}

#[test]
fn preview_without_header_generates_field_names() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("pairs.csv", "1,2\n3,4\n");

    rowstream()
        .args(["preview", "-i", input.to_str().unwrap(), "--no-header"])
        .assert()
        .success()
        .stdout(contains("field_0"))
        .stdout(contains("field_1"));
}

#[test]
fn probe_writes_json_report() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("report.csv", REPORT_WITH_PREAMBLE);
    let output = workspace.path().join("report.json");

    rowstream()
        .args([
            "probe",
            "-i",
            input.to_str().unwrap(),
            "--header-tolerance",
            "3",
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let report: JsonValue =
        serde_json::from_str(&fs::read_to_string(&output).expect("read report")).expect("json");
    assert_eq!(report["table"], "report");
    assert_eq!(report["header_row"], 2);
    let columns = report["columns"].as_array().expect("columns");
    let summary: Vec<(&str, &str)> = columns
        .iter()
        .map(|column| {
            (
                column["name"].as_str().expect("name"),
                column["type"].as_str().expect("type"),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("region", "string"),
            ("units", "integer"),
            ("revenue", "decimal"),
        ]
    );
}

#[test]
fn probe_threshold_is_applied_and_printed_to_stdout() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("qty.csv", "qty\n1\n2\n3\nx\n");

    let assert = rowstream()
        .args(["probe", "-i", input.to_str().unwrap(), "--threshold", "0.75"])
        .assert()
        .success();
    let report: JsonValue =
        serde_json::from_slice(&assert.get_output().stdout).expect("json on stdout");
    assert_eq!(report["columns"][0]["type"], "integer");
    assert_eq!(report["columns"][0]["autogenerated"], false);
}

#[test]
fn invalid_threshold_is_reported() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("qty.csv", "qty\n1\n");

    rowstream()
        .args(["probe", "-i", input.to_str().unwrap(), "--threshold", "2"])
        .assert()
        .failure()
        .stderr(contains("threshold must be within"));
}

#[test]
fn unknown_type_name_is_rejected_by_argument_parsing() {
    rowstream()
        .args(["preview", "-i", "whatever.csv", "--types", "int,currency"])
        .assert()
        .failure()
        .stderr(contains("Unknown column type 'currency'"));
}
