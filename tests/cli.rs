mod common;

use assert_cmd::Command;
use common::TestWorkspace;
use dashforge::infer::{ColumnMap, ColumnRole};
use predicates::prelude::*;

const SALES_CSV: &str = "\
date,region,revenue,cost
2024-01-01,North,100,40
2024-01-02,South,200,90
2024-01-03,North,50,30
";

fn dashforge() -> Command {
    Command::cargo_bin("dashforge").expect("binary builds")
}

#[test]
fn probe_reports_roles_and_writes_a_loadable_map() {
    let ws = TestWorkspace::new();
    let input = ws.write_file("sales.csv", SALES_CSV);
    let map_path = ws.path().join("map.json");

    dashforge()
        .arg("probe")
        .arg("-i")
        .arg(&input)
        .arg("--map")
        .arg(&map_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("date"))
        .stdout(predicate::str::contains("time"))
        .stdout(predicate::str::contains("metric"));

    let map = ColumnMap::load(&map_path).expect("map round-trips");
    assert_eq!(map.role_of("date"), ColumnRole::Time);
    assert_eq!(map.role_of("revenue"), ColumnRole::Metric);
    assert_eq!(map.role_of("region"), ColumnRole::Dimension);
}

#[test]
fn process_applies_formulas_and_filters() {
    let ws = TestWorkspace::new();
    let input = ws.write_file("sales.csv", SALES_CSV);

    dashforge()
        .arg("process")
        .arg("-i")
        .arg(&input)
        .arg("--formula")
        .arg("profit = [revenue] - [cost]")
        .arg("--x-axis")
        .arg("date")
        .arg("--from")
        .arg("2024-01-01")
        .arg("--to")
        .arg("2024-01-02")
        .assert()
        .success()
        .stdout(predicate::str::contains("date,region,revenue,cost,profit"))
        .stdout(predicate::str::contains("2024-01-01,North,100,40,60"))
        .stdout(predicate::str::contains("2024-01-03").not());
}

#[test]
fn process_summary_groups_and_orders_by_first_metric() {
    let ws = TestWorkspace::new();
    let input = ws.write_file("sales.csv", SALES_CSV);

    let assert = dashforge()
        .arg("process")
        .arg("-i")
        .arg(&input)
        .arg("--summary")
        .arg("--group")
        .arg("region")
        .arg("-M")
        .arg("revenue")
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "region,revenue");
    assert_eq!(lines[1], "South,200");
    assert_eq!(lines[2], "North,150");
}

#[test]
fn process_writes_an_output_file() {
    let ws = TestWorkspace::new();
    let input = ws.write_file("sales.csv", SALES_CSV);
    let output = ws.path().join("out.csv");

    dashforge()
        .arg("process")
        .arg("-i")
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--allow")
        .arg("region=South")
        .assert()
        .success();

    let written = std::fs::read_to_string(&output).expect("output exists");
    assert!(written.contains("2024-01-02,South,200,90"));
    assert!(!written.contains("North"));
}

#[test]
fn stats_prints_the_summary_table() {
    let ws = TestWorkspace::new();
    let input = ws.write_file("sales.csv", SALES_CSV);

    dashforge()
        .arg("stats")
        .arg("-i")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("metric"))
        .stdout(predicate::str::contains("revenue"))
        .stdout(predicate::str::contains("350"));
}

#[test]
fn json_rows_import_with_native_numbers() {
    let ws = TestWorkspace::new();
    let input = ws.write_file(
        "sales.json",
        r#"[
            {"date": 45000, "region": "North", "revenue": 10},
            {"date": 45001, "region": "South", "revenue": 20}
        ]"#,
    );

    dashforge()
        .arg("process")
        .arg("-i")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("2023-03-15"))
        .stdout(predicate::str::contains("2023-03-16"));
}

#[test]
fn empty_input_is_an_error() {
    let ws = TestWorkspace::new();
    let input = ws.write_file("empty.csv", "date,region,revenue\n");

    dashforge()
        .arg("process")
        .arg("-i")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no data rows"));
}

#[test]
fn malformed_allow_filter_is_rejected() {
    let ws = TestWorkspace::new();
    let input = ws.write_file("sales.csv", SALES_CSV);

    dashforge()
        .arg("process")
        .arg("-i")
        .arg(&input)
        .arg("--allow")
        .arg("region")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Dimension=a|b"));
}
