use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn write_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("service_hours.csv");
    let csv = "\
Name of student,Number of hours,Select student grade level,Description of service,Date of service,Name of student 2,Number of hours 2,Description of service 2
Ana Lopez,30,9th,Food bank shift,01/10/2026,Juan Perez,10,Park cleanup
ana lopez,12,9th,Library tutoring,02/14/2026,,,
";
    std::fs::write(&path, csv).expect("write fixture");
    path
}

fn run_tracker(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_service-hour-tracker"))
        .env_remove("SERVICE_HOURS_FEED_URL")
        .args(args)
        .output()
        .expect("run tracker")
}

#[test]
fn progress_renders_a_card_for_each_match() {
    let dir = tempfile::tempdir().expect("temp dir");
    let fixture = write_fixture(dir.path());

    let output = run_tracker(&[
        "--csv",
        fixture.to_str().expect("utf8 path"),
        "progress",
        "--query",
        "ana",
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(stdout.contains("Ana Lopez (grade 9th)"), "stdout: {stdout}");
    assert!(stdout.contains("Status: In Progress"));
    assert!(stdout.contains("Completed 42.0 hrs | minimum 50 hrs | distinction 100 hrs"));
    assert!(stdout.contains("8.0 more hours to meet the minimum requirement."));
    assert!(!stdout.contains("Juan"), "query should not match Juan");

    // Service log is newest first.
    let tutoring = stdout.find("Library tutoring").expect("tutoring entry");
    let food_bank = stdout.find("Food bank shift").expect("food bank entry");
    assert!(tutoring < food_bank);
}

#[test]
fn progress_reports_when_nobody_matches() {
    let dir = tempfile::tempdir().expect("temp dir");
    let fixture = write_fixture(dir.path());

    let output = run_tracker(&[
        "--csv",
        fixture.to_str().expect("utf8 path"),
        "progress",
        "--query",
        "zelda",
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No student found matching \"zelda\""));
}

#[test]
fn leaderboard_orders_by_remaining_hours() {
    let dir = tempfile::tempdir().expect("temp dir");
    let fixture = write_fixture(dir.path());

    let output = run_tracker(&[
        "--csv",
        fixture.to_str().expect("utf8 path"),
        "leaderboard",
    ]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);

    // Ana needs 8 more hours, Juan needs 40.
    let ana = stdout.find("Ana Lopez").expect("ana entry");
    let juan = stdout.find("Juan Perez").expect("juan entry");
    assert!(ana < juan);
    assert!(stdout.contains("8.0 hrs to go"));
    assert!(stdout.contains("40.0 hrs to go"));
}

#[test]
fn roster_json_exposes_requirements_and_status() {
    let dir = tempfile::tempdir().expect("temp dir");
    let fixture = write_fixture(dir.path());

    let output = run_tracker(&[
        "--csv",
        fixture.to_str().expect("utf8 path"),
        "roster",
        "--json",
    ]);
    assert!(output.status.success());

    let roster: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("parse roster json");
    assert_eq!(roster[0]["name"], "Ana Lopez");
    assert_eq!(roster[0]["completed_hours"], 42.0);
    assert_eq!(roster[0]["requirement"]["minimum"], 50);
    assert_eq!(roster[0]["status"], "InProgress");
    assert_eq!(roster[1]["name"], "Juan Perez");
}

#[test]
fn report_writes_markdown_sections() {
    let dir = tempfile::tempdir().expect("temp dir");
    let fixture = write_fixture(dir.path());
    let out = dir.path().join("report.md");

    let output = run_tracker(&[
        "--csv",
        fixture.to_str().expect("utf8 path"),
        "report",
        "--out",
        out.to_str().expect("utf8 path"),
    ]);
    assert!(output.status.success());

    let report = std::fs::read_to_string(&out).expect("read report");
    assert!(report.contains("# Service Hour Progress Report"));
    assert!(report.contains("## Status Mix"));
    assert!(report.contains("- In Progress: 2 students"));
    assert!(report.contains("## Closest to Completion"));
    assert!(report.contains("Ana Lopez (grade 9th) 42.0 hrs completed, 8.0 hrs to go"));
}

#[test]
fn missing_source_file_fails_the_invocation() {
    let output = run_tracker(&["--csv", "/nonexistent/service.csv", "roster"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to open"), "stderr: {stderr}");
}
