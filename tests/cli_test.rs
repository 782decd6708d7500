//! CLI executor tests
//!
//! Inputs are written to a temporary directory and run through
//! `execute_command` the same way the binary does.

use std::fs;
use std::path::PathBuf;

use pathsight::cli::{execute_command, Commands, ThresholdArgs};
use pathsight::config::AnalysisConfig;
use tempfile::TempDir;

const STRUCTURE: &str = r#"{
    "root": {"id": 0, "label": "Home"},
    "entries": [
        {"kind": "page", "id": 1, "label": "Opening hours", "parent": 0},
        {"kind": "page", "id": 2, "label": "Services", "parent": 0},
        {"kind": "page", "id": 3, "label": "Passport", "parent": 2},
        {"kind": "page", "id": 4, "label": "Parking permit", "parent": 2},
        {"kind": "link", "parent": 3, "target": 0}
    ]
}"#;

const EVENTS: &str = r#"[
    {
        "user_id": "p1",
        "alternate_name": "Renew a passport",
        "target_id": 3,
        "status": "completed",
        "duration": "00:00:48",
        "visits": [
            {"item_id": 0, "elapsed_ms": 4200},
            {"item_id": 1, "elapsed_ms": 2100},
            {"item_id": 0, "elapsed_ms": 1800},
            {"item_id": 2, "elapsed_ms": 2600},
            {"item_id": 3, "elapsed_ms": 900}
        ]
    },
    {
        "user_id": "p2",
        "alternate_name": "Renew a passport",
        "target_id": 3,
        "status": "skipped",
        "duration": "00:00:05"
    },
    {
        "user_id": "p2",
        "alternate_name": "Library card",
        "target_id": 42,
        "status": "completed",
        "visits": [{"item_id": 0, "elapsed_ms": 500}]
    }
]"#;

fn write_inputs() -> (TempDir, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let structure = dir.path().join("structure.json");
    let events = dir.path().join("events.json");
    fs::write(&structure, STRUCTURE).unwrap();
    fs::write(&events, EVENTS).unwrap();
    (dir, structure, events)
}

#[test]
fn test_analyze_writes_report_and_detection_log() {
    let (dir, structure, events) = write_inputs();
    let report_json = dir.path().join("report.json");
    let detection_log = dir.path().join("detections.txt");

    let result = execute_command(
        Commands::Analyze {
            structure,
            events,
            report_json: Some(report_json.clone()),
            detection_log: Some(detection_log.clone()),
            breakdown: Some(0),
            thresholds: ThresholdArgs::default(),
        },
        &AnalysisConfig::default(),
    );

    assert_eq!(result.exit_code, 0, "{}", result.message);
    assert!(result.message.contains("Renew a passport"));
    assert!(result.message.contains("Task 0: Renew a passport"));
    assert!(result.message.contains("Task 'Library card' targets unknown page 42"));

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_json).unwrap()).unwrap();
    assert_eq!(report["tasks"].as_array().unwrap().len(), 1);
    assert_eq!(report["tasks"][0]["paths"], 1);
    // p2 only skipped without visits or named an unknown page
    assert_eq!(report["users"], 1);
    assert_eq!(report["warnings"][0]["kind"], "unknown_target");

    // nothing was detected, so the exported log is empty
    assert_eq!(fs::read_to_string(&detection_log).unwrap(), "");
}

#[test]
fn test_analyze_rejects_invalid_threshold_override() {
    let (_dir, structure, events) = write_inputs();

    let result = execute_command(
        Commands::Analyze {
            structure,
            events,
            report_json: None,
            detection_log: None,
            breakdown: None,
            thresholds: ThresholdArgs {
                max_problem_rate: Some(2.0),
                ..Default::default()
            },
        },
        &AnalysisConfig::default(),
    );

    assert_eq!(result.exit_code, 1);
    assert!(result.message.contains("max_problem_rate must be within [0, 1]"));
}

#[test]
fn test_distance_command() {
    let (_dir, structure, _) = write_inputs();

    let forward = execute_command(
        Commands::Distance {
            structure: structure.clone(),
            from: 0,
            to: 3,
        },
        &AnalysisConfig::default(),
    );
    assert_eq!(forward.message, "0 -> 3: 2\n");

    let backward = execute_command(
        Commands::Distance {
            structure: structure.clone(),
            from: 3,
            to: 2,
        },
        &AnalysisConfig::default(),
    );
    assert_eq!(backward.message, "3 -> 2: 2\n");

    let dead_end = execute_command(
        Commands::Distance {
            structure,
            from: 1,
            to: 0,
        },
        &AnalysisConfig::default(),
    );
    assert_eq!(dead_end.message, "1 -> 0: unreachable\n");
}

#[test]
fn test_structure_command() {
    let (_dir, structure, _) = write_inputs();

    let result = execute_command(Commands::Structure { structure }, &AnalysisConfig::default());

    assert_eq!(result.exit_code, 0);
    assert!(result.message.contains("Pages:            5"));
    assert!(result.message.contains("Links:            5"));
    assert!(result.message.contains("Level leaves:     3"));
    assert!(result.message.contains("Root degree:      5"));
    assert!(result.message.contains("Nodes to inspect: 2"));
}

#[test]
fn test_malformed_input_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let structure = dir.path().join("broken.json");
    fs::write(&structure, "{ not json").unwrap();

    let result = execute_command(Commands::Structure { structure }, &AnalysisConfig::default());

    assert_eq!(result.exit_code, 1);
    assert!(result.message.contains("Invalid JSON in"));
    assert!(result.message.contains("broken.json"));
}
