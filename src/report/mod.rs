//! Flat text renderings of analysis results, and report export.
//!
//! Every renderer returns a `String`; writing it anywhere is up to the caller,
//! except [`write_json`] and [`write_text`] which put a finished report on disk.

use std::fmt::Write as _;
use std::path::Path;

use crate::analysis::{
    AnalysisReport, BadListEntry, DetectionRecord, HotListEntry, Session, StructureSummary,
    TaskSummary,
};
use crate::error::{ExportError, ExportResult};
use crate::experiment::TaskId;

const RULE: &str = "═══════════════════════════════════════════════════════════════════════════════";

fn heading(output: &mut String, title: &str) {
    let _ = write!(output, "\n{}\n{}\n\n", title, RULE);
}

/// Bad list as a numbered table.
pub fn render_bad_list(entries: &[BadListEntry]) -> String {
    let mut output = String::new();
    heading(&mut output, "Bad List");

    if entries.is_empty() {
        output.push_str("No covered pages.\n");
        return output;
    }

    let _ = writeln!(
        output,
        "{:>4}  {:<32} {:>8} {:>12} {:>14}",
        "#", "Page", "Malus", "Dist rating", "Latency (ms)"
    );
    for (rank, entry) in entries.iter().enumerate() {
        let _ = writeln!(
            output,
            "{:>4}  {:<32} {:>8} {:>12} {:>14.1}",
            rank + 1,
            truncate(&entry.label, 32),
            entry.malus,
            entry.dist_rating,
            entry.latency_weight
        );
    }
    output
}

/// Hot list with cumulative coverage as a percentage.
pub fn render_hot_list(entries: &[HotListEntry]) -> String {
    let mut output = String::new();
    heading(&mut output, "Hot List");

    if entries.is_empty() {
        output.push_str("Every leaf is already a task target.\n");
        return output;
    }

    let _ = writeln!(output, "{:>4}  {:<32} {:>10}", "#", "Proposed target", "Coverage");
    for (rank, entry) in entries.iter().enumerate() {
        let _ = writeln!(
            output,
            "{:>4}  {:<32} {:>9.1}%",
            rank + 1,
            truncate(&entry.label, 32),
            entry.coverage_gain * 100.0
        );
    }
    output
}

/// Task statistics table.
pub fn render_task_overview(tasks: &[TaskSummary]) -> String {
    let mut output = String::new();
    heading(&mut output, "Tasks");

    if tasks.is_empty() {
        output.push_str("No tasks imported.\n");
        return output;
    }

    let _ = writeln!(
        output,
        "{:>3}  {:<28} {:<20} {:>8} {:>6} {:>8} {:>8} {:>8}",
        "ID", "Task", "Target", "Solved", "Paths", "Invalid", "Avg s", "Avg len"
    );
    for task in tasks {
        let _ = writeln!(
            output,
            "{:>3}  {:<28} {:<20} {:>7.1}% {:>6} {:>8} {:>8} {:>8}",
            task.id,
            truncate(&task.name, 28),
            truncate(&task.target_label, 20),
            task.solution_rate * 100.0,
            task.paths,
            task.invalid_paths,
            task.average_duration_secs,
            task.average_path_length
        );
    }
    output
}

/// Detection records in the framed block format.
pub fn render_detections(records: &[DetectionRecord]) -> String {
    records.iter().map(ToString::to_string).collect()
}

/// Structure shape.
pub fn render_structure(summary: &StructureSummary) -> String {
    let mut output = String::new();
    heading(&mut output, "Structure");
    let _ = writeln!(output, "Pages:            {}", summary.nodes);
    let _ = writeln!(output, "Links:            {}", summary.links);
    let _ = writeln!(output, "Reachable pages:  {}", summary.reachable);
    let _ = writeln!(output, "Level edges:      {}", summary.level_edges);
    let _ = writeln!(output, "Level leaves:     {}", summary.leaves);
    let _ = writeln!(output, "Root degree:      {}", summary.root_degree);
    let _ = writeln!(output, "Root leaves:      {}", summary.root_leaves);
    let _ = writeln!(output, "Nodes to inspect: {}", summary.nodes_to_inspect);
    output
}

/// Per-page breakdown for one task. Pages off the task's optimal set are
/// listed as such.
pub fn render_task_breakdown(session: &Session, task: TaskId) -> String {
    let mut output = String::new();
    let Some(summary) = session.experiment().task(task) else {
        let _ = writeln!(output, "Unknown task {}", task);
        return output;
    };
    heading(
        &mut output,
        &format!("Task {}: {}", task, summary.alternate_name()),
    );

    let _ = writeln!(
        output,
        "{:<32} {:>12} {:>10} {:>14}",
        "Page", "Dist rating", "Share", "Latency (ms)"
    );
    for (_, node) in session.graph().nodes() {
        match session.task_breakdown(node.id(), task) {
            Some(row) => {
                let _ = writeln!(
                    output,
                    "{:<32} {:>12} {:>9.1}% {:>14.1}",
                    truncate(node.label(), 32),
                    row.dist_rating,
                    row.dist_rating_share,
                    row.latency_weight
                );
            }
            None => {
                let _ = writeln!(
                    output,
                    "{:<32} {:>38}",
                    truncate(node.label(), 32),
                    "not on optimal path"
                );
            }
        }
    }
    output
}

/// Full text report.
pub fn render_report(report: &AnalysisReport) -> String {
    let mut output = String::new();
    heading(&mut output, "Navigation Analysis");
    let _ = writeln!(output, "Run:                 {}", report.run_id);
    let _ = writeln!(
        output,
        "Generated:           {}",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(output, "Participants:        {}", report.users);
    let _ = writeln!(output, "Coverage:            {:.1}%", report.coverage * 100.0);
    let _ = writeln!(
        output,
        "Total solution rate: {:.1}%",
        report.total_solution_rate * 100.0
    );
    let _ = writeln!(output, "Nodes to inspect:    {}", report.nodes_to_inspect);

    output.push_str(&render_structure(&report.structure));
    output.push_str(&render_task_overview(&report.tasks));
    output.push_str(&render_bad_list(&report.bad_list));
    output.push_str(&render_hot_list(&report.hot_list));

    heading(&mut output, "Systematic Searching");
    if report.detections.is_empty() {
        output.push_str("None detected.\n");
    } else {
        output.push_str(&render_detections(&report.detections));
    }

    if !report.warnings.is_empty() {
        heading(&mut output, "Warnings");
        for warning in &report.warnings {
            let _ = writeln!(output, "  - {}", warning);
        }
    }

    output
}

/// Write the report as pretty-printed JSON.
pub fn write_json(report: &AnalysisReport, path: impl AsRef<Path>) -> ExportResult<()> {
    let json = serde_json::to_string_pretty(report)?;
    write_text(&json, path)
}

/// Write any rendered text to `path`.
pub fn write_text(text: &str, path: impl AsRef<Path>) -> ExportResult<()> {
    let path = path.as_ref();
    std::fs::write(path, text).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn truncate(label: &str, width: usize) -> String {
    if label.chars().count() <= width {
        return label.to_string();
    }
    let mut cut: String = label.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::experiment::{AttemptStatus, TaskAttempt};
    use crate::graph::{NodeId, SiteStructure};

    fn analyzed_session() -> (Session, AnalysisReport) {
        let structure = SiteStructure::new(0, "Home")
            .page(1, "Products", 0)
            .page(2, "Support", 0)
            .page(3, "Warranty", 2);
        let mut session = Session::new(&structure, AnalysisConfig::default()).unwrap();
        session.ingest(
            TaskAttempt::new("u1", "Find warranty", 3, AttemptStatus::Completed)
                .with_duration("00:00:40")
                .visit(0, 3000)
                .visit(1, 3000)
                .visit(0, 3000)
                .visit(2, 3000)
                .visit(3, 0),
        );
        let report = session.analyze();
        (session, report)
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Short", 10), "Short");
        assert_eq!(truncate("A rather long label", 8), "A rathe…");
    }

    #[test]
    fn test_bad_list_rendering() {
        let entries = vec![BadListEntry {
            node: NodeId(4),
            label: "Contact".to_string(),
            malus: 6,
            dist_rating: 3,
            latency_weight: 1250.0,
        }];
        let text = render_bad_list(&entries);
        assert!(text.contains("Bad List"));
        assert!(text.contains("Contact"));
        assert!(text.contains("1250.0"));
        assert!(render_bad_list(&[]).contains("No covered pages."));
    }

    #[test]
    fn test_hot_list_shows_percentages() {
        let entries = vec![HotListEntry {
            node: NodeId(2),
            label: "Imprint".to_string(),
            coverage_gain: 0.5,
        }];
        assert!(render_hot_list(&entries).contains("50.0%"));
    }

    #[test]
    fn test_breakdown_marks_pages_off_the_optimal_path() {
        let (session, _) = analyzed_session();
        let text = render_task_breakdown(&session, TaskId(0));

        assert!(text.contains("Task 0: Find warranty"));
        let products = text
            .lines()
            .find(|line| line.starts_with("Products"))
            .unwrap();
        assert!(products.contains("not on optimal path"));
        // Home: the step to Products regressed, the step to Support advanced
        let home = text.lines().find(|line| line.starts_with("Home")).unwrap();
        assert!(home.contains("100.0%"));

        assert!(render_task_breakdown(&session, TaskId(3)).contains("Unknown task 3"));
    }

    #[test]
    fn test_full_report_and_export() {
        let (_, report) = analyzed_session();
        let text = render_report(&report);
        assert!(text.contains("Navigation Analysis"));
        assert!(text.contains("Find warranty"));
        assert!(text.contains("None detected."));

        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("report.json");
        write_json(&report, &file).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
        assert_eq!(value["tasks"][0]["name"], "Find warranty");
        assert_eq!(value["users"], 1);
    }
}
