use std::fmt::Write;

use crate::models::{ProgressStatus, StudentSummary};
use crate::requirements;
use crate::source::Dataset;
use crate::summary;

pub fn summarize_statuses(summaries: &[StudentSummary]) -> Vec<(ProgressStatus, usize)> {
    let mut distinction = 0usize;
    let mut requirement_met = 0usize;
    let mut in_progress = 0usize;

    for student in summaries {
        let requirement = requirements::requirement_for(&student.grade);
        match requirements::classify(student.completed_hours, requirement) {
            ProgressStatus::Distinction => distinction += 1,
            ProgressStatus::RequirementMet => requirement_met += 1,
            ProgressStatus::InProgress => in_progress += 1,
        }
    }

    vec![
        (ProgressStatus::Distinction, distinction),
        (ProgressStatus::RequirementMet, requirement_met),
        (ProgressStatus::InProgress, in_progress),
    ]
}

pub fn build_report(source_label: &str, dataset: &Dataset, limit: usize) -> String {
    let statuses = summarize_statuses(&dataset.summaries);
    let leaderboard = summary::leaderboard(&dataset.summaries, limit);
    let recent = summary::recent_entries(&dataset.observations, 5);

    let mut output = String::new();

    let _ = writeln!(output, "# Service Hour Progress Report");
    let _ = writeln!(
        output,
        "Generated from {} ({} students, {} entries)",
        source_label,
        dataset.summaries.len(),
        dataset.observations.len()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Status Mix");

    if dataset.summaries.is_empty() {
        let _ = writeln!(output, "No students found in the source data.");
    } else {
        for (status, count) in statuses {
            let _ = writeln!(output, "- {}: {} students", status.label(), count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Closest to Completion");

    if leaderboard.is_empty() {
        let _ = writeln!(output, "Everyone has met the minimum requirement.");
    } else {
        for entry in leaderboard.iter() {
            let _ = writeln!(
                output,
                "- {} (grade {}) {:.1} hrs completed, {:.1} hrs to go",
                entry.name, entry.grade, entry.completed_hours, entry.remaining_to_minimum
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Service Entries");

    if recent.is_empty() {
        let _ = writeln!(output, "No entries recorded.");
    } else {
        for entry in recent.iter() {
            let date = entry
                .date
                .map(|date| date.format("%B %d, %Y").to_string())
                .unwrap_or_else(|| "Date unknown".to_string());
            let _ = writeln!(
                output,
                "- {} ({}) {:.1} hrs: {}",
                entry.name, date, entry.hours, entry.description
            );
        }
    }

    output
}
