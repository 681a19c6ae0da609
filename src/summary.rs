use std::cmp::Ordering;
use std::collections::BTreeMap;

use clap::ValueEnum;

use crate::models::{LeaderboardEntry, Observation, StudentSummary};
use crate::requirements;

/// How to pick a student's grade when their entries disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GradePolicy {
    /// First observed value wins (the historical behavior)
    First,
    /// Most recent entry in source order wins
    Last,
    /// Most common value wins, ties broken by first encounter
    Majority,
}

struct StudentAccum {
    total_hours: f64,
    grades: Vec<String>,
}

/// Groups observations by normalized name, one summary per unique name,
/// emitted in ascending name order.
pub fn summarize(observations: &[Observation], policy: GradePolicy) -> Vec<StudentSummary> {
    let mut students: BTreeMap<String, StudentAccum> = BTreeMap::new();

    for observation in observations {
        let entry = students
            .entry(observation.name.clone())
            .or_insert_with(|| StudentAccum {
                total_hours: 0.0,
                grades: Vec::new(),
            });
        entry.total_hours += observation.hours;
        entry.grades.push(observation.grade.clone());
    }

    students
        .into_iter()
        .map(|(name, accum)| StudentSummary {
            name,
            grade: resolve_grade(&accum.grades, policy),
            completed_hours: accum.total_hours,
        })
        .collect()
}

fn resolve_grade(grades: &[String], policy: GradePolicy) -> String {
    match policy {
        GradePolicy::First => grades.first().cloned().unwrap_or_default(),
        GradePolicy::Last => grades.last().cloned().unwrap_or_default(),
        GradePolicy::Majority => {
            let mut counts: Vec<(&String, usize)> = Vec::new();
            for grade in grades {
                match counts.iter_mut().find(|(seen, _)| *seen == grade) {
                    Some(entry) => entry.1 += 1,
                    None => counts.push((grade, 1)),
                }
            }
            let mut best: Option<(&String, usize)> = None;
            for (grade, count) in counts {
                if best.map_or(true, |(_, best_count)| count > best_count) {
                    best = Some((grade, count));
                }
            }
            best.map(|(grade, _)| grade.clone()).unwrap_or_default()
        }
    }
}

/// Case-insensitive substring search over summary names, preserving the
/// aggregator's emission order.
pub fn search<'a>(summaries: &'a [StudentSummary], query: &str) -> Vec<&'a StudentSummary> {
    let needle = query.to_lowercase();
    summaries
        .iter()
        .filter(|summary| summary.name.to_lowercase().contains(&needle))
        .collect()
}

/// Students still short of their minimum, closest to finishing first.
/// Equal remainders order by name so the cut at `limit` is deterministic.
pub fn leaderboard(summaries: &[StudentSummary], limit: usize) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = summaries
        .iter()
        .filter_map(|summary| {
            let requirement = requirements::requirement_for(&summary.grade);
            let remaining =
                requirements::outstanding(summary.completed_hours, requirement.minimum);
            if remaining <= 0.0 {
                return None;
            }
            Some(LeaderboardEntry {
                name: summary.name.clone(),
                grade: summary.grade.clone(),
                completed_hours: summary.completed_hours,
                remaining_to_minimum: remaining,
                fraction_to_minimum: requirements::completion_fraction(
                    summary.completed_hours,
                    requirement.minimum,
                ),
            })
        })
        .collect();

    entries.sort_by(|a, b| {
        a.remaining_to_minimum
            .partial_cmp(&b.remaining_to_minimum)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    entries.truncate(limit);
    entries
}

/// A student's own entries, most recent first. Entries without a parseable
/// date sort last in source order.
pub fn service_log(observations: &[Observation], student_name: &str) -> Vec<Observation> {
    let needle = student_name.to_lowercase();
    let mut entries: Vec<Observation> = observations
        .iter()
        .filter(|observation| observation.name.to_lowercase() == needle)
        .cloned()
        .collect();
    entries.sort_by(newest_first);
    entries
}

pub fn recent_entries(observations: &[Observation], limit: usize) -> Vec<Observation> {
    let mut entries = observations.to_vec();
    entries.sort_by(newest_first);
    entries.truncate(limit);
    entries
}

fn newest_first(a: &Observation, b: &Observation) -> Ordering {
    match (a.date, b.date) {
        (Some(left), Some(right)) => right.cmp(&left),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
