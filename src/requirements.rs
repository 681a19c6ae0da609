use crate::models::{GradeRequirement, ProgressStatus, StudentProgress, StudentSummary};

/// Maps a raw grade label to its hour thresholds. Total: unknown labels fall
/// back to the underclass tier.
pub fn requirement_for(grade: &str) -> GradeRequirement {
    match normalize_grade(grade).as_str() {
        "9" | "10" => GradeRequirement {
            minimum: 50,
            distinction: 100,
        },
        "11" | "12" => GradeRequirement {
            minimum: 100,
            distinction: 150,
        },
        _ => GradeRequirement {
            minimum: 50,
            distinction: 100,
        },
    }
}

// Strips a trailing ordinal ("9th" -> "9") only when what remains is all
// digits, so labels that merely contain "st"/"nd" are left alone.
fn normalize_grade(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    for suffix in ["th", "st", "nd", "rd"] {
        if let Some(stem) = lowered.strip_suffix(suffix) {
            if !stem.is_empty() && stem.chars().all(|c| c.is_ascii_digit()) {
                return stem.to_string();
            }
        }
    }
    lowered
}

pub fn classify(completed: f64, requirement: GradeRequirement) -> ProgressStatus {
    if completed >= requirement.distinction as f64 {
        ProgressStatus::Distinction
    } else if completed >= requirement.minimum as f64 {
        ProgressStatus::RequirementMet
    } else {
        ProgressStatus::InProgress
    }
}

pub fn outstanding(completed: f64, threshold: u32) -> f64 {
    (threshold as f64 - completed).max(0.0)
}

/// Completion fraction toward a threshold, clipped to [0, 1]. A zero
/// threshold counts as already satisfied.
pub fn completion_fraction(completed: f64, threshold: u32) -> f64 {
    if threshold == 0 {
        return 1.0;
    }
    (completed / threshold as f64).clamp(0.0, 1.0)
}

pub fn evaluate(summary: &StudentSummary) -> StudentProgress {
    let requirement = requirement_for(&summary.grade);
    StudentProgress {
        name: summary.name.clone(),
        grade: summary.grade.clone(),
        completed_hours: summary.completed_hours,
        requirement,
        status: classify(summary.completed_hours, requirement),
        outstanding_to_minimum: outstanding(summary.completed_hours, requirement.minimum),
        outstanding_to_distinction: outstanding(summary.completed_hours, requirement.distinction),
        fraction_to_minimum: completion_fraction(summary.completed_hours, requirement.minimum),
        fraction_to_distinction: completion_fraction(summary.completed_hours, requirement.distinction),
    }
}
