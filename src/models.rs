use chrono::NaiveDate;
use serde::Serialize;

/// One normalized service entry, flattened out of a wide-format sheet row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub name: String,
    pub hours: f64,
    pub grade: String,
    pub description: String,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentSummary {
    pub name: String,
    pub grade: String,
    pub completed_hours: f64,
}

/// Hour thresholds for a grade level. Invariant: distinction >= minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GradeRequirement {
    pub minimum: u32,
    pub distinction: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProgressStatus {
    Distinction,
    RequirementMet,
    InProgress,
}

impl ProgressStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ProgressStatus::Distinction => "Distinction",
            ProgressStatus::RequirementMet => "Requirement Met",
            ProgressStatus::InProgress => "In Progress",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentProgress {
    pub name: String,
    pub grade: String,
    pub completed_hours: f64,
    pub requirement: GradeRequirement,
    pub status: ProgressStatus,
    pub outstanding_to_minimum: f64,
    pub outstanding_to_distinction: f64,
    pub fraction_to_minimum: f64,
    pub fraction_to_distinction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub grade: String,
    pub completed_hours: f64,
    pub remaining_to_minimum: f64,
    pub fraction_to_minimum: f64,
}
