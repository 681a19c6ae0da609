use chrono::NaiveDate;
use tracing::debug;

use crate::models::Observation;
use crate::source::WideTable;

pub const DESCRIPTION_PLACEHOLDER: &str = "No description provided";

// Wide sheets repeat up to this many per-student column groups per row. The
// observed exports carry four; extra probes resolve to nothing and are
// skipped.
const MAX_SLOTS: usize = 8;

// One semantic field of a slot. `shared` fields (grade, date) are written
// once per row in the observed exports, so later slots fall back to the
// unsuffixed base column.
struct FieldSpec {
    base: &'static str,
    shared: bool,
}

const NAME: FieldSpec = FieldSpec {
    base: "Name of student",
    shared: false,
};
const HOURS: FieldSpec = FieldSpec {
    base: "Number of hours",
    shared: false,
};
const GRADE: FieldSpec = FieldSpec {
    base: "Select student grade level",
    shared: true,
};
const DESCRIPTION: FieldSpec = FieldSpec {
    base: "Description of service",
    shared: false,
};
const DATE: FieldSpec = FieldSpec {
    base: "Date of service",
    shared: true,
};

// Both header conventions seen in the wild: a numeric suffix appended by the
// form ("Name of student 2") and the dotted index a sheet export produces for
// colliding names ("Name of student.1").
fn resolve_column(headers: &[String], field: &FieldSpec, slot: usize) -> Option<usize> {
    let mut candidates = Vec::new();
    if slot == 1 {
        candidates.push(field.base.to_string());
    } else {
        candidates.push(format!("{} {}", field.base, slot));
        candidates.push(format!("{}.{}", field.base, slot - 1));
        if field.shared {
            candidates.push(field.base.to_string());
        }
    }
    candidates
        .iter()
        .find_map(|candidate| headers.iter().position(|header| header.trim() == candidate))
}

struct SlotColumns {
    name: usize,
    hours: Option<usize>,
    grade: Option<usize>,
    description: Option<usize>,
    date: Option<usize>,
}

impl SlotColumns {
    fn resolve(headers: &[String], slot: usize) -> Option<Self> {
        let name = resolve_column(headers, &NAME, slot)?;
        Some(SlotColumns {
            name,
            hours: resolve_column(headers, &HOURS, slot),
            grade: resolve_column(headers, &GRADE, slot),
            description: resolve_column(headers, &DESCRIPTION, slot),
            date: resolve_column(headers, &DATE, slot),
        })
    }
}

fn cell<'a>(row: &'a [String], index: Option<usize>) -> &'a str {
    index.and_then(|i| row.get(i)).map(String::as_str).unwrap_or("")
}

/// Flattens a wide table's repeated student slots into one observation list.
/// Slots whose name column is absent are skipped; rows without a name are
/// dropped; every other malformed cell coerces to a default.
pub fn normalize_table(table: &WideTable) -> Vec<Observation> {
    let mut observations = Vec::new();

    for slot in 1..=MAX_SLOTS {
        let Some(columns) = SlotColumns::resolve(&table.headers, slot) else {
            debug!(slot, "no name column for slot, skipping");
            continue;
        };

        for row in &table.rows {
            let raw_name = cell(row, Some(columns.name)).trim();
            if raw_name.is_empty() {
                continue;
            }
            observations.push(Observation {
                name: title_case(raw_name),
                hours: parse_hours(cell(row, columns.hours)),
                grade: cell(row, columns.grade).trim().to_string(),
                description: default_description(cell(row, columns.description)),
                date: parse_date(cell(row, columns.date)),
            });
        }
    }

    observations
}

fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_hours(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .map(|hours| hours.max(0.0))
        .unwrap_or(0.0)
}

fn default_description(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        DESCRIPTION_PLACEHOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    const FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y", "%B %d, %Y"];
    FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}
