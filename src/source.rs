use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use tracing::{debug, warn};

use crate::models::{Observation, StudentSummary};
use crate::normalize;
use crate::summary::{self, GradePolicy};

/// Raw wide-format table as read from a sheet export: a trimmed header row
/// plus untyped cell rows. All typing happens in `normalize`.
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone)]
pub enum DataSource {
    CsvFile(PathBuf),
    Directory { dir: PathBuf, keyword: String },
    Feed(String),
}

impl DataSource {
    pub fn load(&self) -> anyhow::Result<Vec<WideTable>> {
        match self {
            DataSource::CsvFile(path) => Ok(vec![read_csv_file(path)?]),
            DataSource::Directory { dir, keyword } => read_directory(dir, keyword),
            DataSource::Feed(url) => Ok(vec![fetch_feed(url)?]),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            DataSource::CsvFile(path) => path.display().to_string(),
            DataSource::Directory { dir, keyword } => {
                format!("{} (files matching \"{}\")", dir.display(), keyword)
            }
            DataSource::Feed(url) => url.clone(),
        }
    }
}

fn read_csv_file(path: &Path) -> anyhow::Result<WideTable> {
    let reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    parse_table(reader)
}

fn parse_table<R: Read>(mut reader: csv::Reader<R>) -> anyhow::Result<WideTable> {
    let headers: Vec<String> = reader
        .headers()
        .context("missing header row")?
        .iter()
        .map(|header| header.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("malformed csv record")?;
        rows.push(record.iter().map(|cell| cell.to_string()).collect());
    }

    Ok(WideTable { headers, rows })
}

// One unreadable export should not block the rest of the directory; it is
// logged and skipped.
fn read_directory(dir: &Path, keyword: &str) -> anyhow::Result<Vec<WideTable>> {
    let needle = keyword.to_lowercase();
    let mut paths: Vec<PathBuf> = Vec::new();

    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let lowered = file_name.to_lowercase();
        if lowered.ends_with(".csv") && lowered.contains(&needle) {
            paths.push(path);
        }
    }
    paths.sort();

    if paths.is_empty() {
        anyhow::bail!(
            "no csv exports matching \"{}\" under {}",
            keyword,
            dir.display()
        );
    }

    let mut tables = Vec::new();
    for path in paths {
        match read_csv_file(&path) {
            Ok(table) => tables.push(table),
            Err(error) => {
                warn!(path = %path.display(), %error, "skipping unreadable export");
            }
        }
    }
    Ok(tables)
}

fn fetch_feed(url: &str) -> anyhow::Result<WideTable> {
    debug!(url, "fetching published feed");
    let response = reqwest::blocking::get(url)
        .with_context(|| format!("failed to fetch feed {url}"))?
        .error_for_status()
        .context("feed returned an error status")?;
    let body = response.text().context("failed to read feed body")?;
    parse_table(
        csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(body.as_bytes()),
    )
}

#[derive(Debug, Clone)]
pub struct Dataset {
    pub observations: Vec<Observation>,
    pub summaries: Vec<StudentSummary>,
}

pub fn load_dataset(source: &DataSource, policy: GradePolicy) -> anyhow::Result<Dataset> {
    let tables = source.load()?;
    let mut observations = Vec::new();
    for table in &tables {
        observations.extend(normalize::normalize_table(table));
    }
    let summaries = summary::summarize(&observations, policy);
    debug!(
        observations = observations.len(),
        students = summaries.len(),
        "dataset loaded"
    );
    Ok(Dataset {
        observations,
        summaries,
    })
}

struct CacheEntry {
    dataset: Dataset,
    fetched_at: Instant,
}

/// Time-boxed reuse of the last load so repeated views within one run do not
/// refetch the source. `force_refresh` drops the entry; the next access
/// reloads.
pub struct CachedLoad {
    entry: Option<CacheEntry>,
    ttl: Duration,
}

impl CachedLoad {
    pub fn new(ttl: Duration) -> Self {
        CachedLoad { entry: None, ttl }
    }

    pub fn force_refresh(&mut self) {
        debug!("force refresh requested, dropping cached dataset");
        self.entry = None;
    }

    pub fn dataset(
        &mut self,
        source: &DataSource,
        policy: GradePolicy,
    ) -> anyhow::Result<&Dataset> {
        let stale = self
            .entry
            .as_ref()
            .map_or(true, |entry| entry.fetched_at.elapsed() >= self.ttl);

        if stale {
            let dataset = load_dataset(source, policy)?;
            self.entry = Some(CacheEntry {
                dataset,
                fetched_at: Instant::now(),
            });
        } else {
            debug!("reusing dataset within freshness window");
        }

        match &self.entry {
            Some(entry) => Ok(&entry.dataset),
            None => anyhow::bail!("dataset cache empty after load"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const WIDE_CSV: &str = "\
Name of student,Number of hours,Select student grade level,Description of service,Date of service
Ana Lopez,4,9th,Food bank shift,01/10/2026
Juan Perez,2,11,Park cleanup,01/12/2026
";

    fn write_csv(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).expect("create csv");
        file.write_all(contents.as_bytes()).expect("write csv");
        path
    }

    #[test]
    fn csv_headers_are_trimmed_and_rows_preserved() {
        let reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(" Name of student , Number of hours \nAna,4\n".as_bytes());
        let table = parse_table(reader).expect("parse");
        assert_eq!(table.headers, vec!["Name of student", "Number of hours"]);
        assert_eq!(table.rows, vec![vec!["Ana".to_string(), "4".to_string()]]);
    }

    #[test]
    fn ragged_rows_parse_with_missing_cells() {
        let reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader("Name of student,Number of hours\nAna\n".as_bytes());
        let table = parse_table(reader).expect("parse");
        assert_eq!(table.rows[0], vec!["Ana".to_string()]);
    }

    #[test]
    fn directory_source_filters_by_keyword_and_extension() {
        let dir = tempfile::tempdir().expect("temp dir");
        write_csv(dir.path(), "Service_Hours_Fall.csv", WIDE_CSV);
        write_csv(dir.path(), "unrelated.csv", "Other,Columns\na,b\n");
        write_csv(dir.path(), "service_notes.txt", "not a csv");

        let source = DataSource::Directory {
            dir: dir.path().to_path_buf(),
            keyword: "service".to_string(),
        };
        let tables = source.load().expect("load");
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows.len(), 2);
    }

    #[test]
    fn directory_without_matches_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        write_csv(dir.path(), "unrelated.csv", "Other,Columns\na,b\n");

        let source = DataSource::Directory {
            dir: dir.path().to_path_buf(),
            keyword: "service".to_string(),
        };
        assert!(source.load().is_err());
    }

    #[test]
    fn missing_file_surfaces_a_contextual_error() {
        let source = DataSource::CsvFile(PathBuf::from("/nonexistent/service.csv"));
        let error = source.load().expect_err("missing file");
        assert!(error.to_string().contains("failed to open"));
    }

    #[test]
    fn fresh_cache_serves_the_previous_load() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_csv(dir.path(), "service.csv", WIDE_CSV);
        let source = DataSource::CsvFile(path.clone());

        let mut cache = CachedLoad::new(Duration::from_secs(300));
        let first = cache
            .dataset(&source, GradePolicy::First)
            .expect("first load")
            .summaries
            .len();
        assert_eq!(first, 2);

        // The file changes on disk, but the window has not elapsed.
        write_csv(dir.path(), "service.csv", "Name of student,Number of hours\n");
        let second = cache
            .dataset(&source, GradePolicy::First)
            .expect("cached load")
            .summaries
            .len();
        assert_eq!(second, 2);
    }

    #[test]
    fn zero_ttl_expires_immediately() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_csv(dir.path(), "service.csv", WIDE_CSV);
        let source = DataSource::CsvFile(path.clone());

        let mut cache = CachedLoad::new(Duration::ZERO);
        cache
            .dataset(&source, GradePolicy::First)
            .expect("first load");

        write_csv(dir.path(), "service.csv", "Name of student,Number of hours\n");
        let reloaded = cache
            .dataset(&source, GradePolicy::First)
            .expect("expired load")
            .summaries
            .len();
        assert_eq!(reloaded, 0);
    }

    #[test]
    fn force_refresh_reloads_within_the_window() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = write_csv(dir.path(), "service.csv", WIDE_CSV);
        let source = DataSource::CsvFile(path.clone());

        let mut cache = CachedLoad::new(Duration::from_secs(300));
        cache
            .dataset(&source, GradePolicy::First)
            .expect("first load");

        write_csv(dir.path(), "service.csv", "Name of student,Number of hours\n");
        cache.force_refresh();
        let reloaded = cache
            .dataset(&source, GradePolicy::First)
            .expect("refreshed load")
            .summaries
            .len();
        assert_eq!(reloaded, 0);
    }
}
