use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgGroup, Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod models;
mod normalize;
mod report;
mod requirements;
mod source;
mod summary;

use models::{Observation, StudentProgress};
use source::{CachedLoad, DataSource};
use summary::GradePolicy;

#[derive(Parser)]
#[command(name = "service-hour-tracker")]
#[command(about = "Service hour progress tracker for student volunteer programs", long_about = None)]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,
    /// How to resolve conflicting grade labels for one student
    #[arg(long, value_enum, default_value = "first")]
    grade_policy: GradePolicy,
    /// Freshness window for reusing a previous load, in seconds
    #[arg(long, default_value_t = 300)]
    max_age_secs: u64,
    /// Ignore the freshness window and reload the source
    #[arg(long)]
    refresh: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
#[command(group(
    ArgGroup::new("data_source")
        .args(["csv", "data_dir", "feed_url"])
        .multiple(false)
))]
struct SourceArgs {
    /// Wide-format csv export of the service hour sheet
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Directory of csv exports, filtered by filename keyword
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Filename keyword for --data-dir filtering
    #[arg(long, default_value = "service")]
    keyword: String,
    /// Published csv feed url
    #[arg(long, env = "SERVICE_HOURS_FEED_URL")]
    feed_url: Option<String>,
}

impl SourceArgs {
    fn resolve(&self) -> anyhow::Result<DataSource> {
        if let Some(path) = &self.csv {
            return Ok(DataSource::CsvFile(path.clone()));
        }
        if let Some(dir) = &self.data_dir {
            return Ok(DataSource::Directory {
                dir: dir.clone(),
                keyword: self.keyword.clone(),
            });
        }
        if let Some(url) = &self.feed_url {
            return Ok(DataSource::Feed(url.clone()));
        }
        anyhow::bail!(
            "no data source configured; pass --csv, --data-dir, or --feed-url \
             (or set SERVICE_HOURS_FEED_URL)"
        )
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Look up students by name and show their progress
    Progress {
        #[arg(long)]
        query: String,
        /// Hide the per-entry service log
        #[arg(long)]
        no_log: bool,
    },
    /// Students closest to their minimum requirement
    Leaderboard {
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Every student's summary and status
    Roster {
        #[arg(long)]
        json: bool,
    },
    /// Write a markdown progress report
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let source = cli.source.resolve()?;
    let mut cache = CachedLoad::new(Duration::from_secs(cli.max_age_secs));
    if cli.refresh {
        cache.force_refresh();
    }

    match cli.command {
        Commands::Progress { query, no_log } => {
            let dataset = cache.dataset(&source, cli.grade_policy)?;
            let matches = summary::search(&dataset.summaries, &query);

            if matches.is_empty() {
                println!("No student found matching \"{query}\". Double-check the spelling.");
                return Ok(());
            }

            for student in matches {
                let progress = requirements::evaluate(student);
                print_progress_card(&progress);
                if !no_log {
                    let log = summary::service_log(&dataset.observations, &student.name);
                    print_service_log(&log);
                }
            }
        }
        Commands::Leaderboard { limit } => {
            let dataset = cache.dataset(&source, cli.grade_policy)?;
            let entries = summary::leaderboard(&dataset.summaries, limit);

            if entries.is_empty() {
                println!("Everyone has met the minimum requirement.");
                return Ok(());
            }

            println!("Closest to completing the minimum requirement:");
            for (rank, entry) in entries.iter().enumerate() {
                println!(
                    "{}. {} (grade {}) {:.1} hrs completed, {:.1} hrs to go {}",
                    rank + 1,
                    entry.name,
                    entry.grade,
                    entry.completed_hours,
                    entry.remaining_to_minimum,
                    progress_bar(entry.fraction_to_minimum)
                );
            }
        }
        Commands::Roster { json } => {
            let dataset = cache.dataset(&source, cli.grade_policy)?;
            let roster: Vec<StudentProgress> = dataset
                .summaries
                .iter()
                .map(requirements::evaluate)
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&roster)?);
            } else if roster.is_empty() {
                println!("No students found in the source data.");
            } else {
                for progress in &roster {
                    println!(
                        "- {} (grade {}) {:.1} hrs, {}",
                        progress.name,
                        progress.grade,
                        progress.completed_hours,
                        progress.status.label()
                    );
                }
            }
        }
        Commands::Report { out, limit } => {
            let dataset = cache.dataset(&source, cli.grade_policy)?;
            let report = report::build_report(&source.describe(), dataset, limit);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn print_progress_card(progress: &StudentProgress) {
    println!();
    println!("{} (grade {})", progress.name, progress.grade);
    println!("  Status: {}", progress.status.label());
    println!(
        "  Completed {:.1} hrs | minimum {} hrs | distinction {} hrs",
        progress.completed_hours, progress.requirement.minimum, progress.requirement.distinction
    );
    println!(
        "  Minimum     {} {:>3.0}%",
        progress_bar(progress.fraction_to_minimum),
        progress.fraction_to_minimum * 100.0
    );
    println!(
        "  Distinction {} {:>3.0}%",
        progress_bar(progress.fraction_to_distinction),
        progress.fraction_to_distinction * 100.0
    );
    if progress.outstanding_to_minimum > 0.0 {
        println!(
            "  {:.1} more hours to meet the minimum requirement.",
            progress.outstanding_to_minimum
        );
    } else if progress.outstanding_to_distinction > 0.0 {
        println!(
            "  Minimum met. {:.1} more hours to earn Distinction.",
            progress.outstanding_to_distinction
        );
    } else {
        println!("  Distinction earned. Congratulations!");
    }
}

fn print_service_log(entries: &[Observation]) {
    println!("  Service log ({} entries):", entries.len());
    for entry in entries {
        let date = entry
            .date
            .map(|date| date.format("%B %d, %Y").to_string())
            .unwrap_or_else(|| "Date unknown".to_string());
        println!("    {} - {:.1} hrs - {}", date, entry.hours, entry.description);
    }
}

fn progress_bar(fraction: f64) -> String {
    const WIDTH: usize = 20;
    let filled = (fraction.clamp(0.0, 1.0) * WIDTH as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(WIDTH - filled))
}
