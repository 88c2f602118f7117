pub mod parser;
pub mod types;

pub use parser::parse_commits;
pub use types::{CommitEntry, PullRequestRecord, ReportRow};

use colored::Colorize;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("Commit in {repository} has an empty author name")]
    EmptyAuthor { repository: String },

    #[error("Commit by {author} in {repository} has an empty message")]
    EmptyMessage { repository: String, author: String },

    #[error("Merge commit for {repository}#{number} has no summary line")]
    MissingSummary { repository: String, number: u64 },

    #[error("Invalid pull request number: {0}")]
    InvalidNumber(String),

    #[error("Invalid pull request record: {0}")]
    InvalidRecord(&'static str),
}

/// Sort records by repository and render each into a spreadsheet row.
///
/// The sort is stable, so records of the same repository keep the order in
/// which they were collected. Duplicates are kept.
#[instrument(skip(records), fields(count = records.len()))]
pub fn build_rows(mut records: Vec<PullRequestRecord>) -> Vec<ReportRow> {
    records.sort_by(|a, b| a.repository().cmp(b.repository()));
    let rows: Vec<ReportRow> = records.iter().map(ReportRow::from).collect();
    debug!(rows = rows.len(), "built report rows");
    rows
}

/// Print rows to the terminal, used by `--dry-run`.
pub fn print_rows(rows: &[ReportRow]) {
    println!();
    println!("{}", format!("Release report: {} pull request(s)", rows.len()).bold());
    println!();
    if rows.is_empty() {
        println!("  No merged pull requests found.");
    }
    for row in rows {
        println!(
            "  {} | {} | {}",
            row.repository.cyan().bold(),
            row.author.green(),
            row.link
        );
    }
    println!();
}
