use thiserror::Error;
use tracing::{info, info_span, Instrument};

use crate::github::{CompareSource, GitHubError};
use crate::release::{self, PullRequestRecord, ReleaseError, ReportRow};
use crate::sheets::{SheetService, SheetsError};
use crate::slack::{Notifier, SlackError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to fetch comparison for {repository}: {source}")]
    Fetch {
        repository: String,
        #[source]
        source: GitHubError,
    },

    #[error("Malformed merge commit: {0}")]
    Commit(#[from] ReleaseError),

    #[error("Failed to create release sheet: {0}")]
    Sheets(#[from] SheetsError),

    #[error("Failed to send notification: {0}")]
    Notify(#[from] SlackError),
}

/// Collect merged pull requests from every repository, in configured order.
///
/// The first failing repository aborts the collection.
pub async fn collect_records(
    source: &dyn CompareSource,
    repositories: &[String],
    compare: &str,
) -> Result<Vec<PullRequestRecord>, PipelineError> {
    let mut records = Vec::new();
    for repository in repositories {
        let commits = source
            .compare(repository, compare)
            .instrument(info_span!("fetch", repository = %repository))
            .await
            .map_err(|source| PipelineError::Fetch {
                repository: repository.clone(),
                source,
            })?;
        let found = release::parse_commits(repository, &commits)?;
        info!(repository = %repository, commits = commits.len(), pull_requests = found.len(), "collected pull requests");
        records.extend(found);
    }
    Ok(records)
}

/// Copy the template, rename it to `title`, write rows, and return the sheet URL.
///
/// Steps run strictly in order. A failure after the copy leaves the new sheet behind.
pub async fn publish_sheet(
    sheets: &dyn SheetService,
    title: &str,
    rows: &[ReportRow],
) -> Result<String, SheetsError> {
    let sheet_id = sheets.copy_template().await?;
    info!(sheet_id, "created sheet from template");

    sheets.rename_sheet(sheet_id, title).await?;
    info!(sheet_id, title = %title, "renamed sheet");

    if rows.is_empty() {
        info!("no pull requests to write");
    } else {
        sheets.write_rows(title, rows).await?;
        info!(rows = rows.len(), "wrote report rows");
    }

    Ok(sheets.sheet_url(sheet_id))
}

pub fn notification_text(sheet_url: &str) -> String {
    format!("[Release sheet]\n{sheet_url}")
}

/// Run the whole release report: fetch, build, publish, notify.
/// Returns the URL of the new sheet.
pub async fn run(
    source: &dyn CompareSource,
    sheets: &dyn SheetService,
    notifier: &dyn Notifier,
    repositories: &[String],
    compare: &str,
    title: &str,
) -> Result<String, PipelineError> {
    info!(repositories = repositories.len(), compare = %compare, "fetching pull requests");
    let records = collect_records(source, repositories, compare).await?;

    let rows = release::build_rows(records);

    info!(title = %title, "generating release sheet");
    let sheet_url = publish_sheet(sheets, title, &rows).await?;

    info!(url = %sheet_url, "notifying channel");
    notifier.notify(&notification_text(&sheet_url)).await?;

    Ok(sheet_url)
}
