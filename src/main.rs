mod config;
mod github;
mod pipeline;
mod release;
mod sheets;
mod slack;

use clap::Parser;
use std::path::PathBuf;
use tracing::{info, info_span};
use tracing_subscriber::EnvFilter;

/// Release Sheet — collects the pull requests merged between two refs across
/// a set of GitHub repositories into a new Google Sheets tab, then posts the
/// sheet link to Slack.
#[derive(Parser, Debug)]
#[command(name = "release-sheet", version, about)]
struct Cli {
    /// Config file path (defaults to .release-sheet.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Comparison expression overriding COMPARE (e.g., release...master)
    #[arg(long)]
    compare: Option<String>,

    /// Fetch and print the report rows without touching the sheet or Slack
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("loading configuration");
    let mut config = config::Config::load(cli.config.as_deref())?;
    if let Some(compare) = cli.compare.filter(|c| !c.trim().is_empty()) {
        config.compare = compare.trim().to_string();
    }

    let _main_span = info_span!("release_sheet", compare = %config.compare).entered();

    let github = github::GitHubClient::new(&config.github_api_url, &config.github_token);

    if cli.dry_run {
        info!("dry run: collecting pull requests only");
        let records =
            pipeline::collect_records(&github, &config.repositories, &config.compare).await?;
        release::print_rows(&release::build_rows(records));
        return Ok(());
    }

    let tokens =
        sheets::ServiceAccountTokenSource::from_key_file(&config.google_credentials_path).await?;
    let sheets = sheets::SheetsClient::new(&config.sheets_api_url, &config.spreadsheet_id, tokens);
    let slack = slack::SlackClient::new(
        &config.slack_api_url,
        &config.slack_token,
        &config.slack_channel,
    );

    let title = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let sheet_url = pipeline::run(
        &github,
        &sheets,
        &slack,
        &config.repositories,
        &config.compare,
        &title,
    )
    .await?;
    info!(url = %sheet_url, "done");

    Ok(())
}
