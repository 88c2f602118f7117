use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_COMPARE: &str = "release...master";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_SHEETS_API_URL: &str = "https://sheets.googleapis.com";
pub const DEFAULT_SLACK_API_URL: &str = "https://slack.com/api";

const DEFAULT_CONFIG_FILE: &str = ".release-sheet.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{0} must be set to a non-empty value")]
    Missing(&'static str),

    #[error("Invalid repository {0:?}: expected owner/name")]
    InvalidRepository(String),
}

/// Optional settings read from `.release-sheet.toml`.
///
/// Every field may be overridden by its environment variable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub github: GitHubSection,
    #[serde(default)]
    pub google: GoogleSection,
    #[serde(default)]
    pub slack: SlackSection,
    #[serde(default)]
    pub release: ReleaseSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubSection {
    pub token: Option<String>,
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GoogleSection {
    pub credentials_path: Option<PathBuf>,
    pub sheet_id: Option<String>,
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlackSection {
    pub token: Option<String>,
    pub channel: Option<String>,
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReleaseSection {
    #[serde(default)]
    pub repos: Vec<String>,
    pub compare: Option<String>,
}

/// Validated run configuration, built once and passed to the pipeline.
#[derive(Clone)]
pub struct Config {
    pub github_token: String,
    pub google_credentials_path: PathBuf,
    pub spreadsheet_id: String,
    pub slack_token: String,
    pub slack_channel: String,
    /// Repositories in `owner/name` form, in configured order
    pub repositories: Vec<String>,
    /// Comparison expression, e.g. `release...master`
    pub compare: String,
    pub github_api_url: String,
    pub sheets_api_url: String,
    pub slack_api_url: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("google_credentials_path", &self.google_credentials_path)
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("slack_channel", &self.slack_channel)
            .field("repositories", &self.repositories)
            .field("compare", &self.compare)
            .finish_non_exhaustive()
    }
}

impl FileConfig {
    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }
}

impl Config {
    /// Load configuration from the process environment, layered over the
    /// config file at `path` (or `.release-sheet.toml` if it exists).
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let file = match path {
            Some(path) => FileConfig::load_from(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    FileConfig::load_from(default)?
                } else {
                    FileConfig::default()
                }
            }
        };
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Merge file settings with values from `env` and validate the result.
    /// Environment values win over the file.
    pub fn resolve<F>(file: FileConfig, env: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |key: &'static str, fallback: Option<String>| -> Option<String> {
            non_empty(env(key)).or_else(|| non_empty(fallback))
        };
        let require = |key: &'static str, fallback: Option<String>| -> Result<String, ConfigError> {
            pick(key, fallback).ok_or(ConfigError::Missing(key))
        };

        let github_token = require("GITHUB_TOKEN", file.github.token)?;
        let google_credentials_path = require(
            "GOOGLE_CREDENTIALS_PATH",
            file.google
                .credentials_path
                .map(|p| p.to_string_lossy().into_owned()),
        )?;
        let spreadsheet_id = require("GOOGLE_SHEET_ID", file.google.sheet_id)?;
        let slack_token = require("SLACK_TOKEN", file.slack.token)?;
        let slack_channel = require("SLACK_CHANNEL", file.slack.channel)?;

        let repos_raw = match non_empty(env("REPOS")) {
            Some(raw) => raw,
            None => file.release.repos.join(","),
        };
        let repositories = parse_repositories(&repos_raw)?;

        let compare = pick("COMPARE", file.release.compare)
            .unwrap_or_else(|| DEFAULT_COMPARE.to_string());

        Ok(Config {
            github_token,
            google_credentials_path: PathBuf::from(google_credentials_path),
            spreadsheet_id,
            slack_token,
            slack_channel,
            repositories,
            compare,
            github_api_url: pick("GITHUB_API_URL", file.github.api_url)
                .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
            sheets_api_url: pick("SHEETS_API_URL", file.google.api_url)
                .unwrap_or_else(|| DEFAULT_SHEETS_API_URL.to_string()),
            slack_api_url: pick("SLACK_API_URL", file.slack.api_url)
                .unwrap_or_else(|| DEFAULT_SLACK_API_URL.to_string()),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Split a comma-separated repository list, trimming each entry.
pub fn parse_repositories(raw: &str) -> Result<Vec<String>, ConfigError> {
    let repositories: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect();

    if repositories.is_empty() {
        return Err(ConfigError::Missing("REPOS"));
    }

    for repo in &repositories {
        match repo.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {}
            _ => return Err(ConfigError::InvalidRepository(repo.clone())),
        }
    }

    Ok(repositories)
}
