use super::ReleaseError;

/// A raw commit as returned by the comparison endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitEntry {
    /// Commit author's display name (may be empty if GitHub omitted it)
    pub author: String,
    /// Full multi-line commit message
    pub message: String,
}

impl CommitEntry {
    pub fn new(author: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            message: message.into(),
        }
    }
}

/// One merged pull request discovered in a comparison.
///
/// Fields are private so a record can only be obtained through `new`,
/// which rejects empty repository, author and summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRecord {
    repository: String,
    number: u64,
    author: String,
    summary: String,
}

impl PullRequestRecord {
    pub fn new(
        repository: impl Into<String>,
        number: u64,
        author: impl Into<String>,
        summary: impl Into<String>,
    ) -> Result<Self, ReleaseError> {
        let repository = repository.into();
        let author = author.into();
        let summary = summary.into();

        if repository.is_empty() {
            return Err(ReleaseError::InvalidRecord("repository is empty"));
        }
        if number == 0 {
            return Err(ReleaseError::InvalidRecord("pull request number is zero"));
        }
        if author.is_empty() {
            return Err(ReleaseError::InvalidRecord("author is empty"));
        }
        if summary.is_empty() {
            return Err(ReleaseError::InvalidRecord("summary is empty"));
        }

        Ok(Self {
            repository,
            number,
            author,
            summary,
        })
    }

    /// Repository in `owner/name` form
    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Bare repository name without the owner prefix.
    pub fn short_name(&self) -> &str {
        match self.repository.split_once('/') {
            Some((_, name)) => name,
            None => &self.repository,
        }
    }

    pub fn url(&self) -> String {
        format!("https://github.com/{}/pull/{}", self.repository, self.number)
    }
}

/// A rendered spreadsheet row: short repo name, author, hyperlink formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub repository: String,
    pub author: String,
    pub link: String,
}

impl ReportRow {
    /// Cells in column order (A, B, C).
    pub fn cells(&self) -> [&str; 3] {
        [&self.repository, &self.author, &self.link]
    }
}

impl From<&PullRequestRecord> for ReportRow {
    fn from(record: &PullRequestRecord) -> Self {
        Self {
            repository: record.short_name().to_string(),
            author: record.author().to_string(),
            link: hyperlink(&record.url(), record.summary()),
        }
    }
}

/// Spreadsheet `HYPERLINK` formula; embedded double quotes are doubled.
pub fn hyperlink(url: &str, text: &str) -> String {
    format!(
        "=HYPERLINK(\"{}\", \"{}\")",
        url.replace('"', "\"\""),
        text.replace('"', "\"\"")
    )
}
