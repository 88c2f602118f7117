use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use super::types::{CommitEntry, PullRequestRecord};
use super::ReleaseError;

static MERGE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Merge pull request #(\d+) ").expect("merge header pattern is valid")
});

/// Extract pull request records from the commits of one repository comparison.
///
/// Only GitHub merge commits are kept; their message looks like:
///
///   Merge pull request #42 from owner/branch
///   <blank>
///   Summary line
///
/// Every commit must carry a non-empty author and message, merge commit or
/// not. The first violation aborts the whole parse. Input order is preserved.
pub fn parse_commits(
    repository: &str,
    commits: &[CommitEntry],
) -> Result<Vec<PullRequestRecord>, ReleaseError> {
    let mut records = Vec::new();

    for commit in commits {
        if commit.author.is_empty() {
            return Err(ReleaseError::EmptyAuthor {
                repository: repository.to_string(),
            });
        }
        if commit.message.is_empty() {
            return Err(ReleaseError::EmptyMessage {
                repository: repository.to_string(),
                author: commit.author.clone(),
            });
        }

        let Some(captures) = MERGE_HEADER.captures(&commit.message) else {
            trace!(repository, "skipping non-merge commit");
            continue;
        };

        let digits = &captures[1];
        let number = digits
            .parse::<u64>()
            .map_err(|_| ReleaseError::InvalidNumber(digits.to_string()))?;

        let summary = commit
            .message
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .nth(2)
            .filter(|line| !line.is_empty())
            .ok_or_else(|| ReleaseError::MissingSummary {
                repository: repository.to_string(),
                number,
            })?;

        records.push(PullRequestRecord::new(
            repository,
            number,
            commit.author.as_str(),
            summary,
        )?);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_merge_commit() {
        let commits = vec![CommitEntry::new(
            "Alice",
            "Merge pull request #42 from x/y\n\nFix the thing",
        )];
        let records = parse_commits("org/repo", &commits).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].repository(), "org/repo");
        assert_eq!(records[0].number(), 42);
        assert_eq!(records[0].author(), "Alice");
        assert_eq!(records[0].summary(), "Fix the thing");
    }

    #[test]
    fn test_skips_non_merge_commits() {
        let commits = vec![
            CommitEntry::new("Bob", "Fix typo in README"),
            CommitEntry::new("Bob", "merge pull request #3 from x/y\n\nlowercase"),
            CommitEntry::new("Bob", "Merge branch 'master' into release"),
            CommitEntry::new("Bob", "Revert \"Merge pull request #5 from x/y\"\n\nbody"),
            CommitEntry::new("Bob", "Merge pull request #abc from x/y\n\nnot digits"),
        ];
        let records = parse_commits("org/repo", &commits).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_handles_crlf_line_endings() {
        let commits = vec![CommitEntry::new(
            "Carol",
            "Merge pull request #7 from x/y\r\n\r\nAdd feature\r\nmore detail",
        )];
        let records = parse_commits("org/repo", &commits).unwrap();
        assert_eq!(records[0].summary(), "Add feature");
    }

    #[test]
    fn test_preserves_commit_order() {
        let commits = vec![
            CommitEntry::new("a", "Merge pull request #9 from x/y\n\nNine"),
            CommitEntry::new("b", "plain commit"),
            CommitEntry::new("c", "Merge pull request #2 from x/z\n\nTwo"),
        ];
        let records = parse_commits("org/repo", &commits).unwrap();
        let numbers: Vec<u64> = records.iter().map(|r| r.number()).collect();
        assert_eq!(numbers, vec![9, 2]);
    }

    #[test]
    fn test_missing_summary_line_fails() {
        let commits = vec![CommitEntry::new("Alice", "Merge pull request #42 from x/y")];
        let err = parse_commits("org/repo", &commits).unwrap_err();
        assert!(matches!(err, ReleaseError::MissingSummary { number: 42, .. }));
    }

    #[test]
    fn test_empty_author_fails_whole_parse() {
        let commits = vec![
            CommitEntry::new("Alice", "Merge pull request #1 from x/y\n\nOne"),
            CommitEntry::new("", "Merge pull request #2 from x/y\n\nTwo"),
        ];
        let err = parse_commits("org/repo", &commits).unwrap_err();
        assert!(matches!(err, ReleaseError::EmptyAuthor { .. }));
    }

    #[test]
    fn test_empty_message_fails_whole_parse() {
        let commits = vec![CommitEntry::new("Alice", "")];
        let err = parse_commits("org/repo", &commits).unwrap_err();
        assert!(matches!(err, ReleaseError::EmptyMessage { .. }));
    }

    #[test]
    fn test_oversized_number_is_rejected() {
        let commits = vec![CommitEntry::new(
            "Alice",
            "Merge pull request #99999999999999999999999 from x/y\n\nHuge",
        )];
        let err = parse_commits("org/repo", &commits).unwrap_err();
        assert!(matches!(err, ReleaseError::InvalidNumber(_)));
    }
}
