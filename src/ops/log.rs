use std::collections::HashSet;
use std::fmt;

use crate::error::{Error, Result};
use crate::object::{read_commit, CommitInfo};
use crate::repo::Repo;

/// largest number of commits a single history call may return
pub const MAX_HISTORY_LIMIT: usize = 100;

/// walk the commit chain from HEAD, newest first
pub fn history(repo: &Repo, limit: usize) -> Result<Vec<CommitInfo>> {
    if limit == 0 || limit > MAX_HISTORY_LIMIT {
        return Err(Error::InvalidInput(format!(
            "history limit must be between 1 and {}",
            MAX_HISTORY_LIMIT
        )));
    }

    let mut entries = Vec::new();
    let mut visited = HashSet::new();
    let mut current = repo.read_head()?;

    while let Some(hash) = current {
        // the parent chain is expected to be acyclic; the visited set is a
        // guard against walking a corrupted graph forever
        if entries.len() >= limit || !visited.insert(hash) {
            break;
        }
        let commit = read_commit(repo, &hash)?;
        current = commit.parent;
        entries.push(CommitInfo::new(hash, commit));
    }

    Ok(entries)
}

/// format a commit for log output
impl fmt::Display for CommitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "commit {}", self.hash)?;
        writeln!(f, "Author: {}", self.author)?;
        writeln!(f, "Date:   {}", format_timestamp(self.timestamp))?;
        writeln!(f)?;
        for line in self.message.lines() {
            writeln!(f, "    {}", line)?;
        }
        Ok(())
    }
}

fn format_timestamp(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}
