use std::path::Path;

use anyhow::{Context, Result};
use walkdir::WalkDir;

use hgcollect_types::RepoList;

/// Enumerate the immediate subdirectories of `parent` as the repository
/// list, sorted by file name so submission order is deterministic.
pub fn discover_repos(parent: &Path) -> Result<RepoList> {
    let mut repos = RepoList::new();

    for entry in WalkDir::new(parent)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry =
            entry.with_context(|| format!("failed to read repos dir {}", parent.display()))?;
        if entry.file_type().is_dir() {
            repos.push(entry.into_path());
        }
    }

    Ok(repos)
}
