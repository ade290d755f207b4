//! Git worktree detection
//!
//! Context comes from one `git worktree list --porcelain` invocation run
//! with the event's `cwd` as working directory. Every failure mode (git
//! missing, not a repository, timeout, unparseable output) collapses to
//! `None` so the worktree task becomes a no-op.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

/// Context derived from the worktree listing
#[derive(Debug, Clone, PartialEq)]
pub struct WorktreeContext {
    /// True when cwd is inside any worktree (main or linked)
    pub is_worktree: bool,
    /// True when cwd is inside the main worktree (first listing entry)
    pub is_main: bool,
    /// Absolute path of the containing worktree
    pub worktree_root: PathBuf,
    /// Full branch name, e.g. "feat/new-parser"
    pub branch_name: Option<String>,
    /// Segment before the first `/` of the branch name
    pub branch_type: Option<String>,
}

/// One entry of the porcelain listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorktreeEntry {
    pub path: PathBuf,
    pub branch: Option<String>,
    pub bare: bool,
}

/// Detect the worktree containing `cwd`, if any
pub async fn detect_worktree_context(cwd: &Path, timeout: Duration) -> Option<WorktreeContext> {
    if !cwd.is_dir() {
        return None;
    }

    let output = tokio::time::timeout(
        timeout,
        Command::new("git")
            .args(["worktree", "list", "--porcelain"])
            .current_dir(cwd)
            .output(),
    )
    .await
    .ok()?
    .ok()?;

    if !output.status.success() {
        tracing::debug!(
            "git worktree list failed in {}: {}",
            cwd.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let entries = parse_worktree_list(&stdout);
    let resolved_cwd = dunce::canonicalize(cwd).ok()?;

    // The containing worktree is the one with the longest matching path;
    // the first listing entry is always the main worktree
    let mut best: Option<(usize, &WorktreeEntry, usize)> = None;
    for (index, entry) in entries.iter().enumerate() {
        let root = dunce::canonicalize(&entry.path).unwrap_or_else(|_| entry.path.clone());
        if resolved_cwd.starts_with(&root) {
            let length = root.as_os_str().len();
            if best.is_none_or(|(_, _, best_length)| length > best_length) {
                best = Some((index, entry, length));
            }
        }
    }

    let (index, entry, _) = best?;
    let worktree_root =
        dunce::canonicalize(&entry.path).unwrap_or_else(|_| entry.path.clone());
    let branch_name = entry.branch.clone();
    let branch_type = branch_name.as_deref().and_then(extract_branch_type);

    Some(WorktreeContext {
        is_worktree: true,
        is_main: index == 0,
        worktree_root,
        branch_name,
        branch_type,
    })
}

/// Parse `git worktree list --porcelain` output
///
/// Blocks are separated by blank lines; each block carries a `worktree`
/// line, optionally `branch refs/heads/<name>`, and optionally `bare`.
pub fn parse_worktree_list(output: &str) -> Vec<WorktreeEntry> {
    let mut entries = Vec::new();
    let mut current: Option<WorktreeEntry> = None;

    for line in output.lines() {
        let line = line.trim();

        if line.is_empty() {
            if let Some(entry) = current.take() {
                entries.push(entry);
            }
            continue;
        }

        if let Some(path) = line.strip_prefix("worktree ") {
            if let Some(entry) = current.take() {
                entries.push(entry);
            }
            current = Some(WorktreeEntry {
                path: PathBuf::from(path),
                ..Default::default()
            });
        } else if let Some(reference) = line.strip_prefix("branch ") {
            if let Some(entry) = current.as_mut() {
                entry.branch = reference
                    .strip_prefix("refs/heads/")
                    .map(str::to_string)
                    .or_else(|| Some(reference.to_string()));
            }
        } else if line == "bare"
            && let Some(entry) = current.as_mut()
        {
            entry.bare = true;
        }
    }

    if let Some(entry) = current.take() {
        entries.push(entry);
    }

    entries
}

/// Branch type: the segment before the first `/`, or `None` without one
pub fn extract_branch_type(branch_name: &str) -> Option<String> {
    branch_name
        .split_once('/')
        .map(|(kind, _)| kind.to_string())
}
