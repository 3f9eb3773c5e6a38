//! Repository discovery and file enumeration.
//!
//! Everything here fails soft: a root that cannot be walked or a repository
//! whose index cannot be read contributes nothing instead of an error.

use crate::error::{LoupeError, Result};
use crate::navigator::RepoItem;
use ignore::{DirEntry, WalkBuilder};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

const SKIPPED_DIRS: &[&str] = &[".git", "node_modules"];

/// Files and nested repositories of one repository, relative to its root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryListing {
    pub files: Vec<String>,
    pub sub_repositories: Vec<String>,
}

/// Directories up to `max_depth` levels below `root` that contain a `.git`
/// entry, either a directory or a gitlink file. `root` itself is included.
pub fn find_repositories(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    let start = Instant::now();
    let walk = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .max_depth(Some(max_depth))
        .filter_entry(|entry| !is_skipped_dir(entry))
        .build();

    let mut repos = Vec::new();
    for result in walk {
        match result {
            Ok(entry) => {
                let is_dir = entry.file_type().map_or(false, |t| t.is_dir());
                if is_dir && entry.path().join(".git").exists() {
                    repos.push(entry.into_path());
                }
            }
            Err(e) => log::debug!("Discovery: skipping entry under {}: {}", root.display(), e),
        }
    }

    log::debug!(
        "🔎 Discovery: {} repositories under {} in {:?}",
        repos.len(),
        root.display(),
        start.elapsed()
    );
    repos
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().map_or(false, |t| t.is_dir())
        && entry
            .file_name()
            .to_str()
            .map_or(false, |name| SKIPPED_DIRS.contains(&name))
}

/// Scan every root concurrently and turn the results into list entries
pub async fn discover_repositories(roots: &[PathBuf], max_depth: usize) -> Vec<RepoItem> {
    let handles: Vec<_> = roots
        .iter()
        .cloned()
        .map(|root| {
            tokio::task::spawn_blocking(move || {
                let found = find_repositories(&root, max_depth);
                (root, found)
            })
        })
        .collect();

    let mut per_root = Vec::with_capacity(handles.len());
    for handle in handles {
        match handle.await {
            Ok(result) => per_root.push(result),
            Err(e) => log::warn!("Discovery task failed: {}", e),
        }
    }
    repo_items(&per_root)
}

/// Label and sort discovered repositories.
///
/// The label is the path relative to its root, or the directory name when the
/// repository is the root itself. With several roots the root's name becomes
/// the description so equal labels can be told apart.
pub fn repo_items(per_root: &[(PathBuf, Vec<PathBuf>)]) -> Vec<RepoItem> {
    let multi_root = per_root.len() > 1;
    let mut items: Vec<RepoItem> = per_root
        .iter()
        .flat_map(|(root, repos)| {
            repos.iter().map(move |repo| {
                let relative = relative_slash_path(root, repo).unwrap_or_default();
                let label = if relative.is_empty() {
                    file_name_of(repo)
                } else {
                    relative
                };
                RepoItem {
                    path: repo.to_string_lossy().into_owned(),
                    label,
                    description: if multi_root { file_name_of(root) } else { String::new() },
                }
            })
        })
        .collect();
    items.sort_by(|a, b| a.label.cmp(&b.label));
    items
}

/// The most specific repository that contains `path`
pub fn find_repository_for_path<'a>(repos: &'a [RepoItem], path: &Path) -> Option<&'a RepoItem> {
    repos
        .iter()
        .filter(|repo| {
            let repo_path = Path::new(&repo.path);
            path != repo_path && path.starts_with(repo_path)
        })
        .max_by_key(|repo| repo.path.len())
}

/// Tracked files unioned with untracked files that are not ignored.
/// Either half failing only removes its own contribution.
pub fn list_repository_files(repo: &Path) -> Vec<String> {
    let start = Instant::now();
    let mut files = BTreeSet::new();

    match tracked_files(repo) {
        Ok(tracked) => files.extend(tracked),
        Err(e) => log::warn!("Discovery: no tracked files for {}: {}", repo.display(), e),
    }
    files.extend(untracked_files(repo));

    log::debug!(
        "📄 Discovery: {} files in {} in {:?}",
        files.len(),
        repo.display(),
        start.elapsed()
    );
    files.into_iter().collect()
}

/// Paths recorded in the repository index, without submodule entries
pub fn tracked_files(repo: &Path) -> Result<Vec<String>> {
    let repository = gix::open(repo)?;
    let index = repository
        .index_or_empty()
        .map_err(|e| LoupeError::Generic(format!("cannot read index: {}", e)))?;

    Ok(index
        .entries()
        .iter()
        .filter(|entry| entry.mode != gix::index::entry::Mode::COMMIT)
        .map(|entry| entry.path(&index).to_string())
        .collect())
}

/// Files on disk that `.gitignore` rules do not exclude. Nested repositories
/// are not entered and `.git` entries of either kind are never listed.
pub fn untracked_files(repo: &Path) -> Vec<String> {
    let walk = WalkBuilder::new(repo)
        .hidden(false)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .require_git(false)
        .parents(true)
        .filter_entry(|entry| entry.file_name() != ".git" && !is_nested_repository(entry))
        .build();

    walk.filter_map(|result| match result {
        Ok(entry) => Some(entry),
        Err(e) => {
            log::debug!("Discovery: walk error in {}: {}", repo.display(), e);
            None
        }
    })
    .filter(|entry| entry.file_type().map_or(false, |t| !t.is_dir()))
    .filter_map(|entry| relative_slash_path(repo, entry.path()))
    .filter(|path| !path.is_empty())
    .collect()
}

fn is_nested_repository(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().map_or(false, |t| t.is_dir())
        && entry.path().join(".git").exists()
}

/// Nested repositories of `repo`, relative to it
pub fn sub_repositories(repo: &Path, max_depth: usize) -> Vec<String> {
    find_repositories(repo, max_depth)
        .iter()
        .filter(|found| found.as_path() != repo)
        .filter_map(|found| relative_slash_path(repo, found))
        .filter(|path| !path.is_empty())
        .collect()
}

/// Files and sub-repositories, collected concurrently
pub async fn load_repository(repo: PathBuf, max_depth: usize) -> RepositoryListing {
    let files_repo = repo.clone();
    let files = tokio::task::spawn_blocking(move || list_repository_files(&files_repo));
    let subs = tokio::task::spawn_blocking(move || sub_repositories(&repo, max_depth));

    let (files, subs) = tokio::join!(files, subs);
    RepositoryListing {
        files: files.unwrap_or_else(|e| {
            log::warn!("Listing files failed: {}", e);
            Vec::new()
        }),
        sub_repositories: subs.unwrap_or_else(|e| {
            log::warn!("Listing sub-repositories failed: {}", e);
            Vec::new()
        }),
    }
}

/// `path` relative to `base`, always joined with `/`
pub fn relative_slash_path(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(segments.join("/"))
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
