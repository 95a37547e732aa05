//! Deterministic directory traversal.
//!
//! Children are visited in byte-wise order of their file names at every
//! level, and each directory is yielded before its children. The result
//! depends only on which relative paths exist, never on the order the
//! filesystem happens to return them in.

use crate::name::EntryKind;
use crate::{ArchiveError, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// One matched directory or regular file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkEntry {
    /// `/`-separated path relative to the walk root.
    pub relative: String,
    pub kind: EntryKind,
    /// Location on disk.
    pub path: PathBuf,
    /// On-disk mode bits, where the platform has them.
    pub mode: Option<u32>,
}

/// Matched entries in pre-order. Consumed once.
#[derive(Debug, Default)]
pub struct TraversalOrder {
    entries: Vec<WalkEntry>,
}

impl TraversalOrder {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for TraversalOrder {
    type Item = WalkEntry;
    type IntoIter = std::vec::IntoIter<WalkEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Walk configuration.
#[derive(Debug, Clone)]
pub struct TreeWalker {
    root: PathBuf,
    patterns: GlobSet,
    recursive: bool,
    excluded: Vec<PathBuf>,
}

impl TreeWalker {
    /// Match `patterns` against paths relative to `root`.
    ///
    /// Patterns are globs where `*` and `?` stay within one path segment
    /// and `**` spans segments.
    pub fn new<S: AsRef<str>>(root: impl Into<PathBuf>, patterns: &[S]) -> Result<Self> {
        Ok(Self {
            root: root.into(),
            patterns: compile_patterns(patterns)?,
            recursive: false,
            excluded: Vec::new(),
        })
    }

    /// Include the whole subtree of every matched directory.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Never yield `path`, even when it matches.
    pub fn exclude(mut self, path: impl Into<PathBuf>) -> Self {
        self.excluded.push(path.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Enumerate the tree.
    pub fn walk(&self) -> Result<TraversalOrder> {
        if !self.root.is_dir() {
            return Err(ArchiveError::RootNotDirectory(self.root.clone()));
        }

        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(false)
            .sort_by(|a, b| {
                a.file_name()
                    .as_encoded_bytes()
                    .cmp(b.file_name().as_encoded_bytes())
            });

        let mut entries = Vec::new();
        // Depth of the matched directory whose subtree is being pulled in.
        let mut included_depth: Option<usize> = None;

        for entry in walker {
            let entry = entry?;
            let depth = entry.depth();
            if included_depth.is_some_and(|d| depth <= d) {
                included_depth = None;
            }

            let file_type = entry.file_type();
            let kind = if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                debug!(path = %entry.path().display(), "Skipping non-regular entry");
                continue;
            };

            if self.excluded.iter().any(|p| p == entry.path()) {
                debug!(path = %entry.path().display(), "Skipping excluded path");
                continue;
            }

            let relative = relative_name(&self.root, entry.path())?;
            let matched = included_depth.is_some() || self.patterns.is_match(&relative);
            if !matched {
                continue;
            }
            if self.recursive && kind == EntryKind::Directory && included_depth.is_none() {
                included_depth = Some(depth);
            }

            let mode = match entry.metadata() {
                Ok(metadata) => source_mode(&metadata),
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "Could not read metadata");
                    None
                }
            };

            entries.push(WalkEntry {
                relative,
                kind,
                path: entry.into_path(),
                mode,
            });
        }

        debug!(
            root = %self.root.display(),
            entries = entries.len(),
            recursive = self.recursive,
            "Tree walked"
        );
        Ok(TraversalOrder { entries })
    }
}

/// Walk `root` without recursive inclusion.
pub fn walk<S: AsRef<str>>(root: impl Into<PathBuf>, patterns: &[S]) -> Result<TraversalOrder> {
    TreeWalker::new(root, patterns)?.walk()
}

fn compile_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|source| ArchiveError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| ArchiveError::InvalidPattern {
        pattern: patterns
            .iter()
            .map(|p| p.as_ref())
            .collect::<Vec<_>>()
            .join(", "),
        source,
    })
}

fn relative_name(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut parts = Vec::new();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            let part = part.to_str().ok_or_else(|| ArchiveError::InvalidEntryName {
                name: path.to_string_lossy().into_owned(),
                reason: "is not valid UTF-8",
            })?;
            parts.push(part);
        }
    }
    Ok(parts.join("/"))
}

#[cfg(unix)]
fn source_mode(metadata: &std::fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(metadata.permissions().mode())
}

#[cfg(not(unix))]
fn source_mode(_metadata: &std::fs::Metadata) -> Option<u32> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("b/inner")).unwrap();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("b/inner/deep.txt"), "deep").unwrap();
        fs::write(root.join("b/z.txt"), "z").unwrap();
        fs::write(root.join("a/one.txt"), "1").unwrap();
        fs::write(root.join("C.txt"), "C").unwrap();
        fs::write(root.join("a.txt"), "a").unwrap();
        dir
    }

    fn relatives(order: TraversalOrder) -> Vec<String> {
        order.into_iter().map(|e| e.relative).collect()
    }

    #[test]
    fn test_top_level_star_is_not_recursive() {
        let dir = tree();
        let order = walk(dir.path(), &["*"]).unwrap();
        assert_eq!(relatives(order), ["C.txt", "a", "a.txt", "b"]);
    }

    #[test]
    fn test_recursive_is_preorder_bytewise() {
        let dir = tree();
        let order = TreeWalker::new(dir.path(), &["*"])
            .unwrap()
            .recursive(true)
            .walk()
            .unwrap();
        assert_eq!(
            relatives(order),
            [
                "C.txt",
                "a",
                "a/one.txt",
                "a.txt",
                "b",
                "b/inner",
                "b/inner/deep.txt",
                "b/z.txt",
            ]
        );
    }

    #[test]
    fn test_recursive_only_pulls_in_matched_subtrees() {
        let dir = tree();
        let order = TreeWalker::new(dir.path(), &["b"])
            .unwrap()
            .recursive(true)
            .walk()
            .unwrap();
        assert_eq!(relatives(order), ["b", "b/inner", "b/inner/deep.txt", "b/z.txt"]);
    }

    #[test]
    fn test_nested_patterns_without_recursion() {
        let dir = tree();
        let order = walk(dir.path(), &["**/*.txt"]).unwrap();
        assert_eq!(
            relatives(order),
            ["C.txt", "a/one.txt", "a.txt", "b/inner/deep.txt", "b/z.txt"]
        );
    }

    #[test]
    fn test_entry_kinds_and_paths() {
        let dir = tree();
        let entries: Vec<_> = walk(dir.path(), &["a", "a.txt"]).unwrap().into_iter().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, EntryKind::Directory);
        assert_eq!(entries[1].kind, EntryKind::File);
        assert_eq!(entries[1].path, dir.path().join("a.txt"));
    }

    #[test]
    fn test_excluded_path_is_skipped() {
        let dir = tree();
        let order = TreeWalker::new(dir.path(), &["*"])
            .unwrap()
            .exclude(dir.path().join("a.txt"))
            .walk()
            .unwrap();
        assert_eq!(relatives(order), ["C.txt", "a", "b"]);
    }

    #[test]
    fn test_no_match_is_empty() {
        let dir = tree();
        let order = walk(dir.path(), &["nothing*"]).unwrap();
        assert!(order.is_empty());
        assert_eq!(order.len(), 0);
    }

    #[test]
    fn test_invalid_pattern() {
        let dir = tree();
        assert!(matches!(
            walk(dir.path(), &["a[b"]),
            Err(ArchiveError::InvalidPattern { pattern, .. }) if pattern == "a[b"
        ));
    }

    #[test]
    fn test_missing_root() {
        let dir = tree();
        assert!(matches!(
            walk(dir.path().join("missing"), &["*"]),
            Err(ArchiveError::RootNotDirectory(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_skipped() {
        let dir = tree();
        std::os::unix::fs::symlink(dir.path().join("b"), dir.path().join("link")).unwrap();
        let order = TreeWalker::new(dir.path(), &["*"])
            .unwrap()
            .recursive(true)
            .walk()
            .unwrap();
        let names = relatives(order);
        assert!(!names.iter().any(|n| n.starts_with("link")));
        assert_eq!(names.len(), 8);
    }
}
