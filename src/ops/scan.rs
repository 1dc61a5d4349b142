//! Finding Go descriptors on disk.

use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use rayon::prelude::*;
use walkdir::{DirEntry, WalkDir};

use crate::core::errors::{Result, VendorError};
use crate::core::manifest::MANIFEST_FILE;
use crate::core::modfile::GO_MOD_FILE;
use crate::core::workfile::GO_WORK_FILE;

/// Directories never descended into.
pub const SKIP_DIRS: &[&str] = &[
    "__pycache__",
    ".cache",
    ".devenv",
    ".direnv",
    ".git",
    ".gradle",
    ".idea",
    ".mvn",
    ".terraform",
    ".venv",
    ".vscode",
    ".zed",
    "bin",
    "build",
    "dist",
    "node_modules",
    "obj",
    "out",
    "packages",
    "result",
    "target",
    "testdata",
    "vendor",
    "venv",
    "zig-cache",
    "zig-out",
];

/// Recursive search for `go.mod` and `go.work` files.
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    max_depth: usize,
}

impl Scanner {
    /// `max_depth` of 0 means unlimited; 1 only looks at each root's own
    /// entries.
    pub fn new(max_depth: usize) -> Self {
        Scanner { max_depth }
    }

    /// Scan every root concurrently. The result is unordered.
    pub fn scan(&self, roots: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let found = Mutex::new(Vec::new());

        roots.par_iter().try_for_each(|root| {
            let paths = self.scan_root(root)?;
            tracing::debug!("{}: found {} descriptor(s)", root.display(), paths.len());
            found
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .extend(paths);
            Ok::<_, VendorError>(())
        })?;

        Ok(found
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner()))
    }

    fn scan_root(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut walker = WalkDir::new(root).follow_links(false);
        if self.max_depth > 0 {
            walker = walker.max_depth(self.max_depth);
        }

        let mut found = Vec::new();
        for entry in walker.into_iter().filter_entry(|e| !is_skipped(e)) {
            let entry = entry.map_err(|source| VendorError::Scan {
                path: root.to_path_buf(),
                source,
            })?;
            if entry.file_type().is_file() && is_descriptor(entry.file_name().to_str()) {
                found.push(entry.into_path());
            }
        }
        Ok(found)
    }
}

fn is_skipped(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIP_DIRS.contains(&name))
}

fn is_descriptor(name: Option<&str>) -> bool {
    matches!(name, Some(GO_MOD_FILE) | Some(GO_WORK_FILE))
}

/// Look for a `govendor.toml` at or above `path`.
///
/// `path` may name a directory or one of the descriptor files. The search
/// climbs at most as many levels as `path` has components, so a relative
/// path never escapes above the directory it is relative to.
pub fn find_workspace_manifest(path: &Path) -> Option<PathBuf> {
    let start = match path.file_name().and_then(|n| n.to_str()) {
        Some(GO_MOD_FILE) | Some(GO_WORK_FILE) | Some(MANIFEST_FILE) => {
            path.parent().unwrap_or(Path::new(""))
        }
        _ => path,
    };

    let levels = start
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .count();

    let mut current = if start.is_absolute() {
        start.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(start)
    };

    for depth in 0..=levels {
        let candidate = current.join(MANIFEST_FILE);
        if candidate.is_file() {
            tracing::debug!("found workspace manifest {} ({} up)", candidate.display(), depth);
            return Some(candidate);
        }
        if !current.pop() {
            break;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "module example.com/x\n").unwrap();
        path
    }

    fn sorted(mut paths: Vec<PathBuf>) -> Vec<PathBuf> {
        paths.sort();
        paths
    }

    #[test]
    fn test_scan_collects_descriptors() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let a = touch(root, "a/go.mod");
        let work = touch(root, "go.work");
        let deep = touch(root, "x/y/z/go.mod");
        touch(root, "a/main.go");

        let found = sorted(Scanner::default().scan(&[root.to_path_buf()]).unwrap());
        assert_eq!(found, sorted(vec![a, work, deep]));
    }

    #[test]
    fn test_scan_prunes_skip_dirs() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let kept = touch(root, "svc/go.mod");
        for dir in ["vendor", "node_modules", ".git", "testdata", "svc/target"] {
            touch(root, &format!("{dir}/go.mod"));
        }

        let found = Scanner::default().scan(&[root.to_path_buf()]).unwrap();
        assert_eq!(found, vec![kept]);
    }

    #[test]
    fn test_scan_root_named_like_skip_dir() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("build");
        let path = touch(&root, "go.mod");

        let found = Scanner::default().scan(&[root]).unwrap();
        assert_eq!(found, vec![path]);
    }

    #[test]
    fn test_scan_depth() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let top = touch(root, "go.mod");
        let one = touch(root, "a/go.mod");
        touch(root, "a/b/go.mod");

        let found = Scanner::new(1).scan(&[root.to_path_buf()]).unwrap();
        assert_eq!(found, vec![top.clone()]);

        let found = sorted(Scanner::new(2).scan(&[root.to_path_buf()]).unwrap());
        assert_eq!(found, sorted(vec![top, one]));
    }

    #[test]
    fn test_scan_multiple_roots() {
        let tmp = TempDir::new().unwrap();
        let a = touch(tmp.path(), "one/go.mod");
        let b = touch(tmp.path(), "two/go.mod");

        let roots = vec![tmp.path().join("one"), tmp.path().join("two")];
        let found = sorted(Scanner::default().scan(&roots).unwrap());
        assert_eq!(found, sorted(vec![a, b]));
    }

    #[test]
    fn test_scan_missing_root_is_error() {
        let tmp = TempDir::new().unwrap();
        let err = Scanner::default()
            .scan(&[tmp.path().join("nope")])
            .unwrap_err();
        assert!(matches!(err, VendorError::Scan { .. }));
    }

    #[test]
    fn test_find_workspace_manifest() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(root, "repo/govendor.toml");
        let module = touch(root, "repo/svc/api/go.mod");

        assert_eq!(
            find_workspace_manifest(&module),
            Some(root.join("repo/govendor.toml"))
        );
        assert_eq!(
            find_workspace_manifest(&root.join("repo/svc/api")),
            Some(root.join("repo/govendor.toml"))
        );
    }

    #[test]
    fn test_find_workspace_manifest_prefers_nearest() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "govendor.toml");
        let module = touch(tmp.path(), "svc/go.mod");
        touch(tmp.path(), "svc/govendor.toml");

        assert_eq!(
            find_workspace_manifest(&module),
            Some(tmp.path().join("svc/govendor.toml"))
        );
    }
}
