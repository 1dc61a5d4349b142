//! `go.work` parsing and workspace descriptors.
//!
//! A workspace is identified by the contents of its members' `go.mod`
//! files, not by `go.work` itself, so a workspace rebuilt from the
//! `[workspace]` section of a manifest hashes the same as the live one.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::core::errors::{Result, VendorError};
use crate::core::manifest::WorkspaceSection;
use crate::core::modfile::{GoModFile, GO_MOD_FILE};
use crate::core::syntax::parse_directives;
use crate::util::hash::sha256_sri;

/// Name of the workspace descriptor.
pub const GO_WORK_FILE: &str = "go.work";

/// Where a workspace description came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkspaceSource {
    /// A live `go.work` file.
    WorkFile,
    /// The `[workspace]` section of an existing manifest.
    Manifest,
}

/// A Go workspace and its parsed members.
#[derive(Debug, Clone)]
pub struct GoWorkFile {
    path: PathBuf,
    dir: PathBuf,
    modules: Vec<String>,
    go_version: Option<String>,
    toolchain: Option<String>,
    members: Vec<GoModFile>,
    hash: String,
    source: WorkspaceSource,
}

impl GoWorkFile {
    /// Read and parse the `go.work` at `path`, along with every member.
    pub fn parse(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| VendorError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut modules = Vec::new();
        let mut go_version = None;
        let mut toolchain = None;

        for directive in parse_directives(path, &content)? {
            for entry in &directive.entries {
                let words = entry.words(path).ok();
                match (directive.verb.as_str(), words.as_deref()) {
                    ("use", Some([dir])) => modules.push(normalize_use_path(dir)),
                    ("go", Some([v])) => go_version = Some(v.to_string()),
                    ("toolchain", Some([v])) => toolchain = Some(v.to_string()),
                    // Workspace-level replaces and godebug settings do not
                    // change what each member resolves with GOWORK=off.
                    ("replace", _) | ("godebug", _) => {}
                    ("use" | "go" | "toolchain", _) => {
                        return Err(VendorError::parse(
                            path,
                            entry.line,
                            format!("{} directive expects exactly one argument", directive.verb),
                        ))
                    }
                    (other, _) => {
                        return Err(VendorError::parse(
                            path,
                            entry.line,
                            format!("unknown directive: {}", other),
                        ))
                    }
                }
            }
        }

        Self::with_members(
            path,
            modules,
            go_version,
            toolchain,
            WorkspaceSource::WorkFile,
        )
    }

    /// Rebuild a workspace from a manifest's `[workspace]` section.
    ///
    /// Used when the workspace is vendored without a committed `go.work`.
    pub fn from_manifest(manifest_path: &Path, section: &WorkspaceSection) -> Result<Self> {
        let modules = section
            .modules
            .iter()
            .map(|m| normalize_use_path(m))
            .collect();
        Self::with_members(
            manifest_path,
            modules,
            section.go.clone(),
            section.toolchain.clone(),
            WorkspaceSource::Manifest,
        )
    }

    fn with_members(
        path: &Path,
        modules: Vec<String>,
        go_version: Option<String>,
        toolchain: Option<String>,
        source: WorkspaceSource,
    ) -> Result<Self> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();

        let members = modules
            .iter()
            .map(|m| GoModFile::parse(&dir.join(m).join(GO_MOD_FILE)))
            .collect::<Result<Vec<_>>>()?;

        let hash = combined_hash(&members);

        Ok(GoWorkFile {
            path: path.to_path_buf(),
            dir,
            modules,
            go_version,
            toolchain,
            members,
            hash,
            source,
        })
    }

    /// Path of the descriptor (`go.work` or the manifest it was rebuilt from).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Workspace root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Member directories as written, relative to the root (`./a`).
    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    /// Parsed members, in `use` order.
    pub fn members(&self) -> &[GoModFile] {
        &self.members
    }

    pub fn go_version(&self) -> Option<&str> {
        self.go_version.as_deref()
    }

    pub fn toolchain(&self) -> Option<&str> {
        self.toolchain.as_deref()
    }

    pub fn source(&self) -> WorkspaceSource {
        self.source
    }

    /// Absolute-or-relative directories of every member.
    pub fn module_dirs(&self) -> Vec<PathBuf> {
        self.modules.iter().map(|m| self.dir.join(m)).collect()
    }

    /// Module paths declared by the members.
    pub fn member_paths(&self) -> BTreeSet<&str> {
        self.members.iter().map(|m| m.module_path()).collect()
    }

    /// Member directory for a module path, relative to the root.
    pub fn member_dir(&self, module_path: &str) -> Option<&str> {
        self.members
            .iter()
            .zip(&self.modules)
            .find(|(m, _)| m.module_path() == module_path)
            .map(|(_, dir)| dir.as_str())
    }

    /// Whether any member requires a module outside the workspace.
    pub fn has_dependencies(&self) -> bool {
        let internal = self.member_paths();
        self.members
            .iter()
            .flat_map(|m| m.requires())
            .any(|r| !internal.contains(r.path.as_str()))
    }

    /// The `[workspace]` section describing this workspace.
    pub fn workspace_section(&self) -> WorkspaceSection {
        WorkspaceSection {
            modules: self.modules.clone(),
            go: self.go_version.clone(),
            toolchain: self.toolchain.clone(),
        }
    }
}

/// Hash over the sorted member `go.mod` contents.
fn combined_hash(members: &[GoModFile]) -> String {
    let mut contents: Vec<&[u8]> = members.iter().map(|m| m.content()).collect();
    contents.sort();
    sha256_sri(&contents.concat())
}

/// Normalise a `use` path to the `./dir` form written to manifests.
pub fn normalize_use_path(dir: &str) -> String {
    let path = Path::new(dir);
    if path.is_absolute() {
        return dir.to_string();
    }

    let parts: Vec<String> = path
        .components()
        .filter_map(|c| match c {
            Component::CurDir => None,
            other => Some(other.as_os_str().to_string_lossy().into_owned()),
        })
        .collect();

    if parts.is_empty() {
        ".".to_string()
    } else if parts[0] == ".." {
        parts.join("/")
    } else {
        format!("./{}", parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_member(root: &Path, dir: &str, content: &str) {
        fs::create_dir_all(root.join(dir)).unwrap();
        fs::write(root.join(dir).join(GO_MOD_FILE), content).unwrap();
    }

    fn workspace(root: &Path) {
        write_member(
            root,
            "api",
            "module example.com/api\n\ngo 1.22\n\nrequire example.com/lib v0.0.0\n",
        );
        write_member(
            root,
            "lib",
            "module example.com/lib\n\ngo 1.22\n\nrequire github.com/google/uuid v1.6.0\n",
        );
    }

    #[test]
    fn test_parse_go_work() {
        let tmp = TempDir::new().unwrap();
        workspace(tmp.path());
        let path = tmp.path().join(GO_WORK_FILE);
        fs::write(&path, "go 1.22.0\n\ntoolchain go1.23.1\n\nuse (\n\t./api\n\tlib\n)\n").unwrap();

        let ws = GoWorkFile::parse(&path).unwrap();
        assert_eq!(ws.modules(), ["./api", "./lib"]);
        assert_eq!(ws.go_version(), Some("1.22.0"));
        assert_eq!(ws.toolchain(), Some("go1.23.1"));
        assert_eq!(ws.members().len(), 2);
        assert_eq!(ws.member_dir("example.com/lib"), Some("./lib"));
        assert_eq!(ws.source(), WorkspaceSource::WorkFile);
        assert!(ws.has_dependencies());
    }

    #[test]
    fn test_hash_is_independent_of_use_order() {
        let tmp = TempDir::new().unwrap();
        workspace(tmp.path());
        let a = tmp.path().join("a.work");
        let b = tmp.path().join("b.work");
        fs::write(&a, "go 1.22\nuse ./api\nuse ./lib\n").unwrap();
        fs::write(&b, "go 1.22\nuse (\n./lib\n./api\n)\n").unwrap();

        let wa = GoWorkFile::parse(&a).unwrap();
        let wb = GoWorkFile::parse(&b).unwrap();
        assert_eq!(wa.hash(), wb.hash());
    }

    #[test]
    fn test_hash_tracks_member_changes() {
        let tmp = TempDir::new().unwrap();
        workspace(tmp.path());
        let path = tmp.path().join(GO_WORK_FILE);
        fs::write(&path, "go 1.22\nuse ./api\nuse ./lib\n").unwrap();
        let before = GoWorkFile::parse(&path).unwrap();

        write_member(
            tmp.path(),
            "lib",
            "module example.com/lib\n\ngo 1.22\n\nrequire github.com/google/uuid v1.6.1\n",
        );
        let after = GoWorkFile::parse(&path).unwrap();
        assert_ne!(before.hash(), after.hash());
    }

    #[test]
    fn test_manifest_reconstruction_matches_live_hash() {
        let tmp = TempDir::new().unwrap();
        workspace(tmp.path());
        let path = tmp.path().join(GO_WORK_FILE);
        fs::write(&path, "go 1.22\nuse ./api\nuse ./lib\n").unwrap();
        let live = GoWorkFile::parse(&path).unwrap();

        let section = live.workspace_section();
        let rebuilt =
            GoWorkFile::from_manifest(&tmp.path().join("govendor.toml"), &section).unwrap();

        assert_eq!(rebuilt.hash(), live.hash());
        assert_eq!(rebuilt.source(), WorkspaceSource::Manifest);
        assert_eq!(rebuilt.dir(), live.dir());
    }

    #[test]
    fn test_internal_only_requirements_are_not_dependencies() {
        let tmp = TempDir::new().unwrap();
        write_member(
            tmp.path(),
            "api",
            "module example.com/api\nrequire example.com/lib v0.0.0\n",
        );
        write_member(tmp.path(), "lib", "module example.com/lib\n");
        let path = tmp.path().join(GO_WORK_FILE);
        fs::write(&path, "use ./api\nuse ./lib\n").unwrap();

        assert!(!GoWorkFile::parse(&path).unwrap().has_dependencies());
    }

    #[test]
    fn test_missing_member_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(GO_WORK_FILE);
        fs::write(&path, "use ./missing\n").unwrap();

        assert!(matches!(
            GoWorkFile::parse(&path).unwrap_err(),
            VendorError::Read { .. }
        ));
    }

    #[test]
    fn test_normalize_use_path() {
        assert_eq!(normalize_use_path("api"), "./api");
        assert_eq!(normalize_use_path("./api/"), "./api");
        assert_eq!(normalize_use_path("."), ".");
        assert_eq!(normalize_use_path("../shared"), "../shared");
        assert_eq!(normalize_use_path("./a/b"), "./a/b");
    }
}
