//! `go.mod` parsing.
//!
//! Only the directives that matter for vendoring are modelled; the rest are
//! validated for shape and otherwise ignored.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::errors::{Result, VendorError};
use crate::core::syntax::{parse_directives, Entry, Token};
use crate::util::hash::sha256_sri;

/// Name of the module descriptor.
pub const GO_MOD_FILE: &str = "go.mod";

/// A `require` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Require {
    pub path: String,
    pub version: String,
    pub indirect: bool,
}

/// A `replace` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub old_path: String,
    pub old_version: Option<String>,
    pub new_path: String,
    pub new_version: Option<String>,
    /// The replacement is a directory on disk rather than a module.
    pub is_local: bool,
}

/// A parsed `go.mod` file.
#[derive(Debug, Clone)]
pub struct GoModFile {
    path: PathBuf,
    dir: PathBuf,
    content: Vec<u8>,
    hash: String,
    module_path: String,
    go_version: Option<String>,
    toolchain: Option<String>,
    requires: Vec<Require>,
    replaces: Vec<Replacement>,
    tools: Vec<String>,
}

impl GoModFile {
    /// Read and parse the `go.mod` at `path`.
    pub fn parse(path: &Path) -> Result<Self> {
        let content = fs::read(path).map_err(|source| VendorError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(path, content)
    }

    /// Parse `content` as if it had been read from `path`.
    pub fn from_bytes(path: &Path, content: Vec<u8>) -> Result<Self> {
        let src = std::str::from_utf8(&content)
            .map_err(|_| VendorError::parse(path, 0, "file is not valid UTF-8"))?;

        let mut module_path = None;
        let mut go_version = None;
        let mut toolchain = None;
        let mut requires = Vec::new();
        let mut replaces = Vec::new();
        let mut tools = Vec::new();

        for directive in parse_directives(path, src)? {
            for entry in &directive.entries {
                match directive.verb.as_str() {
                    "module" => {
                        let value = single_arg(path, entry, "module")?;
                        if module_path.replace(value).is_some() {
                            return Err(VendorError::parse(
                                path,
                                entry.line,
                                "repeated module statement",
                            ));
                        }
                    }
                    "go" => go_version = Some(single_arg(path, entry, "go")?),
                    "toolchain" => toolchain = Some(single_arg(path, entry, "toolchain")?),
                    "require" => requires.push(parse_require(path, entry)?),
                    "replace" => replaces.push(parse_replace(path, entry)?),
                    "tool" => tools.push(single_arg(path, entry, "tool")?),
                    "exclude" => {
                        if entry.words(path)?.len() != 2 {
                            return Err(VendorError::parse(
                                path,
                                entry.line,
                                "usage: exclude module/path v1.2.3",
                            ));
                        }
                    }
                    "ignore" => {
                        single_arg(path, entry, "ignore")?;
                    }
                    "godebug" | "retract" => {}
                    other => {
                        return Err(VendorError::parse(
                            path,
                            entry.line,
                            format!("unknown directive: {}", other),
                        ))
                    }
                }
            }
        }

        let module_path = module_path
            .ok_or_else(|| VendorError::parse(path, 0, "no module directive found"))?;

        let hash = sha256_sri(&content);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();

        Ok(GoModFile {
            path: path.to_path_buf(),
            dir,
            content,
            hash,
            module_path,
            go_version,
            toolchain,
            requires,
            replaces,
            tools,
        })
    }

    /// Path of the `go.mod` file itself.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory containing the `go.mod`.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Raw file contents.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// SRI hash of the raw file contents.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn module_path(&self) -> &str {
        &self.module_path
    }

    pub fn go_version(&self) -> Option<&str> {
        self.go_version.as_deref()
    }

    pub fn toolchain(&self) -> Option<&str> {
        self.toolchain.as_deref()
    }

    pub fn requires(&self) -> &[Require] {
        &self.requires
    }

    pub fn tools(&self) -> &[String] {
        &self.tools
    }

    /// A module without requirements has nothing to vendor.
    pub fn has_dependencies(&self) -> bool {
        !self.requires.is_empty()
    }

    /// Version this module requires of `path`, if any.
    pub fn required_version(&self, path: &str) -> Option<&str> {
        self.requires
            .iter()
            .find(|r| r.path == path)
            .map(|r| r.version.as_str())
    }

    /// Replace directives keyed by their replacement path.
    pub fn replacements(&self) -> BTreeMap<&str, &Replacement> {
        self.replaces
            .iter()
            .map(|r| (r.new_path.as_str(), r))
            .collect()
    }

    /// Replace directives pointing at directories on disk.
    pub fn local_replacements(&self) -> impl Iterator<Item = &Replacement> {
        self.replaces.iter().filter(|r| r.is_local)
    }
}

/// Read the `go` directive of a dependency's own `go.mod`.
///
/// Dependencies with unreadable or odd `go.mod` files simply carry no
/// version; this never fails.
pub fn read_go_version(path: &Path) -> Option<String> {
    let content = fs::read(path).ok()?;
    match GoModFile::from_bytes(path, content) {
        Ok(modfile) => modfile.go_version,
        Err(e) => {
            tracing::debug!("ignoring go version of {}: {}", path.display(), e);
            None
        }
    }
}

/// Whether a replacement target names a directory rather than a module.
pub fn is_local_path(path: &str) -> bool {
    path.starts_with('.')
        || path.starts_with('/')
        || path.starts_with('\\')
        || (path.len() >= 3
            && path.as_bytes()[0].is_ascii_alphabetic()
            && path.as_bytes()[1] == b':'
            && matches!(path.as_bytes()[2], b'\\' | b'/'))
}

fn single_arg(path: &Path, entry: &Entry, verb: &str) -> Result<String> {
    match entry.words(path)?.as_slice() {
        [value] => Ok(value.to_string()),
        _ => Err(VendorError::parse(
            path,
            entry.line,
            format!("{} directive expects exactly one argument", verb),
        )),
    }
}

fn parse_require(path: &Path, entry: &Entry) -> Result<Require> {
    match entry.words(path)?.as_slice() {
        [module, version] => Ok(Require {
            path: module.to_string(),
            version: version.to_string(),
            indirect: entry
                .comment
                .as_deref()
                .map(|c| c == "indirect" || c.starts_with("indirect;"))
                .unwrap_or(false),
        }),
        _ => Err(VendorError::parse(
            path,
            entry.line,
            "usage: require module/path v1.2.3",
        )),
    }
}

fn parse_replace(path: &Path, entry: &Entry) -> Result<Replacement> {
    let usage = || {
        VendorError::parse(
            path,
            entry.line,
            "usage: replace module/path [v1.2.3] => other/module v1.4 | replace module/path [v1.2.3] => ../local/directory",
        )
    };

    let arrow = entry
        .args
        .iter()
        .position(|t| *t == Token::Arrow)
        .ok_or_else(usage)?;

    let side = |tokens: &[Token]| -> Result<Vec<String>> {
        tokens
            .iter()
            .map(|t| match t {
                Token::Word(w) => Ok(w.clone()),
                _ => Err(usage()),
            })
            .collect()
    };
    let old = side(&entry.args[..arrow])?;
    let new = side(&entry.args[arrow + 1..])?;

    let (old_path, old_version) = match old.as_slice() {
        [p] => (p.clone(), None),
        [p, v] => (p.clone(), Some(v.clone())),
        _ => return Err(usage()),
    };
    let (new_path, new_version) = match new.as_slice() {
        [p] => (p.clone(), None),
        [p, v] => (p.clone(), Some(v.clone())),
        _ => return Err(usage()),
    };

    let is_local = is_local_path(&new_path);
    if is_local && new_version.is_some() {
        return Err(VendorError::parse(
            path,
            entry.line,
            "replacement directory path must not have a version",
        ));
    }
    if !is_local && new_version.is_none() {
        return Err(VendorError::parse(
            path,
            entry.line,
            "replacement module without version must be a directory path (rooted or starting with ./ or ../)",
        ));
    }

    Ok(Replacement {
        old_path,
        old_version,
        new_path,
        new_version,
        is_local,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const GO_MOD: &str = r#"module example.com/app

go 1.22.1

toolchain go1.23.0

require (
	github.com/spf13/cobra v1.8.0
	github.com/inconshreveable/mousetrap v1.1.0 // indirect
)

require golang.org/x/mod v0.17.0

replace github.com/spf13/cobra => github.com/fork/cobra v1.8.1

replace example.com/lib v1.0.0 => ../lib

exclude golang.org/x/net v0.1.0

retract [v0.1.0, v0.2.0]

tool golang.org/x/tools/cmd/stringer
"#;

    fn parse(src: &str) -> Result<GoModFile> {
        GoModFile::from_bytes(Path::new("app/go.mod"), src.as_bytes().to_vec())
    }

    #[test]
    fn test_parse_full_module() {
        let m = parse(GO_MOD).unwrap();

        assert_eq!(m.module_path(), "example.com/app");
        assert_eq!(m.go_version(), Some("1.22.1"));
        assert_eq!(m.toolchain(), Some("go1.23.0"));
        assert_eq!(m.dir(), Path::new("app"));
        assert!(m.has_dependencies());
        assert_eq!(m.requires().len(), 3);
        assert!(!m.requires()[0].indirect);
        assert!(m.requires()[1].indirect);
        assert_eq!(m.required_version("golang.org/x/mod"), Some("v0.17.0"));
        assert_eq!(m.tools(), ["golang.org/x/tools/cmd/stringer"]);
    }

    #[test]
    fn test_replacements_keyed_by_new_path() {
        let m = parse(GO_MOD).unwrap();
        let repls = m.replacements();

        let fork = repls["github.com/fork/cobra"];
        assert_eq!(fork.old_path, "github.com/spf13/cobra");
        assert_eq!(fork.new_version.as_deref(), Some("v1.8.1"));
        assert!(!fork.is_local);

        let local: Vec<_> = m.local_replacements().collect();
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].old_path, "example.com/lib");
        assert_eq!(local[0].old_version.as_deref(), Some("v1.0.0"));
        assert_eq!(local[0].new_path, "../lib");
    }

    #[test]
    fn test_hash_is_over_raw_bytes() {
        let a = parse("module example.com/app\n").unwrap();
        let b = parse("module example.com/app\n\n").unwrap();
        assert!(a.hash().starts_with("sha256-"));
        assert_ne!(a.hash(), b.hash());
        assert_eq!(a.hash(), sha256_sri(b"module example.com/app\n"));
    }

    #[test]
    fn test_module_without_requirements_has_no_dependencies() {
        let m = parse("module example.com/app\n\ngo 1.22\n").unwrap();
        assert!(!m.has_dependencies());
    }

    #[test]
    fn test_missing_module_directive() {
        let err = parse("go 1.22\n").unwrap_err();
        assert!(err.to_string().contains("no module directive"));
    }

    #[test]
    fn test_unknown_directive() {
        let err = parse("module example.com/app\nfrobnicate x\n").unwrap_err();
        assert!(matches!(err, VendorError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_malformed_require() {
        let err = parse("module example.com/app\nrequire example.com/a\n").unwrap_err();
        assert!(err.to_string().contains("usage: require"));
    }

    #[test]
    fn test_local_replacement_with_version_is_error() {
        let err = parse("module example.com/app\nreplace example.com/a => ../a v1.0.0\n").unwrap_err();
        assert!(err.to_string().contains("must not have a version"));
    }

    #[test]
    fn test_is_local_path() {
        assert!(is_local_path("./lib"));
        assert!(is_local_path("../lib"));
        assert!(is_local_path("/abs/lib"));
        assert!(is_local_path("C:\\lib"));
        assert!(!is_local_path("github.com/fork/lib"));
    }

    #[test]
    fn test_parse_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(GO_MOD_FILE);
        fs::write(&path, GO_MOD).unwrap();

        let m = GoModFile::parse(&path).unwrap();
        assert_eq!(m.dir(), tmp.path());
        assert_eq!(m.content(), GO_MOD.as_bytes());
    }

    #[test]
    fn test_parse_missing_file_is_read_error() {
        let tmp = TempDir::new().unwrap();
        let err = GoModFile::parse(&tmp.path().join(GO_MOD_FILE)).unwrap_err();
        assert!(matches!(err, VendorError::Read { .. }));
    }

    #[test]
    fn test_read_go_version_is_lenient() {
        let tmp = TempDir::new().unwrap();
        let good = tmp.path().join("good.mod");
        let bad = tmp.path().join("bad.mod");
        fs::write(&good, "module example.com/dep\n\ngo 1.21\n").unwrap();
        fs::write(&bad, "this is not a go.mod\n").unwrap();

        assert_eq!(read_go_version(&good).as_deref(), Some("1.21"));
        assert_eq!(read_go_version(&bad), None);
        assert_eq!(read_go_version(&tmp.path().join("absent")), None);
    }
}
