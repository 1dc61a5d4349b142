//! On-disk fixtures: modules, workspaces and a fake module cache.

use std::fs;
use std::path::Path;

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::core::modfile::{GoModFile, GO_MOD_FILE};
use crate::core::workfile::{GoWorkFile, GO_WORK_FILE};

/// Write `content` to `dir/go.mod` and parse it.
pub fn write_go_mod(dir: &Path, content: &str) -> GoModFile {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(GO_MOD_FILE);
    fs::write(&path, content).unwrap();
    GoModFile::parse(&path).unwrap()
}

/// Write a `go.work` in `dir` using every `(subdir, go.mod content)` pair
/// as a member, and parse it.
pub fn write_workspace(dir: &Path, members: &[(&str, &str)]) -> GoWorkFile {
    let mut work = String::from("go 1.22\n\nuse (\n");
    for (subdir, content) in members {
        write_go_mod(&dir.join(subdir), content);
        work.push_str(&format!("\t./{}\n", subdir));
    }
    work.push_str(")\n");

    let path = dir.join(GO_WORK_FILE);
    fs::write(&path, work).unwrap();
    GoWorkFile::parse(&path).unwrap()
}

/// Populate a module cache under `root` and return the matching
/// `go mod download -json` output.
pub fn fake_module_cache(root: &Path, modules: &[(&str, &str)]) -> String {
    let mut out = String::new();
    for (path, version) in modules {
        let dir = root.join(format!("{}@{}", path, version));
        fs::create_dir_all(&dir).unwrap();
        let go_mod = dir.join(GO_MOD_FILE);
        fs::write(&go_mod, format!("module {}\n\ngo 1.21\n", path)).unwrap();
        fs::write(dir.join("doc.go"), format!("// Package for {}\npackage x\n", path)).unwrap();

        let record = serde_json::json!({
            "Path": path,
            "Version": version,
            "Dir": dir,
            "GoMod": go_mod,
        });
        out.push_str(&serde_json::to_string_pretty(&record).unwrap());
        out.push('\n');
    }
    out
}

/// Small pool for hashing in tests.
pub fn hashing_pool() -> ThreadPool {
    ThreadPoolBuilder::new().num_threads(2).build().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::download::parse_download_output;
    use tempfile::TempDir;

    #[test]
    fn test_fake_module_cache_round_trips_through_parser() {
        let tmp = TempDir::new().unwrap();
        let out = fake_module_cache(tmp.path(), &[("example.com/a", "v1.0.0"), ("example.com/b", "v2.1.0")]);

        let downloads = parse_download_output(&out).unwrap();
        assert_eq!(downloads.len(), 2);
        assert_eq!(downloads[1].path, "example.com/b");
        assert!(downloads[0].dir().unwrap().join("go.mod").is_file());
    }

    #[test]
    fn test_write_workspace() {
        let tmp = TempDir::new().unwrap();
        let ws = write_workspace(
            tmp.path(),
            &[("a", "module example.com/a\n"), ("b", "module example.com/b\n")],
        );
        assert_eq!(ws.modules(), ["./a", "./b"]);
        assert_eq!(ws.members().len(), 2);
    }
}
