//! Test utilities and mocks for govendor unit tests.
//!
//! [`MockToolchain`] stands in for the `go` binary so resolution can be
//! tested without a Go installation or network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use govendor::test_support::{write_go_mod, MockToolchain};
//!
//! #[test]
//! fn test_example() {
//!     let go = MockToolchain::new()
//!         .on_platform("windows", "amd64", "list", "m\tm/windows\n")
//!         .on("list", "m\tm/unix\n");
//!
//!     // Resolve against `go`, then inspect `go.calls()`...
//! }
//! ```

pub mod fixtures;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::core::errors::Result;
use crate::resolver::toolchain::{execution_error, GoOutput, Toolchain};

pub use fixtures::*;

/// Output returned by a mocked `go` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockProcessOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl MockProcessOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        MockProcessOutput {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// A canned response, selected by argument prefix and optionally by
/// platform and working directory.
#[derive(Debug, Clone)]
pub struct CommandExpectation {
    prefix: String,
    platform: Option<(String, String)>,
    dir: Option<PathBuf>,
    output: MockProcessOutput,
}

impl CommandExpectation {
    fn matches(&self, call: &Call) -> bool {
        if !call.args.starts_with(&self.prefix) {
            return false;
        }
        if let Some((os, arch)) = &self.platform {
            if call.env_var("GOOS") != Some(os.as_str()) || call.env_var("GOARCH") != Some(arch.as_str()) {
                return false;
            }
        }
        match &self.dir {
            Some(dir) => call.dir == *dir,
            None => true,
        }
    }
}

/// One recorded invocation.
#[derive(Debug, Clone)]
pub struct Call {
    /// Arguments joined with single spaces, without the binary name.
    pub args: String,
    pub dir: PathBuf,
    pub env: Vec<(String, String)>,
}

impl Call {
    pub fn env_var(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Mock `go` toolchain.
///
/// Expectations are tried in the order they were added; the first match
/// wins. Invocations without a match fail like a non-zero exit.
#[derive(Debug, Default)]
pub struct MockToolchain {
    expectations: Vec<CommandExpectation>,
    calls: Mutex<Vec<Call>>,
}

impl MockToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    fn expect(
        mut self,
        prefix: &str,
        platform: Option<(&str, &str)>,
        dir: Option<&Path>,
        output: MockProcessOutput,
    ) -> Self {
        self.expectations.push(CommandExpectation {
            prefix: prefix.to_string(),
            platform: platform.map(|(os, arch)| (os.to_string(), arch.to_string())),
            dir: dir.map(Path::to_path_buf),
            output,
        });
        self
    }

    /// Answer invocations whose arguments start with `prefix`.
    pub fn on(self, prefix: &str, stdout: &str) -> Self {
        self.expect(prefix, None, None, MockProcessOutput::success(stdout))
    }

    /// Like [`MockToolchain::on`], only for one `GOOS/GOARCH`.
    pub fn on_platform(self, os: &str, arch: &str, prefix: &str, stdout: &str) -> Self {
        self.expect(prefix, Some((os, arch)), None, MockProcessOutput::success(stdout))
    }

    /// Like [`MockToolchain::on`], only when run in `dir`.
    pub fn on_in(self, dir: &Path, prefix: &str, stdout: &str) -> Self {
        self.expect(prefix, None, Some(dir), MockProcessOutput::success(stdout))
    }

    /// Fail invocations whose arguments start with `prefix`.
    pub fn fail(self, prefix: &str, status: i32, stderr: &str) -> Self {
        self.expect(prefix, None, None, MockProcessOutput::failure(status, stderr))
    }

    /// Fail with `stdout` and an empty stderr, the way `go mod download
    /// -json` reports per-module errors.
    pub fn fail_stdout(self, prefix: &str, status: i32, stdout: &str) -> Self {
        let output = MockProcessOutput {
            status,
            stdout: stdout.to_string(),
            stderr: String::new(),
        };
        self.expect(prefix, None, None, output)
    }

    pub fn fail_platform(
        self,
        os: &str,
        arch: &str,
        prefix: &str,
        status: i32,
        stderr: &str,
    ) -> Self {
        self.expect(
            prefix,
            Some((os, arch)),
            None,
            MockProcessOutput::failure(status, stderr),
        )
    }

    /// Every invocation so far, in call order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Toolchain for MockToolchain {
    fn output(&self, args: &[&str], dir: &Path, env: &[(&str, &str)]) -> Result<GoOutput> {
        let call = Call {
            args: args.join(" "),
            dir: dir.to_path_buf(),
            env: env
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        let output = self
            .expectations
            .iter()
            .find(|exp| exp.matches(&call))
            .map(|exp| exp.output.clone());
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(call);

        match output {
            Some(out) => Ok(GoOutput {
                code: Some(out.status),
                stdout: out.stdout,
                stderr: out.stderr,
            }),
            None => Err(execution_error(
                args,
                None,
                "no mock response configured".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::VendorError;

    #[test]
    fn test_first_match_wins() {
        let go = MockToolchain::new()
            .on_platform("windows", "amd64", "list", "windows")
            .on("list", "other");

        let win = [("GOOS", "windows"), ("GOARCH", "amd64")];
        let lin = [("GOOS", "linux"), ("GOARCH", "amd64")];
        assert_eq!(go.run(&["list", "./..."], Path::new("."), &win).unwrap(), "windows");
        assert_eq!(go.run(&["list", "./..."], Path::new("."), &lin).unwrap(), "other");
        assert_eq!(go.calls().len(), 2);
        assert_eq!(go.calls()[1].env_var("GOOS"), Some("linux"));
    }

    #[test]
    fn test_failures_and_unmatched_calls() {
        let go = MockToolchain::new().fail("mod download", 1, "boom");

        match go.run(&["mod", "download", "-json"], Path::new("."), &[]) {
            Err(VendorError::Execution { command, code, stderr }) => {
                assert_eq!(command, "go mod download -json");
                assert_eq!(code, Some(1));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected: {other:?}"),
        }

        assert!(go.run(&["version"], Path::new("."), &[]).is_err());
    }

    #[test]
    fn test_failure_output_keeps_stdout() {
        let go = MockToolchain::new().fail_stdout("mod download", 1, "{}");
        let out = go.output(&["mod", "download"], Path::new("."), &[]).unwrap();
        assert_eq!(out.code, Some(1));
        assert_eq!(out.stdout, "{}");
        assert!(out.stderr.is_empty());
    }

    #[test]
    fn test_dir_filter() {
        let go = MockToolchain::new()
            .on_in(Path::new("/a"), "list", "a")
            .on_in(Path::new("/b"), "list", "b");
        assert_eq!(go.run(&["list"], Path::new("/b"), &[]).unwrap(), "b");
    }
}
