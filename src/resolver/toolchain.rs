//! Gateway to the external `go` command.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::errors::{Result, VendorError};
use crate::core::platform::Platform;
use crate::util::process::{find_executable, ProcessBuilder};

/// Default per-invocation timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Captured output of a `go` invocation that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoOutput {
    /// Exit code; `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl GoOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Something that can run `go` subcommands.
///
/// `args` excludes the binary itself.
pub trait Toolchain: Send + Sync {
    /// Run to completion without looking at the exit status. Fails only
    /// when the process cannot be started, waited on, or times out.
    fn output(&self, args: &[&str], dir: &Path, env: &[(&str, &str)]) -> Result<GoOutput>;

    /// Run and return stdout, or [`VendorError::Execution`] carrying stderr
    /// on a non-zero exit.
    fn run(&self, args: &[&str], dir: &Path, env: &[(&str, &str)]) -> Result<String> {
        let out = self.output(args, dir, env)?;
        if out.success() {
            Ok(out.stdout)
        } else {
            Err(execution_error(args, out.code, out.stderr))
        }
    }
}

/// The error reported for a failed `go` invocation.
pub fn execution_error(args: &[&str], code: Option<i32>, stderr: String) -> VendorError {
    VendorError::Execution {
        command: format!("go {}", args.join(" ")),
        code,
        stderr,
    }
}

/// The real `go` binary.
#[derive(Debug, Clone)]
pub struct GoCommand {
    binary: PathBuf,
    timeout: Option<Duration>,
}

impl GoCommand {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        GoCommand {
            binary: binary.into(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    /// Use `binary` if given, else `go` from `PATH`.
    pub fn discover(binary: Option<PathBuf>) -> Self {
        let binary = binary
            .or_else(|| find_executable("go"))
            .unwrap_or_else(|| PathBuf::from("go"));
        tracing::debug!("using go binary {}", binary.display());
        GoCommand::new(binary)
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Toolchain for GoCommand {
    fn output(&self, args: &[&str], dir: &Path, env: &[(&str, &str)]) -> Result<GoOutput> {
        let mut cmd = ProcessBuilder::new(&self.binary)
            .args(args)
            .cwd(dir)
            .timeout(self.timeout);
        for (key, value) in env {
            cmd = cmd.env(key, value);
        }

        tracing::debug!("running `{}` in {}", cmd.display_command(), dir.display());
        let out = cmd.exec()?;
        Ok(GoOutput {
            code: out.status.code(),
            stdout: out.stdout,
            stderr: out.stderr,
        })
    }
}

/// Platforms the toolchain can target, from `go tool dist list`.
pub fn supported_platforms(toolchain: &dyn Toolchain, dir: &Path) -> Result<BTreeSet<Platform>> {
    let out = toolchain.run(&["tool", "dist", "list"], dir, &[])?;
    Ok(out
        .lines()
        .filter_map(|line| line.trim().parse::<Platform>().ok())
        .collect())
}

/// Fail with [`VendorError::Platform`] naming every unsupported platform.
pub fn validate_platforms(
    toolchain: &dyn Toolchain,
    dir: &Path,
    requested: &[Platform],
) -> Result<()> {
    if requested.is_empty() {
        return Ok(());
    }

    let supported = supported_platforms(toolchain, dir)?;
    let unsupported: Vec<String> = requested
        .iter()
        .filter(|p| !supported.contains(*p))
        .map(ToString::to_string)
        .collect();

    if unsupported.is_empty() {
        Ok(())
    } else {
        Err(VendorError::Platform {
            platforms: unsupported,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockToolchain;

    const DIST_LIST: &str = "darwin/amd64\ndarwin/arm64\nfreebsd/amd64\nlinux/amd64\nlinux/riscv64\nwindows/arm64\n";

    #[test]
    fn test_supported_platforms() {
        let go = MockToolchain::new().on("tool dist list", DIST_LIST);
        let platforms = supported_platforms(&go, Path::new(".")).unwrap();
        assert_eq!(platforms.len(), 6);
        assert!(platforms.contains(&Platform::new("linux", "riscv64")));
    }

    #[test]
    fn test_validate_platforms() {
        let go = MockToolchain::new().on("tool dist list", DIST_LIST);
        let ok = [Platform::new("freebsd", "amd64")];
        assert!(validate_platforms(&go, Path::new("."), &ok).is_ok());

        let bad = [Platform::new("plan9", "arm64"), Platform::new("linux", "riscv64")];
        match validate_platforms(&go, Path::new("."), &bad).unwrap_err() {
            VendorError::Platform { platforms } => assert_eq!(platforms, ["plan9/arm64"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validation_is_skipped_without_requests() {
        let go = MockToolchain::new();
        validate_platforms(&go, Path::new("."), &[]).unwrap();
        assert!(go.calls().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_go_command_passes_env_and_dir() {
        let tmp = tempfile::TempDir::new().unwrap();
        let go = GoCommand::new("sh");
        let out = go
            .run(&["-c", "echo $GOWORK"], tmp.path(), &[("GOWORK", "off")])
            .unwrap();
        assert_eq!(out.trim(), "off");
    }

    #[cfg(unix)]
    #[test]
    fn test_go_command_keeps_stdout_on_failure() {
        let tmp = tempfile::TempDir::new().unwrap();
        let go = GoCommand::new("sh");

        let out = go
            .output(&["-c", "echo partial; echo oops >&2; exit 1"], tmp.path(), &[])
            .unwrap();
        assert_eq!(out.code, Some(1));
        assert!(!out.success());
        assert_eq!(out.stdout.trim(), "partial");
        assert_eq!(out.stderr.trim(), "oops");

        match go.run(&["-c", "echo oops >&2; exit 1"], tmp.path(), &[]) {
            Err(VendorError::Execution { code, stderr, .. }) => {
                assert_eq!(code, Some(1));
                assert_eq!(stderr.trim(), "oops");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
