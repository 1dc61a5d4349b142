//! Error types shared by the resolution and vendoring engine.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while discovering, resolving, hashing or vendoring a target.
///
/// Everything except [`VendorError::Discovery`] and
/// [`VendorError::TargetsFailed`] is scoped to a single target and ends up
/// as that target's `error` result.
#[derive(Debug, Error)]
pub enum VendorError {
    /// Nothing to process at the requested paths.
    #[error("no go.mod file found in {}", .path.display())]
    Discovery { path: PathBuf },

    /// Walking a directory tree failed part way.
    #[error("failed to scan {}: {source}", .path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to parse {}:{line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An external `go` invocation failed; `stderr` carries the tool's own
    /// diagnostic text.
    #[error("`{command}` failed{}: {}", exit_suffix(.code), .stderr.trim())]
    Execution {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    /// A `go` invocation succeeded but printed something we cannot decode.
    #[error("unexpected output from `{command}`: {message}")]
    Output { command: String, message: String },

    #[error("failed to hash {}: {source}", .path.display())]
    Hash {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {}: {message}", .path.display())]
    ManifestCodec { path: PathBuf, message: String },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported platform(s): {}", .platforms.join(", "))]
    Platform { platforms: Vec<String> },

    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Aggregate sentinel returned once every target has been reported.
    #[error("{failed} of {total} target(s) failed to vendor")]
    TargetsFailed { failed: usize, total: usize },
}

fn exit_suffix(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!(" with exit code {}", code),
        None => String::new(),
    }
}

impl VendorError {
    /// Build a parse error for `path` at 1-based `line`.
    pub fn parse(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        VendorError::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    pub fn codec(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        VendorError::ManifestCodec {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error aborts the whole run rather than a single target.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            VendorError::Discovery { .. } | VendorError::TargetsFailed { .. }
        )
    }
}

pub type Result<T, E = VendorError> = std::result::Result<T, E>;
