//! Per-target outcomes.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::manifest::MANIFEST_FILE;
use crate::core::workfile::GO_WORK_FILE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VendorStatus {
    Ok,
    Generated,
    Drift,
    Missing,
    Skipped,
    Warning,
    Error,
}

impl VendorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VendorStatus::Ok => "ok",
            VendorStatus::Generated => "generated",
            VendorStatus::Drift => "drift",
            VendorStatus::Missing => "missing",
            VendorStatus::Skipped => "skipped",
            VendorStatus::Warning => "warning",
            VendorStatus::Error => "error",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self,
            VendorStatus::Ok | VendorStatus::Generated | VendorStatus::Skipped | VendorStatus::Warning
        )
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }
}

impl fmt::Display for VendorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorResult {
    pub path: PathBuf,
    pub status: VendorStatus,
    pub message: String,
}

impl VendorResult {
    pub fn new(path: impl Into<PathBuf>, status: VendorStatus, message: impl Into<String>) -> Self {
        VendorResult {
            path: path.into(),
            status,
            message: message.into(),
        }
    }

    pub fn ok(path: impl Into<PathBuf>) -> Self {
        Self::new(path, VendorStatus::Ok, format!("{} is up to date", MANIFEST_FILE))
    }

    pub fn generated(path: impl Into<PathBuf>, count: usize) -> Self {
        Self::new(
            path,
            VendorStatus::Generated,
            format!("generated {} with {} dependencies", MANIFEST_FILE, count),
        )
    }

    pub fn schema_mismatch(path: impl Into<PathBuf>, found: i64, current: i64) -> Self {
        Self::new(
            path,
            VendorStatus::Drift,
            format!(
                "{} uses schema v{}, current govendor requires schema v{}, run 'govendor' to regenerate",
                MANIFEST_FILE, found, current
            ),
        )
    }

    pub fn missing(path: impl Into<PathBuf>) -> Self {
        Self::new(
            path,
            VendorStatus::Missing,
            format!("{} not found, run govendor to generate", MANIFEST_FILE),
        )
    }

    pub fn skipped(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let message = format!("{} has no external dependencies", file_kind(&path));
        Self::new(path, VendorStatus::Skipped, message)
    }

    pub fn error(path: impl Into<PathBuf>, err: impl fmt::Display) -> Self {
        Self::new(path, VendorStatus::Error, err.to_string())
    }

    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let message = format!("{} does not exist, check path", file_kind(&path));
        Self::new(path, VendorStatus::Error, message)
    }

    pub fn drift(path: impl Into<PathBuf>, reasons: &[String]) -> Self {
        Self::new(
            path,
            VendorStatus::Drift,
            reason_tree("drift detected, run 'govendor' to regenerate", reasons),
        )
    }

    pub fn warning(path: impl Into<PathBuf>, reasons: &[String]) -> Self {
        Self::new(
            path,
            VendorStatus::Warning,
            reason_tree(&format!("{} is up to date", MANIFEST_FILE), reasons),
        )
    }
}

/// `go.work` for workspace descriptors, `go.mod` otherwise.
fn file_kind(path: &Path) -> &'static str {
    if path.file_name().and_then(|n| n.to_str()) == Some(GO_WORK_FILE) {
        "go.work"
    } else {
        "go.mod"
    }
}

/// A header line followed by one tree branch per reason.
pub fn reason_tree(header: &str, reasons: &[String]) -> String {
    let mut out = header.to_string();
    for (i, reason) in reasons.iter().enumerate() {
        let branch = if i + 1 == reasons.len() { "└── " } else { "├── " };
        out.push_str("\n  ");
        out.push_str(branch);
        out.push_str(reason);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        for status in [
            VendorStatus::Ok,
            VendorStatus::Generated,
            VendorStatus::Skipped,
            VendorStatus::Warning,
        ] {
            assert!(status.is_success(), "{status}");
        }
        for status in [VendorStatus::Drift, VendorStatus::Missing, VendorStatus::Error] {
            assert!(status.is_failure(), "{status}");
        }
    }

    #[test]
    fn test_messages() {
        assert_eq!(VendorResult::ok("go.mod").message, "govendor.toml is up to date");
        assert_eq!(
            VendorResult::generated("go.mod", 3).message,
            "generated govendor.toml with 3 dependencies"
        );
        assert_eq!(
            VendorResult::skipped("a/go.work").message,
            "go.work has no external dependencies"
        );
        assert_eq!(
            VendorResult::not_found("a/go.mod").message,
            "go.mod does not exist, check path"
        );
        assert_eq!(
            VendorResult::schema_mismatch("go.mod", 1, 2).message,
            "govendor.toml uses schema v1, current govendor requires schema v2, run 'govendor' to regenerate"
        );
    }

    #[test]
    fn test_reason_tree() {
        let reasons = vec!["first".to_string(), "second".to_string()];
        assert_eq!(
            reason_tree("header", &reasons),
            "header\n  ├── first\n  └── second"
        );
        assert_eq!(reason_tree("header", &[]), "header");

        let drift = VendorResult::drift("go.mod", &reasons[..1]);
        assert_eq!(
            drift.message,
            "drift detected, run 'govendor' to regenerate\n  └── first"
        );
        assert_eq!(drift.status, VendorStatus::Drift);
    }
}
