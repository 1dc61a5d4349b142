//! `go mod download -json` output.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::core::errors::{Result, VendorError};
use crate::core::modfile::GoModFile;
use crate::resolver::toolchain::{execution_error, Toolchain};

const DOWNLOAD_ARGS: &[&str] = &["mod", "download", "-json"];

/// One module reported by `go mod download -json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModuleDownload {
    pub path: String,
    #[serde(default)]
    pub version: String,
    /// Extracted module tree in the module cache.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// The module's own `go.mod` in the cache.
    #[serde(default)]
    pub go_mod: Option<PathBuf>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ModuleDownload {
    /// Cache directory, required for hashing.
    pub fn dir(&self) -> Result<&Path> {
        self.dir.as_deref().ok_or_else(|| VendorError::Output {
            command: command_line(),
            message: format!("{}@{} has no Dir", self.path, self.version),
        })
    }
}

/// Download every requirement of `modfile` and return the cache metadata.
///
/// `go mod download -json` reports per-module failures as `Error` fields on
/// stdout and exits non-zero with an empty stderr, so stdout is examined
/// before the exit status.
pub fn download_modules(toolchain: &dyn Toolchain, modfile: &GoModFile) -> Result<Vec<ModuleDownload>> {
    let out = toolchain.output(DOWNLOAD_ARGS, modfile.dir(), &[("GOWORK", "off")])?;
    let decoded = decode_stream(&out.stdout);

    if let Ok(downloads) = &decoded {
        if let Some(err) = first_module_error(downloads, out.code) {
            return Err(err);
        }
    }
    if !out.success() {
        return Err(execution_error(DOWNLOAD_ARGS, out.code, out.stderr));
    }

    let downloads = decoded?;
    tracing::debug!(
        "{}: {} modules downloaded",
        modfile.module_path(),
        downloads.len()
    );
    Ok(downloads)
}

/// Decode the concatenated JSON objects printed by `go mod download -json`.
///
/// An object carrying `Error` fails the whole batch.
pub fn parse_download_output(out: &str) -> Result<Vec<ModuleDownload>> {
    let downloads = decode_stream(out)?;
    match first_module_error(&downloads, None) {
        Some(err) => Err(err),
        None => Ok(downloads),
    }
}

fn decode_stream(out: &str) -> Result<Vec<ModuleDownload>> {
    serde_json::Deserializer::from_str(out)
        .into_iter::<ModuleDownload>()
        .map(|item| {
            item.map_err(|e| VendorError::Output {
                command: command_line(),
                message: e.to_string(),
            })
        })
        .collect()
}

fn first_module_error(downloads: &[ModuleDownload], code: Option<i32>) -> Option<VendorError> {
    downloads.iter().find_map(|d| {
        d.error.as_ref().map(|error| {
            execution_error(
                DOWNLOAD_ARGS,
                code,
                format!("{}@{}: {}", d.path, d.version, error),
            )
        })
    })
}

fn command_line() -> String {
    format!("go {}", DOWNLOAD_ARGS.join(" "))
}
