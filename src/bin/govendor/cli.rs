//! CLI definitions using clap.

use std::path::PathBuf;

use clap::Parser;
use govendor::util::ColorChoice;

/// govendor - Reproducible vendor manifests for Go modules and workspaces
#[derive(Parser)]
#[command(name = "govendor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directories or go.mod/go.work files to process (default: .)
    #[arg(value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Check manifests for drift instead of writing them
    #[arg(short, long)]
    pub check: bool,

    /// Regenerate manifests even when up to date
    #[arg(short, long, conflicts_with = "check")]
    pub force: bool,

    /// Scan PATHs recursively for go.mod and go.work files
    #[arg(short, long)]
    pub recursive: bool,

    /// Maximum directory depth for --recursive (0 = unlimited)
    #[arg(short, long, value_name = "N", requires = "recursive")]
    pub depth: Option<usize>,

    /// Vendor the workspace enclosing each PATH
    #[arg(short, long, conflicts_with = "recursive")]
    pub workspace: bool,

    /// Fail --check on any govendor version mismatch
    #[arg(short, long, requires = "check")]
    pub strict: bool,

    /// Extra os/arch platform to resolve (repeatable, comma separated)
    #[arg(short = 'p', long = "include-platform", value_name = "OS/ARCH")]
    pub include_platforms: Vec<String>,

    /// Version recorded in and expected from govendor.toml
    #[arg(long, value_name = "VERSION")]
    pub vendored_version: Option<String>,

    /// Number of modules hashed concurrently
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Path to the go binary
    #[arg(long, value_name = "PATH", env = "GOVENDOR_GO")]
    pub go: Option<PathBuf>,

    /// Coloring: auto, always, never
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    /// Only report failures
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Print shell completions and exit
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<clap_complete::Shell>,
}

impl Cli {
    /// `v` + this binary's version unless overridden.
    pub fn vendored_version(&self) -> String {
        self.vendored_version
            .clone()
            .unwrap_or_else(|| format!("v{}", env!("CARGO_PKG_VERSION")))
    }
}
