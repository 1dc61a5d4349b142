//! Implementation of `govendor`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;

use crate::core::errors::{Result, VendorError};
use crate::core::manifest::{Manifest, MANIFEST_FILE};
use crate::core::modfile::GO_MOD_FILE;
use crate::core::platform::{resolution_platforms, Platform};
use crate::core::target::VendorTarget;
use crate::core::workfile::{GoWorkFile, WorkspaceSource, GO_WORK_FILE};
use crate::ops::drift::{assess, DriftOptions, Verdict};
use crate::ops::result::VendorResult;
use crate::ops::scan::{find_workspace_manifest, Scanner};
use crate::resolver::toolchain::validate_platforms;
use crate::resolver::{Resolver, Toolchain, DEFAULT_JOBS};
use crate::util::fs::normalize_path;

/// Options for a vendoring run.
#[derive(Debug, Clone)]
pub struct VendorOptions {
    /// Paths to process (empty = current directory)
    pub paths: Vec<PathBuf>,

    /// Report drift instead of writing manifests
    pub check: bool,

    /// Regenerate manifests even when they are up to date
    pub force: bool,

    /// Treat generator version mismatches as drift
    pub strict: bool,

    /// Scan `paths` recursively for descriptors
    pub recursive: bool,

    /// Maximum scan depth (0 = unlimited)
    pub max_depth: usize,

    /// Walk up from `paths` to the enclosing workspace manifest
    pub workspace: bool,

    /// Platforms to resolve in addition to the defaults
    pub include_platforms: Vec<Platform>,

    /// Version recorded in, and expected from, manifests
    pub vendored_version: Option<String>,

    /// Module trees hashed concurrently
    pub jobs: usize,
}

impl Default for VendorOptions {
    fn default() -> Self {
        VendorOptions {
            paths: Vec::new(),
            check: false,
            force: false,
            strict: false,
            recursive: false,
            max_depth: 0,
            workspace: false,
            include_platforms: Vec::new(),
            vendored_version: None,
            jobs: DEFAULT_JOBS,
        }
    }
}

impl VendorOptions {
    fn roots(&self) -> Vec<PathBuf> {
        if self.paths.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            self.paths.clone()
        }
    }

    fn drift(&self) -> DriftOptions<'_> {
        DriftOptions {
            check: self.check,
            strict: self.strict,
            force: self.force,
            vendored_version: self.vendored_version.as_deref(),
            include_platforms: &self.include_platforms,
        }
    }
}

/// Discovered work: descriptors to process and explicit paths that do not
/// exist.
#[derive(Debug, Default)]
struct Discovery {
    targets: Vec<PathBuf>,
    not_found: Vec<PathBuf>,
}

/// Generate or check `govendor.toml` for every target selected by `opts`.
///
/// Returns one result per target, sorted by path. Per-target failures are
/// reported as results; only discovery, platform validation and pool setup
/// fail the call itself.
pub fn vendor(opts: &VendorOptions, toolchain: Arc<dyn Toolchain>) -> Result<Vec<VendorResult>> {
    let roots = opts.roots();
    validate_platforms(toolchain.as_ref(), Path::new("."), &opts.include_platforms)?;

    let discovery = discover(opts, &roots)?;
    tracing::debug!(
        "discovered {} target(s), {} missing path(s)",
        discovery.targets.len(),
        discovery.not_found.len()
    );

    let resolver = Resolver::new(toolchain, opts.jobs)?;
    let drift = opts.drift();

    let mut results: Vec<VendorResult> = discovery
        .targets
        .par_iter()
        .map(|path| process(path, &resolver, opts, &drift))
        .collect();
    results.extend(discovery.not_found.into_iter().map(VendorResult::not_found));
    results.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(results)
}

/// Fail with [`VendorError::TargetsFailed`] if any result is a failure.
pub fn ensure_success(results: &[VendorResult]) -> Result<()> {
    let failed = results.iter().filter(|r| r.status.is_failure()).count();
    if failed == 0 {
        Ok(())
    } else {
        Err(VendorError::TargetsFailed {
            failed,
            total: results.len(),
        })
    }
}

fn process(
    path: &Path,
    resolver: &Resolver,
    opts: &VendorOptions,
    drift: &DriftOptions<'_>,
) -> VendorResult {
    let _span = tracing::debug_span!("target", path = %path.display()).entered();

    let target = match VendorTarget::load(path) {
        Ok(target) => target,
        Err(err) => return VendorResult::error(path, err),
    };
    if let VendorTarget::Workspace(ws) = &target {
        if ws.source() == WorkspaceSource::Manifest {
            tracing::debug!("no go.work, using [workspace] from {}", path.display());
        }
    }

    match assess(&target, drift) {
        Verdict::Done(result) => {
            tracing::debug!("{}: {}", path.display(), result.status);
            result
        }
        Verdict::Regenerate { include_platforms } => {
            match generate(&target, resolver, opts, &include_platforms) {
                Ok(count) => {
                    tracing::debug!(
                        "wrote {} ({} dependencies)",
                        target.manifest_path().display(),
                        count
                    );
                    VendorResult::generated(path, count)
                }
                Err(err) => {
                    tracing::debug!("{}: {}", path.display(), err);
                    VendorResult::error(path, err)
                }
            }
        }
    }
}

/// Resolve `target` and write its manifest. Returns the dependency count.
fn generate(
    target: &VendorTarget,
    resolver: &Resolver,
    opts: &VendorOptions,
    include_platforms: &[Platform],
) -> Result<usize> {
    let platforms = resolution_platforms(include_platforms);
    let modules = target.dependencies(resolver, &platforms)?;
    let count = modules.len();

    Manifest::new(target.hash(), modules)
        .with_version(opts.vendored_version.clone())
        .with_platforms(include_platforms.iter().map(ToString::to_string).collect())
        .with_workspace(target.workspace_section())
        .save(&target.manifest_path())?;

    Ok(count)
}

fn discover(opts: &VendorOptions, roots: &[PathBuf]) -> Result<Discovery> {
    let discovery = if opts.recursive {
        let found = Scanner::new(opts.max_depth).scan(roots)?;
        if found.is_empty() {
            return Err(VendorError::Discovery {
                path: roots[0].clone(),
            });
        }
        Discovery {
            targets: subsume_members(found),
            not_found: Vec::new(),
        }
    } else if opts.workspace {
        let targets = roots
            .iter()
            .map(|root| {
                workspace_target(root).ok_or_else(|| VendorError::Discovery { path: root.clone() })
            })
            .collect::<Result<Vec<_>>>()?;
        Discovery {
            targets,
            not_found: Vec::new(),
        }
    } else {
        explicit_targets(roots)
    };

    let mut targets = discovery.targets;
    targets.sort();
    targets.dedup();
    Ok(Discovery {
        targets,
        not_found: discovery.not_found,
    })
}

/// Resolve explicit paths: a directory means its `go.work` if it has one,
/// otherwise its `go.mod`; a file is used as is.
fn explicit_targets(roots: &[PathBuf]) -> Discovery {
    let mut discovery = Discovery::default();
    for root in roots {
        let path = if root.is_file() || names_descriptor(root) {
            root.clone()
        } else if root.join(GO_WORK_FILE).is_file() {
            root.join(GO_WORK_FILE)
        } else {
            root.join(GO_MOD_FILE)
        };

        if path.is_file() {
            discovery.targets.push(path);
        } else {
            discovery.not_found.push(path);
        }
    }
    discovery
}

fn names_descriptor(path: &Path) -> bool {
    matches!(
        path.file_name().and_then(|n| n.to_str()),
        Some(GO_MOD_FILE) | Some(GO_WORK_FILE) | Some(MANIFEST_FILE)
    )
}

/// The enclosing workspace of `root`: its live `go.work` when present,
/// else the manifest that records it.
fn workspace_target(root: &Path) -> Option<PathBuf> {
    let manifest = find_workspace_manifest(root)?;
    let work = manifest.with_file_name(GO_WORK_FILE);
    if work.is_file() {
        Some(work)
    } else {
        Some(manifest)
    }
}

/// Drop `go.mod` files that belong to a discovered workspace.
fn subsume_members(found: Vec<PathBuf>) -> Vec<PathBuf> {
    let member_dirs: BTreeSet<PathBuf> = found
        .iter()
        .filter(|p| p.file_name().and_then(|n| n.to_str()) == Some(GO_WORK_FILE))
        .filter_map(|p| match GoWorkFile::parse(p) {
            Ok(ws) => Some(ws.module_dirs()),
            // Reported when the workspace itself is processed.
            Err(_) => None,
        })
        .flatten()
        .map(|dir| normalize_path(&dir))
        .collect();

    if member_dirs.is_empty() {
        return found;
    }

    found
        .into_iter()
        .filter(|p| {
            p.file_name().and_then(|n| n.to_str()) != Some(GO_MOD_FILE)
                || !p
                    .parent()
                    .is_some_and(|dir| member_dirs.contains(&normalize_path(dir)))
        })
        .collect()
}
