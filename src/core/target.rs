//! Vendoring targets: a single module or a whole workspace.

use std::path::{Path, PathBuf};

use crate::core::errors::Result;
use crate::core::manifest::{Manifest, WorkspaceSection, MANIFEST_FILE};
use crate::core::modfile::{GoModFile, GO_MOD_FILE};
use crate::core::module::GoModule;
use crate::core::platform::Platform;
use crate::core::workfile::{GoWorkFile, GO_WORK_FILE};
use crate::resolver::Resolver;

/// Something that gets its own `govendor.toml`.
#[derive(Debug, Clone)]
pub enum VendorTarget {
    Module(GoModFile),
    Workspace(GoWorkFile),
}

impl VendorTarget {
    /// Load the target described by `path`.
    ///
    /// `go.work` loads a workspace. A `govendor.toml` with a `[workspace]`
    /// section rebuilds the workspace it describes; without one it stands
    /// for the `go.mod` next to it. Anything else is parsed as a `go.mod`.
    pub fn load(path: &Path) -> Result<Self> {
        match path.file_name().and_then(|n| n.to_str()) {
            Some(GO_WORK_FILE) => Ok(VendorTarget::Workspace(GoWorkFile::parse(path)?)),
            Some(MANIFEST_FILE) => {
                let manifest = Manifest::load(path)?;
                match &manifest.workspace {
                    Some(section) => Ok(VendorTarget::Workspace(GoWorkFile::from_manifest(
                        path, section,
                    )?)),
                    None => {
                        let dir = path.parent().unwrap_or(Path::new("."));
                        Ok(VendorTarget::Module(GoModFile::parse(&dir.join(GO_MOD_FILE))?))
                    }
                }
            }
            _ => Ok(VendorTarget::Module(GoModFile::parse(path)?)),
        }
    }

    /// The descriptor this target was loaded from.
    pub fn path(&self) -> &Path {
        match self {
            VendorTarget::Module(m) => m.path(),
            VendorTarget::Workspace(w) => w.path(),
        }
    }

    pub fn dir(&self) -> &Path {
        match self {
            VendorTarget::Module(m) => m.dir(),
            VendorTarget::Workspace(w) => w.dir(),
        }
    }

    /// Content hash recorded in the manifest.
    pub fn hash(&self) -> &str {
        match self {
            VendorTarget::Module(m) => m.hash(),
            VendorTarget::Workspace(w) => w.hash(),
        }
    }

    /// Descriptor kind as shown to users.
    pub fn kind(&self) -> &'static str {
        match self {
            VendorTarget::Module(_) => GO_MOD_FILE,
            VendorTarget::Workspace(_) => GO_WORK_FILE,
        }
    }

    pub fn has_dependencies(&self) -> bool {
        match self {
            VendorTarget::Module(m) => m.has_dependencies(),
            VendorTarget::Workspace(w) => w.has_dependencies(),
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir().join(MANIFEST_FILE)
    }

    pub fn workspace_section(&self) -> Option<WorkspaceSection> {
        match self {
            VendorTarget::Module(_) => None,
            VendorTarget::Workspace(w) => Some(w.workspace_section()),
        }
    }

    /// Module directories covered by this target.
    pub fn module_dirs(&self) -> Vec<PathBuf> {
        match self {
            VendorTarget::Module(m) => vec![m.dir().to_path_buf()],
            VendorTarget::Workspace(w) => w.module_dirs(),
        }
    }

    /// Resolve the full dependency closure, sorted by path.
    pub fn dependencies(&self, resolver: &Resolver, platforms: &[Platform]) -> Result<Vec<GoModule>> {
        match self {
            VendorTarget::Module(m) => resolver.resolve_module(m, platforms),
            VendorTarget::Workspace(w) => resolver.resolve_workspace(w, platforms),
        }
    }
}
