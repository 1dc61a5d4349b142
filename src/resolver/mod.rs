//! Dependency resolution.
//!
//! Everything here defers to the `go` toolchain for version selection and
//! records what it reports: which modules own which packages on every
//! platform, where the modules live in the module cache, and what their
//! trees hash to.

pub mod download;
pub mod module;
pub mod packages;
pub mod toolchain;
pub mod workspace;

pub use packages::PackageMap;
pub use toolchain::{GoCommand, Toolchain};

use std::sync::Arc;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::core::errors::Result;
use crate::core::modfile::GoModFile;
use crate::core::module::{merge_modules, GoModule};
use crate::core::platform::Platform;
use crate::core::workfile::GoWorkFile;
use crate::resolver::workspace::{reconcile_members, MemberGraph};

/// Default number of modules hashed at once.
pub const DEFAULT_JOBS: usize = 8;

/// Resolves the dependency closure of modules and workspaces.
pub struct Resolver {
    toolchain: Arc<dyn Toolchain>,
    pool: ThreadPool,
}

impl Resolver {
    /// Create a resolver hashing at most `jobs` module trees at once.
    pub fn new(toolchain: Arc<dyn Toolchain>, jobs: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(jobs.max(1))
            .thread_name(|i| format!("govendor-hash-{}", i))
            .build()?;
        Ok(Resolver { toolchain, pool })
    }

    pub fn toolchain(&self) -> &dyn Toolchain {
        self.toolchain.as_ref()
    }

    /// Package ownership for one module across `platforms`.
    pub fn package_map(&self, modfile: &GoModFile, platforms: &[Platform]) -> Result<PackageMap> {
        packages::packages_by_module(self.toolchain(), modfile, platforms)
    }

    /// Every external dependency of a single module, sorted by path.
    pub fn resolve_module(
        &self,
        modfile: &GoModFile,
        platforms: &[Platform],
    ) -> Result<Vec<GoModule>> {
        let packages = self.package_map(modfile, platforms)?;
        self.resolve_with_packages(modfile, &packages)
    }

    fn resolve_with_packages(
        &self,
        modfile: &GoModFile,
        packages: &PackageMap,
    ) -> Result<Vec<GoModule>> {
        let downloads = download::download_modules(self.toolchain(), modfile)?;
        let fetched = module::fetched_modules(&self.pool, modfile, &downloads, packages)?;
        let local = module::local_modules(&self.pool, modfile, packages)?;
        Ok(merge_modules([fetched, local]))
    }

    /// Every external dependency of a workspace, sorted by path.
    ///
    /// Members are resolved concurrently and merged; members imported by
    /// other members are recorded as source-built entries.
    pub fn resolve_workspace(
        &self,
        workspace: &GoWorkFile,
        platforms: &[Platform],
    ) -> Result<Vec<GoModule>> {
        let resolved = workspace
            .members()
            .par_iter()
            .map(|member| {
                let _span =
                    tracing::debug_span!("member", module = member.module_path()).entered();
                let packages = self.package_map(member, platforms)?;
                let modules = self.resolve_with_packages(member, &packages)?;
                Ok((packages, modules))
            })
            .collect::<Result<Vec<_>>>()?;

        let (maps, sets): (Vec<PackageMap>, Vec<Vec<GoModule>>) = resolved.into_iter().unzip();

        let graph = MemberGraph::build(workspace, &maps);
        for member in workspace.members() {
            let imports = graph.imports(member.module_path());
            if !imports.is_empty() {
                tracing::debug!("{} imports {:?}", member.module_path(), imports);
            }
        }
        let exported = graph.exported();
        tracing::debug!(
            "workspace {}: {} exported member(s)",
            workspace.dir().display(),
            exported.len()
        );

        Ok(reconcile_members(workspace, merge_modules(sets), &exported))
    }
}
