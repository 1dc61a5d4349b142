//! Dependency records for a single module.

use rayon::prelude::*;
use rayon::ThreadPool;

use crate::core::errors::Result;
use crate::core::modfile::{read_go_version, GoModFile, Replacement, GO_MOD_FILE};
use crate::core::module::GoModule;
use crate::resolver::download::ModuleDownload;
use crate::resolver::packages::PackageMap;
use crate::util::hash::hash_path;

/// Records for every downloaded module, hashed on `pool`.
pub fn fetched_modules(
    pool: &ThreadPool,
    modfile: &GoModFile,
    downloads: &[ModuleDownload],
    packages: &PackageMap,
) -> Result<Vec<GoModule>> {
    let replacements = modfile.replacements();

    pool.install(|| {
        downloads
            .par_iter()
            .map(|download| {
                let replacement = replacements.get(download.path.as_str()).copied();
                module_from_download(download, replacement, packages)
            })
            .collect()
    })
}

fn module_from_download(
    download: &ModuleDownload,
    replacement: Option<&Replacement>,
    packages: &PackageMap,
) -> Result<GoModule> {
    let hash = hash_path(download.dir()?)?;
    let go = download.go_mod.as_deref().and_then(read_go_version);

    let mut module = GoModule::new(&download.path, &download.version)
        .with_hash(hash)
        .with_go(go)
        .with_packages(packages.get(&download.path).cloned().unwrap_or_default());

    // Recorded under the path the code imports; the fork goes in `replaced`.
    if let Some(repl) = replacement {
        module.path = repl.old_path.clone();
        module.replaced = Some(download.path.clone());
    }

    Ok(module)
}

/// Records for `replace` directives pointing at directories on disk.
pub fn local_modules(
    pool: &ThreadPool,
    modfile: &GoModFile,
    packages: &PackageMap,
) -> Result<Vec<GoModule>> {
    let locals: Vec<&Replacement> = modfile.local_replacements().collect();
    if locals.is_empty() {
        return Ok(Vec::new());
    }

    pool.install(|| {
        locals
            .par_iter()
            .map(|repl| {
                let dir = modfile.dir().join(&repl.new_path);
                let hash = hash_path(&dir)?;
                let go = read_go_version(&dir.join(GO_MOD_FILE));
                let version = modfile
                    .required_version(&repl.old_path)
                    .unwrap_or("v0.0.0");

                Ok(GoModule::new(&repl.old_path, version)
                    .with_hash(hash)
                    .with_go(go)
                    .with_packages(packages.get(&repl.old_path).cloned().unwrap_or_default())
                    .with_replaced(&repl.old_path)
                    .with_local(&repl.new_path))
            })
            .collect()
    })
}
