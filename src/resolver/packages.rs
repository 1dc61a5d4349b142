//! Package ownership across platforms.
//!
//! `go list` only reports the packages that build for the current
//! `GOOS/GOARCH`, so every platform is listed separately and the results
//! are unioned.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::core::errors::Result;
use crate::core::modfile::GoModFile;
use crate::core::platform::Platform;
use crate::resolver::toolchain::Toolchain;

/// Module path to the packages it provides.
pub type PackageMap = BTreeMap<String, Vec<String>>;

/// `go list -f` template printing `module<TAB>package` for every
/// non-standard package outside `module_path`.
pub fn list_template(module_path: &str) -> String {
    format!(
        r#"{{{{if not .Standard}}}}{{{{if .Module}}}}{{{{if ne .Module.Path "{}"}}}}{{{{.Module.Path}}}}{{{{"\t"}}}}{{{{.ImportPath}}}}{{{{end}}}}{{{{end}}}}{{{{end}}}}"#,
        module_path
    )
}

/// Parse `module<TAB>package` lines. Blank and malformed lines are skipped.
pub fn parse_package_lines(out: &str) -> PackageMap {
    let mut map = PackageMap::new();
    for line in out.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((module, package)) = line.split_once('\t') else {
            continue;
        };
        map.entry(module.to_string())
            .or_default()
            .push(package.to_string());
    }
    map
}

/// Union package maps, sorting and deduplicating every list.
pub fn merge_package_maps<I>(maps: I) -> PackageMap
where
    I: IntoIterator<Item = PackageMap>,
{
    let mut merged = PackageMap::new();
    for map in maps {
        for (module, packages) in map {
            merged.entry(module).or_default().extend(packages);
        }
    }
    for packages in merged.values_mut() {
        packages.sort();
        packages.dedup();
    }
    merged
}

/// Packages used by `modfile` when building for `platform`.
pub fn packages_for_platform(
    toolchain: &dyn Toolchain,
    modfile: &GoModFile,
    platform: &Platform,
) -> Result<PackageMap> {
    let _span = tracing::debug_span!("list", platform = %platform).entered();

    let template = list_template(modfile.module_path());
    let env = [
        ("GOWORK", "off"),
        ("GOOS", platform.os.as_str()),
        ("GOARCH", platform.arch.as_str()),
    ];

    let out = toolchain.run(
        &["list", "-deps", "-test", "-f", &template, "./..."],
        modfile.dir(),
        &env,
    )?;
    let mut maps = vec![parse_package_lines(&out)];

    // Tools are listed without -test so their own test dependencies stay out.
    if !modfile.tools().is_empty() {
        let out = toolchain.run(
            &["list", "-deps", "-f", &template, "tool"],
            modfile.dir(),
            &env,
        )?;
        maps.push(parse_package_lines(&out));
    }

    Ok(merge_package_maps(maps))
}

/// Packages used by `modfile` across the host and every platform given.
///
/// The host is listed first; the others run concurrently. Any failure
/// fails the whole resolution.
pub fn packages_by_module(
    toolchain: &dyn Toolchain,
    modfile: &GoModFile,
    platforms: &[Platform],
) -> Result<PackageMap> {
    let host = Platform::host();
    let current = packages_for_platform(toolchain, modfile, &host)?;

    let others = platforms
        .par_iter()
        .filter(|p| **p != host)
        .map(|p| packages_for_platform(toolchain, modfile, p))
        .collect::<Result<Vec<_>>>()?;

    let merged = merge_package_maps(std::iter::once(current).chain(others));
    tracing::debug!(
        "{}: {} modules provide packages",
        modfile.module_path(),
        merged.len()
    );
    Ok(merged)
}
