//! Resolved dependency records.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use semver::Version;
use serde::{Deserialize, Serialize};

/// One resolved dependency as recorded in `govendor.toml`.
///
/// The path is the table key in the manifest, so it is not part of the
/// serialised body.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GoModule {
    #[serde(skip)]
    pub path: String,

    pub version: String,

    /// NAR hash of the module tree. Absent for workspace members, which are
    /// built from source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub go: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub packages: Vec<String>,

    /// Module path substituted by a `replace` directive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replaced: Option<String>,

    /// On-disk location for local replacements and workspace members.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<String>,
}

impl GoModule {
    pub fn new(path: impl Into<String>, version: impl Into<String>) -> Self {
        GoModule {
            path: path.into(),
            version: version.into(),
            ..Default::default()
        }
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    pub fn with_go(mut self, go: Option<String>) -> Self {
        self.go = go;
        self
    }

    pub fn with_packages(mut self, packages: Vec<String>) -> Self {
        self.packages = packages;
        self.normalize_packages();
        self
    }

    pub fn with_replaced(mut self, replaced: impl Into<String>) -> Self {
        self.replaced = Some(replaced.into());
        self
    }

    pub fn with_local(mut self, local: impl Into<String>) -> Self {
        self.local = Some(local.into());
        self
    }

    /// Sort and deduplicate the package list.
    pub fn normalize_packages(&mut self) {
        self.packages.sort();
        self.packages.dedup();
    }

    /// Whether this record refers to a workspace member built from source.
    pub fn is_workspace_member(&self) -> bool {
        self.hash.is_none() && self.local.is_some()
    }
}

/// Order two Go module versions.
///
/// Versions are compared as semver after stripping the leading `v`;
/// anything that does not parse falls back to a plain string comparison.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (parse_version(a), parse_version(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

/// Parse a Go module version (`v1.2.3`, pseudo-versions included).
pub fn parse_version(v: &str) -> Option<Version> {
    Version::parse(v.strip_prefix('v')?).ok()
}

/// Total order between two records for the same path: version first, then
/// the remaining fields, so merging does not depend on input order.
fn precedence(a: &GoModule, b: &GoModule) -> Ordering {
    compare_versions(&a.version, &b.version)
        .then_with(|| a.version.cmp(&b.version))
        .then_with(|| a.hash.cmp(&b.hash))
        .then_with(|| a.replaced.cmp(&b.replaced))
        .then_with(|| a.local.cmp(&b.local))
        .then_with(|| a.go.cmp(&b.go))
}

/// Merge record sets into one list with at most one record per path.
///
/// When two records share a path, the higher version wins and the package
/// lists are unioned. Ties on version are broken on the other fields. The
/// result is sorted by path.
pub fn merge_modules<I>(sets: I) -> Vec<GoModule>
where
    I: IntoIterator<Item = Vec<GoModule>>,
{
    let mut merged: BTreeMap<String, GoModule> = BTreeMap::new();

    for module in sets.into_iter().flatten() {
        match merged.get_mut(&module.path) {
            None => {
                merged.insert(module.path.clone(), module);
            }
            Some(existing) => {
                let mut packages = std::mem::take(&mut existing.packages);
                packages.extend(module.packages.iter().cloned());

                if precedence(&module, existing) == Ordering::Greater {
                    tracing::debug!(
                        "{}: {} supersedes {}",
                        module.path,
                        module.version,
                        existing.version
                    );
                    *existing = module;
                }
                existing.packages = packages;
            }
        }
    }

    merged
        .into_values()
        .map(|mut m| {
            m.normalize_packages();
            m
        })
        .collect()
}
