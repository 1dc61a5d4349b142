//! Deciding whether an existing manifest still describes its target.

use crate::core::manifest::{ManifestHeader, MANIFEST_FILE, SCHEMA_VERSION};
use crate::core::module::parse_version;
use crate::core::platform::{parse_platforms, Platform};
use crate::core::target::VendorTarget;
use crate::ops::result::{VendorResult, VendorStatus};

/// Inputs to the drift check that come from the invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DriftOptions<'a> {
    /// Report instead of regenerating.
    pub check: bool,
    /// Treat any generator version mismatch as drift.
    pub strict: bool,
    /// Regenerate even when up to date.
    pub force: bool,
    /// Version expected in the manifest's `version` field.
    pub vendored_version: Option<&'a str>,
    /// Extra platforms requested for this run.
    pub include_platforms: &'a [Platform],
}

/// Outcome of the drift check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Nothing to write; this is the target's result.
    Done(VendorResult),
    /// Write a fresh manifest covering these extra platforms.
    Regenerate { include_platforms: Vec<Platform> },
}

/// Compare `target` against its `govendor.toml`.
///
/// Checks run in a fixed order: dependencies, presence, readability,
/// schema, generator version, then content hash. A schema mismatch stops
/// the comparison because nothing else in the file can be trusted.
pub fn assess(target: &VendorTarget, opts: &DriftOptions<'_>) -> Verdict {
    let path = target.path();

    if !target.has_dependencies() {
        return Verdict::Done(VendorResult::skipped(path));
    }

    let manifest_path = target.manifest_path();
    if !manifest_path.exists() {
        return if opts.check {
            Verdict::Done(VendorResult::missing(path))
        } else {
            Verdict::Regenerate {
                include_platforms: opts.include_platforms.to_vec(),
            }
        };
    }

    let header = match ManifestHeader::load(&manifest_path) {
        Ok(header) => header,
        Err(err) => return Verdict::Done(VendorResult::error(path, err)),
    };
    if header.schema != SCHEMA_VERSION {
        tracing::debug!(
            "{}: schema {} != {}",
            manifest_path.display(),
            header.schema,
            SCHEMA_VERSION
        );
        if opts.check {
            return Verdict::Done(VendorResult::schema_mismatch(
                path,
                header.schema,
                SCHEMA_VERSION,
            ));
        }
        // An old schema may record platforms this version no longer accepts.
        let persisted = parse_platforms(&header.include_platforms).unwrap_or_default();
        return Verdict::Regenerate {
            include_platforms: union(&persisted, opts.include_platforms),
        };
    }

    let persisted = match parse_platforms(&header.include_platforms) {
        Ok(platforms) => platforms,
        Err(err) => {
            return Verdict::Done(VendorResult::error(
                path,
                format!("{}: {}", manifest_path.display(), err),
            ))
        }
    };
    let platforms = union(&persisted, opts.include_platforms);

    let mut status = None;
    let mut reasons = Vec::new();

    if let Some(vendored) = opts.vendored_version.filter(|v| !v.is_empty()) {
        if header.version != vendored {
            let (s, reason) = version_verdict(&header.version, vendored, opts.strict);
            status = Some(s);
            reasons.push(reason);
        }
    }

    if header.hash != target.hash() {
        status = Some(VendorStatus::Drift);
        reasons.push(format!(
            "hash: {} has changed ({} → {})",
            target.kind(),
            or_none(&header.hash),
            target.hash()
        ));
    }

    let unrecorded: Vec<String> = opts
        .include_platforms
        .iter()
        .filter(|p| !persisted.contains(p))
        .map(ToString::to_string)
        .collect();
    if opts.check && !unrecorded.is_empty() {
        status = Some(VendorStatus::Drift);
        reasons.push(format!(
            "include-platforms: {} not recorded in {}",
            unrecorded.join(", "),
            MANIFEST_FILE
        ));
    }

    match status {
        Some(VendorStatus::Drift) if opts.check => {
            Verdict::Done(VendorResult::drift(path, &reasons))
        }
        Some(_) if opts.check => Verdict::Done(VendorResult::warning(path, &reasons)),
        Some(_) => Verdict::Regenerate {
            include_platforms: platforms,
        },
        None if !opts.check && (opts.force || !unrecorded.is_empty()) => Verdict::Regenerate {
            include_platforms: platforms,
        },
        None => Verdict::Done(VendorResult::ok(path)),
    }
}

/// Classify a generator version mismatch.
fn version_verdict(persisted: &str, vendored: &str, strict: bool) -> (VendorStatus, String) {
    let mismatch = format!(
        "govendor version mismatch: {} → {}",
        or_none(persisted),
        vendored
    );

    match (parse_version(persisted), parse_version(vendored)) {
        (Some(old), Some(new)) if old.major != new.major => (
            VendorStatus::Drift,
            format!("{} (incompatible major version)", mismatch),
        ),
        (Some(_), Some(_)) if strict => (VendorStatus::Drift, mismatch),
        _ => (
            VendorStatus::Warning,
            format!("{} (use --check --strict to enforce)", mismatch),
        ),
    }
}

fn or_none(s: &str) -> &str {
    if s.is_empty() {
        "(none)"
    } else {
        s
    }
}

fn union(persisted: &[Platform], requested: &[Platform]) -> Vec<Platform> {
    let mut all: Vec<Platform> = persisted.iter().chain(requested).cloned().collect();
    all.sort();
    all.dedup();
    all
}
