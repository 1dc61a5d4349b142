//! Target platforms (`GOOS/GOARCH` pairs).

use std::fmt;
use std::str::FromStr;

use crate::core::errors::VendorError;

/// Platforms every manifest is resolved for.
pub const DEFAULT_PLATFORMS: &[(&str, &str)] = &[
    ("linux", "amd64"),
    ("linux", "arm64"),
    ("darwin", "amd64"),
    ("darwin", "arm64"),
    ("windows", "amd64"),
    ("windows", "arm64"),
];

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Platform {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// The platform govendor itself is running on, in Go's naming.
    pub fn host() -> Self {
        Platform::new(go_os(std::env::consts::OS), go_arch(std::env::consts::ARCH))
    }

    pub fn defaults() -> Vec<Platform> {
        DEFAULT_PLATFORMS
            .iter()
            .map(|(os, arch)| Platform::new(*os, *arch))
            .collect()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

impl FromStr for Platform {
    type Err = VendorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((os, arch))
                if !os.is_empty() && !arch.is_empty() && !arch.contains('/') =>
            {
                Ok(Platform::new(os, arch))
            }
            _ => Err(VendorError::Platform {
                platforms: vec![s.to_string()],
            }),
        }
    }
}

/// Parse `os/arch` values, accepting comma-separated lists.
///
/// The result is sorted and deduplicated; every malformed entry is
/// reported together.
pub fn parse_platforms<S: AsRef<str>>(values: &[S]) -> Result<Vec<Platform>, VendorError> {
    let mut platforms = Vec::new();
    let mut invalid = Vec::new();

    for raw in values
        .iter()
        .flat_map(|v| v.as_ref().split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        match raw.parse::<Platform>() {
            Ok(p) => platforms.push(p),
            Err(_) => invalid.push(raw.to_string()),
        }
    }

    if !invalid.is_empty() {
        return Err(VendorError::Platform { platforms: invalid });
    }

    platforms.sort();
    platforms.dedup();
    Ok(platforms)
}

/// Default platforms extended with `extra`, without duplicates.
pub fn resolution_platforms(extra: &[Platform]) -> Vec<Platform> {
    let mut all = Platform::defaults();
    for p in extra {
        if !all.contains(p) {
            all.push(p.clone());
        }
    }
    all
}

fn go_os(os: &str) -> String {
    match os {
        "macos" => "darwin",
        other => other,
    }
    .to_string()
}

fn go_arch(arch: &str) -> String {
    match arch {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "powerpc64" => "ppc64",
        "loongarch64" => "loong64",
        other => other,
    }
    .to_string()
}
