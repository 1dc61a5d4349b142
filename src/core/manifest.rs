//! `govendor.toml` encoding and decoding.
//!
//! Writing goes through `toml_edit` so the layout is stable and reviewable:
//! top-level keys first, then `[workspace]`, then one `[mod."<path>"]` table
//! per dependency with its packages one per line. Reading uses `serde`.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use toml_edit::{value, Array, DocumentMut, Item, Table, Value};

use crate::core::errors::{Result, VendorError};
use crate::core::module::GoModule;
use crate::util::fs::write_atomic;

/// File name of the vendor manifest.
pub const MANIFEST_FILE: &str = "govendor.toml";

/// Manifest schema this build reads and writes. Any other value is drift.
pub const SCHEMA_VERSION: i64 = 2;

const HEADER: &str = "# This file is generated by govendor. Do not edit it by hand.\n\
                      # Run `govendor` to regenerate it after changing go.mod or go.work.\n\n";

/// The `[workspace]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSection {
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub go: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toolchain: Option<String>,
}

/// A complete vendor manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Manifest {
    #[serde(default)]
    pub schema: i64,

    /// Version of govendor that produced the file.
    #[serde(default)]
    pub version: Option<String>,

    /// Hash of the source descriptor (`go.mod`, or the workspace members).
    #[serde(default)]
    pub hash: String,

    #[serde(default)]
    pub include_platforms: Vec<String>,

    #[serde(default)]
    pub workspace: Option<WorkspaceSection>,

    #[serde(default, rename = "mod")]
    modules: BTreeMap<String, GoModule>,
}

/// The top-level fields of a manifest, read without the module tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ManifestHeader {
    #[serde(default)]
    pub schema: i64,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub include_platforms: Vec<String>,
}

impl Manifest {
    /// Create a manifest at the current schema.
    pub fn new(hash: impl Into<String>, modules: Vec<GoModule>) -> Self {
        Manifest {
            schema: SCHEMA_VERSION,
            version: None,
            hash: hash.into(),
            include_platforms: Vec::new(),
            workspace: None,
            modules: modules.into_iter().map(|m| (m.path.clone(), m)).collect(),
        }
    }

    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version.filter(|v| !v.is_empty());
        self
    }

    pub fn with_platforms(mut self, mut platforms: Vec<String>) -> Self {
        platforms.sort();
        platforms.dedup();
        self.include_platforms = platforms;
        self
    }

    pub fn with_workspace(mut self, workspace: Option<WorkspaceSection>) -> Self {
        self.workspace = workspace;
        self
    }

    /// Dependencies, sorted by path.
    pub fn modules(&self) -> impl Iterator<Item = &GoModule> {
        self.modules.values()
    }

    pub fn module(&self, path: &str) -> Option<&GoModule> {
        self.modules.get(path)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Load and fully decode a manifest.
    pub fn load(path: &Path) -> Result<Self> {
        let content = read(path)?;
        Self::parse(path, &content)
    }

    /// Decode manifest text read from `path`.
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let mut manifest: Manifest =
            toml::from_str(content).map_err(|e| VendorError::codec(path, e.message()))?;
        for (key, module) in manifest.modules.iter_mut() {
            module.path = key.clone();
        }
        Ok(manifest)
    }

    /// Encode as TOML text, header comment included.
    pub fn to_toml_string(&self) -> String {
        let mut doc = DocumentMut::new();

        doc["schema"] = value(self.schema);
        if let Some(version) = &self.version {
            doc["version"] = value(version.as_str());
        }
        doc["hash"] = value(self.hash.as_str());
        if !self.include_platforms.is_empty() {
            doc["include-platforms"] = value(inline_array(&self.include_platforms));
        }

        if let Some(ws) = &self.workspace {
            let mut table = Table::new();
            table["modules"] = value(inline_array(&ws.modules));
            if let Some(go) = &ws.go {
                table["go"] = value(go.as_str());
            }
            if let Some(toolchain) = &ws.toolchain {
                table["toolchain"] = value(toolchain.as_str());
            }
            doc["workspace"] = Item::Table(table);
        }

        if !self.modules.is_empty() {
            let mut mods = Table::new();
            mods.set_implicit(true);
            for module in self.modules.values() {
                mods.insert(&module.path, Item::Table(module_table(module)));
            }
            doc["mod"] = Item::Table(mods);
        }

        format!("{}{}", HEADER, doc)
    }

    /// Write the manifest atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        tracing::debug!("writing {} ({} modules)", path.display(), self.len());
        write_atomic(path, self.to_toml_string().as_bytes()).map_err(|source| {
            VendorError::Write {
                path: path.to_path_buf(),
                source,
            }
        })
    }
}

impl ManifestHeader {
    /// Read only the top-level fields. A missing `schema` reads as 0.
    pub fn load(path: &Path) -> Result<Self> {
        let content = read(path)?;
        toml::from_str(&content).map_err(|e| VendorError::codec(path, e.message()))
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| VendorError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn inline_array(items: &[String]) -> Array {
    items.iter().map(String::as_str).collect()
}

fn module_table(module: &GoModule) -> Table {
    let mut table = Table::new();
    table["version"] = value(module.version.as_str());
    if let Some(hash) = &module.hash {
        table["hash"] = value(hash.as_str());
    }
    if let Some(go) = &module.go {
        table["go"] = value(go.as_str());
    }
    if !module.packages.is_empty() {
        let mut packages = inline_array(&module.packages);
        for item in packages.iter_mut() {
            item.decor_mut().set_prefix("\n  ");
        }
        packages.set_trailing_comma(true);
        packages.set_trailing("\n");
        table["packages"] = Item::Value(Value::Array(packages));
    }
    if let Some(replaced) = &module.replaced {
        table["replaced"] = value(replaced.as_str());
    }
    if let Some(local) = &module.local {
        table["local"] = value(local.as_str());
    }
    table
}
