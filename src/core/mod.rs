//! Core data structures for govendor.
//!
//! This module contains the foundational types used throughout govendor:
//! - Go descriptors (`go.mod`, `go.work`) and their parser
//! - Resolved dependency records and the manifest they are written to
//! - Platforms and vendoring targets

pub mod errors;
pub mod manifest;
pub mod modfile;
pub mod module;
pub mod platform;
mod syntax;
pub mod target;
pub mod workfile;

pub use errors::{Result, VendorError};
pub use manifest::{Manifest, ManifestHeader, WorkspaceSection, MANIFEST_FILE, SCHEMA_VERSION};
pub use modfile::{GoModFile, GO_MOD_FILE};
pub use module::GoModule;
pub use platform::Platform;
pub use target::VendorTarget;
pub use workfile::{GoWorkFile, GO_WORK_FILE};
