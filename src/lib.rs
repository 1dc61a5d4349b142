//! govendor - Reproducible vendor manifests for Go modules and workspaces
//!
//! This crate provides the core library functionality for govendor:
//! parsing `go.mod`/`go.work`, resolving and hashing the dependency
//! closure through the `go` toolchain, and writing or checking
//! `govendor.toml`.

pub mod core;
pub mod ops;
pub mod resolver;
pub mod util;

/// Test utilities and mocks for govendor unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a mock `go` toolchain and on-disk fixtures.
#[cfg(test)]
pub mod test_support;

pub use core::{
    GoModFile, GoModule, GoWorkFile, Manifest, Platform, Result, VendorError, VendorTarget,
};
pub use ops::{VendorOptions, VendorResult, VendorStatus};
pub use resolver::{GoCommand, Resolver, Toolchain};
