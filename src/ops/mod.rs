//! High-level operations.
//!
//! This module contains the vendoring run: target discovery, drift
//! detection, manifest generation and result reporting.

pub mod drift;
pub mod render;
pub mod result;
pub mod scan;
pub mod vendor;

pub use drift::{assess, DriftOptions, Verdict};
pub use render::render_results;
pub use result::{VendorResult, VendorStatus};
pub use scan::{find_workspace_manifest, Scanner};
pub use vendor::{ensure_success, vendor, VendorOptions};
