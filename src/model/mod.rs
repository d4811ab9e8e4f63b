//! Core data types for packages, findings, and scan results.
//!
//! This module contains the fundamental types used throughout depscan:
//!
//! - [`Package`] - A canonical dependency extracted from a manifest or lockfile
//! - [`PackageSet`] - Keyed collection that merges duplicate entries
//! - [`EcosystemDescriptor`] - Which file to read and how to interpret it
//! - [`Finding`] - A vulnerability record matched to a package
//! - [`ScanResult`] - Complete scan results
//!
//! # Example
//!
//! ```
//! use depscan::{Package, PurlType, ScanResult};
//!
//! let package = Package::new(PurlType::Npm, "lodash", "4.17.21", true);
//! let result = ScanResult::new("npm", vec![package]);
//!
//! assert_eq!(result.packages[0].purl, "pkg:npm/lodash@4.17.21");
//! ```

mod descriptor;
mod package;
mod vulnerability;

pub use descriptor::*;
pub use package::*;
pub use vulnerability::*;
