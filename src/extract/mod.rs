//! Dependency extractors for manifests and lockfiles.
//!
//! Each extractor understands one file family and turns its content into
//! canonical [`Package`] records.
//!
//! # Available Extractors
//!
//! | Extractor | File | Format | Role |
//! |-----------|------|--------|------|
//! | [`GoModExtractor`] | `go.mod` | gomod | manifest |
//! | [`GoSumExtractor`] | `go.sum` | text | checksum |
//! | [`PackageJsonExtractor`] | `package.json` | json | manifest |
//! | [`PackageLockExtractor`] | `package-lock.json` | json | lockfile |
//! | [`YarnLockExtractor`] | `yarn.lock` | yarn | lockfile |
//! | [`PnpmLockExtractor`] | `pnpm-lock.yaml` | yaml | lockfile |
//!
//! # Example
//!
//! ```
//! use depscan::extract::extract_content;
//! use depscan::{EcosystemDescriptor, Format, Role};
//!
//! let descriptor = EcosystemDescriptor::new("Go", "go.mod", Format::Gomod, Role::Manifest);
//! let extraction = extract_content(&descriptor, "module m\n\nrequire foo v1.0.0\n");
//!
//! assert_eq!(extraction.packages.len(), 1);
//! assert!(extraction.packages[0].isdirect);
//! ```

mod go;
mod npm;
mod pnpm;
mod yarn;

pub use go::{GoModExtractor, GoSumExtractor};
pub use npm::{PackageJsonExtractor, PackageLockExtractor};
pub use pnpm::PnpmLockExtractor;
pub use yarn::YarnLockExtractor;

use crate::error::ExtractError;
use crate::model::{EcosystemDescriptor, Package};
use std::fs;
use tracing::{debug, warn};

/// Dependency groups read from npm-style manifests and lockfiles.
pub(crate) const NPM_DEPENDENCY_GROUPS: [&str; 3] =
    ["dependencies", "devDependencies", "optionalDependencies"];

/// Trait for turning one dependency file family into canonical packages.
pub trait Extractor: Send + Sync {
    /// Returns the human-readable name of this extractor.
    fn name(&self) -> &'static str;

    /// Returns true if this extractor understands the described file.
    fn supports(&self, descriptor: &EcosystemDescriptor) -> bool;

    /// Parses file content into packages.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is malformed for this format.
    fn extract(&self, content: &str) -> Result<Vec<Package>, ExtractError>;
}

/// Packages extracted from one descriptor.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub ecosystem: String,
    pub packages: Vec<Package>,
}

impl Extraction {
    pub fn empty(ecosystem: impl Into<String>) -> Self {
        Self {
            ecosystem: ecosystem.into(),
            packages: Vec::new(),
        }
    }
}

/// Returns a list of all available extractors.
pub fn all_extractors() -> Vec<Box<dyn Extractor>> {
    vec![
        Box::new(GoModExtractor),
        Box::new(GoSumExtractor),
        Box::new(PackageJsonExtractor),
        Box::new(PackageLockExtractor),
        Box::new(YarnLockExtractor),
        Box::new(PnpmLockExtractor),
    ]
}

/// Returns the first extractor that understands the descriptor.
pub fn find_extractor(descriptor: &EcosystemDescriptor) -> Option<Box<dyn Extractor>> {
    all_extractors().into_iter().find(|e| e.supports(descriptor))
}

/// Reads the described file and extracts its packages.
///
/// Never fails: a missing or unreadable file, an unsupported descriptor or
/// malformed content is logged and yields no packages.
pub fn extract(descriptor: &EcosystemDescriptor) -> Extraction {
    match read_source(descriptor) {
        Ok(content) => extract_content(descriptor, &content),
        Err(e) => {
            warn!(path = %descriptor.path.display(), "{}", e);
            Extraction::empty(&descriptor.name)
        }
    }
}

/// Extracts packages from content already in memory.
pub fn extract_content(descriptor: &EcosystemDescriptor, content: &str) -> Extraction {
    match try_extract(descriptor, content) {
        Ok(packages) => {
            debug!(
                path = %descriptor.path.display(),
                count = packages.len(),
                "extracted packages"
            );
            Extraction {
                ecosystem: descriptor.name.clone(),
                packages,
            }
        }
        Err(e) => {
            warn!(path = %descriptor.path.display(), "error parsing dependency file: {}", e);
            Extraction::empty(&descriptor.name)
        }
    }
}

fn try_extract(descriptor: &EcosystemDescriptor, content: &str) -> Result<Vec<Package>, ExtractError> {
    let extractor = find_extractor(descriptor).ok_or_else(|| ExtractError::Unsupported {
        ecosystem: descriptor.name.clone(),
        format: descriptor.format.as_str(),
        role: descriptor.role.as_str(),
    })?;
    extractor.extract(content)
}

fn read_source(descriptor: &EcosystemDescriptor) -> Result<String, ExtractError> {
    if !descriptor.path.exists() {
        return Err(ExtractError::NotFound(descriptor.path.clone()));
    }
    fs::read_to_string(&descriptor.path).map_err(|source| ExtractError::Io {
        path: descriptor.path.clone(),
        source,
    })
}
