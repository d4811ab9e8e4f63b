use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::Finding;

/// Version recorded when a source does not pin one.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Package URL type used to build identifiers for an ecosystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurlType {
    Golang,
    Npm,
}

impl PurlType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurlType::Golang => "golang",
            PurlType::Npm => "npm",
        }
    }

    /// Builds the package URL for `name` at `version`.
    ///
    /// npm scopes are percent-encoded (`@scope/name` becomes `%40scope/name`).
    pub fn purl(&self, name: &str, version: &str) -> String {
        let name = match self {
            PurlType::Npm if name.starts_with('@') => format!("%40{}", &name[1..]),
            _ => name.to_string(),
        };
        format!("pkg:{}/{}@{}", self.as_str(), name, version)
    }
}

impl std::fmt::Display for PurlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    pub purl: String,
    pub version: String,
    pub isdirect: bool,
    #[serde(default)]
    pub vulnerabilities: Vec<Finding>,
}

impl Package {
    pub fn new(
        purl_type: PurlType,
        name: impl Into<String>,
        version: impl Into<String>,
        isdirect: bool,
    ) -> Self {
        let name = name.into();
        let version = version.into();
        Self {
            purl: purl_type.purl(&name, &version),
            name,
            version,
            isdirect,
            vulnerabilities: Vec::new(),
        }
    }

    pub fn has_known_version(&self) -> bool {
        self.version != UNKNOWN_VERSION
    }

    /// Combines two records for the same key.
    ///
    /// `isdirect` is the logical OR of both sides. The first known version
    /// wins; an unknown version is replaced by a known one together with
    /// its purl.
    pub fn merge(self, other: Package) -> Package {
        let isdirect = self.isdirect || other.isdirect;
        let (version, purl) = if !self.has_known_version() && other.has_known_version() {
            (other.version, other.purl)
        } else {
            (self.version, self.purl)
        };

        let mut vulnerabilities = self.vulnerabilities;
        vulnerabilities.extend(other.vulnerabilities);

        Package {
            name: self.name,
            purl,
            version,
            isdirect,
            vulnerabilities,
        }
    }
}

/// Insertion-ordered package collection with merge-on-insert.
#[derive(Debug, Default)]
pub struct PackageSet {
    index: HashMap<String, usize>,
    packages: Vec<Package>,
}

impl PackageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts keyed by package name.
    pub fn insert(&mut self, package: Package) {
        let key = package.name.clone();
        self.insert_keyed(key, package);
    }

    /// Inserts under an explicit key, merging with any existing entry.
    pub fn insert_keyed(&mut self, key: String, package: Package) {
        match self.index.get(&key) {
            Some(&idx) => {
                let existing = std::mem::take(&mut self.packages[idx]);
                self.packages[idx] = existing.merge(package);
            }
            None => {
                self.index.insert(key, self.packages.len());
                self.packages.push(package);
            }
        }
    }

    pub fn into_vec(self) -> Vec<Package> {
        self.packages
    }
}

impl Extend<Package> for PackageSet {
    fn extend<I: IntoIterator<Item = Package>>(&mut self, iter: I) {
        for package in iter {
            self.insert(package);
        }
    }
}

impl FromIterator<Package> for PackageSet {
    fn from_iter<I: IntoIterator<Item = Package>>(iter: I) -> Self {
        let mut set = PackageSet::new();
        set.extend(iter);
        set
    }
}
