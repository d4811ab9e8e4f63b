use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Package;

/// A vulnerability record matched to a specific package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub id: String,
    pub summary: Option<String>,
    pub details: Option<String>,
    /// The `affected` entry of the record that matched the package.
    pub affected: Affected,
    pub published: Option<String>,
    pub modified: Option<String>,
    #[serde(default)]
    pub references: Vec<Reference>,
    /// Highest fix version found in the matched semver ranges.
    pub safe_version: Option<String>,
}

/// One `affected` entry of an OSV record.
///
/// Fields that matching does not look at are kept in `extra` so the entry
/// is reported as the service returned it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Affected {
    #[serde(default)]
    pub package: AffectedPackage,
    #[serde(default)]
    pub ranges: Vec<AffectedRange>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Affected {
    pub fn purl(&self) -> Option<&str> {
        self.package.purl.as_deref().filter(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AffectedPackage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ecosystem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purl: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectedRange {
    #[serde(rename = "type")]
    pub range_type: String,
    #[serde(default)]
    pub events: Vec<RangeEvent>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AffectedRange {
    pub fn is_semver(&self) -> bool {
        self.range_type == "SEMVER"
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub introduced: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_affected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub reference_type: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub ecosystem: String,
    pub packages: Vec<Package>,
}

impl ScanResult {
    pub fn new(ecosystem: impl Into<String>, packages: Vec<Package>) -> Self {
        Self {
            ecosystem: ecosystem.into(),
            packages,
        }
    }

    pub fn direct_count(&self) -> usize {
        self.packages.iter().filter(|p| p.isdirect).count()
    }

    pub fn vulnerable_packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.iter().filter(|p| !p.vulnerabilities.is_empty())
    }

    pub fn total_vulnerabilities(&self) -> usize {
        self.packages.iter().map(|p| p.vulnerabilities.len()).sum()
    }

    pub fn has_vulnerabilities(&self) -> bool {
        self.total_vulnerabilities() > 0
    }
}
