use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How the content of a dependency file is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// `go.mod` directive grammar
    Gomod,
    /// Whitespace separated lines (`go.sum`)
    Text,
    Json,
    /// `yarn.lock` selector blocks
    Yarn,
    Yaml,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Gomod => "gomod",
            Format::Text => "text",
            Format::Json => "json",
            Format::Yarn => "yarn",
            Format::Yaml => "yaml",
        }
    }
}

/// What a dependency file represents for its project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Manifest,
    Lockfile,
    Checksum,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Manifest => "manifest",
            Role::Lockfile => "lockfile",
            Role::Checksum => "checksum",
        }
    }
}

/// Identifies one dependency-bearing file and how to interpret it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcosystemDescriptor {
    /// Ecosystem name as reported in results (e.g. "Go", "npm")
    pub name: String,
    pub path: PathBuf,
    pub format: Format,
    pub role: Role,
}

impl EcosystemDescriptor {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, format: Format, role: Role) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            format,
            role,
        }
    }

    /// Returns true if the descriptor names the given ecosystem, ignoring case.
    pub fn is_ecosystem(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}
