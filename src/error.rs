use std::path::PathBuf;
use thiserror::Error;

/// Failure to read or interpret one dependency file.
///
/// Never escapes [`crate::extract::extract`]; it is logged and the source
/// contributes no packages.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("dependency file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("no extractor for {ecosystem} {format} {role} files")]
    Unsupported {
        ecosystem: String,
        format: &'static str,
        role: &'static str,
    },
}

/// Failure of the vulnerability database round trip that gates a scan.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("unable to reach vulnerability database at {url}: {source}")]
    Connectivity {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("vulnerability database returned {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Failure to find something to scan in a project directory.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("could not detect a supported ecosystem in {}", .0.display())]
    UnsupportedEcosystem(PathBuf),

    #[error("no dependency file for {ecosystem} found in {}", .root.display())]
    NoDependencySource { ecosystem: String, root: PathBuf },
}
