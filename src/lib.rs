pub mod checker;
pub mod config;
pub mod detect;
pub mod error;
pub mod extract;
pub mod model;
pub mod output;

pub use checker::{OsvChecker, VulnerabilityChecker};
pub use config::Config;
pub use error::{CheckError, DetectError, ExtractError};
pub use extract::{extract, Extraction};
pub use model::{
    EcosystemDescriptor, Finding, Format, Package, PackageSet, PurlType, Role, ScanResult,
};
