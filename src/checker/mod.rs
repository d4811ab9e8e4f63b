mod matching;
mod osv;

pub use matching::{match_affected, parse_fixed_version, resolve_safe_version};
pub use osv::OsvChecker;

use crate::config::OsvConfig;
use crate::error::CheckError;
use crate::model::{Package, ScanResult};
use async_trait::async_trait;

#[async_trait]
pub trait VulnerabilityChecker: Send + Sync {
    fn name(&self) -> &'static str;

    /// Attaches findings to every package that has any.
    ///
    /// # Errors
    ///
    /// Returns an error only when the vulnerability database cannot be
    /// queried at all; lookups that fail for individual findings are
    /// omitted from the result.
    async fn check(&self, ecosystem: &str, packages: Vec<Package>) -> Result<ScanResult, CheckError>;
}

pub fn default_checker(config: &OsvConfig) -> Result<OsvChecker, CheckError> {
    OsvChecker::new(config)
}
