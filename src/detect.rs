//! Local ecosystem detection.
//!
//! Picks the ecosystem of a project directory from marker files and the
//! dependency file to read from the configured sources.

use crate::config::Config;
use crate::error::DetectError;
use crate::model::EcosystemDescriptor;
use std::path::Path;
use tracing::debug;

/// Resolves a project root to the descriptor of its dependency file.
///
/// The first configured ecosystem with a marker present wins. Its sources
/// are tried from highest to lowest priority; the first existing file is
/// used.
///
/// # Errors
///
/// Returns [`DetectError::UnsupportedEcosystem`] if no marker matches and
/// [`DetectError::NoDependencySource`] if none of the sources exists.
pub fn resolve_local(root: &Path, config: &Config) -> Result<EcosystemDescriptor, DetectError> {
    let ecosystem = config
        .ecosystems
        .iter()
        .find(|e| e.detect.iter().any(|marker| root.join(marker).exists()))
        .ok_or_else(|| DetectError::UnsupportedEcosystem(root.to_path_buf()))?;

    debug!(ecosystem = %ecosystem.name, root = %root.display(), "detected ecosystem");

    let mut sources: Vec<_> = ecosystem.files.iter().collect();
    sources.sort_by(|a, b| b.priority.cmp(&a.priority));

    sources
        .into_iter()
        .map(|source| (source, root.join(&source.path)))
        .find(|(_, path)| path.exists())
        .map(|(source, path)| {
            EcosystemDescriptor::new(&ecosystem.name, path, source.format, source.role)
        })
        .ok_or_else(|| DetectError::NoDependencySource {
            ecosystem: ecosystem.name.clone(),
            root: root.to_path_buf(),
        })
}
