use super::npm::DirectDependencies;
use super::NPM_DEPENDENCY_GROUPS;
use crate::error::ExtractError;
use crate::model::{EcosystemDescriptor, Format, Package, PackageSet, PurlType, UNKNOWN_VERSION};
use serde_yaml::Value;

/// Extracts the resolved tree from `pnpm-lock.yaml`.
pub struct PnpmLockExtractor;

impl super::Extractor for PnpmLockExtractor {
    fn name(&self) -> &'static str {
        "pnpm-lock.yaml"
    }

    fn supports(&self, descriptor: &EcosystemDescriptor) -> bool {
        descriptor.is_ecosystem("npm") && descriptor.format == Format::Yaml
    }

    fn extract(&self, content: &str) -> Result<Vec<Package>, ExtractError> {
        let lockfile: Value = serde_yaml::from_str(content)?;
        let roots = direct_dependencies(&lockfile);
        let mut packages = PackageSet::new();

        if let Some(entries) = lockfile.get("packages").and_then(Value::as_mapping) {
            for (key, details) in entries {
                let Some(key) = key.as_str() else {
                    continue;
                };
                let Some((name, version)) = split_package_key(key) else {
                    continue;
                };

                let version = version
                    .or_else(|| details.get("version").and_then(Value::as_str))
                    .unwrap_or(UNKNOWN_VERSION);

                let isdirect = roots.contains(&name);
                packages.insert(Package::new(PurlType::Npm, name, version, isdirect));
            }
        }

        Ok(roots.complete(packages, PurlType::Npm))
    }
}

/// Collects the dependency groups of every importer.
///
/// Single-project lockfiles before v6 keep the groups at the top level.
fn direct_dependencies(lockfile: &Value) -> DirectDependencies {
    let mut roots = DirectDependencies::default();

    let importers: Vec<&Value> = match lockfile.get("importers").and_then(Value::as_mapping) {
        Some(importers) => importers.values().collect(),
        None => vec![lockfile],
    };

    for importer in importers {
        for group in NPM_DEPENDENCY_GROUPS {
            let Some(deps) = importer.get(group).and_then(Value::as_mapping) else {
                continue;
            };
            for (name, spec) in deps {
                let Some(name) = name.as_str() else {
                    continue;
                };
                roots.add(name, importer_version(spec));
            }
        }
    }

    roots
}

/// Version of an importer entry: `1.0.0` (v5) or `{specifier, version}` (v6+).
fn importer_version(spec: &Value) -> &str {
    let raw = match spec {
        Value::String(version) => Some(version.as_str()),
        Value::Mapping(_) => spec.get("version").and_then(Value::as_str),
        _ => None,
    };
    raw.map(strip_peer_suffix).unwrap_or(UNKNOWN_VERSION)
}

/// Splits a `packages` key into name and version.
///
/// Handles `/name/1.0.0`, `/@scope/name/1.0.0` (v5, with optional `_peer`
/// suffix) and `/name@1.0.0`, `@scope/name@1.0.0(peer)` (v6+). A scoped key
/// without a version segment returns no version.
fn split_package_key(key: &str) -> Option<(String, Option<&str>)> {
    let key = key.trim_matches('/');
    let key = key.split('(').next().unwrap_or(key);

    let (scope, rest) = match key.strip_prefix('@') {
        Some(scoped) => {
            let (scope, rest) = scoped.split_once('/')?;
            (Some(scope), rest)
        }
        None => (None, key),
    };

    let at = rest.find('@');
    let slash = rest.find('/');

    let (base, version) = match (at, slash) {
        (Some(at), Some(slash)) if at < slash => (&rest[..at], Some(&rest[at + 1..])),
        (Some(at), None) => (&rest[..at], Some(&rest[at + 1..])),
        (_, Some(slash)) => {
            let version = &rest[slash + 1..];
            (&rest[..slash], version.split('/').next())
        }
        (None, None) if scope.is_some() => (rest, None),
        (None, None) => return None,
    };

    if base.is_empty() {
        return None;
    }

    let name = match scope {
        Some(scope) => format!("@{}/{}", scope, base),
        None => base.to_string(),
    };
    let version = version.map(strip_peer_suffix).filter(|v| !v.is_empty());

    Some((name, version))
}

/// Drops pnpm peer-dependency decorations from a resolved version.
fn strip_peer_suffix(version: &str) -> &str {
    let version = version.split('(').next().unwrap_or(version);
    version.split('_').next().unwrap_or(version)
}
