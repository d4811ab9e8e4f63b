use super::NPM_DEPENDENCY_GROUPS;
use crate::error::ExtractError;
use crate::model::{
    EcosystemDescriptor, Format, Package, PackageSet, PurlType, Role, UNKNOWN_VERSION,
};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Extracts declared dependencies from `package.json`.
pub struct PackageJsonExtractor;

impl super::Extractor for PackageJsonExtractor {
    fn name(&self) -> &'static str {
        "package.json"
    }

    fn supports(&self, descriptor: &EcosystemDescriptor) -> bool {
        descriptor.is_ecosystem("npm")
            && descriptor.format == Format::Json
            && (descriptor.role == Role::Manifest || descriptor.path.ends_with("package.json"))
    }

    fn extract(&self, content: &str) -> Result<Vec<Package>, ExtractError> {
        let json: Value = serde_json::from_str(content)?;
        let mut packages = PackageSet::new();

        for group in NPM_DEPENDENCY_GROUPS {
            let Some(deps) = json.get(group).and_then(Value::as_object) else {
                continue;
            };
            for (name, spec) in deps {
                let version = spec.as_str().unwrap_or(UNKNOWN_VERSION);
                packages.insert(Package::new(PurlType::Npm, name, version, true));
            }
        }

        Ok(packages.into_vec())
    }
}

/// Extracts the resolved tree from `package-lock.json` (v1, v2 and v3).
pub struct PackageLockExtractor;

impl super::Extractor for PackageLockExtractor {
    fn name(&self) -> &'static str {
        "package-lock.json"
    }

    fn supports(&self, descriptor: &EcosystemDescriptor) -> bool {
        descriptor.is_ecosystem("npm")
            && descriptor.format == Format::Json
            && descriptor.role == Role::Lockfile
    }

    fn extract(&self, content: &str) -> Result<Vec<Package>, ExtractError> {
        let json: Value = serde_json::from_str(content)?;
        let roots = DirectDependencies::from_lockfile(&json);
        let mut packages = PackageSet::new();

        if let Some(installed) = json.get("packages").and_then(Value::as_object) {
            for (path, details) in installed {
                if path.is_empty() {
                    continue;
                }

                let name = package_name_from_path(path);
                if name.is_empty() {
                    continue;
                }

                let version = details
                    .get("version")
                    .and_then(Value::as_str)
                    .or_else(|| roots.version_of(name))
                    .unwrap_or(UNKNOWN_VERSION);

                packages.insert(Package::new(PurlType::Npm, name, version, roots.contains(name)));
            }
        } else if let Some(deps) = json.get("dependencies").and_then(Value::as_object) {
            for (name, details) in deps {
                let version = legacy_version(details);
                packages.insert(Package::new(PurlType::Npm, name, version, roots.contains(name)));
            }
        }

        Ok(roots.complete(packages, PurlType::Npm))
    }
}

/// Name of the package installed at a `node_modules` path.
///
/// `node_modules/a/node_modules/@s/b` resolves to `@s/b`.
fn package_name_from_path(path: &str) -> &str {
    path.rsplit("node_modules/").next().unwrap_or(path)
}

fn legacy_version(details: &Value) -> &str {
    let version = match details {
        Value::Object(map) => map.get("version").and_then(Value::as_str),
        Value::String(version) => Some(version.as_str()),
        _ => None,
    };
    version.unwrap_or(UNKNOWN_VERSION)
}

/// Names a project declares itself, with the versions the root lists for them.
#[derive(Debug, Default)]
pub(crate) struct DirectDependencies {
    names: HashSet<String>,
    // Insertion order keeps output stable for roots missing from the tree
    order: Vec<String>,
    versions: HashMap<String, String>,
}

impl DirectDependencies {
    pub(crate) fn add(&mut self, name: &str, version: &str) {
        if self.names.insert(name.to_string()) {
            self.order.push(name.to_string());
        }
        self.versions.insert(name.to_string(), version.to_string());
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub(crate) fn version_of(&self, name: &str) -> Option<&str> {
        self.versions.get(name).map(String::as_str)
    }

    /// Reads the root entry of `packages`, or the legacy `dependencies` map.
    fn from_lockfile(json: &Value) -> Self {
        let mut roots = DirectDependencies::default();

        if let Some(root) = json.get("packages").and_then(|p| p.get("")) {
            for group in NPM_DEPENDENCY_GROUPS {
                let Some(deps) = root.get(group).and_then(Value::as_object) else {
                    continue;
                };
                for (name, spec) in deps {
                    roots.add(name, spec.as_str().unwrap_or(UNKNOWN_VERSION));
                }
            }
        } else if let Some(deps) = json.get("dependencies").and_then(Value::as_object) {
            for (name, details) in deps {
                roots.add(name, legacy_version(details));
            }
        }

        roots
    }

    /// Marks every root as direct, adding any the resolved tree never listed.
    pub(crate) fn complete(&self, mut packages: PackageSet, purl_type: PurlType) -> Vec<Package> {
        for name in &self.order {
            let version = self.version_of(name).unwrap_or(UNKNOWN_VERSION);
            packages.insert(Package::new(purl_type, name, version, true));
        }
        packages.into_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Extractor;

    fn find<'a>(packages: &'a [Package], name: &str) -> &'a Package {
        packages.iter().find(|p| p.name == name).expect(name)
    }

    #[test]
    fn test_package_json_groups_are_direct() {
        let content = r#"{
            "name": "app",
            "dependencies": {"express": "^4.18.2", "@babel/core": "7.22.0"},
            "devDependencies": {"jest": "29.0.0"},
            "optionalDependencies": {"fsevents": "2.3.2"},
            "peerDependencies": {"react": "18.0.0"}
        }"#;
        let packages = PackageJsonExtractor.extract(content).unwrap();

        assert_eq!(packages.len(), 4);
        assert!(packages.iter().all(|p| p.isdirect));
        assert_eq!(find(&packages, "express").purl, "pkg:npm/express@^4.18.2");
        assert_eq!(find(&packages, "@babel/core").purl, "pkg:npm/%40babel/core@7.22.0");
    }

    #[test]
    fn test_package_json_same_name_in_two_groups() {
        let content = r#"{
            "dependencies": {"typescript": "5.0.0"},
            "devDependencies": {"typescript": "5.1.0"}
        }"#;
        let packages = PackageJsonExtractor.extract(content).unwrap();

        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].version, "5.0.0");
    }

    #[test]
    fn test_package_json_malformed() {
        assert!(PackageJsonExtractor.extract("{ not json").is_err());
    }

    #[test]
    fn test_package_lock_v2() {
        let content = r#"{
            "name": "app",
            "lockfileVersion": 3,
            "packages": {
                "": {
                    "name": "app",
                    "dependencies": {"express": "^4.18.2"},
                    "devDependencies": {"@types/node": "^20.0.0"}
                },
                "node_modules/express": {"version": "4.18.2"},
                "node_modules/@types/node": {"version": "20.4.1"},
                "node_modules/debug": {"version": "2.6.9"},
                "node_modules/express/node_modules/debug": {"version": "4.3.4"},
                "node_modules/send/node_modules/@scope/ms": {"version": "2.1.3"}
            }
        }"#;
        let packages = PackageLockExtractor.extract(content).unwrap();

        assert_eq!(packages.len(), 4);

        let express = find(&packages, "express");
        assert!(express.isdirect);
        assert_eq!(express.version, "4.18.2");

        assert!(find(&packages, "@types/node").isdirect);

        let debug = find(&packages, "debug");
        assert!(!debug.isdirect);
        assert_eq!(debug.version, "2.6.9");

        assert_eq!(find(&packages, "@scope/ms").purl, "pkg:npm/%40scope/ms@2.1.3");
    }

    #[test]
    fn test_package_lock_version_falls_back_to_root() {
        let content = r#"{
            "packages": {
                "": {"dependencies": {"left-pad": "1.3.0"}},
                "node_modules/left-pad": {"resolved": "https://example.invalid/left-pad.tgz"},
                "node_modules/orphan": {}
            }
        }"#;
        let packages = PackageLockExtractor.extract(content).unwrap();

        assert_eq!(find(&packages, "left-pad").version, "1.3.0");
        assert_eq!(find(&packages, "orphan").version, UNKNOWN_VERSION);
    }

    #[test]
    fn test_package_lock_upgrades_unknown_version() {
        let content = r#"{
            "packages": {
                "": {},
                "node_modules/a/node_modules/ms": {},
                "node_modules/ms": {"version": "2.1.3"}
            }
        }"#;
        let packages = PackageLockExtractor.extract(content).unwrap();

        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].version, "2.1.3");
        assert_eq!(packages[0].purl, "pkg:npm/ms@2.1.3");
    }

    #[test]
    fn test_package_lock_v1_legacy() {
        let content = r#"{
            "lockfileVersion": 1,
            "dependencies": {
                "lodash": {"version": "4.17.20"},
                "chalk": "2.4.2"
            }
        }"#;
        let packages = PackageLockExtractor.extract(content).unwrap();

        assert_eq!(packages.len(), 2);
        assert!(packages.iter().all(|p| p.isdirect));
        assert_eq!(find(&packages, "chalk").version, "2.4.2");
    }

    #[test]
    fn test_package_lock_root_missing_from_tree() {
        let content = r#"{
            "packages": {
                "": {"dependencies": {"ghost": "1.0.0"}},
                "node_modules/real": {"version": "1.0.0"}
            }
        }"#;
        let packages = PackageLockExtractor.extract(content).unwrap();

        assert_eq!(packages.len(), 2);
        let ghost = find(&packages, "ghost");
        assert!(ghost.isdirect);
        assert_eq!(ghost.version, "1.0.0");
    }
}
