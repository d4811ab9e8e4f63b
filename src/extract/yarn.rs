use crate::error::ExtractError;
use crate::model::{EcosystemDescriptor, Format, Package, PackageSet, PurlType};
use regex::Regex;
use std::sync::LazyLock;

/// Package name at the start of a selector such as `"@babel/core@^7.0.0"`.
static SELECTOR_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^"?((?:@[^/]+/)?[^@/"]+)"#).expect("valid regex"));

/// Block holding yarn berry's own lockfile metadata
const METADATA_BLOCK: &str = "__metadata";

/// Extracts resolved versions from `yarn.lock` (classic and berry).
pub struct YarnLockExtractor;

impl super::Extractor for YarnLockExtractor {
    fn name(&self) -> &'static str {
        "yarn.lock"
    }

    fn supports(&self, descriptor: &EcosystemDescriptor) -> bool {
        descriptor.is_ecosystem("npm") && descriptor.format == Format::Yarn
    }

    fn extract(&self, content: &str) -> Result<Vec<Package>, ExtractError> {
        let mut packages = PackageSet::new();
        let mut current_names: Vec<String> = Vec::new();

        for line in content.lines() {
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }

            if !line.starts_with(' ') {
                current_names = selector_names(line);
                continue;
            }

            let trimmed = line.trim();
            let Some(rest) = trimmed.strip_prefix("version") else {
                continue;
            };
            if current_names.is_empty() {
                continue;
            }

            let version = rest.trim_start_matches(':').trim().trim_matches('"');

            for name in current_names.drain(..) {
                packages.insert(Package::new(PurlType::Npm, name, version, false));
            }
        }

        Ok(packages.into_vec())
    }
}

/// Reduces a block header to the distinct package names it selects.
fn selector_names(header: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();

    for entry in header.trim().trim_end_matches(':').split(',') {
        let Some(captures) = SELECTOR_NAME.captures(entry.trim()) else {
            continue;
        };
        let name = &captures[1];
        if name == METADATA_BLOCK {
            continue;
        }
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Extractor;

    #[test]
    fn test_classic_lockfile() {
        let content = r#"# THIS IS AN AUTOGENERATED FILE. DO NOT EDIT THIS FILE DIRECTLY.
# yarn lockfile v1


"@babel/code-frame@^7.0.0", "@babel/code-frame@^7.22.5":
  version "7.22.5"
  resolved "https://registry.yarnpkg.com/@babel/code-frame/-/code-frame-7.22.5.tgz"
  dependencies:
    "@babel/highlight" "^7.22.5"

lodash@^4.17.20, lodash@^4.17.21:
  version "4.17.21"
  resolved "https://registry.yarnpkg.com/lodash/-/lodash-4.17.21.tgz"
"#;
        let packages = YarnLockExtractor.extract(content).unwrap();

        assert_eq!(packages.len(), 2);
        assert_eq!(packages[0].name, "@babel/code-frame");
        assert_eq!(packages[0].version, "7.22.5");
        assert_eq!(packages[0].purl, "pkg:npm/%40babel/code-frame@7.22.5");
        assert_eq!(packages[1].name, "lodash");
        assert_eq!(packages[1].version, "4.17.21");
        assert!(packages.iter().all(|p| !p.isdirect));
    }

    #[test]
    fn test_block_with_distinct_names() {
        let content = "string-width@^4.1.0, string-width-cjs@npm:string-width@^4.2.0:\n  version \"4.2.3\"\n";
        let packages = YarnLockExtractor.extract(content).unwrap();

        let names: Vec<&str> = packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["string-width", "string-width-cjs"]);
        assert!(packages.iter().all(|p| p.version == "4.2.3"));
    }

    #[test]
    fn test_berry_lockfile() {
        let content = r#"__metadata:
  version: 6
  cacheKey: 8

"@types/node@npm:^20.0.0":
  version: 20.4.1
  resolution: "@types/node@npm:20.4.1"

"ms@npm:2.1.2, ms@npm:^2.1.1":
  version: 2.1.2
"#;
        let packages = YarnLockExtractor.extract(content).unwrap();

        assert_eq!(packages.len(), 2);
        assert_eq!(packages[0].name, "@types/node");
        assert_eq!(packages[0].version, "20.4.1");
        assert_eq!(packages[1].name, "ms");
        assert_eq!(packages[1].version, "2.1.2");
    }

    #[test]
    fn test_same_name_in_two_blocks_is_merged() {
        let content = "ms@2.0.0:\n  version \"2.0.0\"\n\nms@^2.1.1:\n  version \"2.1.3\"\n";
        let packages = YarnLockExtractor.extract(content).unwrap();

        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].version, "2.0.0");
    }

    #[test]
    fn test_selector_names_keeps_scope() {
        assert_eq!(selector_names("\"@scope/pkg@^1.0.0\":"), vec!["@scope/pkg"]);
        assert_eq!(selector_names("plain@1.0.0:"), vec!["plain"]);
    }
}
