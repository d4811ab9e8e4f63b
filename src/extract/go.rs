use crate::error::ExtractError;
use crate::model::{EcosystemDescriptor, Format, Package, PackageSet, PurlType, Role};
use regex::Regex;
use std::sync::LazyLock;

static REQUIRE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^require\s*\($").expect("valid regex"));
static SKIPPED_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(replace|exclude|retract)\b").expect("valid regex"));
static IGNORED_DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(module|go|toolchain|godebug)\s").expect("valid regex"));
static INDIRECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"//\s*indirect\b").expect("valid regex"));

/// Extracts requirements from `go.mod`.
pub struct GoModExtractor;

impl super::Extractor for GoModExtractor {
    fn name(&self) -> &'static str {
        "go.mod"
    }

    fn supports(&self, descriptor: &EcosystemDescriptor) -> bool {
        descriptor.is_ecosystem("go") && descriptor.format == Format::Gomod
    }

    fn extract(&self, content: &str) -> Result<Vec<Package>, ExtractError> {
        let mut packages = PackageSet::new();
        let mut in_require_block = false;
        // Open parentheses of a replace/exclude/retract block being skipped
        let mut skip_depth: isize = 0;

        for raw_line in content.lines() {
            let line = strip_comment(raw_line).trim();

            if line.is_empty() {
                continue;
            }

            if skip_depth > 0 {
                skip_depth += paren_delta(line);
                continue;
            }

            if SKIPPED_DIRECTIVE.is_match(line) {
                skip_depth = paren_delta(line).max(0);
                continue;
            }

            if REQUIRE_BLOCK.is_match(line) {
                in_require_block = true;
                continue;
            }

            if in_require_block && line == ")" {
                in_require_block = false;
                continue;
            }

            if IGNORED_DIRECTIVE.is_match(line) {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();

            let requirement = if in_require_block {
                parts.first().zip(parts.get(1))
            } else if parts.first() == Some(&"require") {
                parts.get(1).zip(parts.get(2))
            } else {
                None
            };

            let Some((name, version)) = requirement else {
                continue;
            };

            let isdirect = !INDIRECT.is_match(raw_line);
            packages.insert(Package::new(PurlType::Golang, *name, *version, isdirect));
        }

        Ok(packages.into_vec())
    }
}

/// Extracts the full resolved module graph from `go.sum`.
pub struct GoSumExtractor;

impl super::Extractor for GoSumExtractor {
    fn name(&self) -> &'static str {
        "go.sum"
    }

    fn supports(&self, descriptor: &EcosystemDescriptor) -> bool {
        descriptor.is_ecosystem("go")
            && descriptor.format == Format::Text
            && descriptor.role == Role::Checksum
    }

    fn extract(&self, content: &str) -> Result<Vec<Package>, ExtractError> {
        let mut packages = PackageSet::new();

        for line in content.lines() {
            let mut parts = line.split_whitespace();
            let (Some(name), Some(version)) = (parts.next(), parts.next()) else {
                continue;
            };

            let version = version.strip_suffix("/go.mod").unwrap_or(version);

            // A module appears once for its go.mod hash and once for its tree hash
            packages.insert_keyed(
                format!("{}@{}", name, version),
                Package::new(PurlType::Golang, name, version, false),
            );
        }

        Ok(packages.into_vec())
    }
}

/// Code part of a line, without any trailing `//` comment.
fn strip_comment(line: &str) -> &str {
    line.split("//").next().unwrap_or(line)
}

/// Net change in parenthesis depth, ignoring any trailing comment.
fn paren_delta(line: &str) -> isize {
    strip_comment(line)
        .chars()
        .fold(0, |depth, c| match c {
            '(' => depth + 1,
            ')' => depth - 1,
            _ => depth,
        })
}
