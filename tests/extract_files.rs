//! Detection and extraction against project directories on disk

use std::fs;

use depscan::detect::resolve_local;
use depscan::{extract, Config, EcosystemDescriptor, Format, Role};

#[test]
fn test_go_module_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("go.mod"),
        r#"module example.com/app

go 1.21

toolchain go1.21.5

require (
    github.com/pkg/errors v0.9.1
    golang.org/x/net v0.17.0 // indirect
)

replace (
    github.com/old/thing v1.0.0 => github.com/new/thing v1.1.0
)

exclude github.com/bad/mod v0.0.1
"#,
    )
    .unwrap();

    let descriptor = resolve_local(dir.path(), &Config::default()).unwrap();
    let extraction = extract(&descriptor);

    assert_eq!(extraction.ecosystem, "Go");
    assert_eq!(extraction.packages.len(), 2);

    let errors = &extraction.packages[0];
    assert_eq!(errors.name, "github.com/pkg/errors");
    assert_eq!(errors.purl, "pkg:golang/github.com/pkg/errors@v0.9.1");
    assert!(errors.isdirect);

    let net = &extraction.packages[1];
    assert_eq!(net.name, "golang.org/x/net");
    assert!(!net.isdirect);
}

#[test]
fn test_npm_lockfile_preferred_over_manifest() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("package.json"),
        r#"{"dependencies": {"express": "^4.18.2"}}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("package-lock.json"),
        r#"{
            "lockfileVersion": 3,
            "packages": {
                "": {"dependencies": {"express": "^4.18.2"}},
                "node_modules/express": {"version": "4.18.2"},
                "node_modules/accepts": {"version": "1.3.8"}
            }
        }"#,
    )
    .unwrap();

    let descriptor = resolve_local(dir.path(), &Config::default()).unwrap();
    assert_eq!(descriptor.role, Role::Lockfile);

    let extraction = extract(&descriptor);
    assert_eq!(extraction.ecosystem, "npm");
    assert_eq!(extraction.packages.len(), 2);

    let express = extraction
        .packages
        .iter()
        .find(|p| p.name == "express")
        .unwrap();
    assert_eq!(express.version, "4.18.2");
    assert!(express.isdirect);
}

#[test]
fn test_missing_file_yields_empty_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let descriptor = EcosystemDescriptor::new(
        "npm",
        dir.path().join("package.json"),
        Format::Json,
        Role::Manifest,
    );

    let extraction = extract(&descriptor);
    assert_eq!(extraction.ecosystem, "npm");
    assert!(extraction.packages.is_empty());
}

#[test]
fn test_malformed_file_yields_empty_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pnpm-lock.yaml");
    fs::write(&path, "importers: [unclosed\n  - {").unwrap();

    let descriptor = EcosystemDescriptor::new("npm", path, Format::Yaml, Role::Lockfile);
    let extraction = extract(&descriptor);

    assert!(extraction.packages.is_empty());
}

#[test]
fn test_yarn_lock_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("package.json"), r#"{"dependencies": {"ms": "^2.1.0"}}"#).unwrap();
    fs::write(
        dir.path().join("yarn.lock"),
        r#"# THIS IS AN AUTOGENERATED FILE. DO NOT EDIT THIS FILE DIRECTLY.
# yarn lockfile v1


ms@^2.1.0:
  version "2.1.3"
  resolved "https://registry.yarnpkg.com/ms/-/ms-2.1.3.tgz"
"#,
    )
    .unwrap();

    let descriptor = resolve_local(dir.path(), &Config::default()).unwrap();
    assert_eq!(descriptor.format, Format::Yarn);

    let extraction = extract(&descriptor);
    assert_eq!(extraction.packages.len(), 1);
    assert_eq!(extraction.packages[0].purl, "pkg:npm/ms@2.1.3");
}
