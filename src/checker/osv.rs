use super::matching::{match_affected, resolve_safe_version};
use crate::config::OsvConfig;
use crate::error::CheckError;
use crate::model::{Affected, Finding, Package, Reference, ScanResult};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::debug;

/// `(vulnerability id, purl)` a finding is looked up by.
type FindingKey = (String, String);

/// Two-phase client for the OSV API.
///
/// Phase one asks `/v1/querybatch` which vulnerability ids may affect each
/// package; phase two fetches each `(id, purl)` pair from `/v1/vulns/{id}`
/// concurrently and keeps the ones whose record matches the package.
pub struct OsvChecker {
    client: reqwest::Client,
    base_url: String,
    batch_size: usize,
    max_connections: usize,
}

impl OsvChecker {
    pub fn new(config: &OsvConfig) -> Result<Self, CheckError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("depscan/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(config.max_keepalive_connections)
            .build()
            .map_err(CheckError::Client)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            batch_size: config.batch_size.max(1),
            max_connections: config.max_connections.max(1),
        })
    }

    /// Returns the ids reported for each package, index-aligned with `packages`.
    async fn query_batch(&self, packages: &[Package]) -> Result<Vec<Vec<String>>, CheckError> {
        let url = format!("{}/v1/querybatch", self.base_url);
        let mut ids = Vec::with_capacity(packages.len());

        for chunk in packages.chunks(self.batch_size) {
            let batch_query = OsvBatchQuery {
                queries: chunk
                    .iter()
                    .map(|pkg| OsvQuery {
                        package: OsvQueryPackage {
                            purl: pkg.purl.clone(),
                        },
                    })
                    .collect(),
            };

            let response = self
                .client
                .post(&url)
                .json(&batch_query)
                .send()
                .await
                .map_err(|source| CheckError::Connectivity {
                    url: url.clone(),
                    source,
                })?;

            if !response.status().is_success() {
                return Err(CheckError::Status {
                    url,
                    status: response.status(),
                });
            }

            let batch_response: OsvBatchResponse =
                response.json().await.map_err(|source| CheckError::Decode {
                    url: url.clone(),
                    source,
                })?;

            let mut results = batch_response.results.into_iter();
            for _ in chunk {
                let vulns = results.next().and_then(|r| r.vulns).unwrap_or_default();
                ids.push(vulns.into_iter().map(|v| v.id).collect());
            }
        }

        Ok(ids)
    }

    /// Fetches one record and reduces it to the finding for `purl`.
    ///
    /// Any failure resolves to `None` so siblings are unaffected.
    async fn fetch_finding(&self, id: &str, purl: &str) -> Option<Finding> {
        let url = format!("{}/v1/vulns/{}", self.base_url, id);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(%id, %purl, "vulnerability fetch failed: {}", e);
                return None;
            }
        };

        if !response.status().is_success() {
            debug!(%id, %purl, status = %response.status(), "vulnerability fetch rejected");
            return None;
        }

        let record: OsvVulnerability = match response.json().await {
            Ok(record) => record,
            Err(e) => {
                debug!(%id, "malformed vulnerability record: {}", e);
                return None;
            }
        };

        let Some(matched) = match_affected(&record.affected, purl) else {
            debug!(%id, %purl, "no affected entry matches package");
            return None;
        };

        let safe_version = resolve_safe_version(matched).map(|v| v.to_string());

        Some(Finding {
            id: record.id,
            summary: record.summary,
            details: record.details,
            affected: matched.clone(),
            published: record.published,
            modified: record.modified,
            references: record.references,
            safe_version,
        })
    }

    /// Fetches every pair with at most `max_connections` requests in flight.
    async fn fetch_findings(&self, pairs: Vec<FindingKey>) -> HashMap<FindingKey, Finding> {
        let outcomes: Vec<(FindingKey, Option<Finding>)> = stream::iter(pairs)
            .map(|(id, purl)| async move {
                let finding = self.fetch_finding(&id, &purl).await;
                ((id, purl), finding)
            })
            .buffer_unordered(self.max_connections)
            .collect()
            .await;

        outcomes
            .into_iter()
            .filter_map(|(key, finding)| finding.map(|f| (key, f)))
            .collect()
    }
}

/// Distinct `(id, purl)` pairs in first-seen order.
fn distinct_pairs(packages: &[Package], ids: &[Vec<String>]) -> Vec<FindingKey> {
    let mut seen = HashSet::new();
    let mut pairs = Vec::new();

    for (package, package_ids) in packages.iter().zip(ids) {
        for id in package_ids {
            let key = (id.clone(), package.purl.clone());
            if seen.insert(key.clone()) {
                pairs.push(key);
            }
        }
    }

    pairs
}

#[async_trait]
impl super::VulnerabilityChecker for OsvChecker {
    fn name(&self) -> &'static str {
        "OSV.dev"
    }

    async fn check(&self, ecosystem: &str, packages: Vec<Package>) -> Result<ScanResult, CheckError> {
        if packages.is_empty() {
            return Ok(ScanResult::new(ecosystem, packages));
        }

        let ids = self.query_batch(&packages).await?;
        let pairs = distinct_pairs(&packages, &ids);
        debug!(
            packages = packages.len(),
            findings = pairs.len(),
            "batch query complete"
        );

        let lookup = self.fetch_findings(pairs).await;

        let packages = packages
            .into_iter()
            .zip(ids)
            .map(|(mut package, package_ids)| {
                for id in package_ids {
                    let key = (id, package.purl.clone());
                    if let Some(finding) = lookup.get(&key) {
                        package.vulnerabilities.push(finding.clone());
                    }
                }
                package
            })
            .collect();

        Ok(ScanResult::new(ecosystem, packages))
    }
}

#[derive(Serialize)]
struct OsvBatchQuery {
    queries: Vec<OsvQuery>,
}

#[derive(Serialize)]
struct OsvQuery {
    package: OsvQueryPackage,
}

#[derive(Serialize)]
struct OsvQueryPackage {
    purl: String,
}

#[derive(Deserialize)]
struct OsvBatchResponse {
    #[serde(default)]
    results: Vec<OsvBatchResult>,
}

#[derive(Deserialize)]
struct OsvBatchResult {
    vulns: Option<Vec<OsvVulnId>>,
}

#[derive(Deserialize)]
struct OsvVulnId {
    id: String,
}

#[derive(Deserialize)]
struct OsvVulnerability {
    id: String,
    summary: Option<String>,
    details: Option<String>,
    #[serde(default)]
    affected: Vec<Affected>,
    published: Option<String>,
    modified: Option<String>,
    #[serde(default)]
    references: Vec<Reference>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::VulnerabilityChecker;
    use crate::model::PurlType;

    #[test]
    fn test_distinct_pairs() {
        let packages = vec![
            Package::new(PurlType::Npm, "a", "1.0.0", true),
            Package::new(PurlType::Npm, "b", "1.0.0", false),
        ];
        let ids = vec![
            vec!["GHSA-1".to_string(), "GHSA-1".to_string()],
            vec!["GHSA-1".to_string(), "GHSA-2".to_string()],
        ];

        let pairs = distinct_pairs(&packages, &ids);
        assert_eq!(
            pairs,
            vec![
                ("GHSA-1".to_string(), "pkg:npm/a@1.0.0".to_string()),
                ("GHSA-1".to_string(), "pkg:npm/b@1.0.0".to_string()),
                ("GHSA-2".to_string(), "pkg:npm/b@1.0.0".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_package_list_skips_network() {
        let config = OsvConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..OsvConfig::default()
        };
        let checker = OsvChecker::new(&config).unwrap();

        let result = checker.check("npm", Vec::new()).await.unwrap();
        assert_eq!(result.ecosystem, "npm");
        assert!(result.packages.is_empty());
        assert_eq!(checker.name(), "OSV.dev");
    }
}
