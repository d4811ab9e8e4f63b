use crate::model::{Package, ScanResult, UNKNOWN_VERSION};
use anyhow::Result;
use tabled::{settings::Style, Table, Tabled};

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

#[derive(Tabled)]
struct PackageRow {
    #[tabled(rename = "Package")]
    name: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Vulns")]
    vulns: String,
    #[tabled(rename = "Action")]
    action: String,
}

pub fn print_cli_table(result: &ScanResult) -> Result<()> {
    print!("{}", render_report(result));
    Ok(())
}

/// Renders findings per affected package followed by a summary table.
pub fn render_report(result: &ScanResult) -> String {
    let mut lines: Vec<String> = Vec::new();
    let vulnerable: Vec<&Package> = result.vulnerable_packages().collect();

    if !vulnerable.is_empty() {
        lines.push(String::new());
        lines.push(format!(
            "{}Vulnerability details ({} packages affected){}",
            RED,
            vulnerable.len(),
            RESET
        ));

        for pkg in &vulnerable {
            lines.push(String::new());
            lines.push(format!("{}@{}  {}{}{}", pkg.name, pkg.version, DIM, pkg.purl, RESET));
            for vuln in &pkg.vulnerabilities {
                let summary = vuln.summary.as_deref().unwrap_or("No summary provided.");
                lines.push(format!("  {}{}{}: {}", RED, vuln.id, RESET, truncate(summary, 100)));
                lines.push(match &vuln.safe_version {
                    Some(fixed) => format!("    {}Fix available: {}{}", GREEN, fixed, RESET),
                    None => format!("    {}No fix version identified{}", DIM, RESET),
                });
            }
        }
    }

    lines.push(String::new());
    lines.push(format!("Scan summary ({}):", result.ecosystem));
    lines.push(String::new());

    if result.packages.is_empty() {
        lines.push("No packages found.".to_string());
        return finish(lines);
    }

    let mut packages: Vec<&Package> = result.packages.iter().collect();
    packages.sort_by(|a, b| {
        b.vulnerabilities
            .len()
            .cmp(&a.vulnerabilities.len())
            .then(b.isdirect.cmp(&a.isdirect))
    });

    let rows: Vec<PackageRow> = packages.into_iter().map(package_row).collect();
    lines.push(Table::new(rows).with(Style::rounded()).to_string());
    lines.push(String::new());

    let unknown = result
        .packages
        .iter()
        .filter(|p| p.version == UNKNOWN_VERSION)
        .count();
    let direct = result.direct_count();
    let mut counts = format!(
        "  Packages: {} direct, {} transitive",
        direct,
        result.packages.len() - direct
    );
    if unknown > 0 {
        counts.push_str(&format!(" ({} with unknown version)", unknown));
    }
    lines.push(counts);

    let total = result.total_vulnerabilities();
    lines.push(if total == 0 {
        format!(
            "{}No vulnerabilities found in {} packages.{}",
            GREEN,
            result.packages.len(),
            RESET
        )
    } else {
        format!(
            "{}Found {} vulnerabilities in {} packages.{}",
            RED,
            total,
            vulnerable.len(),
            RESET
        )
    });

    finish(lines)
}

/// Joins report lines, terminating the last one.
fn finish(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn package_row(pkg: &Package) -> PackageRow {
    let count = pkg.vulnerabilities.len();

    let (status, vulns, action) = if count > 0 {
        let action = match pkg.vulnerabilities.iter().find_map(|v| v.safe_version.as_deref()) {
            Some(fixed) => format!("Upgrade to {}", fixed),
            None => "Check details".to_string(),
        };
        (format!("{}✖{}", RED, RESET), format!("{}{}{}", RED, count, RESET), action)
    } else {
        (format!("{}✔{}", GREEN, RESET), "0".to_string(), "-".to_string())
    };

    // Transitive dependencies are shown dimmed
    let (name, version) = if pkg.isdirect {
        (truncate(&pkg.name, 50), format_version(&pkg.version))
    } else {
        (
            format!("{}{}{}", DIM, truncate(&pkg.name, 50), RESET),
            format!("{}{}{}", DIM, format_version(&pkg.version), RESET),
        )
    };

    PackageRow {
        name,
        version,
        status,
        vulns,
        action,
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

fn format_version(version: &str) -> String {
    if version == UNKNOWN_VERSION {
        "-".to_string()
    } else {
        truncate(version, 30)
    }
}
