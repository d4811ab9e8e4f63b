use crate::model::Affected;
use semver::Version;

/// Picks the `affected` entry that describes the queried package.
///
/// An entry matches when its purl is contained in the queried purl or the
/// other way round, so `pkg:npm/lodash` matches `pkg:npm/lodash@4.17.20`.
/// This also accepts unrelated packages that share a prefix (e.g.
/// `pkg:npm/lodash` against `pkg:npm/lodash.merge@4.6.0`).
pub fn match_affected<'a>(affected: &'a [Affected], purl: &str) -> Option<&'a Affected> {
    affected.iter().find(|entry| {
        entry
            .purl()
            .map(|candidate| purl.contains(candidate) || candidate.contains(purl))
            .unwrap_or(false)
    })
}

/// Highest `fixed` version across the SEMVER ranges of an entry.
///
/// Values that do not parse are skipped. This is the highest known fix,
/// not necessarily the closest upgrade from the installed version.
pub fn resolve_safe_version(affected: &Affected) -> Option<Version> {
    affected
        .ranges
        .iter()
        .filter(|range| range.is_semver())
        .flat_map(|range| range.events.iter())
        .filter_map(|event| event.fixed.as_deref())
        .filter_map(parse_fixed_version)
        .max()
}

/// Parses a fix version, tolerating a `v` prefix and missing minor/patch.
pub fn parse_fixed_version(raw: &str) -> Option<Version> {
    let raw = raw.trim();
    let raw = raw.strip_prefix('v').unwrap_or(raw);

    if let Ok(version) = Version::parse(raw) {
        return Some(version);
    }

    let components: Vec<&str> = raw.split('.').collect();
    let all_numeric = components
        .iter()
        .all(|c| !c.is_empty() && c.chars().all(|ch| ch.is_ascii_digit()));

    if !all_numeric || components.len() >= 3 {
        return None;
    }

    let mut padded = components.join(".");
    for _ in components.len()..3 {
        padded.push_str(".0");
    }
    Version::parse(&padded).ok()
}
