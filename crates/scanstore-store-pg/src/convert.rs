//! Conversions between the pure domain types in `scanstore-store-traits`
//! and this crate's Diesel row types.

use scanstore_store_traits::{
    ArchOperation, Distribution, NormalizedSeverity, Package, PackageKind, Range, Repository, Version,
    Vulnerability,
};

use crate::models::indexer::PackageRow;
use crate::models::matcher::{NewVulnRow, VulnRow};

pub fn package_kind_from_str(s: &str) -> PackageKind {
    match s {
        "source" => PackageKind::Source,
        _ => PackageKind::Binary,
    }
}

/// Reconstructs a domain `Package` from its stored row, without its
/// `source` back-pointer (callers that need the source resolve it
/// separately, since the row itself only carries a foreign key).
pub fn package_from_row(row: &PackageRow) -> Package {
    let normalized_version = row.normalized_version_kind.as_ref().map(|kind| {
        let mut components = [0i32; 10];
        if let Some(v) = &row.normalized_version {
            for (slot, value) in components.iter_mut().zip(v.iter()) {
                *slot = *value;
            }
        }
        Version::new(kind.clone(), components)
    });

    Package {
        name: row.name.clone(),
        kind: package_kind_from_str(&row.kind),
        version: row.version.clone(),
        normalized_version,
        module: row.module.clone(),
        arch: row.arch.clone(),
        source: None,
    }
}

pub fn arch_operation_to_str(op: ArchOperation) -> &'static str {
    match op {
        ArchOperation::Any => "any",
        ArchOperation::Equals => "equals",
        ArchOperation::NotEquals => "not_equals",
        ArchOperation::PatternMatch => "pattern_match",
    }
}

pub fn arch_operation_from_str(s: &str) -> ArchOperation {
    match s {
        "equals" => ArchOperation::Equals,
        "not_equals" => ArchOperation::NotEquals,
        "pattern_match" => ArchOperation::PatternMatch,
        _ => ArchOperation::Any,
    }
}

pub fn normalized_severity_to_str(s: NormalizedSeverity) -> &'static str {
    match s {
        NormalizedSeverity::Unknown => "unknown",
        NormalizedSeverity::Negligible => "negligible",
        NormalizedSeverity::Low => "low",
        NormalizedSeverity::Medium => "medium",
        NormalizedSeverity::High => "high",
        NormalizedSeverity::Critical => "critical",
    }
}

pub fn normalized_severity_from_str(s: &str) -> NormalizedSeverity {
    match s {
        "negligible" => NormalizedSeverity::Negligible,
        "low" => NormalizedSeverity::Low,
        "medium" => NormalizedSeverity::Medium,
        "high" => NormalizedSeverity::High,
        "critical" => NormalizedSeverity::Critical,
        _ => NormalizedSeverity::Unknown,
    }
}

pub fn new_vuln_row(v: &Vulnerability) -> NewVulnRow {
    let hash = v.content_hash().to_vec();
    NewVulnRow {
        hash_kind: "md5".to_string(),
        hash,
        name: v.name.clone(),
        updater: v.updater.clone(),
        description: v.description.clone(),
        issued: v.issued,
        severity: v.severity.clone(),
        normalized_severity: normalized_severity_to_str(v.normalized_severity).to_string(),
        package_name: v.package_name.clone(),
        dist_did: v.distribution.as_ref().map(|d| d.did.clone()),
        dist_name: v.distribution.as_ref().map(|d| d.name.clone()),
        dist_version: v.distribution.as_ref().map(|d| d.version.clone()),
        dist_version_id: v.distribution.as_ref().map(|d| d.version_id.clone()),
        dist_version_code_name: v.distribution.as_ref().map(|d| d.version_code_name.clone()),
        dist_pretty_name: v.distribution.as_ref().map(|d| d.pretty_name.clone()),
        dist_arch: v.distribution.as_ref().map(|d| d.arch.clone()),
        dist_cpe: v.distribution.as_ref().map(|d| d.cpe.clone()),
        repo_name: v.repository.as_ref().map(|r| r.name.clone()),
        repo_key: v.repository.as_ref().map(|r| r.key.clone()),
        repo_uri: v.repository.as_ref().map(|r| r.uri.clone()),
        repo_cpe: v.repository.as_ref().map(|r| r.cpe.clone()),
        fixed_in_version: v.fixed_in_version.clone(),
        arch_operation: arch_operation_to_str(v.arch_operation).to_string(),
        arch: v.arch.clone(),
        range_kind: v.vulnerable_range.kind().map(|s| s.to_string()),
        range_lower: v
            .vulnerable_range
            .lower
            .as_ref()
            .map(|ver| ver.components.to_vec()),
        range_upper: v
            .vulnerable_range
            .upper
            .as_ref()
            .map(|ver| ver.components.to_vec()),
        range_empty: v.vulnerable_range.is_empty(),
    }
}

pub fn distribution_from_row(row: &VulnRow) -> Option<Distribution> {
    let did = row.dist_did.clone()?;
    Some(Distribution {
        did,
        name: row.dist_name.clone().unwrap_or_default(),
        version: row.dist_version.clone().unwrap_or_default(),
        version_id: row.dist_version_id.clone().unwrap_or_default(),
        version_code_name: row.dist_version_code_name.clone().unwrap_or_default(),
        pretty_name: row.dist_pretty_name.clone().unwrap_or_default(),
        arch: row.dist_arch.clone().unwrap_or_default(),
        cpe: row.dist_cpe.clone().unwrap_or_default(),
    })
}

pub fn repository_from_row(row: &VulnRow) -> Option<Repository> {
    let name = row.repo_name.clone()?;
    Some(Repository {
        name,
        key: row.repo_key.clone().unwrap_or_default(),
        uri: row.repo_uri.clone().unwrap_or_default(),
        cpe: row.repo_cpe.clone().unwrap_or_default(),
    })
}

fn components_from_vec(v: &[i32]) -> [i32; 10] {
    let mut out = [0i32; 10];
    for (slot, value) in out.iter_mut().zip(v.iter()) {
        *slot = *value;
    }
    out
}

pub fn range_from_row(row: &VulnRow) -> Range {
    if row.range_empty {
        return Range::empty();
    }
    let kind = row.range_kind.clone().unwrap_or_default();
    let lower = row
        .range_lower
        .as_ref()
        .map(|v| Version::new(kind.clone(), components_from_vec(v)));
    let upper = row
        .range_upper
        .as_ref()
        .map(|v| Version::new(kind.clone(), components_from_vec(v)));
    Range::new(lower, upper)
}

pub fn vulnerability_from_row(row: &VulnRow) -> Vulnerability {
    Vulnerability {
        name: row.name.clone(),
        updater: row.updater.clone(),
        description: row.description.clone(),
        issued: row.issued,
        severity: row.severity.clone(),
        normalized_severity: normalized_severity_from_str(&row.normalized_severity),
        package_name: row.package_name.clone(),
        distribution: distribution_from_row(row),
        repository: repository_from_row(row),
        fixed_in_version: row.fixed_in_version.clone(),
        arch_operation: arch_operation_from_str(&row.arch_operation),
        arch: row.arch.clone(),
        vulnerable_range: range_from_row(row),
    }
}
