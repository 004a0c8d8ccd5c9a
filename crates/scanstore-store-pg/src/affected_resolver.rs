use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::{Array, Bool, Integer};
use diesel_async::RunQueryDsl;
use scanstore_store_traits::{Digest, IndexRecord, Matcher, StoreError, StoreResult, Vulnerability};
use tracing::instrument;

use crate::artifact_writer::{select_dist_id, select_repo_id};
use crate::convert::package_from_row;
use crate::error_map::map_diesel_err;
use crate::models::indexer::PackageRow;
use crate::schema::indexer::{manifest, manifest_index, package};
use crate::store::PgStore;

/// `AffectedManifests(vulnerability, matcher)`: the sole operation that
/// reads from both the indexer and matcher schemas in one call. See
/// the affected-manifest-resolver component for the step-by-step.
#[instrument(skip(store, matcher), fields(vuln = %vuln.name))]
pub async fn affected_manifests(store: &PgStore, vuln: &Vulnerability, matcher: &dyn Matcher) -> StoreResult<Vec<Digest>> {
    if matcher.requires_fixed_in_version() && vuln.fixed_in_version.is_none() {
        return Ok(Vec::new());
    }

    let mut conn = store.connection().await?;

    let dist_id = match &vuln.distribution {
        Some(d) => select_dist_id(&mut conn, d)
            .await
            .optional()
            .map_err(|e| map_diesel_err("affected_manifests", vuln.name.clone(), e))?,
        None => None,
    };
    let repo_id = match &vuln.repository {
        Some(r) => select_repo_id(&mut conn, r)
            .await
            .optional()
            .map_err(|e| map_diesel_err("affected_manifests", vuln.name.clone(), e))?,
        None => None,
    };

    let specifies_context = vuln.distribution.is_some() || vuln.repository.is_some();
    if specifies_context && dist_id.is_none() && repo_id.is_none() {
        return Ok(Vec::new());
    }

    if matcher.version_filter_is_authoritative() && vuln.vulnerable_range.is_empty() {
        return Ok(Vec::new());
    }

    let mut query = package::table
        .filter(package::name.eq(&vuln.package_name))
        .into_boxed();

    if matcher.version_filter_is_authoritative() {
        if let Some(kind) = vuln.vulnerable_range.kind() {
            query = query.filter(package::normalized_version_kind.eq(kind.to_string()));
            if let Some(lower) = &vuln.vulnerable_range.lower {
                query = query.filter(
                    sql::<Bool>("normalized_version >= ").bind::<Array<Integer>, _>(lower.components.to_vec()),
                );
            }
            if let Some(upper) = &vuln.vulnerable_range.upper {
                query = query.filter(
                    sql::<Bool>("normalized_version < ").bind::<Array<Integer>, _>(upper.components.to_vec()),
                );
            }
        }
    }

    let candidates: Vec<PackageRow> = query
        .select(PackageRow::as_select())
        .load(&mut conn)
        .await
        .map_err(|e| map_diesel_err("affected_manifests", vuln.name.clone(), e))?;

    let matched_package_ids: Vec<i32> = candidates
        .iter()
        .filter(|row| {
            let record = IndexRecord {
                package: package_from_row(row),
                distribution: vuln.distribution.clone(),
                repository: vuln.repository.clone(),
            };
            matcher.vulnerable(&record, vuln)
        })
        .map(|row| row.id)
        .collect();

    if matched_package_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut index_query = manifest_index::table
        .filter(manifest_index::package_id.eq_any(&matched_package_ids))
        .into_boxed();
    index_query = match dist_id {
        Some(id) => index_query.filter(manifest_index::dist_id.eq(id)),
        None => index_query.filter(manifest_index::dist_id.is_null()),
    };
    index_query = match repo_id {
        Some(id) => index_query.filter(manifest_index::repo_id.eq(id)),
        None => index_query.filter(manifest_index::repo_id.is_null()),
    };

    let manifest_ids: Vec<i32> = index_query
        .select(manifest_index::manifest_id)
        .distinct()
        .load(&mut conn)
        .await
        .map_err(|e| map_diesel_err("affected_manifests", vuln.name.clone(), e))?;

    if manifest_ids.is_empty() {
        return Ok(Vec::new());
    }

    let digests: Vec<String> = manifest::table
        .filter(manifest::id.eq_any(&manifest_ids))
        .select(manifest::digest)
        .distinct()
        .load(&mut conn)
        .await
        .map_err(|e| map_diesel_err("affected_manifests", vuln.name.clone(), e))?;

    digests
        .into_iter()
        .map(|d| {
            d.parse::<Digest>()
                .map_err(|e| StoreError::internal("affected_manifests", "stored manifest digest", e))
        })
        .collect()
}
