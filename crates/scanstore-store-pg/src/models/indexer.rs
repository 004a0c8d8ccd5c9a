use diesel::prelude::*;

use crate::schema::indexer as schema;

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::scanner)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ScannerRow {
    pub id: i32,
    pub name: String,
    pub version: String,
    pub kind: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = schema::scanner)]
pub struct NewScannerRow<'a> {
    pub name: &'a str,
    pub version: &'a str,
    pub kind: &'a str,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::layer)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct LayerRow {
    pub id: i32,
    pub digest: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = schema::layer)]
pub struct NewLayerRow<'a> {
    pub digest: &'a str,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::manifest)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ManifestRow {
    pub id: i32,
    pub digest: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = schema::manifest)]
pub struct NewManifestRow<'a> {
    pub digest: &'a str,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = schema::manifest_layer)]
pub struct NewManifestLayerRow {
    pub manifest_id: i32,
    pub layer_id: i32,
    pub index: i32,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::package)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PackageRow {
    pub id: i32,
    pub name: String,
    pub kind: String,
    pub version: String,
    pub normalized_version_kind: Option<String>,
    pub normalized_version: Option<Vec<i32>>,
    pub module: String,
    pub arch: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = schema::package)]
pub struct NewPackageRow<'a> {
    pub name: &'a str,
    pub kind: &'a str,
    pub version: &'a str,
    pub normalized_version_kind: Option<&'a str>,
    pub normalized_version: Option<Vec<i32>>,
    pub module: &'a str,
    pub arch: &'a str,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = schema::package_scanartifact)]
pub struct NewPackageScanArtifactRow {
    pub package_id: i32,
    pub source_id: i32,
    pub layer_id: i32,
    pub scanner_id: i32,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::dist)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DistRow {
    pub id: i32,
    pub did: String,
    pub name: String,
    pub version: String,
    pub version_id: String,
    pub version_code_name: String,
    pub pretty_name: String,
    pub arch: String,
    pub cpe: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = schema::dist)]
pub struct NewDistRow<'a> {
    pub did: &'a str,
    pub name: &'a str,
    pub version: &'a str,
    pub version_id: &'a str,
    pub version_code_name: &'a str,
    pub pretty_name: &'a str,
    pub arch: &'a str,
    pub cpe: &'a str,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = schema::dist_scanartifact)]
pub struct NewDistScanArtifactRow {
    pub dist_id: i32,
    pub layer_id: i32,
    pub scanner_id: i32,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::repo)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RepoRow {
    pub id: i32,
    pub name: String,
    pub key: String,
    pub uri: String,
    pub cpe: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = schema::repo)]
pub struct NewRepoRow<'a> {
    pub name: &'a str,
    pub key: &'a str,
    pub uri: &'a str,
    pub cpe: &'a str,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = schema::repo_scanartifact)]
pub struct NewRepoScanArtifactRow {
    pub repo_id: i32,
    pub layer_id: i32,
    pub scanner_id: i32,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::file)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FileRow {
    pub id: i32,
    pub path: String,
    pub kind: String,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = schema::file)]
pub struct NewFileRow<'a> {
    pub path: &'a str,
    pub kind: &'a str,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = schema::file_scanartifact)]
pub struct NewFileScanArtifactRow {
    pub file_id: i32,
    pub layer_id: i32,
    pub scanner_id: i32,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = schema::scanned_manifest)]
pub struct NewScannedManifestRow {
    pub manifest_id: i32,
    pub scanner_id: i32,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::scanned_manifest)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ScannedManifestRow {
    pub manifest_id: i32,
    pub scanner_id: i32,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = schema::manifest_index)]
pub struct NewManifestIndexRow {
    pub manifest_id: i32,
    pub package_id: i32,
    pub dist_id: Option<i32>,
    pub repo_id: Option<i32>,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::indexreport)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct IndexReportRow {
    pub manifest_id: i32,
    pub state: String,
    pub scan_result: serde_json::Value,
}

#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = schema::indexreport)]
pub struct NewIndexReportRow {
    pub manifest_id: i32,
    pub state: String,
    pub scan_result: serde_json::Value,
}
