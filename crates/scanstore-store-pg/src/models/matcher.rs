use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::matcher as schema;

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::update_operation)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdateOperationRow {
    pub id: i64,
    #[diesel(column_name = ref_)]
    pub reference: Uuid,
    pub updater: String,
    pub kind: String,
    pub fingerprint: String,
    pub date: DateTime<Utc>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = schema::update_operation)]
pub struct NewUpdateOperationRow<'a> {
    #[diesel(column_name = ref_)]
    pub reference: Uuid,
    pub updater: &'a str,
    pub kind: &'a str,
    pub fingerprint: &'a str,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::latest_update_operations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct LatestUpdateOperationRow {
    pub id: i64,
    #[diesel(column_name = ref_)]
    pub reference: Uuid,
    pub updater: String,
    pub kind: String,
    pub fingerprint: String,
    pub date: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::vuln)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VulnRow {
    pub id: i64,
    pub hash_kind: String,
    pub hash: Vec<u8>,
    pub name: String,
    pub updater: String,
    pub description: String,
    pub issued: DateTime<Utc>,
    pub severity: String,
    pub normalized_severity: String,
    pub package_name: String,
    pub dist_did: Option<String>,
    pub dist_name: Option<String>,
    pub dist_version: Option<String>,
    pub dist_version_id: Option<String>,
    pub dist_version_code_name: Option<String>,
    pub dist_pretty_name: Option<String>,
    pub dist_arch: Option<String>,
    pub dist_cpe: Option<String>,
    pub repo_name: Option<String>,
    pub repo_key: Option<String>,
    pub repo_uri: Option<String>,
    pub repo_cpe: Option<String>,
    pub fixed_in_version: Option<String>,
    pub arch_operation: String,
    pub arch: Option<String>,
    pub range_kind: Option<String>,
    pub range_lower: Option<Vec<i32>>,
    pub range_upper: Option<Vec<i32>>,
    pub range_empty: bool,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = schema::vuln)]
pub struct NewVulnRow {
    pub hash_kind: String,
    pub hash: Vec<u8>,
    pub name: String,
    pub updater: String,
    pub description: String,
    pub issued: DateTime<Utc>,
    pub severity: String,
    pub normalized_severity: String,
    pub package_name: String,
    pub dist_did: Option<String>,
    pub dist_name: Option<String>,
    pub dist_version: Option<String>,
    pub dist_version_id: Option<String>,
    pub dist_version_code_name: Option<String>,
    pub dist_pretty_name: Option<String>,
    pub dist_arch: Option<String>,
    pub dist_cpe: Option<String>,
    pub repo_name: Option<String>,
    pub repo_key: Option<String>,
    pub repo_uri: Option<String>,
    pub repo_cpe: Option<String>,
    pub fixed_in_version: Option<String>,
    pub arch_operation: String,
    pub arch: Option<String>,
    pub range_kind: Option<String>,
    pub range_lower: Option<Vec<i32>>,
    pub range_upper: Option<Vec<i32>>,
    pub range_empty: bool,
}

#[derive(Insertable, Queryable, Debug, Clone)]
#[diesel(table_name = schema::uo_vuln)]
pub struct UoVulnRow {
    pub uo: i64,
    pub vuln: i64,
}

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::enrichment)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EnrichmentRow {
    pub id: i64,
    pub hash_kind: String,
    pub hash: Vec<u8>,
    pub updater: String,
    pub tags: Vec<String>,
    pub data: Vec<u8>,
}

#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = schema::enrichment)]
pub struct NewEnrichmentRow {
    pub hash_kind: String,
    pub hash: Vec<u8>,
    pub updater: String,
    pub tags: Vec<String>,
    pub data: Vec<u8>,
}

#[derive(Insertable, Queryable, Debug, Clone)]
#[diesel(table_name = schema::uo_enrich)]
pub struct UoEnrichRow {
    pub enrich: i64,
    pub updater: String,
    pub uo: i64,
    pub date: DateTime<Utc>,
}
