// Hand-maintained mirror of migrations/matcher/*/up.sql.

diesel::table! {
    matcher.update_operation (id) {
        id -> Int8,
        #[sql_name = "ref"]
        ref_ -> Uuid,
        updater -> Text,
        kind -> Text,
        fingerprint -> Text,
        date -> Timestamptz,
    }
}

diesel::table! {
    matcher.vuln (id) {
        id -> Int8,
        hash_kind -> Text,
        hash -> Bytea,
        name -> Text,
        updater -> Text,
        description -> Text,
        issued -> Timestamptz,
        severity -> Text,
        normalized_severity -> Text,
        package_name -> Text,
        dist_did -> Nullable<Text>,
        dist_name -> Nullable<Text>,
        dist_version -> Nullable<Text>,
        dist_version_id -> Nullable<Text>,
        dist_version_code_name -> Nullable<Text>,
        dist_pretty_name -> Nullable<Text>,
        dist_arch -> Nullable<Text>,
        dist_cpe -> Nullable<Text>,
        repo_name -> Nullable<Text>,
        repo_key -> Nullable<Text>,
        repo_uri -> Nullable<Text>,
        repo_cpe -> Nullable<Text>,
        fixed_in_version -> Nullable<Text>,
        arch_operation -> Text,
        arch -> Nullable<Text>,
        range_kind -> Nullable<Text>,
        range_lower -> Nullable<Array<Int4>>,
        range_upper -> Nullable<Array<Int4>>,
        range_empty -> Bool,
    }
}

diesel::table! {
    matcher.uo_vuln (uo, vuln) {
        uo -> Int8,
        vuln -> Int8,
    }
}

diesel::table! {
    matcher.enrichment (id) {
        id -> Int8,
        hash_kind -> Text,
        hash -> Bytea,
        updater -> Text,
        tags -> Array<Text>,
        data -> Bytea,
    }
}

diesel::table! {
    matcher.uo_enrich (enrich, uo) {
        enrich -> Int8,
        updater -> Text,
        uo -> Int8,
        date -> Timestamptz,
    }
}

diesel::table! {
    matcher.latest_update_operations (updater, kind) {
        id -> Int8,
        #[sql_name = "ref"]
        ref_ -> Uuid,
        updater -> Text,
        kind -> Text,
        fingerprint -> Text,
        date -> Timestamptz,
    }
}

diesel::joinable!(matcher::uo_vuln -> matcher::update_operation (uo));
diesel::joinable!(matcher::uo_vuln -> matcher::vuln (vuln));
diesel::joinable!(matcher::uo_enrich -> matcher::update_operation (uo));
diesel::joinable!(matcher::uo_enrich -> matcher::enrichment (enrich));

diesel::allow_tables_to_appear_in_same_query!(
    matcher::enrichment,
    matcher::latest_update_operations,
    matcher::update_operation,
    matcher::uo_enrich,
    matcher::uo_vuln,
    matcher::vuln,
);
