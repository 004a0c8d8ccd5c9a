// Hand-maintained mirror of migrations/indexer/*/up.sql. Diesel's
// `print-schema` tool would normally generate this file against a live
// database; it is written by hand here since no database is available at
// build time.

diesel::table! {
    indexer.scanner (id) {
        id -> Int4,
        name -> Text,
        version -> Text,
        kind -> Text,
    }
}

diesel::table! {
    indexer.layer (id) {
        id -> Int4,
        digest -> Text,
    }
}

diesel::table! {
    indexer.manifest (id) {
        id -> Int4,
        digest -> Text,
    }
}

diesel::table! {
    indexer.manifest_layer (manifest_id, layer_id) {
        manifest_id -> Int4,
        layer_id -> Int4,
        index -> Int4,
    }
}

diesel::table! {
    indexer.package (id) {
        id -> Int4,
        name -> Text,
        kind -> Text,
        version -> Text,
        normalized_version_kind -> Nullable<Text>,
        normalized_version -> Nullable<Array<Int4>>,
        module -> Text,
        arch -> Text,
    }
}

diesel::table! {
    indexer.dist (id) {
        id -> Int4,
        did -> Text,
        name -> Text,
        version -> Text,
        version_id -> Text,
        version_code_name -> Text,
        pretty_name -> Text,
        arch -> Text,
        cpe -> Text,
    }
}

diesel::table! {
    indexer.repo (id) {
        id -> Int4,
        name -> Text,
        key -> Text,
        uri -> Text,
        cpe -> Text,
    }
}

diesel::table! {
    indexer.file (id) {
        id -> Int4,
        path -> Text,
        kind -> Text,
    }
}

diesel::table! {
    indexer.package_scanartifact (package_id, source_id, layer_id, scanner_id) {
        package_id -> Int4,
        source_id -> Int4,
        layer_id -> Int4,
        scanner_id -> Int4,
    }
}

diesel::table! {
    indexer.dist_scanartifact (dist_id, layer_id, scanner_id) {
        dist_id -> Int4,
        layer_id -> Int4,
        scanner_id -> Int4,
    }
}

diesel::table! {
    indexer.repo_scanartifact (repo_id, layer_id, scanner_id) {
        repo_id -> Int4,
        layer_id -> Int4,
        scanner_id -> Int4,
    }
}

diesel::table! {
    indexer.file_scanartifact (file_id, layer_id, scanner_id) {
        file_id -> Int4,
        layer_id -> Int4,
        scanner_id -> Int4,
    }
}

diesel::table! {
    indexer.scanned_manifest (manifest_id, scanner_id) {
        manifest_id -> Int4,
        scanner_id -> Int4,
    }
}

diesel::table! {
    indexer.manifest_index (id) {
        id -> Int8,
        manifest_id -> Int4,
        package_id -> Int4,
        dist_id -> Nullable<Int4>,
        repo_id -> Nullable<Int4>,
    }
}

diesel::table! {
    indexer.indexreport (manifest_id) {
        manifest_id -> Int4,
        state -> Text,
        scan_result -> Jsonb,
    }
}

diesel::joinable!(indexer::manifest_layer -> indexer::manifest (manifest_id));
diesel::joinable!(indexer::manifest_layer -> indexer::layer (layer_id));
diesel::joinable!(indexer::manifest_index -> indexer::manifest (manifest_id));
diesel::joinable!(indexer::manifest_index -> indexer::package (package_id));
diesel::joinable!(indexer::indexreport -> indexer::manifest (manifest_id));
diesel::joinable!(indexer::scanned_manifest -> indexer::manifest (manifest_id));
diesel::joinable!(indexer::scanned_manifest -> indexer::scanner (scanner_id));

diesel::allow_tables_to_appear_in_same_query!(
    indexer::dist,
    indexer::dist_scanartifact,
    indexer::file,
    indexer::file_scanartifact,
    indexer::indexreport,
    indexer::layer,
    indexer::manifest,
    indexer::manifest_index,
    indexer::manifest_layer,
    indexer::package,
    indexer::package_scanartifact,
    indexer::repo,
    indexer::repo_scanartifact,
    indexer::scanned_manifest,
    indexer::scanner,
);
