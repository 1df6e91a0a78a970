use genome_core::{
    load_genome_file, load_genome_str, load_genome_value, GenomePath, Level, LoadError,
    NavigationError,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn document() -> Value {
    json!({
        "genome_id": "shop",
        "n0": [
            {
                "name": "Frontend",
                "n1": [
                    { "name": "Header", "n2": [
                        { "name": "Search", "n3": [
                            { "name": "Search Field" },
                            { "name": "Search Button" }
                        ]}
                    ]},
                    { "name": "Catalog" },
                    { "name": "Footer" }
                ]
            },
            { "name": "Backoffice" }
        ]
    })
}

#[test]
fn loader_builds_all_four_levels() {
    let tree = load_genome_value(document()).unwrap();

    assert_eq!(tree.corps.len(), 2);
    assert_eq!(tree.node_count(), 8);

    let path = GenomePath::parse("n0[0].n1_sections[0].n2_features[0].n3_ui_elements[1]").unwrap();
    let node = tree.node(&path).unwrap();
    assert_eq!(node.level(), Level::Atome);
    assert_eq!(node.display_name(), Some("Search Button"));
}

#[test]
fn loader_reads_documents_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("genome.json");
    std::fs::write(&path, document().to_string()).unwrap();

    let tree = load_genome_file(&path).unwrap();
    assert_eq!(tree.root(1).unwrap().display_name(), Some("Backoffice"));
}

#[test]
fn loader_reports_missing_file_and_bad_json() {
    let dir = tempfile::tempdir().unwrap();
    let missing = load_genome_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(missing, LoadError::Io { .. }));

    let bad = load_genome_str("{ not json").unwrap_err();
    assert!(matches!(bad, LoadError::Json(_)));

    let not_object = load_genome_value(json!({ "n0": [42] })).unwrap_err();
    assert!(matches!(not_object, LoadError::InvalidShape(_)));
}

#[test]
fn tree_serializes_to_canonical_keys() {
    let tree = load_genome_value(document()).unwrap();
    let exported = serde_json::to_value(&tree).unwrap();

    assert_eq!(exported["genome_id"], json!("shop"));
    assert_eq!(exported["n0_phases"][0]["name"], json!("Frontend"));
    assert_eq!(
        exported["n0_phases"][0]["n1_sections"][0]["n2_features"][0]["n3_ui_elements"][0]["name"],
        json!("Search Field")
    );
    assert!(exported.get("n0").is_none());

    let reloaded = load_genome_value(exported).unwrap();
    assert_eq!(reloaded, tree);
}

#[test]
fn with_property_copies_only_the_target_spine() {
    let tree = load_genome_value(document()).unwrap();
    let path = GenomePath::parse("n0[0].n1_sections[0]").unwrap();

    let (next, previous) = tree
        .with_property(&path, "role", json!("navigation"))
        .unwrap();

    assert_eq!(previous, None);
    assert_eq!(next.node(&path).unwrap().property("role"), Some(&json!("navigation")));
    assert_eq!(tree.node(&path).unwrap().property("role"), None);

    // untouched siblings and subtrees stay shared
    assert!(Arc::ptr_eq(&tree.corps[1], &next.corps[1]));
    assert!(Arc::ptr_eq(&tree.corps[0].organes[1], &next.corps[0].organes[1]));
    assert!(Arc::ptr_eq(
        &tree.corps[0].organes[0].cellules[0],
        &next.corps[0].organes[0].cellules[0]
    ));
    assert!(!Arc::ptr_eq(&tree.corps[0], &next.corps[0]));
}

#[test]
fn node_lookup_checks_bounds_at_every_level() {
    let tree = load_genome_value(document()).unwrap();

    let err = tree.node(&GenomePath::root(5)).unwrap_err();
    assert!(matches!(
        err,
        NavigationError::IndexOutOfBounds {
            level: Level::Corps,
            index: 5,
            len: 2,
            ..
        }
    ));

    let path = GenomePath::parse("n0[0].n1_sections[7]").unwrap();
    let err = tree.node(&path).unwrap_err();
    assert!(err.to_string().contains("0..=2"), "{err}");

    let path = GenomePath::parse("n0[1].n1_sections[0]").unwrap();
    assert!(tree.with_property(&path, "role", json!("x")).is_err());
}
