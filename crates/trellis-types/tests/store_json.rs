use std::sync::Arc;

use pretty_assertions::assert_eq;
use trellis_types::{ClassDef, ClassKind, Erasure, TypeNode, TypeStore};

#[test]
fn precomputed_registry_round_trips_through_json() {
    let mut store = TypeStore::with_minimal_jdk();
    let id = store
        .class_builder("com.example.Tags")
        .extends("java.util.LinkedHashSet<String>")
        .build()
        .unwrap();

    let json = store.to_json().unwrap();
    let loaded = Arc::new(TypeStore::from_json(&json).unwrap());

    assert_eq!(loaded.lookup_class("com.example.Tags"), Some(id));
    assert_eq!(loaded.lookup_class("Integer"), Some(loaded.well_known().integer));

    let tags = TypeNode::for_class(&loaded, id);
    assert_eq!(
        tags.as_collection().resolve_generic(&[]),
        Some(Erasure::of(loaded.well_known().string))
    );
}

#[test]
fn add_class_upserts_by_binary_name() {
    let mut store = TypeStore::with_minimal_jdk();
    let first = store.add_class(ClassDef::new("com.example.Widget", ClassKind::Class));
    let again = store.add_class(ClassDef::new("com.example.Widget", ClassKind::Interface));

    assert_eq!(first, again);
    assert!(store.is_interface(Erasure::of(first)));
    assert_eq!(store.erasure_name(Erasure::array_of(first, 1)), "com.example.Widget[]");
}
