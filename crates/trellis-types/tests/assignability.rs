use std::sync::Arc;

use trellis_types::{ClassId, Erasure, TypeExpr, TypeNode, TypeStore};

fn store_with_color() -> (Arc<TypeStore>, ClassId) {
    let mut store = TypeStore::with_minimal_jdk();
    let color = store
        .class_builder("com.example.Color")
        .enumeration(&["RED", "GREEN", "BLUE"])
        .build()
        .unwrap();
    store
        .class_builder("com.example.Names")
        .extends("java.util.ArrayList<String>")
        .build()
        .unwrap();
    (Arc::new(store), color)
}

fn node(store: &Arc<TypeStore>, text: &str) -> TypeNode {
    TypeNode::for_expr(store, store.parse_type(text).unwrap())
}

#[test]
fn generic_arguments_are_invariant() {
    let (store, _) = store_with_color();

    assert!(node(&store, "Number").is_assignable_from(&node(&store, "Integer")));
    assert!(!node(&store, "java.util.List<Number>")
        .is_assignable_from(&node(&store, "java.util.List<Integer>")));
    assert!(node(&store, "java.util.List<Number>")
        .is_assignable_from(&node(&store, "java.util.ArrayList<Number>")));
    assert!(!node(&store, "java.util.ArrayList<Number>")
        .is_assignable_from(&node(&store, "java.util.List<Number>")));
}

#[test]
fn wildcards_widen_nested_positions() {
    let (store, _) = store_with_color();

    assert!(node(&store, "java.util.List<? extends Number>")
        .is_assignable_from(&node(&store, "java.util.ArrayList<Integer>")));
    assert!(node(&store, "java.util.List<? super Integer>")
        .is_assignable_from(&node(&store, "java.util.List<Number>")));
    assert!(!node(&store, "java.util.List<? super Number>")
        .is_assignable_from(&node(&store, "java.util.List<Integer>")));
    assert!(node(&store, "java.util.List<?>")
        .is_assignable_from(&node(&store, "java.util.List<String>")));
}

#[test]
fn lower_bounded_wildcards() {
    let (store, _) = store_with_color();
    let super_string = node(&store, "? super String");

    assert!(super_string.is_assignable_from(&node(&store, "String")));
    assert!(super_string.is_assignable_from(&node(&store, "? super String")));
    assert!(!super_string.is_assignable_from(&node(&store, "? extends String")));
}

#[test]
fn subclass_bindings_participate() {
    let (store, _) = store_with_color();
    let names = node(&store, "com.example.Names");

    assert!(node(&store, "java.util.Collection<String>").is_assignable_from(&names));
    assert!(!node(&store, "java.util.Collection<Integer>").is_assignable_from(&names));
    assert!(node(&store, "java.lang.Iterable<? extends CharSequence>").is_assignable_from(&names));
}

#[test]
fn raw_types_accept_parameterized_ones() {
    let (store, _) = store_with_color();
    let raw = TypeNode::for_class(&store, store.well_known().list);

    assert!(raw.is_assignable_from(&node(&store, "java.util.List<String>")));
    assert!(raw.is_assignable_from(&node(&store, "java.util.ArrayList<Integer>")));
}

#[test]
fn arrays_and_boxing() {
    let (store, _) = store_with_color();

    assert!(node(&store, "java.util.List<String>[]")
        .is_assignable_from(&node(&store, "java.util.ArrayList<String>[]")));
    assert!(node(&store, "int").is_assignable_from(&node(&store, "Integer")));
    assert!(node(&store, "Number").is_assignable_from_class(Erasure::of(store.well_known().prim_long)));
    assert!(!node(&store, "int[]").is_assignable_from(&node(&store, "long[]")));
}

#[test]
fn self_referential_bounds_terminate() {
    let (store, color) = store_with_color();
    let wk = store.well_known().clone();
    let e = store.type_parameters(wk.enum_)[0];
    let var = TypeNode::for_expr(&store, TypeExpr::Variable(e));

    assert!(var.is_assignable_from(&var));

    let color_node = TypeNode::for_class(&store, color);
    assert!(TypeNode::for_class(&store, wk.enum_).is_assignable_from(&color_node));
    assert!(node(&store, "Enum<com.example.Color>").is_assignable_from(&color_node));
    assert!(node(&store, "Comparable<com.example.Color>").is_assignable_from(&color_node));
    assert!(!node(&store, "Comparable<String>").is_assignable_from(&color_node));
}
