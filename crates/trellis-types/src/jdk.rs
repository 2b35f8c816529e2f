//! The bootstrap class graph every store starts from.

use crate::{ClassKind, TypeStore, WellKnownTypes};

const PRIMITIVES: [&str; 8] = ["boolean", "byte", "short", "int", "long", "float", "double", "char"];

const CLASS_NAMES: &[&str] = &[
    "java.lang.Object",
    "java.io.Serializable",
    "java.lang.Cloneable",
    "java.lang.Comparable",
    "java.lang.CharSequence",
    "java.lang.String",
    "java.lang.Number",
    "java.lang.Boolean",
    "java.lang.Byte",
    "java.lang.Short",
    "java.lang.Integer",
    "java.lang.Long",
    "java.lang.Float",
    "java.lang.Double",
    "java.lang.Character",
    "java.lang.Enum",
    "java.lang.Iterable",
    "java.util.Collection",
    "java.util.List",
    "java.util.Set",
    "java.util.AbstractCollection",
    "java.util.AbstractList",
    "java.util.ArrayList",
    "java.util.AbstractSet",
    "java.util.HashSet",
    "java.util.LinkedHashSet",
    "java.util.Map",
    "java.util.AbstractMap",
    "java.util.HashMap",
];

impl TypeStore {
    /// A store holding `java.lang.Object`, `String`, the boxed numbers, the primitives, `Enum`,
    /// and the core collection interfaces with their common implementations.
    pub fn with_minimal_jdk() -> Self {
        let mut store = TypeStore::empty();

        // Intern first so declarations can reference each other regardless of order.
        for name in PRIMITIVES.iter().chain(CLASS_NAMES) {
            store.intern_class_id(name);
        }
        let id = |store: &TypeStore, name: &str| store.lookup_class(name).unwrap_or_default();
        let well_known = WellKnownTypes {
            object: id(&store, "java.lang.Object"),
            string: id(&store, "java.lang.String"),
            char_sequence: id(&store, "java.lang.CharSequence"),
            comparable: id(&store, "java.lang.Comparable"),
            number: id(&store, "java.lang.Number"),
            boolean: id(&store, "java.lang.Boolean"),
            byte: id(&store, "java.lang.Byte"),
            short: id(&store, "java.lang.Short"),
            integer: id(&store, "java.lang.Integer"),
            long: id(&store, "java.lang.Long"),
            float: id(&store, "java.lang.Float"),
            double: id(&store, "java.lang.Double"),
            character: id(&store, "java.lang.Character"),
            enum_: id(&store, "java.lang.Enum"),
            cloneable: id(&store, "java.lang.Cloneable"),
            serializable: id(&store, "java.io.Serializable"),
            iterable: id(&store, "java.lang.Iterable"),
            collection: id(&store, "java.util.Collection"),
            list: id(&store, "java.util.List"),
            set: id(&store, "java.util.Set"),
            array_list: id(&store, "java.util.ArrayList"),
            hash_set: id(&store, "java.util.HashSet"),
            linked_hash_set: id(&store, "java.util.LinkedHashSet"),
            map: id(&store, "java.util.Map"),
            hash_map: id(&store, "java.util.HashMap"),
            prim_boolean: id(&store, "boolean"),
            prim_byte: id(&store, "byte"),
            prim_short: id(&store, "short"),
            prim_int: id(&store, "int"),
            prim_long: id(&store, "long"),
            prim_float: id(&store, "float"),
            prim_double: id(&store, "double"),
            prim_char: id(&store, "char"),
        };
        store.set_well_known(well_known);

        if let Err(err) = define_minimal_jdk(&mut store) {
            // The bootstrap declarations are static; a failure here is a bug in this file.
            tracing::error!(target = "trellis.types", error = %err, "minimal JDK bootstrap failed");
        }
        store
    }
}

fn define_minimal_jdk(store: &mut TypeStore) -> crate::Result<()> {
    for name in PRIMITIVES {
        store.class_builder(name).kind(ClassKind::Primitive).build()?;
    }

    store.class_builder("java.lang.Object").build()?;
    store.class_builder("java.io.Serializable").interface().build()?;
    store.class_builder("java.lang.Cloneable").interface().build()?;
    store
        .class_builder("java.lang.Comparable")
        .interface()
        .type_param("T", &[])
        .build()?;
    store.class_builder("java.lang.CharSequence").interface().build()?;
    store
        .class_builder("java.lang.String")
        .implements("java.io.Serializable")
        .implements("Comparable<String>")
        .implements("CharSequence")
        .build()?;

    store
        .class_builder("java.lang.Number")
        .implements("java.io.Serializable")
        .build()?;
    for number in ["Byte", "Short", "Integer", "Long", "Float", "Double"] {
        store
            .class_builder(&format!("java.lang.{number}"))
            .extends("Number")
            .implements(&format!("Comparable<{number}>"))
            .build()?;
    }
    for other in ["Boolean", "Character"] {
        store
            .class_builder(&format!("java.lang.{other}"))
            .implements("java.io.Serializable")
            .implements(&format!("Comparable<{other}>"))
            .build()?;
    }

    store
        .class_builder("java.lang.Enum")
        .type_param("E", &["Enum<E>"])
        .implements("Comparable<E>")
        .implements("java.io.Serializable")
        .build()?;

    store
        .class_builder("java.lang.Iterable")
        .interface()
        .type_param("T", &[])
        .build()?;
    store
        .class_builder("java.util.Collection")
        .interface()
        .type_param("E", &[])
        .implements("Iterable<E>")
        .build()?;
    store
        .class_builder("java.util.List")
        .interface()
        .type_param("E", &[])
        .implements("java.util.Collection<E>")
        .build()?;
    store
        .class_builder("java.util.Set")
        .interface()
        .type_param("E", &[])
        .implements("java.util.Collection<E>")
        .build()?;
    store
        .class_builder("java.util.AbstractCollection")
        .type_param("E", &[])
        .implements("java.util.Collection<E>")
        .build()?;
    store
        .class_builder("java.util.AbstractList")
        .type_param("E", &[])
        .extends("java.util.AbstractCollection<E>")
        .implements("java.util.List<E>")
        .build()?;
    store
        .class_builder("java.util.ArrayList")
        .type_param("E", &[])
        .extends("java.util.AbstractList<E>")
        .implements("java.util.List<E>")
        .implements("Cloneable")
        .implements("java.io.Serializable")
        .build()?;
    store
        .class_builder("java.util.AbstractSet")
        .type_param("E", &[])
        .extends("java.util.AbstractCollection<E>")
        .implements("java.util.Set<E>")
        .build()?;
    store
        .class_builder("java.util.HashSet")
        .type_param("E", &[])
        .extends("java.util.AbstractSet<E>")
        .implements("java.util.Set<E>")
        .implements("Cloneable")
        .implements("java.io.Serializable")
        .build()?;
    store
        .class_builder("java.util.LinkedHashSet")
        .type_param("E", &[])
        .extends("java.util.HashSet<E>")
        .implements("java.util.Set<E>")
        .build()?;

    store
        .class_builder("java.util.Map")
        .interface()
        .type_param("K", &[])
        .type_param("V", &[])
        .build()?;
    store
        .class_builder("java.util.AbstractMap")
        .type_param("K", &[])
        .type_param("V", &[])
        .implements("java.util.Map<K, V>")
        .build()?;
    store
        .class_builder("java.util.HashMap")
        .type_param("K", &[])
        .type_param("V", &[])
        .extends("java.util.AbstractMap<K, V>")
        .implements("java.util.Map<K, V>")
        .implements("Cloneable")
        .implements("java.io.Serializable")
        .build()?;

    Ok(())
}
