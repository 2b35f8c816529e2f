//! Picks the concrete collection class for a requested collection type.

use trellis_types::{ClassId, Erasure, TypeStore};

use crate::{ConversionError, Value};

/// The class a collection requested as `target` is built as. `List`, `Collection`, `Iterable`
/// and their sub-interfaces become `ArrayList`; `Set` and its sub-interfaces become
/// `LinkedHashSet`; concrete collection classes are used as they are.
pub fn collection_class_for(store: &TypeStore, target: Erasure) -> Result<ClassId, ConversionError> {
    let wk = store.well_known();
    let unsupported = || ConversionError::UnsupportedCollection(store.erasure_name(target));
    let class = target.as_class().ok_or_else(unsupported)?;

    let is = |ancestor: ClassId| store.is_subclass(Erasure::of(ancestor), target);
    if store.is_interface(target) {
        if is(wk.set) {
            return Ok(wk.linked_hash_set);
        }
        if is(wk.list) || class == wk.collection || class == wk.iterable {
            return Ok(wk.array_list);
        }
        return Err(unsupported());
    }
    if is(wk.collection) {
        return Ok(class);
    }
    Err(unsupported())
}

/// Build a collection value for `target`. Set implementations drop repeated elements,
/// keeping the first occurrence.
pub fn create_collection(
    store: &TypeStore,
    target: Erasure,
    elements: Vec<Option<Value>>,
) -> Result<Value, ConversionError> {
    let class = collection_class_for(store, target)?;
    let set = Erasure::of(store.well_known().set);
    let elements = if store.is_subclass(set, Erasure::of(class)) {
        let mut unique: Vec<Option<Value>> = Vec::with_capacity(elements.len());
        for element in elements {
            if !unique.contains(&element) {
                unique.push(element);
            }
        }
        unique
    } else {
        elements
    };
    Ok(Value::Collection { class, elements })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn interfaces_map_to_default_implementations() {
        let store = TypeStore::with_minimal_jdk();
        let wk = store.well_known();
        let class_for = |class: ClassId| collection_class_for(&store, Erasure::of(class)).unwrap();

        assert_eq!(class_for(wk.list), wk.array_list);
        assert_eq!(class_for(wk.collection), wk.array_list);
        assert_eq!(class_for(wk.iterable), wk.array_list);
        assert_eq!(class_for(wk.set), wk.linked_hash_set);
        assert_eq!(class_for(wk.hash_set), wk.hash_set);

        assert!(collection_class_for(&store, Erasure::of(wk.map)).is_err());
        assert!(collection_class_for(&store, Erasure::of(wk.string)).is_err());
    }

    #[test]
    fn sets_keep_first_occurrences() {
        let store = TypeStore::with_minimal_jdk();
        let wk = store.well_known();
        let elements = vec![
            Some(Value::Int(2)),
            Some(Value::Int(1)),
            Some(Value::Int(2)),
            None,
            None,
        ];

        let set = create_collection(&store, Erasure::of(wk.set), elements.clone()).unwrap();
        assert_eq!(
            set,
            Value::Collection {
                class: wk.linked_hash_set,
                elements: vec![Some(Value::Int(2)), Some(Value::Int(1)), None],
            }
        );

        let list = create_collection(&store, Erasure::of(wk.list), elements.clone()).unwrap();
        assert_eq!(list.elements().map(<[_]>::len), Some(5));
    }
}
