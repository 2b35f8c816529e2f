//! The converter registry.
//!
//! Converters are indexed by the exact `(source, target)` pair they declare. Lookup walks the
//! cross product of the source and target class hierarchies, most specific pair first, and
//! falls back to pair-less conditional converters afterwards.
//!
//! Reads never hold a map guard while calling into a converter: per-pair lists and the global
//! list are copy-on-write `Arc<Vec<_>>` snapshots, cloned out before iteration. A converter's
//! `matches` may therefore recurse into the service (element conversion) freely.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use trellis_types::{Erasure, TypeStore};

use crate::{
    ConversionService, ConvertiblePair, GenericConverter, RegistrationError, TypeDescriptor,
};

type ConverterList = Arc<Vec<Arc<dyn GenericConverter>>>;

pub struct Converters {
    store: Arc<TypeStore>,
    by_pair: DashMap<ConvertiblePair, ConverterList>,
    global: RwLock<ConverterList>,
}

impl Converters {
    pub fn new(store: Arc<TypeStore>) -> Self {
        Self {
            store,
            by_pair: DashMap::new(),
            global: RwLock::new(Arc::default()),
        }
    }

    /// Register `converter` under each pair it declares, or as a global converter when it
    /// declares none.
    pub fn add(&self, converter: Arc<dyn GenericConverter>) -> Result<(), RegistrationError> {
        let Some(pairs) = converter.convertible_types() else {
            if converter.as_conditional().is_none() {
                return Err(RegistrationError::NotConditional(converter.name().to_string()));
            }
            tracing::debug!(
                target = "trellis.convert",
                converter = converter.name(),
                "registering global conditional converter"
            );
            Arc::make_mut(&mut *self.global.write()).push(converter);
            return Ok(());
        };

        for pair in pairs {
            tracing::debug!(
                target = "trellis.convert",
                converter = converter.name(),
                source = %self.store.erasure_name(pair.source),
                target_type = %self.store.erasure_name(pair.target),
                "registering converter"
            );
            let mut slot = self.by_pair.entry(pair).or_default();
            Arc::make_mut(&mut *slot).push(converter.clone());
        }
        Ok(())
    }

    /// Drop every converter registered for exactly this pair. Global converters are untouched.
    pub fn remove(&self, source: Erasure, target: Erasure) -> bool {
        let removed = self
            .by_pair
            .remove(&ConvertiblePair::new(source, target))
            .is_some();
        if removed {
            tracing::debug!(
                target = "trellis.convert",
                source = %self.store.erasure_name(source),
                target_type = %self.store.erasure_name(target),
                "removed converters"
            );
        }
        removed
    }

    /// Number of distinct pairs with at least one converter.
    pub fn pair_count(&self) -> usize {
        self.by_pair.len()
    }

    pub fn global_count(&self) -> usize {
        self.global.read().len()
    }

    /// The best converter for `source_type -> target_type`, if any.
    pub fn find(
        &self,
        service: &ConversionService,
        source_type: &TypeDescriptor,
        target_type: &TypeDescriptor,
    ) -> Option<Arc<dyn GenericConverter>> {
        let sources = self.class_hierarchy(source_type.erasure());
        let targets = self.class_hierarchy(target_type.erasure());

        for source in &sources {
            for target in &targets {
                let pair = ConvertiblePair::new(*source, *target);
                let Some(candidates) = self.by_pair.get(&pair).map(|entry| entry.value().clone())
                else {
                    continue;
                };
                if let Some(converter) =
                    Self::select(&candidates, service, source_type, target_type)
                {
                    tracing::trace!(
                        target = "trellis.convert",
                        converter = converter.name(),
                        source = %self.store.erasure_name(*source),
                        target_type = %self.store.erasure_name(*target),
                        "matched converter pair"
                    );
                    return Some(converter);
                }
            }
        }

        let global = self.global.read().clone();
        let found = global
            .iter()
            .find(|converter| {
                converter
                    .as_conditional()
                    .is_some_and(|cond| cond.matches(service, source_type, target_type))
            })
            .cloned();
        if let Some(converter) = &found {
            tracing::trace!(
                target = "trellis.convert",
                converter = converter.name(),
                "matched global converter"
            );
        }
        found
    }

    /// First unconditional converter, or first conditional one whose predicate holds.
    fn select(
        candidates: &[Arc<dyn GenericConverter>],
        service: &ConversionService,
        source_type: &TypeDescriptor,
        target_type: &TypeDescriptor,
    ) -> Option<Arc<dyn GenericConverter>> {
        candidates
            .iter()
            .find(|converter| match converter.as_conditional() {
                None => true,
                Some(cond) => cond.matches(service, source_type, target_type),
            })
            .cloned()
    }

    /// The lookup order for `ty`: the type itself, then superclasses breadth-first with each
    /// type's interfaces following it. Arrays climb through their components' hierarchy as
    /// arrays. Enums add `Enum` before the final `Object[]` / `Object` entries.
    pub fn class_hierarchy(&self, ty: Erasure) -> Vec<Erasure> {
        let store = &self.store;
        let wk = store.well_known();
        let object = Erasure::of(wk.object);
        let enum_ = Erasure::of(wk.enum_);
        let array = ty.is_array();

        let mut hierarchy = Vec::new();
        let mut visited = HashSet::new();
        add_to_hierarchy(0, store.wrap_primitive(ty), false, &mut hierarchy, &mut visited);

        let mut i = 0;
        while i < hierarchy.len() {
            let candidate = if array {
                match hierarchy[i].component() {
                    Some(component) => component,
                    None => {
                        i += 1;
                        continue;
                    }
                }
            } else {
                store.wrap_primitive(hierarchy[i])
            };

            if let Some(superclass) = store.superclass(candidate) {
                if superclass != object && superclass != enum_ {
                    add_to_hierarchy(i + 1, superclass, array, &mut hierarchy, &mut visited);
                }
            }
            for interface in store.interfaces(candidate) {
                let end = hierarchy.len();
                add_to_hierarchy(end, interface, array, &mut hierarchy, &mut visited);
            }
            i += 1;
        }

        if store.is_enum(ty) {
            let end = hierarchy.len();
            add_to_hierarchy(end, enum_, array, &mut hierarchy, &mut visited);
            let end = hierarchy.len();
            add_to_hierarchy(end, enum_, false, &mut hierarchy, &mut visited);
        }
        let end = hierarchy.len();
        add_to_hierarchy(end, object, array, &mut hierarchy, &mut visited);
        let end = hierarchy.len();
        add_to_hierarchy(end, object, false, &mut hierarchy, &mut visited);
        hierarchy
    }
}

fn add_to_hierarchy(
    index: usize,
    ty: Erasure,
    as_array: bool,
    hierarchy: &mut Vec<Erasure>,
    visited: &mut HashSet<Erasure>,
) {
    let ty = if as_array { ty.array() } else { ty };
    if visited.insert(ty) {
        hierarchy.insert(index.min(hierarchy.len()), ty);
    }
}

impl fmt::Debug for Converters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converters")
            .field("pairs", &self.pair_count())
            .field("global", &self.global_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use trellis_types::ClassId;

    fn names(store: &TypeStore, hierarchy: &[Erasure]) -> Vec<String> {
        hierarchy.iter().map(|e| store.erasure_name(*e)).collect()
    }

    #[test]
    fn hierarchy_interleaves_interfaces_after_each_class() {
        let store = Arc::new(TypeStore::with_minimal_jdk());
        let converters = Converters::new(store.clone());

        let integer = Erasure::of(store.well_known().integer);
        assert_eq!(
            names(&store, &converters.class_hierarchy(integer)),
            vec![
                "java.lang.Integer",
                "java.lang.Number",
                "java.lang.Comparable",
                "java.io.Serializable",
                "java.lang.Object",
            ]
        );
    }

    #[test]
    fn primitives_are_boxed_and_arrays_stay_arrays() {
        let store = Arc::new(TypeStore::with_minimal_jdk());
        let converters = Converters::new(store.clone());
        let wk = store.well_known();

        let first = converters.class_hierarchy(Erasure::of(wk.prim_int))[0];
        assert_eq!(first, Erasure::of(wk.integer));

        let lists = Erasure::of(wk.array_list).array();
        let hierarchy = names(&store, &converters.class_hierarchy(lists));
        assert_eq!(hierarchy[0], "java.util.ArrayList[]");
        assert_eq!(hierarchy[1], "java.util.AbstractList[]");
        assert!(hierarchy.contains(&"java.util.Collection[]".to_string()));
        assert_eq!(
            hierarchy[hierarchy.len() - 2..].to_vec(),
            vec!["java.lang.Object[]", "java.lang.Object"]
        );
    }

    #[test]
    fn enums_append_enum_before_object() {
        let mut store = TypeStore::with_minimal_jdk();
        let color: ClassId = store
            .class_builder("com.example.Color")
            .enumeration(&["RED"])
            .build()
            .unwrap();
        let store = Arc::new(store);
        let converters = Converters::new(store.clone());

        assert_eq!(
            names(&store, &converters.class_hierarchy(Erasure::of(color))),
            vec!["com.example.Color", "java.lang.Enum", "java.lang.Object"]
        );
    }
}
