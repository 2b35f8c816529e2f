//! Type descriptors: a type node, its erasure and the annotations of its declaration site.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use trellis_types::{Annotation, ClassId, Erasure, MethodParameter, TypeNode, TypeStore};

use crate::Value;

#[derive(Clone)]
pub struct TypeDescriptor {
    store: Arc<TypeStore>,
    node: TypeNode,
    erasure: Erasure,
    annotations: Arc<[Annotation]>,
}

impl TypeDescriptor {
    /// A descriptor over `node`. Without an explicit `erasure` the node's own (or `Object`) is
    /// used.
    pub fn new(
        store: &Arc<TypeStore>,
        node: TypeNode,
        erasure: Option<Erasure>,
        annotations: impl Into<Arc<[Annotation]>>,
    ) -> Self {
        let object = Erasure::of(store.well_known().object);
        let erasure = erasure
            .or_else(|| node.resolve())
            .unwrap_or(object);
        Self {
            store: store.clone(),
            node,
            erasure,
            annotations: annotations.into(),
        }
    }

    pub fn from_node(store: &Arc<TypeStore>, node: TypeNode) -> Self {
        Self::new(store, node, None, Vec::new())
    }

    /// The raw type `erasure`, carrying the class's own annotations.
    pub fn for_class(store: &Arc<TypeStore>, erasure: Erasure) -> Self {
        let annotations = erasure
            .as_class()
            .and_then(|class| store.class(class))
            .map(|def| def.annotations.clone())
            .unwrap_or_default();
        Self::new(
            store,
            TypeNode::for_erasure(store, erasure),
            Some(erasure),
            annotations,
        )
    }

    pub fn for_value(store: &Arc<TypeStore>, value: &Value) -> Self {
        Self::for_class(store, value.erasure(store))
    }

    pub fn for_field(store: &Arc<TypeStore>, class: ClassId, field: &str) -> trellis_types::Result<Self> {
        let node = TypeNode::for_field(store, class, field)?;
        Ok(Self::for_field_node(store, class, field, node))
    }

    /// The field as seen from `implementation`, a subclass binding the declaring class's
    /// type parameters.
    pub fn for_field_in(
        store: &Arc<TypeStore>,
        declaring: ClassId,
        field: &str,
        implementation: ClassId,
    ) -> trellis_types::Result<Self> {
        let node = TypeNode::for_field_in(store, declaring, field, implementation)?;
        Ok(Self::for_field_node(store, declaring, field, node))
    }

    fn for_field_node(store: &Arc<TypeStore>, class: ClassId, field: &str, node: TypeNode) -> Self {
        let (declared, annotations) = match store.field(class, field) {
            Some(def) => (store.raw_erasure(&def.ty), def.annotations.clone()),
            None => (None, Vec::new()),
        };
        let erasure = node.resolve().or(declared);
        Self::new(store, node, erasure, annotations)
    }

    /// A method parameter, or for [`trellis_types::ParameterIndex::Return`] the return value
    /// carrying the method's annotations.
    pub fn for_method_parameter(
        store: &Arc<TypeStore>,
        param: &MethodParameter,
    ) -> trellis_types::Result<Self> {
        let node = TypeNode::for_method_parameter(store, param)?;
        let annotations = param.annotations(store)?.to_vec();
        let declared = if param.nesting_level() == 1 {
            param
                .declared_type(store)?
                .and_then(|ty| store.raw_erasure(&ty))
        } else {
            None
        };
        let erasure = node.resolve().or(declared);
        Ok(Self::new(store, node, erasure, annotations))
    }

    pub fn store(&self) -> &Arc<TypeStore> {
        &self.store
    }

    pub fn node(&self) -> &TypeNode {
        &self.node
    }

    pub fn erasure(&self) -> Erasure {
        self.erasure
    }

    /// The erasure with primitives boxed.
    pub fn object_erasure(&self) -> Erasure {
        self.store.wrap_primitive(self.erasure)
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.name == name)
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotation(name).is_some()
    }

    pub fn is_array(&self) -> bool {
        self.erasure.is_array()
    }

    pub fn is_primitive(&self) -> bool {
        self.store.is_primitive(self.erasure)
    }

    pub fn is_collection(&self) -> bool {
        let collection = Erasure::of(self.store.well_known().collection);
        self.store.is_subclass(collection, self.erasure)
    }

    pub fn is_map(&self) -> bool {
        let map = Erasure::of(self.store.well_known().map);
        self.store.is_subclass(map, self.erasure)
    }

    /// The element type of an array or collection; `None` for anything else. Annotations carry
    /// over from this descriptor.
    pub fn element_type_descriptor(&self) -> Option<TypeDescriptor> {
        let element = if self.is_array() {
            let component = self.node.component_type();
            let erasure = component.resolve().or_else(|| self.erasure.component());
            Self::new(&self.store, component, erasure, self.annotations.clone())
        } else if self.is_collection() {
            let generic = self.node.as_collection().get_generic(&[]);
            Self::new(&self.store, generic, None, self.annotations.clone())
        } else {
            return None;
        };
        Some(element)
    }

    /// The descriptor `level` steps below this one, or `None` when nothing resolvable lives
    /// there. `Object` stays `Object` at every level.
    pub fn nested(&self, level: usize) -> Option<TypeDescriptor> {
        let object = Erasure::of(self.store.well_known().object);
        let mut nested = self.node.clone();
        for _ in 0..level {
            if nested.resolve() != Some(object) {
                nested = nested.nested(2, None);
            }
        }
        nested.resolve()?;
        Some(Self::new(&self.store, nested, None, self.annotations.clone()))
    }

    /// Whether `value` is non-null and its runtime class is assignable to this type.
    pub fn is_instance(&self, value: Option<&Value>) -> bool {
        value.is_some_and(|value| self.node.is_assignable_from_class(value.erasure(&self.store)))
    }

    /// Whether a value described by `self` may be used where `target` is expected. A target
    /// whose node cannot be resolved accepts anything.
    pub fn is_assignable_to(&self, target: &TypeDescriptor) -> bool {
        if target.node.resolve().is_none() {
            return true;
        }
        if !self
            .store
            .is_assignable(target.object_erasure(), self.object_erasure())
        {
            return false;
        }
        if (self.is_array() && target.is_array())
            || (self.is_collection() && target.is_collection())
        {
            return match (self.element_type_descriptor(), target.element_type_descriptor()) {
                (Some(ours), Some(theirs)) => {
                    ours.node.resolve().is_none() || ours.is_assignable_to(&theirs)
                }
                _ => true,
            };
        }
        true
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.erasure == other.erasure
            && self.node == other.node
            && self.annotations == other.annotations
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for annotation in self.annotations.iter() {
            write!(f, "@{} ", annotation.name)?;
        }
        if self.node.resolve().is_some() {
            write!(f, "{}", self.node)
        } else {
            f.write_str(&self.store.erasure_name(self.erasure))
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeDescriptor")
            .field(&format_args!("{self}"))
            .finish()
    }
}

/// Prebuilt descriptors for the primitives, their wrappers, `String` and `Object`.
#[derive(Clone, Debug, Default)]
pub struct CommonDescriptors {
    cache: HashMap<Erasure, TypeDescriptor>,
}

impl CommonDescriptors {
    pub fn new(store: &Arc<TypeStore>) -> Self {
        let wk = store.well_known();
        let mut classes = vec![wk.string, wk.object];
        for (primitive, wrapper) in wk.primitive_wrappers() {
            classes.push(primitive);
            classes.push(wrapper);
        }
        let cache = classes
            .into_iter()
            .map(|class| {
                let erasure = Erasure::of(class);
                (erasure, TypeDescriptor::for_class(store, erasure))
            })
            .collect();
        Self { cache }
    }

    pub fn get(&self, erasure: Erasure) -> Option<&TypeDescriptor> {
        self.cache.get(&erasure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store() -> Arc<TypeStore> {
        Arc::new(TypeStore::with_minimal_jdk())
    }

    fn descriptor(store: &Arc<TypeStore>, text: &str) -> TypeDescriptor {
        let node = TypeNode::for_expr(store, store.parse_type(text).unwrap());
        TypeDescriptor::from_node(store, node)
    }

    #[test]
    fn instances_match_by_runtime_class() {
        let store = store();
        let number = descriptor(&store, "Number");

        assert!(number.is_instance(Some(&Value::Int(1))));
        assert!(number.is_instance(Some(&Value::Double(0.5))));
        assert!(!number.is_instance(Some(&Value::string("1"))));
        assert!(!number.is_instance(None));
        assert!(descriptor(&store, "Object").is_instance(Some(&Value::string("x"))));
        assert!(descriptor(&store, "int").is_instance(Some(&Value::Int(1))));
    }

    #[test]
    fn element_types_of_arrays_and_collections() {
        let store = store();
        let wk = store.well_known().clone();

        let ints = descriptor(&store, "int[]").element_type_descriptor().unwrap();
        assert_eq!(ints.erasure(), Erasure::of(wk.prim_int));

        let names = descriptor(&store, "java.util.Set<String>")
            .element_type_descriptor()
            .unwrap();
        assert_eq!(names.erasure(), Erasure::of(wk.string));

        let raw = descriptor(&store, "java.util.List").element_type_descriptor().unwrap();
        assert_eq!(raw.erasure(), Erasure::of(wk.object));

        assert!(descriptor(&store, "String").element_type_descriptor().is_none());
    }

    #[test]
    fn nested_walks_generic_levels() {
        let store = store();
        let wk = store.well_known().clone();
        let desc = descriptor(&store, "java.util.List<java.util.List<Integer>>");

        assert_eq!(desc.nested(1).unwrap().erasure(), Erasure::of(wk.list));
        assert_eq!(desc.nested(2).unwrap().erasure(), Erasure::of(wk.integer));
        assert!(desc.nested(3).is_none());
    }

    #[test]
    fn assignability_is_permissive_for_unknown_targets() {
        let store = store();
        let strings = descriptor(&store, "java.util.List<String>");

        assert!(strings.is_assignable_to(&descriptor(&store, "java.util.Collection<String>")));
        assert!(!strings.is_assignable_to(&descriptor(&store, "java.util.Collection<Integer>")));
        assert!(!strings.is_assignable_to(&descriptor(&store, "java.util.Set<String>")));

        let unknown = TypeDescriptor::from_node(&store, TypeNode::NONE);
        assert!(strings.is_assignable_to(&unknown));
        assert!(descriptor(&store, "int").is_assignable_to(&descriptor(&store, "Number")));
    }

    #[test]
    fn common_descriptors_are_cached() {
        let store = store();
        let common = CommonDescriptors::new(&store);
        let int = Erasure::of(store.well_known().prim_int);

        assert_eq!(common.get(int), Some(&TypeDescriptor::for_class(&store, int)));
        assert!(common.get(Erasure::of(store.well_known().list)).is_none());
    }
}
