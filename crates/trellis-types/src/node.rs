//! Type nodes: lazily resolved views over type expressions.
//!
//! A [`TypeNode`] pairs a [`TypeExpr`] with the [`VariableResolver`] that gives meaning to the
//! type variables it mentions. Navigation (`generics`, `super_type`, `as_class`, ...) produces
//! new nodes whose resolvers chain back to the node they were derived from, so a variable
//! declared several supertypes up can still be resolved against the concrete subtype the walk
//! started from.
//!
//! Derived data is cached per node. Caches are filled race-tolerantly: two threads may both
//! compute a value, and whichever stores first wins. The computations are pure, so the losing
//! value is equal to the stored one.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use crate::error::{Result, TypesError};
use crate::{ClassId, Erasure, TypeExpr, TypeStore, TypeVarId};

/// Resolves type variables on behalf of a source node.
pub trait VariableResolver: Send + Sync + fmt::Debug {
    /// The node variables are resolved against.
    fn source(&self) -> TypeNode;

    fn resolve_variable(&self, var: TypeVarId) -> Option<TypeNode>;
}

/// One point in a type expression.
///
/// [`TypeNode::NONE`] stands for "no type could be resolved"; every query on it returns another
/// empty result.
#[derive(Clone, Default)]
pub struct TypeNode {
    inner: Option<Arc<NodeInner>>,
}

struct NodeInner {
    store: Arc<TypeStore>,
    expr: TypeExpr,
    resolver: Option<Arc<dyn VariableResolver>>,
    /// Component of a synthetic array built by [`TypeNode::for_array_component`].
    component: Option<TypeNode>,
    /// Arguments supplied through [`TypeNode::for_class_with_generics`].
    explicit_generics: Option<Arc<[TypeNode]>>,
    resolved: OnceLock<Option<Erasure>>,
    generics: OnceLock<Arc<[TypeNode]>>,
    interfaces: OnceLock<Arc<[TypeNode]>>,
    super_type: OnceLock<TypeNode>,
}

fn cached<T: Clone>(cell: &OnceLock<T>, compute: impl FnOnce() -> T) -> T {
    if let Some(value) = cell.get() {
        return value.clone();
    }
    let value = compute();
    match cell.set(value.clone()) {
        Ok(()) => value,
        Err(_) => cell.get().cloned().unwrap_or(value),
    }
}

fn no_nodes() -> Arc<[TypeNode]> {
    Arc::new([])
}

/// Resolver backed by an owner node.
///
/// The owner is held as a detached copy (same expression, resolver and explicit parts, fresh
/// caches) so that nodes cached inside the owner never point back at it.
#[derive(Debug)]
struct OwnerResolver {
    owner: TypeNode,
}

impl VariableResolver for OwnerResolver {
    fn source(&self) -> TypeNode {
        self.owner.clone()
    }

    fn resolve_variable(&self, var: TypeVarId) -> Option<TypeNode> {
        self.owner.resolve_variable(var)
    }
}

impl TypeNode {
    pub const NONE: TypeNode = TypeNode { inner: None };

    fn build(
        store: Arc<TypeStore>,
        expr: TypeExpr,
        resolver: Option<Arc<dyn VariableResolver>>,
        component: Option<TypeNode>,
        explicit_generics: Option<Arc<[TypeNode]>>,
    ) -> Self {
        TypeNode {
            inner: Some(Arc::new(NodeInner {
                store,
                expr,
                resolver,
                component,
                explicit_generics,
                resolved: OnceLock::new(),
                generics: OnceLock::new(),
                interfaces: OnceLock::new(),
                super_type: OnceLock::new(),
            })),
        }
    }

    pub fn for_expr(store: &Arc<TypeStore>, expr: TypeExpr) -> Self {
        Self::for_expr_with_resolver(store, expr, None)
    }

    /// A node whose variables resolve against `owner` (typically the declaring class viewed
    /// through a concrete subtype).
    pub fn for_expr_with_owner(store: &Arc<TypeStore>, expr: TypeExpr, owner: &TypeNode) -> Self {
        Self::for_expr_with_resolver(store, expr, owner.as_variable_resolver())
    }

    pub fn for_expr_with_resolver(
        store: &Arc<TypeStore>,
        expr: TypeExpr,
        resolver: Option<Arc<dyn VariableResolver>>,
    ) -> Self {
        Self::build(store.clone(), expr, resolver, None, None)
    }

    /// The raw class. Its declared type parameters show up as unresolved generics.
    pub fn for_class(store: &Arc<TypeStore>, class: ClassId) -> Self {
        Self::for_expr(store, TypeExpr::class(class))
    }

    pub fn for_erasure(store: &Arc<TypeStore>, erasure: Erasure) -> Self {
        Self::for_expr(store, TypeExpr::Class(erasure))
    }

    /// `class` parameterized with `generics`, one per declared type parameter. A [`TypeNode::NONE`]
    /// argument leaves the corresponding parameter open.
    pub fn for_class_with_generics(
        store: &Arc<TypeStore>,
        class: ClassId,
        generics: &[TypeNode],
    ) -> Result<Self> {
        let params = store.type_parameters(class);
        if params.len() != generics.len() {
            return Err(TypesError::GenericArity {
                class: store
                    .class(class)
                    .map(|def| def.name.clone())
                    .unwrap_or_default(),
                expected: params.len(),
                found: generics.len(),
            });
        }
        if generics.is_empty() {
            return Ok(Self::for_class(store, class));
        }

        let args = params
            .iter()
            .zip(generics)
            .map(|(var, generic)| {
                generic
                    .expr()
                    .cloned()
                    .unwrap_or(TypeExpr::Variable(*var))
            })
            .collect();
        Ok(Self::build(
            store.clone(),
            TypeExpr::parameterized(class, args),
            None,
            None,
            Some(generics.iter().cloned().collect()),
        ))
    }

    /// An array whose elements are `component`. Returns [`TypeNode::NONE`] for a `NONE`
    /// component.
    pub fn for_array_component(component: &TypeNode) -> Self {
        let Some(inner) = &component.inner else {
            return TypeNode::NONE;
        };
        Self::build(
            inner.store.clone(),
            TypeExpr::array_of(inner.expr.clone()),
            None,
            Some(component.clone()),
            None,
        )
    }

    pub fn is_none(&self) -> bool {
        self.inner.is_none()
    }

    pub fn expr(&self) -> Option<&TypeExpr> {
        self.inner.as_ref().map(|inner| &inner.expr)
    }

    pub fn store(&self) -> Option<&Arc<TypeStore>> {
        self.inner.as_ref().map(|inner| &inner.store)
    }

    pub fn variable_resolver(&self) -> Option<&Arc<dyn VariableResolver>> {
        self.inner.as_ref()?.resolver.as_ref()
    }

    /// A node over `expr` sharing this node's store and resolver.
    fn derive(&self, expr: TypeExpr) -> TypeNode {
        match &self.inner {
            Some(inner) => Self::build(inner.store.clone(), expr, inner.resolver.clone(), None, None),
            None => TypeNode::NONE,
        }
    }

    /// The erasure of this node, or `None` when it cannot be resolved.
    pub fn resolve(&self) -> Option<Erasure> {
        let inner = self.inner.as_ref()?;
        cached(&inner.resolved, || match &inner.expr {
            TypeExpr::Class(erasure) => Some(*erasure),
            TypeExpr::GenericArray(_) => self.component_type().resolve()?.checked_array(),
            _ => self.resolve_type().resolve(),
        })
    }

    pub fn resolve_or(&self, fallback: Erasure) -> Erasure {
        self.resolve().unwrap_or(fallback)
    }

    /// The erasure, falling back to `Object`. `None` only for [`TypeNode::NONE`].
    pub fn to_class(&self) -> Option<Erasure> {
        let store = self.store()?;
        Some(self.resolve_or(Erasure::of(store.well_known().object)))
    }

    /// The first bound of `bounds`, treating `Object` as no bound.
    fn first_bound<'a>(store: &TypeStore, bounds: &'a [TypeExpr]) -> Option<&'a TypeExpr> {
        let object = TypeExpr::class(store.well_known().object);
        bounds.first().filter(|bound| **bound != object)
    }

    /// One resolution step: a parameterized type to its raw class, a wildcard to its bound, a
    /// variable to whatever its resolver (or else its first declared bound) yields.
    pub fn resolve_type(&self) -> TypeNode {
        let Some(inner) = &self.inner else {
            return TypeNode::NONE;
        };
        match &inner.expr {
            TypeExpr::Parameterized(p) => self.derive(TypeExpr::class(p.raw)),
            TypeExpr::Wildcard(w) => {
                let bound = Self::first_bound(&inner.store, &w.upper_bounds)
                    .or_else(|| Self::first_bound(&inner.store, &w.lower_bounds));
                match bound {
                    Some(bound) => self.derive(bound.clone()),
                    None => TypeNode::NONE,
                }
            }
            TypeExpr::Variable(var) => {
                if let Some(resolved) = inner
                    .resolver
                    .as_ref()
                    .and_then(|resolver| resolver.resolve_variable(*var))
                {
                    return resolved;
                }
                let bound = inner
                    .store
                    .type_param(*var)
                    .and_then(|tp| Self::first_bound(&inner.store, &tp.upper_bounds));
                match bound {
                    Some(bound) => self.derive(bound.clone()),
                    None => TypeNode::NONE,
                }
            }
            TypeExpr::Class(_) | TypeExpr::GenericArray(_) => TypeNode::NONE,
        }
    }

    /// Resolve `var` in the context of this node: against a parameterized type's arguments,
    /// then its owner type, then this node's own resolver.
    pub fn resolve_variable(&self, var: TypeVarId) -> Option<TypeNode> {
        let inner = self.inner.as_ref()?;
        match &inner.expr {
            TypeExpr::Variable(_) => return self.resolve_type().resolve_variable(var),
            TypeExpr::Parameterized(p) => {
                let params = inner.store.type_parameters(p.raw);
                if let Some(idx) = params.iter().position(|param| *param == var) {
                    if let Some(explicit) = &inner.explicit_generics {
                        return explicit.get(idx).filter(|g| !g.is_none()).cloned();
                    }
                    return p.args.get(idx).map(|arg| self.derive(arg.clone()));
                }
                if let Some(owner) = &p.owner {
                    if let Some(found) = self.derive((**owner).clone()).resolve_variable(var) {
                        return Some(found);
                    }
                }
            }
            TypeExpr::Wildcard(_) => {
                if let Some(found) = self.resolve_type().resolve_variable(var) {
                    return Some(found);
                }
            }
            TypeExpr::Class(_) | TypeExpr::GenericArray(_) => {}
        }
        inner.resolver.as_ref()?.resolve_variable(var)
    }

    /// This node as a resolver for variables of nodes derived from it.
    pub fn as_variable_resolver(&self) -> Option<Arc<dyn VariableResolver>> {
        let inner = self.inner.as_ref()?;
        let detached = Self::build(
            inner.store.clone(),
            inner.expr.clone(),
            inner.resolver.clone(),
            inner.component.clone(),
            inner.explicit_generics.clone(),
        );
        Some(Arc::new(OwnerResolver { owner: detached }))
    }

    pub fn is_array(&self) -> bool {
        let Some(inner) = &self.inner else {
            return false;
        };
        match &inner.expr {
            TypeExpr::Class(erasure) => erasure.is_array(),
            TypeExpr::GenericArray(_) => true,
            _ => self.resolve_type().is_array(),
        }
    }

    /// The element node of an array-shaped node, [`TypeNode::NONE`] otherwise.
    pub fn component_type(&self) -> TypeNode {
        let Some(inner) = &self.inner else {
            return TypeNode::NONE;
        };
        if let Some(component) = &inner.component {
            return component.clone();
        }
        match &inner.expr {
            TypeExpr::Class(erasure) => match erasure.component() {
                Some(component) => self.derive(TypeExpr::Class(component)),
                None => TypeNode::NONE,
            },
            TypeExpr::GenericArray(component) => self.derive((**component).clone()),
            _ => self.resolve_type().component_type(),
        }
    }

    /// The generic superclass, with variables resolved against this node.
    pub fn super_type(&self) -> TypeNode {
        let Some(inner) = &self.inner else {
            return TypeNode::NONE;
        };
        cached(&inner.super_type, || {
            let Some(resolved) = self.resolve() else {
                return TypeNode::NONE;
            };
            match inner.store.generic_superclass(resolved) {
                Some(expr) => Self::for_expr_with_resolver(&inner.store, expr, self.as_variable_resolver()),
                None => TypeNode::NONE,
            }
        })
    }

    /// Directly implemented generic interfaces in declaration order.
    pub fn interfaces(&self) -> Arc<[TypeNode]> {
        let Some(inner) = &self.inner else {
            return no_nodes();
        };
        cached(&inner.interfaces, || {
            let Some(resolved) = self.resolve() else {
                return no_nodes();
            };
            let interfaces = inner.store.generic_interfaces(resolved);
            if interfaces.is_empty() {
                return no_nodes();
            }
            let owner = self.as_variable_resolver();
            interfaces
                .into_iter()
                .map(|expr| Self::for_expr_with_resolver(&inner.store, expr, owner.clone()))
                .collect()
        })
    }

    /// Generic arguments in declaration order. A raw generic class yields one open variable
    /// node per declared type parameter.
    pub fn generics(&self) -> Arc<[TypeNode]> {
        let Some(inner) = &self.inner else {
            return no_nodes();
        };
        cached(&inner.generics, || {
            if let Some(explicit) = &inner.explicit_generics {
                return explicit.clone();
            }
            match &inner.expr {
                TypeExpr::Class(erasure) => {
                    let params = erasure
                        .as_class()
                        .map(|class| inner.store.type_parameters(class))
                        .unwrap_or(&[]);
                    if params.is_empty() {
                        return no_nodes();
                    }
                    let owner = self.as_variable_resolver();
                    params
                        .iter()
                        .map(|var| {
                            Self::for_expr_with_resolver(
                                &inner.store,
                                TypeExpr::Variable(*var),
                                owner.clone(),
                            )
                        })
                        .collect()
                }
                TypeExpr::Parameterized(p) => {
                    p.args.iter().map(|arg| self.derive(arg.clone())).collect()
                }
                _ => self.resolve_type().generics(),
            }
        })
    }

    pub fn has_generics(&self) -> bool {
        !self.generics().is_empty()
    }

    /// Walk into nested generics: each index selects an argument one level deeper. With no
    /// indexes, the first argument.
    pub fn get_generic(&self, indexes: &[usize]) -> TypeNode {
        if indexes.is_empty() {
            return self.generics().first().cloned().unwrap_or_default();
        }
        let mut generic = self.clone();
        for &index in indexes {
            let generics = generic.generics();
            match generics.get(index) {
                Some(next) => generic = next.clone(),
                None => return TypeNode::NONE,
            }
        }
        generic
    }

    pub fn resolve_generics(&self) -> Vec<Option<Erasure>> {
        self.generics().iter().map(TypeNode::resolve).collect()
    }

    pub fn resolve_generic(&self, indexes: &[usize]) -> Option<Erasure> {
        self.get_generic(indexes).resolve()
    }

    /// The node at `level` (1 = this node). Each step strips one array dimension or selects a
    /// generic argument: the one given in `type_indexes_per_level` for that level, otherwise the
    /// last. A node without generics is replaced by its supertype before selecting.
    pub fn nested(
        &self,
        level: usize,
        type_indexes_per_level: Option<&HashMap<usize, usize>>,
    ) -> TypeNode {
        let mut result = self.clone();
        for current in 2..=level {
            if result.is_array() {
                result = result.component_type();
                continue;
            }
            while !result.is_none() && !result.has_generics() {
                result = result.super_type();
            }
            let index = type_indexes_per_level
                .and_then(|indexes| indexes.get(&current).copied())
                .or_else(|| result.generics().len().checked_sub(1));
            result = match index {
                Some(index) => result.get_generic(&[index]),
                None => TypeNode::NONE,
            };
        }
        result
    }

    /// View this node as `target` by searching its interfaces and then its superclass chain.
    pub fn as_class(&self, target: ClassId) -> TypeNode {
        self.as_erasure(Erasure::of(target))
    }

    pub(crate) fn as_erasure(&self, target: Erasure) -> TypeNode {
        if self.is_none() {
            return TypeNode::NONE;
        }
        match self.resolve() {
            None => return self.clone(),
            Some(resolved) if resolved == target => return self.clone(),
            Some(_) => {}
        }
        for interface in self.interfaces().iter() {
            let found = interface.as_erasure(target);
            if !found.is_none() {
                return found;
            }
        }
        self.super_type().as_erasure(target)
    }

    pub fn as_collection(&self) -> TypeNode {
        match self.store() {
            Some(store) => self.as_class(store.well_known().collection),
            None => TypeNode::NONE,
        }
    }

    pub fn as_map(&self) -> TypeNode {
        match self.store() {
            Some(store) => self.as_class(store.well_known().map),
            None => TypeNode::NONE,
        }
    }

    pub fn is_assignable_from_class(&self, erasure: Erasure) -> bool {
        match self.store() {
            Some(store) => self.is_assignable_from(&TypeNode::for_erasure(store, erasure)),
            None => false,
        }
    }

    fn resolver_sources_equal(
        a: &Option<Arc<dyn VariableResolver>>,
        b: &Option<Arc<dyn VariableResolver>>,
    ) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b) || a.source() == b.source(),
            _ => false,
        }
    }
}

impl PartialEq for TypeNode {
    fn eq(&self, other: &Self) -> bool {
        match (&self.inner, &other.inner) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                Arc::ptr_eq(a, b)
                    || (a.expr == b.expr
                        && a.component == b.component
                        && a.explicit_generics == b.explicit_generics
                        && Self::resolver_sources_equal(&a.resolver, &b.resolver))
            }
            _ => false,
        }
    }
}

impl Eq for TypeNode {}

impl Hash for TypeNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.expr().hash(state);
    }
}

impl fmt::Display for TypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_array() {
            return write!(f, "{}[]", self.component_type());
        }
        let (Some(inner), Some(resolved)) = (&self.inner, self.resolve()) else {
            return f.write_str("?");
        };
        if let TypeExpr::Variable(var) = &inner.expr {
            let bound = inner
                .resolver
                .as_ref()
                .and_then(|resolver| resolver.resolve_variable(*var));
            if bound.is_none() {
                return f.write_str("?");
            }
        }

        f.write_str(&inner.store.erasure_name(resolved))?;
        let generics = self.generics();
        if !generics.is_empty() {
            f.write_str("<")?;
            for (idx, generic) in generics.iter().enumerate() {
                if idx > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{generic}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

impl fmt::Debug for TypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            None => f.write_str("TypeNode::NONE"),
            Some(inner) => f
                .debug_struct("TypeNode")
                .field("expr", &inner.expr)
                .field("display", &format_args!("{self}"))
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store() -> Arc<TypeStore> {
        Arc::new(TypeStore::with_minimal_jdk())
    }

    fn node(store: &Arc<TypeStore>, text: &str) -> TypeNode {
        TypeNode::for_expr(store, store.parse_type(text).unwrap())
    }

    #[test]
    fn none_is_inert() {
        let none = TypeNode::NONE;
        assert_eq!(none.resolve(), None);
        assert!(none.generics().is_empty());
        assert!(none.super_type().is_none());
        assert!(none.component_type().is_none());
        assert!(!none.is_array());
        assert_eq!(none.to_string(), "?");
    }

    #[test]
    fn raw_generic_class_exposes_open_variables() {
        let store = store();
        let list = TypeNode::for_class(&store, store.well_known().list);

        let generics = list.generics();
        assert_eq!(generics.len(), 1);
        assert!(matches!(generics[0].expr(), Some(TypeExpr::Variable(_))));
        assert_eq!(generics[0].resolve(), None);
        assert_eq!(list.to_string(), "java.util.List<?>");
    }

    #[test]
    fn wildcard_resolves_to_first_bound() {
        let store = store();
        let wk = store.well_known().clone();

        assert_eq!(node(&store, "? extends Number").resolve(), Some(Erasure::of(wk.number)));
        assert_eq!(node(&store, "? super Integer").resolve(), Some(Erasure::of(wk.integer)));
        assert_eq!(node(&store, "?").resolve(), None);
    }

    #[test]
    fn variable_falls_back_to_declared_bound() {
        let store = store();
        let enum_params = store.type_parameters(store.well_known().enum_).to_vec();
        let e = TypeNode::for_expr(&store, TypeExpr::Variable(enum_params[0]));
        assert_eq!(e.resolve(), Some(Erasure::of(store.well_known().enum_)));
    }

    #[test]
    fn generic_array_materializes_from_component() {
        let store = store();
        let arr = node(&store, "java.util.List<String>[]");
        assert!(arr.is_array());
        assert_eq!(arr.resolve(), Some(Erasure::of(store.well_known().list).array()));
        assert_eq!(arr.to_string(), "java.util.List<java.lang.String>[]");

        let synthetic = TypeNode::for_array_component(&node(&store, "Integer"));
        assert_eq!(synthetic.resolve(), Some(Erasure::of(store.well_known().integer).array()));
        assert_eq!(synthetic.component_type().to_string(), "java.lang.Integer");

        let deepest = Erasure::array_of(store.well_known().integer, Erasure::MAX_DIMS);
        let component = TypeNode::for_erasure(&store, deepest);
        let beyond = TypeNode::for_array_component(&component);
        assert!(beyond.is_array());
        assert_eq!(beyond.resolve(), None);
        assert_eq!(beyond.component_type().resolve(), Some(deepest));
    }

    #[test]
    fn with_generics_rejects_wrong_arity() {
        let store = store();
        let string = TypeNode::for_class(&store, store.well_known().string);
        let err = TypeNode::for_class_with_generics(&store, store.well_known().map, &[string])
            .unwrap_err();
        assert!(matches!(err, TypesError::GenericArity { expected: 2, found: 1, .. }));
    }

    #[test]
    fn equality_follows_expression_and_resolver() {
        let store = store();
        assert_eq!(node(&store, "java.util.List<String>"), node(&store, "java.util.List<String>"));
        assert_ne!(node(&store, "java.util.List<String>"), node(&store, "java.util.List<Integer>"));
        assert_ne!(node(&store, "String"), TypeNode::NONE);
    }
}
