//! Structural assignability between type nodes.
//!
//! Top-level comparisons follow ordinary subtyping (plus boxing). Once inside a generic argument
//! position the comparison becomes invariant: erasures must match exactly unless a wildcard says
//! otherwise. A map of already-compared expression pairs is threaded through the recursion so
//! self-referential bounds such as `E extends Enum<E>` terminate.

use std::collections::HashMap;

use crate::{Erasure, TypeExpr, TypeNode};

/// Direction of a wildcard bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WildcardKind {
    /// `? extends B`, or a bare `?`: at most `B`.
    Upper,
    /// `? super B`: at least `B`.
    Lower,
}

type Matched = Option<HashMap<TypeExpr, TypeExpr>>;

struct WildcardBounds {
    kind: WildcardKind,
    bounds: Vec<TypeNode>,
}

impl WildcardBounds {
    /// The wildcard `node` is, or resolves to, if any.
    fn of(node: &TypeNode) -> Option<Self> {
        let store = node.store()?.clone();
        let mut current = node.clone();
        let wildcard = loop {
            if let TypeExpr::Wildcard(w) = current.expr()? {
                break w.clone();
            }
            let next = current.resolve_type();
            current = next;
        };

        let (kind, exprs) = if wildcard.lower_bounds.is_empty() {
            let upper = if wildcard.upper_bounds.is_empty() {
                vec![TypeExpr::class(store.well_known().object)]
            } else {
                wildcard.upper_bounds
            };
            (WildcardKind::Upper, upper)
        } else {
            (WildcardKind::Lower, wildcard.lower_bounds)
        };

        let resolver = node.variable_resolver().cloned();
        let bounds = exprs
            .into_iter()
            .map(|expr| TypeNode::for_expr_with_resolver(&store, expr, resolver.clone()))
            .collect();
        Some(Self { kind, bounds })
    }

    fn accepts(&self, bound: &TypeNode, ty: &TypeNode) -> bool {
        match self.kind {
            WildcardKind::Upper => bound.is_assignable_from(ty),
            WildcardKind::Lower => ty.is_assignable_from(bound),
        }
    }

    fn accepts_all(&self, types: &[TypeNode]) -> bool {
        self.bounds
            .iter()
            .all(|bound| types.iter().all(|ty| self.accepts(bound, ty)))
    }
}

impl TypeNode {
    /// The kind of wildcard this node is or resolves to.
    pub fn wildcard_kind(&self) -> Option<WildcardKind> {
        WildcardBounds::of(self).map(|bounds| bounds.kind)
    }

    /// Whether a value of type `other` may be treated as this type.
    ///
    /// [`TypeNode::NONE`] is assignable from and to nothing.
    pub fn is_assignable_from(&self, other: &TypeNode) -> bool {
        self.assignable_from(other, &mut None)
    }

    fn assignable_from(&self, other: &TypeNode, matched: &mut Matched) -> bool {
        let (Some(store), Some(our_expr), Some(other_expr)) =
            (self.store(), self.expr(), other.expr())
        else {
            return false;
        };

        if self.is_array() {
            return other.is_array()
                && self
                    .component_type()
                    .is_assignable_from(&other.component_type());
        }

        if matched
            .as_ref()
            .and_then(|pairs| pairs.get(our_expr))
            .is_some_and(|seen| seen == other_expr)
        {
            return true;
        }

        let our_bounds = WildcardBounds::of(self);
        if let Some(their_bounds) = WildcardBounds::of(other) {
            return our_bounds.is_some_and(|ours| {
                ours.kind == their_bounds.kind && ours.accepts_all(&their_bounds.bounds)
            });
        }
        if let Some(ours) = our_bounds {
            return ours.accepts_all(std::slice::from_ref(other));
        }

        // Nested generic arguments are invariant.
        let mut exact = matched.is_some();
        let mut check_generics = true;
        let mut our_resolved = None;

        if let TypeExpr::Variable(var) = our_expr {
            our_resolved = self
                .variable_resolver()
                .and_then(|resolver| resolver.resolve_variable(*var))
                .and_then(|node| node.resolve());
            if our_resolved.is_none() {
                if let Some(node) = other
                    .variable_resolver()
                    .and_then(|resolver| resolver.resolve_variable(*var))
                {
                    our_resolved = node.resolve();
                    check_generics = false;
                }
            }
            if our_resolved.is_none() {
                // An open variable never insists on an exact match.
                exact = false;
            }
        }

        let object = Erasure::of(store.well_known().object);
        let our_resolved = our_resolved.unwrap_or_else(|| self.resolve_or(object));
        let other_resolved = other.resolve_or(object);

        let compatible = if exact {
            our_resolved == other_resolved
        } else {
            store.is_assignable(our_resolved, other_resolved)
        };
        if !compatible {
            return false;
        }

        if check_generics {
            let ours = self.generics();
            let theirs = other.as_erasure(our_resolved).generics();
            if ours.len() != theirs.len() {
                return false;
            }
            matched
                .get_or_insert_with(HashMap::new)
                .insert(our_expr.clone(), other_expr.clone());
            for (our_generic, their_generic) in ours.iter().zip(theirs.iter()) {
                if !our_generic.assignable_from(their_generic, matched) {
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::TypeStore;

    fn node(store: &Arc<TypeStore>, text: &str) -> TypeNode {
        TypeNode::for_expr(store, store.parse_type(text).unwrap())
    }

    #[test]
    fn top_level_is_covariant_nested_is_invariant() {
        let store = Arc::new(TypeStore::with_minimal_jdk());

        assert!(node(&store, "Number").is_assignable_from(&node(&store, "Integer")));
        assert!(node(&store, "java.util.Collection<String>")
            .is_assignable_from(&node(&store, "java.util.ArrayList<String>")));
        assert!(!node(&store, "java.util.List<CharSequence>")
            .is_assignable_from(&node(&store, "java.util.List<String>")));
    }

    #[test]
    fn wildcard_kinds_must_agree() {
        let store = Arc::new(TypeStore::with_minimal_jdk());
        let lower = node(&store, "? super String");

        assert_eq!(lower.wildcard_kind(), Some(WildcardKind::Lower));
        assert_eq!(node(&store, "?").wildcard_kind(), Some(WildcardKind::Upper));
        assert!(lower.is_assignable_from(&node(&store, "String")));
        assert!(lower.is_assignable_from(&node(&store, "? super String")));
        assert!(!lower.is_assignable_from(&node(&store, "? extends String")));
    }

    #[test]
    fn arrays_compare_components() {
        let store = Arc::new(TypeStore::with_minimal_jdk());

        assert!(node(&store, "Number[]").is_assignable_from(&node(&store, "Integer[]")));
        assert!(!node(&store, "Number[]").is_assignable_from(&node(&store, "Integer")));
        assert!(!node(&store, "Integer").is_assignable_from(&node(&store, "Integer[]")));
    }

    #[test]
    fn none_is_never_assignable() {
        let store = Arc::new(TypeStore::with_minimal_jdk());
        let string = node(&store, "String");

        assert!(!TypeNode::NONE.is_assignable_from(&string));
        assert!(!string.is_assignable_from(&TypeNode::NONE));
        assert!(!TypeNode::NONE.is_assignable_from(&TypeNode::NONE));
    }
}
