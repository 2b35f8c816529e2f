//! Type expressions: the declared (possibly generic) shape of a field, parameter or return value.
//!
//! A [`TypeExpr`] is the raw input a [`crate::TypeNode`] wraps. Equality and hashing are
//! structural, and that structural identity is what type nodes compare by.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ClassId, TypeVarId};

/// The runtime type underlying a type expression: a class plus an array dimension count.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Erasure {
    class: ClassId,
    dims: u8,
}

impl Erasure {
    pub const fn of(class: ClassId) -> Self {
        Self { class, dims: 0 }
    }

    pub const fn array_of(class: ClassId, dims: u8) -> Self {
        Self { class, dims }
    }

    /// The class at the bottom of all array dimensions.
    pub fn element_class(self) -> ClassId {
        self.class
    }

    pub fn dims(self) -> u8 {
        self.dims
    }

    pub fn is_array(self) -> bool {
        self.dims > 0
    }

    pub const MAX_DIMS: u8 = u8::MAX;

    /// One more array dimension (`String` -> `String[]`). Saturates at
    /// [`Erasure::MAX_DIMS`]; use [`Erasure::checked_array`] when the dimension count is not
    /// already bounded by an existing array.
    pub fn array(self) -> Self {
        self.checked_array().unwrap_or(self)
    }

    /// One more array dimension, `None` past [`Erasure::MAX_DIMS`].
    pub fn checked_array(self) -> Option<Self> {
        Some(Self {
            class: self.class,
            dims: self.dims.checked_add(1)?,
        })
    }

    /// The component erasure of an array (`String[][]` -> `String[]`), `None` for non-arrays.
    pub fn component(self) -> Option<Self> {
        if self.dims == 0 {
            return None;
        }
        Some(Self {
            class: self.class,
            dims: self.dims - 1,
        })
    }

    /// `Some(class)` when this erasure is a plain (non-array) class.
    pub fn as_class(self) -> Option<ClassId> {
        (self.dims == 0).then_some(self.class)
    }
}

impl fmt::Debug for Erasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Erasure({}", self.class.to_raw())?;
        for _ in 0..self.dims {
            f.write_str("[]")?;
        }
        f.write_str(")")
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterizedType {
    pub raw: ClassId,
    pub args: Vec<TypeExpr>,
    /// Enclosing parameterized type for inner classes (`Outer<T>.Inner<U>`).
    pub owner: Option<Box<TypeExpr>>,
}

/// `?`, `? extends B` or `? super B`.
///
/// An empty `upper_bounds` list means "bounded above by `Object`".
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WildcardType {
    pub upper_bounds: Vec<TypeExpr>,
    pub lower_bounds: Vec<TypeExpr>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeExpr {
    /// A plain class or an erasure array (`String`, `int[]`).
    Class(Erasure),
    Parameterized(ParameterizedType),
    /// An array whose component is not a plain class (`T[]`, `List<String>[]`).
    GenericArray(Box<TypeExpr>),
    Wildcard(WildcardType),
    Variable(TypeVarId),
}

impl TypeExpr {
    pub fn class(id: ClassId) -> Self {
        TypeExpr::Class(Erasure::of(id))
    }

    pub fn parameterized(raw: ClassId, args: Vec<TypeExpr>) -> Self {
        TypeExpr::Parameterized(ParameterizedType {
            raw,
            args,
            owner: None,
        })
    }

    /// Wrap `component` in one array dimension, folding into an erasure array when possible.
    pub fn array_of(component: TypeExpr) -> Self {
        match component {
            TypeExpr::Class(erasure) => match erasure.checked_array() {
                Some(array) => TypeExpr::Class(array),
                None => TypeExpr::GenericArray(Box::new(TypeExpr::Class(erasure))),
            },
            other => TypeExpr::GenericArray(Box::new(other)),
        }
    }

    pub fn unbounded() -> Self {
        TypeExpr::Wildcard(WildcardType::default())
    }

    pub fn extends(bound: TypeExpr) -> Self {
        TypeExpr::Wildcard(WildcardType {
            upper_bounds: vec![bound],
            lower_bounds: Vec::new(),
        })
    }

    pub fn super_of(bound: TypeExpr) -> Self {
        TypeExpr::Wildcard(WildcardType {
            upper_bounds: Vec::new(),
            lower_bounds: vec![bound],
        })
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, TypeExpr::Wildcard(_))
    }
}

impl From<Erasure> for TypeExpr {
    fn from(erasure: Erasure) -> Self {
        TypeExpr::Class(erasure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_of_folds_class_components() {
        let string = ClassId::new(3);
        assert_eq!(
            TypeExpr::array_of(TypeExpr::class(string)),
            TypeExpr::Class(Erasure::array_of(string, 1))
        );

        let var = TypeExpr::Variable(TypeVarId::new(0));
        assert_eq!(
            TypeExpr::array_of(var.clone()),
            TypeExpr::GenericArray(Box::new(var))
        );
    }

    #[test]
    fn erasure_component_strips_one_dimension() {
        let int = ClassId::new(1);
        let matrix = Erasure::array_of(int, 2);
        assert_eq!(matrix.component(), Some(Erasure::array_of(int, 1)));
        assert_eq!(Erasure::of(int).component(), None);
        assert_eq!(matrix.element_class(), int);
    }

    #[test]
    fn array_dimensions_stop_at_the_limit() {
        let int = ClassId::new(1);
        let deepest = Erasure::array_of(int, Erasure::MAX_DIMS);
        assert_eq!(deepest.checked_array(), None);
        assert_eq!(
            Erasure::array_of(int, 3).checked_array(),
            Some(Erasure::array_of(int, 4))
        );

        // No folding past the limit, so the component stays distinct from the array.
        assert_eq!(
            TypeExpr::array_of(TypeExpr::Class(deepest)),
            TypeExpr::GenericArray(Box::new(TypeExpr::Class(deepest)))
        );
    }
}
