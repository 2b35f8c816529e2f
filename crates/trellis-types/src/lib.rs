//! Generic type model for Trellis.
//!
//! Classes are declared in a [`TypeStore`] up front; [`TypeNode`]s then resolve erasures,
//! generic arguments, supertypes and structural assignability over that registry.

#![forbid(unsafe_code)]

mod assignable;
mod builder;
mod error;
mod expr;
mod jdk;
mod node;
mod signature;
mod site;
mod store;

pub use crate::assignable::WildcardKind;
pub use crate::builder::ClassBuilder;
pub use crate::error::{Result, TypesError};
pub use crate::expr::{Erasure, ParameterizedType, TypeExpr, WildcardType};
pub use crate::node::{TypeNode, VariableResolver};
pub use crate::site::{MethodParameter, ParameterIndex};
pub use crate::store::{
    Annotation, ClassDef, ClassId, ClassKind, FieldDef, MethodDef, ParamDef, TypeParamDef,
    TypeStore, TypeVarId, WellKnownTypes,
};
