//! Declaration sites: fields, method parameters and return values as sources of type nodes.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Result, TypesError};
use crate::{Annotation, ClassId, FieldDef, MethodDef, TypeExpr, TypeNode, TypeStore};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParameterIndex {
    Return,
    Param(usize),
}

/// A method parameter or return value, optionally seen through a subclass and at a nesting level
/// below the declared type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodParameter {
    declaring_class: ClassId,
    method: String,
    index: ParameterIndex,
    containing_class: Option<ClassId>,
    nesting_level: usize,
    type_indexes_per_level: HashMap<usize, usize>,
}

impl MethodParameter {
    pub fn new(declaring_class: ClassId, method: impl Into<String>, index: ParameterIndex) -> Self {
        Self {
            declaring_class,
            method: method.into(),
            index,
            containing_class: None,
            nesting_level: 1,
            type_indexes_per_level: HashMap::new(),
        }
    }

    pub fn for_return(declaring_class: ClassId, method: impl Into<String>) -> Self {
        Self::new(declaring_class, method, ParameterIndex::Return)
    }

    /// Resolve generics against `class`, a subclass of the declaring class.
    pub fn with_containing_class(mut self, class: ClassId) -> Self {
        self.containing_class = Some(class);
        self
    }

    /// One level deeper into the parameter's generics or array component.
    pub fn nested(&self) -> Self {
        let mut nested = self.clone();
        nested.nesting_level += 1;
        nested
    }

    /// Select generic argument `index` at the current nesting level instead of the last one.
    pub fn with_type_index(mut self, index: usize) -> Self {
        self.type_indexes_per_level.insert(self.nesting_level, index);
        self
    }

    pub fn declaring_class(&self) -> ClassId {
        self.declaring_class
    }

    pub fn containing_class(&self) -> ClassId {
        self.containing_class.unwrap_or(self.declaring_class)
    }

    pub fn method_name(&self) -> &str {
        &self.method
    }

    pub fn index(&self) -> ParameterIndex {
        self.index
    }

    pub fn nesting_level(&self) -> usize {
        self.nesting_level
    }

    pub fn type_index_for_level(&self, level: usize) -> Option<usize> {
        self.type_indexes_per_level.get(&level).copied()
    }

    pub fn type_indexes_per_level(&self) -> &HashMap<usize, usize> {
        &self.type_indexes_per_level
    }

    fn method_def<'s>(&self, store: &'s TypeStore) -> Result<&'s MethodDef> {
        store
            .method(self.declaring_class, &self.method)
            .ok_or_else(|| unknown_member(store, self.declaring_class, &self.method))
    }

    /// The declared type expression; `None` for a `void` return.
    pub fn declared_type(&self, store: &TypeStore) -> Result<Option<TypeExpr>> {
        let method = self.method_def(store)?;
        match self.index {
            ParameterIndex::Return => Ok(method.return_type.clone()),
            ParameterIndex::Param(idx) => method
                .params
                .get(idx)
                .map(|param| Some(param.ty.clone()))
                .ok_or_else(|| self.unknown_parameter(store, idx)),
        }
    }

    /// Annotations on the parameter, or on the method for a return value.
    pub fn annotations<'s>(&self, store: &'s TypeStore) -> Result<&'s [Annotation]> {
        let method = self.method_def(store)?;
        match self.index {
            ParameterIndex::Return => Ok(&method.annotations),
            ParameterIndex::Param(idx) => method
                .params
                .get(idx)
                .map(|param| param.annotations.as_slice())
                .ok_or_else(|| self.unknown_parameter(store, idx)),
        }
    }

    fn unknown_parameter(&self, store: &TypeStore, index: usize) -> TypesError {
        TypesError::UnknownParameter {
            class: class_name(store, self.declaring_class),
            method: self.method.clone(),
            index,
        }
    }
}

fn class_name(store: &TypeStore, class: ClassId) -> String {
    store
        .class(class)
        .map(|def| def.name.clone())
        .unwrap_or_else(|| format!("{class:?}"))
}

fn unknown_member(store: &TypeStore, class: ClassId, member: &str) -> TypesError {
    TypesError::UnknownMember {
        class: class_name(store, class),
        member: member.to_string(),
    }
}

pub(crate) fn field_def<'s>(store: &'s TypeStore, class: ClassId, name: &str) -> Result<&'s FieldDef> {
    store
        .field(class, name)
        .ok_or_else(|| unknown_member(store, class, name))
}

impl TypeNode {
    /// The declared type of `field`, with variables left to their bounds.
    pub fn for_field(store: &Arc<TypeStore>, class: ClassId, field: &str) -> Result<TypeNode> {
        let def = field_def(store, class, field)?;
        Ok(TypeNode::for_expr(store, def.ty.clone()))
    }

    /// The type of `field` (declared on `declaring`) as seen from `implementation`, a subclass
    /// that may bind the declaring class's type parameters.
    pub fn for_field_in(
        store: &Arc<TypeStore>,
        declaring: ClassId,
        field: &str,
        implementation: ClassId,
    ) -> Result<TypeNode> {
        let def = field_def(store, declaring, field)?;
        let owner = TypeNode::for_class(store, implementation).as_class(declaring);
        Ok(TypeNode::for_expr_with_owner(store, def.ty.clone(), &owner))
    }

    pub fn for_field_nested(
        store: &Arc<TypeStore>,
        class: ClassId,
        field: &str,
        nesting_level: usize,
    ) -> Result<TypeNode> {
        Ok(Self::for_field(store, class, field)?.nested(nesting_level, None))
    }

    /// The type of a method parameter or return value, resolved against its containing class
    /// and walked down to its nesting level. A `void` return yields [`TypeNode::NONE`].
    pub fn for_method_parameter(store: &Arc<TypeStore>, param: &MethodParameter) -> Result<TypeNode> {
        let Some(declared) = param.declared_type(store)? else {
            return Ok(TypeNode::NONE);
        };
        let owner =
            TypeNode::for_class(store, param.containing_class()).as_class(param.declaring_class());
        Ok(TypeNode::for_expr_with_owner(store, declared, &owner)
            .nested(param.nesting_level(), Some(param.type_indexes_per_level())))
    }

    pub fn for_method_return_type(
        store: &Arc<TypeStore>,
        class: ClassId,
        method: &str,
    ) -> Result<TypeNode> {
        Self::for_method_parameter(store, &MethodParameter::for_return(class, method))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn type_index_applies_to_current_level() {
        let param = MethodParameter::new(ClassId::new(0), "put", ParameterIndex::Param(0))
            .nested()
            .with_type_index(0);
        assert_eq!(param.nesting_level(), 2);
        assert_eq!(param.type_index_for_level(2), Some(0));
        assert_eq!(param.type_index_for_level(1), None);
    }

    #[test]
    fn unknown_members_are_reported() {
        let store = Arc::new(TypeStore::with_minimal_jdk());
        let string = store.well_known().string;

        let err = TypeNode::for_field(&store, string, "value").unwrap_err();
        assert_eq!(
            err,
            TypesError::UnknownMember {
                class: "java.lang.String".into(),
                member: "value".into(),
            }
        );
    }
}
