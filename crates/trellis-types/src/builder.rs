use crate::error::{Result, TypesError};
use crate::{
    Annotation, ClassDef, ClassId, ClassKind, FieldDef, MethodDef, ParamDef, TypeExpr, TypeParamDef,
    TypeStore, TypeVarId,
};

/// Fluent declaration of a class using textual type expressions.
///
/// Type expressions are parsed in the scope of the type parameters declared so far, so declare
/// type parameters first. The first parse error is kept and reported by [`ClassBuilder::build`].
///
/// ```
/// # use trellis_types::TypeStore;
/// let mut store = TypeStore::with_minimal_jdk();
/// let base = store
///     .class_builder("com.example.Base")
///     .type_param("T", &[])
///     .field("items", "java.util.List<T>")
///     .build()
///     .unwrap();
/// assert_eq!(store.type_parameters(base).len(), 1);
/// ```
pub struct ClassBuilder<'a> {
    store: &'a mut TypeStore,
    id: ClassId,
    def: ClassDef,
    error: Option<TypesError>,
}

impl TypeStore {
    pub fn class_builder(&mut self, name: &str) -> ClassBuilder<'_> {
        let id = self.intern_class_id(name);
        ClassBuilder {
            store: self,
            id,
            def: ClassDef::new(name, ClassKind::Class),
            error: None,
        }
    }
}

impl<'a> ClassBuilder<'a> {
    pub fn id(&self) -> ClassId {
        self.id
    }

    fn parse_in(&mut self, text: &str, scope: &[TypeVarId]) -> Option<TypeExpr> {
        if self.error.is_some() {
            return None;
        }
        match self.store.parse_type_in(text, scope) {
            Ok(ty) => Some(ty),
            Err(err) => {
                self.error = Some(err);
                None
            }
        }
    }

    fn parse(&mut self, text: &str) -> Option<TypeExpr> {
        let scope = self.def.type_params.clone();
        self.parse_in(text, &scope)
    }

    pub fn kind(mut self, kind: ClassKind) -> Self {
        self.def.kind = kind;
        self
    }

    pub fn interface(self) -> Self {
        self.kind(ClassKind::Interface)
    }

    /// Declare an enum with the given constants. Unless `extends` is given, the class extends
    /// `Enum<Self>`.
    pub fn enumeration(mut self, constants: &[&str]) -> Self {
        self.def.kind = ClassKind::Enum;
        self.def.enum_constants = constants.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Declare a type parameter. `bounds` may mention the parameter itself (`E extends Enum<E>`).
    pub fn type_param(mut self, name: &str, bounds: &[&str]) -> Self {
        let id = self.store.add_type_param(name, Vec::new());
        self.def.type_params.push(id);
        self.store.declare_type_params(self.id, &self.def.type_params);

        let mut upper_bounds = Vec::with_capacity(bounds.len());
        for bound in bounds {
            if let Some(ty) = self.parse(bound) {
                upper_bounds.push(ty);
            }
        }
        self.store.define_type_param(
            id,
            TypeParamDef {
                name: name.to_string(),
                upper_bounds,
            },
        );
        self
    }

    pub fn extends(mut self, super_class: &str) -> Self {
        if let Some(ty) = self.parse(super_class) {
            self.def.super_class = Some(ty);
        }
        self
    }

    pub fn implements(mut self, interface: &str) -> Self {
        if let Some(ty) = self.parse(interface) {
            self.def.interfaces.push(ty);
        }
        self
    }

    pub fn annotation(mut self, annotation: Annotation) -> Self {
        self.def.annotations.push(annotation);
        self
    }

    pub fn field(self, name: &str, ty: &str) -> Self {
        self.annotated_field(name, ty, Vec::new())
    }

    pub fn annotated_field(mut self, name: &str, ty: &str, annotations: Vec<Annotation>) -> Self {
        if let Some(ty) = self.parse(ty) {
            self.def.fields.push(FieldDef {
                name: name.to_string(),
                ty,
                annotations,
            });
        }
        self
    }

    /// Declare a method. `params` are `(name, type)` pairs; `return_type` is `None` for `void`.
    pub fn method(self, name: &str, params: &[(&str, &str)], return_type: Option<&str>) -> Self {
        self.generic_method(name, &[], params, return_type)
    }

    /// Declare a method with its own (unbounded) type parameters.
    pub fn generic_method(
        mut self,
        name: &str,
        type_params: &[&str],
        params: &[(&str, &str)],
        return_type: Option<&str>,
    ) -> Self {
        let method_vars: Vec<TypeVarId> = type_params
            .iter()
            .map(|tp| self.store.add_type_param(*tp, Vec::new()))
            .collect();
        let mut scope = self.def.type_params.clone();
        scope.extend(method_vars.iter().copied());

        let mut param_defs = Vec::with_capacity(params.len());
        for (param_name, ty) in params {
            let Some(ty) = self.parse_in(ty, &scope) else {
                return self;
            };
            param_defs.push(ParamDef {
                name: param_name.to_string(),
                ty,
                annotations: Vec::new(),
            });
        }

        let return_type = match return_type {
            Some(text) => match self.parse_in(text, &scope) {
                Some(ty) => Some(ty),
                None => return self,
            },
            None => None,
        };

        self.def.methods.push(MethodDef {
            name: name.to_string(),
            type_params: method_vars,
            params: param_defs,
            return_type,
            annotations: Vec::new(),
        });
        self
    }

    /// Attach an annotation to the most recently declared method.
    pub fn annotate_method(mut self, annotation: Annotation) -> Self {
        if let Some(method) = self.def.methods.last_mut() {
            method.annotations.push(annotation);
        }
        self
    }

    /// Attach an annotation to parameter `index` of the most recently declared method.
    pub fn annotate_param(mut self, index: usize, annotation: Annotation) -> Self {
        if let Some(param) = self
            .def
            .methods
            .last_mut()
            .and_then(|m| m.params.get_mut(index))
        {
            param.annotations.push(annotation);
        }
        self
    }

    pub fn build(mut self) -> Result<ClassId> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }

        if self.def.kind == ClassKind::Enum && self.def.super_class.is_none() {
            let enum_ = self.store.well_known().enum_;
            self.def.super_class = Some(TypeExpr::parameterized(
                enum_,
                vec![TypeExpr::class(self.id)],
            ));
        }

        tracing::debug!(target = "trellis.types", class = %self.def.name, "defining class");
        self.store.define_class(self.id, self.def);
        Ok(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_referential_bound_is_preserved() {
        let mut store = TypeStore::with_minimal_jdk();
        let comparable = store.well_known().comparable;

        let id = store
            .class_builder("com.example.Version")
            .type_param("V", &["Comparable<V>"])
            .build()
            .unwrap();

        let v = store.type_parameters(id)[0];
        let def = store.type_param(v).unwrap();
        assert_eq!(
            def.upper_bounds,
            vec![TypeExpr::parameterized(comparable, vec![TypeExpr::Variable(v)])]
        );
    }

    #[test]
    fn enum_defaults_to_enum_of_self() {
        let mut store = TypeStore::with_minimal_jdk();
        let color = store
            .class_builder("com.example.Color")
            .enumeration(&["RED", "GREEN"])
            .build()
            .unwrap();

        let def = store.class(color).unwrap();
        assert_eq!(def.kind, ClassKind::Enum);
        assert_eq!(def.enum_constants, vec!["RED".to_string(), "GREEN".to_string()]);
        assert_eq!(
            def.super_class,
            Some(TypeExpr::parameterized(
                store.well_known().enum_,
                vec![TypeExpr::class(color)]
            ))
        );
    }

    #[test]
    fn first_parse_error_is_reported() {
        let mut store = TypeStore::with_minimal_jdk();
        let err = store
            .class_builder("com.example.Broken")
            .field("a", "com.example.Missing")
            .field("b", "java.util.List<")
            .build()
            .unwrap_err();
        assert_eq!(err, TypesError::UnknownType("com.example.Missing".into()));
    }
}
