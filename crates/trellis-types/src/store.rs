//! The type registry.
//!
//! There is no runtime generics introspection to lean on, so every class the engine reasons
//! about is declared up front in a [`TypeStore`]: its kind, type parameters, generic supertypes
//! and declaration sites. The store is built mutably at startup and then shared behind an
//! `Arc` by every [`crate::TypeNode`].

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Erasure, TypeExpr};

#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(u32);

impl ClassId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn to_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeVarId(u32);

impl TypeVarId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn to_raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for TypeVarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeVarId({})", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    Enum,
    Primitive,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Annotation {
    /// Binary name of the annotation type.
    pub name: String,
    pub elements: Vec<(String, String)>,
}

impl Annotation {
    pub fn marker(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            elements: Vec::new(),
        }
    }

    pub fn with_element(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.elements.push((name.into(), value.into()));
        self
    }

    pub fn element(&self, name: &str) -> Option<&str> {
        self.elements
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParamDef {
    pub name: String,
    /// Declared upper bounds in source order. Empty means unbounded (`Object`).
    pub upper_bounds: Vec<TypeExpr>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeExpr,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDef {
    pub name: String,
    pub ty: TypeExpr,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,
    #[serde(default)]
    pub type_params: Vec<TypeVarId>,
    pub params: Vec<ParamDef>,
    /// `None` for `void`.
    pub return_type: Option<TypeExpr>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDef {
    pub name: String,
    pub kind: ClassKind,
    pub type_params: Vec<TypeVarId>,
    /// Generic superclass. `None` on a class (not an interface) means `Object`.
    pub super_class: Option<TypeExpr>,
    pub interfaces: Vec<TypeExpr>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub methods: Vec<MethodDef>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    /// Constant names of an enum, in declaration order.
    #[serde(default)]
    pub enum_constants: Vec<String>,
}

impl ClassDef {
    pub fn new(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            ..Self::default()
        }
    }

    /// The part of the binary name after the last `.` (`java.util.List` -> `List`).
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

/// Ids of the bootstrap types the engine relies on.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WellKnownTypes {
    pub object: ClassId,
    pub string: ClassId,
    pub char_sequence: ClassId,
    pub comparable: ClassId,
    pub number: ClassId,
    pub boolean: ClassId,
    pub byte: ClassId,
    pub short: ClassId,
    pub integer: ClassId,
    pub long: ClassId,
    pub float: ClassId,
    pub double: ClassId,
    pub character: ClassId,
    pub enum_: ClassId,
    pub cloneable: ClassId,
    pub serializable: ClassId,
    pub iterable: ClassId,
    pub collection: ClassId,
    pub list: ClassId,
    pub set: ClassId,
    pub array_list: ClassId,
    pub hash_set: ClassId,
    pub linked_hash_set: ClassId,
    pub map: ClassId,
    pub hash_map: ClassId,
    pub prim_boolean: ClassId,
    pub prim_byte: ClassId,
    pub prim_short: ClassId,
    pub prim_int: ClassId,
    pub prim_long: ClassId,
    pub prim_float: ClassId,
    pub prim_double: ClassId,
    pub prim_char: ClassId,
}

impl WellKnownTypes {
    /// `(primitive, wrapper)` pairs.
    pub fn primitive_wrappers(&self) -> [(ClassId, ClassId); 8] {
        [
            (self.prim_boolean, self.boolean),
            (self.prim_byte, self.byte),
            (self.prim_short, self.short),
            (self.prim_int, self.integer),
            (self.prim_long, self.long),
            (self.prim_float, self.float),
            (self.prim_double, self.double),
            (self.prim_char, self.character),
        ]
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TypeStore {
    classes: Vec<ClassDef>,
    type_params: Vec<TypeParamDef>,
    #[serde(skip)]
    by_name: HashMap<String, ClassId>,
    well_known: WellKnownTypes,
}

impl Default for TypeStore {
    fn default() -> Self {
        Self::with_minimal_jdk()
    }
}

impl TypeStore {
    /// A store with no classes at all. Most callers want [`TypeStore::with_minimal_jdk`]; an
    /// empty store is only useful as the target of a custom bootstrap.
    pub fn empty() -> Self {
        Self {
            classes: Vec::new(),
            type_params: Vec::new(),
            by_name: HashMap::new(),
            well_known: WellKnownTypes::default(),
        }
    }

    /// Rebuild the name index after deserializing a precomputed store.
    pub fn reindex(&mut self) {
        self.by_name = self
            .classes
            .iter()
            .enumerate()
            .map(|(idx, def)| (def.name.clone(), ClassId(idx as u32)))
            .collect();
    }

    /// Load a precomputed registry (see [`TypeStore::to_json`]).
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut store: TypeStore = serde_json::from_str(json)?;
        store.reindex();
        Ok(store)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub(crate) fn set_well_known(&mut self, well_known: WellKnownTypes) {
        self.well_known = well_known;
    }

    pub fn well_known(&self) -> &WellKnownTypes {
        &self.well_known
    }

    pub fn class(&self, id: ClassId) -> Option<&ClassDef> {
        self.classes.get(id.0 as usize)
    }

    pub fn type_param(&self, id: TypeVarId) -> Option<&TypeParamDef> {
        self.type_params.get(id.0 as usize)
    }

    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &ClassDef)> {
        self.classes
            .iter()
            .enumerate()
            .map(|(idx, def)| (ClassId(idx as u32), def))
    }

    /// Look up a class by binary name, falling back to the implicit `java.lang` package.
    pub fn lookup_class(&self, name: &str) -> Option<ClassId> {
        if let Some(id) = self.by_name.get(name) {
            return Some(*id);
        }
        if name.contains('.') {
            return None;
        }
        self.by_name.get(&format!("java.lang.{name}")).copied()
    }

    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.lookup_class(name)
    }

    pub fn add_type_param(&mut self, name: impl Into<String>, upper_bounds: Vec<TypeExpr>) -> TypeVarId {
        let id = TypeVarId(self.type_params.len() as u32);
        self.type_params.push(TypeParamDef {
            name: name.into(),
            upper_bounds,
        });
        id
    }

    pub fn define_type_param(&mut self, id: TypeVarId, def: TypeParamDef) {
        if let Some(slot) = self.type_params.get_mut(id.0 as usize) {
            *slot = def;
        }
    }

    /// Reserve an id for `name` without defining it yet, so self-referential declarations
    /// (`class Node { Node next; }`, `E extends Enum<E>`) can mention the class.
    pub fn intern_class_id(&mut self, name: &str) -> ClassId {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        let id = ClassId(self.classes.len() as u32);
        self.classes.push(ClassDef::new(name, ClassKind::Class));
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Publish the type parameters of a class still under construction so bounds and
    /// supertypes can mention the class generically (`E extends Enum<E>`).
    pub(crate) fn declare_type_params(&mut self, id: ClassId, params: &[TypeVarId]) {
        if let Some(slot) = self.classes.get_mut(id.0 as usize) {
            slot.type_params = params.to_vec();
        }
    }

    pub fn define_class(&mut self, id: ClassId, def: ClassDef) {
        let Some(slot) = self.classes.get_mut(id.0 as usize) else {
            return;
        };
        if slot.name != def.name {
            self.by_name.remove(&slot.name);
            self.by_name.insert(def.name.clone(), id);
        }
        *slot = def;
    }

    /// Insert `def`, or replace the existing definition with the same binary name (keeping its id).
    pub fn add_class(&mut self, def: ClassDef) -> ClassId {
        if let Some(id) = self.by_name.get(&def.name).copied() {
            tracing::debug!(target = "trellis.types", class = %def.name, "redefining class");
            self.define_class(id, def);
            return id;
        }
        let id = ClassId(self.classes.len() as u32);
        self.by_name.insert(def.name.clone(), id);
        self.classes.push(def);
        id
    }

    pub fn field(&self, class: ClassId, name: &str) -> Option<&FieldDef> {
        self.class(class)?.fields.iter().find(|f| f.name == name)
    }

    /// First method named `name`; overloads are not distinguished.
    pub fn method(&self, class: ClassId, name: &str) -> Option<&MethodDef> {
        self.class(class)?.methods.iter().find(|m| m.name == name)
    }

    pub fn type_parameters(&self, class: ClassId) -> &[TypeVarId] {
        self.class(class)
            .map(|def| def.type_params.as_slice())
            .unwrap_or(&[])
    }

    pub fn erasure_name(&self, erasure: Erasure) -> String {
        let mut name = self
            .class(erasure.element_class())
            .map(|def| def.name.clone())
            .unwrap_or_else(|| "<unknown>".to_string());
        for _ in 0..erasure.dims() {
            name.push_str("[]");
        }
        name
    }

    fn kind(&self, class: ClassId) -> Option<ClassKind> {
        self.class(class).map(|def| def.kind)
    }

    pub fn is_primitive(&self, erasure: Erasure) -> bool {
        !erasure.is_array() && self.kind(erasure.element_class()) == Some(ClassKind::Primitive)
    }

    pub fn is_interface(&self, erasure: Erasure) -> bool {
        !erasure.is_array() && self.kind(erasure.element_class()) == Some(ClassKind::Interface)
    }

    pub fn is_enum(&self, erasure: Erasure) -> bool {
        !erasure.is_array() && self.kind(erasure.element_class()) == Some(ClassKind::Enum)
    }

    /// Box a primitive erasure (`int` -> `Integer`); everything else is returned unchanged.
    pub fn wrap_primitive(&self, erasure: Erasure) -> Erasure {
        let Some(class) = erasure.as_class() else {
            return erasure;
        };
        self.well_known
            .primitive_wrappers()
            .iter()
            .find(|(prim, _)| *prim == class)
            .map(|(_, wrapper)| Erasure::of(*wrapper))
            .unwrap_or(erasure)
    }

    /// The primitive a wrapper unboxes to (`Integer` -> `int`).
    pub fn unwrap_primitive(&self, erasure: Erasure) -> Option<Erasure> {
        let class = erasure.as_class()?;
        self.well_known
            .primitive_wrappers()
            .iter()
            .find(|(_, wrapper)| *wrapper == class)
            .map(|(prim, _)| Erasure::of(*prim))
    }

    /// Erasure of a type expression without consulting any variable resolver.
    pub fn raw_erasure(&self, expr: &TypeExpr) -> Option<Erasure> {
        self.raw_erasure_inner(expr, 0)
    }

    fn raw_erasure_inner(&self, expr: &TypeExpr, depth: usize) -> Option<Erasure> {
        if depth > 32 {
            return None;
        }
        match expr {
            TypeExpr::Class(erasure) => Some(*erasure),
            TypeExpr::Parameterized(p) => Some(Erasure::of(p.raw)),
            TypeExpr::GenericArray(component) => self
                .raw_erasure_inner(component, depth + 1)
                .and_then(Erasure::checked_array),
            TypeExpr::Wildcard(w) => match w.upper_bounds.first() {
                Some(bound) => self.raw_erasure_inner(bound, depth + 1),
                None => Some(Erasure::of(self.well_known.object)),
            },
            TypeExpr::Variable(var) => match self.type_param(*var)?.upper_bounds.first() {
                Some(bound) => self.raw_erasure_inner(bound, depth + 1),
                None => Some(Erasure::of(self.well_known.object)),
            },
        }
    }

    /// The declared generic superclass of `erasure`.
    ///
    /// Arrays extend `Object`; interfaces, primitives and `Object` itself have no superclass.
    pub fn generic_superclass(&self, erasure: Erasure) -> Option<TypeExpr> {
        let object = self.well_known.object;
        if erasure.is_array() {
            return Some(TypeExpr::class(object));
        }
        let class = erasure.element_class();
        let def = self.class(class)?;
        match def.kind {
            ClassKind::Interface | ClassKind::Primitive => None,
            ClassKind::Class | ClassKind::Enum if class == object => None,
            ClassKind::Class | ClassKind::Enum => Some(
                def.super_class
                    .clone()
                    .unwrap_or_else(|| TypeExpr::class(object)),
            ),
        }
    }

    pub fn generic_interfaces(&self, erasure: Erasure) -> Vec<TypeExpr> {
        if erasure.is_array() {
            return vec![
                TypeExpr::class(self.well_known.cloneable),
                TypeExpr::class(self.well_known.serializable),
            ];
        }
        self.class(erasure.element_class())
            .map(|def| def.interfaces.clone())
            .unwrap_or_default()
    }

    pub fn superclass(&self, erasure: Erasure) -> Option<Erasure> {
        self.generic_superclass(erasure)
            .and_then(|expr| self.raw_erasure(&expr))
    }

    pub fn interfaces(&self, erasure: Erasure) -> Vec<Erasure> {
        self.generic_interfaces(erasure)
            .iter()
            .filter_map(|expr| self.raw_erasure(expr))
            .collect()
    }

    /// Java `target.isAssignableFrom(source)`: identity, subclassing, interface implementation
    /// and array covariance. No boxing.
    pub fn is_subclass(&self, target: Erasure, source: Erasure) -> bool {
        if target == source {
            return true;
        }
        let wk = &self.well_known;

        match (target.is_array(), source.is_array()) {
            (false, true) => {
                let class = target.element_class();
                class == wk.object || class == wk.cloneable || class == wk.serializable
            }
            (true, false) => false,
            (true, true) => {
                let (Some(tc), Some(sc)) = (target.component(), source.component()) else {
                    return false;
                };
                if self.is_primitive(tc) || self.is_primitive(sc) {
                    return tc == sc;
                }
                self.is_subclass(tc, sc)
            }
            (false, false) => {
                if self.is_primitive(target) || self.is_primitive(source) {
                    return false;
                }
                if target.element_class() == wk.object {
                    return true;
                }

                let mut queue = VecDeque::from([source]);
                let mut seen = HashSet::new();
                while let Some(current) = queue.pop_front() {
                    if !seen.insert(current) {
                        continue;
                    }
                    if current == target {
                        return true;
                    }
                    if let Some(sc) = self.superclass(current) {
                        queue.push_back(sc);
                    }
                    queue.extend(self.interfaces(current));
                }
                false
            }
        }
    }

    /// [`TypeStore::is_subclass`] plus primitive/wrapper boxing in either direction.
    pub fn is_assignable(&self, target: Erasure, source: Erasure) -> bool {
        if self.is_subclass(target, source) {
            return true;
        }
        if self.is_primitive(target) {
            return self.unwrap_primitive(source) == Some(target);
        }
        if self.is_primitive(source) {
            return self.is_subclass(target, self.wrap_primitive(source));
        }
        false
    }
}
