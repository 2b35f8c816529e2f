//! Runtime values moved through the conversion engine.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use trellis_types::{ClassId, Erasure, TypeStore};

/// A dynamically typed value. Null is represented as `None` wherever a value is optional;
/// array and collection elements may be null.
#[derive(Clone)]
pub enum Value {
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(char),
    String(String),
    Enum {
        class: ClassId,
        constant: String,
    },
    Array {
        /// Erasure of the declared element type.
        component: Erasure,
        elements: Vec<Option<Value>>,
    },
    Collection {
        /// Concrete collection class (`java.util.ArrayList`, `java.util.LinkedHashSet`, ...).
        class: ClassId,
        elements: Vec<Option<Value>>,
    },
    /// An opaque host object of a registered class.
    Object {
        class: ClassId,
        payload: Arc<dyn Any + Send + Sync>,
    },
}

impl Value {
    pub fn string(text: impl Into<String>) -> Self {
        Value::String(text.into())
    }

    pub fn object<T: Any + Send + Sync>(class: ClassId, payload: T) -> Self {
        Value::Object {
            class,
            payload: Arc::new(payload),
        }
    }

    /// The runtime class of this value. Primitive variants report their wrapper class.
    pub fn erasure(&self, store: &TypeStore) -> Erasure {
        let wk = store.well_known();
        let class = match self {
            Value::Boolean(_) => wk.boolean,
            Value::Byte(_) => wk.byte,
            Value::Short(_) => wk.short,
            Value::Int(_) => wk.integer,
            Value::Long(_) => wk.long,
            Value::Float(_) => wk.float,
            Value::Double(_) => wk.double,
            Value::Char(_) => wk.character,
            Value::String(_) => wk.string,
            Value::Enum { class, .. } => *class,
            Value::Array { component, .. } => return component.array(),
            Value::Collection { class, .. } => *class,
            Value::Object { class, .. } => *class,
        };
        Erasure::of(class)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(text) => Some(text),
            _ => None,
        }
    }

    /// Elements of an array or collection.
    pub fn elements(&self) -> Option<&[Option<Value>]> {
        match self {
            Value::Array { elements, .. } | Value::Collection { elements, .. } => Some(elements),
            _ => None,
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Object { payload, .. } => payload.downcast_ref(),
            _ => None,
        }
    }

    /// A short name for the value's shape, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "boolean",
            Value::Byte(_) => "byte",
            Value::Short(_) => "short",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Char(_) => "char",
            Value::String(_) => "string",
            Value::Enum { .. } => "enum",
            Value::Array { .. } => "array",
            Value::Collection { .. } => "collection",
            Value::Object { .. } => "object",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use Value::*;
        match (self, other) {
            (Boolean(a), Boolean(b)) => a == b,
            (Byte(a), Byte(b)) => a == b,
            (Short(a), Short(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Long(a), Long(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            (Double(a), Double(b)) => a == b,
            (Char(a), Char(b)) => a == b,
            (String(a), String(b)) => a == b,
            (
                Enum {
                    class: ca,
                    constant: a,
                },
                Enum {
                    class: cb,
                    constant: b,
                },
            ) => ca == cb && a == b,
            (
                Array {
                    component: ca,
                    elements: a,
                },
                Array {
                    component: cb,
                    elements: b,
                },
            ) => ca == cb && a == b,
            (
                Collection {
                    class: ca,
                    elements: a,
                },
                Collection {
                    class: cb,
                    elements: b,
                },
            ) => ca == cb && a == b,
            (
                Object {
                    class: ca,
                    payload: a,
                },
                Object {
                    class: cb,
                    payload: b,
                },
            ) => ca == cb && Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

fn fmt_float<T: fmt::Display + Into<f64> + Copy>(f: &mut fmt::Formatter<'_>, value: T) -> fmt::Result {
    let wide: f64 = value.into();
    // `1.0` rather than `1`.
    if wide.is_finite() && wide.fract() == 0.0 && wide.abs() < 1e16 {
        write!(f, "{value:.1}")
    } else {
        write!(f, "{value}")
    }
}

fn fmt_elements(f: &mut fmt::Formatter<'_>, elements: &[Option<Value>]) -> fmt::Result {
    f.write_str("[")?;
    for (idx, element) in elements.iter().enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        match element {
            Some(value) => write!(f, "{value}")?,
            None => f.write_str("null")?,
        }
    }
    f.write_str("]")
}

/// The string form `ObjectToString` produces for scalar values.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(v) => write!(f, "{v}"),
            Value::Byte(v) => write!(f, "{v}"),
            Value::Short(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}"),
            Value::Float(v) => fmt_float(f, *v),
            Value::Double(v) => fmt_float(f, *v),
            Value::Char(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
            Value::Enum { constant, .. } => f.write_str(constant),
            Value::Array { elements, .. } | Value::Collection { elements, .. } => {
                fmt_elements(f, elements)
            }
            Value::Object { class, payload } => {
                if let Some(text) = payload.downcast_ref::<String>() {
                    f.write_str(text)
                } else {
                    write!(f, "Object@{}", class.to_raw())
                }
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(v) => f.debug_tuple("Boolean").field(v).finish(),
            Value::Byte(v) => f.debug_tuple("Byte").field(v).finish(),
            Value::Short(v) => f.debug_tuple("Short").field(v).finish(),
            Value::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Value::Long(v) => f.debug_tuple("Long").field(v).finish(),
            Value::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Value::Double(v) => f.debug_tuple("Double").field(v).finish(),
            Value::Char(v) => f.debug_tuple("Char").field(v).finish(),
            Value::String(v) => f.debug_tuple("String").field(v).finish(),
            Value::Enum { class, constant } => f
                .debug_struct("Enum")
                .field("class", class)
                .field("constant", constant)
                .finish(),
            Value::Array {
                component,
                elements,
            } => f
                .debug_struct("Array")
                .field("component", component)
                .field("elements", elements)
                .finish(),
            Value::Collection { class, elements } => f
                .debug_struct("Collection")
                .field("class", class)
                .field("elements", elements)
                .finish(),
            Value::Object { class, .. } => f
                .debug_struct("Object")
                .field("class", class)
                .finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_report_wrapper_erasures() {
        let store = TypeStore::with_minimal_jdk();
        let wk = store.well_known();

        assert_eq!(Value::Int(3).erasure(&store), Erasure::of(wk.integer));
        assert_eq!(Value::Char('x').erasure(&store), Erasure::of(wk.character));
        let ints = Value::Array {
            component: Erasure::of(wk.prim_int),
            elements: vec![],
        };
        assert_eq!(ints.erasure(&store), Erasure::of(wk.prim_int).array());
    }

    #[test]
    fn display_matches_java_string_forms() {
        assert_eq!(Value::Double(1.0).to_string(), "1.0");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::Long(-7).to_string(), "-7");

        let list = Value::Collection {
            class: ClassId::new(0),
            elements: vec![Some(Value::Int(1)), None],
        };
        assert_eq!(list.to_string(), "[1, null]");
    }

    #[test]
    fn objects_compare_by_identity() {
        let a = Value::object(ClassId::new(1), 5u32);
        let b = Value::object(ClassId::new(1), 5u32);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.downcast_ref::<u32>(), Some(&5));
    }
}
