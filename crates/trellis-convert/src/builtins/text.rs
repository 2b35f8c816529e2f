use trellis_types::{Erasure, TypeStore};

use super::mismatch;
use crate::{
    ConversionError, ConversionService, ConvertiblePair, GenericConverter, TypeDescriptor, Value,
};

/// Anything to `String` through the value's display form.
#[derive(Clone, Copy, Debug)]
pub struct ObjectToString {
    pair: ConvertiblePair,
}

impl ObjectToString {
    pub fn new(store: &TypeStore) -> Self {
        let wk = store.well_known();
        Self {
            pair: ConvertiblePair::new(Erasure::of(wk.object), Erasure::of(wk.string)),
        }
    }
}

impl GenericConverter for ObjectToString {
    fn convertible_types(&self) -> Option<Vec<ConvertiblePair>> {
        Some(vec![self.pair])
    }

    fn convert(
        &self,
        _service: &ConversionService,
        source: Option<&Value>,
        _source_type: &TypeDescriptor,
        _target_type: &TypeDescriptor,
    ) -> Result<Option<Value>, ConversionError> {
        Ok(source.map(|value| Value::String(value.to_string())))
    }

    fn name(&self) -> &str {
        "ObjectToString"
    }
}

/// `String` to a constant of the target enum, matched by exact name after trimming.
#[derive(Clone, Copy, Debug)]
pub struct StringToEnum {
    pair: ConvertiblePair,
}

impl StringToEnum {
    pub fn new(store: &TypeStore) -> Self {
        let wk = store.well_known();
        Self {
            pair: ConvertiblePair::new(Erasure::of(wk.string), Erasure::of(wk.enum_)),
        }
    }
}

impl GenericConverter for StringToEnum {
    fn convertible_types(&self) -> Option<Vec<ConvertiblePair>> {
        Some(vec![self.pair])
    }

    fn convert(
        &self,
        _service: &ConversionService,
        source: Option<&Value>,
        _source_type: &TypeDescriptor,
        target_type: &TypeDescriptor,
    ) -> Result<Option<Value>, ConversionError> {
        let Some(value) = source else {
            return Ok(None);
        };
        let Some(text) = value.as_str() else {
            return Err(mismatch(self.name(), value, target_type));
        };
        let constant = text.trim();
        if constant.is_empty() {
            return Ok(None);
        }

        let store = target_type.store();
        let class = target_type
            .erasure()
            .as_class()
            .filter(|class| store.is_enum(Erasure::of(*class)))
            .ok_or_else(|| mismatch(self.name(), value, target_type))?;
        let known = store
            .class(class)
            .is_some_and(|def| def.enum_constants.iter().any(|c| c == constant));
        if !known {
            return Err(ConversionError::UnknownEnumConstant {
                class: store.erasure_name(Erasure::of(class)),
                value: constant.to_string(),
            });
        }
        Ok(Some(Value::Enum {
            class,
            constant: constant.to_string(),
        }))
    }

    fn name(&self) -> &str {
        "StringToEnum"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use trellis_types::ClassId;

    fn setup() -> (ConversionService, ClassId) {
        let mut store = TypeStore::with_minimal_jdk();
        let level = store
            .class_builder("com.example.Level")
            .enumeration(&["LOW", "HIGH"])
            .build()
            .unwrap();
        let service = ConversionService::with_defaults(Arc::new(store)).unwrap();
        (service, level)
    }

    #[test]
    fn strings_name_enum_constants() {
        let (service, level) = setup();
        let target = Erasure::of(level);

        assert_eq!(
            service.convert_to(Some(&Value::string(" HIGH ")), target).unwrap(),
            Some(Value::Enum {
                class: level,
                constant: "HIGH".to_string(),
            })
        );
        assert_eq!(service.convert_to(Some(&Value::string("")), target).unwrap(), None);

        let err = service
            .convert_to(Some(&Value::string("high")), target)
            .unwrap_err();
        assert_eq!(
            err,
            ConversionError::UnknownEnumConstant {
                class: "com.example.Level".to_string(),
                value: "high".to_string(),
            }
        );
    }

    #[test]
    fn values_render_through_display() {
        let (service, level) = setup();
        let string = Erasure::of(service.store().well_known().string);

        let low = Value::Enum {
            class: level,
            constant: "LOW".to_string(),
        };
        assert_eq!(
            service.convert_to(Some(&low), string).unwrap(),
            Some(Value::string("LOW"))
        );
        assert_eq!(
            service.convert_to(Some(&Value::Double(4.0)), string).unwrap(),
            Some(Value::string("4.0"))
        );
    }
}
