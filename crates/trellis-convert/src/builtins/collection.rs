//! Element-wise converters between strings, arrays and collections.
//!
//! Each converter declares its outer pair and, where the element types matter, a conditional
//! check that recurses into the service with the element descriptors. Elements themselves are
//! converted through the service, described by their runtime type.

use trellis_types::{Erasure, TypeStore};

use super::factory::create_collection;
use super::mismatch;
use crate::{
    ConditionalConverter, ConversionError, ConversionService, ConvertiblePair, GenericConverter,
    TypeDescriptor, Value,
};

/// Whether elements described by `source` can be converted to elements described by
/// `target`. Unknown element types on either side are given the benefit of the doubt.
pub fn can_convert_elements(
    service: &ConversionService,
    source: Option<&TypeDescriptor>,
    target: Option<&TypeDescriptor>,
) -> bool {
    let (Some(source), Some(target)) = (source, target) else {
        return true;
    };
    if service.can_convert(Some(source), target) {
        return true;
    }
    service
        .store()
        .is_assignable(source.erasure(), target.erasure())
}

fn split(service: &ConversionService, text: &str) -> Vec<String> {
    let config = service.config();
    if text.trim().is_empty() {
        return Vec::new();
    }
    text.split(config.element_delimiter.as_str())
        .map(|part| {
            if config.trim_elements {
                part.trim().to_string()
            } else {
                part.to_string()
            }
        })
        .collect()
}

fn join(service: &ConversionService, elements: &[Option<Value>]) -> Result<String, ConversionError> {
    let string = Erasure::of(service.store().well_known().string);
    let mut parts = Vec::with_capacity(elements.len());
    for element in elements {
        let part = match element {
            None => "null".to_string(),
            Some(value) => match service.convert_to(Some(value), string)? {
                Some(Value::String(text)) => text,
                Some(other) => other.to_string(),
                None => value.to_string(),
            },
        };
        parts.push(part);
    }
    Ok(parts.join(service.config().element_delimiter.as_str()))
}

fn convert_elements<'a>(
    service: &ConversionService,
    elements: impl IntoIterator<Item = Option<&'a Value>>,
    target: &TypeDescriptor,
) -> Result<Vec<Option<Value>>, ConversionError> {
    elements
        .into_iter()
        .map(|element| service.convert(element, target))
        .collect()
}

fn target_element(target_type: &TypeDescriptor) -> Result<TypeDescriptor, ConversionError> {
    target_type
        .element_type_descriptor()
        .ok_or_else(|| ConversionError::MissingElementType(target_type.to_string()))
}

macro_rules! element_converter {
    ($(#[$meta:meta])* $name:ident, |$wk:ident| ($source:expr, $target:expr)) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug)]
        pub struct $name {
            pair: ConvertiblePair,
        }

        impl $name {
            pub fn new(store: &TypeStore) -> Self {
                let $wk = store.well_known();
                Self {
                    pair: ConvertiblePair::new($source, $target),
                }
            }
        }
    };
}

element_converter!(
    /// `String` to any array, splitting on the configured delimiter.
    StringToArray,
    |wk| (Erasure::of(wk.string), Erasure::of(wk.object).array())
);

element_converter!(
    /// Any array to a delimited `String`.
    ArrayToString,
    |wk| (Erasure::of(wk.object).array(), Erasure::of(wk.string))
);

element_converter!(
    /// `String` to any collection, splitting on the configured delimiter.
    StringToCollection,
    |wk| (Erasure::of(wk.string), Erasure::of(wk.collection))
);

element_converter!(
    /// Any collection to a delimited `String`.
    CollectionToString,
    |wk| (Erasure::of(wk.collection), Erasure::of(wk.string))
);

element_converter!(
    ArrayToCollection,
    |wk| (Erasure::of(wk.object).array(), Erasure::of(wk.collection))
);

element_converter!(
    CollectionToArray,
    |wk| (Erasure::of(wk.collection), Erasure::of(wk.object).array())
);

impl GenericConverter for StringToArray {
    fn convertible_types(&self) -> Option<Vec<ConvertiblePair>> {
        Some(vec![self.pair])
    }

    fn convert(
        &self,
        service: &ConversionService,
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
        let element_type = target_element(target_type)?;
        let parts: Vec<Value> = split(service, text).into_iter().map(Value::String).collect();
        let elements = convert_elements(service, parts.iter().map(Some), &element_type)?;
        Ok(Some(Value::Array {
            component: element_type.erasure(),
            elements,
        }))
    }

    fn as_conditional(&self) -> Option<&dyn ConditionalConverter> {
        Some(self)
    }

    fn name(&self) -> &str {
        "StringToArray"
    }
}

impl ConditionalConverter for StringToArray {
    fn matches(
        &self,
        service: &ConversionService,
        source_type: &TypeDescriptor,
        target_type: &TypeDescriptor,
    ) -> bool {
        can_convert_elements(
            service,
            Some(source_type),
            target_type.element_type_descriptor().as_ref(),
        )
    }
}

impl GenericConverter for ArrayToString {
    fn convertible_types(&self) -> Option<Vec<ConvertiblePair>> {
        Some(vec![self.pair])
    }

    fn convert(
        &self,
        service: &ConversionService,
        source: Option<&Value>,
        _source_type: &TypeDescriptor,
        target_type: &TypeDescriptor,
    ) -> Result<Option<Value>, ConversionError> {
        match source {
            None => Ok(None),
            Some(Value::Array { elements, .. }) => Ok(Some(Value::String(join(service, elements)?))),
            Some(other) => Err(mismatch(self.name(), other, target_type)),
        }
    }

    fn name(&self) -> &str {
        "ArrayToString"
    }
}

impl GenericConverter for StringToCollection {
    fn convertible_types(&self) -> Option<Vec<ConvertiblePair>> {
        Some(vec![self.pair])
    }

    fn convert(
        &self,
        service: &ConversionService,
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
        let parts: Vec<Value> = split(service, text).into_iter().map(Value::String).collect();
        let element_type = target_element(target_type)?;
        let elements = if element_type.node().resolve().is_none() {
            parts.into_iter().map(Some).collect()
        } else {
            convert_elements(service, parts.iter().map(Some), &element_type)?
        };
        create_collection(service.store(), target_type.erasure(), elements).map(Some)
    }

    fn as_conditional(&self) -> Option<&dyn ConditionalConverter> {
        Some(self)
    }

    fn name(&self) -> &str {
        "StringToCollection"
    }
}

impl ConditionalConverter for StringToCollection {
    fn matches(
        &self,
        service: &ConversionService,
        source_type: &TypeDescriptor,
        target_type: &TypeDescriptor,
    ) -> bool {
        can_convert_elements(
            service,
            Some(source_type),
            target_type.element_type_descriptor().as_ref(),
        )
    }
}

impl GenericConverter for CollectionToString {
    fn convertible_types(&self) -> Option<Vec<ConvertiblePair>> {
        Some(vec![self.pair])
    }

    fn convert(
        &self,
        service: &ConversionService,
        source: Option<&Value>,
        _source_type: &TypeDescriptor,
        target_type: &TypeDescriptor,
    ) -> Result<Option<Value>, ConversionError> {
        match source {
            None => Ok(None),
            Some(Value::Collection { elements, .. }) => {
                Ok(Some(Value::String(join(service, elements)?)))
            }
            Some(other) => Err(mismatch(self.name(), other, target_type)),
        }
    }

    fn name(&self) -> &str {
        "CollectionToString"
    }
}

impl GenericConverter for ArrayToCollection {
    fn convertible_types(&self) -> Option<Vec<ConvertiblePair>> {
        Some(vec![self.pair])
    }

    fn convert(
        &self,
        service: &ConversionService,
        source: Option<&Value>,
        _source_type: &TypeDescriptor,
        target_type: &TypeDescriptor,
    ) -> Result<Option<Value>, ConversionError> {
        let elements = match source {
            None => return Ok(None),
            Some(Value::Array { elements, .. }) => elements,
            Some(other) => return Err(mismatch(self.name(), other, target_type)),
        };
        let element_type = target_element(target_type)?;
        let converted = convert_elements(service, elements.iter().map(Option::as_ref), &element_type)?;
        create_collection(service.store(), target_type.erasure(), converted).map(Some)
    }

    fn as_conditional(&self) -> Option<&dyn ConditionalConverter> {
        Some(self)
    }

    fn name(&self) -> &str {
        "ArrayToCollection"
    }
}

impl ConditionalConverter for ArrayToCollection {
    fn matches(
        &self,
        service: &ConversionService,
        source_type: &TypeDescriptor,
        target_type: &TypeDescriptor,
    ) -> bool {
        can_convert_elements(
            service,
            source_type.element_type_descriptor().as_ref(),
            target_type.element_type_descriptor().as_ref(),
        )
    }
}

impl GenericConverter for CollectionToArray {
    fn convertible_types(&self) -> Option<Vec<ConvertiblePair>> {
        Some(vec![self.pair])
    }

    fn convert(
        &self,
        service: &ConversionService,
        source: Option<&Value>,
        _source_type: &TypeDescriptor,
        target_type: &TypeDescriptor,
    ) -> Result<Option<Value>, ConversionError> {
        let elements = match source {
            None => return Ok(None),
            Some(Value::Collection { elements, .. }) => elements,
            Some(other) => return Err(mismatch(self.name(), other, target_type)),
        };
        let element_type = target_element(target_type)?;
        let converted = convert_elements(service, elements.iter().map(Option::as_ref), &element_type)?;
        Ok(Some(Value::Array {
            component: element_type.erasure(),
            elements: converted,
        }))
    }

    fn as_conditional(&self) -> Option<&dyn ConditionalConverter> {
        Some(self)
    }

    fn name(&self) -> &str {
        "CollectionToArray"
    }
}

impl ConditionalConverter for CollectionToArray {
    fn matches(
        &self,
        service: &ConversionService,
        source_type: &TypeDescriptor,
        target_type: &TypeDescriptor,
    ) -> bool {
        can_convert_elements(
            service,
            source_type.element_type_descriptor().as_ref(),
            target_type.element_type_descriptor().as_ref(),
        )
    }
}
