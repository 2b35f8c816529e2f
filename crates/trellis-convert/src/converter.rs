//! Converter traits.

use std::fmt;
use std::sync::Arc;

use trellis_types::{ClassId, Erasure, TypeStore};

use crate::{ConversionError, ConversionService, TypeDescriptor, Value};

/// Binary name of the single-pair converter shape `Converter<S, T>`.
pub const CONVERTER_SHAPE: &str = "trellis.convert.Converter";

/// Declare `trellis.convert.Converter<S, T>` so converter classes can implement it and have
/// their source/target pair inferred from their generic declaration.
pub fn register_converter_shape(store: &mut TypeStore) -> trellis_types::Result<ClassId> {
    if let Some(id) = store.lookup_class(CONVERTER_SHAPE) {
        if store.type_parameters(id).len() == 2 {
            return Ok(id);
        }
    }
    store
        .class_builder(CONVERTER_SHAPE)
        .interface()
        .type_param("S", &[])
        .type_param("T", &[])
        .build()
}

/// A `(source, target)` erasure pair a converter is registered under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConvertiblePair {
    pub source: Erasure,
    pub target: Erasure,
}

impl ConvertiblePair {
    pub fn new(source: Erasure, target: Erasure) -> Self {
        Self { source, target }
    }
}

/// A converter between descriptor-typed values.
pub trait GenericConverter: Send + Sync {
    /// The pairs this converter handles, or `None` for a converter that is only consulted
    /// through its [`ConditionalConverter`] predicate.
    fn convertible_types(&self) -> Option<Vec<ConvertiblePair>>;

    /// Convert `source`. A `None` result means the converter had nothing to produce for this
    /// particular value.
    fn convert(
        &self,
        service: &ConversionService,
        source: Option<&Value>,
        source_type: &TypeDescriptor,
        target_type: &TypeDescriptor,
    ) -> Result<Option<Value>, ConversionError>;

    fn as_conditional(&self) -> Option<&dyn ConditionalConverter> {
        None
    }

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// A runtime applicability check on top of a converter's declared pairs.
pub trait ConditionalConverter: Send + Sync {
    fn matches(
        &self,
        service: &ConversionService,
        source_type: &TypeDescriptor,
        target_type: &TypeDescriptor,
    ) -> bool;
}

/// A plain value-to-value converter. Registered through an adapter that supplies its pair.
pub trait Converter: Send + Sync {
    fn convert(&self, source: &Value) -> Result<Option<Value>, ConversionError>;
}

impl<F> Converter for F
where
    F: Fn(&Value) -> Result<Option<Value>, ConversionError> + Send + Sync,
{
    fn convert(&self, source: &Value) -> Result<Option<Value>, ConversionError> {
        self(source)
    }
}

pub(crate) struct ConverterAdapter {
    converter: Arc<dyn Converter>,
    pair: ConvertiblePair,
    name: String,
}

impl ConverterAdapter {
    pub(crate) fn new(converter: Arc<dyn Converter>, pair: ConvertiblePair, name: String) -> Self {
        Self {
            converter,
            pair,
            name,
        }
    }
}

impl GenericConverter for ConverterAdapter {
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
        match source {
            Some(value) => self.converter.convert(value),
            None => Ok(None),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for ConverterAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterAdapter")
            .field("name", &self.name)
            .field("pair", &self.pair)
            .finish()
    }
}

/// Passes the source through unchanged. Used when the target type is assignable from the
/// source type and no registered converter applies.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpConverter;

impl GenericConverter for NoOpConverter {
    fn convertible_types(&self) -> Option<Vec<ConvertiblePair>> {
        None
    }

    fn convert(
        &self,
        _service: &ConversionService,
        source: Option<&Value>,
        _source_type: &TypeDescriptor,
        _target_type: &TypeDescriptor,
    ) -> Result<Option<Value>, ConversionError> {
        Ok(source.cloned())
    }

    fn name(&self) -> &str {
        "NO_OP"
    }
}
