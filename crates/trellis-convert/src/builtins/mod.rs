//! The built-in converters installed by [`crate::ConversionService::with_defaults`].

mod collection;
mod factory;
mod number;
mod text;

use std::sync::Arc;

use crate::{ConversionError, ConversionService, RegistrationError, TypeDescriptor, Value};

pub use self::collection::{
    can_convert_elements, ArrayToCollection, ArrayToString, CollectionToArray,
    CollectionToString, StringToArray, StringToCollection,
};
pub use self::factory::{collection_class_for, create_collection};
pub use self::number::{NumberToNumber, StringToBoolean, StringToCharacter, StringToNumber};
pub use self::text::{ObjectToString, StringToEnum};

pub fn register_default_converters(service: &ConversionService) -> Result<(), RegistrationError> {
    let store = service.store();
    service.add_generic_converter(Arc::new(StringToNumber::new(store)))?;
    service.add_generic_converter(Arc::new(StringToBoolean::new(store)))?;
    service.add_generic_converter(Arc::new(StringToCharacter::new(store)))?;
    service.add_generic_converter(Arc::new(NumberToNumber::new(store)))?;
    service.add_generic_converter(Arc::new(ObjectToString::new(store)))?;
    service.add_generic_converter(Arc::new(StringToEnum::new(store)))?;

    service.add_generic_converter(Arc::new(StringToArray::new(store)))?;
    service.add_generic_converter(Arc::new(ArrayToString::new(store)))?;
    service.add_generic_converter(Arc::new(StringToCollection::new(store)))?;
    service.add_generic_converter(Arc::new(CollectionToString::new(store)))?;
    service.add_generic_converter(Arc::new(ArrayToCollection::new(store)))?;
    service.add_generic_converter(Arc::new(CollectionToArray::new(store)))?;
    tracing::debug!(
        target = "trellis.convert",
        pairs = service.converters().pair_count(),
        "registered default converters"
    );
    Ok(())
}

fn mismatch(converter: &str, found: &Value, target: &TypeDescriptor) -> ConversionError {
    ConversionError::TypeMismatch {
        converter: converter.to_string(),
        found: found.kind().to_string(),
        target: target.to_string(),
    }
}

fn invalid(value: &str, target: &TypeDescriptor, reason: impl ToString) -> ConversionError {
    ConversionError::InvalidValue {
        value: value.to_string(),
        target: target.to_string(),
        reason: reason.to_string(),
    }
}

