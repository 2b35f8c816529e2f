//! The conversion service: descriptor-pair dispatch over a [`Converters`] registry with a
//! pass-through fallback for assignable types.

use std::fmt;
use std::sync::Arc;

use trellis_types::{Erasure, TypeNode, TypeStore};

use crate::converter::ConverterAdapter;
use crate::{
    builtins, CommonDescriptors, ConversionConfig, ConversionError, Converter, Converters,
    ConvertiblePair, GenericConverter, NoOpConverter, RegistrationError, TypeDescriptor, Value,
    CONVERTER_SHAPE,
};

pub struct ConversionService {
    store: Arc<TypeStore>,
    converters: Converters,
    common: CommonDescriptors,
    no_op: Arc<dyn GenericConverter>,
    config: ConversionConfig,
}

impl ConversionService {
    /// A service with no converters registered. Only the pass-through fallback applies.
    pub fn new(store: Arc<TypeStore>) -> Self {
        Self::bare(store, ConversionConfig::default())
    }

    /// A service with the built-in converters and default settings.
    pub fn with_defaults(store: Arc<TypeStore>) -> Result<Self, RegistrationError> {
        Self::from_config(store, ConversionConfig::default())
    }

    pub fn from_config(
        store: Arc<TypeStore>,
        config: ConversionConfig,
    ) -> Result<Self, RegistrationError> {
        let register_defaults = config.register_defaults;
        let service = Self::bare(store, config);
        if register_defaults {
            builtins::register_default_converters(&service)?;
        }
        Ok(service)
    }

    fn bare(store: Arc<TypeStore>, config: ConversionConfig) -> Self {
        Self {
            converters: Converters::new(store.clone()),
            common: CommonDescriptors::new(&store),
            no_op: Arc::new(NoOpConverter),
            store,
            config,
        }
    }

    pub fn store(&self) -> &Arc<TypeStore> {
        &self.store
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn converters(&self) -> &Converters {
        &self.converters
    }

    /// A descriptor for the raw type `erasure`, shared for the common scalar types.
    pub fn descriptor(&self, erasure: Erasure) -> TypeDescriptor {
        match self.common.get(erasure) {
            Some(descriptor) => descriptor.clone(),
            None => TypeDescriptor::for_class(&self.store, erasure),
        }
    }

    /// Register a plain converter whose pair is read from `declared`, a type implementing
    /// `trellis.convert.Converter<S, T>` (see [`crate::register_converter_shape`]).
    pub fn add_converter<C>(&self, declared: &TypeNode, converter: C) -> Result<(), RegistrationError>
    where
        C: Converter + 'static,
    {
        let unresolvable = || RegistrationError::UnresolvableGenerics(declared.to_string());
        let shape = self.store.lookup_class(CONVERTER_SHAPE).ok_or_else(unresolvable)?;
        let generics = declared.as_class(shape).resolve_generics();
        let [Some(source), Some(target)] = generics.as_slice() else {
            return Err(unresolvable());
        };
        let pair = ConvertiblePair::new(*source, *target);
        self.add_adapter(Arc::new(converter), pair, declared.to_string())
    }

    /// Register a plain converter for an explicit `(source, target)` pair.
    pub fn add_converter_for<C>(
        &self,
        source: Erasure,
        target: Erasure,
        converter: C,
    ) -> Result<(), RegistrationError>
    where
        C: Converter + 'static,
    {
        let name = format!(
            "{} -> {}",
            self.store.erasure_name(source),
            self.store.erasure_name(target)
        );
        self.add_adapter(Arc::new(converter), ConvertiblePair::new(source, target), name)
    }

    fn add_adapter(
        &self,
        converter: Arc<dyn Converter>,
        pair: ConvertiblePair,
        name: String,
    ) -> Result<(), RegistrationError> {
        self.converters
            .add(Arc::new(ConverterAdapter::new(converter, pair, name)))
    }

    pub fn add_generic_converter(
        &self,
        converter: Arc<dyn GenericConverter>,
    ) -> Result<(), RegistrationError> {
        self.converters.add(converter)
    }

    /// Remove every converter registered for exactly `(source, target)`.
    pub fn remove_convertible(&self, source: Erasure, target: Erasure) -> bool {
        self.converters.remove(source, target)
    }

    /// Whether a value of `source_type` can be converted to `target_type`. An absent source
    /// type stands for null, which always converts.
    pub fn can_convert(
        &self,
        source_type: Option<&TypeDescriptor>,
        target_type: &TypeDescriptor,
    ) -> bool {
        match source_type {
            None => true,
            Some(source_type) => self.get_converter(source_type, target_type).is_some(),
        }
    }

    pub fn can_convert_erasures(&self, source: Erasure, target: Erasure) -> bool {
        self.can_convert(Some(&self.descriptor(source)), &self.descriptor(target))
    }

    /// Convert `source` to `target_type`, describing the source by its runtime type.
    pub fn convert(
        &self,
        source: Option<&Value>,
        target_type: &TypeDescriptor,
    ) -> Result<Option<Value>, ConversionError> {
        self.convert_with(source, None, target_type)
    }

    /// Convert `source` described by `source_type` (its runtime type when absent). Null
    /// converts to null, and so does a value no converter applies to.
    pub fn convert_with(
        &self,
        source: Option<&Value>,
        source_type: Option<&TypeDescriptor>,
        target_type: &TypeDescriptor,
    ) -> Result<Option<Value>, ConversionError> {
        let Some(value) = source else {
            return Ok(None);
        };
        let derived;
        let source_type = match source_type {
            Some(source_type) => source_type,
            None => {
                derived = self.descriptor(value.erasure(&self.store));
                &derived
            }
        };

        match self.get_converter(source_type, target_type) {
            Some(converter) => converter.convert(self, Some(value), source_type, target_type),
            None => {
                tracing::trace!(
                    target = "trellis.convert",
                    source = %source_type,
                    target_type = %target_type,
                    "no converter found"
                );
                Ok(None)
            }
        }
    }

    /// Convert `source` to the raw type `target`.
    pub fn convert_to(
        &self,
        source: Option<&Value>,
        target: Erasure,
    ) -> Result<Option<Value>, ConversionError> {
        self.convert(source, &self.descriptor(target))
    }

    /// The converter dispatch would use, including the pass-through fallback.
    pub fn get_converter(
        &self,
        source_type: &TypeDescriptor,
        target_type: &TypeDescriptor,
    ) -> Option<Arc<dyn GenericConverter>> {
        if let Some(converter) = self.converters.find(self, source_type, target_type) {
            return Some(converter);
        }
        if self.config.no_op_fallback
            && self
                .store
                .is_assignable(target_type.erasure(), source_type.erasure())
        {
            tracing::trace!(
                target = "trellis.convert",
                source = %source_type,
                target_type = %target_type,
                "falling back to pass-through"
            );
            return Some(self.no_op.clone());
        }
        None
    }
}

impl fmt::Debug for ConversionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionService")
            .field("converters", &self.converters)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store() -> Arc<TypeStore> {
        Arc::new(TypeStore::with_minimal_jdk())
    }

    #[test]
    fn empty_service_passes_assignable_values_through() {
        let store = store();
        let wk = store.well_known().clone();
        let service = ConversionService::new(store);

        let string = Erasure::of(wk.string);
        assert!(service.can_convert_erasures(string, string));
        assert!(service.can_convert_erasures(string, Erasure::of(wk.char_sequence)));
        assert!(service.can_convert_erasures(Erasure::of(wk.prim_int), Erasure::of(wk.integer)));
        assert!(!service.can_convert_erasures(string, Erasure::of(wk.integer)));

        let hello = Value::string("hello");
        assert_eq!(
            service.convert_to(Some(&hello), Erasure::of(wk.object)).unwrap(),
            Some(hello)
        );
        assert_eq!(
            service.convert_to(Some(&Value::Int(1)), string).unwrap(),
            None
        );
    }

    #[test]
    fn null_is_always_convertible() {
        let store = store();
        let service = ConversionService::new(store.clone());
        let target = service.descriptor(Erasure::of(store.well_known().integer));

        assert!(service.can_convert(None, &target));
        assert_eq!(service.convert(None, &target).unwrap(), None);
    }

    #[test]
    fn disabling_the_fallback_leaves_nothing_to_dispatch() {
        let store = store();
        let config = ConversionConfig {
            register_defaults: false,
            no_op_fallback: false,
            ..ConversionConfig::default()
        };
        let service = ConversionService::from_config(store.clone(), config).unwrap();
        let string = Erasure::of(store.well_known().string);

        assert!(!service.can_convert_erasures(string, string));
    }

    #[test]
    fn explicit_pairs_win_over_the_fallback() {
        let store = store();
        let wk = store.well_known().clone();
        let service = ConversionService::new(store);
        let string = Erasure::of(wk.string);

        service
            .add_converter_for(
                string,
                string,
                |value: &Value| -> Result<Option<Value>, ConversionError> {
                    Ok(value.as_str().map(|text| Value::string(text.to_uppercase())))
                },
            )
            .unwrap();

        assert_eq!(
            service.convert_to(Some(&Value::string("abc")), string).unwrap(),
            Some(Value::string("ABC"))
        );
        assert!(service.remove_convertible(string, string));
        assert_eq!(
            service.convert_to(Some(&Value::string("abc")), string).unwrap(),
            Some(Value::string("abc"))
        );
    }
}
