//! Type-directed value conversion for Trellis.
//!
//! A [`ConversionService`] dispatches `(source, target)` [`TypeDescriptor`] pairs to registered
//! converters, walking both class hierarchies most-specific first. The built-in converters
//! cover strings, numbers, enums, arrays and collections, recursing into the service for
//! element types.

#![forbid(unsafe_code)]

pub mod builtins;
mod config;
mod converter;
mod descriptor;
mod error;
mod registry;
mod service;
mod value;

pub use crate::config::ConversionConfig;
pub use crate::converter::{
    register_converter_shape, ConditionalConverter, Converter, ConvertiblePair, GenericConverter,
    NoOpConverter, CONVERTER_SHAPE,
};
pub use crate::descriptor::{CommonDescriptors, TypeDescriptor};
pub use crate::error::{ConfigError, ConversionError, RegistrationError};
pub use crate::registry::Converters;
pub use crate::service::ConversionService;
pub use crate::value::Value;
