//! String-to-scalar and number-to-number conversion.

use std::fmt;
use std::str::FromStr;

use trellis_types::{Erasure, TypeStore};

use super::{invalid, mismatch};
use crate::{
    ConditionalConverter, ConversionError, ConversionService, ConvertiblePair, GenericConverter,
    TypeDescriptor, Value,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum NumericKind {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl NumericKind {
    /// The numeric kind of `erasure`, boxing primitives first.
    fn of(store: &TypeStore, erasure: Erasure) -> Option<Self> {
        let class = store.wrap_primitive(erasure).as_class()?;
        let wk = store.well_known();
        let kind = if class == wk.byte {
            NumericKind::Byte
        } else if class == wk.short {
            NumericKind::Short
        } else if class == wk.integer {
            NumericKind::Int
        } else if class == wk.long {
            NumericKind::Long
        } else if class == wk.float {
            NumericKind::Float
        } else if class == wk.double {
            NumericKind::Double
        } else {
            return None;
        };
        Some(kind)
    }
}

fn numeric_pairs(store: &TypeStore, source: Erasure) -> Vec<ConvertiblePair> {
    let wk = store.well_known();
    [wk.byte, wk.short, wk.integer, wk.long, wk.float, wk.double]
        .into_iter()
        .map(|class| ConvertiblePair::new(source, Erasure::of(class)))
        .collect()
}

fn parse_number<T>(text: &str, target_type: &TypeDescriptor) -> Result<T, ConversionError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    text.parse::<T>().map_err(|e| invalid(text, target_type, e.to_string()))
}

/// `String` to each numeric wrapper. Primitive targets dispatch here through boxing.
#[derive(Clone, Debug)]
pub struct StringToNumber {
    pairs: Vec<ConvertiblePair>,
}

impl StringToNumber {
    pub fn new(store: &TypeStore) -> Self {
        let string = Erasure::of(store.well_known().string);
        Self {
            pairs: numeric_pairs(store, string),
        }
    }
}

impl GenericConverter for StringToNumber {
    fn convertible_types(&self) -> Option<Vec<ConvertiblePair>> {
        Some(self.pairs.clone())
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
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let Some(kind) = NumericKind::of(target_type.store(), target_type.erasure()) else {
            return Err(mismatch(self.name(), value, target_type));
        };

        let parsed = match kind {
            NumericKind::Byte => Value::Byte(parse_number::<i8>(text, target_type)?),
            NumericKind::Short => Value::Short(parse_number::<i16>(text, target_type)?),
            NumericKind::Int => Value::Int(parse_number::<i32>(text, target_type)?),
            NumericKind::Long => Value::Long(parse_number::<i64>(text, target_type)?),
            NumericKind::Float => Value::Float(parse_number::<f32>(text, target_type)?),
            NumericKind::Double => Value::Double(parse_number::<f64>(text, target_type)?),
        };
        Ok(Some(parsed))
    }

    fn name(&self) -> &str {
        "StringToNumber"
    }
}

/// `String` to `Boolean`: `"true"` in any case is true, anything else false.
#[derive(Clone, Copy, Debug)]
pub struct StringToBoolean {
    pair: ConvertiblePair,
}

impl StringToBoolean {
    pub fn new(store: &TypeStore) -> Self {
        let wk = store.well_known();
        Self {
            pair: ConvertiblePair::new(Erasure::of(wk.string), Erasure::of(wk.boolean)),
        }
    }
}

impl GenericConverter for StringToBoolean {
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
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(Value::Boolean(text.eq_ignore_ascii_case("true"))))
    }

    fn name(&self) -> &str {
        "StringToBoolean"
    }
}

/// `String` to `Character`. A numeric string is taken as a code point; any other string
/// must be exactly one character.
#[derive(Clone, Copy, Debug)]
pub struct StringToCharacter {
    pair: ConvertiblePair,
}

impl StringToCharacter {
    pub fn new(store: &TypeStore) -> Self {
        let wk = store.well_known();
        Self {
            pair: ConvertiblePair::new(Erasure::of(wk.string), Erasure::of(wk.character)),
        }
    }
}

impl GenericConverter for StringToCharacter {
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
        if text.is_empty() {
            return Ok(None);
        }
        if let Ok(code) = text.trim().parse::<u32>() {
            return char::from_u32(code)
                .map(|c| Some(Value::Char(c)))
                .ok_or_else(|| invalid(text, target_type, "not a valid code point"));
        }
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Some(Value::Char(c))),
            _ => Err(invalid(text, target_type, "expected a single character")),
        }
    }

    fn name(&self) -> &str {
        "StringToCharacter"
    }
}

/// Between two distinct numeric wrappers. Narrowing is range-checked; floating point values
/// truncate towards zero when the target is integral. Identity conversions, `Number` targets
/// and other `Number` subclasses are left to the pass-through fallback.
#[derive(Clone, Copy, Debug)]
pub struct NumberToNumber {
    pair: ConvertiblePair,
}

impl NumberToNumber {
    pub fn new(store: &TypeStore) -> Self {
        let number = Erasure::of(store.well_known().number);
        Self {
            pair: ConvertiblePair::new(number, number),
        }
    }
}

enum Number {
    Integral(i64),
    Floating(f64),
}

impl Number {
    fn of(value: &Value) -> Option<Self> {
        let number = match value {
            Value::Byte(v) => Number::Integral(i64::from(*v)),
            Value::Short(v) => Number::Integral(i64::from(*v)),
            Value::Int(v) => Number::Integral(i64::from(*v)),
            Value::Long(v) => Number::Integral(*v),
            Value::Float(v) => Number::Floating(f64::from(*v)),
            Value::Double(v) => Number::Floating(*v),
            _ => return None,
        };
        Some(number)
    }

    fn integral(self) -> Option<i64> {
        match self {
            Number::Integral(v) => Some(v),
            Number::Floating(v) => {
                let truncated = v.trunc();
                // i64::MAX is not representable as f64; the bound is exclusive.
                (truncated >= i64::MIN as f64 && truncated < i64::MAX as f64)
                    .then_some(truncated as i64)
            }
        }
    }

    fn floating(self) -> f64 {
        match self {
            Number::Integral(v) => v as f64,
            Number::Floating(v) => v,
        }
    }
}

impl GenericConverter for NumberToNumber {
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
        let Some(number) = Number::of(value) else {
            return Err(mismatch(self.name(), value, target_type));
        };
        let Some(kind) = NumericKind::of(target_type.store(), target_type.erasure()) else {
            return Err(mismatch(self.name(), value, target_type));
        };

        let out_of_range = || invalid(&value.to_string(), target_type, "out of range");
        let converted = match kind {
            NumericKind::Float => Value::Float(number.floating() as f32),
            NumericKind::Double => Value::Double(number.floating()),
            integral => {
                let wide = number.integral().ok_or_else(out_of_range)?;
                match integral {
                    NumericKind::Byte => Value::Byte(i8::try_from(wide).map_err(|_| out_of_range())?),
                    NumericKind::Short => {
                        Value::Short(i16::try_from(wide).map_err(|_| out_of_range())?)
                    }
                    NumericKind::Int => Value::Int(i32::try_from(wide).map_err(|_| out_of_range())?),
                    _ => Value::Long(wide),
                }
            }
        };
        Ok(Some(converted))
    }

    fn as_conditional(&self) -> Option<&dyn ConditionalConverter> {
        Some(self)
    }

    fn name(&self) -> &str {
        "NumberToNumber"
    }
}

impl ConditionalConverter for NumberToNumber {
    fn matches(
        &self,
        _service: &ConversionService,
        source_type: &TypeDescriptor,
        target_type: &TypeDescriptor,
    ) -> bool {
        let store = target_type.store();
        match (
            NumericKind::of(store, source_type.erasure()),
            NumericKind::of(store, target_type.erasure()),
        ) {
            (Some(source), Some(target)) => source != target,
            _ => false,
        }
    }
}
