//! Dynamic member values.
//!
//! Every value that travels from a source member to a destination member passes through
//! [`Value`]: source getters produce one, converters consume and produce one, null-substitutes
//! are stored as one and destination setters coerce one back into the member's Rust type via
//! [`MapValue::from_value`].
//!
//! # Coercion Rules
//!
//! | Target type            | Accepted values                                        |
//! |------------------------|--------------------------------------------------------|
//! | integers               | any integer variant whose value fits the target range  |
//! | `f64`                  | any float or integer variant                           |
//! | `f32`                  | `F32`, integers, `F64` values that survive a round-trip |
//! | `String`               | `String`, `Char`                                       |
//! | `bool` / `char`        | exactly `Bool` / `Char`                                |
//! | `Option<T>`            | `Null` (as `None`) or anything `T` accepts             |
//! | `Vec<T>`               | `List` whose elements `T` accepts                      |
//! | custom types           | `Custom` wrapping exactly that type                    |

use std::{
    any::{type_name, Any},
    fmt,
    sync::Arc,
};

use strum::{Display, EnumCount, EnumIter};

use crate::{schema::DeclaredType, Result};

/// The kind of a [`Value`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumCount)]
pub enum ValueKind {
    /// The absent value
    Null,
    /// Boolean
    Bool,
    /// Unicode scalar value
    Char,
    /// 8-bit signed integer
    I8,
    /// 16-bit signed integer
    I16,
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 8-bit unsigned integer
    U8,
    /// 16-bit unsigned integer
    U16,
    /// 32-bit unsigned integer
    U32,
    /// 64-bit unsigned integer
    U64,
    /// 32-bit floating point
    F32,
    /// 64-bit floating point
    F64,
    /// Owned string
    String,
    /// Sequence of values
    List,
    /// Opaque user type
    Custom,
}

/// A user-defined value carried through the mapping pipeline without interpretation.
///
/// Enumerations and small value objects that are not part of the primitive set are wrapped in a
/// `CustomValue`. Cloning is cheap, the payload is shared.
#[derive(Clone)]
pub struct CustomValue {
    type_name: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl CustomValue {
    /// Wrap a value of an arbitrary type
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        CustomValue {
            type_name: type_name::<T>(),
            inner: Arc::new(value),
        }
    }

    /// The Rust type name of the wrapped value
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the wrapped value is of type `T`
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Borrow the wrapped value as `T`, if it is one
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    fn same_payload(&self, other: &CustomValue) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.inner).cast::<()>(),
            Arc::as_ptr(&other.inner).cast::<()>(),
        )
    }
}

impl fmt::Debug for CustomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CustomValue").field(&self.type_name).finish()
    }
}

/// A member value in transit between a source and a destination.
///
/// `Null` represents an absent value: an empty `Option`, or a path whose intermediate object
/// was missing.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// No value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Character value
    Char(char),
    /// 8-bit signed integer
    I8(i8),
    /// 16-bit signed integer
    I16(i16),
    /// 32-bit signed integer
    I32(i32),
    /// 64-bit signed integer
    I64(i64),
    /// 8-bit unsigned integer
    U8(u8),
    /// 16-bit unsigned integer
    U16(u16),
    /// 32-bit unsigned integer
    U32(u32),
    /// 64-bit unsigned integer
    U64(u64),
    /// 32-bit floating point
    F32(f32),
    /// 64-bit floating point
    F64(f64),
    /// String value
    String(String),
    /// Sequence of values
    List(Vec<Value>),
    /// Opaque user value
    Custom(CustomValue),
}

impl Value {
    /// Wrap an arbitrary user value, see [`CustomValue`]
    pub fn custom<T: Any + Send + Sync>(value: T) -> Self {
        Value::Custom(CustomValue::new(value))
    }

    /// The kind of this value
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Char(_) => ValueKind::Char,
            Value::I8(_) => ValueKind::I8,
            Value::I16(_) => ValueKind::I16,
            Value::I32(_) => ValueKind::I32,
            Value::I64(_) => ValueKind::I64,
            Value::U8(_) => ValueKind::U8,
            Value::U16(_) => ValueKind::U16,
            Value::U32(_) => ValueKind::U32,
            Value::U64(_) => ValueKind::U64,
            Value::F32(_) => ValueKind::F32,
            Value::F64(_) => ValueKind::F64,
            Value::String(_) => ValueKind::String,
            Value::List(_) => ValueKind::List,
            Value::Custom(_) => ValueKind::Custom,
        }
    }

    /// Returns `true` for [`Value::Null`]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to convert to a boolean value
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Try to read any integer variant, widened to `i128`
    #[must_use]
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Value::I8(value) => Some(i128::from(*value)),
            Value::I16(value) => Some(i128::from(*value)),
            Value::I32(value) => Some(i128::from(*value)),
            Value::I64(value) => Some(i128::from(*value)),
            Value::U8(value) => Some(i128::from(*value)),
            Value::U16(value) => Some(i128::from(*value)),
            Value::U32(value) => Some(i128::from(*value)),
            Value::U64(value) => Some(i128::from(*value)),
            _ => None,
        }
    }

    /// Try to convert to a 64-bit float
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F32(value) => Some(f64::from(*value)),
            Value::F64(value) => Some(*value),
            other => other.as_integer().map(|value| value as f64),
        }
    }

    /// Borrow the string payload
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    /// Borrow the custom payload as `T`
    #[must_use]
    pub fn as_custom<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Custom(custom) => custom.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::U8(a), Value::U8(b)) => a == b,
            (Value::U16(a), Value::U16(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::F32(a), Value::F32(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Custom(a), Value::Custom(b)) => a.same_payload(b),
            _ => false,
        }
    }
}

/// Conversion between a Rust type and [`Value`].
///
/// Every getter, setter, converter, null-substitute and factory parameter is typed through this
/// trait. Implementations exist for the primitive types, `String`, `Option<T>` and `Vec<T>`;
/// use [`custom_value!`](crate::custom_value) for enumerations and other user types.
pub trait MapValue: Sized + 'static {
    /// The declared type used for exact-type matching during member resolution.
    ///
    /// `Option<T>` reports the declared type of `T`, marked nullable.
    fn declared_type() -> DeclaredType {
        DeclaredType::of::<Self>()
    }

    /// Convert into a dynamic value
    fn into_value(self) -> Value;

    /// Convert from a dynamic value, applying the coercion rules of this module
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeMismatch`] if the value can not represent `Self`.
    fn from_value(value: Value) -> Result<Self>;
}

macro_rules! integer_value {
    ($($ty:ty => $variant:ident),+ $(,)?) => {$(
        impl MapValue for $ty {
            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            fn from_value(value: Value) -> Result<Self> {
                value
                    .as_integer()
                    .and_then(|wide| <$ty>::try_from(wide).ok())
                    .ok_or_else(|| mismatch_error!(type_name::<$ty>(), value))
            }
        }
    )+};
}

integer_value! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
}

impl MapValue for f64 {
    fn into_value(self) -> Value {
        Value::F64(self)
    }

    fn from_value(value: Value) -> Result<Self> {
        value
            .as_f64()
            .ok_or_else(|| mismatch_error!(type_name::<f64>(), value))
    }
}

impl MapValue for f32 {
    fn into_value(self) -> Value {
        Value::F32(self)
    }

    #[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::F32(narrow) => Ok(narrow),
            Value::F64(wide) if f64::from(wide as f32) == wide => Ok(wide as f32),
            ref other => other
                .as_f64()
                .filter(|_| other.as_integer().is_some())
                .map(|wide| wide as f32)
                .ok_or_else(|| mismatch_error!(type_name::<f32>(), other)),
        }
    }
}

impl MapValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: Value) -> Result<Self> {
        value
            .as_bool()
            .ok_or_else(|| mismatch_error!(type_name::<bool>(), value))
    }
}

impl MapValue for char {
    fn into_value(self) -> Value {
        Value::Char(self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Char(c) => Ok(c),
            other => Err(mismatch_error!(type_name::<char>(), other)),
        }
    }
}

impl MapValue for String {
    fn into_value(self) -> Value {
        Value::String(self)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            Value::Char(c) => Ok(c.to_string()),
            other => Err(mismatch_error!(type_name::<String>(), other)),
        }
    }
}

impl<T: MapValue> MapValue for Option<T> {
    fn declared_type() -> DeclaredType {
        T::declared_type().into_nullable()
    }

    fn into_value(self) -> Value {
        match self {
            Some(inner) => inner.into_value(),
            None => Value::Null,
        }
    }

    fn from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        T::from_value(value).map(Some)
    }
}

impl<T: MapValue> MapValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(MapValue::into_value).collect())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            other => Err(mismatch_error!(type_name::<Self>(), other)),
        }
    }
}

impl MapValue for Value {
    fn declared_type() -> DeclaredType {
        DeclaredType::of::<Value>().into_nullable()
    }

    fn into_value(self) -> Value {
        self
    }

    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

/// Implements [`MapValue`] for user types by wrapping them in a [`CustomValue`].
///
/// The types must be `Clone + Send + Sync + 'static`. Typical candidates are enumerations and
/// small value objects that should be copied between members of identical type, or handed to a
/// converter.
///
/// ```rust
/// use shapemap::{custom_value, MapValue, Value};
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum Status {
///     Active,
///     Inactive,
/// }
///
/// custom_value!(Status);
///
/// let value = Status::Active.into_value();
/// assert_eq!(Status::from_value(value).unwrap(), Status::Active);
/// assert!(Status::from_value(Value::I32(1)).is_err());
/// ```
#[macro_export]
macro_rules! custom_value {
    ($($ty:ty),+ $(,)?) => {$(
        impl $crate::MapValue for $ty {
            fn into_value(self) -> $crate::Value {
                $crate::Value::custom(self)
            }

            fn from_value(value: $crate::Value) -> $crate::Result<Self> {
                match value.as_custom::<$ty>() {
                    Some(inner) => Ok(::std::clone::Clone::clone(inner)),
                    None => Err($crate::Error::TypeMismatch {
                        expected: ::std::any::type_name::<$ty>().to_string(),
                        found: value.kind().to_string(),
                    }),
                }
            }
        }
    )+};
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;
    use crate::Error;

    #[derive(Debug, Clone, PartialEq)]
    enum Tier {
        Gold,
        Silver,
    }

    custom_value!(Tier);

    #[test]
    fn integers_widen_and_narrow_when_in_range() {
        assert_eq!(i64::from_value(Value::I32(-7)).unwrap(), -7);
        assert_eq!(u8::from_value(Value::I64(200)).unwrap(), 200);
        assert_eq!(i32::from_value(Value::U16(65535)).unwrap(), 65535);
    }

    #[test]
    fn integers_out_of_range_are_rejected() {
        let err = u8::from_value(Value::I32(300)).unwrap_err();
        assert_eq!(
            err,
            Error::TypeMismatch {
                expected: "u8".to_string(),
                found: "I32".to_string(),
            }
        );
        assert!(u32::from_value(Value::I8(-1)).is_err());
        assert!(i32::from_value(Value::String("1".into())).is_err());
    }

    #[test]
    fn floats_accept_integers() {
        assert_eq!(f64::from_value(Value::I32(3)).unwrap(), 3.0);
        assert_eq!(f64::from_value(Value::F32(1.5)).unwrap(), 1.5);
        assert_eq!(f32::from_value(Value::F64(0.5)).unwrap(), 0.5);
        assert_eq!(f32::from_value(Value::U8(4)).unwrap(), 4.0);
        assert!(f32::from_value(Value::F64(0.1)).is_err());
        assert!(f64::from_value(Value::Bool(true)).is_err());
    }

    #[test]
    fn option_maps_none_to_null() {
        assert_eq!(Option::<String>::None.into_value(), Value::Null);
        assert_eq!(
            Some("x".to_string()).into_value(),
            Value::String("x".to_string())
        );
        assert_eq!(Option::<i32>::from_value(Value::Null).unwrap(), None);
        assert_eq!(Option::<i32>::from_value(Value::I8(2)).unwrap(), Some(2));
        assert!(i32::from_value(Value::Null).is_err());
    }

    #[test]
    fn option_declared_type_is_nullable_inner_type() {
        let outer = Option::<String>::declared_type();
        let inner = String::declared_type();
        assert!(outer.is_nullable());
        assert!(!inner.is_nullable());
        assert_eq!(outer, inner);
    }

    #[test]
    fn strings_and_chars() {
        assert_eq!(String::from_value(Value::Char('a')).unwrap(), "a");
        assert!(char::from_value(Value::String("a".into())).is_err());
    }

    #[test]
    fn lists_convert_element_wise() {
        let value = vec![1u16, 2, 3].into_value();
        assert_eq!(
            value,
            Value::List(vec![Value::U16(1), Value::U16(2), Value::U16(3)])
        );
        assert_eq!(Vec::<i64>::from_value(value).unwrap(), vec![1, 2, 3]);
        assert!(Vec::<i64>::from_value(Value::I64(1)).is_err());
    }

    #[test]
    fn custom_values_round_trip_by_type() {
        let value = Tier::Gold.into_value();
        assert_eq!(value.kind(), ValueKind::Custom);
        assert_eq!(value.as_custom::<Tier>(), Some(&Tier::Gold));
        assert_eq!(Tier::from_value(value.clone()).unwrap(), Tier::Gold);
        assert!(String::from_value(value).is_err());
        assert!(Tier::from_value(Value::Null).is_err());
        assert_ne!(Tier::Silver.into_value(), Tier::Silver.into_value());
    }

    #[test]
    fn every_kind_has_a_name() {
        assert_eq!(ValueKind::iter().count(), ValueKind::COUNT);
        for kind in ValueKind::iter() {
            assert!(!kind.to_string().is_empty());
        }
    }
}
