//! Attribute type descriptors and Rust field conversions.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;
use std::fmt;

/// The storage kind of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Boolean.
    Bool,
    /// 64-bit signed integer.
    Integer,
    /// Floating point. Declarable, but there is no [`Value`] for it.
    Float,
    /// UTF-8 text.
    Text,
    /// Raw bytes.
    Bytes,
}

impl ValueKind {
    /// Lower-case name of the kind.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Text => "text",
            ValueKind::Bytes => "bytes",
        }
    }
}

/// The declared type of an attribute: a kind plus nullability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueType {
    /// Storage kind.
    pub kind: ValueKind,
    /// Whether `Null` is an accepted value.
    pub nullable: bool,
}

impl ValueType {
    /// A non-nullable type of the given kind.
    pub const fn required(kind: ValueKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    /// A nullable type of the given kind.
    pub const fn nullable(kind: ValueKind) -> Self {
        Self {
            kind,
            nullable: true,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "{}?", self.kind.name())
        } else {
            f.write_str(self.kind.name())
        }
    }
}

/// A Rust type that can back an entity attribute.
///
/// Implemented for the scalar types the codec can carry and for
/// `Option<T>` of those, which maps `None` to [`Value::Null`].
pub trait AttributeValue: Sized {
    /// The declared attribute type for this Rust type.
    fn value_type() -> ValueType;

    /// Converts a field value into a stored value.
    fn to_value(&self) -> Value;

    /// Converts a stored value back into the field type.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` when the value has the wrong variant and
    /// `IntegerOverflow` when an integer does not fit.
    fn from_value(value: Value) -> CodecResult<Self>;
}

impl AttributeValue for bool {
    fn value_type() -> ValueType {
        ValueType::required(ValueKind::Bool)
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(CodecError::type_mismatch(Self::value_type(), other.type_name())),
        }
    }
}

impl AttributeValue for i64 {
    fn value_type() -> ValueType {
        ValueType::required(ValueKind::Integer)
    }

    fn to_value(&self) -> Value {
        Value::Integer(*self)
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::Integer(n) => Ok(n),
            other => Err(CodecError::type_mismatch(Self::value_type(), other.type_name())),
        }
    }
}

macro_rules! narrow_integer {
    ($($ty:ty),*) => {
        $(
            impl AttributeValue for $ty {
                fn value_type() -> ValueType {
                    ValueType::required(ValueKind::Integer)
                }

                fn to_value(&self) -> Value {
                    Value::Integer(i64::from(*self))
                }

                fn from_value(value: Value) -> CodecResult<Self> {
                    let n = i64::from_value(value)?;
                    <$ty>::try_from(n).map_err(|_| CodecError::IntegerOverflow {
                        value: n,
                        target: stringify!($ty),
                    })
                }
            }
        )*
    };
}

narrow_integer!(i32, u32, i16, u16, u8);

impl AttributeValue for String {
    fn value_type() -> ValueType {
        ValueType::required(ValueKind::Text)
    }

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(CodecError::type_mismatch(Self::value_type(), other.type_name())),
        }
    }
}

impl AttributeValue for Vec<u8> {
    fn value_type() -> ValueType {
        ValueType::required(ValueKind::Bytes)
    }

    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::Bytes(b) => Ok(b),
            other => Err(CodecError::type_mismatch(Self::value_type(), other.type_name())),
        }
    }
}

impl<T: AttributeValue> AttributeValue for Option<T> {
    fn value_type() -> ValueType {
        ValueType::nullable(T::value_type().kind)
    }

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, AttributeValue::to_value)
    }

    fn from_value(value: Value) -> CodecResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_types() {
        assert_eq!(bool::value_type(), ValueType::required(ValueKind::Bool));
        assert_eq!(i32::value_type(), ValueType::required(ValueKind::Integer));
        assert_eq!(String::value_type(), ValueType::required(ValueKind::Text));
        assert_eq!(
            Option::<Vec<u8>>::value_type(),
            ValueType::nullable(ValueKind::Bytes)
        );
    }

    #[test]
    fn narrow_integer_overflow() {
        let result = u8::from_value(Value::Integer(300));
        assert_eq!(
            result,
            Err(CodecError::IntegerOverflow {
                value: 300,
                target: "u8"
            })
        );
        assert_eq!(i32::from_value(Value::Integer(-7)), Ok(-7));
    }

    #[test]
    fn mismatch_names_expected_type() {
        let err = String::from_value(Value::Integer(1)).unwrap_err();
        assert_eq!(err.to_string(), "type mismatch: expected text, found integer");
    }

    #[test]
    fn option_maps_null() {
        assert_eq!(Option::<i64>::from_value(Value::Null), Ok(None));
        assert_eq!(Option::<i64>::from_value(Value::Integer(5)), Ok(Some(5)));
        assert_eq!(Some(5i64).to_value(), Value::Integer(5));
        assert_eq!(None::<String>.to_value(), Value::Null);
    }

    #[test]
    fn display_marks_nullable() {
        assert_eq!(ValueType::nullable(ValueKind::Text).to_string(), "text?");
        assert_eq!(ValueType::required(ValueKind::Float).to_string(), "float");
    }
}
