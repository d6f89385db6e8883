//! Mapping between runtime values and `(text, type name)` pairs, used for
//! test arguments, expected values and captured results alike.

use miette::Error;

use crate::{
    error::{ConversionError, ResolutionError},
    host::MemberResolver,
    value::{Value, BOOL_TYPE, FLOAT_TYPE, INT_TYPE, STRING_TYPE},
};

/// `Null` maps to `("", "")`; everything else to its invariant text and
/// fully qualified type name.
pub fn serialize(value: &Value) -> (String, String) {
    (value.to_string(), value.type_name().to_string())
}

/// Inverse of [`serialize`]. Scalar type names are handled here; any other
/// name is resolved through the host, which converts the text.
pub fn deserialize(
    resolver: &dyn MemberResolver,
    text: &str,
    type_name: &str,
) -> Result<Value, Error> {
    let mismatch = || -> Error { ConversionError::new(type_name, format!("text {text:?}")).into() };

    match type_name {
        "" => Ok(Value::Null),
        BOOL_TYPE => text.parse().map(Value::Bool).map_err(|_| mismatch()),
        INT_TYPE => text.parse().map(Value::Int).map_err(|_| mismatch()),
        FLOAT_TYPE => text.parse().map(Value::Float).map_err(|_| mismatch()),
        STRING_TYPE => Ok(Value::Str(text.to_string())),
        other => {
            let ty = resolver
                .find_type(other)
                .ok_or_else(|| ResolutionError::TypeNotFound {
                    name: other.to_string(),
                })?;
            resolver.convert(&ty, text)
        }
    }
}

/// The value an argument with no text stands for: the scalar's zero value,
/// a default-constructed host instance, or `Null` when no type is named.
pub fn default_of(resolver: &dyn MemberResolver, type_name: &str) -> Result<Value, Error> {
    match type_name {
        "" => Ok(Value::Null),
        BOOL_TYPE => Ok(Value::Bool(false)),
        INT_TYPE => Ok(Value::Int(0)),
        FLOAT_TYPE => Ok(Value::Float(0.0)),
        STRING_TYPE => Ok(Value::Str(String::new())),
        other => {
            let ty = resolver
                .find_type(other)
                .ok_or_else(|| ResolutionError::TypeNotFound {
                    name: other.to_string(),
                })?;
            resolver.construct(&ty)
        }
    }
}
