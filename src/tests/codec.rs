use super::test_utils::{demo_registry, Location, LOCATION, PERSON};
use crate::{
    codec::{default_of, deserialize, serialize},
    error::{ConversionError, ResolutionError},
    value::Value,
};
use pretty_assertions::assert_eq;

#[test]
fn test_serialize_scalars() {
    assert_eq!(serialize(&Value::Null), (String::new(), String::new()));
    assert_eq!(
        serialize(&Value::Bool(true)),
        ("true".to_string(), "bool".to_string())
    );
    assert_eq!(
        serialize(&Value::Int(-3)),
        ("-3".to_string(), "i64".to_string())
    );
    assert_eq!(
        serialize(&Value::Float(1.0)),
        ("1".to_string(), "f64".to_string())
    );
    assert_eq!(
        serialize(&Value::from("Frank Krueger")),
        ("Frank Krueger".to_string(), "String".to_string())
    );
}

#[test]
fn test_scalars_survive_a_round_trip() {
    let registry = demo_registry();
    for value in [
        Value::Null,
        Value::Bool(false),
        Value::Int(i64::MIN),
        Value::Float(0.1),
        Value::Float(-2.5e-8),
        Value::from(""),
        Value::from("with spaces, and \"quotes\""),
    ] {
        let (text, type_name) = serialize(&value);
        assert_eq!(
            deserialize(&registry, &text, &type_name).unwrap(),
            value,
            "{text:?} as {type_name:?}"
        );
    }
}

#[test]
fn test_empty_type_name_is_null() {
    let registry = demo_registry();
    assert_eq!(deserialize(&registry, "ignored", "").unwrap(), Value::Null);
}

#[test]
fn test_bad_scalar_text() {
    let registry = demo_registry();
    let err = deserialize(&registry, "maybe", "bool").unwrap_err();
    assert_eq!(
        err.downcast_ref::<ConversionError>(),
        Some(&ConversionError::new("bool", "text \"maybe\""))
    );
    assert!(deserialize(&registry, "1.5", "i64").is_err());
}

#[test]
fn test_host_types_convert_through_the_resolver() {
    let registry = demo_registry();
    let value = deserialize(&registry, "1.5, -2", LOCATION).unwrap();
    let location = *value.as_object().unwrap().borrow::<Location>().unwrap();
    assert_eq!(location, Location { lat: 1.5, lon: -2.0 });

    // Person has no text form
    assert!(deserialize(&registry, "Frank", PERSON).is_err());
}

#[test]
fn test_unknown_type_name() {
    let registry = demo_registry();
    let err = deserialize(&registry, "x", "Demo.Unknown").unwrap_err();
    assert_eq!(
        err.downcast_ref::<ResolutionError>(),
        Some(&ResolutionError::TypeNotFound {
            name: "Demo.Unknown".to_string()
        })
    );
}

#[test]
fn test_default_values() {
    let registry = demo_registry();
    assert_eq!(default_of(&registry, "").unwrap(), Value::Null);
    assert_eq!(default_of(&registry, "bool").unwrap(), Value::Bool(false));
    assert_eq!(default_of(&registry, "i64").unwrap(), Value::Int(0));
    assert_eq!(default_of(&registry, "f64").unwrap(), Value::Float(0.0));
    assert_eq!(default_of(&registry, "String").unwrap(), Value::from(""));

    let location = default_of(&registry, LOCATION).unwrap();
    assert_eq!(location.type_name(), LOCATION);
    assert!(default_of(&registry, "Demo.Unknown").is_err());
}
