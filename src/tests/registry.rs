use super::test_utils::{demo_registry, Person, LOCATION, PERSON};
use crate::{
    error::{ConstructionError, EvaluationError, InvocationError},
    host::{MemberKind, MemberResolver, Registry},
    value::{Object, Value},
};
use pretty_assertions::assert_eq;

#[test]
fn test_find_type() {
    let registry = demo_registry();
    let person = registry.find_type(PERSON).unwrap();
    assert_eq!(&*person.name, PERSON);
    assert!(registry.find_type("Person").is_none());
    assert_eq!(registry.type_names().collect::<Vec<_>>(), vec![LOCATION, PERSON]);
}

#[test]
fn test_getter_and_setter_share_one_property() {
    let registry = demo_registry();
    let person = registry.find_type(PERSON).unwrap();
    let members = registry.find_members(&person, "FullName");
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].kind, MemberKind::Property);
    assert!(!members[0].is_static);
}

#[test]
fn test_member_kinds() {
    let registry = demo_registry();
    let person = registry.find_type(PERSON).unwrap();
    let kind = |name: &str| registry.find_members(&person, name)[0].kind;
    assert_eq!(kind("FirstName"), MemberKind::Field);
    assert_eq!(kind("Location"), MemberKind::Property);
    assert_eq!(kind("LowerCase"), MemberKind::Method);

    let answer = &registry.find_members(&person, "Answer")[0];
    assert!(registry.is_static(answer));
    assert!(registry.find_members(&person, "Nope").is_empty());
}

#[test]
fn test_static_properties_ignore_the_receiver() {
    let registry = demo_registry();
    let ty = registry.find_type(PERSON).unwrap();
    let motto = registry.find_members(&ty, "Motto").remove(0);
    assert_eq!(motto.kind, MemberKind::Property);
    assert!(registry.is_static(&motto));

    assert_eq!(
        registry.get_value(&motto, &Value::Null).unwrap(),
        Value::from("Stay curious")
    );
    registry
        .set_value(&motto, &Value::Null, Value::from("Stay hungry"))
        .unwrap();

    // any receiver reads the same shared value
    let person = registry.construct(&ty).unwrap();
    assert_eq!(
        registry.get_value(&motto, &person).unwrap(),
        Value::from("Stay hungry")
    );

    // a fresh registry starts over
    let fresh = demo_registry();
    assert_eq!(
        fresh.get_value(&motto, &Value::Null).unwrap(),
        Value::from("Stay curious")
    );
}

#[test]
fn test_get_set_and_invoke() {
    let registry = demo_registry();
    let ty = registry.find_type(PERSON).unwrap();
    let person = registry.construct(&ty).unwrap();
    let member = |name: &str| registry.find_members(&ty, name).remove(0);

    registry
        .set_value(&member("FullName"), &person, Value::from("Frank Krueger"))
        .unwrap();
    assert_eq!(
        registry.get_value(&member("LastName"), &person).unwrap(),
        Value::from("Krueger")
    );

    registry
        .invoke(&member("LowerCase"), &person, Vec::new())
        .unwrap();
    assert_eq!(
        registry.get_value(&member("FullName"), &person).unwrap(),
        Value::from("frank krueger")
    );

    let greeting = registry
        .invoke(&member("Greet"), &person, vec![Value::from("Hello")])
        .unwrap();
    assert_eq!(greeting, Value::from("Hello, frank"));
}

#[test]
fn test_read_only_property_rejects_writes() {
    let registry = demo_registry();
    let ty = registry.find_type(PERSON).unwrap();
    let person = registry.construct(&ty).unwrap();
    let location = registry.find_members(&ty, "Location").remove(0);

    let err = registry
        .set_value(&location, &person, Value::Null)
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<ConstructionError>(),
        Some(&ConstructionError::NotWritable {
            member: "Location".to_string(),
            type_name: PERSON.to_string(),
        })
    );
}

#[test]
fn test_method_errors_are_wrapped() {
    let registry = demo_registry();
    let ty = registry.find_type(PERSON).unwrap();
    let person = registry.construct(&ty).unwrap();
    let fails = registry.find_members(&ty, "Fails").remove(0);

    let err = registry.invoke(&fails, &person, Vec::new()).unwrap_err();
    let invocation = err.downcast_ref::<InvocationError>().unwrap();
    assert_eq!(invocation.member, "Demo.Person.Fails");
    assert_eq!(invocation.cause.to_string(), "Person is not ready");
    assert_eq!(
        err.to_string(),
        "InvocationError: 'Demo.Person.Fails' raised: Person is not ready"
    );
}

#[test]
fn test_static_methods_ignore_the_receiver() {
    let registry = demo_registry();
    let ty = registry.find_type(PERSON).unwrap();
    let named = registry.find_members(&ty, "Named").remove(0);

    let value = registry
        .invoke(&named, &Value::Null, vec![Value::from("Ada"), Value::from("Lovelace")])
        .unwrap();
    let full_name = value.as_object().unwrap().borrow::<Person>().unwrap().full_name();
    assert_eq!(full_name, "Ada Lovelace");
}

#[test]
fn test_wrong_receiver_type() {
    let registry = demo_registry();
    let ty = registry.find_type(PERSON).unwrap();
    let first_name = registry.find_members(&ty, "FirstName").remove(0);

    assert!(registry.get_value(&first_name, &Value::Null).is_err());
    assert!(registry.get_value(&first_name, &Value::Int(1)).is_err());

    let location = registry
        .construct(&registry.find_type(LOCATION).unwrap())
        .unwrap();
    assert!(registry.get_value(&first_name, &location).is_err());
}

#[test]
fn test_reentrant_access_is_an_error() {
    let registry = demo_registry();
    let ty = registry.find_type(PERSON).unwrap();
    let person = registry.construct(&ty).unwrap();
    let first_name = registry.find_members(&ty, "FirstName").remove(0);

    let _held = person.as_object().unwrap().borrow_mut::<Person>().unwrap();
    let err = registry.get_value(&first_name, &person).unwrap_err();
    assert_eq!(
        err.downcast_ref::<EvaluationError>(),
        Some(&EvaluationError::AlreadyBorrowed {
            type_name: PERSON.to_string()
        })
    );
}

#[test]
fn test_opaque_types_cannot_be_constructed() {
    #[derive(Debug)]
    struct Handle(u32);

    let mut registry = Registry::new();
    let ty = registry
        .register_opaque::<Handle>("Test.Handle")
        .getter("Id", |h| Value::Int(h.0 as i64))
        .handle();

    let err = registry.construct(&ty).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ConstructionError>(),
        Some(&ConstructionError::NoConstructor {
            type_name: "Test.Handle".to_string()
        })
    );

    // instances handed out by the host still work
    let handle = Value::Object(Object::new("Test.Handle", Handle(7)));
    let id = registry.find_members(&ty, "Id").remove(0);
    assert_eq!(registry.get_value(&id, &handle).unwrap(), Value::Int(7));
}

#[test]
fn test_stale_handles_are_rejected() {
    let registry = demo_registry();
    let mut ty = registry.find_type(PERSON).unwrap();
    ty.id += 100;
    assert!(registry.construct(&ty).is_err());
    assert!(registry.find_members(&ty, "FirstName").is_empty());
}
