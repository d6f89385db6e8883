//! The capability through which the engine reaches host types: finding types
//! and members by name, reading and writing fields and properties, invoking
//! methods and constructing instances.

use std::rc::Rc;

use miette::Error;

use crate::{error::ConversionError, value::Value};

pub mod registry;
pub use registry::Registry;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeHandle {
    pub id: usize,
    pub name: Rc<str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Field,
    Property,
    Method,
}

impl MemberKind {
    /// Fields and properties can appear on the right of `.` and as targets of
    /// object-literal assignments.
    pub fn is_readable(&self) -> bool {
        matches!(self, MemberKind::Field | MemberKind::Property)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberHandle {
    pub owner: TypeHandle,
    pub name: Rc<str>,
    pub kind: MemberKind,
    pub is_static: bool,
    pub index: usize,
}

pub trait MemberResolver {
    fn find_type(&self, qualified_name: &str) -> Option<TypeHandle>;

    /// All members of `ty` named `name`, in declaration order. Callers use the
    /// first one.
    fn find_members(&self, ty: &TypeHandle, name: &str) -> Vec<MemberHandle>;

    /// Runtime type of a value, if the host knows it.
    fn type_of(&self, value: &Value) -> Option<TypeHandle> {
        match value {
            Value::Null => None,
            other => self.find_type(other.type_name()),
        }
    }

    fn is_static(&self, member: &MemberHandle) -> bool {
        member.is_static
    }

    fn get_value(&self, member: &MemberHandle, receiver: &Value) -> Result<Value, Error>;

    fn set_value(&self, member: &MemberHandle, receiver: &Value, value: Value)
        -> Result<(), Error>;

    /// Errors raised by the member itself come back as
    /// [`InvocationError`](crate::error::InvocationError).
    fn invoke(&self, member: &MemberHandle, receiver: &Value, args: Vec<Value>)
        -> Result<Value, Error>;

    /// Parameterless construction.
    fn construct(&self, ty: &TypeHandle) -> Result<Value, Error>;

    /// Converts invariant text into an instance of `ty`.
    fn convert(&self, ty: &TypeHandle, text: &str) -> Result<Value, Error> {
        Err(ConversionError::new(ty.name.to_string(), format!("text {text:?}")).into())
    }
}
