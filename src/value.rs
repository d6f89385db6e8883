use std::{
    any::Any,
    cell::{Ref, RefCell, RefMut},
    fmt,
    rc::Rc,
};

use miette::Error;

use crate::error::{ConversionError, EvaluationError};

pub const BOOL_TYPE: &str = "bool";
pub const INT_TYPE: &str = "i64";
pub const FLOAT_TYPE: &str = "f64";
pub const STRING_TYPE: &str = "String";

/// A runtime value flowing through evaluation, invocation and the codec.
///
/// Scalars are compared by value; objects are shared handles compared by
/// identity, so a receiver mutated by an invoked member is observed by later
/// lookups against the same handle.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Object(Object),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Fully qualified runtime type name, empty for `Null`.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "",
            Value::Bool(_) => BOOL_TYPE,
            Value::Int(_) => INT_TYPE,
            Value::Float(_) => FLOAT_TYPE,
            Value::Str(_) => STRING_TYPE,
            Value::Object(object) => object.type_name(),
        }
    }

    fn describe(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            other => other.type_name().to_string(),
        }
    }

    pub fn as_bool(&self) -> Result<bool, Error> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(ConversionError::new(BOOL_TYPE, other.describe()).into()),
        }
    }

    pub fn as_i64(&self) -> Result<i64, Error> {
        match self {
            Value::Int(n) => Ok(*n),
            other => Err(ConversionError::new(INT_TYPE, other.describe()).into()),
        }
    }

    /// Integers widen to floats.
    pub fn as_f64(&self) -> Result<f64, Error> {
        match self {
            Value::Float(n) => Ok(*n),
            Value::Int(n) => Ok(*n as f64),
            other => Err(ConversionError::new(FLOAT_TYPE, other.describe()).into()),
        }
    }

    pub fn as_str(&self) -> Result<&str, Error> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(ConversionError::new(STRING_TYPE, other.describe()).into()),
        }
    }

    pub fn as_object(&self) -> Result<&Object, Error> {
        match self {
            Value::Object(object) => Ok(object),
            other => Err(ConversionError::new("object", other.describe()).into()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

/// Invariant rendering used by the codec. `Float` uses the shortest text
/// that parses back to the same `f64`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Object(object) => write!(f, "{}", object.type_name()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

/// Shared handle to a host instance, tagged with the qualified name of the
/// type it was registered under.
#[derive(Clone)]
pub struct Object {
    type_name: Rc<str>,
    inner: Rc<RefCell<dyn Any>>,
}

impl Object {
    pub fn new<T: Any>(type_name: impl Into<Rc<str>>, value: T) -> Self {
        Self {
            type_name: type_name.into(),
            inner: Rc::new(RefCell::new(value)),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn borrow<T: Any>(&self) -> Result<Ref<'_, T>, Error> {
        let inner = self
            .inner
            .try_borrow()
            .map_err(|_| self.already_borrowed())?;
        Ref::filter_map(inner, |any| any.downcast_ref::<T>())
            .map_err(|_| self.mismatch::<T>())
    }

    pub fn borrow_mut<T: Any>(&self) -> Result<RefMut<'_, T>, Error> {
        let inner = self
            .inner
            .try_borrow_mut()
            .map_err(|_| self.already_borrowed())?;
        RefMut::filter_map(inner, |any| any.downcast_mut::<T>())
            .map_err(|_| self.mismatch::<T>())
    }

    fn already_borrowed(&self) -> Error {
        EvaluationError::AlreadyBorrowed {
            type_name: self.type_name.to_string(),
        }
        .into()
    }

    fn mismatch<T: Any>(&self) -> Error {
        ConversionError::new(std::any::type_name::<T>(), self.type_name.to_string()).into()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("type_name", &self.type_name)
            .field("ptr", &Rc::as_ptr(&self.inner).cast::<()>())
            .finish()
    }
}
