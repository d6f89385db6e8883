use std::{any::Any, fmt, marker::PhantomData, rc::Rc};

use miette::Error;
use rustc_hash::FxHashMap as HashMap;

use crate::{
    error::{
        ConstructionError, ConversionError, EvaluationError, InvocationError, ResolutionError,
    },
    host::{MemberHandle, MemberKind, MemberResolver, TypeHandle},
    value::{Object, Value},
};

type Getter = Rc<dyn Fn(&Value) -> Result<Value, Error>>;
type Setter = Rc<dyn Fn(&Value, Value) -> Result<(), Error>>;
type Method = Rc<dyn Fn(&Value, Vec<Value>) -> Result<Value, Error>>;
type Constructor = Box<dyn Fn() -> Value>;
type Converter = Box<dyn Fn(&str) -> Result<Value, Error>>;

struct MemberEntry {
    name: Rc<str>,
    kind: MemberKind,
    is_static: bool,
    getter: Option<Getter>,
    setter: Option<Setter>,
    method: Option<Method>,
}

struct TypeEntry {
    handle: TypeHandle,
    constructor: Option<Constructor>,
    converter: Option<Converter>,
    members: Vec<MemberEntry>,
}

/// A [`MemberResolver`] built from typed closures at startup.
///
/// ```
/// use quicktest::{
///     host::{MemberResolver, Registry},
///     value::Value,
/// };
///
/// #[derive(Default)]
/// struct Person {
///     first: String,
///     last: String,
/// }
///
/// let mut registry = Registry::new();
/// registry
///     .register::<Person>("Demo.Person")
///     .field(
///         "FirstName",
///         |p| Value::from(p.first.as_str()),
///         |p, v| {
///             p.first = v.as_str()?.to_string();
///             Ok(())
///         },
///     )
///     .getter("FullName", |p| Value::from(format!("{} {}", p.first, p.last)))
///     .static_getter("Species", || Value::from("Homo sapiens"));
///
/// let ty = registry.find_type("Demo.Person").unwrap();
/// let person = registry.construct(&ty).unwrap();
/// let first = registry.find_members(&ty, "FirstName").remove(0);
/// registry.set_value(&first, &person, Value::from("Ada")).unwrap();
///
/// let full = registry.find_members(&ty, "FullName").remove(0);
/// assert_eq!(registry.get_value(&full, &person).unwrap(), Value::from("Ada "));
///
/// let species = registry.find_members(&ty, "Species").remove(0);
/// assert!(registry.is_static(&species));
/// assert_eq!(
///     registry.get_value(&species, &Value::Null).unwrap(),
///     Value::from("Homo sapiens")
/// );
/// ```
#[derive(Default)]
pub struct Registry {
    types: Vec<TypeEntry>,
    by_name: HashMap<Rc<str>, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` under `qualified_name`, default-constructible. Registering
    /// the same name again continues adding members to the existing entry.
    pub fn register<T: Any + Default>(&mut self, qualified_name: &str) -> TypeBuilder<'_, T> {
        let index = self.entry_index(qualified_name);
        let name = self.types[index].handle.name.clone();
        self.types[index].constructor =
            Some(Box::new(move || Value::Object(Object::new(name.clone(), T::default()))));
        TypeBuilder::new(self, index)
    }

    /// Registers `T` without a parameterless constructor. Instances can only
    /// come from members that return them.
    pub fn register_opaque<T: Any>(&mut self, qualified_name: &str) -> TypeBuilder<'_, T> {
        let index = self.entry_index(qualified_name);
        TypeBuilder::new(self, index)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|t| &*t.handle.name)
    }

    fn entry_index(&mut self, qualified_name: &str) -> usize {
        if let Some(&index) = self.by_name.get(qualified_name) {
            return index;
        }

        let index = self.types.len();
        let name: Rc<str> = Rc::from(qualified_name);
        self.types.push(TypeEntry {
            handle: TypeHandle {
                id: index,
                name: name.clone(),
            },
            constructor: None,
            converter: None,
            members: Vec::new(),
        });
        self.by_name.insert(name, index);
        index
    }

    fn type_entry(&self, ty: &TypeHandle) -> Result<&TypeEntry, Error> {
        self.types
            .get(ty.id)
            .filter(|entry| entry.handle.name == ty.name)
            .ok_or_else(|| {
                ResolutionError::TypeNotFound {
                    name: ty.name.to_string(),
                }
                .into()
            })
    }

    fn member_entry(&self, member: &MemberHandle) -> Result<&MemberEntry, Error> {
        self.type_entry(&member.owner)?
            .members
            .get(member.index)
            .filter(|entry| entry.name == member.name)
            .ok_or_else(|| {
                ResolutionError::MemberNotFound {
                    member: member.name.to_string(),
                    type_name: member.owner.name.to_string(),
                }
                .into()
            })
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.type_names()).finish()
    }
}

impl MemberResolver for Registry {
    fn find_type(&self, qualified_name: &str) -> Option<TypeHandle> {
        self.by_name
            .get(qualified_name)
            .map(|&index| self.types[index].handle.clone())
    }

    fn find_members(&self, ty: &TypeHandle, name: &str) -> Vec<MemberHandle> {
        let Ok(entry) = self.type_entry(ty) else {
            return Vec::new();
        };

        entry
            .members
            .iter()
            .enumerate()
            .filter(|(_, member)| &*member.name == name)
            .map(|(index, member)| MemberHandle {
                owner: entry.handle.clone(),
                name: member.name.clone(),
                kind: member.kind,
                is_static: member.is_static,
                index,
            })
            .collect()
    }

    fn get_value(&self, member: &MemberHandle, receiver: &Value) -> Result<Value, Error> {
        let entry = self.member_entry(member)?;
        match &entry.getter {
            Some(getter) => getter(receiver),
            None => Err(EvaluationError::NotReadable {
                member: member.name.to_string(),
                type_name: member.owner.name.to_string(),
            }
            .into()),
        }
    }

    fn set_value(&self, member: &MemberHandle, receiver: &Value, value: Value) -> Result<(), Error> {
        let entry = self.member_entry(member)?;
        match &entry.setter {
            Some(setter) => setter(receiver, value),
            None => Err(ConstructionError::NotWritable {
                member: member.name.to_string(),
                type_name: member.owner.name.to_string(),
            }
            .into()),
        }
    }

    fn invoke(&self, member: &MemberHandle, receiver: &Value, args: Vec<Value>) -> Result<Value, Error> {
        let entry = self.member_entry(member)?;
        match &entry.method {
            Some(method) => method(receiver, args),
            None => Err(EvaluationError::NotInvocable {
                member: member.name.to_string(),
                type_name: member.owner.name.to_string(),
            }
            .into()),
        }
    }

    fn construct(&self, ty: &TypeHandle) -> Result<Value, Error> {
        match &self.type_entry(ty)?.constructor {
            Some(constructor) => Ok(constructor()),
            None => Err(ConstructionError::NoConstructor {
                type_name: ty.name.to_string(),
            }
            .into()),
        }
    }

    fn convert(&self, ty: &TypeHandle, text: &str) -> Result<Value, Error> {
        match &self.type_entry(ty)?.converter {
            Some(converter) => converter(text),
            None => Err(ConversionError::new(
                ty.name.to_string(),
                format!("text {text:?}"),
            )
            .into()),
        }
    }
}

/// Adds members to one registered type. Closures see the host value `T`
/// directly; the builder takes care of unwrapping the receiver.
pub struct TypeBuilder<'r, T> {
    registry: &'r mut Registry,
    index: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<'r, T: Any> TypeBuilder<'r, T> {
    fn new(registry: &'r mut Registry, index: usize) -> Self {
        Self {
            registry,
            index,
            _marker: PhantomData,
        }
    }

    pub fn handle(&self) -> TypeHandle {
        self.registry.types[self.index].handle.clone()
    }

    fn member(&mut self, name: &str, kind: MemberKind, is_static: bool) -> &mut MemberEntry {
        let members = &mut self.registry.types[self.index].members;
        let position = members
            .iter()
            .position(|m| &*m.name == name && m.kind == kind && m.is_static == is_static);
        let position = match position {
            Some(position) => position,
            None => {
                members.push(MemberEntry {
                    name: Rc::from(name),
                    kind,
                    is_static,
                    getter: None,
                    setter: None,
                    method: None,
                });
                members.len() - 1
            }
        };
        &mut members[position]
    }

    fn wrap_getter(get: impl Fn(&T) -> Value + 'static) -> Getter {
        Rc::new(move |receiver: &Value| -> Result<Value, Error> {
            let this = receiver.as_object()?.borrow::<T>()?;
            Ok(get(&this))
        })
    }

    fn wrap_setter(set: impl Fn(&mut T, Value) -> Result<(), Error> + 'static) -> Setter {
        Rc::new(move |receiver: &Value, value: Value| -> Result<(), Error> {
            let mut this = receiver.as_object()?.borrow_mut::<T>()?;
            set(&mut this, value)
        })
    }

    pub fn field(
        mut self,
        name: &str,
        get: impl Fn(&T) -> Value + 'static,
        set: impl Fn(&mut T, Value) -> Result<(), Error> + 'static,
    ) -> Self {
        let entry = self.member(name, MemberKind::Field, false);
        entry.getter = Some(Self::wrap_getter(get));
        entry.setter = Some(Self::wrap_setter(set));
        self
    }

    pub fn getter(mut self, name: &str, get: impl Fn(&T) -> Value + 'static) -> Self {
        self.member(name, MemberKind::Property, false).getter = Some(Self::wrap_getter(get));
        self
    }

    pub fn setter(
        mut self,
        name: &str,
        set: impl Fn(&mut T, Value) -> Result<(), Error> + 'static,
    ) -> Self {
        self.member(name, MemberKind::Property, false).setter = Some(Self::wrap_setter(set));
        self
    }

    /// Static property read. The receiver is ignored, so tests and asserts
    /// reach it without an instance.
    pub fn static_getter(mut self, name: &str, get: impl Fn() -> Value + 'static) -> Self {
        self.member(name, MemberKind::Property, true).getter =
            Some(Rc::new(move |_receiver: &Value| -> Result<Value, Error> { Ok(get()) }));
        self
    }

    pub fn static_setter(
        mut self,
        name: &str,
        set: impl Fn(Value) -> Result<(), Error> + 'static,
    ) -> Self {
        self.member(name, MemberKind::Property, true).setter =
            Some(Rc::new(move |_receiver: &Value, value: Value| -> Result<(), Error> {
                set(value)
            }));
        self
    }

    /// Instance method. Errors returned by `f` surface as `InvocationError`.
    pub fn method(
        mut self,
        name: &str,
        f: impl Fn(&mut T, &[Value]) -> Result<Value, Error> + 'static,
    ) -> Self {
        let qualified = format!("{}.{name}", self.registry.types[self.index].handle.name);
        self.member(name, MemberKind::Method, false).method =
            Some(Rc::new(move |receiver: &Value, args: Vec<Value>| -> Result<Value, Error> {
                let mut this = receiver.as_object()?.borrow_mut::<T>()?;
                f(&mut this, &args).map_err(|cause| {
                    InvocationError {
                        member: qualified.clone(),
                        cause,
                    }
                    .into()
                })
            }));
        self
    }

    pub fn static_method(
        mut self,
        name: &str,
        f: impl Fn(&[Value]) -> Result<Value, Error> + 'static,
    ) -> Self {
        let qualified = format!("{}.{name}", self.registry.types[self.index].handle.name);
        self.member(name, MemberKind::Method, true).method =
            Some(Rc::new(move |_receiver: &Value, args: Vec<Value>| -> Result<Value, Error> {
                f(&args).map_err(|cause| {
                    InvocationError {
                        member: qualified.clone(),
                        cause,
                    }
                    .into()
                })
            }));
        self
    }

    /// Text conversion used by the codec for values of this type.
    pub fn parse(self, f: impl Fn(&str) -> Result<T, Error> + 'static) -> Self {
        let entry = &mut self.registry.types[self.index];
        let name = entry.handle.name.clone();
        entry.converter = Some(Box::new(move |text: &str| -> Result<Value, Error> {
            Ok(Value::Object(Object::new(name.clone(), f(text)?)))
        }));
        self
    }
}
