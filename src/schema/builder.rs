//! Builder for type schemas.
//!
//! This module provides the [`SchemaBuilder`] struct, which offers a fluent API for describing a
//! Rust type to the mapping engine: its value members as getter/setter lenses, its nested
//! members as navigation lenses, and how instances are constructed.
//!
//! # Example
//!
//! ```rust
//! use shapemap::{Mappable, TypeSchema};
//!
//! #[derive(Default)]
//! struct Address {
//!     city: Option<String>,
//! }
//!
//! #[derive(Default)]
//! struct Customer {
//!     name: String,
//!     address: Option<Address>,
//! }
//!
//! impl Mappable for Address {
//!     fn describe() -> TypeSchema {
//!         TypeSchema::builder::<Address>("Address")
//!             .default_constructible()
//!             .member("City", |a: &Address| a.city.clone(), |a, v| a.city = v)
//!             .build()
//!     }
//! }
//!
//! impl Mappable for Customer {
//!     fn describe() -> TypeSchema {
//!         TypeSchema::builder::<Customer>("Customer")
//!             .default_constructible()
//!             .member("Name", |c: &Customer| c.name.clone(), |c, v| c.name = v)
//!             .nested("Address", |c: &Customer| c.address.as_ref())
//!             .build()
//!     }
//! }
//!
//! let schema = Customer::describe();
//! assert_eq!(schema.members().len(), 2);
//! assert!(schema.is_constructible());
//! ```

use std::{any::Any, fmt, marker::PhantomData, sync::Arc};

use crate::{
    schema::{
        DeclaredType, MapValue, Mappable, Member, MemberKind, NestedAccessor, TypeSchema,
        Value, ValueAccessor,
    },
    Error, Result,
};

type Constructor = Arc<dyn Fn() -> Box<dyn Any> + Send + Sync>;
type Creator = Arc<dyn Fn(&mut FactoryArgs) -> Result<Box<dyn Any>> + Send + Sync>;

/// How instances of a described type come into existence
#[derive(Clone)]
pub(crate) enum Construction {
    /// Zero-argument construction followed by member assignment
    Default(Constructor),
    /// Construction from named, typed arguments
    Factory(Factory),
    /// Not constructible (abstract)
    Abstract,
}

impl Construction {
    pub(crate) fn construct_default(&self) -> Option<Box<dyn Any>> {
        match self {
            Construction::Default(constructor) => Some(constructor()),
            _ => None,
        }
    }
}

/// A named, typed parameter of a [`Factory`]
#[derive(Debug, Clone, PartialEq)]
pub struct FactoryParam {
    name: String,
    declared: DeclaredType,
}

impl FactoryParam {
    /// The parameter name, matched case-insensitively against source members
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type, matched exactly against source members
    #[must_use]
    pub fn declared_type(&self) -> DeclaredType {
        self.declared
    }
}

/// Explicit construction for types without a zero-argument constructor.
///
/// A factory is the statically declared replacement for picking the constructor with the most
/// parameters: every parameter is wired to a source member with a case-insensitive name and an
/// identical declared type, and the creation closure receives the collected values.
#[derive(Clone)]
pub struct Factory {
    params: Vec<FactoryParam>,
    create: Creator,
}

impl Factory {
    /// The declared parameters, in declaration order
    #[must_use]
    pub fn params(&self) -> &[FactoryParam] {
        &self.params
    }

    pub(crate) fn create(&self, args: &mut FactoryArgs) -> Result<Box<dyn Any>> {
        (self.create)(args)
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("params", &self.params)
            .finish()
    }
}

/// Arguments collected for a [`Factory`] invocation
#[derive(Debug, Default)]
pub struct FactoryArgs {
    values: Vec<(String, Value)>,
}

impl FactoryArgs {
    pub(crate) fn new(values: Vec<(String, Value)>) -> Self {
        FactoryArgs { values }
    }

    /// Take the argument named `name` (case-insensitive) and convert it into `V`
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if no such argument exists, or was already taken, and
    /// [`Error::TypeMismatch`] if the value can not be converted.
    pub fn take<V: MapValue>(&mut self, name: &str) -> Result<V> {
        let index = self
            .values
            .iter()
            .position(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::InvalidArgument(format!("no factory argument named '{name}'")))?;

        let (_, value) = self.values.swap_remove(index);
        V::from_value(value)
    }

    /// Number of arguments not yet taken
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if every argument was taken
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Provides a fluent API for building a [`TypeSchema`]
pub struct SchemaBuilder<T> {
    name: &'static str,
    members: Vec<Member>,
    construction: Construction,
    params: Vec<FactoryParam>,
    _type: PhantomData<fn() -> T>,
}

impl<T: 'static> SchemaBuilder<T> {
    /// Start describing `T` under the display name `name`.
    ///
    /// The schema starts out abstract; call [`SchemaBuilder::default_constructible`] or
    /// [`SchemaBuilder::factory`] to make it a valid mapping destination.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        SchemaBuilder {
            name,
            members: Vec::new(),
            construction: Construction::Abstract,
            params: Vec::new(),
            _type: PhantomData,
        }
    }

    /// Add a readable and writable value member
    ///
    /// ## Arguments
    /// * 'name' - The member name used by configurations and resolution
    /// * 'get'  - Getter lens
    /// * 'set'  - Setter lens
    #[must_use]
    pub fn member<V, G, S>(mut self, name: impl Into<String>, get: G, set: S) -> Self
    where
        V: MapValue,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let accessor = ValueAccessor::read_write::<T, V, G, S>(get, set);
        self.members
            .push(Member::new(name.into(), MemberKind::Value(accessor)));
        self
    }

    /// Add a read-only value member, usable as a mapping source only
    #[must_use]
    pub fn read_only<V, G>(mut self, name: impl Into<String>, get: G) -> Self
    where
        V: MapValue,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        let accessor = ValueAccessor::read_only::<T, V, G>(get);
        self.members
            .push(Member::new(name.into(), MemberKind::Value(accessor)));
        self
    }

    /// Add a nested member that navigates to another mappable object
    ///
    /// ## Arguments
    /// * 'name'     - The member name used as a custom path segment
    /// * 'navigate' - Lens returning the nested object, `None` when it is absent
    #[must_use]
    pub fn nested<N, F>(mut self, name: impl Into<String>, navigate: F) -> Self
    where
        N: Mappable,
        F: Fn(&T) -> Option<&N> + Send + Sync + 'static,
    {
        let accessor = NestedAccessor::new::<T, N, F>(N::describe, navigate);
        self.members
            .push(Member::new(name.into(), MemberKind::Nested(accessor)));
        self
    }

    /// Declare the next factory parameter
    #[must_use]
    pub fn param<V: MapValue>(mut self, name: impl Into<String>) -> Self {
        self.params.push(FactoryParam {
            name: name.into(),
            declared: V::declared_type(),
        });
        self
    }

    /// Construct instances through `create`, fed with the declared parameters
    #[must_use]
    pub fn factory<F>(mut self, create: F) -> Self
    where
        F: Fn(&mut FactoryArgs) -> Result<T> + Send + Sync + 'static,
    {
        let params = std::mem::take(&mut self.params);
        let create: Creator = Arc::new(move |args: &mut FactoryArgs| -> Result<Box<dyn Any>> {
            let instance = create(args)?;
            Ok(Box::new(instance))
        });
        self.construction = Construction::Factory(Factory { params, create });
        self
    }

    /// Finish the schema
    #[must_use]
    pub fn build(self) -> TypeSchema {
        TypeSchema::new::<T>(self.name, self.members, self.construction)
    }
}

impl<T: Default + 'static> SchemaBuilder<T> {
    /// Construct instances with `T::default()` before members are assigned
    #[must_use]
    pub fn default_constructible(mut self) -> Self {
        let constructor: Constructor = Arc::new(|| -> Box<dyn Any> { Box::new(T::default()) });
        self.construction = Construction::Default(constructor);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{Person, Profile, User};

    #[test]
    fn members_keep_declaration_order() {
        let schema = User::describe();
        let names: Vec<&str> = schema.members().iter().map(Member::name).collect();
        assert_eq!(names, ["Id", "Name", "Email", "Status", "Profile", "Age"]);
    }

    #[test]
    fn value_member_reads_and_writes_through_lenses() {
        let schema = Profile::describe();
        let member = schema.member("Address").unwrap().as_value().unwrap();

        let mut profile = Profile::default();
        member
            .set(&mut profile, Value::String("Jl. Mawar".into()))
            .unwrap();
        assert_eq!(profile.address.as_deref(), Some("Jl. Mawar"));
        assert_eq!(member.get(&profile), Value::String("Jl. Mawar".into()));
    }

    #[test]
    fn setter_rejects_foreign_owner() {
        let schema = Profile::describe();
        let member = schema.member("Address").unwrap().as_value().unwrap();
        let mut other = 5u32;
        assert!(member.set(&mut other, Value::Null).is_err());
        assert_eq!(member.get(&other), Value::Null);
    }

    #[test]
    fn nested_member_navigates() {
        let schema = User::describe();
        let nested = schema.member("Profile").unwrap().as_nested().unwrap();

        let mut user = User::default();
        assert!(nested.navigate(&user).is_none());

        user.profile = Some(Profile {
            address: Some("Jl. Melati".into()),
            ..Profile::default()
        });
        let profile = nested.navigate(&user).unwrap();
        assert!(profile.downcast_ref::<Profile>().is_some());
    }

    #[test]
    fn factory_schema_is_constructible() {
        let schema = Person::describe();
        let factory = schema.factory().unwrap();
        let names: Vec<&str> = factory.params().iter().map(FactoryParam::name).collect();
        assert_eq!(names, ["name", "age"]);
        assert!(schema.is_constructible());

        let mut args = FactoryArgs::new(vec![
            ("age".to_string(), Value::I32(30)),
            ("NAME".to_string(), Value::String("Budi".into())),
        ]);
        let person = factory.create(&mut args).unwrap();
        let person = person.downcast_ref::<Person>().unwrap();
        assert_eq!(person.name(), "Budi");
        assert_eq!(person.age(), 30);
        assert!(args.is_empty());
    }

    #[test]
    fn factory_args_take_missing_fails() {
        let mut args = FactoryArgs::new(vec![("a".to_string(), Value::I32(1))]);
        assert_eq!(args.take::<i32>("A").unwrap(), 1);
        assert!(matches!(
            args.take::<i32>("a"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn abstract_schema_is_not_constructible() {
        struct Marker;
        let schema = SchemaBuilder::<Marker>::new("Marker").build();
        assert!(!schema.is_constructible());
        assert!(schema.construction().construct_default().is_none());
    }
}
