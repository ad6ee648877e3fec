//! Members of a [`TypeSchema`](crate::schema::TypeSchema).
//!
//! A member is either a *value* member, reached through a getter lens and optionally written
//! through a setter lens, or a *nested* member, which navigates to another
//! [`Mappable`](crate::schema::Mappable) object and is used to walk custom paths and to
//! flatten one level of nesting.

use std::{
    any::{type_name, Any, TypeId},
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
    sync::Arc,
};

use crate::{
    schema::{MapValue, TypeSchema, Value},
    Error, Result,
};

/// The static type of a member or factory parameter.
///
/// Two declared types are equal when they describe the same Rust type. Nullability is carried
/// along for the assignment stage, but it does not take part in comparisons: a `String` source
/// member matches an `Option<String>` destination member.
#[derive(Clone, Copy)]
pub struct DeclaredType {
    id: TypeId,
    name: &'static str,
    nullable: bool,
}

impl DeclaredType {
    /// The non-nullable declared type of `T`
    #[must_use]
    pub fn of<T: 'static>() -> Self {
        DeclaredType {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            nullable: false,
        }
    }

    /// The same type, marked as accepting absent values
    #[must_use]
    pub fn into_nullable(self) -> Self {
        DeclaredType {
            nullable: true,
            ..self
        }
    }

    /// The `TypeId` this declared type compares by
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The Rust type name
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns `true` if the member accepts [`Value::Null`]
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
}

impl PartialEq for DeclaredType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for DeclaredType {}

impl Hash for DeclaredType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "{}?", self.name)
        } else {
            f.write_str(self.name)
        }
    }
}

type Getter = Arc<dyn Fn(&dyn Any) -> Value + Send + Sync>;
type Setter = Arc<dyn Fn(&mut dyn Any, Value) -> Result<()> + Send + Sync>;

/// Type-erased getter/setter lens pair of a value member.
#[derive(Clone)]
pub struct ValueAccessor {
    owner: &'static str,
    declared: DeclaredType,
    getter: Getter,
    setter: Option<Setter>,
}

impl ValueAccessor {
    pub(crate) fn read_only<T, V, G>(get: G) -> Self
    where
        T: 'static,
        V: MapValue,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        ValueAccessor {
            owner: type_name::<T>(),
            declared: V::declared_type(),
            getter: Arc::new(move |owner: &dyn Any| match owner.downcast_ref::<T>() {
                Some(owner) => get(owner).into_value(),
                None => Value::Null,
            }),
            setter: None,
        }
    }

    pub(crate) fn read_write<T, V, G, S>(get: G, set: S) -> Self
    where
        T: 'static,
        V: MapValue,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let mut accessor = Self::read_only::<T, V, G>(get);
        let owner_name = accessor.owner;
        accessor.setter = Some(Arc::new(move |owner: &mut dyn Any, value: Value| -> Result<()> {
            let owner = owner
                .downcast_mut::<T>()
                .ok_or_else(|| Error::TypeMismatch {
                    expected: owner_name.to_string(),
                    found: "foreign owner".to_string(),
                })?;
            set(owner, V::from_value(value)?);
            Ok(())
        }));
        accessor
    }

    /// The declared type of the member
    #[must_use]
    pub fn declared_type(&self) -> DeclaredType {
        self.declared
    }

    /// Returns `true` if the member has a setter
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    /// Read the member from `owner`.
    ///
    /// Yields [`Value::Null`] if `owner` is not of the type the member was declared on.
    pub fn get(&self, owner: &dyn Any) -> Value {
        (self.getter)(owner)
    }

    /// Write `value` into the member of `owner`, coercing it into the member's Rust type.
    ///
    /// Writing to a read-only member is a no-op.
    ///
    /// # Errors
    /// Returns [`Error::TypeMismatch`] if the value can not be coerced, or if `owner` is not of
    /// the type the member was declared on.
    pub fn set(&self, owner: &mut dyn Any, value: Value) -> Result<()> {
        match &self.setter {
            Some(setter) => setter(owner, value),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for ValueAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueAccessor")
            .field("owner", &self.owner)
            .field("declared", &self.declared)
            .field("writable", &self.is_writable())
            .finish()
    }
}

/// One navigation step from an owner object to a nested object.
pub(crate) trait Navigate: Send + Sync {
    fn navigate<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Any>;
}

struct LensNavigator<T, N, F> {
    lens: F,
    _types: PhantomData<fn(&T) -> &N>,
}

impl<T, N, F> Navigate for LensNavigator<T, N, F>
where
    T: 'static,
    N: 'static,
    F: Fn(&T) -> Option<&N> + Send + Sync,
{
    fn navigate<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Any> {
        let owner = owner.downcast_ref::<T>()?;
        (self.lens)(owner).map(|nested| nested as &dyn Any)
    }
}

/// Type-erased navigation lens of a nested member.
#[derive(Clone)]
pub struct NestedAccessor {
    target: TypeId,
    target_name: &'static str,
    describe: fn() -> TypeSchema,
    navigator: Arc<dyn Navigate>,
}

impl NestedAccessor {
    pub(crate) fn new<T, N, F>(describe: fn() -> TypeSchema, lens: F) -> Self
    where
        T: 'static,
        N: 'static,
        F: Fn(&T) -> Option<&N> + Send + Sync + 'static,
    {
        NestedAccessor {
            target: TypeId::of::<N>(),
            target_name: type_name::<N>(),
            describe,
            navigator: Arc::new(LensNavigator::<T, N, F> {
                lens,
                _types: PhantomData,
            }),
        }
    }

    /// The `TypeId` of the nested type
    #[must_use]
    pub fn target_type_id(&self) -> TypeId {
        self.target
    }

    /// The Rust type name of the nested type
    #[must_use]
    pub fn target_name(&self) -> &'static str {
        self.target_name
    }

    pub(crate) fn describe_target(&self) -> fn() -> TypeSchema {
        self.describe
    }

    /// Navigate from `owner` to the nested object, `None` if it is absent
    pub fn navigate<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Any> {
        self.navigator.navigate(owner)
    }
}

impl fmt::Debug for NestedAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NestedAccessor")
            .field("target", &self.target_name)
            .finish()
    }
}

/// How a member is accessed
#[derive(Debug, Clone)]
pub enum MemberKind {
    /// A value read (and possibly written) through lenses
    Value(ValueAccessor),
    /// A navigable nested object
    Nested(NestedAccessor),
}

/// A named member of a type schema
#[derive(Debug, Clone)]
pub struct Member {
    name: String,
    kind: MemberKind,
}

impl Member {
    pub(crate) fn new(name: String, kind: MemberKind) -> Self {
        Member { name, kind }
    }

    /// The member name, as used by configurations and custom paths
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How the member is accessed
    #[must_use]
    pub fn kind(&self) -> &MemberKind {
        &self.kind
    }

    /// The value accessor, if this is a value member
    #[must_use]
    pub fn as_value(&self) -> Option<&ValueAccessor> {
        match &self.kind {
            MemberKind::Value(accessor) => Some(accessor),
            MemberKind::Nested(_) => None,
        }
    }

    /// The nested accessor, if this is a nested member
    #[must_use]
    pub fn as_nested(&self) -> Option<&NestedAccessor> {
        match &self.kind {
            MemberKind::Nested(accessor) => Some(accessor),
            MemberKind::Value(_) => None,
        }
    }

    /// Returns `true` for value members with a setter
    #[must_use]
    pub fn is_writable(&self) -> bool {
        self.as_value().is_some_and(ValueAccessor::is_writable)
    }
}
