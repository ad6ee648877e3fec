//! Statically declared type schemas.
//!
//! Types taking part in a mapping describe themselves once through the [`Mappable`] trait. The
//! resulting [`TypeSchema`] is the table the member resolver works on: an ordered list of named
//! members, each either a value reached through typed getter/setter lenses or a nested object
//! reached through a navigation lens, plus the strategy used to construct new instances.
//!
//! # Key Components
//!
//! - [`Mappable`]: Implemented by every source and destination type
//! - [`TypeSchema`]: Name, members and construction strategy of one type
//! - [`SchemaBuilder`]: Fluent registration of lenses and constructors
//! - [`Value`] / [`MapValue`]: The dynamic value carried between members
//! - [`DeclaredType`]: The static type used for exact-type matching
//! - [`SchemaCache`]: Memoizes `describe()` per type
//!
//! # Examples
//!
//! ```rust
//! use shapemap::{Mappable, TypeSchema};
//!
//! #[derive(Default)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! impl Mappable for Point {
//!     fn describe() -> TypeSchema {
//!         TypeSchema::builder::<Point>("Point")
//!             .default_constructible()
//!             .member("X", |p: &Point| p.x, |p, v| p.x = v)
//!             .member("Y", |p: &Point| p.y, |p, v| p.y = v)
//!             .build()
//!     }
//! }
//!
//! let schema = Point::describe();
//! assert_eq!(schema.name(), "Point");
//! assert!(schema.member("Y").is_some());
//! ```

mod builder;
mod member;
mod value;

use std::{
    any::TypeId,
    fmt,
    sync::Arc,
};

use dashmap::DashMap;
use tracing::trace;

pub(crate) use builder::Construction;
pub use builder::{Factory, FactoryArgs, FactoryParam, SchemaBuilder};
pub use member::{DeclaredType, Member, MemberKind, NestedAccessor, ValueAccessor};
pub use value::{CustomValue, MapValue, Value, ValueKind};

/// Reference to a `TypeSchema`
pub type SchemaRc = Arc<TypeSchema>;

/// A type that can act as the source or destination of a mapping.
///
/// The implementation is the replacement for runtime reflection: it lists every member the
/// mapper may read or write, and how the type is constructed. `describe` is called at most once
/// per type and engine, the result is cached.
pub trait Mappable: 'static {
    /// Describe the members and construction strategy of `Self`
    fn describe() -> TypeSchema;
}

/// The member table and construction strategy of one type
pub struct TypeSchema {
    name: &'static str,
    type_id: TypeId,
    members: Vec<Member>,
    construction: Construction,
}

impl TypeSchema {
    /// Start describing `T`, see [`SchemaBuilder`]
    #[must_use]
    pub fn builder<T: 'static>(name: &'static str) -> SchemaBuilder<T> {
        SchemaBuilder::new(name)
    }

    pub(crate) fn new<T: 'static>(
        name: &'static str,
        members: Vec<Member>,
        construction: Construction,
    ) -> Self {
        TypeSchema {
            name,
            type_id: TypeId::of::<T>(),
            members,
            construction,
        }
    }

    /// The display name of the type
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The `TypeId` of the described type
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// All members, in declaration order
    #[must_use]
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Look up a member by exact name; the first declared member wins on duplicates
    #[must_use]
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|member| member.name() == name)
    }

    /// Returns `true` if new instances can be created, by default construction or a factory
    #[must_use]
    pub fn is_constructible(&self) -> bool {
        !matches!(self.construction, Construction::Abstract)
    }

    /// The factory, if instances are created through one
    #[must_use]
    pub fn factory(&self) -> Option<&Factory> {
        match &self.construction {
            Construction::Factory(factory) => Some(factory),
            _ => None,
        }
    }

    pub(crate) fn construction(&self) -> &Construction {
        &self.construction
    }
}

impl fmt::Debug for TypeSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let strategy = match self.construction {
            Construction::Default(_) => "default",
            Construction::Factory(_) => "factory",
            Construction::Abstract => "abstract",
        };
        f.debug_struct("TypeSchema")
            .field("name", &self.name)
            .field("members", &self.members)
            .field("construction", &strategy)
            .finish()
    }
}

/// Memoizes [`Mappable::describe`] per type.
///
/// Lookups are lock-free for readers. The schema is produced outside of any map guard, so a
/// `describe` implementation may itself consult the cache.
#[derive(Default)]
pub struct SchemaCache {
    schemas: DashMap<TypeId, SchemaRc>,
}

impl SchemaCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        SchemaCache {
            schemas: DashMap::new(),
        }
    }

    /// The schema of `T`
    pub fn of<T: Mappable>(&self) -> SchemaRc {
        self.get_or_describe(TypeId::of::<T>(), T::describe)
    }

    /// The schema for `id`, described through `describe` on first request
    pub fn get_or_describe(&self, id: TypeId, describe: fn() -> TypeSchema) -> SchemaRc {
        if let Some(schema) = self.schemas.get(&id) {
            return schema.clone();
        }

        let schema = Arc::new(describe());
        trace!(
            name = schema.name(),
            members = schema.members().len(),
            "described type schema"
        );
        self.schemas.entry(id).or_insert(schema).clone()
    }

    /// Number of cached schemas
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Returns `true` if nothing has been described yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{Profile, User};

    #[test]
    fn cache_describes_once() {
        let cache = SchemaCache::new();
        assert!(cache.is_empty());

        let first = cache.of::<User>();
        let second = cache.of::<User>();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        cache.of::<Profile>();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn member_lookup_is_exact() {
        let schema = User::describe();
        assert!(schema.member("Name").is_some());
        assert!(schema.member("name").is_none());
        assert!(schema.member("Missing").is_none());
        assert_eq!(schema.type_id(), TypeId::of::<User>());
    }

    #[test]
    fn debug_names_construction() {
        let rendered = format!("{:?}", Profile::describe());
        assert!(rendered.contains("Profile"));
        assert!(rendered.contains("default"));
    }
}
