//! Mapping registry and dispatcher.
//!
//! The [`MappingEngine`] owns every piece of per-pair state: user-registered mapping functions,
//! stored configurations, compiled mappings and abstract-to-concrete redirections. A mapping
//! request is routed to the custom function of its pair if one exists, else to the compiled
//! mapping, which is built and cached on first use.
//!
//! # Pair Lifecycle
//!
//! ```text
//! Unconfigured --configure--> Configured --map/compile--> Compiled
//!       \                         |                           |
//!        `-------register---------+------------register-----> Custom
//! ```
//!
//! A compiled mapping is never invalidated. Configuring a pair after it was compiled has no
//! effect on the cached mapping, so configuration belongs at startup, before the first `map`.
//!
//! # Thread Safety
//!
//! All maps are `DashMap`s and every operation takes `&self`, so one engine can be shared
//! between threads. No map guard is held while user code runs, which allows hooks, converters
//! and custom functions to call back into the engine.
//!
//! # Examples
//!
//! ```rust
//! use shapemap::{Mappable, MappingEngine, TypeSchema};
//!
//! #[derive(Default)]
//! struct User {
//!     name: Option<String>,
//!     email: Option<String>,
//! }
//!
//! #[derive(Default)]
//! struct UserDto {
//!     name: Option<String>,
//!     email: Option<String>,
//! }
//!
//! impl Mappable for User {
//!     fn describe() -> TypeSchema {
//!         TypeSchema::builder::<User>("User")
//!             .default_constructible()
//!             .member("Name", |u: &User| u.name.clone(), |u, v| u.name = v)
//!             .member("Email", |u: &User| u.email.clone(), |u, v| u.email = v)
//!             .build()
//!     }
//! }
//!
//! impl Mappable for UserDto {
//!     fn describe() -> TypeSchema {
//!         TypeSchema::builder::<UserDto>("UserDto")
//!             .default_constructible()
//!             .member("Name", |d: &UserDto| d.name.clone(), |d, v| d.name = v)
//!             .member("Email", |d: &UserDto| d.email.clone(), |d, v| d.email = v)
//!             .build()
//!     }
//! }
//!
//! let engine = MappingEngine::new();
//! engine.configure::<User, UserDto, _>(|cfg| {
//!     cfg.for_member("Email", |o| {
//!         o.null_substitute("none@x".to_string());
//!     });
//! })?;
//!
//! let user = User { name: Some("ali".into()), email: None };
//! let dto: UserDto = engine.map(&user)?;
//! assert_eq!(dto.name.as_deref(), Some("ali"));
//! assert_eq!(dto.email.as_deref(), Some("none@x"));
//! # Ok::<(), shapemap::Error>(())
//! ```

use std::{
    any::{type_name, Any, TypeId},
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use dashmap::DashMap;
use strum::Display;
use tracing::{debug, trace, warn};

use crate::{
    config::MapperConfig,
    mapping::{
        configuration::ConfigurationShape, CompiledMapping, MapDeclaration, MappingBuilder,
        MappingProfile, PairRules, TypePairConfiguration,
    },
    schema::{Mappable, SchemaCache, TypeSchema},
    Error, Result,
};

type CustomFn = Arc<dyn Fn(&dyn Any) -> Result<Box<dyn Any>> + Send + Sync>;
type UpcastFn = Arc<dyn Fn(Box<dyn Any>) -> Option<Box<dyn Any>> + Send + Sync>;

/// The `(Source, Destination)` key of every per-pair registry entry.
///
/// Equality and hashing use the `TypeId`s only; the names are carried for diagnostics.
#[derive(Clone, Copy)]
pub struct TypePair {
    source: TypeId,
    source_name: &'static str,
    destination: TypeId,
    destination_name: &'static str,
}

impl TypePair {
    /// The pair `S -> D`
    #[must_use]
    pub fn of<S: ?Sized + 'static, D: ?Sized + 'static>() -> Self {
        TypePair {
            source: TypeId::of::<S>(),
            source_name: type_name::<S>(),
            destination: TypeId::of::<D>(),
            destination_name: type_name::<D>(),
        }
    }

    /// The `TypeId` of the source type
    #[must_use]
    pub fn source_id(&self) -> TypeId {
        self.source
    }

    /// The `TypeId` of the destination type
    #[must_use]
    pub fn destination_id(&self) -> TypeId {
        self.destination
    }

    /// The Rust name of the source type
    #[must_use]
    pub fn source_name(&self) -> &'static str {
        self.source_name
    }

    /// The Rust name of the destination type
    #[must_use]
    pub fn destination_name(&self) -> &'static str {
        self.destination_name
    }

    /// The swapped pair `D -> S`
    #[must_use]
    pub fn reversed(&self) -> Self {
        TypePair {
            source: self.destination,
            source_name: self.destination_name,
            destination: self.source,
            destination_name: self.source_name,
        }
    }
}

impl PartialEq for TypePair {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.destination == other.destination
    }
}

impl Eq for TypePair {}

impl Hash for TypePair {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source.hash(state);
        self.destination.hash(state);
    }
}

impl fmt::Display for TypePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source_name, self.destination_name)
    }
}

impl fmt::Debug for TypePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Lifecycle position of a type pair in a [`MappingEngine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum PairState {
    /// Nothing is known about the pair yet
    Unconfigured,
    /// A user function is registered and takes precedence over everything else
    Custom,
    /// A configuration is stored, no mapping has been built
    Configured,
    /// A mapping has been built and cached
    Compiled,
}

/// Redirection target of an abstract type
#[derive(Clone)]
struct AbstractTarget {
    concrete: TypeId,
    concrete_name: &'static str,
    describe: fn() -> TypeSchema,
    upcast: UpcastFn,
}

/// Registry and dispatcher for object-to-object mappings.
///
/// Typically one engine is created at startup, configured, and shared for the lifetime of the
/// process. Requests for a pair are served by its registered function if one exists, else by
/// its compiled mapping, which is built from the stored configuration on first use.
pub struct MappingEngine {
    config: MapperConfig,
    schemas: SchemaCache,
    custom: DashMap<TypePair, CustomFn>,
    compiled: DashMap<TypePair, Arc<CompiledMapping>>,
    configurations: DashMap<TypePair, Arc<dyn ConfigurationShape>>,
    abstracts: DashMap<TypeId, AbstractTarget>,
}

impl MappingEngine {
    /// Create an engine with the default [`MapperConfig`]
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MapperConfig::default())
    }

    /// Create an engine with `config`
    #[must_use]
    pub fn with_config(config: MapperConfig) -> Self {
        MappingEngine {
            config,
            schemas: SchemaCache::new(),
            custom: DashMap::new(),
            compiled: DashMap::new(),
            configurations: DashMap::new(),
            abstracts: DashMap::new(),
        }
    }

    /// The active configuration
    #[must_use]
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// The schema cache shared by all pairs of this engine
    #[must_use]
    pub fn schemas(&self) -> &SchemaCache {
        &self.schemas
    }

    /// Map `source` into a new `D`
    ///
    /// # Errors
    /// Returns [`Error::NotConstructible`] if `D` has neither a default constructor nor a
    /// factory, [`Error::UnresolvedParameter`] if a factory argument can not be supplied,
    /// [`Error::TypeMismatch`] if a value can not be coerced into its destination member and,
    /// in strict mode, [`Error::UnresolvedMember`].
    pub fn map<S: Mappable, D: Mappable>(&self, source: &S) -> Result<D> {
        let output = self.dispatch(
            TypePair::of::<S, D>(),
            source,
            S::describe,
            D::describe,
        )?;
        output
            .downcast::<D>()
            .map(|destination| *destination)
            .map_err(|_| Error::TypeMismatch {
                expected: type_name::<D>().to_string(),
                found: "foreign mapping output".to_string(),
            })
    }

    /// Map an optional source, failing if it is absent
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if `source` is `None`; otherwise the errors of
    /// [`MappingEngine::map`]. No partial destination is produced.
    pub fn map_option<S: Mappable, D: Mappable>(&self, source: Option<&S>) -> Result<D> {
        match source {
            Some(source) => self.map(source),
            None => Err(Error::InvalidArgument(format!(
                "source object of {} cannot be absent",
                TypePair::of::<S, D>()
            ))),
        }
    }

    fn dispatch(
        &self,
        pair: TypePair,
        source: &dyn Any,
        describe_source: fn() -> TypeSchema,
        describe_destination: fn() -> TypeSchema,
    ) -> Result<Box<dyn Any>> {
        let custom = self.custom.get(&pair).map(|entry| Arc::clone(entry.value()));
        if let Some(custom) = custom {
            trace!(pair = %pair, "custom mapping");
            return custom(source);
        }

        let cached = self.compiled.get(&pair).map(|entry| Arc::clone(entry.value()));
        let compiled = match cached {
            Some(compiled) => compiled,
            None => self.build(pair, describe_source, describe_destination)?,
        };
        compiled.invoke(source)
    }

    fn build(
        &self,
        pair: TypePair,
        describe_source: fn() -> TypeSchema,
        describe_destination: fn() -> TypeSchema,
    ) -> Result<Arc<CompiledMapping>> {
        let source = self.schemas.get_or_describe(pair.source_id(), describe_source);
        let destination = self
            .schemas
            .get_or_describe(pair.destination_id(), describe_destination);
        let rules = self
            .configurations
            .get(&pair)
            .map(|entry| entry.value().rules().clone())
            .unwrap_or_default();

        let compiled = MappingBuilder::new(&self.schemas, pair, source, destination)
            .with_rules(rules)
            .with_config(self.config)
            .build()?;

        Ok(self
            .compiled
            .entry(pair)
            .or_insert_with(|| Arc::new(compiled))
            .clone())
    }

    /// Register a user function for `S -> D`; it takes precedence over any configuration
    pub fn register<S, D, F>(&self, map: F)
    where
        S: Mappable,
        D: Mappable,
        F: Fn(&S) -> D + Send + Sync + 'static,
    {
        let pair = TypePair::of::<S, D>();
        let erased: CustomFn = Arc::new(move |source: &dyn Any| -> Result<Box<dyn Any>> {
            let source = source
                .downcast_ref::<S>()
                .ok_or_else(|| Error::TypeMismatch {
                    expected: type_name::<S>().to_string(),
                    found: "foreign source".to_string(),
                })?;
            Ok(Box::new(map(source)))
        });
        self.custom.insert(pair, erased);
        debug!(pair = %pair, "registered custom mapping");
    }

    /// Register user functions for both `S -> D` and `D -> S`
    pub fn register_bidirectional<S, D, F, R>(&self, forward: F, reverse: R)
    where
        S: Mappable,
        D: Mappable,
        F: Fn(&S) -> D + Send + Sync + 'static,
        R: Fn(&D) -> S + Send + Sync + 'static,
    {
        self.register(forward);
        self.register(reverse);
    }

    /// Redirect the abstract type `A` to the concrete type `C`.
    ///
    /// `A` is usually a trait object type; `upcast` turns a mapped `C` into it.
    ///
    /// ## Arguments
    /// * 'upcast' - Conversion from the concrete to the abstract type
    pub fn register_abstract<A, C>(&self, upcast: fn(C) -> Box<A>)
    where
        A: ?Sized + 'static,
        C: Mappable,
    {
        let erased: UpcastFn = Arc::new(move |concrete: Box<dyn Any>| -> Option<Box<dyn Any>> {
            let concrete = concrete.downcast::<C>().ok()?;
            let abstracted: Box<A> = upcast(*concrete);
            Some(Box::new(abstracted))
        });
        self.abstracts.insert(
            TypeId::of::<A>(),
            AbstractTarget {
                concrete: TypeId::of::<C>(),
                concrete_name: type_name::<C>(),
                describe: C::describe,
                upcast: erased,
            },
        );
        debug!(
            abstract_type = type_name::<A>(),
            concrete = type_name::<C>(),
            "registered abstract type"
        );
    }

    /// The name of the concrete type registered for `A`
    #[must_use]
    pub fn concrete_type_name<A: ?Sized + 'static>(&self) -> Option<&'static str> {
        self.abstracts
            .get(&TypeId::of::<A>())
            .map(|entry| entry.value().concrete_name)
    }

    /// Map `source` into the concrete type registered for `A`, returned as `Box<A>`
    ///
    /// # Errors
    /// Returns [`Error::AbstractNotRegistered`] if no concrete type is registered for `A`;
    /// otherwise the errors of [`MappingEngine::map`] for the concrete pair.
    pub fn map_abstract<S: Mappable, A: ?Sized + 'static>(&self, source: &S) -> Result<Box<A>> {
        let target = self
            .abstracts
            .get(&TypeId::of::<A>())
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::AbstractNotRegistered(type_name::<A>().to_string()))?;

        let pair = TypePair {
            source: TypeId::of::<S>(),
            source_name: type_name::<S>(),
            destination: target.concrete,
            destination_name: target.concrete_name,
        };
        let concrete = self.dispatch(pair, source, S::describe, target.describe)?;

        (target.upcast)(concrete)
            .and_then(|abstracted| abstracted.downcast::<Box<A>>().ok())
            .map(|abstracted| *abstracted)
            .ok_or_else(|| Error::TypeMismatch {
                expected: target.concrete_name.to_string(),
                found: "foreign mapping output".to_string(),
            })
    }

    /// Create or replace the configuration of `S -> D`.
    ///
    /// `configure` receives an empty configuration; the result replaces any stored one as a
    /// whole. An already compiled mapping of the pair is not affected.
    ///
    /// # Errors
    /// Returns [`Error::UnresolvedParameter`] if `D` is built through a factory whose parameters
    /// can not all be wired to members of `S` (only when
    /// [`MapperConfig::validate_factories`] is enabled). Nothing is stored in that case.
    pub fn configure<S, D, F>(&self, configure: F) -> Result<()>
    where
        S: Mappable,
        D: Mappable,
        F: FnOnce(&mut TypePairConfiguration<S, D>),
    {
        let pair = TypePair::of::<S, D>();
        if self.config.validate_factories {
            MappingBuilder::new(
                &self.schemas,
                pair,
                self.schemas.of::<S>(),
                self.schemas.of::<D>(),
            )
            .check_factory()?;
        }

        let mut configuration = TypePairConfiguration::new();
        configure(&mut configuration);

        if self.compiled.contains_key(&pair) {
            warn!(
                pair = %pair,
                "pair is already compiled, the new configuration does not affect it"
            );
        }
        self.configurations.insert(pair, Arc::new(configuration));
        Ok(())
    }

    /// Store `configuration` directly, bypassing [`MappingEngine::configure`]
    pub(crate) fn install_configuration<S: 'static, D: 'static>(
        &self,
        configuration: TypePairConfiguration<S, D>,
    ) {
        let pair = TypePair::of::<S, D>();
        debug!(
            pair = %pair,
            members = configuration.rules().len(),
            "installed reverse configuration"
        );
        self.configurations.insert(pair, Arc::new(configuration));
    }

    /// Configure `S -> D` from an attribute-style declaration
    ///
    /// # Errors
    /// See [`MappingEngine::configure`].
    pub fn apply_declaration<S: Mappable, D: Mappable>(
        &self,
        declaration: MapDeclaration<S, D>,
    ) -> Result<()> {
        self.configure::<S, D, _>(|configuration| declaration.apply_to(configuration))
    }

    /// Apply one mapping profile
    ///
    /// # Errors
    /// Returns the first error reported by the profile.
    pub fn add_profile(&self, profile: &dyn MappingProfile) -> Result<()> {
        debug!(profile = profile.name(), "applying mapping profile");
        profile.configure(self)
    }

    /// Apply several mapping profiles in order, stopping at the first error
    ///
    /// # Errors
    /// Returns the first error reported by a profile.
    pub fn add_profiles(&self, profiles: &[&dyn MappingProfile]) -> Result<()> {
        profiles
            .iter()
            .try_for_each(|profile| self.add_profile(*profile))
    }

    /// A copy of the stored rules of `S -> D`
    #[must_use]
    pub fn rules<S: 'static, D: 'static>(&self) -> Option<PairRules> {
        self.configurations
            .get(&TypePair::of::<S, D>())
            .map(|entry| entry.value().rules().clone())
    }

    /// Check that every stored configuration belongs to the pair it is stored under
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfiguration`] naming the first offending pair.
    pub fn assert_configuration_is_valid(&self) -> Result<()> {
        for entry in &self.configurations {
            let pair = entry.key();
            if entry.value().shape() != (pair.source_id(), pair.destination_id()) {
                warn!(pair = %pair, "configuration stored under a foreign pair");
                return Err(Error::InvalidConfiguration {
                    source_type: pair.source_name().to_string(),
                    destination_type: pair.destination_name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// The lifecycle position of `S -> D`
    #[must_use]
    pub fn state<S: 'static, D: 'static>(&self) -> PairState {
        let pair = TypePair::of::<S, D>();
        if self.custom.contains_key(&pair) {
            PairState::Custom
        } else if self.compiled.contains_key(&pair) {
            PairState::Compiled
        } else if self.configurations.contains_key(&pair) {
            PairState::Configured
        } else {
            PairState::Unconfigured
        }
    }

    /// Build and cache `S -> D` ahead of its first use
    ///
    /// # Errors
    /// Returns the build errors of [`MappingEngine::map`].
    pub fn compile<S: Mappable, D: Mappable>(&self) -> Result<()> {
        let pair = TypePair::of::<S, D>();
        if !self.compiled.contains_key(&pair) {
            self.build(pair, S::describe, D::describe)?;
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn insert_raw_configuration(
        &self,
        pair: TypePair,
        configuration: Arc<dyn ConfigurationShape>,
    ) {
        self.configurations.insert(pair, configuration);
    }
}

impl Default for MappingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MappingEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingEngine")
            .field("config", &self.config)
            .field("schemas", &self.schemas.len())
            .field("custom", &self.custom.len())
            .field("compiled", &self.compiled.len())
            .field("configurations", &self.configurations.len())
            .field("abstracts", &self.abstracts.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{Account, Person, Status, User, UserDto};

    #[test]
    fn type_pair_compares_by_ids() {
        let pair = TypePair::of::<User, UserDto>();
        assert_eq!(pair, TypePair::of::<User, UserDto>());
        assert_ne!(pair, pair.reversed());
        assert_eq!(pair.reversed().reversed(), pair);
        assert!(pair.to_string().contains(" -> "));
    }

    #[test]
    fn state_machine() {
        let engine = MappingEngine::new();
        assert_eq!(engine.state::<User, UserDto>(), PairState::Unconfigured);

        engine.configure::<User, UserDto, _>(|_| {}).unwrap();
        assert_eq!(engine.state::<User, UserDto>(), PairState::Configured);

        engine.compile::<User, UserDto>().unwrap();
        assert_eq!(engine.state::<User, UserDto>(), PairState::Compiled);

        engine.register(|u: &User| UserDto {
            id: u.id + 1,
            ..UserDto::default()
        });
        assert_eq!(engine.state::<User, UserDto>(), PairState::Custom);

        let dto: UserDto = engine.map(&User::sample()).unwrap();
        assert_eq!(dto.id, 8);
    }

    #[test]
    fn configure_after_compile_keeps_cached_behaviour() {
        let engine = MappingEngine::new();
        let first: UserDto = engine.map(&User::sample()).unwrap();
        assert_eq!(first.email, None);

        engine
            .configure::<User, UserDto, _>(|c| {
                c.for_member("Email", |o| {
                    o.null_substitute("late@x".to_string());
                });
            })
            .unwrap();
        let second: UserDto = engine.map(&User::sample()).unwrap();
        assert_eq!(second.email, None);
    }

    #[test]
    fn failed_builds_are_not_cached() {
        let engine = MappingEngine::with_config(MapperConfig::strict());
        assert!(engine.map::<User, UserDto>(&User::sample()).is_err());
        assert_eq!(engine.state::<User, UserDto>(), PairState::Unconfigured);

        engine
            .configure::<User, UserDto, _>(|c| {
                c.ignore("IsActive").for_member("Status", |o| {
                    o.convert_using(|s: Status| s as i32);
                });
            })
            .unwrap();
        let dto: UserDto = engine.map(&User::sample()).unwrap();
        assert_eq!(dto.status, Status::Active as i32);
    }

    #[test]
    fn map_option_rejects_absent_source() {
        let engine = MappingEngine::new();
        let result = engine.map_option::<User, UserDto>(None);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert!(engine.map_option::<User, UserDto>(Some(&User::sample())).is_ok());
    }

    #[test]
    fn configure_validates_factory_wiring() {
        let engine = MappingEngine::new();
        assert!(engine.configure::<User, Person, _>(|_| {}).is_ok());
        assert!(matches!(
            engine.configure::<Account, Person, _>(|_| {}),
            Err(Error::UnresolvedParameter { .. })
        ));
        assert_eq!(engine.state::<Account, Person>(), PairState::Unconfigured);

        let lenient = MappingEngine::with_config(MapperConfig {
            validate_factories: false,
            ..MapperConfig::default()
        });
        assert!(lenient.configure::<Account, Person, _>(|_| {}).is_ok());
    }

    #[test]
    fn validator_detects_foreign_configuration() {
        let engine = MappingEngine::new();
        engine.configure::<User, UserDto, _>(|_| {}).unwrap();
        assert!(engine.assert_configuration_is_valid().is_ok());

        engine.insert_raw_configuration(
            TypePair::of::<UserDto, User>(),
            Arc::new(TypePairConfiguration::<User, UserDto>::new()),
        );
        assert!(matches!(
            engine.assert_configuration_is_valid(),
            Err(Error::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn reverse_map_installs_swapped_rules() {
        let engine = MappingEngine::new();
        engine
            .configure::<User, UserDto, _>(|c| {
                c.for_member("Name", |o| {
                    o.null_substitute("Anonymous".to_string()).map_from("Email");
                });
                c.reverse_map(&engine);
            })
            .unwrap();

        assert_eq!(engine.state::<UserDto, User>(), PairState::Configured);
        let rules = engine.rules::<UserDto, User>().unwrap();
        let name = rules.member("Name").unwrap();
        assert!(name.null_substitute().is_some());
        assert!(name.custom_path().is_none());
    }

    #[test]
    fn reverse_map_edits_reach_the_engine() {
        let engine = MappingEngine::new();
        engine
            .configure::<User, UserDto, _>(|c| {
                c.for_member("Email", |o| {
                    o.null_substitute("none".to_string());
                });
                let mut reverse = c.reverse_map(&engine);
                reverse.ignore("Name");
                reverse.after_map(|_, user| user.age = -1);
            })
            .unwrap();

        let rules = engine.rules::<UserDto, User>().unwrap();
        assert!(rules.member("Name").unwrap().is_ignored());
        assert!(rules.member("Email").unwrap().null_substitute().is_some());
        assert!(rules.has_after_map());

        let user: User = engine.map(&UserDto::default()).unwrap();
        assert_eq!(user.name, None);
        assert_eq!(user.age, -1);
    }
}
