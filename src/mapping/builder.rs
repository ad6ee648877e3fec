//! Construction of reusable mapping functions.
//!
//! The [`MappingBuilder`] consumes the [`MemberResolver`]'s decisions for one type pair and
//! produces a [`CompiledMapping`]. Building happens once per pair; invoking the result happens
//! once per mapped object and performs no further resolution.
//!
//! # Staging
//!
//! A destination with a default constructor is mapped in two stages:
//!
//! - **Fast path**: construct the destination and assign every resolved member that has no
//!   condition. A converter takes precedence over a null-substitute.
//! - **Runtime overlay**: run the before-map hook, then evaluate the condition of every
//!   conditional member and, if it holds, read, convert, substitute and assign the value; finally
//!   run the after-map hook.
//!
//! A destination with a factory is created directly from the wired parameters, without member
//! assignment and without the overlay.

use std::{any::Any, fmt};

use tracing::{debug, trace};

use crate::{
    config::MapperConfig,
    mapping::{
        configuration::{HookFn, PairRules},
        MemberResolver, MemberRules, Resolution, TypePair, ValuePath,
    },
    schema::{
        Construction, Factory, FactoryArgs, SchemaCache, SchemaRc, Value, ValueAccessor,
    },
    Error, Result,
};

/// One unconditional member assignment of the fast path
struct Assignment {
    member: String,
    setter: ValueAccessor,
    path: ValuePath,
    rules: MemberRules,
}

impl Assignment {
    fn apply(&self, source: &dyn Any, destination: &mut dyn Any) -> Result<()> {
        let raw = self.path.evaluate(source);
        let value = match (self.rules.converter(), self.rules.null_substitute()) {
            (Some(converter), _) => {
                if raw.is_null() && !converter.input_type().is_nullable() {
                    Value::Null
                } else {
                    converter.convert(raw)?
                }
            }
            (None, Some(substitute)) if raw.is_null() => substitute.clone(),
            _ => raw,
        };
        assign(&self.setter, destination, value)
    }
}

/// One member whose assignment is decided per invocation
struct ConditionalMember {
    member: String,
    setter: ValueAccessor,
    path: Option<ValuePath>,
    rules: MemberRules,
}

impl ConditionalMember {
    fn apply(&self, source: &dyn Any, destination: &mut dyn Any) -> Result<()> {
        if !self.rules.passes(source, &*destination) {
            trace!(member = %self.member, "condition not met");
            return Ok(());
        }

        let mut value = self
            .path
            .as_ref()
            .map_or(Value::Null, |path| path.evaluate(source));
        if let Some(converter) = self.rules.converter() {
            if !value.is_null() {
                value = converter.convert(value)?;
            }
        }
        if value.is_null() {
            if let Some(substitute) = self.rules.null_substitute() {
                value = substitute.clone();
            }
        }
        assign(&self.setter, destination, value)
    }
}

/// Null never overwrites a member that can not hold it
fn assign(setter: &ValueAccessor, destination: &mut dyn Any, value: Value) -> Result<()> {
    if value.is_null() && !setter.declared_type().is_nullable() {
        return Ok(());
    }
    setter.set(destination, value)
}

enum Strategy {
    Initializer {
        construction: Construction,
        assignments: Vec<Assignment>,
        conditionals: Vec<ConditionalMember>,
        before: Option<HookFn>,
        after: Option<HookFn>,
    },
    Factory {
        factory: Factory,
        params: Vec<(String, ValuePath)>,
    },
}

/// A built mapping function for one type pair
pub struct CompiledMapping {
    pair: TypePair,
    strategy: Strategy,
}

impl CompiledMapping {
    /// The type pair this mapping was built for
    #[must_use]
    pub fn pair(&self) -> &TypePair {
        &self.pair
    }

    /// Returns `true` if the destination is created through a factory
    #[must_use]
    pub fn uses_factory(&self) -> bool {
        matches!(self.strategy, Strategy::Factory { .. })
    }

    /// Destination members assigned on the fast path
    pub fn assigned_members(&self) -> impl Iterator<Item = &str> {
        let assignments: &[Assignment] = match &self.strategy {
            Strategy::Initializer { assignments, .. } => assignments,
            Strategy::Factory { .. } => &[],
        };
        assignments.iter().map(|a| a.member.as_str())
    }

    /// Destination members evaluated by the runtime overlay
    pub fn conditional_members(&self) -> impl Iterator<Item = &str> {
        let conditionals: &[ConditionalMember] = match &self.strategy {
            Strategy::Initializer { conditionals, .. } => conditionals,
            Strategy::Factory { .. } => &[],
        };
        conditionals.iter().map(|c| c.member.as_str())
    }

    /// Map `source` into a new destination instance
    ///
    /// # Errors
    /// Returns [`Error::UnresolvedParameter`] if a factory argument is absent in `source`, and
    /// [`Error::TypeMismatch`] if a value can not be coerced into its destination member, or
    /// `source` is not of the pair's source type.
    pub fn invoke(&self, source: &dyn Any) -> Result<Box<dyn Any>> {
        if source.type_id() != self.pair.source_id() {
            return Err(Error::TypeMismatch {
                expected: self.pair.source_name().to_string(),
                found: "foreign source".to_string(),
            });
        }

        match &self.strategy {
            Strategy::Initializer {
                construction,
                assignments,
                conditionals,
                before,
                after,
            } => {
                let mut destination = construction
                    .construct_default()
                    .ok_or_else(|| Error::NotConstructible(self.pair.destination_name().into()))?;

                for assignment in assignments {
                    assignment.apply(source, &mut *destination)?;
                }

                if let Some(hook) = before {
                    hook(source, &mut *destination);
                }
                for conditional in conditionals {
                    conditional.apply(source, &mut *destination)?;
                }
                if let Some(hook) = after {
                    hook(source, &mut *destination);
                }

                Ok(destination)
            }
            Strategy::Factory { factory, params } => {
                let mut values = Vec::with_capacity(params.len());
                for (name, path) in params {
                    let value = path.evaluate(source);
                    if value.is_null() {
                        return Err(unresolved_parameter!(self.pair, name));
                    }
                    values.push((name.clone(), value));
                }
                factory.create(&mut FactoryArgs::new(values))
            }
        }
    }
}

impl fmt::Debug for CompiledMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledMapping")
            .field("pair", &self.pair)
            .field("factory", &self.uses_factory())
            .field("assigned", &self.assigned_members().collect::<Vec<_>>())
            .field("conditional", &self.conditional_members().collect::<Vec<_>>())
            .finish()
    }
}

/// Provides a fluent API for building a [`CompiledMapping`]
pub struct MappingBuilder<'a> {
    schemas: &'a SchemaCache,
    pair: TypePair,
    source: SchemaRc,
    destination: SchemaRc,
    rules: PairRules,
    config: MapperConfig,
}

impl<'a> MappingBuilder<'a> {
    /// Create a new builder without member rules, using the default configuration
    ///
    /// ## Arguments
    /// * 'schemas'     - Cache used to describe nested source types
    /// * 'pair'        - The type pair to build
    /// * 'source'      - Schema of the source type
    /// * 'destination' - Schema of the destination type
    pub fn new(
        schemas: &'a SchemaCache,
        pair: TypePair,
        source: SchemaRc,
        destination: SchemaRc,
    ) -> Self {
        MappingBuilder {
            schemas,
            pair,
            source,
            destination,
            rules: PairRules::default(),
            config: MapperConfig::default(),
        }
    }

    /// Use the member rules and hooks of a type pair configuration
    #[must_use]
    pub fn with_rules(mut self, rules: PairRules) -> Self {
        self.rules = rules;
        self
    }

    /// Use `config` for flattening and strictness
    #[must_use]
    pub fn with_config(mut self, config: MapperConfig) -> Self {
        self.config = config;
        self
    }

    /// Verify that every factory parameter of the destination can be wired to the source.
    ///
    /// Destinations without a factory always pass.
    ///
    /// # Errors
    /// Returns [`Error::UnresolvedParameter`] naming the first parameter without a source member.
    pub fn check_factory(&self) -> Result<()> {
        match self.destination.factory() {
            Some(factory) => self.wire_factory(factory).map(|_| ()),
            None => Ok(()),
        }
    }

    fn wire_factory(&self, factory: &Factory) -> Result<Vec<(String, ValuePath)>> {
        let resolver = MemberResolver::new(self.schemas, self.source.clone());
        factory
            .params()
            .iter()
            .map(|param| {
                resolver
                    .resolve_parameter(param)
                    .map(|path| (param.name().to_string(), path))
                    .ok_or_else(|| unresolved_parameter!(self.pair, param.name()))
            })
            .collect()
    }

    /// Build the mapping
    ///
    /// # Errors
    /// Returns [`Error::NotConstructible`] for abstract destinations,
    /// [`Error::UnresolvedParameter`] for factory parameters without a source member and, in
    /// strict mode, [`Error::UnresolvedMember`] for writable members without a value source.
    pub fn build(self) -> Result<CompiledMapping> {
        let strategy = match self.destination.construction() {
            Construction::Abstract => {
                return Err(Error::NotConstructible(self.destination.name().to_string()))
            }
            Construction::Factory(factory) => Strategy::Factory {
                params: self.wire_factory(factory)?,
                factory: factory.clone(),
            },
            Construction::Default(_) => self.build_initializer()?,
        };

        let compiled = CompiledMapping {
            pair: self.pair,
            strategy,
        };
        debug!(
            pair = %compiled.pair,
            factory = compiled.uses_factory(),
            assigned = compiled.assigned_members().count(),
            conditional = compiled.conditional_members().count(),
            "compiled mapping"
        );
        Ok(compiled)
    }

    fn build_initializer(&self) -> Result<Strategy> {
        let resolver = MemberResolver::new(self.schemas, self.source.clone())
            .with_flatten(self.config.flatten);

        let mut assignments = Vec::new();
        let mut conditionals = Vec::new();

        for member in self.destination.members() {
            let Some(setter) = member.as_value().filter(|accessor| accessor.is_writable()) else {
                continue;
            };
            let rules = self.rules.member(member.name());

            let resolution = resolver.resolve(member, rules);
            if matches!(resolution, Resolution::Ignored) {
                continue;
            }

            if let Some(rules) = rules.filter(|rules| rules.has_condition()) {
                let path = match rules.custom_path() {
                    Some(path) => resolver.resolve_custom_path(path),
                    None => resolver.resolve_by_name(member.name()),
                };
                if path.is_none() {
                    self.report_unresolved(member.name())?;
                }
                conditionals.push(ConditionalMember {
                    member: member.name().to_string(),
                    setter: setter.clone(),
                    path,
                    rules: rules.clone(),
                });
                continue;
            }

            match resolution {
                Resolution::Path(path) => assignments.push(Assignment {
                    member: member.name().to_string(),
                    setter: setter.clone(),
                    path,
                    rules: rules.cloned().unwrap_or_default(),
                }),
                Resolution::Unresolved => self.report_unresolved(member.name())?,
                Resolution::Ignored => {}
            }
        }

        Ok(Strategy::Initializer {
            construction: self.destination.construction().clone(),
            assignments,
            conditionals,
            before: self.rules.before_map().cloned(),
            after: self.rules.after_map().cloned(),
        })
    }

    fn report_unresolved(&self, member: &str) -> Result<()> {
        if self.config.strict_members {
            return Err(Error::UnresolvedMember {
                pair: self.pair.to_string(),
                member: member.to_string(),
            });
        }
        debug!(pair = %self.pair, member, "destination member left unassigned");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mapping::TypePairConfiguration,
        test::{Account, Person, Status, User, UserDto},
    };

    fn build(
        schemas: &SchemaCache,
        configure: impl FnOnce(&mut TypePairConfiguration<User, UserDto>),
        config: MapperConfig,
    ) -> Result<CompiledMapping> {
        let mut configuration = TypePairConfiguration::new();
        configure(&mut configuration);
        MappingBuilder::new(
            schemas,
            TypePair::of::<User, UserDto>(),
            schemas.of::<User>(),
            schemas.of::<UserDto>(),
        )
        .with_rules(configuration.rules().clone())
        .with_config(config)
        .build()
    }

    fn dto(compiled: &CompiledMapping, user: &User) -> UserDto {
        *compiled.invoke(user).unwrap().downcast::<UserDto>().unwrap()
    }

    #[test]
    fn fast_path_assigns_exact_and_flattened_members() {
        let schemas = SchemaCache::new();
        let compiled = build(&schemas, |_| {}, MapperConfig::default()).unwrap();

        let assigned: Vec<&str> = compiled.assigned_members().collect();
        assert_eq!(assigned, ["Id", "Name", "Email", "City", "Age"]);
        assert_eq!(compiled.conditional_members().count(), 0);

        let result = dto(&compiled, &User::sample());
        assert_eq!(result.id, 7);
        assert_eq!(result.name.as_deref(), Some("ali"));
        assert_eq!(result.city.as_deref(), Some("Bandung"));
        assert_eq!(result.status, 0);
    }

    #[test]
    fn converter_beats_null_substitute() {
        let schemas = SchemaCache::new();
        let compiled = build(
            &schemas,
            |c| {
                c.for_member("Name", |o| {
                    o.null_substitute("fallback".to_string())
                        .convert_using(|v: Option<String>| v.map(|s| s.to_uppercase()));
                });
            },
            MapperConfig::default(),
        )
        .unwrap();

        let mut user = User::sample();
        assert_eq!(dto(&compiled, &user).name.as_deref(), Some("ALI"));
        user.name = None;
        assert_eq!(dto(&compiled, &user).name, None);
    }

    #[test]
    fn non_nullable_converter_input_skips_null() {
        let schemas = SchemaCache::new();
        let compiled = build(
            &schemas,
            |c| {
                c.for_member("Email", |o| {
                    o.convert_using(|v: String| format!("<{v}>"));
                });
            },
            MapperConfig::default(),
        )
        .unwrap();

        let user = User::sample();
        assert_eq!(dto(&compiled, &user).email, None);
    }

    #[test]
    fn conditional_members_are_deferred() {
        let schemas = SchemaCache::new();
        let compiled = build(
            &schemas,
            |c| {
                c.for_member("IsActive", |o| {
                    o.map_from("Status")
                        .condition(|src, _| src.status == Status::Active)
                        .convert_using(|s: Status| s == Status::Active);
                });
            },
            MapperConfig::default(),
        )
        .unwrap();

        assert_eq!(compiled.conditional_members().collect::<Vec<_>>(), ["IsActive"]);

        let mut user = User::sample();
        assert!(dto(&compiled, &user).is_active);
        user.status = Status::Inactive;
        assert!(!dto(&compiled, &user).is_active);
    }

    #[test]
    fn hooks_frame_the_overlay() {
        let schemas = SchemaCache::new();
        let compiled = build(
            &schemas,
            |c| {
                c.before_map(|_, d| d.age = 1)
                    .for_member("Age", |o| {
                        o.condition(|_, d| d.age == 1);
                    })
                    .after_map(|_, d| d.age += 1000);
            },
            MapperConfig::default(),
        )
        .unwrap();

        // before sets 1, condition sees it and copies 30, after adds 1000
        assert_eq!(dto(&compiled, &User::sample()).age, 1030);
    }

    #[test]
    fn strict_mode_reports_unresolved_members() {
        let schemas = SchemaCache::new();
        let err = build(&schemas, |_| {}, MapperConfig::strict()).unwrap_err();
        assert!(matches!(err, Error::UnresolvedMember { ref member, .. } if member == "Status"));

        let compiled = build(
            &schemas,
            |c| {
                c.ignore("Status").ignore("IsActive");
            },
            MapperConfig::strict(),
        );
        assert!(compiled.is_ok());
    }

    #[test]
    fn factory_strategy_wires_parameters() {
        let schemas = SchemaCache::new();
        let compiled = MappingBuilder::new(
            &schemas,
            TypePair::of::<User, Person>(),
            schemas.of::<User>(),
            schemas.of::<Person>(),
        )
        .build()
        .unwrap();
        assert!(compiled.uses_factory());

        let person = compiled.invoke(&User::sample()).unwrap();
        let person = person.downcast_ref::<Person>().unwrap();
        assert_eq!(person.name(), "ali");
        assert_eq!(person.age(), 30);

        let mut nameless = User::sample();
        nameless.name = None;
        assert!(matches!(
            compiled.invoke(&nameless),
            Err(Error::UnresolvedParameter { ref parameter, .. }) if parameter == "name"
        ));
    }

    #[test]
    fn factory_wiring_failure_is_reported() {
        let schemas = SchemaCache::new();
        let builder = MappingBuilder::new(
            &schemas,
            TypePair::of::<Account, Person>(),
            schemas.of::<Account>(),
            schemas.of::<Person>(),
        );
        assert!(matches!(
            builder.check_factory(),
            Err(Error::UnresolvedParameter { ref parameter, .. }) if parameter == "age"
        ));
    }

    #[test]
    fn abstract_destination_is_not_constructible() {
        let schemas = SchemaCache::new();
        let result = MappingBuilder::new(
            &schemas,
            TypePair::of::<UserDto, Account>(),
            schemas.of::<UserDto>(),
            schemas.of::<Account>(),
        )
        .build();
        assert!(matches!(result, Err(Error::NotConstructible(_))));
    }

    #[test]
    fn foreign_source_is_rejected() {
        let schemas = SchemaCache::new();
        let compiled = build(&schemas, |_| {}, MapperConfig::default()).unwrap();
        assert!(matches!(
            compiled.invoke(&5u32),
            Err(Error::TypeMismatch { .. })
        ));
    }
}
