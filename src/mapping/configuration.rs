//! Type pair configuration.
//!
//! A [`TypePairConfiguration`] collects the [`MemberRules`] of every configured destination
//! member of one `(Source, Destination)` pair, together with the optional before-map and
//! after-map hooks. The typed configuration is what users edit; the engine keeps the erased
//! [`PairRules`] it wraps.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    marker::PhantomData,
    mem,
    ops::{Deref, DerefMut},
    sync::Arc,
};

use crate::mapping::{MappingEngine, MemberRules, PropertyOptions};

/// Type-erased `(source, destination)` hook
pub(crate) type HookFn = Arc<dyn Fn(&dyn Any, &mut dyn Any) + Send + Sync>;

/// The erased rule set of one type pair
#[derive(Clone, Default)]
pub struct PairRules {
    members: HashMap<String, MemberRules>,
    before: Option<HookFn>,
    after: Option<HookFn>,
}

impl PairRules {
    /// The rules of the destination member `name`
    #[must_use]
    pub fn member(&self, name: &str) -> Option<&MemberRules> {
        self.members.get(name)
    }

    /// All configured members, in no particular order
    pub fn members(&self) -> impl Iterator<Item = (&str, &MemberRules)> {
        self.members
            .iter()
            .map(|(name, rules)| (name.as_str(), rules))
    }

    /// Number of configured members
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if no member is configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns `true` if a before-map hook is set
    #[must_use]
    pub fn has_before_map(&self) -> bool {
        self.before.is_some()
    }

    /// Returns `true` if an after-map hook is set
    #[must_use]
    pub fn has_after_map(&self) -> bool {
        self.after.is_some()
    }

    pub(crate) fn before_map(&self) -> Option<&HookFn> {
        self.before.as_ref()
    }

    pub(crate) fn after_map(&self) -> Option<&HookFn> {
        self.after.as_ref()
    }

    /// Derive the rules of the swapped pair: ignore flags and null-substitutes only, no hooks
    #[must_use]
    pub fn reversed(&self) -> PairRules {
        PairRules {
            members: self
                .members
                .iter()
                .map(|(name, rules)| (name.clone(), rules.reversed()))
                .collect(),
            before: None,
            after: None,
        }
    }
}

impl fmt::Debug for PairRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PairRules")
            .field("members", &self.members)
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}

/// Stored configurations, checked against their key by the validator.
pub(crate) trait ConfigurationShape: Send + Sync {
    /// `(source, destination)` type ids this configuration was created for
    fn shape(&self) -> (TypeId, TypeId);

    fn rules(&self) -> &PairRules;
}

/// The mapping rules of one `(S, D)` pair.
///
/// Created empty by [`MappingEngine::configure`], handed to the configuration closure, and
/// stored wholesale afterwards. Calling `configure` again for the same pair replaces the stored
/// configuration; rules are never merged across calls.
///
/// # Examples
///
/// ```rust
/// use shapemap::mapping::TypePairConfiguration;
///
/// struct User {
///     active: bool,
/// }
/// struct UserDto {
///     audited: bool,
/// }
///
/// let mut config = TypePairConfiguration::<User, UserDto>::new();
/// config
///     .for_member("Email", |o| {
///         o.null_substitute("none@example.com".to_string());
///     })
///     .for_member("IsActive", |o| {
///         o.condition(|src, _| src.active);
///     })
///     .ignore("PasswordHash")
///     .after_map(|_, dst| dst.audited = true);
///
/// assert_eq!(config.rules().len(), 3);
/// assert!(config.rules().has_after_map());
/// ```
pub struct TypePairConfiguration<S, D> {
    rules: PairRules,
    _pair: PhantomData<fn(&S) -> D>,
}

impl<S: 'static, D: 'static> TypePairConfiguration<S, D> {
    /// Create an empty configuration
    #[must_use]
    pub fn new() -> Self {
        Self::from_rules(PairRules::default())
    }

    fn from_rules(rules: PairRules) -> Self {
        TypePairConfiguration {
            rules,
            _pair: PhantomData,
        }
    }

    /// Configure the destination member `name`.
    ///
    /// The record for `name` is created on first use; later calls edit the same record.
    ///
    /// ## Arguments
    /// * 'name'      - Destination member name
    /// * 'configure' - Closure applying the options
    pub fn for_member<F>(&mut self, name: impl Into<String>, configure: F) -> &mut Self
    where
        F: FnOnce(&mut PropertyOptions<S, D>),
    {
        let name = name.into();
        let existing = self.rules.members.remove(&name).unwrap_or_default();
        let mut options = PropertyOptions::from_rules(existing);
        configure(&mut options);
        self.rules.members.insert(name, options.into_rules());
        self
    }

    /// Never assign the destination member `name`
    pub fn ignore(&mut self, name: impl Into<String>) -> &mut Self {
        self.for_member(name, |options| {
            options.ignore();
        })
    }

    /// Run `hook` after construction, before conditional members are evaluated
    pub fn before_map<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&S, &mut D) + Send + Sync + 'static,
    {
        self.rules.before = Some(erase_hook(hook));
        self
    }

    /// Run `hook` once all members, conditional ones included, are assigned
    pub fn after_map<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&S, &mut D) + Send + Sync + 'static,
    {
        self.rules.after = Some(erase_hook(hook));
        self
    }

    /// The erased rule set
    #[must_use]
    pub fn rules(&self) -> &PairRules {
        &self.rules
    }

    pub(crate) fn set_member_rules(&mut self, name: String, rules: MemberRules) {
        self.rules.members.insert(name, rules);
    }

    /// Derive the configuration of the swapped pair without installing it.
    ///
    /// Only ignore flags and null-substitutes are carried over. Custom paths, converters,
    /// conditions and hooks are specific to one direction and are dropped.
    #[must_use]
    pub fn reversed(&self) -> TypePairConfiguration<D, S> {
        TypePairConfiguration::from_rules(self.rules.reversed())
    }

    /// Derive the reverse configuration and install it into `engine` for `(D, S)`.
    ///
    /// The reverse rules reflect the members configured so far, so this is usually the last
    /// call inside a configuration closure. The returned guard dereferences to the derived
    /// configuration; edits made through it are part of what is installed when the guard is
    /// dropped. The installed configuration replaces any stored one for the swapped pair.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// engine.configure::<User, UserDto, _>(|cfg| {
    ///     cfg.for_member("Name", |o| {
    ///         o.null_substitute("Anonymous".to_string());
    ///     });
    ///     cfg.reverse_map(&engine).ignore("Status");
    /// })?;
    /// ```
    pub fn reverse_map<'e>(&self, engine: &'e MappingEngine) -> ReverseMapping<'e, D, S> {
        ReverseMapping {
            engine,
            configuration: self.reversed(),
        }
    }
}

impl<S: 'static, D: 'static> Default for TypePairConfiguration<S, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: 'static, D: 'static> ConfigurationShape for TypePairConfiguration<S, D> {
    fn shape(&self) -> (TypeId, TypeId) {
        (TypeId::of::<S>(), TypeId::of::<D>())
    }

    fn rules(&self) -> &PairRules {
        &self.rules
    }
}

/// A derived reverse configuration that is installed into its engine when dropped.
///
/// Returned by [`TypePairConfiguration::reverse_map`]. Edits made through the guard write
/// through to the engine.
pub struct ReverseMapping<'e, S: 'static, D: 'static> {
    engine: &'e MappingEngine,
    configuration: TypePairConfiguration<S, D>,
}

impl<S: 'static, D: 'static> Deref for ReverseMapping<'_, S, D> {
    type Target = TypePairConfiguration<S, D>;

    fn deref(&self) -> &Self::Target {
        &self.configuration
    }
}

impl<S: 'static, D: 'static> DerefMut for ReverseMapping<'_, S, D> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.configuration
    }
}

impl<S: 'static, D: 'static> Drop for ReverseMapping<'_, S, D> {
    fn drop(&mut self) {
        let configuration = mem::take(&mut self.configuration);
        self.engine.install_configuration(configuration);
    }
}

impl<S: 'static, D: 'static> fmt::Debug for ReverseMapping<'_, S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReverseMapping")
            .field(&self.configuration)
            .finish()
    }
}

impl<S, D> fmt::Debug for TypePairConfiguration<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypePairConfiguration")
            .field("source", &std::any::type_name::<S>())
            .field("destination", &std::any::type_name::<D>())
            .field("rules", &self.rules)
            .finish()
    }
}

fn erase_hook<S, D, F>(hook: F) -> HookFn
where
    S: 'static,
    D: 'static,
    F: Fn(&S, &mut D) + Send + Sync + 'static,
{
    Arc::new(move |source: &dyn Any, destination: &mut dyn Any| {
        if let (Some(source), Some(destination)) =
            (source.downcast_ref::<S>(), destination.downcast_mut::<D>())
        {
            hook(source, destination);
        }
    })
}
