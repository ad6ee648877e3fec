//! Attribute-style mapping declarations.
//!
//! A [`MapDeclaration`] describes a mapping from the point of view of the *source* type: the
//! declaration itself stands for "`S` maps to `D`", and every [`MemberDeclaration`] annotates
//! one source member with a target name override, a null-substitute, a converter, a condition
//! or an ignore flag.
//!
//! Applying a declaration produces an ordinary [`TypePairConfiguration`], keyed by destination
//! member name. A member whose target name differs from its own name is read through a custom
//! path naming the source member, so declared and configured mappings behave identically.
//!
//! # Examples
//!
//! ```rust
//! use shapemap::mapping::MapDeclaration;
//!
//! struct Order {
//!     paid: bool,
//! }
//! struct OrderDto;
//!
//! let declaration = MapDeclaration::<Order, OrderDto>::new()
//!     .member("CustomerEmail", |m| {
//!         m.target("Email").null_substitute("unknown".to_string());
//!     })
//!     .member("Total", |m| {
//!         m.condition(|order, _| order.paid);
//!     })
//!     .member("InternalNote", |m| {
//!         m.ignore();
//!     });
//!
//! assert_eq!(declaration.len(), 3);
//! ```

use std::{fmt, marker::PhantomData};

use tracing::debug;

use crate::{
    mapping::{PropertyOptions, TypePairConfiguration},
    schema::MapValue,
};

/// The declaration attached to one source member
pub struct MemberDeclaration<S, D> {
    source_member: String,
    target: Option<String>,
    options: PropertyOptions<S, D>,
}

impl<S: 'static, D: 'static> MemberDeclaration<S, D> {
    fn new(source_member: String) -> Self {
        MemberDeclaration {
            source_member,
            target: None,
            options: PropertyOptions::new(),
        }
    }

    /// Map into the destination member `name` instead of the same-named one
    pub fn target(&mut self, name: impl Into<String>) -> &mut Self {
        self.target = Some(name.into());
        self
    }

    /// Never assign the destination member
    pub fn ignore(&mut self) -> &mut Self {
        self.options.ignore();
        self
    }

    /// Assign `value` when the source member is absent
    pub fn null_substitute(&mut self, value: impl MapValue) -> &mut Self {
        self.options.null_substitute(value);
        self
    }

    /// Transform the source value before assignment
    pub fn convert_using<In, Out, F>(&mut self, convert: F) -> &mut Self
    where
        In: MapValue,
        Out: MapValue,
        F: Fn(In) -> Out + Send + Sync + 'static,
    {
        self.options.convert_using(convert);
        self
    }

    /// Only assign the destination member when `condition` holds
    pub fn condition<F>(&mut self, condition: F) -> &mut Self
    where
        F: Fn(&S, &D) -> bool + Send + Sync + 'static,
    {
        self.options.condition(condition);
        self
    }

    /// The annotated source member
    #[must_use]
    pub fn source_member(&self) -> &str {
        &self.source_member
    }

    /// The destination member this declaration configures
    #[must_use]
    pub fn destination_member(&self) -> &str {
        self.target.as_deref().unwrap_or(&self.source_member)
    }
}

impl<S, D> fmt::Debug for MemberDeclaration<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDeclaration")
            .field("source_member", &self.source_member)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// Declares that `S` maps to `D`, with per-member annotations
pub struct MapDeclaration<S, D> {
    members: Vec<MemberDeclaration<S, D>>,
    _pair: PhantomData<fn(&S) -> D>,
}

impl<S: 'static, D: 'static> MapDeclaration<S, D> {
    /// Create a declaration without member annotations
    #[must_use]
    pub fn new() -> Self {
        MapDeclaration {
            members: Vec::new(),
            _pair: PhantomData,
        }
    }

    /// Annotate the source member `name`
    ///
    /// ## Arguments
    /// * 'name'    - Source member name
    /// * 'declare' - Closure applying the annotations
    #[must_use]
    pub fn member<F>(mut self, name: impl Into<String>, declare: F) -> Self
    where
        F: FnOnce(&mut MemberDeclaration<S, D>),
    {
        let mut member = MemberDeclaration::new(name.into());
        declare(&mut member);
        self.members.push(member);
        self
    }

    /// The member annotations, in declaration order
    #[must_use]
    pub fn members(&self) -> &[MemberDeclaration<S, D>] {
        &self.members
    }

    /// Number of annotated members
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if no member is annotated
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Write the annotations into `configuration`.
    ///
    /// Later annotations targeting the same destination member replace earlier ones.
    pub fn apply_to(self, configuration: &mut TypePairConfiguration<S, D>) {
        for member in self.members {
            let destination = member.destination_member().to_string();
            let mut rules = member.options.into_rules();
            if destination != member.source_member && rules.custom_path.is_none() {
                rules.custom_path = Some(member.source_member.clone());
            }
            if configuration.rules().member(&destination).is_some() {
                debug!(
                    destination = destination.as_str(),
                    source_member = member.source_member.as_str(),
                    "destination member declared more than once, the later declaration wins"
                );
            }
            configuration.set_member_rules(destination, rules);
        }
    }
}

impl<S: 'static, D: 'static> Default for MapDeclaration<S, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, D> fmt::Debug for MapDeclaration<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapDeclaration")
            .field("source", &std::any::type_name::<S>())
            .field("destination", &std::any::type_name::<D>())
            .field("members", &self.members)
            .finish()
    }
}
