//! Member resolution.
//!
//! The [`MemberResolver`] decides, for each destination member, which [`ValuePath`] into the
//! source produces its value. Resolution happens once per type pair, when the mapping is built.

use std::{any::Any, fmt};

use strum::Display;
use tracing::{debug, trace};

use crate::{
    mapping::MemberRules,
    schema::{
        DeclaredType, FactoryParam, Member, NestedAccessor, SchemaCache, SchemaRc, Value,
        ValueAccessor,
    },
};

/// How a [`ValuePath`] was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum PathOrigin {
    /// An explicitly configured dot-separated path
    CustomPath,
    /// A source member with identical name and declared type
    Exact,
    /// A second-level source member with identical name and declared type
    Flattened,
}

/// An ordered list of navigation steps ending in a value getter.
///
/// Evaluation walks the steps left to right and yields [`Value::Null`] as soon as one of them
/// is absent, so a missing parent object never faults.
#[derive(Debug, Clone)]
pub struct ValuePath {
    steps: Vec<NestedAccessor>,
    terminal: ValueAccessor,
    origin: PathOrigin,
    text: String,
}

impl ValuePath {
    /// How this path was resolved
    #[must_use]
    pub fn origin(&self) -> PathOrigin {
        self.origin
    }

    /// The declared type of the value at the end of the path
    #[must_use]
    pub fn declared_type(&self) -> DeclaredType {
        self.terminal.declared_type()
    }

    /// Number of navigation steps before the terminal member
    #[must_use]
    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    /// Read the value from `source`
    pub fn evaluate(&self, source: &dyn Any) -> Value {
        let mut current = source;
        for step in &self.steps {
            match step.navigate(current) {
                Some(next) => current = next,
                None => return Value::Null,
            }
        }
        self.terminal.get(current)
    }
}

impl fmt::Display for ValuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Outcome of resolving one destination member
#[derive(Debug, Clone)]
pub enum Resolution {
    /// The member is configured as ignored
    Ignored,
    /// The member is read from this path
    Path(ValuePath),
    /// No value source exists; the member keeps its construction default
    Unresolved,
}

/// Resolves destination members against the members of a source schema.
///
/// For a writable destination member the precedence is:
/// 1. ignored members get no value path
/// 2. an explicit custom path overrides everything else; if it does not exist the member is
///    unresolved
/// 3. a source member with identical name and declared type
/// 4. a second-level member with identical name and declared type, searched once through every
///    nested source member in declaration order (flattening)
///
/// When a converter is configured, the converter's input type takes the place of the
/// destination member's type during matching.
pub struct MemberResolver<'a> {
    /// Schema cache used to describe nested types
    schemas: &'a SchemaCache,
    /// The source schema
    source: SchemaRc,
    /// Whether the flatten step runs
    flatten: bool,
}

impl<'a> MemberResolver<'a> {
    /// Create a new resolver for `source`
    ///
    /// ## Arguments
    /// * 'schemas' - Cache for the schemas of nested source types
    /// * 'source'  - The schema of the source type
    pub fn new(schemas: &'a SchemaCache, source: SchemaRc) -> Self {
        MemberResolver {
            schemas,
            source,
            flatten: true,
        }
    }

    /// Enable or disable the flatten step
    ///
    /// ## Arguments
    /// * 'flatten' - `false` restricts automatic matches to the first level
    #[must_use]
    pub fn with_flatten(mut self, flatten: bool) -> Self {
        self.flatten = flatten;
        self
    }

    /// Resolve the value source of `member` under `rules`
    ///
    /// ## Arguments
    /// * 'member' - A destination member
    /// * 'rules'  - The member's configuration, if any
    pub fn resolve(&self, member: &Member, rules: Option<&MemberRules>) -> Resolution {
        if rules.is_some_and(MemberRules::is_ignored) {
            trace!(member = member.name(), "ignored");
            return Resolution::Ignored;
        }

        let Some(accessor) = member.as_value() else {
            return Resolution::Unresolved;
        };

        let resolved = match rules.and_then(MemberRules::custom_path) {
            Some(path) => self.resolve_custom_path(path),
            None => {
                let declared = accessor.declared_type();
                match rules.and_then(MemberRules::converter) {
                    // Values matched by the member's own type are coerced into the converter input
                    Some(converter) if converter.input_type() != declared => self
                        .resolve_automatic(member.name(), converter.input_type())
                        .or_else(|| self.resolve_automatic(member.name(), declared)),
                    _ => self.resolve_automatic(member.name(), declared),
                }
            }
        };

        match resolved {
            Some(path) => {
                trace!(
                    member = member.name(),
                    path = %path,
                    origin = %path.origin(),
                    "resolved member"
                );
                Resolution::Path(path)
            }
            None => Resolution::Unresolved,
        }
    }

    fn resolve_automatic(&self, name: &str, declared: DeclaredType) -> Option<ValuePath> {
        self.resolve_exact(name, declared).or_else(|| {
            if self.flatten {
                self.resolve_flattened(name, declared)
            } else {
                None
            }
        })
    }

    /// Walk a dot-separated path from the source root.
    ///
    /// Every segment but the last must name a nested member, the last one a value member.
    /// Returns `None` if a segment does not exist on the type it is looked up on.
    ///
    /// ## Arguments
    /// * 'path' - Member names separated by `.`
    pub fn resolve_custom_path(&self, path: &str) -> Option<ValuePath> {
        let segments: Vec<&str> = path.split('.').collect();
        let (last, parents) = segments.split_last()?;

        let mut schema = self.source.clone();
        let mut steps = Vec::with_capacity(parents.len());
        for segment in parents {
            let Some(nested) = schema
                .member(segment)
                .and_then(Member::as_nested)
                .cloned()
            else {
                debug!(
                    path,
                    segment,
                    owner = schema.name(),
                    "custom path segment is not a nested member"
                );
                return None;
            };
            schema = self
                .schemas
                .get_or_describe(nested.target_type_id(), nested.describe_target());
            steps.push(nested);
        }

        let Some(terminal) = schema.member(last).and_then(Member::as_value) else {
            debug!(
                path,
                segment = *last,
                owner = schema.name(),
                "custom path does not end in a value member"
            );
            return None;
        };

        Some(ValuePath {
            steps,
            terminal: terminal.clone(),
            origin: PathOrigin::CustomPath,
            text: path.to_string(),
        })
    }

    /// Find a first-level source value member with identical name and declared type
    ///
    /// ## Arguments
    /// * 'name'     - Member name, compared exactly
    /// * 'declared' - Required declared type
    pub fn resolve_exact(&self, name: &str, declared: DeclaredType) -> Option<ValuePath> {
        self.source
            .members()
            .iter()
            .filter(|member| member.name() == name)
            .find_map(Member::as_value)
            .filter(|accessor| accessor.declared_type() == declared)
            .map(|accessor| ValuePath {
                steps: Vec::new(),
                terminal: accessor.clone(),
                origin: PathOrigin::Exact,
                text: name.to_string(),
            })
    }

    /// Search one level of nested source members for `name` with the declared type
    ///
    /// ## Arguments
    /// * 'name'     - Member name, compared exactly
    /// * 'declared' - Required declared type
    pub fn resolve_flattened(&self, name: &str, declared: DeclaredType) -> Option<ValuePath> {
        let mut candidates = self
            .source
            .members()
            .iter()
            .filter_map(|parent| parent.as_nested().map(|nested| (parent.name(), nested)))
            .filter_map(|(parent, nested)| {
                let schema = self
                    .schemas
                    .get_or_describe(nested.target_type_id(), nested.describe_target());
                let terminal = schema
                    .member(name)
                    .and_then(Member::as_value)
                    .filter(|accessor| accessor.declared_type() == declared)?
                    .clone();
                Some(ValuePath {
                    steps: vec![nested.clone()],
                    terminal,
                    origin: PathOrigin::Flattened,
                    text: format!("{parent}.{name}"),
                })
            });

        let first = candidates.next()?;
        let others = candidates.count();
        if others > 0 {
            debug!(
                member = name,
                chosen = %first,
                others,
                "ambiguous flattening, using the first declared parent"
            );
        }
        Some(first)
    }

    /// Find a first-level source value member by name, regardless of its declared type
    ///
    /// ## Arguments
    /// * 'name' - Member name, compared exactly
    pub fn resolve_by_name(&self, name: &str) -> Option<ValuePath> {
        self.source
            .members()
            .iter()
            .filter(|member| member.name() == name)
            .find_map(Member::as_value)
            .map(|accessor| ValuePath {
                steps: Vec::new(),
                terminal: accessor.clone(),
                origin: PathOrigin::Exact,
                text: name.to_string(),
            })
    }

    /// Wire a factory parameter to a source value member.
    ///
    /// Names compare case-insensitively, declared types exactly. Flattening does not apply.
    ///
    /// ## Arguments
    /// * 'param' - The factory parameter
    pub fn resolve_parameter(&self, param: &FactoryParam) -> Option<ValuePath> {
        self.source
            .members()
            .iter()
            .filter(|member| member.name().eq_ignore_ascii_case(param.name()))
            .filter_map(|member| member.as_value().map(|accessor| (member.name(), accessor)))
            .find(|(_, accessor)| accessor.declared_type() == param.declared_type())
            .map(|(name, accessor)| ValuePath {
                steps: Vec::new(),
                terminal: accessor.clone(),
                origin: PathOrigin::Exact,
                text: name.to_string(),
            })
    }
}
