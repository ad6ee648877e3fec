//! Per-member mapping options.
//!
//! Every destination member may carry one [`MemberRules`] record inside a type pair
//! configuration. The record is edited through the typed [`PropertyOptions`] facade, which
//! erases user closures into the dynamic form the mapping builder consumes.

use std::{any::Any, fmt, marker::PhantomData, sync::Arc};

use crate::{
    schema::{DeclaredType, MapValue, Value},
    Result,
};

/// Type-erased `(source, destination) -> bool` predicate
pub(crate) type ConditionFn = Arc<dyn Fn(&dyn Any, &dyn Any) -> bool + Send + Sync>;

type ConvertFn = Arc<dyn Fn(Value) -> Result<Value> + Send + Sync>;

/// A typed value transform, stored in erased form.
///
/// The raw source value is coerced into the converter's input type before the user function
/// runs, and the output is turned back into a [`Value`] for assignment.
#[derive(Clone)]
pub struct ValueConverter {
    input: DeclaredType,
    output: DeclaredType,
    apply: ConvertFn,
}

impl ValueConverter {
    /// Wrap a typed conversion function
    pub fn new<In, Out, F>(convert: F) -> Self
    where
        In: MapValue,
        Out: MapValue,
        F: Fn(In) -> Out + Send + Sync + 'static,
    {
        ValueConverter {
            input: In::declared_type(),
            output: Out::declared_type(),
            apply: Arc::new(move |raw: Value| -> Result<Value> {
                let input = In::from_value(raw)?;
                Ok(convert(input).into_value())
            }),
        }
    }

    /// The declared input type
    #[must_use]
    pub fn input_type(&self) -> DeclaredType {
        self.input
    }

    /// The declared output type
    #[must_use]
    pub fn output_type(&self) -> DeclaredType {
        self.output
    }

    /// Run the conversion
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeMismatch`] if `raw` can not be coerced into the input type.
    pub fn convert(&self, raw: Value) -> Result<Value> {
        (self.apply)(raw)
    }
}

impl fmt::Debug for ValueConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueConverter({} -> {})", self.input, self.output)
    }
}

/// The configuration record of one destination member
#[derive(Clone, Default)]
pub struct MemberRules {
    pub(crate) ignore: bool,
    pub(crate) custom_path: Option<String>,
    pub(crate) condition: Option<ConditionFn>,
    pub(crate) null_substitute: Option<Value>,
    pub(crate) converter: Option<ValueConverter>,
}

impl MemberRules {
    /// Returns `true` if the member is never assigned
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.ignore
    }

    /// The dot-separated source path overriding automatic resolution
    #[must_use]
    pub fn custom_path(&self) -> Option<&str> {
        self.custom_path.as_deref()
    }

    /// Returns `true` if assignment is gated by a condition
    #[must_use]
    pub fn has_condition(&self) -> bool {
        self.condition.is_some()
    }

    /// The value used when the resolved source value is absent
    #[must_use]
    pub fn null_substitute(&self) -> Option<&Value> {
        self.null_substitute.as_ref()
    }

    /// The configured converter
    #[must_use]
    pub fn converter(&self) -> Option<&ValueConverter> {
        self.converter.as_ref()
    }

    /// Evaluate the condition, `true` when none is configured
    pub(crate) fn passes(&self, source: &dyn Any, destination: &dyn Any) -> bool {
        self.condition
            .as_ref()
            .map_or(true, |condition| condition(source, destination))
    }

    /// The direction-agnostic subset: ignore flag and null-substitute
    #[must_use]
    pub fn reversed(&self) -> MemberRules {
        MemberRules {
            ignore: self.ignore,
            null_substitute: self.null_substitute.clone(),
            ..MemberRules::default()
        }
    }
}

impl fmt::Debug for MemberRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberRules")
            .field("ignore", &self.ignore)
            .field("custom_path", &self.custom_path)
            .field("condition", &self.condition.is_some())
            .field("null_substitute", &self.null_substitute)
            .field("converter", &self.converter)
            .finish()
    }
}

/// Typed editor for the [`MemberRules`] of one destination member.
///
/// Handed to the closure of
/// [`TypePairConfiguration::for_member`](crate::mapping::TypePairConfiguration::for_member).
/// No validation happens here: a path that does not exist or a converter of the wrong type
/// only shows when the mapping is built or invoked.
///
/// # Examples
///
/// ```rust
/// use shapemap::mapping::PropertyOptions;
///
/// struct Order;
/// struct OrderDto;
///
/// let mut options = PropertyOptions::<Order, OrderDto>::new();
/// options
///     .map_from("Customer.Email")
///     .null_substitute("unknown@example.com".to_string());
///
/// let rules = options.rules();
/// assert_eq!(rules.custom_path(), Some("Customer.Email"));
/// assert!(rules.null_substitute().is_some());
/// ```
pub struct PropertyOptions<S, D> {
    rules: MemberRules,
    _pair: PhantomData<fn(&S, &D)>,
}

impl<S: 'static, D: 'static> PropertyOptions<S, D> {
    /// Create empty options
    #[must_use]
    pub fn new() -> Self {
        Self::from_rules(MemberRules::default())
    }

    pub(crate) fn from_rules(rules: MemberRules) -> Self {
        PropertyOptions {
            rules,
            _pair: PhantomData,
        }
    }

    pub(crate) fn into_rules(self) -> MemberRules {
        self.rules
    }

    /// The current record
    #[must_use]
    pub fn rules(&self) -> &MemberRules {
        &self.rules
    }

    /// Never assign this member
    pub fn ignore(&mut self) -> &mut Self {
        self.rules.ignore = true;
        self
    }

    /// Read the value from a dot-separated path into the source, e.g. `"Profile.Address"`
    ///
    /// ## Arguments
    /// * 'path' - Member names separated by `.`, starting at the source root
    pub fn map_from(&mut self, path: impl Into<String>) -> &mut Self {
        self.rules.custom_path = Some(path.into());
        self
    }

    /// Only assign the member when `condition` holds for the current invocation
    pub fn condition<F>(&mut self, condition: F) -> &mut Self
    where
        F: Fn(&S, &D) -> bool + Send + Sync + 'static,
    {
        self.rules.condition = Some(Arc::new(
            move |source: &dyn Any, destination: &dyn Any| -> bool {
                match (source.downcast_ref::<S>(), destination.downcast_ref::<D>()) {
                    (Some(source), Some(destination)) => condition(source, destination),
                    _ => false,
                }
            },
        ));
        self
    }

    /// Assign `value` when the resolved source value is absent
    pub fn null_substitute(&mut self, value: impl MapValue) -> &mut Self {
        self.rules.null_substitute = Some(value.into_value());
        self
    }

    /// Transform the resolved source value before assignment
    pub fn convert_using<In, Out, F>(&mut self, convert: F) -> &mut Self
    where
        In: MapValue,
        Out: MapValue,
        F: Fn(In) -> Out + Send + Sync + 'static,
    {
        self.rules.converter = Some(ValueConverter::new(convert));
        self
    }
}

impl<S: 'static, D: 'static> Default for PropertyOptions<S, D> {
    fn default() -> Self {
        Self::new()
    }
}
