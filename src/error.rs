use thiserror::Error;

macro_rules! mismatch_error {
    // Expected type and the offending value
    ($expected:expr, $value:expr) => {
        crate::Error::TypeMismatch {
            expected: $expected.to_string(),
            found: $value.kind().to_string(),
        }
    };
}

macro_rules! unresolved_parameter {
    ($pair:expr, $parameter:expr) => {
        crate::Error::UnresolvedParameter {
            pair: $pair.to_string(),
            parameter: $parameter.to_string(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Most resolution problems are deliberately *not* errors: a destination member that has no
/// matching source member, or whose custom path does not exist, is silently left at the value
/// the destination's own construction gave it. The variants below cover the cases that can not
/// be papered over that way.
///
/// # Error Categories
///
/// ## Caller Errors
/// - [`Error::InvalidArgument`] - A mapping was requested for an absent source object
///
/// ## Construction Errors
/// - [`Error::UnresolvedParameter`] - A factory parameter can not be wired to the source
/// - [`Error::NotConstructible`] - The destination has neither a default constructor nor a factory
/// - [`Error::AbstractNotRegistered`] - No concrete type was registered for an abstract target
///
/// ## Value Errors
/// - [`Error::TypeMismatch`] - A value could not be coerced into the required Rust type
///
/// ## Configuration Errors
/// - [`Error::InvalidConfiguration`] - A stored configuration does not belong to its type pair
/// - [`Error::UnresolvedMember`] - Strict mode found a destination member without a value source
///
/// # Examples
///
/// ```rust
/// use shapemap::{Error, MappingEngine};
///
/// let engine = MappingEngine::new();
/// match engine.assert_configuration_is_valid() {
///     Ok(()) => println!("configuration is consistent"),
///     Err(Error::InvalidConfiguration { source_type, destination_type }) => {
///         eprintln!("broken configuration for {source_type} -> {destination_type}");
///     }
///     Err(e) => eprintln!("other error: {e}"),
/// }
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// An argument passed to the engine was invalid.
    ///
    /// Raised when a mapping is requested for an absent source. No partial destination is
    /// produced.
    #[error("Invalid argument - {0}")]
    InvalidArgument(String),

    /// A factory parameter of the destination could not be wired to the source.
    ///
    /// Factory construction matches parameters by case-insensitive name and identical declared
    /// type against the source members. It does not flatten, convert or substitute defaults, so
    /// a missing member or an absent value is fatal for that invocation.
    #[error("Cannot map parameter '{parameter}' for {pair}")]
    UnresolvedParameter {
        /// The type pair being built, formatted as `Source -> Destination`
        pair: String,
        /// The name of the parameter that could not be resolved
        parameter: String,
    },

    /// A stored configuration does not match the type pair it is registered under.
    #[error("Invalid configuration type for {source_type} -> {destination_type}")]
    InvalidConfiguration {
        /// Name of the source type of the offending pair
        source_type: String,
        /// Name of the destination type of the offending pair
        destination_type: String,
    },

    /// The destination type can not be constructed.
    ///
    /// The type schema declares neither a default constructor nor a factory.
    #[error("No constructor found for the destination type {0}")]
    NotConstructible(String),

    /// A value could not be converted into the requested type.
    ///
    /// Occurs when a source value is assigned to a destination member, passed to a converter
    /// or used as a factory argument and no lossless coercion exists.
    #[error("Type mismatch - expected {expected}, found {found}")]
    TypeMismatch {
        /// The Rust type that was required
        expected: String,
        /// The kind of value that was supplied
        found: String,
    },

    /// A destination member could not be resolved while strict member checking is enabled.
    #[error("Unresolved member '{member}' for {pair}")]
    UnresolvedMember {
        /// The type pair being built, formatted as `Source -> Destination`
        pair: String,
        /// The destination member without a value source
        member: String,
    },

    /// No concrete type has been registered for the requested abstract type.
    #[error("No concrete type registered for abstract type {0}")]
    AbstractNotRegistered(String),
}
