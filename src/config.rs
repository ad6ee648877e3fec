//! Engine configuration
//!
//! This module provides the behaviour knobs of a [`MappingEngine`](crate::MappingEngine) that
//! are independent of any particular type pair.

/// Configuration for member resolution and mapping construction
///
/// The defaults reproduce the permissive contract of the mapper:
/// - Unresolvable destination members are silently left at their construction default
/// - One level of nested source members is searched when no exact match exists
/// - Factory-constructed destinations are checked for complete parameter wiring at configure time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapperConfig {
    /// Search one level of nested source members when no exact match exists (default: true)
    pub flatten: bool,

    /// Fail the build with [`Error::UnresolvedMember`](crate::Error::UnresolvedMember) when a
    /// writable, non-ignored destination member has no value source (default: false)
    pub strict_members: bool,

    /// Verify during `configure` that every factory parameter of the destination can be wired
    /// to a source member (default: true)
    pub validate_factories: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            flatten: true,
            strict_members: false,
            validate_factories: true,
        }
    }
}

impl MapperConfig {
    /// Creates the permissive configuration, identical to [`MapperConfig::default`]
    #[must_use]
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Creates a configuration that treats every unresolved destination member as an error
    ///
    /// Useful in tests to catch renamed members early. Ignored members are never reported.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            flatten: true,
            strict_members: true,
            validate_factories: true,
        }
    }

    /// Creates a configuration that only matches members on the same level
    ///
    /// Nested source members are reachable through custom paths only.
    #[must_use]
    pub fn exact_only() -> Self {
        Self {
            flatten: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapper_config_presets() {
        let permissive = MapperConfig::permissive();
        assert!(permissive.flatten);
        assert!(!permissive.strict_members);
        assert!(permissive.validate_factories);

        let strict = MapperConfig::strict();
        assert!(strict.flatten);
        assert!(strict.strict_members);
        assert!(strict.validate_factories);

        let exact = MapperConfig::exact_only();
        assert!(!exact.flatten);
        assert!(!exact.strict_members);
    }

    #[test]
    fn test_default_config() {
        assert_eq!(MapperConfig::default(), MapperConfig::permissive());
    }
}
