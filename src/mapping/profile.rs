//! Mapping profiles.
//!
//! A profile groups related `configure` and `register` calls so that an application can keep
//! the mappings of one feature area together and apply them in a single call.

use std::any::type_name;

use crate::{mapping::MappingEngine, Result};

/// A group of mapping registrations applied to a [`MappingEngine`].
///
/// # Examples
///
/// ```rust
/// use shapemap::{mapping::MappingProfile, MappingEngine, Result};
///
/// struct BillingProfile;
///
/// impl MappingProfile for BillingProfile {
///     fn configure(&self, engine: &MappingEngine) -> Result<()> {
///         // engine.configure::<Invoice, InvoiceDto, _>(|cfg| { ... })?;
///         let _ = engine;
///         Ok(())
///     }
/// }
///
/// let engine = MappingEngine::new();
/// engine.add_profiles(&[&BillingProfile])?;
/// # Ok::<(), shapemap::Error>(())
/// ```
pub trait MappingProfile {
    /// Register this profile's mappings with `engine`
    ///
    /// # Errors
    /// Returns the first error reported by the engine.
    fn configure(&self, engine: &MappingEngine) -> Result<()>;

    /// Name used in diagnostics, the Rust type name by default
    fn name(&self) -> &str {
        type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mapping::PairState,
        test::{User, UserDto},
        Error,
    };

    struct Users;

    impl MappingProfile for Users {
        fn configure(&self, engine: &MappingEngine) -> Result<()> {
            engine.configure::<User, UserDto, _>(|c| {
                c.ignore("Age");
            })
        }
    }

    struct Broken;

    impl MappingProfile for Broken {
        fn configure(&self, _engine: &MappingEngine) -> Result<()> {
            Err(Error::InvalidArgument("broken profile".into()))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    #[test]
    fn profiles_apply_in_order() {
        let engine = MappingEngine::new();
        engine.add_profile(&Users).unwrap();
        assert_eq!(engine.state::<User, UserDto>(), PairState::Configured);
        assert!(Users.name().ends_with("Users"));
    }

    #[test]
    fn first_error_stops() {
        let engine = MappingEngine::new();
        let result = engine.add_profiles(&[&Broken, &Users]);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert_eq!(engine.state::<User, UserDto>(), PairState::Unconfigured);
        assert_eq!(Broken.name(), "broken");
    }
}
