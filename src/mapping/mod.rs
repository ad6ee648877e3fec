//! Mapping configuration, resolution and execution.
//!
//! This module turns per-pair configuration into reusable mapping functions and dispatches
//! mapping requests to them.
//!
//! # Key Components
//!
//! - [`PropertyOptions`] / [`MemberRules`]: Configuration of one destination member
//! - [`TypePairConfiguration`]: All member rules and hooks of one `(Source, Destination)` pair
//! - [`MapDeclaration`]: Attribute-style declarations producing the same configuration
//! - [`MemberResolver`]: Finds the [`ValuePath`] feeding each destination member
//! - [`MappingBuilder`] / [`CompiledMapping`]: Fast path plus runtime overlay
//! - [`MappingEngine`]: Registry of custom functions, configurations and compiled mappings
//! - [`MappingProfile`]: Grouped registrations
//!
//! # Member Options
//!
//! | Option            | Effect                                                           |
//! |-------------------|------------------------------------------------------------------|
//! | `ignore`          | The member is never assigned                                     |
//! | `map_from`        | Read from a dot-separated source path instead of matching by name |
//! | `condition`       | Assign only when the predicate holds for this invocation         |
//! | `null_substitute` | Use this value when the source value is absent                    |
//! | `convert_using`   | Transform the source value before assignment                     |
//!
//! # Examples
//!
//! ```rust
//! use shapemap::{custom_value, Mappable, MappingEngine, TypeSchema};
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Default)]
//! enum Status {
//!     #[default]
//!     Inactive,
//!     Active,
//! }
//! custom_value!(Status);
//!
//! #[derive(Default)]
//! struct Profile {
//!     address: Option<String>,
//! }
//!
//! #[derive(Default)]
//! struct User {
//!     status: Status,
//!     profile: Option<Profile>,
//! }
//!
//! #[derive(Default)]
//! struct UserDto {
//!     status: i32,
//!     is_active: bool,
//!     address: Option<String>,
//! }
//!
//! impl Mappable for Profile {
//!     fn describe() -> TypeSchema {
//!         TypeSchema::builder::<Profile>("Profile")
//!             .default_constructible()
//!             .member("Address", |p: &Profile| p.address.clone(), |p, v| p.address = v)
//!             .build()
//!     }
//! }
//!
//! impl Mappable for User {
//!     fn describe() -> TypeSchema {
//!         TypeSchema::builder::<User>("User")
//!             .default_constructible()
//!             .member("Status", |u: &User| u.status, |u, v| u.status = v)
//!             .nested("Profile", |u: &User| u.profile.as_ref())
//!             .build()
//!     }
//! }
//!
//! impl Mappable for UserDto {
//!     fn describe() -> TypeSchema {
//!         TypeSchema::builder::<UserDto>("UserDto")
//!             .default_constructible()
//!             .member("Status", |d: &UserDto| d.status, |d, v| d.status = v)
//!             .member("IsActive", |d: &UserDto| d.is_active, |d, v| d.is_active = v)
//!             .member("Address", |d: &UserDto| d.address.clone(), |d, v| d.address = v)
//!             .build()
//!     }
//! }
//!
//! let engine = MappingEngine::new();
//! engine.configure::<User, UserDto, _>(|cfg| {
//!     cfg.for_member("Status", |o| {
//!         o.convert_using(|s: Status| s as i32);
//!     })
//!     .for_member("IsActive", |o| {
//!         o.map_from("Status")
//!             .condition(|src, _| src.status == Status::Active)
//!             .convert_using(|s: Status| s == Status::Active);
//!     })
//!     .for_member("Address", |o| {
//!         o.map_from("Profile.Address");
//!     });
//! })?;
//!
//! let user = User { status: Status::Active, profile: None };
//! let dto: UserDto = engine.map(&user)?;
//! assert_eq!(dto.status, 1);
//! assert!(dto.is_active);
//! assert_eq!(dto.address, None);
//! # Ok::<(), shapemap::Error>(())
//! ```

mod builder;
mod configuration;
mod declaration;
mod engine;
mod options;
mod profile;
mod resolver;

pub use builder::{CompiledMapping, MappingBuilder};
pub use configuration::{PairRules, ReverseMapping, TypePairConfiguration};
pub use declaration::{MapDeclaration, MemberDeclaration};
pub use engine::{MappingEngine, PairState, TypePair};
pub use options::{MemberRules, PropertyOptions, ValueConverter};
pub use profile::MappingProfile;
pub use resolver::{MemberResolver, PathOrigin, Resolution, ValuePath};
