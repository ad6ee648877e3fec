// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # shapemap
//!
//! A declarative, cached object-to-object mapper. `shapemap` translates instances of one shape
//! (a persistence or domain entity) into another (a transfer object) and back, without
//! per-field copy code, driven by a small per-pair configuration.
//!
//! ## Features
//!
//! - **Automatic matching** - Members with identical name and type are copied without configuration
//! - **Flattening** - `Profile.City` feeds a destination member `City` automatically
//! - **Custom paths** - Null-safe dot-separated paths override automatic resolution
//! - **Conditions** - Per-invocation predicates gate the assignment of single members
//! - **Null-substitution** - Fallback values for absent source values
//! - **Converters** - Typed value transforms between differently typed members
//! - **Hooks** - Before-map and after-map callbacks with access to both objects
//! - **Reverse mapping** - Derived configurations for the swapped direction
//! - **Caching** - Each pair is resolved once, every later call runs the compiled mapping
//!
//! ## Quick Start
//!
//! Types describe their members once through [`Mappable`], using getter and setter lenses in
//! place of runtime reflection:
//!
//! ```rust
//! use shapemap::prelude::*;
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
//!     cfg.reverse_map(&engine);
//! })?;
//!
//! let dto: UserDto = engine.map(&User { name: Some("ali".into()), email: None })?;
//! assert_eq!(dto.email.as_deref(), Some("none@x"));
//!
//! let back: User = engine.map(&dto)?;
//! assert_eq!(back.name.as_deref(), Some("ali"));
//! # Ok::<(), shapemap::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`schema`] - Type schemas, members, lenses and the dynamic [`Value`]
//! - [`mapping`] - Configuration model, member resolution, mapping builder and the engine
//! - [`config`] - Engine-wide behaviour switches
//! - [`Error`] and [`Result`] - Error handling
//!
//! ### Resolution Order
//!
//! For every writable destination member, the first applicable rule wins:
//!
//! 1. ignored members are never assigned
//! 2. a configured custom path
//! 3. a source member with identical name and declared type
//! 4. a second-level source member with identical name and declared type
//!
//! Members without a value source keep the value their type's construction gave them. Enable
//! [`MapperConfig::strict`] to turn them into errors instead.
//!
//! ## Logging
//!
//! The crate emits [`tracing`](https://docs.rs/tracing) events: schema description and member
//! resolution at `trace`, compiled pairs and unassigned members at `debug`, and configuration
//! that can no longer take effect at `warn`. No subscriber is installed.
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, Error>`](Result):
//!
//! ```rust
//! use shapemap::{Error, Mappable, MappingEngine, TypeSchema};
//!
//! #[derive(Default)]
//! struct Empty;
//!
//! impl Mappable for Empty {
//!     fn describe() -> TypeSchema {
//!         TypeSchema::builder::<Empty>("Empty").default_constructible().build()
//!     }
//! }
//!
//! let engine = MappingEngine::new();
//! match engine.map_option::<Empty, Empty>(None) {
//!     Ok(_) => unreachable!(),
//!     Err(Error::InvalidArgument(message)) => println!("rejected: {message}"),
//!     Err(e) => println!("other error: {e}"),
//! }
//! ```

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// This module provides a curated selection of the most frequently used types
/// from across the shapemap library, allowing for convenient glob imports.
///
/// # Example
///
/// ```rust
/// use shapemap::prelude::*;
///
/// let engine = MappingEngine::with_config(MapperConfig::strict());
/// assert!(engine.config().strict_members);
/// ```
pub mod prelude;

pub mod config;
pub mod mapping;
pub mod schema;

/// `shapemap` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
/// This is used consistently throughout the crate for all fallible operations.
pub type Result<T> = std::result::Result<T, Error>;

/// `shapemap` Error type
///
/// The main error type for all operations in this crate. Covers absent sources, construction
/// failures, value coercion and inconsistent configuration.
pub use error::Error;

pub use config::MapperConfig;
pub use mapping::{MappingEngine, MappingProfile, PairState, TypePairConfiguration};
pub use schema::{
    CustomValue, DeclaredType, MapValue, Mappable, SchemaBuilder, TypeSchema, Value, ValueKind,
};
