//! # shapemap Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the shapemap library. Import this module to get quick access to everything needed to
//! describe types and configure mappings between them.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all shapemap operations
pub use crate::Error;

/// The result type used throughout shapemap
pub use crate::Result;

/// Engine-wide behaviour switches
pub use crate::MapperConfig;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Registry and dispatcher for mappings
pub use crate::mapping::{MappingEngine, MappingProfile, PairState};

// ================================================================================================
// Type Schemas
// ================================================================================================

/// Type description through lenses
pub use crate::schema::{Mappable, SchemaBuilder, TypeSchema};

/// Dynamic values and conversions
pub use crate::schema::{CustomValue, DeclaredType, MapValue, Value, ValueKind};

/// Implements `MapValue` for enumerations and other user types
pub use crate::custom_value;

// ================================================================================================
// Configuration Model
// ================================================================================================

/// Per-pair and per-member configuration
pub use crate::mapping::{
    MapDeclaration, MemberDeclaration, MemberRules, PairRules, PropertyOptions,
    ReverseMapping, TypePairConfiguration, ValueConverter,
};
