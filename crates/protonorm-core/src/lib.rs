//! # protonorm-core
//!
//! Normalize-and-validate routines for Protocol Buffer messages, generated
//! from rules declared in the schema.
//!
//! This crate provides:
//! - The runtime that generated code calls into (trimming, length and
//!   whitespace checks, map cleanup)
//! - Decoding of schema descriptors and their `protonorm.rules` options
//! - Synthesis of one `impl Validate` per message for the structs prost
//!   generates
//!
//! ## Architecture
//!
//! - [`validate`]: Runtime routines and the [`Validate`] trait
//! - [`constraint`]: The rules a field can carry
//! - [`descriptor`]: Descriptor decoding into a [`schema`] representation
//! - [`codegen`]: Rust source synthesis
//! - [`plugin`]: The protoc plugin request/response round trip
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! Rules are declared as field options:
//!
//! ```proto
//! import "protonorm/validate.proto";
//!
//! message Account {
//!   string handle = 1 [(protonorm.rules).string = {min_len: 3, max_len: 10, no_whitespace: true}];
//!   map<string, string> labels = 2 [(protonorm.rules).map = {}];
//! }
//! ```
//!
//! and the generated file is included next to the prost output:
//!
//! ```ignore
//! include!(concat!(env!("OUT_DIR"), "/shop.rs"));
//! include!(concat!(env!("OUT_DIR"), "/shop.validate.rs"));
//!
//! use protonorm_core::Validate;
//!
//! let mut account = Account { handle: "  alice ".into(), ..Default::default() };
//! let verdict = account.validate();
//! assert!(verdict.is_ok() && verdict.changed);
//! assert_eq!(account.handle, "alice");
//! ```
//!
//! The runtime can also be used directly:
//!
//! ```
//! use protonorm_core::{normalize_string, StringRules};
//!
//! let mut value = String::from("  bob  ");
//! let verdict = normalize_string("name", &mut value, &StringRules::new().min_len(3));
//! assert!(verdict.is_ok());
//! assert!(verdict.changed);
//! assert_eq!(value, "bob");
//! ```
//!
//! ## Features
//!
//! - `codegen` (default): descriptor decoding, synthesis inputs from
//!   descriptors, and the plugin driver. Crates that only compile generated
//!   code can disable it.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod codegen;
pub mod constraint;
#[cfg(feature = "codegen")]
pub mod descriptor;
pub mod error;
#[cfg(feature = "codegen")]
pub mod plugin;
pub mod schema;
pub mod validate;

#[cfg(test)]
mod fixtures;

// Re-export primary types for convenience
pub use codegen::{GenerationStats, SynthesizedFile, Synthesizer, SynthesizerConfig};
pub use constraint::{Constraint, FieldKind, MapRules, StringRules};
pub use error::{Error, Result};
pub use validate::{
    normalize_map, normalize_optional_string, normalize_string, Validate, ValidationError,
    Verdict,
};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
