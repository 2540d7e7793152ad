//! Relata model types.
//!
//! This crate defines the boundary shapes shared by the Relata metadata
//! engine and its storage/REST adapters:
//!
//! - [`value`] - Runtime value types for property values
//! - [`property_map`] - The flat name → value map exchanged with adapters
//! - [`error`] - Value coercion error types
//!
//! All types implement `serde::Serialize` / `serde::Deserialize`, so an
//! adapter can ship them as JSON request/response bodies unchanged;
//! property maps serialize as plain JSON objects.

pub mod error;
pub mod property_map;
pub mod value;

pub use error::Error;
pub use property_map::PropertyMap;
pub use value::{Value, ValueKind};
