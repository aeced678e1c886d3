//! Serializer capability consumed by the encode operator.
//!
//! Ships a JSON implementation and a closure adapter.

#![warn(missing_docs)]

pub mod error;
pub mod json;
pub mod serializer;

pub use error::CodecError;
pub use json::{JsonSerializer, JsonValueSerializer};
pub use serializer::{FnSerializer, Serializer};
