#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Extern Self

// The derive macro expands to `::jk_reflect::...` paths, which must also
// resolve inside this crate's own tests.
extern crate self as jk_reflect;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod error;
mod reflection;

pub mod codec;
pub mod impls;
pub mod info;
pub mod json;
pub mod registry;
pub mod serde;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use error::{
    ConfigurationError, ConstructError, DeserializationError, DowncastError, Error,
    SerializationError,
};
pub use jk_reflect_derive as derive;
pub use reflection::{FieldArgs, FromReflect, Record, Reflect, ReflectRef};

use serde_json::Value;

use crate::info::{TypeRef, Typed};
use crate::registry::{HierarchyConfig, TypeRegistry};

// -----------------------------------------------------------------------------
// Global API

/// Serializes `value` by its runtime type with the global registry.
///
/// See [`TypeRegistry::serialize`].
#[inline]
pub fn serialize(value: &dyn Reflect) -> Result<Value, Error> {
    TypeRegistry::global().serialize(value, None)
}

/// Serializes `value` against a declared type with the global registry.
#[inline]
pub fn serialize_as(value: &dyn Reflect, as_type: &TypeRef) -> Result<Value, Error> {
    TypeRegistry::global().serialize(value, Some(as_type))
}

/// Deserializes `data` against `as_type` with the global registry.
///
/// See [`TypeRegistry::deserialize`].
#[inline]
pub fn deserialize(data: &Value, as_type: &TypeRef) -> Result<alloc::boxed::Box<dyn Reflect>, Error> {
    TypeRegistry::global().deserialize(data, as_type)
}

/// Deserializes `data` into a `T` with the global registry.
#[inline]
pub fn deserialize_as<T: Typed + FromReflect>(data: &Value) -> Result<T, Error> {
    TypeRegistry::global().deserialize_as::<T>(data)
}

/// Registers a codec for `T` in the global registry.
///
/// See [`TypeRegistry::register_codec`].
#[inline]
pub fn register_codec<T: Typed>(codec: &alloc::sync::Arc<codec::CodecTemplate>) -> Result<(), ConfigurationError> {
    TypeRegistry::global().register_codec::<T>(codec)
}

/// Declares `R` as a hierarchy root in the global registry.
#[inline]
pub fn declare_hierarchy_root<R: Typed>(config: HierarchyConfig) -> Result<(), ConfigurationError> {
    TypeRegistry::global().declare_hierarchy_root::<R>(config)
}

/// Makes `T` (and all subtypes, if `T` is a hierarchy root) encode as a positional array.
#[inline]
pub fn declare_list_encoding<T: Typed>() {
    TypeRegistry::global().declare_list_encoding::<T>();
}

/// Overlays a field rename mapping on `T` in the global registry.
#[inline]
pub fn declare_field_rename<T: Typed>(mapping: &[(&str, &str)]) {
    TypeRegistry::global().declare_field_rename::<T>(mapping);
}
