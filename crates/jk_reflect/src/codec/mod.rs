//! Custom codecs and their parameterization.
//!
//! A codec replaces the structural encoding of a type. Codecs are declared
//! as a [`CodecTemplate`]: a name, an ordered parameter list and a build
//! function. Binding a template to concrete parameters yields an interned
//! [`RealizedCodec`], which is both the executable codec and a
//! [`TypeRef`](crate::info::TypeRef) usable as a field's declared type.
//!
//! # Examples
//!
//! ```
//! use std::sync::{Arc, LazyLock};
//!
//! use jk_reflect::codec::{Codec, CodecArgs, CodecParams, CodecTemplate};
//! use jk_reflect::serde::{DeserializeDriver, SerializeDriver};
//! use jk_reflect::{ConfigurationError, DeserializationError, Error, Reflect};
//! use serde_json::{Value, json};
//!
//! /// Stores an integer scaled by a fixed factor.
//! struct Scaled(i64);
//!
//! impl Codec for Scaled {
//!     fn serialize(&self, value: &dyn Reflect, _: &SerializeDriver<'_>) -> Result<Value, Error> {
//!         let value = value.downcast_ref::<i64>().copied().unwrap_or_default();
//!         Ok(json!(value * self.0))
//!     }
//!
//!     fn deserialize(&self, data: &Value, _: &DeserializeDriver<'_>) -> Result<Box<dyn Reflect>, Error> {
//!         let raw = data.as_i64().ok_or(DeserializationError::TypeMismatch {
//!             expected: "integer".into(),
//!             found: data.to_string().into(),
//!         })?;
//!         Ok(Box::new(raw / self.0))
//!     }
//! }
//!
//! fn build(params: &CodecParams<'_>) -> Result<Box<dyn Codec>, ConfigurationError> {
//!     Ok(Box::new(Scaled(params.i64("factor")?)))
//! }
//!
//! static SCALED: LazyLock<Arc<CodecTemplate>> =
//!     LazyLock::new(|| CodecTemplate::new("Scaled", &["factor"], build));
//!
//! let by_ten = SCALED.realize(CodecArgs::new().arg(10_i64)).unwrap();
//! let again = SCALED.realize(CodecArgs::new().named("factor", 10_i64)).unwrap();
//! assert!(Arc::ptr_eq(&by_ten, &again));
//! assert_eq!(by_ten.to_string(), "Scaled(factor=10)");
//! ```

use alloc::boxed::Box;

use serde_json::Value;

use crate::serde::{DeserializeDriver, SerializeDriver};
use crate::{Error, Reflect};

// -----------------------------------------------------------------------------
// Modules

mod args;
mod realized;
mod serde_codec;
mod template;

#[cfg(feature = "builtin")]
pub mod builtin;

// -----------------------------------------------------------------------------
// Exports

pub use args::{CodecArgs, ParamValue};
pub use realized::RealizedCodec;
pub use serde_codec::SerdeCodec;
pub use template::{CodecBuildFn, CodecId, CodecParams, CodecTemplate};

// -----------------------------------------------------------------------------
// Codec

/// Custom serialize/deserialize behavior for one or more types.
///
/// The drivers are passed in so a codec can recurse into nested values
/// with the same registry.
pub trait Codec: Send + Sync + 'static {
    fn serialize(&self, value: &dyn Reflect, driver: &SerializeDriver<'_>) -> Result<Value, Error>;

    fn deserialize(
        &self,
        data: &Value,
        driver: &DeserializeDriver<'_>,
    ) -> Result<Box<dyn Reflect>, Error>;
}
