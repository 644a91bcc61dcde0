use alloc::boxed::Box;
use alloc::string::ToString;
use core::any::type_name;

use serde_core::Serialize;
use serde_core::de::DeserializeOwned;
use serde_json::Value;

use crate::codec::Codec;
use crate::serde::{DeserializeDriver, SerializeDriver};
use crate::{DeserializationError, Error, Reflect, SerializationError};

type EraseFn = fn(&dyn Reflect) -> Option<&dyn erased_serde::Serialize>;
type RestoreFn =
    fn(&mut dyn erased_serde::Deserializer<'_>) -> Result<Box<dyn Reflect>, erased_serde::Error>;

/// A codec that defers to a type's own `serde` implementations.
///
/// The concrete type is erased with `erased-serde`, so one codec type
/// serves every bridged type.
///
/// ```
/// use jk_reflect::codec::{CodecTemplate, SerdeCodec};
/// use jk_reflect::registry::TypeRegistry;
/// use jk_reflect::impl_opaque;
///
/// #[derive(serde::Serialize, serde::Deserialize, Debug, PartialEq)]
/// struct Rgb(u8, u8, u8);
///
/// impl_opaque!(Rgb);
///
/// let registry = TypeRegistry::new();
/// registry.register_serde::<Rgb>().unwrap();
///
/// let data = registry.serialize(&Rgb(1, 2, 3), None).unwrap();
/// assert_eq!(data, serde_json::json!([1, 2, 3]));
/// assert_eq!(registry.deserialize_as::<Rgb>(&data).unwrap(), Rgb(1, 2, 3));
/// ```
pub struct SerdeCodec {
    type_path: &'static str,
    erase: EraseFn,
    restore: RestoreFn,
}

fn erase<T: Reflect + Serialize>(value: &dyn Reflect) -> Option<&dyn erased_serde::Serialize> {
    let value = value.downcast_ref::<T>()?;
    Some(value)
}

fn restore<T: Reflect + DeserializeOwned>(
    deserializer: &mut dyn erased_serde::Deserializer<'_>,
) -> Result<Box<dyn Reflect>, erased_serde::Error> {
    let value: T = erased_serde::deserialize(deserializer)?;
    Ok(Box::new(value))
}

impl SerdeCodec {
    pub fn of<T: Reflect + Serialize + DeserializeOwned>() -> Self {
        Self {
            type_path: type_name::<T>(),
            erase: erase::<T>,
            restore: restore::<T>,
        }
    }
}

impl Codec for SerdeCodec {
    fn serialize(&self, value: &dyn Reflect, _: &SerializeDriver<'_>) -> Result<Value, Error> {
        let erased = (self.erase)(value).ok_or(SerializationError::TypeMismatch(
            self.type_path,
            value.reflect_type_path(),
        ))?;
        Ok(serde_json::to_value(erased)?)
    }

    fn deserialize(&self, data: &Value, _: &DeserializeDriver<'_>) -> Result<Box<dyn Reflect>, Error> {
        let mut deserializer = <dyn erased_serde::Deserializer>::erase(data.clone());
        (self.restore)(&mut deserializer)
            .map_err(|err| DeserializationError::mismatch(self.type_path, err.to_string()).into())
    }
}
