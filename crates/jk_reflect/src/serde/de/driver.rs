use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use serde_json::{Map, Value};

use crate::codec::{CodecArgs, CodecTemplate, ParamValue, RealizedCodec};
use crate::info::{MapInfo, TypeInfo, TypeRef};
use crate::registry::{CodecEntry, TypeRegistry};
use crate::serde::kind_of;
use crate::{ConfigurationError, DeserializationError, Error, Reflect};

/// The object enclosing the value being decoded, where outside
/// discriminators are read from.
pub(super) type Parent<'p> = Option<&'p Map<String, Value>>;

// -----------------------------------------------------------------------------
// DeserializeDriver

/// Decodes [`Value`]s into reflected values.
///
/// The returned box always holds a value of exactly the requested type:
///
/// | target | boxed value |
/// |--------|-------------|
/// | `TypeRef::of::<T>()` | `T` |
/// | hierarchy root `Box<dyn R>` | `Box<dyn R>` |
/// | `TypeRef::Any`, `Box<dyn Reflect>` | `serde_json::Value` |
/// | `TypeRef::list_of(..)` | `Vec<Box<dyn Reflect>>` |
/// | `TypeRef::map_of(..)` | `BTreeMap<String, Box<dyn Reflect>>` |
/// | a codec template | `Arc<RealizedCodec>` |
///
/// # Examples
///
/// ```
/// use jk_reflect::info::TypeRef;
/// use jk_reflect::registry::TypeRegistry;
/// use jk_reflect::serde::DeserializeDriver;
/// use serde_json::json;
///
/// let registry = TypeRegistry::new();
/// let driver = DeserializeDriver::new(&registry);
///
/// let value = driver.deserialize(&json!([1, 2]), &TypeRef::of::<Vec<u8>>()).unwrap();
/// assert_eq!(value.take::<Vec<u8>>().unwrap(), [1, 2]);
///
/// // Scalars are strict.
/// assert!(driver.deserialize(&json!("1"), &TypeRef::of::<u8>()).is_err());
/// ```
pub struct DeserializeDriver<'a> {
    registry: &'a TypeRegistry,
}

impl<'a> DeserializeDriver<'a> {
    #[inline]
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self { registry }
    }

    #[inline]
    pub fn registry(&self) -> &'a TypeRegistry {
        self.registry
    }

    /// Decodes `data` against `as_type`.
    #[inline]
    pub fn deserialize(&self, data: &Value, as_type: &TypeRef) -> Result<Box<dyn Reflect>, Error> {
        self.decode(data, as_type, None)
    }

    pub(super) fn decode(
        &self,
        data: &Value,
        as_type: &TypeRef,
        parent: Parent<'_>,
    ) -> Result<Box<dyn Reflect>, Error> {
        match as_type {
            TypeRef::Any => Ok(Box::new(data.clone())),
            TypeRef::Union(alternatives) => self.decode_union(data, alternatives, parent),
            TypeRef::Named(name) => {
                let resolved = self.registry.resolve_name(name)?;
                self.decode(data, &resolved, parent)
            }
            TypeRef::Codec(codec) => codec.deserialize(data, self),
            TypeRef::Template(template) => Ok(Box::new(self.realize(data, template)?)),
            TypeRef::List(item) => {
                let items = expect_array(data, "array")?
                    .iter()
                    .map(|element| self.decode(element, item, None))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Box::new(items))
            }
            TypeRef::Map(item) => {
                let mut entries = BTreeMap::new();
                for (key, value) in expect_object(data, "object")? {
                    entries.insert(key.clone(), self.decode(value, item, None)?);
                }
                Ok(Box::new(entries))
            }
            TypeRef::Type(info) => self.decode_typed(data, info(), parent),
        }
    }

    fn decode_union(
        &self,
        data: &Value,
        alternatives: &[TypeRef],
        parent: Parent<'_>,
    ) -> Result<Box<dyn Reflect>, Error> {
        for alternative in alternatives {
            match self.decode(data, alternative, parent) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_mismatch() => {
                    log::trace!("union alternative `{alternative}` rejected {}: {err}", kind_of(data));
                }
                Err(err) => return Err(err),
            }
        }
        Err(DeserializationError::NoUnionMatch.into())
    }

    /// Binds a template to the parameters carried by `data`.
    fn realize(&self, data: &Value, template: &Arc<CodecTemplate>) -> Result<Arc<RealizedCodec>, Error> {
        if template.is_static() {
            return Ok(template.instance()?);
        }

        let object = data.as_object().ok_or_else(|| {
            DeserializationError::mismatch(format!("`{}` parameters", template.name()), kind_of(data))
        })?;
        let mut args = CodecArgs::new();
        for name in template.params() {
            let value = object.get(*name).ok_or_else(|| DeserializationError::MissingField {
                type_path: template.name(),
                field: (*name).into(),
            })?;
            args = args.named(*name, ParamValue::from_json(value));
        }
        Ok(template.realize(args)?)
    }

    fn decode_typed(
        &self,
        data: &Value,
        info: &'static TypeInfo,
        parent: Parent<'_>,
    ) -> Result<Box<dyn Reflect>, Error> {
        if !info.is_container() {
            match self.registry.codec_for(info.type_id()) {
                Some(CodecEntry::Realized(codec)) => return codec.deserialize(data, self),
                Some(CodecEntry::Template(template)) => {
                    return Err(ConfigurationError::UnrealizedCodec(template.name()).into());
                }
                None => {}
            }
        }

        match info {
            TypeInfo::Scalar(scalar) => scalar
                .from_value(data)
                .ok_or_else(|| DeserializationError::mismatch(info.type_path(), kind_of(data)).into()),
            TypeInfo::Option(option) => {
                let inner = match data {
                    Value::Null => None,
                    data => Some(self.decode(data, option.some(), parent)?),
                };
                Ok(option.build(inner)?)
            }
            TypeInfo::List(list) => {
                let items = expect_array(data, info.type_path())?
                    .iter()
                    .map(|element| self.decode(element, list.item(), None))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(list.build(items)?)
            }
            TypeInfo::Tuple(tuple) => {
                let elements = expect_array(data, info.type_path())?;
                if elements.len() != tuple.items().len() {
                    return Err(DeserializationError::mismatch(
                        format!("{} elements for `{}`", tuple.items().len(), info.type_path()),
                        format!("{} elements", elements.len()),
                    )
                    .into());
                }
                let items = elements
                    .iter()
                    .zip(tuple.items())
                    .map(|(element, ty)| self.decode(element, ty, None))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(tuple.build(items)?)
            }
            TypeInfo::Map(map) => self.decode_map(data, info, map),
            TypeInfo::Record(record) => self.decode_record(data, record),
            TypeInfo::Root(_) => self.decode_root(data, info, parent),
            TypeInfo::Opaque(_) => Err(ConfigurationError::NoCodec(info.type_path()).into()),
            TypeInfo::Dynamic(_) | TypeInfo::Raw(_) => Ok(Box::new(data.clone())),
        }
    }

    fn decode_map(
        &self,
        data: &Value,
        info: &'static TypeInfo,
        map: &'static MapInfo,
    ) -> Result<Box<dyn Reflect>, Error> {
        let key_info = map.key().type_info();
        let key = match key_info {
            Some(TypeInfo::Scalar(scalar)) if scalar.kind().is_key() => scalar,
            _ => {
                let path = key_info.map_or(info.type_path(), TypeInfo::type_path);
                return Err(ConfigurationError::UnsupportedMapKey(path).into());
            }
        };

        let entries = expect_object(data, info.type_path())?
            .iter()
            .map(|(text, value)| {
                let parsed = key.from_key(text).ok_or_else(|| DeserializationError::InvalidKey {
                    key: text.clone(),
                    expected: map.key().type_info().map_or("key", TypeInfo::type_path),
                })?;
                Ok((parsed, self.decode(value, map.value(), None)?))
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(map.build(entries)?)
    }
}

// -----------------------------------------------------------------------------
// Helpers

pub(super) fn expect_array<'v>(
    data: &'v Value,
    expected: &'static str,
) -> Result<&'v Vec<Value>, DeserializationError> {
    data.as_array()
        .ok_or_else(|| DeserializationError::mismatch(format!("array for `{expected}`"), kind_of(data)))
}

pub(super) fn expect_object<'v>(
    data: &'v Value,
    expected: &'static str,
) -> Result<&'v Map<String, Value>, DeserializationError> {
    data.as_object()
        .ok_or_else(|| DeserializationError::mismatch(format!("object for `{expected}`"), kind_of(data)))
}
