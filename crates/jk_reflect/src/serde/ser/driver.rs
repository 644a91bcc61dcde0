use alloc::borrow::ToOwned;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec::Vec;

use serde_json::{Map, Number, Value};

use crate::codec::RealizedCodec;
use crate::info::{ScalarKind, TypeInfo, TypeRef};
use crate::registry::{CodecEntry, SubtypeKey, Tag, TypeRegistry};
use crate::{ConfigurationError, Error, Reflect, ReflectRef, SerializationError};

// -----------------------------------------------------------------------------
// SerializeDriver

/// Encodes reflected values into [`Value`]s.
///
/// A driver borrows the registry it reads codecs, hierarchies and encoding
/// overrides from. Codecs receive the driver so they can encode nested
/// values the same way.
///
/// # Examples
///
/// ```
/// use jk_reflect::info::TypeRef;
/// use jk_reflect::registry::TypeRegistry;
/// use jk_reflect::serde::SerializeDriver;
/// use serde_json::json;
///
/// let registry = TypeRegistry::new();
/// let driver = SerializeDriver::new(&registry);
///
/// let data = driver.serialize(&vec![1_u8, 2, 3], None).unwrap();
/// assert_eq!(data, json!([1, 2, 3]));
///
/// let declared = TypeRef::union([TypeRef::of::<String>(), TypeRef::of::<i64>()]);
/// assert_eq!(driver.serialize(&7_i64, Some(&declared)).unwrap(), json!(7));
/// ```
pub struct SerializeDriver<'a> {
    registry: &'a TypeRegistry,
}

impl<'a> SerializeDriver<'a> {
    #[inline]
    pub fn new(registry: &'a TypeRegistry) -> Self {
        Self { registry }
    }

    #[inline]
    pub fn registry(&self) -> &'a TypeRegistry {
        self.registry
    }

    /// Encodes `value`, against `as_type` when one is declared.
    ///
    /// This does not check for unserializable values; use
    /// [`TypeRegistry::serialize`] for a checked top-level call.
    pub fn serialize(&self, value: &dyn Reflect, as_type: Option<&TypeRef>) -> Result<Value, Error> {
        let value = value.peel();
        if let Some(codec) = value.downcast_ref::<Arc<RealizedCodec>>() {
            return self.serialize_codec_value(codec);
        }

        let Some(as_type) = as_type else {
            return self.encode(value, None);
        };

        match as_type {
            TypeRef::Any => self.encode(value, None),
            TypeRef::Union(alternatives) => self.serialize_union(value, alternatives),
            TypeRef::Named(name) => {
                let resolved = self.registry.resolve_name(name)?;
                self.serialize(value, Some(&resolved))
            }
            TypeRef::Codec(codec) => codec.serialize(value, self),
            TypeRef::Template(template) => {
                if template.is_static() {
                    template.instance()?.serialize(value, self)
                } else {
                    Err(SerializationError::UnrealizedCodec(template.name()).into())
                }
            }
            TypeRef::List(item) => match value.reflect_ref() {
                ReflectRef::List(items) | ReflectRef::Tuple(items) => self.sequence(items, |_| Some(&**item)),
                _ => Err(SerializationError::TypeMismatch("list", value.reflect_type_path()).into()),
            },
            TypeRef::Map(item) => match value.reflect_ref() {
                ReflectRef::Map(entries) => self.mapping(entries, Some(&**item)),
                _ => Err(SerializationError::TypeMismatch("map", value.reflect_type_path()).into()),
            },
            TypeRef::Type(info) => self.serialize_typed(value, as_type, info()),
        }
    }

    fn serialize_union(&self, value: &dyn Reflect, alternatives: &[TypeRef]) -> Result<Value, Error> {
        for alternative in alternatives {
            match self.serialize(value, Some(alternative)) {
                Ok(data) => return Ok(data),
                Err(err) if err.is_mismatch() => {
                    log::trace!(
                        "`{}` rejected by union alternative `{alternative}`: {err}",
                        value.reflect_type_path()
                    );
                }
                Err(err) => return Err(err),
            }
        }
        Err(SerializationError::NoUnionMatch(value.reflect_type_path()).into())
    }

    fn serialize_typed(
        &self,
        value: &dyn Reflect,
        as_type: &TypeRef,
        info: &'static TypeInfo,
    ) -> Result<Value, Error> {
        match info {
            TypeInfo::Dynamic(_) => return self.encode(value, None),
            TypeInfo::Root(_) => {
                if let Some(tag) = self.member_tag(value, info) {
                    return self.serialize_member(value, tag);
                }
            }
            _ if value.concrete_type_id() == info.type_id() => return self.encode(value, Some(info)),
            TypeInfo::Scalar(scalar) if conforms(scalar.kind(), value) => {
                return self.encode(value, None);
            }
            _ => {}
        }

        // An option declared through its inner type, or a bare value
        // declared as an option.
        match value.reflect_ref() {
            ReflectRef::Option(None) => Ok(Value::Null),
            ReflectRef::Option(Some(inner)) => self.serialize(inner, Some(as_type)),
            _ => {
                if let TypeInfo::Option(option) = info {
                    return self.serialize(value, Some(option.some()));
                }
                if matches!(info, TypeInfo::Root(_)) {
                    self.registry.hierarchy_config(info)?;
                }
                Err(SerializationError::TypeMismatch(info.type_path(), value.reflect_type_path()).into())
            }
        }
    }

    /// The membership of `value` in the hierarchy `root`.
    fn member_tag(&self, value: &dyn Reflect, root: &'static TypeInfo) -> Option<Tag> {
        self.registry
            .member_tag(SubtypeKey::Type(value.concrete_type_id()))
            .filter(|tag| tag.root == root.type_id())
    }

    /// Encodes a hierarchy member declared through its root.
    ///
    /// Records write their own discriminator; any other member encoded to
    /// an object gets it prepended here.
    fn serialize_member(&self, value: &dyn Reflect, tag: Tag) -> Result<Value, Error> {
        let data = self.encode(value, None)?;
        if !tag.is_inside() || matches!(value.reflect_ref(), ReflectRef::Record(_)) {
            return Ok(data);
        }
        match data {
            Value::Object(fields) if !fields.contains_key(&tag.discriminator) => {
                let mut object = Map::with_capacity(fields.len() + 1);
                object.insert(tag.discriminator, Value::String(tag.alias));
                object.extend(fields);
                Ok(Value::Object(object))
            }
            data => Ok(data),
        }
    }

    /// Writes the parameters of a realized codec, tagged when the codec's
    /// template is a hierarchy member.
    fn serialize_codec_value(&self, codec: &RealizedCodec) -> Result<Value, Error> {
        let template = codec.template();
        let mut object = Map::new();

        let tag = self
            .registry
            .member_tag(SubtypeKey::Template(template.id()))
            .filter(|tag| tag.is_inside());
        if let Some(tag) = &tag {
            object.insert(tag.discriminator.clone(), Value::String(tag.alias.clone()));
        }

        for (name, param) in template.params().iter().zip(codec.params()) {
            if tag.as_ref().is_some_and(|tag| tag.discriminator == *name) {
                return Err(SerializationError::DiscriminatorConflict {
                    type_path: template.name(),
                    field: (*name).to_owned(),
                }
                .into());
            }
            object.insert((*name).to_owned(), param.to_json()?);
        }
        Ok(Value::Object(object))
    }

    /// Encodes by runtime structure, using the element types of `info`
    /// when the value's declared type is known.
    pub(super) fn encode(&self, value: &dyn Reflect, info: Option<&'static TypeInfo>) -> Result<Value, Error> {
        if let Some(entry) = self.registry.codec_for(value.concrete_type_id()) {
            return match entry {
                CodecEntry::Realized(codec) => codec.serialize(value, self),
                CodecEntry::Template(template) => {
                    Err(SerializationError::UnrealizedCodec(template.name()).into())
                }
            };
        }

        match value.reflect_ref() {
            ReflectRef::Unit | ReflectRef::Option(None) => Ok(Value::Null),
            ReflectRef::Bool(value) => Ok(Value::Bool(value)),
            ReflectRef::Int(value) => Ok(Value::from(value)),
            ReflectRef::UInt(value) => Ok(Value::from(value)),
            ReflectRef::Float(value) => float(value),
            ReflectRef::Str(value) => Ok(Value::String(value.to_owned())),
            ReflectRef::Option(Some(inner)) => {
                let some = match info {
                    Some(TypeInfo::Option(option)) => Some(option.some()),
                    _ => None,
                };
                self.serialize(inner, some)
            }
            ReflectRef::List(items) => {
                let item = match info {
                    Some(TypeInfo::List(list)) => Some(list.item()),
                    _ => None,
                };
                self.sequence(items, |_| item)
            }
            ReflectRef::Tuple(items) => {
                let types = match info {
                    Some(TypeInfo::Tuple(tuple)) => tuple.items(),
                    _ => &[],
                };
                self.sequence(items, |index| types.get(index))
            }
            ReflectRef::Map(entries) => {
                let item = match info {
                    Some(TypeInfo::Map(map)) => Some(map.value()),
                    _ => None,
                };
                self.mapping(entries, item)
            }
            ReflectRef::Record(record) => self.serialize_record(record),
            ReflectRef::Codec(codec) => self.serialize_codec_value(codec),
            ReflectRef::Raw(data) => Ok(data.clone()),
            ReflectRef::Boxed(inner) => self.serialize(inner, None),
            ReflectRef::Opaque => Err(ConfigurationError::NoCodec(value.reflect_type_path()).into()),
        }
    }

    fn sequence<'t>(
        &self,
        items: Vec<&dyn Reflect>,
        item_type: impl Fn(usize) -> Option<&'t TypeRef>,
    ) -> Result<Value, Error> {
        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| self.serialize(item, item_type(index)))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }

    fn mapping(
        &self,
        entries: Vec<(&dyn Reflect, &dyn Reflect)>,
        item_type: Option<&TypeRef>,
    ) -> Result<Value, Error> {
        let mut object = Map::with_capacity(entries.len());
        for (key, value) in entries {
            object.insert(map_key(key)?, self.serialize(value, item_type)?);
        }
        Ok(Value::Object(object))
    }
}

// -----------------------------------------------------------------------------
// Helpers

#[inline]
fn float(value: f64) -> Result<Value, Error> {
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| SerializationError::NonFiniteFloat(value).into())
}

/// Object key of a map entry. Booleans and structured keys are refused.
fn map_key(key: &dyn Reflect) -> Result<String, Error> {
    let key = key.peel();
    match key.reflect_ref() {
        ReflectRef::Str(key) => Ok(key.to_owned()),
        ReflectRef::Int(key) => Ok(key.to_string()),
        ReflectRef::UInt(key) => Ok(key.to_string()),
        ReflectRef::Float(key) if key.is_finite() => Ok(key.to_string()),
        ReflectRef::Float(key) => Err(SerializationError::NonFiniteFloat(key).into()),
        _ => Err(SerializationError::UnsupportedMapKey(key.reflect_type_path()).into()),
    }
}

/// Whether a value of another type may be written as a scalar of `kind`.
///
/// Integers of any width satisfy an integer declaration and widen into a
/// float one. Nothing else crosses kinds.
fn conforms(kind: ScalarKind, value: &dyn Reflect) -> bool {
    matches!(
        (kind, value.reflect_ref()),
        (ScalarKind::Unit, ReflectRef::Unit)
            | (ScalarKind::Bool, ReflectRef::Bool(_))
            | (ScalarKind::Int | ScalarKind::UInt, ReflectRef::Int(_) | ReflectRef::UInt(_))
            | (ScalarKind::Float, ReflectRef::Int(_) | ReflectRef::UInt(_) | ReflectRef::Float(_))
            | (ScalarKind::Str, ReflectRef::Str(_))
    )
}
