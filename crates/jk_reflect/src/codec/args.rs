use alloc::borrow::{Cow, ToOwned};
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::mem;
use std::sync::{OnceLock, PoisonError, RwLock};

use jk_utils::hash::HashMap;
use serde_json::{Map, Number, Value};

use crate::codec::CodecTemplate;
use crate::info::TypeRef;
use crate::{ConfigurationError, SerializationError};

// -----------------------------------------------------------------------------
// ParamValue

/// A codec construction parameter.
///
/// `Float` and `Json` parameters are unhashable: codecs built with them
/// are not interned, and compare structurally.
///
/// A `Type` parameter is written as `{"$type": "<type path or name>"}`.
/// Reading it back yields the same [`TypeRef::Type`] when that type has
/// been a codec argument in this process, and a [`TypeRef::Named`]
/// otherwise.
#[derive(Clone, Debug)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(Cow<'static, str>),
    List(Vec<ParamValue>),
    Type(TypeRef),
    Json(Value),
}

impl ParamValue {
    pub fn is_hashable(&self) -> bool {
        match self {
            Self::Float(_) | Self::Json(_) => false,
            Self::List(items) => items.iter().all(Self::is_hashable),
            _ => true,
        }
    }

    /// Non-negative integers are stored as `UInt` so `3_i64` and `3_u64`
    /// name the same realization.
    pub(crate) fn canonical(self) -> Self {
        match self {
            Self::Int(value) if value >= 0 => Self::UInt(value as u64),
            Self::List(items) => Self::List(items.into_iter().map(Self::canonical).collect()),
            other => other,
        }
    }

    /// Reads a parameter back from its plain-data form.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(value) => Self::Bool(*value),
            Value::Number(number) => {
                if let Some(value) = number.as_u64() {
                    Self::UInt(value)
                } else if let Some(value) = number.as_i64() {
                    Self::Int(value)
                } else {
                    Self::Float(number.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(value) => Self::Str(Cow::Owned(value.clone())),
            Value::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            Value::Object(object) => match object.get(TYPE_TAG).and_then(Value::as_str) {
                Some(path) if object.len() == 1 => Self::Type(known_type(path)),
                _ => Self::Json(value.clone()),
            },
        }
    }

    /// The plain-data form, written when a realized codec is serialized as a value.
    pub fn to_json(&self) -> Result<Value, SerializationError> {
        Ok(match self {
            Self::Null => Value::Null,
            Self::Bool(value) => Value::Bool(*value),
            Self::Int(value) => Value::from(*value),
            Self::UInt(value) => Value::from(*value),
            Self::Float(value) => Number::from_f64(*value)
                .map(Value::Number)
                .ok_or(SerializationError::NonFiniteFloat(*value))?,
            Self::Str(value) => Value::String(value.to_string()),
            Self::List(items) => Value::Array(
                items
                    .iter()
                    .map(Self::to_json)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            Self::Type(TypeRef::Type(info)) => type_tag(info().type_path()),
            Self::Type(TypeRef::Named(name)) => type_tag(name),
            Self::Type(other) => {
                return Err(SerializationError::Custom(Cow::Owned(alloc::format!(
                    "type parameter `{other}` has no plain-data form"
                ))));
            }
            Self::Json(value) => value.clone(),
        })
    }
}

// -----------------------------------------------------------------------------
// Type parameters

const TYPE_TAG: &str = "$type";

fn type_tag(path: &str) -> Value {
    let mut object = Map::with_capacity(1);
    object.insert(TYPE_TAG.to_owned(), Value::String(path.to_owned()));
    Value::Object(object)
}

/// Every `TypeRef::Type` passed as a codec argument, by type path.
fn known_types() -> &'static RwLock<HashMap<&'static str, TypeRef>> {
    static TABLE: OnceLock<RwLock<HashMap<&'static str, TypeRef>>> = OnceLock::new();
    TABLE.get_or_init(|| RwLock::new(HashMap::default()))
}

fn remember_types(value: &ParamValue) {
    match value {
        ParamValue::Type(TypeRef::Type(info)) => {
            let path = info().type_path();
            let table = known_types();
            if !table.read().unwrap_or_else(PoisonError::into_inner).contains_key(path) {
                table
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(path, TypeRef::Type(*info));
            }
        }
        ParamValue::List(items) => items.iter().for_each(remember_types),
        _ => {}
    }
}

fn known_type(path: &str) -> TypeRef {
    known_types()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(path)
        .cloned()
        .unwrap_or_else(|| TypeRef::named(path.to_owned()))
}

impl PartialEq for ParamValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::UInt(a), Self::UInt(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Type(a), Self::Type(b)) => a == b,
            (Self::Json(a), Self::Json(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ParamValue {}

impl Hash for ParamValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        mem::discriminant(self).hash(state);
        match self {
            Self::Null | Self::Json(_) => {}
            Self::Bool(value) => value.hash(state),
            Self::Int(value) => value.hash(state),
            Self::UInt(value) => value.hash(state),
            Self::Float(value) => value.to_bits().hash(state),
            Self::Str(value) => value.hash(state),
            Self::List(items) => items.hash(state),
            Self::Type(ty) => ty.hash(state),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::UInt(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Str(value) => write!(f, "{value:?}"),
            Self::List(items) => {
                f.write_str("[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Type(ty) => write!(f, "{ty}"),
            Self::Json(value) => write!(f, "{value}"),
        }
    }
}

macro_rules! impl_param_from {
    ($($ty:ty => |$v:ident| $expr:expr),* $(,)?) => {
        $(
            impl From<$ty> for ParamValue {
                #[inline]
                fn from($v: $ty) -> Self {
                    $expr
                }
            }
        )*
    };
}

impl_param_from! {
    bool => |v| Self::Bool(v),
    i32 => |v| Self::Int(i64::from(v)),
    i64 => |v| Self::Int(v),
    u32 => |v| Self::UInt(u64::from(v)),
    u64 => |v| Self::UInt(v),
    usize => |v| Self::UInt(v as u64),
    f64 => |v| Self::Float(v),
    &'static str => |v| Self::Str(Cow::Borrowed(v)),
    String => |v| Self::Str(Cow::Owned(v)),
    TypeRef => |v| Self::Type(v),
    Value => |v| Self::Json(v),
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

// -----------------------------------------------------------------------------
// CodecArgs

/// Positional and named arguments for [`CodecTemplate::realize`].
///
/// ```
/// use jk_reflect::codec::CodecArgs;
///
/// let args = CodecArgs::new().arg(3_u64).named("label", "x");
/// assert_eq!(args.len(), 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct CodecArgs {
    positional: Vec<ParamValue>,
    named: Vec<(Cow<'static, str>, ParamValue)>,
}

impl CodecArgs {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    #[inline]
    pub fn arg(mut self, value: impl Into<ParamValue>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Adds a keyword argument.
    #[inline]
    pub fn named(mut self, name: impl Into<Cow<'static, str>>, value: impl Into<ParamValue>) -> Self {
        self.named.push((name.into(), value.into()));
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    /// Orders the arguments by the template's declared parameters.
    pub(crate) fn normalize(
        self,
        template: &CodecTemplate,
    ) -> Result<Vec<ParamValue>, ConfigurationError> {
        let codec = template.name();
        let declared = template.params();
        if self.positional.len() > declared.len() {
            return Err(ConfigurationError::TooManyArgs {
                codec,
                declared: declared.len(),
                given: self.positional.len(),
            });
        }

        let mut slots: Vec<Option<ParamValue>> = self.positional.into_iter().map(Some).collect();
        slots.resize(declared.len(), None);

        for (name, value) in self.named {
            let Some(index) = declared.iter().position(|param| *param == name) else {
                return Err(ConfigurationError::UnknownParam {
                    codec,
                    param: name.into_owned(),
                });
            };
            match slots.get_mut(index) {
                Some(slot) if slot.is_none() => *slot = Some(value),
                _ => {
                    return Err(ConfigurationError::DuplicateParam {
                        codec,
                        param: name.into_owned(),
                    });
                }
            }
        }

        let params = slots
            .into_iter()
            .zip(declared.iter().copied())
            .map(|(slot, param)| {
                slot.map(ParamValue::canonical)
                    .ok_or(ConfigurationError::MissingParam { codec, param })
            })
            .collect::<Result<Vec<_>, _>>()?;
        params.iter().for_each(remember_types);
        Ok(params)
    }
}
