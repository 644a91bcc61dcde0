use alloc::borrow::Cow;
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::mem;

use crate::codec::{CodecTemplate, RealizedCodec};
use crate::info::{TypeInfo, Typed};

/// The declared type of a field, or the target of a (de)serialization call.
///
/// Static Rust types are referenced through their [`TypeInfo`] getter, so
/// building a `TypeRef` never forces type information into existence and
/// self-referential records stay finite.
///
/// # Examples
///
/// ```
/// use jk_reflect::info::TypeRef;
///
/// let union = TypeRef::union([TypeRef::of::<i64>(), TypeRef::of::<String>()]);
/// assert_eq!(union.to_string(), "i64 | alloc::string::String");
/// assert_eq!(union, TypeRef::union([TypeRef::of::<i64>(), TypeRef::of::<String>()]));
/// ```
#[derive(Clone)]
pub enum TypeRef {
    /// Wildcard: plain data passes through unchanged.
    Any,
    /// A statically known Rust type.
    Type(fn() -> &'static TypeInfo),
    /// A codec bound to its parameters.
    Codec(Arc<RealizedCodec>),
    /// An unbound codec; decoding realizes it from the payload's parameters.
    Template(Arc<CodecTemplate>),
    /// Ordered alternatives; the first structural match wins.
    Union(Arc<[TypeRef]>),
    /// A `Vec<Box<dyn Reflect>>` whose elements have the given type.
    List(Arc<TypeRef>),
    /// A `BTreeMap<String, Box<dyn Reflect>>` whose values have the given type.
    Map(Arc<TypeRef>),
    /// A forward reference resolved through the registry's name table.
    Named(Cow<'static, str>),
}

impl TypeRef {
    #[inline]
    pub fn of<T: Typed>() -> Self {
        Self::Type(T::type_info)
    }

    #[inline]
    pub fn codec(codec: &Arc<RealizedCodec>) -> Self {
        Self::Codec(Arc::clone(codec))
    }

    #[inline]
    pub fn template(template: &Arc<CodecTemplate>) -> Self {
        Self::Template(Arc::clone(template))
    }

    pub fn union(alternatives: impl IntoIterator<Item = TypeRef>) -> Self {
        Self::Union(alternatives.into_iter().collect::<Vec<_>>().into())
    }

    #[inline]
    pub fn list_of(item: TypeRef) -> Self {
        Self::List(Arc::new(item))
    }

    #[inline]
    pub fn map_of(value: TypeRef) -> Self {
        Self::Map(Arc::new(value))
    }

    #[inline]
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Named(name.into())
    }

    /// The static type information, for [`TypeRef::Type`] only.
    #[inline]
    pub fn type_info(&self) -> Option<&'static TypeInfo> {
        match self {
            Self::Type(info) => Some(info()),
            _ => None,
        }
    }

    /// Whether a [`TypeRef::Named`] occurs anywhere inside.
    pub fn has_names(&self) -> bool {
        match self {
            Self::Named(_) => true,
            Self::Union(alternatives) => alternatives.iter().any(Self::has_names),
            Self::List(item) | Self::Map(item) => item.has_names(),
            _ => false,
        }
    }
}

// -----------------------------------------------------------------------------
// Identity

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Any, Self::Any) => true,
            (Self::Type(a), Self::Type(b)) => a().type_id() == b().type_id(),
            (Self::Codec(a), Self::Codec(b)) => a == b,
            (Self::Template(a), Self::Template(b)) => a.id() == b.id(),
            (Self::Union(a), Self::Union(b)) => a == b,
            (Self::List(a), Self::List(b)) | (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Named(a), Self::Named(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        mem::discriminant(self).hash(state);
        match self {
            Self::Any => {}
            Self::Type(info) => info().type_id().hash(state),
            Self::Codec(codec) => codec.hash(state),
            Self::Template(template) => template.id().hash(state),
            Self::Union(alternatives) => alternatives.hash(state),
            Self::List(item) | Self::Map(item) => item.hash(state),
            Self::Named(name) => name.hash(state),
        }
    }
}

// -----------------------------------------------------------------------------
// Display

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Type(info) => f.write_str(info().type_path()),
            Self::Codec(codec) => fmt::Display::fmt(codec, f),
            Self::Template(template) => f.write_str(template.name()),
            Self::Union(alternatives) => {
                let parts: Vec<String> = alternatives.iter().map(|alt| format!("{alt}")).collect();
                f.write_str(&parts.join(" | "))
            }
            Self::List(item) => write!(f, "list<{item}>"),
            Self::Map(item) => write!(f, "map<str, {item}>"),
            Self::Named(name) => write!(f, "`{name}`"),
        }
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::TypeRef;
    use alloc::string::String;

    #[test]
    fn identity_follows_the_type() {
        assert_eq!(TypeRef::of::<i32>(), TypeRef::of::<i32>());
        assert_ne!(TypeRef::of::<i32>(), TypeRef::of::<u32>());
        assert_ne!(TypeRef::Any, TypeRef::named("Any"));
        assert_eq!(
            TypeRef::list_of(TypeRef::named("Node")),
            TypeRef::list_of(TypeRef::named(String::from("Node")))
        );
    }

    #[test]
    fn finds_nested_names() {
        let nested = TypeRef::union([TypeRef::of::<i32>(), TypeRef::map_of(TypeRef::named("Leaf"))]);
        assert!(nested.has_names());
        assert!(!TypeRef::of::<i32>().has_names());
    }
}
