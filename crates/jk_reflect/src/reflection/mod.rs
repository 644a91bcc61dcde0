use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::{Any, TypeId, type_name};
use core::fmt;

use serde_json::Value;

use crate::DowncastError;
use crate::codec::RealizedCodec;

// -----------------------------------------------------------------------------
// Modules

mod from_reflect;
mod record;

pub use from_reflect::FromReflect;
pub use record::{FieldArgs, Record};

// -----------------------------------------------------------------------------
// Reflect

/// A value the engine can inspect.
///
/// `Reflect` exposes the structural view of a value through
/// [`reflect_ref`](Reflect::reflect_ref). It is implemented for scalars,
/// the standard containers, tuples, every `#[derive(Record)]` type and
/// trait-object boxes declared with [`impl_hierarchy_root!`](crate::impl_hierarchy_root).
///
/// The engine never mutates a value through this trait.
pub trait Reflect: Any + Send + Sync {
    /// The full type path of the concrete value, e.g. `alloc::string::String`.
    fn reflect_type_path(&self) -> &'static str;

    /// Returns the structural view of this value.
    fn reflect_ref(&self) -> ReflectRef<'_>;
}

impl dyn Reflect {
    #[inline]
    pub fn as_any(&self) -> &dyn Any {
        self
    }

    /// The [`TypeId`] of the concrete value behind this trait object.
    #[inline]
    pub fn concrete_type_id(&self) -> TypeId {
        self.as_any().type_id()
    }

    /// Follows [`ReflectRef::Boxed`] until reaching the inner value.
    pub fn peel(&self) -> &dyn Reflect {
        let mut current = self;
        while let ReflectRef::Boxed(inner) = current.reflect_ref() {
            current = inner;
        }
        current
    }

    /// Returns `true` if the concrete value is a `T`.
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }

    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Moves the concrete value out of the box.
    ///
    /// ```
    /// use jk_reflect::Reflect;
    ///
    /// let boxed: Box<dyn Reflect> = Box::new(7_u16);
    /// assert_eq!(boxed.take::<u16>().unwrap(), 7);
    ///
    /// let boxed: Box<dyn Reflect> = Box::new(7_u16);
    /// assert!(boxed.take::<i64>().is_err());
    /// ```
    pub fn take<T: Any>(self: Box<Self>) -> Result<T, DowncastError> {
        let found = self.reflect_type_path();
        let any: Box<dyn Any> = self;
        any.downcast::<T>().map(|value| *value).map_err(|_| DowncastError {
            expected: type_name::<T>(),
            found,
        })
    }
}

impl fmt::Debug for dyn Reflect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reflect({})", self.reflect_type_path())
    }
}

// -----------------------------------------------------------------------------
// ReflectRef

/// The structural view of a [`Reflect`] value.
///
/// Scalars are widened to `i64`, `u64` and `f64`. Sets and variable-length
/// tuples report [`List`](ReflectRef::List); their plain-data form is the
/// same ordered sequence.
pub enum ReflectRef<'a> {
    Unit,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(&'a str),
    Option(Option<&'a dyn Reflect>),
    List(Vec<&'a dyn Reflect>),
    Tuple(Vec<&'a dyn Reflect>),
    Map(Vec<(&'a dyn Reflect, &'a dyn Reflect)>),
    Record(&'a dyn Record),
    /// A realized codec held as a value; encodes its own parameters.
    Codec(&'a RealizedCodec),
    /// Plain data carried as is.
    Raw(&'a Value),
    /// A transparent box around another value.
    Boxed(&'a dyn Reflect),
    /// No structure; needs a registered codec.
    Opaque,
}

impl ReflectRef<'_> {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::Option(_) => "option",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Map(_) => "map",
            Self::Record(_) => "record",
            Self::Codec(_) => "codec",
            Self::Raw(_) => "raw",
            Self::Boxed(_) => "boxed",
            Self::Opaque => "opaque",
        }
    }
}
