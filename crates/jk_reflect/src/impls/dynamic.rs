use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::type_name;

use serde_json::Value;

use crate::codec::RealizedCodec;
use crate::impls::NonGenericTypeInfoCell;
use crate::info::{OpaqueInfo, Type, TypeInfo, Typed};
use crate::{DowncastError, FromReflect, Reflect, ReflectRef};

// -----------------------------------------------------------------------------
// Box<dyn Reflect>

impl Reflect for Box<dyn Reflect> {
    #[inline]
    fn reflect_type_path(&self) -> &'static str {
        (**self).reflect_type_path()
    }

    #[inline]
    fn reflect_ref(&self) -> ReflectRef<'_> {
        ReflectRef::Boxed(&**self)
    }
}

impl Typed for Box<dyn Reflect> {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| TypeInfo::Dynamic(Type::of::<Self>()))
    }
}

impl FromReflect for Box<dyn Reflect> {
    /// Accepts any value; a value that is itself a `Box<dyn Reflect>` is unwrapped once.
    fn take_from(value: Box<dyn Reflect>) -> Result<Self, DowncastError> {
        if value.is::<Box<dyn Reflect>>() {
            value.take::<Box<dyn Reflect>>()
        } else {
            Ok(value)
        }
    }
}

// -----------------------------------------------------------------------------
// serde_json::Value

impl Reflect for Value {
    #[inline]
    fn reflect_type_path(&self) -> &'static str {
        type_name::<Self>()
    }

    #[inline]
    fn reflect_ref(&self) -> ReflectRef<'_> {
        ReflectRef::Raw(self)
    }
}

impl Typed for Value {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| TypeInfo::Raw(Type::of::<Self>()))
    }
}

impl FromReflect for Value {}

// -----------------------------------------------------------------------------
// Arc<RealizedCodec>

impl Reflect for Arc<RealizedCodec> {
    #[inline]
    fn reflect_type_path(&self) -> &'static str {
        type_name::<Self>()
    }

    #[inline]
    fn reflect_ref(&self) -> ReflectRef<'_> {
        ReflectRef::Codec(self)
    }
}

impl Typed for Arc<RealizedCodec> {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| TypeInfo::Opaque(OpaqueInfo::new::<Self>()))
    }
}

impl FromReflect for Arc<RealizedCodec> {}

// -----------------------------------------------------------------------------
// Macros

/// Makes `Box<dyn Trait>` a hierarchy root.
///
/// `Trait` must have [`Reflect`] as a supertrait. The box is transparent:
/// serialization sees the concrete value inside. Subtypes are attached with
/// [`TypeRegistry::register_subtype`](crate::registry::TypeRegistry::register_subtype).
///
/// ```
/// use jk_reflect::{Reflect, impl_hierarchy_root};
/// use jk_reflect::info::{TypeInfo, Typed};
///
/// pub trait Shape: Reflect {}
///
/// impl_hierarchy_root!(Shape);
///
/// assert!(matches!(<Box<dyn Shape>>::type_info(), TypeInfo::Root(_)));
/// ```
#[macro_export]
macro_rules! impl_hierarchy_root {
    ($root:path) => {
        impl $crate::Reflect for ::std::boxed::Box<dyn $root> {
            #[inline]
            fn reflect_type_path(&self) -> &'static str {
                ::core::any::type_name::<Self>()
            }

            #[inline]
            fn reflect_ref(&self) -> $crate::ReflectRef<'_> {
                let inner: &dyn $crate::Reflect = &**self;
                $crate::ReflectRef::Boxed(inner)
            }
        }

        impl $crate::info::Typed for ::std::boxed::Box<dyn $root> {
            fn type_info() -> &'static $crate::info::TypeInfo {
                static CELL: $crate::impls::NonGenericTypeInfoCell =
                    $crate::impls::NonGenericTypeInfoCell::new();
                CELL.get_or_init(|| {
                    $crate::info::TypeInfo::Root($crate::info::RootInfo::new::<Self>())
                })
            }
        }

        impl $crate::FromReflect for ::std::boxed::Box<dyn $root> {}
    };
}

/// Implements the reflection traits for a type without reflected structure.
///
/// Opaque values are (de)serialized only through a registered codec.
///
/// ```
/// use jk_reflect::{ReflectRef, Reflect, impl_opaque};
///
/// pub struct Color(pub u32);
///
/// impl_opaque!(Color);
///
/// assert!(matches!(Color(0).reflect_ref(), ReflectRef::Opaque));
/// ```
#[macro_export]
macro_rules! impl_opaque {
    ($ty:ty) => {
        impl $crate::Reflect for $ty {
            #[inline]
            fn reflect_type_path(&self) -> &'static str {
                ::core::any::type_name::<Self>()
            }

            #[inline]
            fn reflect_ref(&self) -> $crate::ReflectRef<'_> {
                $crate::ReflectRef::Opaque
            }
        }

        impl $crate::info::Typed for $ty {
            fn type_info() -> &'static $crate::info::TypeInfo {
                static CELL: $crate::impls::NonGenericTypeInfoCell =
                    $crate::impls::NonGenericTypeInfoCell::new();
                CELL.get_or_init(|| {
                    $crate::info::TypeInfo::Opaque($crate::info::OpaqueInfo::new::<Self>())
                })
            }
        }

        impl $crate::FromReflect for $ty {}
    };
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;

    use crate::{FromReflect, Reflect, ReflectRef};

    #[test]
    fn boxed_values_peel() {
        let inner: Box<dyn Reflect> = Box::new(3_i32);
        let outer: Box<dyn Reflect> = Box::new(inner);
        assert!(outer.is::<Box<dyn Reflect>>());
        assert!(matches!(outer.peel().reflect_ref(), ReflectRef::Int(3)));
        assert_eq!(outer.peel().concrete_type_id(), core::any::TypeId::of::<i32>());

        let unwrapped = <Box<dyn Reflect>>::take_from(outer).unwrap();
        assert!(unwrapped.is::<i32>());
    }
}
