//! Where `Typed::type_info` keeps what it returns.
//!
//! Each implementation owns a `static CELL` and hands out `&'static`
//! borrows of it. A static inside a generic function exists once for all
//! instantiations, so `Vec<u8>` and `Vec<String>` would share a
//! [`NonGenericTypeInfoCell`]; generic impls use a [`GenericTypeInfoCell`]
//! instead, one entry per [`TypeId`].

use alloc::boxed::Box;
use core::any::{Any, TypeId};
use std::sync::{OnceLock, PoisonError, RwLock};

use jk_utils::TypeIdMap;

use crate::info::{RecordInfo, TypeInfo};

mod sealed {
    use crate::info::{RecordInfo, TypeInfo};

    pub trait TypedProperty: Send + Sync + 'static {}

    impl TypedProperty for TypeInfo {}
    impl TypedProperty for RecordInfo {}
}

use sealed::TypedProperty;

// -----------------------------------------------------------------------------
// NonGenericTypeCell

/// One lazily built value.
pub struct NonGenericTypeCell<T: TypedProperty>(OnceLock<T>);

/// The cell behind `impl_opaque!`, scalar impls and hand-written
/// [`Typed`](crate::info::Typed) impls.
///
/// ```
/// use jk_reflect::impls::NonGenericTypeInfoCell;
/// use jk_reflect::info::{OpaqueInfo, TypeInfo};
///
/// struct Handle;
///
/// fn handle_info() -> &'static TypeInfo {
///     static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
///     CELL.get_or_init(|| TypeInfo::Opaque(OpaqueInfo::new::<Handle>()))
/// }
///
/// assert!(core::ptr::eq(handle_info(), handle_info()));
/// ```
pub type NonGenericTypeInfoCell = NonGenericTypeCell<TypeInfo>;

/// `#[derive(Record)]` keeps the field table here.
pub type NonGenericRecordInfoCell = NonGenericTypeCell<RecordInfo>;

impl<T: TypedProperty> NonGenericTypeCell<T> {
    #[inline]
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    #[inline]
    pub fn get_or_init(&self, f: impl FnOnce() -> T) -> &T {
        self.0.get_or_init(f)
    }
}

// -----------------------------------------------------------------------------
// GenericTypeCell

/// One leaked value per instantiation, keyed by the instantiation's
/// [`TypeId`].
pub struct GenericTypeCell<T: TypedProperty>(RwLock<TypeIdMap<&'static T>>);

/// Used by the container impls (`Option<T>`, `Vec<T>`, maps, tuples).
pub type GenericTypeInfoCell = GenericTypeCell<TypeInfo>;

impl<T: TypedProperty> GenericTypeCell<T> {
    #[inline]
    pub const fn new() -> Self {
        Self(RwLock::new(TypeIdMap::new()))
    }

    /// The entry for `G`; `f` builds it on first request.
    #[inline(always)]
    pub fn get_or_insert<G: Any + ?Sized>(&self, f: impl FnOnce() -> T) -> &T {
        self.get_or_insert_by_type_id(TypeId::of::<G>(), f)
    }

    #[inline(never)]
    fn get_or_insert_by_type_id(&self, type_id: TypeId, f: impl FnOnce() -> T) -> &T {
        let found = self
            .0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .copied();
        match found {
            Some(info) => info,
            None => self.insert_by_type_id(type_id, f()),
        }
    }

    // Container infos build their element infos first, so `f` has already
    // run by the time the write lock is taken.
    #[cold]
    fn insert_by_type_id(&self, type_id: TypeId, value: T) -> &T {
        let mut table = self.0.write().unwrap_or_else(PoisonError::into_inner);
        *table.get_or_insert(type_id, || Box::leak(Box::new(value)))
    }
}
