use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::{Any, TypeId, type_name};
use core::fmt;

use serde_json::Value;

use crate::info::{RecordInfo, TypeRef};
use crate::{DowncastError, Reflect};

// -----------------------------------------------------------------------------
// Typed

/// Types with a static [`TypeInfo`].
///
/// The returned reference lives for the whole process; implementations
/// store it in a [`NonGenericTypeInfoCell`] or a [`GenericTypeInfoCell`].
///
/// [`NonGenericTypeInfoCell`]: crate::impls::NonGenericTypeInfoCell
/// [`GenericTypeInfoCell`]: crate::impls::GenericTypeInfoCell
pub trait Typed: Reflect {
    fn type_info() -> &'static TypeInfo;
}

// -----------------------------------------------------------------------------
// Type

/// Identity and full path of a type.
#[derive(Clone, Copy)]
pub struct Type {
    id: TypeId,
    path: &'static str,
}

impl Type {
    #[inline]
    pub fn of<T: Any + ?Sized>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            path: type_name::<T>(),
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Full path, e.g. `alloc::vec::Vec<i32>`.
    #[inline]
    pub fn path(&self) -> &'static str {
        self.path
    }

    /// Last path segment without generics, e.g. `Vec`.
    ///
    /// ```
    /// use jk_reflect::info::Type;
    ///
    /// assert_eq!(Type::of::<Vec<String>>().name(), "Vec");
    /// assert_eq!(Type::of::<u8>().name(), "u8");
    /// ```
    pub fn name(&self) -> &'static str {
        let head = self.path.split('<').next().unwrap_or(self.path);
        head.rsplit("::").next().unwrap_or(head)
    }

    #[inline]
    pub fn is<T: Any + ?Sized>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for Type {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Type {}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path)
    }
}

// -----------------------------------------------------------------------------
// Builders

/// Builds a container from deserialized elements.
pub type BuildFn = fn(Vec<Box<dyn Reflect>>) -> Result<Box<dyn Reflect>, DowncastError>;

// -----------------------------------------------------------------------------
// Scalar

/// The plain-data kind of a scalar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarKind {
    Unit,
    Bool,
    Int,
    UInt,
    Float,
    Str,
}

impl ScalarKind {
    /// Whether values of this kind may be used as map keys.
    #[inline]
    pub fn is_key(self) -> bool {
        matches!(self, Self::Int | Self::UInt | Self::Float | Self::Str)
    }
}

/// A number, string, boolean or unit type.
#[derive(Debug)]
pub struct ScalarInfo {
    ty: Type,
    kind: ScalarKind,
    from_value: fn(&Value) -> Option<Box<dyn Reflect>>,
    from_key: fn(&str) -> Option<Box<dyn Reflect>>,
}

impl ScalarInfo {
    pub fn new<T: Any>(
        kind: ScalarKind,
        from_value: fn(&Value) -> Option<Box<dyn Reflect>>,
        from_key: fn(&str) -> Option<Box<dyn Reflect>>,
    ) -> Self {
        Self {
            ty: Type::of::<T>(),
            kind,
            from_value,
            from_key,
        }
    }

    #[inline]
    pub fn kind(&self) -> ScalarKind {
        self.kind
    }

    /// Converts plain data of the matching kind; `None` on mismatch or overflow.
    #[inline]
    pub fn from_value(&self, value: &Value) -> Option<Box<dyn Reflect>> {
        (self.from_value)(value)
    }

    /// Parses a map key.
    #[inline]
    pub fn from_key(&self, key: &str) -> Option<Box<dyn Reflect>> {
        (self.from_key)(key)
    }
}

// -----------------------------------------------------------------------------
// Containers

#[derive(Debug)]
pub struct OptionInfo {
    ty: Type,
    some: TypeRef,
    build: fn(Option<Box<dyn Reflect>>) -> Result<Box<dyn Reflect>, DowncastError>,
}

impl OptionInfo {
    pub fn new<T: Any>(
        some: TypeRef,
        build: fn(Option<Box<dyn Reflect>>) -> Result<Box<dyn Reflect>, DowncastError>,
    ) -> Self {
        Self {
            ty: Type::of::<T>(),
            some,
            build,
        }
    }

    #[inline]
    pub fn some(&self) -> &TypeRef {
        &self.some
    }

    #[inline]
    pub fn build(
        &self,
        value: Option<Box<dyn Reflect>>,
    ) -> Result<Box<dyn Reflect>, DowncastError> {
        (self.build)(value)
    }
}

/// Shape of a homogeneous sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListKind {
    /// Ordered sequence, e.g. `Vec<T>`.
    List,
    /// Unordered collection, e.g. `HashSet<T>`; encoded as a sequence.
    Set,
    /// Variable-length tuple with a single element type, i.e. `Box<[T]>`.
    VarTuple,
}

#[derive(Debug)]
pub struct ListInfo {
    ty: Type,
    kind: ListKind,
    item: TypeRef,
    build: BuildFn,
}

impl ListInfo {
    pub fn new<T: Any>(kind: ListKind, item: TypeRef, build: BuildFn) -> Self {
        Self {
            ty: Type::of::<T>(),
            kind,
            item,
            build,
        }
    }

    #[inline]
    pub fn kind(&self) -> ListKind {
        self.kind
    }

    #[inline]
    pub fn item(&self) -> &TypeRef {
        &self.item
    }

    #[inline]
    pub fn build(&self, items: Vec<Box<dyn Reflect>>) -> Result<Box<dyn Reflect>, DowncastError> {
        (self.build)(items)
    }
}

/// A fixed-arity tuple; each position has its own type.
#[derive(Debug)]
pub struct TupleInfo {
    ty: Type,
    items: Box<[TypeRef]>,
    build: BuildFn,
}

impl TupleInfo {
    pub fn new<T: Any>(items: Vec<TypeRef>, build: BuildFn) -> Self {
        Self {
            ty: Type::of::<T>(),
            items: items.into_boxed_slice(),
            build,
        }
    }

    #[inline]
    pub fn items(&self) -> &[TypeRef] {
        &self.items
    }

    #[inline]
    pub fn build(&self, items: Vec<Box<dyn Reflect>>) -> Result<Box<dyn Reflect>, DowncastError> {
        (self.build)(items)
    }
}

#[derive(Debug)]
pub struct MapInfo {
    ty: Type,
    key: TypeRef,
    value: TypeRef,
    build: fn(Vec<(Box<dyn Reflect>, Box<dyn Reflect>)>) -> Result<Box<dyn Reflect>, DowncastError>,
}

impl MapInfo {
    pub fn new<T: Any>(
        key: TypeRef,
        value: TypeRef,
        build: fn(
            Vec<(Box<dyn Reflect>, Box<dyn Reflect>)>,
        ) -> Result<Box<dyn Reflect>, DowncastError>,
    ) -> Self {
        Self {
            ty: Type::of::<T>(),
            key,
            value,
            build,
        }
    }

    #[inline]
    pub fn key(&self) -> &TypeRef {
        &self.key
    }

    #[inline]
    pub fn value(&self) -> &TypeRef {
        &self.value
    }

    #[inline]
    pub fn build(
        &self,
        entries: Vec<(Box<dyn Reflect>, Box<dyn Reflect>)>,
    ) -> Result<Box<dyn Reflect>, DowncastError> {
        (self.build)(entries)
    }
}

// -----------------------------------------------------------------------------
// Root & Opaque

/// The boxed trait object at the top of a polymorphic family.
#[derive(Debug)]
pub struct RootInfo {
    ty: Type,
}

impl RootInfo {
    #[inline]
    pub fn new<T: Any + ?Sized>() -> Self {
        Self { ty: Type::of::<T>() }
    }
}

/// A type without reflected structure; handled only through codecs.
#[derive(Debug)]
pub struct OpaqueInfo {
    ty: Type,
}

impl OpaqueInfo {
    #[inline]
    pub fn new<T: Any + ?Sized>() -> Self {
        Self { ty: Type::of::<T>() }
    }
}

// -----------------------------------------------------------------------------
// TypeInfo

/// Static description of a reflected type.
#[derive(Debug)]
pub enum TypeInfo {
    Scalar(ScalarInfo),
    Option(OptionInfo),
    List(ListInfo),
    Tuple(TupleInfo),
    Map(MapInfo),
    Record(&'static RecordInfo),
    Root(RootInfo),
    Opaque(OpaqueInfo),
    /// `Box<dyn Reflect>`: decodes to raw plain data unless a field
    /// declares a more specific [`TypeRef`].
    Dynamic(Type),
    /// `serde_json::Value`.
    Raw(Type),
}

impl TypeInfo {
    pub fn ty(&self) -> Type {
        match self {
            Self::Scalar(info) => info.ty,
            Self::Option(info) => info.ty,
            Self::List(info) => info.ty,
            Self::Tuple(info) => info.ty,
            Self::Map(info) => info.ty,
            Self::Record(info) => info.ty(),
            Self::Root(info) => info.ty,
            Self::Opaque(info) => info.ty,
            Self::Dynamic(ty) | Self::Raw(ty) => *ty,
        }
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.ty().id()
    }

    #[inline]
    pub fn type_path(&self) -> &'static str {
        self.ty().path()
    }

    #[inline]
    pub fn as_record(&self) -> Option<&'static RecordInfo> {
        match self {
            Self::Record(info) => Some(*info),
            _ => None,
        }
    }

    /// Built-in container shapes never take a registered codec.
    #[inline]
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            Self::Option(_) | Self::List(_) | Self::Tuple(_) | Self::Map(_) | Self::Dynamic(_)
        )
    }
}
