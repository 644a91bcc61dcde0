//! Static type descriptions.
//!
//! Every reflected type exposes a [`TypeInfo`] through [`Typed`]. Record
//! types carry a [`RecordInfo`] listing their [`FieldDescriptor`]s in
//! declaration order. Field types are [`TypeRef`]s, which can also point
//! at codecs, unions and names resolved later by the registry.

// -----------------------------------------------------------------------------
// Modules

mod field;
mod record_info;
mod type_info;
mod type_ref;

// -----------------------------------------------------------------------------
// Exports

pub use field::FieldDescriptor;
pub use record_info::{ConstructFn, RecordAttrs, RecordInfo, RenameRule};
pub use type_info::{
    BuildFn, ListInfo, ListKind, MapInfo, OpaqueInfo, OptionInfo, RootInfo, ScalarInfo,
    ScalarKind, TupleInfo, Type, TypeInfo, Typed,
};
pub use type_ref::TypeRef;
