//! The registry of codecs, hierarchies, names and encoding overrides.
//!
//! A [`TypeRegistry`] is shared by reference and mutated through `&self`:
//! every table sits behind one lock that is never held while codecs,
//! constructors or module loaders run.

// -----------------------------------------------------------------------------
// Modules

mod hierarchy;
mod layout;
mod type_registry;

// -----------------------------------------------------------------------------
// Exports

pub use hierarchy::{HierarchyConfig, ModuleLoader, Position};
pub use type_registry::TypeRegistry;

pub(crate) use hierarchy::{Subtype, SubtypeKey, Tag};
pub(crate) use layout::RecordLayout;
pub(crate) use type_registry::CodecEntry;
