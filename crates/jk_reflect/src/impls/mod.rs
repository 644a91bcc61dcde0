//! Reflection implementations for standard types, and the static cells
//! that hold type information.

// -----------------------------------------------------------------------------
// Modules

mod cell;
mod collections;
mod dynamic;
mod scalar;
mod std;
mod tuple;

// -----------------------------------------------------------------------------
// Exports

pub use cell::{
    GenericTypeCell, GenericTypeInfoCell, NonGenericRecordInfoCell, NonGenericTypeCell,
    NonGenericTypeInfoCell,
};
