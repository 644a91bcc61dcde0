//! Derive macro for `jk_reflect`.
//!
//! - [`Record`](derive_record)
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::std_instead_of_core, reason = "proc-macro lib")]
#![allow(clippy::std_instead_of_alloc, reason = "proc-macro lib")]

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

static RECORD_ATTRIBUTE_NAME: &str = "record";

// -----------------------------------------------------------------------------
// Modules

mod attributes;
mod path;
mod record;

// -----------------------------------------------------------------------------
// Macros

/// # Record Derivation
///
/// `#[derive(Record)]` implements `Reflect`, `Record`, `Typed` and
/// `FromReflect` for a struct with named fields. The generated constructor
/// takes every field from the decoded arguments, falling back to the
/// field's default when the payload omits it.
///
/// Generic structs, tuple structs and enums are not supported.
///
/// ## Type Attributes
///
/// ```rust, ignore
/// #[derive(Record)]
/// #[record(alias = "circle", rename_all = "camelCase")]
/// struct Circle { /* ... */ }
/// ```
///
/// - `list`: encode as a positional array in field order.
/// - `alias = "..."`: discriminator value when registered as a subtype.
///   Defaults to the full type path.
/// - `rename_all = "camelCase" | "PascalCase"`: applied to every field
///   without an explicit rename.
/// - `unserializable`: serializing a value of this type (or any value
///   containing one) fails.
///
/// ## Field Attributes
///
/// ```rust, ignore
/// #[derive(Record)]
/// struct Config {
///     #[record(rename = "hostName")]
///     host: String,
///     #[record(default = 8080)]
///     port: u16,
///     #[record(default)]
///     tags: Vec<String>,
///     // Implicit default: `None`.
///     comment: Option<String>,
///     #[record(ty = TypeRef::codec(&HEX))]
///     mask: u32,
///     #[record(ty_name = "Node")]
///     next: Option<Box<dyn Reflect>>,
/// }
/// ```
///
/// - `default` or `default = expr`: the field may be missing from the payload.
///   `Option` fields get `None` as default without the attribute.
/// - `rename = "..."`: the field's wire name.
/// - `ty = expr`: declared type; `expr` must evaluate to a `TypeRef`, e.g.
///   a realized codec or a union.
/// - `ty_name = "..."`: declared type as a name resolved through the
///   registry, for recursive or forward references.
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    match record::ReflectRecord::from_input(&ast) {
        Ok(record) => record.expand().into(),
        Err(err) => err.into_compile_error().into(),
    }
}
