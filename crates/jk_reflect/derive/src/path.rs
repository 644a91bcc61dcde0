//! Paths of the runtime items the generated code refers to.
//!
//! Kept in one place so a change of the runtime layout only touches this
//! module.

use proc_macro2::TokenStream;
use quote::quote;

// -----------------------------------------------------------------------------
// Crate Path

/// The runtime crate. `jk_reflect` declares `extern crate self as
/// jk_reflect`, so the same path also works inside its own tests.
#[inline]
pub(crate) fn jk_reflect() -> syn::Path {
    syn::parse_quote!(::jk_reflect)
}

// -----------------------------------------------------------------------------
// Items

#[inline(always)]
pub(crate) fn reflect_(jk_reflect_path: &syn::Path) -> TokenStream {
    quote!(#jk_reflect_path::Reflect)
}

#[inline(always)]
pub(crate) fn reflect_ref_(jk_reflect_path: &syn::Path) -> TokenStream {
    quote!(#jk_reflect_path::ReflectRef)
}

#[inline(always)]
pub(crate) fn record_(jk_reflect_path: &syn::Path) -> TokenStream {
    quote!(#jk_reflect_path::Record)
}

#[inline(always)]
pub(crate) fn from_reflect_(jk_reflect_path: &syn::Path) -> TokenStream {
    quote!(#jk_reflect_path::FromReflect)
}

#[inline(always)]
pub(crate) fn field_args_(jk_reflect_path: &syn::Path) -> TokenStream {
    quote!(#jk_reflect_path::FieldArgs)
}

#[inline(always)]
pub(crate) fn construct_error_(jk_reflect_path: &syn::Path) -> TokenStream {
    quote!(#jk_reflect_path::ConstructError)
}

#[inline(always)]
pub(crate) fn typed_(jk_reflect_path: &syn::Path) -> TokenStream {
    quote!(#jk_reflect_path::info::Typed)
}

#[inline(always)]
pub(crate) fn type_info_(jk_reflect_path: &syn::Path) -> TokenStream {
    quote!(#jk_reflect_path::info::TypeInfo)
}

#[inline(always)]
pub(crate) fn type_ref_(jk_reflect_path: &syn::Path) -> TokenStream {
    quote!(#jk_reflect_path::info::TypeRef)
}

#[inline(always)]
pub(crate) fn record_info_(jk_reflect_path: &syn::Path) -> TokenStream {
    quote!(#jk_reflect_path::info::RecordInfo)
}

#[inline(always)]
pub(crate) fn record_attrs_(jk_reflect_path: &syn::Path) -> TokenStream {
    quote!(#jk_reflect_path::info::RecordAttrs)
}

#[inline(always)]
pub(crate) fn rename_rule_(jk_reflect_path: &syn::Path) -> TokenStream {
    quote!(#jk_reflect_path::info::RenameRule)
}

#[inline(always)]
pub(crate) fn field_descriptor_(jk_reflect_path: &syn::Path) -> TokenStream {
    quote!(#jk_reflect_path::info::FieldDescriptor)
}

#[inline(always)]
pub(crate) fn type_info_cell_(jk_reflect_path: &syn::Path) -> TokenStream {
    quote!(#jk_reflect_path::impls::NonGenericTypeInfoCell)
}

#[inline(always)]
pub(crate) fn record_info_cell_(jk_reflect_path: &syn::Path) -> TokenStream {
    quote!(#jk_reflect_path::impls::NonGenericRecordInfoCell)
}
