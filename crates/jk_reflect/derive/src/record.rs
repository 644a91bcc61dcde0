//! Code generation for `#[derive(Record)]`.

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{Data, DeriveInput, Fields, Ident, Type};

use crate::attributes::{FieldAttributes, FieldDefault, RenameAll, TypeAttributes};

// -----------------------------------------------------------------------------
// Parsed input

struct RecordField<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    attrs: FieldAttributes,
}

impl RecordField<'_> {
    fn name(&self) -> String {
        let name = self.ident.to_string();
        match name.strip_prefix("r#") {
            Some(raw) => raw.to_owned(),
            None => name,
        }
    }
}

pub(crate) struct ReflectRecord<'a> {
    ident: &'a Ident,
    attrs: TypeAttributes,
    fields: Vec<RecordField<'a>>,
    jk_reflect_path: syn::Path,
}

impl<'a> ReflectRecord<'a> {
    pub fn from_input(input: &'a DeriveInput) -> syn::Result<Self> {
        if !input.generics.params.is_empty() {
            return Err(syn::Error::new_spanned(
                &input.generics,
                "`Record` cannot be derived for generic types",
            ));
        }

        let named = match &input.data {
            Data::Struct(data) => match &data.fields {
                Fields::Named(named) => &named.named,
                Fields::Unit => {
                    return Err(syn::Error::new(
                        input.ident.span(),
                        "`Record` needs named fields; use `impl_opaque!` for unit structs",
                    ));
                }
                Fields::Unnamed(_) => {
                    return Err(syn::Error::new(
                        input.ident.span(),
                        "`Record` needs named fields",
                    ));
                }
            },
            _ => {
                return Err(syn::Error::new(
                    input.ident.span(),
                    "`Record` can only be derived for structs",
                ));
            }
        };

        let fields = named
            .iter()
            .map(|field| {
                Ok(RecordField {
                    ident: field.ident.as_ref().ok_or_else(|| {
                        syn::Error::new_spanned(field, "expected a named field")
                    })?,
                    ty: &field.ty,
                    attrs: FieldAttributes::parse_attrs(&field.attrs)?,
                })
            })
            .collect::<syn::Result<Vec<_>>>()?;

        Ok(Self {
            ident: &input.ident,
            attrs: TypeAttributes::parse_attrs(&input.attrs)?,
            fields,
            jk_reflect_path: crate::path::jk_reflect(),
        })
    }

    // -------------------------------------------------------------------------
    // Expansion

    pub fn expand(&self) -> TokenStream {
        let record_info_fn = self.impl_record_info();
        let reflect = self.impl_reflect();
        let record = self.impl_record();
        let typed = self.impl_typed();
        let from_reflect = self.impl_from_reflect();

        quote! {
            const _: () = {
                #record_info_fn
                #reflect
                #record
                #typed
                #from_reflect
            };
        }
    }

    /// A free function returning the cached `RecordInfo`, plus the
    /// constructor it points to.
    fn impl_record_info(&self) -> TokenStream {
        let jk_reflect_path = &self.jk_reflect_path;
        let ident = self.ident;
        let reflect_ = crate::path::reflect_(jk_reflect_path);
        let record_info_ = crate::path::record_info_(jk_reflect_path);
        let record_attrs_ = crate::path::record_attrs_(jk_reflect_path);
        let record_info_cell_ = crate::path::record_info_cell_(jk_reflect_path);
        let field_args_ = crate::path::field_args_(jk_reflect_path);
        let construct_error_ = crate::path::construct_error_(jk_reflect_path);

        let descriptors = self.fields.iter().map(|field| self.field_descriptor(field));

        let (members, names): (Vec<_>, Vec<_>) = self
            .fields
            .iter()
            .map(|field| (field.ident, field.name()))
            .unzip();
        let tys = self.fields.iter().map(|field| field.ty);

        let list = self.attrs.list;
        let unserializable = self.attrs.unserializable;
        let alias = match &self.attrs.alias {
            Some(alias) => quote!(::core::option::Option::Some(#alias)),
            None => quote!(::core::option::Option::None),
        };
        let rename_all = match self.attrs.rename_all {
            Some(rule) => {
                let rename_rule_ = crate::path::rename_rule_(jk_reflect_path);
                let variant = match rule {
                    RenameAll::CamelCase => Ident::new("CamelCase", Span::call_site()),
                    RenameAll::PascalCase => Ident::new("PascalCase", Span::call_site()),
                };
                quote!(::core::option::Option::Some(#rename_rule_::#variant))
            }
            None => quote!(::core::option::Option::None),
        };

        quote! {
            fn __construct(
                __args: &mut #field_args_,
            ) -> ::core::result::Result<::std::boxed::Box<dyn #reflect_>, #construct_error_> {
                ::core::result::Result::Ok(::std::boxed::Box::new(#ident {
                    #( #members: __args.take::<#tys>(#names)?, )*
                }))
            }

            fn __record_info() -> &'static #record_info_ {
                static CELL: #record_info_cell_ = #record_info_cell_::new();
                CELL.get_or_init(|| {
                    #record_info_::new::<#ident>(
                        ::std::vec![ #( #descriptors ),* ],
                        __construct,
                    )
                    .with_attrs(#record_attrs_ {
                        list: #list,
                        alias: #alias,
                        rename_all: #rename_all,
                        unserializable: #unserializable,
                    })
                })
            }
        }
    }

    fn field_descriptor(&self, field: &RecordField<'_>) -> TokenStream {
        let jk_reflect_path = &self.jk_reflect_path;
        let reflect_ = crate::path::reflect_(jk_reflect_path);
        let type_ref_ = crate::path::type_ref_(jk_reflect_path);
        let field_descriptor_ = crate::path::field_descriptor_(jk_reflect_path);

        let name = field.name();
        let ty = field.ty;

        let declared = match (&field.attrs.ty, &field.attrs.ty_name) {
            (Some(expr), _) => quote!(#expr),
            (None, Some(name)) => quote!(#type_ref_::named(#name)),
            (None, None) => quote!(#type_ref_::of::<#ty>()),
        };

        let default = match &field.attrs.default {
            Some(FieldDefault::Expr(expr)) => Some(quote!(#expr)),
            Some(FieldDefault::Trait) => Some(quote!(<#ty as ::core::default::Default>::default())),
            None if is_option(ty) => Some(quote!(::core::option::Option::None)),
            None => None,
        };
        let with_default = default.map(|value| {
            quote! {
                .with_default(|| -> ::std::boxed::Box<dyn #reflect_> {
                    let __value: #ty = #value;
                    ::std::boxed::Box::new(__value)
                })
            }
        });

        let with_rename = field.attrs.rename.as_ref().map(|rename| quote!(.with_rename(#rename)));

        quote! {
            #field_descriptor_::new(#name, #declared) #with_default #with_rename
        }
    }

    fn impl_reflect(&self) -> TokenStream {
        let jk_reflect_path = &self.jk_reflect_path;
        let ident = self.ident;
        let reflect_ = crate::path::reflect_(jk_reflect_path);
        let reflect_ref_ = crate::path::reflect_ref_(jk_reflect_path);

        quote! {
            impl #reflect_ for #ident {
                #[inline]
                fn reflect_type_path(&self) -> &'static str {
                    ::core::any::type_name::<Self>()
                }

                #[inline]
                fn reflect_ref(&self) -> #reflect_ref_<'_> {
                    #reflect_ref_::Record(self)
                }
            }
        }
    }

    fn impl_record(&self) -> TokenStream {
        let jk_reflect_path = &self.jk_reflect_path;
        let ident = self.ident;
        let reflect_ = crate::path::reflect_(jk_reflect_path);
        let record_ = crate::path::record_(jk_reflect_path);
        let record_info_ = crate::path::record_info_(jk_reflect_path);

        let arms = self.fields.iter().map(|field| {
            let member = field.ident;
            let name = field.name();
            quote!(#name => ::core::option::Option::Some(&self.#member))
        });

        quote! {
            impl #record_ for #ident {
                #[inline]
                fn record_info(&self) -> &'static #record_info_ {
                    __record_info()
                }

                fn field(&self, __name: &str) -> ::core::option::Option<&dyn #reflect_> {
                    match __name {
                        #( #arms, )*
                        _ => ::core::option::Option::None,
                    }
                }
            }
        }
    }

    fn impl_typed(&self) -> TokenStream {
        let jk_reflect_path = &self.jk_reflect_path;
        let ident = self.ident;
        let typed_ = crate::path::typed_(jk_reflect_path);
        let type_info_ = crate::path::type_info_(jk_reflect_path);
        let type_info_cell_ = crate::path::type_info_cell_(jk_reflect_path);

        quote! {
            impl #typed_ for #ident {
                fn type_info() -> &'static #type_info_ {
                    static CELL: #type_info_cell_ = #type_info_cell_::new();
                    CELL.get_or_init(|| #type_info_::Record(__record_info()))
                }
            }
        }
    }

    fn impl_from_reflect(&self) -> TokenStream {
        let ident = self.ident;
        let from_reflect_ = crate::path::from_reflect_(&self.jk_reflect_path);

        quote! {
            impl #from_reflect_ for #ident {}
        }
    }
}

// -----------------------------------------------------------------------------
// Helpers

/// Whether `ty` is spelled as `Option<..>` (with any path prefix).
fn is_option(ty: &Type) -> bool {
    match ty {
        Type::Path(path) if path.qself.is_none() => path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Option"),
        Type::Group(group) => is_option(&group.elem),
        Type::Paren(paren) => is_option(&paren.elem),
        _ => false,
    }
}
