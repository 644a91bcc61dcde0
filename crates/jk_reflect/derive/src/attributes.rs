//! Parsing of `#[record(...)]` attributes.

use syn::parse::ParseStream;
use syn::{Attribute, Expr, Ident, LitStr, Token};

use crate::RECORD_ATTRIBUTE_NAME;

/// Parses every `#[record(...)]` in `attrs`, feeding each comma-separated
/// entry to `entry` with its key already consumed.
fn parse_entries(
    attrs: &[Attribute],
    mut entry: impl FnMut(&Ident, ParseStream) -> syn::Result<()>,
) -> syn::Result<()> {
    for attr in attrs {
        if !attr.path().is_ident(RECORD_ATTRIBUTE_NAME) {
            continue;
        }
        attr.parse_args_with(|input: ParseStream| {
            while !input.is_empty() {
                let key: Ident = input.parse()?;
                entry(&key, input)?;
                if input.is_empty() {
                    break;
                }
                input.parse::<Token![,]>()?;
            }
            Ok(())
        })?;
    }
    Ok(())
}

fn parse_str(input: ParseStream) -> syn::Result<LitStr> {
    input.parse::<Token![=]>()?;
    input.parse()
}

fn set_once<T>(slot: &mut Option<T>, key: &Ident, value: T) -> syn::Result<()> {
    if slot.is_some() {
        return Err(syn::Error::new(key.span(), format!("duplicate `{key}` attribute")));
    }
    *slot = Some(value);
    Ok(())
}

// -----------------------------------------------------------------------------
// TypeAttributes

/// Spelling of a `rename_all` rule, validated at expansion time.
#[derive(Debug, Clone, Copy)]
pub(crate) enum RenameAll {
    CamelCase,
    PascalCase,
}

/// Type-level attributes:
///
/// - `list`: encode as a positional array.
/// - `alias = "..."`: discriminator value inside a hierarchy.
/// - `rename_all = "camelCase" | "PascalCase"`.
/// - `unserializable`: refuse to serialize.
#[derive(Debug, Default)]
pub(crate) struct TypeAttributes {
    pub list: bool,
    pub alias: Option<LitStr>,
    pub rename_all: Option<RenameAll>,
    pub unserializable: bool,
}

impl TypeAttributes {
    pub fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        parse_entries(attrs, |key, input| {
            if key == "list" {
                this.list = true;
            } else if key == "unserializable" {
                this.unserializable = true;
            } else if key == "alias" {
                let alias = parse_str(input)?;
                if alias.value().is_empty() {
                    return Err(syn::Error::new(alias.span(), "alias must not be empty"));
                }
                set_once(&mut this.alias, key, alias)?;
            } else if key == "rename_all" {
                let rule = parse_str(input)?;
                let parsed = match rule.value().as_str() {
                    "camelCase" => RenameAll::CamelCase,
                    "PascalCase" => RenameAll::PascalCase,
                    _ => {
                        return Err(syn::Error::new(
                            rule.span(),
                            "expected `camelCase` or `PascalCase`",
                        ));
                    }
                };
                set_once(&mut this.rename_all, key, parsed)?;
            } else {
                return Err(syn::Error::new(
                    key.span(),
                    format!("unknown type attribute `{key}`"),
                ));
            }
            Ok(())
        })?;
        Ok(this)
    }
}

// -----------------------------------------------------------------------------
// FieldAttributes

#[derive(Debug)]
pub(crate) enum FieldDefault {
    /// `default`: `Default::default()`, implied for `Option` fields.
    Trait,
    /// `default = expr`
    Expr(Expr),
}

/// Field-level attributes:
///
/// - `default` or `default = expr`: the field may be omitted.
/// - `rename = "..."`: wire name.
/// - `ty = expr`: declared type, an expression evaluating to a `TypeRef`.
/// - `ty_name = "..."`: declared type as a forward name.
#[derive(Debug, Default)]
pub(crate) struct FieldAttributes {
    pub default: Option<FieldDefault>,
    pub rename: Option<LitStr>,
    pub ty: Option<Expr>,
    pub ty_name: Option<LitStr>,
}

impl FieldAttributes {
    pub fn parse_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        parse_entries(attrs, |key, input| {
            if key == "default" {
                let default = if input.peek(Token![=]) {
                    input.parse::<Token![=]>()?;
                    FieldDefault::Expr(input.parse()?)
                } else {
                    FieldDefault::Trait
                };
                set_once(&mut this.default, key, default)?;
            } else if key == "rename" {
                set_once(&mut this.rename, key, parse_str(input)?)?;
            } else if key == "ty" {
                input.parse::<Token![=]>()?;
                set_once(&mut this.ty, key, input.parse()?)?;
            } else if key == "ty_name" {
                set_once(&mut this.ty_name, key, parse_str(input)?)?;
            } else {
                return Err(syn::Error::new(
                    key.span(),
                    format!("unknown field attribute `{key}`"),
                ));
            }
            Ok(())
        })?;

        if let (Some(_), Some(name)) = (&this.ty, &this.ty_name) {
            return Err(syn::Error::new(
                name.span(),
                "`ty` and `ty_name` cannot be used together",
            ));
        }
        Ok(this)
    }
}
