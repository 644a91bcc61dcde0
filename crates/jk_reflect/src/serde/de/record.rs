use alloc::borrow::ToOwned;
use alloc::boxed::Box;
use alloc::format;
use alloc::string::ToString;

use serde_json::Value;

use super::DeserializeDriver;
use super::driver::{Parent, expect_array, expect_object};

use crate::info::{RecordInfo, ScalarKind, TypeInfo, TypeRef};
use crate::registry::{Position, Subtype, Tag};
use crate::serde::kind_of;
use crate::{DeserializationError, Error, FieldArgs, Reflect};

// -----------------------------------------------------------------------------
// Records

impl DeserializeDriver<'_> {
    pub(super) fn decode_record(
        &self,
        data: &Value,
        info: &'static RecordInfo,
    ) -> Result<Box<dyn Reflect>, Error> {
        let layout = self.registry().record_layout(info)?;
        let mut args = FieldArgs::new(info);

        if layout.list {
            let mut elements = expect_array(data, layout.type_path())?.as_slice();
            if let Some(tag) = layout.inside_tag() {
                let Some((alias, rest)) = elements.split_first() else {
                    return Err(DeserializationError::MissingDiscriminator {
                        root: tag.root_path,
                        discriminator: tag.discriminator.clone(),
                    }
                    .into());
                };
                self.check_alias(tag, alias)?;
                elements = rest;
            }

            let required = layout.required_len();
            if elements.len() < required {
                return Err(DeserializationError::TooFewElements {
                    type_path: layout.type_path(),
                    expected: required,
                    found: elements.len(),
                }
                .into());
            }
            for (index, (field, element)) in layout.fields.iter().zip(elements).enumerate() {
                if element.is_null() && field.has_default() && !accepts_null(field.ty()) {
                    continue;
                }
                args.set_at(index, self.decode(element, field.ty(), None)?);
            }
        } else {
            let object = expect_object(data, layout.type_path())?;
            if let Some(tag) = layout.inside_tag()
                && let Some(alias) = object.get(&tag.discriminator)
            {
                self.check_alias(tag, alias)?;
            }

            let fields = layout.fields.iter().zip(&layout.names).enumerate();
            for (index, (field, name)) in fields {
                match object.get(name.as_ref()) {
                    Some(Value::Null) if field.has_default() && !accepts_null(field.ty()) => {}
                    Some(value) => {
                        args.set_at(index, self.decode(value, field.ty(), Some(object))?);
                    }
                    None if field.has_default() => {}
                    None => {
                        return Err(DeserializationError::MissingField {
                            type_path: layout.type_path(),
                            field: name.to_string(),
                        }
                        .into());
                    }
                }
            }
        }

        Ok((info.constructor())(&mut args)?)
    }

    /// Rejects a visible discriminator naming another member.
    fn check_alias(&self, tag: &Tag, alias: &Value) -> Result<(), Error> {
        let Some(alias) = alias.as_str() else {
            return Err(DeserializationError::mismatch(
                format!("`{}` discriminator string", tag.discriminator),
                kind_of(alias),
            )
            .into());
        };

        if alias == tag.alias {
            Ok(())
        } else if self.registry().is_known_alias(tag.root, alias) {
            Err(DeserializationError::mismatch(format!("`{}`", tag.alias), format!("`{alias}`")).into())
        } else {
            Err(DeserializationError::UnknownDiscriminator {
                alias: alias.to_owned(),
                root: tag.root_path,
            }
            .into())
        }
    }

    // -------------------------------------------------------------------------
    // Hierarchy roots

    /// Reads the discriminator and decodes with the member it names.
    ///
    /// Several members may share an alias (parameterized codec templates);
    /// they are tried in registration order and the first structural match
    /// wins.
    pub(super) fn decode_root(
        &self,
        data: &Value,
        root: &'static TypeInfo,
        parent: Parent<'_>,
    ) -> Result<Box<dyn Reflect>, Error> {
        let (discriminator, position) = self.registry().hierarchy_config(root)?;
        let alias = match (position, data) {
            (Position::Outside, _) => parent.and_then(|parent| parent.get(&discriminator)),
            (Position::Inside, Value::Array(elements)) => elements.first(),
            (Position::Inside, Value::Object(object)) => object.get(&discriminator),
            (Position::Inside, data) => {
                return Err(DeserializationError::mismatch(
                    format!("object for `{}`", root.type_path()),
                    kind_of(data),
                )
                .into());
            }
        };
        let Some(alias) = alias.and_then(Value::as_str) else {
            return Err(DeserializationError::MissingDiscriminator {
                root: root.type_path(),
                discriminator,
            }
            .into());
        };

        let mut failure = None;
        for subtype in self.registry().subtypes(root, alias)? {
            match self.decode_member(data, &subtype, parent) {
                Ok(value) => return Ok(value),
                Err(err) if err.is_mismatch() => {
                    log::trace!("`{}` rejected `{alias}` payload: {err}", subtype.name);
                    failure = Some(err);
                }
                Err(err) => return Err(err),
            }
        }

        Err(failure.unwrap_or_else(|| {
            DeserializationError::UnknownDiscriminator {
                alias: alias.to_owned(),
                root: root.type_path(),
            }
            .into()
        }))
    }

    fn decode_member(
        &self,
        data: &Value,
        subtype: &Subtype,
        parent: Parent<'_>,
    ) -> Result<Box<dyn Reflect>, Error> {
        let value = self.decode(data, &subtype.ty, parent)?;
        Ok((subtype.upcast)(value)?)
    }
}

/// Whether `null` is a value of `ty`. Otherwise a `null` for a field with
/// a default counts as absent.
fn accepts_null(ty: &TypeRef) -> bool {
    match ty {
        TypeRef::Any => true,
        TypeRef::Union(alternatives) => alternatives.iter().any(accepts_null),
        TypeRef::Type(info) => match info() {
            TypeInfo::Option(_) | TypeInfo::Raw(_) | TypeInfo::Dynamic(_) => true,
            TypeInfo::Scalar(scalar) => scalar.kind() == ScalarKind::Unit,
            _ => false,
        },
        _ => false,
    }
}
