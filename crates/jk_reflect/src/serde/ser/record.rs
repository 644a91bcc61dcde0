use alloc::format;
use alloc::string::ToString;
use alloc::vec::Vec;
use core::iter;

use serde_json::{Map, Value};

use super::SerializeDriver;

use crate::info::FieldDescriptor;
use crate::registry::RecordLayout;
use crate::{Error, Record, Reflect, ReflectRef, SerializationError};

// -----------------------------------------------------------------------------
// Records

impl SerializeDriver<'_> {
    pub(super) fn serialize_record(&self, record: &dyn Record) -> Result<Value, Error> {
        let layout = self.registry().record_layout(record.record_info())?;
        if layout.unserializable {
            return Err(SerializationError::Unserializable(layout.type_path()).into());
        }

        if layout.list {
            self.record_array(record, &layout)
        } else {
            self.record_object(record, &layout)
        }
    }

    fn record_object(&self, record: &dyn Record, layout: &RecordLayout) -> Result<Value, Error> {
        let mut object = Map::with_capacity(layout.fields.len() + 1);

        if let Some(tag) = layout.inside_tag() {
            if let Some(name) = layout.names.iter().find(|name| **name == tag.discriminator) {
                return Err(SerializationError::DiscriminatorConflict {
                    type_path: layout.type_path(),
                    field: name.to_string(),
                }
                .into());
            }
            object.insert(tag.discriminator.clone(), Value::String(tag.alias.clone()));
        }

        for (field, name) in layout.fields.iter().zip(&layout.names) {
            if let Some(value) = present(record, field)? {
                object.insert(name.to_string(), self.serialize(value, Some(field.ty()))?);
            }
        }
        Ok(Value::Object(object))
    }

    /// Positional form: the alias first (for tagged records), then every
    /// field in declaration order. `None` fields become `null` unless only
    /// `None`s follow them.
    fn record_array(&self, record: &dyn Record, layout: &RecordLayout) -> Result<Value, Error> {
        let mut items = Vec::with_capacity(layout.fields.len() + 1);
        if let Some(tag) = layout.inside_tag() {
            items.push(Value::String(tag.alias.clone()));
        }

        let mut pending = 0;
        for field in layout.fields.iter() {
            match present(record, field)? {
                Some(value) => {
                    items.extend(iter::repeat_n(Value::Null, pending));
                    pending = 0;
                    items.push(self.serialize(value, Some(field.ty()))?);
                }
                None => pending += 1,
            }
        }
        Ok(Value::Array(items))
    }
}

/// The field's value, or `None` when it holds `Option::None`.
fn present<'r>(record: &'r dyn Record, field: &FieldDescriptor) -> Result<Option<&'r dyn Reflect>, Error> {
    let value = record.field(field.name()).ok_or_else(|| {
        SerializationError::Custom(
            format!("`{}` has no field `{}`", record.reflect_type_path(), field.name()).into(),
        )
    })?;
    match value.peel().reflect_ref() {
        ReflectRef::Option(None) => Ok(None),
        _ => Ok(Some(value)),
    }
}
