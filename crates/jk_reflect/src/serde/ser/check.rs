use super::SerializeDriver;

use crate::{Error, Reflect, ReflectRef, SerializationError};

// -----------------------------------------------------------------------------
// Unserializable guard

impl SerializeDriver<'_> {
    /// Fails if `value`, or anything reachable from it, is marked
    /// unserializable.
    ///
    /// Values handled by a codec are not descended into.
    pub(crate) fn check_serializable(&self, value: &dyn Reflect) -> Result<(), Error> {
        let value = value.peel();
        let type_id = value.concrete_type_id();
        let reflected = value.reflect_ref();

        let marked = match &reflected {
            ReflectRef::Record(record) => record.record_info().attrs().unserializable,
            _ => false,
        };
        if marked || self.registry().is_unserializable(type_id) {
            return Err(SerializationError::Unserializable(value.reflect_type_path()).into());
        }
        if self.registry().codec_for(type_id).is_some() {
            return Ok(());
        }

        match reflected {
            ReflectRef::Option(Some(inner)) => self.check_serializable(inner),
            ReflectRef::List(items) | ReflectRef::Tuple(items) => {
                items.into_iter().try_for_each(|item| self.check_serializable(item))
            }
            ReflectRef::Map(entries) => entries.into_iter().try_for_each(|(key, value)| {
                self.check_serializable(key)?;
                self.check_serializable(value)
            }),
            ReflectRef::Record(record) => record
                .record_info()
                .fields()
                .iter()
                .filter_map(|field| record.field(field.name()))
                .try_for_each(|field| self.check_serializable(field)),
            _ => Ok(()),
        }
    }
}
