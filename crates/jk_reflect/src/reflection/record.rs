use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::info::RecordInfo;
use crate::{ConstructError, FromReflect, Reflect};

// -----------------------------------------------------------------------------
// Record

/// A structured type described by its named, typed fields.
///
/// Usually implemented with `#[derive(Record)]`.
pub trait Record: Reflect {
    /// Static description: fields, constructor and encoding attributes.
    fn record_info(&self) -> &'static RecordInfo;

    /// Reads the current value of a declared field.
    fn field(&self, name: &str) -> Option<&dyn Reflect>;
}

// -----------------------------------------------------------------------------
// FieldArgs

/// Constructor arguments assembled by the deserializer.
///
/// Slots are aligned with [`RecordInfo::fields`]. A slot left empty falls
/// back to the field's default when taken.
///
/// ```
/// use jk_reflect::FieldArgs;
/// use jk_reflect::derive::Record;
/// use jk_reflect::info::Typed;
///
/// #[derive(Record, Debug, PartialEq)]
/// struct Point {
///     x: i32,
///     #[record(default = 5)]
///     y: i32,
/// }
///
/// let info = Point::type_info().as_record().unwrap();
/// let mut args = FieldArgs::new(info);
/// args.set("x", Box::new(1_i32));
///
/// let point = (info.constructor())(&mut args).unwrap().take::<Point>().unwrap();
/// assert_eq!(point, Point { x: 1, y: 5 });
/// ```
pub struct FieldArgs {
    info: &'static RecordInfo,
    values: Vec<Option<Box<dyn Reflect>>>,
}

impl FieldArgs {
    pub fn new(info: &'static RecordInfo) -> Self {
        let mut values = Vec::with_capacity(info.fields().len());
        values.resize_with(info.fields().len(), || None);
        Self { info, values }
    }

    /// Fills the slot of field `name`. Returns `false` for unknown names.
    pub fn set(&mut self, name: &str, value: Box<dyn Reflect>) -> bool {
        match self.info.field_index(name) {
            Some(index) => self.set_at(index, value),
            None => false,
        }
    }

    pub(crate) fn set_at(&mut self, index: usize, value: Box<dyn Reflect>) -> bool {
        match self.values.get_mut(index) {
            Some(slot) => {
                *slot = Some(value);
                true
            }
            None => false,
        }
    }

    /// Takes the value of field `name`, or its default if the slot is empty.
    pub fn take<T: FromReflect>(&mut self, name: &'static str) -> Result<T, ConstructError> {
        let index = self
            .info
            .field_index(name)
            .ok_or(ConstructError::Missing(name))?;

        let value = match self.values.get_mut(index).and_then(Option::take) {
            Some(value) => value,
            None => self
                .info
                .fields()
                .get(index)
                .and_then(|field| field.default_value())
                .ok_or(ConstructError::Missing(name))?,
        };

        T::take_from(value).map_err(|source| ConstructError::Field { field: name, source })
    }
}
