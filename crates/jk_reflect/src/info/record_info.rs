use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use jk_utils::case;

use crate::info::{FieldDescriptor, Type};
use crate::{ConstructError, FieldArgs, Reflect};

/// Builds a record from its assembled arguments.
pub type ConstructFn = fn(&mut FieldArgs) -> Result<Box<dyn Reflect>, ConstructError>;

// -----------------------------------------------------------------------------
// RenameRule

/// A rule applied to every field name that has no explicit rename.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenameRule {
    CamelCase,
    PascalCase,
}

impl RenameRule {
    /// Parses the attribute spelling, `"camelCase"` or `"PascalCase"`.
    pub fn parse(rule: &str) -> Option<Self> {
        match rule {
            "camelCase" => Some(Self::CamelCase),
            "PascalCase" => Some(Self::PascalCase),
            _ => None,
        }
    }

    pub fn apply(self, name: &str) -> Cow<'static, str> {
        match self {
            Self::CamelCase => Cow::Owned(case::to_camel_case(name)),
            Self::PascalCase => Cow::Owned(case::to_pascal_case(name)),
        }
    }
}

// -----------------------------------------------------------------------------
// RecordAttrs

/// Encoding attributes declared on the type itself.
///
/// The registry can overlay more of these at runtime, see
/// [`TypeRegistry::declare_list_encoding`](crate::registry::TypeRegistry::declare_list_encoding).
#[derive(Clone, Debug, Default)]
pub struct RecordAttrs {
    /// Encode as a positional array instead of an object.
    pub list: bool,
    /// Discriminator value when registered as a subtype.
    pub alias: Option<&'static str>,
    pub rename_all: Option<RenameRule>,
    /// Refuse to serialize values of this type.
    pub unserializable: bool,
}

// -----------------------------------------------------------------------------
// RecordInfo

/// Static description of a record type.
pub struct RecordInfo {
    ty: Type,
    fields: Box<[FieldDescriptor]>,
    construct: ConstructFn,
    attrs: RecordAttrs,
}

impl RecordInfo {
    pub fn new<T: Any>(fields: Vec<FieldDescriptor>, construct: ConstructFn) -> Self {
        Self {
            ty: Type::of::<T>(),
            fields: fields.into_boxed_slice(),
            construct,
            attrs: RecordAttrs::default(),
        }
    }

    #[inline]
    pub fn with_attrs(mut self, attrs: RecordAttrs) -> Self {
        self.attrs = attrs;
        self
    }

    #[inline]
    pub fn ty(&self) -> Type {
        self.ty
    }

    #[inline]
    pub fn type_path(&self) -> &'static str {
        self.ty.path()
    }

    /// Fields in declaration order.
    #[inline]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name() == name)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name() == name)
    }

    #[inline]
    pub fn constructor(&self) -> ConstructFn {
        self.construct
    }

    #[inline]
    pub fn attrs(&self) -> &RecordAttrs {
        &self.attrs
    }

    /// The discriminator value used when no alias is declared: the full type path.
    #[inline]
    pub fn alias(&self) -> &'static str {
        self.attrs.alias.unwrap_or(self.ty.path())
    }
}

impl fmt::Debug for RecordInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordInfo")
            .field("ty", &self.ty)
            .field("fields", &self.fields)
            .field("attrs", &self.attrs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::RenameRule;

    #[test]
    fn rename_rules() {
        assert_eq!(RenameRule::parse("camelCase"), Some(RenameRule::CamelCase));
        assert_eq!(RenameRule::parse("kebab-case"), None);
        assert_eq!(RenameRule::CamelCase.apply("max_size"), "maxSize");
        assert_eq!(RenameRule::PascalCase.apply("max_size"), "MaxSize");
    }
}
