use alloc::boxed::Box;
use core::fmt;

use crate::Reflect;
use crate::info::TypeRef;

/// One constructor parameter of a record: name, declared type and default.
#[derive(Clone)]
pub struct FieldDescriptor {
    name: &'static str,
    ty: TypeRef,
    default: Option<fn() -> Box<dyn Reflect>>,
    rename: Option<&'static str>,
}

impl FieldDescriptor {
    #[inline]
    pub fn new(name: &'static str, ty: TypeRef) -> Self {
        Self {
            name,
            ty,
            default: None,
            rename: None,
        }
    }

    /// Marks the field optional; `default` produces the value used when
    /// the payload omits it.
    #[inline]
    pub fn with_default(mut self, default: fn() -> Box<dyn Reflect>) -> Self {
        self.default = Some(default);
        self
    }

    /// Sets the wire name of this field.
    #[inline]
    pub fn with_rename(mut self, rename: &'static str) -> Self {
        self.rename = Some(rename);
        self
    }

    #[inline]
    pub(crate) fn with_ty(&self, ty: TypeRef) -> Self {
        Self { ty, ..self.clone() }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    #[inline]
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// A fresh default value, if the field has one.
    #[inline]
    pub fn default_value(&self) -> Option<Box<dyn Reflect>> {
        self.default.map(|default| default())
    }

    /// The wire name declared on the field itself, if any.
    #[inline]
    pub fn rename(&self) -> Option<&'static str> {
        self.rename
    }
}

impl PartialEq for FieldDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.ty == other.ty
            && self.has_default() == other.has_default()
            && self.rename == other.rename
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("has_default", &self.has_default())
            .field("rename", &self.rename)
            .finish()
    }
}
