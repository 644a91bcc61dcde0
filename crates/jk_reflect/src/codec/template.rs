use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::sync::Arc;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use crate::ConfigurationError;
use crate::codec::{Codec, CodecArgs, ParamValue, RealizedCodec, realized};
use crate::info::TypeRef;

// -----------------------------------------------------------------------------
// CodecId

/// Process-unique identity of a [`CodecTemplate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CodecId(u64);

impl CodecId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

// -----------------------------------------------------------------------------
// CodecParams

/// The normalized parameters handed to a template's build function.
pub struct CodecParams<'a> {
    codec: &'static str,
    names: &'static [&'static str],
    values: &'a [ParamValue],
}

impl<'a> CodecParams<'a> {
    pub(crate) fn new(template: &CodecTemplate, values: &'a [ParamValue]) -> Self {
        Self {
            codec: template.name,
            names: template.params,
            values,
        }
    }

    /// Returns the parameter declared as `name`.
    pub fn get(&self, name: &'static str) -> Result<&'a ParamValue, ConfigurationError> {
        self.names
            .iter()
            .position(|param| *param == name)
            .and_then(|index| self.values.get(index))
            .ok_or(ConfigurationError::MissingParam {
                codec: self.codec,
                param: name,
            })
    }

    fn invalid(&self, param: &'static str, expected: &'static str) -> ConfigurationError {
        ConfigurationError::InvalidParam {
            codec: self.codec,
            param,
            reason: Cow::Borrowed(expected),
        }
    }

    pub fn u64(&self, name: &'static str) -> Result<u64, ConfigurationError> {
        match self.get(name)? {
            ParamValue::UInt(value) => Ok(*value),
            _ => Err(self.invalid(name, "expected a non-negative integer")),
        }
    }

    pub fn i64(&self, name: &'static str) -> Result<i64, ConfigurationError> {
        match self.get(name)? {
            ParamValue::Int(value) => Ok(*value),
            ParamValue::UInt(value) => {
                i64::try_from(*value).map_err(|_| self.invalid(name, "integer out of range"))
            }
            _ => Err(self.invalid(name, "expected an integer")),
        }
    }

    pub fn f64(&self, name: &'static str) -> Result<f64, ConfigurationError> {
        match self.get(name)? {
            ParamValue::Float(value) => Ok(*value),
            ParamValue::Int(value) => Ok(*value as f64),
            ParamValue::UInt(value) => Ok(*value as f64),
            _ => Err(self.invalid(name, "expected a number")),
        }
    }

    pub fn bool(&self, name: &'static str) -> Result<bool, ConfigurationError> {
        match self.get(name)? {
            ParamValue::Bool(value) => Ok(*value),
            _ => Err(self.invalid(name, "expected a boolean")),
        }
    }

    pub fn str(&self, name: &'static str) -> Result<&'a str, ConfigurationError> {
        match self.get(name)? {
            ParamValue::Str(value) => Ok(value),
            _ => Err(self.invalid(name, "expected a string")),
        }
    }

    pub fn type_ref(&self, name: &'static str) -> Result<TypeRef, ConfigurationError> {
        match self.get(name)? {
            ParamValue::Type(ty) => Ok(ty.clone()),
            ParamValue::Str(value) => Ok(TypeRef::named(value.clone().into_owned())),
            _ => Err(self.invalid(name, "expected a type")),
        }
    }
}

// -----------------------------------------------------------------------------
// CodecTemplate

/// Builds the executable codec from its parameters.
pub type CodecBuildFn = fn(&CodecParams<'_>) -> Result<Box<dyn Codec>, ConfigurationError>;

/// A codec definition: name, declared parameters and behavior.
///
/// Templates without parameters are static and realize to a single
/// instance. Parameterized templates must be realized before they can
/// encode anything, see [`CodecTemplate::realize`].
pub struct CodecTemplate {
    id: CodecId,
    name: &'static str,
    params: &'static [&'static str],
    build: CodecBuildFn,
}

impl CodecTemplate {
    pub fn new(
        name: &'static str,
        params: &'static [&'static str],
        build: CodecBuildFn,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: CodecId::next(),
            name,
            params,
            build,
        })
    }

    /// A template without parameters.
    #[inline]
    pub fn stateless(name: &'static str, build: CodecBuildFn) -> Arc<Self> {
        Self::new(name, &[], build)
    }

    #[inline]
    pub fn id(&self) -> CodecId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared parameter names, in positional order.
    #[inline]
    pub fn params(&self) -> &'static [&'static str] {
        self.params
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.params.is_empty()
    }

    pub(crate) fn build(&self, values: &[ParamValue]) -> Result<Box<dyn Codec>, ConfigurationError> {
        (self.build)(&CodecParams::new(self, values))
    }

    /// Binds the template to `args`.
    ///
    /// Equal hashable arguments always return the same cached instance.
    /// Unknown, duplicate, missing or excess arguments are a
    /// [`ConfigurationError`].
    #[inline]
    pub fn realize(self: &Arc<Self>, args: CodecArgs) -> Result<Arc<RealizedCodec>, ConfigurationError> {
        realized::intern(self, args)
    }

    /// The single instance of a static template.
    #[inline]
    pub fn instance(self: &Arc<Self>) -> Result<Arc<RealizedCodec>, ConfigurationError> {
        self.realize(CodecArgs::new())
    }
}

impl fmt::Debug for CodecTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecTemplate")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}
