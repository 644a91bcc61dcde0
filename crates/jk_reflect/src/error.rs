use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;

use thiserror::Error;

// -----------------------------------------------------------------------------
// ConfigurationError

/// A declaration is inconsistent or incomplete.
///
/// Raised while registering types, codecs and hierarchies, or the first
/// time a broken declaration is used. Never swallowed by union resolution.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigurationError {
    #[error("unresolved type names: {}", .0.join(", "))]
    UnresolvedNames(Vec<String>),
    #[error("type name `{0}` is already declared")]
    DuplicateName(String),
    #[error("codec `{codec}` has no parameter named `{param}`")]
    UnknownParam { codec: &'static str, param: String },
    #[error("codec `{codec}` takes {declared} parameters but {given} were given")]
    TooManyArgs {
        codec: &'static str,
        declared: usize,
        given: usize,
    },
    #[error("codec `{codec}` got parameter `{param}` more than once")]
    DuplicateParam { codec: &'static str, param: String },
    #[error("codec `{codec}` is missing parameter `{param}`")]
    MissingParam { codec: &'static str, param: &'static str },
    #[error("codec `{codec}` got an invalid `{param}`: {reason}")]
    InvalidParam {
        codec: &'static str,
        param: &'static str,
        reason: Cow<'static, str>,
    },
    #[error("codec `{0}` needs parameters before it can be used")]
    UnrealizedCodec(&'static str),
    #[error("no codec registered for opaque type `{0}`")]
    NoCodec(&'static str),
    #[error("map key type `{0}` is not a string, integer or float")]
    UnsupportedMapKey(&'static str),
    #[error("`{0}` cannot be a hierarchy root")]
    NotARoot(&'static str),
    #[error("`{0}` is not a declared hierarchy root")]
    UndeclaredHierarchy(&'static str),
    #[error("`{0}` is already declared as a hierarchy root")]
    DuplicateHierarchy(&'static str),
    #[error("`{0}` is not a record type")]
    NotARecord(&'static str),
    #[error("discriminator `{alias}` of `{root}` is already taken by `{existing}`")]
    AliasCollision {
        root: &'static str,
        alias: String,
        existing: &'static str,
    },
    #[error("`{subtype}` is already a subtype of `{root}`")]
    AlreadyMember {
        subtype: &'static str,
        root: &'static str,
    },
    #[error("field `{field}` of `{subtype}` collides with discriminator `{discriminator}`")]
    FieldCollision {
        subtype: &'static str,
        field: String,
        discriminator: String,
    },
}

// -----------------------------------------------------------------------------
// SerializationError

/// A value could not be turned into plain data.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SerializationError {
    #[error("`{0}` is marked unserializable")]
    Unserializable(&'static str),
    #[error("`{0}` matches no alternative of the union")]
    NoUnionMatch(&'static str),
    #[error("codec `{0}` needs parameters before it can serialize")]
    UnrealizedCodec(&'static str),
    #[error("field `{field}` of `{type_path}` conflicts with the discriminator")]
    DiscriminatorConflict {
        type_path: &'static str,
        field: String,
    },
    #[error("non-finite float `{0}` has no plain-data form")]
    NonFiniteFloat(f64),
    #[error("`{0}` cannot be used as a map key")]
    UnsupportedMapKey(&'static str),
    #[error("`{0}` was expected, found `{1}`")]
    TypeMismatch(&'static str, &'static str),
    #[error("{0}")]
    Custom(Cow<'static, str>),
}

// -----------------------------------------------------------------------------
// DeserializationError

/// Plain data does not fit the requested type.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DeserializationError {
    #[error("unknown discriminator `{alias}` for `{root}`")]
    UnknownDiscriminator { alias: String, root: &'static str },
    #[error("`{root}` payload carries no `{discriminator}` discriminator")]
    MissingDiscriminator {
        root: &'static str,
        discriminator: String,
    },
    #[error("`{type_path}` is missing required field `{field}`")]
    MissingField { type_path: &'static str, field: String },
    #[error("`{type_path}` needs at least {expected} elements, found {found}")]
    TooFewElements {
        type_path: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("data matches no alternative of the union")]
    NoUnionMatch,
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: Cow<'static, str>,
        found: Cow<'static, str>,
    },
    #[error("map key `{key}` is not a valid `{expected}`")]
    InvalidKey { key: String, expected: &'static str },
    #[error(transparent)]
    Construct(#[from] ConstructError),
    #[error("{0}")]
    Custom(Cow<'static, str>),
}

impl DeserializationError {
    #[inline]
    pub(crate) fn mismatch(
        expected: impl Into<Cow<'static, str>>,
        found: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}

// -----------------------------------------------------------------------------
// Construction

/// A boxed value does not have the requested concrete type.
#[derive(Debug, Clone, Error)]
#[error("expected `{expected}`, found `{found}`")]
pub struct DowncastError {
    pub expected: &'static str,
    pub found: &'static str,
}

/// A record constructor could not assemble its arguments.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConstructError {
    #[error("no value and no default for field `{0}`")]
    Missing(&'static str),
    #[error("field `{field}`: {source}")]
    Field {
        field: &'static str,
        source: DowncastError,
    },
    #[error(transparent)]
    Downcast(#[from] DowncastError),
    #[error("{0}")]
    Custom(Cow<'static, str>),
}

// -----------------------------------------------------------------------------
// Error

/// Any failure of the engine or of the JSON helpers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Serialization(#[from] SerializationError),
    #[error(transparent)]
    Deserialization(#[from] DeserializationError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this is a type or construction mismatch that union
    /// resolution may swallow before trying the next alternative.
    ///
    /// Discriminator failures and exhausted nested unions are not
    /// mismatches; they surface from the enclosing union unchanged.
    ///
    /// ```
    /// use jk_reflect::{ConfigurationError, DeserializationError, Error};
    ///
    /// let missing = DeserializationError::MissingField { type_path: "Point", field: "x".into() };
    /// assert!(Error::from(missing).is_mismatch());
    /// assert!(!Error::from(DeserializationError::NoUnionMatch).is_mismatch());
    /// assert!(!Error::from(ConfigurationError::NoCodec("x")).is_mismatch());
    /// ```
    pub fn is_mismatch(&self) -> bool {
        match self {
            Self::Serialization(SerializationError::Unserializable(_)) => false,
            Self::Serialization(_) => true,
            Self::Deserialization(err) => matches!(
                err,
                DeserializationError::TypeMismatch { .. }
                    | DeserializationError::MissingField { .. }
                    | DeserializationError::TooFewElements { .. }
                    | DeserializationError::InvalidKey { .. }
                    | DeserializationError::Construct(_)
            ),
            _ => false,
        }
    }
}

impl From<ConstructError> for Error {
    #[inline]
    fn from(value: ConstructError) -> Self {
        Self::Deserialization(value.into())
    }
}

impl From<DowncastError> for Error {
    #[inline]
    fn from(value: DowncastError) -> Self {
        Self::Deserialization(ConstructError::Downcast(value).into())
    }
}
