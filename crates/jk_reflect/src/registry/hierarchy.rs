use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::TypeId;
use core::fmt;

use jk_utils::hash::HashMap;

use crate::codec::CodecId;
use crate::info::{Type, TypeRef};
use crate::registry::TypeRegistry;
use crate::{DowncastError, Reflect};

// -----------------------------------------------------------------------------
// Position

/// Where the discriminator of a hierarchy member is written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Position {
    /// As a key of the member's own object, or as the leading slot of a
    /// list-encoded member.
    #[default]
    Inside,
    /// As a key of the enclosing object; the member payload carries nothing.
    Outside,
}

// -----------------------------------------------------------------------------
// HierarchyConfig

/// Settings of a hierarchy root.
///
/// ```
/// use jk_reflect::registry::{HierarchyConfig, Position};
///
/// let config = HierarchyConfig::new("kind").position(Position::Outside);
/// assert_eq!(config.discriminator(), "kind");
/// assert_eq!(HierarchyConfig::default().discriminator(), "type");
/// ```
#[derive(Clone, Debug)]
pub struct HierarchyConfig {
    discriminator: Cow<'static, str>,
    position: Position,
}

impl HierarchyConfig {
    #[inline]
    pub fn new(discriminator: impl Into<Cow<'static, str>>) -> Self {
        Self {
            discriminator: discriminator.into(),
            position: Position::Inside,
        }
    }

    #[inline]
    pub fn position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    #[inline]
    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }
}

impl Default for HierarchyConfig {
    #[inline]
    fn default() -> Self {
        Self::new("type")
    }
}

// -----------------------------------------------------------------------------
// ModuleLoader

/// Best-effort hook run when a qualified discriminator is unknown.
///
/// The loader is expected to register the missing subtype (for instance by
/// running a plugin's bootstrap function). Its failure is logged and
/// ignored; the lookup is retried either way.
///
/// Closures with the same signature implement this trait.
pub trait ModuleLoader: Send + Sync {
    fn load(
        &self,
        registry: &TypeRegistry,
        qualified: &str,
    ) -> Result<(), Box<dyn core::error::Error + Send + Sync>>;
}

impl<F> ModuleLoader for F
where
    F: Fn(&TypeRegistry, &str) -> Result<(), Box<dyn core::error::Error + Send + Sync>>
        + Send
        + Sync,
{
    #[inline]
    fn load(
        &self,
        registry: &TypeRegistry,
        qualified: &str,
    ) -> Result<(), Box<dyn core::error::Error + Send + Sync>> {
        self(registry, qualified)
    }
}

/// Whether an alias looks like a path the module loader could resolve.
#[inline]
pub(crate) fn is_qualified(alias: &str) -> bool {
    alias.contains("::") || alias.contains('.')
}

// -----------------------------------------------------------------------------
// Subtype

/// Identity of a hierarchy member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum SubtypeKey {
    Type(TypeId),
    Template(CodecId),
}

/// Moves a decoded member into the root's box.
pub(crate) type Upcast =
    Arc<dyn Fn(Box<dyn Reflect>) -> Result<Box<dyn Reflect>, DowncastError> + Send + Sync>;

/// One decoding candidate registered under an alias.
#[derive(Clone)]
pub(crate) struct Subtype {
    pub key: SubtypeKey,
    pub name: &'static str,
    /// What the payload is decoded against before upcasting.
    pub ty: TypeRef,
    pub upcast: Upcast,
    /// Parameterized templates may share an alias with other members.
    pub shared: bool,
}

impl fmt::Debug for Subtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subtype")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("ty", &self.ty)
            .finish()
    }
}

/// The alias a member serializes with, and the root it belongs to.
#[derive(Clone, Debug)]
pub(crate) struct Membership {
    pub root: TypeId,
    pub root_path: &'static str,
    pub alias: String,
}

// -----------------------------------------------------------------------------
// Hierarchy

#[derive(Debug)]
pub(crate) struct Hierarchy {
    pub root: Type,
    pub config: HierarchyConfig,
    pub subtypes: HashMap<String, Vec<Subtype>>,
}

impl Hierarchy {
    pub fn new(root: Type, config: HierarchyConfig) -> Self {
        Self {
            root,
            config,
            subtypes: HashMap::default(),
        }
    }

    #[inline]
    pub fn discriminator(&self) -> &str {
        &self.config.discriminator
    }

    #[inline]
    pub fn position(&self) -> Position {
        self.config.position
    }

    pub fn candidates(&self, alias: &str) -> Vec<Subtype> {
        self.subtypes.get(alias).cloned().unwrap_or_default()
    }
}

/// Discriminator settings of the hierarchy a record belongs to.
#[derive(Clone, Debug)]
pub(crate) struct Tag {
    pub root: TypeId,
    pub root_path: &'static str,
    pub discriminator: String,
    pub position: Position,
    pub alias: String,
}

impl Tag {
    #[inline]
    pub fn is_inside(&self) -> bool {
        self.position == Position::Inside
    }
}
