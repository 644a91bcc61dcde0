use alloc::borrow::ToOwned;
use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::any::TypeId;
use std::sync::{OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use jk_utils::TypeIdMap;
use jk_utils::hash::{HashMap, HashSet};
use serde_core::Serialize;
use serde_core::de::DeserializeOwned;
use serde_json::Value;

use crate::codec::{Codec, CodecParams, CodecTemplate, RealizedCodec, SerdeCodec};
use crate::info::{FieldDescriptor, RecordInfo, RenameRule, TypeInfo, TypeRef, Typed};
use crate::registry::hierarchy::{Hierarchy, Membership, Upcast, is_qualified};
use crate::registry::layout::{Encoding, wire_names};
use crate::registry::{
    HierarchyConfig, ModuleLoader, Position, RecordLayout, Subtype, SubtypeKey, Tag,
};
use crate::serde::{DeserializeDriver, SerializeDriver};
use crate::{ConfigurationError, DeserializationError, Error, FromReflect, Reflect};

/// Chains of names pointing at names are followed at most this deep.
const MAX_NAME_DEPTH: usize = 32;

// -----------------------------------------------------------------------------
// CodecEntry

/// A codec registered for a runtime type.
#[derive(Clone, Debug)]
pub(crate) enum CodecEntry {
    /// Parameterized; must be realized before it can run.
    Template(Arc<CodecTemplate>),
    Realized(Arc<RealizedCodec>),
}

// -----------------------------------------------------------------------------
// Tables

#[derive(Default)]
struct Tables {
    codecs: TypeIdMap<CodecEntry>,
    hierarchies: TypeIdMap<Hierarchy>,
    members: HashMap<SubtypeKey, Membership>,
    encodings: TypeIdMap<Encoding>,
    fields: TypeIdMap<Arc<[FieldDescriptor]>>,
    names: HashMap<String, TypeRef>,
    short_names: HashMap<&'static str, TypeRef>,
    ambiguous: HashSet<&'static str>,
    records: TypeIdMap<&'static RecordInfo>,
    loader: Option<Arc<dyn ModuleLoader>>,
}

impl Tables {
    fn lookup_name(&self, name: &str) -> Option<&TypeRef> {
        self.names.get(name).or_else(|| self.short_names.get(name))
    }

    /// Replaces every resolvable name inside `ty`; the others are collected.
    fn resolve(&self, ty: &TypeRef, unresolved: &mut Vec<String>, depth: usize) -> TypeRef {
        if !ty.has_names() {
            return ty.clone();
        }
        match ty {
            TypeRef::Named(name) => match self.lookup_name(name) {
                Some(target) if depth < MAX_NAME_DEPTH => self.resolve(target, unresolved, depth + 1),
                _ => {
                    unresolved.push(name.to_string());
                    ty.clone()
                }
            },
            TypeRef::Union(alternatives) => TypeRef::union(
                alternatives
                    .iter()
                    .map(|alternative| self.resolve(alternative, unresolved, depth)),
            ),
            TypeRef::List(item) => TypeRef::list_of(self.resolve(item, unresolved, depth)),
            TypeRef::Map(item) => TypeRef::map_of(self.resolve(item, unresolved, depth)),
            other => other.clone(),
        }
    }

    fn tag(&self, membership: &Membership) -> Option<Tag> {
        let hierarchy = self.hierarchies.get(&membership.root)?;
        Some(Tag {
            root: membership.root,
            root_path: hierarchy.root.path(),
            discriminator: hierarchy.discriminator().to_owned(),
            position: hierarchy.position(),
            alias: membership.alias.clone(),
        })
    }
}

/// Walks declared types looking for names the table cannot resolve.
struct NameCheck<'t> {
    tables: &'t Tables,
    types: HashSet<TypeId>,
    names: HashSet<String>,
    unresolved: Vec<String>,
}

impl NameCheck<'_> {
    fn visit(&mut self, ty: &TypeRef) {
        match ty {
            TypeRef::Named(name) => {
                if !self.names.insert(name.to_string()) {
                    return;
                }
                match self.tables.lookup_name(name) {
                    Some(target) => self.visit(target),
                    None => self.unresolved.push(name.to_string()),
                }
            }
            TypeRef::Union(alternatives) => alternatives.iter().for_each(|alt| self.visit(alt)),
            TypeRef::List(item) | TypeRef::Map(item) => self.visit(item),
            TypeRef::Type(info) => self.visit_info(info()),
            TypeRef::Any | TypeRef::Codec(_) | TypeRef::Template(_) => {}
        }
    }

    fn visit_record(&mut self, record: &'static RecordInfo) {
        if self.types.insert(record.ty().id()) {
            self.visit_fields(record);
        }
    }

    fn visit_fields(&mut self, record: &'static RecordInfo) {
        record.fields().iter().for_each(|field| self.visit(field.ty()));
    }

    fn visit_info(&mut self, info: &'static TypeInfo) {
        if !self.types.insert(info.type_id()) {
            return;
        }
        match info {
            TypeInfo::Record(record) => self.visit_fields(record),
            TypeInfo::Option(info) => self.visit(info.some()),
            TypeInfo::List(info) => self.visit(info.item()),
            TypeInfo::Tuple(info) => info.items().iter().for_each(|item| self.visit(item)),
            TypeInfo::Map(info) => {
                self.visit(info.key());
                self.visit(info.value());
            }
            _ => {}
        }
    }
}

// -----------------------------------------------------------------------------
// TypeRegistry

/// The central store for codecs, hierarchies, names and encoding overrides.
///
/// Everything is registered through `&self`; a registry can be shared
/// between threads. [`TypeRegistry::global`] is the process-wide instance
/// used by the free functions of this crate, and isolated registries can
/// be created with [`TypeRegistry::new`].
///
/// # Example
///
/// ```
/// use jk_reflect::derive::Record;
/// use jk_reflect::registry::TypeRegistry;
/// use serde_json::json;
///
/// #[derive(Record, Debug, PartialEq)]
/// struct Server {
///     host: String,
///     port: u16,
///     #[record(default)]
///     tags: Vec<String>,
/// }
///
/// let registry = TypeRegistry::new();
/// registry.declare_field_rename::<Server>(&[("host", "hostname")]);
///
/// let server = Server { host: "localhost".into(), port: 80, tags: vec![] };
/// let data = registry.serialize(&server, None).unwrap();
/// assert_eq!(data, json!({"hostname": "localhost", "port": 80, "tags": []}));
///
/// let back = registry
///     .deserialize_as::<Server>(&json!({"hostname": "localhost", "port": 80}))
///     .unwrap();
/// assert_eq!(back, server);
/// ```
pub struct TypeRegistry {
    tables: RwLock<Tables>,
}

impl Default for TypeRegistry {
    /// See [`TypeRegistry::new`].
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Creates a registry without any registration.
    #[inline]
    pub fn empty() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Creates a registry with the built-in codecs, when the `builtin`
    /// feature is enabled.
    pub fn new() -> Self {
        let registry = Self::empty();
        registry.install_builtin();
        registry
    }

    /// The process-wide registry, created on first use.
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<TypeRegistry> = OnceLock::new();
        GLOBAL.get_or_init(Self::new)
    }

    #[cfg(feature = "builtin")]
    fn install_builtin(&self) {
        if let Err(err) = crate::codec::builtin::register_builtin(self) {
            log::error!("failed to register the built-in codecs: {err}");
        }
    }

    #[cfg(not(feature = "builtin"))]
    #[inline]
    fn install_builtin(&self) {}

    #[inline]
    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    // -------------------------------------------------------------------------
    // Codecs

    /// Registers `template` as the codec of `T`.
    ///
    /// Static templates are realized at once. Parameterized templates are
    /// stored as they are; using them to encode `T` is an error until a
    /// realized codec replaces them. Registering for a built-in container
    /// type (`Option`, sequences, tuples, maps, `Box<dyn Reflect>`) is
    /// silently ignored.
    ///
    /// The same template may be registered for any number of types.
    pub fn register_codec<T: Typed>(
        &self,
        template: &Arc<CodecTemplate>,
    ) -> Result<(), ConfigurationError> {
        let info = T::type_info();
        if info.is_container() {
            log::debug!(
                "codec `{}` ignored for built-in container `{}`",
                template.name(),
                info.type_path()
            );
            return Ok(());
        }

        let entry = if template.is_static() {
            CodecEntry::Realized(template.instance()?)
        } else {
            CodecEntry::Template(Arc::clone(template))
        };
        self.insert_codec(info, entry);
        Ok(())
    }

    /// Registers an already realized codec as the codec of `T`.
    pub fn register_realized_codec<T: Typed>(&self, codec: &Arc<RealizedCodec>) {
        let info = T::type_info();
        if info.is_container() {
            log::debug!("codec `{codec}` ignored for built-in container `{}`", info.type_path());
            return;
        }
        self.insert_codec(info, CodecEntry::Realized(Arc::clone(codec)));
    }

    /// Encodes `T` through its own `serde` implementations.
    ///
    /// See [`SerdeCodec`].
    pub fn register_serde<T>(&self) -> Result<(), ConfigurationError>
    where
        T: Typed + Serialize + DeserializeOwned,
    {
        self.register_codec::<T>(&CodecTemplate::stateless("Serde", build_serde::<T>))
    }

    fn insert_codec(&self, info: &TypeInfo, entry: CodecEntry) {
        log::debug!("registered codec {entry:?} for `{}`", info.type_path());
        self.write().codecs.insert(info.type_id(), entry);
    }

    /// Returns `true` if a codec is registered for `T`.
    #[inline]
    pub fn has_codec<T: Typed>(&self) -> bool {
        self.read().codecs.contains(&T::type_info().type_id())
    }

    pub(crate) fn codec_for(&self, type_id: TypeId) -> Option<CodecEntry> {
        self.read().codecs.get(&type_id).cloned()
    }

    // -------------------------------------------------------------------------
    // Names

    /// Declares `name` as a forward reference to `ty`.
    ///
    /// Declaring the same name twice for the same type is a no-op.
    pub fn declare_name(&self, name: &str, ty: TypeRef) -> Result<(), ConfigurationError> {
        let mut tables = self.write();
        match tables.names.get(name) {
            Some(existing) if *existing == ty => Ok(()),
            Some(_) => Err(ConfigurationError::DuplicateName(name.to_owned())),
            None => {
                tables.names.insert(name.to_owned(), ty);
                Ok(())
            }
        }
    }

    /// Makes `T` resolvable by its full type path and, while unambiguous,
    /// by its short name. Records registered here are checked by
    /// [`validate`](Self::validate).
    pub fn register_type<T: Typed>(&self) -> Result<(), ConfigurationError> {
        let info = T::type_info();
        let ty = info.ty();
        self.declare_name(ty.path(), TypeRef::of::<T>())?;

        let mut tables = self.write();
        if let Some(record) = info.as_record() {
            tables.records.insert(ty.id(), record);
        }

        let short = ty.name();
        if short == ty.path() || tables.ambiguous.contains(short) {
            return Ok(());
        }
        match tables.short_names.get(short) {
            Some(existing) if *existing == TypeRef::of::<T>() => {}
            Some(_) => {
                log::debug!("short name `{short}` is ambiguous, use the full path");
                tables.short_names.remove(short);
                tables.ambiguous.insert(short);
            }
            None => {
                tables.short_names.insert(short, TypeRef::of::<T>());
            }
        }
        Ok(())
    }

    /// Looks up a declared name.
    pub fn resolve_name(&self, name: &str) -> Result<TypeRef, ConfigurationError> {
        let tables = self.read();
        let mut unresolved = Vec::new();
        let resolved = tables.resolve(&TypeRef::named(name.to_owned()), &mut unresolved, 0);
        if unresolved.is_empty() {
            Ok(resolved)
        } else {
            Err(ConfigurationError::UnresolvedNames(unresolved))
        }
    }

    /// Checks that every name reachable from registered types, hierarchy
    /// members and declared names resolves.
    ///
    /// All unresolved names are reported at once, sorted.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let tables = self.read();
        let mut check = NameCheck {
            tables: &tables,
            types: HashSet::default(),
            names: HashSet::default(),
            unresolved: Vec::new(),
        };

        for record in tables.records.values() {
            check.visit_record(*record);
        }
        for hierarchy in tables.hierarchies.values() {
            for subtype in hierarchy.subtypes.values().flatten() {
                check.visit(&subtype.ty);
            }
        }
        for ty in tables.names.values() {
            check.visit(ty);
        }

        let mut unresolved = check.unresolved;
        if unresolved.is_empty() {
            return Ok(());
        }
        unresolved.sort();
        unresolved.dedup();
        Err(ConfigurationError::UnresolvedNames(unresolved))
    }

    // -------------------------------------------------------------------------
    // Fields

    /// The field descriptors of record `T`, names resolved.
    ///
    /// Resolved lists are cached; calling twice returns the same list.
    pub fn get_fields<T: Typed>(&self) -> Result<Arc<[FieldDescriptor]>, ConfigurationError> {
        let info = T::type_info();
        let record = info
            .as_record()
            .ok_or(ConfigurationError::NotARecord(info.type_path()))?;
        self.record_fields(record)
    }

    /// Like [`get_fields`](Self::get_fields), but leaves unresolvable
    /// names in place instead of failing. Meant for diagnostics.
    pub fn get_fields_unchecked<T: Typed>(&self) -> Result<Vec<FieldDescriptor>, ConfigurationError> {
        let info = T::type_info();
        let record = info
            .as_record()
            .ok_or(ConfigurationError::NotARecord(info.type_path()))?;
        let tables = self.read();
        let mut ignored = Vec::new();
        Ok(record
            .fields()
            .iter()
            .map(|field| field.with_ty(tables.resolve(field.ty(), &mut ignored, 0)))
            .collect())
    }

    pub(crate) fn record_fields(
        &self,
        info: &'static RecordInfo,
    ) -> Result<Arc<[FieldDescriptor]>, ConfigurationError> {
        let id = info.ty().id();
        if let Some(fields) = self.read().fields.get(&id) {
            return Ok(Arc::clone(fields));
        }

        let mut unresolved = Vec::new();
        let resolved: Arc<[FieldDescriptor]> = {
            let tables = self.read();
            info.fields()
                .iter()
                .map(|field| {
                    if field.ty().has_names() {
                        field.with_ty(tables.resolve(field.ty(), &mut unresolved, 0))
                    } else {
                        field.clone()
                    }
                })
                .collect()
        };
        if !unresolved.is_empty() {
            return Err(ConfigurationError::UnresolvedNames(unresolved));
        }

        let mut tables = self.write();
        Ok(Arc::clone(tables.fields.get_or_insert(id, || resolved)))
    }

    // -------------------------------------------------------------------------
    // Encoding

    fn update_encoding<T: Typed>(&self, update: impl FnOnce(&mut Encoding)) {
        let mut tables = self.write();
        update(tables.encodings.get_or_insert(T::type_info().type_id(), Encoding::default));
    }

    /// Encodes `T` as a positional array. Declared on a hierarchy root, it
    /// applies to every member.
    pub fn declare_list_encoding<T: Typed>(&self) {
        self.update_encoding::<T>(|encoding| encoding.list = true);
    }

    /// Overlays `(field, wire name)` pairs on `T`'s field names.
    ///
    /// Repeated calls merge; a mapping on a hierarchy root applies to every
    /// member and is overlaid by the member's own mapping.
    pub fn declare_field_rename<T: Typed>(&self, mapping: &[(&str, &str)]) {
        self.update_encoding::<T>(|encoding| {
            for (field, wire) in mapping {
                encoding.renames.insert((*field).to_owned(), (*wire).to_owned());
            }
        });
    }

    /// Applies `rule` to every field of `T` (or of every member, for a root)
    /// without an explicit rename.
    pub fn declare_rename_all<T: Typed>(&self, rule: RenameRule) {
        self.update_encoding::<T>(|encoding| encoding.rename_all = Some(rule));
    }

    /// Refuses to serialize values of `T`, and values containing them.
    pub fn declare_unserializable<T: Typed>(&self) {
        self.update_encoding::<T>(|encoding| encoding.unserializable = true);
    }

    pub(crate) fn record_layout(
        &self,
        info: &'static RecordInfo,
    ) -> Result<RecordLayout, ConfigurationError> {
        let fields = self.record_fields(info)?;
        let id = info.ty().id();
        let tables = self.read();

        let membership = tables.members.get(&SubtypeKey::Type(id));
        let own = tables.encodings.get(&id);
        let root = membership.and_then(|membership| tables.encodings.get(&membership.root));
        let flag = |get: fn(&Encoding) -> bool| own.is_some_and(get) || root.is_some_and(get);

        Ok(RecordLayout {
            info,
            fields,
            names: wire_names(info, own, root),
            list: info.attrs().list || flag(|encoding| encoding.list),
            unserializable: info.attrs().unserializable || flag(|encoding| encoding.unserializable),
            tag: membership.and_then(|membership| tables.tag(membership)),
        })
    }

    /// Whether values of the type `type_id` are marked unserializable,
    /// directly or through their hierarchy root.
    pub(crate) fn is_unserializable(&self, type_id: TypeId) -> bool {
        let tables = self.read();
        let marked = |id: &TypeId| tables.encodings.get(id).is_some_and(|e| e.unserializable);
        marked(&type_id)
            || tables
                .members
                .get(&SubtypeKey::Type(type_id))
                .is_some_and(|membership| marked(&membership.root))
    }

    // -------------------------------------------------------------------------
    // Hierarchies

    /// Declares the boxed trait object `R` as a hierarchy root.
    ///
    /// `R` must implement its reflection traits through
    /// [`impl_hierarchy_root!`](crate::impl_hierarchy_root).
    pub fn declare_hierarchy_root<R: Typed>(
        &self,
        config: HierarchyConfig,
    ) -> Result<(), ConfigurationError> {
        let info = R::type_info();
        if !matches!(info, TypeInfo::Root(_)) {
            return Err(ConfigurationError::NotARoot(info.type_path()));
        }

        let mut tables = self.write();
        if tables.hierarchies.contains(&info.type_id()) {
            return Err(ConfigurationError::DuplicateHierarchy(info.type_path()));
        }
        log::debug!(
            "declared hierarchy `{}`, discriminator `{}`",
            info.type_path(),
            config.discriminator()
        );
        tables
            .hierarchies
            .insert(info.type_id(), Hierarchy::new(info.ty(), config));
        Ok(())
    }

    /// Registers `S` as a member of root `R` under its declared alias.
    ///
    /// The alias is the record's `#[record(alias = "..")]`, or its full
    /// type path. `upcast` moves a decoded `S` into the root's box; it is
    /// a plain `fn`, usually one whose body is `Box::new(s)`.
    pub fn register_subtype<R: Typed, S: Typed + FromReflect>(
        &self,
        upcast: fn(S) -> R,
    ) -> Result<(), ConfigurationError> {
        let info = S::type_info();
        let alias = info.as_record().map_or(info.type_path(), RecordInfo::alias);
        self.register_subtype_as::<R, S>(alias, upcast)
    }

    /// Registers `S` as a member of root `R` under `alias`.
    ///
    /// Registering the same type twice is a no-op. An alias already taken
    /// by another member is a [`ConfigurationError::AliasCollision`].
    pub fn register_subtype_as<R: Typed, S: Typed + FromReflect>(
        &self,
        alias: &str,
        upcast: fn(S) -> R,
    ) -> Result<(), ConfigurationError> {
        self.add_subtype::<R>(alias, type_subtype(upcast), false)
    }

    /// Registers `S` under `alias`, replacing whatever held the alias.
    pub fn register_subtype_override<R: Typed, S: Typed + FromReflect>(
        &self,
        alias: &str,
        upcast: fn(S) -> R,
    ) -> Result<(), ConfigurationError> {
        self.add_subtype::<R>(alias, type_subtype(upcast), true)
    }

    /// Registers the realizations of `template` as members of root `R`.
    ///
    /// A member payload holds the codec's parameters; decoding it realizes
    /// the template and passes the codec to `upcast`. A parameterized
    /// template may share its alias with other members; candidates are
    /// then tried in registration order.
    pub fn register_codec_subtype<R: Typed>(
        &self,
        template: &Arc<CodecTemplate>,
        alias: &str,
        upcast: fn(Arc<RealizedCodec>) -> R,
    ) -> Result<(), ConfigurationError> {
        let subtype = Subtype {
            key: SubtypeKey::Template(template.id()),
            name: template.name(),
            ty: TypeRef::template(template),
            upcast: Arc::new(move |value: Box<dyn Reflect>| {
                let codec = value.take::<Arc<RealizedCodec>>()?;
                Ok(Box::new(upcast(codec)) as Box<dyn Reflect>)
            }),
            shared: !template.is_static(),
        };
        self.add_subtype::<R>(alias, subtype, false)
    }

    fn add_subtype<R: Typed>(
        &self,
        alias: &str,
        subtype: Subtype,
        replace: bool,
    ) -> Result<(), ConfigurationError> {
        let root = R::type_info();
        let root_id = root.type_id();
        let record = subtype.ty.type_info().and_then(TypeInfo::as_record);
        let (key, name) = (subtype.key, subtype.name);

        let mut guard = self.write();
        let tables = &mut *guard;
        let hierarchy = tables
            .hierarchies
            .get_mut(&root_id)
            .ok_or(ConfigurationError::UndeclaredHierarchy(root.type_path()))?;

        if let Some(existing) = tables.members.get(&key) {
            if existing.root != root_id {
                return Err(ConfigurationError::AlreadyMember {
                    subtype: name,
                    root: existing.root_path,
                });
            }
            if existing.alias == alias {
                return Ok(());
            }
            if !replace {
                return Err(ConfigurationError::AlreadyMember {
                    subtype: name,
                    root: existing.root_path,
                });
            }
            if let Some(previous) = hierarchy.subtypes.get_mut(existing.alias.as_str()) {
                previous.retain(|candidate| candidate.key != key);
            }
        }

        if let Some(record) = record {
            let own = tables.encodings.get(&record.ty().id());
            let inherited = tables.encodings.get(&root_id);
            let list = record.attrs().list
                || own.is_some_and(|e| e.list)
                || inherited.is_some_and(|e| e.list);
            if hierarchy.position() == Position::Inside && !list {
                let discriminator = hierarchy.discriminator();
                if let Some(field) = wire_names(record, own, inherited)
                    .into_iter()
                    .find(|wire| wire == discriminator)
                {
                    return Err(ConfigurationError::FieldCollision {
                        subtype: name,
                        field: field.into_owned(),
                        discriminator: discriminator.to_owned(),
                    });
                }
            }
        }

        match hierarchy.subtypes.get_mut(alias) {
            Some(candidates) if candidates.is_empty() => candidates.push(subtype),
            Some(candidates) if replace => {
                for replaced in candidates.drain(..) {
                    tables.members.remove(&replaced.key);
                }
                log::debug!("`{name}` replaces alias `{alias}` of `{}`", root.type_path());
                candidates.push(subtype);
            }
            Some(candidates) if subtype.shared => {
                log::debug!(
                    "template `{name}` shares alias `{alias}` of `{}`",
                    root.type_path()
                );
                candidates.push(subtype);
            }
            Some(candidates) => {
                return Err(ConfigurationError::AliasCollision {
                    root: root.type_path(),
                    alias: alias.to_owned(),
                    existing: candidates.first().map_or(name, |candidate| candidate.name),
                });
            }
            None => {
                hierarchy.subtypes.insert(alias.to_owned(), vec![subtype]);
            }
        }

        tables.members.insert(
            key,
            Membership {
                root: root_id,
                root_path: root.type_path(),
                alias: alias.to_owned(),
            },
        );
        if let Some(record) = record {
            tables.records.insert(record.ty().id(), record);
        }
        log::debug!("registered `{name}` as `{alias}` under `{}`", root.type_path());
        Ok(())
    }

    /// Installs the hook consulted for unknown qualified discriminators.
    pub fn set_module_loader(&self, loader: impl ModuleLoader + 'static) {
        self.write().loader = Some(Arc::new(loader));
    }

    /// Discriminator name and position of the declared root `root`.
    pub(crate) fn hierarchy_config(
        &self,
        root: &'static TypeInfo,
    ) -> Result<(String, Position), ConfigurationError> {
        let tables = self.read();
        let hierarchy = tables
            .hierarchies
            .get(&root.type_id())
            .ok_or(ConfigurationError::UndeclaredHierarchy(root.type_path()))?;
        Ok((hierarchy.discriminator().to_owned(), hierarchy.position()))
    }

    /// The hierarchy settings and alias of a member.
    pub(crate) fn member_tag(&self, key: SubtypeKey) -> Option<Tag> {
        let tables = self.read();
        let membership = tables.members.get(&key)?;
        tables.tag(membership)
    }

    /// Whether `alias` names any member of `root`, without loading.
    pub(crate) fn is_known_alias(&self, root: TypeId, alias: &str) -> bool {
        self.read()
            .hierarchies
            .get(&root)
            .is_some_and(|hierarchy| hierarchy.subtypes.get(alias).is_some_and(|c| !c.is_empty()))
    }

    fn candidates(&self, root: TypeId, alias: &str) -> Vec<Subtype> {
        self.read()
            .hierarchies
            .get(&root)
            .map(|hierarchy| hierarchy.candidates(alias))
            .unwrap_or_default()
    }

    /// The members registered under `alias`, consulting the module loader
    /// once for qualified aliases.
    pub(crate) fn subtypes(&self, root: &'static TypeInfo, alias: &str) -> Result<Vec<Subtype>, Error> {
        let root_id = root.type_id();
        let found = self.candidates(root_id, alias);
        if !found.is_empty() {
            return Ok(found);
        }

        if is_qualified(alias) {
            let loader = self.read().loader.clone();
            if let Some(loader) = loader {
                if let Err(err) = loader.load(self, alias) {
                    log::trace!("module loader failed for `{alias}`: {err}");
                }
                let found = self.candidates(root_id, alias);
                if !found.is_empty() {
                    return Ok(found);
                }
            }
        }

        Err(DeserializationError::UnknownDiscriminator {
            alias: alias.to_owned(),
            root: root.type_path(),
        }
        .into())
    }

    // -------------------------------------------------------------------------
    // Entry points

    /// Serializes `value` to plain data.
    ///
    /// With `as_type` unset the value's runtime type drives the encoding.
    /// Values marked unserializable, or containing such values, are
    /// rejected before anything is encoded.
    pub fn serialize(&self, value: &dyn Reflect, as_type: Option<&TypeRef>) -> Result<Value, Error> {
        let driver = SerializeDriver::new(self);
        driver.check_serializable(value)?;
        driver.serialize(value, as_type)
    }

    /// Deserializes `data` against `as_type`.
    ///
    /// The returned box holds a value of exactly the requested type (a
    /// `Box<dyn Root>` for hierarchy roots, a `serde_json::Value` for
    /// [`TypeRef::Any`]); see [`deserialize_as`](Self::deserialize_as) for
    /// the typed variant.
    pub fn deserialize(&self, data: &Value, as_type: &TypeRef) -> Result<Box<dyn Reflect>, Error> {
        DeserializeDriver::new(self).deserialize(data, as_type)
    }

    /// Deserializes `data` into a `T`.
    pub fn deserialize_as<T: Typed + FromReflect>(&self, data: &Value) -> Result<T, Error> {
        let value = self.deserialize(data, &TypeRef::of::<T>())?;
        Ok(T::take_from(value)?)
    }
}

// -----------------------------------------------------------------------------
// Helpers

fn build_serde<T>(_: &CodecParams<'_>) -> Result<Box<dyn Codec>, ConfigurationError>
where
    T: Reflect + Serialize + DeserializeOwned,
{
    Ok(Box::new(SerdeCodec::of::<T>()))
}

fn type_subtype<R: Typed, S: Typed + FromReflect>(upcast: fn(S) -> R) -> Subtype {
    let info = S::type_info();
    let upcast: Upcast = Arc::new(move |value: Box<dyn Reflect>| {
        let value = S::take_from(value)?;
        Ok(Box::new(upcast(value)) as Box<dyn Reflect>)
    });
    Subtype {
        key: SubtypeKey::Type(info.type_id()),
        name: info.type_path(),
        ty: TypeRef::of::<S>(),
        upcast,
        shared: false,
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;
    use alloc::sync::Arc;
    use alloc::vec;
    use alloc::vec::Vec;

    use serde_json::json;

    use super::TypeRegistry;
    use crate::codec::CodecTemplate;
    use crate::derive::Record;
    use crate::info::TypeRef;
    use crate::registry::HierarchyConfig;
    use crate::{ConfigurationError, DeserializationError, Error, Reflect, impl_hierarchy_root};

    pub trait Node: Reflect {}

    impl core::fmt::Debug for dyn Node {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            let this: &dyn Reflect = self;
            core::fmt::Debug::fmt(this, f)
        }
    }

    impl_hierarchy_root!(Node);

    #[derive(Record)]
    #[record(alias = "leaf")]
    struct Leaf {
        value: i64,
    }

    #[derive(Record)]
    #[record(alias = "leaf")]
    struct OtherLeaf {
        value: i64,
    }

    #[derive(Record)]
    struct Forward {
        #[record(ty_name = "Zeta")]
        z: Option<Box<dyn Reflect>>,
        #[record(ty_name = "Alpha")]
        a: Option<Box<dyn Reflect>>,
    }

    impl Node for Leaf {}
    impl Node for OtherLeaf {}

    fn leaf(leaf: Leaf) -> Box<dyn Node> {
        Box::new(leaf)
    }

    fn other_leaf(leaf: OtherLeaf) -> Box<dyn Node> {
        Box::new(leaf)
    }

    fn nodes() -> TypeRegistry {
        let registry = TypeRegistry::new();
        registry
            .declare_hierarchy_root::<Box<dyn Node>>(HierarchyConfig::default())
            .unwrap();
        registry
    }

    #[test]
    fn fields_are_cached() {
        let registry = TypeRegistry::new();
        let first = registry.get_fields::<Leaf>().unwrap();
        let second = registry.get_fields::<Leaf>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first[0].name(), "value");

        assert!(matches!(
            registry.get_fields::<i64>(),
            Err(ConfigurationError::NotARecord(_))
        ));
    }

    #[test]
    fn names_resolve_or_report() {
        let registry = TypeRegistry::new();
        registry.register_type::<Forward>().unwrap();

        match registry.validate() {
            Err(ConfigurationError::UnresolvedNames(names)) => {
                assert_eq!(names, vec![String::from("Alpha"), String::from("Zeta")]);
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(registry.get_fields::<Forward>().is_err());

        let unchecked = registry.get_fields_unchecked::<Forward>().unwrap();
        assert_eq!(unchecked[0].ty(), &TypeRef::named("Zeta"));

        registry.declare_name("Alpha", TypeRef::of::<i64>()).unwrap();
        registry.declare_name("Zeta", TypeRef::of::<String>()).unwrap();
        registry.validate().unwrap();
        assert_eq!(registry.get_fields::<Forward>().unwrap()[1].ty(), &TypeRef::of::<i64>());

        registry.declare_name("Alpha", TypeRef::of::<i64>()).unwrap();
        assert!(matches!(
            registry.declare_name("Alpha", TypeRef::of::<u8>()),
            Err(ConfigurationError::DuplicateName(_))
        ));

        assert_eq!(registry.resolve_name("Forward").unwrap(), TypeRef::of::<Forward>());
        assert!(registry.resolve_name("Missing").is_err());
    }

    #[test]
    fn hierarchy_declarations() {
        let registry = nodes();
        assert!(matches!(
            registry.declare_hierarchy_root::<i64>(HierarchyConfig::default()),
            Err(ConfigurationError::NotARoot(_))
        ));
        assert!(matches!(
            registry.declare_hierarchy_root::<Box<dyn Node>>(HierarchyConfig::default()),
            Err(ConfigurationError::DuplicateHierarchy(_))
        ));

        let empty = TypeRegistry::new();
        assert!(matches!(
            empty.register_subtype(leaf),
            Err(ConfigurationError::UndeclaredHierarchy(_))
        ));
    }

    #[test]
    fn aliases_are_unique() {
        let registry = nodes();
        registry.register_subtype(leaf).unwrap();
        registry.register_subtype(leaf).unwrap();

        assert!(matches!(
            registry.register_subtype(other_leaf),
            Err(ConfigurationError::AliasCollision { .. })
        ));
        assert!(matches!(
            registry.register_subtype_as("leaf2", leaf),
            Err(ConfigurationError::AlreadyMember { .. })
        ));

        registry.register_subtype_override("leaf", other_leaf).unwrap();
        let node = registry
            .deserialize_as::<Box<dyn Node>>(&json!({"type": "leaf", "value": 1}))
            .unwrap();
        let node: &dyn Reflect = &*node;
        assert!(node.is::<OtherLeaf>());

        // The replaced member is free to join again under another alias.
        registry.register_subtype_as("old", leaf).unwrap();
        let err = registry
            .deserialize_as::<Box<dyn Node>>(&json!({"type": "leaf2"}))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Deserialization(DeserializationError::UnknownDiscriminator { .. })
        ));
    }

    #[test]
    fn containers_take_no_codec() {
        let registry = TypeRegistry::new();
        let template = CodecTemplate::stateless("Nothing", |_| {
            Err(ConfigurationError::UnrealizedCodec("Nothing"))
        });
        registry.register_codec::<Vec<i64>>(&template).unwrap();
        assert!(!registry.has_codec::<Vec<i64>>());

        assert!(registry.register_codec::<Leaf>(&template).is_err());
        assert!(!registry.has_codec::<Leaf>());
    }
}
