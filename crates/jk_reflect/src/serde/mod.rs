//! Conversion between reflected values and plain data.
//!
//! # Overview
//!
//! ## Serialization
//!
//! [`SerializeDriver`] turns a [`Reflect`](crate::Reflect) value into a
//! [`serde_json::Value`]. Dispatch follows a fixed precedence:
//!
//! 1. A realized codec held as a value writes its own parameters, plus
//!    the discriminator when the codec is a hierarchy member.
//! 2. A union target tries its alternatives in order; the first success wins.
//! 3. A codec target, or a codec registered for the runtime type, encodes
//!    the value. Unrealized templates cannot encode anything.
//! 4. Everything else is encoded structurally: scalars directly, sequences
//!    as arrays, maps and records as objects (or arrays, for list-encoded
//!    records).
//!
//! `None` record fields are left out of the output.
//!
//! ## Deserialization
//!
//! [`DeserializeDriver`] decodes plain data against a
//! [`TypeRef`](crate::info::TypeRef). Scalars are strict: a number never
//! decodes as a string and the other way around, so union alternatives
//! fail cleanly and the next one is tried. Hierarchy roots read the
//! discriminator and dispatch to the registered member; records are built
//! by their constructor from the decoded fields.
//!
//! Both drivers borrow a [`TypeRegistry`](crate::registry::TypeRegistry)
//! and are handed to codecs, so a codec can recurse into nested values.

// -----------------------------------------------------------------------------
// Modules

mod de;
mod ser;

// -----------------------------------------------------------------------------
// Exports

pub use de::DeserializeDriver;
pub use ser::SerializeDriver;

// -----------------------------------------------------------------------------
// Helpers

/// Name of a plain-data kind, for mismatch messages.
pub(crate) fn kind_of(data: &serde_json::Value) -> &'static str {
    use serde_json::Value;

    match data {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(number) if number.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;
    use alloc::sync::Arc;
    use std::sync::LazyLock;

    use serde_json::{Value, json};

    use super::{DeserializeDriver, SerializeDriver};
    use crate::codec::{Codec, CodecArgs, CodecParams, CodecTemplate, RealizedCodec};
    use crate::derive::Record;
    use crate::info::{RenameRule, TypeRef};
    use crate::registry::{HierarchyConfig, Position, TypeRegistry};
    use crate::{
        ConfigurationError, DeserializationError, Error, Reflect, SerializationError,
        impl_hierarchy_root,
    };

    // -------------------------------------------------------------------------
    // Hierarchies

    pub trait Shape: Reflect {}

    impl core::fmt::Debug for dyn Shape {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            let this: &dyn Reflect = self;
            core::fmt::Debug::fmt(this, f)
        }
    }

    impl_hierarchy_root!(Shape);

    #[derive(Record, Debug, PartialEq)]
    #[record(alias = "a")]
    struct A {
        x: i64,
    }

    #[derive(Record, Debug, PartialEq)]
    #[record(alias = "b")]
    struct B {
        y: String,
    }

    impl Shape for A {}
    impl Shape for B {}

    fn shape_a(a: A) -> Box<dyn Shape> {
        Box::new(a)
    }

    fn shape_b(b: B) -> Box<dyn Shape> {
        Box::new(b)
    }

    fn shapes() -> TypeRegistry {
        let registry = TypeRegistry::new();
        registry
            .declare_hierarchy_root::<Box<dyn Shape>>(HierarchyConfig::default())
            .unwrap();
        registry.register_subtype(shape_a).unwrap();
        registry.register_subtype(shape_b).unwrap();
        registry
    }

    #[test]
    fn members_carry_the_discriminator() {
        let registry = shapes();

        let shape: Box<dyn Shape> = Box::new(A { x: 1 });
        let data = registry.serialize(&shape, None).unwrap();
        assert_eq!(data, json!({"type": "a", "x": 1}));

        let as_root = TypeRef::of::<Box<dyn Shape>>();
        assert_eq!(registry.serialize(&A { x: 1 }, Some(&as_root)).unwrap(), data);

        let shape = registry.deserialize_as::<Box<dyn Shape>>(&data).unwrap();
        let shape: &dyn Reflect = &*shape;
        assert_eq!(shape.downcast_ref::<A>(), Some(&A { x: 1 }));

        let shape = registry
            .deserialize_as::<Box<dyn Shape>>(&json!({"type": "b", "y": "z"}))
            .unwrap();
        let shape: &dyn Reflect = &*shape;
        assert!(shape.is::<B>());
    }

    #[test]
    fn discriminator_errors() {
        let registry = shapes();

        let err = registry
            .deserialize_as::<Box<dyn Shape>>(&json!({"type": "c"}))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Deserialization(DeserializationError::UnknownDiscriminator { ref alias, .. }) if alias == "c"
        ));

        let err = registry
            .deserialize_as::<Box<dyn Shape>>(&json!({"x": 1}))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Deserialization(DeserializationError::MissingDiscriminator { .. })
        ));

        // A member decoded directly rejects another member's alias.
        let err = registry
            .deserialize_as::<A>(&json!({"type": "b", "x": 1}))
            .unwrap_err();
        assert!(err.is_mismatch());
        assert_eq!(
            registry.deserialize_as::<A>(&json!({"type": "a", "x": 1})).unwrap(),
            A { x: 1 }
        );

        let undeclared = TypeRegistry::new();
        let err = undeclared
            .deserialize_as::<Box<dyn Shape>>(&json!({"type": "a"}))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Configuration(ConfigurationError::UndeclaredHierarchy(_))
        ));
    }

    pub trait Engine: Reflect {}

    impl_hierarchy_root!(Engine);

    #[derive(Record, Debug, PartialEq)]
    #[record(alias = "electric")]
    struct Electric {
        volts: u32,
    }

    impl Engine for Electric {}

    fn electric(engine: Electric) -> Box<dyn Engine> {
        Box::new(engine)
    }

    #[derive(Record)]
    struct Car {
        kind: String,
        engine: Box<dyn Engine>,
    }

    #[test]
    fn values_declared_as_options() {
        let registry = shapes();
        let as_option = TypeRef::of::<Option<A>>();
        assert_eq!(registry.serialize(&A { x: 2 }, Some(&as_option)).unwrap(), json!({"type": "a", "x": 2}));

        let as_root = TypeRef::of::<Option<Box<dyn Shape>>>();
        assert_eq!(registry.serialize(&A { x: 3 }, Some(&as_root)).unwrap(), json!({"type": "a", "x": 3}));
        assert_eq!(registry.serialize(&None::<A>, Some(&as_option)).unwrap(), Value::Null);
    }

    #[test]
    fn outside_discriminator_comes_from_the_parent() {
        let registry = TypeRegistry::new();
        registry
            .declare_hierarchy_root::<Box<dyn Engine>>(HierarchyConfig::new("kind").position(Position::Outside))
            .unwrap();
        registry.register_subtype(electric).unwrap();

        let car = Car {
            kind: "electric".into(),
            engine: Box::new(Electric { volts: 400 }),
        };
        let data = registry.serialize(&car, None).unwrap();
        assert_eq!(data, json!({"kind": "electric", "engine": {"volts": 400}}));

        let car = registry.deserialize_as::<Car>(&data).unwrap();
        let engine: &dyn Reflect = &*car.engine;
        assert_eq!(engine.downcast_ref::<Electric>(), Some(&Electric { volts: 400 }));
    }

    pub trait Token: Reflect {}

    impl core::fmt::Debug for dyn Token {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            let this: &dyn Reflect = self;
            core::fmt::Debug::fmt(this, f)
        }
    }

    impl_hierarchy_root!(Token);

    #[derive(Record, Debug, PartialEq)]
    #[record(alias = "word")]
    struct Word {
        text: String,
        #[record(default)]
        weight: u32,
    }

    impl Token for Word {}

    fn word(word: Word) -> Box<dyn Token> {
        Box::new(word)
    }

    #[test]
    fn list_encoding_is_inherited_from_the_root() {
        let registry = TypeRegistry::new();
        registry
            .declare_hierarchy_root::<Box<dyn Token>>(HierarchyConfig::default())
            .unwrap();
        registry.declare_list_encoding::<Box<dyn Token>>();
        registry.register_subtype(word).unwrap();

        let token: Box<dyn Token> = Box::new(Word {
            text: "hi".into(),
            weight: 2,
        });
        let data = registry.serialize(&token, None).unwrap();
        assert_eq!(data, json!(["word", "hi", 2]));

        let token = registry
            .deserialize_as::<Box<dyn Token>>(&json!(["word", "yo"]))
            .unwrap();
        let token: &dyn Reflect = &*token;
        assert_eq!(
            token.downcast_ref::<Word>(),
            Some(&Word {
                text: "yo".into(),
                weight: 0,
            })
        );

        let err = registry
            .deserialize_as::<Box<dyn Token>>(&json!([]))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Deserialization(DeserializationError::MissingDiscriminator { .. })
        ));
    }

    #[test]
    fn discriminator_failures_escape_unions() {
        let registry = shapes();
        registry
            .declare_hierarchy_root::<Box<dyn Token>>(HierarchyConfig::default())
            .unwrap();
        registry.register_subtype(word).unwrap();
        let union = TypeRef::union([
            TypeRef::of::<Box<dyn Shape>>(),
            TypeRef::of::<Box<dyn Token>>(),
            TypeRef::of::<String>(),
        ]);

        let err = registry
            .deserialize(&json!({"type": "zzz"}), &union)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Deserialization(DeserializationError::UnknownDiscriminator { ref alias, .. }) if alias == "zzz"
        ));

        // Data that is not an object at all is a plain mismatch.
        let value = registry.deserialize(&json!("plain"), &union).unwrap();
        assert_eq!(value.take::<String>().unwrap(), "plain");
    }

    pub trait Animal: Reflect {}

    impl_hierarchy_root!(Animal);

    #[derive(Record, Debug, PartialEq)]
    #[record(alias = "dog")]
    struct Dog {
        max_speed: u32,
        top_weight: u32,
        tail_length: u32,
    }

    impl Animal for Dog {}

    fn dog(dog: Dog) -> Box<dyn Animal> {
        Box::new(dog)
    }

    #[test]
    fn renames_overlay_the_root() {
        let registry = TypeRegistry::new();
        registry
            .declare_hierarchy_root::<Box<dyn Animal>>(HierarchyConfig::default())
            .unwrap();
        registry.declare_rename_all::<Box<dyn Animal>>(RenameRule::CamelCase);
        registry.declare_field_rename::<Box<dyn Animal>>(&[("max_speed", "speed"), ("top_weight", "mass")]);
        registry.declare_field_rename::<Dog>(&[("top_weight", "weight")]);
        registry.register_subtype(dog).unwrap();

        let dog = Dog {
            max_speed: 3,
            top_weight: 4,
            tail_length: 5,
        };
        let data = registry.serialize(&dog, None).unwrap();
        assert_eq!(
            data,
            json!({"type": "dog", "speed": 3, "weight": 4, "tailLength": 5})
        );
        assert_eq!(registry.deserialize_as::<Dog>(&data).unwrap(), dog);
    }

    #[derive(Record)]
    struct Clash {
        r#type: String,
    }

    pub trait Marker: Reflect {}

    impl_hierarchy_root!(Marker);

    impl Marker for Clash {}

    fn clash(clash: Clash) -> Box<dyn Marker> {
        Box::new(clash)
    }

    #[test]
    fn field_named_like_the_discriminator() {
        let registry = TypeRegistry::new();
        registry
            .declare_hierarchy_root::<Box<dyn Marker>>(HierarchyConfig::default())
            .unwrap();
        let err = registry.register_subtype(clash).unwrap_err();
        assert!(matches!(err, ConfigurationError::FieldCollision { .. }));
    }

    // -------------------------------------------------------------------------
    // Codecs

    struct Scaled(i64);

    impl Codec for Scaled {
        fn serialize(&self, value: &dyn Reflect, _: &SerializeDriver<'_>) -> Result<Value, Error> {
            let value = value
                .downcast_ref::<i64>()
                .ok_or(SerializationError::TypeMismatch("i64", value.reflect_type_path()))?;
            Ok(json!(value * self.0))
        }

        fn deserialize(&self, data: &Value, _: &DeserializeDriver<'_>) -> Result<Box<dyn Reflect>, Error> {
            let raw = data
                .as_i64()
                .ok_or_else(|| DeserializationError::mismatch("integer", super::kind_of(data)))?;
            Ok(Box::new(raw / self.0))
        }
    }

    fn build_scaled(params: &CodecParams<'_>) -> Result<Box<dyn Codec>, ConfigurationError> {
        Ok(Box::new(Scaled(params.i64("factor")?)))
    }

    fn build_offset(params: &CodecParams<'_>) -> Result<Box<dyn Codec>, ConfigurationError> {
        Ok(Box::new(Scaled(params.i64("amount")?)))
    }

    static SCALED: LazyLock<Arc<CodecTemplate>> =
        LazyLock::new(|| CodecTemplate::new("Scaled", &["factor"], build_scaled));

    static OFFSET: LazyLock<Arc<CodecTemplate>> =
        LazyLock::new(|| CodecTemplate::new("Offset", &["amount"], build_offset));

    static BY_TEN: LazyLock<Arc<RealizedCodec>> =
        LazyLock::new(|| SCALED.realize(CodecArgs::new().arg(10_i64)).unwrap());

    #[derive(Record, Debug, PartialEq)]
    struct Reading {
        #[record(ty = TypeRef::codec(&BY_TEN))]
        value: i64,
        raw: i64,
    }

    #[derive(Record, Debug)]
    struct Pipeline {
        #[record(ty = TypeRef::template(&SCALED))]
        scale: Arc<RealizedCodec>,
    }

    #[test]
    fn realized_codecs_as_field_types() {
        let registry = TypeRegistry::new();
        let reading = Reading { value: 3, raw: 3 };
        let data = registry.serialize(&reading, None).unwrap();
        assert_eq!(data, json!({"value": 30, "raw": 3}));
        assert_eq!(registry.deserialize_as::<Reading>(&data).unwrap(), reading);

        let err = registry
            .deserialize_as::<Reading>(&json!({"value": "x", "raw": 1}))
            .unwrap_err();
        assert!(err.is_mismatch());
    }

    #[test]
    fn codecs_as_values() {
        let registry = TypeRegistry::new();
        let pipeline = Pipeline {
            scale: Arc::clone(&BY_TEN),
        };
        let data = registry.serialize(&pipeline, None).unwrap();
        assert_eq!(data, json!({"scale": {"factor": 10}}));

        let decoded = registry.deserialize_as::<Pipeline>(&data).unwrap();
        assert!(Arc::ptr_eq(&decoded.scale, &BY_TEN));

        let err = registry
            .deserialize_as::<Pipeline>(&json!({"scale": {}}))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Deserialization(DeserializationError::MissingField { .. })
        ));

        let err = registry.serialize(&1_i64, Some(&TypeRef::template(&SCALED))).unwrap_err();
        assert!(matches!(
            err,
            Error::Serialization(SerializationError::UnrealizedCodec("Scaled"))
        ));
    }

    /// Encodes a value as the type it was realized with.
    struct Checked(TypeRef);

    impl Codec for Checked {
        fn serialize(&self, value: &dyn Reflect, driver: &SerializeDriver<'_>) -> Result<Value, Error> {
            driver.serialize(value, Some(&self.0))
        }

        fn deserialize(&self, data: &Value, driver: &DeserializeDriver<'_>) -> Result<Box<dyn Reflect>, Error> {
            driver.deserialize(data, &self.0)
        }
    }

    fn build_checked(params: &CodecParams<'_>) -> Result<Box<dyn Codec>, ConfigurationError> {
        Ok(Box::new(Checked(params.type_ref("of")?)))
    }

    static CHECKED: LazyLock<Arc<CodecTemplate>> =
        LazyLock::new(|| CodecTemplate::new("Checked", &["of"], build_checked));

    #[derive(Record, Debug)]
    struct Holder {
        #[record(ty = TypeRef::template(&CHECKED))]
        codec: Arc<RealizedCodec>,
    }

    #[test]
    fn type_parameters_read_back_as_the_same_codec() {
        let registry = TypeRegistry::new();
        let of_i64 = CHECKED.realize(CodecArgs::new().arg(TypeRef::of::<i64>())).unwrap();
        let holder = Holder {
            codec: Arc::clone(&of_i64),
        };
        let data = registry.serialize(&holder, None).unwrap();
        assert_eq!(data, json!({"codec": {"of": {"$type": "i64"}}}));

        let decoded = registry.deserialize_as::<Holder>(&data).unwrap();
        assert!(Arc::ptr_eq(&decoded.codec, &of_i64));
        assert_eq!(decoded.codec.serialize(&5_i64, &SerializeDriver::new(&registry)).unwrap(), json!(5));

        let by_name = CHECKED.realize(CodecArgs::new().arg(TypeRef::named("Celsius"))).unwrap();
        let data = registry
            .serialize(&Holder { codec: Arc::clone(&by_name) }, None)
            .unwrap();
        assert_eq!(data, json!({"codec": {"of": {"$type": "Celsius"}}}));
        let decoded = registry.deserialize_as::<Holder>(&data).unwrap();
        assert!(Arc::ptr_eq(&decoded.codec, &by_name));
    }

    pub trait Transform: Reflect {}

    impl_hierarchy_root!(Transform);

    impl Transform for Arc<RealizedCodec> {}

    fn transform(codec: Arc<RealizedCodec>) -> Box<dyn Transform> {
        Box::new(codec)
    }

    #[test]
    fn codec_members_share_an_alias() {
        let registry = TypeRegistry::new();
        registry
            .declare_hierarchy_root::<Box<dyn Transform>>(HierarchyConfig::default())
            .unwrap();
        registry
            .register_codec_subtype(&SCALED, "scaled", transform)
            .unwrap();
        registry
            .register_codec_subtype(&OFFSET, "scaled", transform)
            .unwrap();

        let transform: Box<dyn Transform> = Box::new(Arc::clone(&BY_TEN));
        let data = registry.serialize(&transform, None).unwrap();
        assert_eq!(data, json!({"type": "scaled", "factor": 10}));

        let decoded = registry.deserialize_as::<Box<dyn Transform>>(&data).unwrap();
        let decoded: &dyn Reflect = &*decoded;
        let codec = decoded.downcast_ref::<Arc<RealizedCodec>>().unwrap();
        assert!(Arc::ptr_eq(codec, &BY_TEN));

        let decoded = registry
            .deserialize_as::<Box<dyn Transform>>(&json!({"type": "scaled", "amount": 2}))
            .unwrap();
        let decoded: &dyn Reflect = &*decoded;
        let codec = decoded.downcast_ref::<Arc<RealizedCodec>>().unwrap();
        assert_eq!(codec.name(), "Offset");
    }

    // -------------------------------------------------------------------------
    // Module loading

    pub trait Plugin: Reflect {}

    impl core::fmt::Debug for dyn Plugin {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            let this: &dyn Reflect = self;
            core::fmt::Debug::fmt(this, f)
        }
    }

    impl_hierarchy_root!(Plugin);

    #[derive(Record, Debug, PartialEq)]
    struct Late {
        n: u32,
    }

    impl Plugin for Late {}

    fn late(late: Late) -> Box<dyn Plugin> {
        Box::new(late)
    }

    #[test]
    fn module_loader_registers_late_members() {
        let registry = TypeRegistry::new();
        registry
            .declare_hierarchy_root::<Box<dyn Plugin>>(HierarchyConfig::default())
            .unwrap();
        registry.set_module_loader(
            |registry: &TypeRegistry,
             qualified: &str|
             -> Result<(), Box<dyn core::error::Error + Send + Sync>> {
                if qualified != "plugins.late" {
                    return Err(alloc::format!("no module for `{qualified}`").into());
                }
                registry.register_subtype_as::<Box<dyn Plugin>, Late>(qualified, late)?;
                Ok(())
            },
        );

        let plugin = registry
            .deserialize_as::<Box<dyn Plugin>>(&json!({"type": "plugins.late", "n": 1}))
            .unwrap();
        let plugin: &dyn Reflect = &*plugin;
        assert_eq!(plugin.downcast_ref::<Late>(), Some(&Late { n: 1 }));

        for alias in ["plugins.missing", "late"] {
            let err = registry
                .deserialize_as::<Box<dyn Plugin>>(&json!({"type": alias}))
                .unwrap_err();
            assert!(matches!(
                err,
                Error::Deserialization(DeserializationError::UnknownDiscriminator { .. })
            ));
        }
    }
}
