// -----------------------------------------------------------------------------
// Modules

mod check;
mod driver;
mod record;

// -----------------------------------------------------------------------------
// Exports

pub use driver::SerializeDriver;

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;
    use std::collections::{BTreeMap, HashMap};

    use serde_json::json;

    use crate::derive::Record;
    use crate::info::TypeRef;
    use crate::registry::TypeRegistry;
    use crate::{ConfigurationError, Error, SerializationError, impl_opaque};

    #[derive(Record, Debug, PartialEq)]
    struct Profile {
        name: String,
        nickname: Option<String>,
        scores: Vec<u32>,
        limits: BTreeMap<String, f64>,
        origin: (i32, i32),
    }

    #[derive(Record)]
    #[record(unserializable)]
    struct Secret {
        token: String,
    }

    #[derive(Record)]
    struct Vault {
        label: String,
        secrets: Vec<Secret>,
    }

    #[derive(Record)]
    #[record(list)]
    struct Row {
        a: Option<i64>,
        b: Option<i64>,
        c: Option<i64>,
    }

    struct Handle;

    impl_opaque!(Handle);

    #[test]
    fn records_encode_in_field_order() {
        let registry = TypeRegistry::new();
        let profile = Profile {
            name: "ada".into(),
            nickname: None,
            scores: vec![3, 1],
            limits: BTreeMap::from([("cpu".into(), 0.5)]),
            origin: (1, -1),
        };

        let data = registry.serialize(&profile, None).unwrap();
        assert_eq!(
            data,
            json!({
                "name": "ada",
                "scores": [3, 1],
                "limits": {"cpu": 0.5},
                "origin": [1, -1],
            })
        );
        assert_eq!(registry.deserialize_as::<Profile>(&data).unwrap(), profile);
    }

    #[test]
    fn unserializable_values_are_refused() {
        let registry = TypeRegistry::new();

        let err = registry
            .serialize(&Secret { token: "t".into() }, None)
            .unwrap_err();
        assert!(matches!(err, Error::Serialization(SerializationError::Unserializable(_))));

        let vault = Vault {
            label: "v".into(),
            secrets: vec![Secret { token: "t".into() }],
        };
        assert!(registry.serialize(&vault, None).is_err());

        let empty = Vault {
            label: "v".into(),
            secrets: Vec::new(),
        };
        assert!(registry.serialize(&empty, None).is_ok());

        registry.declare_unserializable::<Vault>();
        assert!(registry.serialize(&empty, None).is_err());
    }

    #[test]
    fn list_mode_keeps_positions() {
        let registry = TypeRegistry::new();
        let row = Row {
            a: None,
            b: Some(2),
            c: None,
        };
        assert_eq!(registry.serialize(&row, None).unwrap(), json!([null, 2]));

        let all_none = Row {
            a: None,
            b: None,
            c: None,
        };
        assert_eq!(registry.serialize(&all_none, None).unwrap(), json!([]));
    }

    #[test]
    fn declared_types_drive_the_encoding() {
        let registry = TypeRegistry::new();

        let union = TypeRef::union([TypeRef::of::<String>(), TypeRef::of::<i64>()]);
        assert_eq!(registry.serialize(&7_u8, Some(&union)).unwrap(), json!(7));
        assert_eq!(registry.serialize(&"x".to_owned(), Some(&union)).unwrap(), json!("x"));

        let err = registry.serialize(&true, Some(&union)).unwrap_err();
        assert!(matches!(err, Error::Serialization(SerializationError::NoUnionMatch(_))));

        assert_eq!(
            registry.serialize(&3_u8, Some(&TypeRef::of::<f64>())).unwrap(),
            json!(3)
        );
        assert!(registry.serialize(&1.5_f64, Some(&TypeRef::of::<i64>())).is_err());
        assert_eq!(
            registry.serialize(&Some(4_i64), Some(&TypeRef::of::<i64>())).unwrap(),
            json!(4)
        );
    }

    #[test]
    fn map_keys_and_floats() {
        let registry = TypeRegistry::new();

        let map = HashMap::from([(1_u32, "a".to_owned())]);
        assert_eq!(registry.serialize(&map, None).unwrap(), json!({"1": "a"}));

        let map = HashMap::from([(true, 1_u8)]);
        let err = registry.serialize(&map, None).unwrap_err();
        assert!(matches!(err, Error::Serialization(SerializationError::UnsupportedMapKey(_))));

        let err = registry.serialize(&f64::NAN, None).unwrap_err();
        assert!(matches!(err, Error::Serialization(SerializationError::NonFiniteFloat(_))));
    }

    #[test]
    fn opaque_types_need_a_codec() {
        let registry = TypeRegistry::new();
        let err = registry.serialize(&Handle, None).unwrap_err();
        assert!(matches!(err, Error::Configuration(ConfigurationError::NoCodec(_))));
        assert!(!err.is_mismatch());
    }
}
