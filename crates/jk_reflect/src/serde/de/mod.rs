// -----------------------------------------------------------------------------
// Modules

mod driver;
mod record;

// -----------------------------------------------------------------------------
// Exports

pub use driver::DeserializeDriver;

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::collections::BTreeMap;
    use alloc::string::String;
    use alloc::vec::Vec;
    use std::collections::HashMap;

    use serde_json::json;

    use crate::derive::Record;
    use crate::info::TypeRef;
    use crate::registry::TypeRegistry;
    use crate::{ConfigurationError, DeserializationError, Error, Reflect};

    #[derive(Record, Debug, PartialEq)]
    struct Point {
        x: i64,
    }

    #[derive(Record, Debug, PartialEq)]
    struct Window {
        title: String,
        #[record(default = 640)]
        width: u32,
        #[record(default)]
        hidden: bool,
    }

    #[derive(Record, Debug, PartialEq)]
    #[record(list)]
    struct Span {
        start: u32,
        #[record(default)]
        end: u32,
    }

    #[derive(Record, Debug)]
    struct Link {
        value: i64,
        #[record(ty_name = "Link")]
        next: Option<Box<dyn Reflect>>,
    }

    #[test]
    fn missing_required_field() {
        let registry = TypeRegistry::new();
        let err = registry.deserialize_as::<Point>(&json!({})).unwrap_err();
        assert!(matches!(
            err,
            Error::Deserialization(DeserializationError::MissingField { ref field, .. }) if field == "x"
        ));
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let registry = TypeRegistry::new();
        let window = registry
            .deserialize_as::<Window>(&json!({"title": "main", "extra": 1}))
            .unwrap();
        assert_eq!(
            window,
            Window {
                title: "main".into(),
                width: 640,
                hidden: false,
            }
        );

        let window = registry
            .deserialize_as::<Window>(&json!({"title": "main", "width": null}))
            .unwrap();
        assert_eq!(window.width, 640);
    }

    #[test]
    fn positional_records() {
        let registry = TypeRegistry::new();
        assert_eq!(
            registry.deserialize_as::<Span>(&json!([3])).unwrap(),
            Span { start: 3, end: 0 }
        );

        let err = registry.deserialize_as::<Span>(&json!([])).unwrap_err();
        assert!(matches!(
            err,
            Error::Deserialization(DeserializationError::TooFewElements { expected: 1, found: 0, .. })
        ));
    }

    #[test]
    fn scalars_are_strict() {
        let registry = TypeRegistry::new();
        assert!(registry.deserialize_as::<u8>(&json!("1")).is_err());
        assert!(registry.deserialize_as::<u8>(&json!(300)).is_err());
        assert!(registry.deserialize_as::<String>(&json!(1)).is_err());
        assert!(registry.deserialize_as::<i64>(&json!(1.5)).is_err());
        assert_eq!(registry.deserialize_as::<Option<u8>>(&json!(null)).unwrap(), None);
    }

    #[test]
    fn unions_take_the_first_match() {
        let registry = TypeRegistry::new();
        let union = TypeRef::union([TypeRef::of::<i64>(), TypeRef::of::<String>()]);

        let value = registry.deserialize(&json!("hello"), &union).unwrap();
        assert_eq!(value.take::<String>().unwrap(), "hello");

        let value = registry.deserialize(&json!(5), &union).unwrap();
        assert_eq!(value.take::<i64>().unwrap(), 5);

        let err = registry.deserialize(&json!(true), &union).unwrap_err();
        assert!(matches!(err, Error::Deserialization(DeserializationError::NoUnionMatch)));
    }

    #[test]
    fn containers() {
        let registry = TypeRegistry::new();

        let map = registry
            .deserialize_as::<HashMap<u32, String>>(&json!({"1": "a", "2": "b"}))
            .unwrap();
        assert_eq!(map[&2], "b");

        let err = registry
            .deserialize_as::<HashMap<u32, String>>(&json!({"x": "a"}))
            .unwrap_err();
        assert!(matches!(err, Error::Deserialization(DeserializationError::InvalidKey { .. })));

        let err = registry
            .deserialize_as::<HashMap<bool, String>>(&json!({}))
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(ConfigurationError::UnsupportedMapKey(_))));

        assert!(registry.deserialize_as::<(i64, String)>(&json!([1])).is_err());
        assert_eq!(
            registry.deserialize_as::<(i64, String)>(&json!([1, "a"])).unwrap(),
            (1, "a".into())
        );

        let mixed = TypeRef::list_of(TypeRef::union([TypeRef::of::<i64>(), TypeRef::of::<String>()]));
        let items = registry
            .deserialize(&json!([1, "a"]), &mixed)
            .unwrap()
            .take::<Vec<Box<dyn Reflect>>>()
            .unwrap();
        assert!(items[0].is::<i64>());
        assert!(items[1].is::<String>());

        let table = registry
            .deserialize(&json!({"k": [1]}), &TypeRef::map_of(TypeRef::Any))
            .unwrap()
            .take::<BTreeMap<String, Box<dyn Reflect>>>()
            .unwrap();
        assert_eq!(table["k"].downcast_ref::<serde_json::Value>(), Some(&json!([1])));
    }

    #[test]
    fn named_references_resolve_through_the_registry() {
        let registry = TypeRegistry::new();
        let data = json!({"value": 1, "next": {"value": 2}});

        let err = registry.deserialize_as::<Link>(&data).unwrap_err();
        assert!(matches!(err, Error::Configuration(ConfigurationError::UnresolvedNames(_))));

        registry.register_type::<Link>().unwrap();
        let link = registry.deserialize_as::<Link>(&data).unwrap();
        assert_eq!(link.value, 1);
        let next = link.next.as_deref().and_then(|next| next.downcast_ref::<Link>()).unwrap();
        assert_eq!(next.value, 2);
        assert!(next.next.is_none());

        assert_eq!(registry.serialize(&link, None).unwrap(), data);
    }
}
