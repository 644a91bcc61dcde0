//! JSON text, stream and file helpers over the global registry.
//!
//! ```
//! use jk_reflect::derive::Record;
//! use jk_reflect::json;
//!
//! #[derive(Record, Debug, PartialEq)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! let text = json::dumps(&Point { x: 1, y: 2 }, None).unwrap();
//! assert_eq!(text, r#"{"x":1,"y":2}"#);
//! assert_eq!(json::loads::<Point>(&text).unwrap(), Point { x: 1, y: 2 });
//! ```

use alloc::string::String;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde_json::Value;

use crate::info::{TypeRef, Typed};
use crate::registry::TypeRegistry;
use crate::{Error, FromReflect, Reflect};

// -----------------------------------------------------------------------------
// Text

/// Parses `text` and deserializes it into a `T`.
pub fn loads<T: Typed + FromReflect>(text: &str) -> Result<T, Error> {
    let data: Value = serde_json::from_str(text)?;
    TypeRegistry::global().deserialize_as::<T>(&data)
}

/// Serializes `value` into compact JSON text, against `as_type` when
/// given and by its runtime type otherwise.
pub fn dumps(value: &dyn Reflect, as_type: Option<&TypeRef>) -> Result<String, Error> {
    let data = TypeRegistry::global().serialize(value, as_type)?;
    Ok(serde_json::to_string(&data)?)
}

// -----------------------------------------------------------------------------
// Streams

/// Reads one JSON document from `reader` and deserializes it into a `T`.
pub fn load<T: Typed + FromReflect, R: Read>(reader: R) -> Result<T, Error> {
    let data: Value = serde_json::from_reader(reader)?;
    TypeRegistry::global().deserialize_as::<T>(&data)
}

/// Serializes `value` and writes it to `writer` as JSON text.
///
/// Nothing is written if serialization fails.
pub fn dump<W: Write>(mut writer: W, value: &dyn Reflect, as_type: Option<&TypeRef>) -> Result<(), Error> {
    let data = TypeRegistry::global().serialize(value, as_type)?;
    serde_json::to_writer(&mut writer, &data)?;
    writer.flush()?;
    Ok(())
}

// -----------------------------------------------------------------------------
// Files

/// Opens `path` and [`load`]s a `T` from it.
pub fn read<T: Typed + FromReflect>(path: impl AsRef<Path>) -> Result<T, Error> {
    let file = File::open(path)?;
    load(BufReader::new(file))
}

/// Creates (or truncates) `path` and [`dump`]s `value` into it.
///
/// The file is created before serialization, so a failure leaves it empty.
pub fn write(path: impl AsRef<Path>, value: &dyn Reflect, as_type: Option<&TypeRef>) -> Result<(), Error> {
    dump(BufWriter::new(File::create(path)?), value, as_type)
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    use alloc::boxed::Box;

    use crate::derive::Record;
    use crate::info::TypeRef;
    use crate::registry::{HierarchyConfig, TypeRegistry};
    use crate::{Error, Reflect, impl_hierarchy_root, json};

    #[derive(Record, Debug, PartialEq)]
    struct Entry {
        name: String,
        #[record(default)]
        tags: Vec<String>,
    }

    #[test]
    fn text_round_trip() {
        let entry = Entry {
            name: "a".into(),
            tags: vec!["x".into()],
        };
        let text = json::dumps(&entry, None).unwrap();
        assert_eq!(text, r#"{"name":"a","tags":["x"]}"#);
        assert_eq!(json::loads::<Entry>(&text).unwrap(), entry);

        let sparse = json::loads::<Entry>(r#"{"name":"b"}"#).unwrap();
        assert!(sparse.tags.is_empty());

        assert!(matches!(json::loads::<Entry>("{"), Err(Error::Json(_))));
    }

    #[test]
    fn stream_round_trip() {
        let entry = Entry {
            name: "s".into(),
            tags: Vec::new(),
        };
        let mut buffer = Vec::new();
        json::dump(&mut buffer, &entry, None).unwrap();
        assert_eq!(json::load::<Entry, _>(buffer.as_slice()).unwrap(), entry);
    }

    #[test]
    fn file_round_trip() {
        let path = std::env::temp_dir().join(format!("jk_reflect_json_{}.json", std::process::id()));
        let entry = Entry {
            name: "f".into(),
            tags: vec!["y".into(), "z".into()],
        };

        json::write(&path, &entry, None).unwrap();
        let loaded = json::read::<Entry>(&path);
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded.unwrap(), entry);

        assert!(matches!(json::read::<Entry>(&path), Err(Error::Io(_))));
    }

    pub trait Event: Reflect {}

    impl_hierarchy_root!(Event);

    #[derive(Record, Debug, PartialEq)]
    #[record(alias = "opened")]
    struct Opened {
        at: u64,
    }

    impl Event for Opened {}

    fn opened(opened: Opened) -> Box<dyn Event> {
        Box::new(opened)
    }

    #[test]
    fn members_dumped_through_their_root() {
        let registry = TypeRegistry::global();
        registry
            .declare_hierarchy_root::<Box<dyn Event>>(HierarchyConfig::new("event"))
            .unwrap();
        registry.register_subtype(opened).unwrap();

        let as_root = TypeRef::of::<Box<dyn Event>>();
        let text = json::dumps(&Opened { at: 7 }, Some(&as_root)).unwrap();
        assert_eq!(text, r#"{"event":"opened","at":7}"#);

        let mut buffer = Vec::new();
        json::dump(&mut buffer, &Opened { at: 8 }, Some(&as_root)).unwrap();
        let event = json::load::<Box<dyn Event>, _>(buffer.as_slice()).unwrap();
        let event: &dyn Reflect = &*event;
        assert_eq!(event.downcast_ref::<Opened>(), Some(&Opened { at: 8 }));

        let err = json::dumps(&7_u64, Some(&as_root)).unwrap_err();
        assert!(err.is_mismatch());
    }
}
