//! Codecs for standard types without reflected structure.
//!
//! - `PathBuf` as a string (lossy for non UTF-8 paths).
//! - `Duration` as a number of seconds.
//! - `char` as a one-character string.
//! - `uuid::Uuid` as its hyphenated string.
//! - `chrono` date-times as `2020-01-02 03:04:05.000006 +0100`. A
//!   `NaiveDateTime` has no offset and keeps the trailing space.
//!
//! [`TypeRegistry::new`](crate::registry::TypeRegistry::new) registers them
//! when the `builtin` feature is enabled.

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::time::Duration;
use std::path::PathBuf;
use std::sync::LazyLock;

use alloc::string::ToString;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde_json::{Number, Value};
use uuid::Uuid;

use crate::codec::{Codec, CodecParams, CodecTemplate};
use crate::registry::TypeRegistry;
use crate::serde::{DeserializeDriver, SerializeDriver, kind_of};
use crate::{ConfigurationError, DeserializationError, Error, Reflect, SerializationError};

fn expect<'a, T: Reflect>(value: &'a dyn Reflect) -> Result<&'a T, Error> {
    value.downcast_ref::<T>().ok_or_else(|| {
        SerializationError::TypeMismatch(core::any::type_name::<T>(), value.reflect_type_path())
            .into()
    })
}

// -----------------------------------------------------------------------------
// PathBuf

struct PathCodec;

impl Codec for PathCodec {
    fn serialize(&self, value: &dyn Reflect, _: &SerializeDriver<'_>) -> Result<Value, Error> {
        let path = expect::<PathBuf>(value)?;
        Ok(Value::String(path.to_string_lossy().into_owned()))
    }

    fn deserialize(&self, data: &Value, _: &DeserializeDriver<'_>) -> Result<Box<dyn Reflect>, Error> {
        let text = data
            .as_str()
            .ok_or_else(|| DeserializationError::mismatch("path string", kind_of(data)))?;
        Ok(Box::new(PathBuf::from(text)))
    }
}

// -----------------------------------------------------------------------------
// Duration

struct DurationCodec;

impl Codec for DurationCodec {
    fn serialize(&self, value: &dyn Reflect, _: &SerializeDriver<'_>) -> Result<Value, Error> {
        let secs = expect::<Duration>(value)?.as_secs_f64();
        let number = Number::from_f64(secs).ok_or(SerializationError::NonFiniteFloat(secs))?;
        Ok(Value::Number(number))
    }

    fn deserialize(&self, data: &Value, _: &DeserializeDriver<'_>) -> Result<Box<dyn Reflect>, Error> {
        let duration = data
            .as_f64()
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .ok_or_else(|| DeserializationError::mismatch("non-negative seconds", kind_of(data)))?;
        Ok(Box::new(duration))
    }
}

// -----------------------------------------------------------------------------
// char

struct CharCodec;

impl Codec for CharCodec {
    fn serialize(&self, value: &dyn Reflect, _: &SerializeDriver<'_>) -> Result<Value, Error> {
        let ch = *expect::<char>(value)?;
        Ok(Value::String(ch.into()))
    }

    fn deserialize(&self, data: &Value, _: &DeserializeDriver<'_>) -> Result<Box<dyn Reflect>, Error> {
        let mut chars = data.as_str().unwrap_or_default().chars();
        match (chars.next(), chars.next()) {
            (Some(ch), None) => Ok(Box::new(ch)),
            _ => Err(DeserializationError::mismatch("one-character string", kind_of(data)).into()),
        }
    }
}

// -----------------------------------------------------------------------------
// Uuid

struct UuidCodec;

impl Codec for UuidCodec {
    fn serialize(&self, value: &dyn Reflect, _: &SerializeDriver<'_>) -> Result<Value, Error> {
        Ok(Value::String(expect::<Uuid>(value)?.to_string()))
    }

    fn deserialize(&self, data: &Value, _: &DeserializeDriver<'_>) -> Result<Box<dyn Reflect>, Error> {
        let uuid = data
            .as_str()
            .and_then(|text| Uuid::parse_str(text).ok())
            .ok_or_else(|| DeserializationError::mismatch("UUID string", kind_of(data)))?;
        Ok(Box::new(uuid))
    }
}

// -----------------------------------------------------------------------------
// Date-times

const WRITE_AWARE: &str = "%Y-%m-%d %H:%M:%S%.6f %z";
const WRITE_NAIVE: &str = "%Y-%m-%d %H:%M:%S%.6f ";
const READ_AWARE: &str = "%Y-%m-%d %H:%M:%S%.f %z";
const READ_NAIVE: &str = "%Y-%m-%d %H:%M:%S%.f";

fn parse_aware(data: &Value) -> Result<DateTime<FixedOffset>, DeserializationError> {
    data.as_str()
        .and_then(|text| DateTime::parse_from_str(text, READ_AWARE).ok())
        .ok_or_else(|| DeserializationError::mismatch("date-time with offset", kind_of(data)))
}

struct UtcCodec;

impl Codec for UtcCodec {
    fn serialize(&self, value: &dyn Reflect, _: &SerializeDriver<'_>) -> Result<Value, Error> {
        let time = expect::<DateTime<Utc>>(value)?;
        Ok(Value::String(time.format(WRITE_AWARE).to_string()))
    }

    fn deserialize(&self, data: &Value, _: &DeserializeDriver<'_>) -> Result<Box<dyn Reflect>, Error> {
        Ok(Box::new(parse_aware(data)?.with_timezone(&Utc)))
    }
}

struct OffsetCodec;

impl Codec for OffsetCodec {
    fn serialize(&self, value: &dyn Reflect, _: &SerializeDriver<'_>) -> Result<Value, Error> {
        let time = expect::<DateTime<FixedOffset>>(value)?;
        Ok(Value::String(time.format(WRITE_AWARE).to_string()))
    }

    fn deserialize(&self, data: &Value, _: &DeserializeDriver<'_>) -> Result<Box<dyn Reflect>, Error> {
        Ok(Box::new(parse_aware(data)?))
    }
}

struct NaiveCodec;

impl Codec for NaiveCodec {
    fn serialize(&self, value: &dyn Reflect, _: &SerializeDriver<'_>) -> Result<Value, Error> {
        let time = expect::<NaiveDateTime>(value)?;
        Ok(Value::String(time.format(WRITE_NAIVE).to_string()))
    }

    // An empty offset after the last space marks a naive value.
    fn deserialize(&self, data: &Value, _: &DeserializeDriver<'_>) -> Result<Box<dyn Reflect>, Error> {
        let time = data
            .as_str()
            .and_then(|text| NaiveDateTime::parse_from_str(text.trim_end_matches(' '), READ_NAIVE).ok())
            .ok_or_else(|| DeserializationError::mismatch("date-time without offset", kind_of(data)))?;
        Ok(Box::new(time))
    }
}

// -----------------------------------------------------------------------------
// Templates

pub static PATH: LazyLock<Arc<CodecTemplate>> =
    LazyLock::new(|| CodecTemplate::stateless("Path", |_: &CodecParams<'_>| Ok(Box::new(PathCodec))));

pub static DURATION: LazyLock<Arc<CodecTemplate>> = LazyLock::new(|| {
    CodecTemplate::stateless("Duration", |_: &CodecParams<'_>| Ok(Box::new(DurationCodec)))
});

pub static CHAR: LazyLock<Arc<CodecTemplate>> =
    LazyLock::new(|| CodecTemplate::stateless("Char", |_: &CodecParams<'_>| Ok(Box::new(CharCodec))));

pub static UUID: LazyLock<Arc<CodecTemplate>> =
    LazyLock::new(|| CodecTemplate::stateless("Uuid", |_: &CodecParams<'_>| Ok(Box::new(UuidCodec))));

pub static UTC_DATETIME: LazyLock<Arc<CodecTemplate>> = LazyLock::new(|| {
    CodecTemplate::stateless("UtcDateTime", |_: &CodecParams<'_>| Ok(Box::new(UtcCodec)))
});

pub static OFFSET_DATETIME: LazyLock<Arc<CodecTemplate>> = LazyLock::new(|| {
    CodecTemplate::stateless("OffsetDateTime", |_: &CodecParams<'_>| Ok(Box::new(OffsetCodec)))
});

pub static NAIVE_DATETIME: LazyLock<Arc<CodecTemplate>> = LazyLock::new(|| {
    CodecTemplate::stateless("NaiveDateTime", |_: &CodecParams<'_>| Ok(Box::new(NaiveCodec)))
});

/// Registers every built-in codec in `registry`.
pub fn register_builtin(registry: &TypeRegistry) -> Result<(), ConfigurationError> {
    registry.register_codec::<PathBuf>(&PATH)?;
    registry.register_codec::<Duration>(&DURATION)?;
    registry.register_codec::<char>(&CHAR)?;
    registry.register_codec::<Uuid>(&UUID)?;
    registry.register_codec::<DateTime<Utc>>(&UTC_DATETIME)?;
    registry.register_codec::<DateTime<FixedOffset>>(&OFFSET_DATETIME)?;
    registry.register_codec::<NaiveDateTime>(&NAIVE_DATETIME)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use core::time::Duration;
    use std::path::PathBuf;

    use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
    use serde_json::json;
    use uuid::Uuid;

    use crate::registry::TypeRegistry;

    #[test]
    fn builtin_round_trips() {
        let registry = TypeRegistry::new();

        let data = registry.serialize(&Duration::from_millis(1500), None).unwrap();
        assert_eq!(data, json!(1.5));
        assert_eq!(
            registry.deserialize_as::<Duration>(&data).unwrap(),
            Duration::from_millis(1500)
        );

        let data = registry.serialize(&PathBuf::from("a/b"), None).unwrap();
        assert_eq!(data, json!("a/b"));

        assert_eq!(registry.deserialize_as::<char>(&json!("x")).unwrap(), 'x');
        assert!(registry.deserialize_as::<char>(&json!("xy")).is_err());
    }

    #[test]
    fn uuid_round_trip() {
        let registry = TypeRegistry::new();
        let id = Uuid::from_u128(0x67e5_5044_10b1_426f_9247_bb68_0e5f_e0c8);

        let data = registry.serialize(&id, None).unwrap();
        assert_eq!(data, json!("67e55044-10b1-426f-9247-bb680e5fe0c8"));
        assert_eq!(registry.deserialize_as::<Uuid>(&data).unwrap(), id);

        let err = registry.deserialize_as::<Uuid>(&json!("not-a-uuid")).unwrap_err();
        assert!(err.is_mismatch());
    }

    #[test]
    fn datetime_round_trips() {
        let registry = TypeRegistry::new();
        let naive = NaiveDate::from_ymd_opt(2020, 1, 2)
            .unwrap()
            .and_hms_micro_opt(3, 4, 5, 6)
            .unwrap();

        let data = registry.serialize(&naive, None).unwrap();
        assert_eq!(data, json!("2020-01-02 03:04:05.000006 "));
        assert_eq!(registry.deserialize_as::<NaiveDateTime>(&data).unwrap(), naive);
        assert_eq!(
            registry
                .deserialize_as::<NaiveDateTime>(&json!("2020-01-02 03:04:05.000006"))
                .unwrap(),
            naive
        );

        let utc = naive.and_utc();
        let data = registry.serialize(&utc, None).unwrap();
        assert_eq!(data, json!("2020-01-02 03:04:05.000006 +0000"));
        assert_eq!(registry.deserialize_as::<DateTime<Utc>>(&data).unwrap(), utc);

        let offset = naive
            .and_local_timezone(FixedOffset::east_opt(3600).unwrap())
            .unwrap();
        let data = registry.serialize(&offset, None).unwrap();
        assert_eq!(data, json!("2020-01-02 03:04:05.000006 +0100"));
        assert_eq!(registry.deserialize_as::<DateTime<FixedOffset>>(&data).unwrap(), offset);

        // Offsets are required by the aware types and refused by the naive one.
        assert!(registry.deserialize_as::<DateTime<Utc>>(&json!("2020-01-02 03:04:05.000006 ")).is_err());
        assert!(registry.deserialize_as::<NaiveDateTime>(&data).is_err());
    }

    #[test]
    fn empty_registry_has_no_builtin() {
        let registry = TypeRegistry::empty();
        assert!(registry.serialize(&'x', None).is_err());
    }
}
