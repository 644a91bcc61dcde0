use alloc::borrow::ToOwned;
use alloc::boxed::Box;
use alloc::string::String;
use core::any::type_name;
use core::str::FromStr;

use serde_json::Value;

use crate::impls::NonGenericTypeInfoCell;
use crate::info::{ScalarInfo, ScalarKind, TypeInfo, Typed};
use crate::{FromReflect, Reflect, ReflectRef};

// -----------------------------------------------------------------------------
// Conversions

fn int_from_value<T: Reflect + TryFrom<i64>>(value: &Value) -> Option<Box<dyn Reflect>> {
    let value = T::try_from(value.as_i64()?).ok()?;
    Some(Box::new(value))
}

fn uint_from_value<T: Reflect + TryFrom<u64>>(value: &Value) -> Option<Box<dyn Reflect>> {
    let value = T::try_from(value.as_u64()?).ok()?;
    Some(Box::new(value))
}

fn f64_from_value(value: &Value) -> Option<Box<dyn Reflect>> {
    Some(Box::new(value.as_f64()?))
}

fn f32_from_value(value: &Value) -> Option<Box<dyn Reflect>> {
    Some(Box::new(value.as_f64()? as f32))
}

fn bool_from_value(value: &Value) -> Option<Box<dyn Reflect>> {
    Some(Box::new(value.as_bool()?))
}

fn string_from_value(value: &Value) -> Option<Box<dyn Reflect>> {
    Some(Box::new(value.as_str()?.to_owned()))
}

fn unit_from_value(value: &Value) -> Option<Box<dyn Reflect>> {
    value.is_null().then(|| Box::new(()) as Box<dyn Reflect>)
}

fn parse_key<T: Reflect + FromStr>(key: &str) -> Option<Box<dyn Reflect>> {
    let value = key.parse::<T>().ok()?;
    Some(Box::new(value))
}

fn no_key(_: &str) -> Option<Box<dyn Reflect>> {
    None
}

// -----------------------------------------------------------------------------
// Impls

macro_rules! impl_scalar {
    ($ty:ty, $kind:ident, $from_value:expr, $from_key:expr, $v:ident => $view:expr) => {
        impl Reflect for $ty {
            #[inline]
            fn reflect_type_path(&self) -> &'static str {
                type_name::<Self>()
            }

            #[inline]
            fn reflect_ref(&self) -> ReflectRef<'_> {
                let $v = self;
                $view
            }
        }

        impl Typed for $ty {
            fn type_info() -> &'static TypeInfo {
                static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
                CELL.get_or_init(|| {
                    TypeInfo::Scalar(ScalarInfo::new::<$ty>(
                        ScalarKind::$kind,
                        $from_value,
                        $from_key,
                    ))
                })
            }
        }

        impl FromReflect for $ty {}
    };
}

impl_scalar!((), Unit, unit_from_value, no_key, _v => ReflectRef::Unit);
impl_scalar!(bool, Bool, bool_from_value, parse_key::<bool>, v => ReflectRef::Bool(*v));

impl_scalar!(i8, Int, int_from_value::<i8>, parse_key::<i8>, v => ReflectRef::Int(i64::from(*v)));
impl_scalar!(i16, Int, int_from_value::<i16>, parse_key::<i16>, v => ReflectRef::Int(i64::from(*v)));
impl_scalar!(i32, Int, int_from_value::<i32>, parse_key::<i32>, v => ReflectRef::Int(i64::from(*v)));
impl_scalar!(i64, Int, int_from_value::<i64>, parse_key::<i64>, v => ReflectRef::Int(*v));
impl_scalar!(isize, Int, int_from_value::<isize>, parse_key::<isize>, v => ReflectRef::Int(*v as i64));

impl_scalar!(u8, UInt, uint_from_value::<u8>, parse_key::<u8>, v => ReflectRef::UInt(u64::from(*v)));
impl_scalar!(u16, UInt, uint_from_value::<u16>, parse_key::<u16>, v => ReflectRef::UInt(u64::from(*v)));
impl_scalar!(u32, UInt, uint_from_value::<u32>, parse_key::<u32>, v => ReflectRef::UInt(u64::from(*v)));
impl_scalar!(u64, UInt, uint_from_value::<u64>, parse_key::<u64>, v => ReflectRef::UInt(*v));
impl_scalar!(usize, UInt, uint_from_value::<usize>, parse_key::<usize>, v => ReflectRef::UInt(*v as u64));

impl_scalar!(f32, Float, f32_from_value, parse_key::<f32>, v => ReflectRef::Float(f64::from(*v)));
impl_scalar!(f64, Float, f64_from_value, parse_key::<f64>, v => ReflectRef::Float(*v));

impl_scalar!(String, Str, string_from_value, parse_key::<String>, v => ReflectRef::Str(v.as_str()));

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::info::{ScalarKind, TypeInfo, Typed};

    fn scalar<T: Typed>() -> &'static crate::info::ScalarInfo {
        match T::type_info() {
            TypeInfo::Scalar(info) => info,
            other => panic!("not a scalar: {other:?}"),
        }
    }

    #[test]
    fn integers_are_range_checked() {
        assert!(scalar::<u8>().from_value(&json!(255)).is_some());
        assert!(scalar::<u8>().from_value(&json!(256)).is_none());
        assert!(scalar::<i8>().from_value(&json!(-128)).is_some());
        assert!(scalar::<u32>().from_value(&json!(-1)).is_none());
        assert!(scalar::<i64>().from_value(&json!(1.5)).is_none());
    }

    #[test]
    fn kinds_do_not_cross() {
        assert!(scalar::<String>().from_value(&json!(1)).is_none());
        assert!(scalar::<i32>().from_value(&json!("1")).is_none());
        assert!(scalar::<bool>().from_value(&json!(0)).is_none());
        assert!(scalar::<f64>().from_value(&json!(3)).is_some());
        assert!(scalar::<()>().from_value(&json!(null)).is_some());
    }

    #[test]
    fn keys_parse_from_strings() {
        let key = scalar::<i32>().from_key("-7").unwrap();
        assert_eq!(key.take::<i32>().unwrap(), -7);
        assert!(scalar::<i32>().from_key("x").is_none());
        assert_eq!(scalar::<String>().kind(), ScalarKind::Str);
        assert!(!scalar::<bool>().kind().is_key());
    }
}
