use alloc::boxed::Box;
use alloc::sync::Arc;
use core::fmt;
use core::hash::{Hash, Hasher};
use std::sync::{OnceLock, PoisonError, RwLock};

use jk_utils::hash::HashMap;
use serde_json::Value;

use crate::codec::{Codec, CodecArgs, CodecId, CodecTemplate, ParamValue};
use crate::serde::{DeserializeDriver, SerializeDriver};
use crate::{ConfigurationError, Error, Reflect};

// -----------------------------------------------------------------------------
// RealizedCodec

/// A [`CodecTemplate`] bound to concrete parameters.
///
/// Realized codecs are executable and are also type references: wrap one
/// in [`TypeRef::Codec`](crate::info::TypeRef::Codec) to declare a field
/// encoded by it. Held as a value (`Arc<RealizedCodec>` implements
/// [`Reflect`]) it serializes to its own parameters.
///
/// Two realized codecs are equal if they are the same instance, or if they
/// come from the same template with equal parameters.
pub struct RealizedCodec {
    template: Arc<CodecTemplate>,
    params: Box<[ParamValue]>,
    codec: Box<dyn Codec>,
}

impl RealizedCodec {
    #[inline]
    pub fn template(&self) -> &Arc<CodecTemplate> {
        &self.template
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.template.name()
    }

    /// Parameters in declared order.
    #[inline]
    pub fn params(&self) -> &[ParamValue] {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        let index = self.template.params().iter().position(|param| *param == name)?;
        self.params.get(index)
    }

    #[inline]
    pub fn serialize(&self, value: &dyn Reflect, driver: &SerializeDriver<'_>) -> Result<Value, Error> {
        self.codec.serialize(value, driver)
    }

    #[inline]
    pub fn deserialize(
        &self,
        data: &Value,
        driver: &DeserializeDriver<'_>,
    ) -> Result<Box<dyn Reflect>, Error> {
        self.codec.deserialize(data, driver)
    }
}

impl PartialEq for RealizedCodec {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self, other)
            || (self.template.id() == other.template.id() && self.params == other.params)
    }
}

impl Eq for RealizedCodec {}

impl Hash for RealizedCodec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.template.id().hash(state);
        self.params.hash(state);
    }
}

impl fmt::Display for RealizedCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())?;
        if self.params.is_empty() {
            return Ok(());
        }
        f.write_str("(")?;
        let names = self.template.params().iter();
        for (index, (name, value)) in names.zip(self.params.iter()).enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Debug for RealizedCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RealizedCodec({self})")
    }
}

// -----------------------------------------------------------------------------
// Interning

type InternKey = (CodecId, Box<[ParamValue]>);

fn interned() -> &'static RwLock<HashMap<InternKey, Arc<RealizedCodec>>> {
    static TABLE: OnceLock<RwLock<HashMap<InternKey, Arc<RealizedCodec>>>> = OnceLock::new();
    TABLE.get_or_init(|| RwLock::new(HashMap::default()))
}

fn build(template: &Arc<CodecTemplate>, params: Box<[ParamValue]>) -> Result<RealizedCodec, ConfigurationError> {
    let codec = template.build(&params)?;
    Ok(RealizedCodec {
        template: Arc::clone(template),
        params,
        codec,
    })
}

pub(crate) fn intern(
    template: &Arc<CodecTemplate>,
    args: CodecArgs,
) -> Result<Arc<RealizedCodec>, ConfigurationError> {
    let params = args.normalize(template)?.into_boxed_slice();

    if !params.iter().all(ParamValue::is_hashable) {
        log::trace!("codec `{}` realized with unhashable parameters, not cached", template.name());
        return build(template, params).map(Arc::new);
    }

    let key = (template.id(), params);
    if let Some(found) = interned()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
    {
        return Ok(Arc::clone(found));
    }

    // Built outside the lock; a racing realization of the same key is
    // dropped in favor of whichever was inserted first.
    let fresh = Arc::new(build(template, key.1.clone())?);
    let mut table = interned().write().unwrap_or_else(PoisonError::into_inner);
    Ok(Arc::clone(table.entry(key).or_insert(fresh)))
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::sync::Arc;

    use serde_json::Value;

    use crate::codec::{Codec, CodecArgs, CodecParams, CodecTemplate};
    use crate::serde::{DeserializeDriver, SerializeDriver};
    use crate::{ConfigurationError, Error, Reflect};

    struct Nothing;

    impl Codec for Nothing {
        fn serialize(&self, _: &dyn Reflect, _: &SerializeDriver<'_>) -> Result<Value, Error> {
            Ok(Value::Null)
        }

        fn deserialize(&self, _: &Value, _: &DeserializeDriver<'_>) -> Result<Box<dyn Reflect>, Error> {
            Ok(Box::new(()))
        }
    }

    fn build(_: &CodecParams<'_>) -> Result<Box<dyn Codec>, ConfigurationError> {
        Ok(Box::new(Nothing))
    }

    #[test]
    fn equal_parameters_share_one_instance() {
        let template = CodecTemplate::new("Sized", &["size", "label"], build);
        let a = template.realize(CodecArgs::new().arg(3_u64).arg("x")).unwrap();
        let b = template
            .realize(CodecArgs::new().named("label", "x").named("size", 3_i64))
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let c = template.realize(CodecArgs::new().arg(4_u64).arg("x")).unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
        assert_ne!(a, c);
    }

    #[test]
    fn unhashable_parameters_skip_the_cache() {
        let template = CodecTemplate::new("Scaled", &["factor"], build);
        let a = template.realize(CodecArgs::new().arg(0.5)).unwrap();
        let b = template.realize(CodecArgs::new().arg(0.5)).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a, b);
    }

    #[test]
    fn bad_arguments_are_configuration_errors() {
        let template = CodecTemplate::new("Sized", &["size"], build);
        assert!(matches!(
            template.realize(CodecArgs::new()),
            Err(ConfigurationError::MissingParam { param: "size", .. })
        ));
        assert!(matches!(
            template.realize(CodecArgs::new().arg(1_u64).arg(2_u64)),
            Err(ConfigurationError::TooManyArgs { declared: 1, given: 2, .. })
        ));
        assert!(matches!(
            template.realize(CodecArgs::new().named("length", 1_u64)),
            Err(ConfigurationError::UnknownParam { .. })
        ));
        assert!(matches!(
            template.realize(CodecArgs::new().arg(1_u64).named("size", 1_u64)),
            Err(ConfigurationError::DuplicateParam { .. })
        ));
    }

    #[test]
    fn static_templates_have_one_instance() {
        let template = CodecTemplate::stateless("Nothing", build);
        assert!(template.is_static());
        let a = template.instance().unwrap();
        assert!(Arc::ptr_eq(&a, &template.instance().unwrap()));
        assert_eq!(a.to_string(), "Nothing");
    }
}
