use alloc::boxed::Box;

use crate::{DowncastError, Reflect};

/// Recovers a concrete value from the boxed output of the deserializer.
///
/// The default implementation downcasts. Wrapper types such as
/// `Box<dyn Reflect>` override it to accept any value.
///
/// ```
/// use jk_reflect::{FromReflect, Reflect};
///
/// let boxed: Box<dyn Reflect> = Box::new(String::from("a"));
/// assert_eq!(String::take_from(boxed).unwrap(), "a");
///
/// let boxed: Box<dyn Reflect> = Box::new(1_u8);
/// let kept = <Box<dyn Reflect>>::take_from(boxed).unwrap();
/// assert!(kept.is::<u8>());
/// ```
pub trait FromReflect: Reflect + Sized {
    #[inline]
    fn take_from(value: Box<dyn Reflect>) -> Result<Self, DowncastError> {
        value.take::<Self>()
    }
}
