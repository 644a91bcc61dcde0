use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::any::type_name;

use crate::impls::GenericTypeInfoCell;
use crate::info::{TupleInfo, TypeInfo, TypeRef, Typed};
use crate::{DowncastError, FromReflect, Reflect, ReflectRef};

#[inline]
fn take_next<T: FromReflect>(
    items: &mut impl Iterator<Item = Box<dyn Reflect>>,
) -> Result<T, DowncastError> {
    match items.next() {
        Some(item) => T::take_from(item),
        None => Err(DowncastError {
            expected: type_name::<T>(),
            found: "nothing",
        }),
    }
}

macro_rules! impl_tuple {
    ($($name:ident : $index:tt),+) => {
        impl<$($name: Typed + FromReflect),+> Reflect for ($($name,)+) {
            #[inline]
            fn reflect_type_path(&self) -> &'static str {
                type_name::<Self>()
            }

            fn reflect_ref(&self) -> ReflectRef<'_> {
                ReflectRef::Tuple(vec![$(&self.$index as &dyn Reflect),+])
            }
        }

        impl<$($name: Typed + FromReflect),+> Typed for ($($name,)+) {
            fn type_info() -> &'static TypeInfo {
                static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
                CELL.get_or_insert::<Self>(|| {
                    TypeInfo::Tuple(TupleInfo::new::<Self>(
                        vec![$(TypeRef::of::<$name>()),+],
                        |items: Vec<Box<dyn Reflect>>| {
                            let mut items = items.into_iter();
                            let tuple: ($($name,)+) = ($(take_next::<$name>(&mut items)?,)+);
                            Ok(Box::new(tuple))
                        },
                    ))
                })
            }
        }

        impl<$($name: Typed + FromReflect),+> FromReflect for ($($name,)+) {}
    };
}

impl_tuple!(A: 0);
impl_tuple!(A: 0, B: 1);
impl_tuple!(A: 0, B: 1, C: 2);
impl_tuple!(A: 0, B: 1, C: 2, D: 3);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4);
impl_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    use crate::Reflect;
    use crate::info::{TypeInfo, Typed};

    #[test]
    fn tuple_positions_are_typed() {
        let TypeInfo::Tuple(info) = <(i32, String)>::type_info() else {
            panic!("tuple info");
        };
        assert_eq!(info.items().len(), 2);

        let items: Vec<Box<dyn Reflect>> = vec![Box::new(1_i32), Box::new(String::from("a"))];
        let tuple = info.build(items).unwrap().take::<(i32, String)>().unwrap();
        assert_eq!(tuple, (1, String::from("a")));

        let short: Vec<Box<dyn Reflect>> = vec![Box::new(1_i32)];
        assert!(info.build(short).is_err());
    }
}
