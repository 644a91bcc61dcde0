use alloc::boxed::Box;
use alloc::collections::{BTreeMap, BTreeSet, VecDeque};
use alloc::vec::Vec;
use core::any::type_name;
use core::hash::Hash;
use std::collections::{HashMap, HashSet};

use crate::impls::GenericTypeInfoCell;
use crate::info::{ListInfo, ListKind, MapInfo, OptionInfo, TypeInfo, TypeRef, Typed};
use crate::{DowncastError, FromReflect, Reflect, ReflectRef};

// -----------------------------------------------------------------------------
// Builders

fn build_option<T: Typed + FromReflect>(
    value: Option<Box<dyn Reflect>>,
) -> Result<Box<dyn Reflect>, DowncastError> {
    let value: Option<T> = value.map(T::take_from).transpose()?;
    Ok(Box::new(value))
}

fn build_collection<T, C>(items: Vec<Box<dyn Reflect>>) -> Result<Box<dyn Reflect>, DowncastError>
where
    T: FromReflect,
    C: FromIterator<T> + Reflect,
{
    let collection = items.into_iter().map(T::take_from).collect::<Result<C, _>>()?;
    Ok(Box::new(collection))
}

fn build_map<K, V, M>(
    entries: Vec<(Box<dyn Reflect>, Box<dyn Reflect>)>,
) -> Result<Box<dyn Reflect>, DowncastError>
where
    K: FromReflect,
    V: FromReflect,
    M: FromIterator<(K, V)> + Reflect,
{
    let map = entries
        .into_iter()
        .map(|(key, value)| Ok((K::take_from(key)?, V::take_from(value)?)))
        .collect::<Result<M, DowncastError>>()?;
    Ok(Box::new(map))
}

// -----------------------------------------------------------------------------
// Option

impl<T: Typed + FromReflect> Reflect for Option<T> {
    #[inline]
    fn reflect_type_path(&self) -> &'static str {
        type_name::<Self>()
    }

    #[inline]
    fn reflect_ref(&self) -> ReflectRef<'_> {
        ReflectRef::Option(self.as_ref().map(|value| value as &dyn Reflect))
    }
}

impl<T: Typed + FromReflect> Typed for Option<T> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            TypeInfo::Option(OptionInfo::new::<Self>(TypeRef::of::<T>(), build_option::<T>))
        })
    }
}

impl<T: Typed + FromReflect> FromReflect for Option<T> {
    /// Also accepts a bare `T`, decoded through a declared type that
    /// names the inner value only.
    fn take_from(value: Box<dyn Reflect>) -> Result<Self, DowncastError> {
        if value.is::<Self>() {
            value.take::<Self>()
        } else {
            T::take_from(value).map(Some)
        }
    }
}

// -----------------------------------------------------------------------------
// Sequences

macro_rules! impl_list {
    ($kind:ident, $ty:ty $(, $bound:path)*) => {
        impl<T: Typed + FromReflect $(+ $bound)*> Reflect for $ty {
            #[inline]
            fn reflect_type_path(&self) -> &'static str {
                type_name::<Self>()
            }

            fn reflect_ref(&self) -> ReflectRef<'_> {
                ReflectRef::List(self.iter().map(|item| item as &dyn Reflect).collect())
            }
        }

        impl<T: Typed + FromReflect $(+ $bound)*> Typed for $ty {
            fn type_info() -> &'static TypeInfo {
                static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
                CELL.get_or_insert::<Self>(|| {
                    TypeInfo::List(ListInfo::new::<Self>(
                        ListKind::$kind,
                        TypeRef::of::<T>(),
                        build_collection::<T, Self>,
                    ))
                })
            }
        }

        impl<T: Typed + FromReflect $(+ $bound)*> FromReflect for $ty {}
    };
}

impl_list!(List, Vec<T>);
impl_list!(List, VecDeque<T>);
impl_list!(VarTuple, Box<[T]>);
impl_list!(Set, BTreeSet<T>, Ord);
impl_list!(Set, HashSet<T>, Eq, Hash);

// -----------------------------------------------------------------------------
// Maps

macro_rules! impl_map {
    ($ty:ty $(, $bound:path)*) => {
        impl<K, V> Reflect for $ty
        where
            K: Typed + FromReflect $(+ $bound)*,
            V: Typed + FromReflect,
        {
            #[inline]
            fn reflect_type_path(&self) -> &'static str {
                type_name::<Self>()
            }

            fn reflect_ref(&self) -> ReflectRef<'_> {
                ReflectRef::Map(
                    self.iter()
                        .map(|(key, value)| (key as &dyn Reflect, value as &dyn Reflect))
                        .collect(),
                )
            }
        }

        impl<K, V> Typed for $ty
        where
            K: Typed + FromReflect $(+ $bound)*,
            V: Typed + FromReflect,
        {
            fn type_info() -> &'static TypeInfo {
                static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
                CELL.get_or_insert::<Self>(|| {
                    TypeInfo::Map(MapInfo::new::<Self>(
                        TypeRef::of::<K>(),
                        TypeRef::of::<V>(),
                        build_map::<K, V, Self>,
                    ))
                })
            }
        }

        impl<K, V> FromReflect for $ty
        where
            K: Typed + FromReflect $(+ $bound)*,
            V: Typed + FromReflect,
        {
        }
    };
}

impl_map!(BTreeMap<K, V>, Ord);
impl_map!(HashMap<K, V>, Eq, Hash);

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;
    use std::collections::HashMap;

    use crate::info::{ListKind, TypeInfo, Typed};
    use crate::{Reflect, ReflectRef};

    #[test]
    fn list_info_builds_typed_vec() {
        let TypeInfo::List(info) = <Vec<u8>>::type_info() else {
            panic!("Vec is a list");
        };
        assert_eq!(info.kind(), ListKind::List);
        let items: Vec<Box<dyn Reflect>> = vec![Box::new(1_u8), Box::new(2_u8)];
        let built = info.build(items).unwrap().take::<Vec<u8>>().unwrap();
        assert_eq!(built, [1, 2]);
    }

    #[test]
    fn wrong_element_type_fails() {
        let TypeInfo::List(info) = <Vec<u8>>::type_info() else {
            panic!("Vec is a list");
        };
        let items: Vec<Box<dyn Reflect>> = vec![Box::new(String::from("x"))];
        assert!(info.build(items).is_err());
    }

    #[test]
    fn generic_cells_keep_instantiations_apart() {
        assert_ne!(<Vec<u8>>::type_info().type_id(), <Vec<u16>>::type_info().type_id());
        assert!(core::ptr::eq(<Vec<u8>>::type_info(), <Vec<u8>>::type_info()));
        assert!(matches!(<Box<[u8]>>::type_info(), TypeInfo::List(info) if info.kind() == ListKind::VarTuple));
    }

    #[test]
    fn map_view_lists_entries() {
        let mut map = HashMap::new();
        map.insert(String::from("a"), 1_i32);
        let ReflectRef::Map(entries) = map.reflect_ref() else {
            panic!("HashMap is a map");
        };
        assert_eq!(entries.len(), 1);
        assert!(matches!(entries[0].0.reflect_ref(), ReflectRef::Str("a")));
    }
}
