//! Hash states used by the registries.
//!
//! Registry tables are keyed by type ids, names and codec parameters.
//! [`FixedHashState`] hashes those with `foldhash` under a constant seed,
//! so iteration order does not change between runs. [`TypeIdHashState`]
//! is for maps keyed by [`TypeId`](core::any::TypeId) alone.

use core::hash::{BuildHasher, Hasher};

use foldhash::fast::{FixedState, FoldHasher};

// -----------------------------------------------------------------------------
// Re-export crates

pub use foldhash;
pub use hashbrown;

// -----------------------------------------------------------------------------
// Aliases

/// Registry map; hashed with [`FixedHashState`] unless told otherwise.
pub type HashMap<K, V, S = FixedHashState> = hashbrown::HashMap<K, V, S>;

/// Registry set; hashed with [`FixedHashState`] unless told otherwise.
pub type HashSet<T, S = FixedHashState> = hashbrown::HashSet<T, S>;

// -----------------------------------------------------------------------------
// FixedHashState

// "JK_REFLT"
const SEED: u64 = 0x4A4B_5F52_4546_4C54;

/// `foldhash` with a constant seed.
///
/// ```
/// use core::hash::BuildHasher;
/// use jk_utils::hash::FixedHashState;
///
/// assert_eq!(
///     FixedHashState.hash_one("discriminator"),
///     FixedHashState.hash_one("discriminator"),
/// );
/// ```
#[derive(Copy, Clone, Default, Debug)]
pub struct FixedHashState;

impl BuildHasher for FixedHashState {
    type Hasher = FoldHasher<'static>;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        FixedState::with_seed(SEED).build_hasher()
    }
}

// -----------------------------------------------------------------------------
// TypeIdHashState

/// Hasher for keys that already are well distributed 64-bit values.
///
/// `TypeId` hashes itself with a single `write_u64`, which becomes the
/// hash as is.
#[derive(Copy, Clone, Default, Debug)]
pub struct TypeIdHasher(u64);

impl Hasher for TypeIdHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }

    // Other keys still hash, one byte at a time.
    fn write(&mut self, bytes: &[u8]) {
        self.0 = bytes
            .iter()
            .fold(self.0, |hash, byte| hash.rotate_left(8) ^ u64::from(*byte));
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.0 = i;
    }
}

/// Builds [`TypeIdHasher`]s; used by [`TypeIdMap`](crate::TypeIdMap).
#[derive(Copy, Clone, Default, Debug)]
pub struct TypeIdHashState;

impl BuildHasher for TypeIdHashState {
    type Hasher = TypeIdHasher;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        TypeIdHasher(0)
    }
}

#[cfg(test)]
mod tests {
    use core::any::TypeId;
    use core::hash::{BuildHasher, Hasher};

    use super::{FixedHashState, HashMap, TypeIdHashState};

    #[test]
    fn fixed_state_is_stable() {
        let mut map: HashMap<&str, u32> = HashMap::default();
        map.insert("a", 1);
        map.insert("b", 2);
        assert_eq!(map.get("a"), Some(&1));
        assert_eq!(FixedHashState.hash_one(42_u64), FixedHashState.hash_one(42_u64));
    }

    #[test]
    fn type_ids_pass_through() {
        let mut hasher = TypeIdHashState.build_hasher();
        hasher.write_u64(7);
        assert_eq!(hasher.finish(), 7);

        let mut hasher = TypeIdHashState.build_hasher();
        hasher.write(&[1, 0]);
        assert_eq!(hasher.finish(), 0x100);

        assert_ne!(
            TypeIdHashState.hash_one(TypeId::of::<u8>()),
            TypeIdHashState.hash_one(TypeId::of::<u16>())
        );
    }
}
