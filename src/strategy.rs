use core::hash::BuildHasher;
use core::hash::Hash;
use core::hash::Hasher;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// The hash builder used by [`DefaultStrategy`] unless another is given.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// The hash builder used by [`DefaultStrategy`] unless another is given.
        pub type DefaultHashBuilder = std::collections::hash_map::RandomState;
    } else {
        /// The hash builder used by [`DefaultStrategy`] unless another is given.
        ///
        /// Neither `foldhash` nor `std` is enabled, so there is no default; this
        /// type cannot be constructed and a builder must be supplied explicitly.
        pub type DefaultHashBuilder = NoDefaultHasher;
    }
}

/// Computes hashes for, and compares, keys of type `K`.
///
/// A map only ever compares keys through its strategy, so a strategy may
/// implement an equivalence coarser than `K`'s own `Eq` (for example
/// case-insensitive strings). Keys that are equal under [`equals`] must
/// produce the same [`hash`].
///
/// [`equals`]: HashingStrategy::equals
/// [`hash`]: HashingStrategy::hash
///
/// # Examples
///
/// ```rust
/// use robin_map::HashMap;
/// use robin_map::HashingStrategy;
///
/// struct CaseInsensitive;
///
/// impl HashingStrategy<String> for CaseInsensitive {
///     fn hash(&self, key: &String) -> u64 {
///         key.bytes().fold(0xcbf29ce484222325, |h, b| {
///             (h ^ b.to_ascii_lowercase() as u64).wrapping_mul(0x100000001b3)
///         })
///     }
///
///     fn equals(&self, a: &String, b: &String) -> bool {
///         a.eq_ignore_ascii_case(b)
///     }
/// }
///
/// let mut map = HashMap::with_strategy(CaseInsensitive);
/// map.insert("Hello".to_string(), 1);
/// assert_eq!(map.get(&"HELLO".to_string()), Some(&1));
/// ```
pub trait HashingStrategy<K: ?Sized> {
    /// Hashes `key`.
    fn hash(&self, key: &K) -> u64;

    /// Returns `true` if `a` and `b` are the same key.
    fn equals(&self, a: &K, b: &K) -> bool;
}

impl<K: ?Sized, T: HashingStrategy<K> + ?Sized> HashingStrategy<K> for &T {
    #[inline]
    fn hash(&self, key: &K) -> u64 {
        (**self).hash(key)
    }

    #[inline]
    fn equals(&self, a: &K, b: &K) -> bool {
        (**self).equals(a, b)
    }
}

/// Uses the key's own [`Hash`] and [`Eq`] through a [`BuildHasher`].
#[derive(Clone, Debug, Default)]
pub struct DefaultStrategy<B = DefaultHashBuilder> {
    hash_builder: B,
}

impl<B> DefaultStrategy<B> {
    /// Creates a strategy hashing with `hash_builder`.
    pub fn with_hasher(hash_builder: B) -> Self {
        Self { hash_builder }
    }

    /// Returns the underlying hash builder.
    pub fn hasher(&self) -> &B {
        &self.hash_builder
    }
}

impl<K, B> HashingStrategy<K> for DefaultStrategy<B>
where
    K: Hash + Eq + ?Sized,
    B: BuildHasher,
{
    #[inline]
    fn hash(&self, key: &K) -> u64 {
        self.hash_builder.hash_one(key)
    }

    #[inline]
    fn equals(&self, a: &K, b: &K) -> bool {
        a == b
    }
}

/// Stand-in hash builder used when no default hasher is compiled in.
///
/// This type has no values, so a [`DefaultStrategy`] over it can never be
/// built.
#[derive(Clone, Debug)]
pub enum NoDefaultHasher {}

impl BuildHasher for NoDefaultHasher {
    type Hasher = NoDefaultHasher;

    fn build_hasher(&self) -> Self::Hasher {
        match *self {}
    }
}

impl Hasher for NoDefaultHasher {
    fn finish(&self) -> u64 {
        match *self {}
    }

    fn write(&mut self, _bytes: &[u8]) {
        match *self {}
    }
}

/// Scrambles a hash with a constant derived from the table size.
///
/// Without this, copying the contents of a large table into a smaller one in
/// slot order lands long runs of keys on neighbouring homes.
#[inline]
pub(crate) fn perturb(hash: u64, capacity: usize) -> u64 {
    let seed = (capacity.trailing_zeros() as u64 + 1).wrapping_mul(0x9e37_79b9_7f4a_7c15);
    mix(hash ^ seed)
}

// murmur3 fmix64
#[inline]
fn mix(mut h: u64) -> u64 {
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^= h >> 33;
    h
}
