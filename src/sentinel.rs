use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;

/// Identifies the neutral ("zero" or "null") value of a key domain.
///
/// Maps keep the association for the sentinel key in a dedicated cell outside
/// the slot table, so a sentinel can always be used as an ordinary key. Key
/// types without a natural neutral value implement this by returning `false`.
///
/// ```rust
/// use robin_map::Sentinel;
///
/// #[derive(Hash, PartialEq, Eq)]
/// struct UserId(u32);
///
/// impl Sentinel for UserId {
///     fn is_sentinel(&self) -> bool {
///         self.0 == 0
///     }
/// }
///
/// assert!(UserId(0).is_sentinel());
/// assert!(!7u8.is_sentinel());
/// assert!(None::<u8>.is_sentinel());
/// ```
pub trait Sentinel {
    /// Returns `true` if `self` is the key domain's neutral value.
    fn is_sentinel(&self) -> bool;
}

macro_rules! zero_sentinel {
    ($($t:ty),* $(,)?) => {
        $(
            impl Sentinel for $t {
                #[inline(always)]
                fn is_sentinel(&self) -> bool {
                    *self == 0
                }
            }
        )*
    };
}

zero_sentinel!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

impl Sentinel for bool {
    #[inline(always)]
    fn is_sentinel(&self) -> bool {
        !*self
    }
}

impl Sentinel for char {
    #[inline(always)]
    fn is_sentinel(&self) -> bool {
        *self == '\0'
    }
}

impl Sentinel for () {
    #[inline(always)]
    fn is_sentinel(&self) -> bool {
        true
    }
}

impl Sentinel for str {
    #[inline]
    fn is_sentinel(&self) -> bool {
        self.is_empty()
    }
}

impl Sentinel for String {
    #[inline]
    fn is_sentinel(&self) -> bool {
        self.is_empty()
    }
}

impl<T> Sentinel for Option<T> {
    #[inline]
    fn is_sentinel(&self) -> bool {
        self.is_none()
    }
}

impl<T> Sentinel for Vec<T> {
    #[inline]
    fn is_sentinel(&self) -> bool {
        self.is_empty()
    }
}

impl<T: Sentinel + ?Sized> Sentinel for Box<T> {
    #[inline]
    fn is_sentinel(&self) -> bool {
        (**self).is_sentinel()
    }
}

impl<T: Sentinel + ?Sized> Sentinel for &T {
    #[inline]
    fn is_sentinel(&self) -> bool {
        (**self).is_sentinel()
    }
}

/// The out-of-band cell holding the sentinel key's association.
#[derive(Clone, Debug)]
pub(crate) struct DefaultSlot<K, V> {
    entry: Option<(K, V)>,
}

impl<K, V> DefaultSlot<K, V> {
    pub(crate) const fn new() -> Self {
        Self { entry: None }
    }

    #[inline]
    pub(crate) fn is_present(&self) -> bool {
        self.entry.is_some()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entry.is_some() as usize
    }

    #[inline]
    pub(crate) fn get(&self) -> Option<(&K, &V)> {
        self.entry.as_ref().map(|(k, v)| (k, v))
    }

    #[inline]
    pub(crate) fn get_mut(&mut self) -> Option<(&K, &mut V)> {
        self.entry.as_mut().map(|(k, v)| (&*k, v))
    }

    /// Stores an entry in an empty cell, returning a reference to its value.
    pub(crate) fn insert(&mut self, key: K, value: V) -> &mut V {
        debug_assert!(self.entry.is_none());
        &mut self.entry.insert((key, value)).1
    }

    #[inline]
    pub(crate) fn take(&mut self) -> Option<(K, V)> {
        self.entry.take()
    }

    /// Returns the occupied entry.
    ///
    /// Callers must have checked [`is_present`](Self::is_present).
    #[inline]
    pub(crate) fn entry(&self) -> (&K, &V) {
        match &self.entry {
            Some((k, v)) => (k, v),
            None => unreachable!("default slot is empty"),
        }
    }

    /// Returns the occupied entry's value mutably.
    ///
    /// Callers must have checked [`is_present`](Self::is_present).
    #[inline]
    pub(crate) fn value_mut(&mut self) -> &mut V {
        match &mut self.entry {
            Some((_, v)) => v,
            None => unreachable!("default slot is empty"),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn primitive_sentinels() {
        assert!(0u64.is_sentinel());
        assert!(0i8.is_sentinel());
        assert!(!(-1i32).is_sentinel());
        assert!(false.is_sentinel());
        assert!(!true.is_sentinel());
        assert!('\0'.is_sentinel());
        assert!(!'a'.is_sentinel());
        assert!(().is_sentinel());
    }

    #[test]
    fn owned_and_borrowed_sentinels() {
        assert!(String::new().is_sentinel());
        assert!(!"a".to_string().is_sentinel());
        assert!("".is_sentinel());
        assert!(Box::<str>::from("").is_sentinel());
        assert!(!Some(0u8).is_sentinel());
        assert!(None::<String>.is_sentinel());
        assert!(Vec::<u8>::new().is_sentinel());
        assert!((&0u16).is_sentinel());
    }

    #[test]
    fn default_slot_lifecycle() {
        let mut slot = DefaultSlot::new();
        assert!(!slot.is_present());
        assert_eq!(slot.len(), 0);
        assert_eq!(*slot.insert(0u32, "a"), "a");
        assert!(slot.is_present());
        assert_eq!(slot.len(), 1);
        assert_eq!(slot.get(), Some((&0, &"a")));
        *slot.value_mut() = "c";
        assert_eq!(slot.take(), Some((0, "c")));
        assert!(!slot.is_present());
        assert_eq!(*slot.insert(0, "d"), "d");
        assert_eq!(slot.get_mut().map(|(_, v)| *v), Some("d"));
    }
}
