use core::fmt::Debug;

use crate::growth::BoundedProportional;
use crate::growth::GrowthPolicy;
use crate::hash_map;
use crate::hash_map::HashMap;
use crate::sentinel::Sentinel;
use crate::strategy::DefaultStrategy;
use crate::strategy::HashingStrategy;

/// A hash set backed by a [`HashMap`] with `()` values.
///
/// Like the map, the set stores the element type's [sentinel](Sentinel) value
/// out of band, so it may be a member like any other.
///
/// # Examples
///
/// ```rust
/// use robin_map::HashSet;
///
/// let mut seen = HashSet::new();
/// assert!(seen.insert(0));
/// assert!(seen.insert(42));
/// assert!(!seen.insert(42));
///
/// assert!(seen.contains(&0));
/// assert_eq!(seen.len(), 2);
/// ```
pub struct HashSet<T, S = DefaultStrategy, G = BoundedProportional> {
    map: HashMap<T, (), S, G>,
}

impl<T, S, G> Clone for HashSet<T, S, G>
where
    T: Clone,
    S: Clone,
    G: Clone,
{
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
        }
    }
}

impl<T, S, G> PartialEq for HashSet<T, S, G>
where
    T: Sentinel,
    S: HashingStrategy<T>,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().all(|v| other.contains(v))
    }
}

impl<T, S, G> Eq for HashSet<T, S, G>
where
    T: Sentinel,
    S: HashingStrategy<T>,
{
}

impl<T, S, G> Debug for HashSet<T, S, G>
where
    T: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(any(feature = "foldhash", feature = "std"))]
impl<T> HashSet<T, DefaultStrategy, BoundedProportional> {
    /// Creates an empty set with the default number of slots.
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Creates an empty set with at least `capacity` slots.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::HashSet;
    /// #
    /// let set: HashSet<u32> = HashSet::with_capacity(100);
    /// assert_eq!(set.capacity(), 128);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
        }
    }
}

impl<T, S> HashSet<T, S, BoundedProportional> {
    /// Creates an empty set that hashes and compares elements with
    /// `strategy`.
    pub fn with_strategy(strategy: S) -> Self {
        Self {
            map: HashMap::with_strategy(strategy),
        }
    }
}

impl<T, S, G> HashSet<T, S, G> {
    pub(crate) fn from_map(map: HashMap<T, (), S, G>) -> Self {
        Self { map }
    }

    /// Returns the number of elements in the set.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the set contains no elements.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the number of slots in the underlying table.
    pub fn capacity(&self) -> usize {
        self.map.capacity()
    }

    /// Removes every element, keeping the allocated slots.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Returns an iterator over the elements.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::HashSet;
    /// #
    /// let set: HashSet<u32> = [3, 1, 2].into_iter().collect();
    /// let mut items: Vec<_> = set.iter().copied().collect();
    /// items.sort();
    /// assert_eq!(items, [1, 2, 3]);
    /// ```
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.map.keys().iter(),
        }
    }

    /// Removes every element, returning them in iteration order.
    pub fn drain(&mut self) -> Drain<'_, T, G> {
        Drain {
            inner: self.map.drain(),
        }
    }
}

impl<T, S, G> HashSet<T, S, G>
where
    T: Sentinel,
    S: HashingStrategy<T>,
{
    /// Returns `true` if the set contains `value`.
    pub fn contains(&self, value: &T) -> bool {
        self.map.contains_key(value)
    }

    /// Returns the stored element equal to `value`.
    pub fn get(&self, value: &T) -> Option<&T> {
        self.map.get_key_value(value).map(|(k, _)| k)
    }

    /// Removes `value`, returning `true` if it was present.
    pub fn remove(&mut self, value: &T) -> bool {
        self.map.remove(value).is_some()
    }

    /// Removes and returns the stored element equal to `value`.
    pub fn take(&mut self, value: &T) -> Option<T> {
        self.map.remove_entry(value).map(|(k, _)| k)
    }

    /// Removes every element matching `predicate`, returning how many were
    /// removed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::HashSet;
    /// #
    /// let mut set: HashSet<u32> = (0..10).collect();
    /// assert_eq!(set.remove_all(|&v| v >= 5), 5);
    /// assert_eq!(set.len(), 5);
    /// ```
    pub fn remove_all(&mut self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        self.map.remove_all(|k, _| predicate(k))
    }

    /// Keeps only the elements matching `keep`, returning how many were
    /// removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) -> usize {
        self.map.retain(|k, _| keep(k))
    }

    /// Returns `true` if `self` has no elements in common with `other`.
    pub fn is_disjoint(&self, other: &Self) -> bool {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.iter().all(|v| !large.contains(v))
    }

    /// Returns `true` if every element of `self` is in `other`.
    pub fn is_subset(&self, other: &Self) -> bool {
        self.len() <= other.len() && self.iter().all(|v| other.contains(v))
    }

    /// Returns `true` if every element of `other` is in `self`.
    pub fn is_superset(&self, other: &Self) -> bool {
        other.is_subset(self)
    }
}

impl<T, S, G> HashSet<T, S, G>
where
    T: Sentinel,
    S: HashingStrategy<T>,
    G: GrowthPolicy,
{
    /// Adds `value` to the set, returning `true` if it was not present.
    ///
    /// An equal element already in the set is kept.
    pub fn insert(&mut self, value: T) -> bool {
        self.map.put_if_absent(value, ())
    }

    /// Makes room for at least `additional` more elements without growing.
    pub fn reserve(&mut self, additional: usize) {
        self.map.reserve(additional);
    }

    /// Shrinks the table as far as the current elements allow.
    pub fn shrink_to_fit(&mut self) {
        self.map.shrink_to_fit();
    }
}

impl<T, S, G> Default for HashSet<T, S, G>
where
    S: Default,
    G: Default,
{
    fn default() -> Self {
        Self {
            map: HashMap::default(),
        }
    }
}

impl<T, S, G> FromIterator<T> for HashSet<T, S, G>
where
    T: Sentinel,
    S: HashingStrategy<T> + Default,
    G: GrowthPolicy + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::default();
        set.extend(iter);
        set
    }
}

impl<T, S, G> Extend<T> for HashSet<T, S, G>
where
    T: Sentinel,
    S: HashingStrategy<T>,
    G: GrowthPolicy,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.map.extend(iter.into_iter().map(|v| (v, ())));
    }
}

impl<'a, T, S, G> IntoIterator for &'a HashSet<T, S, G> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, S, G> IntoIterator for HashSet<T, S, G> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.map.into_iter(),
        }
    }
}

/// An iterator over the elements of a `HashSet`.
pub struct Iter<'a, T> {
    inner: hash_map::KeysIter<'a, T, ()>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

/// A draining iterator over the elements of a `HashSet`.
pub struct Drain<'a, T, G> {
    inner: hash_map::Drain<'a, T, (), G>,
}

impl<T, G> Iterator for Drain<'_, T, G> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// An owning iterator over the elements of a `HashSet`.
pub struct IntoIter<T> {
    inner: hash_map::IntoIter<T, ()>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
