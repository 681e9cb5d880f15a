use core::fmt::Debug;
use core::fmt::Display;
use core::ops::AddAssign;
use core::ops::Index;

use crate::error::TryReserveError;
use crate::growth::BoundedProportional;
use crate::growth::DEFAULT_CAPACITY;
use crate::growth::DEFAULT_LOAD_FACTOR;
use crate::growth::GrowthPolicy;
use crate::growth::min_buffer_size;
use crate::hash_table;
use crate::hash_table::Entry as TableEntry;
use crate::hash_table::HashTable;
use crate::sentinel::DefaultSlot;
use crate::sentinel::Sentinel;
use crate::strategy::DefaultStrategy;
use crate::strategy::HashingStrategy;

/// A hash map using Robin Hood open addressing.
///
/// Keys are hashed and compared through a [`HashingStrategy`] `S`, and the
/// table grows according to a [`GrowthPolicy`] `G`. The key type's
/// [sentinel](Sentinel) value is stored in a dedicated cell next to the
/// table, so every key, including the neutral one, can be used.
///
/// # Performance Characteristics
///
/// - **Memory**: one `u32` marker per slot in addition to the key and value
///   arrays; no per-entry allocation
/// - **Lookups**: a probe stops as soon as it meets an entry closer to its
///   home than the probe is to the key's home, which bounds misses as well as
///   hits
/// - **Removal**: entries following the removed one shift back, so no
///   tombstones accumulate
///
/// # Examples
///
/// ```rust
/// use robin_map::HashMap;
///
/// let mut scores = HashMap::new();
/// scores.insert(0, "zero");
/// scores.insert(5, "five");
///
/// assert_eq!(scores.get(&0), Some(&"zero"));
/// assert_eq!(scores.get(&5), Some(&"five"));
/// assert_eq!(scores.len(), 2);
/// ```
pub struct HashMap<K, V, S = DefaultStrategy, G = BoundedProportional> {
    table: HashTable<K, V, G>,
    default: DefaultSlot<K, V>,
    strategy: S,
}

/// A position in a map returned by [`HashMap::find_slot`].
///
/// A handle reads or replaces the value at a known slot without hashing the
/// key again. It stays valid until the map is structurally modified (a key
/// is added or removed, or the table is rebuilt); using it after that panics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotHandle {
    index: usize,
    generation: u64,
}

impl SlotHandle {
    /// Returns the slot index. The sentinel key's cell reports
    /// [`HashMap::capacity`].
    pub fn index(&self) -> usize {
        self.index
    }
}

/// An entry seen during iteration, together with its slot index.
///
/// Yielded by [`HashMap::cursors`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor<'a, K, V> {
    /// Slot the entry lives in; the sentinel key's cell is reported as
    /// [`HashMap::capacity`].
    pub index: usize,
    /// The entry's key.
    pub key: &'a K,
    /// The entry's value.
    pub value: &'a V,
}

impl<K, V, S, G> Clone for HashMap<K, V, S, G>
where
    K: Clone,
    V: Clone,
    S: Clone,
    G: Clone,
{
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            default: self.default.clone(),
            strategy: self.strategy.clone(),
        }
    }
}

impl<K, V, S, G> Debug for HashMap<K, V, S, G>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Formats the map as `[key=>value, ...]` in iteration order.
impl<K, V, S, G> Display for HashMap<K, V, S, G>
where
    K: Display,
    V: Display,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("[")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}=>{v}")?;
        }
        f.write_str("]")
    }
}

#[cfg(any(feature = "foldhash", feature = "std"))]
impl<K, V> HashMap<K, V, DefaultStrategy, BoundedProportional> {
    /// Creates an empty map with the default number of slots.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::HashMap;
    /// #
    /// let map: HashMap<u32, String> = HashMap::new();
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), 16);
    /// ```
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an empty map with at least `capacity` slots.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::HashMap;
    /// #
    /// let map: HashMap<u32, String> = HashMap::with_capacity(100);
    /// assert_eq!(map.capacity(), 128);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_strategy(capacity, DefaultStrategy::default())
    }

    /// Creates an empty map sized so that `expected` keys fit without
    /// growing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::HashMap;
    /// #
    /// let map: HashMap<u32, u32> = HashMap::with_expected_elements(100);
    /// assert!(map.resize_threshold() >= 100);
    /// ```
    pub fn with_expected_elements(expected: usize) -> Self {
        match min_buffer_size(expected, DEFAULT_LOAD_FACTOR) {
            Ok(capacity) => Self::with_capacity(capacity),
            Err(e) => e.handle(),
        }
    }
}

impl<K, V, S> HashMap<K, V, S, BoundedProportional> {
    /// Creates an empty map that hashes and compares keys with `strategy`.
    pub fn with_strategy(strategy: S) -> Self {
        Self::with_capacity_and_strategy(DEFAULT_CAPACITY, strategy)
    }

    /// Creates an empty map with at least `capacity` slots using `strategy`.
    pub fn with_capacity_and_strategy(capacity: usize, strategy: S) -> Self {
        Self::from_parts(
            HashTable::with_growth_policy(capacity, BoundedProportional::default()),
            strategy,
        )
    }
}

impl<K, V, B> HashMap<K, V, DefaultStrategy<B>, BoundedProportional> {
    /// Creates an empty map hashing keys with `hash_builder`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasher;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use robin_map::HashMap;
    /// #
    /// # struct SimpleHasher;
    /// # impl BuildHasher for SimpleHasher {
    /// #     type Hasher = SipHasher;
    /// #
    /// #     fn build_hasher(&self) -> Self::Hasher {
    /// #         SipHasher::new()
    /// #     }
    /// # }
    /// #
    /// let mut map = HashMap::with_hasher(SimpleHasher);
    /// map.insert(1, "a");
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// ```
    pub fn with_hasher(hash_builder: B) -> Self {
        Self::with_strategy(DefaultStrategy::with_hasher(hash_builder))
    }

    /// Creates an empty map with at least `capacity` slots hashing keys with
    /// `hash_builder`.
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: B) -> Self {
        Self::with_capacity_and_strategy(capacity, DefaultStrategy::with_hasher(hash_builder))
    }
}

impl<K, V, S, G> HashMap<K, V, S, G> {
    pub(crate) fn from_parts(table: HashTable<K, V, G>, strategy: S) -> Self {
        Self {
            table,
            default: DefaultSlot::new(),
            strategy,
        }
    }

    /// Returns the number of keys in the map, the sentinel key included.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::HashMap;
    /// #
    /// let mut map = HashMap::new();
    /// map.insert(0, "zero");
    /// map.insert(1, "one");
    /// assert_eq!(map.len(), 2);
    /// ```
    pub fn len(&self) -> usize {
        self.table.len() + self.default.len()
    }

    /// Returns `true` if the map contains no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of slots in the underlying table.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Returns the configured load factor.
    pub fn load_factor(&self) -> f32 {
        self.table.load_factor()
    }

    /// Returns how many keys the table holds before inserting a new one makes
    /// it grow. The sentinel key does not count.
    pub fn resize_threshold(&self) -> usize {
        self.table.resize_threshold()
    }

    /// Returns the longest distance between any entry and its home slot.
    pub fn max_probe_distance(&self) -> usize {
        self.table.max_probe_distance()
    }

    /// Returns the map's hashing strategy.
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Returns the underlying table.
    ///
    /// The sentinel key is not stored in the table.
    pub fn table(&self) -> &HashTable<K, V, G> {
        &self.table
    }

    /// Removes every key, keeping the allocated slots.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::HashMap;
    /// #
    /// let mut map = HashMap::new();
    /// map.insert(0, 1);
    /// map.insert(2, 3);
    /// map.clear();
    /// assert!(map.is_empty());
    /// assert_eq!(map.capacity(), 16);
    /// ```
    pub fn clear(&mut self) {
        self.default.take();
        self.table.clear();
    }

    /// Returns an iterator over the entries.
    ///
    /// The sentinel key comes first, then the table from its last slot to
    /// its first.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::HashMap;
    /// #
    /// let mut map = HashMap::new();
    /// map.insert(1, "a");
    /// map.insert(2, "b");
    ///
    /// let mut pairs: Vec<_> = map.iter().collect();
    /// pairs.sort();
    /// assert_eq!(pairs, vec![(&1, &"a"), (&2, &"b")]);
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            default: self.default.get(),
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator over the entries and the slots they live in.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::HashMap;
    /// #
    /// let mut map = HashMap::new();
    /// map.insert(0, 'z');
    /// map.insert(7, 's');
    ///
    /// let first = map.cursors().next().unwrap();
    /// assert_eq!((first.index, *first.key), (map.capacity(), 0));
    /// ```
    pub fn cursors(&self) -> Cursors<'_, K, V> {
        Cursors {
            default: self.default.get().map(|(key, value)| Cursor {
                index: self.table.capacity(),
                key,
                value,
            }),
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator over the entries with mutable values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            default: self.default.get_mut(),
            inner: self.table.iter_mut(),
        }
    }

    /// Returns a view of the keys.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::HashMap;
    /// #
    /// let mut map = HashMap::new();
    /// map.insert("a".to_string(), 1);
    /// map.insert("b".to_string(), 2);
    ///
    /// let keys = map.keys();
    /// assert_eq!(keys.len(), 2);
    /// assert!(keys.contains(&"a".to_string()));
    ///
    /// let mut names: Vec<_> = keys.iter().cloned().collect();
    /// names.sort();
    /// assert_eq!(names, ["a", "b"]);
    /// ```
    pub fn keys(&self) -> Keys<'_, K, V, S, G> {
        Keys { map: self }
    }

    /// Returns a view of the values.
    pub fn values(&self) -> Values<'_, K, V, S, G> {
        Values { map: self }
    }

    /// Returns an iterator over mutable references to the values.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Removes every entry, returning them in iteration order.
    ///
    /// The map is empty as soon as this is called, even if the iterator is
    /// leaked before it is exhausted.
    pub fn drain(&mut self) -> Drain<'_, K, V, G> {
        Drain {
            default: self.default.take(),
            inner: self.table.drain(),
        }
    }

    /// Calls `f` on every entry in iteration order.
    pub fn for_each(&self, mut f: impl FnMut(&K, &V)) {
        for (k, v) in self.iter() {
            f(k, v);
        }
    }

    /// Calls `f` on entries in iteration order until it returns `false`.
    ///
    /// Returns `true` if every entry was visited.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::HashMap;
    /// #
    /// let map: HashMap<u32, u32> = (1..=10).map(|k| (k, k)).collect();
    ///
    /// let mut seen = 0;
    /// let finished = map.for_each_while(|_, _| {
    ///     seen += 1;
    ///     seen < 3
    /// });
    /// assert!(!finished);
    /// assert_eq!(seen, 3);
    /// ```
    pub fn for_each_while(&self, mut f: impl FnMut(&K, &V) -> bool) -> bool {
        self.iter().all(|(k, v)| f(k, v))
    }

    fn checked_index(&self, handle: SlotHandle) -> usize {
        assert_eq!(
            handle.generation,
            self.table.generation(),
            "slot handle used after the map was structurally modified"
        );
        handle.index
    }

    /// Returns the key at a slot found by [`find_slot`](Self::find_slot).
    ///
    /// # Panics
    ///
    /// Panics if the map was structurally modified since the handle was
    /// created.
    pub fn slot_key(&self, handle: SlotHandle) -> &K {
        self.slot_entry(handle).0
    }

    /// Returns the value at a slot found by [`find_slot`](Self::find_slot).
    ///
    /// # Panics
    ///
    /// Panics if the map was structurally modified since the handle was
    /// created.
    pub fn slot_value(&self, handle: SlotHandle) -> &V {
        self.slot_entry(handle).1
    }

    fn slot_entry(&self, handle: SlotHandle) -> (&K, &V) {
        let index = self.checked_index(handle);
        if index == self.table.capacity() {
            return self.default.entry();
        }

        match self.table.get_at(index) {
            Some(entry) => entry,
            None => unreachable!("live slot handle points at an empty slot"),
        }
    }

    /// Returns the value at a slot found by [`find_slot`](Self::find_slot)
    /// mutably.
    ///
    /// # Panics
    ///
    /// Panics if the map was structurally modified since the handle was
    /// created.
    pub fn slot_value_mut(&mut self, handle: SlotHandle) -> &mut V {
        let index = self.checked_index(handle);
        if index == self.table.capacity() {
            return self.default.value_mut();
        }

        match self.table.get_at_mut(index) {
            Some((_, value)) => value,
            None => unreachable!("live slot handle points at an empty slot"),
        }
    }

    /// Replaces the value at a slot found by [`find_slot`](Self::find_slot),
    /// returning the previous value.
    ///
    /// Replacing a value is not a structural modification, so the handle
    /// remains valid.
    ///
    /// # Panics
    ///
    /// Panics if the map was structurally modified since the handle was
    /// created.
    pub fn replace_at(&mut self, handle: SlotHandle, value: V) -> V {
        core::mem::replace(self.slot_value_mut(handle), value)
    }
}

impl<K, V, S, G> HashMap<K, V, S, G>
where
    K: Sentinel,
    S: HashingStrategy<K>,
{
    /// Returns a reference to the value for `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::HashMap;
    /// #
    /// let mut map = HashMap::new();
    /// map.insert(1, "a");
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// assert_eq!(map.get(&2), None);
    /// ```
    pub fn get(&self, key: &K) -> Option<&V> {
        self.get_key_value(key).map(|(_, v)| v)
    }

    /// Returns the stored key and the value for `key`.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        if key.is_sentinel() {
            return self.default.get();
        }

        let strategy = &self.strategy;
        self.table
            .find(strategy.hash(key), |k| strategy.equals(k, key))
    }

    /// Returns a mutable reference to the value for `key`.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        if key.is_sentinel() {
            return self.default.get_mut().map(|(_, v)| v);
        }

        let strategy = &self.strategy;
        self.table
            .find_mut(strategy.hash(key), |k| strategy.equals(k, key))
            .map(|(_, v)| v)
    }

    /// Returns `true` if the map contains `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.get_key_value(key).is_some()
    }

    /// Locates `key` and returns a handle to its slot.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::HashMap;
    /// #
    /// let mut counts = HashMap::new();
    /// counts.insert("apples", 3);
    ///
    /// let slot = counts.find_slot(&"apples").unwrap();
    /// *counts.slot_value_mut(slot) += 1;
    /// assert_eq!(counts.replace_at(slot, 10), 4);
    /// assert_eq!(counts.slot_key(slot), &"apples");
    /// assert_eq!(counts.get(&"apples"), Some(&10));
    /// ```
    pub fn find_slot(&self, key: &K) -> Option<SlotHandle> {
        let index = if key.is_sentinel() {
            if !self.default.is_present() {
                return None;
            }
            self.table.capacity()
        } else {
            let strategy = &self.strategy;
            self.table
                .find_index(strategy.hash(key), |k| strategy.equals(k, key))?
        };

        Some(SlotHandle {
            index,
            generation: self.table.generation(),
        })
    }

    /// Removes `key`, returning its value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::HashMap;
    /// #
    /// let mut map = HashMap::new();
    /// map.insert(1, "a");
    /// assert_eq!(map.remove(&1), Some("a"));
    /// assert_eq!(map.remove(&1), None);
    /// ```
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes `key`, returning the stored key and its value.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        if key.is_sentinel() {
            let entry = self.default.take();
            if entry.is_some() {
                self.table.bump_generation();
            }
            return entry;
        }

        let strategy = &self.strategy;
        self.table
            .remove(strategy.hash(key), |k| strategy.equals(k, key))
    }

    /// Removes every entry for which `predicate` returns `true`, returning
    /// how many were removed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::HashMap;
    /// #
    /// let mut map: HashMap<u32, u32> = (0..10).map(|k| (k, k * k)).collect();
    /// assert_eq!(map.remove_all(|k, _| k % 2 == 0), 5);
    /// assert_eq!(map.len(), 5);
    /// assert!(!map.contains_key(&0));
    /// ```
    pub fn remove_all(&mut self, mut predicate: impl FnMut(&K, &V) -> bool) -> usize {
        self.retain(|k, v| !predicate(k, v))
    }

    /// Keeps only the entries for which `keep` returns `true`, returning how
    /// many were removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&K, &mut V) -> bool) -> usize {
        let mut removed = 0;
        if let Some((k, v)) = self.default.get_mut() {
            if !keep(k, v) {
                self.default.take();
                self.table.bump_generation();
                removed += 1;
            }
        }

        removed + self.table.remove_all(|k, v| !keep(k, v))
    }

    /// Returns a view of the keys through which keys can be removed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::HashMap;
    /// #
    /// let mut map: HashMap<u32, &str> = HashMap::new();
    /// map.insert(1, "one");
    /// map.insert(2, "two");
    /// map.insert(3, "three");
    ///
    /// let mut keys = map.keys_mut();
    /// assert!(keys.remove(&2));
    /// assert_eq!(keys.retain(|&k| k > 1), 1);
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn keys_mut(&mut self) -> KeysMut<'_, K, V, S, G> {
        KeysMut { map: self }
    }

    /// Gets the entry for `key` for in-place manipulation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::HashMap;
    /// #
    /// let mut words = HashMap::new();
    /// for word in "the cat saw the dog".split(' ') {
    ///     *words.entry(word).or_insert(0) += 1;
    /// }
    /// assert_eq!(words[&"the"], 2);
    /// assert_eq!(words[&"dog"], 1);
    /// ```
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, S, G> {
        let Self {
            table,
            default,
            strategy,
        } = self;
        let strategy = &*strategy;

        if key.is_sentinel() {
            return if default.is_present() {
                Entry::Occupied(OccupiedEntry {
                    slot: OccupiedSlot::Default {
                        cell: default,
                        table,
                    },
                })
            } else {
                Entry::Vacant(VacantEntry {
                    key,
                    slot: VacantSlot::Default {
                        cell: default,
                        table,
                    },
                    strategy,
                })
            };
        }

        let hash = strategy.hash(&key);
        match table.entry(hash, |k| strategy.equals(k, &key)) {
            TableEntry::Occupied(entry) => Entry::Occupied(OccupiedEntry {
                slot: OccupiedSlot::Table(entry),
            }),
            TableEntry::Vacant(entry) => Entry::Vacant(VacantEntry {
                key,
                slot: VacantSlot::Table(entry),
                strategy,
            }),
        }
    }
}

impl<K, V, S, G> HashMap<K, V, S, G>
where
    K: Sentinel,
    S: HashingStrategy<K>,
    G: GrowthPolicy,
{
    /// Associates `value` with `key`, returning the previous value.
    ///
    /// If the key is already present only the value is replaced; the stored
    /// key is kept.
    ///
    /// # Panics
    ///
    /// Panics if the map cannot grow beyond
    /// [`MAX_CAPACITY`](crate::growth::MAX_CAPACITY) slots, and aborts if
    /// allocation fails. See [`try_insert`](Self::try_insert).
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::HashMap;
    /// #
    /// let mut map = HashMap::new();
    /// assert_eq!(map.insert(37, "a"), None);
    /// assert_eq!(map.insert(37, "b"), Some("a"));
    /// assert_eq!(map[&37], "b");
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.try_insert(key, value) {
            Ok(previous) => previous,
            Err(e) => e.handle(),
        }
    }

    /// Associates `value` with `key`, reporting growth failures instead of
    /// panicking.
    ///
    /// On error the map is unchanged.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>, TryReserveError> {
        match self.entry(key) {
            Entry::Occupied(mut entry) => Ok(Some(entry.insert(value))),
            Entry::Vacant(entry) => {
                entry.try_insert(value)?;
                Ok(None)
            }
        }
    }

    /// Inserts `value` for `key` only if the key is absent.
    ///
    /// Returns `true` if the value was inserted.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::HashMap;
    /// #
    /// let mut map = HashMap::new();
    /// assert!(map.put_if_absent(1, "first"));
    /// assert!(!map.put_if_absent(1, "second"));
    /// assert_eq!(map[&1], "first");
    /// ```
    pub fn put_if_absent(&mut self, key: K, value: V) -> bool {
        match self.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(value);
                true
            }
        }
    }

    /// Stores `put` for an absent key, or adds `add` to the present value.
    ///
    /// Returns the value now associated with `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::HashMap;
    /// #
    /// let mut map = HashMap::new();
    /// assert_eq!(map.put_or_add(5, 10, 3), 10);
    /// assert_eq!(map.put_or_add(5, 10, 3), 13);
    /// ```
    pub fn put_or_add(&mut self, key: K, put: V, add: V) -> V
    where
        V: Copy + AddAssign,
    {
        match self.entry(key) {
            Entry::Occupied(mut entry) => {
                let value = entry.get_mut();
                *value += add;
                *value
            }
            Entry::Vacant(entry) => *entry.insert(put),
        }
    }

    /// Adds `increment` to the value for `key`, starting from `increment` if
    /// the key is absent.
    ///
    /// Returns the value now associated with `key`.
    pub fn add_to(&mut self, key: K, increment: V) -> V
    where
        V: Copy + AddAssign,
    {
        self.put_or_add(key, increment, increment)
    }

    /// Makes room for at least `additional` more keys without growing.
    pub fn reserve(&mut self, additional: usize) {
        if let Err(e) = self.try_reserve(additional) {
            e.handle();
        }
    }

    /// Makes room for at least `additional` more keys without growing,
    /// reporting failures instead of panicking.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use robin_map::HashMap;
    /// #
    /// let mut map: HashMap<u64, u64> = HashMap::new();
    /// map.try_reserve(1000).unwrap();
    /// let capacity = map.capacity();
    /// for k in 0..1000 {
    ///     map.insert(k, k);
    /// }
    /// assert_eq!(map.capacity(), capacity);
    ///
    /// assert!(map.try_reserve(usize::MAX).is_err());
    /// ```
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), TryReserveError> {
        let strategy = &self.strategy;
        self.table
            .try_reserve(additional, |k| strategy.hash(k))
    }

    /// Shrinks the table as far as the current keys and load factor allow.
    pub fn shrink_to_fit(&mut self) {
        let strategy = &self.strategy;
        self.table.shrink_to_fit(|k| strategy.hash(k));
    }
}

impl<K, V, S, G> Default for HashMap<K, V, S, G>
where
    S: Default,
    G: Default,
{
    fn default() -> Self {
        Self::from_parts(
            HashTable::with_growth_policy(DEFAULT_CAPACITY, G::default()),
            S::default(),
        )
    }
}

impl<K, V, S, G> Index<&K> for HashMap<K, V, S, G>
where
    K: Sentinel,
    S: HashingStrategy<K>,
{
    type Output = V;

    /// # Panics
    ///
    /// Panics if `key` is not present.
    fn index(&self, key: &K) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("key not found in map"),
        }
    }
}

impl<K, V, S, G> PartialEq for HashMap<K, V, S, G>
where
    K: Sentinel,
    V: PartialEq,
    S: HashingStrategy<K>,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, S, G> Eq for HashMap<K, V, S, G>
where
    K: Sentinel,
    V: Eq,
    S: HashingStrategy<K>,
{
}

#[cfg(feature = "foldhash")]
const STRUCTURAL_HASH_SEED: u64 = 0x51_7cc1_b727_220a;

/// Hashes the map's contents independently of slot layout and capacity.
///
/// Equal maps hash equally as long as the map's strategy agrees with the
/// key's own `Hash` and `Eq`.
#[cfg(feature = "foldhash")]
impl<K, V, S, G> core::hash::Hash for HashMap<K, V, S, G>
where
    K: core::hash::Hash,
    V: core::hash::Hash,
{
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        use core::hash::BuildHasher;

        let builder = foldhash::fast::FixedState::with_seed(STRUCTURAL_HASH_SEED);
        let sum = self
            .iter()
            .fold(0u64, |sum, entry| sum.wrapping_add(builder.hash_one(entry)));
        state.write_usize(self.len());
        state.write_u64(sum);
    }
}

impl<K, V, S, G> FromIterator<(K, V)> for HashMap<K, V, S, G>
where
    K: Sentinel,
    S: HashingStrategy<K> + Default,
    G: GrowthPolicy + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K, V, S, G> Extend<(K, V)> for HashMap<K, V, S, G>
where
    K: Sentinel,
    S: HashingStrategy<K>,
    G: GrowthPolicy,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        let additional = if self.is_empty() {
            lower
        } else {
            lower.div_ceil(2)
        };
        self.reserve(additional);

        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K, V, S, G> IntoIterator for &'a HashMap<K, V, S, G> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S, G> IntoIterator for &'a mut HashMap<K, V, S, G> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, S, G> IntoIterator for HashMap<K, V, S, G> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(mut self) -> Self::IntoIter {
        IntoIter {
            default: self.default.take(),
            inner: self.table.into_iter(),
        }
    }
}

/// A view into a single entry in the map, which may either be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashMap`].
///
/// [`entry`]: HashMap::entry
pub enum Entry<'a, K, V, S, G> {
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, K, V, G>),
    /// A vacant entry.
    Vacant(VacantEntry<'a, K, V, S, G>),
}

impl<'a, K, V, S, G> Entry<'a, K, V, S, G>
where
    S: HashingStrategy<K>,
    G: GrowthPolicy,
{
    /// Inserts `default` if the entry is vacant and returns a mutable
    /// reference to the value.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts a value computed from a closure if the entry is vacant and
    /// returns a mutable reference to the value.
    pub fn or_insert_with<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Inserts the default value if the entry is vacant and returns a mutable
    /// reference to the value.
    pub fn or_default(self) -> &'a mut V
    where
        V: Default,
    {
        self.or_insert_with(Default::default)
    }
}

impl<'a, K, V, S, G> Entry<'a, K, V, S, G> {
    /// Provides in-place mutable access to an occupied entry before any
    /// potential inserts.
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Returns a reference to this entry's key.
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

enum VacantSlot<'a, K, V, G> {
    Table(hash_table::VacantEntry<'a, K, V, G>),
    Default {
        cell: &'a mut DefaultSlot<K, V>,
        table: &'a mut HashTable<K, V, G>,
    },
}

/// A view into a vacant entry in the map.
pub struct VacantEntry<'a, K, V, S, G> {
    key: K,
    slot: VacantSlot<'a, K, V, G>,
    strategy: &'a S,
}

impl<'a, K, V, S, G> VacantEntry<'a, K, V, S, G> {
    /// Gets a reference to the key that would be used when inserting a value.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Takes ownership of the key.
    pub fn into_key(self) -> K {
        self.key
    }
}

impl<'a, K, V, S, G> VacantEntry<'a, K, V, S, G>
where
    S: HashingStrategy<K>,
    G: GrowthPolicy,
{
    /// Inserts the value into the map and returns a mutable reference to it.
    pub fn insert(self, value: V) -> &'a mut V {
        match self.try_insert(value) {
            Ok(value) => value,
            Err(e) => e.handle(),
        }
    }

    /// Inserts the value into the map, reporting growth failures instead of
    /// panicking.
    pub fn try_insert(self, value: V) -> Result<&'a mut V, TryReserveError> {
        match self.slot {
            VacantSlot::Table(entry) => {
                let strategy = self.strategy;
                entry.try_insert(self.key, value, |k| strategy.hash(k))
            }
            VacantSlot::Default { cell, table } => {
                table.bump_generation();
                Ok(cell.insert(self.key, value))
            }
        }
    }
}

enum OccupiedSlot<'a, K, V, G> {
    Table(hash_table::OccupiedEntry<'a, K, V, G>),
    Default {
        cell: &'a mut DefaultSlot<K, V>,
        table: &'a mut HashTable<K, V, G>,
    },
}

/// A view into an occupied entry in the map.
pub struct OccupiedEntry<'a, K, V, G> {
    slot: OccupiedSlot<'a, K, V, G>,
}

impl<'a, K, V, G> OccupiedEntry<'a, K, V, G> {
    /// Gets a reference to the key in the entry.
    pub fn key(&self) -> &K {
        match &self.slot {
            OccupiedSlot::Table(entry) => entry.key(),
            OccupiedSlot::Default { cell, .. } => cell.entry().0,
        }
    }

    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        match &self.slot {
            OccupiedSlot::Table(entry) => entry.get(),
            OccupiedSlot::Default { cell, .. } => cell.entry().1,
        }
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        match &mut self.slot {
            OccupiedSlot::Table(entry) => entry.get_mut(),
            OccupiedSlot::Default { cell, .. } => cell.value_mut(),
        }
    }

    /// Converts the entry into a mutable reference to the value.
    pub fn into_mut(self) -> &'a mut V {
        match self.slot {
            OccupiedSlot::Table(entry) => entry.into_mut(),
            OccupiedSlot::Default { cell, .. } => cell.value_mut(),
        }
    }

    /// Inserts a value into the entry and returns the old value.
    pub fn insert(&mut self, value: V) -> V {
        core::mem::replace(self.get_mut(), value)
    }

    /// Removes the entry from the map and returns the value.
    pub fn remove(self) -> V {
        self.remove_entry().1
    }

    /// Removes the entry from the map and returns the key and value.
    pub fn remove_entry(self) -> (K, V) {
        match self.slot {
            OccupiedSlot::Table(entry) => entry.remove(),
            OccupiedSlot::Default { cell, table } => {
                table.bump_generation();
                match cell.take() {
                    Some(entry) => entry,
                    None => unreachable!("occupied default slot is empty"),
                }
            }
        }
    }
}

/// An iterator over the key-value pairs of a `HashMap`.
pub struct Iter<'a, K, V> {
    default: Option<(&'a K, &'a V)>,
    inner: hash_table::Iter<'a, K, V>,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            default: self.default,
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(entry) = self.default.take() {
            return Some(entry);
        }
        self.inner.next().map(|(_, k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.default.is_some() as usize + self.inner.len();
        (len, Some(len))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// An iterator over the entries of a `HashMap` and their slot indices.
pub struct Cursors<'a, K, V> {
    default: Option<Cursor<'a, K, V>>,
    inner: hash_table::Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Cursors<'a, K, V> {
    type Item = Cursor<'a, K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(cursor) = self.default.take() {
            return Some(cursor);
        }
        self.inner
            .next()
            .map(|(index, key, value)| Cursor { index, key, value })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.default.is_some() as usize + self.inner.len();
        (len, Some(len))
    }
}

impl<K, V> ExactSizeIterator for Cursors<'_, K, V> {}

/// A mutable iterator over the key-value pairs of a `HashMap`.
pub struct IterMut<'a, K, V> {
    default: Option<(&'a K, &'a mut V)>,
    inner: hash_table::IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(entry) = self.default.take() {
            return Some(entry);
        }
        self.inner.next().map(|(_, k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.default.is_some() as usize + self.inner.len();
        (len, Some(len))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

/// A read-only view of the keys of a `HashMap`.
pub struct Keys<'a, K, V, S, G> {
    map: &'a HashMap<K, V, S, G>,
}

impl<K, V, S, G> Clone for Keys<'_, K, V, S, G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V, S, G> Copy for Keys<'_, K, V, S, G> {}

impl<'a, K, V, S, G> Keys<'a, K, V, S, G> {
    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if there are no keys.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns an iterator over the keys.
    pub fn iter(&self) -> KeysIter<'a, K, V> {
        KeysIter {
            inner: self.map.iter(),
        }
    }
}

impl<K, V, S, G> Keys<'_, K, V, S, G>
where
    K: Sentinel,
    S: HashingStrategy<K>,
{
    /// Returns `true` if the map contains `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }
}

impl<'a, K, V, S, G> IntoIterator for Keys<'a, K, V, S, G> {
    type Item = &'a K;
    type IntoIter = KeysIter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S, G> IntoIterator for &Keys<'a, K, V, S, G> {
    type Item = &'a K;
    type IntoIter = KeysIter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the keys of a `HashMap`.
pub struct KeysIter<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for KeysIter<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for KeysIter<'_, K, V> {}

/// A view of the keys of a `HashMap` that can remove entries.
pub struct KeysMut<'a, K, V, S, G> {
    map: &'a mut HashMap<K, V, S, G>,
}

impl<K, V, S, G> KeysMut<'_, K, V, S, G>
where
    K: Sentinel,
    S: HashingStrategy<K>,
{
    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if there are no keys.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns an iterator over the keys.
    pub fn iter(&self) -> KeysIter<'_, K, V> {
        KeysIter {
            inner: self.map.iter(),
        }
    }

    /// Returns `true` if the map contains `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Removes `key` and its value, returning `true` if it was present.
    pub fn remove(&mut self, key: &K) -> bool {
        self.map.remove(key).is_some()
    }

    /// Removes every key matching `predicate`, returning how many were
    /// removed.
    pub fn remove_all(&mut self, mut predicate: impl FnMut(&K) -> bool) -> usize {
        self.map.remove_all(|k, _| predicate(k))
    }

    /// Keeps only the keys matching `keep`, returning how many were removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&K) -> bool) -> usize {
        self.map.retain(|k, _| keep(k))
    }

    /// Removes every key.
    pub fn clear(&mut self) {
        self.map.clear();
    }
}

/// A read-only view of the values of a `HashMap`.
pub struct Values<'a, K, V, S, G> {
    map: &'a HashMap<K, V, S, G>,
}

impl<K, V, S, G> Clone for Values<'_, K, V, S, G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V, S, G> Copy for Values<'_, K, V, S, G> {}

impl<'a, K, V, S, G> Values<'a, K, V, S, G> {
    /// Returns the number of values.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if there are no values.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns an iterator over the values.
    pub fn iter(&self) -> ValuesIter<'a, K, V> {
        ValuesIter {
            inner: self.map.iter(),
        }
    }

    /// Returns `true` if any key maps to `value`.
    ///
    /// This scans every entry.
    pub fn contains(&self, value: &V) -> bool
    where
        V: PartialEq,
    {
        self.iter().any(|v| v == value)
    }
}

impl<'a, K, V, S, G> IntoIterator for Values<'a, K, V, S, G> {
    type Item = &'a V;
    type IntoIter = ValuesIter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S, G> IntoIterator for &Values<'a, K, V, S, G> {
    type Item = &'a V;
    type IntoIter = ValuesIter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the values of a `HashMap`.
pub struct ValuesIter<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesIter<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesIter<'_, K, V> {}

/// A mutable iterator over the values of a `HashMap`.
pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}

/// A draining iterator over the key-value pairs of a `HashMap`.
pub struct Drain<'a, K, V, G> {
    default: Option<(K, V)>,
    inner: hash_table::Drain<'a, K, V, G>,
}

impl<K, V, G> Iterator for Drain<'_, K, V, G> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.default.take().or_else(|| self.inner.next())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.default.is_some() as usize + self.inner.len();
        (len, Some(len))
    }
}

impl<K, V, G> ExactSizeIterator for Drain<'_, K, V, G> {}

/// An owning iterator over the key-value pairs of a `HashMap`.
pub struct IntoIter<K, V> {
    default: Option<(K, V)>,
    inner: hash_table::IntoIter<K, V>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.default.take().or_else(|| self.inner.next())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.default.is_some() as usize + self.inner.len();
        (len, Some(len))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}
